//! RecordStore: the immutable aggregate of every ingested table and index

use sdb_core::{BundleIdentity, SdbError, SdbResult};
use serde::Serialize;
use std::any::TypeId;
use std::collections::HashMap;

use crate::catalog::{Catalog, POSITION_REWARD};
use crate::descriptor::IngestedTable;
use crate::index::DerivedIndex;
use crate::records::{
    AlbumResourceRecord, CampaignChapterRecord, CampaignStageRecord, CharacterCostumeRecord,
    CharacterRecord, ItemEquipRecord, MainQuestRecord, UserExpRecord,
};
use crate::table::{RecordTable, TableRecord};

/// Every table of one decoded bundle, read-only once built.
///
/// Shared between readers behind an `Arc`; nothing in it is mutable.
pub struct RecordStore {
    identity: BundleIdentity,
    tables: HashMap<TypeId, IngestedTable>,
    indices: HashMap<&'static str, DerivedIndex>,
}

/// Per-table record count, for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub table: &'static str,
    pub entry: &'static str,
    pub records: usize,
}

impl RecordStore {
    /// Build a store from completed ingestions. Every table `catalog`
    /// declares must be present.
    pub fn assemble(
        identity: BundleIdentity,
        catalog: &Catalog,
        tables: Vec<IngestedTable>,
        indices: Vec<DerivedIndex>,
    ) -> SdbResult<Self> {
        let mut by_type = HashMap::with_capacity(tables.len());
        for table in tables {
            let name = table.table();
            if by_type.insert(table.record_type(), table).is_some() {
                return Err(SdbError::Configuration(format!(
                    "table {name} ingested more than once"
                )));
            }
        }

        for descriptor in catalog.tables {
            if !by_type.contains_key(&descriptor.record_type()) {
                return Err(SdbError::IncompleteStore {
                    table: descriptor.table.to_string(),
                });
            }
        }

        let indices = indices.into_iter().map(|index| (index.name(), index)).collect();

        Ok(Self {
            identity,
            tables: by_type,
            indices,
        })
    }

    /// Digest and size of the raw bundle this store was decoded from.
    pub fn identity(&self) -> BundleIdentity {
        self.identity
    }

    pub fn table<R: TableRecord>(&self) -> SdbResult<&RecordTable<R>> {
        self.tables
            .get(&TypeId::of::<R>())
            .and_then(IngestedTable::downcast::<R>)
            .ok_or_else(|| SdbError::IncompleteStore {
                table: R::TABLE.to_string(),
            })
    }

    pub fn get<R: TableRecord>(&self, key: &R::Key) -> SdbResult<Option<&R>> {
        Ok(self.table::<R>()?.get(key))
    }

    pub fn index(&self, name: &str) -> Option<&DerivedIndex> {
        self.indices.get(name)
    }

    /// Reward item placed at a map position.
    pub fn position_reward(&self, position_id: &str) -> Option<i32> {
        self.index(POSITION_REWARD)?.get(position_id)
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn record_count(&self) -> usize {
        self.tables.values().map(IngestedTable::len).sum()
    }

    /// Tables sorted by name.
    pub fn summaries(&self) -> Vec<TableSummary> {
        let mut out: Vec<_> = self
            .tables
            .values()
            .map(|t| TableSummary {
                table: t.table(),
                entry: t.entry(),
                records: t.len(),
            })
            .collect();
        out.sort_by(|a, b| a.table.cmp(b.table));
        out
    }

    /// Indices sorted by name.
    pub fn indices(&self) -> Vec<&DerivedIndex> {
        let mut out: Vec<_> = self.indices.values().collect();
        out.sort_by(|a, b| a.name().cmp(b.name()));
        out
    }

    // ── lookups ──

    /// The main quest completed by clearing `stage`; lowest quest id if
    /// several share the condition.
    pub fn main_quest_for_stage_clear(&self, stage: i32) -> SdbResult<Option<&MainQuestRecord>> {
        Ok(self
            .table::<MainQuestRecord>()?
            .values()
            .filter(|q| q.condition_id == stage)
            .min_by_key(|q| q.id))
    }

    /// Highest `(level, min_exp)` whose threshold `exp` has reached.
    ///
    /// `None` if `exp` is below every threshold or the table is empty.
    pub fn user_level_from_exp(&self, exp: i32) -> SdbResult<Option<(i32, i32)>> {
        Ok(self
            .table::<UserExpRecord>()?
            .values()
            .filter(|r| r.exp <= exp)
            .max_by_key(|r| (r.level, r.exp))
            .map(|r| (r.level, r.exp)))
    }

    pub fn min_exp_for_level(&self, level: i32) -> SdbResult<Option<i32>> {
        Ok(self.get::<UserExpRecord>(&level)?.map(|r| r.exp))
    }

    /// Normal chapter number whose campaign field is `field_id`.
    pub fn chapter_for_field(&self, field_id: &str) -> SdbResult<Option<i32>> {
        Ok(self
            .table::<CampaignChapterRecord>()?
            .values()
            .filter(|c| c.field_id == field_id)
            .map(|c| c.chapter)
            .min())
    }

    /// Main-line stage ids of a zero-based `chapter`, ascending.
    pub fn stage_ids_for_chapter(&self, chapter: i32, normal: bool) -> SdbResult<Vec<i32>> {
        let difficulty = if normal { "Normal" } else { "Hard" };
        let mut ids: Vec<i32> = self
            .table::<CampaignStageRecord>()?
            .values()
            .filter(|s| {
                s.chapter_id - 1 == chapter && s.chapter_mod == difficulty && s.stage_type == "Main"
            })
            .map(|s| s.id)
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }

    pub fn character_ids(&self) -> SdbResult<Vec<i32>> {
        Ok(sorted_keys(self.table::<CharacterRecord>()?))
    }

    pub fn costume_ids(&self) -> SdbResult<Vec<i32>> {
        Ok(sorted_keys(self.table::<CharacterCostumeRecord>()?))
    }

    pub fn item_sub_type(&self, item_id: i32) -> SdbResult<Option<&str>> {
        Ok(self
            .get::<ItemEquipRecord>(&item_id)?
            .and_then(|item| item.item_sub_type.as_deref()))
    }

    /// Scenario group ids unlocked in `chapter`, ordered by album record id.
    pub fn scenario_ids_for_chapter(&self, chapter: i32) -> SdbResult<Vec<&str>> {
        let mut records: Vec<&AlbumResourceRecord> = self
            .table::<AlbumResourceRecord>()?
            .values()
            .filter(|r| r.target_chapter == chapter)
            .collect();
        records.sort_unstable_by_key(|r| r.id);
        Ok(records
            .into_iter()
            .filter_map(|r| r.scenario_group_id.as_deref())
            .filter(|id| !id.is_empty())
            .collect())
    }
}

impl std::fmt::Debug for RecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStore")
            .field("identity", &self.identity)
            .field("tables", &self.tables.len())
            .field("indices", &self.indices.len())
            .finish()
    }
}

fn sorted_keys<R: TableRecord<Key = i32>>(table: &RecordTable<R>) -> Vec<i32> {
    let mut ids: Vec<i32> = table.keys().copied().collect();
    ids.sort_unstable();
    ids
}

/// Whether main-story scenario `group_id` has been reached at
/// (`chapter`, `stage`).
///
/// Ids look like `d_main_26_08`, `d_main_18af_06` (after-story chapter) or
/// `d_main_01_01_s` / `d_main_01_01_e` (start/end scene of a stage). A
/// scenario counts as reached if it belongs to an earlier chapter, an
/// earlier stage of the same chapter, or is a start/end scene of the
/// current stage. Anything that is not a main-story id is never reached.
pub fn is_valid_scenario_stage(group_id: &str, chapter: i32, stage: i32) -> bool {
    let Some(rest) = group_id.strip_prefix("d_main_") else {
        return false;
    };
    let mut parts = rest.split('_');
    let (Some(chapter_part), Some(stage_part)) = (parts.next(), parts.next()) else {
        return false;
    };
    let special = matches!(parts.next(), Some("s") | Some("e"));

    let chapter_part = chapter_part.strip_suffix("af").unwrap_or(chapter_part);
    let (Ok(scenario_chapter), Ok(scenario_stage)) =
        (chapter_part.parse::<i32>(), stage_part.parse::<i32>())
    else {
        return false;
    };

    scenario_chapter < chapter
        || (scenario_chapter == chapter
            && (scenario_stage < stage || (scenario_stage == stage && special)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TableDescriptor;
    use crate::records::RewardRecord;

    static LOOKUP_TABLES: [TableDescriptor; 8] = [
        TableDescriptor::of::<MainQuestRecord>(),
        TableDescriptor::of::<UserExpRecord>(),
        TableDescriptor::of::<CampaignChapterRecord>(),
        TableDescriptor::of::<CampaignStageRecord>(),
        TableDescriptor::of::<CharacterRecord>(),
        TableDescriptor::of::<CharacterCostumeRecord>(),
        TableDescriptor::of::<ItemEquipRecord>(),
        TableDescriptor::of::<AlbumResourceRecord>(),
    ];

    static LOOKUPS: Catalog = Catalog {
        tables: &LOOKUP_TABLES,
        indices: &[],
    };

    fn content(table: &str) -> &'static str {
        match table {
            "MainQuestTable" => {
                r#"{"records":[{"id":101,"condition_id":6001003},{"id":100,"condition_id":6001003},{"id":102,"condition_id":6001004}]}"#
            }
            "UserExpTable" => {
                r#"{"records":[{"level":1,"exp":0},{"level":2,"exp":100},{"level":3,"exp":250}]}"#
            }
            "CampaignChapterTable" => {
                r#"{"records":[{"chapter":0,"field_id":"field_tutorial"},{"chapter":1,"field_id":"field_c01"}]}"#
            }
            "CampaignStageTable" => {
                r#"{"records":[
                    {"id":6001003,"chapter_id":2,"chapter_mod":"Normal","stage_type":"Main"},
                    {"id":6001001,"chapter_id":2,"chapter_mod":"Normal","stage_type":"Main"},
                    {"id":6001002,"chapter_id":2,"chapter_mod":"Normal","stage_type":"Sub"},
                    {"id":6101001,"chapter_id":2,"chapter_mod":"Hard","stage_type":"Main"},
                    {"id":6002001,"chapter_id":3,"chapter_mod":"Normal","stage_type":"Main"}
                ]}"#
            }
            "CharacterTable" => r#"{"records":[{"id":30},{"id":10},{"id":20}]}"#,
            "CharacterCostumeTable" => r#"{"records":[{"id":2},{"id":1}]}"#,
            "ItemEquipTable" => {
                r#"{"records":[{"id":1,"item_sub_type":"Module_A"},{"id":2}]}"#
            }
            "AlbumResourceTable" => {
                r#"{"records":[
                    {"id":3,"target_chapter":1,"scenario_group_id":"d_main_01_02"},
                    {"id":1,"target_chapter":1,"scenario_group_id":"d_main_01_01"},
                    {"id":2,"target_chapter":1,"scenario_group_id":""},
                    {"id":4,"target_chapter":2,"scenario_group_id":"d_main_02_01"},
                    {"id":5,"target_chapter":1}
                ]}"#
            }
            other => panic!("no fixture for {other}"),
        }
    }

    fn store() -> RecordStore {
        let tables = LOOKUPS
            .tables
            .iter()
            .map(|d| d.ingest(content(d.table).as_bytes()).unwrap())
            .collect();
        let mut index = DerivedIndex::new(POSITION_REWARD);
        index.try_insert("A-1".into(), 5001);

        RecordStore::assemble(BundleIdentity::default(), &LOOKUPS, tables, vec![index]).unwrap()
    }

    #[test]
    fn test_table_access_and_counts() {
        let store = store();
        assert_eq!(store.table_count(), 8);
        assert_eq!(store.record_count(), 3 + 3 + 2 + 5 + 3 + 2 + 2 + 5);
        assert_eq!(store.table::<UserExpRecord>().unwrap().len(), 3);

        let err = store.table::<RewardRecord>().unwrap_err();
        assert!(matches!(err, SdbError::IncompleteStore { ref table } if table == "RewardTable"));
    }

    #[test]
    fn test_missing_declared_table_is_incomplete() {
        let tables = vec![LOOKUP_TABLES[0]
            .ingest(content("MainQuestTable").as_bytes())
            .unwrap()];
        let err = RecordStore::assemble(BundleIdentity::default(), &LOOKUPS, tables, vec![])
            .unwrap_err();
        assert!(matches!(err, SdbError::IncompleteStore { ref table } if table == "UserExpTable"));
    }

    #[test]
    fn test_table_ingested_twice_rejected() {
        let once = || {
            LOOKUP_TABLES[0]
                .ingest(content("MainQuestTable").as_bytes())
                .unwrap()
        };
        let err = RecordStore::assemble(BundleIdentity::default(), &LOOKUPS, vec![once(), once()], vec![])
            .unwrap_err();
        assert!(matches!(err, SdbError::Configuration(_)));
    }

    #[test]
    fn test_summaries_sorted() {
        let names: Vec<_> = store().summaries().into_iter().map(|s| s.table).collect();
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_position_reward() {
        let store = store();
        assert_eq!(store.position_reward("A-1"), Some(5001));
        assert_eq!(store.position_reward("Z-9"), None);
    }

    #[test]
    fn test_main_quest_for_stage_clear() {
        let store = store();
        assert_eq!(store.main_quest_for_stage_clear(6001003).unwrap().unwrap().id, 100);
        assert_eq!(store.main_quest_for_stage_clear(6001004).unwrap().unwrap().id, 102);
        assert!(store.main_quest_for_stage_clear(1).unwrap().is_none());
    }

    #[test]
    fn test_user_level_from_exp() {
        let store = store();
        assert_eq!(store.user_level_from_exp(0).unwrap(), Some((1, 0)));
        assert_eq!(store.user_level_from_exp(99).unwrap(), Some((1, 0)));
        assert_eq!(store.user_level_from_exp(100).unwrap(), Some((2, 100)));
        assert_eq!(store.user_level_from_exp(10_000).unwrap(), Some((3, 250)));
        assert_eq!(store.user_level_from_exp(-1).unwrap(), None);
    }

    #[test]
    fn test_min_exp_for_level() {
        let store = store();
        assert_eq!(store.min_exp_for_level(3).unwrap(), Some(250));
        assert_eq!(store.min_exp_for_level(9).unwrap(), None);
    }

    #[test]
    fn test_chapter_for_field() {
        let store = store();
        assert_eq!(store.chapter_for_field("field_c01").unwrap(), Some(1));
        assert_eq!(store.chapter_for_field("field_x").unwrap(), None);
    }

    #[test]
    fn test_stage_ids_for_chapter() {
        let store = store();
        assert_eq!(store.stage_ids_for_chapter(1, true).unwrap(), vec![6001001, 6001003]);
        assert_eq!(store.stage_ids_for_chapter(1, false).unwrap(), vec![6101001]);
        assert_eq!(store.stage_ids_for_chapter(2, true).unwrap(), vec![6002001]);
        assert!(store.stage_ids_for_chapter(7, true).unwrap().is_empty());
    }

    #[test]
    fn test_ids_sorted() {
        let store = store();
        assert_eq!(store.character_ids().unwrap(), vec![10, 20, 30]);
        assert_eq!(store.costume_ids().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_item_sub_type() {
        let store = store();
        assert_eq!(store.item_sub_type(1).unwrap(), Some("Module_A"));
        assert_eq!(store.item_sub_type(2).unwrap(), None);
        assert_eq!(store.item_sub_type(3).unwrap(), None);
    }

    #[test]
    fn test_scenario_ids_for_chapter() {
        let store = store();
        assert_eq!(
            store.scenario_ids_for_chapter(1).unwrap(),
            vec!["d_main_01_01", "d_main_01_02"]
        );
        assert_eq!(store.scenario_ids_for_chapter(2).unwrap(), vec!["d_main_02_01"]);
    }

    #[test]
    fn test_scenario_stage_ordering() {
        assert!(is_valid_scenario_stage("d_main_01_05", 2, 1), "earlier chapter");
        assert!(is_valid_scenario_stage("d_main_02_03", 2, 4), "earlier stage");
        assert!(!is_valid_scenario_stage("d_main_02_04", 2, 4), "current stage");
        assert!(is_valid_scenario_stage("d_main_02_04_s", 2, 4), "current stage start scene");
        assert!(is_valid_scenario_stage("d_main_02_04_e", 2, 4), "current stage end scene");
        assert!(!is_valid_scenario_stage("d_main_02_05_s", 2, 4), "later stage scene");
        assert!(!is_valid_scenario_stage("d_main_03_01", 2, 4), "later chapter");
    }

    #[test]
    fn test_scenario_after_story_chapter() {
        assert!(is_valid_scenario_stage("d_main_18af_06", 19, 1));
        assert!(is_valid_scenario_stage("d_main_18af_06", 18, 7));
        assert!(!is_valid_scenario_stage("d_main_18af_06", 18, 6));
    }

    #[test]
    fn test_scenario_rejects_other_ids() {
        assert!(!is_valid_scenario_stage("d_event_01_01", 99, 99));
        assert!(!is_valid_scenario_stage("d_main_01", 99, 99));
        assert!(!is_valid_scenario_stage("d_main_xx_01", 99, 99));
        assert!(!is_valid_scenario_stage("d_main_01_yy", 99, 99));
        assert!(!is_valid_scenario_stage("", 99, 99));
    }
}
