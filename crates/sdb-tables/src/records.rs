//! Record shapes for the catalog tables
//!
//! Each record declares its key plus the fields the store's lookups read.
//! Unknown JSON fields are ignored, so upstream column additions do not
//! break ingestion.

use serde::Deserialize;

use crate::table::TableRecord;

macro_rules! table_record {
    ($record:ident, $table:literal, $key_field:ident: $key:ty) => {
        impl TableRecord for $record {
            type Key = $key;
            const TABLE: &'static str = $table;
            const ENTRY: &'static str = concat!($table, ".json");
            const KEY_FIELD: &'static str = stringify!($key_field);

            fn key(&self) -> $key {
                Clone::clone(&self.$key_field)
            }
        }
    };
}

macro_rules! id_record {
    ($record:ident, $table:literal) => {
        #[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
        pub struct $record {
            pub id: i32,
        }

        table_record!($record, $table, id: i32);
    };
}

// ── campaign ──

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MainQuestRecord {
    pub id: i32,
    /// Stage whose clear completes this quest
    #[serde(default)]
    pub condition_id: i32,
}
table_record!(MainQuestRecord, "MainQuestTable", id: i32);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CampaignStageRecord {
    pub id: i32,
    /// One-based; chapter numbers elsewhere are zero-based
    #[serde(default)]
    pub chapter_id: i32,
    /// `Normal` or `Hard`
    #[serde(default)]
    pub chapter_mod: String,
    #[serde(default)]
    pub stage_type: String,
}
table_record!(CampaignStageRecord, "CampaignStageTable", id: i32);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CampaignChapterRecord {
    pub chapter: i32,
    #[serde(default)]
    pub field_id: String,
}
table_record!(CampaignChapterRecord, "CampaignChapterTable", chapter: i32);

id_record!(RewardRecord, "RewardTable");
id_record!(SideStoryStageRecord, "SideStoryStageTable");
id_record!(FieldItemRecord, "FieldItemTable");

// ── progression ──

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserExpRecord {
    pub level: i32,
    /// Minimum accumulated experience for `level`
    pub exp: i32,
}
table_record!(UserExpRecord, "UserExpTable", level: i32);

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CharacterLevelRecord {
    pub level: i32,
}
table_record!(CharacterLevelRecord, "CharacterLevelTable", level: i32);

id_record!(TacticAcademyLessonRecord, "TacticAcademyFunctionTable");
id_record!(TutorialRecord, "ContentsTutorialTable");
id_record!(OutpostBattleRecord, "OutpostBattleTable");
id_record!(TowerRecord, "TowerTable");
id_record!(InfraCoreGradeRecord, "InfraCoreGradeTable");

// ── characters ──

id_record!(CharacterRecord, "CharacterTable");
id_record!(CharacterCostumeRecord, "CharacterCostumeTable");
id_record!(CharacterStatRecord, "CharacterStatTable");
id_record!(SkillInfoRecord, "SkillInfoTable");

// ── items ──

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemEquipRecord {
    pub id: i32,
    pub item_sub_type: Option<String>,
}
table_record!(ItemEquipRecord, "ItemEquipTable", id: i32);

id_record!(ItemMaterialRecord, "ItemMaterialTable");
id_record!(ItemEquipExpRecord, "ItemEquipExpTable");
id_record!(ItemEquipGradeExpRecord, "ItemEquipGradeExpTable");
id_record!(CostRecord, "CostTable");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MidasProductRecord {
    pub midas_product_id_proximabeta: String,
}
table_record!(MidasProductRecord, "MidasProductTable", midas_product_id_proximabeta: String);

// ── events and collection ──

id_record!(GachaTypeRecord, "GachaTypeTable");
id_record!(EventManagerRecord, "EventManagerTable");
id_record!(UserFrameRecord, "UserFrameTable");
id_record!(JukeboxListRecord, "JukeboxListTable");
id_record!(JukeboxThemeRecord, "JukeboxThemeTable");
id_record!(TriggerRecord, "TriggerTable");
id_record!(LiveWallpaperRecord, "LiveWallpaperTable");
id_record!(UserTitleRecord, "UserTitleTable");

// ── archive ──

id_record!(ArchiveRecordManagerRecord, "ArchiveRecordManagerTable");
id_record!(ArchiveEventDungeonStageRecord, "ArchiveEventDungeonStageTable");
id_record!(ArchiveEventStoryRecord, "ArchiveEventStoryTable");
id_record!(ArchiveEventQuestRecord, "ArchiveEventQuestTable");
id_record!(ArchiveMessengerConditionRecord, "ArchiveMessengerConditionTable");

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AlbumResourceRecord {
    pub id: i32,
    #[serde(default)]
    pub target_chapter: i32,
    /// Scenario this album entry unlocks, if any
    pub scenario_group_id: Option<String>,
}
table_record!(AlbumResourceRecord, "AlbumResourceTable", id: i32);
