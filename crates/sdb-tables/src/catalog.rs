//! The tables and indices a production bundle is expected to contain

use crate::descriptor::TableDescriptor;
use crate::index::DerivedIndexDescriptor;
use crate::ingest::extract_spawner_rewards;
use crate::records::*;

/// Name of the map position → reward item index
pub const POSITION_REWARD: &str = "position_reward";

/// A set of table and index descriptors ingested together.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    pub tables: &'static [TableDescriptor],
    pub indices: &'static [DerivedIndexDescriptor],
}

impl Catalog {
    pub fn table(&self, name: &str) -> Option<&'static TableDescriptor> {
        self.tables.iter().find(|d| d.table == name)
    }

    pub fn index(&self, name: &str) -> Option<&'static DerivedIndexDescriptor> {
        self.indices.iter().find(|d| d.name == name)
    }
}

pub static TABLES: [TableDescriptor; 37] = [
    TableDescriptor::of::<MainQuestRecord>(),
    TableDescriptor::of::<CampaignStageRecord>(),
    TableDescriptor::of::<RewardRecord>(),
    TableDescriptor::of::<CampaignChapterRecord>(),
    TableDescriptor::of::<UserExpRecord>(),
    TableDescriptor::of::<CharacterCostumeRecord>(),
    TableDescriptor::of::<CharacterRecord>(),
    TableDescriptor::of::<TutorialRecord>(),
    TableDescriptor::of::<ItemEquipRecord>(),
    TableDescriptor::of::<ItemMaterialRecord>(),
    TableDescriptor::of::<ItemEquipExpRecord>(),
    TableDescriptor::of::<ItemEquipGradeExpRecord>(),
    TableDescriptor::of::<CharacterLevelRecord>(),
    TableDescriptor::of::<TacticAcademyLessonRecord>(),
    TableDescriptor::of::<SideStoryStageRecord>(),
    TableDescriptor::of::<FieldItemRecord>(),
    TableDescriptor::of::<OutpostBattleRecord>(),
    TableDescriptor::of::<ArchiveRecordManagerRecord>(),
    TableDescriptor::of::<GachaTypeRecord>(),
    TableDescriptor::of::<EventManagerRecord>(),
    TableDescriptor::of::<LiveWallpaperRecord>(),
    TableDescriptor::of::<UserFrameRecord>(),
    TableDescriptor::of::<ArchiveEventDungeonStageRecord>(),
    TableDescriptor::of::<UserTitleRecord>(),
    TableDescriptor::of::<ArchiveEventStoryRecord>(),
    TableDescriptor::of::<ArchiveEventQuestRecord>(),
    TableDescriptor::of::<ArchiveMessengerConditionRecord>(),
    TableDescriptor::of::<AlbumResourceRecord>(),
    TableDescriptor::of::<JukeboxListRecord>(),
    TableDescriptor::of::<JukeboxThemeRecord>(),
    TableDescriptor::of::<CharacterStatRecord>(),
    TableDescriptor::of::<SkillInfoRecord>(),
    TableDescriptor::of::<CostRecord>(),
    TableDescriptor::of::<MidasProductRecord>(),
    TableDescriptor::of::<TowerRecord>(),
    TableDescriptor::of::<TriggerRecord>(),
    TableDescriptor::of::<InfraCoreGradeRecord>(),
];

pub static INDICES: [DerivedIndexDescriptor; 1] = [DerivedIndexDescriptor {
    name: POSITION_REWARD,
    prefixes: &["CampaignMap/", "EventMap/"],
    extract: extract_spawner_rewards,
}];

pub static CATALOG: Catalog = Catalog {
    tables: &TABLES,
    indices: &INDICES,
};
