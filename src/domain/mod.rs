// ==========================================
// 赛马数据门户 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型与联表键规范化
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod horse;
pub mod metric;
pub mod race;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use horse::{
    normalize_horse_id, BulkEditOutcome, EditableField, FieldChange, FieldValue, HorseEdit,
    HorsePatch, HorseProfile, HorseQuery,
};
pub use metric::{HorseStatRecord, JockeyStatRecord, MetricScore, MetricStats, StatsTable};
pub use race::{RaceContext, RaceEntry, RaceKey};
pub use types::{MetricFamily, MetricMatch, Venue, MAX_RACE_NO};
