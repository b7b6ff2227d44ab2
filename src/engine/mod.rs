// ==========================================
// 赛马数据门户 - 引擎层
// ==========================================
// 职责: 统计码推导 + 出赛马/统计行联接
// 红线: Engine 不拼 SQL, 不持有连接
// ==========================================

pub mod error;
pub mod metric_code;
pub mod stats_join;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use metric_code::MetricCodeResolver;
pub use stats_join::StatsJoinEngine;
