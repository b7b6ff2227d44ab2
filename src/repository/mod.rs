// ==========================================
// 赛马数据门户 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
//       horse_id 在读出时统一规范化
// ==========================================

pub mod action_log_repo;
pub mod error;
pub mod horse_profile_repo;
pub mod metric_score_repo;
pub mod race_card_repo;

// 重导出核心仓储
pub use action_log_repo::ActionLogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use horse_profile_repo::HorseProfileRepository;
pub use metric_score_repo::MetricScoreRepository;
pub use race_card_repo::RaceCardRepository;
