// ==========================================
// 赛马数据门户 - 应用层
// ==========================================
// 职责: 装配连接池、仓储与 API，供 HTTP/CLI 外层持有
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState, HealthStatus};
