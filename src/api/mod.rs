// ==========================================
// 赛马数据门户 - API 层
// ==========================================
// 职责: 调用方边界。校验原始参数、编排仓储与引擎、统一错误类型
// 会话认证/HTTP 序列化由外层负责，本层只接收已认证的角色
// ==========================================

pub mod error;
pub mod horse_api;
pub mod race_stats_api;
pub mod validator;

// 重导出核心 API
pub use error::{ApiError, ApiResult};
pub use horse_api::HorseApi;
pub use race_stats_api::RaceStatsApi;
