// ==========================================
// 赛马数据门户 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 赛事统计读模型 + 马匹档案批量维护
// 外层（会话认证 / HTTP / 静态页面）通过 app::AppState 调用本库
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 统计码推导与联表
pub mod engine;

// 配置层 - 运行期配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 连接池
pub mod pool;

// 性能埋点
pub mod perf;

// 日志系统
pub mod logging;

// API 层 - 调用方边界
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{MetricFamily, MetricMatch, Venue};

// 领域实体
pub use domain::{
    BulkEditOutcome, HorseEdit, HorseProfile, HorseStatRecord, JockeyStatRecord, RaceContext,
    RaceEntry, RaceKey, StatsTable,
};

// 引擎
pub use engine::{MetricCodeResolver, StatsJoinEngine};

// API
pub use api::{ApiError, ApiResult, HorseApi, RaceStatsApi};

// 应用
pub use app::{AppState, HealthStatus};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "赛马数据门户";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(!APP_NAME.is_empty());
    }
}
