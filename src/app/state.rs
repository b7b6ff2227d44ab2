// ==========================================
// 赛马数据门户 - 应用状态
// ==========================================
// 职责: 持有连接池，装配仓储与 API 实例
// 启动顺序: 连接池 → 建表（幂等）→ 版本检查 → 加载配置 → 装配
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::{HorseApi, RaceStatsApi};
use crate::config::config_manager::{ConfigManager, PortalSettings};
use crate::db::{create_tables, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::pool::{DbPool, PoolSettings};
use crate::repository::error::RepositoryResult;
use crate::repository::{
    ActionLogRepository, HorseProfileRepository, MetricScoreRepository, RaceCardRepository,
};

/// 健康检查结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub ok: bool,
    pub db: String,
    pub horse_count: Option<i64>,
    pub error: Option<String>,
}

/// 应用状态
///
/// 包含所有API实例和共享资源，由外层（HTTP/CLI）持有
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 连接池（所有仓储共享）
    pub pool: DbPool,

    /// 启动时加载的运行期配置
    pub settings: Arc<PortalSettings>,

    /// 赛事统计API
    pub race_stats_api: Arc<RaceStatsApi>,

    /// 马匹档案API
    pub horse_api: Arc<HorseApi>,

    /// 操作日志仓储（用于审计查询）
    pub action_log_repo: Arc<ActionLogRepository>,

    horse_repo: Arc<HorseProfileRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 连接数取自 HKJC_PORTAL_POOL_SIZE；建表为幂等操作，生产库的表由上游管线维护
    pub fn new(db_path: String) -> RepositoryResult<Self> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let pool = DbPool::open(PoolSettings::from_env(db_path.clone()))?;

        {
            let conn = pool.acquire()?;
            create_tables(&conn)?;
            match read_schema_version(&conn)? {
                Some(v) if v == CURRENT_SCHEMA_VERSION => {}
                Some(v) => tracing::warn!(
                    found = v,
                    expected = CURRENT_SCHEMA_VERSION,
                    "schema_version 与代码不一致"
                ),
                None => tracing::warn!("未找到 schema_version 表"),
            }
        }

        let settings = ConfigManager::new(pool.clone()).load_portal_settings()?;
        Ok(Self::with_pool(db_path, pool, settings))
    }

    /// 基于已有连接池装配（连接池可以尚未初始化）
    pub fn with_pool(db_path: String, pool: DbPool, settings: PortalSettings) -> Self {
        let settings = Arc::new(settings);

        let race_card_repo = Arc::new(RaceCardRepository::new(pool.clone()));
        let metric_score_repo = Arc::new(MetricScoreRepository::new(pool.clone()));
        let horse_repo = Arc::new(HorseProfileRepository::new(pool.clone()));
        let action_log_repo = Arc::new(ActionLogRepository::new(pool.clone()));

        let race_stats_api = Arc::new(RaceStatsApi::new(race_card_repo, metric_score_repo));
        let horse_api = Arc::new(HorseApi::new(
            horse_repo.clone(),
            action_log_repo.clone(),
            settings.clone(),
        ));

        Self {
            db_path,
            pool,
            settings,
            race_stats_api,
            horse_api,
            action_log_repo,
            horse_repo,
        }
    }

    /// 健康检查
    ///
    /// 存储不可用时返回 ok=false，不返回错误
    pub fn health(&self) -> HealthStatus {
        let probe = self
            .horse_repo
            .ping()
            .and_then(|_| self.horse_repo.count());

        match probe {
            Ok(count) => HealthStatus {
                ok: true,
                db: self.db_path.clone(),
                horse_count: Some(count),
                error: None,
            },
            Err(e) => {
                tracing::warn!(error = %e, "健康检查失败");
                HealthStatus {
                    ok: false,
                    db: self.db_path.clone(),
                    horse_count: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    /// 关闭连接池，之后所有调用返回 ServiceUnavailable
    pub fn shutdown(&self) {
        self.pool.shutdown();
    }
}

/// 获取默认数据库路径
///
/// 优先级: HKJC_PORTAL_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("HKJC_PORTAL_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./hkjc_race_portal.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("hkjc-race-portal");
        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("hkjc_race_portal.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_new_bootstraps_and_reports_health() {
        let file = NamedTempFile::new().unwrap();
        let db_path = file.path().to_str().unwrap().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        let health = state.health();
        assert!(health.ok);
        assert_eq!(health.db, db_path);
        assert_eq!(health.horse_count, Some(0));
        assert_eq!(*state.settings, PortalSettings::default());
    }

    #[test]
    fn test_health_after_shutdown_is_not_ok() {
        let file = NamedTempFile::new().unwrap();
        let state = AppState::new(file.path().to_str().unwrap().to_string()).unwrap();

        state.shutdown();
        let health = state.health();
        assert!(!health.ok);
        assert!(health.horse_count.is_none());
        assert!(health.error.is_some());
    }

    #[test]
    fn test_health_on_uninitialized_pool() {
        let pool = DbPool::new(PoolSettings::new("unused.db"));
        let state = AppState::with_pool("unused.db".to_string(), pool, PortalSettings::default());
        assert!(!state.health().ok);
    }
}
