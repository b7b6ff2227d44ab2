// ==========================================
// API集成测试辅助工具
// ==========================================
// 职责: 基于临时数据库装配完整 AppState
// ==========================================

use rusqlite::Connection;
use tempfile::NamedTempFile;

use hkjc_race_portal::app::AppState;
use hkjc_race_portal::config::{config_keys, ConfigManager, PortalSettings};
use hkjc_race_portal::logging;
use hkjc_race_portal::pool::{DbPool, PoolSettings};

use crate::test_helpers::{create_test_db, open_conn};

/// 门户测试环境
pub struct PortalTestEnv {
    pub db_path: String,
    pub state: AppState,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl PortalTestEnv {
    /// 默认配置（特权角色 admin）
    pub fn new() -> Self {
        Self::with_settings(PortalSettings::default())
    }

    /// 指定配置
    pub fn with_settings(settings: PortalSettings) -> Self {
        Self::with_pool_settings(|db_path| PoolSettings::new(db_path).with_size(4), settings)
    }

    /// 单连接 + 短等待，用于连接耗尽场景
    pub fn single_connection(acquire_timeout_ms: u64) -> Self {
        Self::with_pool_settings(
            |db_path| {
                PoolSettings::new(db_path)
                    .with_size(1)
                    .with_acquire_timeout_ms(acquire_timeout_ms)
            },
            PortalSettings::default(),
        )
    }

    fn with_pool_settings(
        pool_settings: impl FnOnce(String) -> PoolSettings,
        settings: PortalSettings,
    ) -> Self {
        logging::init_test();
        let (temp_file, db_path) = create_test_db().unwrap();
        let pool = DbPool::open(pool_settings(db_path.clone())).unwrap();
        let state = AppState::with_pool(db_path.clone(), pool, settings);
        Self {
            db_path,
            state,
            _temp_file: temp_file,
        }
    }

    /// 先写入 config_kv 再走完整启动流程
    pub fn with_config(pairs: &[(&str, &str)]) -> Self {
        logging::init_test();
        let (temp_file, db_path) = create_test_db().unwrap();
        {
            let pool = DbPool::open(PoolSettings::new(db_path.clone()).with_size(1)).unwrap();
            let manager = ConfigManager::new(pool.clone());
            for (key, value) in pairs {
                manager.set_global_config_value(key, value).unwrap();
            }
            pool.shutdown();
        }
        let state = AppState::new(db_path.clone()).unwrap();
        Self {
            db_path,
            state,
            _temp_file: temp_file,
        }
    }

    /// 连接池尚未初始化的环境
    pub fn not_ready() -> Self {
        logging::init_test();
        let (temp_file, db_path) = create_test_db().unwrap();
        let pool = DbPool::new(PoolSettings::new(db_path.clone()));
        let state = AppState::with_pool(db_path.clone(), pool, PortalSettings::default());
        Self {
            db_path,
            state,
            _temp_file: temp_file,
        }
    }

    /// 用于准备数据/断言的独立连接
    pub fn conn(&self) -> Connection {
        open_conn(&self.db_path)
    }
}

/// 只允许 editor 批量编辑的配置
pub fn editor_only() -> Vec<(&'static str, &'static str)> {
    vec![(config_keys::PRIVILEGED_ROLES, "editor")]
}
