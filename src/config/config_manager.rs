// ==========================================
// 赛马数据门户 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// 读取时机: 进程启动时一次性加载为 PortalSettings
// ==========================================

use crate::pool::{DbPool, PooledConnection};
use crate::repository::error::RepositoryResult;
use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 批量编辑
    pub const PRIVILEGED_ROLES: &str = "bulk_edit.privileged_roles"; // 逗号分隔
    pub const MAX_BATCH_SIZE: &str = "bulk_edit.max_batch_size";

    // 马匹列表分页
    pub const HORSES_DEFAULT_LIMIT: &str = "horses.default_limit";
    pub const HORSES_MAX_LIMIT: &str = "horses.max_limit";
}

const DEFAULT_PRIVILEGED_ROLE: &str = "admin";
const DEFAULT_MAX_BATCH_SIZE: usize = 500;
const DEFAULT_HORSES_LIMIT: u32 = 200;
const DEFAULT_HORSES_MAX_LIMIT: u32 = 500;

// ==========================================
// PortalSettings - 运行期配置快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalSettings {
    /// 允许批量编辑的角色（已小写化）
    pub privileged_roles: Vec<String>,
    pub max_batch_size: usize,
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            privileged_roles: vec![DEFAULT_PRIVILEGED_ROLE.to_string()],
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            default_limit: DEFAULT_HORSES_LIMIT,
            max_limit: DEFAULT_HORSES_MAX_LIMIT,
        }
    }
}

impl PortalSettings {
    /// 角色是否有批量编辑权限（忽略大小写与首尾空白）
    pub fn is_privileged(&self, role: &str) -> bool {
        let role = role.trim().to_lowercase();
        !role.is_empty() && self.privileged_roles.iter().any(|r| *r == role)
    }

    /// 由原始键值构建，非法值回退默认并告警
    pub fn from_values(values: &HashMap<String, String>) -> Self {
        let defaults = PortalSettings::default();

        let privileged_roles = match values.get(config_keys::PRIVILEGED_ROLES) {
            Some(raw) => {
                let roles = parse_roles(raw);
                if roles.is_empty() {
                    warn!(key = config_keys::PRIVILEGED_ROLES, value = %raw, "配置值为空，使用默认值");
                    defaults.privileged_roles.clone()
                } else {
                    roles
                }
            }
            None => defaults.privileged_roles.clone(),
        };

        let max_batch_size = parse_positive(values, config_keys::MAX_BATCH_SIZE)
            .unwrap_or(defaults.max_batch_size as u64) as usize;
        let max_limit = parse_positive(values, config_keys::HORSES_MAX_LIMIT)
            .map(|v| v.min(u64::from(u32::MAX)) as u32)
            .unwrap_or(defaults.max_limit);
        let default_limit = parse_positive(values, config_keys::HORSES_DEFAULT_LIMIT)
            .map(|v| v.min(u64::from(u32::MAX)) as u32)
            .unwrap_or(defaults.default_limit)
            .min(max_limit);

        Self {
            privileged_roles,
            max_batch_size,
            default_limit,
            max_limit,
        }
    }
}

fn parse_roles(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|r| r.trim().to_lowercase())
        .filter(|r| !r.is_empty())
        .collect()
}

fn parse_positive(values: &HashMap<String, String>, key: &str) -> Option<u64> {
    let raw = values.get(key)?;
    match raw.trim().parse::<u64>() {
        Ok(v) if v > 0 => Some(v),
        _ => {
            warn!(key, value = %raw, "配置值非法，使用默认值");
            None
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    pool: DbPool,
}

impl ConfigManager {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_conn(&self) -> RepositoryResult<PooledConnection> {
        self.pool.acquire()
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 配置（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 读取全部 global 配置
    pub fn get_all_global(&self) -> RepositoryResult<HashMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global'")?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<rusqlite::Result<HashMap<_, _>>>()?;
        Ok(pairs)
    }

    /// 加载运行期配置快照
    pub fn load_portal_settings(&self) -> RepositoryResult<PortalSettings> {
        let values = self.get_all_global()?;
        let settings = PortalSettings::from_values(&values);
        tracing::info!(
            privileged_roles = ?settings.privileged_roles,
            max_batch_size = settings.max_batch_size,
            default_limit = settings.default_limit,
            max_limit = settings.max_limit,
            "门户配置已加载"
        );
        Ok(settings)
    }
}
