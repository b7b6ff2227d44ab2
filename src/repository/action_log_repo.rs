// ==========================================
// 赛马数据门户 - 操作日志数据仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use crate::domain::action_log::ActionLog;
use crate::pool::{DbPool, PooledConnection};
use crate::repository::error::RepositoryResult;
use chrono::NaiveDateTime;
use rusqlite::{params, Result as SqliteResult, Row};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// ActionLogRepository - 操作日志仓储
// ==========================================
pub struct ActionLogRepository {
    pool: DbPool,
}

impl ActionLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_conn(&self) -> RepositoryResult<PooledConnection> {
        self.pool.acquire()
    }

    /// 插入操作日志
    ///
    /// # 返回
    /// - `Ok(action_id)`: 成功插入
    /// - `Err(...)`: 数据库错误
    pub fn insert(&self, log: &ActionLog) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO action_log (
                action_id, action_type, action_ts, actor,
                payload_json, impact_summary_json, detail
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                log.action_id,
                log.action_type,
                log.action_ts.format(TS_FORMAT).to_string(),
                log.actor,
                log.payload_json.as_ref().map(|v| v.to_string()),
                log.impact_summary_json.as_ref().map(|v| v.to_string()),
                log.detail,
            ],
        )?;

        Ok(log.action_id.clone())
    }

    /// 按 action_id 查询单个日志
    pub fn find_by_id(&self, action_id: &str) -> RepositoryResult<Option<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, action_type, action_ts, actor,
                   payload_json, impact_summary_json, detail
            FROM action_log
            WHERE action_id = ?1
            "#,
        )?;

        match stmt.query_row(params![action_id], map_row) {
            Ok(log) => Ok(Some(log)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 按操作类型查询（按时间倒序）
    pub fn find_by_action_type(
        &self,
        action_type: &str,
        limit: u32,
    ) -> RepositoryResult<Vec<ActionLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT action_id, action_type, action_ts, actor,
                   payload_json, impact_summary_json, detail
            FROM action_log
            WHERE action_type = ?1
            ORDER BY action_ts DESC, action_id DESC
            LIMIT ?2
            "#,
        )?;

        let logs = stmt
            .query_map(params![action_type, limit], map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(logs)
    }
}

fn map_row(row: &Row<'_>) -> SqliteResult<ActionLog> {
    let ts_raw: String = row.get(2)?;
    let action_ts = NaiveDateTime::parse_from_str(&ts_raw, TS_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;

    // JSON 列损坏时按缺失处理，不影响整行读取
    let json_col = |idx: usize| -> SqliteResult<Option<serde_json::Value>> {
        Ok(row
            .get::<_, Option<String>>(idx)?
            .and_then(|s| serde_json::from_str(&s).ok()))
    };

    Ok(ActionLog {
        action_id: row.get(0)?,
        action_type: row.get(1)?,
        action_ts,
        actor: row.get(3)?,
        payload_json: json_col(4)?,
        impact_summary_json: json_col(5)?,
        detail: row.get(6)?,
    })
}
