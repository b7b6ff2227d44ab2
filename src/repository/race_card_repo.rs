// ==========================================
// 赛马数据门户 - 排位表数据仓储
// ==========================================
// 数据源: racecard_races / racecard_entries（上游抓取写入）
// 红线: Repository 不含业务逻辑，只读
// ==========================================

use crate::domain::horse::normalize_horse_id;
use crate::domain::race::{RaceContext, RaceEntry, RaceKey};
use crate::pool::{DbPool, PooledConnection};
use crate::repository::error::RepositoryResult;
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

// ==========================================
// RaceCardRepository - 排位表仓储
// ==========================================
pub struct RaceCardRepository {
    pool: DbPool,
}

impl RaceCardRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_conn(&self) -> RepositoryResult<PooledConnection> {
        self.pool.acquire()
    }

    /// 查询场次上下文
    ///
    /// # 返回
    /// - Ok(Some(RaceContext)): 找到场次
    /// - Ok(None): 排位表无此场次（调用方按空结果处理）
    /// - Err: 数据库错误
    pub fn find_race_context(&self, key: &RaceKey) -> RepositoryResult<Option<RaceContext>> {
        let conn = self.get_conn()?;
        let ctx = conn
            .query_row(
                r#"
                SELECT distance_m, race_name_zh, course, going, class_text
                FROM racecard_races
                WHERE race_date = ?1 AND venue_code = ?2 AND race_no = ?3
                LIMIT 1
                "#,
                params![key.date_str(), key.venue.to_db_str(), key.race_no],
                |row| {
                    Ok(RaceContext {
                        key: *key,
                        distance_m: row.get::<_, Option<u32>>(0)?,
                        race_name: row.get(1)?,
                        course: row.get(2)?,
                        going: row.get(3)?,
                        class_text: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(ctx)
    }

    /// 查询场次的出赛马（排除退出马），按马号升序
    ///
    /// racecard_entries 以 (race_date, race_no, horse_no) 为键，不含场地列
    pub fn list_active_entries(&self, key: &RaceKey) -> RepositoryResult<Vec<RaceEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT horse_no, horse_id, horse_name_zh, draw, jockey_zh, scratched
            FROM racecard_entries
            WHERE race_date = ?1
              AND race_no = ?2
              AND (scratched IS NULL OR scratched = 0)
            ORDER BY horse_no ASC
            "#,
        )?;

        let entries = stmt
            .query_map(params![key.date_str(), key.race_no], map_entry)?
            .collect::<SqliteResult<Vec<_>>>()?;

        tracing::debug!(race = %key, count = entries.len(), "出赛马查询完成");
        Ok(entries)
    }
}

fn map_entry(row: &Row<'_>) -> SqliteResult<RaceEntry> {
    Ok(RaceEntry {
        horse_no: row.get(0)?,
        horse_id: row
            .get::<_, Option<String>>(1)?
            .as_deref()
            .and_then(normalize_horse_id),
        horse_name: row.get(2)?,
        draw: row.get(3)?,
        jockey_name: row
            .get::<_, Option<String>>(4)?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        scratched: row.get::<_, Option<i64>>(5)?.unwrap_or(0) != 0,
    })
}
