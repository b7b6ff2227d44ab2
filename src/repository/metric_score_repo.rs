// ==========================================
// 赛马数据门户 - 组合统计数据仓储
// ==========================================
// 数据源: race_metric_scores（上游统计管线预先计算）
// 红线: 只读，本核心从不写入统计表
// ==========================================

use crate::domain::horse::normalize_horse_id;
use crate::domain::metric::{MetricScore, MetricStats};
use crate::domain::race::RaceKey;
use crate::domain::types::MetricMatch;
use crate::pool::{DbPool, PooledConnection};
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Result as SqliteResult};

const SCORE_COLUMNS: &str = r#"
    horse_id, metric_code,
    runs, win_cnt, second_cnt, third_cnt, fourth_cnt,
    win_pct, q_pct, place_pct, top4_pct,
    score_raw, score_norm, score_final
"#;

// ==========================================
// MetricScoreRepository - 组合统计仓储
// ==========================================
pub struct MetricScoreRepository {
    pool: DbPool,
}

impl MetricScoreRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_conn(&self) -> RepositoryResult<PooledConnection> {
        self.pool.acquire()
    }

    /// 查询某场次命中统计码的全部统计行
    ///
    /// # 参数
    /// - `key`: 场次标识
    /// - `metric`: 精确码或前缀码
    ///
    /// # 说明
    /// - 前缀匹配使用 substr 比较而非 LIKE（LIKE 的 `_` 是通配符）
    /// - horse_id 在此处规范化；规范化后为空的行无法联表，直接丢弃
    pub fn find_scores(
        &self,
        key: &RaceKey,
        metric: &MetricMatch,
    ) -> RepositoryResult<Vec<MetricScore>> {
        let predicate = match metric {
            MetricMatch::Exact(_) => "metric_code = ?4",
            MetricMatch::Prefix(_) => "substr(metric_code, 1, length(?4)) = ?4",
        };
        let sql = format!(
            r#"
            SELECT {SCORE_COLUMNS}
            FROM race_metric_scores
            WHERE race_date = ?1
              AND venue_code = ?2
              AND race_no = ?3
              AND {predicate}
            ORDER BY horse_id ASC, metric_code ASC
            "#,
        );

        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![key.date_str(), key.venue.to_db_str(), key.race_no, metric.as_str()],
                |row| {
                    let raw_id: Option<String> = row.get(0)?;
                    let metric_code: String = row.get(1)?;
                    let stats = MetricStats {
                        runs: row.get(2)?,
                        win_count: row.get(3)?,
                        second_count: row.get(4)?,
                        third_count: row.get(5)?,
                        fourth_count: row.get(6)?,
                        win_pct: row.get(7)?,
                        q_pct: row.get(8)?,
                        place_pct: row.get(9)?,
                        top4_pct: row.get(10)?,
                        score_raw: row.get(11)?,
                        score_norm: row.get(12)?,
                        score_final: row.get(13)?,
                    };
                    Ok((raw_id, metric_code, stats))
                },
            )?
            .collect::<SqliteResult<Vec<_>>>()?;

        let total = rows.len();
        let scores: Vec<MetricScore> = rows
            .into_iter()
            .filter_map(|(raw_id, metric_code, stats)| {
                let horse_id = raw_id.as_deref().and_then(normalize_horse_id)?;
                Some(MetricScore {
                    race: *key,
                    horse_id,
                    metric_code,
                    stats,
                })
            })
            .collect();

        if scores.len() < total {
            tracing::debug!(
                race = %key,
                dropped = total - scores.len(),
                "统计行 horse_id 为空，已丢弃"
            );
        }
        Ok(scores)
    }
}
