// ==========================================
// 赛马数据门户 - 统计联表引擎
// ==========================================
// 输入: 出赛马 + 该场次命中统计码的统计行（均已规范化 horse_id）
// 输出: StatsTable
// - 马匹级族别: 每匹未退出马恰好一行，按马号升序，未命中统计时数值为空
// - 骑师距离族: 每位骑师一行，数值列取 MAX
// 红线: 引擎不拼 SQL，不访问存储
// ==========================================

use crate::domain::metric::{HorseStatRecord, JockeyStatRecord, MetricScore, StatsTable};
use crate::domain::race::RaceEntry;
use crate::domain::types::{MetricFamily, MetricMatch};
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// StatsJoinEngine - 出赛马与统计行的左联接
pub struct StatsJoinEngine;

impl StatsJoinEngine {
    /// 执行联表
    ///
    /// # 参数
    /// - `family`: 统计族（决定输出层级）
    /// - `entries`: 出赛马（退出马会被再次过滤）
    /// - `scores`: 统计行
    /// - `metric`: 统计码，只有命中的统计行参与联接
    pub fn join(
        family: MetricFamily,
        entries: &[RaceEntry],
        scores: &[MetricScore],
        metric: &MetricMatch,
    ) -> StatsTable {
        let horse_rows = Self::join_horses(entries, scores, metric);
        if family.is_jockey_level() {
            StatsTable::Jockey(Self::collapse_by_jockey(horse_rows))
        } else {
            StatsTable::Horse(horse_rows)
        }
    }

    /// 马匹级左联接
    fn join_horses(
        entries: &[RaceEntry],
        scores: &[MetricScore],
        metric: &MetricMatch,
    ) -> Vec<HorseStatRecord> {
        let index = Self::index_scores(scores, metric);

        let mut active: Vec<&RaceEntry> = entries.iter().filter(|e| !e.scratched).collect();
        active.sort_by_key(|e| e.horse_no);

        active
            .into_iter()
            .map(|entry| {
                let hit = entry.horse_id.as_deref().and_then(|id| index.get(id));
                HorseStatRecord {
                    horse_no: entry.horse_no,
                    horse_id: entry.horse_id.clone(),
                    horse_name: entry.horse_name.clone(),
                    draw: entry.draw,
                    jockey_name: entry.jockey_name.clone(),
                    metric_code: hit.map(|s| s.metric_code.clone()),
                    stats: hit.map(|s| s.stats.clone()).unwrap_or_default(),
                }
            })
            .collect()
    }

    /// horse_id → 统计行
    ///
    /// 前缀族同一匹马可能命中多个子档位，取 metric_code 最小的一行，
    /// 保证每匹马至多一行
    fn index_scores<'a>(
        scores: &'a [MetricScore],
        metric: &MetricMatch,
    ) -> HashMap<&'a str, &'a MetricScore> {
        let mut index: HashMap<&str, &MetricScore> = HashMap::new();
        let mut duplicates = 0usize;

        for score in scores.iter().filter(|s| metric.matches(&s.metric_code)) {
            match index.entry(score.horse_id.as_str()) {
                Entry::Occupied(mut slot) => {
                    duplicates += 1;
                    if score.metric_code < slot.get().metric_code {
                        slot.insert(score);
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(score);
                }
            }
        }

        if duplicates > 0 {
            tracing::debug!(
                metric = %metric,
                duplicates,
                "同一马匹命中多行统计，已取统计码最小者"
            );
        }
        index
    }

    /// 按骑师折叠，数值列逐列取 MAX
    ///
    /// 无骑师名的出赛马不构成骑师行；输出按该骑师最小马号升序
    fn collapse_by_jockey(rows: Vec<HorseStatRecord>) -> Vec<JockeyStatRecord> {
        let mut groups: Vec<JockeyStatRecord> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for row in rows {
            let Some(jockey) = row.jockey_name.clone() else {
                tracing::debug!(horse_no = row.horse_no, "出赛马缺少骑师，不计入骑师统计");
                continue;
            };

            match positions.get(&jockey) {
                Some(&pos) => {
                    let group = &mut groups[pos];
                    group.horse_nos.push(row.horse_no);
                    group.stats = group.stats.max_merge(&row.stats);
                    if group.metric_code.is_none() {
                        group.metric_code = row.metric_code;
                    }
                }
                None => {
                    positions.insert(jockey.clone(), groups.len());
                    groups.push(JockeyStatRecord {
                        jockey_name: jockey,
                        horse_nos: vec![row.horse_no],
                        metric_code: row.metric_code,
                        stats: row.stats,
                    });
                }
            }
        }

        // 输入已按马号升序，horse_nos 天然有序，groups 按首个马号有序
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metric::MetricStats;
    use crate::domain::race::RaceKey;
    use crate::domain::types::Venue;
    use chrono::NaiveDate;

    fn race() -> RaceKey {
        RaceKey::new(NaiveDate::from_ymd_opt(2025, 11, 26).unwrap(), Venue::ST, 5)
    }

    fn entry(horse_no: u32, horse_id: &str, jockey: &str, scratched: bool) -> RaceEntry {
        RaceEntry {
            horse_no,
            horse_id: Some(horse_id.to_string()),
            horse_name: Some(format!("馬{horse_no}")),
            draw: Some(horse_no),
            jockey_name: Some(jockey.to_string()),
            scratched,
        }
    }

    fn score(horse_id: &str, code: &str, runs: i64, win_pct: f64) -> MetricScore {
        MetricScore {
            race: race(),
            horse_id: horse_id.to_string(),
            metric_code: code.to_string(),
            stats: MetricStats {
                runs: Some(runs),
                win_pct: Some(win_pct),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_left_join_keeps_every_active_entry() {
        let entries = vec![
            entry(3, "H3", "布文", false),
            entry(1, "H1", "潘頓", false),
            entry(2, "H2", "田泰安", false),
        ];
        let scores = vec![score("H1", "HORSE_DIST_ST_1650", 10, 0.3)];
        let metric = MetricMatch::Exact("HORSE_DIST_ST_1650".to_string());

        let table = StatsJoinEngine::join(MetricFamily::HorseDistance, &entries, &scores, &metric);
        let rows = table.horse_rows().unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows.iter().map(|r| r.horse_no).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(rows[0].stats.runs, Some(10));
        assert_eq!(rows[0].metric_code.as_deref(), Some("HORSE_DIST_ST_1650"));
        assert!(rows[1].stats.is_empty());
        assert!(rows[1].metric_code.is_none());
    }

    #[test]
    fn test_scratched_entries_never_appear() {
        let entries = vec![entry(1, "H1", "潘頓", false), entry(2, "H2", "潘頓", true)];
        let scores = vec![
            score("H1", "JOCKEY_DIST_ST_1650", 5, 0.1),
            score("H2", "JOCKEY_DIST_ST_1650", 50, 0.9),
        ];
        let metric = MetricMatch::Exact("JOCKEY_DIST_ST_1650".to_string());

        let horse = StatsJoinEngine::join(MetricFamily::HorseDistance, &entries, &scores, &metric);
        assert_eq!(horse.len(), 1);

        let jockey = StatsJoinEngine::join(MetricFamily::JockeyDistance, &entries, &scores, &metric);
        let rows = jockey.jockey_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].horse_nos, vec![1]);
        assert_eq!(rows[0].stats.runs, Some(5));
    }

    #[test]
    fn test_non_matching_codes_are_ignored() {
        let entries = vec![entry(1, "H1", "潘頓", false)];
        let scores = vec![score("H1", "HORSE_DIST_ST_1600", 8, 0.5)];
        let metric = MetricMatch::Exact("HORSE_DIST_ST_1650".to_string());

        let table = StatsJoinEngine::join(MetricFamily::HorseDistance, &entries, &scores, &metric);
        assert!(table.horse_rows().unwrap()[0].stats.is_empty());
    }

    #[test]
    fn test_prefix_family_yields_one_row_per_horse() {
        let entries = vec![entry(1, "H1", "潘頓", false)];
        let scores = vec![
            score("H1", "WEIGHT_125_133", 3, 0.0),
            score("H1", "WEIGHT_115_124", 7, 0.2),
        ];
        let metric = MetricMatch::Prefix("WEIGHT_".to_string());

        let table = StatsJoinEngine::join(MetricFamily::WeightBand, &entries, &scores, &metric);
        let rows = table.horse_rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].metric_code.as_deref(), Some("WEIGHT_115_124"));
        assert_eq!(rows[0].stats.runs, Some(7));
    }

    #[test]
    fn test_jockey_collapse_identical_rows() {
        let entries = vec![
            entry(2, "H2", "潘頓", false),
            entry(4, "H4", "布文", false),
            entry(7, "H7", "潘頓", false),
        ];
        let scores = vec![
            score("H2", "JOCKEY_DIST_ST_1650", 120, 0.21),
            score("H7", "JOCKEY_DIST_ST_1650", 120, 0.21),
            score("H4", "JOCKEY_DIST_ST_1650", 80, 0.12),
        ];
        let metric = MetricMatch::Exact("JOCKEY_DIST_ST_1650".to_string());

        let table = StatsJoinEngine::join(MetricFamily::JockeyDistance, &entries, &scores, &metric);
        let rows = table.jockey_rows().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].jockey_name, "潘頓");
        assert_eq!(rows[0].horse_nos, vec![2, 7]);
        assert_eq!(rows[0].stats.runs, Some(120));
        assert_eq!(rows[0].stats.win_pct, Some(0.21));
        assert_eq!(rows[1].jockey_name, "布文");
    }

    #[test]
    fn test_jockey_collapse_takes_max_per_column() {
        let entries = vec![entry(1, "H1", "潘頓", false), entry(2, "H2", "潘頓", false)];
        let mut a = score("H1", "JOCKEY_DIST_ST_1650", 100, 0.30);
        a.stats.score_final = None;
        let mut b = score("H2", "JOCKEY_DIST_ST_1650", 110, 0.25);
        b.stats.score_final = Some(61.5);
        let metric = MetricMatch::Exact("JOCKEY_DIST_ST_1650".to_string());

        let table = StatsJoinEngine::join(MetricFamily::JockeyDistance, &entries, &[a, b], &metric);
        let row = &table.jockey_rows().unwrap()[0];
        assert_eq!(row.stats.runs, Some(110));
        assert_eq!(row.stats.win_pct, Some(0.30));
        assert_eq!(row.stats.score_final, Some(61.5));
    }

    #[test]
    fn test_entry_without_horse_id_still_listed() {
        let mut e = entry(1, "H1", "潘頓", false);
        e.horse_id = None;
        let table = StatsJoinEngine::join(
            MetricFamily::DrawBand,
            &[e],
            &[],
            &MetricMatch::Prefix("HORSE_DRAW_".to_string()),
        );
        assert_eq!(table.len(), 1);
    }
}
