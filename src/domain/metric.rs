// ==========================================
// 赛马数据门户 - 组合统计领域模型
// ==========================================
// MetricScore 由上游管线预先计算，本核心只读不写
// ==========================================

use crate::domain::race::RaceKey;
use crate::domain::types::MetricFamily;
use serde::{Deserialize, Serialize};

// ==========================================
// MetricStats - 统计数值列
// ==========================================
// 全部可空: 左联接未命中的马匹以空值出现
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub runs: Option<i64>,
    pub win_count: Option<i64>,
    pub second_count: Option<i64>,
    pub third_count: Option<i64>,
    pub fourth_count: Option<i64>,
    pub win_pct: Option<f64>,
    pub q_pct: Option<f64>,
    pub place_pct: Option<f64>,
    pub top4_pct: Option<f64>,
    pub score_raw: Option<f64>,
    pub score_norm: Option<f64>,
    pub score_final: Option<f64>,
}

impl MetricStats {
    pub fn is_empty(&self) -> bool {
        *self == MetricStats::default()
    }

    /// 逐列取最大值（空值不参与比较）
    pub fn max_merge(&self, other: &MetricStats) -> MetricStats {
        MetricStats {
            runs: max_opt(self.runs, other.runs),
            win_count: max_opt(self.win_count, other.win_count),
            second_count: max_opt(self.second_count, other.second_count),
            third_count: max_opt(self.third_count, other.third_count),
            fourth_count: max_opt(self.fourth_count, other.fourth_count),
            win_pct: max_opt_f64(self.win_pct, other.win_pct),
            q_pct: max_opt_f64(self.q_pct, other.q_pct),
            place_pct: max_opt_f64(self.place_pct, other.place_pct),
            top4_pct: max_opt_f64(self.top4_pct, other.top4_pct),
            score_raw: max_opt_f64(self.score_raw, other.score_raw),
            score_norm: max_opt_f64(self.score_norm, other.score_norm),
            score_final: max_opt_f64(self.score_final, other.score_final),
        }
    }
}

fn max_opt(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

fn max_opt_f64(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

// ==========================================
// MetricScore - 预计算统计行
// ==========================================
// 唯一键: (race_date, venue_code, race_no, horse_id, metric_code)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub race: RaceKey,
    pub horse_id: String,
    pub metric_code: String,
    pub stats: MetricStats,
}

// ==========================================
// HorseStatRecord - 马匹级统计结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorseStatRecord {
    pub horse_no: u32,
    pub horse_id: Option<String>,
    pub horse_name: Option<String>,
    pub draw: Option<u32>,
    pub jockey_name: Option<String>,
    /// 命中的统计码；未命中为 None
    pub metric_code: Option<String>,
    #[serde(flatten)]
    pub stats: MetricStats,
}

// ==========================================
// JockeyStatRecord - 骑师级统计结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JockeyStatRecord {
    pub jockey_name: String,
    /// 该骑师本场所策骑马匹的马号（升序）
    pub horse_nos: Vec<u32>,
    pub metric_code: Option<String>,
    #[serde(flatten)]
    pub stats: MetricStats,
}

// ==========================================
// StatsTable - 联表输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "level", content = "rows", rename_all = "lowercase")]
pub enum StatsTable {
    Horse(Vec<HorseStatRecord>),
    Jockey(Vec<JockeyStatRecord>),
}

impl StatsTable {
    /// 与族别匹配的空结果
    pub fn empty(family: MetricFamily) -> Self {
        if family.is_jockey_level() {
            StatsTable::Jockey(Vec::new())
        } else {
            StatsTable::Horse(Vec::new())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            StatsTable::Horse(rows) => rows.len(),
            StatsTable::Jockey(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn horse_rows(&self) -> Option<&[HorseStatRecord]> {
        match self {
            StatsTable::Horse(rows) => Some(rows),
            StatsTable::Jockey(_) => None,
        }
    }

    pub fn jockey_rows(&self) -> Option<&[JockeyStatRecord]> {
        match self {
            StatsTable::Jockey(rows) => Some(rows),
            StatsTable::Horse(_) => None,
        }
    }
}
