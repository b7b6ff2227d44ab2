// ==========================================
// 赛马数据门户 - 赛事领域模型
// ==========================================
// 来源: racecard_races / racecard_entries（上游排位表抓取写入，只读）
// ==========================================

use crate::domain::types::Venue;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// RaceKey - 场次标识
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RaceKey {
    pub race_date: NaiveDate,
    pub venue: Venue,
    pub race_no: u32,
}

impl RaceKey {
    pub fn new(race_date: NaiveDate, venue: Venue, race_no: u32) -> Self {
        Self {
            race_date,
            venue,
            race_no,
        }
    }

    /// 数据库日期格式 (YYYY-MM-DD)
    pub fn date_str(&self) -> String {
        self.race_date.format("%Y-%m-%d").to_string()
    }
}

impl fmt::Display for RaceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R{}", self.race_date, self.venue, self.race_no)
    }
}

// ==========================================
// RaceContext - 场次不变事实
// ==========================================
// distance_m 允许为空: 上游抓取偶有途程解析失败
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceContext {
    pub key: RaceKey,
    pub distance_m: Option<u32>,
    pub race_name: Option<String>,
    pub course: Option<String>,
    pub going: Option<String>,
    pub class_text: Option<String>,
}

impl RaceContext {
    /// 仅含统计所需字段的最小上下文
    pub fn new(key: RaceKey, distance_m: Option<u32>) -> Self {
        Self {
            key,
            distance_m,
            race_name: None,
            course: None,
            going: None,
            class_text: None,
        }
    }
}

// ==========================================
// RaceEntry - 出赛马
// ==========================================
// horse_id 已在仓储边界做过 normalize_horse_id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaceEntry {
    pub horse_no: u32,
    pub horse_id: Option<String>,
    pub horse_name: Option<String>,
    pub draw: Option<u32>,
    pub jockey_name: Option<String>,
    pub scratched: bool,
}
