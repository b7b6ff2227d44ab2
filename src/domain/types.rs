// ==========================================
// 赛马数据门户 - 领域类型定义
// ==========================================
// 场地代码 / 统计族别 / 统计码匹配方式
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 单日最大场次
pub const MAX_RACE_NO: u32 = 12;

// ==========================================
// 场地 (Venue)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Venue {
    ST, // 沙田
    HV, // 跑马地
}

impl Venue {
    /// 数据库存储值
    pub fn to_db_str(&self) -> &'static str {
        match self {
            Venue::ST => "ST",
            Venue::HV => "HV",
        }
    }

    /// 解析场地代码（忽略大小写与首尾空白）
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "ST" => Some(Venue::ST),
            "HV" => Some(Venue::HV),
            _ => None,
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 统计族别 (Metric Family)
// ==========================================
// 精确码: HORSE_DIST / JOCKEY_DIST（场地 + 途程）
// 前缀码: HORSE_DRAW / WEIGHT（分段边界由上游决定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricFamily {
    DrawBand,
    WeightBand,
    HorseDistance,
    JockeyDistance,
}

impl MetricFamily {
    pub const ALL: [MetricFamily; 4] = [
        MetricFamily::DrawBand,
        MetricFamily::WeightBand,
        MetricFamily::HorseDistance,
        MetricFamily::JockeyDistance,
    ];

    /// 统计码的族别前缀（不含结尾下划线）
    pub fn code_prefix(&self) -> &'static str {
        match self {
            MetricFamily::DrawBand => "HORSE_DRAW",
            MetricFamily::WeightBand => "WEIGHT",
            MetricFamily::HorseDistance => "HORSE_DIST",
            MetricFamily::JockeyDistance => "JOCKEY_DIST",
        }
    }

    /// 是否按前缀匹配（分段族别）
    pub fn is_band(&self) -> bool {
        matches!(self, MetricFamily::DrawBand | MetricFamily::WeightBand)
    }

    /// 是否为骑师级统计（按骑师聚合而非按马）
    pub fn is_jockey_level(&self) -> bool {
        matches!(self, MetricFamily::JockeyDistance)
    }

    /// 解析族别名称，接受 `HORSE_DIST` / `horse_dist` 等写法
    pub fn parse(raw: &str) -> Option<Self> {
        let upper = raw.trim().trim_end_matches('_').to_uppercase();
        Self::ALL
            .into_iter()
            .find(|family| family.code_prefix() == upper)
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code_prefix())
    }
}

// ==========================================
// 统计码匹配方式 (Metric Match)
// ==========================================
// 精确码与前缀码在类型上分开，避免随手拼接字符串
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "code", rename_all = "lowercase")]
pub enum MetricMatch {
    /// 整码相等，例如 `HORSE_DIST_HV_1200`
    Exact(String),
    /// 前缀相等，例如 `WEIGHT_`
    Prefix(String),
}

impl MetricMatch {
    /// 统计码或前缀本身
    pub fn as_str(&self) -> &str {
        match self {
            MetricMatch::Exact(code) | MetricMatch::Prefix(code) => code,
        }
    }

    pub fn is_prefix(&self) -> bool {
        matches!(self, MetricMatch::Prefix(_))
    }

    /// 判断某一行的 metric_code 是否命中
    pub fn matches(&self, metric_code: &str) -> bool {
        match self {
            MetricMatch::Exact(code) => metric_code == code,
            MetricMatch::Prefix(prefix) => metric_code.starts_with(prefix.as_str()),
        }
    }
}

impl fmt::Display for MetricMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricMatch::Exact(code) => write!(f, "{}", code),
            MetricMatch::Prefix(prefix) => write!(f, "{}*", prefix),
        }
    }
}
