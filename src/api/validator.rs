// ==========================================
// 赛马数据门户 - 调用参数校验
// ==========================================
// 职责: 把调用方传入的原始参数（字符串/整数）转换为领域类型
// 失败一律返回 ApiError::BadRequest
// ==========================================

use chrono::NaiveDate;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::race::RaceKey;
use crate::domain::types::{MetricFamily, Venue, MAX_RACE_NO};

/// 解析赛日，接受 YYYY-MM-DD 与 YYYY/MM/DD
pub fn parse_race_date(raw: &str) -> ApiResult<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::BadRequest("赛日不能为空".to_string()));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y/%m/%d"))
        .map_err(|_| ApiError::BadRequest(format!("赛日格式错误: {}", raw)))
}

/// 解析场地（ST / HV，大小写不敏感）
pub fn parse_venue(raw: &str) -> ApiResult<Venue> {
    Venue::parse(raw).ok_or_else(|| ApiError::BadRequest(format!("未知场地: {}", raw.trim())))
}

/// 校验场次号（1..=MAX_RACE_NO）
pub fn parse_race_no(raw: i64) -> ApiResult<u32> {
    if raw < 1 || raw > i64::from(MAX_RACE_NO) {
        return Err(ApiError::BadRequest(format!(
            "场次号超出范围: {} (应为 1-{})",
            raw, MAX_RACE_NO
        )));
    }
    // 上面已确认在 u32 范围内
    Ok(raw as u32)
}

/// 解析统计族（HORSE_DRAW / WEIGHT / HORSE_DIST / JOCKEY_DIST）
pub fn parse_family(raw: &str) -> ApiResult<MetricFamily> {
    MetricFamily::parse(raw).ok_or_else(|| {
        ApiError::BadRequest(format!("未知统计族: {}", raw.trim()))
    })
}

/// 组合场次标识
pub fn parse_race_key(race_date: &str, venue: &str, race_no: i64) -> ApiResult<RaceKey> {
    Ok(RaceKey::new(
        parse_race_date(race_date)?,
        parse_venue(venue)?,
        parse_race_no(race_no)?,
    ))
}

/// 列表分页: limit 缺省取 default，钳制到 [1, max]
pub fn clamp_limit(limit: Option<i64>, default: u32, max: u32) -> u32 {
    let max = max.max(1);
    match limit {
        Some(v) => v.clamp(1, i64::from(max)) as u32,
        None => default.clamp(1, max),
    }
}

/// 列表分页: offset 小于 0 按 0 处理
pub fn clamp_offset(offset: Option<i64>) -> u32 {
    offset
        .unwrap_or(0)
        .clamp(0, i64::from(u32::MAX)) as u32
}
