// ==========================================
// 赛马数据门户 - 统计码解析
// ==========================================
// 码格式:
// - 距离类: {族前缀}_{场地}_{途程}，精确匹配
//   例: HORSE_DIST_HV_1200 / JOCKEY_DIST_ST_1650
// - 档位类: {族前缀}_，前缀匹配
//   例: HORSE_DRAW_ / WEIGHT_
// 纯函数: 相同 (族, 场次上下文) 永远得到相同的码
// ==========================================

use crate::domain::race::RaceContext;
use crate::domain::types::{MetricFamily, MetricMatch};
use crate::engine::error::{EngineError, EngineResult};

/// MetricCodeResolver - 由族别与场次上下文推导统计码
pub struct MetricCodeResolver;

impl MetricCodeResolver {
    /// 生成统计码
    ///
    /// # 参数
    /// - `family`: 统计族
    /// - `ctx`: 场次上下文（距离类需要 distance_m）
    ///
    /// # 返回
    /// - `Ok(MetricMatch::Exact)`: 距离类
    /// - `Ok(MetricMatch::Prefix)`: 档位类
    /// - `Err(MissingDistance)`: 距离类但途程为空
    pub fn build_code(family: MetricFamily, ctx: &RaceContext) -> EngineResult<MetricMatch> {
        if family.is_band() {
            return Ok(MetricMatch::Prefix(format!("{}_", family.code_prefix())));
        }

        let distance = ctx
            .distance_m
            .ok_or(EngineError::MissingDistance { race: ctx.key })?;

        Ok(MetricMatch::Exact(format!(
            "{}_{}_{}",
            family.code_prefix(),
            ctx.key.venue.to_db_str(),
            distance
        )))
    }
}
