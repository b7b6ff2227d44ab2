// ==========================================
// 赛马数据门户 - 赛事统计 API
// ==========================================
// 职责: 场次查询 → 统计码推导 → 取数 → 联表
// 调用方只传原始参数（赛日字符串 / 场地 / 场次号 / 族别）
// ==========================================

use std::sync::Arc;
use tracing::{debug, info};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{parse_family, parse_race_key};
use crate::domain::metric::StatsTable;
use crate::domain::race::{RaceContext, RaceEntry};
use crate::engine::metric_code::MetricCodeResolver;
use crate::engine::stats_join::StatsJoinEngine;
use crate::perf::PerfGuard;
use crate::repository::metric_score_repo::MetricScoreRepository;
use crate::repository::race_card_repo::RaceCardRepository;

// ==========================================
// RaceStatsApi - 赛事统计 API
// ==========================================
pub struct RaceStatsApi {
    race_card_repo: Arc<RaceCardRepository>,
    metric_score_repo: Arc<MetricScoreRepository>,
}

impl RaceStatsApi {
    pub fn new(
        race_card_repo: Arc<RaceCardRepository>,
        metric_score_repo: Arc<MetricScoreRepository>,
    ) -> Self {
        Self {
            race_card_repo,
            metric_score_repo,
        }
    }

    /// 查询场次上下文
    ///
    /// # 返回
    /// - Ok(RaceContext): 找到场次（distance_m 可能为空）
    /// - Err(NotFound): 排位表无此场次
    /// - Err(BadRequest): 参数非法
    pub fn resolve_race(
        &self,
        race_date: &str,
        venue: &str,
        race_no: i64,
    ) -> ApiResult<RaceContext> {
        let key = parse_race_key(race_date, venue, race_no)?;
        self.race_card_repo
            .find_race_context(&key)?
            .ok_or_else(|| ApiError::NotFound(format!("场次 {} 不存在", key)))
    }

    /// 查询场次的出赛马（已排除退出马，按马号升序）
    pub fn list_entries(
        &self,
        race_date: &str,
        venue: &str,
        race_no: i64,
    ) -> ApiResult<Vec<RaceEntry>> {
        let key = parse_race_key(race_date, venue, race_no)?;
        Ok(self.race_card_repo.list_active_entries(&key)?)
    }

    /// 查询场次统计
    ///
    /// # 参数
    /// - `race_date`: YYYY-MM-DD 或 YYYY/MM/DD
    /// - `venue`: ST / HV
    /// - `race_no`: 1-12
    /// - `family`: HORSE_DRAW / WEIGHT / HORSE_DIST / JOCKEY_DIST
    ///
    /// # 返回
    /// - 马匹级族别: 每匹未退出马一行
    /// - JOCKEY_DIST: 每位骑师一行
    /// - 场次不存在: 空表（不是错误）
    ///
    /// # 错误
    /// - BadRequest: 参数非法，或距离类族别但场次缺少途程
    /// - ServiceUnavailable: 连接池未就绪/已关闭
    /// - StorageFault: 查询失败
    pub fn get_stats(
        &self,
        race_date: &str,
        venue: &str,
        race_no: i64,
        family: &str,
    ) -> ApiResult<StatsTable> {
        let key = parse_race_key(race_date, venue, race_no)?;
        let family = parse_family(family)?;
        let mut perf = PerfGuard::new("race_stats.get_stats", format!("{} {}", key, family));

        let ctx = match self.race_card_repo.find_race_context(&key)? {
            Some(ctx) => ctx,
            None => {
                info!(race = %key, family = %family, "场次不存在，返回空统计");
                perf.record_rows(0);
                return Ok(StatsTable::empty(family));
            }
        };

        let metric = MetricCodeResolver::build_code(family, &ctx)?;
        debug!(race = %key, metric = %metric, "统计码已解析");

        let entries = self.race_card_repo.list_active_entries(&key)?;
        let scores = self.metric_score_repo.find_scores(&key, &metric)?;

        let table = StatsJoinEngine::join(family, &entries, &scores, &metric);
        info!(
            race_date = %key.race_date,
            venue = %key.venue,
            race_no = key.race_no,
            family = %family,
            entries = entries.len(),
            scores = scores.len(),
            rows = table.len(),
            "统计联表完成"
        );
        perf.record_rows(table.len());
        Ok(table)
    }
}
