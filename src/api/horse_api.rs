// ==========================================
// 赛马数据门户 - 马匹档案 API
// ==========================================
// 职责: 马匹列表 / 单马查询 / 白名单字段批量编辑
// 批量编辑: 权限校验 → 过滤无效编辑 → 单事务执行 → 审计日志
// ==========================================

use std::sync::Arc;

use chrono::Local;
use serde_json::{json, Value as JsonValue};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{clamp_limit, clamp_offset};
use crate::config::config_manager::PortalSettings;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::horse::{normalize_horse_id, BulkEditOutcome, HorseEdit, HorseProfile, HorseQuery};
use crate::perf::PerfGuard;
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::horse_profile_repo::HorseProfileRepository;

// ==========================================
// HorseApi - 马匹档案 API
// ==========================================
pub struct HorseApi {
    horse_repo: Arc<HorseProfileRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    settings: Arc<PortalSettings>,
}

impl HorseApi {
    pub fn new(
        horse_repo: Arc<HorseProfileRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        settings: Arc<PortalSettings>,
    ) -> Self {
        Self {
            horse_repo,
            action_log_repo,
            settings,
        }
    }

    /// 马匹列表
    ///
    /// # 参数
    /// - `keyword`: 马名 / horse_id / 烙号 / 马主 包含匹配
    /// - `sex`: 性别
    /// - `limit`: 缺省取配置默认值，钳制到 [1, max_limit]
    /// - `offset`: 小于 0 按 0 处理
    pub fn list_horses(
        &self,
        keyword: Option<&str>,
        sex: Option<&str>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> ApiResult<Vec<HorseProfile>> {
        let query = HorseQuery {
            keyword: keyword.map(str::to_string),
            sex: sex.map(str::to_string),
            limit: clamp_limit(limit, self.settings.default_limit, self.settings.max_limit),
            offset: clamp_offset(offset),
        };
        let mut perf = PerfGuard::new(
            "horse.list",
            format!("keyword={:?} limit={} offset={}", query.keyword, query.limit, query.offset),
        );

        let horses = self.horse_repo.search(&query)?;
        perf.record_rows(horses.len());
        Ok(horses)
    }

    /// 单马详情
    pub fn get_horse(&self, horse_id: &str) -> ApiResult<HorseProfile> {
        let normalized = normalize_horse_id(horse_id)
            .ok_or_else(|| ApiError::BadRequest("horse_id 不能为空".to_string()))?;

        self.horse_repo
            .find_by_id(&normalized)?
            .ok_or_else(|| ApiError::NotFound(format!("马匹(id={})不存在", normalized)))
    }

    /// 马匹档案总数
    pub fn count_horses(&self) -> ApiResult<i64> {
        Ok(self.horse_repo.count()?)
    }

    /// 批量编辑马匹档案
    ///
    /// # 参数
    /// - `role`: 调用方已认证的角色
    /// - `actor`: 操作人（写入审计日志）
    /// - `edits`: 按顺序执行的编辑请求
    ///
    /// # 语义
    /// - 非特权角色: PermissionDenied，不触碰存储
    /// - 缺 horse_id 或无白名单字段的编辑: 跳过
    /// - 任一编辑执行失败: 整批回滚，返回 StorageFault
    /// - horse_id 不存在: 该条计 0，不是错误
    pub fn bulk_edit(
        &self,
        role: &str,
        actor: &str,
        edits: Vec<HorseEdit>,
    ) -> ApiResult<BulkEditOutcome> {
        self.ensure_privileged(role, actor)?;
        if edits.len() > self.settings.max_batch_size {
            return Err(ApiError::BadRequest(format!(
                "单批最多 {} 条编辑，实际 {} 条",
                self.settings.max_batch_size,
                edits.len()
            )));
        }

        let batch_id = uuid::Uuid::new_v4().to_string();
        let mut perf = PerfGuard::new("horse.bulk_edit", format!("batch_id={}", batch_id));

        let patches: Vec<_> = edits.iter().filter_map(HorseEdit::to_patch).collect();
        let skipped = edits.len() - patches.len();

        let stamp = Local::now().naive_local();
        let updated_count = self.horse_repo.bulk_update(&patches, stamp).map_err(|e| {
            warn!(batch_id = %batch_id, error = %e, "批量编辑失败，已回滚");
            ApiError::from(e)
        })?;

        let outcome = BulkEditOutcome {
            batch_id,
            updated_count,
            attempted: patches.len(),
            skipped,
        };
        perf.record_rows(updated_count);
        info!(
            batch_id = %outcome.batch_id,
            actor,
            attempted = outcome.attempted,
            skipped = outcome.skipped,
            updated_count = outcome.updated_count,
            "批量编辑已提交"
        );

        if !patches.is_empty() {
            let horse_ids: Vec<&str> = patches.iter().map(|p| p.horse_id.as_str()).collect();
            let action_log = ActionLog {
                action_id: outcome.batch_id.clone(),
                action_type: ActionType::HorseBulkEdit.to_db_str().to_string(),
                action_ts: stamp,
                actor: actor.to_string(),
                payload_json: Some(json!({
                    "role": role.trim(),
                    "horse_ids": horse_ids,
                    "patches": patches,
                })),
                impact_summary_json: Some(json!({
                    "attempted": outcome.attempted,
                    "skipped": outcome.skipped,
                    "updated_count": outcome.updated_count,
                })),
                detail: None,
            };

            // 事务已提交，审计失败只告警
            if let Err(e) = self.action_log_repo.insert(&action_log) {
                warn!(batch_id = %outcome.batch_id, error = %e, "记录操作日志失败");
            }
        }

        Ok(outcome)
    }

    /// 最近的批量编辑审计记录（按时间倒序）
    ///
    /// `limit` 缺省取配置默认值，钳制到 [1, max_limit]
    pub fn recent_bulk_edits(&self, limit: Option<i64>) -> ApiResult<Vec<ActionLog>> {
        let limit = clamp_limit(limit, self.settings.default_limit, self.settings.max_limit);
        Ok(self
            .action_log_repo
            .find_by_action_type(ActionType::HorseBulkEdit.to_db_str(), limit)?)
    }

    /// 批量编辑（JSON 入参）
    ///
    /// 接受编辑数组，或 `{"edits": [...]}`；每条只挑出白名单字段
    pub fn bulk_edit_json(
        &self,
        role: &str,
        actor: &str,
        payload: &JsonValue,
    ) -> ApiResult<BulkEditOutcome> {
        self.ensure_privileged(role, actor)?;
        let items = match payload {
            JsonValue::Array(items) => items,
            JsonValue::Object(obj) => match obj.get("edits") {
                Some(JsonValue::Array(items)) => items,
                _ => {
                    return Err(ApiError::BadRequest(
                        "请求体缺少 edits 数组".to_string(),
                    ))
                }
            },
            _ => return Err(ApiError::BadRequest("请求体必须是编辑数组".to_string())),
        };

        let edits = items.iter().map(HorseEdit::from_json).collect();
        self.bulk_edit(role, actor, edits)
    }

    /// 写操作权限校验（在任何存储访问之前）
    fn ensure_privileged(&self, role: &str, actor: &str) -> ApiResult<()> {
        if self.settings.is_privileged(role) {
            return Ok(());
        }
        warn!(role, actor, "非特权角色尝试批量编辑");
        Err(ApiError::PermissionDenied(format!(
            "角色 {} 无批量编辑权限",
            role.trim()
        )))
    }
}
