// ==========================================
// 赛马数据门户 - API层错误类型
// ==========================================
// 职责: 对调用方只暴露五类失败
// - BadRequest: 参数/场次上下文不合法
// - NotFound: 指定资源不存在
// - PermissionDenied: 角色无权执行写操作
// - ServiceUnavailable: 存储暂不可用，可稍后重试
// - StorageFault: 查询或事务执行失败
// ==========================================

use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("权限不足: {0}")]
    PermissionDenied(String),

    #[error("服务暂不可用: {0}")]
    ServiceUnavailable(String),

    #[error("存储执行失败: {0}")]
    StorageFault(String),
}

impl ApiError {
    /// 稳定的错误码（供 HTTP 层映射状态码）
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::PermissionDenied(_) => "PERMISSION_DENIED",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::StorageFault(_) => "STORAGE_FAULT",
        }
    }

    /// 调用方是否可以原样重试
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::ServiceUnavailable(_))
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        if err.is_unavailable() {
            return ApiError::ServiceUnavailable(err.to_string());
        }
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            other => ApiError::StorageFault(other.to_string()),
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::MissingDistance { .. } => ApiError::BadRequest(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
