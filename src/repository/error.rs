// ==========================================
// 赛马数据门户 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    // ===== 连接池错误 =====
    #[error("连接池未就绪: {0}")]
    PoolNotReady(String),

    #[error("连接池已关闭")]
    PoolClosed,

    #[error("等待空闲连接超时: {0}")]
    PoolExhausted(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    // ===== 数据库错误 =====
    #[error("记录未找到: {entity} with id={id}")]
    NotFound { entity: String, id: String },

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    /// 批量事务中某一条执行失败，整批已回滚
    #[error("批量事务已回滚: 第{index}条 (horse_id={horse_id}) 执行失败: {message}")]
    BatchAborted {
        index: usize,
        horse_id: String,
        message: String,
    },

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RepositoryError {
    /// 是否属于“存储暂不可用”（调用方可稍后重试）
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            RepositoryError::PoolNotReady(_)
                | RepositoryError::PoolClosed
                | RepositoryError::PoolExhausted(_)
                | RepositoryError::DatabaseConnectionError(_)
                | RepositoryError::LockError(_)
        )
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(code, msg) => {
                let msg = msg.unwrap_or_else(|| code.to_string());
                match code.code {
                    rusqlite::ErrorCode::CannotOpen
                    | rusqlite::ErrorCode::NotADatabase
                    | rusqlite::ErrorCode::DatabaseBusy
                    | rusqlite::ErrorCode::DatabaseLocked => {
                        RepositoryError::DatabaseConnectionError(msg)
                    }
                    _ if msg.contains("UNIQUE") => RepositoryError::UniqueConstraintViolation(msg),
                    _ => RepositoryError::DatabaseQueryError(msg),
                }
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Unknown".to_string(),
                id: "Unknown".to_string(),
            },
            _ => RepositoryError::DatabaseQueryError(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_classification() {
        assert!(RepositoryError::PoolNotReady("init".into()).is_unavailable());
        assert!(RepositoryError::PoolClosed.is_unavailable());
        assert!(RepositoryError::PoolExhausted("timed out".into()).is_unavailable());
        assert!(!RepositoryError::DatabaseQueryError("x".into()).is_unavailable());
        assert!(!RepositoryError::BatchAborted {
            index: 2,
            horse_id: "H3".into(),
            message: "boom".into(),
        }
        .is_unavailable());
    }

    #[test]
    fn test_from_sqlite_abort() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn
            .execute_batch("SELECT RAISE(ABORT, 'boom');")
            .unwrap_err();
        let repo_err: RepositoryError = err.into();
        assert!(matches!(repo_err, RepositoryError::DatabaseQueryError(_)));
    }
}
