// ==========================================
// 赛马数据门户 - SQLite 连接池
// ==========================================
// 底层: r2d2 + r2d2_sqlite，每个新连接经 init 钩子统一 PRAGMA 与 trace
// 生命周期: 进程启动时创建一次 → initialize → shutdown
// 未初始化/已关闭/等待超时 均由 API 层映射为 ServiceUnavailable
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::db::{configure_sqlite_connection, DEFAULT_BUSY_TIMEOUT_MS};
use crate::perf::{install_sqlite_tracing, PerfSettings};
use crate::repository::error::{RepositoryError, RepositoryResult};

/// 默认连接数
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// 连接数上限
pub const MAX_POOL_SIZE: u32 = 64;

/// 借连接的最长等待（毫秒）
pub const DEFAULT_ACQUIRE_TIMEOUT_MS: u64 = 3_000;

/// 借出的连接，Drop 时归还连接池
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

// ==========================================
// PoolSettings - 连接池配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    pub db_path: String,
    pub size: u32,
    pub busy_timeout_ms: u64,
    pub acquire_timeout_ms: u64,
    pub perf: PerfSettings,
}

impl PoolSettings {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            size: DEFAULT_POOL_SIZE,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            acquire_timeout_ms: DEFAULT_ACQUIRE_TIMEOUT_MS,
            perf: PerfSettings::default(),
        }
    }

    pub fn with_size(mut self, size: u32) -> Self {
        self.size = size.clamp(1, MAX_POOL_SIZE);
        self
    }

    /// r2d2 要求等待时间非零
    pub fn with_acquire_timeout_ms(mut self, ms: u64) -> Self {
        self.acquire_timeout_ms = ms.max(1);
        self
    }

    /// 读取 HKJC_PORTAL_POOL_SIZE / HKJC_PORTAL_POOL_TIMEOUT_MS 及性能埋点开关
    pub fn from_env(db_path: impl Into<String>) -> Self {
        let size = std::env::var("HKJC_PORTAL_POOL_SIZE")
            .ok()
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_POOL_SIZE);
        let timeout_ms = std::env::var("HKJC_PORTAL_POOL_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_ACQUIRE_TIMEOUT_MS);

        let mut settings = Self::new(db_path)
            .with_size(size)
            .with_acquire_timeout_ms(timeout_ms);
        settings.perf = PerfSettings::from_env();
        settings
    }
}

enum PoolState {
    NotReady,
    Ready(Pool<SqliteConnectionManager>),
    Closed,
}

/// 建连失败改走 tracing
#[derive(Debug)]
struct TracingErrorHandler;

impl r2d2::HandleError<rusqlite::Error> for TracingErrorHandler {
    fn handle_error(&self, error: rusqlite::Error) {
        tracing::warn!(error = %error, "连接池建立连接失败");
    }
}

fn build_pool(settings: &PoolSettings) -> RepositoryResult<Pool<SqliteConnectionManager>> {
    let busy_timeout_ms = settings.busy_timeout_ms;
    let perf = settings.perf;
    let manager = SqliteConnectionManager::file(&settings.db_path).with_init(move |conn| {
        configure_sqlite_connection(conn, busy_timeout_ms)?;
        install_sqlite_tracing(conn, &perf);
        Ok(())
    });

    Pool::builder()
        .max_size(settings.size)
        .connection_timeout(Duration::from_millis(settings.acquire_timeout_ms))
        .error_handler(Box::new(TracingErrorHandler))
        .build(manager)
        .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))
}

// ==========================================
// DbPool - 有界连接池句柄
// ==========================================
/// 可克隆的连接池句柄，所有仓储共享同一实例
#[derive(Clone)]
pub struct DbPool {
    settings: Arc<PoolSettings>,
    state: Arc<Mutex<PoolState>>,
}

impl DbPool {
    /// 创建未就绪的连接池（尚未打开任何连接）
    pub fn new(settings: PoolSettings) -> Self {
        Self {
            settings: Arc::new(settings),
            state: Arc::new(Mutex::new(PoolState::NotReady)),
        }
    }

    /// 创建并立即初始化
    pub fn open(settings: PoolSettings) -> RepositoryResult<Self> {
        let pool = Self::new(settings);
        pool.initialize()?;
        Ok(pool)
    }

    pub fn settings(&self) -> &PoolSettings {
        &self.settings
    }

    fn lock_state(&self) -> RepositoryResult<MutexGuard<'_, PoolState>> {
        self.state
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 建立全部连接，进入 Ready 状态
    ///
    /// - 已 Ready 时为幂等操作
    /// - 已 Closed 时返回 PoolClosed
    /// - 建连失败则整体失败，状态保持 NotReady
    pub fn initialize(&self) -> RepositoryResult<()> {
        let mut state = self.lock_state()?;
        match *state {
            PoolState::Ready(_) => return Ok(()),
            PoolState::Closed => return Err(RepositoryError::PoolClosed),
            PoolState::NotReady => {}
        }

        let pool = build_pool(&self.settings)?;
        tracing::info!(
            db_path = %self.settings.db_path,
            size = self.settings.size,
            acquire_timeout_ms = self.settings.acquire_timeout_ms,
            "连接池初始化完成"
        );
        *state = PoolState::Ready(pool);
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.lock_state().as_deref(), Ok(PoolState::Ready(_)))
    }

    /// 借出一个连接
    ///
    /// 全部借出时最多等待 acquire_timeout_ms，超时返回 PoolExhausted
    pub fn acquire(&self) -> RepositoryResult<PooledConnection> {
        // 先克隆句柄再等待，等待期间不持有状态锁
        let pool = match &*self.lock_state()? {
            PoolState::Ready(pool) => pool.clone(),
            PoolState::NotReady => {
                return Err(RepositoryError::PoolNotReady(
                    "连接池尚未初始化".to_string(),
                ))
            }
            PoolState::Closed => return Err(RepositoryError::PoolClosed),
        };

        pool.get().map_err(|e| {
            tracing::warn!(
                timeout_ms = self.settings.acquire_timeout_ms,
                error = %e,
                "等待空闲连接超时"
            );
            RepositoryError::PoolExhausted(e.to_string())
        })
    }

    /// 当前空闲连接数（未就绪/已关闭时为 0）
    pub fn idle_count(&self) -> usize {
        match self.lock_state().as_deref() {
            Ok(PoolState::Ready(pool)) => pool.state().idle_connections as usize,
            _ => 0,
        }
    }

    /// 关闭连接池：空闲连接随池释放，借出中的连接在归还时释放
    pub fn shutdown(&self) {
        match self.state.lock() {
            Ok(mut state) => *state = PoolState::Closed,
            Err(poisoned) => *poisoned.into_inner() = PoolState::Closed,
        }
        tracing::info!(db_path = %self.settings.db_path, "连接池已关闭");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::NamedTempFile;

    fn temp_settings(size: u32) -> (NamedTempFile, PoolSettings) {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_string();
        (file, PoolSettings::new(path).with_size(size))
    }

    #[test]
    fn test_acquire_before_initialize_is_not_ready() {
        let (_file, settings) = temp_settings(2);
        let pool = DbPool::new(settings);

        assert!(!pool.is_ready());
        assert!(matches!(pool.acquire(), Err(RepositoryError::PoolNotReady(_))));
    }

    #[test]
    fn test_connection_returns_on_drop() {
        let (_file, settings) = temp_settings(2);
        let pool = DbPool::open(settings).unwrap();
        assert_eq!(pool.idle_count(), 2);

        {
            let conn = pool.acquire().unwrap();
            let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
            assert_eq!(one, 1);
            assert_eq!(pool.idle_count(), 1);
        }

        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn test_init_hook_configures_every_connection() {
        let (_file, settings) = temp_settings(2);
        let pool = DbPool::open(settings).unwrap();

        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        for conn in [&a, &b] {
            let busy: i64 = conn
                .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
                .unwrap();
            let fk: i64 = conn
                .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
                .unwrap();
            assert_eq!(busy, DEFAULT_BUSY_TIMEOUT_MS as i64);
            assert_eq!(fk, 1);
        }
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let (_file, settings) = temp_settings(3);
        let pool = DbPool::open(settings).unwrap();
        pool.initialize().unwrap();
        assert!(pool.is_ready());
        assert_eq!(pool.idle_count(), 3);
    }

    #[test]
    fn test_settings_are_clamped() {
        assert_eq!(PoolSettings::new("x").with_size(0).size, 1);
        assert_eq!(PoolSettings::new("x").with_size(1000).size, MAX_POOL_SIZE);
        assert_eq!(
            PoolSettings::new("x").with_acquire_timeout_ms(0).acquire_timeout_ms,
            1
        );
    }

    #[test]
    fn test_shutdown_rejects_new_acquires() {
        let (_file, settings) = temp_settings(1);
        let pool = DbPool::open(settings).unwrap();
        let held = pool.acquire().unwrap();

        pool.shutdown();
        assert!(matches!(pool.acquire(), Err(RepositoryError::PoolClosed)));
        assert!(matches!(pool.initialize(), Err(RepositoryError::PoolClosed)));

        drop(held);
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn test_exhausted_pool_waits_for_return() {
        let (_file, settings) = temp_settings(1);
        let pool = DbPool::open(settings).unwrap();
        let held = pool.acquire().unwrap();

        let waiter = {
            let pool = pool.clone();
            thread::spawn(move || pool.acquire().map(|_| ()).is_ok())
        };

        thread::sleep(Duration::from_millis(50));
        drop(held);
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn test_exhausted_pool_times_out_as_unavailable() {
        let (_file, settings) = temp_settings(1);
        let pool = DbPool::open(settings.with_acquire_timeout_ms(100)).unwrap();
        let _held = pool.acquire().unwrap();

        let waiter = {
            let pool = pool.clone();
            thread::spawn(move || pool.acquire().map(|_| ()))
        };

        let err = waiter.join().unwrap().unwrap_err();
        assert!(matches!(err, RepositoryError::PoolExhausted(_)), "got {err:?}");
        assert!(err.is_unavailable());
    }
}
