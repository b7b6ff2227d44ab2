// ==========================================
// 赛马数据门户 - 性能埋点
// ==========================================
// 1. 连接级: SQLite trace/profile 回调，统计语句数并告警慢 SQL
// 2. 操作级: PerfGuard 记录一次 API 调用（场次统计/批量编辑/马匹列表）
//    的耗时、语句数、输出行数
// 计数器按线程存放，一次 API 调用在单线程内完成
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

static SLOW_SQL_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static ACTIVE_GUARDS: Cell<u32> = Cell::new(0);
    static SQL_COUNT: Cell<u64> = Cell::new(0);
    static SLOW_SQL_COUNT: Cell<u64> = Cell::new(0);
}

// ==========================================
// PerfSettings - 埋点开关
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfSettings {
    /// 是否给连接安装 trace/profile 回调
    pub sql_tracing: bool,
    /// 慢 SQL 阈值（毫秒），0 表示不告警
    pub slow_sql_ms: u64,
}

impl Default for PerfSettings {
    /// Debug 构建默认开启，阈值 50ms；Release 默认关闭，阈值 200ms
    fn default() -> Self {
        Self {
            sql_tracing: cfg!(debug_assertions),
            slow_sql_ms: if cfg!(debug_assertions) { 50 } else { 200 },
        }
    }
}

impl PerfSettings {
    /// 读取 HKJC_PORTAL_PERF_SQL / HKJC_PORTAL_SLOW_SQL_MS，缺省或非法时取默认值
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            sql_tracing: std::env::var("HKJC_PORTAL_PERF_SQL")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.sql_tracing),
            slow_sql_ms: std::env::var("HKJC_PORTAL_SLOW_SQL_MS")
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(defaults.slow_sql_ms),
        }
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// 压成单行并按字符截断（SQL 中可能含中文字面量）
fn truncate_sql(sql: &str, max_chars: usize) -> String {
    let flat = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &flat[..cut]),
        None => flat,
    }
}

/// 按配置安装或卸载连接的 trace/profile 回调
///
/// 连接池在每个新连接建立时调用一次。
pub fn install_sqlite_tracing(conn: &mut Connection, settings: &PerfSettings) {
    if !settings.sql_tracing {
        conn.trace(None);
        conn.profile(None);
        return;
    }

    SLOW_SQL_THRESHOLD_MS.store(settings.slow_sql_ms, Ordering::Relaxed);
    conn.trace(Some(count_statement));
    conn.profile(Some(check_slow_statement));
}

fn count_statement(_sql: &str) {
    if ACTIVE_GUARDS.with(|d| d.get() > 0) {
        SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));
    }
}

fn check_slow_statement(sql: &str, duration: Duration) {
    let threshold = SLOW_SQL_THRESHOLD_MS.load(Ordering::Relaxed);
    let ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    if threshold == 0 || ms < threshold {
        return;
    }

    tracing::warn!(
        target: "slow_sql",
        duration_ms = ms,
        sql = %truncate_sql(sql, 420),
        "slow sql"
    );
    if ACTIVE_GUARDS.with(|d| d.get() > 0) {
        SLOW_SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));
    }
}

/// 一次操作的统计快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerfSample {
    pub elapsed_ms: u64,
    pub sql_count: u64,
    pub slow_sql_count: u64,
}

// ==========================================
// PerfGuard - API 操作埋点
// ==========================================
/// Drop 时以 target `perf` 输出一条 info 日志
///
/// ```ignore
/// let mut perf = PerfGuard::new("race_stats.get_stats", key.to_string());
/// // ...
/// perf.record_rows(table.len());
/// ```
pub struct PerfGuard {
    op: &'static str,
    /// 业务上下文，如场次标识或批次号
    context: String,
    rows: Option<usize>,
    start: Instant,
    sql_start: u64,
    slow_sql_start: u64,
}

impl PerfGuard {
    pub fn new(op: &'static str, context: impl Into<String>) -> Self {
        ACTIVE_GUARDS.with(|d| d.set(d.get().saturating_add(1)));
        Self {
            op,
            context: context.into(),
            rows: None,
            start: Instant::now(),
            sql_start: SQL_COUNT.with(|c| c.get()),
            slow_sql_start: SLOW_SQL_COUNT.with(|c| c.get()),
        }
    }

    /// 记录本次操作的输出行数（联表行数 / 更新行数）
    pub fn record_rows(&mut self, rows: usize) {
        self.rows = Some(rows);
    }

    pub fn sample(&self) -> PerfSample {
        PerfSample {
            elapsed_ms: u64::try_from(self.start.elapsed().as_millis()).unwrap_or(u64::MAX),
            sql_count: SQL_COUNT.with(|c| c.get()).saturating_sub(self.sql_start),
            slow_sql_count: SLOW_SQL_COUNT
                .with(|c| c.get())
                .saturating_sub(self.slow_sql_start),
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let sample = self.sample();
        tracing::info!(
            target: "perf",
            op = self.op,
            context = %self.context,
            rows = ?self.rows,
            elapsed_ms = sample.elapsed_ms,
            sql_count = sample.sql_count,
            slow_sql_count = sample.slow_sql_count,
            "done"
        );
        ACTIVE_GUARDS.with(|d| d.set(d.get().saturating_sub(1)));
    }
}
