// ==========================================
// 赛马数据门户 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有连接的 PRAGMA 行为（外键 / busy_timeout）
// - 提供开发/测试用的建表脚本（生产库由上游管线维护）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 只用于提示/告警，不做自动迁移。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn, DEFAULT_BUSY_TIMEOUT_MS)?;
    Ok(conn)
}

/// 建表（幂等）
///
/// 表结构与上游抓取/统计管线写入的列保持一致：
/// - racecard_races / racecard_entries: 排位表
/// - race_metric_scores: 组合统计（只读）
/// - horse_profiles: 马匹档案
/// - action_log / config_kv: 审计与配置
pub fn create_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS racecard_races (
            race_date TEXT NOT NULL,
            venue_code TEXT NOT NULL,
            race_no INTEGER NOT NULL,
            distance_m INTEGER,
            race_name_zh TEXT,
            course TEXT,
            going TEXT,
            class_text TEXT,
            PRIMARY KEY (race_date, venue_code, race_no)
        );

        CREATE TABLE IF NOT EXISTS racecard_entries (
            race_date TEXT NOT NULL,
            race_no INTEGER NOT NULL,
            horse_no INTEGER NOT NULL,
            horse_id TEXT,
            horse_name_zh TEXT,
            draw INTEGER,
            jockey_zh TEXT,
            scratched INTEGER DEFAULT 0,
            PRIMARY KEY (race_date, race_no, horse_no)
        );

        CREATE TABLE IF NOT EXISTS race_metric_scores (
            race_date TEXT NOT NULL,
            venue_code TEXT NOT NULL,
            race_no INTEGER NOT NULL,
            horse_id TEXT NOT NULL,
            metric_code TEXT NOT NULL,
            runs INTEGER,
            win_cnt INTEGER,
            second_cnt INTEGER,
            third_cnt INTEGER,
            fourth_cnt INTEGER,
            win_pct REAL,
            q_pct REAL,
            place_pct REAL,
            top4_pct REAL,
            score_raw REAL,
            score_norm REAL,
            score_final REAL,
            PRIMARY KEY (race_date, venue_code, race_no, horse_id, metric_code)
        );

        CREATE TABLE IF NOT EXISTS horse_profiles (
            horse_id TEXT PRIMARY KEY,
            name TEXT,
            horse_code TEXT,
            sex TEXT,
            colour TEXT,
            country TEXT,
            age INTEGER,
            trainer TEXT,
            owner TEXT,
            current_rating INTEGER,
            updated_at TEXT
        );

        CREATE TABLE IF NOT EXISTS action_log (
            action_id TEXT PRIMARY KEY,
            action_type TEXT NOT NULL,
            action_ts TEXT NOT NULL,
            actor TEXT NOT NULL,
            payload_json TEXT,
            impact_summary_json TEXT,
            detail TEXT
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE INDEX IF NOT EXISTS idx_metric_scores_race
            ON race_metric_scores (race_date, venue_code, race_no, metric_code);
        CREATE INDEX IF NOT EXISTS idx_horse_profiles_updated
            ON horse_profiles (updated_at);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
