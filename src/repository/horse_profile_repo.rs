// ==========================================
// 赛马数据门户 - 马匹档案数据仓储
// ==========================================
// 读: 列表 / 单马 / 计数
// 写: 白名单字段批量更新（单事务，全部成功或全部回滚）
// ==========================================

use crate::domain::horse::{normalize_horse_id, FieldValue, HorsePatch, HorseProfile, HorseQuery};
use crate::pool::{DbPool, PooledConnection};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Result as SqliteResult, Row};

const PROFILE_COLUMNS: &str = r#"
    horse_id, name, horse_code, sex, colour, country, age,
    trainer, owner, current_rating, updated_at
"#;

/// updated_at 写入格式
pub const UPDATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ==========================================
// HorseProfileRepository - 马匹档案仓储
// ==========================================
pub struct HorseProfileRepository {
    pool: DbPool,
}

impl HorseProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn get_conn(&self) -> RepositoryResult<PooledConnection> {
        self.pool.acquire()
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 horse_id 查询（大小写/首尾空白不敏感）
    pub fn find_by_id(&self, horse_id: &str) -> RepositoryResult<Option<HorseProfile>> {
        let Some(normalized) = normalize_horse_id(horse_id) else {
            return Ok(None);
        };
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {PROFILE_COLUMNS} FROM horse_profiles WHERE UPPER(TRIM(horse_id)) = ?1 LIMIT 1"
        );
        let mut stmt = conn.prepare(&sql)?;

        match stmt.query_row(params![normalized], map_profile) {
            Ok(profile) => Ok(Some(profile)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 条件查询马匹列表
    ///
    /// # 参数
    /// - `query.keyword`: 对马名 / horse_id / 烙号 / 马主做包含匹配
    /// - `query.sex`: 性别精确匹配
    /// - `query.limit` / `query.offset`: 已由调用方钳制
    ///
    /// # 排序
    /// updated_at 倒序，其次 horse_id
    pub fn search(&self, query: &HorseQuery) -> RepositoryResult<Vec<HorseProfile>> {
        let conn = self.get_conn()?;

        let mut sql = format!("SELECT {PROFILE_COLUMNS} FROM horse_profiles WHERE 1 = 1");
        let mut values: Vec<Value> = Vec::new();
        let mut idx: i32 = 1;

        if let Some(keyword) = query.keyword.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            sql.push_str(&format!(
                " AND (name LIKE ?{idx} ESCAPE '\\' OR horse_id LIKE ?{idx} ESCAPE '\\' \
                 OR horse_code LIKE ?{idx} ESCAPE '\\' OR owner LIKE ?{idx} ESCAPE '\\')"
            ));
            values.push(Value::from(like_pattern(keyword)));
            idx += 1;
        }
        if let Some(sex) = query.sex.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            sql.push_str(&format!(" AND sex = ?{idx}"));
            values.push(Value::from(sex.to_string()));
            idx += 1;
        }

        sql.push_str(&format!(
            " ORDER BY updated_at DESC, horse_id ASC LIMIT ?{} OFFSET ?{}",
            idx,
            idx + 1
        ));
        values.push(Value::from(query.limit));
        values.push(Value::from(query.offset));

        let mut stmt = conn.prepare(&sql)?;
        let profiles = stmt
            .query_map(params_from_iter(values), map_profile)?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(profiles)
    }

    /// 档案总数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM horse_profiles", [], |row| row.get(0))?;
        Ok(count)
    }

    /// 连通性探测
    pub fn ping(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 批量应用补丁（单事务）
    ///
    /// # 参数
    /// - `patches`: 已校验的补丁，按请求顺序执行
    /// - `stamp`: 本批统一的 updated_at
    ///
    /// # 返回
    /// - `Ok(n)`: 各条 UPDATE 影响行数之和（不存在的 horse_id 计 0）
    /// - `Err(BatchAborted)`: 某条执行失败，整批回滚，库中无任何改动
    pub fn bulk_update(&self, patches: &[HorsePatch], stamp: NaiveDateTime) -> RepositoryResult<usize> {
        if patches.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        let stamp_str = stamp.format(UPDATED_AT_FORMAT).to_string();

        let mut updated = 0usize;
        for (index, patch) in patches.iter().enumerate() {
            let (sql, values) = build_update(patch, &stamp_str);
            match tx.execute(&sql, params_from_iter(values)) {
                Ok(changed) => updated += changed,
                Err(e) => {
                    if let Err(rb) = tx.rollback() {
                        tracing::error!(error = %rb, "批量更新回滚失败");
                    }
                    return Err(RepositoryError::BatchAborted {
                        index,
                        horse_id: patch.horse_id.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(updated)
    }
}

/// 构造单条补丁的 UPDATE 语句
///
/// 列名只来自 EditableField::column()，不拼接外部输入
fn build_update(patch: &HorsePatch, stamp: &str) -> (String, Vec<Value>) {
    let mut assignments = Vec::with_capacity(patch.changes.len() + 1);
    let mut values: Vec<Value> = Vec::with_capacity(patch.changes.len() + 2);

    for (i, change) in patch.changes.iter().enumerate() {
        assignments.push(format!("{} = ?{}", change.field.column(), i + 1));
        values.push(match &change.value {
            FieldValue::Text(s) => Value::from(s.clone()),
            FieldValue::Integer(n) => Value::from(*n),
        });
    }

    let stamp_idx = values.len() + 1;
    assignments.push(format!("updated_at = ?{stamp_idx}"));
    values.push(Value::from(stamp.to_string()));
    values.push(Value::from(patch.horse_id.clone()));

    let sql = format!(
        "UPDATE horse_profiles SET {} WHERE UPPER(TRIM(horse_id)) = ?{}",
        assignments.join(", "),
        stamp_idx + 1
    );
    (sql, values)
}

/// LIKE 包含匹配，转义 % _ \
fn like_pattern(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len() + 2);
    escaped.push('%');
    for ch in keyword.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn parse_updated_at(raw: Option<String>) -> Option<NaiveDateTime> {
    let raw = raw?;
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, UPDATED_AT_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

fn map_profile(row: &Row<'_>) -> SqliteResult<HorseProfile> {
    let raw_id: String = row.get(0)?;
    Ok(HorseProfile {
        horse_id: normalize_horse_id(&raw_id).unwrap_or(raw_id),
        name: row.get(1)?,
        horse_code: row.get(2)?,
        sex: row.get(3)?,
        colour: row.get(4)?,
        country: row.get(5)?,
        age: row.get(6)?,
        trainer_id: row.get(7)?,
        owner: row.get(8)?,
        current_rating: row.get(9)?,
        updated_at: parse_updated_at(row.get(10)?),
    })
}
