// ==========================================
// 赛马数据门户 - 马匹档案领域模型
// ==========================================
// 可外部修改字段白名单: owner / trainer_id / current_rating
// 其余字段对本核心只读
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// 规范化 horse_id: 去首尾空白 + 统一大写
///
/// 上游入库的 horse_id 存在大小写/补空格不一致，所有外部行在进入核心时
/// 统一经过此函数，核心内部联表只做精确相等比较。
/// 规范化后为空串视为缺失。
pub fn normalize_horse_id(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_uppercase())
}

// ==========================================
// HorseProfile - 马匹档案
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorseProfile {
    pub horse_id: String,
    pub name: Option<String>,
    pub horse_code: Option<String>,
    pub sex: Option<String>,
    pub colour: Option<String>,
    pub country: Option<String>,
    pub age: Option<i64>,
    pub trainer_id: Option<String>,
    pub owner: Option<String>,
    pub current_rating: Option<i64>,
    pub updated_at: Option<NaiveDateTime>,
}

// ==========================================
// HorseQuery - 马匹列表查询条件
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HorseQuery {
    /// 模糊搜索: 马名 / horse_id / 烙号 / 马主
    pub keyword: Option<String>,
    pub sex: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

// ==========================================
// EditableField - 白名单字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditableField {
    Owner,
    TrainerId,
    CurrentRating,
}

impl EditableField {
    pub const ALL: [EditableField; 3] = [
        EditableField::Owner,
        EditableField::TrainerId,
        EditableField::CurrentRating,
    ];

    /// 请求中的字段名
    pub fn request_key(&self) -> &'static str {
        match self {
            EditableField::Owner => "owner",
            EditableField::TrainerId => "trainer_id",
            EditableField::CurrentRating => "current_rating",
        }
    }

    /// horse_profiles 表中的列名（trainer_id 存于 trainer 列）
    pub fn column(&self) -> &'static str {
        match self {
            EditableField::Owner => "owner",
            EditableField::TrainerId => "trainer",
            EditableField::CurrentRating => "current_rating",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: EditableField,
    pub value: FieldValue,
}

// ==========================================
// HorseEdit - 批量编辑中的单条请求
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HorseEdit {
    #[serde(default, deserialize_with = "lenient::horse_id")]
    pub horse_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub owner: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub trainer_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::rating")]
    pub current_rating: Option<i64>,
}

/// 单字段宽松解析：类型不符的值视为缺失，不让整条编辑失败
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value as JsonValue;

    /// 文本字段只接受字符串
    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match JsonValue::deserialize(d)? {
            JsonValue::String(s) => Some(s),
            _ => None,
        })
    }

    /// horse_id 接受字符串或数字
    pub fn horse_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match JsonValue::deserialize(d)? {
            JsonValue::String(s) => Some(s),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// 评分接受整数、整值浮点或整数字符串
    pub fn rating<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        Ok(match JsonValue::deserialize(d)? {
            JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_i64)),
            JsonValue::String(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        })
    }

    /// 超出 i64 范围或带小数的浮点返回 None，不做饱和截断
    pub(super) fn whole_i64(f: f64) -> Option<i64> {
        // i64::MIN 恰为 -2^63，上界 2^63 不可取
        let lower = i64::MIN as f64;
        let in_range = f >= lower && f < -lower;
        (in_range && f.fract() == 0.0).then(|| f as i64)
    }
}

impl HorseEdit {
    /// 从任意 JSON 值中只挑出白名单字段
    ///
    /// - 非对象 → 空编辑（后续被跳过）
    /// - 其余键一律忽略
    pub fn from_json(value: &JsonValue) -> Self {
        if !value.is_object() {
            return HorseEdit::default();
        }
        HorseEdit::deserialize(value).unwrap_or_default()
    }

    /// 出现且非空的白名单字段
    pub fn changes(&self) -> Vec<FieldChange> {
        let mut changes = Vec::new();
        if let Some(owner) = &self.owner {
            changes.push(FieldChange {
                field: EditableField::Owner,
                value: FieldValue::Text(owner.clone()),
            });
        }
        if let Some(trainer_id) = &self.trainer_id {
            changes.push(FieldChange {
                field: EditableField::TrainerId,
                value: FieldValue::Text(trainer_id.clone()),
            });
        }
        if let Some(rating) = self.current_rating {
            changes.push(FieldChange {
                field: EditableField::CurrentRating,
                value: FieldValue::Integer(rating),
            });
        }
        changes
    }

    /// 转换为可执行补丁；缺 horse_id 或无有效字段返回 None
    pub fn to_patch(&self) -> Option<HorsePatch> {
        let horse_id = self.horse_id.as_deref().and_then(normalize_horse_id)?;
        let changes = self.changes();
        if changes.is_empty() {
            return None;
        }
        Some(HorsePatch { horse_id, changes })
    }
}

/// 已校验的单马补丁
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HorsePatch {
    pub horse_id: String,
    pub changes: Vec<FieldChange>,
}

// ==========================================
// BulkEditOutcome - 批量编辑结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkEditOutcome {
    pub batch_id: String,
    /// 实际被修改的行数之和（同一马多次编辑分别计数）
    pub updated_count: usize,
    /// 进入事务执行的编辑数
    pub attempted: usize,
    /// 因缺 horse_id 或无有效字段被跳过的编辑数
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_horse_id() {
        assert_eq!(normalize_horse_id("HK001"), Some("HK001".to_string()));
        assert_eq!(normalize_horse_id("  hk001 "), Some("HK001".to_string()));
        assert_eq!(normalize_horse_id("Hk_2023_J123\t"), Some("HK_2023_J123".to_string()));
        assert_eq!(normalize_horse_id("   "), None);
        assert_eq!(normalize_horse_id(""), None);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_horse_id(" ab12 ").unwrap();
        assert_eq!(normalize_horse_id(&once), Some(once.clone()));
    }

    #[test]
    fn test_from_json_keeps_only_whitelist() {
        let edit = HorseEdit::from_json(&json!({
            "horse_id": "H1",
            "owner": "A",
            "name": "不应被修改",
            "updated_at": "2020-01-01",
        }));
        assert_eq!(edit.horse_id.as_deref(), Some("H1"));
        assert_eq!(edit.owner.as_deref(), Some("A"));
        assert_eq!(edit.changes().len(), 1);
    }

    #[test]
    fn test_from_json_rating_coercion() {
        let edit = HorseEdit::from_json(&json!({"horse_id": "H1", "current_rating": "52"}));
        assert_eq!(edit.current_rating, Some(52));

        let edit = HorseEdit::from_json(&json!({"horse_id": "H1", "current_rating": 60.0}));
        assert_eq!(edit.current_rating, Some(60));

        let edit = HorseEdit::from_json(&json!({"horse_id": "H1", "current_rating": "高"}));
        assert_eq!(edit.current_rating, None);
    }

    #[test]
    fn test_from_json_rejects_out_of_range_rating() {
        for raw in [json!(1e30), json!(-1e30), json!(9.3e18), json!(60.5)] {
            let edit = HorseEdit::from_json(&json!({"horse_id": "H1", "current_rating": raw}));
            assert_eq!(edit.current_rating, None, "current_rating = {}", raw);
            assert!(edit.to_patch().is_none());
        }

        let edit = HorseEdit::from_json(&json!({"horse_id": "H1", "current_rating": -4.0}));
        assert_eq!(edit.current_rating, Some(-4));
    }

    #[test]
    fn test_whole_i64_bounds() {
        assert_eq!(lenient::whole_i64(i64::MIN as f64), Some(i64::MIN));
        assert_eq!(lenient::whole_i64(i64::MAX as f64), None);
        assert_eq!(lenient::whole_i64(f64::NAN), None);
        assert_eq!(lenient::whole_i64(f64::INFINITY), None);
    }

    #[test]
    fn test_from_json_wrong_types_are_absent() {
        let edit = HorseEdit::from_json(&json!({
            "horse_id": 1234,
            "owner": 42,
            "trainer_id": ["T1"],
            "current_rating": true,
        }));
        assert_eq!(edit.horse_id.as_deref(), Some("1234"));
        assert!(edit.changes().is_empty());

        // 数组不按位置解析
        assert_eq!(HorseEdit::from_json(&json!(["H1", "A"])), HorseEdit::default());
    }

    #[test]
    fn test_null_fields_are_not_changes() {
        let edit = HorseEdit::from_json(&json!({
            "horse_id": "H1",
            "owner": null,
            "trainer_id": null,
            "current_rating": null,
        }));
        assert!(edit.changes().is_empty());
        assert!(edit.to_patch().is_none());
    }

    #[test]
    fn test_to_patch_requires_horse_id() {
        let edit = HorseEdit {
            horse_id: Some("  ".to_string()),
            owner: Some("A".to_string()),
            ..Default::default()
        };
        assert!(edit.to_patch().is_none());

        let edit = HorseEdit {
            horse_id: Some(" h1 ".to_string()),
            owner: Some("A".to_string()),
            current_rating: Some(40),
            ..Default::default()
        };
        let patch = edit.to_patch().unwrap();
        assert_eq!(patch.horse_id, "H1");
        assert_eq!(patch.changes.len(), 2);
    }

    #[test]
    fn test_non_object_is_skipped() {
        assert!(HorseEdit::from_json(&json!("H1")).to_patch().is_none());
        assert!(HorseEdit::from_json(&json!(null)).to_patch().is_none());
    }

    #[test]
    fn test_trainer_column_mapping() {
        assert_eq!(EditableField::TrainerId.request_key(), "trainer_id");
        assert_eq!(EditableField::TrainerId.column(), "trainer");
    }
}
