// ==========================================
// 赛马数据门户 - 引擎层错误类型
// ==========================================

use crate::domain::race::RaceKey;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 距离类统计码依赖途程，排位表缺失时无法生成
    #[error("场次缺少途程，无法生成统计码: {race}")]
    MissingDistance { race: RaceKey },
}

pub type EngineResult<T> = Result<T, EngineError>;
