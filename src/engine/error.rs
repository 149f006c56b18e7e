// ==========================================
// 车辆排产看板 - 引擎错误类型
// ==========================================
// 红线: 记录数据畸形不报错（缺失日期/空经销商走占位）
//       只有筛选条件本身违约（引用不支持的字段、年/年月字面量非法）才是硬错误
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 引擎契约错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("不支持的日期筛选字段: {0}")]
    UnsupportedDateField(String),

    #[error("年份格式错误: 期望 YYYY，实际 {0}")]
    InvalidYear(String),

    #[error("年月格式错误: 期望 YYYY-MM，实际 {0}")]
    InvalidYearMonth(String),

    #[error("未知的透视粒度: {0}")]
    UnknownGranularity(String),
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
