// ==========================================
// 车辆排产看板 - 引擎配置
// ==========================================
// 职责: 引擎与调度策略的可调参数（默认值即看板的出厂行为）
// 来源: 默认值 → config_kv 覆写（见 ConfigManager::load_engine_config）
// ==========================================

use crate::engine::red_slot::DEFAULT_RED_SLOT_WINDOW_DAYS;
use serde::{Deserialize, Serialize};

/// 月度订单回看上限（月）
pub const MAX_MONTHLY_ORDER_LOOKBACK_MONTHS: u32 = 1200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // ===== 时间分桶 =====
    /// 历史截断: 不出现在年/月枚举与汇总中的年份
    pub excluded_years: Vec<i32>,

    // ===== 红色槽位 =====
    pub red_slot_window_days: i64,

    // ===== 表格视图 =====
    pub hide_finished_default: bool,

    // ===== 调度策略 =====
    pub search_debounce_ms: u64,
    /// 超过该记录数时先让出一次再计算
    pub busy_yield_threshold: usize,
    pub busy_yield_ms: u64,

    // ===== 数据质量 =====
    /// 日期解析失败时逐条告警
    pub warn_on_unparsable_dates: bool,

    // ===== 统计 =====
    pub monthly_order_lookback_months: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            excluded_years: vec![2024],
            red_slot_window_days: DEFAULT_RED_SLOT_WINDOW_DAYS,
            hide_finished_default: true,
            search_debounce_ms: 300,
            busy_yield_threshold: 100,
            busy_yield_ms: 10,
            warn_on_unparsable_dates: false,
            monthly_order_lookback_months: 12,
        }
    }
}
