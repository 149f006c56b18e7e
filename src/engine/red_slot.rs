// ==========================================
// 车辆排产看板 - 红色槽位检测
// ==========================================
// 红色槽位: 未分配底盘 且 预测生产日期落在 [today, today + 窗口] 内（两端闭区间）
// 默认窗口: 20 周 × 7 天 = 140 天
// ==========================================

use crate::config::EngineConfig;
use crate::domain::record::ScheduleRecord;
use chrono::{Duration, NaiveDate};

/// 默认滚动窗口（天）
pub const DEFAULT_RED_SLOT_WINDOW_DAYS: i64 = 20 * 7;

/// 配置允许的最大窗口（天）
pub const MAX_RED_SLOT_WINDOW_DAYS: i64 = 3660;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedSlotDetector {
    window_days: i64,
}

impl Default for RedSlotDetector {
    fn default() -> Self {
        Self::new(DEFAULT_RED_SLOT_WINDOW_DAYS)
    }
}

impl RedSlotDetector {
    pub fn new(window_days: i64) -> Self {
        Self { window_days }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.red_slot_window_days)
    }

    pub fn window_days(&self) -> i64 {
        self.window_days
    }

    pub fn is_red_slot(&self, record: &ScheduleRecord, today: NaiveDate) -> bool {
        if !record.chassis.is_empty() {
            return false;
        }
        match record.forecast_production_date {
            Some(date) => self.in_window(date, today),
            None => false,
        }
    }

    /// 日期是否落在 [today, today + window] 内
    pub fn in_window(&self, date: NaiveDate, today: NaiveDate) -> bool {
        date >= today && date <= self.window_end(today)
    }

    /// 窗口右端；超出日期范围时饱和
    fn window_end(&self, today: NaiveDate) -> NaiveDate {
        Duration::try_days(self.window_days)
            .and_then(|span| today.checked_add_signed(span))
            .unwrap_or(if self.window_days < 0 {
                NaiveDate::MIN
            } else {
                NaiveDate::MAX
            })
    }

    pub fn count(&self, records: &[ScheduleRecord], today: NaiveDate) -> usize {
        records
            .iter()
            .filter(|r| self.is_red_slot(r, today))
            .count()
    }

    /// 行级标记（与输入顺序一致）
    pub fn flags(&self, records: &[ScheduleRecord], today: NaiveDate) -> Vec<bool> {
        records.iter().map(|r| self.is_red_slot(r, today)).collect()
    }
}
