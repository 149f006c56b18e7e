// ==========================================
// 车辆排产看板 - 时间分桶
// ==========================================
// 职责: 日期 → 年 / 年月 / 月周 / 日 分桶键
// 说明: 分桶函数对任意有效日期都是全函数；缺失日期由调用方预先过滤
// 历史截断: 指定年份（默认 2024）不出现在筛选项与汇总的年/月枚举中，可配置
// ==========================================

use crate::config::EngineConfig;
use crate::engine::error::{EngineError, EngineResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ==========================================
// 透视粒度
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodGranularity {
    Year,
    #[default]
    YearMonth,
    MonthWeek,
    Day,
}

impl PeriodGranularity {
    pub fn from_str(s: &str) -> EngineResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "year" => Ok(PeriodGranularity::Year),
            "year_month" | "month" => Ok(PeriodGranularity::YearMonth),
            "month_week" | "week" => Ok(PeriodGranularity::MonthWeek),
            "day" => Ok(PeriodGranularity::Day),
            other => Err(EngineError::UnknownGranularity(other.to_string())),
        }
    }
}

impl fmt::Display for PeriodGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodGranularity::Year => write!(f, "year"),
            PeriodGranularity::YearMonth => write!(f, "year_month"),
            PeriodGranularity::MonthWeek => write!(f, "month_week"),
            PeriodGranularity::Day => write!(f, "day"),
        }
    }
}

// ==========================================
// TimeBucketer - 时间分桶器
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeBucketer {
    excluded_years: BTreeSet<i32>,
}

impl TimeBucketer {
    pub fn new<I: IntoIterator<Item = i32>>(excluded_years: I) -> Self {
        Self {
            excluded_years: excluded_years.into_iter().collect(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.excluded_years.iter().copied())
    }

    // ==========================================
    // 分桶键
    // ==========================================

    /// "YYYY"
    pub fn year_key(date: NaiveDate) -> String {
        format!("{:04}", date.year())
    }

    /// "YYYY-MM"
    pub fn year_month_key(date: NaiveDate) -> String {
        format!("{:04}-{:02}", date.year(), date.month())
    }

    /// "M{month}-W{week}"，week = ceil(day / 7)，取值 1..=5
    pub fn month_week_key(date: NaiveDate) -> String {
        format!("M{}-W{}", date.month(), Self::week_of_month(date))
    }

    /// "YYYY-MM-DD"
    pub fn day_key(date: NaiveDate) -> String {
        format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
    }

    pub fn week_of_month(date: NaiveDate) -> u32 {
        (date.day() + 6) / 7
    }

    pub fn period_key(date: NaiveDate, granularity: PeriodGranularity) -> String {
        match granularity {
            PeriodGranularity::Year => Self::year_key(date),
            PeriodGranularity::YearMonth => Self::year_month_key(date),
            PeriodGranularity::MonthWeek => Self::month_week_key(date),
            PeriodGranularity::Day => Self::day_key(date),
        }
    }

    // ==========================================
    // 历史截断
    // ==========================================

    pub fn is_excluded_year(&self, year: i32) -> bool {
        self.excluded_years.contains(&year)
    }

    pub fn is_excluded(&self, date: NaiveDate) -> bool {
        self.is_excluded_year(date.year())
    }

    pub fn excluded_years(&self) -> impl Iterator<Item = i32> + '_ {
        self.excluded_years.iter().copied()
    }

    /// 去重升序的年份枚举（已应用截断）
    pub fn enumerate_years<I>(&self, dates: I) -> Vec<String>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        dates
            .into_iter()
            .filter(|d| !self.is_excluded(*d))
            .map(Self::year_key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// 去重升序的年月枚举（已应用截断），可限定年份
    pub fn enumerate_year_months<I>(&self, dates: I, year: Option<i32>) -> Vec<String>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        dates
            .into_iter()
            .filter(|d| !self.is_excluded(*d))
            .filter(|d| year.map_or(true, |y| d.year() == y))
            .map(Self::year_month_key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_bucket_keys_for_known_date() {
        let date = d(2025, 3, 5);
        assert_eq!(TimeBucketer::year_key(date), "2025");
        assert_eq!(TimeBucketer::year_month_key(date), "2025-03");
        assert_eq!(TimeBucketer::day_key(date), "2025-03-05");
        assert_eq!(TimeBucketer::month_week_key(date), "M3-W1");
    }

    #[test]
    fn test_week_of_month_boundaries() {
        assert_eq!(TimeBucketer::week_of_month(d(2025, 1, 1)), 1);
        assert_eq!(TimeBucketer::week_of_month(d(2025, 1, 7)), 1);
        assert_eq!(TimeBucketer::week_of_month(d(2025, 1, 8)), 2);
        assert_eq!(TimeBucketer::week_of_month(d(2025, 1, 28)), 4);
        assert_eq!(TimeBucketer::week_of_month(d(2025, 1, 29)), 5);
        assert_eq!(TimeBucketer::week_of_month(d(2025, 1, 31)), 5);
        assert_eq!(TimeBucketer::month_week_key(d(2025, 12, 15)), "M12-W3");
    }

    #[test]
    fn test_enumeration_applies_cutoff() {
        let bucketer = TimeBucketer::new([2024]);
        let dates = vec![d(2024, 12, 1), d(2025, 3, 5), d(2026, 1, 2), d(2025, 3, 9)];

        assert_eq!(bucketer.enumerate_years(dates.clone()), vec!["2025", "2026"]);
        assert_eq!(
            bucketer.enumerate_year_months(dates.clone(), None),
            vec!["2025-03", "2026-01"]
        );
        assert_eq!(
            bucketer.enumerate_year_months(dates, Some(2026)),
            vec!["2026-01"]
        );
    }

    #[test]
    fn test_no_cutoff_keeps_all_years() {
        let bucketer = TimeBucketer::default();
        assert_eq!(
            bucketer.enumerate_years(vec![d(2024, 1, 1), d(2023, 5, 5)]),
            vec!["2023", "2024"]
        );
    }

    #[test]
    fn test_granularity_parse() {
        assert_eq!(
            PeriodGranularity::from_str("Month").unwrap(),
            PeriodGranularity::YearMonth
        );
        assert!(PeriodGranularity::from_str("quarter").is_err());
    }
}
