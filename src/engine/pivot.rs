// ==========================================
// 车辆排产看板 - 透视汇总引擎
// ==========================================
// 职责: 构建 经销商 × 时间段 × 占用状态 的计数矩阵，并支持逐级下钻（年 → 月 → 日）
// 红线:
// - 单次遍历同时构建主矩阵与日级明细，之后的可见性选择/展开均为纯投影，不再扫描记录
// - 经销商/时间段按观测到的去重键升序枚举；未出现的组合读作 {occupied: 0, empty: 0}
// - 预测日期缺失的记录不进入任何分桶
// ==========================================

use crate::domain::record::ScheduleRecord;
use crate::domain::types::Occupancy;
use crate::engine::time_bucket::{PeriodGranularity, TimeBucketer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::instrument;

// ==========================================
// SlotCount - 槽位计数
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotCount {
    pub occupied: u32,
    pub empty: u32,
}

impl SlotCount {
    pub const ZERO: SlotCount = SlotCount {
        occupied: 0,
        empty: 0,
    };

    pub fn new(occupied: u32, empty: u32) -> Self {
        Self { occupied, empty }
    }

    pub fn total(&self) -> u32 {
        self.occupied + self.empty
    }

    pub fn with(self, occupancy: Occupancy) -> Self {
        match occupancy {
            Occupancy::Occupied => Self::new(self.occupied + 1, self.empty),
            Occupancy::Empty => Self::new(self.occupied, self.empty + 1),
        }
    }

    pub fn merge(self, other: SlotCount) -> Self {
        Self::new(self.occupied + other.occupied, self.empty + other.empty)
    }
}

/// 经销商 → 计数
pub type DealerCounts = BTreeMap<String, SlotCount>;
/// 日 → 经销商 → 计数
pub type DayBreakdown = BTreeMap<String, DealerCounts>;

// ==========================================
// PivotMatrix - 透视矩阵（构建后只读）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PivotMatrix {
    granularity: PeriodGranularity,
    /// dealer → period → count
    cells: BTreeMap<String, BTreeMap<String, SlotCount>>,
    /// period → day → dealer → count
    detail: BTreeMap<String, DayBreakdown>,
    dealers: Vec<String>,
    periods: Vec<String>,
    skipped_undated: usize,
}

impl PivotMatrix {
    pub fn granularity(&self) -> PeriodGranularity {
        self.granularity
    }

    /// 去重升序经销商列表
    pub fn dealers(&self) -> &[String] {
        &self.dealers
    }

    /// 去重升序时间段列表
    pub fn periods(&self) -> &[String] {
        &self.periods
    }

    /// 因预测日期缺失而未入桶的记录数
    pub fn skipped_undated(&self) -> usize {
        self.skipped_undated
    }

    pub fn get(&self, dealer: &str, period: &str) -> SlotCount {
        self.cells
            .get(dealer)
            .and_then(|row| row.get(period))
            .copied()
            .unwrap_or_default()
    }

    pub fn dealer_total(&self, dealer: &str) -> SlotCount {
        self.cells
            .get(dealer)
            .map(|row| row.values().fold(SlotCount::ZERO, |acc, c| acc.merge(*c)))
            .unwrap_or_default()
    }

    pub fn period_total(&self, period: &str) -> SlotCount {
        self.cells
            .values()
            .filter_map(|row| row.get(period))
            .fold(SlotCount::ZERO, |acc, c| acc.merge(*c))
    }

    pub fn grand_total(&self) -> SlotCount {
        self.cells
            .values()
            .flat_map(|row| row.values())
            .fold(SlotCount::ZERO, |acc, c| acc.merge(*c))
    }

    /// 展开某个时间段的日级明细
    pub fn drill_down(&self, period: &str) -> Option<PeriodDetail<'_>> {
        self.detail
            .get_key_value(period)
            .map(|(period, days)| PeriodDetail {
                period: period.as_str(),
                days,
            })
    }

    /// 按选择投影为渲染视图
    pub fn project(&self, selection: &PivotSelection) -> PivotView {
        let periods: Vec<String> = self
            .periods
            .iter()
            .filter(|p| selection.period_visible(p))
            .cloned()
            .collect();
        let dealers: Vec<String> = self
            .dealers
            .iter()
            .filter(|d| selection.dealer_visible(d))
            .cloned()
            .collect();

        let rows = dealers
            .iter()
            .map(|dealer| {
                let cells: Vec<SlotCount> = periods.iter().map(|p| self.get(dealer, p)).collect();
                let total = cells.iter().fold(SlotCount::ZERO, |acc, c| acc.merge(*c));
                PivotRow {
                    dealer: dealer.clone(),
                    cells,
                    total,
                }
            })
            .collect();

        let expanded = selection
            .expanded
            .as_deref()
            .filter(|p| periods.iter().any(|visible| visible == p))
            .and_then(|p| self.drill_down(p))
            .map(|detail| detail.to_expanded(&dealers));

        PivotView {
            granularity: self.granularity,
            dealers,
            periods,
            rows,
            expanded,
        }
    }
}

// ==========================================
// PeriodDetail - 时间段下钻（借用主矩阵的明细）
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct PeriodDetail<'a> {
    period: &'a str,
    days: &'a DayBreakdown,
}

impl<'a> PeriodDetail<'a> {
    pub fn period(&self) -> &str {
        self.period
    }

    /// 升序日键
    pub fn days(&self) -> Vec<&'a str> {
        self.days.keys().map(String::as_str).collect()
    }

    pub fn get(&self, day: &str, dealer: &str) -> SlotCount {
        self.days
            .get(day)
            .and_then(|dealers| dealers.get(dealer))
            .copied()
            .unwrap_or_default()
    }

    pub fn day_total(&self, day: &str) -> SlotCount {
        self.days
            .get(day)
            .map(|dealers| dealers.values().fold(SlotCount::ZERO, |acc, c| acc.merge(*c)))
            .unwrap_or_default()
    }

    /// 日级明细按 "YYYY-MM" 汇总（年 → 月 的中间层级）
    pub fn by_month(&self) -> BTreeMap<String, DealerCounts> {
        let mut months: BTreeMap<String, DealerCounts> = BTreeMap::new();
        for (day, dealers) in self.days {
            let month = day.get(..7).unwrap_or(day).to_string();
            let slot = months.entry(month).or_default();
            for (dealer, count) in dealers {
                let merged = slot.get(dealer).copied().unwrap_or_default().merge(*count);
                slot.insert(dealer.clone(), merged);
            }
        }
        months
    }

    fn to_expanded(&self, dealers: &[String]) -> ExpandedPeriod {
        let days: Vec<String> = self.days.keys().cloned().collect();
        let rows = dealers
            .iter()
            .map(|dealer| {
                let cells: Vec<SlotCount> = days.iter().map(|day| self.get(day, dealer)).collect();
                let total = cells.iter().fold(SlotCount::ZERO, |acc, c| acc.merge(*c));
                PivotRow {
                    dealer: dealer.clone(),
                    cells,
                    total,
                }
            })
            .collect();
        ExpandedPeriod {
            period: self.period.to_string(),
            days,
            rows,
        }
    }
}

// ==========================================
// 投影: 选择条件与渲染视图
// ==========================================

/// 可见性选择；None 表示全部可见
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotSelection {
    pub periods: Option<BTreeSet<String>>,
    pub dealers: Option<BTreeSet<String>>,
    pub expanded: Option<String>,
    /// 隐藏这些年份开头的时间段（历史截断）
    pub hidden_years: BTreeSet<i32>,
}

impl PivotSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn hiding_years_of(mut self, bucketer: &TimeBucketer) -> Self {
        self.hidden_years.extend(bucketer.excluded_years());
        self
    }

    pub fn with_expanded(mut self, period: &str) -> Self {
        self.expanded = Some(period.to_string());
        self
    }

    fn period_visible(&self, period: &str) -> bool {
        if let Some(year) = period_year(period) {
            if self.hidden_years.contains(&year) {
                return false;
            }
        }
        self.periods.as_ref().map_or(true, |set| set.contains(period))
    }

    fn dealer_visible(&self, dealer: &str) -> bool {
        self.dealers.as_ref().map_or(true, |set| set.contains(dealer))
    }
}

/// 时间段键的年份（年/年月/日键以 4 位年份开头；月周键无年份）
pub fn period_year(period: &str) -> Option<i32> {
    let head = period.get(..4)?;
    if head.chars().all(|c| c.is_ascii_digit()) {
        head.parse().ok()
    } else {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotRow {
    pub dealer: String,
    pub cells: Vec<SlotCount>,
    pub total: SlotCount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedPeriod {
    pub period: String,
    pub days: Vec<String>,
    pub rows: Vec<PivotRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PivotView {
    pub granularity: PeriodGranularity,
    pub dealers: Vec<String>,
    pub periods: Vec<String>,
    pub rows: Vec<PivotRow>,
    pub expanded: Option<ExpandedPeriod>,
}

// ==========================================
// PivotAggregator - 单次遍历构建
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct PivotAggregator;

#[derive(Default)]
struct Accumulator {
    cells: BTreeMap<String, BTreeMap<String, SlotCount>>,
    detail: BTreeMap<String, DayBreakdown>,
    skipped_undated: usize,
}

impl Accumulator {
    fn absorb(mut self, record: &ScheduleRecord, granularity: PeriodGranularity) -> Self {
        let Some(date) = record.forecast_production_date else {
            self.skipped_undated += 1;
            return self;
        };
        let occupancy = record.occupancy();
        let period = TimeBucketer::period_key(date, granularity);
        let day = TimeBucketer::day_key(date);

        let cell = self
            .cells
            .entry(record.dealer.clone())
            .or_default()
            .entry(period.clone())
            .or_default();
        *cell = cell.with(occupancy);

        let detail = self
            .detail
            .entry(period)
            .or_default()
            .entry(day)
            .or_default()
            .entry(record.dealer.clone())
            .or_default();
        *detail = detail.with(occupancy);

        self
    }

    fn finish(self, granularity: PeriodGranularity) -> PivotMatrix {
        let dealers = self.cells.keys().cloned().collect();
        let periods = self.detail.keys().cloned().collect();
        PivotMatrix {
            granularity,
            cells: self.cells,
            detail: self.detail,
            dealers,
            periods,
            skipped_undated: self.skipped_undated,
        }
    }
}

impl PivotAggregator {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip(self, records), fields(count = records.len(), granularity = %granularity))]
    pub fn build(&self, records: &[ScheduleRecord], granularity: PeriodGranularity) -> PivotMatrix {
        let matrix = records
            .iter()
            .fold(Accumulator::default(), |acc, r| acc.absorb(r, granularity))
            .finish(granularity);

        tracing::debug!(
            dealers = matrix.dealers.len(),
            periods = matrix.periods.len(),
            skipped_undated = matrix.skipped_undated,
            "pivot built"
        );
        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(chassis: &str, dealer: &str, date: Option<(i32, u32, u32)>) -> ScheduleRecord {
        ScheduleRecord {
            row_number: 0,
            chassis: chassis.to_string(),
            dealer: dealer.to_string(),
            model: String::new(),
            model_year: String::new(),
            customer: String::new(),
            production_stage: String::new(),
            forecast_production_date: date.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
            secondary_dates: BTreeMap::new(),
            source: BTreeMap::new(),
        }
    }

    #[test]
    fn test_occupied_and_empty_same_cell() {
        let records = vec![rec("X1", "A", Some((2025, 3, 15))), rec("", "A", Some((2025, 3, 15)))];
        let matrix = PivotAggregator::new().build(&records, PeriodGranularity::YearMonth);
        assert_eq!(matrix.get("A", "2025-03"), SlotCount::new(1, 1));
        assert_eq!(matrix.get("A", "2025-04"), SlotCount::ZERO);
        assert_eq!(matrix.get("B", "2025-03"), SlotCount::ZERO);
    }

    #[test]
    fn test_undated_records_are_skipped() {
        let records = vec![rec("X1", "A", None), rec("X2", "A", Some((2025, 1, 2)))];
        let matrix = PivotAggregator::new().build(&records, PeriodGranularity::Year);
        assert_eq!(matrix.skipped_undated(), 1);
        assert_eq!(matrix.grand_total(), SlotCount::new(1, 0));
        assert_eq!(matrix.periods(), ["2025".to_string()]);
    }

    #[test]
    fn test_keys_sorted_and_distinct() {
        let records = vec![
            rec("X1", "Zed", Some((2026, 1, 2))),
            rec("X2", "Alpha", Some((2025, 5, 2))),
            rec("", "Zed", Some((2025, 5, 30))),
        ];
        let matrix = PivotAggregator::new().build(&records, PeriodGranularity::YearMonth);
        assert_eq!(matrix.dealers(), ["Alpha".to_string(), "Zed".to_string()]);
        assert_eq!(matrix.periods(), ["2025-05".to_string(), "2026-01".to_string()]);
    }

    #[test]
    fn test_drill_down_year_to_month_to_day() {
        let records = vec![
            rec("X1", "A", Some((2025, 3, 5))),
            rec("", "A", Some((2025, 3, 5))),
            rec("X3", "B", Some((2025, 7, 20))),
        ];
        let matrix = PivotAggregator::new().build(&records, PeriodGranularity::Year);
        let year = matrix.drill_down("2025").unwrap();

        let months = year.by_month();
        assert_eq!(months["2025-03"]["A"], SlotCount::new(1, 1));
        assert_eq!(months["2025-07"]["B"], SlotCount::new(1, 0));

        assert_eq!(year.days(), vec!["2025-03-05", "2025-07-20"]);
        assert_eq!(year.get("2025-03-05", "A"), SlotCount::new(1, 1));
        assert_eq!(year.day_total("2025-07-20"), SlotCount::new(1, 0));
        assert!(matrix.drill_down("2030").is_none());
    }

    #[test]
    fn test_drill_down_outlives_lookup_key() {
        let records = vec![rec("X1", "A", Some((2025, 3, 5)))];
        let matrix = PivotAggregator::new().build(&records, PeriodGranularity::YearMonth);

        let detail = {
            let key = format!("{}-{:02}", 2025, 3);
            matrix.drill_down(&key).unwrap()
        };
        assert_eq!(detail.period(), "2025-03");
    }

    #[test]
    fn test_projection_hides_periods_and_expands() {
        let records = vec![
            rec("X1", "A", Some((2024, 12, 1))),
            rec("X2", "A", Some((2025, 1, 2))),
            rec("", "B", Some((2025, 1, 3))),
        ];
        let matrix = PivotAggregator::new().build(&records, PeriodGranularity::YearMonth);
        let selection = PivotSelection::all()
            .hiding_years_of(&TimeBucketer::new([2024]))
            .with_expanded("2025-01");
        let view = matrix.project(&selection);

        assert_eq!(view.periods, vec!["2025-01".to_string()]);
        assert_eq!(view.rows.len(), 2);
        assert_eq!(view.rows[0].total, SlotCount::new(1, 0));
        let expanded = view.expanded.unwrap();
        assert_eq!(expanded.days, vec!["2025-01-02".to_string(), "2025-01-03".to_string()]);
        assert_eq!(expanded.rows[1].cells, vec![SlotCount::ZERO, SlotCount::new(0, 1)]);
    }

    #[test]
    fn test_expanding_hidden_period_yields_nothing() {
        let records = vec![rec("X1", "A", Some((2024, 12, 1)))];
        let matrix = PivotAggregator::new().build(&records, PeriodGranularity::YearMonth);
        let view = matrix.project(
            &PivotSelection::all()
                .hiding_years_of(&TimeBucketer::new([2024]))
                .with_expanded("2024-12"),
        );
        assert!(view.periods.is_empty());
        assert!(view.expanded.is_none());
    }

    #[test]
    fn test_cutoff_years_merge_with_caller_hidden_years() {
        let records = vec![
            rec("X1", "A", Some((2024, 12, 1))),
            rec("X2", "A", Some((2025, 1, 2))),
            rec("X3", "A", Some((2026, 2, 3))),
        ];
        let matrix = PivotAggregator::new().build(&records, PeriodGranularity::Year);
        let selection = PivotSelection {
            hidden_years: BTreeSet::from([2026]),
            ..PivotSelection::all()
        }
        .hiding_years_of(&TimeBucketer::new([2024]));

        assert_eq!(selection.hidden_years, BTreeSet::from([2024, 2026]));
        assert_eq!(matrix.project(&selection).periods, vec!["2025".to_string()]);
    }

    #[test]
    fn test_period_year() {
        assert_eq!(period_year("2025-03"), Some(2025));
        assert_eq!(period_year("2025"), Some(2025));
        assert_eq!(period_year("M3-W1"), None);
    }
}
