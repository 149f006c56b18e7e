// ==========================================
// 车辆排产看板 - 排序与搜索
// ==========================================
// 排序: 按列的展示值做序数比较（日期列按解析后的日历日期，其余按字符串/数值）
//       稳定排序，相等键保持输入顺序
// 搜索: 复用 FilterEngine 的底盘号谓词
// ==========================================

use crate::domain::filter::{SortConfig, SortKey};
use crate::domain::record::ScheduleRecord;
use crate::domain::types::SortDirection;
use crate::engine::filter_engine::FilterEngine;
use std::cmp::Ordering;
use tracing::instrument;

// ==========================================
// SortSearchIndex - 排序/搜索
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct SortSearchIndex {
    filter: FilterEngine,
}

impl SortSearchIndex {
    pub fn new() -> Self {
        Self {
            filter: FilterEngine::new(),
        }
    }

    /// 按排序配置返回新集合
    #[instrument(skip(self, records), fields(count = records.len(), key = ?config.key))]
    pub fn sort(&self, records: &[ScheduleRecord], config: &SortConfig) -> Vec<ScheduleRecord> {
        let mut sorted = records.to_vec();
        sorted.sort_by(|a, b| match config.direction {
            SortDirection::Ascending => Self::compare(a, b, &config.key),
            SortDirection::Descending => Self::compare(b, a, &config.key),
        });
        sorted
    }

    pub fn search(&self, records: &[ScheduleRecord], term: &str) -> Vec<ScheduleRecord> {
        self.filter.search(records, term)
    }

    /// 单键比较（升序语义）
    pub fn compare(a: &ScheduleRecord, b: &ScheduleRecord, key: &SortKey) -> Ordering {
        match key {
            SortKey::Row => a.row_number.cmp(&b.row_number),
            // 缺失日期排在任何日期之前
            SortKey::ForecastProductionDate => {
                a.forecast_production_date.cmp(&b.forecast_production_date)
            }
            SortKey::SecondaryDate(field) => a.secondary_date(*field).cmp(&b.secondary_date(*field)),
            SortKey::Chassis => a.chassis.cmp(&b.chassis),
            SortKey::Customer => a.customer.cmp(&b.customer),
            SortKey::Dealer => a.dealer.cmp(&b.dealer),
            SortKey::Model => a.model.cmp(&b.model),
            SortKey::ProductionStage => a.production_stage.cmp(&b.production_stage),
            SortKey::ModelYear => compare_text_or_number(&a.model_year, &b.model_year),
            SortKey::Field(name) => {
                compare_text_or_number(a.display_value(name), b.display_value(name))
            }
        }
    }
}

/// 两侧均为整数时按数值比较，否则按字符串比较
fn compare_text_or_number(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn rec(row: usize, chassis: &str, dealer: &str, year: &str, date: Option<(i32, u32, u32)>) -> ScheduleRecord {
        ScheduleRecord {
            row_number: row,
            chassis: chassis.to_string(),
            dealer: dealer.to_string(),
            model: String::new(),
            model_year: year.to_string(),
            customer: String::new(),
            production_stage: String::new(),
            forecast_production_date: date.map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
            secondary_dates: BTreeMap::new(),
            source: BTreeMap::new(),
        }
    }

    fn rows(records: &[ScheduleRecord]) -> Vec<usize> {
        records.iter().map(|r| r.row_number).collect()
    }

    #[test]
    fn test_date_sort_uses_calendar_order() {
        // 文本 "01/12/2025" < "15/03/2025"，但日历顺序相反
        let records = vec![
            rec(0, "A", "D", "", Some((2025, 12, 1))),
            rec(1, "B", "D", "", Some((2025, 3, 15))),
            rec(2, "C", "D", "", None),
        ];
        let index = SortSearchIndex::new();
        let sorted = index.sort(
            &records,
            &SortConfig::new(SortKey::ForecastProductionDate, SortDirection::Ascending),
        );
        assert_eq!(rows(&sorted), vec![2, 1, 0]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_keys() {
        let records = vec![
            rec(0, "A", "Same", "", None),
            rec(1, "B", "Same", "", None),
            rec(2, "C", "Alpha", "", None),
            rec(3, "D", "Same", "", None),
        ];
        let index = SortSearchIndex::new();
        let asc = index.sort(&records, &SortConfig::new(SortKey::Dealer, SortDirection::Ascending));
        assert_eq!(rows(&asc), vec![2, 0, 1, 3]);
        let desc = index.sort(&records, &SortConfig::new(SortKey::Dealer, SortDirection::Descending));
        assert_eq!(rows(&desc), vec![0, 1, 3, 2]);
    }

    #[test]
    fn test_model_year_numeric_comparison() {
        let records = vec![
            rec(0, "A", "D", "2026", None),
            rec(1, "B", "D", "999", None),
            rec(2, "C", "D", "2025", None),
        ];
        let index = SortSearchIndex::new();
        let sorted = index.sort(&records, &SortConfig::new(SortKey::ModelYear, SortDirection::Ascending));
        assert_eq!(rows(&sorted), vec![1, 2, 0]);
    }

    #[test]
    fn test_sort_idempotent() {
        let records = vec![
            rec(0, "Z9", "D", "", None),
            rec(1, "A1", "D", "", None),
            rec(2, "M5", "D", "", None),
        ];
        let index = SortSearchIndex::new();
        let config = SortConfig::new(SortKey::Chassis, SortDirection::Ascending);
        let once = index.sort(&records, &config);
        let twice = index.sort(&once, &config);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_extra_field_sort() {
        let mut a = rec(0, "A", "D", "", None);
        a.source.insert("Shipment".into(), "Ground".into());
        let mut b = rec(1, "B", "D", "", None);
        b.source.insert("Shipment".into(), "Express".into());
        let index = SortSearchIndex::new();
        let sorted = index.sort(
            &[a, b],
            &SortConfig::new(SortKey::Field("Shipment".into()), SortDirection::Ascending),
        );
        assert_eq!(rows(&sorted), vec![1, 0]);
    }
}
