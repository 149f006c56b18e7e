// ==========================================
// 车辆排产看板 - 筛选引擎
// ==========================================
// 职责: 对规范化记录求值 FilterSpec
// 红线: 全部谓词 AND；缺省谓词恒通过；缺失日期使对应谓词失败而非报错
// 输入: &[ScheduleRecord] + FilterSpec
// 输出: 新集合（不修改输入）
// ==========================================

use crate::domain::filter::{FilterSpec, StageSelection};
use crate::domain::record::ScheduleRecord;
use crate::domain::types::CanonicalStage;
use crate::engine::stage_classifier::StageClassifier;
use chrono::Datelike;
use tracing::instrument;

// ==========================================
// FilterEngine - 筛选引擎
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterEngine {
    classifier: StageClassifier,
}

impl FilterEngine {
    pub fn new() -> Self {
        Self {
            classifier: StageClassifier::new(),
        }
    }

    // ==========================================
    // 集合级操作
    // ==========================================

    /// 应用全部 FilterSpec 谓词
    #[instrument(skip(self, records, spec), fields(input = records.len()))]
    pub fn apply(&self, records: &[ScheduleRecord], spec: &FilterSpec) -> Vec<ScheduleRecord> {
        if spec.is_empty() {
            return records.to_vec();
        }
        let result: Vec<ScheduleRecord> = records
            .iter()
            .filter(|r| self.matches(r, spec))
            .cloned()
            .collect();
        tracing::debug!(output = result.len(), "filter applied");
        result
    }

    /// 基础策略: 移除 Finished 分桶的记录
    pub fn hide_finished(&self, records: &[ScheduleRecord]) -> Vec<ScheduleRecord> {
        records
            .iter()
            .filter(|r| !self.classifier.classify(&r.production_stage).is_finished())
            .cloned()
            .collect()
    }

    /// 底盘号子串搜索；空查询返回全集
    pub fn search(&self, records: &[ScheduleRecord], term: &str) -> Vec<ScheduleRecord> {
        if term.is_empty() {
            return records.to_vec();
        }
        records
            .iter()
            .filter(|r| self.matches_chassis_search(r, term))
            .cloned()
            .collect()
    }

    // ==========================================
    // 单条记录判定
    // ==========================================

    pub fn matches(&self, record: &ScheduleRecord, spec: &FilterSpec) -> bool {
        self.matches_dealer(record, spec)
            && self.matches_model(record, spec)
            && self.matches_forecast_year(record, spec)
            && self.matches_forecast_year_month(record, spec)
            && self.matches_model_range(record, spec)
            && self.matches_stages(record, spec)
            && self.matches_date_fields(record, spec)
            && self.matches_sea_freighting(record, spec)
    }

    /// 经销商: 精确匹配（区分大小写）
    pub fn matches_dealer(&self, record: &ScheduleRecord, spec: &FilterSpec) -> bool {
        spec.dealer().map_or(true, |d| record.dealer == d)
    }

    pub fn matches_model(&self, record: &ScheduleRecord, spec: &FilterSpec) -> bool {
        spec.model().map_or(true, |m| record.model == m)
    }

    /// 预测年份: 缺失日期失败
    pub fn matches_forecast_year(&self, record: &ScheduleRecord, spec: &FilterSpec) -> bool {
        match spec.forecast_year() {
            None => true,
            Some(year) => record
                .forecast_production_date
                .map_or(false, |date| date.year() == year),
        }
    }

    pub fn matches_forecast_year_month(&self, record: &ScheduleRecord, spec: &FilterSpec) -> bool {
        match spec.forecast_year_month() {
            None => true,
            Some(ym) => record
                .forecast_production_date
                .map_or(false, |date| ym.contains(date)),
        }
    }

    /// 型号区间: 底盘号前缀匹配；开放槽位（无底盘号）失败
    pub fn matches_model_range(&self, record: &ScheduleRecord, spec: &FilterSpec) -> bool {
        match spec.model_range() {
            None => true,
            Some(prefix) => !record.chassis.is_empty() && record.chassis.starts_with(prefix),
        }
    }

    /// 阶段选择: 按规范化分桶名判定成员关系
    pub fn matches_stages(&self, record: &ScheduleRecord, spec: &FilterSpec) -> bool {
        match spec.stages() {
            StageSelection::All => true,
            StageSelection::Only(selected) if selected.is_empty() => true,
            StageSelection::Only(selected) => {
                let stage = self.classifier.classify(&record.production_stage);
                selected.contains(stage.label())
            }
        }
    }

    /// 次级日期字段 → 年月: 每个字段独立判定，缺失日期失败
    pub fn matches_date_fields(&self, record: &ScheduleRecord, spec: &FilterSpec) -> bool {
        spec.date_fields().iter().all(|(field, ym)| {
            record
                .secondary_date(*field)
                .map_or(false, |date| ym.contains(date))
        })
    }

    pub fn matches_sea_freighting(&self, record: &ScheduleRecord, spec: &FilterSpec) -> bool {
        !spec.sea_freighting_only()
            || self.classifier.classify(&record.production_stage) == CanonicalStage::SeaFreighting
    }

    /// 底盘号搜索: 大小写不敏感子串；空底盘号永不匹配非空查询
    pub fn matches_chassis_search(&self, record: &ScheduleRecord, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        if record.chassis.is_empty() {
            return false;
        }
        record
            .chassis
            .to_lowercase()
            .contains(&term.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::StageSelection;
    use crate::domain::record::SecondaryDateField;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn record(chassis: &str, dealer: &str, stage: &str, forecast: Option<(i32, u32, u32)>) -> ScheduleRecord {
        ScheduleRecord {
            row_number: 0,
            chassis: chassis.to_string(),
            dealer: dealer.to_string(),
            model: "Premium XL".to_string(),
            model_year: "2025".to_string(),
            customer: String::new(),
            production_stage: stage.to_string(),
            forecast_production_date: forecast
                .map(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d).unwrap()),
            secondary_dates: BTreeMap::new(),
            source: BTreeMap::new(),
        }
    }

    #[test]
    fn test_empty_spec_passes_everything() {
        let engine = FilterEngine::new();
        let records = vec![
            record("ABC1", "A", "Queued", None),
            record("", "B", "", Some((2025, 1, 1))),
        ];
        assert_eq!(engine.apply(&records, &FilterSpec::default()).len(), 2);
    }

    #[test]
    fn test_dealer_is_case_sensitive() {
        let engine = FilterEngine::new();
        let records = vec![record("X1", "AutoMax", "Queued", None), record("X2", "automax", "Queued", None)];
        let spec = FilterSpec::builder().dealer("AutoMax").build();
        let result = engine.apply(&records, &spec);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].chassis, "X1");
    }

    #[test]
    fn test_forecast_year_absent_date_fails() {
        let engine = FilterEngine::new();
        let records = vec![
            record("X1", "A", "Queued", Some((2025, 3, 15))),
            record("X2", "A", "Queued", None),
            record("X3", "A", "Queued", Some((2026, 1, 1))),
        ];
        let spec = FilterSpec::builder().forecast_year("2025").unwrap().build();
        let result = engine.apply(&records, &spec);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].chassis, "X1");
    }

    #[test]
    fn test_forecast_year_month_independent_of_year() {
        let engine = FilterEngine::new();
        let records = vec![
            record("X1", "A", "Queued", Some((2025, 3, 15))),
            record("X2", "A", "Queued", Some((2025, 4, 1))),
        ];
        let spec = FilterSpec::builder().forecast_year_month("2025-03").unwrap().build();
        assert_eq!(engine.apply(&records, &spec).len(), 1);
    }

    #[test]
    fn test_model_range_requires_chassis() {
        let engine = FilterEngine::new();
        let records = vec![
            record("ABC123", "A", "Queued", None),
            record("DEF456", "A", "Queued", None),
            record("", "A", "Queued", None),
        ];
        let spec = FilterSpec::builder().model_range("ABC").build();
        let result = engine.apply(&records, &spec);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].chassis, "ABC123");
    }

    #[test]
    fn test_sea_freighting_selection_uses_bucket_name() {
        let engine = FilterEngine::new();
        let records = vec![
            record("X1", "A", "In Progress-Perth", None),
            record("X2", "A", "Queued", None),
            record("X3", "A", "Planning", None),
        ];
        let spec = FilterSpec::builder()
            .stages(StageSelection::only(["Sea Freighting", "Queued"]))
            .build();
        let result = engine.apply(&records, &spec);
        let chassis: Vec<_> = result.iter().map(|r| r.chassis.as_str()).collect();
        assert_eq!(chassis, vec!["X1", "X2"]);
    }

    #[test]
    fn test_no_stage_record_fails_explicit_selection() {
        let engine = FilterEngine::new();
        let records = vec![record("X1", "A", "", None)];
        let spec = FilterSpec::builder()
            .stages(StageSelection::only(["Queued"]))
            .build();
        assert!(engine.apply(&records, &spec).is_empty());
    }

    #[test]
    fn test_secondary_date_filter() {
        let engine = FilterEngine::new();
        let mut signed = record("X1", "A", "Queued", None);
        signed.secondary_dates.insert(
            SecondaryDateField::SignedPlansReceived,
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        );
        let unsigned = record("X2", "A", "Queued", None);
        let spec = FilterSpec::builder()
            .date_field("Signed Plans Received", "2025-02")
            .unwrap()
            .build();
        let result = engine.apply(&[signed, unsigned], &spec);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].chassis, "X1");
    }

    #[test]
    fn test_hide_finished_any_case() {
        let engine = FilterEngine::new();
        let records = vec![
            record("X1", "A", "Finished", None),
            record("X2", "A", "fInIsHeD", None),
            record("X3", "A", "Queued", None),
        ];
        let result = engine.hide_finished(&records);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].chassis, "X3");
    }

    #[test]
    fn test_chassis_search() {
        let engine = FilterEngine::new();
        let records = vec![
            record("ABC123", "A", "Queued", None),
            record("", "A", "Queued", None),
            record("XYZ999", "A", "Queued", None),
        ];
        let result = engine.search(&records, "bc1");
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].chassis, "ABC123");
        assert_eq!(engine.search(&records, "").len(), 3);
    }

    #[test]
    fn test_sea_freighting_only_toggle() {
        let engine = FilterEngine::new();
        let records = vec![
            record("X1", "A", "Shipped-Perth", None),
            record("X2", "A", "Queued", None),
        ];
        let spec = FilterSpec::builder().sea_freighting_only(true).build();
        assert_eq!(engine.apply(&records, &spec).len(), 1);
    }
}
