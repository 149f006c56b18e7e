// ==========================================
// 车辆排产看板 - 记录规范化
// ==========================================
// 职责: 原始字段字典 → ScheduleRecord
// 红线:
// - 日期缺失/格式错误 → 该日期为缺失值，记录本身保留（从不报错）
// - 经销商缺失 → "Unknown"；阶段缺失 → 空串（分类为 NoStage）
// - 未识别字段原样保存在 source 中
// ==========================================

use crate::config::EngineConfig;
use crate::domain::record::{
    field_names as f, RawRecord, ScheduleRecord, SecondaryDateField, UNKNOWN_DEALER,
};
use crate::importer::data_cleaner::DataCleaner;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

/// 单个无法解析的日期
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateIssue {
    pub row_number: usize,
    pub field: String,
    pub value: String,
}

/// 规范化统计（数据质量报告）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeReport {
    pub total: usize,
    pub occupied: usize,
    pub missing_forecast_date: usize,
    pub unknown_dealer: usize,
    pub date_issues: Vec<DateIssue>,
}

impl NormalizeReport {
    pub fn unparsable_dates(&self) -> usize {
        self.date_issues.len()
    }
}

// ==========================================
// RecordNormalizer
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordNormalizer {
    cleaner: DataCleaner,
    warn_on_unparsable_dates: bool,
}

impl RecordNormalizer {
    pub fn new(warn_on_unparsable_dates: bool) -> Self {
        Self {
            cleaner: DataCleaner,
            warn_on_unparsable_dates,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.warn_on_unparsable_dates)
    }

    /// 批量规范化（保持输入顺序，row_number = 输入下标）
    #[instrument(skip(self, raw_records), fields(count = raw_records.len()))]
    pub fn normalize(&self, raw_records: &[RawRecord]) -> (Vec<ScheduleRecord>, NormalizeReport) {
        let mut report = NormalizeReport {
            total: raw_records.len(),
            ..NormalizeReport::default()
        };

        let records: Vec<ScheduleRecord> = raw_records
            .iter()
            .enumerate()
            .map(|(row_number, raw)| {
                let (record, issues) = self.normalize_one(row_number, raw);
                if record.is_occupied() {
                    report.occupied += 1;
                }
                if record.forecast_production_date.is_none() {
                    report.missing_forecast_date += 1;
                }
                if record.dealer == UNKNOWN_DEALER {
                    report.unknown_dealer += 1;
                }
                report.date_issues.extend(issues);
                record
            })
            .collect();

        if report.unparsable_dates() > 0 {
            tracing::info!(
                unparsable_dates = report.unparsable_dates(),
                missing_forecast_date = report.missing_forecast_date,
                "records normalized with date issues"
            );
        }
        (records, report)
    }

    /// 规范化单条记录，同时返回无法解析的日期
    pub fn normalize_one(&self, row_number: usize, raw: &RawRecord) -> (ScheduleRecord, Vec<DateIssue>) {
        let text = |name: &str| {
            self.cleaner
                .normalize_null(raw.get(name).map(String::as_str))
                .unwrap_or_default()
        };

        let mut issues = Vec::new();
        let mut date = |name: &str| {
            let value = raw.get(name).map(String::as_str);
            match self.cleaner.parse_date_field(value, name, row_number) {
                Ok(parsed) => parsed,
                Err(_) => {
                    let value = value.unwrap_or_default().trim().to_string();
                    if self.warn_on_unparsable_dates {
                        tracing::warn!(row = row_number, field = name, value = %value, "unparsable date");
                    }
                    issues.push(DateIssue {
                        row_number,
                        field: name.to_string(),
                        value,
                    });
                    None
                }
            }
        };

        let forecast_production_date = date(f::FORECAST_PRODUCTION_DATE);
        let secondary_dates: BTreeMap<SecondaryDateField, _> = SecondaryDateField::ALL
            .into_iter()
            .filter_map(|field| date(field.field_name()).map(|d| (field, d)))
            .collect();

        let dealer = Some(text(f::DEALER))
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| UNKNOWN_DEALER.to_string());

        let record = ScheduleRecord {
            row_number,
            chassis: text(f::CHASSIS),
            dealer,
            model: text(f::MODEL),
            model_year: text(f::MODEL_YEAR),
            customer: text(f::CUSTOMER),
            production_stage: text(f::REGENT_PRODUCTION),
            forecast_production_date,
            secondary_dates,
            source: raw.clone(),
        };
        (record, issues)
    }
}
