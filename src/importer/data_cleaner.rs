// ==========================================
// 车辆排产看板 - 数据清洗器
// ==========================================
// 职责: TRIM / NULL 标准化 / DD/MM/YYYY 日期解析
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, Default)]
pub struct DataCleaner;

impl DataCleaner {
    pub fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    /// 空白视为缺失
    pub fn normalize_null(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }

    /// 解析 DD/MM/YYYY（日、月允许 1~2 位，年份必须 4 位）
    ///
    /// 非法日历日期（如 31/02/2025）同样视为格式错误
    pub fn parse_schedule_date(&self, value: &str) -> Option<NaiveDate> {
        let mut parts = value.trim().split('/');
        let (day, month, year) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let short_number = |s: &str| (1..=2).contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit());
        if !short_number(day) || !short_number(month) {
            return None;
        }
        if year.len() != 4 || !year.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
    }

    /// 带行号/字段名上下文的严格解析（缺失值返回 Ok(None)）
    pub fn parse_date_field(
        &self,
        value: Option<&str>,
        field: &str,
        row_number: usize,
    ) -> ImportResult<Option<NaiveDate>> {
        match self.normalize_null(value) {
            None => Ok(None),
            Some(raw) => self
                .parse_schedule_date(&raw)
                .map(Some)
                .ok_or_else(|| ImportError::DateFormatError {
                    row: row_number,
                    field: field.to_string(),
                    value: raw,
                }),
        }
    }
}
