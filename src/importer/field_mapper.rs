// ==========================================
// 车辆排产看板 - 字段映射器
// ==========================================
// 职责: 源表头 → 标准字段名（大小写/空白不敏感 + 别名）
// 说明: 未识别的表头原样保留，供表格透传展示
// ==========================================

use crate::domain::record::{field_names as f, RawRecord, SecondaryDateField};

#[derive(Debug, Clone, Copy, Default)]
pub struct FieldMapper;

/// 标准字段的别名（不含标准名本身）
const ALIASES: &[(&str, &[&str])] = &[
    (f::CHASSIS, &["Chassis No", "Chassis Number", "Chassis ID"]),
    (f::DEALER, &["Dealer Name"]),
    (f::MODEL_YEAR, &["MY"]),
    (f::CUSTOMER, &["Customer Name"]),
    (f::FORECAST_PRODUCTION_DATE, &["Forecast Date", "Production Date"]),
    (f::REGENT_PRODUCTION, &["Production Stage", "Stage"]),
];

fn compact(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

impl FieldMapper {
    /// 标准字段名；无法识别时返回 None
    pub fn canonical_name(&self, header: &str) -> Option<&'static str> {
        let key = compact(header);
        if key.is_empty() {
            return None;
        }

        let standard = [
            f::CHASSIS,
            f::DEALER,
            f::MODEL,
            f::MODEL_YEAR,
            f::CUSTOMER,
            f::FORECAST_PRODUCTION_DATE,
            f::REGENT_PRODUCTION,
        ]
        .into_iter()
        .chain(SecondaryDateField::ALL.iter().map(|field| field.field_name()));

        for name in standard {
            if compact(name) == key {
                return Some(name);
            }
        }

        ALIASES
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|alias| compact(alias) == key))
            .map(|(name, _)| *name)
    }

    /// 映射一行；标准名与别名同时出现时，标准名列优先
    pub fn map_row(&self, row: RawRecord) -> RawRecord {
        let mut mapped = RawRecord::new();
        let mut from_alias: Vec<(String, String)> = Vec::new();

        for (header, value) in row {
            match self.canonical_name(&header) {
                Some(name) if name == header => {
                    mapped.insert(header, value);
                }
                Some(name) => from_alias.push((name.to_string(), value)),
                None => {
                    mapped.insert(header, value);
                }
            }
        }

        for (name, value) in from_alias {
            mapped.entry(name).or_insert(value);
        }
        mapped
    }

    pub fn map_rows(&self, rows: Vec<RawRecord>) -> Vec<RawRecord> {
        rows.into_iter().map(|row| self.map_row(row)).collect()
    }
}
