// ==========================================
// 车辆排产看板 - CSV 导出
// ==========================================
// 格式（下游消费方依赖，需逐字节一致）:
// - 首行为列名，其后每条记录一行（保持当前排序/筛选顺序）
// - 每个字段均以双引号包裹，逗号分隔，行间 '\n'，末尾无换行
// - 日期列输出源文本（DD/MM/YYYY），缺失字段输出 ""
// ==========================================

use crate::domain::record::{field_names as f, ScheduleRecord};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::path::Path;
use thiserror::Error;

/// 默认导出列
pub const DEFAULT_EXPORT_COLUMNS: [&str; 9] = [
    f::FORECAST_PRODUCTION_DATE,
    f::CHASSIS,
    f::CUSTOMER,
    f::DEALER,
    f::MODEL,
    f::MODEL_YEAR,
    f::REGENT_PRODUCTION,
    f::REQUEST_DELIVERY_DATE,
    f::SIGNED_PLANS_RECEIVED,
];

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV 写入失败: {0}")]
    Csv(#[from] csv::Error),

    #[error("文件写入失败: {0}")]
    Io(#[from] std::io::Error),

    #[error("导出内容编码错误: {0}")]
    Encoding(String),
}

pub type ExportResult<T> = Result<T, ExportError>;

// ==========================================
// CsvExporter
// ==========================================
#[derive(Debug, Clone)]
pub struct CsvExporter {
    columns: Vec<String>,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self::new(DEFAULT_EXPORT_COLUMNS)
    }
}

impl CsvExporter {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 渲染为 CSV 文本
    pub fn render(&self, records: &[ScheduleRecord]) -> ExportResult<String> {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        writer.write_record(&self.columns)?;
        for record in records {
            writer.write_record(self.columns.iter().map(|c| record.display_value(c)))?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| ExportError::Io(e.into_error()))?;
        let mut text = String::from_utf8(bytes).map_err(|e| ExportError::Encoding(e.to_string()))?;
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(text)
    }

    /// 渲染并写入文件
    pub fn write_to_path<P: AsRef<Path>>(&self, records: &[ScheduleRecord], path: P) -> ExportResult<usize> {
        let text = self.render(records)?;
        std::fs::write(path.as_ref(), text.as_bytes())?;
        tracing::info!(path = %path.as_ref().display(), rows = records.len(), "csv exported");
        Ok(records.len())
    }
}
