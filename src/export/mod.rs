// ==========================================
// 车辆排产看板 - 导出层
// ==========================================

pub mod csv_export;

pub use csv_export::{CsvExporter, ExportError, ExportResult, DEFAULT_EXPORT_COLUMNS};
