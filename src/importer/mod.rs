// ==========================================
// 车辆排产看板 - 导入层
// ==========================================
// 职责: 外部排产文件 → 原始记录 → ScheduleRecord
// 支持: Excel, CSV
// ==========================================

pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod record_normalizer;
pub mod schedule_importer;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, FileParser, UniversalFileParser};
pub use record_normalizer::{DateIssue, NormalizeReport, RecordNormalizer};
pub use schedule_importer::{ImportSummary, ScheduleImporter};
