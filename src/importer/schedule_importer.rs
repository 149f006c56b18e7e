// ==========================================
// 车辆排产看板 - 排产文件导入
// ==========================================
// 导入流程:
// 1. 文件读取与解析（CSV / Excel）
// 2. 表头映射（别名 → 标准字段名）
// 3. 规范化预检（生成数据质量报告，不丢弃任何行）
// 4. 落库（整体替换当前记录集，事务化）
// ==========================================

use crate::domain::record::RawRecord;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::FieldMapper;
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::record_normalizer::{NormalizeReport, RecordNormalizer};
use crate::perf::PerfGuard;
use crate::repository::data_store::{DataStore, ImportBatch};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

/// 导入结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub batch: ImportBatch,
    pub report: NormalizeReport,
}

// ==========================================
// ScheduleImporter
// ==========================================
pub struct ScheduleImporter {
    store: Arc<dyn DataStore>,
    parser: UniversalFileParser,
    mapper: FieldMapper,
    normalizer: RecordNormalizer,
}

impl ScheduleImporter {
    pub fn new(store: Arc<dyn DataStore>, normalizer: RecordNormalizer) -> Self {
        Self {
            store,
            parser: UniversalFileParser,
            mapper: FieldMapper,
            normalizer,
        }
    }

    /// 从文件导入（按扩展名选择解析器）
    #[instrument(skip(self, file_path), fields(path = %file_path.as_ref().display()))]
    pub fn import_file<P: AsRef<Path>>(&self, file_path: P) -> ImportResult<ImportSummary> {
        let path = file_path.as_ref();
        let rows = self.parser.parse(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        self.import_rows(&file_name, rows)
    }

    /// 导入已解析的原始行
    pub fn import_rows(&self, file_name: &str, rows: Vec<RawRecord>) -> ImportResult<ImportSummary> {
        let mut perf = PerfGuard::new("import_rows");
        perf.set_rows(rows.len());

        let mapped = self.mapper.map_rows(rows);
        let (_, report) = self.normalizer.normalize(&mapped);
        let batch = self.store.replace_records(file_name, &mapped)?;

        info!(
            batch_id = batch.batch_id,
            rows = batch.row_count,
            occupied = report.occupied,
            unparsable_dates = report.unparsable_dates(),
            "schedule imported"
        );
        Ok(ImportSummary { batch, report })
    }
}
