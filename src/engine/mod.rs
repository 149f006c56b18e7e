// ==========================================
// 车辆排产看板 - 引擎层
// ==========================================
// 职责: 纯变换（分类、分桶、筛选、排序、透视、统计）
// 红线: 引擎不访问存储，不持有可变共享状态；输入集合从不被修改
// ==========================================

pub mod error;
pub mod filter_engine;
pub mod pipeline;
pub mod pivot;
pub mod red_slot;
pub mod sort_search;
pub mod stage_classifier;
pub mod stats;
pub mod time_bucket;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use filter_engine::FilterEngine;
pub use pipeline::{TableView, ViewPipeline};
pub use pivot::{
    PeriodDetail, PivotAggregator, PivotMatrix, PivotRow, PivotSelection, PivotView, SlotCount,
};
pub use red_slot::{RedSlotDetector, DEFAULT_RED_SLOT_WINDOW_DAYS, MAX_RED_SLOT_WINDOW_DAYS};
pub use sort_search::SortSearchIndex;
pub use stage_classifier::StageClassifier;
pub use stats::{
    check_reminders, DashboardSummary, FilterOptions, MonthlyCount, StagesByDealerClass,
    StatsCalculator,
};
pub use time_bucket::{PeriodGranularity, TimeBucketer};
