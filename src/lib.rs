// ==========================================
// 车辆排产看板 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 排产记录的筛选、分桶、透视与汇总（渲染由宿主负责）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 记录与值类型
pub mod domain;

// 数据仓储层 - DataStore
pub mod repository;

// 引擎层 - 纯变换
pub mod engine;

// 导入层 - CSV / Excel
pub mod importer;

// 导出层 - CSV
pub mod export;

// 配置层
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能埋点
pub mod perf;

// API 层
pub mod api;

// 应用层 - 装配与调度
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    CanonicalStage, DealerClass, FilterSpec, ScheduleRecord, SortConfig, SortKey, ViewQuery,
};

pub use engine::{
    FilterEngine, PivotAggregator, PivotMatrix, RedSlotDetector, SortSearchIndex,
    StageClassifier, TimeBucketer, ViewPipeline,
};

pub use importer::RecordNormalizer;

pub use api::{ApiError, ApiResult, DashboardApi, DashboardSession};

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "车辆排产看板";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
