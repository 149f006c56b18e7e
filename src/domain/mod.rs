// ==========================================
// 车辆排产看板 - 领域模型层
// ==========================================
// 职责: 定义排产记录、筛选条件、经销商属性等领域值
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod dealer;
pub mod filter;
pub mod record;
pub mod reminder;
pub mod types;

// 重导出核心类型
pub use dealer::{DealerAttributes, DealerDirectory, DealerNote};
pub use filter::{
    FilterSpec, FilterSpecBuilder, SortConfig, SortKey, StageSelection, ViewQuery, ALL_DEALERS,
};
pub use record::{field_names, RawRecord, ScheduleRecord, SecondaryDateField, UNKNOWN_DEALER};
pub use reminder::{DueReminder, NewReminder, Reminder};
pub use types::{CanonicalStage, DealerClass, Occupancy, SortDirection, YearMonth};
