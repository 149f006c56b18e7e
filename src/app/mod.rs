// ==========================================
// 车辆排产看板 - 应用层
// ==========================================
// 职责: 宿主装配（数据库、配置、API）与交互调度策略
// ==========================================

pub mod scheduler;
pub mod state;

// 重导出
pub use scheduler::{BusyYield, RecomputeGate, RecomputeTicket, SearchDebouncer};
pub use state::{get_default_db_path, AppState};
