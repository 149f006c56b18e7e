// ==========================================
// 车辆排产看板 - API 层
// ==========================================
// 职责: 提供看板业务 API 接口，供 CLI / 界面宿主调用
// ==========================================

pub mod dashboard_api;
pub mod error;

// 重导出核心类型
pub use dashboard_api::{DashboardApi, DashboardSession, DashboardSnapshot};
pub use error::{ApiError, ApiResult};
