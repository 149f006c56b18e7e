// ==========================================
// 车辆排产看板 - 配置层
// ==========================================
// 职责: 引擎配置默认值 + config_kv 覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod engine_config;

// 重导出
pub use config_manager::{config_keys, ConfigManager};
pub use engine_config::{EngineConfig, MAX_MONTHLY_ORDER_LOOKBACK_MONTHS};
