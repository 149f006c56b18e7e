// ==========================================
// 车辆排产看板 - 应用状态
// ==========================================
// 职责: 打开数据库、加载配置、装配 API 实例及调度策略
// ==========================================

use std::sync::Arc;

use crate::api::DashboardApi;
use crate::app::scheduler::{BusyYield, RecomputeGate, SearchDebouncer};
use crate::config::{ConfigManager, EngineConfig};
use crate::repository::SqliteDataStore;

/// 应用状态
///
/// 数据存储与配置共享同一个 SQLite 连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 生效的引擎配置
    pub config: EngineConfig,

    /// 看板API
    pub dashboard_api: Arc<DashboardApi>,

    /// 配置读写
    pub config_manager: Arc<ConfigManager>,

    // ===== 调度策略 =====
    pub debouncer: SearchDebouncer,
    pub busy_yield: BusyYield,
    pub recompute_gate: RecomputeGate,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// 配置读取失败时回退默认值（记录警告，不阻塞启动）
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let store = SqliteDataStore::new(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        let config_manager = ConfigManager::from_connection(store.connection())
            .map_err(|e| format!("无法创建ConfigManager: {}", e))?;

        let config = match config_manager.load_engine_config() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("引擎配置加载失败，使用默认值: {}", e);
                EngineConfig::default()
            }
        };

        let dashboard_api = Arc::new(DashboardApi::new(Arc::new(store), config.clone()));

        Ok(Self {
            db_path,
            debouncer: SearchDebouncer::from_config(&config),
            busy_yield: BusyYield::from_config(&config),
            recompute_gate: RecomputeGate::new(),
            config,
            dashboard_api,
            config_manager: Arc::new(config_manager),
        })
    }
}

/// 默认数据库路径
///
/// 优先读取 SCHEDULE_DASHBOARD_DB_PATH，否则放在用户数据目录下
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("SCHEDULE_DASHBOARD_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./schedule_dashboard.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("schedule-dashboard");
        // 目录创建失败时保留当前目录回退
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("schedule_dashboard.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_reads_config_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("dashboard.db").to_string_lossy().to_string();

        {
            let state = AppState::new(db_path.clone()).unwrap();
            assert_eq!(state.config, EngineConfig::default());
            state
                .config_manager
                .set_global_config_value(crate::config::config_keys::RED_SLOT_WINDOW_DAYS, "70")
                .unwrap();
        }

        let state = AppState::new(db_path).unwrap();
        assert_eq!(state.config.red_slot_window_days, 70);
    }
}
