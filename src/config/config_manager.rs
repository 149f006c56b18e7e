// ==========================================
// 车辆排产看板 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 红线: 配置值无法解析时回退默认值并告警，不阻断看板
// ==========================================

use crate::config::engine_config::{EngineConfig, MAX_MONTHLY_ORDER_LOOKBACK_MONTHS};
use crate::db::open_sqlite_connection;
use crate::engine::red_slot::MAX_RED_SLOT_WINDOW_DAYS;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::error::Error;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;
        crate::db::ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
            crate::db::ensure_schema(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 从配置快照恢复配置（覆盖现有 global 配置）
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> Result<usize, Box<dyn Error>> {
        let config_map: HashMap<String, String> = serde_json::from_str(snapshot_json)?;

        let mut conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (key, value) in config_map.iter() {
            count += tx.execute(
                "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
                 ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
                params![key, value],
            )?;
        }

        tx.commit()?;
        Ok(count)
    }

    // ===== 引擎配置 =====

    /// 以默认值为底，叠加 config_kv 覆写
    pub fn load_engine_config(&self) -> Result<EngineConfig, Box<dyn Error>> {
        let defaults = EngineConfig::default();

        let excluded_years = match self.get_config_value(config_keys::EXCLUDED_YEARS)? {
            None => defaults.excluded_years.clone(),
            Some(raw) => parse_year_list(&raw).unwrap_or_else(|| {
                tracing::warn!(
                    config_key = config_keys::EXCLUDED_YEARS,
                    raw_value = %raw,
                    "历史截断年份配置格式错误，使用默认值"
                );
                defaults.excluded_years.clone()
            }),
        };

        Ok(EngineConfig {
            excluded_years,
            red_slot_window_days: self.get_bounded(
                config_keys::RED_SLOT_WINDOW_DAYS,
                defaults.red_slot_window_days,
                0..=MAX_RED_SLOT_WINDOW_DAYS,
            )?,
            hide_finished_default: self
                .get_parsed(config_keys::HIDE_FINISHED_DEFAULT, defaults.hide_finished_default)?,
            search_debounce_ms: self
                .get_parsed(config_keys::SEARCH_DEBOUNCE_MS, defaults.search_debounce_ms)?,
            busy_yield_threshold: self
                .get_parsed(config_keys::BUSY_YIELD_THRESHOLD, defaults.busy_yield_threshold)?,
            busy_yield_ms: self.get_parsed(config_keys::BUSY_YIELD_MS, defaults.busy_yield_ms)?,
            warn_on_unparsable_dates: self.get_parsed(
                config_keys::WARN_ON_UNPARSABLE_DATES,
                defaults.warn_on_unparsable_dates,
            )?,
            monthly_order_lookback_months: self.get_bounded(
                config_keys::MONTHLY_ORDER_LOOKBACK_MONTHS,
                defaults.monthly_order_lookback_months,
                0..=MAX_MONTHLY_ORDER_LOOKBACK_MONTHS,
            )?,
        })
    }

    /// 读取并解析单个配置；无法解析时回退默认值
    fn get_parsed<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: FromStr + std::fmt::Debug,
    {
        let Some(raw) = self.get_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    default = ?default,
                    "配置值格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }

    /// 读取并解析单个配置；越界时同样回退默认值
    fn get_bounded<T>(
        &self,
        key: &str,
        default: T,
        range: RangeInclusive<T>,
    ) -> Result<T, Box<dyn Error>>
    where
        T: FromStr + PartialOrd + Copy + std::fmt::Debug,
    {
        let value = self.get_parsed(key, default)?;
        if range.contains(&value) {
            return Ok(value);
        }
        tracing::warn!(
            config_key = key,
            value = ?value,
            min = ?range.start(),
            max = ?range.end(),
            default = ?default,
            "配置值越界，使用默认值"
        );
        Ok(default)
    }
}

/// "2023,2024" → [2023, 2024]；空串表示不截断
fn parse_year_list(raw: &str) -> Option<Vec<i32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<i32>().ok())
        .collect()
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 时间分桶
    pub const EXCLUDED_YEARS: &str = "excluded_years"; // 逗号分隔年份

    // 红色槽位
    pub const RED_SLOT_WINDOW_DAYS: &str = "red_slot_window_days";

    // 表格视图
    pub const HIDE_FINISHED_DEFAULT: &str = "hide_finished_default";

    // 调度策略
    pub const SEARCH_DEBOUNCE_MS: &str = "search_debounce_ms";
    pub const BUSY_YIELD_THRESHOLD: &str = "busy_yield_threshold";
    pub const BUSY_YIELD_MS: &str = "busy_yield_ms";

    // 数据质量
    pub const WARN_ON_UNPARSABLE_DATES: &str = "warn_on_unparsable_dates";

    // 统计
    pub const MONTHLY_ORDER_LOOKBACK_MONTHS: &str = "monthly_order_lookback_months";
}
