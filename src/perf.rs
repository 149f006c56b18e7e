// ==========================================
// 车辆排产看板 - 性能统计
// ==========================================
// PerfGuard: 记录操作耗时、处理行数、期间执行的 SQL 语句数
// 环境变量:
// - SCHEDULE_DASHBOARD_SLOW_OP_MS   慢操作阈值（毫秒），超过时 warn
// - SCHEDULE_DASHBOARD_PERF_SQL     强制开启/关闭 SQL 计数（Debug 默认开启）
// - SCHEDULE_DASHBOARD_SLOW_SQL_MS  慢 SQL 阈值（毫秒）
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

static PERF_SQL_ENABLED: AtomicBool = AtomicBool::new(false);
static SLOW_SQL_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static PERF_DEPTH: Cell<u32> = Cell::new(0);
    static SQL_COUNT: Cell<u64> = Cell::new(0);
}

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

fn env_ms(name: &str) -> Option<u64> {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// 慢操作阈值；未配置时为 0（不告警）
pub fn slow_op_threshold_ms() -> u64 {
    env_ms("SCHEDULE_DASHBOARD_SLOW_OP_MS").unwrap_or(0)
}

fn truncate_sql(sql: &str, max_len: usize) -> String {
    let s = sql.trim().replace('\n', " ");
    match s.char_indices().nth(max_len) {
        None => s,
        Some((idx, _)) => format!("{}…", &s[..idx]),
    }
}

/// 安装 SQLite 语句 trace/profile（SQL 计数 + 慢查询日志）
pub fn install_sqlite_tracing(conn: &mut Connection) {
    let enabled = match std::env::var("SCHEDULE_DASHBOARD_PERF_SQL") {
        Ok(v) => is_true(&v),
        Err(_) => cfg!(debug_assertions),
    };

    PERF_SQL_ENABLED.store(enabled, Ordering::Relaxed);

    if !enabled {
        conn.trace(None);
        conn.profile(None);
        return;
    }

    let slow_ms = env_ms("SCHEDULE_DASHBOARD_SLOW_SQL_MS")
        .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
    SLOW_SQL_THRESHOLD_MS.store(slow_ms, Ordering::Relaxed);

    conn.trace(Some(sql_trace_callback));
    conn.profile(Some(sql_profile_callback));
}

fn sql_trace_callback(_sql: &str) {
    if !PERF_SQL_ENABLED.load(Ordering::Relaxed) {
        return;
    }
    if PERF_DEPTH.with(|d| d.get() > 0) {
        SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));
    }
}

fn sql_profile_callback(sql: &str, duration: Duration) {
    if !PERF_SQL_ENABLED.load(Ordering::Relaxed) {
        return;
    }

    let ms = duration.as_millis() as u64;
    let threshold = SLOW_SQL_THRESHOLD_MS.load(Ordering::Relaxed);
    if threshold > 0 && ms >= threshold {
        tracing::warn!(
            target: "slow_sql",
            duration_ms = ms,
            sql = %truncate_sql(sql, 420),
            "slow sql"
        );
    }
}

/// 性能统计 Guard：drop 时输出 elapsed_ms / rows / sql_count
///
/// ```ignore
/// let mut perf = schedule_dashboard::perf::PerfGuard::new("table_view");
/// perf.set_rows(rows.len());
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    sql_start: u64,
    rows: Option<usize>,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_add(1)));
        Self {
            op,
            start: Instant::now(),
            sql_start: SQL_COUNT.with(|c| c.get()),
            rows: None,
        }
    }

    pub fn set_rows(&mut self, rows: usize) {
        self.rows = Some(rows);
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        let sql_count = SQL_COUNT.with(|c| c.get()).saturating_sub(self.sql_start);
        let rows = self.rows.unwrap_or(0);

        let threshold = slow_op_threshold_ms();
        if threshold > 0 && elapsed_ms >= threshold {
            tracing::warn!(target: "perf", op = self.op, elapsed_ms, rows, sql_count, "slow op");
        } else {
            tracing::info!(target: "perf", op = self.op, elapsed_ms, rows, sql_count, "done");
        }

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}
