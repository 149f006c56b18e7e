// ==========================================
// 车辆排产看板 - 重算调度策略
// ==========================================
// 职责: 引擎之外的交互调度（搜索去抖、大集合重算前让出、只保留最新结果）
// 红线: 引擎本身保持同步、确定性；这里只决定"何时算"和"结果是否作废"
// ==========================================

use crate::config::EngineConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

// ==========================================
// SearchDebouncer - 搜索输入去抖
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct SearchDebouncer {
    window: Duration,
}

impl SearchDebouncer {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(Duration::from_millis(config.search_debounce_ms))
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// 等待下一个静默期后的搜索词；通道关闭且无待处理输入时返回 None
    pub async fn next_settled(&self, rx: &mut mpsc::Receiver<String>) -> Option<String> {
        let mut latest = rx.recv().await?;
        let mut coalesced = 0usize;
        loop {
            match tokio::time::timeout(self.window, rx.recv()).await {
                Ok(Some(term)) => {
                    latest = term;
                    coalesced += 1;
                }
                // 发送端关闭: 以最后输入为准
                Ok(None) => break,
                Err(_) => break,
            }
        }
        debug!(coalesced, term = %latest, "search term settled");
        Some(latest)
    }
}

// ==========================================
// BusyYield - 大集合重算前短暂让出
// ==========================================
// 让宿主有机会先渲染忙碌指示，再执行同步计算
#[derive(Debug, Clone, Copy)]
pub struct BusyYield {
    threshold: usize,
    delay: Duration,
}

impl BusyYield {
    pub fn new(threshold: usize, delay: Duration) -> Self {
        Self { threshold, delay }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            config.busy_yield_threshold,
            Duration::from_millis(config.busy_yield_ms),
        )
    }

    pub fn should_yield(&self, input_len: usize) -> bool {
        input_len > self.threshold && !self.delay.is_zero()
    }

    /// 必要时让出后执行计算
    pub async fn run<T, F>(&self, input_len: usize, compute: F) -> T
    where
        F: FnOnce() -> T,
    {
        if self.should_yield(input_len) {
            tokio::time::sleep(self.delay).await;
        }
        compute()
    }
}

// ==========================================
// RecomputeGate - 只保留最新一次重算
// ==========================================
// 无取消语义: 被新输入取代的计算照常完成，结果在发布时丢弃
#[derive(Debug, Clone, Default)]
pub struct RecomputeGate {
    generation: Arc<AtomicU64>,
}

/// 某次重算的代号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecomputeTicket(u64);

impl RecomputeGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// 开始一次重算，之前的代号全部作废
    pub fn begin(&self) -> RecomputeTicket {
        RecomputeTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RecomputeTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// 仍是最新代号时返回结果，否则丢弃
    pub fn publish<T>(&self, ticket: RecomputeTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            debug!(ticket = ticket.0, "stale recompute discarded");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_debounce_coalesces_burst() {
        let (tx, mut rx) = mpsc::channel(16);
        for term in ["a", "ab", "abc"] {
            tx.send(term.to_string()).await.unwrap();
        }

        let debouncer = SearchDebouncer::new(Duration::from_millis(300));
        let start = Instant::now();
        let settled = debouncer.next_settled(&mut rx).await;
        assert_eq!(settled.as_deref(), Some("abc"));
        assert!(start.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_separates_quiet_gaps() {
        let (tx, mut rx) = mpsc::channel(16);
        tokio::spawn(async move {
            tx.send("x".to_string()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(500)).await;
            tx.send("xy".to_string()).await.unwrap();
        });

        let debouncer = SearchDebouncer::new(Duration::from_millis(300));
        assert_eq!(debouncer.next_settled(&mut rx).await.as_deref(), Some("x"));
        assert_eq!(debouncer.next_settled(&mut rx).await.as_deref(), Some("xy"));
        assert_eq!(debouncer.next_settled(&mut rx).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_yield_only_above_threshold() {
        let busy = BusyYield::new(100, Duration::from_millis(10));

        let start = Instant::now();
        assert_eq!(busy.run(50, || 1).await, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);

        assert_eq!(busy.run(101, || 2).await, 2);
        assert!(start.elapsed() >= Duration::from_millis(10));
    }

    #[test]
    fn test_gate_discards_superseded_results() {
        let gate = RecomputeGate::new();
        let first = gate.begin();
        let second = gate.begin();

        assert_eq!(gate.publish(first, "old"), None);
        assert_eq!(gate.publish(second, "new"), Some("new"));

        let shared = gate.clone();
        let third = shared.begin();
        assert!(!gate.is_current(second));
        assert!(gate.is_current(third));
    }
}
