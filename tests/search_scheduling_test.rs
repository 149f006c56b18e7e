// ==========================================
// 搜索去抖与重算调度测试
// ==========================================
// 测试范围:
// 1. 连续输入合并为一次搜索
// 2. 仅最新一次重算结果被发布
// 3. 大集合重算前让出
// ==========================================

mod helpers;

use helpers::record_builder::*;
use schedule_dashboard::api::DashboardApi;
use schedule_dashboard::app::{BusyYield, RecomputeGate, SearchDebouncer};
use schedule_dashboard::config::EngineConfig;
use schedule_dashboard::repository::MemoryDataStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;

fn api() -> DashboardApi {
    let store = MemoryDataStore::with_records(sample_raw_records());
    DashboardApi::new(Arc::new(store), EngineConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_typing_burst_triggers_single_recompute() {
    let api = api();
    let snapshot = api.load_snapshot().unwrap();
    let debouncer = SearchDebouncer::from_config(api.config());
    let (tx, mut rx) = mpsc::channel(32);

    tokio::spawn(async move {
        for term in ["a", "ab", "abc", "abc0"] {
            tx.send(term.to_string()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    });

    let mut session = api.new_session();
    let mut recomputes = 0;
    while let Some(term) = debouncer.next_settled(&mut rx).await {
        session.set_search(&term);
        recomputes += 1;
    }

    assert_eq!(recomputes, 1);
    assert_eq!(session.query().search, "abc0");

    let view = api.table_view(&snapshot, session.query(), date(2025, 1, 1));
    assert!(!view.is_empty());
    assert!(view
        .rows
        .iter()
        .all(|r| r.chassis.to_lowercase().contains("abc0")));
}

#[tokio::test(start_paused = true)]
async fn test_superseded_recompute_is_discarded() {
    let api = Arc::new(api());
    let snapshot = Arc::new(api.load_snapshot().unwrap());
    let gate = RecomputeGate::new();
    let busy = BusyYield::new(10, Duration::from_millis(100));

    let mut first_session = api.new_session();
    first_session.set_search("ABC");
    let mut second_session = api.new_session();
    second_session.set_search("DEF");

    let first_ticket = gate.begin();
    let first = {
        let (api, snapshot, gate) = (api.clone(), snapshot.clone(), gate.clone());
        tokio::spawn(async move {
            let view = busy
                .run(snapshot.records.len(), || {
                    api.table_view(&snapshot, first_session.query(), date(2025, 1, 1))
                })
                .await;
            gate.publish(first_ticket, view)
        })
    };

    // 新输入在第一次计算让出期间到达
    tokio::time::sleep(Duration::from_millis(10)).await;
    let second_ticket = gate.begin();
    let start = Instant::now();
    let second_view = busy
        .run(snapshot.records.len(), || {
            api.table_view(&snapshot, second_session.query(), date(2025, 1, 1))
        })
        .await;
    assert!(start.elapsed() >= Duration::from_millis(100));

    assert!(first.await.unwrap().is_none());
    let published = gate.publish(second_ticket, second_view).unwrap();
    assert!(published.rows.iter().all(|r| r.chassis.starts_with("DEF")));
}
