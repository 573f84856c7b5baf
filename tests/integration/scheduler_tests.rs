use std::sync::Arc;
use std::time::Duration;

use auction_watch::monitor::MonitoringCycle;
use auction_watch::scheduler::CycleScheduler;

use super::*;

async fn scheduler_for(store: &SqliteStore, source: Arc<ScriptedSource>, interval: Duration) -> CycleScheduler {
    let cycle = Arc::new(MonitoringCycle::new(Arc::new(store.clone()), source));
    CycleScheduler::new(cycle, interval)
}

#[tokio::test]
async fn test_interval_trigger_runs_cycles() {
    let store = create_test_store().await;
    seed_tracked(&store, &open_auction("s1", 1000)).await;

    let source = Arc::new(ScriptedSource::new());
    source.set("s1", Scripted::Page(open_auction("s1", 1200)));

    let scheduler = scheduler_for(&store, source.clone(), Duration::from_secs(1)).await;
    scheduler.start().await.unwrap();

    let reported = tokio::time::timeout(Duration::from_secs(15), async {
        loop {
            if scheduler.status().await.last_report.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    })
    .await;
    scheduler.stop().await.unwrap();

    assert!(reported.is_ok(), "no scheduled cycle completed");
    assert!(source.call_count() >= 1);
    let row = store.find_auction("s1").await.unwrap().unwrap();
    assert_eq!(row.current_price, Some(1200));
}

#[tokio::test]
async fn test_run_now_while_stopped() {
    let store = create_test_store().await;
    seed_tracked(&store, &open_auction("s2", 500)).await;

    let source = Arc::new(ScriptedSource::new());
    source.set("s2", Scripted::Unreachable);

    let scheduler = scheduler_for(&store, source, Duration::from_secs(3600)).await;
    let report = scheduler.run_now().await.unwrap().unwrap();
    assert_eq!(report.checked, 1);
    assert_eq!(report.skipped, 1);

    let status = scheduler.status().await;
    assert!(!status.running);
    assert_eq!(status.interval_minutes, 60);
    assert_eq!(status.last_report, Some(report));
}

#[tokio::test]
async fn test_stop_then_start_again() {
    let store = create_test_store().await;
    let scheduler = scheduler_for(&store, Arc::new(ScriptedSource::new()), Duration::from_secs(3600)).await;

    scheduler.start().await.unwrap();
    scheduler.stop().await.unwrap();
    assert!(!scheduler.status().await.running);

    scheduler.start().await.unwrap();
    assert!(scheduler.status().await.running);
    scheduler.stop().await.unwrap();
}
