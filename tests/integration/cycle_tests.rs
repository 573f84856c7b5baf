use std::sync::Arc;
use tokio::sync::Notify;

use auction_watch::models::AuctionStatus;
use auction_watch::monitor::MonitoringCycle;

use super::*;

fn cycle(store: &SqliteStore, source: &Arc<ScriptedSource>) -> MonitoringCycle {
    MonitoringCycle::new(Arc::new(store.clone()), source.clone())
}

#[tokio::test]
async fn test_price_increase_is_recorded_and_notified() {
    let store = create_test_store().await;
    let row_id = seed_tracked(&store, &open_auction("x100", 5000)).await;

    let source = Arc::new(ScriptedSource::new());
    source.set("x100", Scripted::Page(open_auction("x100", 6000)));

    let report = cycle(&store, &source).run().await.unwrap().unwrap();
    assert_eq!(report.updated, 1);
    assert_eq!(report.events, 1);

    let row = store.find_auction("x100").await.unwrap().unwrap();
    assert_eq!(row.previous_price, Some(5000));
    assert_eq!(row.current_price, Some(6000));
    assert!(row.price_changed);
    assert_eq!(row.status, AuctionStatus::Active);
    assert!(row.last_checked.is_some());

    let notifications = store.list_notifications(10).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, "price_change");
    assert_eq!(notifications[0].title, "Price increase: Nikon lens x100");
    assert!(notifications[0].message.ends_with("5,000円 → 6,000円 (+1,000円)"));
    assert_eq!(notifications[0].link_url, Some(format!("/monitor/{}", row_id)));
}

#[tokio::test]
async fn test_second_run_without_site_change_is_idempotent() {
    let store = create_test_store().await;
    seed_tracked(&store, &open_auction("x100", 5000)).await;

    let source = Arc::new(ScriptedSource::new());
    source.set("x100", Scripted::Page(open_auction("x100", 6000)));
    let cycle = cycle(&store, &source);

    cycle.run().await.unwrap();
    let after_first = store.find_auction("x100").await.unwrap().unwrap();

    let report = cycle.run().await.unwrap().unwrap();
    assert_eq!(report.events, 0);

    let after_second = store.find_auction("x100").await.unwrap().unwrap();
    assert_eq!(after_second.current_price, after_first.current_price);
    assert_eq!(after_second.previous_price, after_first.previous_price);
    assert_eq!(after_second.price_changed, after_first.price_changed);
    assert_eq!(after_second.status, after_first.status);
    assert_eq!(store.list_notifications(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_ended_auction_is_closed_once() {
    let store = create_test_store().await;
    seed_tracked(&store, &open_auction("e200", 12000)).await;

    let source = Arc::new(ScriptedSource::new());
    source.set("e200", Scripted::Page(closed_auction("e200", 12000)));
    let cycle = cycle(&store, &source);

    let report = cycle.run().await.unwrap().unwrap();
    assert_eq!(report.ended, 1);

    let row = store.find_auction("e200").await.unwrap().unwrap();
    assert_eq!(row.status, AuctionStatus::Ended);

    let notifications = store.list_notifications(10).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].kind, "auction_ended");
    assert!(notifications[0].message.ends_with("Final price: 12,000円"));

    // A stale page claiming the auction is still open changes nothing
    source.set("e200", Scripted::Page(open_auction("e200", 12000)));
    let report = cycle.run().await.unwrap().unwrap();
    assert_eq!(report.checked, 0);

    let row = store.find_auction("e200").await.unwrap().unwrap();
    assert_eq!(row.status, AuctionStatus::Ended);
    assert_eq!(store.list_notifications(10).await.unwrap().len(), 1);
    assert_eq!(source.call_count(), 1);
}

#[tokio::test]
async fn test_failing_item_does_not_block_the_others() {
    let store = create_test_store().await;
    seed_tracked(&store, &open_auction("a1", 1000)).await;
    seed_tracked(&store, &open_auction("a2", 2000)).await;
    seed_tracked(&store, &open_auction("a3", 3000)).await;

    let source = Arc::new(ScriptedSource::new());
    source.set("a1", Scripted::Page(open_auction("a1", 1100)));
    source.set("a2", Scripted::Broken);
    source.set("a3", Scripted::Page(open_auction("a3", 3300)));

    let report = cycle(&store, &source).run().await.unwrap().unwrap();
    assert_eq!(report.checked, 3);
    assert_eq!(report.updated, 2);
    assert_eq!(report.failed, 1);

    assert_eq!(store.find_auction("a1").await.unwrap().unwrap().current_price, Some(1100));
    assert_eq!(store.find_auction("a2").await.unwrap().unwrap().current_price, Some(2000));
    assert_eq!(store.find_auction("a3").await.unwrap().unwrap().current_price, Some(3300));
    assert_eq!(store.list_notifications(10).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_unreachable_item_keeps_stored_state() {
    let store = create_test_store().await;
    seed_tracked(&store, &open_auction("u1", 4000)).await;
    let before = store.find_auction("u1").await.unwrap().unwrap();

    let source = Arc::new(ScriptedSource::new());
    source.set("u1", Scripted::Unreachable);

    let report = cycle(&store, &source).run().await.unwrap().unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(report.updated, 0);

    let after = store.find_auction("u1").await.unwrap().unwrap();
    assert_eq!(after, before);
}

#[tokio::test]
async fn test_untracked_auctions_are_not_checked() {
    let store = create_test_store().await;
    seed_tracked(&store, &open_auction("t1", 1000)).await;
    seed_tracked(&store, &open_auction("t2", 2000)).await;
    store.untrack(1, "t2").await.unwrap();

    let source = Arc::new(ScriptedSource::new());
    source.set("t1", Scripted::NotFound);

    let report = cycle(&store, &source).run().await.unwrap().unwrap();
    assert_eq!(report.checked, 1);
    assert_eq!(*source.calls.lock().unwrap(), vec!["t1".to_string()]);
}

#[tokio::test]
async fn test_overlapping_run_is_a_no_op() {
    let store = create_test_store().await;
    seed_tracked(&store, &open_auction("g1", 1000)).await;

    let gate = Arc::new(Notify::new());
    let source = Arc::new(ScriptedSource {
        gate: Some(gate.clone()),
        ..ScriptedSource::default()
    });
    source.set("g1", Scripted::Page(open_auction("g1", 1500)));

    let cycle = Arc::new(cycle(&store, &source));
    let first = tokio::spawn({
        let cycle = cycle.clone();
        async move { cycle.run().await }
    });

    while !cycle.is_running() || source.call_count() == 0 {
        tokio::task::yield_now().await;
    }

    assert!(cycle.run().await.unwrap().is_none());

    gate.notify_one();
    let report = first.await.unwrap().unwrap().unwrap();
    assert_eq!(report.updated, 1);
    assert!(!cycle.is_running());
}

#[tokio::test]
async fn test_status_set_during_cycle_is_kept() {
    let store = create_test_store().await;
    let row_id = seed_tracked(&store, &open_auction("m1", 5000)).await;

    let gate = Arc::new(Notify::new());
    let source = Arc::new(ScriptedSource {
        gate: Some(gate.clone()),
        ..ScriptedSource::default()
    });
    source.set("m1", Scripted::Page(open_auction("m1", 5500)));

    let cycle = Arc::new(cycle(&store, &source));
    let running = tokio::spawn({
        let cycle = cycle.clone();
        async move { cycle.run().await }
    });

    while source.call_count() == 0 {
        tokio::task::yield_now().await;
    }

    // Bought while the page was still loading
    sqlx::query("UPDATE auctions SET status = 'sold' WHERE id = ?1")
        .bind(row_id)
        .execute(store.pool())
        .await
        .unwrap();

    gate.notify_one();
    running.await.unwrap().unwrap().unwrap();

    let row = store.find_auction("m1").await.unwrap().unwrap();
    assert_eq!(row.status, AuctionStatus::Sold);
    assert_eq!(row.current_price, Some(5000));
}
