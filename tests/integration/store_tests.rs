use std::sync::Arc;
use tempfile::TempDir;

use auction_watch::models::AuctionStatus;
use auction_watch::monitor::MonitoringCycle;
use auction_watch::store::AuctionStore;

use super::*;

fn file_config(dir: &TempDir) -> DatabaseConfig {
    DatabaseConfig {
        url: format!("sqlite://{}?mode=rwc", dir.path().join("watch.db").display()),
        max_connections: 2,
    }
}

#[tokio::test]
async fn test_state_survives_reconnect() {
    let dir = TempDir::new().unwrap();

    {
        let store = SqliteStore::connect(&file_config(&dir), 100).await.unwrap();
        seed_tracked(&store, &open_auction("p1", 8000)).await;

        let source = Arc::new(ScriptedSource::new());
        source.set("p1", Scripted::Page(open_auction("p1", 7500)));
        MonitoringCycle::new(Arc::new(store.clone()), source)
            .run()
            .await
            .unwrap();
        store.pool().close().await;
    }

    let store = SqliteStore::connect(&file_config(&dir), 100).await.unwrap();
    let row = store.find_auction("p1").await.unwrap().unwrap();
    assert_eq!(row.current_price, Some(7500));
    assert_eq!(row.previous_price, Some(8000));

    let notifications = store.list_notifications(10).await.unwrap();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "Price decrease: Nikon lens p1");
    assert!(!notifications[0].is_read);
}

#[tokio::test]
async fn test_retracking_restores_monitoring() {
    let store = create_test_store().await;
    let row_id = seed_tracked(&store, &open_auction("r1", 1000)).await;

    store.untrack(1, "r1").await.unwrap();
    assert!(store.monitored_auctions().await.unwrap().is_empty());

    store.track(1, row_id).await.unwrap();
    let monitored = store.monitored_auctions().await.unwrap();
    assert_eq!(monitored.len(), 1);
    assert_eq!(monitored[0].auction_id, "r1");
}

#[tokio::test]
async fn test_auction_linked_twice_is_checked_once() {
    let store = create_test_store().await;
    let row_id = seed_tracked(&store, &open_auction("d1", 1000)).await;
    store.track(2, row_id).await.unwrap();

    let monitored = store.monitored_auctions().await.unwrap();
    assert_eq!(monitored.len(), 1);

    // One product letting go still leaves the other watching
    store.untrack(1, "d1").await.unwrap();
    assert_eq!(store.monitored_auctions().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_refetch_does_not_reopen_ended_auction() {
    let store = create_test_store().await;
    seed_tracked(&store, &open_auction("z1", 3000)).await;

    let source = Arc::new(ScriptedSource::new());
    source.set("z1", Scripted::Page(closed_auction("z1", 3000)));
    MonitoringCycle::new(Arc::new(store.clone()), source)
        .run()
        .await
        .unwrap();

    // Re-adding the auction from a fresh page keeps the stored status
    store.upsert_auction(&open_auction("z1", 3000)).await.unwrap();
    let row = store.find_auction("z1").await.unwrap().unwrap();
    assert_eq!(row.status, AuctionStatus::Ended);
}

#[tokio::test]
async fn test_notification_history_is_capped() {
    let store = create_test_store_with_limit(2).await;
    for (i, id) in ["n1", "n2", "n3"].iter().enumerate() {
        seed_tracked(&store, &open_auction(id, 1000 + i as i64)).await;
    }

    let source = Arc::new(ScriptedSource::new());
    source.set("n1", Scripted::Page(open_auction("n1", 2000)));
    source.set("n2", Scripted::Page(open_auction("n2", 2000)));
    source.set("n3", Scripted::Page(open_auction("n3", 2000)));

    let report = MonitoringCycle::new(Arc::new(store.clone()), source)
        .run()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(report.events, 3);

    let notifications = store.list_notifications(10).await.unwrap();
    assert_eq!(notifications.len(), 2);
    assert!(notifications[0].title.ends_with("n3"));
    assert!(notifications[1].title.ends_with("n2"));
}
