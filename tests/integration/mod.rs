// Integration tests for auction-watch
// These tests drive the monitoring pipeline against a real SQLite store with
// scripted auction pages in place of a browser.

pub mod cycle_tests;
pub mod extraction_tests;
pub mod scheduler_tests;
pub mod store_tests;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use auction_watch::config::DatabaseConfig;
use auction_watch::gateway::{DetailSource, FetchOutcome};
use auction_watch::models::AuctionDetail;
use auction_watch::store::SqliteStore;
use auction_watch::{AppError, Result};

/// What the scripted source answers for one auction id.
#[derive(Debug, Clone)]
pub enum Scripted {
    Page(AuctionDetail),
    NotFound,
    Unreachable,
    Broken,
}

/// Stand-in for the Yahoo gateway: answers from a table and records calls.
#[derive(Default)]
pub struct ScriptedSource {
    pages: Mutex<HashMap<String, Scripted>>,
    pub calls: Mutex<Vec<String>>,
    /// When set, the first call waits here before answering.
    pub gate: Option<Arc<Notify>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, auction_id: &str, answer: Scripted) {
        self.pages.lock().unwrap().insert(auction_id.to_string(), answer);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl DetailSource for ScriptedSource {
    async fn auction_detail(&self, auction_id: &str) -> Result<FetchOutcome<AuctionDetail>> {
        let first_call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(auction_id.to_string());
            calls.len() == 1
        };
        if first_call {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
        }

        let answer = self.pages.lock().unwrap().get(auction_id).cloned();
        match answer {
            Some(Scripted::Page(detail)) => Ok(FetchOutcome::Found(detail)),
            Some(Scripted::NotFound) | None => Ok(FetchOutcome::NotFound),
            Some(Scripted::Unreachable) => Ok(FetchOutcome::TransientFailure),
            Some(Scripted::Broken) => Err(AppError::Scraping(format!("unexpected markup on {}", auction_id))),
        }
    }
}

pub async fn create_test_store() -> SqliteStore {
    create_test_store_with_limit(100).await
}

pub async fn create_test_store_with_limit(max_notifications: u32) -> SqliteStore {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        max_connections: 1,
    };
    SqliteStore::connect(&config, max_notifications)
        .await
        .expect("in-memory store")
}

/// An open auction ending in two days.
pub fn open_auction(auction_id: &str, price: i64) -> AuctionDetail {
    let mut detail = AuctionDetail::new(auction_id, format!("Nikon lens {}", auction_id));
    detail.current_price = Some(price);
    detail.end_time = Some(Utc::now() + Duration::days(2));
    detail
}

/// The same auction as seen after it closed.
pub fn closed_auction(auction_id: &str, price: i64) -> AuctionDetail {
    let mut detail = open_auction(auction_id, price);
    detail.end_time = Some(Utc::now() - Duration::minutes(5));
    detail
}

/// Inserts and tracks an auction, returning its row id.
pub async fn seed_tracked(store: &SqliteStore, detail: &AuctionDetail) -> i64 {
    let row_id = store.upsert_auction(detail).await.expect("upsert");
    store.track(1, row_id).await.expect("track");
    row_id
}
