use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::gateway::{DetailSource, FetchOutcome};
use crate::models::{AuctionDetail, AuctionStatus, AuctionUpdate, ChangeEvent, TrackedAuction};
use crate::store::AuctionStore;
use crate::Result;

/// Aggregate counts for one pass over the worklist.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleReport {
    pub checked: usize,
    /// Items whose fresh state was written back.
    pub updated: usize,
    pub ended: usize,
    /// Unreachable or not found this time.
    pub skipped: usize,
    /// Unexpected per-item errors.
    pub failed: usize,
    pub events: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CycleReport {
    fn started(at: DateTime<Utc>) -> Self {
        Self {
            checked: 0,
            updated: 0,
            ended: 0,
            skipped: 0,
            failed: 0,
            events: 0,
            started_at: at,
            finished_at: at,
        }
    }
}

/// Diffs one stored auction against its fresh detail page.
///
/// Returns `None` for items that are no longer active; an ended auction is
/// never brought back, whatever the page says.
pub fn evaluate(
    item: &TrackedAuction,
    detail: &AuctionDetail,
    now: DateTime<Utc>,
) -> Option<(AuctionUpdate, Vec<ChangeEvent>)> {
    if item.status != AuctionStatus::Active {
        return None;
    }

    let mut update = AuctionUpdate::unchanged(item, now);
    let mut events = Vec::new();

    match (item.current_price, detail.current_price) {
        (Some(old), Some(new)) if old != new => {
            info!(auction_id = %item.auction_id, old, new, "Price changed");
            events.push(ChangeEvent::price_change(item.id, &item.title, old, new));
            update.previous_price = Some(old);
            update.price_changed = true;
        }
        _ => {}
    }

    update.current_price = detail.current_price.or(item.current_price);
    update.buy_now_price = detail.buy_now_price.or(item.buy_now_price);

    if detail.has_ended(now) {
        info!(auction_id = %item.auction_id, "Auction ended");
        update.status = AuctionStatus::Ended;
        events.push(ChangeEvent::auction_ended(item.id, &item.title, update.current_price));
    }

    Some((update, events))
}

/// One pass over every monitored auction. Fetches run item by item; all
/// writes land in a single commit at the end.
pub struct MonitoringCycle {
    store: Arc<dyn AuctionStore>,
    source: Arc<dyn DetailSource>,
    clock: fn() -> DateTime<Utc>,
    in_progress: Mutex<()>,
}

impl MonitoringCycle {
    pub fn new(store: Arc<dyn AuctionStore>, source: Arc<dyn DetailSource>) -> Self {
        Self {
            store,
            source,
            clock: Utc::now,
            in_progress: Mutex::new(()),
        }
    }

    /// Replaces the wall clock used for end-time checks and timestamps.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    pub fn is_running(&self) -> bool {
        self.in_progress.try_lock().is_err()
    }

    /// Runs one cycle. Returns `Ok(None)` without doing anything when another
    /// cycle holds the guard. A browser that cannot launch stops the cycle:
    /// what was gathered so far is committed and the launch error is returned.
    pub async fn run(&self) -> Result<Option<CycleReport>> {
        let Ok(_guard) = self.in_progress.try_lock() else {
            warn!("Monitoring cycle already in progress, skipping");
            return Ok(None);
        };

        let mut report = CycleReport::started((self.clock)());
        let items = self.store.monitored_auctions().await?;

        if items.is_empty() {
            info!("No active monitored auctions to check");
        } else {
            info!(count = items.len(), "Checking monitored auctions");
        }

        let mut updates = Vec::with_capacity(items.len());
        let mut events = Vec::new();

        for item in &items {
            report.checked += 1;

            match self.source.auction_detail(&item.auction_id).await {
                Ok(FetchOutcome::Found(detail)) => {
                    if let Some((update, item_events)) = evaluate(item, &detail, (self.clock)()) {
                        if update.status == AuctionStatus::Ended {
                            report.ended += 1;
                        }
                        report.updated += 1;
                        updates.push(update);
                        events.extend(item_events);
                    }
                }
                Ok(FetchOutcome::NotFound) => {
                    warn!(auction_id = %item.auction_id, "Could not find auction page, skipping");
                    report.skipped += 1;
                }
                Ok(FetchOutcome::TransientFailure) => {
                    warn!(auction_id = %item.auction_id, "Could not fetch auction detail, skipping");
                    report.skipped += 1;
                }
                Err(e) if e.is_fatal() => {
                    error!(auction_id = %item.auction_id, error = %e, "Aborting monitoring cycle");
                    self.store.commit_cycle(&updates, &events).await?;
                    return Err(e);
                }
                Err(e) => {
                    error!(auction_id = %item.auction_id, error = %e, "Error checking auction");
                    metrics::counter!("monitor_item_failures").increment(1);
                    report.failed += 1;
                }
            }
        }

        report.events = events.len();
        self.store.commit_cycle(&updates, &events).await?;
        report.finished_at = (self.clock)();

        metrics::counter!("monitor_cycles_completed").increment(1);
        info!(
            checked = report.checked,
            updated = report.updated,
            ended = report.ended,
            skipped = report.skipped,
            failed = report.failed,
            "Check complete"
        );

        Ok(Some(report))
    }
}
