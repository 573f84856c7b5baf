pub mod sqlite;

use async_trait::async_trait;

use crate::models::{AuctionUpdate, ChangeEvent, TrackedAuction};
use crate::Result;

pub use sqlite::SqliteStore;

/// Worklist and event sink as seen by the monitoring cycle.
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// Active auctions with at least one monitoring link.
    async fn monitored_auctions(&self) -> Result<Vec<TrackedAuction>>;

    /// Writes every update and appends every event in one transaction.
    async fn commit_cycle(&self, updates: &[AuctionUpdate], events: &[ChangeEvent]) -> Result<()>;
}
