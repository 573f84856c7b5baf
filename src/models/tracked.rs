use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
pub enum AuctionStatus {
    Active,
    Ended,
    /// Set outside the pipeline once the item has been bought.
    Sold,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Active => "active",
            AuctionStatus::Ended => "ended",
            AuctionStatus::Sold => "sold",
        }
    }
}

/// Stored state of one monitored auction, as read from the worklist.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct TrackedAuction {
    pub id: i64,
    pub auction_id: String,
    pub title: String,
    pub current_price: Option<i64>,
    pub buy_now_price: Option<i64>,
    pub previous_price: Option<i64>,
    pub price_changed: bool,
    pub status: AuctionStatus,
    pub end_time: Option<DateTime<Utc>>,
    pub last_checked: Option<DateTime<Utc>>,
}

/// The fields a cycle writes back for one item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuctionUpdate {
    pub id: i64,
    pub current_price: Option<i64>,
    pub buy_now_price: Option<i64>,
    pub previous_price: Option<i64>,
    pub price_changed: bool,
    pub status: AuctionStatus,
    pub last_checked: DateTime<Utc>,
}

impl AuctionUpdate {
    /// Starts from the stored values; anything not touched is written back as-is.
    pub fn unchanged(item: &TrackedAuction, checked_at: DateTime<Utc>) -> Self {
        Self {
            id: item.id,
            current_price: item.current_price,
            buy_now_price: item.buy_now_price,
            previous_price: item.previous_price,
            price_changed: item.price_changed,
            status: item.status,
            last_checked: checked_at,
        }
    }
}
