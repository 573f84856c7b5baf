use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const YAHOO_DETAIL_URL: &str = "https://page.auctions.yahoo.co.jp/jp/auction/";

pub fn detail_url(auction_id: &str) -> String {
    format!("{}{}", YAHOO_DETAIL_URL, auction_id)
}

/// One row of a keyword search results page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub auction_id: String,
    pub title: String,
    pub current_price: Option<i64>,
    pub buy_now_price: Option<i64>,
    pub image_url: Option<String>,
    pub end_time_text: Option<String>,
    pub bid_count: Option<i64>,
    pub url: String,
}

/// Everything the item page says about one auction. This is what the
/// monitoring cycle diffs against stored state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuctionDetail {
    pub auction_id: String,
    pub title: String,
    pub current_price: Option<i64>,
    pub buy_now_price: Option<i64>,
    pub start_price: Option<i64>,
    pub bid_count: Option<i64>,
    pub seller_id: Option<String>,
    pub seller_name: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub condition: Option<String>,
    pub image_urls: Vec<String>,
    pub shipping_info: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub url: String,
}

impl AuctionDetail {
    pub fn new(auction_id: &str, title: String) -> Self {
        Self {
            auction_id: auction_id.to_string(),
            title,
            current_price: None,
            buy_now_price: None,
            start_price: None,
            bid_count: None,
            seller_id: None,
            seller_name: None,
            start_time: None,
            end_time: None,
            condition: None,
            image_urls: Vec::new(),
            shipping_info: None,
            category: None,
            brand: None,
            url: detail_url(auction_id),
        }
    }

    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.end_time.is_some_and(|end| end < now)
    }
}

/// A closed auction with a resolved winning price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryResult {
    pub auction_id: String,
    pub title: String,
    pub winning_price: i64,
    pub end_date: Option<DateTime<Utc>>,
    pub bid_count: Option<i64>,
}
