use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::{load_and_extract, DetailSource, FetchOutcome};
use crate::browser::{FetchPolicy, SessionProvider};
use crate::extract::text::today_jst;
use crate::extract::{
    closed_search_url, parse_auction_detail, parse_closed_results, parse_search_results, search_url,
    YAHOO_CHALLENGE_MARKERS,
};
use crate::models::{detail_url, AuctionDetail, HistoryResult, SearchResult};
use crate::utils::error::AppError;
use crate::Result;

pub struct YahooGateway {
    sessions: Arc<dyn SessionProvider>,
    policy: FetchPolicy,
}

impl YahooGateway {
    pub fn new(sessions: Arc<dyn SessionProvider>, policy: FetchPolicy) -> Self {
        Self { sessions, policy }
    }

    pub async fn search(&self, keyword: &str) -> Result<FetchOutcome<Vec<SearchResult>>> {
        let keyword = require_keyword(keyword)?;
        let outcome = load_and_extract(
            self.sessions.as_ref(),
            &search_url(keyword),
            &self.policy,
            YAHOO_CHALLENGE_MARKERS,
            |doc| Some(parse_search_results(doc)),
        )
        .await?;

        if let FetchOutcome::Found(results) = &outcome {
            info!(keyword, count = results.len(), "Search finished");
        }
        Ok(outcome)
    }

    pub async fn closed_history(&self, keyword: &str, count: u32) -> Result<FetchOutcome<Vec<HistoryResult>>> {
        let keyword = require_keyword(keyword)?;
        let today = today_jst(Utc::now())
            .ok_or_else(|| AppError::Internal("cannot compute JST date".to_string()))?;

        let outcome = load_and_extract(
            self.sessions.as_ref(),
            &closed_search_url(keyword, count),
            &self.policy,
            YAHOO_CHALLENGE_MARKERS,
            |doc| Some(parse_closed_results(doc, today)),
        )
        .await?;

        if let FetchOutcome::Found(results) = &outcome {
            info!(keyword, count = results.len(), "Closed auction history fetched");
        }
        Ok(outcome)
    }
}

#[async_trait]
impl DetailSource for YahooGateway {
    async fn auction_detail(&self, auction_id: &str) -> Result<FetchOutcome<AuctionDetail>> {
        if auction_id.is_empty() || !auction_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AppError::Validation(format!("invalid auction id: {:?}", auction_id)));
        }

        let outcome = load_and_extract(
            self.sessions.as_ref(),
            &detail_url(auction_id),
            &self.policy,
            YAHOO_CHALLENGE_MARKERS,
            |doc| parse_auction_detail(doc, auction_id),
        )
        .await?;

        if outcome == FetchOutcome::NotFound {
            warn!(auction_id, "Auction page had no title");
        }
        Ok(outcome)
    }
}

fn require_keyword(keyword: &str) -> Result<&str> {
    let trimmed = keyword.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("keyword must not be empty".to_string()));
    }
    Ok(trimmed)
}
