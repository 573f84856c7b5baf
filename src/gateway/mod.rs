pub mod amazon;
pub mod yahoo;

use async_trait::async_trait;
use scraper::Html;
use serde::Serialize;
use tracing::{error, warn};

use crate::browser::{fetch_with_retry, FetchPolicy, SessionProvider};
use crate::extract::is_bot_challenge;
use crate::models::AuctionDetail;
use crate::Result;

pub use amazon::AmazonGateway;
pub use yahoo::YahooGateway;

/// Result of one gateway call. Errors are reserved for faults such as a
/// browser that will not launch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "record", rename_all = "snake_case")]
pub enum FetchOutcome<T> {
    Found(T),
    /// The page loaded but holds no such record, or it was a bot challenge.
    NotFound,
    /// Every navigation attempt failed; the target may be fine next cycle.
    TransientFailure,
}

impl<T> FetchOutcome<T> {
    #[cfg(test)]
    pub fn found(self) -> Option<T> {
        match self {
            FetchOutcome::Found(record) => Some(record),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchOutcome<U> {
        match self {
            FetchOutcome::Found(record) => FetchOutcome::Found(f(record)),
            FetchOutcome::NotFound => FetchOutcome::NotFound,
            FetchOutcome::TransientFailure => FetchOutcome::TransientFailure,
        }
    }
}

/// Where the monitoring cycle gets fresh auction state from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DetailSource: Send + Sync {
    async fn auction_detail(&self, auction_id: &str) -> Result<FetchOutcome<AuctionDetail>>;
}

/// Session, fetch, bot gate, extract. The page and its browser are released
/// when this returns, whatever the outcome.
pub(crate) async fn load_and_extract<T>(
    sessions: &dyn SessionProvider,
    url: &str,
    policy: &FetchPolicy,
    markers: &[&str],
    extract: impl FnOnce(&Html) -> Option<T>,
) -> Result<FetchOutcome<T>> {
    let page = sessions.open().await?;

    if !fetch_with_retry(page.as_ref(), url, policy).await {
        return Ok(FetchOutcome::TransientFailure);
    }

    let html = match page.html().await {
        Ok(html) => html,
        Err(e) => {
            warn!(url, error = %e, "Failed to read page content");
            return Ok(FetchOutcome::TransientFailure);
        }
    };
    drop(page);

    let document = Html::parse_document(&html);
    if is_bot_challenge(&document, markers) {
        error!(url, "Bot challenge detected, giving up on this page");
        metrics::counter!("bot_challenges_detected").increment(1);
        return Ok(FetchOutcome::NotFound);
    }

    Ok(match extract(&document) {
        Some(record) => FetchOutcome::Found(record),
        None => FetchOutcome::NotFound,
    })
}
