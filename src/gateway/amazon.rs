use std::sync::Arc;
use tracing::info;

use super::{load_and_extract, FetchOutcome};
use crate::browser::{FetchPolicy, SessionProvider};
use crate::extract::{parse_offers_page, parse_product_page, AMAZON_CHALLENGE_MARKERS};
use crate::models::{is_valid_asin, AmazonProduct, CompetitorOffer, AMAZON_OFFERS_URL, AMAZON_PRODUCT_URL};
use crate::utils::error::AppError;
use crate::Result;

pub struct AmazonGateway {
    sessions: Arc<dyn SessionProvider>,
    policy: FetchPolicy,
}

impl AmazonGateway {
    pub fn new(sessions: Arc<dyn SessionProvider>, policy: FetchPolicy) -> Self {
        Self { sessions, policy }
    }

    pub async fn product(&self, asin: &str) -> Result<FetchOutcome<AmazonProduct>> {
        check_asin(asin)?;
        let url = format!("{}{}", AMAZON_PRODUCT_URL, asin);

        let outcome = load_and_extract(
            self.sessions.as_ref(),
            &url,
            &self.policy,
            AMAZON_CHALLENGE_MARKERS,
            |doc| Some(parse_product_page(doc, asin)),
        )
        .await?;

        if let FetchOutcome::Found(product) = &outcome {
            info!(asin, price = ?product.price, "Amazon product fetched");
        }
        Ok(outcome)
    }

    pub async fn competitor_offers(&self, asin: &str) -> Result<FetchOutcome<Vec<CompetitorOffer>>> {
        check_asin(asin)?;
        let url = format!("{}{}", AMAZON_OFFERS_URL, asin);

        let outcome = load_and_extract(
            self.sessions.as_ref(),
            &url,
            &self.policy,
            AMAZON_CHALLENGE_MARKERS,
            |doc| Some(parse_offers_page(doc)),
        )
        .await?;

        if let FetchOutcome::Found(offers) = &outcome {
            info!(asin, count = offers.len(), "Competitor offers fetched");
        }
        Ok(outcome)
    }
}

fn check_asin(asin: &str) -> Result<()> {
    if is_valid_asin(asin) {
        Ok(())
    } else {
        Err(AppError::Validation(format!("invalid ASIN: {:?}", asin)))
    }
}
