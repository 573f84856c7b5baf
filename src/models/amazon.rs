use serde::{Deserialize, Serialize};

pub const AMAZON_PRODUCT_URL: &str = "https://www.amazon.co.jp/dp/";
pub const AMAZON_OFFERS_URL: &str = "https://www.amazon.co.jp/gp/offer-listing/";

/// The seller shown when Amazon itself holds the pinned offer slot.
pub const AMAZON_SELLER_NAME: &str = "Amazon.co.jp";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AmazonProduct {
    pub asin: String,
    pub title: Option<String>,
    pub price: Option<i64>,
    pub brand: Option<String>,
    pub model_number: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub rating: Option<f64>,
    pub review_count: Option<i64>,
}

impl AmazonProduct {
    pub fn new(asin: &str) -> Self {
        Self {
            asin: asin.to_string(),
            title: None,
            price: None,
            brand: None,
            model_number: None,
            category: None,
            image_url: None,
            rating: None,
            review_count: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OfferCondition {
    New,
    Used,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompetitorOffer {
    pub price: i64,
    pub condition: OfferCondition,
    pub seller_name: Option<String>,
    pub shipping_cost: i64,
    pub is_fba: bool,
}

impl CompetitorOffer {
    pub fn total_price(&self) -> i64 {
        self.price + self.shipping_cost
    }
}

/// ASINs are exactly ten ASCII alphanumerics.
pub fn is_valid_asin(asin: &str) -> bool {
    asin.len() == 10 && asin.chars().all(|c| c.is_ascii_alphanumeric())
}
