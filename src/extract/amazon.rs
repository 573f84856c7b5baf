use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html};

use super::text::{attr, find, find_all, flat_text, inner_text, non_empty, parse_count, parse_price, parse_rating};
use crate::models::{AmazonProduct, CompetitorOffer, OfferCondition, AMAZON_SELLER_NAME};

/// Tried in order; the first one yielding a number wins.
const PRICE_SELECTORS: [&str; 5] = [
    "span.a-price span.a-offscreen",
    "#priceblock_ourprice",
    "#priceblock_dealprice",
    "#corePrice_feature_div span.a-offscreen",
    ".a-price .a-offscreen",
];

const MODEL_ROWS: &str =
    "#productDetails_techSpec_section_1 tr, #detailBullets_feature_div li, #productDetails_detailBullets_sections1 tr";

const MODEL_LABELS: [&str; 3] = ["型番", "モデル番号", "Model"];

lazy_static! {
    static ref BRAND_NOISE: Regex = Regex::new(r"ブランド:\s*|のストアを表示").unwrap();
    static ref FIELD_SEPARATOR: Regex = Regex::new(r"[\t\n:：]").unwrap();
}

fn product_price(root: ElementRef<'_>) -> Option<i64> {
    PRICE_SELECTORS
        .iter()
        .filter_map(|css| find(root, css))
        .find_map(|el| parse_price(&flat_text(el)))
}

fn model_number(root: ElementRef<'_>) -> Option<String> {
    let row = find_all(root, MODEL_ROWS)
        .into_iter()
        .map(inner_text)
        .find(|text| MODEL_LABELS.iter().any(|label| text.contains(label)))?;

    let fields: Vec<&str> = FIELD_SEPARATOR
        .split(&row)
        .map(|f| f.trim().trim_matches('\u{200e}').trim_matches('\u{200f}').trim())
        .filter(|f| !f.is_empty())
        .collect();

    if fields.len() >= 2 {
        fields.last().map(|f| f.to_string())
    } else {
        None
    }
}

pub fn parse_product_page(document: &Html, asin: &str) -> AmazonProduct {
    let root = document.root_element();
    let mut product = AmazonProduct::new(asin);

    product.title = find(root, "#productTitle").and_then(|t| non_empty(flat_text(t)));
    product.price = product_price(root);
    product.brand = find(root, "#bylineInfo")
        .and_then(|b| non_empty(BRAND_NOISE.replace_all(&flat_text(b), "").trim().to_string()));
    product.model_number = model_number(root);
    product.category = find_all(root, "#wayfinding-breadcrumbs_feature_div a")
        .into_iter()
        .map(flat_text)
        .filter(|t| !t.is_empty())
        .last();
    product.image_url = find(root, "#landingImage, #imgBlkFront")
        .and_then(|img| attr(img, "data-old-hires").or_else(|| attr(img, "src")));
    product.rating = find(root, "#acrPopover span.a-icon-alt").and_then(|r| parse_rating(&flat_text(r)));
    product.review_count = find(root, "#acrCustomerReviewText").and_then(|r| parse_count(&flat_text(r)));

    product
}

/// The pinned offer (Amazon itself) comes first, then every other listed offer.
pub fn parse_offers_page(document: &Html) -> Vec<CompetitorOffer> {
    let root = document.root_element();
    let mut offers = Vec::new();

    let pinned_price = find(root, "#aod-pinned-offer")
        .and_then(|pinned| find(pinned, ".a-offscreen"))
        .and_then(|p| parse_price(&flat_text(p)));
    if let Some(price) = pinned_price {
        offers.push(CompetitorOffer {
            price,
            condition: OfferCondition::New,
            seller_name: Some(AMAZON_SELLER_NAME.to_string()),
            shipping_cost: 0,
            is_fba: true,
        });
    }

    for card in find_all(root, "#aod-offer") {
        let Some(price) = find(card, ".a-offscreen").and_then(|p| parse_price(&flat_text(p))) else {
            continue;
        };

        let condition = match find(card, "#aod-offer-heading h5") {
            Some(heading) if flat_text(heading).contains("中古") => OfferCondition::Used,
            _ => OfferCondition::New,
        };

        let shipping_text = find(card, "#aod-offer-shippingMessage").map(flat_text).unwrap_or_default();

        offers.push(CompetitorOffer {
            price,
            condition,
            seller_name: find(card, "#aod-offer-soldBy a").and_then(|s| non_empty(flat_text(s))),
            shipping_cost: find(card, "#aod-offer-shippingMessage .a-color-base")
                .and_then(|s| parse_price(&flat_text(s)))
                .unwrap_or(0),
            is_fba: shipping_text.contains("Amazon.co.jp") && shipping_text.contains("発送"),
        });
    }

    offers
}
