use chrono::NaiveDate;
use scraper::Html;

use auction_watch::extract::{
    is_bot_challenge, parse_auction_detail, parse_closed_results, parse_search_results, AMAZON_CHALLENGE_MARKERS,
    YAHOO_CHALLENGE_MARKERS,
};
use auction_watch::models::detail_url;
use auction_watch::pricing::estimate_from_history;

use super::*;

const SEARCH: &str = include_str!("../fixtures/yahoo_search.html");
const DETAIL: &str = include_str!("../fixtures/yahoo_detail.html");
const HISTORY: &str = include_str!("../fixtures/yahoo_history.html");
const AMAZON_PRODUCT: &str = include_str!("../fixtures/amazon_product.html");

#[test]
fn test_search_results_link_to_detail_pages() {
    let results = parse_search_results(&Html::parse_document(SEARCH));

    assert!(!results.is_empty());
    for result in &results {
        assert_eq!(result.url, detail_url(&result.auction_id));
    }
}

#[test]
fn test_history_feeds_the_estimate() {
    let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
    let history = parse_closed_results(&Html::parse_document(HISTORY), today);

    // 3,000 / 28,000 / 31,500
    assert_eq!(estimate_from_history(&history, Some(90000)), Some(28000));
    assert_eq!(estimate_from_history(&[], Some(90000)), Some(63000));
}

#[test]
fn test_real_pages_are_not_challenges() {
    for page in [SEARCH, DETAIL, HISTORY] {
        assert!(!is_bot_challenge(&Html::parse_document(page), YAHOO_CHALLENGE_MARKERS));
    }
    assert!(!is_bot_challenge(&Html::parse_document(AMAZON_PRODUCT), AMAZON_CHALLENGE_MARKERS));
}

#[tokio::test]
async fn test_extracted_detail_can_be_tracked() {
    let detail = parse_auction_detail(&Html::parse_document(DETAIL), "x1122334455").unwrap();

    let store = create_test_store().await;
    seed_tracked(&store, &detail).await;

    let row = store.find_auction("x1122334455").await.unwrap().unwrap();
    assert_eq!(row.title, detail.title);
    assert_eq!(row.current_price, Some(25000));
    assert_eq!(row.buy_now_price, Some(40000));
    assert_eq!(row.end_time, detail.end_time);
    assert!(!row.price_changed);
}
