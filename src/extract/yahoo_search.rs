use scraper::Html;

use super::text::{attr, find, find_all, flat_text, non_empty, parse_count};
use crate::models::{detail_url, SearchResult};

/// Keyword search URL, 50 results per page.
pub fn search_url(keyword: &str) -> String {
    let kw = encode(keyword);
    format!(
        "https://auctions.yahoo.co.jp/search/search?p={}&va={}&exflg=1&b=1&n=50",
        kw, kw
    )
}

pub(crate) fn encode(keyword: &str) -> String {
    url::form_urlencoded::byte_serialize(keyword.as_bytes()).collect()
}

fn attr_int(raw: Option<String>) -> Option<i64> {
    raw?.replace(',', "").parse().ok()
}

/// Every `li.Product` that carries an auction id becomes one row; rows
/// without an id are dropped.
pub fn parse_search_results(document: &Html) -> Vec<SearchResult> {
    let root = document.root_element();

    find_all(root, "li.Product")
        .into_iter()
        .filter_map(|item| {
            let link = find(item, "a.Product__titleLink, a.Product__imageLink")?;
            let auction_id = attr(link, "data-auction-id")?;

            let buy_now_price = find(item, ".Product__bonus")
                .and_then(|bonus| attr_int(attr(bonus, "data-auction-buynowprice")))
                .filter(|price| *price > 0);

            Some(SearchResult {
                url: detail_url(&auction_id),
                title: attr(link, "data-auction-title").unwrap_or_default(),
                current_price: attr_int(attr(link, "data-auction-price")),
                buy_now_price,
                image_url: find(item, "img.Product__imageData").and_then(|img| attr(img, "src")),
                end_time_text: find(item, ".Product__time").and_then(|t| non_empty(flat_text(t))),
                bid_count: find(item, ".Product__bid").and_then(|b| parse_count(&flat_text(b))),
                auction_id,
            })
        })
        .collect()
}
