use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::Html;

use super::text::{attr, find, find_all, flat_text, parse_closed_date, parse_count, parse_yen};
use super::yahoo_search::encode;
use crate::models::HistoryResult;

pub const DEFAULT_HISTORY_COUNT: u32 = 50;

lazy_static! {
    static ref AUCTION_PATH: Regex = Regex::new(r"/auction/([a-zA-Z0-9]+)").unwrap();
}

pub fn closed_search_url(keyword: &str, count: u32) -> String {
    let kw = encode(keyword);
    format!(
        "https://auctions.yahoo.co.jp/closedsearch/closedsearch?p={}&va={}&exflg=1&b=1&n={}",
        kw, kw, count
    )
}

/// Closed listings with a resolved winning price. `today` anchors the
/// year-less closing dates.
pub fn parse_closed_results(document: &Html, today: NaiveDate) -> Vec<HistoryResult> {
    let root = document.root_element();

    find_all(root, "li.Product")
        .into_iter()
        .filter_map(|item| {
            let link = find(item, "a.Product__titleLink")?;
            let href = attr(link, "href")?;
            let auction_id = AUCTION_PATH.captures(&href)?.get(1)?.as_str().to_string();

            let winning_price = find_all(item, ".Product__price")
                .into_iter()
                .map(flat_text)
                .find(|text| text.contains("落札"))
                .and_then(|text| parse_yen(&text))?;

            Some(HistoryResult {
                auction_id,
                title: flat_text(link),
                winning_price,
                end_date: find(item, ".Product__time").and_then(|t| parse_closed_date(&flat_text(t), today)),
                bid_count: find(item, "a.Product__bid").and_then(|b| parse_count(&flat_text(b))),
            })
        })
        .collect()
}
