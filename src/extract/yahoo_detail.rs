use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html};

use super::text::{
    attr, find, find_all, flat_text, inner_text, non_empty, parse_count, parse_jp_datetime, parse_price,
};
use crate::models::AuctionDetail;

const SHIPPING_TEXT_LIMIT: usize = 100;
const IMAGE_CDN_HOST: &str = "auctions.c.yimg.jp";

lazy_static! {
    static ref SELLER_ID: Regex = Regex::new(r"/seller/([^/?]+)").unwrap();
}

/// `(label, value)` pairs of a description list, in document order.
fn description_pairs(list: ElementRef<'_>) -> Vec<(String, ElementRef<'_>)> {
    let mut pairs = Vec::new();
    let mut label: Option<String> = None;

    for child in list.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "dt" => label = Some(flat_text(child)),
            "dd" => {
                if let Some(l) = label.take() {
                    pairs.push((l, child));
                }
            }
            // Some layouts wrap each pair in a div
            "div" => pairs.extend(description_pairs(child)),
            _ => {}
        }
    }
    pairs
}

fn first_line(element: ElementRef<'_>) -> Option<String> {
    inner_text(element).lines().next().map(str::to_string)
}

fn category_path(value: ElementRef<'_>) -> Option<String> {
    let links: Vec<String> = find_all(value, "a")
        .into_iter()
        .map(flat_text)
        .filter(|t| !t.is_empty())
        .collect();

    if links.is_empty() {
        non_empty(inner_text(value).replace('\n', " > "))
    } else {
        Some(links.join(" > "))
    }
}

fn truncate(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// Reads an item page. Returns `None` when the page has no title, which
/// means it is not an auction page at all.
pub fn parse_auction_detail(document: &Html, auction_id: &str) -> Option<AuctionDetail> {
    let root = document.root_element();

    let title = find(root, "h1").map(flat_text).and_then(non_empty)?;
    let mut detail = AuctionDetail::new(auction_id, title);

    for list in find_all(root, "dl") {
        for (label, value) in description_pairs(list) {
            if label.starts_with("現在") {
                detail.current_price = detail.current_price.or_else(|| parse_price(&inner_text(value)));
            } else if label.starts_with("即決") {
                detail.buy_now_price = detail.buy_now_price.or_else(|| parse_price(&inner_text(value)));
            } else if label.starts_with("カテゴリ") {
                detail.category = detail.category.take().or_else(|| category_path(value));
            } else if label.starts_with("ブランド") {
                detail.brand = detail.brand.take().or_else(|| first_line(value));
            } else if label.starts_with("商品の状態") {
                detail.condition = detail.condition.take().or_else(|| first_line(value));
            } else if label.starts_with("送料") && detail.shipping_info.is_none() {
                detail.shipping_info = first_line(value)
                    .or_else(|| non_empty(truncate(&flat_text(list), SHIPPING_TEXT_LIMIT)));
            }
        }
    }

    // Buy-now-only listings show no separate current price
    if detail.current_price.is_none() {
        detail.current_price = detail.buy_now_price;
    }

    detail.bid_count = find(root, "a[href*='bid_hist']").and_then(|a| parse_count(&flat_text(a)));

    if let Some(seller) = find(root, "a[href*='seller']") {
        detail.seller_name = non_empty(flat_text(seller));
        detail.seller_id = attr(seller, "href")
            .and_then(|href| SELLER_ID.captures(&href).map(|c| c[1].to_string()));
    }

    for row in find_all(root, "table tr") {
        let headers = find_all(row, "th");
        let cells = find_all(row, "td");

        for (header, cell) in headers.into_iter().zip(cells) {
            let label = flat_text(header);
            let value = inner_text(cell);
            match label.as_str() {
                "開始時の価格" => detail.start_price = parse_price(&value),
                "開始日時" => detail.start_time = parse_jp_datetime(&value),
                "終了日時" => detail.end_time = parse_jp_datetime(&value),
                _ => {}
            }
        }
    }

    for img in find_all(root, "img[alt*='_画像']") {
        if let Some(src) = attr(img, "src") {
            if src.contains(IMAGE_CDN_HOST) && !detail.image_urls.contains(&src) {
                detail.image_urls.push(src);
            }
        }
    }

    Some(detail)
}
