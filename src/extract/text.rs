//! Field-level probes shared by every page extractor.
//!
//! Each probe returns `Option<T>` and never panics on unexpected markup, so an
//! extractor is a sequence of independent lookups rather than one traversal
//! that fails as a whole.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, TimeZone, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Selector};

const JST_OFFSET_SECS: i32 = 9 * 3600;

lazy_static! {
    static ref YEN_AMOUNT: Regex = Regex::new(r"(\d[\d,]*)\s*円").unwrap();
    static ref DIGIT_RUN: Regex = Regex::new(r"\d[\d,]*").unwrap();
    static ref DECIMAL: Regex = Regex::new(r"\d+(?:\.\d+)?").unwrap();
    static ref JP_DATETIME: Regex =
        Regex::new(r"(\d{4})年(\d{1,2})月(\d{1,2})日.*?(\d{1,2})時(\d{1,2})分").unwrap();
    static ref CLOSED_DATE: Regex = Regex::new(r"^(\d{2})/(\d{2})\s+(\d{2}):(\d{2})").unwrap();
}

/// Japan Standard Time; the marketplaces print local times without an offset.
pub fn jst() -> Option<FixedOffset> {
    FixedOffset::east_opt(JST_OFFSET_SECS)
}

pub fn today_jst(now: DateTime<Utc>) -> Option<NaiveDate> {
    Some(now.with_timezone(&jst()?).date_naive())
}

fn digits_to_int(raw: &str) -> Option<i64> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// The amount in front of the first `円` marker, e.g. `"落札 12,000円"` -> 12000.
pub fn parse_yen(text: &str) -> Option<i64> {
    let captures = YEN_AMOUNT.captures(text)?;
    digits_to_int(captures.get(1)?.as_str())
}

/// Price text with or without a currency marker.
///
/// `"1,000円（税0円）"` -> 1000, `"￥1,980"` -> 1980, `"5000"` -> 5000.
pub fn parse_price(text: &str) -> Option<i64> {
    parse_yen(text).or_else(|| digits_to_int(DIGIT_RUN.find(text)?.as_str()))
}

/// Counters such as `"入札 12件"`: every digit in the text, concatenated.
pub fn parse_count(text: &str) -> Option<i64> {
    digits_to_int(text)
}

/// Absolute timestamps like `"2026年2月19日（木）16時16分"`, read as JST.
pub fn parse_jp_datetime(text: &str) -> Option<DateTime<Utc>> {
    let caps = JP_DATETIME.captures(text)?;
    let field = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();

    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    let naive = NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?
        .and_hms_opt(field(4)?, field(5)?, 0)?;
    let local = jst()?.from_local_datetime(&naive).single()?;
    Some(local.with_timezone(&Utc))
}

/// Year-less closing times like `"02/21 16:03"`.
///
/// The year is `today`'s, unless the month lies after `today`'s month, in
/// which case the listing closed last year.
pub fn parse_closed_date(text: &str, today: NaiveDate) -> Option<DateTime<Utc>> {
    let caps = CLOSED_DATE.captures(text.trim())?;
    let field = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();

    let month = field(1)?;
    let year = if month <= today.month() {
        today.year()
    } else {
        today.year() - 1
    };
    let naive = NaiveDate::from_ymd_opt(year, month, field(2)?)?.and_hms_opt(field(3)?, field(4)?, 0)?;
    let local = jst()?.from_local_datetime(&naive).single()?;
    Some(local.with_timezone(&Utc))
}

/// Star ratings: `"5つ星のうち4.3"` -> 4.3, `"4.5 out of 5 stars"` -> 4.5.
pub fn parse_rating(text: &str) -> Option<f64> {
    let mut numbers = DECIMAL.find_iter(text).map(|m| m.as_str());
    let picked = if text.contains("のうち") {
        numbers.last()
    } else {
        numbers.next()
    };
    picked?.parse().ok()
}

pub fn find<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    let selector = Selector::parse(css).ok()?;
    scope.select(&selector).next()
}

pub fn find_all<'a>(scope: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => scope.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

/// Text nodes trimmed and joined by newlines, approximating rendered block text.
pub fn inner_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// All text on one line with whitespace runs collapsed.
pub fn flat_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

pub fn attr(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
