//! Pure page extractors: loaded HTML in, typed records out.
//!
//! `scraper::Html` is not `Send`, so documents are parsed and dropped inside
//! synchronous calls and never held across an await.

pub mod amazon;
pub mod bot_check;
pub mod text;
pub mod yahoo_detail;
pub mod yahoo_history;
pub mod yahoo_search;

pub use amazon::{parse_offers_page, parse_product_page};
pub use bot_check::{is_bot_challenge, AMAZON_CHALLENGE_MARKERS, YAHOO_CHALLENGE_MARKERS};
pub use yahoo_detail::parse_auction_detail;
pub use yahoo_history::{closed_search_url, parse_closed_results, DEFAULT_HISTORY_COUNT};
pub use yahoo_search::{parse_search_results, search_url};
