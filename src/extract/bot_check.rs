use scraper::Html;

use super::text::find;

pub const AMAZON_CHALLENGE_MARKERS: &[&str] =
    &["#captchacharacters", "form[action*='validateCaptcha']"];

pub const YAHOO_CHALLENGE_MARKERS: &[&str] =
    &["iframe[src*='recaptcha']", "form[action*='captcha']", "#captcha"];

/// True when any marker selector matches, i.e. the page is a verification
/// wall rather than the content that was asked for.
pub fn is_bot_challenge(document: &Html, markers: &[&str]) -> bool {
    let root = document.root_element();
    markers.iter().any(|marker| find(root, marker).is_some())
}
