use crate::models::HistoryResult;

/// Share of the buy-now price assumed when no closed auctions are known.
const BUY_NOW_RATIO: f64 = 0.7;

/// Median of past winning prices; with no history, 70% of a non-zero
/// buy-now price; otherwise nothing.
///
/// An even count takes the floor of the mean of the two middle values.
pub fn estimate_winning_price(prices: &[i64], buy_now_price: Option<i64>) -> Option<i64> {
    if prices.is_empty() {
        return buy_now_price
            .filter(|price| *price != 0)
            .map(|price| (price as f64 * BUY_NOW_RATIO).round() as i64);
    }

    let mut sorted = prices.to_vec();
    sorted.sort_unstable();
    let mid = sorted.len() / 2;

    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]).div_euclid(2))
    }
}

pub fn estimate_from_history(history: &[HistoryResult], buy_now_price: Option<i64>) -> Option<i64> {
    let prices: Vec<i64> = history.iter().map(|h| h.winning_price).collect();
    estimate_winning_price(&prices, buy_now_price)
}
