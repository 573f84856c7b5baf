use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PriceDirection {
    Increase,
    Decrease,
}

impl PriceDirection {
    pub fn between(old: i64, new: i64) -> Self {
        if new > old {
            PriceDirection::Increase
        } else {
            PriceDirection::Decrease
        }
    }

    fn label(&self) -> &'static str {
        match self {
            PriceDirection::Increase => "increase",
            PriceDirection::Decrease => "decrease",
        }
    }

    fn sign(&self) -> char {
        match self {
            PriceDirection::Increase => '+',
            PriceDirection::Decrease => '-',
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChangeKind {
    PriceChange { direction: PriceDirection, delta: i64 },
    AuctionEnded,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::PriceChange { .. } => "price_change",
            ChangeKind::AuctionEnded => "auction_ended",
        }
    }
}

/// A detected change, handed to the event sink and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub title: String,
    pub message: String,
    pub link: String,
}

impl ChangeEvent {
    pub fn price_change(row_id: i64, title: &str, old: i64, new: i64) -> Self {
        let direction = PriceDirection::between(old, new);
        let delta = (new - old).abs();
        Self {
            kind: ChangeKind::PriceChange { direction, delta },
            title: format!("Price {}: {}", direction.label(), short_title(title)),
            message: format!(
                "{}\n{}円 → {}円 ({}{}円)",
                title,
                format_yen(old),
                format_yen(new),
                direction.sign(),
                format_yen(delta)
            ),
            link: monitor_link(row_id),
        }
    }

    pub fn auction_ended(row_id: i64, title: &str, final_price: Option<i64>) -> Self {
        let message = match final_price {
            Some(price) => format!("{}\nFinal price: {}円", title, format_yen(price)),
            None => format!("{}\nEnded", title),
        };
        Self {
            kind: ChangeKind::AuctionEnded,
            title: format!("Auction ended: {}", short_title(title)),
            message,
            link: monitor_link(row_id),
        }
    }
}

/// A stored event as read back from the sink table.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Notification {
    pub id: i64,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub link_url: Option<String>,
    pub is_read: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

fn monitor_link(row_id: i64) -> String {
    format!("/monitor/{}", row_id)
}

fn short_title(title: &str) -> String {
    title.chars().take(30).collect()
}

/// 1234567 -> "1,234,567"
pub fn format_yen(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
