//! Token data structures returned by the ranking feed.

use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::html::escape;
use crate::utils::url::dexscreener_link;

/// A single entry in the ranking feed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenRecord {
    /// Token mint address
    pub address: String,

    /// Ticker symbol
    #[serde(default)]
    pub symbol: String,

    /// Market capitalization in USD, when the feed reports one
    #[serde(default, deserialize_with = "lenient_f64")]
    pub usd_market_cap: Option<f64>,
}

impl TokenRecord {
    /// Key used to look up and record notification recency.
    pub fn dedup_key(&self) -> &str {
        &self.address
    }

    /// Short human label for log lines.
    pub fn label(&self) -> String {
        format!("{} ({})", self.symbol, self.address)
    }

    /// Telegram HTML message announcing this token.
    pub fn format_message(&self) -> String {
        let link = dexscreener_link(&self.address);
        let market_cap = self
            .usd_market_cap
            .map(format_usd)
            .unwrap_or_else(|| "N/A".to_string());

        format!(
            "🔥 <b>The Next 100x</b>\n\n\
             💎 <b>Coin:</b> {}\n\
             💰 <b>Market Cap:</b> {}\n\
             🔗 <b>Contract Address:</b> <a href=\"{}\">{}</a>\n",
            escape(&self.symbol),
            market_cap,
            escape(&link),
            escape(&self.address),
        )
    }
}

/// Envelope of the ranking endpoint: `{"code":0,"msg":"success","data":{"rank":[...]}}`.
#[derive(Debug, Deserialize)]
pub struct RankResponse {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<RankData>,
}

#[derive(Debug, Deserialize)]
pub struct RankData {
    pub rank: Vec<TokenRecord>,
}

/// Format a USD amount with thousands separators, e.g. `$1,234,567.89`.
pub fn format_usd(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac_part}")
}

/// Accept a number, a numeric string or null.
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Num(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}
