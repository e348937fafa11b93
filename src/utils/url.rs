// src/utils/url.rs

//! URL construction utilities.

use url::Url;

use crate::error::Result;

/// Base of the DexScreener pair page for Solana tokens.
pub const DEXSCREENER_SOLANA: &str = "https://dexscreener.com/solana/";

/// Build the DexScreener page link for a token address.
///
/// # Examples
/// ```
/// use notifier::utils::url::dexscreener_link;
///
/// assert_eq!(
///     dexscreener_link("So11111111111111111111111111111111111111112"),
///     "https://dexscreener.com/solana/So11111111111111111111111111111111111111112"
/// );
/// ```
pub fn dexscreener_link(address: &str) -> String {
    format!("{DEXSCREENER_SOLANA}{}", address.trim())
}

/// Build the Bot API method endpoint, e.g. `https://api.telegram.org/bot<token>/sendMessage`.
///
/// Bot tokens contain a colon, so the path is assembled as text rather than
/// joined as a relative reference (which would parse `bot123:` as a scheme).
pub fn telegram_method(api_base: &str, bot_token: &str, method: &str) -> Result<Url> {
    let base = api_base.trim_end_matches('/');
    Ok(Url::parse(&format!("{base}/bot{bot_token}/{method}"))?)
}

/// Path and query of a URL, for log context without the host.
pub fn short_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => match parsed.query() {
            Some(q) => format!("{}?{}", parsed.path(), q),
            None => parsed.path().to_string(),
        },
        Err(_) => url.to_string(),
    }
}
