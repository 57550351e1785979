//! User input like `apple`, `eur/usd` or `btc` resolved to storage keys and
//! provider tickers.

const ALIASES: &[(&str, &str)] = &[
    ("eurusd", "EUR/USD"),
    ("gbpusd", "GBP/USD"),
    ("usdjpy", "USD/JPY"),
    ("audusd", "AUD/USD"),
    ("btc", "BTC/USD"),
    ("eth", "ETH/USD"),
    ("apple", "AAPL"),
    ("google", "GOOGL"),
    ("tesla", "TSLA"),
    ("amazon", "AMZN"),
];

fn clean(input: &str) -> String {
    input.trim().to_lowercase().replace('/', "")
}

fn alias(clean: &str) -> Option<&'static str> {
    ALIASES.iter().find(|(k, _)| *k == clean).map(|(_, v)| *v)
}

/// Cache and watchlist key: aliases resolved, no slash, uppercase.
pub fn canonical_symbol(input: &str) -> String {
    let clean = clean(input);
    match alias(&clean) {
        Some(mapped) => mapped.replace('/', ""),
        None => clean.to_uppercase(),
    }
}

/// Ticker sent to providers. Six-letter codes are treated as currency pairs.
pub fn provider_symbol(input: &str) -> String {
    let clean = clean(input);
    if let Some(mapped) = alias(&clean) {
        return mapped.to_string();
    }
    if clean.len() == 6 && clean.chars().all(|c| c.is_ascii_alphabetic()) {
        return format!("{}/{}", &clean[..3], &clean[3..]).to_uppercase();
    }
    if clean.len() > 3 && clean.contains("usd") {
        return format!("{}/USD", clean.replace("usd", "")).to_uppercase();
    }
    clean.to_uppercase()
}
