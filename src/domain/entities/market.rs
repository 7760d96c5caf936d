use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Market {
    Crypto,
    Equity,
}

impl Market {
    pub fn as_str(&self) -> &'static str {
        match self {
            Market::Crypto => "CRYPTO",
            Market::Equity => "EQUITY",
        }
    }
}

/// Last known price of a symbol, keyed by symbol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub symbol: String,
    pub market: Market,
    pub price: f64,
    pub as_of: DateTime<Utc>,
    pub source: String,
}
