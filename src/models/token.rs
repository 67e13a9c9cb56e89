//! Token shapes served to the browser client

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One card of the token grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSummary {
    pub name: String,
    pub volume: f64,
    pub market_cap: f64,
    pub holders: u64,
    pub issuer: String,
    /// Digest of issuer and currency; the client expands cards with it
    #[serde(rename = "md5")]
    pub fingerprint: String,
    /// Self-contained data URI, or empty when no logo could be resolved
    pub logo: String,
}

/// On-demand detail of an expanded card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDetail {
    pub description: String,
    pub total_supply: f64,
    pub circulating_supply: f64,
    pub price: f64,
}

impl TokenDetail {
    pub const NO_DESCRIPTION: &'static str = "N/A";

    /// Zero-value detail returned when the upstream lookup fails
    pub fn unavailable() -> Self {
        Self {
            description: Self::NO_DESCRIPTION.to_string(),
            total_supply: 0.0,
            circulating_supply: 0.0,
            price: 0.0,
        }
    }
}

/// Top holders of a token, passed through as received
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichList {
    pub top_holders: Vec<Value>,
}

impl RichList {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Open offers of an account, passed through as received
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBook {
    pub order_book: Vec<Value>,
}

impl OrderBook {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// The two synthetic tokens served when the catalog cannot be reached
pub fn fallback_tokens() -> Vec<TokenSummary> {
    vec![
        TokenSummary {
            name: "RLUSD".to_string(),
            volume: 1_000_000.0,
            market_cap: 50_000_000.0,
            holders: 5_000,
            issuer: "rhub8VRN55s94qWKDv6jmDy1pUykJzF3wq".to_string(),
            fingerprint: "0413ca7cfc258dfaf698c02fe304e607".to_string(),
            logo: String::new(),
        },
        TokenSummary {
            name: "SGB".to_string(),
            volume: 500_000.0,
            market_cap: 20_000_000.0,
            holders: 3_000,
            issuer: "rHgbFyS72N3r6hGE1r4gdkRZoSwZ49MZuf".to_string(),
            fingerprint: "mock2".to_string(),
            logo: String::new(),
        },
    ]
}
