//! Shapes returned by the token-data API
//!
//! The API is loose about types: numbers arrive as JSON numbers or numeric
//! strings and any field may be missing. Everything here reads a
//! `serde_json::Value` and falls back to zero / empty instead of failing.

use serde_json::Value;

use super::token::{TokenDetail, TokenSummary};
use crate::errors::{UpstreamError, UpstreamResult};
use crate::utils::fingerprint::fingerprint;

/// Name used for tokens whose currency code is missing
pub const UNKNOWN_TOKEN_NAME: &str = "Unknown";

/// A catalog entry as listed by the API
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawToken {
    pub md5: Option<String>,
    pub currency: Option<String>,
    pub issuer: Option<String>,
    pub vol24hxrp: f64,
    pub marketcap: f64,
    pub trustlines: u64,
}

impl RawToken {
    pub fn from_value(value: &Value) -> Self {
        Self {
            md5: string_field(value, "md5"),
            currency: string_field(value, "currency"),
            issuer: string_field(value, "issuer"),
            vol24hxrp: number_field(value, "vol24hxrp"),
            marketcap: number_field(value, "marketcap"),
            trustlines: integer_field(value, "trustlines"),
        }
    }

    /// Fingerprint reported by the API, or computed from issuer and currency
    pub fn fingerprint(&self) -> String {
        match &self.md5 {
            Some(md5) => md5.clone(),
            None => fingerprint(
                self.issuer.as_deref().unwrap_or_default(),
                self.currency.as_deref().unwrap_or_default(),
            ),
        }
    }

    pub fn into_summary(self, fingerprint: String, logo: String) -> TokenSummary {
        TokenSummary {
            name: self
                .currency
                .unwrap_or_else(|| UNKNOWN_TOKEN_NAME.to_string()),
            volume: self.vol24hxrp,
            market_cap: self.marketcap,
            holders: self.trustlines,
            issuer: self.issuer.unwrap_or_default(),
            fingerprint,
            logo,
        }
    }
}

/// Extract the token list from a catalog response.
///
/// The list is either under `tokens` or the body itself; anything that is
/// not an array is malformed.
pub fn parse_token_list(body: &Value) -> UpstreamResult<Vec<RawToken>> {
    let list = match body.get("tokens") {
        Some(tokens) if is_truthy(tokens) => tokens,
        _ => body,
    };

    match list.as_array() {
        Some(items) => Ok(items.iter().map(RawToken::from_value).collect()),
        None => Err(UpstreamError::malformed(
            "tokens",
            format!("expected an array, got {}", json_type_name(list)),
        )),
    }
}

/// Map a `token?desc=yes` response onto the detail record
pub fn parse_token_detail(body: &Value) -> TokenDetail {
    let token = body.get("token").unwrap_or(&Value::Null);
    TokenDetail {
        description: string_field(token, "description")
            .unwrap_or_else(|| TokenDetail::NO_DESCRIPTION.to_string()),
        total_supply: number_field(token, "amount"),
        circulating_supply: number_field(token, "supply"),
        price: number_field(token, "usd"),
    }
}

/// Array under `key`, or empty when missing or not an array
pub fn parse_entry_list(body: &Value, key: &str) -> Vec<Value> {
    body.get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

/// Total number of tokens the catalog reports, when it does
pub fn catalog_total(body: &Value) -> Option<u64> {
    body.get("total").map(|total| lenient_number(total) as u64)
}

/// Non-empty string field
fn string_field(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn number_field(value: &Value, key: &str) -> f64 {
    value.get(key).map(lenient_number).unwrap_or(0.0)
}

fn integer_field(value: &Value, key: &str) -> u64 {
    number_field(value, key).trunc() as u64
}

/// Numbers and numeric strings; anything else, negative or non-finite is 0
pub fn lenient_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(n) if n.is_finite() && n > 0.0 => n,
        _ => 0.0,
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
