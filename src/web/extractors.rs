//! Request parameter extraction
//!
//! Query parameters are parsed leniently: a value that is missing or not a
//! usable number falls back to its default instead of rejecting the request.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::config::defaults::DEFAULT_PAGE_LIMIT;

/// `start` / `limit` window of a token page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowParams {
    pub start: u32,
    pub limit: u32,
}

impl Default for WindowParams {
    fn default() -> Self {
        Self {
            start: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl WindowParams {
    /// Build from a raw query string such as `start=100&limit=50`
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "start" => {
                    params.start = parse_leading_int(&value)
                        .and_then(|n| u32::try_from(n).ok())
                        .unwrap_or(0);
                }
                "limit" => {
                    params.limit = parse_leading_int(&value)
                        .and_then(|n| u32::try_from(n).ok())
                        .filter(|n| *n > 0)
                        .unwrap_or(DEFAULT_PAGE_LIMIT);
                }
                _ => {}
            }
        }

        params
    }
}

impl<S> FromRequestParts<S> for WindowParams
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_query(parts.uri.query().unwrap_or_default()))
    }
}

/// Integer at the start of `value` (`"12abc"` → 12), ignoring leading whitespace
fn parse_leading_int(value: &str) -> Option<i64> {
    let trimmed = value.trim_start();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_absent() {
        assert_eq!(WindowParams::from_query(""), WindowParams { start: 0, limit: 100 });
    }

    #[test]
    fn test_explicit_window() {
        assert_eq!(
            WindowParams::from_query("start=200&limit=50"),
            WindowParams { start: 200, limit: 50 }
        );
    }

    #[test]
    fn test_garbage_falls_back() {
        assert_eq!(
            WindowParams::from_query("start=abc&limit=xyz"),
            WindowParams { start: 0, limit: 100 }
        );
        assert_eq!(
            WindowParams::from_query("start=-5&limit=0"),
            WindowParams { start: 0, limit: 100 }
        );
        assert_eq!(
            WindowParams::from_query("start=99999999999999999999999"),
            WindowParams { start: 0, limit: 100 }
        );
    }

    #[test]
    fn test_leading_digits_are_used() {
        assert_eq!(
            WindowParams::from_query("start=%2012abc&limit=25.9"),
            WindowParams { start: 12, limit: 25 }
        );
    }
}
