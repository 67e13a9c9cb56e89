//! Token fingerprints
//!
//! A fingerprint is the hex MD5 of `issuer + "_" + currency`. The logo host,
//! the rich-list endpoint and the logo store are all keyed by it, so equal
//! pairs must always produce the same value.

use tracing::trace;

/// Compute the fingerprint of an issuer/currency pair
pub fn fingerprint(issuer: &str, currency: &str) -> String {
    let digest = format!("{:x}", md5::compute(format!("{issuer}_{currency}").as_bytes()));
    trace!("Fingerprint for {}_{}: {}", issuer, currency, digest);
    digest
}
