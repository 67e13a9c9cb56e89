//! Service layer
//!
//! Services sit between the web handlers and the outside world:
//!
//! - [`logo_store`]: durable fingerprint → data URI document
//! - [`response_cache`]: in-memory cache of responses already served
//! - [`single_flight`]: per-key guard so identical requests share one fetch
//! - [`upstream`]: token-data API and logo host clients
//! - [`logo_resolver`]: cache → store → network logo lookup
//! - [`aggregator`]: the operations the web layer calls, with fallbacks
//!
//! Services are constructed once at startup and passed to the web layer;
//! nothing here is a global.

pub mod aggregator;
pub mod logo_resolver;
pub mod logo_store;
pub mod response_cache;
pub mod single_flight;
pub mod upstream;

pub use aggregator::TokenAggregator;
pub use logo_resolver::LogoResolver;
pub use logo_store::LogoStore;
pub use response_cache::{CacheKey, CacheStats, CachedPayload, ResponseCache};
pub use single_flight::SingleFlight;
pub use upstream::{HttpTokenDataSource, TokenDataSource};
