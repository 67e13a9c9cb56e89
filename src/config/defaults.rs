/// Configuration default values
///
/// All defaults live here so they can be changed in one place.
// Web server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_STATIC_DIR: &str = "./public";

// Upstream defaults
pub const DEFAULT_API_BASE_URL: &str = "https://api.xrpl.to";
pub const DEFAULT_LOGO_BASE_URL: &str = "https://s1.xrpl.to";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_LOGO_TIMEOUT_MS: u64 = 2_000;
pub const DEFAULT_RICH_LIST_LIMIT: u32 = 3;

// Storage defaults
pub const DEFAULT_LOGO_STORE_PATH: &str = "./public/logos.json";

// Aggregator defaults
pub const DEFAULT_LOGO_CONCURRENCY: usize = 8;
pub const DEFAULT_PAGE_LIMIT: u32 = 100;
