//! Typed consumer of the gateway API

pub mod feed;

pub use feed::{near_bottom, TokenFeed, SCROLL_THRESHOLD_PX};
