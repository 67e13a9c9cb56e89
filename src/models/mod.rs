pub mod logo;
pub mod token;
pub mod upstream;

pub use logo::LogoImage;
pub use token::{fallback_tokens, OrderBook, RichList, TokenDetail, TokenSummary};
pub use upstream::RawToken;
