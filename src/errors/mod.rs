//! Centralized error handling for LedgerGlow
//!
//! # Error Categories
//!
//! - **Upstream Errors**: token API / logo host unreachable, timed out or malformed
//! - **Store Errors**: local logo document I/O and serialization
//! - **Configuration Errors**: invalid settings detected at startup

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for upstream fetch Results
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Convenience type alias for logo store Results
pub type StoreResult<T> = Result<T, StoreError>;
