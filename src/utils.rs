//! Utility functions for LedgerGlow

pub mod fingerprint;

pub use fingerprint::fingerprint;
