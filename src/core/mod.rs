//! Core price pipeline abstractions

pub mod config;
pub mod convert;
pub mod history;
pub mod log;
pub mod oracle;
pub mod quote;
pub mod source;

// Re-export main types for cleaner imports
pub use history::PriceHistory;
pub use oracle::{OracleStatus, PriceOracle, spawn_refresher};
pub use quote::{PriceQuote, QuoteSource};
pub use source::{FailureKind, PriceSource, SourceError};
