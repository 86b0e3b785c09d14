//! Core business logic abstractions

pub mod calculator;
pub mod config;
pub mod conversion;
pub mod currency;
pub mod kv;
pub mod log;
pub mod rates;
pub mod resolver;
pub mod storage;
pub mod watchlist;

// Re-export main types for cleaner imports
pub use calculator::{Calculator, CalculatorState, Key, Operator};
pub use conversion::{convert, convert_all, format_amount};
pub use kv::KeyValueStore;
pub use rates::{ExchangeRateTable, RateEnrichment, RateSource};
pub use resolver::{RateProvider, Resolved, Tier};
