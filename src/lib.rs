pub mod api;
pub mod chain;
pub mod config;
pub mod deduplication;
pub mod error;
pub mod market;
pub mod notifier;
pub mod safety;
pub mod scanner;
pub mod scorer;
pub mod service;
pub mod signal;
pub mod types;
pub mod watchlist;
pub mod workers;

// Re-export for tests
pub use scanner::ScanPipeline;
pub use service::Radar;
