//! Metric derivation and industry aggregation

pub mod aggregation;
pub mod classifier;
pub mod metrics;

pub use aggregation::summarize_industry;
pub use classifier::classify;
pub use metrics::calculate_metrics;
