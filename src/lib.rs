//! tickerprep enriches per-company daily price histories with the derived
//! columns downstream charting expects: trailing moving averages, lag-1
//! baselines, and absolute/percentage day-over-day changes. Each company's
//! table is loaded, enriched, and written independently of the others.

pub mod dataset;
pub mod features;
pub mod logging;
pub mod pipeline;

pub use dataset::{DatasetError, PriceHistory};
pub use features::{
    FeatureError, enrich, with_difference, with_lag, with_moving_average, with_pct_change,
};
pub use pipeline::{EntitySpec, enrich_file, enrich_universe};

pub type Result<T> = anyhow::Result<T>;
