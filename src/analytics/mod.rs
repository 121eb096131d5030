//! Customer-intelligence analytics.
//!
//! This module derives per-customer and per-period metrics from cleaned
//! transactions:
//! - RFM: Recency/Frequency/Monetary scoring and segmentation
//! - CLV: Customer lifetime value estimation
//! - Trends: time-bucketed revenue, top products, geographic rollups

pub mod clv;
pub mod rfm;
pub mod trends;

pub use clv::calculate_clv;
pub use rfm::calculate_rfm;
pub use trends::{
    bucket_start, geographic_distribution, sales_trends, top_products, DEFAULT_TOP_N,
};
