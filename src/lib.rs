//! # shopmetrics - Customer intelligence for e-commerce transaction data
//!
//! shopmetrics ingests transaction CSV exports and derives customer
//! intelligence metrics: RFM segmentation, customer lifetime value, sales
//! trends, top products, geographic revenue, plus a chunked ETL path into a
//! SQLite store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌───────────┐   ┌─────────┐   ┌──────────┐   ┌──────────────┐
//! │   CSV File  │──▶│  Parser   │──▶│ Validate│──▶│ Clean +  │──▶│ RFM / CLV /  │
//! │ (auto-enc)  │   │ (latin-1) │   │ (schema)│   │  Derive  │   │ Trends / Geo │
//! └─────────────┘   └───────────┘   └─────────┘   └──────────┘   └──────────────┘
//!
//! ┌─────────────┐   ┌───────────────┐   ┌──────────────┐
//! │ Sales feed  │──▶│  ETL driver   │──▶│ SQLite sink  │  + top-10 revenue
//! │   (CSV)     │   │ (chunked)     │   │ (append-only)│    accumulator
//! └─────────────┘   └───────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use shopmetrics::{analyze_csv, AnalyzeOptions};
//!
//! let result = analyze_csv("transactions.csv", AnalyzeOptions::default())?;
//! for customer in &result.rfm {
//!     println!("{}: {}", customer.customer_id, customer.segment);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Domain models (Transaction, CustomerRfm, CustomerValue, ...)
//! - [`parser`] - CSV loading with encoding auto-detection
//! - [`validation`] - Required-column schema check
//! - [`prep`] - Record cleaning and feature derivation
//! - [`analytics`] - RFM, CLV, trend/top-N/geographic aggregation
//! - [`pipeline`] - One-call analysis API
//! - [`etl`] - Chunked ETL into SQLite

// Core modules
pub mod error;
pub mod models;

// Loading
pub mod parser;

// Validation and preparation
pub mod prep;
pub mod validation;

// Analytics
pub mod analytics;
pub mod pipeline;

// ETL
pub mod etl;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{EtlError, EtlResult, LoadError, LoadResult, PipelineError, PipelineResult};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CountrySales, CustomerRfm, CustomerValue, Granularity, Kpis, ProductSales, RawTransaction,
    SalesRow, Segment, Transaction, TrendPoint,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_encoding, read_transactions, transactions_from_bytes,
    transactions_from_str, LoadedTransactions,
};

// =============================================================================
// Re-exports - Validation / Preparation
// =============================================================================

pub use prep::{clean, derive, parse_invoice_date};
pub use validation::{missing_columns, schema_is_complete, REQUIRED_COLUMNS};

// =============================================================================
// Re-exports - Analytics
// =============================================================================

pub use analytics::{
    calculate_clv, calculate_rfm, geographic_distribution, sales_trends, top_products,
    DEFAULT_TOP_N,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use pipeline::{analyze_bytes, analyze_csv, analyze_records, compute_kpis, AnalysisResult, AnalyzeOptions};

// =============================================================================
// Re-exports - ETL
// =============================================================================

pub use etl::{
    run as run_etl, sink::SqliteSink, EtlConfig, EtlReport, ProductRevenue, DEFAULT_CHUNK_SIZE,
    DEFAULT_TABLE,
};
