//! Batch ETL driver: chunked CSV ingestion into a SQLite sink.
//!
//! Reads a generic sales feed (`date`, `product_id`, `quantity`, `revenue`)
//! in fixed-size chunks. Per chunk: rows without a date are dropped, missing
//! numeric cells are filled with 0, the chunk is appended to the sink, and a
//! per-product revenue total is folded across chunks. After the last chunk
//! the driver reports the top 10 products by accumulated revenue.
//!
//! The revenue accumulator is threaded explicitly through each chunk step
//! and returned, never held as shared mutable state. Chunks are processed
//! strictly sequentially; a failure mid-run leaves previously committed
//! chunks in place.

pub mod sink;

use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::error::{EtlError, EtlResult};
use crate::models::SalesRow;
use self::sink::SqliteSink;

/// Default rows per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 10_000;

/// Default sink table name.
pub const DEFAULT_TABLE: &str = "sales";

/// How many products the final report keeps.
const TOP_PRODUCTS: usize = 10;

/// Configuration for one ETL run.
#[derive(Debug, Clone)]
pub struct EtlConfig {
    /// Source CSV path.
    pub source: PathBuf,
    /// SQLite database path.
    pub database: PathBuf,
    /// Sink table name.
    pub table: String,
    /// Rows per chunk, must be positive.
    pub chunk_size: usize,
}

impl EtlConfig {
    pub fn new(source: impl Into<PathBuf>, database: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            database: database.into(),
            table: DEFAULT_TABLE.to_string(),
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Revenue accumulated for one product across all chunks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRevenue {
    pub product_id: String,
    pub revenue: f64,
}

/// Outcome of a completed ETL run.
#[derive(Debug, Clone, Serialize)]
pub struct EtlReport {
    pub chunks_processed: usize,
    pub rows_written: usize,
    /// Rows dropped for lacking a date.
    pub rows_dropped: usize,
    /// Top products by accumulated revenue, descending.
    pub top_products: Vec<ProductRevenue>,
}

/// Run the ETL pipeline: chunked read, clean, persist, accumulate, report.
///
/// The source file is opened before the sink, so a missing source halts the
/// run without any database mutation.
pub fn run(config: &EtlConfig) -> EtlResult<EtlReport> {
    if config.chunk_size == 0 {
        return Err(EtlError::InvalidChunkSize);
    }

    info!(
        source = %config.source.display(),
        chunk_size = config.chunk_size,
        "starting ETL run"
    );

    let file = std::fs::File::open(&config.source).map_err(|e| {
        error!(path = %config.source.display(), "source file not found");
        EtlError::SourceNotFound {
            path: config.source.display().to_string(),
            source: e,
        }
    })?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let columns = FeedColumns::resolve(&headers)?;

    let mut sink = SqliteSink::open(&config.database, &config.table)?;
    // Truncate the table before the first chunk.
    sink.reset()?;

    let mut totals: HashMap<String, f64> = HashMap::new();
    let mut report = EtlReport {
        chunks_processed: 0,
        rows_written: 0,
        rows_dropped: 0,
        top_products: Vec::new(),
    };

    let mut records = reader.records();
    loop {
        let mut raw_chunk = Vec::with_capacity(config.chunk_size);
        for result in records.by_ref() {
            raw_chunk.push(result?);
            if raw_chunk.len() == config.chunk_size {
                break;
            }
        }
        if raw_chunk.is_empty() {
            break;
        }

        let (rows, dropped) = clean_chunk(&raw_chunk, &columns);
        if dropped > 0 {
            warn!(dropped, chunk = report.chunks_processed + 1, "dropped rows without a date");
        }

        sink.append(&rows)?;
        totals = accumulate_revenue(totals, &rows);

        report.chunks_processed += 1;
        report.rows_written += rows.len();
        report.rows_dropped += dropped;
        info!(
            chunk = report.chunks_processed,
            rows = rows.len(),
            "chunk committed"
        );
    }

    report.top_products = top_by_revenue(&totals, TOP_PRODUCTS);
    info!(
        chunks = report.chunks_processed,
        rows = report.rows_written,
        "ETL run finished"
    );

    Ok(report)
}

/// Column indices of the sales feed.
#[derive(Debug)]
struct FeedColumns {
    date: usize,
    product_id: usize,
    quantity: Option<usize>,
    revenue: Option<usize>,
}

impl FeedColumns {
    /// Resolve header positions. `date` and `product_id` are mandatory;
    /// absent numeric columns behave as all-zero.
    fn resolve(headers: &[String]) -> EtlResult<Self> {
        let find = |name: &str| headers.iter().position(|h| h == name);
        Ok(Self {
            date: find("date").ok_or_else(|| EtlError::MissingColumn("date".into()))?,
            product_id: find("product_id")
                .ok_or_else(|| EtlError::MissingColumn("product_id".into()))?,
            quantity: find("quantity"),
            revenue: find("revenue"),
        })
    }
}

/// Clean one raw chunk: drop rows without a date, fill missing numerics
/// with 0. Returns the cleaned rows and the dropped-row count.
fn clean_chunk(
    chunk: &[csv::StringRecord],
    columns: &FeedColumns,
) -> (Vec<SalesRow>, usize) {
    let mut rows = Vec::with_capacity(chunk.len());
    let mut dropped = 0;

    for record in chunk {
        let date = record.get(columns.date).unwrap_or("").trim();
        if date.is_empty() {
            dropped += 1;
            continue;
        }

        let numeric = |idx: Option<usize>| -> f64 {
            idx.and_then(|i| record.get(i))
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(0.0)
        };

        rows.push(SalesRow {
            date: date.to_string(),
            product_id: record
                .get(columns.product_id)
                .unwrap_or("")
                .trim()
                .to_string(),
            quantity: numeric(columns.quantity),
            revenue: numeric(columns.revenue),
        });
    }

    (rows, dropped)
}

/// Fold a chunk's revenue into the running per-product totals.
///
/// Products absent from earlier chunks start from 0.
fn accumulate_revenue(
    mut totals: HashMap<String, f64>,
    rows: &[SalesRow],
) -> HashMap<String, f64> {
    for row in rows {
        *totals.entry(row.product_id.clone()).or_insert(0.0) += row.revenue;
    }
    totals
}

/// Top `n` products by revenue, descending; ties break on product id so the
/// output is deterministic.
fn top_by_revenue(totals: &HashMap<String, f64>, n: usize) -> Vec<ProductRevenue> {
    let mut products: Vec<ProductRevenue> = totals
        .iter()
        .map(|(product_id, &revenue)| ProductRevenue {
            product_id: product_id.clone(),
            revenue,
        })
        .collect();
    products.sort_by(|a, b| {
        b.revenue
            .total_cmp(&a.revenue)
            .then_with(|| a.product_id.cmp(&b.product_id))
    });
    products.truncate(n);
    products
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[&str]) -> csv::StringRecord {
        csv::StringRecord::from(fields.to_vec())
    }

    fn columns() -> FeedColumns {
        FeedColumns {
            date: 0,
            product_id: 1,
            quantity: Some(2),
            revenue: Some(3),
        }
    }

    #[test]
    fn test_clean_chunk_drops_dateless_rows() {
        let chunk = vec![
            record(&["2024-01-01", "p1", "2", "10.0"]),
            record(&["", "p2", "1", "5.0"]),
            record(&["2024-01-02", "p3", "", ""]),
        ];
        let (rows, dropped) = clean_chunk(&chunk, &columns());
        assert_eq!(dropped, 1);
        assert_eq!(rows.len(), 2);
        // Missing numerics filled with 0.
        assert_eq!(rows[1].quantity, 0.0);
        assert_eq!(rows[1].revenue, 0.0);
    }

    #[test]
    fn test_accumulate_revenue_fill_value() {
        let chunk1 = vec![
            SalesRow { date: "d".into(), product_id: "a".into(), quantity: 1.0, revenue: 10.0 },
            SalesRow { date: "d".into(), product_id: "b".into(), quantity: 1.0, revenue: 5.0 },
        ];
        let chunk2 = vec![
            SalesRow { date: "d".into(), product_id: "a".into(), quantity: 1.0, revenue: 7.0 },
            SalesRow { date: "d".into(), product_id: "c".into(), quantity: 1.0, revenue: 3.0 },
        ];

        let totals = accumulate_revenue(HashMap::new(), &chunk1);
        let totals = accumulate_revenue(totals, &chunk2);

        assert_eq!(totals["a"], 17.0);
        assert_eq!(totals["b"], 5.0);
        assert_eq!(totals["c"], 3.0);
    }

    #[test]
    fn test_top_by_revenue_order_and_truncation() {
        let mut totals = HashMap::new();
        totals.insert("low".to_string(), 1.0);
        totals.insert("high".to_string(), 100.0);
        totals.insert("mid".to_string(), 50.0);

        let top = top_by_revenue(&totals, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].product_id, "high");
        assert_eq!(top[1].product_id, "mid");
    }

    #[test]
    fn test_missing_feed_columns() {
        let headers: Vec<String> = vec!["date".into(), "quantity".into()];
        let err = FeedColumns::resolve(&headers).unwrap_err();
        assert!(err.to_string().contains("product_id"));
    }

    #[test]
    fn test_source_not_found_before_sink_mutation() {
        let dir = std::env::temp_dir();
        let db = dir.join("shopmetrics_missing_source_test.db");
        let _ = std::fs::remove_file(&db);

        let config = EtlConfig::new(dir.join("does_not_exist.csv"), &db);
        let err = run(&config).unwrap_err();
        assert!(matches!(err, EtlError::SourceNotFound { .. }));
        // No sink mutation: the database file was never created.
        assert!(!db.exists());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let mut config = EtlConfig::new("in.csv", "out.db");
        config.chunk_size = 0;
        assert!(matches!(run(&config), Err(EtlError::InvalidChunkSize)));
    }
}
