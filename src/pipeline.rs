//! High-level analysis pipeline.
//!
//! Combines all steps behind one call: load (with encoding auto-detection),
//! validate the schema, clean, derive features, and compute every analysis.
//!
//! # Example
//!
//! ```rust,ignore
//! use shopmetrics::pipeline::{analyze_csv, AnalyzeOptions};
//!
//! let result = analyze_csv("transactions.csv", AnalyzeOptions::default())?;
//! println!("{} customers segmented", result.rfm.len());
//! ```

use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::analytics::{
    calculate_clv, calculate_rfm, geographic_distribution, sales_trends, top_products,
    DEFAULT_TOP_N,
};
use crate::error::{PipelineError, PipelineResult};
use crate::models::{
    CountrySales, CustomerRfm, CustomerValue, Granularity, Kpis, ProductSales, RawTransaction,
    Transaction, TrendPoint,
};
use crate::parser::{read_transactions, transactions_from_bytes};
use crate::prep::{clean, derive};
use crate::validation::missing_columns;

/// Options for the analysis pipeline.
#[derive(Debug, Clone, Copy)]
pub struct AnalyzeOptions {
    /// Time bucket size for the revenue trend series.
    pub granularity: Granularity,
    /// Number of products in the top-seller rollup.
    pub top_n: usize,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            granularity: Granularity::Monthly,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// All derived aggregates for one analysis pass.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub kpis: Kpis,
    pub rfm: Vec<CustomerRfm>,
    pub clv: Vec<CustomerValue>,
    pub trends: Vec<TrendPoint>,
    pub top_products: Vec<ProductSales>,
    pub geography: Vec<CountrySales>,
    /// Rows in the source before cleaning.
    pub input_rows: usize,
    /// Rows that survived cleaning.
    pub cleaned_rows: usize,
}

/// Run the full analysis over a CSV file.
pub fn analyze_csv<P: AsRef<Path>>(
    path: P,
    options: AnalyzeOptions,
) -> PipelineResult<AnalysisResult> {
    let loaded = read_transactions(path)?;
    info!(
        rows = loaded.records.len(),
        encoding = %loaded.encoding,
        "loaded transaction CSV"
    );
    analyze_loaded(loaded.records, &loaded.headers, options)
}

/// Run the full analysis over raw CSV bytes.
pub fn analyze_bytes(bytes: &[u8], options: AnalyzeOptions) -> PipelineResult<AnalysisResult> {
    let loaded = transactions_from_bytes(bytes)?;
    analyze_loaded(loaded.records, &loaded.headers, options)
}

/// Run the full analysis over already-loaded raw rows.
pub fn analyze_records(
    records: Vec<RawTransaction>,
    headers: &[String],
    options: AnalyzeOptions,
) -> PipelineResult<AnalysisResult> {
    analyze_loaded(records, headers, options)
}

fn analyze_loaded(
    records: Vec<RawTransaction>,
    headers: &[String],
    options: AnalyzeOptions,
) -> PipelineResult<AnalysisResult> {
    let missing = missing_columns(headers);
    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns(missing));
    }

    let input_rows = records.len();
    let cleaned = clean(records);
    let cleaned_rows = cleaned.len();
    info!(input_rows, cleaned_rows, "cleaned transaction rows");

    let transactions = derive(cleaned)?;

    let result = AnalysisResult {
        kpis: compute_kpis(&transactions),
        rfm: calculate_rfm(&transactions),
        clv: calculate_clv(&transactions),
        trends: sales_trends(&transactions, options.granularity),
        top_products: top_products(&transactions, options.top_n),
        geography: geographic_distribution(&transactions),
        input_rows,
        cleaned_rows,
    };
    info!(
        customers = result.rfm.len(),
        trend_points = result.trends.len(),
        "analysis complete"
    );

    Ok(result)
}

/// Dashboard-level KPIs over the cleaned record set.
pub fn compute_kpis(transactions: &[Transaction]) -> Kpis {
    let total_revenue: f64 = transactions.iter().map(|t| t.total_price).sum();
    let total_customers = transactions
        .iter()
        .map(|t| t.customer_id.as_str())
        .collect::<HashSet<_>>()
        .len() as u64;
    let total_orders = transactions
        .iter()
        .map(|t| t.invoice_no.as_str())
        .collect::<HashSet<_>>()
        .len() as u64;
    let avg_order_value = if total_orders == 0 {
        0.0
    } else {
        total_revenue / total_orders as f64
    };

    Kpis {
        total_revenue,
        total_customers,
        total_orders,
        avg_order_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country";

    fn sample_csv() -> String {
        format!(
            "{HEADER}\n\
             536365,85123A,HEART HOLDER,6,12/1/2010 8:26,2.55,17850,United Kingdom\n\
             536365,85123A,HEART HOLDER,6,12/1/2010 8:26,2.55,17850,United Kingdom\n\
             536366,71053,WHITE METAL LANTERN,3,12/2/2010 9:00,3.39,17851,France\n\
             536367,84406B,CREAM CUPID,8,12/3/2010 10:00,2.75,17852,Germany\n\
             536368,84406B,CREAM CUPID,2,12/4/2010 11:00,2.75,17853,France\n\
             536369,22728,ALARM CLOCK,4,12/4/2010 12:00,1.25,,France"
        )
    }

    #[test]
    fn test_analyze_bytes_end_to_end() {
        let result =
            analyze_bytes(sample_csv().as_bytes(), AnalyzeOptions::default()).unwrap();

        // 6 input rows; one dropped for missing customer, one exact duplicate.
        assert_eq!(result.input_rows, 6);
        assert_eq!(result.cleaned_rows, 4);
        assert_eq!(result.kpis.total_customers, 4);
        assert_eq!(result.kpis.total_orders, 4);
        assert_eq!(result.rfm.len(), 4);
        assert_eq!(result.clv.len(), 4);
        assert_eq!(result.geography.len(), 3);
        // All December 2010: a single monthly bucket.
        assert_eq!(result.trends.len(), 1);
    }

    #[test]
    fn test_missing_column_aborts_with_exact_list() {
        let csv = "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID\n\
                   536365,85123A,ITEM,6,12/1/2010 8:26,2.55,17850";
        let err = analyze_bytes(csv.as_bytes(), AnalyzeOptions::default()).unwrap_err();
        match err {
            PipelineError::MissingColumns(cols) => {
                assert_eq!(cols, vec!["Country".to_string()]);
            }
            other => panic!("expected MissingColumns, got {other}"),
        }
    }

    #[test]
    fn test_kpis() {
        let result =
            analyze_bytes(sample_csv().as_bytes(), AnalyzeOptions::default()).unwrap();
        let expected_revenue = 6.0 * 2.55 + 3.0 * 3.39 + 8.0 * 2.75 + 2.0 * 2.75;
        assert!((result.kpis.total_revenue - expected_revenue).abs() < 1e-9);
        assert!(
            (result.kpis.avg_order_value - expected_revenue / 4.0).abs() < 1e-9
        );
    }

    #[test]
    fn test_compute_kpis_empty() {
        let kpis = compute_kpis(&[]);
        assert_eq!(kpis.total_orders, 0);
        assert_eq!(kpis.avg_order_value, 0.0);
    }

    #[test]
    fn test_options_default() {
        let opts = AnalyzeOptions::default();
        assert_eq!(opts.granularity, Granularity::Monthly);
        assert_eq!(opts.top_n, 10);
    }
}
