//! Schema validation for transaction CSV input.
//!
//! Analysis requires eight named columns. Validation reports the exact
//! missing subset as a list in required-column order; it never errors and
//! never partial-matches header names. The pipeline boundary is responsible
//! for turning a non-empty list into an abort.

/// Columns every transaction CSV must carry.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "InvoiceNo",
    "StockCode",
    "Description",
    "Quantity",
    "InvoiceDate",
    "UnitPrice",
    "CustomerID",
    "Country",
];

/// Return the required columns absent from `headers`, in required order.
///
/// An empty result means the schema is complete. Matching is exact
/// (case-sensitive, no trimming beyond what the loader already did).
pub fn missing_columns(headers: &[String]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h == *required))
        .map(|s| s.to_string())
        .collect()
}

/// Convenience check: true when every required column is present.
pub fn schema_is_complete(headers: &[String]) -> bool {
    missing_columns(headers).is_empty()
}
