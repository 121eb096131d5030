//! CSV loading with encoding auto-detection.
//!
//! Retail transaction exports are frequently latin-1 encoded (product
//! descriptions with accented characters), so loading goes through
//! byte-level encoding detection before CSV parsing. Quoted fields are
//! handled by the `csv` crate; descriptions routinely contain commas.
//!
//! No analytics logic here: the output is [`RawTransaction`] rows plus the
//! header list, which the caller validates before any further processing.

use csv::ReaderBuilder;
use std::path::Path;

use crate::error::{LoadError, LoadResult};
use crate::models::RawTransaction;

/// Result of loading a transaction CSV, with metadata.
#[derive(Debug, Clone)]
pub struct LoadedTransactions {
    /// Raw rows in file order.
    pub records: Vec<RawTransaction>,
    /// Detected or assumed encoding.
    pub encoding: String,
    /// Column headers as they appeared in the file.
    pub headers: Vec<String>,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let (charset, _, _) = chardet::detect(bytes);

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the specified encoding.
///
/// Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8_lossy(bytes).to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        _ => String::from_utf8_lossy(bytes).to_string(),
    }
}

/// Load a transaction CSV file with encoding auto-detection.
pub fn read_transactions<P: AsRef<Path>>(path: P) -> LoadResult<LoadedTransactions> {
    let bytes = std::fs::read(path.as_ref())?;
    transactions_from_bytes(&bytes)
}

/// Load transaction rows from raw CSV bytes with encoding auto-detection.
pub fn transactions_from_bytes(bytes: &[u8]) -> LoadResult<LoadedTransactions> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    transactions_from_str(&content, encoding)
}

/// Parse decoded CSV content into raw transaction rows.
pub fn transactions_from_str(
    content: &str,
    encoding: String,
) -> LoadResult<LoadedTransactions> {
    if content.trim().is_empty() {
        return Err(LoadError::EmptyFile);
    }

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let col = |name: &str| headers.iter().position(|h| h == name);
    let idx_invoice = col("InvoiceNo");
    let idx_stock = col("StockCode");
    let idx_desc = col("Description");
    let idx_qty = col("Quantity");
    let idx_date = col("InvoiceDate");
    let idx_price = col("UnitPrice");
    let idx_customer = col("CustomerID");
    let idx_country = col("Country");

    let field = |record: &csv::StringRecord, idx: Option<usize>| -> String {
        idx.and_then(|i| record.get(i))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result?;

        let customer = field(&record, idx_customer);
        records.push(RawTransaction {
            invoice_no: field(&record, idx_invoice),
            stock_code: field(&record, idx_stock),
            description: field(&record, idx_desc),
            quantity: field(&record, idx_qty),
            invoice_date: field(&record, idx_date),
            unit_price: field(&record, idx_price),
            customer_id: if customer.is_empty() { None } else { Some(customer) },
            country: field(&record, idx_country),
        });
    }

    Ok(LoadedTransactions {
        records,
        encoding,
        headers,
    })
}
