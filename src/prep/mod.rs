//! Record cleaning and feature derivation.
//!
//! Two stages sit between loading and analysis:
//!
//! - [`clean`] drops rows without a customer identity and removes exact
//!   duplicate rows, keeping the first occurrence.
//! - [`derive`] parses dates and numerics and computes the line total
//!   (`quantity * unit_price`), producing typed [`Transaction`] records.
//!
//! Cleaning operates on raw string rows so duplicate detection compares the
//! file's actual content. Malformed values surface as load errors with row
//! context; they are never silently skipped.

use chrono::NaiveDateTime;
use std::collections::HashSet;

use crate::error::{LoadError, LoadResult};
use crate::models::{RawTransaction, Transaction};

/// Date formats accepted for `InvoiceDate`, tried in order.
///
/// The reference dataset uses `12/1/2010 8:26`; ISO-style exports are
/// accepted as well.
const DATE_FORMATS: [&str; 4] = [
    "%m/%d/%Y %H:%M",
    "%m/%d/%y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Drop rows lacking a customer identity, then drop exact duplicates.
///
/// Order is preserved; the first occurrence of a duplicate row wins.
pub fn clean(records: Vec<RawTransaction>) -> Vec<RawTransaction> {
    let mut seen: HashSet<RawTransaction> = HashSet::new();
    let mut cleaned = Vec::new();

    for record in records {
        if record.customer_id.is_none() {
            continue;
        }
        if seen.insert(record.clone()) {
            cleaned.push(record);
        }
    }

    cleaned
}

/// Parse an invoice timestamp, trying each accepted format.
pub fn parse_invoice_date(value: &str) -> Option<NaiveDateTime> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value.trim(), fmt).ok())
}

/// Convert cleaned raw rows into typed transactions with line totals.
///
/// Row numbers in errors are 1-based over the cleaned input.
pub fn derive(records: Vec<RawTransaction>) -> LoadResult<Vec<Transaction>> {
    let mut transactions = Vec::with_capacity(records.len());

    for (i, record) in records.into_iter().enumerate() {
        let row = i + 1;

        let invoice_date = parse_invoice_date(&record.invoice_date).ok_or_else(|| {
            LoadError::invalid_field(
                row,
                "InvoiceDate",
                &record.invoice_date,
                "unrecognized date format",
            )
        })?;

        let quantity: i64 = record.quantity.trim().parse().map_err(|_| {
            LoadError::invalid_field(row, "Quantity", &record.quantity, "not an integer")
        })?;

        let unit_price: f64 = record.unit_price.trim().parse().map_err(|_| {
            LoadError::invalid_field(row, "UnitPrice", &record.unit_price, "not a number")
        })?;

        // clean() already removed rows without a customer id
        let customer_id = record.customer_id.ok_or_else(|| {
            LoadError::invalid_field(row, "CustomerID", "", "missing customer id")
        })?;

        transactions.push(Transaction {
            total_price: quantity as f64 * unit_price,
            invoice_no: record.invoice_no,
            stock_code: record.stock_code,
            description: record.description,
            quantity,
            invoice_date,
            unit_price,
            customer_id,
            country: record.country,
        });
    }

    Ok(transactions)
}
