//! Domain models for the shopmetrics analysis pipeline.
//!
//! This module contains the core data structures used throughout the crate:
//!
//! - [`RawTransaction`] - A transaction row as read from CSV (string-typed)
//! - [`Transaction`] - A cleaned transaction with typed fields and line total
//! - [`CustomerRfm`] - Per-customer RFM scores and segment
//! - [`Segment`] - Semantic customer segment labels
//! - [`CustomerValue`] - Per-customer lifetime value estimate
//! - [`TrendPoint`] / [`Granularity`] - Time-bucketed revenue series
//! - [`ProductSales`] / [`CountrySales`] - Top-N and geographic rollups
//! - [`Kpis`] - Dashboard-level key performance indicators
//! - [`SalesRow`] - A row of the generic sales feed consumed by the ETL driver

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

// =============================================================================
// Transactions
// =============================================================================

/// A transaction line item exactly as read from the source CSV.
///
/// All fields keep their raw string form so that exact-duplicate removal
/// compares what the file actually contained. An empty `CustomerID` cell
/// becomes `None`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawTransaction {
    pub invoice_no: String,
    pub stock_code: String,
    pub description: String,
    pub quantity: String,
    pub invoice_date: String,
    pub unit_price: String,
    pub customer_id: Option<String>,
    pub country: String,
}

/// A cleaned, typed transaction line item.
///
/// `quantity` may be negative (returns). `total_price` is the derived
/// line total `quantity * unit_price`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub invoice_no: String,
    pub stock_code: String,
    pub description: String,
    pub quantity: i64,
    pub invoice_date: NaiveDateTime,
    pub unit_price: f64,
    pub customer_id: String,
    pub country: String,
    pub total_price: f64,
}

// =============================================================================
// Customer Segments
// =============================================================================

/// Semantic customer segment derived from RFM scores.
///
/// Assignment is priority-ordered and mutually exclusive, see
/// [`Segment::from_scores`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    /// Recent, frequent, and high-spending (R, F, M all 4).
    BestCustomers,
    /// Recent and frequent (R >= 3, F >= 3).
    LoyalCustomers,
    /// Recent and high-spending (R >= 3, M >= 3).
    BigSpenders,
    /// Lapsed and infrequent (R <= 2, F <= 2).
    AtRisk,
    /// Lapsed (R <= 2).
    NeedsAttention,
    /// Everyone else.
    Others,
}

impl Segment {
    /// Assign a segment from the three quartile scores.
    ///
    /// Evaluated in priority order; the first matching rule wins.
    pub fn from_scores(r: u8, f: u8, m: u8) -> Self {
        if r >= 4 && f >= 4 && m >= 4 {
            Segment::BestCustomers
        } else if r >= 3 && f >= 3 {
            Segment::LoyalCustomers
        } else if r >= 3 && m >= 3 {
            Segment::BigSpenders
        } else if r <= 2 && f <= 2 {
            Segment::AtRisk
        } else if r <= 2 {
            Segment::NeedsAttention
        } else {
            Segment::Others
        }
    }

    /// Human-readable segment name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::BestCustomers => "Best Customers",
            Segment::LoyalCustomers => "Loyal Customers",
            Segment::BigSpenders => "Big Spenders",
            Segment::AtRisk => "At Risk",
            Segment::NeedsAttention => "Needs Attention",
            Segment::Others => "Others",
        }
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RFM scores and segment for one customer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRfm {
    pub customer_id: String,
    /// Days since last purchase, relative to the snapshot date.
    pub recency: i64,
    /// Number of distinct invoices.
    pub frequency: u64,
    /// Sum of line totals.
    pub monetary: f64,
    /// Recency quartile score (1-4, higher = more recent).
    pub r: u8,
    /// Frequency quartile score (1-4, higher = more frequent).
    pub f: u8,
    /// Monetary quartile score (1-4, higher = bigger spender).
    pub m: u8,
    /// Concatenated R, F, M digits, e.g. "432".
    pub segment_code: String,
    /// R + F + M, in [3, 12].
    pub score: u8,
    /// Semantic segment label.
    pub segment: Segment,
}

// =============================================================================
// Customer Lifetime Value
// =============================================================================

/// Lifetime value estimate for one customer, projected over one year.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerValue {
    pub customer_id: String,
    /// Number of distinct invoices.
    pub total_transactions: u64,
    /// Total units purchased across all line items.
    pub total_products: i64,
    /// Sum of line totals.
    pub total_revenue: f64,
    pub first_purchase: NaiveDateTime,
    pub last_purchase: NaiveDateTime,
    /// Whole days between first and last purchase.
    pub purchase_lifespan: i64,
    pub avg_order_value: f64,
    /// Transactions per active day: `total_transactions / (lifespan + 1)`.
    pub purchase_frequency: f64,
    /// Projected annual value: `avg_order_value * purchase_frequency * 365`.
    pub clv: f64,
}

// =============================================================================
// Trend / Top-N / Geographic Rollups
// =============================================================================

/// Time bucket size for sales trend aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

impl Granularity {
    /// Parse a granularity from a short code or full name.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "D" | "DAY" | "DAILY" => Some(Self::Daily),
            "W" | "WEEK" | "WEEKLY" => Some(Self::Weekly),
            "M" | "MONTH" | "MONTHLY" => Some(Self::Monthly),
            "Q" | "QUARTER" | "QUARTERLY" => Some(Self::Quarterly),
            _ => None,
        }
    }

    /// Short resample code.
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::Daily => "D",
            Self::Weekly => "W",
            Self::Monthly => "M",
            Self::Quarterly => "Q",
        }
    }
}

/// One point of a time-bucketed revenue series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// First day of the bucket.
    pub period_start: NaiveDate,
    /// Revenue summed over the bucket.
    pub revenue: f64,
}

/// Units sold per product description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSales {
    pub description: String,
    pub quantity: i64,
}

/// Revenue per country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySales {
    pub country: String,
    pub revenue: f64,
}

// =============================================================================
// Key Performance Indicators
// =============================================================================

/// Dashboard-level KPIs over one cleaned record set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kpis {
    pub total_revenue: f64,
    pub total_customers: u64,
    pub total_orders: u64,
    pub avg_order_value: f64,
}

// =============================================================================
// ETL Feed Rows
// =============================================================================

/// A row of the generic sales feed consumed by the batch ETL driver.
///
/// Missing `quantity` / `revenue` cells are filled with 0 during chunk
/// cleaning; rows without a `date` are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesRow {
    pub date: String,
    pub product_id: String,
    pub quantity: f64,
    pub revenue: f64,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_priority_order() {
        assert_eq!(Segment::from_scores(4, 4, 4), Segment::BestCustomers);
        // M < 4 drops out of Best but R/F >= 3 keeps Loyal.
        assert_eq!(Segment::from_scores(4, 4, 1), Segment::LoyalCustomers);
        assert_eq!(Segment::from_scores(3, 1, 3), Segment::BigSpenders);
        assert_eq!(Segment::from_scores(1, 2, 4), Segment::AtRisk);
        assert_eq!(Segment::from_scores(2, 3, 1), Segment::NeedsAttention);
        assert_eq!(Segment::from_scores(3, 2, 2), Segment::Others);
    }

    #[test]
    fn test_segment_display() {
        assert_eq!(Segment::BestCustomers.to_string(), "Best Customers");
        assert_eq!(Segment::AtRisk.as_str(), "At Risk");
    }

    #[test]
    fn test_granularity_from_code() {
        assert_eq!(Granularity::from_code("M"), Some(Granularity::Monthly));
        assert_eq!(Granularity::from_code("weekly"), Some(Granularity::Weekly));
        assert_eq!(Granularity::from_code("Quarter"), Some(Granularity::Quarterly));
        assert_eq!(Granularity::from_code("X"), None);
    }

    #[test]
    fn test_granularity_roundtrip() {
        for g in [
            Granularity::Daily,
            Granularity::Weekly,
            Granularity::Monthly,
            Granularity::Quarterly,
        ] {
            assert_eq!(Granularity::from_code(g.to_code()), Some(g));
        }
    }

    #[test]
    fn test_raw_transaction_equality_is_exact() {
        let a = RawTransaction {
            invoice_no: "536365".into(),
            stock_code: "85123A".into(),
            description: "WHITE HANGING HEART T-LIGHT HOLDER".into(),
            quantity: "6".into(),
            invoice_date: "12/1/2010 8:26".into(),
            unit_price: "2.55".into(),
            customer_id: Some("17850".into()),
            country: "United Kingdom".into(),
        };
        let mut b = a.clone();
        assert_eq!(a, b);
        b.unit_price = "2.550".into();
        assert_ne!(a, b);
    }
}
