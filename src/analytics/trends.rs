//! Sales trend, top-product, and geographic rollups.
//!
//! - [`sales_trends`] buckets line totals by a caller-chosen granularity and
//!   labels each bucket with its start date. Empty buckets are not filled.
//! - [`top_products`] sums quantity per product description and keeps the
//!   top N, ties resolved by first appearance in the record stream.
//! - [`geographic_distribution`] sums revenue per country, descending.

use chrono::{Datelike, Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};

use crate::models::{CountrySales, Granularity, ProductSales, Transaction, TrendPoint};

/// Default number of products returned by [`top_products`].
pub const DEFAULT_TOP_N: usize = 10;

/// First day of the bucket containing `date` for the given granularity.
///
/// Weeks start on Monday; quarters on Jan/Apr/Jul/Oct 1st.
pub fn bucket_start(date: NaiveDate, granularity: Granularity) -> NaiveDate {
    match granularity {
        Granularity::Daily => date,
        Granularity::Weekly => {
            date - Duration::days(date.weekday().num_days_from_monday() as i64)
        }
        Granularity::Monthly => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
            .unwrap_or(date),
        Granularity::Quarterly => {
            let quarter_month = (date.month0() / 3) * 3 + 1;
            NaiveDate::from_ymd_opt(date.year(), quarter_month, 1).unwrap_or(date)
        }
    }
}

/// Sum revenue into time buckets, returned in chronological order.
pub fn sales_trends(transactions: &[Transaction], granularity: Granularity) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for tx in transactions {
        let start = bucket_start(tx.invoice_date.date(), granularity);
        *buckets.entry(start).or_insert(0.0) += tx.total_price;
    }

    buckets
        .into_iter()
        .map(|(period_start, revenue)| TrendPoint { period_start, revenue })
        .collect()
}

/// Top N products by total quantity sold.
///
/// Grouping preserves first-seen order, and the descending sort is stable,
/// so tied products keep their original order.
pub fn top_products(transactions: &[Transaction], n: usize) -> Vec<ProductSales> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut products: Vec<ProductSales> = Vec::new();

    for tx in transactions {
        match index.get(tx.description.as_str()) {
            Some(&i) => products[i].quantity += tx.quantity,
            None => {
                index.insert(tx.description.as_str(), products.len());
                products.push(ProductSales {
                    description: tx.description.clone(),
                    quantity: tx.quantity,
                });
            }
        }
    }

    products.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    products.truncate(n);
    products
}

/// Revenue per country, sorted descending.
pub fn geographic_distribution(transactions: &[Transaction]) -> Vec<CountrySales> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut countries: Vec<CountrySales> = Vec::new();

    for tx in transactions {
        match index.get(tx.country.as_str()) {
            Some(&i) => countries[i].revenue += tx.total_price,
            None => {
                index.insert(tx.country.as_str(), countries.len());
                countries.push(CountrySales {
                    country: tx.country.clone(),
                    revenue: tx.total_price,
                });
            }
        }
    }

    countries.sort_by(|a, b| b.revenue.total_cmp(&a.revenue));
    countries
}
