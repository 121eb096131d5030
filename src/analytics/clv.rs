//! Customer lifetime value estimation.
//!
//! Aggregates each customer's purchase history and projects an annualized
//! value: `avg_order_value * purchase_frequency * 365`, where purchase
//! frequency divides by `lifespan + 1` days so single-day customers never
//! divide by zero.
//!
//! Pure function of the input; running it twice on the same records yields
//! identical results.

use std::collections::{BTreeMap, HashSet};

use crate::models::{CustomerValue, Transaction};

struct CustomerHistory {
    invoices: HashSet<String>,
    total_products: i64,
    total_revenue: f64,
    first_purchase: chrono::NaiveDateTime,
    last_purchase: chrono::NaiveDateTime,
}

/// Compute a lifetime value estimate per customer, sorted descending by CLV.
pub fn calculate_clv(transactions: &[Transaction]) -> Vec<CustomerValue> {
    let mut histories: BTreeMap<String, CustomerHistory> = BTreeMap::new();

    for tx in transactions {
        let history = histories
            .entry(tx.customer_id.clone())
            .or_insert_with(|| CustomerHistory {
                invoices: HashSet::new(),
                total_products: 0,
                total_revenue: 0.0,
                first_purchase: tx.invoice_date,
                last_purchase: tx.invoice_date,
            });
        history.invoices.insert(tx.invoice_no.clone());
        history.total_products += tx.quantity;
        history.total_revenue += tx.total_price;
        if tx.invoice_date < history.first_purchase {
            history.first_purchase = tx.invoice_date;
        }
        if tx.invoice_date > history.last_purchase {
            history.last_purchase = tx.invoice_date;
        }
    }

    let mut values: Vec<CustomerValue> = histories
        .into_iter()
        .map(|(customer_id, h)| {
            let total_transactions = h.invoices.len() as u64;
            let purchase_lifespan = (h.last_purchase - h.first_purchase).num_days();
            let avg_order_value = h.total_revenue / total_transactions as f64;
            let purchase_frequency =
                total_transactions as f64 / (purchase_lifespan + 1) as f64;
            CustomerValue {
                customer_id,
                total_transactions,
                total_products: h.total_products,
                total_revenue: h.total_revenue,
                first_purchase: h.first_purchase,
                last_purchase: h.last_purchase,
                purchase_lifespan,
                avg_order_value,
                purchase_frequency,
                clv: avg_order_value * purchase_frequency * 365.0,
            }
        })
        .collect();

    values.sort_by(|a, b| b.clv.total_cmp(&a.clv));
    values
}
