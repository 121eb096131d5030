//! RFM (Recency, Frequency, Monetary) scoring and segmentation.
//!
//! Each customer is aggregated into three raw metrics and each metric is
//! independently converted to a 1-4 quartile score:
//!
//! - Recency: whole days since the customer's last purchase, relative to a
//!   snapshot date (latest invoice date in the input plus one day). Scored
//!   inverted: fewer days means a higher score.
//! - Frequency: number of distinct invoices. Higher is better.
//! - Monetary: sum of line totals. Higher is better.
//!
//! Scoring is rank-based: customers are ranked by the raw metric with ties
//! broken by first occurrence (customer-id order), so every customer holds a
//! unique rank, and ranks are cut into four equal-sized quantile buckets.
//! When the population is too small or too homogeneous to support four
//! buckets, every customer receives the neutral score 2 for that metric.
//! Both outcomes are ordinary control flow; scoring never fails.
//!
//! The whole computation is a pure function of its input.

use chrono::Duration;
use std::collections::{BTreeMap, HashSet};

use crate::models::{CustomerRfm, Segment, Transaction};

/// Neutral score assigned to every customer when quartile binning is
/// infeasible for a metric.
const NEUTRAL_SCORE: u8 = 2;

/// Per-customer raw aggregates, keyed in customer-id order.
struct CustomerAgg {
    last_purchase: chrono::NaiveDateTime,
    invoices: HashSet<String>,
    monetary: f64,
}

/// Compute RFM scores and segments for every customer in the input.
///
/// Empty input yields empty output. Customers appear exactly once, in
/// customer-id order.
pub fn calculate_rfm(transactions: &[Transaction]) -> Vec<CustomerRfm> {
    let Some(max_date) = transactions.iter().map(|t| t.invoice_date).max() else {
        return Vec::new();
    };
    let snapshot = max_date + Duration::days(1);

    let mut aggregates: BTreeMap<String, CustomerAgg> = BTreeMap::new();
    for tx in transactions {
        let agg = aggregates
            .entry(tx.customer_id.clone())
            .or_insert_with(|| CustomerAgg {
                last_purchase: tx.invoice_date,
                invoices: HashSet::new(),
                monetary: 0.0,
            });
        if tx.invoice_date > agg.last_purchase {
            agg.last_purchase = tx.invoice_date;
        }
        agg.invoices.insert(tx.invoice_no.clone());
        agg.monetary += tx.total_price;
    }

    let customers: Vec<(String, i64, u64, f64)> = aggregates
        .into_iter()
        .map(|(id, agg)| {
            let recency = (snapshot - agg.last_purchase).num_days();
            (id, recency, agg.invoices.len() as u64, agg.monetary)
        })
        .collect();

    let recency_raw: Vec<f64> = customers.iter().map(|c| c.1 as f64).collect();
    let frequency_raw: Vec<f64> = customers.iter().map(|c| c.2 as f64).collect();
    let monetary_raw: Vec<f64> = customers.iter().map(|c| c.3).collect();

    // Recency is inverted: the most recent quartile gets score 4.
    let r_scores = score_metric(&recency_raw, true);
    let f_scores = score_metric(&frequency_raw, false);
    let m_scores = score_metric(&monetary_raw, false);

    customers
        .into_iter()
        .enumerate()
        .map(|(i, (customer_id, recency, frequency, monetary))| {
            let (r, f, m) = (r_scores[i], f_scores[i], m_scores[i]);
            CustomerRfm {
                customer_id,
                recency,
                frequency,
                monetary,
                r,
                f,
                m,
                segment_code: format!("{r}{f}{m}"),
                score: r + f + m,
                segment: Segment::from_scores(r, f, m),
            }
        })
        .collect()
}

/// Score one raw metric across all customers.
///
/// Attempts rank-based quartile binning; when binning is infeasible every
/// customer falls back to the neutral score instead.
fn score_metric(values: &[f64], inverted: bool) -> Vec<u8> {
    match quartile_buckets(values) {
        Some(buckets) => buckets
            .into_iter()
            .map(|b| if inverted { 5 - b } else { b })
            .collect(),
        None => vec![NEUTRAL_SCORE; values.len()],
    }
}

/// Assign each value a quartile bucket 1-4 via tie-broken ranking.
///
/// Returns `None` when four distinct rank buckets are not achievable:
/// fewer than four customers, or fewer than four distinct raw values.
fn quartile_buckets(values: &[f64]) -> Option<Vec<u8>> {
    let n = values.len();
    if n < 4 || distinct_count(values) < 4 {
        return None;
    }

    // Stable sort: tied values keep first-occurrence order, so every
    // customer gets a unique rank in 1..=n.
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));

    let mut ranks = vec![0usize; n];
    for (pos, &idx) in order.iter().enumerate() {
        ranks[idx] = pos + 1;
    }

    // Quartile edges over ranks 1..=n with linear interpolation; rank r
    // lands in the bucket whose interval (edge[j-1], edge[j]] contains it.
    let edges: Vec<f64> = (1..4)
        .map(|j| 1.0 + (n as f64 - 1.0) * j as f64 / 4.0)
        .collect();

    Some(
        ranks
            .into_iter()
            .map(|r| {
                let above = edges.iter().filter(|&&e| r as f64 > e).count();
                (above + 1) as u8
            })
            .collect(),
    )
}

/// Count distinct values (exact float equality via total ordering).
fn distinct_count(values: &[f64]) -> usize {
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    sorted.dedup_by(|a, b| a.total_cmp(b) == std::cmp::Ordering::Equal);
    sorted.len()
}
