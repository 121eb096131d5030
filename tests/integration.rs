//! End-to-end tests: CSV files on disk through the analysis pipeline and
//! the chunked ETL driver.

use std::io::Write;

use shopmetrics::{
    analyze_csv, run_etl, AnalyzeOptions, EtlConfig, Granularity, PipelineError, Segment,
};

const HEADER: &str =
    "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country";

fn write_csv(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

fn transactions_csv() -> String {
    // Four customers with distinct recency, monetary and frequency spread;
    // one dateless duplicate pair and one anonymous row exercise cleaning.
    format!(
        "{HEADER}\n\
         536365,85123A,\"HEART HOLDER, WHITE\",6,12/1/2010 8:26,2.55,17850,United Kingdom\n\
         536365,85123A,\"HEART HOLDER, WHITE\",6,12/1/2010 8:26,2.55,17850,United Kingdom\n\
         536370,22728,ALARM CLOCK,24,12/3/2010 9:00,3.75,12583,France\n\
         536371,22727,RED TOADSTOOL,12,12/5/2010 10:00,1.65,13047,United Kingdom\n\
         536372,21730,GLASS STAR,4,12/7/2010 11:00,4.25,12431,Australia\n\
         536373,85123A,\"HEART HOLDER, WHITE\",2,12/8/2010 12:00,2.55,17850,United Kingdom\n\
         536374,22633,HAND WARMER,10,12/8/2010 13:00,1.85,,United Kingdom"
    )
}

#[test]
fn analyze_full_pipeline_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "transactions.csv", &transactions_csv());

    let result = analyze_csv(&path, AnalyzeOptions::default()).unwrap();

    assert_eq!(result.input_rows, 7);
    // One duplicate and one anonymous row removed.
    assert_eq!(result.cleaned_rows, 5);
    assert_eq!(result.kpis.total_customers, 4);
    assert_eq!(result.kpis.total_orders, 5);

    // Every customer appears exactly once in the RFM output.
    let mut ids: Vec<&str> = result.rfm.iter().map(|r| r.customer_id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["12431", "12583", "13047", "17850"]);

    for customer in &result.rfm {
        assert!((1..=4).contains(&customer.r));
        assert!((3..=12).contains(&customer.score));
        assert_eq!(customer.segment_code.len(), 3);
    }

    // CLV sorted descending.
    for pair in result.clv.windows(2) {
        assert!(pair[0].clv >= pair[1].clv);
    }

    // Single month of data: one monthly trend point.
    assert_eq!(result.trends.len(), 1);
    assert_eq!(
        result.trends[0].period_start,
        chrono::NaiveDate::from_ymd_opt(2010, 12, 1).unwrap()
    );

    // 17850 bought the heart holder twice (6 + 2 units), alarm clock leads.
    assert_eq!(result.top_products[0].description, "ALARM CLOCK");

    assert_eq!(result.geography[0].country, "France");
}

#[test]
fn analyze_weekly_granularity() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "transactions.csv", &transactions_csv());

    let options = AnalyzeOptions {
        granularity: Granularity::Weekly,
        top_n: 2,
    };
    let result = analyze_csv(&path, options).unwrap();

    // Dec 1-8 2010 spans two ISO weeks (Mon Nov 29 and Mon Dec 6).
    assert_eq!(result.trends.len(), 2);
    assert_eq!(result.top_products.len(), 2);
}

#[test]
fn analyze_reports_missing_columns() {
    let dir = tempfile::tempdir().unwrap();
    let csv = "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID\n\
               536365,85123A,ITEM,6,12/1/2010 8:26,2.55,17850";
    let path = write_csv(&dir, "partial.csv", csv);

    let err = analyze_csv(&path, AnalyzeOptions::default()).unwrap_err();
    match err {
        PipelineError::MissingColumns(cols) => assert_eq!(cols, vec!["Country".to_string()]),
        other => panic!("expected MissingColumns, got {other}"),
    }
}

#[test]
fn segment_priority_is_observable_end_to_end() {
    // A customer recent and frequent but low-spending should never be
    // labeled Best Customers.
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(&dir, "transactions.csv", &transactions_csv());
    let result = analyze_csv(&path, AnalyzeOptions::default()).unwrap();

    for customer in &result.rfm {
        if customer.segment == Segment::BestCustomers {
            assert!(customer.r >= 4 && customer.f >= 4 && customer.m >= 4);
        }
    }
}

#[test]
fn etl_chunked_run_into_sqlite() {
    let dir = tempfile::tempdir().unwrap();

    let mut feed = String::from("date,product_id,quantity,revenue\n");
    // 25 rows over 3 products; two rows lack a date, one lacks revenue.
    for i in 0..23 {
        let product = ["p1", "p2", "p3"][i % 3];
        feed.push_str(&format!("2024-01-{:02},{product},1,{}.0\n", (i % 28) + 1, i + 1));
    }
    feed.push_str(",p1,1,99.0\n");
    feed.push_str(",p2,1,99.0\n");
    let source = write_csv(&dir, "sales.csv", &feed);

    let mut config = EtlConfig::new(&source, dir.path().join("sales.db"));
    config.chunk_size = 10;
    let report = run_etl(&config).unwrap();

    assert_eq!(report.chunks_processed, 3);
    assert_eq!(report.rows_written, 23);
    assert_eq!(report.rows_dropped, 2);
    assert_eq!(report.top_products.len(), 3);
    // Dropped rows contribute nothing to the accumulator.
    let total: f64 = report.top_products.iter().map(|p| p.revenue).sum();
    assert!((total - (1..=23).map(|v| v as f64).sum::<f64>()).abs() < 1e-9);

    // Rows really landed in the sink.
    let conn = rusqlite::Connection::open(dir.path().join("sales.db")).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM sales", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 23);
}

#[test]
fn etl_rerun_resets_the_table() {
    let dir = tempfile::tempdir().unwrap();
    let feed = "date,product_id,quantity,revenue\n2024-01-01,p1,1,10.0\n";
    let source = write_csv(&dir, "sales.csv", feed);
    let db = dir.path().join("sales.db");

    let config = EtlConfig::new(&source, &db);
    run_etl(&config).unwrap();
    run_etl(&config).unwrap();

    let conn = rusqlite::Connection::open(&db).unwrap();
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM sales", [], |row| row.get(0))
        .unwrap();
    // Re-running drops and recreates the table, so no duplicate rows.
    assert_eq!(count, 1);
}
