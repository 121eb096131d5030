//! shopmetrics CLI - Customer intelligence over transaction CSV data
//!
//! # Main Commands
//!
//! ```bash
//! shopmetrics analyze transactions.csv      # Full analysis, JSON output
//! shopmetrics etl sales.csv --db sales.db   # Chunked ETL into SQLite
//! ```
//!
//! # Focused Commands
//!
//! ```bash
//! shopmetrics validate transactions.csv     # Report missing columns
//! shopmetrics rfm transactions.csv          # RFM scores and segments
//! shopmetrics clv transactions.csv          # Lifetime value estimates
//! shopmetrics trends transactions.csv -f W  # Weekly revenue series
//! shopmetrics top-products transactions.csv -n 5
//! shopmetrics geo transactions.csv          # Revenue by country
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use shopmetrics::{
    analyze_csv, missing_columns, read_transactions, run_etl, AnalyzeOptions, EtlConfig,
    Granularity, PipelineError,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "shopmetrics")]
#[command(about = "Customer intelligence analytics for e-commerce transaction data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a CSV for the required transaction columns
    Validate {
        /// Input CSV file
        input: PathBuf,
    },

    /// Full analysis: KPIs, RFM, CLV, trends, top products, geography
    Analyze {
        /// Input CSV file
        input: PathBuf,

        /// Trend granularity: D, W, M or Q (default: monthly)
        #[arg(short = 'f', long, default_value = "M")]
        freq: String,

        /// Number of top products to include
        #[arg(short = 'n', long, default_value = "10")]
        top_n: usize,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// RFM scores and segments per customer
    Rfm {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Customer lifetime value estimates
    Clv {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Time-bucketed revenue series
    Trends {
        /// Input CSV file
        input: PathBuf,

        /// Granularity: D, W, M or Q
        #[arg(short = 'f', long, default_value = "M")]
        freq: String,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Top selling products by quantity
    TopProducts {
        /// Input CSV file
        input: PathBuf,

        /// Number of products to keep
        #[arg(short = 'n', long, default_value = "10")]
        top_n: usize,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Revenue by country
    Geo {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Chunked ETL of a sales feed into SQLite
    Etl {
        /// Input CSV file (columns: date, product_id, quantity, revenue)
        input: PathBuf,

        /// SQLite database file
        #[arg(long, default_value = "sales.db")]
        db: PathBuf,

        /// Sink table name
        #[arg(long, default_value = "sales")]
        table: String,

        /// Rows per chunk
        #[arg(long, default_value = "10000")]
        chunk_size: usize,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { input } => cmd_validate(&input),

        Commands::Analyze {
            input,
            freq,
            top_n,
            output,
        } => cmd_analyze(&input, &freq, top_n, output.as_deref()),

        Commands::Rfm { input, output } => {
            cmd_partial(&input, output.as_deref(), |r| json(&r.rfm))
        }

        Commands::Clv { input, output } => {
            cmd_partial(&input, output.as_deref(), |r| json(&r.clv))
        }

        Commands::Trends { input, freq, output } => {
            let granularity = parse_granularity(&freq);
            match granularity {
                Ok(g) => cmd_partial_with(&input, g, 10, output.as_deref(), |r| json(&r.trends)),
                Err(e) => Err(e),
            }
        }

        Commands::TopProducts {
            input,
            top_n,
            output,
        } => cmd_partial_with(&input, Granularity::Monthly, top_n, output.as_deref(), |r| {
            json(&r.top_products)
        }),

        Commands::Geo { input, output } => {
            cmd_partial(&input, output.as_deref(), |r| json(&r.geography))
        }

        Commands::Etl {
            input,
            db,
            table,
            chunk_size,
        } => cmd_etl(&input, &db, table, chunk_size),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn parse_granularity(code: &str) -> Result<Granularity, Box<dyn std::error::Error>> {
    Granularity::from_code(code)
        .ok_or_else(|| format!("Unknown granularity '{code}' (expected D, W, M or Q)").into())
}

fn json<T: Serialize>(value: &T) -> Result<String, Box<dyn std::error::Error>> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn cmd_validate(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("✔️  Validating: {}", input.display());

    let loaded = read_transactions(input)?;
    let missing = missing_columns(&loaded.headers);

    eprintln!("   Encoding: {}", loaded.encoding);
    eprintln!("   Columns: {}", loaded.headers.join(", "));
    eprintln!("   Rows: {}", loaded.records.len());

    if missing.is_empty() {
        eprintln!("✅ All required columns present");
        Ok(())
    } else {
        eprintln!("❌ Missing required columns: {}", missing.join(", "));
        std::process::exit(1);
    }
}

fn cmd_analyze(
    input: &Path,
    freq: &str,
    top_n: usize,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Analyzing: {}", input.display());

    let options = AnalyzeOptions {
        granularity: parse_granularity(freq)?,
        top_n,
    };
    let result = analyze_csv(input, options).map_err(describe_pipeline_error)?;

    eprintln!("   Rows: {} (cleaned: {})", result.input_rows, result.cleaned_rows);
    eprintln!("   Customers: {}", result.kpis.total_customers);
    eprintln!("   Orders: {}", result.kpis.total_orders);
    eprintln!("   Revenue: {:.2}", result.kpis.total_revenue);
    eprintln!("   Avg order value: {:.2}", result.kpis.avg_order_value);

    let segments: std::collections::BTreeMap<&str, usize> =
        result.rfm.iter().fold(Default::default(), |mut acc, r| {
            *acc.entry(r.segment.as_str()).or_insert(0) += 1;
            acc
        });
    eprintln!("\n📊 Segments:");
    for (segment, count) in segments {
        eprintln!("   {segment}: {count}");
    }

    write_output(&serde_json::to_string_pretty(&result)?, output)?;
    eprintln!("\n✨ Done!");
    Ok(())
}

/// Run the pipeline with default options and emit one selected section.
fn cmd_partial(
    input: &Path,
    output: Option<&Path>,
    select: impl Fn(&shopmetrics::AnalysisResult) -> Result<String, Box<dyn std::error::Error>>,
) -> Result<(), Box<dyn std::error::Error>> {
    cmd_partial_with(input, Granularity::Monthly, 10, output, select)
}

fn cmd_partial_with(
    input: &Path,
    granularity: Granularity,
    top_n: usize,
    output: Option<&Path>,
    select: impl Fn(&shopmetrics::AnalysisResult) -> Result<String, Box<dyn std::error::Error>>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let options = AnalyzeOptions { granularity, top_n };
    let result = analyze_csv(input, options).map_err(describe_pipeline_error)?;
    eprintln!("   Rows: {} (cleaned: {})", result.input_rows, result.cleaned_rows);

    write_output(&select(&result)?, output)
}

fn cmd_etl(
    input: &Path,
    db: &Path,
    table: String,
    chunk_size: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 ETL: {} → {}", input.display(), db.display());

    let config = EtlConfig {
        source: input.to_path_buf(),
        database: db.to_path_buf(),
        table,
        chunk_size,
    };
    let report = run_etl(&config)?;

    eprintln!("   Chunks: {}", report.chunks_processed);
    eprintln!("   Rows written: {}", report.rows_written);
    if report.rows_dropped > 0 {
        eprintln!("   ⚠️  Rows dropped (no date): {}", report.rows_dropped);
    }

    eprintln!("\n📊 Top products by revenue:");
    for (i, product) in report.top_products.iter().enumerate() {
        eprintln!("   {:2}. {} — {:.2}", i + 1, product.product_id, product.revenue);
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

/// Keep the missing-column report user-facing rather than a raw Debug dump.
fn describe_pipeline_error(err: PipelineError) -> Box<dyn std::error::Error> {
    match err {
        PipelineError::MissingColumns(cols) => format!(
            "The input is missing the following required columns: {}",
            cols.join(", ")
        )
        .into(),
        other => Box::new(other),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
