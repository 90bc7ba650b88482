//! Costimpact CLI - Cost and price change impact analysis
//!
//! # Main Commands
//!
//! ```bash
//! costimpact serve                                  # Start HTTP server (port 3000)
//! costimpact analyze --cost cost_file.csv \
//!     --sales sales_ytd.csv \
//!     --classification product_classification.csv  # Write PM/PG summaries
//! ```
//!
//! # Debug Commands (for development)
//!
//! ```bash
//! costimpact parse input.csv        # Show detected encoding, delimiter, columns
//! ```

use clap::{Parser, Subcommand};
use costimpact::parser::format_delimiter;
use costimpact::report::{format_percent, format_thousands};
use costimpact::{
    compute_from_files, parse_csv_file_auto, summary_to_csv, AnalyzeResponse, AppConfig,
    CoverageParams, GroupBy, InputPaths, RunLimits, Summary,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "costimpact")]
#[command(about = "Simulate cost and price changes by product family and group", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full run: join the three files, simulate, summarize
    Analyze {
        /// Cost file (SKU, TTL_Cost, Cost_Change_%)
        #[arg(long)]
        cost: PathBuf,

        /// Sales YTD file (SKU, Revenue_1)
        #[arg(long)]
        sales: PathBuf,

        /// Product classification file (SKU, Product_Family, Product_Group)
        #[arg(long)]
        classification: PathBuf,

        /// Months of coverage (1-36)
        #[arg(long, default_value = "6")]
        total_months: i64,

        /// Months of stock at the old cost (0-12)
        #[arg(long, default_value = "0")]
        stock_months: i64,

        /// Output file for the family summary (default: PM_Summary.csv)
        #[arg(long)]
        family_out: Option<PathBuf>,

        /// Output file for the group summary (default: PG_Summary.csv)
        #[arg(long)]
        group_out: Option<PathBuf>,

        /// Also write the full JSON response
        #[arg(long)]
        json: Option<PathBuf>,

        /// Override the unique SKU limit
        #[arg(long)]
        sku_limit: Option<usize>,

        /// Run without a SKU limit
        #[arg(long)]
        pro: bool,
    },

    /// Parse a CSV file and show what was detected
    Parse {
        /// Input CSV file
        input: PathBuf,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on (default: COSTIMPACT_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    let result = match cli.command {
        Commands::Analyze {
            cost,
            sales,
            classification,
            total_months,
            stock_months,
            family_out,
            group_out,
            json,
            sku_limit,
            pro,
        } => {
            let mut limits = config.limits;
            if let Some(limit) = sku_limit {
                limits.sku_limit = limit;
            }
            limits.is_pro |= pro;

            let options = AnalyzeOptions {
                paths: InputPaths {
                    cost,
                    sales,
                    classification,
                },
                coverage: CoverageParams::new(total_months, stock_months),
                limits,
                family_out,
                group_out,
                json,
            };
            cmd_analyze(options)
        }

        Commands::Parse { input } => cmd_parse(&input),

        Commands::Serve { port } => {
            let mut config = config;
            if let Some(port) = port {
                config.port = port;
            }
            cmd_serve(config).await
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

struct AnalyzeOptions {
    paths: InputPaths,
    coverage: CoverageParams,
    limits: RunLimits,
    family_out: Option<PathBuf>,
    group_out: Option<PathBuf>,
    json: Option<PathBuf>,
}

fn cmd_analyze(options: AnalyzeOptions) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Cost:           {}", options.paths.cost.display());
    eprintln!("📄 Sales:          {}", options.paths.sales.display());
    eprintln!("📄 Classification: {}", options.paths.classification.display());
    eprintln!(
        "   Coverage: {} months, {} in stock",
        options.coverage.total_months, options.coverage.stock_months
    );

    // Run pipeline
    let report = compute_from_files(&options.paths, options.coverage, options.limits)?;

    eprintln!("\n⚙️  Joined: {} rows, {} unique SKUs", report.enriched.len(), report.unique_skus);
    eprintln!("   Impact fraction: {:.4}", report.impact_fraction.value());

    print_summary(&report.family_summary);
    print_summary(&report.group_summary);

    // Summary CSVs
    for (summary, out) in [
        (&report.family_summary, options.family_out.as_deref()),
        (&report.group_summary, options.group_out.as_deref()),
    ] {
        let path = out.unwrap_or_else(|| Path::new(summary.group_by.file_name()));
        fs::write(path, summary_to_csv(summary)?)?;
        eprintln!("   💾 Saved to: {}", path.display());
    }

    // Full response
    if let Some(json_path) = options.json {
        let response = AnalyzeResponse::from(report);
        let json = serde_json::to_string_pretty(&response)?;
        fs::write(&json_path, json)?;
        eprintln!("   💾 JSON saved to: {}", json_path.display());
    }

    eprintln!("\n✨ Done!");
    Ok(())
}

fn print_summary(summary: &Summary) {
    let title = match summary.group_by {
        GroupBy::Family => "📦 Summary by Product Family",
        GroupBy::Group => "📦 Summary by Product Group",
    };
    eprintln!("\n{}", title);
    eprintln!(
        "   {:<24} {:>14} {:>14} {:>10} {:>10}",
        summary.group_by.column(),
        "Revenue old",
        "Revenue new",
        "Rev %",
        "New GM %"
    );
    for row in summary.rows_with_total() {
        eprintln!(
            "   {:<24} {:>14} {:>14} {:>10} {:>10}",
            row.key,
            format_thousands(row.total_revenue_old),
            format_thousands(row.total_revenue_new),
            format_percent(row.revenue_increase_pct),
            format_percent(row.new_gm_pct)
        );
    }
    if summary.total.missing_values > 0 {
        eprintln!(
            "   ⚠️  {} rows with missing values were left out of the sums",
            summary.total.missing_values
        );
    }
}

fn cmd_parse(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = parse_csv_file_auto(input)?;

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!("   Delimiter: '{}' (auto-detected)", format_delimiter(result.delimiter));
    eprintln!("   Columns: {}", result.table.headers.join(", "));
    eprintln!("✅ Parsed {} rows", result.table.len());

    Ok(())
}

async fn cmd_serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    costimpact::server::start_server(config).await
}
