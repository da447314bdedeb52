use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use skiscout::config::SkiScoutConfig;
use skiscout::models::{BookingOptions, DateRange};
use skiscout::pipeline::{ScoutPipeline, SearchRequest};
use skiscout::{SkiScoutError, export, logging, web};

/// SkiScout: nearby ski resorts with weather, reputation and booking links
///
/// Examples:
///   skiscout search --location "Lake Tahoe, CA" --radius 20
///   skiscout search -l "39.10,-120.03" --from 2024-01-10 --to 2024-01-15 --lessons --rental
///   skiscout serve --port 8080
#[derive(Parser)]
#[command(name = "skiscout", version, about, long_about = None)]
struct Cli {
    /// Config file (defaults to the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Trace intermediate lookups. Does not change results.
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one search and print the results
    Search {
        /// City, region or "lat,lon"
        #[arg(long, short = 'l')]
        location: String,

        /// Search radius in miles (5 to 100, step 5). Defaults to the config value.
        #[arg(long, short = 'r')]
        radius: Option<u32>,

        /// First day (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        from: Option<String>,

        /// Last day (YYYY-MM-DD). Defaults to two days after the first.
        #[arg(long)]
        to: Option<String>,

        /// Include lesson booking links
        #[arg(long)]
        lessons: bool,

        /// Include rental booking links
        #[arg(long)]
        rental: bool,

        /// Write the booking links to this file
        #[arg(long)]
        export: Option<PathBuf>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve the JSON API
    Serve {
        #[arg(long, short = 'p', default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        match e.downcast_ref::<SkiScoutError>() {
            Some(err) => eprintln!("Error: {}", err.user_message()),
            None => eprintln!("Error: {e:#}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = SkiScoutConfig::load_from_path(cli.config)?;
    logging::init(&config.logging, cli.debug)?;

    let pipeline =
        ScoutPipeline::from_config(&config).context("Failed to set up the search pipeline")?;

    match cli.command {
        Command::Search {
            location,
            radius,
            from,
            to,
            lessons,
            rental,
            export: export_path,
            json,
        } => {
            let dates = DateRange::parse_or_default(from.as_deref(), to.as_deref())?;
            let request = SearchRequest::new(
                location,
                radius.unwrap_or(config.search.radius_miles),
                dates,
                BookingOptions { lessons, rental },
            )?;

            let report = pipeline.run(&request).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!(
                    "📍 {} ({}), {} mi, {} to {}",
                    report.origin.name,
                    report.origin.format_coordinates(),
                    report.radius_miles,
                    report.dates.start_str(),
                    report.dates.end_str()
                );
                if report.used_fallback {
                    println!("Live search found nothing; showing well-known resorts instead.");
                }
                if report.resorts.is_empty() {
                    println!("No resorts within {} miles.", report.radius_miles);
                } else {
                    println!();
                    print!("{}", export::render_table(&report.resorts, rental));
                    println!();
                    print!("{}", export::export_links(&report.resorts));
                }
            }

            if let Some(path) = export_path {
                export::write_export(&path, &report.resorts)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }
        }
        Command::Serve { port } => {
            web::run(Arc::new(pipeline), config.search.radius_miles, port).await?;
        }
    }

    Ok(())
}
