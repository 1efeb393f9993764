#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Operator CLI for alert-front.
//!
//! ```text
//! alert_front_cli serve
//! alert_front_cli cleanup [--days 30]
//! alert_front_cli reports list [--status New] [--limit 20]
//! ```
//!
//! Every command reads the same environment as the server
//! (`DATABASE_URL`, `CLEANUP_RETENTION_DAYS`, ...).

use alert_front_database::{ReportFilter, cleanup, open_store_from_env};
use alert_front_report_models::ReportStatus;
use alert_front_server::ServerConfig;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "alert_front_cli", about = "Operate the alert-front service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API server
    Serve,
    /// Delete reports resolved longer ago than the retention period
    Cleanup {
        /// Retention in days (defaults to `CLEANUP_RETENTION_DAYS` or 30)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Inspect stored reports
    Reports {
        #[command(subcommand)]
        command: ReportCommands,
    },
}

#[derive(Subcommand)]
enum ReportCommands {
    /// List recent reports, newest first
    List {
        /// Only show reports with this status (New, InProgress, Resolved)
        #[arg(long)]
        status: Option<String>,
        /// Maximum number of reports to show
        #[arg(long, default_value = "20")]
        limit: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve => {
            // The server uses actix-web's runtime, so it runs in a blocking
            // task to avoid nesting runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(alert_front_server::run_server())
            })
            .await??;
        }
        Commands::Cleanup { days } => {
            let retention_days = days.unwrap_or_else(|| ServerConfig::from_env().retention_days);
            let store = open_store_from_env().await?;
            let deleted = cleanup::sweep(store.as_ref(), retention_days, chrono::Utc::now()).await?;
            println!("Deleted {deleted} report(s) resolved more than {retention_days} day(s) ago.");
        }
        Commands::Reports {
            command: ReportCommands::List { status, limit },
        } => {
            let status = status
                .as_deref()
                .map(|s| {
                    s.parse::<ReportStatus>()
                        .map_err(|_| format!("Unknown status: {s}"))
                })
                .transpose()?;

            let store = open_store_from_env().await?;
            let reports = store
                .list(ReportFilter {
                    status,
                    limit,
                    ..ReportFilter::default()
                })
                .await?;

            if reports.is_empty() {
                println!("No reports found.");
                return Ok(());
            }

            println!(
                "{:<38} {:<9} {:<11} {:<22} DESCRIPTION",
                "ID", "URGENCY", "STATUS", "CREATED"
            );
            println!("{}", "-".repeat(110));

            for report in &reports {
                let description: String = report.description.chars().take(40).collect();
                println!(
                    "{:<38} {:<9} {:<11} {:<22} {description}",
                    report.id,
                    report.urgency.to_string(),
                    report.status.to_string(),
                    report.created_at.format("%Y-%m-%d %H:%M:%S"),
                );
            }
        }
    }

    Ok(())
}
