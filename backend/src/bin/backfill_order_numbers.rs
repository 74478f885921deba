//! Assign `PREFIX-SSS-MMDDYY` numbers to orders (and optionally proposals)
//! that predate document numbering, then print the JSON report.
//!
//! Runs as a dry run unless `--apply` is given.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::env;
use std::sync::Arc;

use cabinet_backend::domain::order::DateSource;
use cabinet_backend::domain::services::{BackfillOptions, NumberingConfig, OrderService};
use cabinet_backend::outbound::persistence::{
    DbPool, DieselOrderRepository, DieselProposalRepository, PoolConfig,
};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use tokio::runtime::Builder;
use uuid::Uuid;

const DATABASE_URL_ENV: &str = "CABINET_DATABASE_URL";

/// `backfill-order-numbers` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "backfill-order-numbers",
    about = "Backfill document numbers on legacy orders and proposals",
    version
)]
struct CliArgs {
    /// Write the planned numbers; without this flag nothing is changed.
    #[arg(long)]
    apply: bool,
    /// Maximum records scanned per kind.
    #[arg(long, default_value_t = 500)]
    max: u32,
    /// Only consider records created at or after this instant (RFC 3339 or YYYY-MM-DD).
    #[arg(long, value_parser = parse_since)]
    since: Option<DateTime<Utc>>,
    /// Restrict the run to these ids.
    #[arg(long, value_delimiter = ',')]
    ids: Vec<Uuid>,
    /// Date used for the number suffix: accepted, created or today.
    #[arg(long = "date-source", default_value = "accepted")]
    date_source: DateSource,
    /// Also number proposals missing a number.
    #[arg(long = "include-proposals")]
    include_proposals: bool,
    /// Leave existing snapshot order numbers untouched.
    #[arg(long = "no-reconcile")]
    no_reconcile: bool,
    #[arg(long = "order-prefix")]
    order_prefix: Option<String>,
    #[arg(long = "proposal-prefix")]
    proposal_prefix: Option<String>,
    /// Database connection URL. Falls back to `CABINET_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
}

impl CliArgs {
    fn options(&self) -> BackfillOptions {
        BackfillOptions {
            dry_run: !self.apply,
            max: self.max,
            since: self.since,
            ids: self.ids.clone(),
            date_source: self.date_source,
            reconcile: !self.no_reconcile,
            include_proposals: self.include_proposals,
        }
    }

    fn numbering(&self) -> NumberingConfig {
        let defaults = NumberingConfig::default();
        NumberingConfig {
            order_prefix: self.order_prefix.clone().unwrap_or(defaults.order_prefix),
            proposal_prefix: self
                .proposal_prefix
                .clone()
                .unwrap_or(defaults.proposal_prefix),
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = CliArgs::parse();
    let database_url = resolve_database_url(args.database_url.clone(), env::var(DATABASE_URL_ENV).ok())?;

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build backfill runtime")?;
    runtime.block_on(run(args, database_url))
}

async fn run(args: CliArgs, database_url: String) -> Result<()> {
    let pool = DbPool::new(PoolConfig::new(&database_url).with_max_size(2))
        .await
        .wrap_err("failed to create database pool")?;
    let service = OrderService::new(
        Arc::new(DieselOrderRepository::new(pool.clone())),
        Arc::new(DieselProposalRepository::new(pool)),
        Arc::new(DefaultClock),
    )
    .with_numbering(args.numbering());

    let report = service
        .backfill(&args.options())
        .await
        .wrap_err("backfill failed")?;
    let rendered =
        serde_json::to_string_pretty(&report).wrap_err("failed to render backfill report")?;
    println!("{rendered}");
    if report.failed > 0 {
        return Err(eyre!("{} record(s) could not be numbered", report.failed));
    }
    Ok(())
}

fn parse_since(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Ok(instant.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| format!("expected RFC 3339 or YYYY-MM-DD, got '{raw}'"))
}

fn resolve_database_url(explicit: Option<String>, from_env: Option<String>) -> Result<String> {
    explicit
        .or(from_env)
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| eyre!("database URL missing: set --database-url or {DATABASE_URL_ENV}"))
}
