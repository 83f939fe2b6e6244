//! Mark `Active` rentals past their due date as `Overdue`.
//!
//! Runs one reconciliation pass against PostgreSQL and exits, or repeats on a
//! fixed interval until interrupted. Lending settings come from `LENDING_*`
//! environment variables; the flags below only control the run itself.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr, eyre};
use lending::config::LendingSettings;
use lending::domain::OverdueReconciler;
use lending::domain::ports::{OverdueReconciliation, ReconcileReport};
use lending::outbound::persistence::{
    DbPool, DieselRentalRepository, PoolConfig, run_pending_migrations,
};
use mockable::{Clock, DefaultClock};
use ortho_config::OrthoConfig;
use tokio::runtime::Builder;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `reconcile-overdue` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "reconcile-overdue",
    about = "Move rentals past their due date to the overdue state",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `LENDING_DATABASE_URL`.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
    /// Repeat every this many seconds instead of running once.
    #[arg(long = "interval-secs", value_name = "seconds", value_parser = clap::value_parser!(u64).range(1..))]
    interval_secs: Option<u64>,
    /// Apply pending schema migrations before reconciling.
    #[arg(long)]
    migrate: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let settings = LendingSettings::load_from_iter([OsString::from("reconcile-overdue")])
        .map_err(|err| eyre!("load lending settings: {err}"))?;

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .wrap_err("create Tokio runtime")?;
    runtime.block_on(run(args, settings))
}

fn resolve_database_url(args: &CliArgs, settings: &LendingSettings) -> Result<String> {
    args.database_url
        .clone()
        .or_else(|| settings.database_url().map(str::to_owned))
        .ok_or_else(|| eyre!("no database URL: pass --database-url or set LENDING_DATABASE_URL"))
}

async fn run(args: CliArgs, settings: LendingSettings) -> Result<()> {
    let database_url = resolve_database_url(&args, &settings)?;
    if args.migrate {
        run_pending_migrations(&database_url).await?;
    }

    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .wrap_err("create database pool")?;
    let reconciler = OverdueReconciler::new(Arc::new(DieselRentalRepository::new(pool)))
        .with_batch_size(settings.reconcile_batch_size())
        .with_retry(settings.retry_policy());
    let clock = DefaultClock;

    let Some(interval_secs) = args.interval_secs else {
        let report = reconciler.reconcile(clock.utc()).await?;
        log_report(&report);
        return Ok(());
    };

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match reconciler.reconcile(clock.utc()).await {
                    Ok(report) => log_report(&report),
                    Err(err) => error!(error = %err, "reconciliation run failed"),
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.wrap_err("listen for shutdown signal")?;
                info!("shutdown requested");
                return Ok(());
            }
        }
    }
}

fn log_report(report: &ReconcileReport) {
    if !report.contended.is_empty() {
        warn!(
            contended = report.contended.len(),
            "some rentals were left for the next run"
        );
    }
    info!(
        scanned = report.scanned,
        newly_overdue = report.newly_overdue.len(),
        "reconciliation run complete"
    );
}
