//! # bodyscaled — body-composition scale daemon
//!
//! Composition root that wires all adapters together and runs the
//! measurement loop for one scale.
//!
//! ## Responsibilities
//! - Parse the command line and configuration (env vars, config file)
//! - Install the `tracing` subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the BLE scanner, the profile store and the measurement storage
//! - Restore the last accepted measurement and run the orchestrator
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//! - Serve the manual review commands (`unassigned`, `reassign`)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod cli;
mod config;

use bodyscale_adapter_ble::BleFrameSource;
use bodyscale_adapter_profiles_json::JsonProfileRepository;
use bodyscale_adapter_storage_sqlite_sqlx::{
    Config as StorageConfig, Database, SqliteMeasurementRepository,
};
use bodyscale_app::orchestrator::MeasurementOrchestrator;
use bodyscale_app::services::measurement_service::MeasurementService;
use bodyscale_domain::id::{MeasurementId, ProfileId};
use bodyscale_domain::metrics::MetricsRecord;
use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_logging(&config.logging.filter);

    // Storage
    let db = StorageConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await?;

    // Profiles
    let profiles = JsonProfileRepository::new(&config.profiles.path);
    tracing::info!(path = %profiles.path().display(), "profile store");

    let result = match cli.command() {
        Command::Run => run(&config, &db, profiles).await,
        Command::Unassigned => unassigned(&db, profiles).await,
        Command::Reassign {
            measurement,
            profile,
        } => reassign(&db, profiles, measurement, profile).await,
    };
    db.close().await;
    result
}

async fn run(
    config: &Config,
    db: &Database,
    profiles: JsonProfileRepository,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = config.pipeline_config()?;
    let measurements = SqliteMeasurementRepository::new(db.pool().clone());

    // Scanner
    let source = BleFrameSource::new(config.ble.clone());

    let mut orchestrator = MeasurementOrchestrator::new(source, profiles, measurements, pipeline);
    orchestrator.restore_session().await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    orchestrator.run(shutdown_rx).await?;
    Ok(())
}

async fn unassigned(
    db: &Database,
    profiles: JsonProfileRepository,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = review_service(db, profiles);
    let records = service.list_unassigned().await?;
    if records.is_empty() {
        println!("no unassigned measurements");
    }
    for record in &records {
        println!("{}", summary(record));
    }
    Ok(())
}

async fn reassign(
    db: &Database,
    profiles: JsonProfileRepository,
    measurement: MeasurementId,
    profile: ProfileId,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = review_service(db, profiles);
    let record = service.reassign(measurement, profile).await?;
    println!("{}", summary(&record));
    Ok(())
}

fn review_service(
    db: &Database,
    profiles: JsonProfileRepository,
) -> MeasurementService<SqliteMeasurementRepository, JsonProfileRepository> {
    MeasurementService::new(SqliteMeasurementRepository::new(db.pool().clone()), profiles)
}

/// One line per record: id, time, weight, impedance and main metrics.
fn summary(record: &MetricsRecord) -> String {
    let user = record
        .attributed_user
        .map_or_else(|| "unknown".to_string(), |id| id.to_string());
    format!(
        "{id}  {time}  {weight:.2} kg  {impedance:.0} ohm  fat {fat:.1}%  bmi {bmi:.1}  user {user}",
        id = record.id,
        time = record.timestamp.to_rfc3339(),
        weight = record.weight,
        impedance = record.impedance,
        fat = record.fat_percentage,
        bmi = record.bmi,
    )
}

fn init_logging(filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve on SIGINT, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use bodyscale_domain::attribution::Attribution;
    use bodyscale_domain::composition::{BodyParameters, compute};
    use bodyscale_domain::measurement::ValidatedMeasurement;
    use bodyscale_domain::profile::Sex;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn record(attribution: Attribution) -> MetricsRecord {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 7, 30, 0).unwrap();
        let measurement = ValidatedMeasurement::new(72.4, 520.0, at).unwrap();
        let body = BodyParameters {
            height_cm: 180.0,
            age_years: 30,
            sex: Sex::Male,
        };
        let composition = compute(72.4, 520.0, body).unwrap();
        MetricsRecord::new(&measurement, &composition, attribution)
    }

    #[test]
    fn should_summarize_unassigned_record_on_one_line() {
        let record = record(Attribution::Unknown);
        let line = summary(&record);

        assert!(line.starts_with(&record.id.to_string()));
        assert!(line.contains("2024-03-15T07:30:00+00:00"));
        assert!(line.contains("72.40 kg"));
        assert!(line.contains("520 ohm"));
        assert!(line.ends_with("user unknown"));
        assert!(!line.contains('\n'));
    }

    #[test]
    fn should_summarize_attributed_record_with_profile_id() {
        let profile = ProfileId::new();
        let line = summary(&record(Attribution::Profile(profile)));
        assert!(line.ends_with(&format!("user {profile}")));
    }
}
