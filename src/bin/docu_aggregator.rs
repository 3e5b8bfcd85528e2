//! Documentation Aggregator Binary
//!
//! Aggregates one build of a documentation directory in place.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DOCU_DATA_DIR`: documentation root directory (required)
//! - `DOCU_BRANCH`: branch name (required)
//! - `DOCU_BUILD`: build name (required)
//! - `DOCU_FORCE`: "true" recomputes even if the derived data is current (default: false)
//! - `DOCU_MALFORMED_POLICY`: "abort" or "skip" (default: abort)
//! - `RUST_LOG`: Log level filter (default: info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! DOCU_DATA_DIR=./docu DOCU_BRANCH=develop DOCU_BUILD=nightly cargo run --bin docu_aggregator
//! ```

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use docu_aggregator::{
    AggregatorConfig, BuildKey, DocuAggregator, FileDerivedStore, FileRawStore,
    MalformedScenarioPolicy,
};

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "docu_aggregator=info".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_span_events(FmtSpan::CLOSE)
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true)
            )
            .init();
    }
}

fn required_env(name: &str) -> Result<String, String> {
    std::env::var(name).map_err(|_| format!("{name} must be set"))
}

fn main() -> ExitCode {
    init_tracing();

    let settings = (|| -> Result<(String, BuildKey, bool, AggregatorConfig), String> {
        let data_dir = required_env("DOCU_DATA_DIR")?;
        let build = BuildKey::new(required_env("DOCU_BRANCH")?, required_env("DOCU_BUILD")?);
        let force = std::env::var("DOCU_FORCE")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let mut config = AggregatorConfig::default();
        if let Ok(policy) = std::env::var("DOCU_MALFORMED_POLICY") {
            let policy = MalformedScenarioPolicy::from_str(&policy)
                .ok_or_else(|| format!("unknown DOCU_MALFORMED_POLICY: {policy}"))?;
            config = config.with_malformed_scenario_policy(policy);
        }
        Ok((data_dir, build, force, config))
    })();

    let (data_dir, build, force, config) = match settings {
        Ok(settings) => settings,
        Err(message) => {
            error!(error = %message, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    let raw = Arc::new(FileRawStore::new(&data_dir));
    let derived = Arc::new(FileDerivedStore::new(&data_dir));
    let aggregator = DocuAggregator::with_config(raw, derived, config);

    info!(
        data_dir = %data_dir,
        branch = %build.branch,
        build = %build.build,
        force = force,
        version = %aggregator.config().file_format_version,
        policy = ?aggregator.config().malformed_scenario_policy,
        "starting documentation aggregation"
    );

    let start = Instant::now();
    let result = if force {
        aggregator.calculate_aggregated_data_for_build(&build).map(Some)
    } else {
        aggregator.aggregate_if_outdated(&build)
    };

    match result {
        Ok(Some(report)) => {
            info!(
                scenarios = report.scenarios,
                steps = report.steps,
                skipped = report.skipped.len(),
                latency_ms = start.elapsed().as_millis() as u64,
                "build aggregated"
            );
            ExitCode::SUCCESS
        }
        Ok(None) => {
            info!("aggregated data is current, nothing to do");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "aggregation failed");
            ExitCode::FAILURE
        }
    }
}
