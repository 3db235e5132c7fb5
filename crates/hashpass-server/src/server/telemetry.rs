//! # Logging and Metrics
//!
//! Logs always go through `tracing_subscriber::fmt`. By default they are
//! pretty-printed to stderr; with `--logfile` they are appended, without ANSI
//! colors, to the given file instead. File writes happen on a dedicated
//! `tracing-appender` thread, and [`TelemetryProviders::shutdown`] flushes it.
//!
//! ## Feature matrix
//!
//! - `metrics`: Enables OpenTelemetry metrics (counters and a histogram for
//!   submissions).
//! - `stdout`: Periodically prints collected metrics to stdout.
//!
//! ## Feature constraints
//!
//! - `stdout` requires `metrics`.
//!
//! ## Example usage
//!
//! ```bash
//! cargo run --features metrics,stdout -- --port 8080
//! ```
//!
//! Without `metrics`, every helper in this module compiles to a no-op.

// Disallow using `stdout` without `metrics`
#[cfg(all(feature = "stdout", not(feature = "metrics")))]
compile_error!("The 'stdout' feature requires the 'metrics' feature to be enabled.");

use anyhow::Context;
use std::{fs::OpenOptions, path::Path};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "metrics")]
use opentelemetry::{
    InstrumentationScope, KeyValue,
    metrics::{Counter, Histogram, Meter},
};
#[cfg(feature = "metrics")]
use opentelemetry_sdk::{Resource, metrics as sdkmetrics};
#[cfg(feature = "metrics")]
use opentelemetry_semantic_conventions as semvcns;
#[cfg(feature = "metrics")]
use std::sync::OnceLock;

pub struct TelemetryProviders {
    /// Flushes buffered log lines to `--logfile` when dropped.
    log_guard: Option<WorkerGuard>,
    #[cfg(feature = "metrics")]
    pub meter_provider: sdkmetrics::SdkMeterProvider,
}

impl TelemetryProviders {
    /// Flushes and shuts down any exporters and the log file writer. Errors
    /// are reported on stderr since logging may already be gone.
    pub fn shutdown(self) {
        #[cfg(feature = "metrics")]
        {
            if let Err(err) = self.meter_provider.force_flush() {
                eprintln!("Error flushing metrics: {:#?}", err);
            }
            if let Err(err) = self.meter_provider.shutdown() {
                eprintln!("Error shutting down meter: {:#?}", err);
            }
        }
        drop(self.log_guard);
    }
}

pub fn init_telemetry(logfile: Option<&Path>) -> anyhow::Result<TelemetryProviders> {
    #[cfg(feature = "metrics")]
    let meter_provider = init_metrics();

    let (stderr_layer, file_layer, log_guard) = match logfile {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file `{}`", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .with_writer(writer);
            (None, Some(layer), Some(guard))
        }
        None => {
            let layer = fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .pretty();
            (Some(layer), None, None)
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    #[cfg(feature = "metrics")]
    {
        opentelemetry::global::set_meter_provider(meter_provider.clone());
        let scope = InstrumentationScope::builder("hashpass")
            .with_version(env!("CARGO_PKG_VERSION"))
            .with_schema_url(semvcns::SCHEMA_URL)
            .build();
        init_metric_handles(opentelemetry::global::meter_with_scope(scope));
    }

    Ok(TelemetryProviders {
        log_guard,
        #[cfg(feature = "metrics")]
        meter_provider,
    })
}

#[cfg(feature = "metrics")]
fn resource() -> Resource {
    Resource::builder()
        .with_service_name("hashpass")
        .with_schema_url(
            [KeyValue::new(
                semvcns::resource::SERVICE_VERSION,
                env!("CARGO_PKG_VERSION"),
            )],
            semvcns::SCHEMA_URL,
        )
        .build()
}

#[cfg(feature = "metrics")]
fn init_metrics() -> sdkmetrics::SdkMeterProvider {
    let builder = sdkmetrics::SdkMeterProvider::builder().with_resource(resource());

    #[cfg(feature = "stdout")]
    let builder = {
        use opentelemetry_stdout::MetricExporter;
        let exporter = MetricExporter::default();
        let reader = sdkmetrics::PeriodicReader::builder(exporter)
            .with_interval(std::time::Duration::from_secs(5))
            .build();

        builder.with_reader(reader)
    };

    builder.build()
}

#[cfg(feature = "metrics")]
static SUBMISSIONS: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static REJECTIONS: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static RESULTS_DELIVERED: OnceLock<Counter<u64>> = OnceLock::new();
#[cfg(feature = "metrics")]
static SUBMIT_DURATION_US: OnceLock<Histogram<f64>> = OnceLock::new();

#[cfg(feature = "metrics")]
fn init_metric_handles(meter: Meter) {
    let _ = SUBMISSIONS.set(
        meter
            .u64_counter("submissions")
            .with_description("Accepted hash submissions")
            .build(),
    );

    let _ = REJECTIONS.set(
        meter
            .u64_counter("rejections")
            .with_description("Rejected hash submissions")
            .build(),
    );

    let _ = RESULTS_DELIVERED.set(
        meter
            .u64_counter("results_delivered")
            .with_description("Digests handed back to clients")
            .build(),
    );

    let _ = SUBMIT_DURATION_US.set(
        meter
            .f64_histogram("submit_duration")
            .with_unit("us")
            .with_description("Time spent handling a hash submission")
            .build(),
    );
}

#[cfg(feature = "metrics")]
pub fn increment_submissions() {
    if let Some(counter) = SUBMISSIONS.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_submissions() {}

#[cfg(feature = "metrics")]
pub fn increment_rejections(reason: &'static str) {
    if let Some(counter) = REJECTIONS.get() {
        counter.add(1, &[KeyValue::new("reason", reason)]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_rejections(_reason: &'static str) {}

#[cfg(feature = "metrics")]
pub fn increment_results_delivered() {
    if let Some(counter) = RESULTS_DELIVERED.get() {
        counter.add(1, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn increment_results_delivered() {}

#[cfg(feature = "metrics")]
pub fn record_submit_duration(duration_us: f64) {
    if let Some(histogram) = SUBMIT_DURATION_US.get() {
        histogram.record(duration_us, &[]);
    }
}

#[cfg(not(feature = "metrics"))]
pub fn record_submit_duration(_duration_us: f64) {}
