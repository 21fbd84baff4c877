//! Logging, session ids and stage timings for droidconf
//!
//! - Structured logging with tracing
//! - A per-process session id for correlating log lines
//! - Stage timers recorded into an in-process registry

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

/// Global stage-timing registry
static TIMINGS: Lazy<TimingRegistry> = Lazy::new(TimingRegistry::new);

/// Global session ID for correlating logs
static SESSION_ID: Lazy<String> = Lazy::new(|| Uuid::new_v4().to_string());

/// Initialize logging with defaults
pub fn init() -> anyhow::Result<()> {
    init_with_config(TelemetryConfig::default())
}

/// Initialize with custom configuration
///
/// `RUST_LOG` takes precedence over `config.log_level`.
pub fn init_with_config(config: TelemetryConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // Logs go to stderr; stdout carries command output.
    let result = if config.json {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(config.show_target)
                .with_file(config.show_file)
                .with_line_number(config.show_line_number),
        );
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = tracing_subscriber::registry().with(filter).with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(config.show_target)
                .with_file(config.show_file)
                .with_line_number(config.show_line_number)
                .compact(),
        );
        tracing::subscriber::set_global_default(subscriber)
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    tracing::debug!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        "Telemetry initialized"
    );

    Ok(())
}

/// Get the current session ID
pub fn session_id() -> &'static str {
    &SESSION_ID
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub show_target: bool,
    pub show_file: bool,
    pub show_line_number: bool,
    /// Emit JSON lines instead of compact text
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            show_target: false,
            show_file: false,
            show_line_number: false,
            json: false,
        }
    }
}

impl TelemetryConfig {
    /// Map a `-v` count to a log level
    pub fn with_verbosity(mut self, verbose: u8, quiet: bool) -> Self {
        self.log_level = match (quiet, verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, 2) => "debug",
            (false, _) => "trace",
        }
        .to_string();
        self.show_target = verbose >= 2;
        self
    }
}

/// Aggregated durations for one stage
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StageStats {
    pub count: u64,
    pub total_ms: f64,
    pub max_ms: f64,
}

impl StageStats {
    fn record(&mut self, ms: f64) {
        self.count += 1;
        self.total_ms += ms;
        self.max_ms = self.max_ms.max(ms);
    }

    pub fn mean_ms(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total_ms / self.count as f64
        }
    }
}

/// Registry of stage timings
pub struct TimingRegistry {
    stages: RwLock<BTreeMap<String, StageStats>>,
    start_time: Instant,
}

impl TimingRegistry {
    fn new() -> Self {
        Self {
            stages: RwLock::new(BTreeMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record one duration for `stage`
    pub fn record(&self, stage: &str, duration: Duration) {
        let mut stages = self.stages.write().unwrap_or_else(PoisonError::into_inner);
        stages
            .entry(stage.to_string())
            .or_default()
            .record(duration.as_secs_f64() * 1000.0);
    }

    pub fn stage(&self, stage: &str) -> Option<StageStats> {
        let stages = self.stages.read().unwrap_or_else(PoisonError::into_inner);
        stages.get(stage).cloned()
    }

    /// Get uptime in milliseconds
    pub fn uptime_ms(&self) -> u128 {
        self.start_time.elapsed().as_millis()
    }

    /// Export timings as JSON
    pub fn export_json(&self) -> serde_json::Value {
        let stages = self.stages.read().unwrap_or_else(PoisonError::into_inner);
        serde_json::json!({
            "session_id": session_id(),
            "uptime_ms": self.uptime_ms(),
            "stages": *stages,
        })
    }
}

/// Get the global timing registry
pub fn timings() -> &'static TimingRegistry {
    &TIMINGS
}

/// Timer for measuring a stage
///
/// The duration is recorded once, on [`Timer::stop`] or on drop.
pub struct Timer {
    name: String,
    start: Instant,
    stopped: bool,
}

impl Timer {
    /// Start a new timer
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            start: Instant::now(),
            stopped: false,
        }
    }

    /// Stop the timer and record the duration
    pub fn stop(mut self) -> Duration {
        self.stopped = true;
        let duration = self.start.elapsed();
        timings().record(&self.name, duration);
        tracing::debug!(
            stage = %self.name,
            duration_us = duration.as_micros() as u64,
            "Stage completed"
        );
        duration
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if !self.stopped {
            timings().record(&self.name, self.start.elapsed());
        }
    }
}

/// Enter a span and time it until the end of the enclosing scope
#[macro_export]
macro_rules! timed_span {
    ($name:expr) => {
        let _timer = $crate::Timer::start($name);
        let _span = tracing::debug_span!($name).entered();
    };
    ($name:expr, $($field:tt)*) => {
        let _timer = $crate::Timer::start($name);
        let _span = tracing::debug_span!($name, $($field)*).entered();
    };
}
