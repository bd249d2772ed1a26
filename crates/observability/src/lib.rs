use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::OnceCell;
use serde::Serialize;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: OnceCell<()> = OnceCell::new();

pub const LOG_FILE_PREFIX: &str = "chatbot";

#[derive(Debug, Default)]
pub struct AppMetrics {
    requests_total: AtomicU64,
    rejected_total: AtomicU64,
    failures_total: AtomicU64,
    classifier_fallbacks_total: AtomicU64,
    generic_responses_total: AtomicU64,
    total_latency_micros: AtomicU64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub rejected_total: u64,
    pub failures_total: u64,
    pub classifier_fallbacks_total: u64,
    pub generic_responses_total: u64,
    pub avg_latency_millis: f64,
}

impl AppMetrics {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn inc_request(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Requests turned away before reaching the responder.
    pub fn inc_rejected(&self) {
        self.rejected_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_failure(&self) {
        self.failures_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_classifier_fallback(&self) {
        self.classifier_fallbacks_total
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_generic_response(&self) {
        self.generic_responses_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn observe_latency(&self, duration: Duration) {
        self.total_latency_micros
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let requests = self.requests_total.load(Ordering::Relaxed);
        let latency = self.total_latency_micros.load(Ordering::Relaxed);

        MetricsSnapshot {
            requests_total: requests,
            rejected_total: self.rejected_total.load(Ordering::Relaxed),
            failures_total: self.failures_total.load(Ordering::Relaxed),
            classifier_fallbacks_total: self.classifier_fallbacks_total.load(Ordering::Relaxed),
            generic_responses_total: self.generic_responses_total.load(Ordering::Relaxed),
            avg_latency_millis: if requests == 0 {
                0.0
            } else {
                latency as f64 / requests as f64 / 1000.0
            },
        }
    }
}

/// Daily-rotated append-only log file, `<dir>/chatbot.YYYY-MM-DD.log`.
pub fn daily_log_appender(log_dir: &Path) -> std::io::Result<RollingFileAppender> {
    std::fs::create_dir_all(log_dir)?;
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix("log")
        .build(log_dir)
        .map_err(std::io::Error::other)
}

/// JSON events on stdout, plus plain timestamped lines in a daily file when
/// `log_dir` is given. Only the first call installs a subscriber.
pub fn init_tracing(service_name: &str, log_dir: Option<&Path>) {
    TRACING_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}=info,relief_api=info,relief_agents=info,relief_ml=info,relief_core=info,tower_http=info",
                service_name
            ))
        });

        let file_layer = log_dir.and_then(|dir| match daily_log_appender(dir) {
            Ok(appender) => Some(fmt::layer().with_ansi(false).with_writer(appender)),
            Err(err) => {
                eprintln!("log file disabled, cannot open {}: {err}", dir.display());
                None
            }
        });

        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .with(file_layer)
            .init();
    });
}
