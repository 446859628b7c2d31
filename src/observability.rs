//! Logging setup and batch outcome counters

use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter directive for the given verbosity flags; `--debug` beats `--quiet`
pub fn default_directive(quiet: bool, debug: bool) -> &'static str {
    if debug {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    }
}

/// Install the stderr subscriber; `RUST_LOG` wins over the flags when set
pub fn init(quiet: bool, debug: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(quiet, debug)));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(debug),
        )
        .with(filter)
        .try_init();
}

/// Per-URL outcome counters for one batch
#[derive(Debug, Default)]
pub struct BatchStats {
    succeeded: AtomicU64,
    failed: AtomicU64,
    parts_skipped: AtomicU64,
}

impl BatchStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url_succeeded(&self) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "urls_succeeded", "Metric incremented");
    }

    pub fn url_failed(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "urls_failed", "Metric incremented");
    }

    pub fn parts_skipped(&self, count: usize) {
        self.parts_skipped.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> BatchSnapshot {
        BatchSnapshot {
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            parts_skipped: self.parts_skipped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSnapshot {
    pub succeeded: u64,
    pub failed: u64,
    pub parts_skipped: u64,
}

impl BatchSnapshot {
    /// 0 when every URL succeeded, 1 when none did, 2 for a mix
    pub fn exit_code(&self) -> u8 {
        match (self.succeeded, self.failed) {
            (_, 0) => 0,
            (0, _) => 1,
            _ => 2,
        }
    }
}
