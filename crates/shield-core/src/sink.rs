//! Dashboard publication (spec §4.5 [DASHBOARD SINK], §9 redesign note:
//! "replace the RabbitMQ/pika dependency with a plain HTTP push"), grounded
//! in `original_source/cybertop/cybertop.py::start`/`process_IN_CREATE`,
//! which connects once with bounded reconnect attempts and a fixed retry
//! delay, then appends every published message to a dump file too.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;
use shield_policy::{HsplSet, MsplSet};
use tracing::{info, warn};

use crate::error::{Result, ShieldError};

#[derive(Debug, Clone, Serialize)]
struct DashboardPayload<'a> {
    hspl_set: Option<&'a HsplSet>,
    mspl_set: Option<&'a MsplSet>,
}

/// What to include in a publication (spec §6 `dashboardContent`).
#[derive(Debug, Clone, Copy)]
pub enum DashboardContent<'a> {
    Hspl(&'a HsplSet),
    Mspl(&'a MsplSet),
    Both(&'a HsplSet, &'a MsplSet),
}

impl<'a> DashboardContent<'a> {
    fn payload(self) -> DashboardPayload<'a> {
        match self {
            DashboardContent::Hspl(hspl) => DashboardPayload {
                hspl_set: Some(hspl),
                mspl_set: None,
            },
            DashboardContent::Mspl(mspl) => DashboardPayload {
                hspl_set: None,
                mspl_set: Some(mspl),
            },
            DashboardContent::Both(hspl, mspl) => DashboardPayload {
                hspl_set: Some(hspl),
                mspl_set: Some(mspl),
            },
        }
    }
}

pub trait DashboardSink: Send + Sync {
    fn publish(&self, content: DashboardContent<'_>) -> Result<()>;
}

/// Appends a JSON line per publication to a dump file (spec §6
/// `dashboardFile`), the direct counterpart of the original's
/// `open(dashboardFile, "a")` append.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DashboardSink for FileSink {
    fn publish(&self, content: DashboardContent<'_>) -> Result<()> {
        let line = serde_json::to_string(&content.payload()).map_err(|err| ShieldError::Parse(err.to_string()))?;
        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

/// Pushes each publication to an HTTP endpoint, replacing the original's
/// RabbitMQ queue publish (spec §9). Retries up to `attempts` times with a
/// fixed `retry_delay` between attempts (spec §6 `dashboardAttempts`/
/// `dashboardRetryDelay`), matching the original's bounded reconnect.
pub struct HttpSink {
    client: reqwest::blocking::Client,
    url: String,
    attempts: u32,
    retry_delay: Duration,
}

impl HttpSink {
    pub fn new(url: impl Into<String>, attempts: u32, retry_delay: Duration) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            url: url.into(),
            attempts: attempts.max(1),
            retry_delay,
        }
    }
}

impl DashboardSink for HttpSink {
    fn publish(&self, content: DashboardContent<'_>) -> Result<()> {
        let payload = content.payload();
        let mut last_error = None;

        for attempt in 1..=self.attempts {
            match self.client.post(&self.url).json(&payload).send() {
                Ok(response) if response.status().is_success() => {
                    info!(url = %self.url, attempt, "published to dashboard");
                    return Ok(());
                }
                Ok(response) => {
                    last_error = Some(format!("dashboard returned {}", response.status()));
                }
                Err(err) => {
                    last_error = Some(err.to_string());
                }
            }
            warn!(attempt, attempts = self.attempts, "dashboard publish failed, retrying");
            if attempt < self.attempts {
                std::thread::sleep(self.retry_delay);
            }
        }

        Err(ShieldError::Transport(
            last_error.unwrap_or_else(|| "dashboard publish exhausted retries".to_string()),
        ))
    }
}

/// Publishes to every configured sink, matching the original's
/// simultaneous RabbitMQ-publish-plus-file-append behavior. A failure in
/// one sink does not prevent the others from being attempted.
pub struct FanOutSink {
    sinks: Vec<Box<dyn DashboardSink>>,
}

impl FanOutSink {
    pub fn new(sinks: Vec<Box<dyn DashboardSink>>) -> Self {
        Self { sinks }
    }
}

impl DashboardSink for FanOutSink {
    fn publish(&self, content: DashboardContent<'_>) -> Result<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(err) = sink.publish(content) {
                warn!(error = %err, "a dashboard sink failed to publish");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

pub fn path_exists(path: &Path) -> bool {
    path.exists()
}
