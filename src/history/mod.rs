//! Learned check timings.
//!
//! Each check name maps to a [`TimingRecord`] updated with an exponential
//! moving average, so the progress bars pace themselves against how long a
//! check usually takes on this machine. The map is persisted as JSON in the
//! per-application cache directory; a missing or corrupt file silently
//! yields an empty history and a failed save is a logged no-op. Nothing in
//! this module ever returns an error to its caller.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Weight of the newest sample in the moving average.
const SMOOTHING: f64 = 0.3;

/// Expectation for a check that has never run and has no built-in default.
const FALLBACK_EXPECTATION: Duration = Duration::from_secs(10);

/// Persisted timing state for one check name.
///
/// `avg_duration` is zero only before the first sample; once `run_count >= 1`
/// it holds the learned average.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TimingRecord {
    /// Duration of the most recent run.
    #[serde(default)]
    pub last_duration: Duration,
    /// Exponentially smoothed average duration.
    #[serde(default)]
    pub avg_duration: Duration,
    /// Number of samples recorded.
    #[serde(default)]
    pub run_count: u64,
}

#[derive(Debug, Error)]
enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Thread-safe map of check name to learned timing.
///
/// All access goes through a read/write lock so a concurrent animation
/// reader and an executor writer never race.
#[derive(Debug)]
pub struct TimingHistory {
    records: RwLock<HashMap<String, TimingRecord>>,
    path: PathBuf,
}

impl TimingHistory {
    /// Load from the default cache location, or start empty.
    pub fn load() -> Self {
        Self::load_from(default_path())
    }

    /// Load from an explicit file path, or start empty.
    pub fn load_from(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match try_load(&path) {
            Ok(records) => records,
            Err(err) => {
                debug!(path = %path.display(), %err, "no usable timing history, starting empty");
                HashMap::new()
            }
        };
        Self {
            records: RwLock::new(records),
            path,
        }
    }

    /// How long the named check is expected to take.
    ///
    /// Prefers the learned average once at least one sample exists, then a
    /// built-in default for well-known check names, then a generic fallback.
    pub fn expected_duration(&self, name: &str) -> Duration {
        if let Ok(records) = self.records.read()
            && let Some(record) = records.get(name)
            && record.run_count >= 1
        {
            return record.avg_duration;
        }
        builtin_expectation(name).unwrap_or(FALLBACK_EXPECTATION)
    }

    /// Fold a fresh sample into the named record.
    pub fn record_duration(&self, name: &str, duration: Duration) {
        let Ok(mut records) = self.records.write() else {
            return;
        };
        let entry = records.entry(name.to_string()).or_default();
        if entry.run_count == 0 {
            entry.last_duration = duration;
            entry.avg_duration = duration;
            entry.run_count = 1;
        } else {
            entry.last_duration = duration;
            entry.run_count += 1;
            let avg = SMOOTHING * duration.as_secs_f64()
                + (1.0 - SMOOTHING) * entry.avg_duration.as_secs_f64();
            entry.avg_duration = Duration::from_secs_f64(avg);
        }
    }

    /// Snapshot of the record for one check, if any samples exist.
    pub fn record(&self, name: &str) -> Option<TimingRecord> {
        self.records.read().ok()?.get(name).cloned()
    }

    /// Best-effort persist of the full record map. Failures are logged and
    /// swallowed.
    pub fn save(&self) {
        if let Err(err) = self.try_save() {
            debug!(path = %self.path.display(), %err, "failed to persist timing history");
        }
    }

    fn try_save(&self) -> Result<(), StoreError> {
        let Ok(records) = self.records.read() else {
            return Ok(());
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(&*records)?;
        let mut file = open_restricted(&self.path)?;
        file.write_all(&data)?;
        Ok(())
    }
}

#[cfg(unix)]
fn open_restricted(path: &Path) -> std::io::Result<std::fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_restricted(path: &Path) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

fn try_load(path: &Path) -> Result<HashMap<String, TimingRecord>, StoreError> {
    let data = std::fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

fn default_path() -> PathBuf {
    if let Ok(dir) = std::env::var("VET_CACHE_DIR") {
        return PathBuf::from(dir).join("timings.json");
    }
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("vet")
        .join("timings.json")
}

/// Static expectations for checks that have never produced a sample.
fn builtin_expectation(name: &str) -> Option<Duration> {
    let secs = match name {
        "format" => 2,
        "lint" => 15,
        "test" => 30,
        "coverage" => 45,
        "deps" => 5,
        "vulncheck" => 12,
        "shellcheck" => 3,
        _ => return None,
    };
    Some(Duration::from_secs(secs))
}
