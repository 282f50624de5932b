//! Per-run timing log.
//!
//! One CSV file per run named `<tag>_<unix-millis>.csv`. The file is created
//! empty when the run starts and gets `,<elapsed-ms>` appended when it ends.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

#[derive(Debug)]
pub struct TimingLog {
    path: PathBuf,
}

impl TimingLog {
    /// Create the log file in `dir`, creating the directory if needed.
    pub fn create(dir: impl AsRef<Path>, tag: &str) -> io::Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let path = dir.join(format!("{tag}_{millis}.csv"));
        File::create(&path)?;

        log::debug!("Timing log at {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the elapsed wall-clock time in milliseconds.
    pub fn record(&self, elapsed: Duration) -> io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        write!(file, ",{}", elapsed.as_millis())
    }
}
