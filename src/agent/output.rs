use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Files an agent publishes for the web pages.
#[derive(Debug, Clone)]
pub struct Output {
    snapshot: PathBuf,
    relay: Option<PathBuf>, // raw copy of the source response
}

impl Output {
    pub fn new(snapshot: PathBuf, relay: Option<PathBuf>) -> Self {
        Self { snapshot, relay }
    }

    pub fn snapshot(&self) -> &Path {
        &self.snapshot
    }

    pub fn write(&self, snapshot: &str, raw: Option<&str>) -> Result<()> {
        fs::write(&self.snapshot, snapshot)
            .with_context(|| format!("write output file {}", self.snapshot.display()))?;
        debug!("writing output data file: {} bytes", snapshot.len());
        if let (Some(path), Some(raw)) = (&self.relay, raw) {
            fs::write(path, raw).with_context(|| format!("write output file {}", path.display()))?;
            debug!("write relay data file: {} bytes", raw.len());
        }
        Ok(())
    }

    /// Tells downstream clients there is no fresh data.
    pub fn remove(&self) {
        let files = std::iter::once(&self.snapshot).chain(self.relay.iter());
        for path in files {
            match fs::remove_file(path) {
                Ok(()) => debug!("removed {}", path.display()),
                Err(e) if e.kind() == ErrorKind::NotFound => (),
                Err(e) => warn!("removing {}: {}", path.display(), e),
            }
        }
    }
}
