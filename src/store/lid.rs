use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

use crate::constants::paths;

/// Laptop lid switch as seen by the preference store
pub trait LidSource {
    /// Whether the machine has a lid at all
    fn present(&self) -> bool;

    /// Whether the lid is open, only meaningful when present
    fn open(&self) -> bool;
}

/// Machines without a lid
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLid;

impl LidSource for NoLid {
    fn present(&self) -> bool {
        false
    }

    fn open(&self) -> bool {
        true
    }
}

/// Fixed lid state, for callers that learn it from elsewhere
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticLid {
    pub present: bool,
    pub open: bool,
}

impl LidSource for StaticLid {
    fn present(&self) -> bool {
        self.present
    }

    fn open(&self) -> bool {
        self.open
    }
}

/// ACPI button interface, one `<root>/<LID>/state` file per switch
#[derive(Debug, Clone)]
pub struct AcpiLid {
    root: PathBuf,
}

impl AcpiLid {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Contents of the first switch state file found
    fn state(&self) -> Option<String> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(path = %self.root.display(), error = %e, "No ACPI lid interface");
                return None;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path().join("state");
            match fs::read_to_string(&path) {
                Ok(contents) => return Some(contents),
                Err(e) => debug!(path = %path.display(), error = %e, "Skipping lid entry"),
            }
        }
        None
    }
}

impl Default for AcpiLid {
    fn default() -> Self {
        Self::new(paths::ACPI_LID_ROOT)
    }
}

impl LidSource for AcpiLid {
    fn present(&self) -> bool {
        self.state().is_some()
    }

    fn open(&self) -> bool {
        // "state:      open" or "state:      closed"
        match self.state() {
            Some(contents) => match contents.split_whitespace().last() {
                Some("open") => true,
                Some("closed") => false,
                other => {
                    warn!(state = ?other, "Unrecognized lid state, assuming open");
                    true
                }
            },
            None => true,
        }
    }
}
