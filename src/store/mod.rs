//! Preference store
//!
//! - **document**: one JSON object backed by one file
//! - **fields**: the table of persisted per-output fields
//! - **output_filer**: Individual documents keyed by output hash
//! - **filer**: Global document of one output combination
//! - **controller**: binds a Filer to the current config, lid handling
//! - **lid**: laptop lid sensing

pub mod controller;
pub mod document;
pub mod fields;
pub mod filer;
pub mod lid;
pub mod output_filer;

pub use controller::FilerController;
pub use filer::{Filer, ReadReport};
pub use lid::{AcpiLid, LidSource, NoLid, StaticLid};

use std::path::{Path, PathBuf};

use crate::constants::{config, paths};

/// Locations of every control document under one root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    root: PathBuf,
}

impl StorePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Per-user data directory, None when the platform has none
    pub fn default_root() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join(config::APP_DIR))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn control(&self) -> PathBuf {
        self.root.join(paths::CONTROL_DIR)
    }

    pub fn global_document(&self, config_hash: &str) -> PathBuf {
        self.control()
            .join(paths::CONFIGS_DIR)
            .join(format!("{}.{}", config_hash, paths::DOCUMENT_EXTENSION))
    }

    /// Variant of the Global document written while the lid is closed
    pub fn open_lid_document(&self, config_hash: &str) -> PathBuf {
        self.control().join(paths::CONFIGS_DIR).join(format!(
            "{}.{}.{}",
            config_hash,
            paths::OPEN_LID_SUFFIX,
            paths::DOCUMENT_EXTENSION
        ))
    }

    pub fn output_document(&self, output_hash: &str) -> PathBuf {
        self.control()
            .join(paths::OUTPUTS_DIR)
            .join(format!("{}.{}", output_hash, paths::DOCUMENT_EXTENSION))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_layout() {
        let paths = StorePaths::new("/data/dispconf");
        assert_eq!(
            paths.global_document("abc"),
            PathBuf::from("/data/dispconf/control/configs/abc.json")
        );
        assert_eq!(
            paths.open_lid_document("abc"),
            PathBuf::from("/data/dispconf/control/configs/abc.open-lid.json")
        );
        assert_eq!(
            paths.output_document("h1"),
            PathBuf::from("/data/dispconf/control/outputs/h1.json")
        );
    }
}
