//! JSON control documents on disk

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A JSON object backed by one file
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    root: Map<String, Value>,
    on_disk: bool,
}

impl Document {
    pub fn empty(path: PathBuf) -> Self {
        Self {
            path,
            root: Map::new(),
            on_disk: false,
        }
    }

    /// Load the document, a missing file yields an empty one
    pub fn load(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No control document yet");
            return Ok(Self::empty(path));
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read control document {}", path.display()))?;
        let value: Value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse control document {}", path.display()))?;
        let Value::Object(root) = value else {
            anyhow::bail!("Control document {} is not a JSON object", path.display());
        };

        Ok(Self {
            path,
            root,
            on_disk: true,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the file existed when loaded
    pub fn on_disk(&self) -> bool {
        self.on_disk
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn root(&self) -> &Map<String, Value> {
        &self.root
    }

    pub fn set_root(&mut self, root: Map<String, Value>) {
        self.root = root;
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&self.path)
    }

    /// Write to `path`, deleting the file instead when the document is empty
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if self.root.is_empty() {
            if path.exists() {
                fs::remove_file(path)
                    .with_context(|| format!("Failed to remove empty control document {}", path.display()))?;
                debug!(path = %path.display(), "Removed empty control document");
            }
            return Ok(());
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create control directory {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(&self.root)
            .context("Failed to serialize control document")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write control document {}", path.display()))?;
        debug!(path = %path.display(), "Wrote control document");
        Ok(())
    }
}
