//! Backend over a JSON snapshot file
//!
//! Reads the attached outputs from a file in the snapshot format and writes
//! applied configs back to the same file. Used by the CLI and for replaying
//! hardware states captured elsewhere.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::model::{
    Config, Features, Mode, Output, OutputId, OutputIdentity, OutputType, Point, Rotation, Screen, Size,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SnapshotMode {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    size: Size,
    refresh: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SnapshotOutput {
    id: OutputId,
    connector: String,
    #[serde(default)]
    vendor: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    serial: String,
    #[serde(default)]
    description: String,
    #[serde(default, rename = "type")]
    output_type: OutputType,
    #[serde(default)]
    modes: Vec<SnapshotMode>,
    #[serde(default)]
    preferred_modes: Vec<String>,
    #[serde(default)]
    physical_size: Size,
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    position: Point,
    #[serde(default)]
    rotation: Rotation,
    #[serde(default = "default_scale")]
    scale: f64,
    #[serde(default)]
    resolution: Size,
    #[serde(default)]
    refresh: f64,
    #[serde(default)]
    replication_source: OutputId,
    #[serde(default)]
    follow_preferred_mode: bool,
}

fn default_scale() -> f64 {
    1.0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    #[serde(default)]
    screen: Screen,
    #[serde(default)]
    features: Vec<String>,
    #[serde(default)]
    primary: Option<OutputId>,
    #[serde(default)]
    tablet_mode_available: bool,
    #[serde(default)]
    tablet_mode_engaged: bool,
    #[serde(default)]
    outputs: Vec<SnapshotOutput>,
}

impl Snapshot {
    fn features(&self) -> Features {
        let mut features = Features::empty();
        for name in &self.features {
            match Features::from_name(name) {
                Some(flag) => features |= flag,
                None => warn!(feature = %name, "Ignoring unknown feature in snapshot"),
            }
        }
        features
    }

    fn to_config(&self) -> Config {
        let mut config = Config::new(self.screen.clone(), self.features());
        config.tablet_mode_available = self.tablet_mode_available;
        config.tablet_mode_engaged = self.tablet_mode_engaged;

        for entry in &self.outputs {
            let identity = OutputIdentity::new(entry.connector.as_str())
                .with_edid(&entry.vendor, &entry.model, &entry.serial);
            let mut output = Output::new(entry.id, identity);
            output.description = entry.description.clone();
            output.output_type = entry.output_type;
            for mode in &entry.modes {
                let mut m = Mode::new(mode.id.as_str(), mode.size, mode.refresh);
                if let Some(name) = &mode.name {
                    m = m.with_name(name.as_str());
                }
                output.add_mode(m);
            }
            output.preferred_modes = entry.preferred_modes.clone();
            output.physical_size = entry.physical_size;
            output.enabled = entry.enabled;
            output.position = entry.position;
            output.rotation = entry.rotation;
            output.scale = entry.scale;
            output.resolution = entry.resolution;
            output.refresh = entry.refresh;
            output.replication_source = entry.replication_source;
            output.follow_preferred_mode = entry.follow_preferred_mode;
            config.add_output(output);
        }

        if self.primary.is_some() && !config.set_primary(self.primary) {
            warn!(primary = ?self.primary, "Snapshot primary does not name an output");
        }
        config.update_screen_size();
        config
    }

    fn from_config(config: &Config) -> Self {
        let outputs = config
            .outputs()
            .values()
            .map(|output| {
                let identity = output.identity();
                SnapshotOutput {
                    id: output.id(),
                    connector: identity.connector.clone(),
                    vendor: identity.vendor.clone(),
                    model: identity.model.clone(),
                    serial: identity.serial.clone(),
                    description: output.description.clone(),
                    output_type: output.output_type,
                    modes: output
                        .modes
                        .values()
                        .map(|m| SnapshotMode {
                            id: m.id().to_string(),
                            name: Some(m.name().to_string()),
                            size: m.size(),
                            refresh: m.refresh(),
                        })
                        .collect(),
                    preferred_modes: output.preferred_modes.clone(),
                    physical_size: output.physical_size,
                    enabled: output.enabled,
                    position: output.position,
                    rotation: output.rotation,
                    scale: output.scale,
                    resolution: output.resolution,
                    refresh: output.refresh,
                    replication_source: output.replication_source,
                    follow_preferred_mode: output.follow_preferred_mode,
                }
            })
            .collect();

        Self {
            screen: config.screen.clone(),
            features: config
                .supported_features
                .iter_names()
                .map(|(name, _)| name.to_string())
                .collect(),
            primary: config.primary_id(),
            tablet_mode_available: config.tablet_mode_available,
            tablet_mode_engaged: config.tablet_mode_engaged,
            outputs,
        }
    }
}

/// Backend reading and writing a snapshot file
pub struct SnapshotBackend {
    path: PathBuf,
    snapshot: Snapshot,
}

impl SnapshotBackend {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;

        info!(
            path = %path.display(),
            outputs = snapshot.outputs.len(),
            "Loaded output snapshot"
        );
        Ok(Self { path, snapshot })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create snapshot directory {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(&self.snapshot)
            .context("Failed to serialize snapshot")?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write snapshot {}", self.path.display()))?;
        debug!(path = %self.path.display(), "Wrote output snapshot");
        Ok(())
    }
}

impl Backend for SnapshotBackend {
    fn config(&self) -> Result<Config> {
        Ok(self.snapshot.to_config())
    }

    fn apply(&mut self, config: &Config) -> Result<()> {
        if !config.supports(Features::WRITABLE) {
            anyhow::bail!("Snapshot {} is not writable", self.path.display());
        }
        self.snapshot = Snapshot::from_config(config);
        self.save()
            .with_context(|| format!("Failed to apply config to {}", self.path.display()))
    }

    fn features(&self) -> Features {
        self.snapshot.features()
    }
}
