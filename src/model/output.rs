//! A single display sink
//!
//! The `id` is handed out by whichever backend enumerated the output and is
//! only meaningful inside one Config. The `hash` is derived from descriptive
//! attributes and is the key used for everything persisted.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::model::mode::{refresh_eq, Mode};
use crate::model::types::{OutputId, OutputType, Point, Rect, Retention, Rotation, Size};

/// Descriptive attributes an output's stable hash is derived from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputIdentity {
    /// Connector name, e.g. "DP-1"
    pub connector: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub serial: String,
}

impl OutputIdentity {
    pub fn new(connector: impl Into<String>) -> Self {
        Self {
            connector: connector.into(),
            ..Default::default()
        }
    }

    pub fn with_edid(mut self, vendor: &str, model: &str, serial: &str) -> Self {
        self.vendor = vendor.to_string();
        self.model = model.to_string();
        self.serial = serial.to_string();
        self
    }

    /// Hex SHA-256 over the identity fields
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [&self.vendor, &self.model, &self.serial, &self.connector] {
            hasher.update(part.as_bytes());
            // Separator keeps ("ab", "c") and ("a", "bc") apart
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Output {
    id: OutputId,
    hash: String,
    identity: OutputIdentity,

    pub name: String,
    pub description: String,
    pub output_type: OutputType,
    pub modes: BTreeMap<String, Mode>,
    pub preferred_modes: Vec<String>,
    /// Physical size in millimetres, zero when unknown
    pub physical_size: Size,

    pub position: Point,
    pub rotation: Rotation,
    pub scale: f64,
    pub enabled: bool,
    /// Commanded resolution, not necessarily a catalogued mode
    pub resolution: Size,
    /// Commanded refresh rate in Hz
    pub refresh: f64,
    /// Output this one mirrors, 0 for none
    pub replication_source: OutputId,

    pub retention: Retention,
    pub auto_resolution: bool,
    pub auto_refresh_rate: bool,
    pub auto_rotate: bool,
    pub auto_rotate_only_in_tablet_mode: bool,
    /// Re-select the preferred mode on hotplug (virtual displays)
    pub follow_preferred_mode: bool,
}

impl Output {
    pub fn new(id: OutputId, identity: OutputIdentity) -> Self {
        let hash = identity.digest();
        Self {
            id,
            hash,
            name: identity.connector.clone(),
            identity,
            description: String::new(),
            output_type: OutputType::Unknown,
            modes: BTreeMap::new(),
            preferred_modes: Vec::new(),
            physical_size: Size::default(),
            position: Point::default(),
            rotation: Rotation::None,
            scale: 1.0,
            enabled: false,
            resolution: Size::default(),
            refresh: 0.0,
            replication_source: 0,
            retention: Retention::Undefined,
            auto_resolution: true,
            auto_refresh_rate: true,
            auto_rotate: false,
            auto_rotate_only_in_tablet_mode: true,
            follow_preferred_mode: false,
        }
    }

    pub fn id(&self) -> OutputId {
        self.id
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn identity(&self) -> &OutputIdentity {
        &self.identity
    }

    pub fn add_mode(&mut self, mode: Mode) {
        self.modes.insert(mode.id().to_string(), mode);
    }

    pub fn mode(&self, id: &str) -> Option<&Mode> {
        self.modes.get(id)
    }

    /// Enabled and not mirroring anything
    pub fn positionable(&self) -> bool {
        self.enabled && self.replication_source == 0
    }

    pub fn is_embedded(&self) -> bool {
        self.output_type == OutputType::Panel
    }

    pub fn set_commanded_mode(&mut self, mode: &Mode) {
        self.resolution = mode.size();
        self.refresh = mode.refresh();
    }

    /// The catalogued mode matching the commanded resolution and refresh rate
    pub fn commanded_mode(&self) -> Option<&Mode> {
        self.modes.values().find(|m| m.matches(self.resolution, self.refresh))
    }

    /// Biggest of the modes the output prefers
    pub fn preferred_mode(&self) -> Option<&Mode> {
        biggest_mode(self.preferred_modes.iter().filter_map(|id| self.modes.get(id)))
    }

    /// Preferred mode, falling back to the biggest catalogued one
    pub fn best_mode(&self) -> Option<&Mode> {
        self.preferred_mode().or_else(|| biggest_mode(self.modes.values()))
    }

    /// Highest refresh rate available at `size`
    pub fn best_refresh_rate(&self, size: Size) -> Option<f64> {
        self.modes
            .values()
            .filter(|m| m.size() == size)
            .map(|m| m.refresh())
            .fold(None, |best, r| Some(best.map_or(r, |b: f64| b.max(r))))
    }

    /// Mode the auto flags resolve to
    ///
    /// With `auto_resolution` the preferred/best mode's size is used (the
    /// preferred mode always wins when `follow_preferred_mode` is set),
    /// otherwise the commanded one. With `auto_refresh_rate` the highest rate
    /// at that size is picked.
    pub fn auto_mode(&self) -> Option<&Mode> {
        let size = if self.auto_resolution || self.follow_preferred_mode || !self.resolution.is_valid() {
            let candidate = if self.follow_preferred_mode {
                self.preferred_mode().or_else(|| self.best_mode())
            } else {
                self.best_mode()
            };
            candidate?.size()
        } else {
            self.resolution
        };

        let refresh = if self.auto_refresh_rate || self.best_refresh_rate(size).is_none() {
            self.best_refresh_rate(size)?
        } else {
            match self.modes.values().find(|m| m.matches(size, self.refresh)) {
                Some(m) => m.refresh(),
                None => self.best_refresh_rate(size)?,
            }
        };

        self.modes.values().find(|m| m.size() == size && refresh_eq(m.refresh(), refresh))
    }

    /// Command the auto mode, returns false when no mode is available
    pub fn apply_auto_mode(&mut self) -> bool {
        match self.auto_mode().cloned() {
            Some(mode) => {
                self.set_commanded_mode(&mode);
                true
            }
            None => false,
        }
    }

    /// Commanded resolution after rotation and scaling
    pub fn logical_size(&self) -> (f64, f64) {
        let size = if self.rotation.is_portrait() {
            self.resolution.transposed()
        } else {
            self.resolution
        };
        let scale = if self.scale > 0.0 { self.scale } else { 1.0 };
        (size.width as f64 / scale, size.height as f64 / scale)
    }

    pub fn geometry(&self) -> Rect {
        let (width, height) = self.logical_size();
        Rect {
            x: self.position.x,
            y: self.position.y,
            width,
            height,
        }
    }

    /// Copy every value attribute from `other`, keeping id and hash
    ///
    /// Returns true when anything changed.
    pub fn apply(&mut self, other: &Output) -> bool {
        let before = self.clone();

        self.name = other.name.clone();
        self.description = other.description.clone();
        self.output_type = other.output_type;
        self.modes = other.modes.clone();
        self.preferred_modes = other.preferred_modes.clone();
        self.physical_size = other.physical_size;
        self.position = other.position;
        self.rotation = other.rotation;
        self.scale = other.scale;
        self.enabled = other.enabled;
        self.resolution = other.resolution;
        self.refresh = other.refresh;
        self.replication_source = other.replication_source;
        self.retention = other.retention;
        self.auto_resolution = other.auto_resolution;
        self.auto_refresh_rate = other.auto_refresh_rate;
        self.auto_rotate = other.auto_rotate;
        self.auto_rotate_only_in_tablet_mode = other.auto_rotate_only_in_tablet_mode;
        self.follow_preferred_mode = other.follow_preferred_mode;

        *self != before
    }
}

fn biggest_mode<'a>(modes: impl Iterator<Item = &'a Mode>) -> Option<&'a Mode> {
    modes.fold(None, |best: Option<&Mode>, m| match best {
        Some(b) if (b.size().area(), b.refresh()) >= (m.size().area(), m.refresh()) => Some(b),
        _ => Some(m),
    })
}
