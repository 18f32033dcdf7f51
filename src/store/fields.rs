//! Stored per-output preference fields
//!
//! Every persisted field is listed in `Field`. Reading and writing go through
//! one routine per direction so the Global and Individual documents share the
//! exact same encoding.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::keys;
use crate::model::{Config, Features, Output, OutputId, Point, Retention, Rotation, Size};

/// Where a field lives for an output with Individual retention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Always in the Global document
    Global,
    /// In the Individual document when retention is Individual
    Retained,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Retention,
    Enabled,
    Primary,
    Replicate,
    Position,
    Mode,
    Scale,
    Rotation,
    AutoResolution,
    AutoRefreshRate,
    AutoRotate,
    AutoRotateTabletOnly,
}

impl Field {
    pub const ALL: [Field; 12] = [
        Field::Retention,
        Field::Enabled,
        Field::Primary,
        Field::Replicate,
        Field::Position,
        Field::Mode,
        Field::Scale,
        Field::Rotation,
        Field::AutoResolution,
        Field::AutoRefreshRate,
        Field::AutoRotate,
        Field::AutoRotateTabletOnly,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::Retention => keys::RETENTION,
            Field::Enabled => keys::ENABLED,
            Field::Primary => keys::PRIMARY,
            Field::Replicate => keys::REPLICATE,
            Field::Position => keys::POSITION,
            Field::Mode => keys::MODE,
            Field::Scale => keys::SCALE,
            Field::Rotation => keys::ROTATION,
            Field::AutoResolution => keys::AUTO_RESOLUTION,
            Field::AutoRefreshRate => keys::AUTO_REFRESH_RATE,
            Field::AutoRotate => keys::AUTO_ROTATE,
            Field::AutoRotateTabletOnly => keys::AUTO_ROTATE_TABLET_ONLY,
        }
    }

    pub fn scope(self) -> Scope {
        match self {
            Field::Retention | Field::Enabled | Field::Primary | Field::Replicate => Scope::Global,
            _ => Scope::Retained,
        }
    }

    /// Capabilities the config must advertise for the field to be stored
    pub fn required_features(self) -> Features {
        match self {
            Field::Primary => Features::PRIMARY_DISPLAY,
            Field::Scale => Features::PER_OUTPUT_SCALING,
            Field::AutoRotate => Features::AUTO_ROTATION,
            Field::AutoRotateTabletOnly => Features::AUTO_ROTATION | Features::TABLET_MODE,
            _ => Features::empty(),
        }
    }

    pub fn supported_by(self, config: &Config) -> bool {
        config.supported_features.contains(self.required_features())
    }

    /// Fields processed for `config`, in table order
    pub fn supported(config: &Config, scope: Scope) -> impl Iterator<Item = Field> + '_ {
        Field::ALL
            .into_iter()
            .filter(move |f| f.scope() == scope && f.supported_by(config))
    }

    /// Read this field from `entry` into `values`, keeping the default when
    /// the key is missing or malformed. Returns whether a value was read.
    pub fn read(self, entry: Option<&Map<String, Value>>, values: &mut StoredValues) -> bool {
        let Some(raw) = entry.and_then(|e| e.get(self.key())) else {
            return false;
        };

        let ok = match self {
            Field::Retention => parse(raw).map(|v| values.retention = v).is_some(),
            Field::Enabled => parse(raw).map(|v| values.enabled = v).is_some(),
            Field::Primary => parse(raw).map(|v| values.primary = v).is_some(),
            Field::Replicate => parse::<Option<String>>(raw).map(|v| values.replicate = v).is_some(),
            Field::Position => parse(raw).map(|v| values.position = v).is_some(),
            Field::Mode => parse::<StoredMode>(raw)
                .filter(|m| m.resolution.is_valid() && m.refresh > 0.0)
                .map(|v| values.mode = Some(v))
                .is_some(),
            Field::Scale => parse::<f64>(raw)
                .filter(|s| *s > 0.0)
                .map(|v| values.scale = v)
                .is_some(),
            Field::Rotation => parse(raw).map(|v| values.rotation = v).is_some(),
            Field::AutoResolution => parse(raw).map(|v| values.auto_resolution = v).is_some(),
            Field::AutoRefreshRate => parse(raw).map(|v| values.auto_refresh_rate = v).is_some(),
            Field::AutoRotate => parse(raw).map(|v| values.auto_rotate = v).is_some(),
            Field::AutoRotateTabletOnly => parse(raw).map(|v| values.auto_rotate_only_in_tablet_mode = v).is_some(),
        };
        if !ok {
            debug!(field = self.key(), value = %raw, "Ignoring malformed stored value");
        }
        ok
    }

    /// Write this field from `values` into `entry`
    pub fn write(self, values: &StoredValues, entry: &mut Map<String, Value>) {
        let value = match self {
            Field::Retention => to_value(&values.retention),
            Field::Enabled => Value::Bool(values.enabled),
            Field::Primary => Value::Bool(values.primary),
            Field::Replicate => to_value(&values.replicate),
            Field::Position => to_value(&values.position),
            Field::Mode => match &values.mode {
                Some(mode) => to_value(mode),
                None => return,
            },
            Field::Scale => to_value(&values.scale),
            Field::Rotation => to_value(&values.rotation),
            Field::AutoResolution => Value::Bool(values.auto_resolution),
            Field::AutoRefreshRate => Value::Bool(values.auto_refresh_rate),
            Field::AutoRotate => Value::Bool(values.auto_rotate),
            Field::AutoRotateTabletOnly => Value::Bool(values.auto_rotate_only_in_tablet_mode),
        };
        entry.insert(self.key().to_string(), value);
    }
}

/// Commanded mode as stored, not necessarily a catalogued one
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredMode {
    pub resolution: Size,
    pub refresh: f64,
}

/// Every persisted value of one output, with the documented defaults
#[derive(Debug, Clone, PartialEq)]
pub struct StoredValues {
    pub retention: Retention,
    pub enabled: bool,
    pub primary: bool,
    /// Hash of the replication source
    pub replicate: Option<String>,
    pub position: Point,
    pub mode: Option<StoredMode>,
    pub scale: f64,
    pub rotation: Rotation,
    pub auto_resolution: bool,
    pub auto_refresh_rate: bool,
    pub auto_rotate: bool,
    pub auto_rotate_only_in_tablet_mode: bool,
}

impl Default for StoredValues {
    fn default() -> Self {
        Self {
            retention: Retention::Undefined,
            enabled: true,
            primary: false,
            replicate: None,
            position: Point::default(),
            mode: None,
            scale: 1.0,
            rotation: Rotation::None,
            auto_resolution: true,
            auto_refresh_rate: true,
            auto_rotate: false,
            auto_rotate_only_in_tablet_mode: true,
        }
    }
}

impl StoredValues {
    /// Snapshot the values of output `id` in `config`
    pub fn from_output(config: &Config, output: &Output) -> Self {
        let replicate = match output.replication_source {
            0 => None,
            source => config.output(source).map(|o| o.hash().to_string()),
        };
        let mode = output.resolution.is_valid().then_some(StoredMode {
            resolution: output.resolution,
            refresh: output.refresh,
        });

        Self {
            retention: output.retention,
            enabled: output.enabled,
            primary: config.primary_id() == Some(output.id()),
            replicate,
            position: output.position,
            mode,
            scale: output.scale,
            rotation: output.rotation,
            auto_resolution: output.auto_resolution,
            auto_refresh_rate: output.auto_refresh_rate,
            auto_rotate: output.auto_rotate,
            auto_rotate_only_in_tablet_mode: output.auto_rotate_only_in_tablet_mode,
        }
    }

    /// Copy the values of the given fields onto `output`
    ///
    /// `resolve` maps the stored replication source hash back to an id.
    pub fn apply_to(&self, output: &mut Output, fields: &[Field], resolve: impl Fn(&str) -> Option<OutputId>) {
        for field in fields {
            match field {
                Field::Retention => output.retention = self.retention,
                Field::Enabled => output.enabled = self.enabled,
                // Config level, handled by the caller
                Field::Primary => {}
                Field::Replicate => {
                    output.replication_source = self
                        .replicate
                        .as_deref()
                        .and_then(&resolve)
                        .filter(|id| *id != output.id())
                        .unwrap_or(0);
                }
                Field::Position => output.position = self.position,
                Field::Mode => match self.mode {
                    Some(mode) => {
                        output.resolution = mode.resolution;
                        output.refresh = mode.refresh;
                    }
                    None => {
                        output.resolution = Size::default();
                        output.refresh = 0.0;
                    }
                },
                Field::Scale => output.scale = self.scale,
                Field::Rotation => output.rotation = self.rotation,
                Field::AutoResolution => output.auto_resolution = self.auto_resolution,
                Field::AutoRefreshRate => output.auto_refresh_rate = self.auto_refresh_rate,
                Field::AutoRotate => output.auto_rotate = self.auto_rotate,
                Field::AutoRotateTabletOnly => output.auto_rotate_only_in_tablet_mode = self.auto_rotate_only_in_tablet_mode,
            }
        }
    }
}

fn parse<T: DeserializeOwned>(raw: &Value) -> Option<T> {
    serde_json::from_value(raw.clone()).ok()
}

fn to_value<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_missing_fields_keep_defaults() {
        let mut values = StoredValues::default();
        for field in Field::ALL {
            assert!(!field.read(None, &mut values));
        }
        assert_eq!(values, StoredValues::default());
    }

    #[test]
    fn test_malformed_fields_keep_defaults() {
        let doc = entry(json!({
            "scale": "big",
            "rotation": "sideways",
            "mode": {"resolution": {"width": 0, "height": 0}, "refresh": 60.0},
            "enabled": 3,
        }));
        let mut values = StoredValues::default();
        for field in Field::ALL {
            field.read(Some(&doc), &mut values);
        }
        assert_eq!(values, StoredValues::default());
    }

    #[test]
    fn test_write_then_read_entry() {
        let values = StoredValues {
            retention: Retention::Global,
            enabled: false,
            primary: true,
            replicate: Some("abc".to_string()),
            position: Point::new(1920.0, 0.0),
            mode: Some(StoredMode { resolution: Size::new(2560, 1440), refresh: 143.97 }),
            scale: 1.25,
            rotation: Rotation::Right,
            auto_resolution: false,
            auto_refresh_rate: false,
            auto_rotate: true,
            auto_rotate_only_in_tablet_mode: false,
        };

        let mut doc = Map::new();
        for field in Field::ALL {
            field.write(&values, &mut doc);
        }
        assert_eq!(doc["mode"]["resolution"]["width"], 2560);
        assert_eq!(doc["rotation"], "right");

        let mut read = StoredValues::default();
        for field in Field::ALL {
            assert!(field.read(Some(&doc), &mut read), "field {:?}", field);
        }
        assert_eq!(read, values);
    }

    #[test]
    fn test_unset_mode_not_written() {
        let mut doc = Map::new();
        Field::Mode.write(&StoredValues::default(), &mut doc);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_scopes() {
        let global: Vec<Field> = Field::ALL.into_iter().filter(|f| f.scope() == Scope::Global).collect();
        assert_eq!(global, vec![Field::Retention, Field::Enabled, Field::Primary, Field::Replicate]);
    }
}
