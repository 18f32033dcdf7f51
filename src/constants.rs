//! Application-wide constants
//!
//! This module contains all magic numbers and string literals used throughout
//! the crate, providing a single source of truth for constant values.

/// Tool configuration file location
pub mod config {
    /// Directory name under the XDG config/data dirs
    pub const APP_DIR: &str = "dispconf";

    /// Settings file name inside the config dir
    pub const FILENAME: &str = "settings.json";
}

/// Preference store layout
pub mod paths {
    /// Root of all control documents, relative to the data dir
    pub const CONTROL_DIR: &str = "control";

    /// Global documents, one per attached-output combination
    pub const CONFIGS_DIR: &str = "configs";

    /// Individual documents, one per output hash
    pub const OUTPUTS_DIR: &str = "outputs";

    /// Extension of every control document
    pub const DOCUMENT_EXTENSION: &str = "json";

    /// Suffix inserted before the extension for the open-lid variant
    pub const OPEN_LID_SUFFIX: &str = "open-lid";

    /// ACPI lid switch directory
    pub const ACPI_LID_ROOT: &str = "/proc/acpi/button/lid";
}

/// Environment variable names
pub mod env {
    /// Overrides the preference root
    pub const DATA_DIR: &str = "DISPCONF_DATA_DIR";

    /// Log level (trace/debug/info/warn/error)
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
}

/// Automatic scale heuristic
pub mod scale {
    /// Millimetres per inch
    pub const MM_PER_INCH: f64 = 25.4;

    /// DPI that maps to a scale factor of 1.0
    pub const REFERENCE_DPI: f64 = 130.0;

    /// Never auto-scale below this
    pub const MIN_FACTOR: f64 = 1.0;

    /// Never auto-scale above this
    pub const MAX_FACTOR: f64 = 3.0;
}

/// Mode matching
pub mod mode {
    /// Refresh rates closer than this (Hz) are the same rate
    pub const REFRESH_TOLERANCE: f64 = 0.01;
}

/// Document keys used by the preference store
pub mod keys {
    pub const OUTPUTS: &str = "outputs";
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const RETENTION: &str = "retention";
    pub const ENABLED: &str = "enabled";
    pub const PRIMARY: &str = "primary";
    pub const REPLICATE: &str = "replicate";
    pub const POSITION: &str = "pos";
    pub const MODE: &str = "mode";
    pub const SCALE: &str = "scale";
    pub const ROTATION: &str = "rotation";
    pub const AUTO_RESOLUTION: &str = "auto_resolution";
    pub const AUTO_REFRESH_RATE: &str = "auto_refresh_rate";
    pub const AUTO_ROTATE: &str = "auto_rotate";
    pub const AUTO_ROTATE_TABLET_ONLY: &str = "auto_rotate_only_in_tablet_mode";
}
