//! Small value types shared by the entity model

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Transient output identifier, valid within one Config only
pub type OutputId = i32;

/// Logical coordinate (top-left of an output)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel or millimetre dimensions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Pixel count, used to rank modes
    pub fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    pub fn transposed(&self) -> Self {
        Self::new(self.height, self.width)
    }
}

/// Logical rectangle occupied by an output
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn left(&self) -> f64 {
        self.x
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn top(&self) -> f64 {
        self.y
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Smallest rectangle containing both
    pub fn united(&self, other: &Rect) -> Rect {
        let left = self.left().min(other.left());
        let top = self.top().min(other.top());
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rotation {
    #[default]
    None,
    Left,
    Inverted,
    Right,
}

impl Rotation {
    /// Left and right rotations swap width and height
    pub fn is_portrait(&self) -> bool {
        matches!(self, Rotation::Left | Rotation::Right)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    #[default]
    Unknown,
    /// Built-in panel (laptop screen)
    Panel,
    Vga,
    Dvi,
    Hdmi,
    DisplayPort,
    Tv,
    Virtual,
}

/// Which persistence granularity applies to an output's preferences
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Retention {
    /// Never resolved, handled like Global
    #[default]
    Undefined,
    /// Stored per combination of attached outputs
    Global,
    /// Stored per output, independent of what else is attached
    Individual,
}

/// Provenance of the values in a Config
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cause {
    #[default]
    Unknown,
    File,
    Generated,
    Interactive,
}

bitflags! {
    /// Capabilities advertised by the backend
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Features: u32 {
        const WRITABLE = 1 << 0;
        const PRIMARY_DISPLAY = 1 << 1;
        const PER_OUTPUT_SCALING = 1 << 2;
        const OUTPUT_REPLICATION = 1 << 3;
        const AUTO_ROTATION = 1 << 4;
        const TABLET_MODE = 1 << 5;
    }
}
