use serde::{Deserialize, Serialize};

use crate::constants::mode::REFRESH_TOLERANCE;
use crate::model::types::Size;

/// One (resolution, refresh rate) an output can be driven at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mode {
    id: String,
    name: String,
    size: Size,
    refresh: f64,
}

impl Mode {
    pub fn new(id: impl Into<String>, size: Size, refresh: f64) -> Self {
        let id = id.into();
        let name = format!("{}x{}@{:.2}", size.width, size.height, refresh);
        Self { id, name, size, refresh }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn refresh(&self) -> f64 {
        self.refresh
    }

    /// Same size and a refresh rate within tolerance
    pub fn matches(&self, size: Size, refresh: f64) -> bool {
        self.size == size && refresh_eq(self.refresh, refresh)
    }
}

pub fn refresh_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < REFRESH_TOLERANCE
}
