use serde::{Deserialize, Serialize};

use crate::model::types::Size;

/// Bounding-box limits of the virtual screen all outputs live on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Screen {
    #[serde(default)]
    pub min_size: Size,
    #[serde(default)]
    pub max_size: Size,
    #[serde(default)]
    pub current_size: Size,
    /// 0 when the backend reports no limit
    #[serde(default)]
    pub max_active_outputs_count: u32,
}
