//! Display configuration entity model
//!
//! - **mode**: resolution + refresh rate capability
//! - **output**: one display with transient id and stable hash
//! - **screen**: virtual screen bounds
//! - **config**: the root aggregate

pub mod config;
pub mod mode;
pub mod output;
pub mod screen;
pub mod types;

pub use config::{Config, ConfigChanges};
pub use mode::Mode;
pub use output::{Output, OutputIdentity};
pub use screen::Screen;
pub use types::{Cause, Features, OutputId, OutputType, Point, Rect, Retention, Rotation, Size};
