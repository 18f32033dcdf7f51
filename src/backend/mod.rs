//! Where configs come from and go to
//!
//! A backend enumerates the attached outputs into a Config and applies a
//! Config back to the hardware (or whatever stands in for it).

use anyhow::Result;

use crate::model::{Config, Features};

mod snapshot;
pub use snapshot::SnapshotBackend;

pub trait Backend {
    /// Current state of every attached output
    fn config(&self) -> Result<Config>;

    /// Make `config` the current state
    fn apply(&mut self, config: &Config) -> Result<()>;

    /// Capabilities advertised in every Config this backend produces
    fn features(&self) -> Features;
}
