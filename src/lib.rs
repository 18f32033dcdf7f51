#![forbid(unsafe_code)]

//! Display configuration core
//!
//! - **model**: outputs, modes, screen and the Config aggregate
//! - **generator**: automatic layouts (extend, replicate, ...)
//! - **store**: per-combination and per-output preference documents
//! - **backend**: where configs are enumerated from and applied to
//! - **session**: ties backend, store and generator together
//! - **settings**: tool settings

pub mod backend;
pub mod constants;
pub mod generator;
pub mod model;
pub mod session;
pub mod settings;
pub mod store;

pub use generator::{Direction, Generator, ValidityFlags};
pub use model::{Config, Output};
pub use session::{ConfigEvent, Session};
pub use settings::Settings;
