//! One display configuration session
//!
//! Owns the backend and the preference store. Configs flow
//! backend -> store (restore) -> generator (fill in / layout) -> backend
//! (apply) -> store (persist), and every commit is published to whoever
//! subscribed.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::sync::mpsc::Sender;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::generator::{Direction, Generator, ValidityFlags};
use crate::model::{Cause, Config, ConfigChanges, OutputId};
use crate::store::{FilerController, ReadReport};

/// Published after a config was applied
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEvent {
    pub hash: String,
    pub cause: Cause,
    pub changes: ConfigChanges,
    /// Whether every control document was written
    pub persisted: bool,
}

pub struct Session<B: Backend> {
    backend: B,
    store: FilerController,
    validity: ValidityFlags,
    current: Option<Config>,
    last_read: Option<ReadReport>,
    events: Option<Sender<ConfigEvent>>,
}

impl<B: Backend> Session<B> {
    pub fn new(backend: B, store: FilerController) -> Self {
        Self {
            backend,
            store,
            validity: ValidityFlags::default(),
            current: None,
            last_read: None,
            events: None,
        }
    }

    pub fn set_validity_flags(&mut self, flags: ValidityFlags) {
        self.validity = flags;
    }

    /// Publish every committed config to `sender`
    pub fn subscribe(&mut self, sender: Sender<ConfigEvent>) {
        self.events = Some(sender);
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn current(&self) -> Option<&Config> {
        self.current.as_ref()
    }

    /// Outcome of the last preference read
    pub fn last_read(&self) -> Option<&ReadReport> {
        self.last_read.as_ref()
    }

    /// Enumerate outputs, restore stored preferences and fill in the rest
    ///
    /// Nothing is applied or persisted; see `restore` for that.
    pub fn load(&mut self) -> Result<Config> {
        let mut config = self.backend.config().context("Failed to enumerate outputs")?;
        config.supported_features |= self.backend.features();

        let report = self.store.read(&mut config);
        let mut generator = Generator::with_restored(&config, &report.restored);
        generator.set_validity_flags(self.validity);
        if let Some(previous) = self.current.take() {
            generator.set_predecessor(previous);
        }

        if report.restored.is_empty() {
            info!(outputs = config.outputs().len(), "No stored preferences, generating layout");
            if !generator.optimize() {
                warn!("Could not generate a layout, keeping enumerated state");
            }
        } else {
            debug!(restored = report.restored.len(), "Restored stored preferences");
        }

        let config = generator.into_config();
        self.current = Some(config.clone());
        self.last_read = Some(report);
        Ok(config)
    }

    /// Load and commit the restored config
    pub fn restore(&mut self) -> Result<bool> {
        let config = self.load()?;
        self.commit(config)
    }

    pub fn optimize(&mut self) -> Result<bool> {
        self.run("optimize", |g| g.optimize())
    }

    pub fn extend(&mut self, direction: Direction, first: Option<OutputId>) -> Result<bool> {
        self.run("extend", |g| g.extend(direction, first))
    }

    pub fn replicate(&mut self) -> Result<bool> {
        self.run("replicate", |g| g.replicate())
    }

    pub fn disable_embedded(&mut self) -> Result<bool> {
        self.run("disable_embedded", |g| g.disable_embedded())
    }

    /// Run a generator operation on the current config and commit the result
    fn run(&mut self, operation: &str, op: impl FnOnce(&mut Generator) -> bool) -> Result<bool> {
        let base = match self.current.clone() {
            Some(config) => config,
            None => self.load()?,
        };

        // Everything in the current config is already resolved
        let resolved: BTreeSet<OutputId> = base.outputs().keys().copied().collect();
        let mut generator = Generator::with_restored(&base, &resolved);
        generator.set_validity_flags(self.validity);
        generator.set_predecessor(base);

        if !op(&mut generator) {
            info!(operation, "Layout operation made no change");
            return Ok(false);
        }
        self.commit(generator.into_config())
    }

    /// Apply `config` through the backend, persist it and publish the change
    ///
    /// Returns whether the preferences were fully persisted. A backend
    /// failure is an error and leaves the current config untouched.
    pub fn commit(&mut self, config: Config) -> Result<bool> {
        let mut previous = self.backend.config().context("Failed to read state before applying")?;
        self.backend.apply(&config).context("Backend rejected config")?;
        let changes = previous.apply(&config);

        let persisted = self.store.write(&config);
        if !persisted {
            warn!(config = %config.hash(), "Config applied but not fully persisted");
        }

        info!(
            config = %config.hash(),
            cause = ?config.cause,
            changed = changes.changed.len(),
            persisted,
            "Committed config"
        );

        if let Some(sender) = &self.events {
            let event = ConfigEvent {
                hash: config.hash(),
                cause: config.cause,
                changes,
                persisted,
            };
            if sender.send(event).is_err() {
                warn!("Config event receiver is gone, dropping subscription");
                self.events = None;
            }
        }

        self.current = Some(config);
        Ok(persisted)
    }
}
