//! The root aggregate: screen bounds plus every attached output

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::warn;

use crate::model::output::Output;
use crate::model::screen::Screen;
use crate::model::types::{Cause, Features, OutputId, Rect, Size};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    pub screen: Screen,
    outputs: BTreeMap<OutputId, Output>,
    primary: Option<OutputId>,
    pub supported_features: Features,
    pub cause: Cause,
    pub tablet_mode_available: bool,
    pub tablet_mode_engaged: bool,
}

/// What `Config::apply` changed, published by whoever commits the config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigChanges {
    pub added: Vec<OutputId>,
    pub removed: Vec<OutputId>,
    pub changed: Vec<OutputId>,
    pub primary_changed: bool,
    pub screen_changed: bool,
}

impl ConfigChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.changed.is_empty()
            && !self.primary_changed
            && !self.screen_changed
    }
}

impl Config {
    pub fn new(screen: Screen, supported_features: Features) -> Self {
        Self {
            screen,
            outputs: BTreeMap::new(),
            primary: None,
            supported_features,
            cause: Cause::Unknown,
            tablet_mode_available: false,
            tablet_mode_engaged: false,
        }
    }

    pub fn supports(&self, feature: Features) -> bool {
        self.supported_features.contains(feature)
    }

    pub fn outputs(&self) -> &BTreeMap<OutputId, Output> {
        &self.outputs
    }

    pub fn output(&self, id: OutputId) -> Option<&Output> {
        self.outputs.get(&id)
    }

    pub fn output_mut(&mut self, id: OutputId) -> Option<&mut Output> {
        self.outputs.get_mut(&id)
    }

    pub fn outputs_mut(&mut self) -> impl Iterator<Item = &mut Output> {
        self.outputs.values_mut()
    }

    pub fn output_by_hash(&self, hash: &str) -> Option<&Output> {
        self.outputs.values().find(|o| o.hash() == hash)
    }

    /// Insert or replace the output with the same id
    pub fn add_output(&mut self, output: Output) {
        self.outputs.insert(output.id(), output);
    }

    pub fn remove_output(&mut self, id: OutputId) -> Option<Output> {
        if self.primary == Some(id) {
            self.primary = None;
        }
        self.outputs.remove(&id)
    }

    pub fn primary(&self) -> Option<&Output> {
        self.primary.and_then(|id| self.outputs.get(&id))
    }

    pub fn primary_id(&self) -> Option<OutputId> {
        self.primary
    }

    /// Set or clear the primary output, refusing ids not in this config
    pub fn set_primary(&mut self, id: Option<OutputId>) -> bool {
        match id {
            Some(id) if !self.outputs.contains_key(&id) => {
                warn!(output = id, "Refusing to mark unknown output as primary");
                false
            }
            _ => {
                self.primary = id;
                true
            }
        }
    }

    pub fn enabled_count(&self) -> usize {
        self.outputs.values().filter(|o| o.enabled).count()
    }

    /// Digest over the attached outputs' hashes, independent of their values
    pub fn hash(&self) -> String {
        let mut hashes: Vec<&str> = self.outputs.values().map(|o| o.hash()).collect();
        hashes.sort_unstable();

        let mut hasher = Sha256::new();
        for hash in hashes {
            hasher.update(hash.as_bytes());
            hasher.update([0u8]);
        }
        format!("{:x}", hasher.finalize())
    }

    /// Bounding box of all positionable outputs
    pub fn bounding_rect(&self) -> Option<Rect> {
        self.outputs
            .values()
            .filter(|o| o.positionable())
            .map(|o| o.geometry())
            .reduce(|acc, r| acc.united(&r))
    }

    /// Recompute `screen.current_size` from the positionable outputs
    pub fn update_screen_size(&mut self) {
        if let Some(rect) = self.bounding_rect() {
            self.screen.current_size = Size::new(rect.width.ceil() as i32, rect.height.ceil() as i32);
        }
    }

    /// Copy all attribute state from `other` onto this config
    ///
    /// Outputs are matched by id and hash: matching ones take over `other`'s
    /// values, outputs only in `other` are inserted and outputs missing from
    /// `other` are removed.
    pub fn apply(&mut self, other: &Config) -> ConfigChanges {
        let mut changes = ConfigChanges::default();

        // A reused id naming a different output counts as remove + add
        let removed: Vec<OutputId> = self
            .outputs
            .iter()
            .filter(|(id, ours)| other.outputs.get(*id).is_none_or(|theirs| theirs.hash() != ours.hash()))
            .map(|(id, _)| *id)
            .collect();
        for id in removed {
            self.outputs.remove(&id);
            changes.removed.push(id);
        }

        for (id, theirs) in &other.outputs {
            match self.outputs.get_mut(id) {
                Some(ours) => {
                    if ours.apply(theirs) {
                        changes.changed.push(*id);
                    }
                }
                None => {
                    self.outputs.insert(*id, theirs.clone());
                    changes.added.push(*id);
                }
            }
        }

        if self.screen != other.screen {
            self.screen = other.screen.clone();
            changes.screen_changed = true;
        }
        if self.primary != other.primary {
            self.primary = other.primary;
            changes.primary_changed = true;
        }

        self.supported_features = other.supported_features;
        self.cause = other.cause;
        self.tablet_mode_available = other.tablet_mode_available;
        self.tablet_mode_engaged = other.tablet_mode_engaged;

        changes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::output::OutputIdentity;

    fn test_config(connectors: &[(OutputId, &str)]) -> Config {
        let mut config = Config::new(Screen::default(), Features::PRIMARY_DISPLAY);
        for (id, connector) in connectors {
            config.add_output(Output::new(*id, OutputIdentity::new(*connector)));
        }
        config
    }

    #[test]
    fn test_hash_ignores_ids_and_values() {
        let a = test_config(&[(1, "eDP-1"), (2, "DP-1")]);
        let mut b = test_config(&[(7, "DP-1"), (3, "eDP-1")]);
        b.output_mut(7).unwrap().enabled = true;

        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn test_hash_changes_with_attached_set() {
        let a = test_config(&[(1, "eDP-1")]);
        let b = test_config(&[(1, "eDP-1"), (2, "DP-1")]);
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_set_primary_rejects_unknown() {
        let mut config = test_config(&[(1, "eDP-1")]);
        assert!(!config.set_primary(Some(5)));
        assert!(config.primary().is_none());
        assert!(config.set_primary(Some(1)));
        assert_eq!(config.primary_id(), Some(1));
    }

    #[test]
    fn test_remove_output_clears_primary() {
        let mut config = test_config(&[(1, "eDP-1"), (2, "DP-1")]);
        config.set_primary(Some(2));
        config.remove_output(2);
        assert!(config.primary().is_none());
    }

    #[test]
    fn test_apply_reports_changes() {
        let mut live = test_config(&[(1, "eDP-1"), (2, "DP-1")]);
        let mut next = test_config(&[(1, "eDP-1"), (3, "HDMI-1")]);
        next.output_mut(1).unwrap().enabled = true;
        next.set_primary(Some(1));

        let changes = live.apply(&next);
        assert_eq!(changes.added, vec![3]);
        assert_eq!(changes.removed, vec![2]);
        assert_eq!(changes.changed, vec![1]);
        assert!(changes.primary_changed);
        assert_eq!(live, next);

        assert!(live.apply(&next).is_empty());
    }

    #[test]
    fn test_apply_reused_id_is_remove_and_add() {
        let mut live = test_config(&[(1, "eDP-1"), (2, "DP-1")]);
        let next = test_config(&[(1, "eDP-1"), (2, "HDMI-1")]);

        let changes = live.apply(&next);
        assert_eq!(changes.removed, vec![2]);
        assert_eq!(changes.added, vec![2]);
        assert!(changes.changed.is_empty());
        assert_eq!(live.output(2).unwrap().hash(), next.output(2).unwrap().hash());
        assert_eq!(live.output(2).unwrap().identity().connector, "HDMI-1");
    }
}
