//! Automatic layout generation
//!
//! The Generator owns a working copy of a Config. Every public operation
//! builds a candidate from that copy, validates it with `check_config` and
//! only then merges it back with `Config::apply`. A rejected candidate leaves
//! the held Config untouched.

use bitflags::bitflags;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::constants::scale::{MAX_FACTOR, MIN_FACTOR, MM_PER_INCH, REFERENCE_DPI};
use crate::model::{Cause, Config, Features, Output, OutputId, Point};

bitflags! {
    /// Invariants a candidate must satisfy before it is committed
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ValidityFlags: u32 {
        const REQUIRE_AT_LEAST_ONE_ENABLED = 1 << 0;
        /// Only checked when the config supports a primary display
        const REQUIRE_PRIMARY = 1 << 1;
        /// Reject layouts whose bounding box exceeds `screen.max_size`
        const ENFORCE_SCREEN_SIZE = 1 << 2;
    }
}

impl Default for ValidityFlags {
    fn default() -> Self {
        ValidityFlags::REQUIRE_AT_LEAST_ONE_ENABLED | ValidityFlags::ENFORCE_SCREEN_SIZE
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

pub struct Generator {
    config: Config,
    predecessor: Option<Config>,
    validity: ValidityFlags,
}

impl Generator {
    /// Generator for a config none of whose outputs had stored preferences
    pub fn new(config: &Config) -> Self {
        Self::with_restored(config, &BTreeSet::new())
    }

    /// Generator seeding defaults for every output not in `restored`
    ///
    /// Restored outputs without a usable commanded mode get their auto mode.
    /// When some outputs were restored, the seeded ones are appended to the
    /// right of the restored layout.
    pub fn with_restored(config: &Config, restored: &BTreeSet<OutputId>) -> Self {
        let mut working = config.clone();
        let scaling = working.supports(Features::PER_OUTPUT_SCALING);

        for output in working.outputs_mut() {
            if restored.contains(&output.id()) {
                if output.commanded_mode().is_none() && !output.apply_auto_mode() {
                    debug!(output = %output.name, "Restored output has no usable mode");
                }
                continue;
            }
            output.auto_resolution = true;
            output.auto_refresh_rate = true;
            output.enabled = true;
            if !output.apply_auto_mode() {
                warn!(output = %output.name, "No usable mode to seed");
            }
            if scaling {
                output.scale = Self::best_scale(output);
            }
            debug!(output = %output.name, scale = output.scale, "Seeded defaults for output without stored data");
        }

        if !restored.is_empty() {
            place_after_restored(&mut working, restored);
        }

        Self {
            config: working,
            predecessor: None,
            validity: ValidityFlags::default(),
        }
    }

    /// Config the outputs were previously known from, used by `extend`
    pub fn set_predecessor(&mut self, predecessor: Config) {
        self.predecessor = Some(predecessor);
    }

    pub fn set_validity_flags(&mut self, flags: ValidityFlags) {
        self.validity = flags;
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    /// Scale factor targeting a comfortable effective DPI
    pub fn best_scale(output: &Output) -> f64 {
        let height_mm = output.physical_size.height;
        if height_mm <= 0 {
            return 1.0;
        }
        let Some(mode) = output.best_mode() else {
            return 1.0;
        };

        let dpi = mode.size().height as f64 / (height_mm as f64 / MM_PER_INCH);
        let factor = (dpi / REFERENCE_DPI).max(MIN_FACTOR);
        ((factor * 10.0).round() / 10.0).min(MAX_FACTOR)
    }

    /// Recompute the whole layout
    pub fn optimize(&mut self) -> bool {
        let ids: Vec<OutputId> = self.config.outputs().keys().copied().collect();
        match ids.as_slice() {
            [] => {
                info!("No outputs to optimize");
                false
            }
            [only] => {
                let mut candidate = self.config.clone();
                if let Some(output) = candidate.output_mut(*only) {
                    prepare_output(output);
                    output.position = Point::default();
                }
                if candidate.supports(Features::PRIMARY_DISPLAY) {
                    candidate.set_primary(Some(*only));
                }
                self.commit(candidate, "optimize")
            }
            _ => {
                if self.extend(Direction::Right, None) {
                    return true;
                }
                info!("Extended layout rejected, falling back to replication");
                self.replicate()
            }
        }
    }

    /// Lay all outputs out side by side starting at `first` (or the primary)
    pub fn extend(&mut self, direction: Direction, first: Option<OutputId>) -> bool {
        let mut candidate = self.config.clone();
        let none = BTreeSet::new();

        let start = first
            .filter(|id| candidate.output(*id).is_some())
            .or_else(|| Self::primary(&candidate, &none))
            .or_else(|| Self::biggest(&candidate, false, &none));
        let Some(start) = start else {
            warn!("No output to start extending from");
            return false;
        };

        // Outputs seen in the predecessor go first, in their previous order
        let mut known: Vec<(f64, OutputId)> = Vec::new();
        let mut fresh: Vec<OutputId> = Vec::new();
        for (id, output) in candidate.outputs() {
            if *id == start {
                continue;
            }
            let previous = self
                .predecessor
                .as_ref()
                .and_then(|p| p.output_by_hash(output.hash()));
            match previous {
                Some(prev) => known.push((prev.position.x, *id)),
                None => fresh.push(*id),
            }
        }
        known.sort_by(|a, b| match direction {
            Direction::Right => a.0.total_cmp(&b.0),
            Direction::Left => b.0.total_cmp(&a.0),
        });

        let mut x = 0.0;
        if let Some(output) = candidate.output_mut(start) {
            prepare_output(output);
            output.position = Point::default();
            if direction == Direction::Right {
                x = output.logical_size().0;
            }
        }

        for id in known.into_iter().map(|(_, id)| id).chain(fresh) {
            let Some(output) = candidate.output_mut(id) else {
                continue;
            };
            prepare_output(output);
            let width = output.logical_size().0;
            match direction {
                Direction::Right => {
                    output.position = Point::new(x, 0.0);
                    x += width;
                }
                Direction::Left => {
                    x -= width;
                    output.position = Point::new(x, 0.0);
                }
            }
            debug!(output = %output.name, x = output.position.x, width, "Placed output");
        }

        if candidate.supports(Features::PRIMARY_DISPLAY) && !candidate.primary().is_some_and(|p| p.enabled) {
            candidate.set_primary(Some(start));
        }

        self.commit(candidate, "extend")
    }

    /// Mirror every output onto the primary
    pub fn replicate(&mut self) -> bool {
        let mut candidate = self.config.clone();
        let none = BTreeSet::new();

        let source = Self::primary(&candidate, &none).or_else(|| Self::biggest(&candidate, false, &none));
        let Some(source_id) = source else {
            warn!("No output to replicate from");
            return false;
        };

        let Some(source) = candidate.output_mut(source_id) else {
            return false;
        };
        prepare_output(source);
        source.position = Point::default();
        let (origin, resolution) = (source.position, source.resolution);

        if candidate.supports(Features::PRIMARY_DISPLAY) {
            candidate.set_primary(Some(source_id));
        }

        for output in candidate.outputs_mut().filter(|o| o.id() != source_id) {
            output.enabled = true;
            output.replication_source = source_id;
            output.position = origin;

            // Prefer driving the replica at the source's resolution
            let matching = output
                .best_refresh_rate(resolution)
                .and_then(|refresh| output.modes.values().find(|m| m.matches(resolution, refresh)).cloned());
            match matching {
                Some(mode) => output.set_commanded_mode(&mode),
                None => apply_output_data(output),
            }
        }

        self.commit(candidate, "replicate")
    }

    /// Switch off the built-in panel in favour of an external output
    pub fn disable_embedded(&mut self) -> bool {
        let mut candidate = self.config.clone();

        let Some(panel) = Self::embedded(&candidate, &BTreeSet::new()) else {
            info!("No embedded output to disable");
            return false;
        };
        let Some(external) = Self::biggest(&candidate, false, &BTreeSet::from([panel])) else {
            info!("No external output to take over from the embedded one");
            return false;
        };

        for output in candidate.outputs_mut() {
            if output.id() == panel {
                output.enabled = false;
                output.replication_source = 0;
            } else if output.replication_source == panel {
                output.replication_source = 0;
            }
        }
        if let Some(output) = candidate.output_mut(external) {
            prepare_output(output);
        }

        if candidate.supports(Features::PRIMARY_DISPLAY)
            && candidate.primary_id().is_none_or(|id| id == panel)
        {
            candidate.set_primary(Some(external));
        }

        normalize_positions(&mut candidate);
        self.commit(candidate, "disable_embedded")
    }

    /// Validity gate for candidates
    pub fn check_config(&self, config: &Config) -> bool {
        if self.validity.contains(ValidityFlags::REQUIRE_AT_LEAST_ONE_ENABLED) && config.enabled_count() == 0 {
            debug!("Rejecting config without enabled outputs");
            return false;
        }

        if self.validity.contains(ValidityFlags::REQUIRE_PRIMARY)
            && config.supports(Features::PRIMARY_DISPLAY)
            && !config.primary().is_some_and(|p| p.enabled)
        {
            debug!("Rejecting config without enabled primary output");
            return false;
        }

        if self.validity.contains(ValidityFlags::ENFORCE_SCREEN_SIZE)
            && config.screen.max_size.is_valid()
            && let Some(rect) = config.bounding_rect()
            && (rect.width > config.screen.max_size.width as f64 || rect.height > config.screen.max_size.height as f64)
        {
            debug!(width = rect.width, height = rect.height, "Rejecting config exceeding the maximum screen size");
            return false;
        }

        true
    }

    /// First built-in panel not in `exclude`
    pub fn embedded(config: &Config, exclude: &BTreeSet<OutputId>) -> Option<OutputId> {
        config
            .outputs()
            .values()
            .find(|o| o.is_embedded() && !exclude.contains(&o.id()))
            .map(|o| o.id())
    }

    /// Output whose best mode has the most pixels, first one wins ties
    pub fn biggest(config: &Config, only_enabled: bool, exclude: &BTreeSet<OutputId>) -> Option<OutputId> {
        let mut best: Option<(i64, OutputId)> = None;
        for output in config.outputs().values() {
            if exclude.contains(&output.id()) || (only_enabled && !output.enabled) {
                continue;
            }
            let area = output.best_mode().map_or(0, |m| m.size().area());
            if best.is_none_or(|(best_area, _)| area > best_area) {
                best = Some((area, output.id()));
            }
        }
        best.map(|(_, id)| id)
    }

    /// Enabled embedded panel, otherwise the biggest enabled output
    pub fn primary(config: &Config, exclude: &BTreeSet<OutputId>) -> Option<OutputId> {
        Self::embedded(config, exclude)
            .filter(|id| config.output(*id).is_some_and(|o| o.enabled))
            .or_else(|| Self::biggest(config, true, exclude))
    }

    fn commit(&mut self, mut candidate: Config, operation: &str) -> bool {
        if !self.check_config(&candidate) {
            warn!(operation, "Generated config failed validation, keeping current config");
            return false;
        }
        candidate.cause = Cause::Generated;
        candidate.update_screen_size();

        let changes = self.config.apply(&candidate);
        info!(operation, changed = changes.changed.len(), "Committed generated config");
        true
    }
}

/// Enable, un-mirror and resolve auto settings before geometry is read
fn prepare_output(output: &mut Output) {
    output.enabled = true;
    output.replication_source = 0;
    apply_output_data(output);
}

fn apply_output_data(output: &mut Output) {
    if (output.auto_resolution || output.auto_refresh_rate || output.follow_preferred_mode || output.commanded_mode().is_none())
        && !output.apply_auto_mode()
    {
        debug!(output = %output.name, "Output has no mode to apply");
    }
    if output.scale <= 0.0 {
        output.scale = 1.0;
    }
}

/// Line up outputs not in `restored` to the right of the restored ones, by id
fn place_after_restored(config: &mut Config, restored: &BTreeSet<OutputId>) {
    let anchor = config
        .outputs()
        .values()
        .filter(|o| restored.contains(&o.id()) && o.positionable())
        .map(|o| o.geometry())
        .reduce(|acc, r| acc.united(&r));
    let (mut x, y) = anchor.map_or((0.0, 0.0), |r| (r.right(), r.top()));

    for output in config
        .outputs_mut()
        .filter(|o| !restored.contains(&o.id()) && o.positionable())
    {
        output.position = Point::new(x, y);
        x += output.logical_size().0;
        debug!(output = %output.name, x = output.position.x, "Placed output next to restored layout");
    }
}

/// Shift positionable outputs so the top-left-most sits at the origin
fn normalize_positions(config: &mut Config) {
    let Some(rect) = config.bounding_rect() else {
        return;
    };
    for output in config.outputs_mut().filter(|o| o.positionable()) {
        output.position.x -= rect.x;
        output.position.y -= rect.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Mode, OutputIdentity, OutputType, Retention, Screen, Size};

    fn test_output(id: OutputId, connector: &str, width: i32, height: i32) -> Output {
        let mut output = Output::new(id, OutputIdentity::new(connector));
        output.add_mode(Mode::new(format!("{id}-1"), Size::new(width, height), 60.0));
        output.add_mode(Mode::new(format!("{id}-2"), Size::new(1024, 768), 60.0));
        output
    }

    fn test_config(outputs: Vec<Output>) -> Config {
        let mut config = Config::new(
            Screen::default(),
            Features::WRITABLE | Features::PRIMARY_DISPLAY | Features::PER_OUTPUT_SCALING,
        );
        for output in outputs {
            config.add_output(output);
        }
        config
    }

    fn laptop_with_monitor() -> Config {
        let mut panel = test_output(1, "eDP-1", 1920, 1080);
        panel.output_type = OutputType::Panel;
        let monitor = test_output(2, "DP-1", 2560, 1440);
        test_config(vec![panel, monitor])
    }

    #[test]
    fn test_best_scale_without_physical_size() {
        let output = test_output(1, "DP-1", 3840, 2160);
        assert_eq!(Generator::best_scale(&output), 1.0);
    }

    #[test]
    fn test_best_scale_hidpi_panel() {
        let mut output = test_output(1, "eDP-1", 3840, 2160);
        output.physical_size = Size::new(550, 310);

        let scale = Generator::best_scale(&output);
        assert!((1.0..=3.0).contains(&scale));
        assert_eq!((scale * 10.0).round() / 10.0, scale);
        assert_eq!(scale, 1.4);
    }

    #[test]
    fn test_best_scale_never_below_one() {
        let mut output = test_output(1, "DP-1", 1920, 1080);
        output.physical_size = Size::new(600, 340);
        assert_eq!(Generator::best_scale(&output), 1.0);
    }

    #[test]
    fn test_best_scale_capped() {
        let mut output = test_output(1, "DP-1", 7680, 4320);
        output.physical_size = Size::new(80, 45);
        assert_eq!(Generator::best_scale(&output), 3.0);
    }

    #[test]
    fn test_seeds_unrestored_outputs_only() {
        let mut config = laptop_with_monitor();
        config.output_mut(1).unwrap().physical_size = Size::new(200, 110);
        config.output_mut(2).unwrap().scale = 2.0;
        config.output_mut(2).unwrap().retention = Retention::Global;

        let generator = Generator::with_restored(&config, &BTreeSet::from([2]));
        let seeded = generator.config().output(1).unwrap();
        assert!(seeded.enabled);
        assert_eq!(seeded.resolution, Size::new(1920, 1080));
        assert!(seeded.scale > 1.0);

        let restored = generator.config().output(2).unwrap();
        assert!(!restored.enabled);
        assert_eq!(restored.scale, 2.0);
    }

    #[test]
    fn test_seeded_outputs_placed_after_restored_layout() {
        let mut config = laptop_with_monitor();
        config.add_output(test_output(3, "HDMI-1", 1280, 1024));
        {
            let monitor = config.output_mut(2).unwrap();
            monitor.enabled = true;
            monitor.position = Point::new(100.0, 50.0);
            monitor.resolution = Size::new(2560, 1440);
            monitor.refresh = 60.0;
        }

        let generator = Generator::with_restored(&config, &BTreeSet::from([2]));
        let result = generator.config();
        assert_eq!(result.output(2).unwrap().position, Point::new(100.0, 50.0));
        assert_eq!(result.output(1).unwrap().position, Point::new(2660.0, 50.0));
        assert_eq!(result.output(3).unwrap().position, Point::new(4580.0, 50.0));

        let rects: Vec<_> = result.outputs().values().map(|o| o.geometry()).collect();
        for (i, a) in rects.iter().enumerate() {
            for b in &rects[i + 1..] {
                assert!(a.right() <= b.left() || b.right() <= a.left(), "{:?} overlaps {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_restored_output_without_mode_gets_auto_mode() {
        let mut config = laptop_with_monitor();
        config.output_mut(2).unwrap().enabled = true;
        assert!(config.output(2).unwrap().commanded_mode().is_none());

        let generator = Generator::with_restored(&config, &BTreeSet::from([1, 2]));
        let monitor = generator.config().output(2).unwrap();
        assert_eq!(monitor.resolution, Size::new(2560, 1440));
        assert!(monitor.commanded_mode().is_some());
    }

    #[test]
    fn test_optimize_without_outputs() {
        let mut generator = Generator::new(&test_config(vec![]));
        assert!(!generator.optimize());
    }

    #[test]
    fn test_optimize_single_output() {
        let mut config = test_config(vec![test_output(4, "HDMI-1", 1920, 1080)]);
        config.output_mut(4).unwrap().position = Point::new(300.0, 200.0);

        let mut generator = Generator::new(&config);
        assert!(generator.optimize());

        let result = generator.config();
        assert_eq!(result.primary_id(), Some(4));
        assert_eq!(result.output(4).unwrap().position, Point::default());
        assert_eq!(result.cause, Cause::Generated);
        assert_eq!(result.screen.current_size, Size::new(1920, 1080));
    }

    #[test]
    fn test_optimize_extends_from_embedded() {
        let mut generator = Generator::new(&laptop_with_monitor());
        assert!(generator.optimize());

        let result = generator.config();
        assert_eq!(result.primary_id(), Some(1));
        assert_eq!(result.output(1).unwrap().position, Point::new(0.0, 0.0));
        assert_eq!(result.output(2).unwrap().position, Point::new(1920.0, 0.0));
        assert!(result.outputs().values().all(|o| o.positionable()));
    }

    #[test]
    fn test_optimize_is_idempotent() {
        let mut generator = Generator::new(&laptop_with_monitor());
        assert!(generator.optimize());
        let first = generator.config().clone();

        assert!(generator.optimize());
        assert_eq!(generator.config(), &first);

        let mut live = first.clone();
        assert!(live.apply(generator.config()).is_empty());
    }

    #[test]
    fn test_extend_right_orders_new_outputs_by_id() {
        let config = test_config(vec![
            test_output(3, "DP-3", 1280, 1024),
            test_output(1, "DP-1", 2560, 1440),
            test_output(2, "DP-2", 1920, 1080),
        ]);
        let mut generator = Generator::new(&config);
        assert!(generator.extend(Direction::Right, None));

        let result = generator.config();
        // Biggest output starts at the origin, the rest follow by id
        let xs: Vec<(OutputId, f64, f64)> = [1, 2, 3]
            .iter()
            .map(|id| {
                let g = result.output(*id).unwrap().geometry();
                (*id, g.left(), g.right())
            })
            .collect();
        assert_eq!(xs, vec![(1, 0.0, 2560.0), (2, 2560.0, 4480.0), (3, 4480.0, 5760.0)]);
    }

    #[test]
    fn test_extend_left_from_given_output() {
        let mut generator = Generator::new(&laptop_with_monitor());
        assert!(generator.extend(Direction::Left, Some(2)));

        let result = generator.config();
        assert_eq!(result.output(2).unwrap().position.x, 0.0);
        assert_eq!(result.output(1).unwrap().position.x, -1920.0);
    }

    #[test]
    fn test_extend_lays_out_known_outputs_first() {
        let config = test_config(vec![
            test_output(1, "DP-1", 2560, 1440),
            test_output(2, "DP-2", 1920, 1080),
            test_output(3, "DP-3", 1920, 1080),
        ]);

        // DP-3 was already attached before, DP-2 is new
        let mut previous = test_config(vec![test_output(11, "DP-1", 2560, 1440), test_output(13, "DP-3", 1920, 1080)]);
        previous.output_mut(13).unwrap().position = Point::new(2560.0, 0.0);

        let mut generator = Generator::new(&config);
        generator.set_predecessor(previous);
        assert!(generator.extend(Direction::Right, Some(1)));

        let result = generator.config();
        assert_eq!(result.output(3).unwrap().position.x, 2560.0);
        assert_eq!(result.output(2).unwrap().position.x, 4480.0);
    }

    #[test]
    fn test_extend_applies_scale_before_geometry() {
        let mut config = laptop_with_monitor();
        config.output_mut(1).unwrap().scale = 2.0;
        let mut generator = Generator::with_restored(&config, &BTreeSet::new());
        // Seeding resets scale from physical size (unknown here) to 1.0
        assert!(generator.extend(Direction::Right, Some(1)));
        assert_eq!(generator.config().output(2).unwrap().position.x, 1920.0);

        let mut generator = Generator::with_restored(&config, &BTreeSet::from([1, 2]));
        assert!(generator.extend(Direction::Right, Some(1)));
        assert_eq!(generator.config().output(2).unwrap().position.x, 960.0);
    }

    #[test]
    fn test_replicate_single_positionable_output() {
        let mut generator = Generator::new(&laptop_with_monitor());
        assert!(generator.replicate());

        let result = generator.config();
        let positionable: Vec<OutputId> = result.outputs().values().filter(|o| o.positionable()).map(|o| o.id()).collect();
        assert_eq!(positionable, vec![1]);
        assert_eq!(result.output(2).unwrap().replication_source, 1);
        assert_eq!(result.primary_id(), Some(1));
    }

    #[test]
    fn test_replicate_uses_source_resolution() {
        let mut config = laptop_with_monitor();
        config
            .output_mut(2)
            .unwrap()
            .add_mode(Mode::new("2-3", Size::new(1920, 1080), 75.0));

        let mut generator = Generator::new(&config);
        assert!(generator.replicate());
        let replica = generator.config().output(2).unwrap();
        assert_eq!(replica.resolution, Size::new(1920, 1080));
        assert_eq!(replica.refresh, 75.0);
    }

    #[test]
    fn test_optimize_falls_back_to_replicate() {
        let mut config = laptop_with_monitor();
        config.screen.max_size = Size::new(2560, 1440);

        let mut generator = Generator::new(&config);
        assert!(generator.optimize());
        assert_eq!(generator.config().output(2).unwrap().replication_source, 1);
    }

    #[test]
    fn test_rejected_candidate_leaves_config_unchanged() {
        let mut config = laptop_with_monitor();
        config.screen.max_size = Size::new(800, 600);

        let mut generator = Generator::new(&config);
        let before = generator.config().clone();
        assert!(!generator.optimize());
        assert_eq!(generator.config(), &before);
    }

    #[test]
    fn test_disable_embedded() {
        let mut generator = Generator::new(&laptop_with_monitor());
        assert!(generator.optimize());
        assert!(generator.disable_embedded());

        let result = generator.config();
        assert!(!result.output(1).unwrap().enabled);
        let external = result.output(2).unwrap();
        assert!(external.enabled);
        assert_eq!(external.position, Point::default());
        assert_eq!(result.primary_id(), Some(2));
    }

    #[test]
    fn test_disable_embedded_needs_panel_and_external() {
        let mut generator = Generator::new(&test_config(vec![test_output(1, "DP-1", 1920, 1080)]));
        assert!(!generator.disable_embedded());

        let mut panel = test_output(1, "eDP-1", 1920, 1080);
        panel.output_type = OutputType::Panel;
        let mut generator = Generator::new(&test_config(vec![panel]));
        assert!(!generator.disable_embedded());
        assert!(generator.config().output(1).unwrap().enabled);
    }

    #[test]
    fn test_check_config_requires_enabled_output() {
        let mut config = laptop_with_monitor();
        for output in config.outputs_mut() {
            output.enabled = false;
        }
        let generator = Generator::with_restored(&config, &BTreeSet::from([1, 2]));
        assert!(!generator.check_config(&config));

        let mut generator = generator;
        generator.set_validity_flags(ValidityFlags::empty());
        assert!(generator.check_config(&config));
    }

    #[test]
    fn test_check_config_require_primary() {
        let config = laptop_with_monitor();
        let mut generator = Generator::new(&config);
        generator.set_validity_flags(ValidityFlags::REQUIRE_PRIMARY);
        assert!(!generator.check_config(generator.config()));
        assert!(generator.optimize());
        assert!(generator.check_config(generator.config()));
    }

    #[test]
    fn test_selection_heuristics() {
        let mut config = laptop_with_monitor();
        let none = BTreeSet::new();
        assert_eq!(Generator::embedded(&config, &none), Some(1));
        assert_eq!(Generator::biggest(&config, false, &none), Some(2));
        // Nothing enabled yet
        assert_eq!(Generator::primary(&config, &none), None);

        config.output_mut(1).unwrap().enabled = true;
        config.output_mut(2).unwrap().enabled = true;
        assert_eq!(Generator::primary(&config, &none), Some(1));
        assert_eq!(Generator::primary(&config, &BTreeSet::from([1])), Some(2));
    }
}
