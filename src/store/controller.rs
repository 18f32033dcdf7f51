//! Keeps a Filer bound to whatever config is current
//!
//! Closing the lid makes outputs vanish and reappear in ways the user did
//! not ask for. While the lid is closed the Global document is written to
//! an open-lid side file. The next read with the lid open again moves that
//! file back over the ordinary document.

use std::fs;
use tracing::{debug, error, info, warn};

use crate::model::Config;
use crate::store::StorePaths;
use crate::store::filer::{Filer, ReadReport};
use crate::store::lid::LidSource;

pub struct FilerController {
    paths: StorePaths,
    lid: Box<dyn LidSource>,
    filer: Option<Filer>,
}

impl FilerController {
    pub fn new(paths: StorePaths, lid: Box<dyn LidSource>) -> Self {
        Self {
            paths,
            lid,
            filer: None,
        }
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Filer bound to the last config read, if any
    pub fn filer(&self) -> Option<&Filer> {
        self.filer.as_ref()
    }

    /// Restore stored preferences onto `config`
    ///
    /// A config with a different hash than the last one read gets a fresh
    /// Filer; a config with the same hash reuses the held one.
    pub fn read(&mut self, config: &mut Config) -> ReadReport {
        let hash = config.hash();
        let switching = self.filer.as_ref().is_none_or(|f| f.hash() != hash);

        if switching {
            if self.lid.present() && self.lid.open() {
                self.merge_open_lid(&hash);
            }
            debug!(config = %hash, "Binding preference store to new output combination");
            self.filer = Some(Filer::new(&self.paths, config));
        }

        match self.filer.as_mut() {
            Some(filer) => filer.get_values(config),
            None => ReadReport::default(),
        }
    }

    /// Persist `config` through the held Filer
    ///
    /// Refuses configs whose output combination is not the one last read.
    pub fn write(&mut self, config: &Config) -> bool {
        let hash = config.hash();
        let target = if self.lid.present() && !self.lid.open() {
            info!(config = %hash, "Lid closed, writing open-lid document");
            self.paths.open_lid_document(&hash)
        } else {
            self.paths.global_document(&hash)
        };

        let Some(filer) = self.filer.as_mut() else {
            warn!(config = %hash, "Refusing to write preferences before reading them");
            return false;
        };
        if filer.hash() != hash {
            warn!(
                held = %filer.hash(),
                config = %hash,
                "Refusing to write preferences for a different output combination"
            );
            return false;
        }

        filer.set_values(config);
        filer.save(&target)
    }

    fn merge_open_lid(&self, hash: &str) {
        let open_lid = self.paths.open_lid_document(hash);
        if !open_lid.exists() {
            return;
        }

        let ordinary = self.paths.global_document(hash);
        match fs::rename(&open_lid, &ordinary) {
            Ok(()) => info!(config = %hash, "Merged open-lid document back"),
            Err(e) => error!(
                from = %open_lid.display(),
                to = %ordinary.display(),
                error = %e,
                "Failed to merge open-lid document"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Features, Mode, Output, OutputIdentity, OutputId, Point, Retention, Screen, Size};
    use crate::store::lid::{NoLid, StaticLid};
    use std::cell::Cell;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Lid whose state the test can flip after handing it over
    struct SharedLid(Rc<Cell<bool>>);

    impl LidSource for SharedLid {
        fn present(&self) -> bool {
            true
        }

        fn open(&self) -> bool {
            self.0.get()
        }
    }

    fn test_config(connectors: &[(OutputId, &str)]) -> Config {
        let mut config = Config::new(Screen::default(), Features::all());
        for (id, connector) in connectors {
            let mut output = Output::new(*id, OutputIdentity::new(*connector).with_edid("AUO", connector, ""));
            output.add_mode(Mode::new("m", Size::new(1920, 1080), 60.0));
            config.add_output(output);
        }
        config
    }

    #[test]
    fn test_write_before_read_refused() {
        let dir = TempDir::new().unwrap();
        let mut controller = FilerController::new(StorePaths::new(dir.path()), Box::new(NoLid));
        assert!(!controller.write(&test_config(&[(1, "eDP-1")])));
    }

    #[test]
    fn test_stale_write_refused() {
        let dir = TempDir::new().unwrap();
        let paths = StorePaths::new(dir.path());
        let mut controller = FilerController::new(paths.clone(), Box::new(NoLid));

        let mut first = test_config(&[(1, "eDP-1")]);
        controller.read(&mut first);

        let second = test_config(&[(1, "eDP-1"), (2, "DP-1")]);
        assert!(!controller.write(&second));
        assert!(!paths.global_document(&second.hash()).exists());

        assert!(controller.write(&first));
        assert!(paths.global_document(&first.hash()).exists());
    }

    #[test]
    fn test_read_write_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut controller = FilerController::new(StorePaths::new(dir.path()), Box::new(NoLid));

        let mut config = test_config(&[(1, "eDP-1"), (2, "DP-1")]);
        controller.read(&mut config);
        config.output_mut(2).unwrap().position = Point::new(1920.0, 0.0);
        config.output_mut(2).unwrap().retention = Retention::Global;
        assert!(controller.write(&config));

        let mut fresh = test_config(&[(3, "eDP-1"), (4, "DP-1")]);
        let mut other = FilerController::new(StorePaths::new(dir.path()), Box::new(NoLid));
        let report = other.read(&mut fresh);
        assert!(report.readable);
        assert_eq!(report.restored.len(), 2);
        assert_eq!(fresh.output(4).unwrap().position, Point::new(1920.0, 0.0));
    }

    #[test]
    fn test_closed_lid_writes_open_lid_document() {
        let dir = TempDir::new().unwrap();
        let paths = StorePaths::new(dir.path());
        let lid = StaticLid { present: true, open: false };
        let mut controller = FilerController::new(paths.clone(), Box::new(lid));

        let mut config = test_config(&[(1, "eDP-1")]);
        controller.read(&mut config);
        assert!(controller.write(&config));

        assert!(paths.open_lid_document(&config.hash()).exists());
        assert!(!paths.global_document(&config.hash()).exists());
    }

    #[test]
    fn test_lid_merge_back() {
        let dir = TempDir::new().unwrap();
        let paths = StorePaths::new(dir.path());
        let open = Rc::new(Cell::new(false));
        let mut controller = FilerController::new(paths.clone(), Box::new(SharedLid(open.clone())));

        // Lid closed: layout chosen for the combination lands in the side file
        let mut docked = test_config(&[(1, "eDP-1"), (2, "DP-1")]);
        controller.read(&mut docked);
        docked.output_mut(2).unwrap().position = Point::new(1920.0, 0.0);
        assert!(controller.write(&docked));
        let hash = docked.hash();
        assert!(paths.open_lid_document(&hash).exists());

        // Another combination in between forces a rebind later
        let mut alone = test_config(&[(1, "eDP-1")]);
        controller.read(&mut alone);

        // Lid opens, the combination returns
        open.set(true);
        let mut again = test_config(&[(1, "eDP-1"), (2, "DP-1")]);
        let report = controller.read(&mut again);

        assert!(!paths.open_lid_document(&hash).exists());
        assert!(paths.global_document(&hash).exists());
        assert_eq!(report.restored.len(), 2);
        assert_eq!(again.output(2).unwrap().position, Point::new(1920.0, 0.0));
    }

    #[test]
    fn test_open_lid_document_left_alone_while_closed() {
        let dir = TempDir::new().unwrap();
        let paths = StorePaths::new(dir.path());
        let config = test_config(&[(1, "eDP-1")]);

        let side = paths.open_lid_document(&config.hash());
        fs::create_dir_all(side.parent().unwrap()).unwrap();
        fs::write(&side, r#"{"outputs": []}"#).unwrap();

        let lid = StaticLid { present: true, open: false };
        let mut controller = FilerController::new(paths.clone(), Box::new(lid));
        let mut config = config;
        controller.read(&mut config);

        assert!(side.exists());
        assert!(!paths.global_document(&config.hash()).exists());
    }
}
