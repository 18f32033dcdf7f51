//! Preferences for one combination of attached outputs
//!
//! A Filer is bound to a Config hash. It owns that combination's Global
//! document and lazily opens the Individual documents of outputs whose
//! retention is Individual.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{debug, error, info, warn};

use crate::constants::keys;
use crate::model::{Cause, Config, Features, OutputId, Retention};
use crate::store::StorePaths;
use crate::store::document::Document;
use crate::store::fields::{Field, Scope, StoredValues};
use crate::store::output_filer::OutputFiler;

/// Outcome of restoring preferences onto a config
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadReport {
    /// False when the Global document exists but could not be parsed
    pub readable: bool,
    /// Outputs for which stored data was found
    pub restored: BTreeSet<OutputId>,
}

pub struct Filer {
    paths: StorePaths,
    config_hash: String,
    document: Document,
    readable: bool,
    output_filers: BTreeMap<String, OutputFiler>,
}

impl Filer {
    pub fn new(paths: &StorePaths, config: &Config) -> Self {
        let config_hash = config.hash();
        let path = paths.global_document(&config_hash);

        let (document, readable) = match Document::load(path.clone()) {
            Ok(document) => (document, true),
            Err(e) => {
                error!(error = ?e, "Failed to read global control document, using defaults");
                (Document::empty(path), false)
            }
        };

        Self {
            paths: paths.clone(),
            config_hash,
            document,
            readable,
            output_filers: BTreeMap::new(),
        }
    }

    /// Hash of the output combination this Filer is bound to
    pub fn hash(&self) -> &str {
        &self.config_hash
    }

    pub fn readable(&self) -> bool {
        self.readable
    }

    fn entries(&self) -> impl Iterator<Item = &Map<String, Value>> {
        self.document
            .root()
            .get(keys::OUTPUTS)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
    }

    /// Global entry of the output with `hash`
    fn entry(&self, hash: &str) -> Option<&Map<String, Value>> {
        self.entries()
            .find(|e| e.get(keys::ID).and_then(Value::as_str) == Some(hash))
    }

    fn output_filer(&mut self, hash: &str) -> &mut OutputFiler {
        let paths = &self.paths;
        self.output_filers
            .entry(hash.to_string())
            .or_insert_with(|| OutputFiler::load(paths, hash))
    }

    /// Overlay stored preferences onto every output of `config`
    pub fn get_values(&mut self, config: &mut Config) -> ReadReport {
        let mut report = ReadReport {
            readable: self.readable,
            restored: BTreeSet::new(),
        };

        let global_fields: Vec<Field> = Field::supported(config, Scope::Global).collect();
        let retained_fields: Vec<Field> = Field::supported(config, Scope::Retained).collect();
        let ids_by_hash: BTreeMap<String, OutputId> = config
            .outputs()
            .values()
            .map(|o| (o.hash().to_string(), o.id()))
            .collect();

        let mut primary = None;
        for (hash, id) in &ids_by_hash {
            let entry = self.entry(hash).cloned();
            let individual = self.output_filer(hash);
            let individual_entry = individual.entry().cloned();
            let individual_retention = individual.retention();

            let mut values = StoredValues::default();
            for field in &global_fields {
                field.read(entry.as_ref(), &mut values);
            }
            // Individual preferences follow the output into unseen combinations
            if entry.is_none()
                && let Some(retention) = individual_retention
            {
                values.retention = retention;
            }

            let source = match values.retention {
                Retention::Individual => individual_entry.as_ref(),
                Retention::Global | Retention::Undefined => entry.as_ref(),
            };
            for field in &retained_fields {
                field.read(source, &mut values);
            }

            if entry.is_some() || (values.retention == Retention::Individual && individual_entry.is_some()) {
                report.restored.insert(*id);
            }
            if values.primary {
                primary = Some(*id);
            }

            let Some(output) = config.output_mut(*id) else {
                continue;
            };
            let fields: Vec<Field> = global_fields.iter().chain(&retained_fields).copied().collect();
            values.apply_to(output, &fields, |h| ids_by_hash.get(h).copied());
            debug!(output = %output.name, retention = ?output.retention, enabled = output.enabled, "Restored output values");
        }

        if config.supports(Features::PRIMARY_DISPLAY) {
            config.set_primary(primary);
        }
        if self.document.on_disk() && self.readable {
            config.cause = Cause::File;
        }

        info!(
            config = %self.config_hash,
            restored = report.restored.len(),
            outputs = config.outputs().len(),
            "Read stored display preferences"
        );
        report
    }

    /// Record the values of `config` in the in-memory documents
    pub fn set_values(&mut self, config: &Config) {
        let global_fields: Vec<Field> = Field::supported(config, Scope::Global).collect();
        let retained_fields: Vec<Field> = Field::supported(config, Scope::Retained).collect();

        let mut entries = Vec::new();
        for output in config.outputs().values() {
            let values = StoredValues::from_output(config, output);

            let mut entry = Map::new();
            entry.insert(keys::ID.to_string(), Value::String(output.hash().to_string()));
            entry.insert(keys::NAME.to_string(), Value::String(output.name.clone()));
            for field in &global_fields {
                field.write(&values, &mut entry);
            }

            if output.retention == Retention::Individual {
                self.output_filer(output.hash())
                    .set_values(output, &values, &retained_fields);
            } else {
                for field in &retained_fields {
                    field.write(&values, &mut entry);
                }
                // A stale Individual document must not pull the output back
                self.output_filer(output.hash()).set_retention(output.retention);
            }
            entries.push(Value::Object(entry));
        }

        let mut root = Map::new();
        if !entries.is_empty() {
            root.insert(keys::OUTPUTS.to_string(), Value::Array(entries));
        }
        self.document.set_root(root);
    }

    /// Write the Global document to `global_path` and every touched
    /// Individual document to its own path
    ///
    /// All documents are attempted; the result is false if any failed.
    pub fn save(&self, global_path: &Path) -> bool {
        let mut ok = true;

        if let Err(e) = self.document.save_to(global_path) {
            error!(error = ?e, "Failed to write global control document");
            ok = false;
        }
        for (hash, filer) in self.output_filers.iter().filter(|(_, f)| f.is_dirty()) {
            if let Err(e) = filer.save() {
                error!(output = %hash, error = ?e, "Failed to write individual control document");
                ok = false;
            }
        }

        if !ok {
            warn!(config = %self.config_hash, "Display preferences were only partially written");
        }
        ok
    }
}
