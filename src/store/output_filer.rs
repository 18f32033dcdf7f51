//! Individual control documents, keyed by output hash alone

use serde_json::{Map, Value};
use tracing::warn;

use crate::constants::keys;
use crate::model::{Output, Retention};
use crate::store::StorePaths;
use crate::store::document::Document;
use crate::store::fields::{Field, StoredValues};

pub struct OutputFiler {
    document: Document,
    dirty: bool,
}

impl OutputFiler {
    pub fn load(paths: &StorePaths, hash: &str) -> Self {
        let path = paths.output_document(hash);
        let document = Document::load(path.clone()).unwrap_or_else(|e| {
            warn!(error = %e, "Unreadable individual document, using defaults");
            Document::empty(path)
        });
        Self { document, dirty: false }
    }

    /// Stored fields, None when nothing was ever stored for this output
    pub fn entry(&self) -> Option<&Map<String, Value>> {
        (!self.document.is_empty()).then(|| self.document.root())
    }

    /// Retention recorded alongside the individual values
    pub fn retention(&self) -> Option<Retention> {
        let mut values = StoredValues::default();
        Field::Retention
            .read(self.entry(), &mut values)
            .then_some(values.retention)
    }

    /// Replace the document with `fields` of `values`
    pub fn set_values(&mut self, output: &Output, values: &StoredValues, fields: &[Field]) {
        let mut root = Map::new();
        root.insert(keys::NAME.to_string(), Value::String(output.name.clone()));
        Field::Retention.write(values, &mut root);
        for field in fields {
            field.write(values, &mut root);
        }
        self.document.set_root(root);
        self.dirty = true;
    }

    /// Record a retention change while keeping the stored values
    ///
    /// No-op when nothing was ever stored or the retention is unchanged.
    pub fn set_retention(&mut self, retention: Retention) {
        if self.entry().is_none() || self.retention() == Some(retention) {
            return;
        }
        let mut root = self.document.root().clone();
        let values = StoredValues {
            retention,
            ..StoredValues::default()
        };
        Field::Retention.write(&values, &mut root);
        self.document.set_root(root);
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.document.save()
    }
}
