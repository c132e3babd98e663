//! JSON preference file.
//!
//! The layout is [`PreferenceStore::snapshot`] plus a `saved_at` timestamp.
//! Entries that do not match the schema are dropped on load and reported in
//! [`PreferenceLoad::skipped`].

use crate::error::{Result, StoreError};
use crate::{iso8601_now, write_atomic};
use mealrec_core::PreferenceStore;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceOrigin {
    File,
    Empty,
}

#[derive(Debug)]
pub struct PreferenceLoad {
    pub store: PreferenceStore,
    pub origin: PreferenceOrigin,
    pub skipped: Vec<StoreError>,
}

impl PreferenceLoad {
    fn empty(skipped: Vec<StoreError>) -> Self {
        Self {
            store: PreferenceStore::new(),
            origin: PreferenceOrigin::Empty,
            skipped,
        }
    }
}

/// Loads preferences; a missing, empty, unreadable or unparsable file gives
/// an empty store.
#[must_use]
pub fn load_preferences(path: &Path) -> PreferenceLoad {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(source) if source.kind() == io::ErrorKind::NotFound => {
            debug_event!("no preferences at {}, starting fresh", path.display());
            return PreferenceLoad::empty(Vec::new());
        }
        Err(source) => {
            let err = StoreError::Unavailable {
                path: path.to_path_buf(),
                source,
            };
            warn_event!("{err}; starting with empty preferences");
            return PreferenceLoad::empty(vec![err]);
        }
    };
    if text.trim().is_empty() {
        return PreferenceLoad::empty(Vec::new());
    }

    let snapshot: Value = match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(e) => {
            let err = StoreError::malformed(path.display().to_string(), e.to_string());
            warn_event!("{err}; starting with empty preferences");
            return PreferenceLoad::empty(vec![err]);
        }
    };

    let restored = PreferenceStore::restore(&snapshot);
    let skipped: Vec<StoreError> = restored
        .issues
        .into_iter()
        .map(|issue| StoreError::malformed(issue.key, issue.reason))
        .collect();
    for err in &skipped {
        warn_event!("{}: {err}", path.display());
    }

    PreferenceLoad {
        store: restored.store,
        origin: PreferenceOrigin::File,
        skipped,
    }
}

/// Writes the store and marks it clean. On error the previous file is kept
/// and the store stays dirty.
pub fn save_preferences(path: &Path, store: &mut PreferenceStore) -> Result<()> {
    let mut snapshot = store.snapshot();
    if let Some(obj) = snapshot.as_object_mut() {
        obj.insert("saved_at".into(), Value::String(iso8601_now()));
    }
    let mut body = serde_json::to_string_pretty(&snapshot)?;
    body.push('\n');
    write_atomic(path, body.as_bytes())?;
    store.mark_clean();
    Ok(())
}

/// Saves only when the store has unsaved changes. Returns whether it wrote.
pub fn flush_preferences(path: &Path, store: &mut PreferenceStore) -> Result<bool> {
    if !store.is_dirty() {
        return Ok(false);
    }
    save_preferences(path, store)?;
    Ok(true)
}
