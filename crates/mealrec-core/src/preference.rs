//! Per-dish preference counters.
//!
//! The store only tracks counts; deciding what to offer lives in the
//! recommender and writing to disk lives in `mealrec-store`. The JSON shape
//! produced by [`PreferenceStore::snapshot`] is the persisted contract:
//!
//! ```json
//! { "version": 1, "total_selections": 3,
//!   "dishes": { "Chinese": { "Dumplings": { "selection_count": 3, "recommendation_count": 4 } } } }
//! ```

use crate::menu::Dish;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};

pub const SNAPSHOT_VERSION: u64 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceRecord {
    /// Times the user ended up choosing the dish.
    pub selection_count: u64,
    /// Times the dish was offered, chosen or not.
    pub recommendation_count: u64,
}

/// Explicit answer required by [`PreferenceStore::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetConfirmation {
    Confirmed,
    Declined,
}

/// Something in a snapshot that could not be taken over as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotIssue {
    pub key: String,
    pub reason: String,
}

impl SnapshotIssue {
    fn new(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Restored {
    pub store: PreferenceStore,
    pub issues: Vec<SnapshotIssue>,
}

#[derive(Debug, Clone, Default)]
pub struct PreferenceStore {
    records: BTreeMap<Dish, PreferenceRecord>,
    total_selections: u64,
    dirty: bool,
}

impl PreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `dish`, inserting a zeroed one first if needed.
    /// Inserting a zeroed record does not mark the store dirty.
    pub fn get(&mut self, dish: &Dish) -> PreferenceRecord {
        *self.records.entry(dish.clone()).or_default()
    }

    /// Read-only lookup; unknown dishes read as zero.
    pub fn peek(&self, dish: &Dish) -> PreferenceRecord {
        self.records.get(dish).copied().unwrap_or_default()
    }

    pub fn record_recommendation(&mut self, dish: &Dish) {
        let record = self.records.entry(dish.clone()).or_default();
        record.recommendation_count = record.recommendation_count.saturating_add(1);
        self.dirty = true;
    }

    /// Records one recommendation round. A dish listed twice is counted once.
    pub fn record_recommendations<'a, I>(&mut self, dishes: I)
    where
        I: IntoIterator<Item = &'a Dish>,
    {
        let distinct: BTreeSet<&Dish> = dishes.into_iter().collect();
        for dish in distinct {
            self.record_recommendation(dish);
        }
    }

    pub fn record_selection(&mut self, dish: &Dish) {
        let record = self.records.entry(dish.clone()).or_default();
        record.selection_count = record.selection_count.saturating_add(1);
        self.total_selections = self.total_selections.saturating_add(1);
        self.dirty = true;
    }

    /// Drops every record. Only [`ResetConfirmation::Confirmed`] has an
    /// effect; returns whether the store was cleared.
    pub fn reset(&mut self, confirmation: ResetConfirmation) -> bool {
        match confirmation {
            ResetConfirmation::Declined => false,
            ResetConfirmation::Confirmed => {
                self.records.clear();
                self.total_selections = 0;
                self.dirty = true;
                true
            }
        }
    }

    pub fn total_selections(&self) -> u64 {
        self.total_selections
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Dish, &PreferenceRecord)> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True when the store changed since it was loaded or last saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn snapshot(&self) -> Value {
        let mut dishes: BTreeMap<&str, Map<String, Value>> = BTreeMap::new();
        for (dish, record) in &self.records {
            dishes.entry(dish.cuisine.as_str()).or_default().insert(
                dish.name.clone(),
                json!({
                    "selection_count": record.selection_count,
                    "recommendation_count": record.recommendation_count,
                }),
            );
        }
        json!({
            "version": SNAPSHOT_VERSION,
            "total_selections": self.total_selections,
            "dishes": dishes,
        })
    }

    /// Rebuilds a store from a snapshot, skipping entries that do not fit the
    /// schema. The selection total is recomputed from the records. A missing
    /// or unknown `version` is reported; the entries are still read.
    pub fn restore(snapshot: &Value) -> Restored {
        let mut store = Self::default();
        let mut issues = Vec::new();

        let Some(cuisines) = snapshot.get("dishes").and_then(Value::as_object) else {
            issues.push(SnapshotIssue::new("dishes", "missing or not an object"));
            return Restored { store, issues };
        };

        match snapshot.get("version").map(Value::as_u64) {
            Some(Some(SNAPSHOT_VERSION)) => {}
            Some(Some(other)) => issues.push(SnapshotIssue::new(
                "version",
                format!("unsupported version {other}, expected {SNAPSHOT_VERSION}"),
            )),
            Some(None) => issues.push(SnapshotIssue::new("version", "not an unsigned integer")),
            None => issues.push(SnapshotIssue::new("version", "missing")),
        }

        for (cuisine, entries) in cuisines {
            let Some(entries) = entries.as_object() else {
                issues.push(SnapshotIssue::new(cuisine.as_str(), "cuisine entry is not an object"));
                continue;
            };
            for (name, raw) in entries {
                let key = format!("{cuisine}/{name}");
                let dish = Dish::new(cuisine.trim(), name.trim());
                if dish.cuisine.is_empty() || dish.name.is_empty() {
                    issues.push(SnapshotIssue::new(key, "blank cuisine or dish name"));
                    continue;
                }
                match PreferenceRecord::deserialize(raw) {
                    Ok(record) => {
                        store.records.insert(dish, record);
                    }
                    Err(err) => issues.push(SnapshotIssue::new(key, err.to_string())),
                }
            }
        }

        let computed = store
            .records
            .values()
            .fold(0u64, |acc, r| acc.saturating_add(r.selection_count));
        if let Some(stored) = snapshot.get("total_selections").and_then(Value::as_u64) {
            if stored != computed {
                issues.push(SnapshotIssue::new(
                    "total_selections",
                    format!("stored {stored}, recomputed {computed}"),
                ));
            }
        }
        store.total_selections = computed;

        Restored { store, issues }
    }
}
