//! Persisted record collections
//!
//! An ordered, id-keyed list of records stored as one JSON array under a
//! single key. Every mutation rewrites the whole array.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::storage::{KeyValueStore, StorageError};

/// A record that can live in a [`Collection`]
pub trait Record: Clone + Serialize + DeserializeOwned {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}

/// Ordered collection persisted under a fixed key
pub struct Collection<T: Record> {
    key: &'static str,
    store: Arc<dyn KeyValueStore>,
    items: Vec<T>,
}

impl<T: Record> Collection<T> {
    /// Load the collection stored under `key`
    ///
    /// Falls back to `default()` when nothing is stored yet, and also when
    /// the stored data can't be read or parsed.
    pub fn load(
        store: Arc<dyn KeyValueStore>,
        key: &'static str,
        default: impl FnOnce() -> Vec<T>,
    ) -> Self {
        let items = match Self::load_internal(store.as_ref(), key) {
            Ok(Some(items)) => items,
            Ok(None) => {
                tracing::info!("No stored '{}' collection, using defaults", key);
                default()
            }
            Err(e) => {
                tracing::warn!("Failed to load '{}' collection, using defaults: {}", key, e);
                default()
            }
        };

        Self { key, store, items }
    }

    fn load_internal(
        store: &dyn KeyValueStore,
        key: &str,
    ) -> Result<Option<Vec<T>>, StorageError> {
        let Some(json) = store.read(key)? else {
            return Ok(None);
        };
        let parsed: Vec<T> = serde_json::from_str(&json)?;

        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(parsed.len());
        for item in parsed {
            if seen.insert(item.id().to_string()) {
                items.push(item);
            } else {
                tracing::warn!("Dropping duplicate id '{}' in '{}'", item.id(), key);
            }
        }

        tracing::debug!("Loaded {} records from '{}'", items.len(), key);
        Ok(Some(items))
    }

    /// Serialize the whole collection and write it under its key
    pub fn persist(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(&self.items)?;
        self.store.write(self.key, &json)
    }

    fn persist_or_warn(&self) {
        if let Err(e) = self.persist() {
            tracing::warn!(
                "Failed to persist '{}' collection, keeping in-memory state: {}",
                self.key,
                e
            );
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn fresh_id(&self) -> String {
        loop {
            let id = Uuid::new_v4().to_string();
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// Append `record` under a freshly generated id and return the stored copy
    pub fn add(&mut self, mut record: T) -> T {
        record.set_id(self.fresh_id());
        self.items.push(record.clone());
        self.persist_or_warn();
        record
    }

    /// Apply `patch` to the record with `id`. Returns false when absent.
    ///
    /// The record keeps its id whatever the patch does.
    pub fn update(&mut self, id: &str, patch: impl FnOnce(&mut T)) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id() == id) else {
            return false;
        };
        let id = item.id().to_string();
        patch(item);
        item.set_id(id);
        self.persist_or_warn();
        true
    }

    /// Swap the record with `id` for `record`, keeping position and id
    pub fn replace(&mut self, id: &str, mut record: T) -> bool {
        self.update(id, move |item| {
            record.set_id(item.id().to_string());
            *item = record;
        })
    }

    /// Remove the record with `id`, returning it when it existed
    pub fn remove(&mut self, id: &str) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        let removed = self.items.remove(index);
        self.persist_or_warn();
        Some(removed)
    }

    /// Filter then stable-sort into a new list. Never touches the collection.
    pub fn select<P, C>(&self, predicate: P, mut comparator: C) -> Vec<T>
    where
        P: Fn(&T) -> bool,
        C: FnMut(&T, &T) -> Ordering,
    {
        let mut selected: Vec<T> = self
            .items
            .iter()
            .filter(|item| predicate(item))
            .cloned()
            .collect();
        selected.sort_by(|a, b| comparator(a, b));
        selected
    }
}
