//! Model preset storage
//!
//! Presets are loaded once at startup and rewritten on every change.

use std::sync::Arc;

use crate::storage::{Collection, KeyValueStore};
use crate::types::{ModelPreset, UNLIMITED_TOKENS};

/// Storage key of the preset collection
pub const PRESETS_KEY: &str = "presets";

pub type PresetStore = Collection<ModelPreset>;

/// Presets offered before the user has saved any of their own
pub fn default_presets() -> Vec<ModelPreset> {
    let seed = |id: &str, name: &str, system_prompt: &str, temperature: f32, max_tokens: i32| {
        let mut preset = ModelPreset::new(name, "local-model", system_prompt, temperature, max_tokens);
        preset.id = id.to_string();
        preset
    };

    vec![
        seed(
            "preset-balanced",
            "Balanced",
            "You are a helpful assistant.",
            0.7,
            UNLIMITED_TOKENS,
        ),
        seed(
            "preset-precise",
            "Precise",
            "You are a precise technical assistant. Answer accurately and concisely, and say so when you are unsure.",
            0.2,
            2048,
        ),
        seed(
            "preset-creative",
            "Creative",
            "You are an imaginative writing partner. Offer vivid, original ideas.",
            1.2,
            UNLIMITED_TOKENS,
        ),
    ]
}

/// Load the preset collection, seeding defaults on first run
pub fn load_presets(store: Arc<dyn KeyValueStore>) -> PresetStore {
    Collection::load(store, PRESETS_KEY, default_presets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_first_run_seeds_presets() {
        let presets = load_presets(Arc::new(MemoryStore::new()));
        assert_eq!(presets.len(), 3);
        assert!(presets.get("preset-balanced").unwrap().is_unlimited());
    }

    #[test]
    fn test_seed_ids_are_unique() {
        let presets = default_presets();
        let mut ids: Vec<_> = presets.iter().map(|p| p.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), presets.len());
    }

    #[test]
    fn test_truncated_json_falls_back_to_seed() {
        let store = Arc::new(MemoryStore::with_entry(PRESETS_KEY, r#"[{"id":"x","name":"#));
        let presets = load_presets(store);
        assert_eq!(presets.items(), default_presets().as_slice());
    }

    #[test]
    fn test_emptied_collection_stays_empty() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut presets = load_presets(store.clone());
        for preset in default_presets() {
            presets.remove(&preset.id);
        }

        assert!(load_presets(store).is_empty());
    }

    #[test]
    fn test_max_tokens_sentinel_round_trips() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let mut presets = load_presets(store.clone());
        let added = presets.add(ModelPreset::new("Open", "m", "", 1.0, UNLIMITED_TOKENS));

        let reloaded = load_presets(store.clone());
        assert_eq!(reloaded.get(&added.id).map(|p| p.max_tokens), Some(-1));

        let raw = store.read(PRESETS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"maxTokens\": -1"));
    }
}
