//! Application session
//!
//! Ties the chat client, the persisted settings and both collections
//! together. The command line drives everything through [`Session`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::chat::{ChatClient, ChatRequest};
use crate::enhance::{self, Enhancement};
use crate::storage::library::{self, Library, LibraryQuery};
use crate::storage::presets::{load_presets, PresetStore};
use crate::storage::settings::{load_settings, save_settings, AppSettings};
use crate::storage::KeyValueStore;
use crate::types::{Category, EnhancedPromptRecord, ModelPreset};

/// Input rejected before any work was done
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Prompt is empty")]
    EmptyPrompt,
    #[error("Preset name is empty")]
    EmptyPresetName,
    #[error("No successful enhancement to save")]
    NothingToSave,
    #[error("No successful enhancement to generate from")]
    NoEnhancement,
    #[error("No {kind} with id '{id}'")]
    NotFound { kind: &'static str, id: String },
}

/// Which response gets displayed when requests overlap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverlapPolicy {
    /// Whatever resolves last is shown, even if it was issued first
    #[default]
    LastResolvedWins,
    /// Only the most recently issued request may update the display
    LatestIssuedOnly,
}

/// Generation number handed out when a request starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Single display slot shared by all chat calls
#[derive(Debug, Default)]
pub struct ResponseSlot {
    policy: OverlapPolicy,
    issued: AtomicU64,
    displayed: Mutex<Option<String>>,
}

impl ResponseSlot {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    pub fn issue(&self) -> Ticket {
        Ticket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Offer a finished response. Returns whether it is now displayed.
    pub fn resolve(&self, ticket: Ticket, text: &str) -> bool {
        if self.policy == OverlapPolicy::LatestIssuedOnly
            && ticket.0 != self.issued.load(Ordering::SeqCst)
        {
            tracing::debug!("Dropping stale response for request #{}", ticket.0);
            return false;
        }
        *self.displayed.lock().unwrap_or_else(|e| e.into_inner()) = Some(text.to_string());
        true
    }

    pub fn displayed(&self) -> Option<String> {
        self.displayed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

pub struct Session {
    client: ChatClient,
    store: Arc<dyn KeyValueStore>,
    settings: AppSettings,
    base_url_override: Option<String>,
    presets: PresetStore,
    library: Library,
    last_enhancement: Mutex<Option<Enhancement>>,
    slot: ResponseSlot,
}

impl Session {
    /// Load settings and both collections from `store`
    pub fn open(client: ChatClient, store: Arc<dyn KeyValueStore>) -> Self {
        let mut settings = load_settings(store.as_ref());
        let presets = load_presets(store.clone());
        let library = library::load_library(store.clone());

        if let Some(active) = settings.active_preset.as_deref() {
            if !presets.contains(active) {
                tracing::warn!("Active preset '{}' no longer exists, clearing", active);
                settings.active_preset = None;
            }
        }

        tracing::info!(
            "Session opened ({} presets, {} saved prompts)",
            presets.len(),
            library.len()
        );

        Self {
            client,
            store,
            settings,
            base_url_override: None,
            presets,
            library,
            last_enhancement: Mutex::new(None),
            slot: ResponseSlot::default(),
        }
    }

    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.slot = ResponseSlot::new(policy);
        self
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Endpoint used for requests: the session override, else the saved one
    pub fn base_url(&self) -> &str {
        self.base_url_override
            .as_deref()
            .unwrap_or(&self.settings.base_url)
    }

    /// Point this session at another endpoint without saving it
    pub fn override_base_url(&mut self, base_url: &str) {
        let trimmed = base_url.trim().trim_end_matches('/');
        self.base_url_override = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    /// Change settings, validate and save them
    pub fn update_settings(&mut self, change: impl FnOnce(&mut AppSettings)) {
        change(&mut self.settings);
        self.settings.validate();
        self.save_settings();
    }

    fn save_settings(&self) {
        if let Err(e) = save_settings(self.store.as_ref(), &self.settings) {
            tracing::warn!("Failed to save settings: {}", e);
        }
    }

    fn effective_settings(&self) -> AppSettings {
        let mut settings = self.settings.clone();
        settings.base_url = self.base_url().to_string();
        settings
    }

    // ------------------------------------------------------------------
    // Chat calls
    // ------------------------------------------------------------------

    /// Last response the display slot accepted
    pub fn displayed(&self) -> Option<String> {
        self.slot.displayed()
    }

    pub fn last_enhancement(&self) -> Option<Enhancement> {
        self.last_enhancement
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn set_last_enhancement(&self, enhancement: Option<Enhancement>) {
        *self
            .last_enhancement
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = enhancement;
    }

    /// Direct chat using the configured system prompt
    pub async fn submit(&self, user_prompt: &str) -> Result<String, SessionError> {
        let request = enhance::direct_request(&self.settings, user_prompt);
        self.submit_request(&request).await
    }

    /// Direct chat with a fully specified request
    pub async fn submit_request(&self, request: &ChatRequest) -> Result<String, SessionError> {
        if request.user_prompt.trim().is_empty() {
            return Err(SessionError::EmptyPrompt);
        }

        let ticket = self.slot.issue();
        let text = self.client.send(self.base_url(), request).await;
        self.slot.resolve(ticket, &text);
        Ok(text)
    }

    /// Rewrite `basic` into a detailed prompt
    ///
    /// A failed call clears the previous enhancement so it can't be saved
    /// against the wrong input. A response the slot rejects as stale leaves
    /// the last enhancement alone.
    pub async fn enhance(&self, basic: &str) -> Result<String, SessionError> {
        if basic.trim().is_empty() {
            return Err(SessionError::EmptyPrompt);
        }
        let settings = self.effective_settings();

        let ticket = self.slot.issue();
        let (text, enhancement) = match enhance::enhance(&self.client, &settings, basic).await {
            Ok(enhancement) => (enhancement.enhanced.clone(), Some(enhancement)),
            Err(e) => {
                tracing::warn!("Enhancement failed: {}", e);
                (format!("Error: {}", e), None)
            }
        };

        if self.slot.resolve(ticket, &text) {
            self.set_last_enhancement(enhancement);
        }
        Ok(text)
    }

    /// Run the last enhanced prompt
    pub async fn generate_from_enhancement(&self) -> Result<String, SessionError> {
        let enhancement = self.last_enhancement().ok_or(SessionError::NoEnhancement)?;
        let settings = self.effective_settings();
        let request = enhance::generation_request(&settings, &enhancement.enhanced);

        let ticket = self.slot.issue();
        let text = self.client.send(&settings.base_url, &request).await;
        self.slot.resolve(ticket, &text);
        Ok(text)
    }

    /// Re-run a saved record with its stored instruction
    pub async fn replay(&self, id: &str) -> Result<String, SessionError> {
        let record = self.library.get(id).ok_or_else(|| SessionError::NotFound {
            kind: "saved prompt",
            id: id.to_string(),
        })?;
        let settings = self.effective_settings();
        let request = enhance::replay_request(&settings, record);

        let ticket = self.slot.issue();
        let text = self.client.send(&settings.base_url, &request).await;
        self.slot.resolve(ticket, &text);
        Ok(text)
    }

    // ------------------------------------------------------------------
    // Library
    // ------------------------------------------------------------------

    pub fn library(&self) -> &Library {
        &self.library
    }

    pub fn library_view(&self, query: &LibraryQuery) -> Vec<EnhancedPromptRecord> {
        library::query(&self.library, query)
    }

    /// Store the last successful enhancement
    pub fn save_enhancement(&mut self, category: Category) -> Result<EnhancedPromptRecord, SessionError> {
        let enhancement = self.last_enhancement().ok_or(SessionError::NothingToSave)?;
        let record = self.library.add(enhancement.to_record(category));
        tracing::info!("Saved enhanced prompt {} ({})", record.id, record.category);
        Ok(record)
    }

    pub fn toggle_favorite(&mut self, id: &str) -> Result<bool, SessionError> {
        library::toggle_favorite(&mut self.library, id).ok_or_else(|| SessionError::NotFound {
            kind: "saved prompt",
            id: id.to_string(),
        })
    }

    /// Remove a saved prompt; unknown ids are ignored
    pub fn delete_record(&mut self, id: &str) -> Option<EnhancedPromptRecord> {
        self.library.remove(id)
    }

    // ------------------------------------------------------------------
    // Presets
    // ------------------------------------------------------------------

    pub fn presets(&self) -> &PresetStore {
        &self.presets
    }

    pub fn active_preset(&self) -> Option<&ModelPreset> {
        self.settings
            .active_preset
            .as_deref()
            .and_then(|id| self.presets.get(id))
    }

    /// Save the current configuration under `name`
    pub fn save_current_as_preset(&mut self, name: &str) -> Result<ModelPreset, SessionError> {
        if name.trim().is_empty() {
            return Err(SessionError::EmptyPresetName);
        }
        let preset = self.presets.add(self.settings.to_preset(name));
        tracing::info!("Saved preset '{}' ({})", preset.name, preset.id);
        Ok(preset)
    }

    /// Copy a preset into the settings and make it active
    pub fn apply_preset(&mut self, id: &str) -> Result<ModelPreset, SessionError> {
        let preset = self
            .presets
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound {
                kind: "preset",
                id: id.to_string(),
            })?;
        self.update_settings(|settings| settings.apply_preset(&preset));
        Ok(preset)
    }

    /// Delete a preset, clearing it as active if it was
    pub fn delete_preset(&mut self, id: &str) -> Option<ModelPreset> {
        let removed = self.presets.remove(id)?;
        if self.settings.active_preset.as_deref() == Some(id) {
            self.update_settings(|settings| settings.active_preset = None);
        }
        Some(removed)
    }
}
