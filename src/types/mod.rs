//! Shared type definitions
//!
//! This module contains the data types shared across the application.

pub mod library;
pub mod message;
pub mod preset;

pub use library::{Category, EnhancedPromptRecord};
pub use message::{Message, Role};
pub use preset::{ModelPreset, UNLIMITED_TOKENS};
