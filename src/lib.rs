//! PromptForge Library
//!
//! Drafts detailed LLM prompts from short ones through an OpenAI-compatible
//! chat endpoint, and keeps presets and saved prompts on disk.

pub mod app;
pub mod chat;
pub mod enhance;
pub mod format;
pub mod storage;
pub mod types;
pub mod ui;

pub use app::{OverlapPolicy, Session, SessionError};
pub use chat::{ChatClient, ChatError, ChatRequest};
