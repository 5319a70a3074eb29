//! Alle AI integration for HealthTrust.
//!
//! The [`traits::HealthAssistant`] trait is what the feed and the CLI talk
//! to. [`alle::AlleAiService`] implements it against the documented
//! `chat/completions` contract; every failure comes back as a
//! [`types::ServiceResult`] carrying either an informational message or a
//! canned answer from [`fallback`].
//!
//! # Examples
//! ```
//! use healthtrust_ai::build_assistant;
//! use healthtrust_ai::traits::HealthAssistant;
//! use healthtrust_config::AiSettings;
//!
//! let assistant = build_assistant(&AiSettings::default()).unwrap();
//! assert!(!assistant.is_configured());
//! assert_eq!(assistant.model_name(), "gpt-4o");
//! ```
pub mod alle;
pub mod fallback;
pub mod normalize;
pub mod probe;
pub mod traits;
pub mod types;

use alle::AlleAiService;
use healthtrust_config::AiSettings;
use std::sync::Arc;
use traits::HealthAssistant;

pub use alle::CHAT_COMPLETIONS_PATH;

pub const USER_AGENT: &str = "HealthTrust/1.0.0";

/// Build the assistant described by `settings`.
///
/// A missing key is not an error: the returned assistant reports
/// `is_configured() == false` and answers from the canned responder.
pub fn build_assistant(
    settings: &AiSettings,
) -> healthtrust_common::Result<Arc<dyn HealthAssistant>> {
    Ok(Arc::new(AlleAiService::from_settings(settings)?))
}
