use crate::types::{
    ChatOptions, ChatReply, ChatResult, FactCheckVerdict, HealthInfo, MisinfoReport, Sensitivity,
    ServiceResult,
};
use crate::fallback::fallback_chat_data;
use async_trait::async_trait;
use chrono::Utc;

pub const HEALTH_ASSISTANT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant for HealthTrust, focused on providing accurate, evidence-based health information. Always encourage users to consult healthcare professionals for medical advice.";

pub const FACT_CHECK_SYSTEM_PROMPT: &str = r#"You are a health fact-checker. Analyze the given claim and provide a verdict (TRUE, FALSE, UNCERTAIN), confidence level, and explanation with sources.
Respond with a single JSON object: {"verdict": "TRUE" | "FALSE" | "UNCERTAIN", "confidence": number between 0 and 1, "explanation": string, "sources": [string], "evidence": [string]}"#;

/// Health-assistant operations exposed to the feed and CLI.
///
/// Implementations never fail outright: every remote problem is folded into
/// the returned [`ServiceResult`] so callers always have something to show.
#[async_trait]
pub trait HealthAssistant: Send + Sync {
    /// Whether a key and base URL are present. No I/O.
    fn is_configured(&self) -> bool;

    fn model_name(&self) -> &str;

    async fn send_chat_message(&self, message: &str, opts: &ChatOptions) -> ChatResult;

    async fn fact_check_claim(&self, claim: &str) -> ServiceResult<FactCheckVerdict>;

    async fn detect_misinformation(
        &self,
        content: &str,
        sensitivity: Sensitivity,
    ) -> ServiceResult<MisinfoReport>;

    async fn get_health_info(&self, topic: &str, audience: &str) -> ServiceResult<HealthInfo>;

    /// Reachability check; quota and rate-limit refusals count as reachable.
    async fn test_connection(&self) -> bool;

    /// Chat for display: always yields a message, flagged when canned.
    async fn chat_or_fallback(&self, message: &str, opts: &ChatOptions) -> ChatReply {
        let result = self.send_chat_message(message, opts).await;
        let error = result.error.clone();
        let (data, fallback) = match (result.is_fallback(), result.into_payload()) {
            (canned, Some(data)) => (data, canned),
            (_, None) => {
                tracing::warn!("chat result carried no payload; using canned answer");
                (fallback_chat_data(message, Utc::now()), true)
            }
        };
        let notice = if fallback {
            Some("AI assistant is running in offline mode".to_string())
        } else {
            error
        };
        ChatReply {
            data,
            fallback,
            notice,
        }
    }
}
