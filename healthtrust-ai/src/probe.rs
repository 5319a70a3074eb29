//! Endpoint discovery for a misconfigured Alle AI deployment.
//!
//! Walks a fixed grid of payload shapes and paths one request at a time and
//! reports what answered. Only the `probe` command uses this; chat requests
//! always go to the documented contract.

use crate::alle::AlleAiService;
use crate::normalize::normalize_reply;
use crate::traits::{HealthAssistant, HEALTH_ASSISTANT_SYSTEM_PROMPT};
use serde::Serialize;
use serde_json::{json, Value};

pub const PROBE_PATHS: [&str; 4] = [
    "chat/completions",
    "completions",
    "v1/chat/completions",
    "api/v1/chat/completions",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadShape {
    OpenAiChat,
    PromptModel,
    MinimalChat,
    BarePrompt,
}

impl PayloadShape {
    pub const ALL: [PayloadShape; 4] = [
        Self::OpenAiChat,
        Self::PromptModel,
        Self::MinimalChat,
        Self::BarePrompt,
    ];

    pub fn body(self, message: &str, model: &str) -> Value {
        match self {
            Self::OpenAiChat => json!({
                "model": model,
                "messages": [
                    {"role": "system", "content": HEALTH_ASSISTANT_SYSTEM_PROMPT},
                    {"role": "user", "content": message},
                ],
                "max_tokens": 500,
                "temperature": 0.7,
            }),
            Self::PromptModel => json!({
                "prompt": message,
                "model": "gpt-3.5-turbo",
                "max_tokens": 500,
            }),
            Self::MinimalChat => json!({
                "messages": [{"role": "user", "content": message}],
                "model": "gpt-4",
            }),
            Self::BarePrompt => json!({
                "prompt": format!(
                    "You are a health AI assistant. User asks: {message}\n\nResponse:"
                ),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeAttempt {
    pub shape: PayloadShape,
    pub path: String,
    /// `None` when no HTTP response came back.
    pub status: Option<u16>,
    pub error: Option<String>,
    pub preview: Option<String>,
}

impl ProbeAttempt {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReport {
    pub attempts: Vec<ProbeAttempt>,
    /// Index into `attempts` of the combination that answered.
    pub found: Option<usize>,
    pub credits_required: bool,
}

impl ProbeReport {
    pub fn found_attempt(&self) -> Option<&ProbeAttempt> {
        self.found.and_then(|i| self.attempts.get(i))
    }
}

const PREVIEW_CHARS: usize = 120;

/// Try each shape on each path until one succeeds or the server asks for
/// credits. An unconfigured service produces an empty report.
pub async fn probe_endpoints(service: &AlleAiService, message: &str) -> ProbeReport {
    let mut report = ProbeReport {
        attempts: Vec::new(),
        found: None,
        credits_required: false,
    };
    let Some(transport) = service.transport() else {
        tracing::warn!("probe.not_configured");
        return report;
    };
    let model = service.model_name().to_string();

    for shape in PayloadShape::ALL {
        for path in PROBE_PATHS {
            let body = shape.body(message, &model);
            let outcome = transport
                .http
                .post_json::<_, Value>(path, &body, transport.opts())
                .await;

            let attempt = match outcome {
                Ok(reply) => ProbeAttempt {
                    shape,
                    path: path.to_string(),
                    status: Some(200),
                    error: None,
                    preview: Some(normalize_reply(&reply).message.chars().take(PREVIEW_CHARS).collect()),
                },
                Err(err) => ProbeAttempt {
                    shape,
                    path: path.to_string(),
                    status: err.status(),
                    error: Some(err.to_string()),
                    preview: None,
                },
            };
            tracing::info!(?shape, path, status = ?attempt.status, ok = attempt.succeeded(), "probe.attempt");

            let stop = attempt.succeeded() || attempt.status == Some(402);
            report.credits_required = attempt.status == Some(402);
            report.attempts.push(attempt);
            if stop {
                report.found = Some(report.attempts.len() - 1);
                return report;
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_prompt_wraps_the_question() {
        let body = PayloadShape::BarePrompt.body("Is fluoride safe?", "gpt-4o");
        assert_eq!(
            body["prompt"],
            "You are a health AI assistant. User asks: Is fluoride safe?\n\nResponse:"
        );
        assert!(body.get("model").is_none());
    }

    #[test]
    fn shapes_carry_their_fixed_models() {
        assert_eq!(PayloadShape::OpenAiChat.body("q", "gpt-4o")["model"], "gpt-4o");
        assert_eq!(PayloadShape::PromptModel.body("q", "gpt-4o")["model"], "gpt-3.5-turbo");
        assert_eq!(PayloadShape::MinimalChat.body("q", "gpt-4o")["model"], "gpt-4");
    }
}
