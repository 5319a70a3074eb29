//! Turn loosely-typed completion bodies into [`ChatData`], and classify
//! failed calls.
//!
//! Extraction order, first non-empty string wins:
//! 1. `choices[0].message.content` (or `choices[0].text`)
//! 2. `response`
//! 3. `text`
//! 4. `content`
//! 5. `message`
//! 6. the whole body serialized, flagged low confidence
//!
//! Richer schemas are checked first, so the order matters.

use crate::types::ChatData;
use chrono::{DateTime, Utc};
use serde_json::Value;

pub const RECOGNIZED_CONFIDENCE: f64 = 0.8;
pub const UNPARSED_CONFIDENCE: f64 = 0.3;
pub const DEFAULT_SOURCE: &str = "Alle AI";

/// Which extraction path produced the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessagePath {
    Choices,
    Response,
    Text,
    Content,
    Message,
    Raw,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedReply {
    pub message: String,
    pub path: MessagePath,
    pub confidence: f64,
    pub sources: Vec<String>,
    pub verified: bool,
    pub model: Option<String>,
    pub usage: Option<Value>,
    pub session_id: Option<String>,
}

impl NormalizedReply {
    pub fn is_unparsed(&self) -> bool {
        self.path == MessagePath::Raw
    }

    pub fn into_chat_data(self, timestamp: DateTime<Utc>) -> ChatData {
        let mut data = ChatData::new(self.message, self.confidence, self.sources)
            .verified(self.verified)
            .at(timestamp);
        data.model = self.model;
        data.usage = self.usage;
        data.session_id = self.session_id;
        data
    }
}

fn non_empty_str(v: Option<&Value>) -> Option<&str> {
    v.and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

fn from_choices(body: &Value) -> Option<&str> {
    let first = body.get("choices")?.get(0)?;
    non_empty_str(first.get("message").and_then(|m| m.get("content")))
        .or_else(|| non_empty_str(first.get("text")))
}

/// Find the message text following the fixed priority order.
pub fn extract_message(body: &Value) -> Option<(MessagePath, &str)> {
    if let Some(text) = from_choices(body) {
        return Some((MessagePath::Choices, text));
    }
    [
        ("response", MessagePath::Response),
        ("text", MessagePath::Text),
        ("content", MessagePath::Content),
        ("message", MessagePath::Message),
    ]
    .into_iter()
    .find_map(|(key, path)| non_empty_str(body.get(key)).map(|text| (path, text)))
}

/// Collect a list of strings from an array field, skipping non-strings.
pub(crate) fn string_list(v: Option<&Value>) -> Option<Vec<String>> {
    let items: Vec<String> = v?
        .as_array()?
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}

pub(crate) fn confidence_field(body: &Value) -> Option<f64> {
    body.get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c.clamp(0.0, 1.0))
}

/// Normalize a completion body of unknown shape. Pure.
///
/// ```
/// use healthtrust_ai::normalize::{normalize_reply, MessagePath};
/// use serde_json::json;
///
/// let reply = normalize_reply(&json!({"choices": [{"message": {"content": "hello"}}]}));
/// assert_eq!(reply.message, "hello");
/// assert_eq!(reply.path, MessagePath::Choices);
/// assert_eq!(reply.confidence, 0.8);
///
/// let raw = normalize_reply(&json!({}));
/// assert_eq!(raw.message, "{}");
/// assert_eq!(raw.confidence, 0.3);
/// ```
pub fn normalize_reply(body: &Value) -> NormalizedReply {
    let (path, message) = match extract_message(body) {
        Some((path, text)) => (path, text.to_string()),
        None => (MessagePath::Raw, serde_json::to_string(body).unwrap_or_default()),
    };

    let default_confidence = if path == MessagePath::Raw {
        UNPARSED_CONFIDENCE
    } else {
        RECOGNIZED_CONFIDENCE
    };

    NormalizedReply {
        message,
        path,
        confidence: confidence_field(body).unwrap_or(default_confidence),
        sources: string_list(body.get("sources"))
            .unwrap_or_else(|| vec![DEFAULT_SOURCE.to_string()]),
        verified: body.get("verified").and_then(Value::as_bool).unwrap_or(true),
        model: non_empty_str(body.get("model")).map(str::to_string),
        usage: body.get("usage").filter(|u| !u.is_null()).cloned(),
        session_id: non_empty_str(body.get("session_id")).map(str::to_string),
    }
}

/// Kind of failure behind an unsuccessful remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Authentication,
    Credits,
    RateLimit,
    Generic,
}

pub const CREDITS_URL: &str = "https://alle-ai.com/dashboard";

impl FailureKind {
    /// `None` covers network errors and timeouts.
    pub fn from_status(status: Option<u16>) -> Self {
        match status {
            Some(401) | Some(403) => Self::Authentication,
            Some(402) => Self::Credits,
            Some(429) => Self::RateLimit,
            _ => Self::Generic,
        }
    }

    /// Informational text surfaced to the user; generic failures get a
    /// topic fallback instead.
    pub fn canned_message(self) -> Option<&'static str> {
        match self {
            Self::Authentication => Some(
                "🔑 **API Key Issue**: There seems to be an issue with your API key. Please check your Alle AI account and API key configuration.",
            ),
            Self::Credits => Some(
                "💳 **Add Credits Required**: Your Alle AI account needs more credits to process requests. Please visit your Alle AI dashboard to add credits and continue using the AI service.",
            ),
            Self::RateLimit => Some(
                "⏱️ **Rate Limit**: Too many requests. Please wait a moment before trying again.",
            ),
            Self::Generic => None,
        }
    }

    pub fn error_label(self) -> &'static str {
        match self {
            Self::Authentication => "Authentication Error",
            Self::Credits => "API Credits Required",
            Self::RateLimit => "Rate Limit Exceeded",
            Self::Generic => "AI service unavailable",
        }
    }

    pub fn source_label(self) -> &'static str {
        match self {
            Self::Authentication => "API Authentication",
            Self::Credits => "API Credit Check",
            Self::RateLimit => "API Rate Limit",
            Self::Generic => "HealthTrust Knowledge Base",
        }
    }
}

/// Informational `ChatData` for a classified failure, or `None` for generic.
pub fn classified_failure_data(
    kind: FailureKind,
    status: Option<u16>,
    api_message: Option<&str>,
    timestamp: DateTime<Utc>,
) -> Option<ChatData> {
    let text = kind.canned_message()?;
    let mut data = ChatData::new(text, 1.0, vec![kind.source_label().to_string()])
        .verified(true)
        .at(timestamp);
    data.api_status = status;
    if kind == FailureKind::Credits {
        data.api_error = Some(
            api_message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or("Insufficient API credits")
                .to_string(),
        );
        data.credits_url = Some(CREDITS_URL.to_string());
    }
    Some(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn openai_shape_wins_over_flat_fields() {
        let body = json!({
            "choices": [{"message": {"content": "from choices"}}],
            "response": "from response",
            "text": "from text"
        });
        let r = normalize_reply(&body);
        assert_eq!(r.message, "from choices");
        assert_eq!(r.confidence, RECOGNIZED_CONFIDENCE);
        assert_eq!(r.sources, vec!["Alle AI".to_string()]);
    }

    #[test]
    fn falls_through_in_priority_order() {
        let cases = [
            (json!({"response": "r", "text": "t", "content": "c", "message": "m"}), "r", MessagePath::Response),
            (json!({"response": "", "text": "t", "content": "c"}), "t", MessagePath::Text),
            (json!({"content": "c", "message": "m"}), "c", MessagePath::Content),
            (json!({"message": "m"}), "m", MessagePath::Message),
            (json!({"choices": [{"text": "legacy"}]}), "legacy", MessagePath::Choices),
        ];
        for (body, expected, path) in cases {
            let (got_path, got) = extract_message(&body).expect("some path");
            assert_eq!(got, expected);
            assert_eq!(got_path, path);
        }
    }

    #[test]
    fn empty_choices_content_falls_back_to_response() {
        let body = json!({"choices": [{"message": {"content": "  "}}], "response": "ok"});
        assert_eq!(normalize_reply(&body).message, "ok");
    }

    #[test]
    fn non_string_fields_are_not_messages() {
        let body = json!({"message": {"nested": true}, "status": 1});
        let r = normalize_reply(&body);
        assert!(r.is_unparsed());
        assert_eq!(r.confidence, UNPARSED_CONFIDENCE);
        assert!(r.message.contains("nested"));
    }

    #[test]
    fn body_confidence_sources_and_verified_are_honoured() {
        let body = json!({
            "response": "x",
            "confidence": 1.4,
            "sources": ["CDC", 3, "WHO"],
            "verified": false,
            "model": "gpt-4o",
            "session_id": "s-1",
            "usage": {"total_tokens": 12}
        });
        let r = normalize_reply(&body);
        assert_eq!(r.confidence, 1.0);
        assert_eq!(r.sources, vec!["CDC".to_string(), "WHO".to_string()]);
        assert!(!r.verified);
        let data = r.into_chat_data(Utc::now());
        assert_eq!(data.model.as_deref(), Some("gpt-4o"));
        assert_eq!(data.session_id.as_deref(), Some("s-1"));
        assert_eq!(data.usage, Some(json!({"total_tokens": 12})));
    }

    #[test]
    fn raw_body_confidence_still_overridable() {
        let r = normalize_reply(&json!({"confidence": 0.9}));
        assert!(r.is_unparsed());
        assert_eq!(r.confidence, 0.9);
    }

    #[test]
    fn status_classification() {
        assert_eq!(FailureKind::from_status(Some(401)), FailureKind::Authentication);
        assert_eq!(FailureKind::from_status(Some(403)), FailureKind::Authentication);
        assert_eq!(FailureKind::from_status(Some(402)), FailureKind::Credits);
        assert_eq!(FailureKind::from_status(Some(429)), FailureKind::RateLimit);
        assert_eq!(FailureKind::from_status(Some(500)), FailureKind::Generic);
        assert_eq!(FailureKind::from_status(None), FailureKind::Generic);
    }

    #[test]
    fn credits_failure_carries_billing_details() {
        let data =
            classified_failure_data(FailureKind::Credits, Some(402), None, Utc::now()).unwrap();
        assert!(data.message.contains("credits"));
        assert!(data.verified);
        assert_eq!(data.confidence, 1.0);
        assert_eq!(data.api_status, Some(402));
        assert_eq!(data.api_error.as_deref(), Some("Insufficient API credits"));
        assert_eq!(data.credits_url.as_deref(), Some(CREDITS_URL));

        assert!(classified_failure_data(FailureKind::Generic, None, None, Utc::now()).is_none());
    }
}
