use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Normalized assistant answer handed to callers for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatData {
    pub message: String,
    /// Always within `[0, 1]`.
    pub confidence: f64,
    pub sources: Vec<String>,
    pub verified: bool,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// HTTP status of a classified failure (401/403/402/429).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits_url: Option<String>,
}

impl ChatData {
    pub fn new(message: impl Into<String>, confidence: f64, sources: Vec<String>) -> Self {
        Self {
            message: message.into(),
            confidence: confidence.clamp(0.0, 1.0),
            sources,
            verified: false,
            timestamp: Utc::now(),
            model: None,
            usage: None,
            session_id: None,
            api_status: None,
            api_error: None,
            credits_url: None,
        }
    }

    pub fn verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Outcome of one service call.
///
/// Populated combinations:
/// - success: `data` only
/// - classified HTTP failure: `error` + informational `data`
/// - anything else: `error` + `fallback`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceResult<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<T>,
}

pub type ChatResult = ServiceResult<ChatData>;

impl<T> ServiceResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            fallback: None,
        }
    }

    pub fn failed(error: impl Into<String>, fallback: T) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            fallback: Some(fallback),
        }
    }

    /// Failure whose informational message is carried in `data`.
    pub fn rejected(error: impl Into<String>, data: T) -> Self {
        Self {
            success: false,
            data: Some(data),
            error: Some(error.into()),
            fallback: None,
        }
    }

    /// Whatever the caller should render: `data` first, then `fallback`.
    pub fn payload(&self) -> Option<&T> {
        self.data.as_ref().or(self.fallback.as_ref())
    }

    pub fn into_payload(self) -> Option<T> {
        self.data.or(self.fallback)
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

impl ChatResult {
    pub fn api_status(&self) -> Option<u16> {
        self.data.as_ref().and_then(|d| d.api_status)
    }
}

/// What the chat surface renders, with a badge flag for canned answers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub data: ChatData,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

/// Per-call overrides for a chat request.
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Body of the documented `chat/completions` contract.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    True,
    False,
    Uncertain,
}

impl std::str::FromStr for Verdict {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "TRUE" | "ACCURATE" => Ok(Self::True),
            "FALSE" | "INACCURATE" => Ok(Self::False),
            "UNCERTAIN" | "UNVERIFIED" | "UNKNOWN" => Ok(Self::Uncertain),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactCheckVerdict {
    pub claim: String,
    pub verdict: Verdict,
    pub confidence: f64,
    pub explanation: String,
    pub sources: Vec<String>,
    pub evidence: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Risk reported by the remote analyzer (distinct from the local heuristic).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RemoteRisk {
    Low,
    Medium,
    High,
    Unknown,
}

impl RemoteRisk {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Self::Low,
            "medium" => Self::Medium,
            "high" => Self::High,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sensitivity {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MisinfoReport {
    pub content: String,
    pub risk_level: RemoteRisk,
    pub confidence: f64,
    pub flagged_sections: Vec<Value>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthInfo {
    pub topic: String,
    pub summary: String,
    pub detailed_info: String,
    pub key_points: Vec<String>,
    pub sources: Vec<String>,
    pub last_updated: String,
    pub confidence: f64,
}
