//! Alle AI client speaking a single documented `chat/completions` contract.
//!
//! Every call returns a [`ServiceResult`]; transport and API failures are
//! classified at this boundary and never propagate to callers.

use crate::fallback::{
    fallback_chat_data, fallback_fact_check, fallback_health_info, fallback_misinfo_report,
};
use crate::normalize::{
    classified_failure_data, confidence_field, normalize_reply, string_list, FailureKind,
    DEFAULT_SOURCE,
};
use crate::traits::{HealthAssistant, FACT_CHECK_SYSTEM_PROMPT, HEALTH_ASSISTANT_SYSTEM_PROMPT};
use crate::types::{
    ChatCompletionRequest, ChatMessage, ChatOptions, ChatResult, FactCheckVerdict, HealthInfo,
    MisinfoReport, RemoteRisk, Sensitivity, ServiceResult, Verdict,
};
use crate::USER_AGENT;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use healthtrust_common::{HealthTrustError, Result};
use healthtrust_config::AiSettings;
use healthtrust_http::{Auth, HttpClient, HttpError, RequestOpts};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::Duration;

pub const CHAT_COMPLETIONS_PATH: &str = "chat/completions";
pub const ANALYZE_PATH: &str = "analyze";
pub const HEALTH_INFO_PATH: &str = "health-info";
pub const API_KEY_HEADER: &str = "X-API-Key";
pub const NOT_CONFIGURED: &str = "AI service not configured";

const CONNECTION_TEST_TIMEOUT: Duration = Duration::from_secs(8);
const FACT_CHECK_MAX_TOKENS: u32 = 300;

/// Configured transport: present only when both key and URL are set.
#[derive(Clone)]
pub(crate) struct Transport {
    pub(crate) http: HttpClient,
    pub(crate) api_key: String,
}

impl Transport {
    pub(crate) fn opts(&self) -> RequestOpts<'_> {
        RequestOpts {
            auth: Some(Auth::Header {
                name: API_KEY_HEADER,
                value: &self.api_key,
            }),
            ..Default::default()
        }
    }
}

#[derive(Clone)]
pub struct AlleAiService {
    transport: Option<Transport>,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl AlleAiService {
    /// Build from settings. Missing key or URL yields an unconfigured service
    /// that answers from the canned responder without touching the network.
    ///
    /// ```
    /// use healthtrust_ai::alle::AlleAiService;
    /// use healthtrust_ai::traits::HealthAssistant;
    /// use healthtrust_config::AiSettings;
    ///
    /// let service = AlleAiService::from_settings(&AiSettings::default()).unwrap();
    /// assert!(!service.is_configured());
    /// ```
    pub fn from_settings(settings: &AiSettings) -> Result<Self> {
        let transport = match (settings.api_key(), settings.base_url()) {
            (Some(key), Some(url)) => {
                let http = HttpClient::new(url)
                    .map_err(|e| HealthTrustError::Config(format!("AI base URL: {e}")))?
                    .with_timeout(Duration::from_secs(settings.timeout_secs))
                    .with_user_agent(USER_AGENT);
                Some(Transport {
                    http,
                    api_key: key.to_string(),
                })
            }
            _ => None,
        };

        tracing::info!(
            configured = transport.is_some(),
            base_url = %settings.base_url,
            model = %settings.model,
            "alle_ai.init"
        );

        Ok(Self {
            transport,
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        })
    }

    pub(crate) fn transport(&self) -> Option<&Transport> {
        self.transport.as_ref()
    }

    fn chat_request(&self, message: &str, opts: &ChatOptions) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: opts.model.clone().unwrap_or_else(|| self.model.clone()),
            messages: vec![
                ChatMessage::system(HEALTH_ASSISTANT_SYSTEM_PROMPT),
                ChatMessage::user(message),
            ],
            max_tokens: opts.max_tokens.unwrap_or(self.max_tokens),
            temperature: Some(opts.temperature.unwrap_or(self.temperature)),
        }
    }

    fn chat_failure(&self, message: &str, err: &HttpError, now: DateTime<Utc>) -> ChatResult {
        let status = err.status();
        let kind = FailureKind::from_status(status);
        tracing::warn!(?status, ?kind, error = %err, "alle_ai.chat.failed");
        match classified_failure_data(kind, status, err.api_message(), now) {
            Some(data) => ChatResult::rejected(kind.error_label(), data),
            None => ChatResult::failed(err.to_string(), fallback_chat_data(message, now)),
        }
    }
}

#[async_trait]
impl HealthAssistant for AlleAiService {
    fn is_configured(&self) -> bool {
        self.transport.is_some()
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn send_chat_message(&self, message: &str, opts: &ChatOptions) -> ChatResult {
        let now = Utc::now();
        let Some(transport) = self.transport() else {
            tracing::warn!("alle_ai.chat.not_configured");
            return ChatResult::failed(NOT_CONFIGURED, fallback_chat_data(message, now));
        };

        let request = self.chat_request(message, opts);
        tracing::debug!(model = %request.model, chars = message.len(), "alle_ai.chat.request");

        let outcome = transport
            .http
            .post_json::<_, Value>(CHAT_COMPLETIONS_PATH, &request, transport.opts())
            .await;
        match outcome {
            Ok(body) => {
                let reply = normalize_reply(&body);
                if reply.is_unparsed() {
                    tracing::warn!("alle_ai.chat.unrecognized_shape");
                }
                let mut data = reply.into_chat_data(now);
                data.model = data.model.or(Some(request.model));
                data.session_id = data.session_id.or_else(|| opts.session_id.clone());
                ChatResult::ok(data)
            }
            Err(err) => self.chat_failure(message, &err, now),
        }
    }

    async fn fact_check_claim(&self, claim: &str) -> ServiceResult<FactCheckVerdict> {
        let now = Utc::now();
        let Some(transport) = self.transport() else {
            return ServiceResult::failed(NOT_CONFIGURED, fallback_fact_check(claim, now));
        };

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(FACT_CHECK_SYSTEM_PROMPT),
                ChatMessage::user(format!("Please fact-check this health claim: \"{claim}\"")),
            ],
            max_tokens: FACT_CHECK_MAX_TOKENS,
            temperature: None,
        };

        match transport
            .http
            .post_json::<_, Value>(CHAT_COMPLETIONS_PATH, &request, transport.opts())
            .await
        {
            Ok(body) => ServiceResult::ok(parse_fact_check(claim, &body, now)),
            Err(err) => {
                tracing::warn!(error = %err, "alle_ai.fact_check.failed");
                ServiceResult::failed(err.to_string(), fallback_fact_check(claim, now))
            }
        }
    }

    async fn detect_misinformation(
        &self,
        content: &str,
        sensitivity: Sensitivity,
    ) -> ServiceResult<MisinfoReport> {
        let now = Utc::now();
        let Some(transport) = self.transport() else {
            return ServiceResult::failed(NOT_CONFIGURED, fallback_misinfo_report(content, now));
        };

        let payload = json!({
            "content": content,
            "task": "misinformation_detection",
            "domain": "health",
            "sensitivity": sensitivity,
            "return_flagged_sections": true,
        });

        match transport
            .http
            .post_json::<_, Value>(ANALYZE_PATH, &payload, transport.opts())
            .await
        {
            Ok(body) => ServiceResult::ok(MisinfoReport {
                content: content.to_string(),
                risk_level: body
                    .get("risk_level")
                    .and_then(Value::as_str)
                    .map(RemoteRisk::parse)
                    .unwrap_or(RemoteRisk::Low),
                confidence: confidence_field(&body).unwrap_or(0.5),
                flagged_sections: body
                    .get("flagged_sections")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default(),
                warnings: string_list(body.get("warnings")).unwrap_or_default(),
                suggestions: string_list(body.get("suggestions")).unwrap_or_default(),
                timestamp: now,
            }),
            Err(err) => {
                tracing::warn!(error = %err, "alle_ai.analyze.failed");
                ServiceResult::failed(err.to_string(), fallback_misinfo_report(content, now))
            }
        }
    }

    async fn get_health_info(&self, topic: &str, audience: &str) -> ServiceResult<HealthInfo> {
        let now = Utc::now();
        let Some(transport) = self.transport() else {
            return ServiceResult::failed(NOT_CONFIGURED, fallback_health_info(topic, now));
        };

        let payload = json!({
            "topic": topic,
            "task": "health_information",
            "format": "detailed",
            "include_sources": true,
            "audience": audience,
        });

        match transport
            .http
            .post_json::<_, Value>(HEALTH_INFO_PATH, &payload, transport.opts())
            .await
        {
            Ok(body) => {
                let text = |key: &str| {
                    body.get(key)
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string()
                };
                let last_updated = Some(text("last_updated"))
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| now.to_rfc3339());
                ServiceResult::ok(HealthInfo {
                    topic: topic.to_string(),
                    summary: text("summary"),
                    detailed_info: text("detailed_info"),
                    key_points: string_list(body.get("key_points")).unwrap_or_default(),
                    sources: string_list(body.get("sources")).unwrap_or_default(),
                    last_updated,
                    confidence: confidence_field(&body).unwrap_or(0.8),
                })
            }
            Err(err) => {
                tracing::warn!(error = %err, "alle_ai.health_info.failed");
                ServiceResult::failed(err.to_string(), fallback_health_info(topic, now))
            }
        }
    }

    async fn test_connection(&self) -> bool {
        let Some(transport) = self.transport() else {
            tracing::warn!("alle_ai.test_connection.not_configured");
            return false;
        };

        let mut opts = transport.opts();
        opts.timeout = Some(CONNECTION_TEST_TIMEOUT);
        if transport.http.ping("", opts.clone()).await.is_ok() {
            tracing::info!("alle_ai.test_connection.base_ok");
            return true;
        }

        let probe = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": "test"}],
            "max_tokens": 1,
        });
        match transport
            .http
            .post_json::<_, Value>(CHAT_COMPLETIONS_PATH, &probe, opts)
            .await
        {
            Ok(_) => true,
            Err(err) => {
                let reachable = reachable_despite(&err);
                tracing::warn!(error = %err, reachable, "alle_ai.test_connection.chat_failed");
                reachable
            }
        }
    }
}

/// Usage or payment refusals prove the endpoint is there.
fn reachable_despite(err: &HttpError) -> bool {
    if matches!(err.status(), Some(402) | Some(429)) {
        return true;
    }
    let text = err.to_string().to_lowercase();
    ["quota", "payment", "credit"]
        .iter()
        .any(|word| text.contains(word))
}

fn verdict_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(TRUE|FALSE|UNCERTAIN)\b").expect("static regex"))
}

/// First object that parses starting at some `{` in model text, tolerating
/// ```json fences and stray braces in surrounding prose.
fn extract_json_object(text: &str) -> Option<Value> {
    text.match_indices('{').find_map(|(start, _)| {
        serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<Value>()
            .next()
            .and_then(|parsed| parsed.ok())
            .filter(Value::is_object)
    })
}

/// Build a verdict from a top-level verdict body, a JSON answer embedded in
/// the message, or plain prose, in that order.
pub fn parse_fact_check(claim: &str, body: &Value, now: DateTime<Utc>) -> FactCheckVerdict {
    let reply = normalize_reply(body);
    let structured = if body.get("verdict").is_some() {
        Some(body.clone())
    } else {
        extract_json_object(&reply.message)
    };
    let fields = structured.as_ref();

    let verdict = fields
        .and_then(|f| f.get("verdict"))
        .and_then(Value::as_str)
        .and_then(|v| v.parse::<Verdict>().ok())
        .or_else(|| {
            verdict_regex()
                .captures(&reply.message)
                .and_then(|c| c.get(1))
                .and_then(|m| m.as_str().parse().ok())
        })
        .unwrap_or(Verdict::Uncertain);

    let explanation = fields
        .and_then(|f| f.get("explanation"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| (!reply.is_unparsed()).then(|| reply.message.clone()))
        .unwrap_or_else(|| "Unable to verify this claim.".to_string());

    FactCheckVerdict {
        claim: claim.to_string(),
        verdict,
        confidence: fields.and_then(confidence_field).unwrap_or(0.5),
        explanation,
        sources: fields
            .and_then(|f| string_list(f.get("sources")))
            .unwrap_or_else(|| vec![DEFAULT_SOURCE.to_string()]),
        evidence: fields
            .and_then(|f| string_list(f.get("evidence")))
            .unwrap_or_default(),
        timestamp: now,
    }
}
