mod common;

use healthtrust_ai::alle::AlleAiService;
use healthtrust_ai::normalize::CREDITS_URL;
use healthtrust_ai::traits::HealthAssistant;
use healthtrust_ai::types::{ChatOptions, RemoteRisk, Sensitivity, Verdict};
use healthtrust_config::AiSettings;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CHAT: &str = "/api/v1/chat/completions";

async fn service(server: &MockServer) -> AlleAiService {
    common::init_test_tracing();
    AlleAiService::from_settings(&common::settings_for(&server.uri())).expect("service")
}

#[tokio::test]
async fn chat_success_is_normalized() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT))
        .and(header("X-API-Key", "test-key"))
        .and(header("user-agent", "HealthTrust/1.0.0"))
        .and(body_partial_json(json!({"model": "gpt-4o", "max_tokens": 500})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "Wash your hands."}}],
            "usage": {"total_tokens": 9}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = service(&server)
        .await
        .send_chat_message("how do I avoid colds?", &ChatOptions::default())
        .await;

    assert!(result.success);
    assert!(result.error.is_none());
    assert!(result.fallback.is_none());
    let data = result.data.expect("data");
    assert_eq!(data.message, "Wash your hands.");
    assert_eq!(data.confidence, 0.8);
    assert_eq!(data.sources, vec!["Alle AI".to_string()]);
    assert_eq!(data.model.as_deref(), Some("gpt-4o"));
    assert_eq!(data.usage, Some(json!({"total_tokens": 9})));
    Ok(())
}

#[tokio::test]
async fn unrecognized_body_is_low_confidence_raw_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .mount(&server)
        .await;

    let result = service(&server)
        .await
        .send_chat_message("hi", &ChatOptions::default())
        .await;

    let data = result.data.expect("data");
    assert!(result.success);
    assert_eq!(data.confidence, 0.3);
    assert!(data.message.contains("\"status\""));
}

#[tokio::test]
async fn payment_required_is_reported_with_billing_details() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT))
        .respond_with(
            ResponseTemplate::new(402).set_body_json(json!({"error": {"message": "Out of credits"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let result = service(&server)
        .await
        .send_chat_message("hi", &ChatOptions::default())
        .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("API Credits Required"));
    assert_eq!(result.api_status(), Some(402));
    let data = result.data.expect("informational data");
    assert!(data.message.contains("Add Credits Required"));
    assert_eq!(data.api_error.as_deref(), Some("Out of credits"));
    assert_eq!(data.credits_url.as_deref(), Some(CREDITS_URL));
    assert!(result.fallback.is_none());
}

#[tokio::test]
async fn auth_and_rate_limit_statuses_are_classified() {
    for (status, label, marker) in [
        (401, "Authentication Error", "API Key Issue"),
        (403, "Authentication Error", "API Key Issue"),
        (429, "Rate Limit Exceeded", "Rate Limit"),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(CHAT))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;

        let result = service(&server)
            .await
            .send_chat_message("hi", &ChatOptions::default())
            .await;

        assert!(!result.success, "status {status}");
        assert_eq!(result.error.as_deref(), Some(label));
        assert_eq!(result.api_status(), Some(status));
        let data = result.data.expect("data");
        assert!(data.message.contains(marker));
        assert_eq!(data.confidence, 1.0);
    }
}

#[tokio::test]
async fn server_error_falls_back_to_topic_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let result = service(&server)
        .await
        .send_chat_message("is the covid booster needed?", &ChatOptions::default())
        .await;

    assert!(!result.success);
    assert!(result.data.is_none());
    assert!(result.error.is_some());
    let canned = result.fallback.expect("fallback");
    assert!(canned.message.starts_with("COVID-19 vaccines"));
    assert_eq!(canned.confidence, 0.6);
    assert!(!canned.verified);
}

#[tokio::test]
async fn timeout_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CHAT))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(std::time::Duration::from_secs(5))
                .set_body_json(json!({"response": "late"})),
        )
        .mount(&server)
        .await;

    let result = service(&server)
        .await
        .send_chat_message("side effects of tylenol", &ChatOptions::default())
        .await;

    assert!(!result.success);
    let canned = result.fallback.expect("fallback");
    assert!(canned.message.starts_with("All medical interventions"));
}

#[tokio::test]
async fn unconfigured_service_never_calls_out() {
    let server = MockServer::start().await;
    common::init_test_tracing();
    let settings = AiSettings {
        api_key: None,
        base_url: server.uri(),
        ..AiSettings::default()
    };
    let svc = AlleAiService::from_settings(&settings).expect("service");
    assert!(!svc.is_configured());

    let result = svc.send_chat_message("flu", &ChatOptions::default()).await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("AI service not configured"));
    assert!(result
        .fallback
        .expect("fallback")
        .message
        .contains("Annual flu vaccination"));

    let reply = svc.chat_or_fallback("flu", &ChatOptions::default()).await;
    assert!(reply.fallback);
    assert_eq!(
        reply.notice.as_deref(),
        Some("AI assistant is running in offline mode")
    );
    assert!(!svc.test_connection().await);

    let received = server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
}

#[tokio::test]
async fn fact_check_parses_embedded_json() {
    let server = MockServer::start().await;
    let content = "{\"verdict\": \"FALSE\", \"confidence\": 0.95, \"explanation\": \"No evidence.\", \"sources\": [\"WHO\"]}";
    Mock::given(method("POST"))
        .and(path(CHAT))
        .and(body_partial_json(json!({"max_tokens": 300})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": content}}]
        })))
        .mount(&server)
        .await;

    let result = service(&server)
        .await
        .fact_check_claim("5G spreads viruses")
        .await;

    let verdict = result.data.expect("verdict");
    assert_eq!(verdict.verdict, Verdict::False);
    assert_eq!(verdict.confidence, 0.95);
    assert_eq!(verdict.sources, vec!["WHO".to_string()]);
    assert_eq!(verdict.claim, "5G spreads viruses");
}

#[tokio::test]
async fn analyze_and_health_info_use_their_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/analyze"))
        .and(body_partial_json(json!({
            "task": "misinformation_detection",
            "domain": "health",
            "sensitivity": "high",
            "return_flagged_sections": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "risk_level": "high",
            "confidence": 0.9,
            "flagged_sections": [{"text": "microchip"}],
            "warnings": ["Conspiracy language"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/health-info"))
        .and(body_partial_json(json!({"topic": "measles", "audience": "general"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "summary": "Measles is highly contagious.",
            "key_points": ["MMR vaccine is effective"],
            "sources": ["CDC"]
        })))
        .mount(&server)
        .await;

    let svc = service(&server).await;
    let report = svc
        .detect_misinformation("vaccines contain a microchip", Sensitivity::High)
        .await
        .data
        .expect("report");
    assert_eq!(report.risk_level, RemoteRisk::High);
    assert_eq!(report.flagged_sections.len(), 1);
    assert_eq!(report.warnings, vec!["Conspiracy language".to_string()]);

    let info = svc
        .get_health_info("measles", "general")
        .await
        .data
        .expect("info");
    assert_eq!(info.summary, "Measles is highly contagious.");
    assert_eq!(info.confidence, 0.8);
    assert!(!info.last_updated.is_empty());
}

#[tokio::test]
async fn connection_test_accepts_payment_required() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CHAT))
        .and(body_partial_json(json!({"max_tokens": 1})))
        .respond_with(ResponseTemplate::new(402))
        .expect(1)
        .mount(&server)
        .await;

    assert!(service(&server).await.test_connection().await);
}

#[tokio::test]
async fn connection_test_fails_on_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    assert!(!service(&server).await.test_connection().await);
}
