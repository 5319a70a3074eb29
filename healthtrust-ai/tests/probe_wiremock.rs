mod common;

use healthtrust_ai::alle::AlleAiService;
use healthtrust_ai::probe::{probe_endpoints, PayloadShape};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn probe_stops_at_payment_required() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/completions"))
        .respond_with(ResponseTemplate::new(402))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let svc = AlleAiService::from_settings(&common::settings_for(&server.uri())).expect("svc");
    let report = probe_endpoints(&svc, "hello").await;

    assert_eq!(report.attempts.len(), 2);
    assert!(report.credits_required);
    let hit = report.found_attempt().expect("found");
    assert_eq!(hit.path, "completions");
    assert_eq!(hit.shape, PayloadShape::OpenAiChat);
    assert_eq!(report.attempts[0].status, Some(404));
}

#[tokio::test]
async fn probe_walks_shapes_until_one_answers() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/chat/completions"))
        .and(body_partial_json(json!({"model": "gpt-3.5-turbo"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "Hi there"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;

    let svc = AlleAiService::from_settings(&common::settings_for(&server.uri())).expect("svc");
    let report = probe_endpoints(&svc, "hello").await;

    // four OpenAI-shape misses, then the prompt+model shape on the first path
    assert_eq!(report.attempts.len(), 5);
    assert!(!report.credits_required);
    let hit = report.found_attempt().expect("found");
    assert_eq!(hit.shape, PayloadShape::PromptModel);
    assert_eq!(hit.preview.as_deref(), Some("Hi there"));
}

#[tokio::test]
async fn probe_reports_nothing_when_every_combination_fails() {
    common::init_test_tracing();
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404))
        .expect(16)
        .mount(&server)
        .await;

    let svc = AlleAiService::from_settings(&common::settings_for(&server.uri())).expect("svc");
    let report = probe_endpoints(&svc, "hello").await;
    assert_eq!(report.attempts.len(), 16);
    assert!(report.found.is_none());
}
