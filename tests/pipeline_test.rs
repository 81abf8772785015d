//! Pipeline contract tests against a mock backend.

use check_ai_rust::api::BackendClient;
use check_ai_rust::config::Config;
use check_ai_rust::error::CheckAiError;
use check_ai_rust::pipeline::{self, BatchOptions, Session};
use check_ai_rust::scanner::ImageInfo;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::json;
use std::path::{Path, PathBuf};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// 1x1 PNG, enough for an upload fixture.
const PNG_1X1_B64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8BQDwAEhQGAhKmMIQAAAABJRU5ErkJggg==";

fn write_png(dir: &Path, name: &str) -> ImageInfo {
    let bytes = BASE64.decode(PNG_1X1_B64).expect("valid fixture");
    let file_path = dir.join(name);
    std::fs::write(&file_path, bytes).expect("write fixture");
    ImageInfo {
        path: file_path,
        file_name: name.to_string(),
    }
}

fn client_for(server_uri: &str) -> BackendClient {
    let config = Config {
        backend_url: server_uri.to_string(),
        ollama_url: "http://localhost:11434".to_string(),
        timeout_seconds: 5,
    };
    BackendClient::new(&config).expect("client")
}

fn ok_body(model: &str) -> serde_json::Value {
    json!({
        "raw_ocr_tesseract": "ZIRAAT BANKASI\nTL 1.500,50",
        "raw_ocr_easyocr": null,
        "llm_analyses": [
            {
                "model_name": model,
                "analysis": {"iban": "TR330006100519786457841326", "amount_number": 1500.5},
                "error": null
            }
        ],
        "processing_time": 1.25
    })
}

/// Empty model selection must fail as a Setup error without any request
/// leaving the client.
#[tokio::test]
async fn empty_selection_is_rejected_before_any_network_call() {
    let server = MockServer::start().await;
    let dir = tempdir().expect("tempdir");
    let image = write_png(dir.path(), "check.png");

    let client = client_for(&server.uri());
    let result = pipeline::submit_image(&client, &image, &[]).await;

    assert!(matches!(result, Err(CheckAiError::Setup(_))));
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty(), "no request may be issued");
}

/// A missing local file fails as Image Upload, also before the network.
#[tokio::test]
async fn unreadable_image_is_an_upload_error() {
    let server = MockServer::start().await;
    let image = ImageInfo {
        path: PathBuf::from("/nonexistent/check.png"),
        file_name: "check.png".to_string(),
    };

    let client = client_for(&server.uri());
    let result = pipeline::submit_image(&client, &image, &["mistral:7b".to_string()]).await;

    assert!(matches!(result, Err(CheckAiError::ImageUpload(_))));
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn fetch_models_returns_the_backend_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ollama-models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "mistral:7b", "size": 4_109_865_159u64},
            {"name": "llama2:7b"}
        ])))
        .mount(&server)
        .await;

    let models = client_for(&server.uri()).fetch_models().await.expect("models");
    assert_eq!(models.len(), 2);
    assert_eq!(models[0].name, "mistral:7b");
    assert_eq!(models[0].size, Some(4_109_865_159));
    assert_eq!(models[1].size, None);
}

#[tokio::test]
async fn fetch_models_surfaces_the_detail_body_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ollama-models"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({
            "detail": "Ollama service at http://localhost:11434 not reachable"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server.uri()).fetch_models().await.unwrap_err();
    match err {
        CheckAiError::ModelFetch(message) => {
            assert_eq!(
                message,
                "Ollama service at http://localhost:11434 not reachable"
            );
        }
        other => panic!("expected ModelFetch, got {:?}", other),
    }
}

#[tokio::test]
async fn fetch_models_synthesizes_a_message_without_a_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/ollama-models"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client_for(&server.uri()).fetch_models().await.unwrap_err();
    match err {
        CheckAiError::ModelFetch(message) => {
            assert!(!message.is_empty());
            assert!(message.contains("500"), "message was: {}", message);
        }
        other => panic!("expected ModelFetch, got {:?}", other),
    }
}

#[tokio::test]
async fn analyze_check_surfaces_the_detail_body_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ocr-check"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": "OCR failed: No text could be extracted"
        })))
        .mount(&server)
        .await;

    let dir = tempdir().expect("tempdir");
    let image = write_png(dir.path(), "check.png");
    let client = client_for(&server.uri());

    let err = pipeline::submit_image(&client, &image, &["mistral:7b".to_string()])
        .await
        .unwrap_err();
    match err {
        CheckAiError::Processing(message) => {
            assert_eq!(message, "OCR failed: No text could be extracted");
        }
        other => panic!("expected Processing, got {:?}", other),
    }
}

#[tokio::test]
async fn successful_submit_builds_a_check_result_with_timings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ocr-check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("mistral:7b")))
        .mount(&server)
        .await;

    let dir = tempdir().expect("tempdir");
    let image = write_png(dir.path(), "check.png");
    let client = client_for(&server.uri());

    let (result, timings) = pipeline::submit_image(&client, &image, &["mistral:7b".to_string()])
        .await
        .expect("submit");

    assert_eq!(result.file_name, "check.png");
    assert!(result.image_src.starts_with("data:image/png;base64,"));
    assert_eq!(result.ocr_tesseract.as_deref(), Some("ZIRAAT BANKASI\nTL 1.500,50"));
    assert_eq!(result.ocr_easyocr, None);
    assert_eq!(result.llm_analyses.len(), 1);
    assert_eq!(timings.llm_ms, Some(1250));
}

/// The 3-image batch scenario: the 2nd upload fails, images 1 and 3 still
/// land in the aggregate, and the error stays visible until the next batch.
#[tokio::test]
async fn batch_keeps_collected_results_when_one_image_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ocr-check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("mistral:7b")))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/ocr-check"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "detail": "backend exploded"
        })))
        .up_to_n_times(1)
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/ocr-check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("mistral:7b")))
        .with_priority(3)
        .mount(&server)
        .await;

    let dir = tempdir().expect("tempdir");
    let images = vec![
        write_png(dir.path(), "a.png"),
        write_png(dir.path(), "b.png"),
        write_png(dir.path(), "c.png"),
    ];

    let client = client_for(&server.uri());
    let mut session = Session::default();
    let options = BatchOptions::default();
    pipeline::process_batch(
        &client,
        &images,
        &["mistral:7b".to_string()],
        &mut session,
        &options,
    )
    .await
    .expect("batch runs to completion");

    assert_eq!(session.results.len(), 2);
    assert_eq!(session.results[0].file_name, "a.png");
    assert_eq!(session.results[1].file_name, "c.png");

    let error = session.error.as_ref().expect("error retained at batch end");
    assert_eq!(error.step, "Check Processing");
    assert_eq!(error.message, "backend exploded");

    assert!(session.times.total_processing.is_some());
    assert!(session.times.image_processing.is_some());

    // The next operation clears the retained error.
    session.begin_batch();
    assert!(session.error.is_none());
    assert!(session.results.is_empty());
}

#[tokio::test]
async fn batch_with_empty_selection_records_a_setup_error_and_sends_nothing() {
    let server = MockServer::start().await;
    let dir = tempdir().expect("tempdir");
    let images = vec![write_png(dir.path(), "a.png")];

    let client = client_for(&server.uri());
    let mut session = Session::default();
    let result = pipeline::process_batch(
        &client,
        &images,
        &[],
        &mut session,
        &BatchOptions::default(),
    )
    .await;

    assert!(matches!(result, Err(CheckAiError::Setup(_))));
    assert_eq!(session.error.as_ref().map(|e| e.step.as_str()), Some("Setup"));
    let requests = server.received_requests().await.expect("recording enabled");
    assert!(requests.is_empty());
}

#[tokio::test]
async fn batch_preserves_arrival_order_with_higher_concurrency() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ocr-check"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("mistral:7b")))
        .mount(&server)
        .await;

    let dir = tempdir().expect("tempdir");
    let images = vec![
        write_png(dir.path(), "a.png"),
        write_png(dir.path(), "b.png"),
        write_png(dir.path(), "c.png"),
    ];

    let client = client_for(&server.uri());
    let mut session = Session::default();
    let options = BatchOptions {
        concurrency: 3,
        ..Default::default()
    };
    pipeline::process_batch(
        &client,
        &images,
        &["mistral:7b".to_string()],
        &mut session,
        &options,
    )
    .await
    .expect("batch");

    let names: Vec<&str> = session.results.iter().map(|r| r.file_name.as_str()).collect();
    assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
    assert!(session.error.is_none());
}
