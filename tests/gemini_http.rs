use ai_video_ads::api::gemini::GeminiBackend;
use ai_video_ads::api::{ApiError, GenerationBackend, TextRequest, VideoJob};
use ai_video_ads::app::{GenerationStatus, UiState};
use ai_video_ads::generator::{FALLBACK_SCRIPT, GenerationClient, GeneratorSettings, MediaStore};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const KEY: &str = "test-key";

fn backend(server: &MockServer) -> GeminiBackend {
    GeminiBackend::with_client(reqwest::Client::new(), &server.uri(), KEY)
}

fn settings() -> GeneratorSettings {
    GeneratorSettings {
        video_model: "veo-2.0-generate-001".to_string(),
        script_model: "gemini-2.5-flash".to_string(),
        poll_interval: Duration::from_millis(20),
        poll_timeout: None,
    }
}

fn filled_state() -> UiState {
    let mut state = UiState::new();
    state.set_prompt("A cinematic shot of a futuristic car");
    assert!(state.upload_image(vec![0x89, b'P', b'N', b'G'], "image/png"));
    state
}

async fn mount_text(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(header("x-goog-api-key", KEY))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn submit_sends_base64_image_and_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/veo-2.0-generate-001:predictLongRunning"))
        .and(header("x-goog-api-key", KEY))
        .and(body_partial_json(json!({
            "instances": [{"image": {"bytesBase64Encoded": "iVBORw==", "mimeType": "image/png"}}],
            "parameters": {"aspectRatio": "9:16", "sampleCount": 1},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "models/veo-2.0-generate-001/operations/op-7"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = ai_video_ads::api::VideoJobRequest {
        model: "veo-2.0-generate-001".to_string(),
        prompt: "ad".to_string(),
        image: ai_video_ads::types::SourceImage {
            bytes: vec![0x89, b'P', b'N', b'G'],
            mime: ai_video_ads::types::ImageMime::Png,
        },
        aspect_ratio: ai_video_ads::types::AspectRatio::Portrait,
        number_of_videos: 1,
    };

    let job = backend(&server).submit_video(&request).await.unwrap();
    assert_eq!(job.name, "models/veo-2.0-generate-001/operations/op-7");
    assert!(!job.done);
}

#[tokio::test]
async fn non_success_status_keeps_body_snippet() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/operations/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("operation not found"))
        .mount(&server)
        .await;

    let job = VideoJob {
        name: "operations/gone".to_string(),
        ..Default::default()
    };
    let err = backend(&server).poll_video(&job).await.unwrap_err();
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, "operation not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreadable_success_body_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/operations/garbled"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-encoding", "gzip")
                .set_body_bytes(b"definitely not gzip".to_vec()),
        )
        .mount(&server)
        .await;

    let job = VideoJob {
        name: "operations/garbled".to_string(),
        ..Default::default()
    };
    let err = backend(&server).poll_video(&job).await.unwrap_err();
    assert!(matches!(err, ApiError::Http(_)), "unexpected error: {err}");
}

#[tokio::test]
async fn fetch_appends_key_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/files/abc"))
        .and(query_param("alt", "media"))
        .and(query_param("key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"mp4".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let uri = format!("{}/files/abc?alt=media", server.uri());
    let bytes = backend(&server).fetch_media(&uri).await.unwrap();
    assert_eq!(bytes, b"mp4");
}

#[tokio::test]
async fn text_generation_sends_system_instruction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(body_partial_json(json!({
            "systemInstruction": {"parts": [{"text": "be brief"}]},
            "contents": [{"role": "user", "parts": [{"text": "Video concept: \"x\""}]}],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Short and sweet."}]}}]
        })))
        .mount(&server)
        .await;

    let text = backend(&server)
        .generate_text(&TextRequest {
            model: "gemini-2.5-flash".to_string(),
            system_instruction: "be brief".to_string(),
            contents: "Video concept: \"x\"".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(text, "Short and sweet.");
}

#[tokio::test]
async fn full_flow_polls_then_succeeds_with_fallback_script() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/v1beta/models/veo-2.0-generate-001:predictLongRunning"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "operations/op-1"})))
        .mount(&server)
        .await;

    // first two polls pending, then done
    Mock::given(method("GET"))
        .and(path("/v1beta/operations/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/op-1", "done": false
        })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1beta/operations/op-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/op-1",
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": [
                {"video": {"uri": format!("{}/files/op-1?alt=media", server.uri())}}
            ]}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/files/op-1"))
        .and(query_param("key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"video-bytes".to_vec()))
        .mount(&server)
        .await;

    mount_text(&server, ResponseTemplate::new(500).set_body_string("overloaded")).await;

    let client = GenerationClient::new(backend(&server), settings(), MediaStore::new(dir.path()));
    let mut state = filled_state();
    assert_eq!(state.submit(&client).await, Ok(GenerationStatus::Success));

    let result = state.result.clone().unwrap();
    assert_eq!(result.script, FALLBACK_SCRIPT);
    assert_eq!(std::fs::read(result.media.path()).unwrap(), b"video-bytes");
}

#[tokio::test]
async fn done_without_samples_ends_in_error_state() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/v1beta/models/veo-2.0-generate-001:predictLongRunning"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/op-2",
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": []}}
        })))
        .mount(&server)
        .await;
    mount_text(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Unused."}]}}]
        })),
    )
    .await;

    let client = GenerationClient::new(backend(&server), settings(), MediaStore::new(dir.path()));
    let mut state = filled_state();
    assert_eq!(state.submit(&client).await, Ok(GenerationStatus::Error));
    assert_eq!(
        state.error.as_deref(),
        Some("Failed to generate video: Video generation succeeded, but no download link was provided.")
    );
    assert!(state.result.is_none());
}

#[tokio::test]
async fn fetch_failure_is_reported() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("POST"))
        .and(path("/v1beta/models/veo-2.0-generate-001:predictLongRunning"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "operations/op-3",
            "done": true,
            "response": {"generateVideoResponse": {"generatedSamples": [
                {"video": {"uri": format!("{}/files/op-3?alt=media", server.uri())}}
            ]}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/op-3"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;
    mount_text(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{"content": {"parts": [{"text": "Go."}]}}]
        })),
    )
    .await;

    let client = GenerationClient::new(backend(&server), settings(), MediaStore::new(dir.path()));
    let mut state = filled_state();
    assert_eq!(state.submit(&client).await, Ok(GenerationStatus::Error));
    let message = state.error.clone().unwrap();
    assert!(message.starts_with("Failed to generate video: failed to fetch video"));
    assert!(message.contains("403"));
}
