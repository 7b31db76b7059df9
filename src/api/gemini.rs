use crate::api::{ApiError, GenerationBackend, TextRequest, VideoJob, VideoJobRequest};
use crate::config::Config;
use crate::logw;
use anyhow::{Context, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const API_TIMEOUT: Duration = Duration::from_secs(120);
const MEDIA_TIMEOUT: Duration = Duration::from_secs(600);
const BODY_SNIPPET_CHARS: usize = 800;

/// Generative Language REST API client.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct Operation {
    name: Option<String>,
    #[serde(default)]
    done: bool,
    response: Option<OperationResponse>,
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResponse {
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
struct VideoRef {
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    code: Option<i64>,
    message: Option<String>,
}

impl Operation {
    fn into_job(self, fallback_name: &str) -> VideoJob {
        let media_uri = self
            .response
            .and_then(|r| r.generate_video_response)
            .and_then(|r| r.generated_samples.into_iter().next())
            .and_then(|s| s.video)
            .and_then(|v| v.uri)
            .filter(|u| !u.is_empty());

        let error = self.error.map(|e| match (e.code, e.message) {
            (Some(code), Some(msg)) => format!("{msg} (code {code})"),
            (None, Some(msg)) => msg,
            (Some(code), None) => format!("code {code}"),
            (None, None) => "unknown error".to_string(),
        });

        VideoJob {
            name: self.name.unwrap_or_else(|| fallback_name.to_string()),
            done: self.done,
            media_uri,
            error,
        }
    }
}

fn snippet(raw: &str) -> String {
    raw.chars().take(BODY_SNIPPET_CHARS).collect()
}

async fn read_success_text(resp: reqwest::Response) -> Result<String, ApiError> {
    let status = resp.status();
    if !status.is_success() {
        let raw = resp.text().await.unwrap_or_default();
        return Err(ApiError::Status {
            status: status.as_u16(),
            body: snippet(&raw),
        });
    }
    Ok(resp.text().await?)
}

fn decode_operation(raw: &str, fallback_name: &str) -> Result<VideoJob, ApiError> {
    let op: Operation = serde_json::from_str(raw)
        .map_err(|e| ApiError::Decode(format!("operation body: {e}")))?;
    let job = op.into_job(fallback_name);
    if job.name.is_empty() {
        return Err(ApiError::Decode("operation has no name".to_string()));
    }
    Ok(job)
}

/// Concatenates the text parts of the first candidate.
fn extract_candidate_text(resp_json: &str) -> Option<String> {
    let root: serde_json::Value = serde_json::from_str(resp_json).ok()?;

    if let Some(err) = root.get("error") {
        if let Some(msg) = err.get("message").and_then(|v| v.as_str()) {
            logw(format!("Gemini error message: {}", msg));
        }
        return None;
    }

    let parts = root
        .get("candidates")?
        .as_array()?
        .first()?
        .get("content")?
        .get("parts")?
        .as_array()?;

    let mut out = String::new();
    for part in parts {
        if let Some(text) = part.get("text").and_then(|v| v.as_str()) {
            out.push_str(text);
        }
    }

    if out.is_empty() { None } else { Some(out) }
}

impl GeminiBackend {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = Client::builder()
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_client(
            client,
            &cfg.settings.base_url,
            &cfg.api_key,
        ))
    }

    pub fn with_client(client: Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn model_url(&self, model: &str, method: &str) -> String {
        format!("{}/v1beta/models/{}:{}", self.base_url, model, method)
    }

    /// Media locators arrive without credentials; the key rides along as a query pair.
    fn media_url(&self, uri: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(uri).map_err(|e| ApiError::InvalidUrl {
            url: uri.to_string(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn submit_video(&self, request: &VideoJobRequest) -> Result<VideoJob, ApiError> {
        let body = json!({
            "instances": [{
                "prompt": request.prompt,
                "image": {
                    "bytesBase64Encoded": BASE64.encode(&request.image.bytes),
                    "mimeType": request.image.mime.as_str(),
                },
            }],
            "parameters": {
                "aspectRatio": request.aspect_ratio.as_str(),
                "sampleCount": request.number_of_videos,
            },
        });

        let resp = self
            .client
            .post(self.model_url(&request.model, "predictLongRunning"))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .timeout(API_TIMEOUT)
            .send()
            .await?;

        let raw = read_success_text(resp).await?;
        decode_operation(&raw, "")
    }

    async fn poll_video(&self, job: &VideoJob) -> Result<VideoJob, ApiError> {
        let url = format!("{}/v1beta/{}", self.base_url, job.name);
        let resp = self
            .client
            .get(url)
            .header("x-goog-api-key", &self.api_key)
            .timeout(API_TIMEOUT)
            .send()
            .await?;

        let raw = read_success_text(resp).await?;
        decode_operation(&raw, &job.name)
    }

    async fn fetch_media(&self, uri: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.media_url(uri)?;
        let resp = self.client.get(url).timeout(MEDIA_TIMEOUT).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let raw = resp.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: snippet(&raw),
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }

    async fn generate_text(&self, request: &TextRequest) -> Result<String, ApiError> {
        let body = json!({
            "systemInstruction": {"parts": [{"text": request.system_instruction}]},
            "contents": [{"role": "user", "parts": [{"text": request.contents}]}],
        });

        let resp = self
            .client
            .post(self.model_url(&request.model, "generateContent"))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .timeout(API_TIMEOUT)
            .send()
            .await?;

        let raw = read_success_text(resp).await?;
        extract_candidate_text(&raw)
            .ok_or_else(|| ApiError::Decode(format!("no candidate text in: {}", snippet(&raw))))
    }
}
