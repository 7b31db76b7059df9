//! Remote generation backend.
//!
//! [`GenerationBackend`] is the seam between the generation client and the
//! wire. The HTTP implementation lives in [`gemini`]; tests substitute
//! scripted fakes.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{AspectRatio, SourceImage};

pub mod gemini;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("remote job failed: {0}")]
    Job(String),
    #[error("invalid media URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct VideoJobRequest {
    pub model: String,
    pub prompt: String,
    pub image: SourceImage,
    pub aspect_ratio: AspectRatio,
    pub number_of_videos: u32,
}

/// Handle to a long-running remote video operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoJob {
    pub name: String,
    pub done: bool,
    pub media_uri: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TextRequest {
    pub model: String,
    pub system_instruction: String,
    pub contents: String,
}

#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn submit_video(&self, request: &VideoJobRequest) -> Result<VideoJob, ApiError>;

    async fn poll_video(&self, job: &VideoJob) -> Result<VideoJob, ApiError>;

    async fn fetch_media(&self, uri: &str) -> Result<Vec<u8>, ApiError>;

    async fn generate_text(&self, request: &TextRequest) -> Result<String, ApiError>;
}
