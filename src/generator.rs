//! Video + script generation on top of a [`GenerationBackend`].
//!
//! The video path submits a job, polls it on a fixed interval until the
//! backend marks it done, downloads the result and stores it locally. The
//! script path never fails: any error turns into [`FALLBACK_SCRIPT`].

use crate::api::{ApiError, GenerationBackend, TextRequest, VideoJob, VideoJobRequest};
use crate::config::Config;
use crate::types::{GenerationRequest, GenerationResult, MediaHandle};
use crate::{logi, logok, logw};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

pub const FALLBACK_SCRIPT: &str = "Could not generate a script at this time. Please try again.";

const SCRIPT_SYSTEM_INSTRUCTION: &str = "You are a creative director for an advertising agency. Based on the following video ad concept, write a short, compelling voiceover script of 2-3 sentences. The script should be engaging and directly related to the concept. Only output the script text, without any labels, introductory phrases, or quotation marks.";

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("could not start video job: {0}")]
    Submit(#[source] ApiError),
    #[error("lost track of video job {job}: {source}")]
    Poll {
        job: String,
        #[source]
        source: ApiError,
    },
    #[error("video job {job} failed: {message}")]
    JobFailed { job: String, message: String },
    #[error("Video generation succeeded, but no download link was provided.")]
    MissingResult,
    #[error("failed to fetch video from the generated link: {0}")]
    Fetch(#[source] ApiError),
    #[error("failed to save video to {}: {source}", path.display())]
    Store {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("video job {job} still running after {waited:?}")]
    TimedOut { job: String, waited: Duration },
}

#[derive(Debug, Clone)]
pub struct GeneratorSettings {
    pub video_model: String,
    pub script_model: String,
    pub poll_interval: Duration,
    /// `None` polls until the job reports done.
    pub poll_timeout: Option<Duration>,
}

impl GeneratorSettings {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            video_model: cfg.settings.video_model.clone(),
            script_model: cfg.settings.script_model.clone(),
            poll_interval: cfg.poll_interval(),
            poll_timeout: cfg.poll_timeout(),
        }
    }
}

/// Writes fetched videos to a local directory.
#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Claims a fresh file name with `create_new`, so concurrent saves never
    /// write into the same file.
    pub async fn save(&self, bytes: &[u8]) -> Result<MediaHandle, std::io::Error> {
        fs::create_dir_all(&self.dir).await?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S_%3f").to_string();
        let mut n = 0;
        loop {
            let path = if n == 0 {
                self.dir.join(format!("video_ad_{stamp}.mp4"))
            } else {
                self.dir.join(format!("video_ad_{stamp}_{n}.mp4"))
            };
            let opened = OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            let mut file = match opened {
                Ok(file) => file,
                Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                    n += 1;
                    continue;
                }
                Err(err) => return Err(err),
            };
            file.write_all(bytes).await?;
            file.flush().await?;
            return Ok(MediaHandle::new(path));
        }
    }
}

pub struct GenerationClient<B> {
    backend: Arc<B>,
    settings: GeneratorSettings,
    store: MediaStore,
}

impl<B> Clone for GenerationClient<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            settings: self.settings.clone(),
            store: self.store.clone(),
        }
    }
}

fn compose_video_prompt(request: &GenerationRequest) -> String {
    format!(
        "Based on the provided image, create a dynamic and engaging video ad.\nPrompt: \"{}\"\nEnsure the final video has a professional, cinematic quality.\nThe video must be rendered in {} resolution.",
        request.prompt.trim(),
        request.quality
    )
}

impl<B: GenerationBackend> GenerationClient<B> {
    pub fn new(backend: B, settings: GeneratorSettings, store: MediaStore) -> Self {
        Self {
            backend: Arc::new(backend),
            settings,
            store,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Runs video and script generation concurrently. Only the video can fail the pair.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult, VideoError> {
        let (media, script) = tokio::join!(
            self.generate_video(request),
            self.generate_script(&request.prompt)
        );
        Ok(GenerationResult {
            media: media?,
            script,
        })
    }

    pub async fn generate_video(&self, request: &GenerationRequest) -> Result<MediaHandle, VideoError> {
        logi(format!(
            "Starting video generation (quality={}, aspect={})",
            request.quality, request.aspect_ratio
        ));

        let job_request = VideoJobRequest {
            model: self.settings.video_model.clone(),
            prompt: compose_video_prompt(request),
            image: request.image.clone(),
            aspect_ratio: request.aspect_ratio,
            number_of_videos: 1,
        };

        let job = self
            .backend
            .submit_video(&job_request)
            .await
            .map_err(VideoError::Submit)?;
        logi(format!("Video job started: {}. Polling for results...", job.name));

        let job = self.wait_for_job(job).await?;
        logok(format!("Video job complete: {}", job.name));

        if let Some(message) = job.error {
            return Err(VideoError::JobFailed {
                job: job.name,
                message,
            });
        }
        let uri = job.media_uri.ok_or(VideoError::MissingResult)?;

        let bytes = self
            .backend
            .fetch_media(&uri)
            .await
            .map_err(VideoError::Fetch)?;
        logi(format!("Fetched video ({} bytes)", bytes.len()));

        let handle = self
            .store
            .save(&bytes)
            .await
            .map_err(|source| VideoError::Store {
                path: self.store.dir().to_path_buf(),
                source,
            })?;
        logok(format!("Saved video: {}", handle.path().display()));
        Ok(handle)
    }

    /// Sleeps one interval before every status call, so a job that finishes
    /// on the Nth check costs exactly N polls.
    async fn wait_for_job(&self, mut job: VideoJob) -> Result<VideoJob, VideoError> {
        let interval = self.settings.poll_interval;
        let mut waited = Duration::ZERO;

        while !job.done {
            if let Some(limit) = self.settings.poll_timeout {
                if waited + interval > limit {
                    return Err(VideoError::TimedOut {
                        job: job.name,
                        waited,
                    });
                }
            }

            logi(format!(
                "Still processing... checking again in {} seconds.",
                interval.as_secs()
            ));
            tokio::time::sleep(interval).await;
            waited += interval;

            job = self
                .backend
                .poll_video(&job)
                .await
                .map_err(|source| VideoError::Poll {
                    job: job.name.clone(),
                    source,
                })?;
        }

        Ok(job)
    }

    pub async fn generate_script(&self, prompt: &str) -> String {
        let request = TextRequest {
            model: self.settings.script_model.clone(),
            system_instruction: SCRIPT_SYSTEM_INSTRUCTION.to_string(),
            contents: format!("Video concept: \"{}\"", prompt.trim()),
        };

        match self.backend.generate_text(&request).await {
            Ok(text) => {
                let script = text.trim();
                if script.is_empty() {
                    logw("Script model returned empty text; using fallback.");
                    return FALLBACK_SCRIPT.to_string();
                }
                logok("Generated voiceover script.");
                script.to_string()
            }
            Err(err) => {
                logw(format!("Error generating voiceover script: {err}"));
                FALLBACK_SCRIPT.to_string()
            }
        }
    }
}
