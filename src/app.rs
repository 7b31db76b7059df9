//! Form state controller.
//!
//! `UiState` is the single mutable record behind every front end. Generation
//! work happens elsewhere; the controller hands out a [`Submission`] and
//! later accepts its outcome through [`UiState::complete`].

use crate::api::GenerationBackend;
use crate::generator::{GenerationClient, VideoError};
use crate::types::{
    AspectRatio, GenerationRequest, GenerationResult, ImageMime, LOADING_MESSAGES, SourceImage,
    VideoQuality,
};
use std::time::{Duration, Instant};

pub const MISSING_INPUT_MESSAGE: &str = "Please provide both an image and a text prompt.";
pub const UNSUPPORTED_IMAGE_MESSAGE: &str =
    "Unsupported file type. Please use PNG, JPEG, WEBP, HEIC, or HEIF.";

pub const TICKER_INTERVAL: Duration = Duration::from_secs(3);
pub const COPIED_FLASH: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GenerationStatus {
    #[default]
    Idle,
    Generating,
    Success,
    Error,
}

/// Cycles the loading messages while a job is in flight.
#[derive(Debug, Clone)]
pub struct Ticker {
    index: usize,
    last: Option<Instant>,
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

impl Ticker {
    pub fn new() -> Self {
        Self {
            index: 0,
            last: None,
        }
    }

    pub fn restart(&mut self, now: Instant) {
        self.index = 0;
        self.last = Some(now);
    }

    pub fn advance(&mut self) {
        self.index = (self.index + 1) % LOADING_MESSAGES.len();
    }

    /// Advances once per elapsed interval; returns true if the message changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(mut last) = self.last else {
            self.last = Some(now);
            return false;
        };
        let mut changed = false;
        while now.saturating_duration_since(last) >= TICKER_INTERVAL {
            last += TICKER_INTERVAL;
            self.advance();
            changed = true;
        }
        self.last = Some(last);
        changed
    }

    pub fn message(&self) -> &'static str {
        LOADING_MESSAGES[self.index]
    }
}

/// Why `begin_submit` refused to start a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejected {
    AlreadyGenerating,
    MissingInput,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub ticket: u64,
    pub request: GenerationRequest,
}

#[derive(Debug, Clone, Default)]
pub struct UiState {
    pub prompt: String,
    pub image: Option<SourceImage>,
    pub image_error: Option<String>,
    pub quality: VideoQuality,
    pub aspect_ratio: AspectRatio,
    pub status: GenerationStatus,
    pub error: Option<String>,
    pub result: Option<GenerationResult>,
    pub ticker: Ticker,
    copied_at: Option<Instant>,
    ticket: u64,
}

impl UiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_form_disabled(&self) -> bool {
        self.status == GenerationStatus::Generating
    }

    pub fn can_submit(&self) -> bool {
        !self.prompt.is_empty() && self.image.is_some() && !self.is_form_disabled()
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        if !self.is_form_disabled() {
            self.prompt = prompt.into();
        }
    }

    pub fn set_quality(&mut self, quality: VideoQuality) {
        if !self.is_form_disabled() {
            self.quality = quality;
        }
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        if !self.is_form_disabled() {
            self.aspect_ratio = aspect_ratio;
        }
    }

    /// Accepts the image only for a supported MIME type; otherwise the image
    /// is cleared and an inline message is shown.
    pub fn upload_image(&mut self, bytes: Vec<u8>, mime: &str) -> bool {
        if self.is_form_disabled() {
            return false;
        }
        match ImageMime::parse(mime) {
            Some(mime) => {
                self.image = Some(SourceImage { bytes, mime });
                self.image_error = None;
                true
            }
            None => {
                self.image = None;
                self.image_error = Some(UNSUPPORTED_IMAGE_MESSAGE.to_string());
                false
            }
        }
    }

    pub fn begin_submit(&mut self) -> Result<Submission, SubmitRejected> {
        self.begin_submit_at(Instant::now())
    }

    pub fn begin_submit_at(&mut self, now: Instant) -> Result<Submission, SubmitRejected> {
        if self.is_form_disabled() {
            return Err(SubmitRejected::AlreadyGenerating);
        }
        let image = match (&self.image, self.prompt.is_empty()) {
            (Some(image), false) => image.clone(),
            _ => {
                self.error = Some(MISSING_INPUT_MESSAGE.to_string());
                return Err(SubmitRejected::MissingInput);
            }
        };

        self.error = None;
        self.result = None;
        self.copied_at = None;
        self.status = GenerationStatus::Generating;
        self.ticker.restart(now);
        self.ticket += 1;

        Ok(Submission {
            ticket: self.ticket,
            request: GenerationRequest {
                prompt: self.prompt.clone(),
                image,
                quality: self.quality,
                aspect_ratio: self.aspect_ratio,
            },
        })
    }

    /// Applies a finished submission. Stale tickets (superseded by a reset)
    /// are dropped and `false` is returned.
    pub fn complete(&mut self, ticket: u64, outcome: Result<GenerationResult, VideoError>) -> bool {
        if ticket != self.ticket || self.status != GenerationStatus::Generating {
            return false;
        }
        match outcome {
            Ok(result) => {
                self.result = Some(result);
                self.status = GenerationStatus::Success;
            }
            Err(err) => {
                self.error = Some(format!("Failed to generate video: {err}"));
                self.status = GenerationStatus::Error;
            }
        }
        true
    }

    pub async fn submit<B: GenerationBackend>(
        &mut self,
        client: &GenerationClient<B>,
    ) -> Result<GenerationStatus, SubmitRejected> {
        let submission = self.begin_submit()?;
        let outcome = client.generate(&submission.request).await;
        self.complete(submission.ticket, outcome);
        Ok(self.status)
    }

    /// Returns every field to its initial value. In-flight work is not
    /// stopped; its outcome will carry a stale ticket.
    pub fn reset(&mut self) {
        let ticket = self.ticket;
        *self = Self {
            ticket,
            ..Self::default()
        };
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.status == GenerationStatus::Generating && self.ticker.tick(now)
    }

    pub fn loading_message(&self) -> &'static str {
        self.ticker.message()
    }

    pub fn script(&self) -> Option<&str> {
        self.result.as_ref().map(|r| r.script.as_str())
    }

    pub fn mark_copied(&mut self, now: Instant) {
        if self.script().is_some() {
            self.copied_at = Some(now);
        }
    }

    pub fn copy_label(&self, now: Instant) -> &'static str {
        match self.copied_at {
            Some(at) if now.saturating_duration_since(at) < COPIED_FLASH => "Copied!",
            _ => "Copy Script",
        }
    }

    pub fn current_ticket(&self) -> u64 {
        self.ticket
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::FALLBACK_SCRIPT;
    use crate::generator::testing::{FakeBackend, client};
    use crate::types::MediaHandle;

    fn filled() -> UiState {
        let mut state = UiState::new();
        state.set_prompt("Sunrise over a coffee cup");
        assert!(state.upload_image(vec![0xff, 0xd8], "image/jpeg"));
        state
    }

    fn result() -> GenerationResult {
        GenerationResult {
            media: MediaHandle::new("output/a.mp4"),
            script: "Wake up.".to_string(),
        }
    }

    #[test]
    fn rejects_missing_prompt_or_image_without_status_change() {
        for status in [GenerationStatus::Idle, GenerationStatus::Error, GenerationStatus::Success] {
            let mut no_prompt = filled();
            no_prompt.prompt.clear();
            no_prompt.status = status;
            assert_eq!(no_prompt.begin_submit(), Err(SubmitRejected::MissingInput));
            assert_eq!(no_prompt.status, status);
            assert_eq!(no_prompt.error.as_deref(), Some(MISSING_INPUT_MESSAGE));

            let mut no_image = filled();
            no_image.image = None;
            no_image.status = status;
            assert_eq!(no_image.begin_submit(), Err(SubmitRejected::MissingInput));
            assert_eq!(no_image.status, status);
        }
    }

    #[test]
    fn rejects_while_generating() {
        let mut state = filled();
        let first = state.begin_submit().unwrap();
        assert_eq!(state.begin_submit(), Err(SubmitRejected::AlreadyGenerating));
        assert_eq!(state.current_ticket(), first.ticket);
        assert!(!state.can_submit());
    }

    #[test]
    fn submission_snapshots_inputs_and_clears_previous_outcome() {
        let mut state = filled();
        state.set_quality(VideoQuality::TwoK);
        state.set_aspect_ratio(AspectRatio::Portrait);
        state.error = Some("old".into());

        let sub = state.begin_submit().unwrap();
        assert_eq!(state.status, GenerationStatus::Generating);
        assert_eq!(state.error, None);
        assert_eq!(sub.request.prompt, "Sunrise over a coffee cup");
        assert_eq!(sub.request.quality, VideoQuality::TwoK);
        assert_eq!(sub.request.aspect_ratio, AspectRatio::Portrait);
        assert_eq!(sub.request.image.mime, ImageMime::Jpeg);

        state.set_prompt("changed mid-flight");
        assert_eq!(state.prompt, "Sunrise over a coffee cup");
    }

    #[test]
    fn outcome_maps_to_success_or_error() {
        let mut state = filled();
        let sub = state.begin_submit().unwrap();
        assert!(state.complete(sub.ticket, Ok(result())));
        assert_eq!(state.status, GenerationStatus::Success);
        assert_eq!(state.script(), Some("Wake up."));

        let sub = state.begin_submit().unwrap();
        assert_eq!(state.result, None);
        assert!(state.complete(sub.ticket, Err(VideoError::MissingResult)));
        assert_eq!(state.status, GenerationStatus::Error);
        assert_eq!(
            state.error.as_deref(),
            Some("Failed to generate video: Video generation succeeded, but no download link was provided.")
        );
    }

    #[test]
    fn reset_restores_defaults_and_drops_stale_outcome() {
        let mut state = filled();
        state.set_quality(VideoQuality::FourK);
        state.set_aspect_ratio(AspectRatio::Portrait);
        let sub = state.begin_submit().unwrap();
        state.reset();

        assert_eq!(state.prompt, "");
        assert!(state.image.is_none());
        assert_eq!(state.quality, VideoQuality::Hd1080p);
        assert_eq!(state.aspect_ratio, AspectRatio::Landscape);
        assert_eq!(state.status, GenerationStatus::Idle);
        assert_eq!(state.error, None);
        assert_eq!(state.result, None);

        assert!(!state.complete(sub.ticket, Ok(result())));
        assert_eq!(state.status, GenerationStatus::Idle);
    }

    #[test]
    fn reset_from_success_and_error() {
        for outcome in [Ok(result()), Err(VideoError::MissingResult)] {
            let mut state = filled();
            let sub = state.begin_submit().unwrap();
            state.complete(sub.ticket, outcome);
            state.mark_copied(Instant::now());
            state.reset();
            assert_eq!(state.status, GenerationStatus::Idle);
            assert_eq!(state.prompt, "");
            assert!(state.image.is_none() && state.error.is_none() && state.result.is_none());
            assert_eq!(state.copy_label(Instant::now()), "Copy Script");
        }
    }

    #[test]
    fn unsupported_upload_clears_image() {
        let mut state = filled();
        assert!(!state.upload_image(vec![b'G', b'I', b'F'], "image/gif"));
        assert!(state.image.is_none());
        assert_eq!(state.image_error.as_deref(), Some(UNSUPPORTED_IMAGE_MESSAGE));

        assert!(state.upload_image(vec![1], "image/webp"));
        assert_eq!(state.image_error, None);
    }

    #[test]
    fn ticker_cycles_every_three_seconds() {
        let t0 = Instant::now();
        let mut state = filled();
        state.begin_submit_at(t0).unwrap();
        assert_eq!(state.loading_message(), LOADING_MESSAGES[0]);

        assert!(!state.tick(t0 + Duration::from_millis(2999)));
        assert!(state.tick(t0 + Duration::from_secs(3)));
        assert_eq!(state.loading_message(), LOADING_MESSAGES[1]);

        state.tick(t0 + Duration::from_secs(3 * 8));
        assert_eq!(state.loading_message(), LOADING_MESSAGES[0]);
    }

    #[test]
    fn ticker_idle_outside_generation() {
        let t0 = Instant::now();
        let mut state = filled();
        assert!(!state.tick(t0 + Duration::from_secs(30)));
        assert_eq!(state.loading_message(), LOADING_MESSAGES[0]);
    }

    #[test]
    fn copy_label_flashes() {
        let t0 = Instant::now();
        let mut state = filled();
        let sub = state.begin_submit().unwrap();
        state.complete(sub.ticket, Ok(result()));
        state.mark_copied(t0);
        assert_eq!(state.copy_label(t0 + Duration::from_secs(1)), "Copied!");
        assert_eq!(state.copy_label(t0 + COPIED_FLASH), "Copy Script");
    }

    #[tokio::test(start_paused = true)]
    async fn script_failure_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(
            FakeBackend {
                polls_until_done: 2,
                script: Err("model offline".to_string()),
                ..Default::default()
            },
            dir.path(),
        );
        let mut state = filled();
        assert_eq!(state.submit(&client).await, Ok(GenerationStatus::Success));
        assert_eq!(state.script(), Some(FALLBACK_SCRIPT));
        assert!(state.result.as_ref().unwrap().media.path().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn missing_result_surfaces_as_error_state() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(
            FakeBackend {
                polls_until_done: 1,
                media_uri: None,
                ..Default::default()
            },
            dir.path(),
        );
        let mut state = filled();
        assert_eq!(state.submit(&client).await, Ok(GenerationStatus::Error));
        assert!(state.error.as_deref().unwrap().contains("no download link"));
        assert!(state.result.is_none());
    }
    #[tokio::test(start_paused = true)]
    async fn status_call_failure_surfaces_as_error_state() {
        let dir = tempfile::tempdir().unwrap();
        let client = client(
            FakeBackend {
                polls_until_done: 5,
                fail_poll_after: Some(1),
                ..Default::default()
            },
            dir.path(),
        );
        let mut state = filled();
        assert_eq!(state.submit(&client).await, Ok(GenerationStatus::Error));
        let error = state.error.as_deref().unwrap();
        assert!(error.starts_with("Failed to generate video: lost track of video job operations/fake"));
        assert!(error.contains("503"));
        assert!(state.result.is_none());
        assert!(!state.is_form_disabled());
    }
}
