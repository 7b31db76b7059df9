use crate::app::{GenerationStatus, UiState};
use crate::types::{AspectRatio, VideoQuality};
use std::path::Path;
use std::time::Instant;

pub const APP_TITLE: &str = "AI Video Ad Generator";
pub const APP_TAGLINE: &str = "Turn your images and ideas into high-quality video ads in seconds.";
pub const PROGRESS_TITLE: &str = "Generating Your Video...";
pub const SUCCESS_TITLE: &str = "Your Video Ad is Ready!";
pub const SCRIPT_HEADING: &str = "AI-Generated Voiceover Script";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionItem<T> {
    pub value: T,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView<'a> {
    pub prompt: &'a str,
    pub image_summary: Option<String>,
    pub image_error: Option<&'a str>,
    pub qualities: Vec<OptionItem<VideoQuality>>,
    pub aspect_ratios: Vec<OptionItem<AspectRatio>>,
    pub error: Option<&'a str>,
    pub can_submit: bool,
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView<'a> {
    pub media: &'a Path,
    pub script: &'a str,
    pub copy_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View<'a> {
    Form(FormView<'a>),
    Progress {
        title: &'static str,
        message: &'static str,
    },
    Result(ResultView<'a>),
}

fn human_bytes(n: usize) -> String {
    const KB: f64 = 1024.0;
    let n = n as f64;
    if n < KB {
        format!("{} B", n as usize)
    } else if n < KB * KB {
        format!("{:.1} KB", n / KB)
    } else {
        format!("{:.1} MB", n / (KB * KB))
    }
}

fn form(state: &UiState) -> FormView<'_> {
    FormView {
        prompt: &state.prompt,
        image_summary: state
            .image
            .as_ref()
            .map(|img| format!("{} ({})", img.mime.as_str(), human_bytes(img.bytes.len()))),
        image_error: state.image_error.as_deref(),
        qualities: VideoQuality::ALL
            .iter()
            .map(|&q| OptionItem {
                value: q,
                label: q.label(),
                selected: q == state.quality,
            })
            .collect(),
        aspect_ratios: AspectRatio::ALL
            .iter()
            .map(|&a| OptionItem {
                value: a,
                label: a.label(),
                selected: a == state.aspect_ratio,
            })
            .collect(),
        error: state.error.as_deref(),
        can_submit: state.can_submit(),
        disabled: state.is_form_disabled(),
    }
}

pub fn render(state: &UiState, now: Instant) -> View<'_> {
    match (state.status, state.result.as_ref()) {
        (GenerationStatus::Generating, _) => View::Progress {
            title: PROGRESS_TITLE,
            message: state.loading_message(),
        },
        (GenerationStatus::Success, Some(result)) => View::Result(ResultView {
            media: result.media.path(),
            script: &result.script,
            copy_label: state.copy_label(now),
        }),
        _ => View::Form(form(state)),
    }
}

/// Wraps on word boundaries; words longer than `width` are broken.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    textwrap::wrap(text, width.max(1))
        .into_iter()
        .map(|line| line.into_owned())
        .collect()
}
