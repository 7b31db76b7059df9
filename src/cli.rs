use ai_video_ads::api::gemini::GeminiBackend;
use ai_video_ads::app::{GenerationStatus, TICKER_INTERVAL, UiState};
use ai_video_ads::config::Config;
use ai_video_ads::generator::{GenerationClient, GeneratorSettings, MediaStore};
use ai_video_ads::platform;
use ai_video_ads::types::{AspectRatio, VideoQuality, mime_for_path};
use ai_video_ads::view::{self, View};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Instant;

/// Turn an image and an idea into a short video ad with a voiceover script.
#[derive(Parser, Debug)]
#[command(name = "ai-video-ads-cli")]
struct Args {
    /// Ad concept, e.g. "A cinematic shot of a futuristic car at night"
    #[arg(long)]
    prompt: String,

    /// Source image (PNG, JPEG, WEBP, HEIC or HEIF)
    #[arg(long)]
    image: PathBuf,

    #[arg(long, value_enum, default_value_t = QualityArg::Hd1080p)]
    quality: QualityArg,

    #[arg(long, value_enum, default_value_t = AspectArg::Landscape)]
    aspect_ratio: AspectArg,

    /// Optional JSON settings file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    /// Read the script aloud when done
    #[arg(long)]
    listen: bool,

    /// Copy the script to the clipboard when done
    #[arg(long)]
    copy: bool,

    /// Open the video in the system player when done
    #[arg(long)]
    open: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum QualityArg {
    #[value(name = "1080p")]
    Hd1080p,
    #[value(name = "2k")]
    TwoK,
    #[value(name = "4k")]
    FourK,
}

impl From<QualityArg> for VideoQuality {
    fn from(q: QualityArg) -> Self {
        match q {
            QualityArg::Hd1080p => VideoQuality::Hd1080p,
            QualityArg::TwoK => VideoQuality::TwoK,
            QualityArg::FourK => VideoQuality::FourK,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum AspectArg {
    #[value(name = "9:16")]
    Portrait,
    #[value(name = "16:9")]
    Landscape,
}

impl From<AspectArg> for AspectRatio {
    fn from(a: AspectArg) -> Self {
        match a {
            AspectArg::Portrait => AspectRatio::Portrait,
            AspectArg::Landscape => AspectRatio::Landscape,
        }
    }
}

fn print_view(view: &View<'_>) {
    match view {
        View::Form(form) => {
            if let Some(err) = form.image_error {
                eprintln!("{err}");
            }
            if let Some(err) = form.error {
                eprintln!("{err}");
            }
        }
        View::Progress { message, .. } => println!("  {message}"),
        View::Result(result) => {
            println!("\n{}", view::SUCCESS_TITLE);
            println!("Video: {}", result.media.display());
            println!("\n{}:", view::SCRIPT_HEADING);
            for line in view::wrap_text(result.script, 72) {
                println!("  {line}");
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let cfg = Config::load(&args.config).await?;
    let backend = GeminiBackend::new(&cfg)?;
    let client = GenerationClient::new(
        backend,
        GeneratorSettings::from_config(&cfg),
        MediaStore::new(&cfg.settings.output_dir),
    );

    let mut state = UiState::new();
    state.set_prompt(args.prompt.trim());
    state.set_quality(args.quality.into());
    state.set_aspect_ratio(args.aspect_ratio.into());

    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read the file: {}", args.image.display()))?;
    state.upload_image(bytes, mime_for_path(&args.image));

    let submission = match state.begin_submit() {
        Ok(s) => s,
        Err(_) => {
            print_view(&view::render(&state, Instant::now()));
            std::process::exit(1);
        }
    };

    println!("{}", view::PROGRESS_TITLE);
    print_view(&view::render(&state, Instant::now()));

    let work = client.generate(&submission.request);
    tokio::pin!(work);
    let start = tokio::time::Instant::now() + TICKER_INTERVAL;
    let mut ticks = tokio::time::interval_at(start, TICKER_INTERVAL);
    let outcome = loop {
        tokio::select! {
            outcome = &mut work => break outcome,
            _ = ticks.tick() => {
                if state.tick(Instant::now()) {
                    print_view(&view::render(&state, Instant::now()));
                }
            }
        }
    };
    state.complete(submission.ticket, outcome);
    print_view(&view::render(&state, Instant::now()));

    if state.status != GenerationStatus::Success {
        std::process::exit(1);
    }

    if let Some(result) = state.result.clone() {
        if args.copy && platform::copy_to_clipboard(&result.script) {
            state.mark_copied(Instant::now());
            println!("{}", state.copy_label(Instant::now()));
        }
        if args.listen && !platform::speak(&result.script) {
            eprintln!("No speech engine available.");
        }
        if args.open {
            platform::open_path(result.media.path());
        }
    }

    Ok(())
}
