use crossbeam::channel::{Receiver, Sender, unbounded};
use raylib::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use ai_video_ads::api::gemini::GeminiBackend;
use ai_video_ads::app::UiState;
use ai_video_ads::config::Config;
use ai_video_ads::generator::{GenerationClient, GeneratorSettings, MediaStore, VideoError};
use ai_video_ads::platform;
use ai_video_ads::set_log_hook;
use ai_video_ads::types::{AspectRatio, GenerationResult, VideoQuality, mime_for_path};
use ai_video_ads::view::{self, FormView, ResultView, View};

const LOG_MAX_LINES: usize = 300;
const LOG_LINE_MAX: usize = 600;

const COLOR_BG: Color = Color::new(25, 25, 25, 255);
const COLOR_BTN: Color = Color::new(40, 90, 170, 255);
const COLOR_BTN_HOVER: Color = Color::new(70, 120, 200, 255);
const COLOR_BTN_DISABLED: Color = Color::new(60, 60, 60, 255);
const COLOR_BTN_IDLE: Color = Color::new(45, 45, 45, 255);
const COLOR_FIELD_BG: Color = Color::new(15, 15, 15, 255);
const COLOR_FIELD_FOCUS: Color = Color::new(90, 110, 220, 255);
const COLOR_LOG_BG: Color = Color::new(18, 18, 18, 255);
const COLOR_LOG_TEXT: Color = Color::new(210, 210, 210, 255);
const COLOR_MUTED: Color = Color::new(160, 160, 160, 255);
const COLOR_ERROR: Color = Color::new(240, 110, 110, 255);

const PROMPT_WRAP: usize = 62;
const SCRIPT_WRAP: usize = 64;

type Outcome = (u64, Result<GenerationResult, VideoError>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    ImagePath,
    Prompt,
}

enum Action {
    Focus(Field),
    LoadImage,
    SetQuality(VideoQuality),
    SetAspect(AspectRatio),
    Generate,
    Play,
    Listen,
    Copy,
    Reset,
}

fn push_log_line(buffer: &Arc<Mutex<Vec<String>>>, line: &str) {
    let mut guard = buffer.lock().unwrap_or_else(|e| e.into_inner());
    if guard.len() >= LOG_MAX_LINES {
        let excess = guard.len() + 1 - LOG_MAX_LINES;
        guard.drain(0..excess);
    }
    let mut text = line.to_string();
    if text.len() > LOG_LINE_MAX {
        let mut cut = LOG_LINE_MAX;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    guard.push(text);
}

fn snapshot_logs(buffer: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    buffer.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

fn draw_button(
    d: &mut RaylibDrawHandle,
    rect: Rectangle,
    label: &str,
    enabled: bool,
    selected: bool,
    font_size: f32,
) -> bool {
    let mouse = d.get_mouse_position();
    let hot = rect.check_collision_point_rec(mouse);

    let bg = if !enabled {
        COLOR_BTN_DISABLED
    } else if hot {
        COLOR_BTN_HOVER
    } else if selected {
        COLOR_BTN
    } else {
        COLOR_BTN_IDLE
    };

    d.draw_rectangle_rounded(rect, 0.25, 10, bg);
    d.draw_rectangle_rounded_lines(rect, 0.25, 10, Color::new(20, 20, 20, 255));

    let ts = d.measure_text(label, font_size as i32);
    let pos_x = rect.x + (rect.width - ts as f32) * 0.5;
    let pos_y = rect.y + (rect.height - font_size) * 0.5;

    d.draw_text(label, pos_x as i32, pos_y as i32, font_size as i32, Color::RAYWHITE);

    enabled && hot && d.is_mouse_button_released(MouseButton::MOUSE_BUTTON_LEFT)
}

fn draw_field(d: &mut RaylibDrawHandle, rect: Rectangle, lines: &[String], focused: bool, enabled: bool) -> bool {
    d.draw_rectangle_rec(rect, COLOR_FIELD_BG);
    let border = if focused { COLOR_FIELD_FOCUS } else { Color::new(70, 70, 70, 255) };
    d.draw_rectangle_lines_ex(rect, 2.0, border);

    let font_size = 16;
    let line_h = 19.0;
    let max_lines = ((rect.height - 12.0) / line_h).floor().max(1.0) as usize;
    let start = lines.len().saturating_sub(max_lines);
    let mut y = rect.y + 6.0;
    for (i, line) in lines.iter().enumerate().skip(start) {
        let caret = focused && i + 1 == lines.len();
        let text = if caret { format!("{}_", line) } else { line.clone() };
        d.draw_text(&text, (rect.x + 8.0) as i32, y as i32, font_size, Color::RAYWHITE);
        y += line_h;
    }

    let hot = rect.check_collision_point_rec(d.get_mouse_position());
    enabled && hot && d.is_mouse_button_released(MouseButton::MOUSE_BUTTON_LEFT)
}

fn draw_log_panel(d: &mut RaylibDrawHandle, rect: Rectangle, lines: &[String]) {
    d.draw_rectangle_rec(rect, COLOR_LOG_BG);
    d.draw_rectangle_lines_ex(rect, 2.0, Color::new(40, 40, 40, 255));

    let font_size = 12;
    let pad = 8.0;
    let line_h = 15.0;
    let max_lines = ((rect.height - 2.0 * pad) / line_h).floor().max(1.0) as usize;
    let wrapped: Vec<String> = lines.iter().flat_map(|l| view::wrap_text(l, 54)).collect();
    let start = wrapped.len().saturating_sub(max_lines);

    let mut y = rect.y + pad;
    for line in wrapped.iter().skip(start) {
        d.draw_text(line, (rect.x + pad) as i32, y as i32, font_size, COLOR_LOG_TEXT);
        y += line_h;
    }
}

fn draw_form(
    d: &mut RaylibDrawHandle,
    form: &FormView<'_>,
    image_path: &str,
    focus: Field,
    actions: &mut Vec<Action>,
) {
    let x = 30.0;
    let enabled = !form.disabled;

    d.draw_text("Source Image (path)", x as i32, 110, 18, Color::RAYWHITE);
    let path_lines = vec![image_path.to_string()];
    if draw_field(d, Rectangle::new(x, 135.0, 470.0, 34.0), &path_lines, focus == Field::ImagePath, enabled) {
        actions.push(Action::Focus(Field::ImagePath));
    }
    if draw_button(d, Rectangle::new(x + 480.0, 135.0, 110.0, 34.0), "Load", enabled && !image_path.is_empty(), true, 16.0) {
        actions.push(Action::LoadImage);
    }
    match (form.image_error, form.image_summary.as_deref()) {
        (Some(err), _) => d.draw_text(err, x as i32, 176, 15, COLOR_ERROR),
        (None, Some(summary)) => d.draw_text(&format!("Loaded: {summary}"), x as i32, 176, 15, COLOR_MUTED),
        (None, None) => d.draw_text("PNG, JPG, WEBP, HEIC or HEIF", x as i32, 176, 15, COLOR_MUTED),
    }

    d.draw_text("Ad Prompt", x as i32, 205, 18, Color::RAYWHITE);
    let prompt_lines = view::wrap_text(form.prompt, PROMPT_WRAP);
    if draw_field(d, Rectangle::new(x, 230.0, 590.0, 110.0), &prompt_lines, focus == Field::Prompt, enabled) {
        actions.push(Action::Focus(Field::Prompt));
    }

    d.draw_text("Video Quality", x as i32, 355, 18, Color::RAYWHITE);
    for (i, opt) in form.qualities.iter().enumerate() {
        let rect = Rectangle::new(x + i as f32 * 200.0, 380.0, 190.0, 36.0);
        if draw_button(d, rect, opt.label, enabled, opt.selected, 16.0) {
            actions.push(Action::SetQuality(opt.value));
        }
    }

    d.draw_text("Aspect Ratio", x as i32, 430, 18, Color::RAYWHITE);
    for (i, opt) in form.aspect_ratios.iter().enumerate() {
        let rect = Rectangle::new(x + i as f32 * 300.0, 455.0, 290.0, 36.0);
        if draw_button(d, rect, opt.label, enabled, opt.selected, 16.0) {
            actions.push(Action::SetAspect(opt.value));
        }
    }

    if let Some(err) = form.error {
        let mut y = 505;
        for line in view::wrap_text(err, 70) {
            d.draw_text(&line, x as i32, y, 15, COLOR_ERROR);
            y += 18;
        }
    }

    if draw_button(d, Rectangle::new(x, 560.0, 590.0, 60.0), "Generate Video", form.can_submit, true, 22.0) {
        actions.push(Action::Generate);
    }
}

fn draw_progress(d: &mut RaylibDrawHandle, title: &str, message: &str) {
    let t = d.get_time() as f32;
    let center = Vector2::new(325.0, 260.0);
    for i in 0..12 {
        let angle = i as f32 * std::f32::consts::PI / 6.0 + t * 3.0;
        let pos = Vector2::new(center.x + angle.cos() * 40.0, center.y + angle.sin() * 40.0);
        let alpha = (255.0 * (i as f32 + 1.0) / 12.0) as u8;
        d.draw_circle_v(pos, 5.0, Color::new(120, 130, 240, alpha));
    }
    let tw = d.measure_text(title, 24);
    d.draw_text(title, 325 - tw / 2, 330, 24, Color::RAYWHITE);
    let mw = d.measure_text(message, 18);
    d.draw_text(message, 325 - mw / 2, 370, 18, COLOR_MUTED);
}

fn draw_result(d: &mut RaylibDrawHandle, result: &ResultView<'_>, actions: &mut Vec<Action>) {
    let x = 30.0;
    d.draw_text(view::SUCCESS_TITLE, x as i32, 110, 24, Color::RAYWHITE);
    d.draw_text(&format!("Video: {}", result.media.display()), x as i32, 150, 16, COLOR_MUTED);
    if draw_button(d, Rectangle::new(x, 180.0, 180.0, 40.0), "Play Video", true, true, 18.0) {
        actions.push(Action::Play);
    }

    d.draw_text(view::SCRIPT_HEADING, x as i32, 245, 20, Color::RAYWHITE);
    let mut y = 275;
    for line in view::wrap_text(result.script, SCRIPT_WRAP) {
        d.draw_text(&line, x as i32, y, 17, COLOR_LOG_TEXT);
        y += 21;
    }

    let row = (y + 15) as f32;
    if draw_button(d, Rectangle::new(x, row, 150.0, 40.0), "Listen", true, false, 18.0) {
        actions.push(Action::Listen);
    }
    if draw_button(d, Rectangle::new(x + 160.0, row, 170.0, 40.0), result.copy_label, true, false, 18.0) {
        actions.push(Action::Copy);
    }

    if draw_button(d, Rectangle::new(x, 560.0, 590.0, 60.0), "Create Another Video", true, true, 22.0) {
        actions.push(Action::Reset);
    }
}

fn read_text_input(rl: &mut RaylibHandle, focus: Field, state: &mut UiState, image_path: &mut String) -> bool {
    let mut submit_path = false;
    let mut typed = String::new();
    while let Some(ch) = rl.get_char_pressed() {
        typed.push(ch);
    }
    let backspace = rl.is_key_pressed(KeyboardKey::KEY_BACKSPACE);
    let enter = rl.is_key_pressed(KeyboardKey::KEY_ENTER);

    match focus {
        Field::Prompt => {
            let mut prompt = state.prompt.clone();
            prompt.push_str(&typed);
            if enter {
                prompt.push('\n');
            }
            if backspace {
                prompt.pop();
            }
            if prompt != state.prompt {
                state.set_prompt(prompt);
            }
        }
        Field::ImagePath => {
            image_path.push_str(&typed);
            if backspace {
                image_path.pop();
            }
            submit_path = enter;
        }
        Field::None => {}
    }
    submit_path
}

fn load_image(state: &mut UiState, image_path: &str) {
    let path = std::path::Path::new(image_path.trim());
    match std::fs::read(path) {
        Ok(bytes) => {
            state.upload_image(bytes, mime_for_path(path));
        }
        Err(err) => {
            tracing::warn!("failed to read {}: {}", path.display(), err);
            state.image = None;
            state.image_error = Some("Failed to read the file.".to_string());
        }
    }
}

fn start_generation(
    state: &mut UiState,
    rt: &tokio::runtime::Runtime,
    client: &GenerationClient<GeminiBackend>,
    tx: &Sender<Outcome>,
) {
    let Ok(submission) = state.begin_submit() else {
        return;
    };
    let client = client.clone();
    let tx = tx.clone();
    rt.spawn(async move {
        let outcome = client.generate(&submission.request).await;
        let _ = tx.send((submission.ticket, outcome));
    });
}

fn drain_outcomes(state: &mut UiState, rx: &Receiver<Outcome>) {
    while let Ok((ticket, outcome)) = rx.try_recv() {
        if !state.complete(ticket, outcome) {
            tracing::info!("discarded outcome for superseded submission {}", ticket);
        }
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create async runtime");
    let cfg = match rt.block_on(Config::load("config.json")) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[ERROR] {:#}", e);
            std::process::exit(1);
        }
    };
    let client = match GeminiBackend::new(&cfg) {
        Ok(backend) => GenerationClient::new(
            backend,
            GeneratorSettings::from_config(&cfg),
            MediaStore::new(&cfg.settings.output_dir),
        ),
        Err(e) => {
            eprintln!("[ERROR] {:#}", e);
            std::process::exit(1);
        }
    };

    let log_buffer = Arc::new(Mutex::new(Vec::with_capacity(LOG_MAX_LINES)));
    let hook_buffer = Arc::clone(&log_buffer);
    set_log_hook(Some(Arc::new(Mutex::new(move |line: &str| {
        push_log_line(&hook_buffer, line);
    }))));

    let (tx, rx) = unbounded::<Outcome>();

    let (mut rl, thread) = raylib::init()
        .size(1100, 660)
        .resizable()
        .title(view::APP_TITLE)
        .build();
    rl.set_target_fps(60);

    let mut state = UiState::new();
    let mut image_path = String::new();
    let mut focus = Field::None;

    while !rl.window_should_close() {
        drain_outcomes(&mut state, &rx);
        let now = Instant::now();
        state.tick(now);

        if read_text_input(&mut rl, focus, &mut state, &mut image_path) {
            load_image(&mut state, &image_path);
        }

        let mut actions = Vec::new();
        {
            let lines = snapshot_logs(&log_buffer);
            let mut d = rl.begin_drawing(&thread);
            d.clear_background(COLOR_BG);

            d.draw_text(view::APP_TITLE, 30, 20, 32, Color::RAYWHITE);
            d.draw_text(view::APP_TAGLINE, 30, 62, 16, COLOR_MUTED);

            match view::render(&state, now) {
                View::Form(form) => draw_form(&mut d, &form, &image_path, focus, &mut actions),
                View::Progress { title, message } => draw_progress(&mut d, title, message),
                View::Result(result) => draw_result(&mut d, &result, &mut actions),
            }

            d.draw_text("Log", 680, 20, 24, Color::RAYWHITE);
            draw_log_panel(&mut d, Rectangle::new(680.0, 60.0, 390.0, 560.0), &lines);
        }

        for action in actions {
            match action {
                Action::Focus(field) => focus = field,
                Action::LoadImage => load_image(&mut state, &image_path),
                Action::SetQuality(q) => state.set_quality(q),
                Action::SetAspect(a) => state.set_aspect_ratio(a),
                Action::Generate => {
                    focus = Field::None;
                    start_generation(&mut state, &rt, &client, &tx);
                }
                Action::Play => {
                    if let Some(result) = &state.result {
                        platform::open_path(result.media.path());
                    }
                }
                Action::Listen => {
                    if let Some(script) = state.script() {
                        platform::speak(script);
                    }
                }
                Action::Copy => {
                    let copied = state.script().map(platform::copy_to_clipboard).unwrap_or(false);
                    if copied {
                        state.mark_copied(Instant::now());
                    }
                }
                Action::Reset => {
                    state.reset();
                    image_path.clear();
                    focus = Field::None;
                }
            }
        }
    }

    set_log_hook(None);
}
