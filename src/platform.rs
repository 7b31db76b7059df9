//! Best-effort hand-off to the host OS for opening files, speaking text and
//! the clipboard. Each call reports whether the hand-off succeeded; none of
//! them wait for a helper process to finish.

use std::path::Path;
use std::process::{Command, Stdio};

fn spawn(program: &str, args: &[&str]) -> bool {
    Command::new(program)
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .is_ok()
}

pub fn open_path<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    if path.as_os_str().is_empty() {
        return false;
    }
    let Some(path) = path.to_str() else {
        return false;
    };

    #[cfg(target_os = "windows")]
    {
        spawn("explorer", &[path])
    }

    #[cfg(target_os = "macos")]
    {
        spawn("open", &[path])
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        spawn("xdg-open", &[path])
    }
}

pub fn speak(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() {
        return false;
    }

    #[cfg(target_os = "windows")]
    {
        let quoted = text.replace('\'', "''");
        let script = format!(
            "Add-Type -AssemblyName System.Speech; (New-Object System.Speech.Synthesis.SpeechSynthesizer).Speak('{}')",
            quoted
        );
        spawn("powershell", &["-NoProfile", "-Command", &script])
    }

    #[cfg(target_os = "macos")]
    {
        spawn("say", &[text])
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        spawn("espeak", &[text]) || spawn("spd-say", &[text])
    }
}

/// Puts `text` on the system clipboard. Empty text is left alone.
pub fn copy_to_clipboard(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.to_string())) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!("clipboard unavailable: {}", err);
            false
        }
    }
}
