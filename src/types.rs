use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoQuality {
    #[default]
    #[serde(rename = "1080p")]
    Hd1080p,
    #[serde(rename = "2K")]
    TwoK,
    #[serde(rename = "4K")]
    FourK,
}

impl VideoQuality {
    pub const ALL: [VideoQuality; 3] = [Self::Hd1080p, Self::TwoK, Self::FourK];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hd1080p => "1080p",
            Self::TwoK => "2K",
            Self::FourK => "4K",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hd1080p => "1080p HD",
            Self::TwoK => "2K",
            Self::FourK => "4K",
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "9:16")]
    Portrait,
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 2] = [Self::Portrait, Self::Landscape];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Portrait => "9:16",
            Self::Landscape => "16:9",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Portrait => "Portrait (9:16)",
            Self::Landscape => "Landscape (16:9)",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image formats the video model accepts as a source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageMime {
    Png,
    Jpeg,
    Webp,
    Heic,
    Heif,
}

/// Reported for files whose extension is not one of the accepted image formats.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

impl ImageMime {
    pub fn parse(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::Webp),
            "image/heic" => Some(Self::Heic),
            "image/heif" => Some(Self::Heif),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Heic => "image/heic",
            Self::Heif => "image/heif",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            "heic" => Some(Self::Heic),
            "heif" => Some(Self::Heif),
            _ => None,
        }
    }
}

/// Best-guess MIME string for a file, for handing to the upload validator.
pub fn mime_for_path(path: &Path) -> &'static str {
    ImageMime::from_path(path)
        .map(ImageMime::as_str)
        .unwrap_or(UNKNOWN_MIME)
}

#[derive(Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub bytes: Vec<u8>,
    pub mime: ImageMime,
}

impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("bytes", &self.bytes.len())
            .field("mime", &self.mime)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub image: SourceImage,
    pub quality: VideoQuality,
    pub aspect_ratio: AspectRatio,
}

/// Local file holding a fetched video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle(PathBuf);

impl MediaHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub media: MediaHandle,
    pub script: String,
}

pub const LOADING_MESSAGES: [&str; 8] = [
    "Warming up the AI video director...",
    "Storyboarding your concept...",
    "Setting up the virtual cameras...",
    "Rendering the first few frames...",
    "Applying cinematic color grading...",
    "Compositing visual effects...",
    "Syncing audio and visuals...",
    "Finalizing your masterpiece...",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_supported_mime_types() {
        for mime in ["image/png", "image/jpeg", "image/webp", "image/heic", "image/heif"] {
            let parsed = ImageMime::parse(mime).expect(mime);
            assert_eq!(parsed.as_str(), mime);
        }
        assert_eq!(ImageMime::parse("image/gif"), None);
        assert_eq!(ImageMime::parse("application/pdf"), None);
        assert_eq!(ImageMime::parse(""), None);
    }

    #[test]
    fn maps_extensions_case_insensitively() {
        assert_eq!(mime_for_path(Path::new("shot.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a/b/frame.heif")), "image/heif");
        assert_eq!(mime_for_path(Path::new("logo.gif")), UNKNOWN_MIME);
        assert_eq!(mime_for_path(Path::new("noext")), UNKNOWN_MIME);
    }

    #[test]
    fn defaults_and_wire_strings() {
        assert_eq!(VideoQuality::default(), VideoQuality::Hd1080p);
        assert_eq!(AspectRatio::default(), AspectRatio::Landscape);
        assert_eq!(AspectRatio::Portrait.to_string(), "9:16");
        assert_eq!(
            serde_json::to_string(&VideoQuality::FourK).unwrap(),
            "\"4K\""
        );
    }
}
