//! Source platform classification from the input URL

/// Platform a URL points at; used as the artist tag and the filename prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceLabel {
    Youtube,
    Rutube,
    Audio,
}

impl SourceLabel {
    /// Classify a URL by substring. Never fails; unknown hosts become `Audio`.
    pub fn from_url(url: &str) -> Self {
        if url.contains("youtube.com") || url.contains("youtu.be") {
            SourceLabel::Youtube
        } else if url.contains("rutube.ru") {
            SourceLabel::Rutube
        } else {
            SourceLabel::Audio
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLabel::Youtube => "youtube",
            SourceLabel::Rutube => "rutube",
            SourceLabel::Audio => "audio",
        }
    }
}

impl std::fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
