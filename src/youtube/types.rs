use serde::Deserialize;

/// Subset of the Invidious `/api/v1/videos/{id}` response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    #[serde(default)]
    pub title: String,
    /// Combined audio+video renditions (preferred)
    #[serde(default)]
    pub format_streams: Vec<FormatStream>,
    /// Video-only / audio-only renditions
    #[serde(default)]
    pub adaptive_formats: Vec<FormatStream>,
}

/// One rendition as reported by Invidious
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatStream {
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub mime_type: Option<String>,
    /// Label like "720p"
    pub quality: Option<String>,
    pub resolution: Option<String>,
    pub container: Option<String>,
    pub itag: Option<String>,
}

impl FormatStream {
    pub fn is_video(&self) -> bool {
        self.mime_type
            .as_deref()
            .is_some_and(|t| t.contains("video"))
    }

    /// Numeric height parsed from the quality label ("720p" -> 720)
    pub fn height(&self) -> u32 {
        let label = self
            .quality
            .as_deref()
            .or(self.resolution.as_deref())
            .unwrap_or("");
        label
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect::<String>()
            .parse()
            .unwrap_or(0)
    }
}
