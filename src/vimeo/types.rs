use std::collections::HashMap;

use serde::Deserialize;

/// Subset of the `player.vimeo.com/video/{id}/config` response
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerConfig {
    pub request: Option<PlayerRequest>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerRequest {
    pub files: Option<PlayerFiles>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlayerFiles {
    /// Progressive download renditions (audio+video combined)
    #[serde(default)]
    pub progressive: Vec<ProgressiveFile>,
    pub hls: Option<HlsFiles>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgressiveFile {
    pub url: Option<String>,
    pub quality: Option<QualityLabel>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ProgressiveFile {
    pub fn height(&self) -> u32 {
        if let Some(h) = self.height {
            return h;
        }
        self.quality.as_ref().map(QualityLabel::height).unwrap_or(0)
    }
}

/// The config endpoint reports quality both as bare numbers and as labels
/// like "720p", depending on the clip's age
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QualityLabel {
    Height(u32),
    Label(String),
}

impl QualityLabel {
    pub fn height(&self) -> u32 {
        match self {
            QualityLabel::Height(h) => *h,
            QualityLabel::Label(s) => s
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect::<String>()
                .parse()
                .unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HlsFiles {
    #[serde(default)]
    pub cdns: HashMap<String, HlsCdn>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HlsCdn {
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_label_both_shapes() {
        let numeric: QualityLabel = serde_json::from_str("720").unwrap();
        assert_eq!(numeric.height(), 720);
        let label: QualityLabel = serde_json::from_str(r#""1080p""#).unwrap();
        assert_eq!(label.height(), 1080);
    }

    #[test]
    fn progressive_height_prefers_explicit_field() {
        let f: ProgressiveFile =
            serde_json::from_str(r#"{"url": "https://cdn/v", "quality": "360p", "height": 480}"#)
                .unwrap();
        assert_eq!(f.height(), 480);
    }
}
