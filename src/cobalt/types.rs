use serde::{Deserialize, Serialize};

use crate::core::{PickerItem, Quality};

/// Request body for the cobalt resolver API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CobaltRequest<'a> {
    pub url: &'a str,
    pub video_quality: String,
    pub audio_format: &'static str,
    pub filename_style: &'static str,
    pub download_mode: &'static str,
    pub twitter_gif: bool,
}

impl<'a> CobaltRequest<'a> {
    pub fn new(url: &'a str, quality: Quality) -> Self {
        Self {
            url,
            video_quality: quality.height().to_string(),
            audio_format: "mp3",
            filename_style: "basic",
            download_mode: "auto",
            twitter_gif: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CobaltResponse {
    pub status: CobaltStatus,
    pub url: Option<String>,
    #[serde(default)]
    pub picker: Vec<CobaltPickerItem>,
}

/// Status tag of a cobalt response; unrecognized tags are treated like
/// errors and move the walk to the next instance
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CobaltStatus {
    Error,
    Stream,
    Redirect,
    Tunnel,
    Picker,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CobaltPickerItem {
    pub url: String,
    pub thumb: Option<String>,
}

impl From<CobaltPickerItem> for PickerItem {
    fn from(item: CobaltPickerItem) -> Self {
        PickerItem {
            url: item.url,
            thumbnail: item.thumb,
        }
    }
}
