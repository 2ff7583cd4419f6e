use serde::Deserialize;

/// A post's `.json` representation: normally a two-element array of
/// listings (post + comments), occasionally a bare listing
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PostResponse {
    Thread(Vec<Listing>),
    Single(Listing),
}

impl PostResponse {
    pub fn post(&self) -> Option<&Post> {
        let listing = match self {
            PostResponse::Thread(listings) => listings.first()?,
            PostResponse::Single(listing) => listing,
        };
        listing.data.children.first().map(|child| &child.data)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Listing {
    pub data: ListingData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<Child>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Child {
    pub data: Post,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Post {
    pub title: Option<String>,
    pub media: Option<Media>,
    pub secure_media: Option<Media>,
    pub url_overridden_by_dest: Option<String>,
    pub url: Option<String>,
}

impl Post {
    /// The hosted video, wherever reddit tucked it
    pub fn video(&self) -> Option<&RedditVideo> {
        self.media
            .as_ref()
            .and_then(|m| m.reddit_video.as_ref())
            .or_else(|| {
                self.secure_media
                    .as_ref()
                    .and_then(|m| m.reddit_video.as_ref())
            })
    }

    pub fn linked_url(&self) -> Option<&str> {
        self.url_overridden_by_dest
            .as_deref()
            .or(self.url.as_deref())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Media {
    pub reddit_video: Option<RedditVideo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditVideo {
    /// Bundled progressive rendition (the one worth playing)
    pub fallback_url: Option<String>,
    pub hls_url: Option<String>,
    pub height: Option<u32>,
}
