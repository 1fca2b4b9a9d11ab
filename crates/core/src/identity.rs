use url::Url;

use crate::types::VideoId;

/// What the host page tells us about the video currently on screen.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    /// Full location of the page, e.g. `https://www.youtube.com/watch?v=abc`.
    pub location: String,
    /// Video id embedded in the player's own metadata, if the page exposes one.
    pub player_video_id: Option<String>,
}

impl PageContext {
    pub fn from_location(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            player_video_id: None,
        }
    }

    pub fn with_player_video_id(mut self, id: impl Into<String>) -> Self {
        self.player_video_id = Some(id.into());
        self
    }
}

/// Resolve the canonical identity of the displayed video.
///
/// Player metadata wins when present and non-empty; otherwise the location is
/// parsed for `?v=` and then for `/shorts/<id>`. `None` means tracking is not
/// possible yet, not that something failed.
pub fn resolve(page: &PageContext) -> Option<VideoId> {
    page.player_video_id
        .as_deref()
        .and_then(VideoId::new)
        .or_else(|| video_id_from_url(&page.location))
}

/// Extract a video id from a watch or shorts URL.
pub fn video_id_from_url(location: &str) -> Option<VideoId> {
    let url = Url::parse(location).ok()?;

    if let Some(id) = url
        .query_pairs()
        .find(|(key, _)| key == "v")
        .and_then(|(_, value)| VideoId::new(value.into_owned()))
    {
        return Some(id);
    }

    let mut parts = url.path_segments()?.filter(|part| !part.is_empty());
    match (parts.next(), parts.next()) {
        (Some("shorts"), Some(id)) => VideoId::new(id),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_player_metadata() {
        let page = PageContext::from_location("https://www.youtube.com/watch?v=fromurl")
            .with_player_video_id("fromplayer");
        assert_eq!(resolve(&page).unwrap().as_str(), "fromplayer");
    }

    #[test]
    fn blank_player_metadata_falls_back_to_location() {
        let page = PageContext::from_location("https://www.youtube.com/watch?v=fromurl")
            .with_player_video_id("  ");
        assert_eq!(resolve(&page).unwrap().as_str(), "fromurl");
    }

    #[test]
    fn reads_query_parameter() {
        let id = video_id_from_url("https://www.youtube.com/watch?list=PL1&v=dQw4w9WgXcQ&t=42");
        assert_eq!(id.unwrap().as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn reads_shorts_path() {
        let id = video_id_from_url("https://www.youtube.com/shorts/abc123?feature=share");
        assert_eq!(id.unwrap().as_str(), "abc123");
    }

    #[test]
    fn shorts_must_lead_the_path() {
        assert!(video_id_from_url("https://www.youtube.com/channel/shorts/abc").is_none());
        assert!(video_id_from_url("https://www.youtube.com/shorts/").is_none());
    }

    #[test]
    fn nothing_to_resolve() {
        assert!(resolve(&PageContext::from_location("https://www.youtube.com/feed")).is_none());
        assert!(resolve(&PageContext::from_location("not a url")).is_none());
        assert!(video_id_from_url("https://www.youtube.com/watch?v=").is_none());
    }
}
