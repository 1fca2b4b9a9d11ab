use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

/// Category assumed for provider records that do not name one.
pub const DEFAULT_CATEGORY: &str = "sponsor";

#[derive(Debug, Clone, Copy)]
pub struct CategoryInfo {
    pub name: &'static str,
    pub label: &'static str,
    pub color: &'static str,
}

/// Every category the provider is asked about, in display order.
pub const CATEGORIES: [CategoryInfo; 6] = [
    CategoryInfo {
        name: "sponsor",
        label: "Sponsor",
        color: "#ffd700",
    },
    CategoryInfo {
        name: "selfpromo",
        label: "Self-promotion",
        color: "#ffa500",
    },
    CategoryInfo {
        name: "interaction",
        label: "Interaction reminders (Like/Subscribe)",
        color: "#ff69b4",
    },
    CategoryInfo {
        name: "intro",
        label: "Intro",
        color: "#1e90ff",
    },
    CategoryInfo {
        name: "outro",
        label: "Outro",
        color: "#8a2be2",
    },
    CategoryInfo {
        name: "music_offtopic",
        label: "Non-music (in music videos)",
        color: "#00ced1",
    },
];

pub fn category_info(name: &str) -> Option<&'static CategoryInfo> {
    CATEGORIES.iter().find(|c| c.name == name)
}

/// Identity of one playable video on the host page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    /// Returns `None` for blank input; an empty id never identifies a video.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A tagged `[start, end)` range of a video, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: f64,
    pub end: f64,
    pub category: String,
}

impl Segment {
    pub fn new(start: f64, end: f64, category: impl Into<String>) -> Self {
        Self {
            start,
            end,
            category: category.into(),
        }
    }

    pub fn contains(&self, position: f64) -> bool {
        self.start <= position && position < self.end
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// Resolved segments for one video, sorted ascending by `start`. Shared
/// between the cache and the watcher, never mutated in place.
pub type SegmentList = Arc<[Segment]>;

pub fn empty_segments() -> SegmentList {
    Arc::from(Vec::new())
}
