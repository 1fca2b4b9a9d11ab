use std::collections::HashMap;

use crate::types::{SegmentList, VideoId};

/// Cache key for one (video, category set) lookup. Category order and
/// duplicates do not matter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    video: VideoId,
    categories: String,
}

impl CacheKey {
    pub fn new<S: AsRef<str>>(video: &VideoId, categories: &[S]) -> Self {
        Self {
            video: video.clone(),
            categories: category_signature(categories),
        }
    }

    pub fn video(&self) -> &VideoId {
        &self.video
    }

    pub fn signature(&self) -> &str {
        &self.categories
    }
}

/// Sorted, deduplicated category names joined with `,`.
pub fn category_signature<S: AsRef<str>>(categories: &[S]) -> String {
    let mut names: Vec<&str> = categories.iter().map(AsRef::as_ref).collect();
    names.sort_unstable();
    names.dedup();
    names.join(",")
}

/// Process-lifetime store of resolved segment lists. Entries are never evicted
/// and never overwritten.
#[derive(Debug, Default)]
pub struct SegmentCache {
    entries: HashMap<CacheKey, SegmentList>,
}

impl SegmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<SegmentList> {
        self.entries.get(key).cloned()
    }

    /// Store `segments` unless the key is already present. Returns the list
    /// that ends up cached, so racing writers converge on the first one.
    pub fn insert(&mut self, key: CacheKey, segments: SegmentList) -> SegmentList {
        self.entries.entry(key).or_insert(segments).clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
