use crate::{
    intent::{Intent, JumpDirection, SkipKind},
    types::{Segment, SegmentList, VideoId, empty_segments},
};

/// Read/write access to the host's playback position, in seconds.
pub trait Playhead {
    fn position(&self) -> f64;
    fn seek(&mut self, position: f64);
}

/// First segment with `start <= position < end`. On overlapping input the one
/// with the lowest start wins because the list is sorted.
pub fn segment_at(segments: &[Segment], position: f64) -> Option<&Segment> {
    segments.iter().find(|s| s.contains(position))
}

/// First segment starting strictly after `position`.
pub fn next_segment(segments: &[Segment], position: f64) -> Option<&Segment> {
    segments.iter().find(|s| s.start > position)
}

/// Segment with the greatest start strictly before `position`.
pub fn previous_segment(segments: &[Segment], position: f64) -> Option<&Segment> {
    segments.iter().rev().find(|s| s.start < position)
}

#[derive(Debug, Clone)]
pub struct WatcherState {
    pub active_video: Option<VideoId>,
    pub segments: SegmentList,
    /// Membership computed on the previous tick. The only signal used to
    /// detect edges.
    pub last_inside_segment: bool,
    pub auto_skip_enabled: bool,
}

impl Default for WatcherState {
    fn default() -> Self {
        Self {
            active_video: None,
            segments: empty_segments(),
            last_inside_segment: false,
            auto_skip_enabled: false,
        }
    }
}

/// Inside/outside state machine over a sampled playback position.
#[derive(Debug, Default)]
pub struct PlaybackWatcher {
    state: WatcherState,
}

impl PlaybackWatcher {
    pub fn new(auto_skip_enabled: bool) -> Self {
        Self {
            state: WatcherState {
                auto_skip_enabled,
                ..WatcherState::default()
            },
        }
    }

    pub fn state(&self) -> &WatcherState {
        &self.state
    }

    pub fn active_video(&self) -> Option<&VideoId> {
        self.state.active_video.as_ref()
    }

    pub fn segments(&self) -> &SegmentList {
        &self.state.segments
    }

    pub fn is_tracking(&self, video: &VideoId) -> bool {
        self.state.active_video.as_ref() == Some(video)
    }

    /// Whether navigating to `video` requires a fresh lookup.
    pub fn needs_refresh(&self, video: &VideoId) -> bool {
        !self.is_tracking(video) || self.state.segments.is_empty()
    }

    /// Switch to a new video: drop the old list and forget the last membership.
    pub fn adopt(&mut self, video: VideoId) {
        self.state.active_video = Some(video);
        self.state.segments = empty_segments();
        self.state.last_inside_segment = false;
    }

    /// Stop tracking: the page shows no video.
    pub fn release(&mut self) {
        self.state.active_video = None;
        self.state.segments = empty_segments();
        self.state.last_inside_segment = false;
    }

    /// Replace the active list. Membership is left alone so the next tick
    /// re-tests against the new list.
    pub fn set_segments(&mut self, segments: SegmentList) {
        self.state.segments = segments;
    }

    pub fn set_auto_skip(&mut self, enabled: bool) {
        self.state.auto_skip_enabled = enabled;
    }

    /// Process one position sample.
    pub fn tick<P: Playhead>(&mut self, position: f64, playhead: &mut P) -> Option<Intent> {
        let current = segment_at(&self.state.segments, position);
        let inside = current.is_some();

        let intent = match (current, self.state.last_inside_segment) {
            (Some(segment), false) if self.state.auto_skip_enabled => {
                playhead.seek(segment.end);
                Some(Intent::SkipPerformed {
                    kind: SkipKind::Auto,
                })
            }
            (Some(_), false) => Some(Intent::SegmentEntered {
                manual_skip_available: true,
            }),
            (None, true) => Some(Intent::SegmentExited),
            _ => None,
        };

        self.state.last_inside_segment = inside;
        intent
    }

    pub fn skip_current<P: Playhead>(&self, playhead: &mut P) -> Intent {
        match segment_at(&self.state.segments, playhead.position()) {
            Some(segment) => {
                playhead.seek(segment.end);
                Intent::SkipPerformed {
                    kind: SkipKind::Manual,
                }
            }
            None => Intent::NoSegmentAtPosition,
        }
    }

    pub fn jump_to_next<P: Playhead>(&self, playhead: &mut P) -> Intent {
        match next_segment(&self.state.segments, playhead.position()) {
            Some(segment) => {
                playhead.seek(segment.start);
                Intent::JumpPerformed {
                    direction: JumpDirection::Next,
                }
            }
            None => Intent::NoNextSegment,
        }
    }

    pub fn jump_to_previous<P: Playhead>(&self, playhead: &mut P) -> Intent {
        match previous_segment(&self.state.segments, playhead.position()) {
            Some(segment) => {
                playhead.seek(segment.start);
                Intent::JumpPerformed {
                    direction: JumpDirection::Previous,
                }
            }
            None => Intent::NoPreviousSegment,
        }
    }
}
