use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    Auto,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JumpDirection {
    Next,
    Previous,
}

/// Notifications for the presentation layer. The core never renders anything;
/// it only says what happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    SegmentEntered { manual_skip_available: bool },
    SegmentExited,
    SkipPerformed { kind: SkipKind },
    JumpPerformed { direction: JumpDirection },
    NoSegmentAtPosition,
    NoNextSegment,
    NoPreviousSegment,
    /// The active segment list was replaced; overlays should redraw.
    SegmentsLoaded { count: usize },
    /// Category colors changed; overlays should redraw.
    AppearanceChanged,
}

impl Intent {
    /// Short user-facing toast text.
    pub fn message(&self) -> &'static str {
        match self {
            Intent::SegmentEntered { .. } => "Segment ahead: skip available",
            Intent::SegmentExited => "Left segment",
            Intent::SkipPerformed {
                kind: SkipKind::Auto,
            } => "Auto-skipped segment",
            Intent::SkipPerformed {
                kind: SkipKind::Manual,
            } => "Skipped segment",
            Intent::JumpPerformed {
                direction: JumpDirection::Next,
            } => "Jumped to next segment",
            Intent::JumpPerformed {
                direction: JumpDirection::Previous,
            } => "Jumped to previous segment",
            Intent::NoSegmentAtPosition => "No segment at current time",
            Intent::NoNextSegment => "No next segment",
            Intent::NoPreviousSegment => "No previous segment",
            Intent::SegmentsLoaded { .. } => "Segments loaded",
            Intent::AppearanceChanged => "Segment colors updated",
        }
    }
}
