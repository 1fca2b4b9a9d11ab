use serde::Serialize;

use crate::{config::CategoryView, types::Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const SPONSOR_GOLD: Rgb = Rgb {
        r: 255,
        g: 215,
        b: 0,
    };

    /// Parse `#rgb` or `#rrggbb`. Channels that fail to parse fall back to the
    /// matching channel of [`Rgb::SPONSOR_GOLD`].
    pub fn from_hex(hex: &str) -> Rgb {
        let h = hex.trim().trim_start_matches('#');
        let expanded: String = if h.chars().count() == 3 {
            h.chars().flat_map(|c| [c, c]).collect()
        } else {
            h.to_string()
        };

        let channel = |range: std::ops::Range<usize>, fallback: u8| {
            expanded
                .get(range)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .unwrap_or(fallback)
        };

        Rgb {
            r: channel(0..2, Self::SPONSOR_GOLD.r),
            g: channel(2..4, Self::SPONSOR_GOLD.g),
            b: channel(4..6, Self::SPONSOR_GOLD.b),
        }
    }

    pub fn css_rgba(&self, alpha: f32) -> String {
        format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, alpha)
    }
}

/// Placement of one segment on a progress bar, in percent of its width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineMarker {
    pub left_pct: f64,
    pub width_pct: f64,
    pub category: String,
    pub color: Rgb,
}

pub fn timeline_markers(
    segments: &[Segment],
    duration: f64,
    view: &CategoryView,
) -> Vec<TimelineMarker> {
    if !duration.is_finite() || duration <= 0.0 {
        return Vec::new();
    }

    segments
        .iter()
        .map(|seg| TimelineMarker {
            left_pct: (seg.start / duration * 100.0).clamp(0.0, 100.0),
            width_pct: (seg.duration() / duration * 100.0).clamp(0.0, 100.0),
            category: seg.category.clone(),
            color: Rgb::from_hex(view.color_for(&seg.category)),
        })
        .collect()
}
