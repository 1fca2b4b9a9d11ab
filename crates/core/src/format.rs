use crate::types::{Segment, category_info};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

pub fn category_label(category: &str) -> &str {
    category_info(category).map_or(category, |info| info.label)
}

/// One line per segment: `[MM:SS–MM:SS] Label (12.0s)`
pub fn format_segment_list(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|seg| {
            format!(
                "[{}–{}] {} ({:.1}s)",
                format_timestamp(seg.start),
                format_timestamp(seg.end),
                category_label(&seg.category),
                seg.duration()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Total seconds covered by `segments`, counting overlaps once.
pub fn skippable_seconds(segments: &[Segment]) -> f64 {
    let mut total = 0.0;
    let mut covered_until = f64::NEG_INFINITY;
    for seg in segments {
        let start = seg.start.max(covered_until);
        if seg.end > start {
            total += seg.end - start;
        }
        covered_until = covered_until.max(seg.end);
    }
    total
}
