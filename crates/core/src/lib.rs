//! Smartskip Core Library
//!
//! Resolves the playing video, fetches and caches its SponsorBlock segments,
//! and runs the playback-watch state machine that decides when to skip.

pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod format;
pub mod identity;
pub mod intent;
pub mod markers;
pub mod provider;
pub mod reactor;
pub mod session;
pub mod types;
pub mod watcher;

// Re-export commonly used items at crate root
pub use cache::{CacheKey, SegmentCache, category_signature};
pub use config::{CategorySetting, CategoryView, ConfigStore, StoredConfig, get_config_path};
pub use error::{FetchError, Result, SmartSkipError};
pub use fetcher::{HttpSegmentSource, SegmentFetcher, SegmentSource, parse_segments};
pub use format::{format_segment_list, format_timestamp, skippable_seconds};
pub use identity::{PageContext, resolve as resolve_video, video_id_from_url};
pub use intent::{Intent, JumpDirection, SkipKind};
pub use markers::{Rgb, TimelineMarker, timeline_markers};
pub use provider::ProviderConfig;
pub use reactor::{ConfigChange, ConfigReactor};
pub use session::{Command, IntentReceiver, MediaSurface, Session, SessionHandle, SessionSnapshot};
pub use types::{CATEGORIES, CategoryInfo, Segment, SegmentList, VideoId};
pub use watcher::{PlaybackWatcher, Playhead, WatcherState};
