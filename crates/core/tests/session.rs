use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use serde_json::{Value, json};
use smartskip_core::{
    Command, FetchError, Intent, IntentReceiver, JumpDirection, MediaSurface, PageContext,
    Playhead, SegmentFetcher, SegmentSource, Session, SkipKind, StoredConfig, VideoId,
};
use tokio::sync::{Notify, mpsc};

#[derive(Default)]
struct MediaState {
    position: f64,
    duration: Option<f64>,
    feeds: Vec<mpsc::Sender<f64>>,
}

/// Media element double. Clones share state so tests can look inside after
/// handing one to the session.
#[derive(Clone, Default)]
struct TestMedia {
    inner: Arc<Mutex<MediaState>>,
}

impl TestMedia {
    fn with_duration(duration: f64) -> Self {
        let media = Self::default();
        media.inner.lock().unwrap().duration = Some(duration);
        media
    }

    fn set_position(&self, position: f64) {
        self.inner.lock().unwrap().position = position;
    }

    fn subscriptions(&self) -> usize {
        self.inner.lock().unwrap().feeds.len()
    }

    fn feed(&self) -> mpsc::Sender<f64> {
        self.inner
            .lock()
            .unwrap()
            .feeds
            .last()
            .cloned()
            .expect("media has a subscriber")
    }
}

impl Playhead for TestMedia {
    fn position(&self) -> f64 {
        self.inner.lock().unwrap().position
    }

    fn seek(&mut self, position: f64) {
        self.inner.lock().unwrap().position = position;
    }
}

impl MediaSurface for TestMedia {
    fn subscribe(&mut self) -> mpsc::Receiver<f64> {
        let (tx, rx) = mpsc::channel(64);
        self.inner.lock().unwrap().feeds.push(tx);
        rx
    }

    fn duration(&self) -> Option<f64> {
        self.inner.lock().unwrap().duration
    }
}

/// Provider double that filters a fixed catalog by the requested categories.
#[derive(Default)]
struct CatalogSource {
    catalog: HashMap<String, Vec<(f64, f64, &'static str)>>,
    gates: HashMap<String, Arc<Notify>>,
    gates_without: HashMap<String, Arc<Notify>>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
}

impl CatalogSource {
    fn with_video(mut self, id: &str, segments: &[(f64, f64, &'static str)]) -> Self {
        self.catalog.insert(id.to_string(), segments.to_vec());
        self
    }

    fn gated(mut self, id: &str, gate: Arc<Notify>) -> Self {
        self.gates.insert(id.to_string(), gate);
        self
    }

    /// Hold back lookups that do not ask for `category`.
    fn gated_without(mut self, category: &str, gate: Arc<Notify>) -> Self {
        self.gates_without.insert(category.to_string(), gate);
        self
    }

    fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SegmentSource for CatalogSource {
    async fn lookup(&self, video: &VideoId, categories: &[String]) -> Result<Value, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((video.to_string(), categories.to_vec()));

        if let Some(gate) = self.gates.get(video.as_str()) {
            gate.notified().await;
        }
        for (category, gate) in &self.gates_without {
            if !categories.iter().any(|c| c == category) {
                gate.notified().await;
            }
        }

        let records: Vec<Value> = self
            .catalog
            .get(video.as_str())
            .into_iter()
            .flatten()
            .filter(|(_, _, category)| categories.iter().any(|c| c == category))
            .map(|(start, end, category)| json!({ "segment": [start, end], "category": category }))
            .collect();
        Ok(Value::Array(records))
    }
}

const SPONSOR_AND_INTRO: &[(f64, f64, &str)] = &[(0.0, 10.0, "sponsor"), (20.0, 25.0, "intro")];

fn watch_page(id: &str) -> PageContext {
    PageContext::from_location(format!("https://www.youtube.com/watch?v={id}"))
}

fn drain(intents: &mut IntentReceiver) -> Vec<Intent> {
    let mut seen = Vec::new();
    while let Ok(intent) = intents.try_recv() {
        seen.push(intent);
    }
    seen
}

fn new_session(
    source: Arc<CatalogSource>,
    media: TestMedia,
    config: &StoredConfig,
) -> (Session<TestMedia>, IntentReceiver) {
    Session::new(SegmentFetcher::new(source), media, config)
}

const ENTERED: Intent = Intent::SegmentEntered {
    manual_skip_available: true,
};

#[tokio::test]
async fn navigation_loads_segments_then_attaches_sampling() {
    let source = Arc::new(CatalogSource::default().with_video("a", SPONSOR_AND_INTRO));
    let media = TestMedia::default();
    let (mut session, mut intents) =
        new_session(source.clone(), media.clone(), &StoredConfig::default());

    session.on_navigation_changed(&watch_page("a"));
    assert!(!session.is_sampling());
    assert!(session.await_fetch().await);

    assert!(session.is_sampling());
    assert_eq!(media.subscriptions(), 1);
    assert_eq!(drain(&mut intents), vec![Intent::SegmentsLoaded { count: 2 }]);

    let (video, categories) = &source.calls()[0];
    assert_eq!(video, "a");
    assert_eq!(categories.len(), 6);

    session.on_position_sample(1.0);
    session.on_position_sample(2.0);
    session.on_position_sample(10.0);
    assert_eq!(drain(&mut intents), vec![ENTERED, Intent::SegmentExited]);
}

#[tokio::test]
async fn same_video_with_segments_is_a_noop() {
    let source = Arc::new(CatalogSource::default().with_video("a", SPONSOR_AND_INTRO));
    let media = TestMedia::default();
    let (mut session, _intents) =
        new_session(source.clone(), media.clone(), &StoredConfig::default());

    session.on_navigation_changed(&watch_page("a"));
    session.await_fetch().await;
    session.on_position_sample(3.0);

    session.on_navigation_changed(&PageContext::from_location("https://www.youtube.com/shorts/a"));

    assert_eq!(source.calls().len(), 1);
    assert_eq!(media.subscriptions(), 1);
    assert!(session.is_sampling());
    assert!(session.snapshot().last_inside_segment);
}

#[tokio::test]
async fn same_video_without_segments_is_resolved_again() {
    let source = Arc::new(CatalogSource::default());
    let (mut session, _intents) =
        new_session(source.clone(), TestMedia::default(), &StoredConfig::default());

    session.on_navigation_changed(&watch_page("empty"));
    assert!(session.await_fetch().await);
    session.on_navigation_changed(&watch_page("empty"));
    assert!(session.await_fetch().await);

    // The empty answer was a successful lookup, so the second pass is a cache hit.
    assert_eq!(source.calls().len(), 1);
    assert!(session.is_sampling());
}

#[tokio::test]
async fn new_video_retires_the_previous_feed() {
    let source = Arc::new(
        CatalogSource::default()
            .with_video("a", SPONSOR_AND_INTRO)
            .with_video("b", &[(30.0, 40.0, "outro")]),
    );
    let media = TestMedia::default();
    let (mut session, _intents) =
        new_session(source.clone(), media.clone(), &StoredConfig::default());

    session.on_navigation_changed(&watch_page("a"));
    session.await_fetch().await;
    session.on_position_sample(5.0);
    let old_feed = media.feed();

    session.on_navigation_changed(&watch_page("b"));
    assert!(old_feed.is_closed());
    assert!(!session.is_sampling());

    let snapshot = session.snapshot();
    assert_eq!(snapshot.active_video.unwrap().as_str(), "b");
    assert!(snapshot.segments.is_empty());
    assert!(!snapshot.last_inside_segment);

    assert!(session.await_fetch().await);
    assert!(session.is_sampling());
    assert_eq!(media.subscriptions(), 2);
    assert!(!media.feed().is_closed());
}

#[tokio::test]
async fn stale_lookup_for_abandoned_video_is_discarded() {
    let gate = Arc::new(Notify::new());
    let source = Arc::new(
        CatalogSource::default()
            .with_video("a", SPONSOR_AND_INTRO)
            .with_video("b", &[(30.0, 40.0, "outro")])
            .gated("a", gate.clone()),
    );
    let (mut session, _intents) =
        new_session(source, TestMedia::default(), &StoredConfig::default());

    session.on_navigation_changed(&watch_page("a"));
    session.on_navigation_changed(&watch_page("b"));

    assert!(session.await_fetch().await);
    gate.notify_one();
    assert!(!session.await_fetch().await);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.active_video.unwrap().as_str(), "b");
    assert_eq!(snapshot.segments.len(), 1);
    assert_eq!(snapshot.segments[0].category, "outro");
}

#[tokio::test]
async fn superseded_lookup_for_same_video_is_discarded() {
    let gate = Arc::new(Notify::new());
    let source = Arc::new(
        CatalogSource::default()
            .with_video("a", SPONSOR_AND_INTRO)
            .gated_without("sponsor", gate.clone()),
    );
    let (mut session, _intents) =
        new_session(source.clone(), TestMedia::default(), &StoredConfig::default());

    session.on_navigation_changed(&watch_page("a"));
    assert!(session.await_fetch().await);

    let mut hidden = StoredConfig::default();
    hidden.set_visible("sponsor", false);
    session.on_config_changed(&hidden);
    session.on_config_changed(&StoredConfig::default());

    // The re-shown set is a cache hit and lands first; the slow hidden-set
    // lookup finishes afterwards for the same video.
    assert!(session.await_fetch().await);
    gate.notify_one();
    assert!(!session.await_fetch().await);

    let categories: Vec<_> = session
        .snapshot()
        .segments
        .iter()
        .map(|s| s.category.clone())
        .collect();
    assert_eq!(categories, ["sponsor", "intro"]);
    assert_eq!(source.calls().len(), 2);
}

#[tokio::test]
async fn hiding_the_active_category_exits_without_moving() {
    let source = Arc::new(CatalogSource::default().with_video("a", SPONSOR_AND_INTRO));
    let media = TestMedia::default();
    let (mut session, mut intents) =
        new_session(source.clone(), media.clone(), &StoredConfig::default());

    session.on_navigation_changed(&watch_page("a"));
    session.await_fetch().await;
    media.set_position(4.0);
    session.on_position_sample(4.0);
    drain(&mut intents);

    let mut config = StoredConfig::default();
    config.set_visible("sponsor", false);
    session.on_config_changed(&config);
    assert!(session.await_fetch().await);

    assert_eq!(source.calls().len(), 2);
    assert!(!source.calls()[1].1.iter().any(|c| c == "sponsor"));
    assert!(session.snapshot().last_inside_segment);
    assert!(session.is_sampling());
    assert_eq!(media.subscriptions(), 1);

    session.on_position_sample(4.0);
    assert_eq!(
        drain(&mut intents),
        vec![Intent::SegmentsLoaded { count: 1 }, Intent::SegmentExited]
    );
    assert_eq!(media.position(), 4.0);
}

#[tokio::test]
async fn auto_skip_toggle_applies_without_refetch() {
    let source = Arc::new(CatalogSource::default().with_video("a", SPONSOR_AND_INTRO));
    let media = TestMedia::default();
    let (mut session, mut intents) =
        new_session(source.clone(), media.clone(), &StoredConfig::default());

    session.on_navigation_changed(&watch_page("a"));
    session.await_fetch().await;
    drain(&mut intents);

    session.on_config_changed(&StoredConfig {
        auto_skip_enabled: true,
        ..StoredConfig::default()
    });
    assert_eq!(source.calls().len(), 1);
    assert!(drain(&mut intents).is_empty());

    media.set_position(21.0);
    session.on_position_sample(21.0);
    assert_eq!(
        drain(&mut intents),
        vec![Intent::SkipPerformed {
            kind: SkipKind::Auto
        }]
    );
    assert_eq!(media.position(), 25.0);
}

#[tokio::test]
async fn recoloring_only_asks_for_a_redraw() {
    let source = Arc::new(CatalogSource::default().with_video("a", SPONSOR_AND_INTRO));
    let (mut session, mut intents) =
        new_session(source.clone(), TestMedia::with_duration(100.0), &StoredConfig::default());

    session.on_navigation_changed(&watch_page("a"));
    session.await_fetch().await;
    drain(&mut intents);

    let mut config = StoredConfig::default();
    config.set_color("intro", "#000000");
    session.on_config_changed(&config);

    assert_eq!(drain(&mut intents), vec![Intent::AppearanceChanged]);
    assert_eq!(source.calls().len(), 1);

    let snapshot = session.snapshot();
    assert_eq!(snapshot.category_colors["intro"], "#000000");
    assert_eq!(snapshot.category_colors["sponsor"], "#ffd700");

    let markers = snapshot.markers;
    assert_eq!(markers.len(), 2);
    assert_eq!(markers[1].left_pct, 20.0);
    assert_eq!((markers[1].color.r, markers[1].color.g, markers[1].color.b), (0, 0, 0));
}

#[tokio::test]
async fn snapshot_reports_colors_without_known_duration() {
    let mut config = StoredConfig::default();
    config.set_color("outro", "#abcdef");
    let (session, _intents) = new_session(
        Arc::new(CatalogSource::default()),
        TestMedia::default(),
        &config,
    );

    let snapshot = session.snapshot();
    assert!(snapshot.markers.is_empty());
    assert_eq!(snapshot.category_colors.len(), 6);
    assert_eq!(snapshot.category_colors["outro"], "#abcdef");
}

#[tokio::test]
async fn manual_actions_report_outcomes() {
    let source = Arc::new(CatalogSource::default().with_video("a", SPONSOR_AND_INTRO));
    let media = TestMedia::default();
    let (mut session, mut intents) =
        new_session(source, media.clone(), &StoredConfig::default());

    session.on_navigation_changed(&watch_page("a"));
    session.await_fetch().await;
    drain(&mut intents);

    media.set_position(5.0);
    session.skip_current();
    assert_eq!(media.position(), 10.0);
    session.skip_current();
    session.jump_to_next();
    assert_eq!(media.position(), 20.0);
    session.jump_to_next();
    session.jump_to_previous();
    assert_eq!(media.position(), 0.0);
    session.jump_to_previous();

    assert_eq!(
        drain(&mut intents),
        vec![
            Intent::SkipPerformed {
                kind: SkipKind::Manual
            },
            Intent::NoSegmentAtPosition,
            Intent::JumpPerformed {
                direction: JumpDirection::Next
            },
            Intent::NoNextSegment,
            Intent::JumpPerformed {
                direction: JumpDirection::Previous
            },
            Intent::NoPreviousSegment,
        ]
    );
}

#[tokio::test]
async fn leaving_for_a_page_without_video_stops_tracking() {
    let source = Arc::new(CatalogSource::default().with_video("a", SPONSOR_AND_INTRO));
    let media = TestMedia::default();
    let (mut session, _intents) =
        new_session(source, media.clone(), &StoredConfig::default());

    session.on_navigation_changed(&watch_page("a"));
    session.await_fetch().await;
    let feed = media.feed();

    session.on_navigation_changed(&PageContext::from_location("https://www.youtube.com/feed/subscriptions"));

    assert!(feed.is_closed());
    let snapshot = session.snapshot();
    assert!(snapshot.active_video.is_none());
    assert!(snapshot.segments.is_empty());
    assert!(!snapshot.sampling);
}

#[tokio::test]
async fn spawned_session_handles_samples_and_commands_in_order() {
    let source = Arc::new(CatalogSource::default().with_video("a", SPONSOR_AND_INTRO));
    let media = TestMedia::default();
    let (session, mut intents) = new_session(source, media.clone(), &StoredConfig::default());
    let handle = session.spawn();

    handle
        .navigate(watch_page("a").with_player_video_id("a"))
        .await
        .unwrap();

    let loaded = tokio::time::timeout(Duration::from_secs(2), intents.recv())
        .await
        .expect("segments load in time");
    assert_eq!(loaded, Some(Intent::SegmentsLoaded { count: 2 }));

    let snapshot = handle.inspect().await.unwrap();
    assert!(snapshot.sampling);

    media.set_position(1.0);
    media.feed().send(1.0).await.unwrap();
    let entered = tokio::time::timeout(Duration::from_secs(2), intents.recv())
        .await
        .expect("sample processed in time");
    assert_eq!(entered, Some(ENTERED));

    handle.send(Command::SkipCurrent).await.unwrap();
    let skipped = tokio::time::timeout(Duration::from_secs(2), intents.recv())
        .await
        .expect("skip processed in time");
    assert_eq!(
        skipped,
        Some(Intent::SkipPerformed {
            kind: SkipKind::Manual
        })
    );
    assert_eq!(media.position(), 10.0);

    handle.shutdown().await;
}

#[test]
#[should_panic]
fn navigation_outside_a_runtime_panics() {
    let source = Arc::new(CatalogSource::default().with_video("a", SPONSOR_AND_INTRO));
    let (mut session, _intents) =
        new_session(source, TestMedia::default(), &StoredConfig::default());

    session.on_navigation_changed(&watch_page("a"));
}

#[test]
fn navigation_inside_an_entered_runtime_loads() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let source = Arc::new(CatalogSource::default().with_video("a", SPONSOR_AND_INTRO));
    let (mut session, _intents) =
        new_session(source, TestMedia::default(), &StoredConfig::default());

    {
        let _entered = runtime.enter();
        session.on_navigation_changed(&watch_page("a"));
    }
    assert!(runtime.block_on(session.await_fetch()));
    assert_eq!(session.snapshot().segments.len(), 2);
}
