use std::collections::HashMap;

use tokio::{
    sync::{broadcast, mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    config::StoredConfig,
    error::{Result, SmartSkipError},
    fetcher::SegmentFetcher,
    identity::{self, PageContext},
    intent::Intent,
    markers::{TimelineMarker, timeline_markers},
    reactor::ConfigReactor,
    types::{SegmentList, VideoId},
    watcher::{PlaybackWatcher, Playhead},
};

const COMMAND_BUFFER: usize = 32;

/// The host's media element: position access plus a periodic
/// position-changed feed.
pub trait MediaSurface: Playhead + Send + 'static {
    /// Start delivering position samples. Dropping the receiver retires the
    /// subscription.
    fn subscribe(&mut self) -> mpsc::Receiver<f64>;

    /// Total length in seconds, when known. Only used for overlay geometry.
    fn duration(&self) -> Option<f64> {
        None
    }
}

pub type IntentReceiver = mpsc::UnboundedReceiver<Intent>;

#[derive(Debug)]
pub enum Command {
    NavigationChanged(PageContext),
    ConfigChanged(StoredConfig),
    SkipCurrent,
    JumpToNext,
    JumpToPrevious,
    Inspect(oneshot::Sender<SessionSnapshot>),
}

/// Read-only view of a session for the presentation layer.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub active_video: Option<VideoId>,
    pub segments: SegmentList,
    pub auto_skip_enabled: bool,
    pub last_inside_segment: bool,
    pub visible_categories: Vec<String>,
    /// Effective color per category, user overrides applied.
    pub category_colors: HashMap<String, String>,
    pub markers: Vec<TimelineMarker>,
    pub sampling: bool,
}

struct FetchCompleted {
    video: VideoId,
    epoch: u64,
    segments: SegmentList,
}

/// Everything one page context needs: watcher state, derived category view,
/// the fetcher and the current position subscription. All inputs are handled
/// one at a time.
///
/// Lookups run on spawned tasks, so navigation and config changes must be
/// delivered from inside a tokio runtime.
pub struct Session<M: MediaSurface> {
    id: Uuid,
    watcher: PlaybackWatcher,
    reactor: ConfigReactor,
    fetcher: SegmentFetcher,
    media: M,
    samples: Option<mpsc::Receiver<f64>>,
    fetch_epoch: u64,
    completions_tx: mpsc::UnboundedSender<FetchCompleted>,
    completions_rx: mpsc::UnboundedReceiver<FetchCompleted>,
    intents: mpsc::UnboundedSender<Intent>,
}

impl<M: MediaSurface> Session<M> {
    pub fn new(fetcher: SegmentFetcher, media: M, config: &StoredConfig) -> (Self, IntentReceiver) {
        let (intents, intents_rx) = mpsc::unbounded_channel();
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        let session = Self {
            id: Uuid::new_v4(),
            watcher: PlaybackWatcher::new(config.auto_skip_enabled),
            reactor: ConfigReactor::new(config),
            fetcher,
            media,
            samples: None,
            fetch_epoch: 0,
            completions_tx,
            completions_rx,
            intents,
        };
        (session, intents_rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn is_sampling(&self) -> bool {
        self.samples.is_some()
    }

    /// Must be called from within a tokio runtime; a new video spawns its
    /// lookup.
    pub fn on_navigation_changed(&mut self, page: &PageContext) {
        let Some(video) = identity::resolve(page) else {
            debug!(session = %self.id, location = %page.location, "no video identity on page");
            if self.watcher.active_video().is_some() {
                self.samples = None;
                self.watcher.release();
                self.emit(Intent::SegmentsLoaded { count: 0 });
            }
            return;
        };

        if !self.watcher.needs_refresh(&video) {
            debug!(session = %self.id, %video, "same video, segments already loaded");
            return;
        }

        info!(session = %self.id, %video, "tracking video");
        // Retire the old feed before anything else so no stale sample can
        // reach the new video.
        self.samples = None;
        self.watcher.adopt(video.clone());
        self.spawn_fetch(video);
    }

    /// Must be called from within a tokio runtime; a changed visible set
    /// spawns a new lookup.
    pub fn on_config_changed(&mut self, config: &StoredConfig) {
        let change = self.reactor.apply(config, &mut self.watcher);
        if change.is_empty() {
            return;
        }

        info!(
            session = %self.id,
            auto_skip = config.auto_skip_enabled,
            categories_changed = change.categories_changed,
            colors_changed = change.colors_changed,
            "config applied"
        );

        if change.colors_changed {
            self.emit(Intent::AppearanceChanged);
        }

        if change.categories_changed {
            if let Some(video) = self.watcher.active_video().cloned() {
                self.spawn_fetch(video);
            }
        }
    }

    pub fn on_position_sample(&mut self, position: f64) {
        if let Some(intent) = self.watcher.tick(position, &mut self.media) {
            self.emit(intent);
        }
    }

    pub fn skip_current(&mut self) {
        let intent = self.watcher.skip_current(&mut self.media);
        self.emit(intent);
    }

    pub fn jump_to_next(&mut self) {
        let intent = self.watcher.jump_to_next(&mut self.media);
        self.emit(intent);
    }

    pub fn jump_to_previous(&mut self) {
        let intent = self.watcher.jump_to_previous(&mut self.media);
        self.emit(intent);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.watcher.state();
        let markers = self
            .media
            .duration()
            .map(|duration| timeline_markers(&state.segments, duration, self.reactor.view()))
            .unwrap_or_default();

        SessionSnapshot {
            session_id: self.id,
            active_video: state.active_video.clone(),
            segments: state.segments.clone(),
            auto_skip_enabled: state.auto_skip_enabled,
            last_inside_segment: state.last_inside_segment,
            visible_categories: self.reactor.view().visible_categories().to_vec(),
            category_colors: self.reactor.view().colors().clone(),
            markers,
            sampling: self.samples.is_some(),
        }
    }

    pub fn handle(&mut self, command: Command) {
        match command {
            Command::NavigationChanged(page) => self.on_navigation_changed(&page),
            Command::ConfigChanged(config) => self.on_config_changed(&config),
            Command::SkipCurrent => self.skip_current(),
            Command::JumpToNext => self.jump_to_next(),
            Command::JumpToPrevious => self.jump_to_previous(),
            Command::Inspect(reply) => {
                let _ = reply.send(self.snapshot());
            }
        }
    }

    /// Wait for the next lookup to finish and apply it. Returns `false` when the
    /// result was stale and got dropped. Hosts driving the session by hand use
    /// this instead of [`Session::run`].
    pub async fn await_fetch(&mut self) -> bool {
        match self.completions_rx.recv().await {
            Some(done) => self.on_fetch_completed(done),
            None => false,
        }
    }

    pub async fn run(mut self, mut commands: mpsc::Receiver<Command>, mut shutdown: broadcast::Receiver<()>) {
        info!(session = %self.id, "session started");
        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => break,
                command = commands.recv() => match command {
                    Some(command) => self.handle(command),
                    None => break,
                },
                Some(done) = self.completions_rx.recv() => {
                    self.on_fetch_completed(done);
                },
                sample = next_sample(&mut self.samples) => match sample {
                    Some(position) => self.on_position_sample(position),
                    None => {
                        debug!(session = %self.id, "position feed closed");
                        self.samples = None;
                    }
                },
            }
        }
        info!(session = %self.id, "session stopped");
    }

    pub fn spawn(self) -> SessionHandle {
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_BUFFER);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(self.run(commands_rx, shutdown_rx));

        SessionHandle {
            commands: commands_tx,
            shutdown: shutdown_tx,
            task,
        }
    }

    fn spawn_fetch(&mut self, video: VideoId) {
        self.fetch_epoch += 1;
        let epoch = self.fetch_epoch;
        let categories = self.reactor.view().visible_categories().to_vec();
        let fetcher = self.fetcher.clone();
        let done = self.completions_tx.clone();

        debug!(session = %self.id, %video, epoch, ?categories, "segment lookup issued");
        tokio::spawn(async move {
            let segments = fetcher.fetch(&video, &categories).await;
            let _ = done.send(FetchCompleted {
                video,
                epoch,
                segments,
            });
        });
    }

    fn on_fetch_completed(&mut self, done: FetchCompleted) -> bool {
        if done.epoch != self.fetch_epoch || !self.watcher.is_tracking(&done.video) {
            debug!(
                session = %self.id,
                video = %done.video,
                epoch = done.epoch,
                latest = self.fetch_epoch,
                "discarding stale segment lookup"
            );
            return false;
        }

        let count = done.segments.len();
        self.watcher.set_segments(done.segments);
        info!(session = %self.id, video = %done.video, count, "segments loaded");
        self.emit(Intent::SegmentsLoaded { count });

        if self.samples.is_none() {
            self.samples = Some(self.media.subscribe());
        }
        true
    }

    fn emit(&self, intent: Intent) {
        debug!(session = %self.id, ?intent, "intent");
        let _ = self.intents.send(intent);
    }
}

async fn next_sample(samples: &mut Option<mpsc::Receiver<f64>>) -> Option<f64> {
    match samples {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Handle to a session running on its own task.
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl SessionHandle {
    pub async fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SmartSkipError::SessionClosed)
    }

    pub async fn navigate(&self, page: PageContext) -> Result<()> {
        self.send(Command::NavigationChanged(page)).await
    }

    pub async fn update_config(&self, config: StoredConfig) -> Result<()> {
        self.send(Command::ConfigChanged(config)).await
    }

    pub async fn inspect(&self) -> Result<SessionSnapshot> {
        let (reply, snapshot) = oneshot::channel();
        self.send(Command::Inspect(reply)).await?;
        snapshot.await.map_err(|_| SmartSkipError::SessionClosed)
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
    }
}
