use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use smartskip_core::{MediaSurface, Playhead};
use tokio::sync::mpsc;

struct PlayerState {
    position: f64,
    duration: f64,
    feed: Option<mpsc::Sender<f64>>,
}

/// A fake video element that plays at a fixed rate and reports its position
/// to whoever subscribed last.
#[derive(Clone)]
pub struct SimulatedPlayer {
    state: Arc<Mutex<PlayerState>>,
}

impl SimulatedPlayer {
    pub fn new(duration: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(PlayerState {
                position: 0.0,
                duration,
                feed: None,
            })),
        }
    }

    pub fn finished(&self) -> bool {
        let state = self.lock();
        state.position >= state.duration
    }

    /// Advance `step` seconds of video every `tick` of wall time until the end.
    pub async fn play(self, step: f64, tick: Duration) {
        let mut interval = tokio::time::interval(tick);
        loop {
            interval.tick().await;

            let (position, feed) = {
                let mut state = self.lock();
                if state.position >= state.duration {
                    break;
                }
                state.position = (state.position + step).min(state.duration);
                (state.position, state.feed.clone())
            };

            if let Some(feed) = feed {
                // A closed feed just means the subscriber moved on.
                let _ = feed.send(position).await;
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PlayerState> {
        self.state.lock().expect("SimulatedPlayer poisoned")
    }
}

impl Playhead for SimulatedPlayer {
    fn position(&self) -> f64 {
        self.lock().position
    }

    fn seek(&mut self, position: f64) {
        let mut state = self.lock();
        state.position = position.clamp(0.0, state.duration);
    }
}

impl MediaSurface for SimulatedPlayer {
    fn subscribe(&mut self) -> mpsc::Receiver<f64> {
        let (tx, rx) = mpsc::channel(16);
        self.lock().feed = Some(tx);
        rx
    }

    fn duration(&self) -> Option<f64> {
        Some(self.lock().duration)
    }
}
