use std::sync::Arc;
use std::time::Duration;

use log::debug;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::events::{EventSink, MediaEvent};

/// A single playable media resource.
///
/// Requests return immediately. Their effects are reported later through the
/// sink the player was built with: position ticks at coarse, irregular
/// intervals, end of playback, and refusal of a play request.
pub trait MediaPlayback {
    fn position(&self) -> f64;
    /// Total length in seconds, when known.
    fn duration(&self) -> Option<f64>;
    fn seek(&mut self, position: f64);
    fn play(&mut self);
    fn pause(&mut self);
}

#[derive(Debug, Clone)]
pub struct PlayerConfig {
    pub duration: f64,
    pub tick: Duration,
    /// Refuse every play request, like a browser blocking autoplay.
    pub autoplay_blocked: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            duration: 4.5,
            tick: Duration::from_millis(250),
            autoplay_blocked: false,
        }
    }
}

#[derive(Debug, Default)]
struct Clock {
    base: f64,
    playing_since: Option<Instant>,
}

impl Clock {
    fn position(&self, duration: f64) -> f64 {
        let elapsed = self
            .playing_since
            .map(|since| since.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        (self.base + elapsed).min(duration)
    }

    fn freeze(&mut self, duration: f64) {
        self.base = self.position(duration);
        self.playing_since = None;
    }
}

/// Plays the door video against the tokio clock at normal speed.
pub struct VirtualPlayer {
    config: PlayerConfig,
    clock: Arc<Mutex<Clock>>,
    sink: EventSink,
    ticker: Option<JoinHandle<()>>,
}

impl VirtualPlayer {
    pub fn new(config: PlayerConfig, sink: EventSink) -> Self {
        Self {
            config,
            clock: Arc::new(Mutex::new(Clock::default())),
            sink,
            ticker: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.clock.lock().playing_since.is_some()
    }

    fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }

    fn spawn_ticker(&self) -> JoinHandle<()> {
        let clock = self.clock.clone();
        let sink = self.sink.clone();
        let duration = self.config.duration;
        let period = self.config.tick;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                // first tick completes immediately, reporting the start position
                interval.tick().await;
                let position = clock.lock().position(duration);
                sink.media(MediaEvent::PositionChanged(position));

                if position >= duration {
                    clock.lock().freeze(duration);
                    sink.media(MediaEvent::Ended);
                    break;
                }
            }
        })
    }
}

impl MediaPlayback for VirtualPlayer {
    fn position(&self) -> f64 {
        self.clock.lock().position(self.config.duration)
    }

    fn duration(&self) -> Option<f64> {
        Some(self.config.duration)
    }

    fn seek(&mut self, position: f64) {
        let position = position.clamp(0.0, self.config.duration);
        let mut clock = self.clock.lock();
        clock.base = position;
        if clock.playing_since.is_some() {
            clock.playing_since = Some(Instant::now());
        }
        debug!("door video seeked to {:.2}s", position);
    }

    fn play(&mut self) {
        if self.config.autoplay_blocked {
            self.sink
                .media(MediaEvent::PlayRejected("autoplay blocked".to_string()));
            return;
        }
        if self.is_playing() {
            return;
        }

        {
            let mut clock = self.clock.lock();
            // replaying a finished video starts it over
            if clock.base >= self.config.duration {
                clock.base = 0.0;
            }
            clock.playing_since = Some(Instant::now());
        }
        self.stop_ticker();
        self.ticker = Some(self.spawn_ticker());
    }

    fn pause(&mut self) {
        self.stop_ticker();
        self.clock.lock().freeze(self.config.duration);
    }
}

impl Drop for VirtualPlayer {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
