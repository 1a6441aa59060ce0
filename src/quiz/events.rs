//! Notifications flowing into a quiz session.
//!
//! Every signal (media ticks, timer expiries) goes through one inbox and is
//! stamped with the session epoch current when it was produced. A restart
//! advances the epoch, so anything produced before it is recognisably stale.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Current playback position in seconds.
    PositionChanged(f64),
    Ended,
    /// The play request was refused, e.g. autoplay policy.
    PlayRejected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineCause {
    PlaybackRejected,
    Watchdog,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Media(MediaEvent),
    SegmentDeadline { segment: u64, cause: DeadlineCause },
    FadeElapsed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub epoch: u64,
    pub signal: Signal,
}

pub type Inbox = mpsc::UnboundedReceiver<Envelope>;

#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<Envelope>,
    epoch: Arc<AtomicU64>,
}

impl EventSink {
    pub fn channel() -> (Self, Inbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sink = Self {
            tx,
            epoch: Arc::new(AtomicU64::new(0)),
        };
        (sink, rx)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Invalidates everything stamped so far. Returns the new epoch.
    pub fn advance_epoch(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn stamp(&self, signal: Signal) -> Envelope {
        Envelope {
            epoch: self.epoch(),
            signal,
        }
    }

    pub fn emit(&self, signal: Signal) {
        // A closed inbox means the session is gone; nobody is left to tell.
        let _ = self.tx.send(self.stamp(signal));
    }

    pub fn media(&self, event: MediaEvent) {
        self.emit(Signal::Media(event));
    }

    /// Delivers `signal` after `delay`. The epoch is taken now, not at expiry.
    pub fn schedule(&self, delay: Duration, signal: Signal) -> Timer {
        let envelope = self.stamp(signal);
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(envelope);
        });
        Timer { handle }
    }
}

/// A pending scheduled signal. Dropping it cancels delivery.
#[derive(Debug)]
pub struct Timer {
    handle: JoinHandle<()>,
}

impl Timer {
    pub fn cancel(self) {
        self.handle.abort();
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
