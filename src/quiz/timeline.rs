//! Drives the door video through timestamp-bounded segments.
//!
//! Each `play_toward` opens a segment that completes exactly once: on the
//! first qualifying position tick, on natural end of the video, or on a
//! deadline (playback refused, or playback stalled past the watchdog). The
//! completion comes back from `handle` so the session is the only dispatcher.

use std::time::Duration;

use log::{debug, warn};

use super::events::{DeadlineCause, EventSink, MediaEvent, Signal, Timer};
use super::media::MediaPlayback;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineTarget {
    /// `None` plays to the natural end of the video.
    pub timestamp: Option<f64>,
    pub tolerance: f64,
}

impl TimelineTarget {
    pub fn at(timestamp: f64, tolerance: f64) -> Self {
        debug_assert!(timestamp >= 0.0, "negative target timestamp");
        Self {
            timestamp: Some(timestamp),
            tolerance,
        }
    }

    pub fn end() -> Self {
        Self {
            timestamp: None,
            tolerance: 0.0,
        }
    }

    pub fn plays_to_end(&self) -> bool {
        self.timestamp.is_none()
    }

    fn is_reached_at(&self, position: f64) -> bool {
        match self.timestamp {
            Some(timestamp) => position >= timestamp - self.tolerance,
            None => false,
        }
    }

    fn completion(&self) -> SegmentCompletion {
        if self.plays_to_end() {
            SegmentCompletion::Ended
        } else {
            SegmentCompletion::TargetReached
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentCompletion {
    TargetReached,
    Ended,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionCause {
    TargetReached,
    Ended,
    FallbackFired,
}

#[derive(Debug, Clone)]
pub struct TimelineConfig {
    /// Delay before a refused bounded segment is treated as played.
    pub fallback: Duration,
    /// Same, for the play-to-end segment.
    pub end_fallback: Duration,
    /// Slack added to a segment's expected span before the watchdog fires.
    /// `None` disables the watchdog.
    pub watchdog_grace: Option<Duration>,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            fallback: Duration::from_millis(500),
            end_fallback: Duration::from_millis(2000),
            watchdog_grace: Some(Duration::from_millis(1500)),
        }
    }
}

#[derive(Debug)]
struct Segment {
    id: u64,
    target: TimelineTarget,
    fallback: Option<Timer>,
    watchdog: Option<Timer>,
}

#[derive(Debug)]
enum SegmentState {
    Idle,
    Advancing(Segment),
    /// One-shot latch: the segment has fired, ticks are ignored until the
    /// next `play_toward` or `seek_to`.
    Completed { segment: u64, cause: CompletionCause },
}

/// Observable state of the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineState {
    Idle,
    Advancing(TimelineTarget),
    Completed(CompletionCause),
}

pub struct TimelineController<M> {
    media: M,
    config: TimelineConfig,
    sink: EventSink,
    state: SegmentState,
    next_segment: u64,
}

impl<M: MediaPlayback> TimelineController<M> {
    pub fn new(media: M, config: TimelineConfig, sink: EventSink) -> Self {
        Self {
            media,
            config,
            sink,
            state: SegmentState::Idle,
            next_segment: 1,
        }
    }

    pub fn media(&self) -> &M {
        &self.media
    }

    pub fn state(&self) -> TimelineState {
        match &self.state {
            SegmentState::Idle => TimelineState::Idle,
            SegmentState::Advancing(segment) => TimelineState::Advancing(segment.target),
            SegmentState::Completed { cause, .. } => TimelineState::Completed(*cause),
        }
    }

    pub fn is_advancing(&self) -> bool {
        matches!(self.state, SegmentState::Advancing(_))
    }

    /// Starts playback toward `target`. Asking again for the target already
    /// in progress is a no-op; asking for a different one abandons the
    /// current segment first so that only the new one can fire.
    pub fn play_toward(&mut self, target: TimelineTarget) {
        if let SegmentState::Advancing(segment) = &self.state {
            if segment.target == target {
                debug!("segment {} already advancing toward {:?}", segment.id, target);
                return;
            }
            debug!("segment {} abandoned for {:?}", segment.id, target);
        }

        let id = self.next_segment;
        self.next_segment += 1;
        let watchdog = self.arm_watchdog(id, &target);
        self.state = SegmentState::Advancing(Segment {
            id,
            target,
            fallback: None,
            watchdog,
        });

        debug!(
            "segment {} advancing from {:.2}s toward {:?}",
            id,
            self.media.position(),
            target.timestamp
        );
        self.media.play();
    }

    /// Jumps without playing. Only positions that decode immediately (the
    /// start of the video) are safe here.
    pub fn seek_to(&mut self, timestamp: f64) {
        self.media.pause();
        self.state = SegmentState::Idle;
        self.media.seek(timestamp);
    }

    pub fn stop(&mut self) {
        self.media.pause();
        self.state = SegmentState::Idle;
    }

    /// Back to the first frame, with nothing pending.
    pub fn reset(&mut self) {
        self.seek_to(0.0);
    }

    /// Feeds a media event or segment deadline. Returns the completion of the
    /// current segment the first time it happens, `None` otherwise.
    pub fn handle(&mut self, signal: &Signal) -> Option<SegmentCompletion> {
        match signal {
            Signal::Media(event) => self.handle_media(event),
            Signal::SegmentDeadline { segment, cause } => self.handle_deadline(*segment, *cause),
            Signal::FadeElapsed => None,
        }
    }

    fn handle_media(&mut self, event: &MediaEvent) -> Option<SegmentCompletion> {
        let segment = match &mut self.state {
            SegmentState::Advancing(segment) => segment,
            SegmentState::Completed { segment, .. } => {
                debug!("late {:?} for completed segment {} dropped", event, segment);
                return None;
            }
            SegmentState::Idle => return None,
        };

        match event {
            MediaEvent::PositionChanged(position) => {
                if segment.target.is_reached_at(*position) {
                    self.media.pause();
                    Some(self.complete(CompletionCause::TargetReached))
                } else {
                    None
                }
            }
            MediaEvent::Ended => {
                // end of media also passes any bounded target
                Some(self.complete(CompletionCause::Ended))
            }
            MediaEvent::PlayRejected(reason) => {
                if segment.fallback.is_some() {
                    return None;
                }
                let delay = if segment.target.plays_to_end() {
                    self.config.end_fallback
                } else {
                    self.config.fallback
                };
                warn!(
                    "door video refused to play ({}), segment {} completes in {:?}",
                    reason, segment.id, delay
                );
                segment.fallback = Some(self.sink.schedule(
                    delay,
                    Signal::SegmentDeadline {
                        segment: segment.id,
                        cause: DeadlineCause::PlaybackRejected,
                    },
                ));
                None
            }
        }
    }

    fn handle_deadline(&mut self, id: u64, cause: DeadlineCause) -> Option<SegmentCompletion> {
        let current = match &self.state {
            SegmentState::Advancing(segment) => Some(segment.id),
            _ => None,
        };
        if current != Some(id) {
            debug!("stale deadline for segment {} ignored", id);
            return None;
        }

        if cause == DeadlineCause::Watchdog {
            warn!(
                "segment {} stalled at {:.2}s, forcing completion",
                id,
                self.media.position()
            );
        }
        self.media.pause();
        Some(self.complete(CompletionCause::FallbackFired))
    }

    fn complete(&mut self, cause: CompletionCause) -> SegmentCompletion {
        let previous = std::mem::replace(&mut self.state, SegmentState::Idle);
        let segment = match previous {
            SegmentState::Advancing(segment) => segment,
            other => {
                self.state = other;
                unreachable!("completing a segment that is not advancing");
            }
        };

        let completion = segment.target.completion();
        debug!("segment {} completed ({:?} via {:?})", segment.id, completion, cause);
        self.state = SegmentState::Completed {
            segment: segment.id,
            cause,
        };
        for timer in [segment.fallback, segment.watchdog].into_iter().flatten() {
            timer.cancel();
        }
        completion
    }

    fn arm_watchdog(&self, id: u64, target: &TimelineTarget) -> Option<Timer> {
        let grace = self.config.watchdog_grace?;
        let position = self.media.position();
        let span = match target.timestamp {
            Some(timestamp) => timestamp - position,
            None => self
                .media
                .duration()
                .map(|duration| duration - position)
                .unwrap_or(0.0),
        };
        let expected = Duration::from_secs_f64(span.max(0.0));

        Some(self.sink.schedule(
            expected + grace,
            Signal::SegmentDeadline {
                segment: id,
                cause: DeadlineCause::Watchdog,
            },
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::events::Inbox;
    use crate::quiz::testing::{PlayerCall, ScriptedPlayer};

    const TOLERANCE: f64 = 0.02;

    fn controller(config: TimelineConfig) -> (TimelineController<ScriptedPlayer>, EventSink, Inbox) {
        let (sink, inbox) = EventSink::channel();
        let player = ScriptedPlayer::new(4.5);
        (TimelineController::new(player, config, sink.clone()), sink, inbox)
    }

    fn no_watchdog() -> TimelineConfig {
        TimelineConfig {
            watchdog_grace: None,
            ..TimelineConfig::default()
        }
    }

    fn assert_elapsed(started: tokio::time::Instant, expected: Duration) {
        let elapsed = started.elapsed();
        assert!(
            elapsed >= expected && elapsed < expected + Duration::from_millis(5),
            "elapsed {:?}, expected {:?}",
            elapsed,
            expected
        );
    }

    fn tick(position: f64) -> Signal {
        Signal::Media(MediaEvent::PositionChanged(position))
    }

    #[tokio::test]
    async fn first_qualifying_tick_completes_once() {
        let (mut timeline, _sink, _inbox) = controller(no_watchdog());
        timeline.play_toward(TimelineTarget::at(1.0, TOLERANCE));
        assert!(timeline.is_advancing());

        assert_eq!(timeline.handle(&tick(0.5)), None);
        assert_eq!(timeline.handle(&tick(0.985)), Some(SegmentCompletion::TargetReached));
        assert_eq!(timeline.handle(&tick(0.99)), None);
        assert_eq!(timeline.handle(&tick(1.2)), None);
        assert_eq!(
            timeline.state(),
            TimelineState::Completed(CompletionCause::TargetReached)
        );
        assert_eq!(
            timeline.media().calls(),
            vec![PlayerCall::Play, PlayerCall::Pause]
        );
    }

    #[tokio::test]
    async fn out_of_order_ticks_do_not_refire() {
        let (mut timeline, _sink, _inbox) = controller(no_watchdog());
        timeline.play_toward(TimelineTarget::at(1.5, TOLERANCE));

        assert_eq!(timeline.handle(&tick(1.6)), Some(SegmentCompletion::TargetReached));
        assert_eq!(timeline.handle(&tick(1.4)), None);
        assert_eq!(timeline.handle(&tick(1.6)), None);
    }

    #[tokio::test]
    async fn play_to_end_ignores_ticks_and_waits_for_end() {
        let (mut timeline, _sink, _inbox) = controller(no_watchdog());
        timeline.play_toward(TimelineTarget::end());

        assert_eq!(timeline.handle(&tick(100.0)), None);
        assert_eq!(
            timeline.handle(&Signal::Media(MediaEvent::Ended)),
            Some(SegmentCompletion::Ended)
        );
        assert_eq!(timeline.handle(&Signal::Media(MediaEvent::Ended)), None);
    }

    #[tokio::test]
    async fn end_of_media_completes_a_bounded_segment() {
        let (mut timeline, _sink, _inbox) = controller(no_watchdog());
        timeline.play_toward(TimelineTarget::at(3.0, TOLERANCE));

        assert_eq!(timeline.handle(&tick(2.5)), None);
        assert_eq!(
            timeline.handle(&Signal::Media(MediaEvent::Ended)),
            Some(SegmentCompletion::TargetReached)
        );
        assert_eq!(
            timeline.state(),
            TimelineState::Completed(CompletionCause::Ended)
        );
        assert_eq!(timeline.handle(&tick(3.0)), None);
        assert_eq!(timeline.handle(&Signal::Media(MediaEvent::Ended)), None);
    }

    #[tokio::test]
    async fn same_target_twice_keeps_one_segment() {
        let (mut timeline, _sink, _inbox) = controller(no_watchdog());
        let target = TimelineTarget::at(1.0, TOLERANCE);
        timeline.play_toward(target);
        timeline.play_toward(target);

        assert_eq!(timeline.media().calls(), vec![PlayerCall::Play]);
    }

    #[tokio::test]
    async fn retargeting_abandons_the_previous_segment() {
        let (mut timeline, _sink, _inbox) = controller(no_watchdog());
        timeline.play_toward(TimelineTarget::at(1.0, TOLERANCE));
        timeline.play_toward(TimelineTarget::at(2.0, TOLERANCE));

        assert_eq!(timeline.handle(&tick(1.0)), None);
        assert_eq!(timeline.handle(&tick(2.0)), Some(SegmentCompletion::TargetReached));
    }

    #[tokio::test]
    async fn stop_emits_nothing_and_ignores_later_ticks() {
        let (mut timeline, _sink, _inbox) = controller(no_watchdog());
        timeline.play_toward(TimelineTarget::at(1.0, TOLERANCE));
        timeline.stop();

        assert_eq!(timeline.state(), TimelineState::Idle);
        assert_eq!(timeline.handle(&tick(1.0)), None);
    }

    #[tokio::test]
    async fn seek_to_clears_the_latch_and_moves_the_player() {
        let (mut timeline, _sink, _inbox) = controller(no_watchdog());
        timeline.play_toward(TimelineTarget::at(1.0, TOLERANCE));
        timeline.handle(&tick(1.0));
        timeline.seek_to(0.0);

        assert_eq!(timeline.state(), TimelineState::Idle);
        assert_eq!(timeline.media().position(), 0.0);
        assert_eq!(timeline.media().calls().last(), Some(&PlayerCall::Seek(0.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn refused_bounded_segment_completes_after_fallback() {
        let (mut timeline, _sink, mut inbox) = controller(no_watchdog());
        timeline.play_toward(TimelineTarget::at(1.0, TOLERANCE));

        let rejected = Signal::Media(MediaEvent::PlayRejected("blocked".into()));
        assert_eq!(timeline.handle(&rejected), None);

        let started = tokio::time::Instant::now();
        let envelope = inbox.recv().await.unwrap();
        assert_elapsed(started, Duration::from_millis(500));
        assert_eq!(
            timeline.handle(&envelope.signal),
            Some(SegmentCompletion::TargetReached)
        );
        assert_eq!(
            timeline.state(),
            TimelineState::Completed(CompletionCause::FallbackFired)
        );
        // the same deadline delivered again is latched out
        assert_eq!(timeline.handle(&envelope.signal), None);
    }

    #[tokio::test(start_paused = true)]
    async fn refused_final_segment_waits_longer_and_reports_ended() {
        let (mut timeline, _sink, mut inbox) = controller(no_watchdog());
        timeline.play_toward(TimelineTarget::end());
        timeline.handle(&Signal::Media(MediaEvent::PlayRejected("blocked".into())));

        let started = tokio::time::Instant::now();
        let envelope = inbox.recv().await.unwrap();
        assert_elapsed(started, Duration::from_millis(2000));
        assert_eq!(timeline.handle(&envelope.signal), Some(SegmentCompletion::Ended));
    }

    #[tokio::test(start_paused = true)]
    async fn tick_before_fallback_wins_and_cancels_it() {
        let (mut timeline, _sink, mut inbox) = controller(no_watchdog());
        timeline.play_toward(TimelineTarget::at(1.0, TOLERANCE));
        timeline.handle(&Signal::Media(MediaEvent::PlayRejected("blocked".into())));
        assert_eq!(timeline.handle(&tick(1.0)), Some(SegmentCompletion::TargetReached));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(inbox.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_from_an_abandoned_segment_is_ignored() {
        let (mut timeline, _sink, mut inbox) = controller(no_watchdog());
        timeline.play_toward(TimelineTarget::at(1.0, TOLERANCE));
        timeline.handle(&Signal::Media(MediaEvent::PlayRejected("blocked".into())));
        let stale = match &timeline.state {
            SegmentState::Advancing(segment) => segment.id,
            _ => unreachable!(),
        };
        timeline.play_toward(TimelineTarget::at(2.0, TOLERANCE));

        let deadline = Signal::SegmentDeadline {
            segment: stale,
            cause: DeadlineCause::PlaybackRejected,
        };
        assert_eq!(timeline.handle(&deadline), None);
        assert!(timeline.is_advancing());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(inbox.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn watchdog_rescues_a_stalled_segment() {
        let (mut timeline, _sink, mut inbox) = controller(TimelineConfig {
            watchdog_grace: Some(Duration::from_millis(1500)),
            ..TimelineConfig::default()
        });
        // player sits at 0.0 and never ticks
        timeline.play_toward(TimelineTarget::at(1.0, TOLERANCE));

        let started = tokio::time::Instant::now();
        let envelope = inbox.recv().await.unwrap();
        assert_elapsed(started, Duration::from_millis(2500));
        assert_eq!(
            envelope.signal,
            Signal::SegmentDeadline {
                segment: 1,
                cause: DeadlineCause::Watchdog
            }
        );
        assert_eq!(
            timeline.handle(&envelope.signal),
            Some(SegmentCompletion::TargetReached)
        );
    }
}
