//! The quiz session controller: landing, five questions, result.
//!
//! The session is the only writer of `SessionState`. It moves forward on user
//! commands and on signals from its inbox, and reports what the screen should
//! show as a list of `SessionUpdate`s.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use rand::RngCore;

use super::catalog::QuestionCatalog;
use super::events::{Envelope, EventSink, Signal, Timer};
use super::media::MediaPlayback;
use super::scoring::{self, Personality, PersonalityOutcome};
use super::sound::{CueKind, SoundCue};
use super::timeline::{SegmentCompletion, TimelineController, TimelineTarget};
use super::{AnswerId, AnswerSet};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Door video timestamp at which each question is revealed.
    pub door_marks: Vec<f64>,
    pub tolerance: f64,
    /// How long the answered question fades out before the door moves.
    pub fade: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            door_marks: vec![1.0, 1.5, 2.0, 2.5, 3.0],
            tolerance: 0.02,
            fade: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Answer recorded, UI fading out.
    Fading,
    /// Door moving toward the next question.
    Door,
    /// Last answer given, door playing to the end.
    Finale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Landing { opening: bool },
    InQuestion(usize),
    AwaitingTransition { from: usize, stage: Stage },
    Result,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub phase: Phase,
    pub current_question_index: usize,
    pub answers: AnswerSet,
    /// Present exactly when `phase` is `Result`.
    pub outcome: Option<&'static PersonalityOutcome>,
}

impl SessionState {
    pub fn initial() -> Self {
        Self {
            phase: Phase::Landing { opening: false },
            current_question_index: 0,
            answers: AnswerSet::new(),
            outcome: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Answer(AnswerId),
    Restart,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// The door starts opening from the landing screen.
    Opening,
    QuestionRevealed { index: usize },
    AnswerRecorded { question_id: u32, answer: AnswerId },
    UiHidden { from: usize },
    DoorOpening { toward: usize },
    /// The door bursts open toward the result.
    Finale,
    ResultPublished(Personality),
    Reset,
}

pub struct QuizSession<M> {
    catalog: QuestionCatalog,
    config: SessionConfig,
    timeline: TimelineController<M>,
    sink: EventSink,
    sound: Arc<dyn SoundCue>,
    rng: Box<dyn RngCore + Send>,
    state: SessionState,
    pending_outcome: Option<&'static PersonalityOutcome>,
    fade: Option<Timer>,
}

impl<M: MediaPlayback> QuizSession<M> {
    pub fn new(
        catalog: QuestionCatalog,
        config: SessionConfig,
        timeline: TimelineController<M>,
        sink: EventSink,
        sound: Arc<dyn SoundCue>,
        rng: Box<dyn RngCore + Send>,
    ) -> Self {
        assert_eq!(
            config.door_marks.len(),
            catalog.count(),
            "one door mark per question"
        );
        Self {
            catalog,
            config,
            timeline,
            sink,
            sound,
            rng,
            state: SessionState::initial(),
            pending_outcome: None,
            fade: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn timeline(&self) -> &TimelineController<M> {
        &self.timeline
    }

    pub fn apply(&mut self, command: Command) -> Vec<SessionUpdate> {
        match command {
            Command::Start => self.start(),
            Command::Answer(answer) => self.answer(answer),
            Command::Restart => self.restart(),
        }
    }

    pub fn start(&mut self) -> Vec<SessionUpdate> {
        if self.state.phase != (Phase::Landing { opening: false }) {
            debug!("start ignored in {:?}", self.state.phase);
            return Vec::new();
        }

        info!("quiz started");
        self.state.phase = Phase::Landing { opening: true };
        self.sound.cue(CueKind::Start);
        self.sound.set_ambient(true);
        let target = self.door_target(0);
        self.timeline.play_toward(target);

        self.check_invariants();
        vec![SessionUpdate::Opening]
    }

    /// Records the answer to the question on screen. Only the first answer
    /// per reveal counts; anything arriving mid-transition is dropped.
    pub fn answer(&mut self, answer: AnswerId) -> Vec<SessionUpdate> {
        let index = match self.state.phase {
            Phase::InQuestion(index) => index,
            phase => {
                debug!("answer {} ignored in {:?}", answer, phase);
                return Vec::new();
            }
        };

        let question = self.catalog.question_at(index);
        self.state.answers.record(question.id, answer);
        self.sound.cue(CueKind::Ding);
        debug!("question {} answered {}", question.id, answer);

        let mut updates = vec![
            SessionUpdate::AnswerRecorded {
                question_id: question.id,
                answer,
            },
            SessionUpdate::UiHidden { from: index },
        ];

        if index + 1 < self.catalog.count() {
            self.state.phase = Phase::AwaitingTransition {
                from: index,
                stage: Stage::Fading,
            };
            self.fade = Some(self.sink.schedule(self.config.fade, Signal::FadeElapsed));
        } else {
            // scored now so the result is ready the moment the door finishes
            let outcome = scoring::score(&self.state.answers, self.rng.as_mut());
            info!("quiz answered, outcome {:?}", outcome.kind);
            self.pending_outcome = Some(outcome);
            self.state.phase = Phase::AwaitingTransition {
                from: index,
                stage: Stage::Finale,
            };
            self.sound.cue(CueKind::Whoosh);
            self.timeline.play_toward(TimelineTarget::end());
            updates.push(SessionUpdate::Finale);
        }

        self.check_invariants();
        updates
    }

    /// Back to the landing screen from anywhere. Pending timers die and every
    /// signal produced before this call is discarded on arrival.
    pub fn restart(&mut self) -> Vec<SessionUpdate> {
        let epoch = self.sink.advance_epoch();
        if let Some(fade) = self.fade.take() {
            fade.cancel();
        }
        self.pending_outcome = None;
        self.timeline.reset();
        self.state = SessionState::initial();
        self.sound.set_ambient(false);
        info!("quiz restarted (epoch {})", epoch);

        self.check_invariants();
        vec![SessionUpdate::Reset]
    }

    pub fn handle(&mut self, envelope: Envelope) -> Vec<SessionUpdate> {
        if envelope.epoch != self.sink.epoch() {
            debug!(
                "dropping {:?} from epoch {} (now {})",
                envelope.signal,
                envelope.epoch,
                self.sink.epoch()
            );
            return Vec::new();
        }

        let updates = match envelope.signal {
            Signal::FadeElapsed => self.on_fade_elapsed(),
            signal => match self.timeline.handle(&signal) {
                Some(completion) => self.on_segment_complete(completion),
                None => Vec::new(),
            },
        };

        self.check_invariants();
        updates
    }

    /// Stops the door and the ambience when the session goes away.
    pub fn shutdown(&mut self) {
        if let Some(fade) = self.fade.take() {
            fade.cancel();
        }
        self.timeline.stop();
        self.sound.set_ambient(false);
    }

    fn on_fade_elapsed(&mut self) -> Vec<SessionUpdate> {
        let from = match self.state.phase {
            Phase::AwaitingTransition {
                from,
                stage: Stage::Fading,
            } => from,
            phase => {
                debug!("fade elapsed in {:?}, ignored", phase);
                return Vec::new();
            }
        };

        self.fade.take();
        self.state.phase = Phase::AwaitingTransition {
            from,
            stage: Stage::Door,
        };
        self.sound.cue(CueKind::Whoosh);
        let target = self.door_target(from + 1);
        self.timeline.play_toward(target);
        vec![SessionUpdate::DoorOpening { toward: from + 1 }]
    }

    fn on_segment_complete(&mut self, completion: SegmentCompletion) -> Vec<SessionUpdate> {
        match (self.state.phase, completion) {
            (Phase::Landing { opening: true }, SegmentCompletion::TargetReached) => self.reveal(0),
            (
                Phase::AwaitingTransition {
                    from,
                    stage: Stage::Door,
                },
                SegmentCompletion::TargetReached,
            ) => self.reveal(from + 1),
            (
                Phase::AwaitingTransition {
                    stage: Stage::Finale,
                    ..
                },
                SegmentCompletion::Ended,
            ) => self.publish(),
            (phase, completion) => {
                warn!("{:?} does not apply in {:?}, ignored", completion, phase);
                Vec::new()
            }
        }
    }

    fn reveal(&mut self, index: usize) -> Vec<SessionUpdate> {
        debug_assert!(
            index == 0 || index == self.state.current_question_index + 1,
            "question index moved from {} to {}",
            self.state.current_question_index,
            index
        );
        self.state.current_question_index = index;
        self.state.phase = Phase::InQuestion(index);
        debug!("question {} revealed", self.catalog.question_at(index).id);
        vec![SessionUpdate::QuestionRevealed { index }]
    }

    fn publish(&mut self) -> Vec<SessionUpdate> {
        let outcome = match self.pending_outcome.take() {
            Some(outcome) => outcome,
            None => {
                debug_assert!(false, "final segment ended without a computed outcome");
                scoring::score(&self.state.answers, self.rng.as_mut())
            }
        };

        self.state.outcome = Some(outcome);
        self.state.phase = Phase::Result;
        self.sound.cue(CueKind::Reveal);
        info!("result published: {}", outcome.title);
        vec![SessionUpdate::ResultPublished(outcome.kind)]
    }

    fn door_target(&self, index: usize) -> TimelineTarget {
        TimelineTarget::at(self.config.door_marks[index], self.config.tolerance)
    }

    fn check_invariants(&self) {
        debug_assert_eq!(
            self.state.outcome.is_some(),
            self.state.phase == Phase::Result,
            "outcome must be set exactly in the result phase"
        );
        debug_assert!(self.state.answers.len() <= self.catalog.count());
        debug_assert!(self.state.current_question_index < self.catalog.count());
    }
}
