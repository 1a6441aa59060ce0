//! Test doubles shared by the quiz unit tests.

use std::sync::Arc;

use parking_lot::Mutex;

use super::media::MediaPlayback;
use super::sound::{CueKind, SoundCue};

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCall {
    Play,
    Pause,
    Seek(f64),
}

/// A player that only records what it was asked to do. Tests deliver the
/// resulting media events by hand.
#[derive(Debug)]
pub struct ScriptedPlayer {
    position: f64,
    duration: f64,
    calls: Vec<PlayerCall>,
}

impl ScriptedPlayer {
    pub fn new(duration: f64) -> Self {
        Self {
            position: 0.0,
            duration,
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> Vec<PlayerCall> {
        self.calls.clone()
    }
}

impl MediaPlayback for ScriptedPlayer {
    fn position(&self) -> f64 {
        self.position
    }

    fn duration(&self) -> Option<f64> {
        Some(self.duration)
    }

    fn seek(&mut self, position: f64) {
        self.position = position;
        self.calls.push(PlayerCall::Seek(position));
    }

    fn play(&mut self) {
        self.calls.push(PlayerCall::Play);
    }

    fn pause(&mut self) {
        self.calls.push(PlayerCall::Pause);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Heard {
    Cue(CueKind),
    Ambient(bool),
}

#[derive(Debug, Clone, Default)]
pub struct RecordingCue {
    heard: Arc<Mutex<Vec<Heard>>>,
}

impl RecordingCue {
    pub fn heard(&self) -> Vec<Heard> {
        self.heard.lock().clone()
    }
}

impl SoundCue for RecordingCue {
    fn cue(&self, kind: CueKind) {
        self.heard.lock().push(Heard::Cue(kind));
    }

    fn set_ambient(&self, playing: bool) {
        self.heard.lock().push(Heard::Ambient(playing));
    }
}
