use std::fmt;

/// One-shot effects a session can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CueKind {
    Start,
    Whoosh,
    Ding,
    Reveal,
}

impl fmt::Display for CueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CueKind::Start => "start",
            CueKind::Whoosh => "whoosh",
            CueKind::Ding => "ding",
            CueKind::Reveal => "reveal",
        };
        f.write_str(name)
    }
}

/// Best-effort audio. Implementations must return immediately and swallow
/// their own failures: a missing sound never holds up the quiz.
pub trait SoundCue: Send + Sync {
    fn cue(&self, kind: CueKind);
    fn set_ambient(&self, playing: bool);
}

/// Plays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl SoundCue for Silent {
    fn cue(&self, _kind: CueKind) {}

    fn set_ambient(&self, _playing: bool) {}
}
