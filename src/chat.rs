//! Telegram side of the quiz: one session task per chat, screens rendered as
//! messages, sound cues delivered as audio.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use teloxide::prelude::*;
use teloxide::types::{InputFile, KeyboardButton, KeyboardMarkup, KeyboardRemove, ParseMode};
use teloxide::utils::html;
use tokio::sync::mpsc;

use crate::config::Settings;
use crate::quiz::catalog::{self, QuestionCatalog};
use crate::quiz::events::EventSink;
use crate::quiz::media::VirtualPlayer;
use crate::quiz::runner::{spawn_session, SessionHandle};
use crate::quiz::scoring::PersonalityOutcome;
use crate::quiz::session::{QuizSession, SessionUpdate};
use crate::quiz::sound::{CueKind, Silent, SoundCue};
use crate::quiz::timeline::TimelineController;
use crate::quiz::{Answer, AnswerId, Question};
use crate::sfx::{Clip, SfxLibrary};

pub fn landing_text() -> String {
    format!(
        "<b>{}</b>\n\n{}",
        html::escape(catalog::LANDING_TITLE),
        html::escape(catalog::LANDING_TAGLINE)
    )
}

pub fn start_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(catalog::START_LABEL)]])
}

pub fn restart_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(catalog::RESTART_LABEL)]])
}

pub fn answer_label(answer: &Answer) -> String {
    format!("{}. {}", answer.id, answer.text)
}

pub fn question_text(catalog: &QuestionCatalog, index: usize) -> String {
    let question = catalog.question_at(index);
    format!(
        "{}\n<i>{}</i>\n\n<b>{}</b>\n{}",
        catalog.progress_label(index),
        html::escape(catalog.voice_line(index)),
        html::escape(question.prompt),
        html::escape(question.micro_copy)
    )
}

pub fn question_keyboard(question: &Question) -> KeyboardMarkup {
    KeyboardMarkup::new(
        question
            .answers
            .iter()
            .map(|answer| vec![KeyboardButton::new(answer_label(answer))])
            .collect::<Vec<_>>(),
    )
}

/// Accepts a keyboard label ("B. Khát khao được tự do") or a bare letter.
pub fn parse_answer(text: &str) -> Option<AnswerId> {
    let text = text.trim();
    let mut chars = text.chars();
    let id = AnswerId::from_letter(chars.next()?)?;
    match chars.next() {
        None | Some('.') | Some(')') => Some(id),
        _ => None,
    }
}

pub fn result_text(outcome: &PersonalityOutcome) -> String {
    format!(
        "{}\n✨ <b>{}</b>\n{}\n\n{}\n\n🧴 <b>{}</b>\n{}\n\n💐 <b>{}</b>\n{}",
        html::escape(catalog::RESULT_HEADER),
        html::escape(outcome.title),
        outcome.kind.label().to_uppercase(),
        html::escape(outcome.description),
        html::escape(outcome.male.name),
        html::escape(outcome.male.description),
        html::escape(outcome.female.name),
        html::escape(outcome.female.description)
    )
}

/// Renders one session update into the chat.
pub async fn present(
    bot: &Bot,
    chat: ChatId,
    catalog: &QuestionCatalog,
    update: SessionUpdate,
) -> ResponseResult<()> {
    match update {
        SessionUpdate::Opening => {
            bot.send_message(chat, format!("<i>{}</i>", html::escape(catalog::LANDING_VOICE_LINE)))
                .parse_mode(ParseMode::Html)
                .reply_markup(KeyboardRemove::new())
                .await?;
        }
        SessionUpdate::QuestionRevealed { index } => {
            bot.send_message(chat, question_text(catalog, index))
                .parse_mode(ParseMode::Html)
                .reply_markup(question_keyboard(catalog.question_at(index)))
                .await?;
        }
        SessionUpdate::ResultPublished(personality) => {
            bot.send_message(chat, result_text(personality.outcome()))
                .parse_mode(ParseMode::Html)
                .reply_markup(restart_keyboard())
                .await?;
        }
        SessionUpdate::Reset => {
            bot.send_message(chat, landing_text())
                .parse_mode(ParseMode::Html)
                .reply_markup(start_keyboard())
                .await?;
        }
        other => debug!("chat {}: {:?}", chat.0, other),
    }
    Ok(())
}

/// Sends generated clips to the chat. Failures are logged and dropped.
pub struct ChatSoundCue {
    bot: Bot,
    chat: ChatId,
    library: Arc<SfxLibrary>,
    ambient: AtomicBool,
}

impl ChatSoundCue {
    pub fn new(bot: Bot, chat: ChatId, library: Arc<SfxLibrary>) -> Self {
        Self {
            bot,
            chat,
            library,
            ambient: AtomicBool::new(false),
        }
    }

    fn send(&self, clip: Clip) {
        let bot = self.bot.clone();
        let chat = self.chat;
        let library = self.library.clone();
        tokio::spawn(async move {
            let audio = match library.clip(clip).await {
                Ok(audio) => audio,
                Err(err) => {
                    warn!("no {} for chat {}: {}", clip.name(), chat.0, err);
                    return;
                }
            };
            let file = InputFile::memory(audio.to_vec()).file_name(format!("{}.mp3", clip.name()));
            if let Err(err) = bot.send_audio(chat, file).await {
                warn!("could not send {} to chat {}: {}", clip.name(), chat.0, err);
            }
        });
    }
}

impl SoundCue for ChatSoundCue {
    fn cue(&self, kind: CueKind) {
        self.send(Clip::for_cue(kind));
    }

    fn set_ambient(&self, playing: bool) {
        // a chat cannot loop audio, so the track is sent once per switch-on
        if playing && !self.ambient.swap(true, Ordering::SeqCst) {
            self.send(Clip::Ambient);
        } else if !playing {
            self.ambient.store(false, Ordering::SeqCst);
        }
    }
}

/// Running quiz sessions by chat.
pub struct Sessions {
    settings: Settings,
    catalog: QuestionCatalog,
    sfx: Option<Arc<SfxLibrary>>,
    running: Mutex<HashMap<ChatId, SessionHandle>>,
}

impl Sessions {
    pub fn new(settings: Settings, sfx: Option<Arc<SfxLibrary>>) -> Self {
        Self {
            settings,
            catalog: QuestionCatalog::standard(),
            sfx,
            running: Mutex::new(HashMap::new()),
        }
    }

    /// The chat's session, started on first contact. The flag is `true` when
    /// the session was launched by this call.
    pub fn handle_for(&self, bot: &Bot, chat: ChatId) -> (SessionHandle, bool) {
        let mut running = self.running.lock();
        running.retain(|_, handle| handle.is_alive());
        if let Some(handle) = running.get(&chat) {
            return (handle.clone(), false);
        }

        let handle = self.launch(bot.clone(), chat);
        running.insert(chat, handle.clone());
        (handle, true)
    }

    fn launch(&self, bot: Bot, chat: ChatId) -> SessionHandle {
        let (sink, inbox) = EventSink::channel();
        let player = VirtualPlayer::new(self.settings.player.clone(), sink.clone());
        let timeline = TimelineController::new(player, self.settings.timeline.clone(), sink.clone());
        let sound: Arc<dyn SoundCue> = match &self.sfx {
            Some(library) => Arc::new(ChatSoundCue::new(bot.clone(), chat, library.clone())),
            None => Arc::new(Silent),
        };
        let session = QuizSession::new(
            self.catalog,
            self.settings.session.clone(),
            timeline,
            sink,
            sound,
            Box::new(StdRng::from_entropy()),
        );

        let (handle, updates) = spawn_session(session, inbox, self.settings.idle_timeout);
        tokio::spawn(forward_updates(bot, chat, self.catalog, updates));
        debug!("session launched for chat {}", chat.0);
        handle
    }
}

async fn forward_updates(
    bot: Bot,
    chat: ChatId,
    catalog: QuestionCatalog,
    mut updates: mpsc::UnboundedReceiver<SessionUpdate>,
) {
    while let Some(update) = updates.recv().await {
        if let Err(err) = present(&bot, chat, &catalog, update).await {
            warn!("could not update chat {}: {}", chat.0, err);
        }
    }
}
