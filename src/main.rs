mod chat;
mod config;
mod error;
mod quiz;
mod sfx;

use std::sync::Arc;

use chat::Sessions;
use config::Settings;
use dotenv::dotenv;
use log::{debug, error, info, warn};
use quiz::catalog::{RESTART_LABEL, START_LABEL};
use quiz::session::Command;
use sfx::SfxLibrary;
use teloxide::prelude::*;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

const HINT_TEXT: &str = "Hãy chọn một đáp án trên bàn phím, hoặc gửi /start để bắt đầu lại.";

#[tokio::main]
async fn main() {
    let dotenv_loaded = dotenv().is_ok();
    pretty_env_logger::init();
    log::info!("Starting quiz bot...");
    if !dotenv_loaded {
        debug!("no .env file, using the process environment");
    }

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(err) => {
            error!("invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let sfx = settings.sfx.clone().map(|sfx| {
        let library = Arc::new(SfxLibrary::new(sfx.endpoint, sfx.api_key));
        let warming = library.clone();
        tokio::spawn(async move { warming.preload().await });
        library
    });
    if sfx.is_none() {
        info!("SFX_ENDPOINT not set, sound cues are disabled");
    }

    let bot = Bot::from_env();
    let sessions = Arc::new(Sessions::new(settings, sfx));

    Dispatcher::builder(bot, Update::filter_message().endpoint(handle_message))
        .dependencies(dptree::deps![sessions])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

async fn handle_message(bot: Bot, sessions: Arc<Sessions>, msg: Message) -> HandlerResult {
    let command = msg.text().map(str::trim).and_then(|text| match text {
        "/start" | RESTART_LABEL => Some(Command::Restart),
        START_LABEL => Some(Command::Start),
        other => chat::parse_answer(other).map(Command::Answer),
    });

    let (handle, fresh) = sessions.handle_for(&bot, msg.chat.id);
    // a new chat always sees the landing screen first
    if fresh && command != Some(Command::Restart) {
        handle.send(Command::Restart);
    }

    match command {
        Some(command) => {
            debug!("chat {}: {:?}", msg.chat.id.0, command);
            if !handle.send(command) {
                warn!("session for chat {} stopped before {:?}", msg.chat.id.0, command);
            }
        }
        None if fresh => {}
        None => {
            bot.send_message(msg.chat.id, HINT_TEXT).await?;
        }
    }
    Ok(())
}
