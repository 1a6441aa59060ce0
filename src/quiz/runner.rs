use std::time::Duration;

use log::{debug, info};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};

use super::events::Inbox;
use super::media::MediaPlayback;
use super::session::{Command, QuizSession, SessionUpdate};

/// Sends user commands to a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl SessionHandle {
    /// Returns `false` once the session task has stopped.
    pub fn send(&self, command: Command) -> bool {
        self.commands.send(command).is_ok()
    }

    pub fn is_alive(&self) -> bool {
        !self.commands.is_closed()
    }
}

/// Moves `session` onto its own task. The task is the session's single
/// thread of control: it interleaves user commands with inbox signals one at
/// a time and forwards every resulting update. It stops when the handle or
/// the update receiver is dropped, or when no command arrived for
/// `idle_timeout`.
pub fn spawn_session<M>(
    mut session: QuizSession<M>,
    mut inbox: Inbox,
    idle_timeout: Option<Duration>,
) -> (SessionHandle, mpsc::UnboundedReceiver<SessionUpdate>)
where
    M: MediaPlayback + Send + 'static,
{
    let (command_tx, mut commands) = mpsc::unbounded_channel();
    let (update_tx, updates) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut idle_deadline = idle_timeout.map(|limit| Instant::now() + limit);
        loop {
            let batch = tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => {
                        idle_deadline = idle_timeout.map(|limit| Instant::now() + limit);
                        session.apply(command)
                    }
                    None => break,
                },
                Some(envelope) = inbox.recv() => session.handle(envelope),
                _ = time::sleep_until(idle_deadline.unwrap_or_else(Instant::now)), if idle_deadline.is_some() => {
                    info!("session idle for {:?}, closing", idle_timeout.unwrap_or_default());
                    break;
                }
            };

            if batch.into_iter().any(|update| update_tx.send(update).is_err()) {
                break;
            }
        }
        debug!("session task finished");
        session.shutdown();
    });

    (
        SessionHandle {
            commands: command_tx,
        },
        updates,
    )
}
