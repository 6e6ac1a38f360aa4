pub mod dispatch;
pub mod editor;
pub mod input;
pub mod message;
pub mod session;
#[cfg(test)]
pub(crate) mod testing;

use std::{io::stdout, sync::Arc, time::Duration};

use color_eyre::{Result, eyre::WrapErr};
use crossterm::{
    cursor::MoveTo,
    event::EventStream,
    execute,
    terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};
use dui::dynamodb::Backend;
use ratatui::DefaultTerminal;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio_stream::StreamExt;

use crate::{
    config::Config,
    ui::{self, Theme},
};

use self::{
    dispatch::Dispatcher,
    message::{Action, Message},
    session::Session,
};

pub struct App {
    session: Session,
    dispatcher: Dispatcher,
    tx: UnboundedSender<Message>,
    rx: UnboundedReceiver<Message>,
    editor: String,
    theme: Theme,
}

impl App {
    const FRAMES_PER_SECOND: f32 = 30.0;

    pub fn new(backend: Arc<dyn Backend>, config: &Config, theme: Theme) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            session: Session::new(config.table.clone()),
            dispatcher: Dispatcher::new(backend, tx.clone(), config.listing_timeout),
            tx,
            rx,
            editor: config.editor.clone(),
            theme,
        }
    }

    pub async fn run_tui(self) -> Result<()> {
        let terminal = ratatui::init();
        let app_result = self.run(terminal).await;
        ratatui::restore();
        app_result
    }

    async fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        let period = Duration::from_secs_f32(1.0 / Self::FRAMES_PER_SECOND);
        let mut interval = tokio::time::interval(period);
        let mut events = EventStream::new();
        let mut pending = Some(self.session.init());

        loop {
            match pending.take() {
                Some(Action::Quit) => break,
                Some(Action::Backend(operation)) => {
                    tracing::debug!(?operation, "dispatching");
                    self.dispatcher.dispatch(operation);
                }
                Some(Action::OpenEditor { content }) => {
                    // the editor reads the tty itself; no one else may poll it
                    drop(events);
                    self.open_editor(&mut terminal, content).await?;
                    events = EventStream::new();
                }
                None => {}
            }

            tokio::select! {
                biased;
                Some(message) = self.rx.recv() => pending = self.session.apply(message),
                Some(Ok(event)) = events.next() => {
                    if let Some(key) = event.as_key_press_event() {
                        pending = self.session.handle_key(key);
                    }
                }
                _ = interval.tick() => {
                    terminal.draw(|frame| ui::render(frame, &self.session, &self.theme))?;
                }
            }
        }
        Ok(())
    }

    /// Hands the terminal to the editor and back. The result arrives as an
    /// [`Message::EditorFinished`] like any other background outcome.
    async fn open_editor(&mut self, terminal: &mut DefaultTerminal, content: String) -> Result<()> {
        suspend().wrap_err("failed to suspend terminal")?;
        let command = self.editor.clone();
        let outcome = tokio::task::spawn_blocking(move || editor::edit(&command, &content)).await;
        resume(terminal).wrap_err("failed to restore terminal")?;

        let result = match outcome {
            Ok(result) => result.map_err(|err| {
                tracing::warn!(error = %err, "editor failed");
                err.to_string()
            }),
            Err(err) => Err(format!("editor task failed: {err}")),
        };
        // the receiver lives in `self`
        let _ = self.tx.send(Message::EditorFinished(result));
        Ok(())
    }
}

fn suspend() -> std::io::Result<()> {
    terminal::disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)
}

fn resume(terminal: &mut DefaultTerminal) -> std::io::Result<()> {
    execute!(stdout(), EnterAlternateScreen, Clear(ClearType::All), MoveTo(0, 0))?;
    terminal::enable_raw_mode()?;
    terminal.clear()
}
