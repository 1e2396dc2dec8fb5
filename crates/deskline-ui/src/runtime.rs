use std::io::{self, Stdout};
use std::time::Duration;

use crossterm::event::{self, Event, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::app::App;
use crate::events::UiEvent;
use crate::render;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Terminal lifecycle plus the draw/input loop. Raw mode and the
/// alternate screen are restored on drop, panics included.
pub struct Ui {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl Ui {
    pub fn init() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }

    /// Blocks until the app asks to quit. Redraws every tick so notice
    /// expiry and channel-state changes show up without dirty tracking.
    pub fn run(
        &mut self,
        app: &mut App,
        events: &mut mpsc::UnboundedReceiver<UiEvent>,
    ) -> io::Result<()> {
        loop {
            while let Ok(event) = events.try_recv() {
                app.apply_event(event);
            }
            app.notices.prune();
            self.terminal.draw(|frame| render::draw(frame, app))?;

            if event::poll(POLL_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        app.handle_key(key);
                    }
                }
            }
            if app.should_quit() {
                return Ok(());
            }
        }
    }
}

impl Drop for Ui {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = io::stdout().execute(LeaveAlternateScreen);
    }
}
