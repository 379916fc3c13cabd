//! Dashboard terminal app: owns the surface, the scheduler and the key loop.
//!
//! The poll scheduler runs on the tokio runtime; this loop only snapshots the
//! shared dashboard state and redraws. Quitting always restores the terminal,
//! even on panic.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

use crate::application::poller::{DashboardState, PollScheduler};
use crate::tui::ui;

/// Process-wide marker: at most one live terminal surface.
static SURFACE_ACTIVE: AtomicBool = AtomicBool::new(false);

/// The single chart-hosting surface (raw mode + alternate screen).
pub struct Surface {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl Surface {
    /// Acquire the surface. If one is somehow still live, it is torn down
    /// first, so exactly one exists afterwards.
    pub fn ensure() -> io::Result<Self> {
        if SURFACE_ACTIVE.swap(true, Ordering::SeqCst) {
            tracing::debug!("surface already active; rebuilding it");
            release_terminal();
        }

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<io::Stdout>> {
        &mut self.terminal
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        release_terminal();
        SURFACE_ACTIVE.store(false, Ordering::SeqCst);
    }
}

/// Restore the terminal. Failures are logged and swallowed: a broken
/// teardown must never wedge the process.
fn release_terminal() {
    if let Err(err) = disable_raw_mode() {
        tracing::warn!("failed to disable raw mode: {err}");
    }
    if let Err(err) = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show) {
        tracing::warn!("failed to restore the screen: {err}");
    }
}

pub struct DashboardApp {
    state: Arc<DashboardState>,
    scheduler: Arc<PollScheduler>,
    device_id: String,
    endpoint: String,
    paused: bool,
    running: bool,
}

impl DashboardApp {
    pub fn new(
        state: Arc<DashboardState>,
        scheduler: Arc<PollScheduler>,
        device_id: String,
        endpoint: String,
    ) -> Self {
        Self {
            state,
            scheduler,
            device_id,
            endpoint,
            paused: false,
            running: true,
        }
    }

    pub fn run(&mut self) -> io::Result<()> {
        let mut surface = Surface::ensure()?;

        // Restore the terminal before printing any panic.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        self.scheduler.start();
        let result = self.run_loop(surface.terminal_mut());
        self.scheduler.stop();

        let _ = std::panic::take_hook();
        drop(surface);
        result
    }

    fn run_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        while self.running {
            let frame = ui::FrameData {
                device_id: self.device_id.clone(),
                endpoint: self.endpoint.clone(),
                cycles: self.state.cycles(),
                last_updated: self
                    .state
                    .last_updated()
                    .map(|at| at.format("%H:%M:%S").to_string()),
                paused: self.paused,
                rows: self.state.table(),
                chart: self.state.chart.current(),
            };
            terminal.draw(|f| ui::draw(f, &frame))?;

            if event::poll(Duration::from_millis(50))?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_key(key.code);
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('p') => {
                if self.paused {
                    self.scheduler.start();
                } else {
                    self.scheduler.stop();
                }
                self.paused = !self.paused;
            }
            KeyCode::Char('r') => self.scheduler.refresh_now(),
            _ => {}
        }
    }
}
