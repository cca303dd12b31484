//! Host module for the gtools plugin host
//!
//! - `dispatch`: visibility state and per-frame plugin dispatch
//! - `governor`: frame-rate cap
//! - `surface`: terminal drawing of the control panel and plugin panels
//!
//! # Architecture
//! One thread runs everything: event polling, drawing, plugin render calls
//! and the pacing sleep. Plugins are unloaded only after the last frame.

pub mod dispatch;
pub mod governor;
pub mod surface;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal as RatatuiTerminal};
use std::io::{self, Stdout, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::config::Config;
use crate::plugins::{unload_plugins, LoadResult};

use self::dispatch::{workspace_region, DisplayMode, FrameDispatcher, VisibilityState};
use self::governor::FrameGovernor;
use self::surface::{ControlPanel, TerminalSurface};

type Backend = CrosstermBackend<Stdout>;

/// The plugin host: owns the loaded plugins and drives the frame loop.
pub struct Host {
    plugins: LoadResult,
    visibility: VisibilityState,
    dispatcher: FrameDispatcher,
    governor: FrameGovernor,
    cursor: usize,
    should_quit: bool,
    frame_count: u64,
}

impl Host {
    pub fn new(config: &Config, plugins: LoadResult) -> Self {
        let mode = if config.host.single_app_mode {
            DisplayMode::Exclusive
        } else {
            DisplayMode::Independent
        };
        info!(
            "Starting host: {} plugins, {} load errors, mode={}, target_fps={}",
            plugins.plugins.len(),
            plugins.errors.len(),
            mode.label(),
            config.host.target_fps
        );

        Self {
            visibility: VisibilityState::new(plugins.plugins.len(), mode),
            plugins,
            dispatcher: FrameDispatcher::new(config.host.control_panel_width),
            governor: FrameGovernor::from_fps(config.host.target_fps),
            cursor: 0,
            should_quit: false,
            frame_count: 0,
        }
    }

    pub fn plugins(&self) -> &LoadResult {
        &self.plugins
    }

    pub fn visibility(&self) -> &VisibilityState {
        &self.visibility
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run the frame loop until the user quits, then unload all plugins.
    ///
    /// # Errors
    /// Returns an error if the terminal cannot be set up or drawn to
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode().context(
            "Failed to enable raw mode. Ensure you're running in a proper terminal emulator.",
        )?;
        let mut terminal = match enter_terminal(io::stdout(), disable_raw_mode) {
            Ok(terminal) => terminal,
            Err(e) => {
                self.shutdown();
                return Err(e);
            }
        };

        let outcome = self.run_loop(&mut terminal);
        let restored = restore_terminal(&mut terminal);
        self.shutdown();

        info!("Host shutdown complete after {} frames", self.frame_count);
        outcome.and(restored)
    }

    fn run_loop(&mut self, terminal: &mut RatatuiTerminal<Backend>) -> Result<()> {
        while !self.should_quit {
            let frame_start = Instant::now();

            while event::poll(Duration::ZERO).context("Failed to poll terminal events")? {
                if let Event::Key(key) = event::read().context("Failed to read terminal event")? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key);
                    }
                }
            }
            if self.should_quit {
                break;
            }

            terminal.draw(|f| self.render(f))?;
            self.frame_count += 1;
            if self.frame_count % 1000 == 0 {
                debug!("Rendered {} frames", self.frame_count);
            }

            self.governor.pace(frame_start.elapsed());
        }
        Ok(())
    }

    /// Apply one key press to the host state.
    pub fn handle_key(&mut self, key: KeyEvent) {
        let count = self.visibility.len();
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('m') | KeyCode::Tab => {
                self.visibility.toggle_mode();
                debug!("Display mode: {}", self.visibility.mode().label());
            }
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.cursor + 1 < count {
                    self.cursor += 1;
                }
            }
            KeyCode::Char(' ') | KeyCode::Enter => {
                self.visibility.toggle(self.cursor);
            }
            KeyCode::Char(c @ '1'..='9') => {
                let index = (c as usize) - ('1' as usize);
                if self.visibility.toggle(index) {
                    self.cursor = index;
                }
            }
            _ => {}
        }
    }

    fn render(&self, f: &mut ratatui::Frame) {
        let display = f.size();
        let panel_width = self.dispatcher.control_panel_width().min(display.width);

        let control = ControlPanel {
            names: self.plugins.plugins.iter().map(|p| p.name()).collect(),
            visibility: &self.visibility,
            cursor: self.cursor,
            errors: &self.plugins.errors,
        };
        control.draw(
            f,
            Rect {
                width: panel_width,
                ..display
            },
        );

        let mut surface = TerminalSurface::new(workspace_region(display, panel_width));
        self.dispatcher
            .dispatch(&self.plugins.plugins, &self.visibility, display, &mut surface);
        surface.draw(f);
    }

    /// Unload every plugin. Safe to call more than once.
    pub fn shutdown(&mut self) {
        unload_plugins(&mut self.plugins.plugins);
    }
}

impl Drop for Host {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Switch `out` to the alternate screen and wrap it in a terminal.
///
/// Raw mode is already on. If any step fails, `leave_raw` runs before the
/// error is returned so the shell is not left in raw mode.
fn enter_terminal<W, F>(
    mut out: W,
    leave_raw: F,
) -> Result<RatatuiTerminal<CrosstermBackend<W>>>
where
    W: Write,
    F: FnOnce() -> io::Result<()>,
{
    if let Err(e) = execute!(out, EnterAlternateScreen) {
        let _ = leave_raw();
        return Err(e).context("Failed to enter alternate screen");
    }

    match RatatuiTerminal::new(CrosstermBackend::new(out)) {
        Ok(terminal) => Ok(terminal),
        Err(e) => {
            let _ = leave_raw();
            Err(e).context("Failed to create terminal backend")
        }
    }
}

fn restore_terminal(terminal: &mut RatatuiTerminal<Backend>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}
