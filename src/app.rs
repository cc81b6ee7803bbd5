//! App: terminal init, main loop, tick and key handling.

use crate::GameConfig;
use crate::game::{DropOutcome, GameState, Phase, PieceGenerator};
use crate::highscores::HighScoreStore;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use crate::ui;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};

/// How long to wait for input while gravity is suspended (paused or game over).
const IDLE_POLL: Duration = Duration::from_millis(250);

pub struct App {
    config: GameConfig,
    theme: Theme,
    store: HighScoreStore,
    state: GameState,
    /// Last high score written to disk (or read at startup).
    saved_high_score: u32,
    /// Last high score a write was attempted for, successful or not.
    attempted_high_score: u32,
    paused: bool,
    last_tick: Instant,
    /// Shown in the sidebar until the next successful save.
    status: Option<String>,
    quit: bool,
}

impl App {
    pub fn new(config: GameConfig, theme: Theme, store: HighScoreStore) -> Self {
        let high_score = store.load();
        let state = GameState::new(PieceGenerator::new(config.seed), high_score);
        Self {
            config,
            theme,
            store,
            state,
            saved_high_score: high_score,
            attempted_high_score: high_score,
            paused: false,
            last_tick: Instant::now(),
            status: None,
            quit: false,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        undo_on_err(execute!(stdout, EnterAlternateScreen), disable_raw_mode)?;

        let result = ratatui::Terminal::new(ratatui::backend::CrosstermBackend::new(stdout))
            .map_err(anyhow::Error::from)
            .and_then(|mut terminal| {
                terminal.hide_cursor()?;
                self.last_tick = Instant::now();
                self.run_loop(&mut terminal)
            });

        // Restore
        execute!(std::io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            terminal.draw(|f| ui::draw(f, &self.view()))?;

            let timeout = self.time_until_tick(Instant::now());
            if event::poll(timeout)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.apply_action(key_to_action(key), Instant::now());
                    }
                }
            }
            if self.quit {
                return Ok(());
            }
            self.on_tick(Instant::now());
        }
    }

    fn view(&self) -> ui::View<'_> {
        ui::View {
            state: &self.state,
            theme: &self.theme,
            board_colors: self.config.board_colors,
            paused: self.paused,
            status: self.status.as_deref(),
        }
    }

    fn gravity_suspended(&self) -> bool {
        self.paused || self.state.phase() == Phase::GameOver
    }

    fn time_until_tick(&self, now: Instant) -> Duration {
        if self.gravity_suspended() {
            return IDLE_POLL;
        }
        self.config
            .tick_interval
            .saturating_sub(now.saturating_duration_since(self.last_tick))
    }

    /// Gravity: one step down once the tick interval has elapsed.
    pub fn on_tick(&mut self, now: Instant) -> Option<DropOutcome> {
        if self.gravity_suspended()
            || now.saturating_duration_since(self.last_tick) < self.config.tick_interval
        {
            return None;
        }
        self.last_tick = now;
        let outcome = self.state.step_down();
        self.persist_high_score();
        Some(outcome)
    }

    /// Apply one key action. While the game-over alert is up only confirm
    /// (dismiss and start a new game) and quit are handled; held movement keys
    /// keep repeating and must not skip the alert.
    pub fn apply_action(&mut self, action: Action, now: Instant) {
        if action == Action::Quit {
            self.quit = true;
            return;
        }
        if self.state.phase() == Phase::GameOver {
            if action == Action::Confirm {
                self.state.reset();
                self.paused = false;
                self.last_tick = now;
            }
            return;
        }
        match action {
            Action::Pause => {
                self.paused = !self.paused;
                if !self.paused {
                    self.last_tick = now;
                }
            }
            _ if self.paused => {}
            Action::MoveLeft => {
                self.state.shift(-1);
            }
            Action::MoveRight => {
                self.state.shift(1);
            }
            Action::Rotate => {
                self.state.rotate();
            }
            Action::SoftDrop => {
                self.state.soft_drop();
                // A manual drop counts as this tick's fall.
                self.last_tick = now;
                self.persist_high_score();
            }
            Action::Confirm | Action::Quit | Action::None => {}
        }
    }

    /// Write the high score as soon as it moves past the stored one. A failed
    /// write leaves a status line and is retried on the next improvement.
    fn persist_high_score(&mut self) {
        let high = self.state.score().high;
        if high <= self.saved_high_score || high == self.attempted_high_score {
            return;
        }
        self.attempted_high_score = high;
        match self.store.save(high) {
            Ok(()) => {
                self.saved_high_score = high;
                self.status = None;
            }
            Err(err) => self.status = Some(format!("High score not saved: {err:#}")),
        }
    }
}

/// Pass `result` through, running `undo` first when it failed. The undo's own
/// error is dropped; the original failure is the one reported.
fn undo_on_err<T>(
    result: std::io::Result<T>,
    undo: impl FnOnce() -> std::io::Result<()>,
) -> std::io::Result<T> {
    if result.is_err() {
        let _ = undo();
    }
    result
}
