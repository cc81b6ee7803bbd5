//! stackfall: falling-block puzzle game in the terminal.

mod app;
mod game;
mod highscores;
mod input;
mod theme;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use highscores::HighScoreStore;
use std::time::Duration;

/// Options derived from CLI that affect game behaviour (gravity interval, seed, board colours).
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub tick_interval: Duration,
    pub seed: Option<u64>,
    pub board_colors: BoardColors,
}

impl From<&Args> for GameConfig {
    fn from(args: &Args) -> Self {
        Self {
            tick_interval: Duration::from_millis(args.tick_ms),
            seed: args.seed,
            board_colors: args.board_colors,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let store = args
        .high_score_file
        .clone()
        .map_or_else(HighScoreStore::default_location, HighScoreStore::at);
    let mut app = App::new(GameConfig::from(&args), theme, store);
    app.run()
}

/// Falling-block puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "stackfall",
    version,
    about = "Falling-block puzzle in the terminal. Fill a row edge to edge to clear it.",
    long_about = "stackfall is a classic falling-block puzzle on a 10x20 board.\n\n\
        Tetrominoes drop one row per tick. Move and rotate them so they fill complete \
        rows; every cleared row is worth 10 points. The best score is kept between sessions.\n\n\
        CONTROLS:\n  Left/Right or h/l  Move    Up or k  Rotate    Down or j  Soft drop\n  \
        P  Pause    Enter / Space  New game after game over    Q / Esc  Quit"
)]
pub struct Args {
    /// Gravity interval: the piece drops one row every MS milliseconds.
    #[arg(long, default_value_t = 1000, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// Seed for the piece sequence (same seed, same pieces). Random if not set.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Settled cells keep their piece colour (piece) or share one colour (uniform).
    #[arg(long, default_value = "piece")]
    pub board_colors: BoardColors,

    /// Where the high score is stored. Defaults to the platform config directory.
    #[arg(long, value_name = "FILE")]
    pub high_score_file: Option<std::path::PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BoardColors {
    #[default]
    Piece,
    Uniform,
}
