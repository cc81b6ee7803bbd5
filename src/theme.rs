//! Theme loading: btop-style `theme[key]="value"` and hex → ratatui Color.

use crate::game::TetrominoKind;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Piece colours and UI colours, One Dark by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Theme {
    /// Indexed by `TetrominoKind::color_index`: I, O, T, L, J, S, Z.
    pub pieces: [Color; 7],
    /// Settled cells when the board is drawn in one colour.
    pub board: Color,
    /// Cell outline (the `[]` drawn over every block).
    pub outline: Color,
    /// Playfield background.
    pub bg: Color,
    /// Frame border.
    pub div_line: Color,
    /// Text (score labels).
    pub main_fg: Color,
    /// Titles and highlights.
    pub title: Color,
    /// Game-over alert and error status.
    pub alert: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

/// Theme file keys for the piece colours, same order as `Theme::pieces`.
const PIECE_KEYS: [&str; 7] = [
    "piece_i", "piece_o", "piece_t", "piece_l", "piece_j", "piece_s", "piece_z",
];

impl Default for Theme {
    fn default() -> Self {
        Self::onedark_default()
    }
}

impl Theme {
    /// One Dark hex values; piece colours follow the classic cyan/yellow/purple/
    /// orange/blue/green/red assignment.
    pub fn onedark_default() -> Self {
        Self {
            pieces: [
                Color::Rgb(0x56, 0xB6, 0xC2), // I cyan
                Color::Rgb(0xE5, 0xC0, 0x7B), // O yellow
                Color::Rgb(0xC6, 0x78, 0xDD), // T purple
                Color::Rgb(0xD1, 0x9A, 0x66), // L orange
                Color::Rgb(0x61, 0xAF, 0xEF), // J blue
                Color::Rgb(0x98, 0xC3, 0x79), // S green
                Color::Rgb(0xE0, 0x6C, 0x75), // Z red
            ],
            board: Color::Rgb(0x56, 0xB6, 0xC2),
            outline: Color::Rgb(0x28, 0x2C, 0x34),
            bg: Color::Rgb(0x31, 0x35, 0x3F),
            div_line: Color::Rgb(0x3F, 0x44, 0x4F),
            main_fg: Color::Rgb(0xAB, 0xB2, 0xBF),
            title: Color::Rgb(0xE5, 0xC0, 0x7B),
            alert: Color::Rgb(0xE0, 0x6C, 0x75),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to One Dark defaults if path is None or the file is missing;
    /// individual missing or malformed keys fall back one by one.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => Self::from_map(&parse_theme_file(&std::fs::read_to_string(p)?)),
            _ => Self::onedark_default(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Override piece colours for high-contrast or colorblind play.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.pieces = [
                    Color::Rgb(0x00, 0xFF, 0xFF),
                    Color::Rgb(0xFF, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0x00, 0xFF),
                    Color::Rgb(0xFF, 0x88, 0x00),
                    Color::Rgb(0x00, 0x88, 0xFF),
                    Color::Rgb(0x00, 0xFF, 0x00),
                    Color::Rgb(0xFF, 0x00, 0x00),
                ];
                self.board = Color::Rgb(0x00, 0xFF, 0xFF);
            }
            crate::Palette::Colorblind => {
                // Okabe-Ito style: no red/green pair carries meaning alone.
                self.pieces = [
                    Color::Rgb(0x56, 0xB4, 0xE9),
                    Color::Rgb(0xF0, 0xE4, 0x42),
                    Color::Rgb(0xCC, 0x79, 0xA7),
                    Color::Rgb(0xE6, 0x9F, 0x00),
                    Color::Rgb(0x00, 0x72, 0xB2),
                    Color::Rgb(0x00, 0x9E, 0x73),
                    Color::Rgb(0xD5, 0x5E, 0x00),
                ];
                self.board = Color::Rgb(0x56, 0xB4, 0xE9);
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let defaults = Self::onedark_default();
        let mut pieces = defaults.pieces;
        for (slot, key) in pieces.iter_mut().zip(PIECE_KEYS) {
            if let Some(color) = get(key) {
                *slot = color;
            }
        }
        // Plain btop themes have no piece keys; their box colours still map
        // onto the UI.
        Self {
            pieces,
            board: get("board").unwrap_or(defaults.board),
            outline: get("outline").unwrap_or(defaults.outline),
            bg: get("main_bg")
                .or_else(|| get("meter_bg"))
                .unwrap_or(defaults.bg),
            div_line: get("div_line").unwrap_or(defaults.div_line),
            main_fg: get("main_fg").unwrap_or(defaults.main_fg),
            title: get("title").unwrap_or(defaults.title),
            alert: get("alert")
                .or_else(|| get("temp_end"))
                .unwrap_or(defaults.alert),
        }
    }

    /// Colour of the falling piece, or of a cell it settled into.
    #[inline]
    pub fn piece_color(&self, kind: TetrominoKind) -> Color {
        self.pieces[kind.color_index()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    s.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let rest = line.strip_prefix("theme[")?;
            let (key, rest) = rest.split_once(']')?;
            let (_, value) = rest.split_once('=')?;
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (!value.is_empty()).then(|| (key.trim().to_string(), value.to_string()))
        })
        .collect()
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let hex = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    if !hex.is_ascii() {
        return Err(invalid());
    }
    let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
    match hex.len() {
        6 => Ok(Color::Rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        3 => Ok(Color::Rgb(
            channel(&hex[0..1])? * 17,
            channel(&hex[1..2])? * 17,
            channel(&hex[2..3])? * 17,
        )),
        _ => Err(invalid()),
    }
}
