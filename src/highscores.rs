//! Persist the high score to disk (config dir / stackfall / highscore).
//!
//! The file holds a single string-encoded integer. A missing or unreadable
//! file reads as 0.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

const APP_DIR: &str = "stackfall";
const FILENAME: &str = "highscore";

/// Location of the persisted high score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighScoreStore {
    path: PathBuf,
}

impl HighScoreStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/stackfall/highscore`, or `./stackfall/highscore` when the
    /// platform has no config dir.
    pub fn default_location() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::at(base.join(APP_DIR).join(FILENAME))
    }

    /// Stored high score; 0 on missing file or parse error.
    pub fn load(&self) -> u32 {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|content| parse_high_score(&content))
            .unwrap_or(0)
    }

    /// Overwrite the stored high score. Creates the parent directory if needed.
    pub fn save(&self, score: u32) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&self.path, format!("{score}\n"))
            .with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}

fn parse_high_score(content: &str) -> Option<u32> {
    content.lines().next()?.trim().parse().ok()
}
