//! Top-10 high-score table, persisted as a JSON list of `{name, score}`.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::{MAX_NAME_LEN, TOP_SCORES};
use crate::persistence::{load_json, save_json};

pub const ANONYMOUS: &str = "ANONYMOUS";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub score: u32,
}

/// Sorted best-first, never longer than `TOP_SCORES`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HighScores {
    entries: Vec<ScoreEntry>,
}

/// Trim to the name limit; blank names become `ANONYMOUS`.
pub fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return ANONYMOUS.to_string();
    }
    trimmed.chars().take(MAX_NAME_LEN).collect()
}

impl HighScores {
    pub fn from_entries(entries: Vec<ScoreEntry>) -> Self {
        let mut table = HighScores { entries };
        table.normalize();
        table
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn best(&self) -> u32 {
        self.entries.first().map(|e| e.score).unwrap_or(0)
    }

    /// Whether `score` would make it onto the table.
    pub fn qualifies(&self, score: u32) -> bool {
        self.entries.len() < TOP_SCORES || self.entries.iter().any(|e| score > e.score)
    }

    pub fn insert(&mut self, name: &str, score: u32) {
        self.entries.push(ScoreEntry {
            name: normalize_name(name),
            score,
        });
        self.normalize();
    }

    /// Stable sort keeps earlier entries ahead on ties.
    fn normalize(&mut self) {
        for entry in &mut self.entries {
            entry.name = normalize_name(&entry.name);
        }
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(TOP_SCORES);
    }

    /// Missing or unreadable files yield an empty table.
    pub fn load(path: &Path) -> Self {
        match load_json::<Vec<ScoreEntry>>(path) {
            Ok(Some(entries)) => HighScores::from_entries(entries),
            Ok(None) => HighScores::default(),
            Err(err) => {
                warn!("high scores unavailable, starting empty: {err:#}");
                HighScores::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(path, &self.entries)
    }
}
