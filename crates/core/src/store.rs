//! Match persistence.
//!
//! One JSON file holds the whole match aggregate. Anything unreadable
//! — missing file, corrupt JSON, truncated write — degrades to a fresh
//! empty match with a log line, never an error surfaced to the engine.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::warn;

use crate::game::Match;
use crate::rules::Ruleset;

/// Directory under the user's config dir holding all app data.
pub const DEFAULT_DATA_DIR: &str = "qeidtui";

const MATCH_FILE: &str = "current_match.json";

/// Errors from encoding or writing match state.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The match could not be encoded or decoded.
    #[error("failed to encode match state: {0}")]
    Codec(#[from] serde_json::Error),
    /// The match file could not be written.
    #[error("failed to write {path}: {source}")]
    Persist {
        /// Path of the attempted write.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Encode a match for storage.
pub fn serialize(game: &Match) -> Result<Vec<u8>, StoreError> {
    Ok(serde_json::to_vec_pretty(game)?)
}

/// Decode a previously stored match.
pub fn deserialize(bytes: &[u8]) -> Result<Match, StoreError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Reads and writes the current match file.
pub struct MatchStore {
    root: PathBuf,
}

impl MatchStore {
    /// Create a store rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default location under the user's config directory.
    pub fn default_root() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DATA_DIR)
    }

    /// Directory this store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn match_path(&self) -> PathBuf {
        self.root.join(MATCH_FILE)
    }

    /// Load the persisted match, falling back to a fresh empty one
    /// when nothing usable exists on disk.
    pub fn load(&self, rules: &Ruleset) -> Match {
        let path = self.match_path();
        if !path.exists() {
            return Match::new(rules);
        }
        match fs::read(&path) {
            Ok(bytes) => match deserialize(&bytes) {
                Ok(game) => game,
                Err(err) => {
                    warn!("discarding unreadable match file {}: {err}", path.display());
                    Match::new(rules)
                }
            },
            Err(err) => {
                warn!("failed to read {}: {err}", path.display());
                Match::new(rules)
            }
        }
    }

    /// Persist the match. Writes to a sibling temp file first so a
    /// crash mid-write cannot destroy the previous save.
    pub fn save(&self, game: &Match) -> Result<(), StoreError> {
        fs::create_dir_all(&self.root).map_err(|source| StoreError::Persist {
            path: self.root.clone(),
            source,
        })?;
        let path = self.match_path();
        let tmp_path = path.with_extension("json.tmp");
        let bytes = serialize(game)?;
        fs::write(&tmp_path, bytes).map_err(|source| StoreError::Persist {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &path).map_err(|source| StoreError::Persist {
            path: path.clone(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Multiplier, RoundMode, Team};
    use crate::scoring::{build_round, RoundInput};
    use tempfile::tempdir;

    fn rules() -> Ruleset {
        Ruleset::modern()
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let store = MatchStore::new(dir.path());
        let mut game = Match::new(&rules());
        game.rounds.push(
            build_round(
                &rules(),
                RoundInput {
                    mode: RoundMode::Hokom,
                    multiplier: Multiplier::Coffee,
                    coffee_winner: Some(Team::Us),
                    ..RoundInput::default()
                },
            )
            .unwrap(),
        );
        game.top_up_to_target(Team::Us);

        store.save(&game).unwrap();
        let loaded = store.load(&rules());
        assert_eq!(loaded, game);
        assert_eq!(loaded.winner(), Some(Team::Us));
    }

    #[test]
    fn missing_file_yields_fresh_match() {
        let dir = tempdir().unwrap();
        let store = MatchStore::new(dir.path());
        let loaded = store.load(&rules());
        assert!(loaded.rounds.is_empty());
        assert_eq!(loaded.target_score, 152);
    }

    #[test]
    fn corrupt_file_yields_fresh_match() {
        let dir = tempdir().unwrap();
        let store = MatchStore::new(dir.path());
        fs::create_dir_all(dir.path()).unwrap();
        fs::write(dir.path().join(MATCH_FILE), b"{not json").unwrap();
        let loaded = store.load(&rules());
        assert!(loaded.rounds.is_empty());
    }

    #[test]
    fn serialize_bytes_round_trip() {
        let game = Match::new(&rules());
        let bytes = serialize(&game).unwrap();
        let decoded = deserialize(&bytes).unwrap();
        assert_eq!(decoded, game);
    }
}
