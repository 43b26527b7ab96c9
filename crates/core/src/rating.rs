//! Rating-prompt tracking.
//!
//! Counts completed matches and raises a "please rate us" flag at a
//! few milestones. The flag is polled and consumed by the UI; the
//! counter survives restarts in a small JSON file next to the match
//! save.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::MatchObserver;
use crate::game::Match;
use crate::models::Team;

/// Completed-game counts at which the prompt fires.
pub const PROMPT_MILESTONES: [u32; 3] = [3, 10, 25];

const RATING_FILE: &str = "rating.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RatingState {
    games_completed: u32,
}

/// Tracks completed games and decides when to ask for a rating.
pub struct RatingTracker {
    path: PathBuf,
    state: RatingState,
    prompt_pending: bool,
}

impl RatingTracker {
    /// Load the tracker from `data_root`, starting fresh when the
    /// counter file is missing or unreadable.
    pub fn new(data_root: impl AsRef<Path>) -> Self {
        let path = data_root.as_ref().join(RATING_FILE);
        let state = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!("resetting unreadable rating state: {err}");
                RatingState::default()
            }),
            Err(_) => RatingState::default(),
        };
        Self {
            path,
            state,
            prompt_pending: false,
        }
    }

    /// Total matches completed so far.
    pub fn games_completed(&self) -> u32 {
        self.state.games_completed
    }

    /// Consume the pending prompt flag. Returns true at most once per
    /// milestone crossing.
    pub fn take_prompt(&mut self) -> bool {
        std::mem::take(&mut self.prompt_pending)
    }

    fn persist(&self) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                warn!("rating state not saved: {err}");
                return;
            }
        }
        match serde_json::to_vec_pretty(&self.state) {
            Ok(bytes) => {
                if let Err(err) = fs::write(&self.path, bytes) {
                    warn!("rating state not saved: {err}");
                }
            }
            Err(err) => warn!("rating state not encoded: {err}"),
        }
    }
}

impl MatchObserver for RatingTracker {
    fn match_completed(&mut self, _winner: Team, _game: &Match) {
        self.state.games_completed += 1;
        if PROMPT_MILESTONES.contains(&self.state.games_completed) {
            self.prompt_pending = true;
        }
        self.persist();
    }
}

/// Cloneable handle sharing one tracker between the engine (which
/// feeds it completions) and the UI (which polls the prompt flag).
#[derive(Clone)]
pub struct SharedRatingTracker(Arc<Mutex<RatingTracker>>);

impl SharedRatingTracker {
    /// Wrap a tracker for shared ownership.
    pub fn new(tracker: RatingTracker) -> Self {
        Self(Arc::new(Mutex::new(tracker)))
    }

    /// See [`RatingTracker::take_prompt`].
    pub fn take_prompt(&self) -> bool {
        self.0.lock().take_prompt()
    }

    /// See [`RatingTracker::games_completed`].
    pub fn games_completed(&self) -> u32 {
        self.0.lock().games_completed()
    }
}

impl MatchObserver for SharedRatingTracker {
    fn match_completed(&mut self, winner: Team, game: &Match) {
        self.0.lock().match_completed(winner, game);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Ruleset;
    use tempfile::tempdir;

    fn complete_one(tracker: &mut RatingTracker) {
        let game = Match::new(&Ruleset::modern());
        tracker.match_completed(Team::Us, &game);
    }

    #[test]
    fn prompts_at_milestones_only() {
        let dir = tempdir().unwrap();
        let mut tracker = RatingTracker::new(dir.path());
        for expected in [false, false, true, false] {
            complete_one(&mut tracker);
            assert_eq!(tracker.take_prompt(), expected);
            // Flag is consumed, not sticky.
            assert!(!tracker.take_prompt());
        }
        assert_eq!(tracker.games_completed(), 4);
    }

    #[test]
    fn counter_survives_reload() {
        let dir = tempdir().unwrap();
        let mut tracker = RatingTracker::new(dir.path());
        complete_one(&mut tracker);
        complete_one(&mut tracker);

        let reloaded = RatingTracker::new(dir.path());
        assert_eq!(reloaded.games_completed(), 2);
    }
}
