//! Match mutation engine: the single owner of the running [`Match`],
//! its undo/redo history, and the win-notification hook.
//!
//! Every operation leaves the in-memory match fully consistent before
//! persistence is attempted; a failed save is logged and swallowed so
//! the current session keeps working (spec: in-memory state is
//! authoritative).

use tracing::{debug, info, warn};

use crate::game::{Match, MatchState};
use crate::models::{Multiplier, Round, RoundId, Team};
use crate::rules::Ruleset;
use crate::store::MatchStore;

/// Receives one event per transition into the won state.
///
/// Not invoked again while the match stays won, nor when a redo
/// re-enters a win that was already counted.
pub trait MatchObserver {
    /// The match has just been won.
    fn match_completed(&mut self, winner: Team, game: &Match);
}

/// Owns the current match and applies all mutations.
pub struct MatchEngine {
    rules: Ruleset,
    game: Match,
    redo_stack: Vec<Round>,
    store: MatchStore,
    observers: Vec<Box<dyn MatchObserver>>,
}

impl MatchEngine {
    /// Build an engine around whatever match the store can produce
    /// (a fresh one when nothing usable is on disk).
    pub fn new(rules: Ruleset, store: MatchStore, observers: Vec<Box<dyn MatchObserver>>) -> Self {
        let game = store.load(&rules);
        Self {
            rules,
            game,
            redo_stack: Vec::new(),
            store,
            observers,
        }
    }

    /// The active ruleset.
    pub fn rules(&self) -> &Ruleset {
        &self.rules
    }

    /// The current match, read-only.
    pub fn game(&self) -> &Match {
        &self.game
    }

    /// Derived winner of the current match.
    pub fn winner(&self) -> Option<Team> {
        self.game.winner()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> MatchState {
        self.game.state()
    }

    /// Whether an undo would do anything.
    pub fn can_undo(&self) -> bool {
        !self.game.rounds.is_empty()
    }

    /// Whether a redo would do anything.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Append a freshly built round. Clears the redo history, applies
    /// the coffee top-up when the round declares an instant winner,
    /// persists, and notifies observers if this turned the match won.
    pub fn add_round(&mut self, mut round: Round) {
        let was_won = self.game.winner().is_some();

        round.index = self.game.rounds.len() + 1;
        let coffee_winner = round.coffee_winner;
        let is_coffee = round.multiplier == Multiplier::Coffee;
        self.game.rounds.push(round);
        self.redo_stack.clear();

        if is_coffee {
            if let Some(winner) = coffee_winner {
                self.game.top_up_to_target(winner);
            }
        }

        self.persist();

        if !was_won {
            if let Some(winner) = self.game.winner() {
                info!(winner = winner.label(), "match won");
                for observer in &mut self.observers {
                    observer.match_completed(winner, &self.game);
                }
            }
        }
    }

    /// Remove a round by identity. Unknown ids are a no-op.
    pub fn delete_round(&mut self, id: RoundId) {
        let before = self.game.rounds.len();
        self.game.rounds.retain(|round| round.id != id);
        if self.game.rounds.len() == before {
            debug!(%id, "delete ignored, round not found");
            return;
        }
        self.game.recalculate_coffee_top_up();
        self.reindex();
        self.persist();
    }

    /// Pop the last round onto the redo stack. No-op on an empty match.
    pub fn undo_last_round(&mut self) {
        let Some(last) = self.game.rounds.pop() else {
            return;
        };
        self.redo_stack.push(last);
        self.game.recalculate_coffee_top_up();
        self.persist();
    }

    /// Restore the most recently undone round. No-op when nothing has
    /// been undone. A restored coffee win re-applies its top-up but is
    /// not re-announced to observers.
    pub fn redo_last_round(&mut self) {
        let Some(mut round) = self.redo_stack.pop() else {
            return;
        };
        round.index = self.game.rounds.len() + 1;
        let coffee_winner = round.coffee_winner;
        let is_coffee = round.multiplier == Multiplier::Coffee;
        self.game.rounds.push(round);
        if is_coffee {
            if let Some(winner) = coffee_winner {
                self.game.top_up_to_target(winner);
            }
        }
        self.persist();
    }

    /// Throw the whole match away and start fresh.
    pub fn reset_match(&mut self) {
        self.game = Match::new(&self.rules);
        self.redo_stack.clear();
        self.persist();
    }

    /// Short score summary, e.g. for sharing.
    pub fn score_line(&self) -> String {
        format!(
            "Us {} - {} Them",
            self.game.total_us(),
            self.game.total_them()
        )
    }

    fn reindex(&mut self) {
        for (position, round) in self.game.rounds.iter_mut().enumerate() {
            round.index = position + 1;
        }
    }

    fn persist(&self) {
        if let Err(err) = self.store.save(&self.game) {
            warn!("match not saved, keeping in-memory state: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::models::{ProjectType, RoundMode};
    use crate::scoring::{build_round, RoundInput};
    use tempfile::tempdir;

    struct CountingObserver {
        completions: Rc<RefCell<Vec<Team>>>,
    }

    impl MatchObserver for CountingObserver {
        fn match_completed(&mut self, winner: Team, _game: &Match) {
            self.completions.borrow_mut().push(winner);
        }
    }

    fn engine_with_observer(
        dir: &std::path::Path,
    ) -> (MatchEngine, Rc<RefCell<Vec<Team>>>) {
        let completions = Rc::new(RefCell::new(Vec::new()));
        let observer = CountingObserver {
            completions: Rc::clone(&completions),
        };
        let engine = MatchEngine::new(
            Ruleset::modern(),
            MatchStore::new(dir),
            vec![Box::new(observer)],
        );
        (engine, completions)
    }

    fn plain_round(base_us: i32, base_them: i32) -> Round {
        build_round(
            &Ruleset::modern(),
            RoundInput {
                mode: RoundMode::Sun,
                multiplier: Multiplier::Normal,
                base_us,
                base_them,
                ..RoundInput::default()
            },
        )
        .unwrap()
    }

    fn coffee_round(winner: Team) -> Round {
        build_round(
            &Ruleset::modern(),
            RoundInput {
                mode: RoundMode::Sun,
                multiplier: Multiplier::Coffee,
                coffee_winner: Some(winner),
                ..RoundInput::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn add_round_assigns_contiguous_indices() {
        let dir = tempdir().unwrap();
        let (mut engine, _) = engine_with_observer(dir.path());
        engine.add_round(plain_round(20, 6));
        engine.add_round(plain_round(10, 16));
        let indices: Vec<usize> = engine.game().rounds.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1, 2]);
    }

    #[test]
    fn undo_then_redo_restores_identical_match() {
        let dir = tempdir().unwrap();
        let (mut engine, _) = engine_with_observer(dir.path());
        engine.add_round(plain_round(20, 6));
        engine.add_round(coffee_round(Team::Us));
        let snapshot = engine.game().clone();

        engine.undo_last_round();
        assert_ne!(engine.game(), &snapshot);
        assert_eq!(engine.winner(), None);

        engine.redo_last_round();
        assert_eq!(engine.game(), &snapshot);
        assert_eq!(engine.winner(), Some(Team::Us));
    }

    #[test]
    fn new_round_discards_redo_history() {
        let dir = tempdir().unwrap();
        let (mut engine, _) = engine_with_observer(dir.path());
        engine.add_round(plain_round(20, 6));
        engine.add_round(plain_round(16, 10));
        engine.undo_last_round();
        assert!(engine.can_redo());

        engine.add_round(plain_round(6, 20));
        assert!(!engine.can_redo());
        let len = engine.game().rounds.len();
        engine.redo_last_round();
        assert_eq!(engine.game().rounds.len(), len);
    }

    #[test]
    fn deleting_the_coffee_round_clears_the_win() {
        let dir = tempdir().unwrap();
        let (mut engine, _) = engine_with_observer(dir.path());
        engine.add_round(plain_round(20, 6));
        let coffee = coffee_round(Team::Them);
        let coffee_id = coffee.id;
        engine.add_round(coffee);
        assert_eq!(engine.winner(), Some(Team::Them));

        engine.delete_round(coffee_id);
        assert_eq!(engine.winner(), None);
        assert_eq!(engine.state(), MatchState::InProgress);
        let indices: Vec<usize> = engine.game().rounds.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![1]);
    }

    #[test]
    fn deleting_unknown_id_is_a_no_op() {
        let dir = tempdir().unwrap();
        let (mut engine, _) = engine_with_observer(dir.path());
        engine.add_round(plain_round(20, 6));
        engine.delete_round(RoundId::new());
        assert_eq!(engine.game().rounds.len(), 1);
    }

    #[test]
    fn observers_fire_once_per_transition_into_won() {
        let dir = tempdir().unwrap();
        let (mut engine, completions) = engine_with_observer(dir.path());
        engine.add_round(coffee_round(Team::Us));
        assert_eq!(completions.borrow().as_slice(), &[Team::Us]);

        // Staying won does not re-fire.
        engine.add_round(plain_round(20, 6));
        assert_eq!(completions.borrow().len(), 1);

        // Redo of the counted win does not re-fire either.
        engine.undo_last_round();
        engine.undo_last_round();
        engine.redo_last_round();
        assert_eq!(engine.winner(), Some(Team::Us));
        assert_eq!(completions.borrow().len(), 1);
    }

    #[test]
    fn instant_win_supersedes_threshold() {
        let dir = tempdir().unwrap();
        let (mut engine, _) = engine_with_observer(dir.path());
        engine.add_round(plain_round(10, 16));
        // Totals are nowhere near the target, yet the coffee winner
        // takes the match immediately.
        engine.add_round(coffee_round(Team::Them));
        assert_eq!(engine.winner(), Some(Team::Them));
        assert_eq!(engine.game().total_them(), engine.game().target_score);
    }

    #[test]
    fn reset_clears_everything() {
        let dir = tempdir().unwrap();
        let (mut engine, _) = engine_with_observer(dir.path());
        engine.add_round(plain_round(20, 6));
        engine.undo_last_round();
        engine.reset_match();
        assert_eq!(engine.state(), MatchState::Empty);
        assert!(!engine.can_undo());
        assert!(!engine.can_redo());
    }

    #[test]
    fn project_only_round_contributes_points() {
        let dir = tempdir().unwrap();
        let (mut engine, _) = engine_with_observer(dir.path());
        let round = build_round(
            &Ruleset::modern(),
            RoundInput {
                mode: RoundMode::Hokom,
                multiplier: Multiplier::Normal,
                base_us: 16,
                base_them: 0,
                projects_them: [ProjectType::Baloot].into_iter().collect(),
                ..RoundInput::default()
            },
        )
        .unwrap();
        engine.add_round(round);
        assert_eq!(engine.game().total_us(), 16);
        assert_eq!(engine.game().total_them(), 2);
    }
}
