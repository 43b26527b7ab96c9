#![warn(clippy::all, missing_docs)]

//! Core domain logic for the Qeid scorekeeper.
//!
//! This crate hosts the Baloot rule tables, the pure scoring service,
//! the match aggregate and its mutation engine (with undo/redo),
//! persistence, and the analytics/support collaborators used by the
//! terminal UI and any future frontends.

pub mod backend;
pub mod config;
pub mod engine;
pub mod form;
pub mod game;
pub mod models;
pub mod rating;
pub mod rules;
pub mod scoring;
pub mod store;

pub use config::AppConfig;
pub use engine::{MatchEngine, MatchObserver};
pub use form::{EditedSide, RoundForm};
pub use game::{Match, MatchState};
pub use models::{Multiplier, ProjectType, Round, RoundId, RoundMode, Team};
pub use rating::{RatingTracker, SharedRatingTracker};
pub use rules::Ruleset;
pub use scoring::{RoundInput, ScoringError};
pub use store::MatchStore;
