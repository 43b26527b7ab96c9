//! Shared domain models.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::rules::Ruleset;

/// One of the two sides keeping score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// The player's own side.
    Us,
    /// The opposing side.
    Them,
}

impl Team {
    /// The other side.
    pub fn opponent(self) -> Team {
        match self {
            Team::Us => Team::Them,
            Team::Them => Team::Us,
        }
    }

    /// User-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Team::Us => "Us",
            Team::Them => "Them",
        }
    }
}

/// The two base game variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundMode {
    /// No-trump variant, higher base points.
    Sun,
    /// Trump variant, lower base points.
    Hokom,
}

impl Default for RoundMode {
    fn default() -> Self {
        RoundMode::Sun
    }
}

impl RoundMode {
    /// Every mode, in display order.
    pub const ALL: [RoundMode; 2] = [RoundMode::Sun, RoundMode::Hokom];

    /// Base points contested in this mode.
    pub fn base(self, rules: &Ruleset) -> i32 {
        match self {
            RoundMode::Sun => rules.sun_base,
            RoundMode::Hokom => rules.hokom_base,
        }
    }

    /// User-facing label.
    pub fn label(self) -> &'static str {
        match self {
            RoundMode::Sun => "Sun",
            RoundMode::Hokom => "Hokom",
        }
    }
}

/// Per-round scaling factor. `Coffee` is the special 5x round that
/// ends the match immediately for a declared winner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Multiplier {
    /// Plain 1x round.
    Normal,
    /// Doubled round.
    X2,
    /// Tripled round.
    X3,
    /// Quadrupled round.
    X4,
    /// Instant-win coffee round.
    Coffee,
}

impl Default for Multiplier {
    fn default() -> Self {
        Multiplier::Normal
    }
}

impl Multiplier {
    /// Every multiplier, in display order.
    pub const ALL: [Multiplier; 5] = [
        Multiplier::Normal,
        Multiplier::X2,
        Multiplier::X3,
        Multiplier::X4,
        Multiplier::Coffee,
    ];

    /// Numeric factor applied to the mode's base points.
    pub fn value(self, rules: &Ruleset) -> i32 {
        match self {
            Multiplier::Normal => 1,
            Multiplier::X2 => 2,
            Multiplier::X3 => 3,
            Multiplier::X4 => 4,
            Multiplier::Coffee => rules.coffee_multiplier,
        }
    }

    /// User-facing label.
    pub fn label(self) -> &'static str {
        match self {
            Multiplier::Normal => "Normal",
            Multiplier::X2 => "x2",
            Multiplier::X3 => "x3",
            Multiplier::X4 => "x4",
            Multiplier::Coffee => "Coffee",
        }
    }
}

/// Bonus-point combination a team may declare during a round.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    /// Sara (sequence of four).
    Sara,
    /// Fifty.
    Fifty,
    /// Hundred.
    Hundred,
    /// Four hundred.
    FourHundred,
    /// Baloot (king and queen of trumps) — Hokom only.
    Baloot,
}

impl ProjectType {
    /// Every project type, in display order.
    pub const ALL: [ProjectType; 5] = [
        ProjectType::Sara,
        ProjectType::Fifty,
        ProjectType::Hundred,
        ProjectType::FourHundred,
        ProjectType::Baloot,
    ];

    /// Points scored by this project in the given mode. Types that are
    /// unavailable in the mode score 0.
    pub fn points(self, rules: &Ruleset, mode: RoundMode) -> i32 {
        if !self.is_available(mode) {
            return 0;
        }
        rules.project_value(self).for_mode(mode)
    }

    /// Baloot can only be declared in Hokom.
    pub fn is_available(self, mode: RoundMode) -> bool {
        !(self == ProjectType::Baloot && mode == RoundMode::Sun)
    }

    /// User-facing label.
    pub fn label(self) -> &'static str {
        match self {
            ProjectType::Sara => "Sara",
            ProjectType::Fifty => "50",
            ProjectType::Hundred => "100",
            ProjectType::FourHundred => "400",
            ProjectType::Baloot => "Baloot",
        }
    }
}

/// Opaque identifier for a recorded round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoundId(Uuid);

impl RoundId {
    /// Fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RoundId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A fully-resolved scoring record for one play of the game.
///
/// Rounds are immutable once built by [`crate::scoring::build_round`];
/// only `index` is reassigned when the match is structurally edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Round {
    /// Unique identity, used for deletion.
    pub id: RoundId,
    /// 1-based position within the match.
    pub index: usize,
    /// When the round was recorded. Informational only.
    pub created_at: DateTime<Utc>,
    /// Mode the round was played in.
    pub mode: RoundMode,
    /// Multiplier applied to the base points.
    pub multiplier: Multiplier,
    /// Whether the entry form derived one side automatically.
    pub auto_complete: bool,
    /// Whether project doubling was enabled.
    pub double_projects: bool,
    /// Projects declared by Us.
    pub projects_us: BTreeSet<ProjectType>,
    /// Projects declared by Them.
    pub projects_them: BTreeSet<ProjectType>,
    /// Base points taken by Us.
    pub base_us: i32,
    /// Base points taken by Them.
    pub base_them: i32,
    /// Mode base times multiplier, cached at creation.
    pub base_adjusted: i32,
    /// Project points for Us, cached at creation.
    pub project_points_us: i32,
    /// Project points for Them, cached at creation.
    pub project_points_them: i32,
    /// Authoritative score contribution for Us.
    pub final_us: i32,
    /// Authoritative score contribution for Them.
    pub final_them: i32,
    /// Declared winner of a coffee round. Defaults to `None` so saves
    /// from before the coffee mechanic still decode.
    #[serde(default)]
    pub coffee_winner: Option<Team>,
}
