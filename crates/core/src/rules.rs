//! Scoring rule tables.
//!
//! Every tunable constant of the game lives here so rule tweaks never
//! touch the scoring code. A [`Ruleset`] is selected once at startup
//! (see [`crate::config::AppConfig`]) and treated as read-only from
//! then on.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{ProjectType, RoundMode};

/// Point value of a project in each of the two modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectValue {
    /// Points awarded when the round is played in Sun.
    pub sun: i32,
    /// Points awarded when the round is played in Hokom.
    pub hokom: i32,
}

impl ProjectValue {
    /// Value for the given mode.
    pub fn for_mode(&self, mode: RoundMode) -> i32 {
        match mode {
            RoundMode::Sun => self.sun,
            RoundMode::Hokom => self.hokom,
        }
    }
}

/// Complete scoring configuration for one rule variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ruleset {
    /// Preset name this ruleset was built from.
    pub name: String,
    /// Base points contested in a Sun round.
    pub sun_base: i32,
    /// Base points contested in a Hokom round.
    pub hokom_base: i32,
    /// Running total a team must reach to win the match.
    pub target_score: i32,
    /// Multiplier applied by the instant-win coffee round.
    pub coffee_multiplier: i32,
    /// Factor applied to project points when doubling is enabled.
    pub double_projects_multiplier: i32,
    /// Sara project values.
    pub sara: ProjectValue,
    /// Fifty project values.
    pub fifty: ProjectValue,
    /// Hundred project values.
    pub hundred: ProjectValue,
    /// Four-hundred project values.
    pub four_hundred: ProjectValue,
    /// Baloot project values (Hokom only; the Sun entry stays 0).
    pub baloot: ProjectValue,
}

impl Ruleset {
    /// The canonical rule variant: mode-dependent project points,
    /// doubling with the Baloot exception, top-up instant win.
    pub fn modern() -> Self {
        Self {
            name: "modern".to_string(),
            sun_base: 26,
            hokom_base: 16,
            target_score: 152,
            coffee_multiplier: 5,
            double_projects_multiplier: 2,
            sara: ProjectValue { sun: 4, hokom: 2 },
            fifty: ProjectValue { sun: 10, hokom: 5 },
            hundred: ProjectValue { sun: 20, hokom: 10 },
            four_hundred: ProjectValue { sun: 40, hokom: 40 },
            baloot: ProjectValue { sun: 0, hokom: 2 },
        }
    }

    /// The flat historical table where projects score their face value
    /// regardless of mode. Kept as a preset rather than a code path.
    pub fn classic() -> Self {
        Self {
            name: "classic".to_string(),
            sun_base: 26,
            hokom_base: 16,
            target_score: 152,
            coffee_multiplier: 5,
            double_projects_multiplier: 2,
            sara: ProjectValue { sun: 0, hokom: 0 },
            fifty: ProjectValue { sun: 50, hokom: 50 },
            hundred: ProjectValue { sun: 100, hokom: 100 },
            four_hundred: ProjectValue { sun: 400, hokom: 400 },
            baloot: ProjectValue { sun: 0, hokom: 20 },
        }
    }

    /// Look up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "modern" => Some(Self::modern()),
            "classic" => Some(Self::classic()),
            _ => None,
        }
    }

    /// Resolve a preset name, falling back to `modern` when unknown.
    pub fn preset_or_default(name: &str) -> Self {
        match Self::preset(name) {
            Some(rules) => rules,
            None => {
                warn!("unknown rules preset '{name}', falling back to modern");
                Self::modern()
            }
        }
    }

    /// Per-mode values for the given project type.
    pub fn project_value(&self, project: ProjectType) -> ProjectValue {
        match project {
            ProjectType::Sara => self.sara,
            ProjectType::Fifty => self.fifty,
            ProjectType::Hundred => self.hundred,
            ProjectType::FourHundred => self.four_hundred,
            ProjectType::Baloot => self.baloot,
        }
    }
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::modern()
    }
}

static DEFAULT_RULESET: Lazy<Ruleset> = Lazy::new(Ruleset::modern);

/// Shared instance of the canonical ruleset.
pub fn default_ruleset() -> &'static Ruleset {
    &DEFAULT_RULESET
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modern_matches_reference_constants() {
        let rules = Ruleset::modern();
        assert_eq!(rules.sun_base, 26);
        assert_eq!(rules.hokom_base, 16);
        assert_eq!(rules.target_score, 152);
        assert_eq!(rules.coffee_multiplier, 5);
        assert_eq!(rules.project_value(ProjectType::Sara).sun, 4);
        assert_eq!(rules.project_value(ProjectType::Baloot).sun, 0);
        assert_eq!(rules.project_value(ProjectType::Baloot).hokom, 2);
    }

    #[test]
    fn preset_lookup() {
        assert_eq!(Ruleset::preset("classic").unwrap().fifty.sun, 50);
        assert!(Ruleset::preset("tarneeb").is_none());
        assert_eq!(Ruleset::preset_or_default("tarneeb").name, "modern");
    }
}
