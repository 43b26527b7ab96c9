//! Pure scoring functions — no side effects, deterministic for a
//! given [`Ruleset`].

use std::collections::BTreeSet;

use chrono::Utc;
use thiserror::Error;
use tracing::warn;

use crate::models::{Multiplier, ProjectType, Round, RoundId, RoundMode, Team};
use crate::rules::Ruleset;

/// Errors from assembling a round out of raw selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// A selected project cannot be declared in the selected mode.
    /// Callers are expected to filter these out before building.
    #[error("project {project:?} is not available in {mode:?}")]
    ProjectUnavailable {
        /// The offending project.
        project: ProjectType,
        /// The mode it was declared in.
        mode: RoundMode,
    },
}

/// Raw user selections for one round, as resolved by the entry form.
#[derive(Debug, Clone, Default)]
pub struct RoundInput {
    /// Selected mode.
    pub mode: RoundMode,
    /// Selected multiplier.
    pub multiplier: Multiplier,
    /// Whether auto-complete filled in one side.
    pub auto_complete: bool,
    /// Whether project doubling is on.
    pub double_projects: bool,
    /// Projects declared by Us.
    pub projects_us: BTreeSet<ProjectType>,
    /// Projects declared by Them.
    pub projects_them: BTreeSet<ProjectType>,
    /// Entered base points for Us. Ignored for coffee rounds.
    pub base_us: i32,
    /// Entered base points for Them. Ignored for coffee rounds.
    pub base_them: i32,
    /// Declared winner when `multiplier` is coffee.
    pub coffee_winner: Option<Team>,
}

/// Mode base points scaled by the multiplier.
pub fn base_adjusted(rules: &Ruleset, mode: RoundMode, multiplier: Multiplier) -> i32 {
    mode.base(rules) * multiplier.value(rules)
}

/// Total project points for one team's declarations.
///
/// When doubling is on, every project is multiplied by
/// `double_projects_multiplier` except Baloot, whose value never
/// changes. Projects unavailable in the mode contribute 0.
pub fn project_points(
    rules: &Ruleset,
    projects: &BTreeSet<ProjectType>,
    mode: RoundMode,
    doubled: bool,
) -> i32 {
    projects
        .iter()
        .map(|project| {
            let points = project.points(rules, mode);
            if doubled && *project != ProjectType::Baloot {
                points * rules.double_projects_multiplier
            } else {
                points
            }
        })
        .sum()
}

/// Assemble a finalized [`Round`] from raw selections.
///
/// Coffee rounds award the whole adjusted base to the declared winner
/// and 0 to the other side; entered base values are ignored. For all
/// other rounds the entered values are taken as given — a pair that
/// does not sum to the adjusted base is accepted with a warning.
pub fn build_round(rules: &Ruleset, input: RoundInput) -> Result<Round, ScoringError> {
    for project in input.projects_us.iter().chain(input.projects_them.iter()) {
        if !project.is_available(input.mode) {
            return Err(ScoringError::ProjectUnavailable {
                project: *project,
                mode: input.mode,
            });
        }
    }

    let base_adjusted = base_adjusted(rules, input.mode, input.multiplier);
    let project_points_us =
        project_points(rules, &input.projects_us, input.mode, input.double_projects);
    let project_points_them = project_points(
        rules,
        &input.projects_them,
        input.mode,
        input.double_projects,
    );

    let is_coffee = input.multiplier == Multiplier::Coffee;
    let coffee_winner = if is_coffee { input.coffee_winner } else { None };
    let (base_us, base_them) = match coffee_winner {
        Some(Team::Us) => (base_adjusted, 0),
        Some(Team::Them) => (0, base_adjusted),
        None => (input.base_us, input.base_them),
    };

    if !is_coffee && base_us + base_them != base_adjusted {
        warn!(
            base_us,
            base_them, base_adjusted, "entered bases do not sum to the adjusted base"
        );
    }

    Ok(Round {
        id: RoundId::new(),
        index: 0,
        created_at: Utc::now(),
        mode: input.mode,
        multiplier: input.multiplier,
        auto_complete: input.auto_complete,
        double_projects: input.double_projects,
        projects_us: input.projects_us,
        projects_them: input.projects_them,
        base_us,
        base_them,
        base_adjusted,
        project_points_us,
        project_points_them,
        final_us: base_us + project_points_us,
        final_them: base_them + project_points_them,
        coffee_winner,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Ruleset {
        Ruleset::modern()
    }

    fn set(projects: &[ProjectType]) -> BTreeSet<ProjectType> {
        projects.iter().copied().collect()
    }

    #[test]
    fn adjusted_base_reference_values() {
        let rules = rules();
        assert_eq!(base_adjusted(&rules, RoundMode::Sun, Multiplier::Normal), 26);
        assert_eq!(base_adjusted(&rules, RoundMode::Sun, Multiplier::X2), 52);
        assert_eq!(
            base_adjusted(&rules, RoundMode::Hokom, Multiplier::Coffee),
            80
        );
    }

    #[test]
    fn project_points_are_mode_dependent() {
        let rules = rules();
        let sara = set(&[ProjectType::Sara]);
        assert_eq!(project_points(&rules, &sara, RoundMode::Sun, false), 4);
        assert_eq!(project_points(&rules, &sara, RoundMode::Hokom, false), 2);
        let fifty = set(&[ProjectType::Fifty]);
        assert_eq!(project_points(&rules, &fifty, RoundMode::Hokom, false), 5);
    }

    #[test]
    fn baloot_scores_only_in_hokom() {
        let rules = rules();
        let baloot = set(&[ProjectType::Baloot]);
        assert_eq!(project_points(&rules, &baloot, RoundMode::Hokom, false), 2);
        assert_eq!(project_points(&rules, &baloot, RoundMode::Sun, false), 0);
    }

    #[test]
    fn doubling_skips_baloot() {
        let rules = rules();
        let sara = set(&[ProjectType::Sara]);
        assert_eq!(project_points(&rules, &sara, RoundMode::Sun, true), 8);

        let mixed = set(&[ProjectType::Fifty, ProjectType::Baloot]);
        // 5 * 2 for the fifty, baloot stays at 2.
        assert_eq!(project_points(&rules, &mixed, RoundMode::Hokom, true), 12);
    }

    #[test]
    fn build_round_splits_bases_as_entered() {
        let rules = rules();
        let round = build_round(
            &rules,
            RoundInput {
                mode: RoundMode::Sun,
                multiplier: Multiplier::X2,
                base_us: 30,
                base_them: 22,
                projects_us: set(&[ProjectType::Sara]),
                double_projects: false,
                ..RoundInput::default()
            },
        )
        .unwrap();

        assert_eq!(round.base_adjusted, 52);
        assert_eq!(round.final_us, 34);
        assert_eq!(round.final_them, 22);
        assert_eq!(round.coffee_winner, None);
    }

    #[test]
    fn coffee_round_awards_whole_base_to_winner() {
        let rules = rules();
        let round = build_round(
            &rules,
            RoundInput {
                mode: RoundMode::Hokom,
                multiplier: Multiplier::Coffee,
                // Entered bases must be ignored for coffee rounds.
                base_us: 7,
                base_them: 9,
                projects_them: set(&[ProjectType::Baloot]),
                coffee_winner: Some(Team::Us),
                ..RoundInput::default()
            },
        )
        .unwrap();

        assert_eq!(round.base_adjusted, 80);
        assert_eq!(round.base_us, 80);
        assert_eq!(round.base_them, 0);
        assert_eq!(round.final_us, 80);
        assert_eq!(round.final_them, 2);
        assert_eq!(round.coffee_winner, Some(Team::Us));
    }

    #[test]
    fn non_coffee_round_never_records_a_coffee_winner() {
        let rules = rules();
        let round = build_round(
            &rules,
            RoundInput {
                mode: RoundMode::Sun,
                multiplier: Multiplier::Normal,
                base_us: 26,
                coffee_winner: Some(Team::Them),
                ..RoundInput::default()
            },
        )
        .unwrap();
        assert_eq!(round.coffee_winner, None);
        assert_eq!(round.base_us, 26);
    }

    #[test]
    fn unavailable_project_is_rejected() {
        let rules = rules();
        let err = build_round(
            &rules,
            RoundInput {
                mode: RoundMode::Sun,
                projects_us: set(&[ProjectType::Baloot]),
                ..RoundInput::default()
            },
        )
        .unwrap_err();
        assert_eq!(
            err,
            ScoringError::ProjectUnavailable {
                project: ProjectType::Baloot,
                mode: RoundMode::Sun,
            }
        );
    }
}
