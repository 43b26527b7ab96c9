//! Headless model of the add-round entry form.
//!
//! The TUI renders this state and routes keystrokes into it; all the
//! behaviour (auto-complete derivation, project mutual exclusion,
//! validation) lives here so it can be unit-tested without a terminal.
//! Headless embedders may skip it entirely and build a
//! [`RoundInput`] by hand.

use std::collections::BTreeSet;

use crate::models::{Multiplier, ProjectType, Round, RoundMode, Team};
use crate::rules::Ruleset;
use crate::scoring::{self, RoundInput, ScoringError};

/// Which base field the user touched last. Auto-complete always
/// derives the *other* side from this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditedSide {
    /// The Us field was edited last.
    Us,
    /// The Them field was edited last.
    Them,
    /// Nothing entered yet.
    Neither,
}

/// In-progress selections for one round.
#[derive(Debug, Clone)]
pub struct RoundForm {
    /// Selected mode.
    pub mode: RoundMode,
    /// Selected multiplier.
    pub multiplier: Multiplier,
    /// Whether the paired base field is derived automatically.
    pub auto_complete: bool,
    /// Whether project doubling is on.
    pub double_projects: bool,
    /// Raw text of the Us base field.
    pub base_us_text: String,
    /// Raw text of the Them base field.
    pub base_them_text: String,
    /// Projects declared by Us.
    pub projects_us: BTreeSet<ProjectType>,
    /// Projects declared by Them.
    pub projects_them: BTreeSet<ProjectType>,
    /// Declared coffee winner; only meaningful for coffee rounds.
    pub coffee_winner: Option<Team>,
    edited: EditedSide,
}

impl Default for RoundForm {
    fn default() -> Self {
        Self::new()
    }
}

impl RoundForm {
    /// Blank form with the usual defaults (Sun, normal multiplier,
    /// auto-complete on).
    pub fn new() -> Self {
        Self {
            mode: RoundMode::Sun,
            multiplier: Multiplier::Normal,
            auto_complete: true,
            double_projects: false,
            base_us_text: String::new(),
            base_them_text: String::new(),
            projects_us: BTreeSet::new(),
            projects_them: BTreeSet::new(),
            coffee_winner: None,
            edited: EditedSide::Neither,
        }
    }

    /// Whether the coffee multiplier is selected.
    pub fn is_coffee_round(&self) -> bool {
        self.multiplier == Multiplier::Coffee
    }

    /// Which side was edited last.
    pub fn edited_side(&self) -> EditedSide {
        self.edited
    }

    /// Adjusted base for the current mode/multiplier selection.
    pub fn base_adjusted(&self, rules: &Ruleset) -> i32 {
        scoring::base_adjusted(rules, self.mode, self.multiplier)
    }

    /// Projects that may be declared in the current mode.
    pub fn available_projects(&self) -> Vec<ProjectType> {
        ProjectType::ALL
            .into_iter()
            .filter(|project| project.is_available(self.mode))
            .collect()
    }

    /// Computed project points for Us.
    pub fn project_points_us(&self, rules: &Ruleset) -> i32 {
        scoring::project_points(rules, &self.projects_us, self.mode, self.double_projects)
    }

    /// Computed project points for Them.
    pub fn project_points_them(&self, rules: &Ruleset) -> i32 {
        scoring::project_points(rules, &self.projects_them, self.mode, self.double_projects)
    }

    /// Effective base value for Us.
    pub fn base_us_value(&self, rules: &Ruleset) -> i32 {
        if self.is_coffee_round() {
            return if self.coffee_winner == Some(Team::Us) {
                self.base_adjusted(rules)
            } else {
                0
            };
        }
        self.base_us_text.trim().parse().unwrap_or(0)
    }

    /// Effective base value for Them.
    pub fn base_them_value(&self, rules: &Ruleset) -> i32 {
        if self.is_coffee_round() {
            return if self.coffee_winner == Some(Team::Them) {
                self.base_adjusted(rules)
            } else {
                0
            };
        }
        self.base_them_text.trim().parse().unwrap_or(0)
    }

    /// Round total for Us as currently entered.
    pub fn final_us(&self, rules: &Ruleset) -> i32 {
        self.base_us_value(rules) + self.project_points_us(rules)
    }

    /// Round total for Them as currently entered.
    pub fn final_them(&self, rules: &Ruleset) -> i32 {
        self.base_them_value(rules) + self.project_points_them(rules)
    }

    /// Switch mode. Baloot cannot survive a switch to Sun.
    pub fn set_mode(&mut self, mode: RoundMode, rules: &Ruleset) {
        self.mode = mode;
        if mode == RoundMode::Sun {
            self.projects_us.remove(&ProjectType::Baloot);
            self.projects_them.remove(&ProjectType::Baloot);
        }
        self.rederive(rules);
    }

    /// Switch multiplier, re-deriving the auto-completed side.
    pub fn set_multiplier(&mut self, multiplier: Multiplier, rules: &Ruleset) {
        self.multiplier = multiplier;
        if !self.is_coffee_round() {
            self.coffee_winner = None;
        }
        self.rederive(rules);
    }

    /// Replace the Us base text, deriving Them when auto-complete is on.
    pub fn edit_base_us(&mut self, text: String, rules: &Ruleset) {
        self.edited = EditedSide::Us;
        self.base_us_text = text;
        if self.auto_complete {
            self.derive_them_from_us(rules);
        }
    }

    /// Replace the Them base text, deriving Us when auto-complete is on.
    pub fn edit_base_them(&mut self, text: String, rules: &Ruleset) {
        self.edited = EditedSide::Them;
        self.base_them_text = text;
        if self.auto_complete {
            self.derive_us_from_them(rules);
        }
    }

    /// Toggle auto-complete, immediately deriving the paired side.
    pub fn set_auto_complete(&mut self, enabled: bool, rules: &Ruleset) {
        self.auto_complete = enabled;
        if enabled {
            self.rederive(rules);
        }
    }

    /// Toggle a project for the given team. Claiming a project removes
    /// it from the other team, except Baloot in Hokom which both teams
    /// may hold at once. Unavailable projects are ignored.
    pub fn toggle_project(&mut self, team: Team, project: ProjectType) {
        if !project.is_available(self.mode) {
            return;
        }
        let (own, other) = match team {
            Team::Us => (&mut self.projects_us, &mut self.projects_them),
            Team::Them => (&mut self.projects_them, &mut self.projects_us),
        };
        if own.contains(&project) {
            own.remove(&project);
            return;
        }
        let baloot_exception = project == ProjectType::Baloot && self.mode == RoundMode::Hokom;
        if !baloot_exception {
            other.remove(&project);
        }
        own.insert(project);
    }

    /// Range problem with the currently edited side, if any.
    pub fn validation_error(&self, rules: &Ruleset) -> Option<String> {
        if self.is_coffee_round() {
            return None;
        }
        let adjusted = self.base_adjusted(rules);
        let out_of_range = |value: i32| value < 0 || value > adjusted;
        let complaint = || Some(format!("base points must be between 0 and {adjusted}"));
        if self.auto_complete {
            match self.edited {
                EditedSide::Them => {
                    if out_of_range(self.base_them_value(rules)) {
                        return complaint();
                    }
                }
                _ => {
                    if out_of_range(self.base_us_value(rules)) {
                        return complaint();
                    }
                }
            }
        } else if out_of_range(self.base_us_value(rules))
            || out_of_range(self.base_them_value(rules))
        {
            return complaint();
        }
        None
    }

    /// True when manually entered bases do not add up to the adjusted
    /// base. A warning, never a rejection.
    pub fn sums_mismatch(&self, rules: &Ruleset) -> bool {
        if self.auto_complete || self.is_coffee_round() {
            return false;
        }
        self.base_us_value(rules) + self.base_them_value(rules) != self.base_adjusted(rules)
    }

    /// Whether the form can be committed.
    pub fn is_valid(&self, rules: &Ruleset) -> bool {
        if self.is_coffee_round() {
            return self.coffee_winner.is_some();
        }
        self.validation_error(rules).is_none()
            && !self.base_us_text.trim().is_empty()
            && !self.base_them_text.trim().is_empty()
    }

    /// Assemble the round described by the current selections.
    pub fn build(&self, rules: &Ruleset) -> Result<Round, ScoringError> {
        scoring::build_round(
            rules,
            RoundInput {
                mode: self.mode,
                multiplier: self.multiplier,
                auto_complete: self.auto_complete,
                double_projects: self.double_projects,
                projects_us: self.projects_us.clone(),
                projects_them: self.projects_them.clone(),
                base_us: self.base_us_value(rules),
                base_them: self.base_them_value(rules),
                coffee_winner: if self.is_coffee_round() {
                    self.coffee_winner
                } else {
                    None
                },
            },
        )
    }

    fn rederive(&mut self, rules: &Ruleset) {
        if !self.auto_complete || self.is_coffee_round() {
            return;
        }
        match self.edited {
            EditedSide::Us => self.derive_them_from_us(rules),
            EditedSide::Them => self.derive_us_from_them(rules),
            EditedSide::Neither => {}
        }
    }

    fn derive_them_from_us(&mut self, rules: &Ruleset) {
        let entered: i32 = self.base_us_text.trim().parse().unwrap_or(0);
        let derived = self.base_adjusted(rules) - entered;
        self.base_them_text = if derived >= 0 {
            derived.to_string()
        } else {
            String::new()
        };
    }

    fn derive_us_from_them(&mut self, rules: &Ruleset) {
        let entered: i32 = self.base_them_text.trim().parse().unwrap_or(0);
        let derived = self.base_adjusted(rules) - entered;
        self.base_us_text = if derived >= 0 {
            derived.to_string()
        } else {
            String::new()
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Ruleset {
        Ruleset::modern()
    }

    #[test]
    fn auto_complete_derives_the_other_side() {
        let rules = rules();
        let mut form = RoundForm::new();
        form.edit_base_us("16".to_string(), &rules);
        assert_eq!(form.base_them_text, "10");

        form.edit_base_them("6".to_string(), &rules);
        assert_eq!(form.base_us_text, "20");
    }

    #[test]
    fn auto_complete_clears_on_negative_remainder() {
        let rules = rules();
        let mut form = RoundForm::new();
        form.edit_base_us("40".to_string(), &rules);
        assert_eq!(form.base_them_text, "");
    }

    #[test]
    fn changing_multiplier_rederives() {
        let rules = rules();
        let mut form = RoundForm::new();
        form.edit_base_us("16".to_string(), &rules);
        form.set_multiplier(Multiplier::X2, &rules);
        // 26 * 2 - 16
        assert_eq!(form.base_them_text, "36");
    }

    #[test]
    fn mutual_exclusion_moves_the_project() {
        let mut form = RoundForm::new();
        form.toggle_project(Team::Us, ProjectType::Fifty);
        form.toggle_project(Team::Them, ProjectType::Fifty);
        assert!(!form.projects_us.contains(&ProjectType::Fifty));
        assert!(form.projects_them.contains(&ProjectType::Fifty));
    }

    #[test]
    fn baloot_is_shared_in_hokom_only() {
        let rules = rules();
        let mut form = RoundForm::new();
        form.set_mode(RoundMode::Hokom, &rules);
        form.toggle_project(Team::Us, ProjectType::Baloot);
        form.toggle_project(Team::Them, ProjectType::Baloot);
        assert!(form.projects_us.contains(&ProjectType::Baloot));
        assert!(form.projects_them.contains(&ProjectType::Baloot));

        // Every other project stays exclusive in Hokom too.
        form.toggle_project(Team::Us, ProjectType::Sara);
        form.toggle_project(Team::Them, ProjectType::Sara);
        assert!(!form.projects_us.contains(&ProjectType::Sara));
    }

    #[test]
    fn baloot_cannot_be_toggled_in_sun() {
        let mut form = RoundForm::new();
        form.toggle_project(Team::Us, ProjectType::Baloot);
        assert!(form.projects_us.is_empty());
    }

    #[test]
    fn switching_to_sun_drops_baloot_from_both_teams() {
        let rules = rules();
        let mut form = RoundForm::new();
        form.set_mode(RoundMode::Hokom, &rules);
        form.toggle_project(Team::Us, ProjectType::Baloot);
        form.toggle_project(Team::Them, ProjectType::Baloot);
        form.set_mode(RoundMode::Sun, &rules);
        assert!(form.projects_us.is_empty());
        assert!(form.projects_them.is_empty());
    }

    #[test]
    fn coffee_round_requires_a_winner() {
        let rules = rules();
        let mut form = RoundForm::new();
        form.set_multiplier(Multiplier::Coffee, &rules);
        assert!(!form.is_valid(&rules));
        form.coffee_winner = Some(Team::Them);
        assert!(form.is_valid(&rules));

        let round = form.build(&rules).unwrap();
        assert_eq!(round.base_them, 26 * 5);
        assert_eq!(round.base_us, 0);
    }

    #[test]
    fn out_of_range_base_is_reported() {
        let rules = rules();
        let mut form = RoundForm::new();
        form.edit_base_us("30".to_string(), &rules);
        assert!(form.validation_error(&rules).is_some());
        form.edit_base_us("26".to_string(), &rules);
        assert!(form.validation_error(&rules).is_none());
    }

    #[test]
    fn manual_entry_flags_sum_mismatch() {
        let rules = rules();
        let mut form = RoundForm::new();
        form.set_auto_complete(false, &rules);
        form.edit_base_us("20".to_string(), &rules);
        form.edit_base_them("20".to_string(), &rules);
        assert!(form.sums_mismatch(&rules));
        assert!(form.is_valid(&rules));
    }
}
