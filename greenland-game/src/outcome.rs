//! Outcome classification and achievement badges.
//!
//! Rules are evaluated in a fixed priority order and the first match wins.
//! A validated rule list always ends with an unconditional rule, so
//! classification is total.
use serde::{Deserialize, Serialize};

use crate::constants::{
    ACHIEVEMENT_AXIS_THRESHOLD, ACHIEVEMENT_BALANCED_FLOOR, ACHIEVEMENT_BUDGET_TARGET,
    ACHIEVEMENT_POLICY_COUNT, OUTCOME_DEPENDENCY_THRESHOLD, OUTCOME_DOMINANT_THRESHOLD,
};
use crate::error::CatalogError;
use crate::stats::{Axis, AxisSet, StatVector};

/// Everything a rule may look at once a game ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scorecard {
    pub stats: StatVector,
    pub budget: i64,
    pub enacted_policies: usize,
}

impl Scorecard {
    #[must_use]
    pub const fn from_stats(stats: StatVector) -> Self {
        Self {
            stats,
            budget: 0,
            enacted_policies: 0,
        }
    }
}

/// Guard attached to an outcome or achievement rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Axis holds the maximum value and is strictly above `above`.
    Dominant { axis: Axis, above: i32 },
    AxisAtLeast { axis: Axis, value: i32 },
    AxisBelow { axis: Axis, value: i32 },
    AllAtLeast { value: i32 },
    BudgetAtLeast { value: i64 },
    PoliciesAtLeast { count: usize },
    Always,
}

impl Condition {
    #[must_use]
    pub fn matches(&self, card: &Scorecard) -> bool {
        let stats = &card.stats;
        match *self {
            Self::Dominant { axis, above } => stats.is_max(axis) && stats.get(axis) > above,
            Self::AxisAtLeast { axis, value } => stats.get(axis) >= value,
            Self::AxisBelow { axis, value } => stats.get(axis) < value,
            Self::AllAtLeast { value } => stats.min_value() >= value,
            Self::BudgetAtLeast { value } => card.budget >= value,
            Self::PoliciesAtLeast { count } => card.enacted_policies >= count,
            Self::Always => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeRule {
    pub id: String,
    pub title: String,
    pub description: String,
    pub condition: Condition,
}

/// Labeled classification of a terminal stat vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: String,
    pub title: String,
    pub description: String,
    pub stats: StatVector,
    /// Every axis tied at the maximum, in priority order.
    #[serde(default)]
    pub leading: AxisSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutcomeRules {
    rules: Vec<OutcomeRule>,
}

impl OutcomeRules {
    /// Build a rule list, rejecting lists that could fail to match.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NonExhaustiveOutcomes`] when the list is empty or its last
    /// rule is guarded.
    pub fn new(rules: Vec<OutcomeRule>) -> Result<Self, CatalogError> {
        let rules = Self { rules };
        rules.validate()?;
        Ok(rules)
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::NonExhaustiveOutcomes`] when the final rule is not `Always`.
    pub fn validate(&self) -> Result<(), CatalogError> {
        match self.rules.last() {
            Some(rule) if rule.condition == Condition::Always => Ok(()),
            _ => Err(CatalogError::NonExhaustiveOutcomes),
        }
    }

    #[must_use]
    pub fn rules(&self) -> &[OutcomeRule] {
        &self.rules
    }

    /// First matching rule wins.
    #[must_use]
    pub fn classify(&self, stats: &StatVector) -> Outcome {
        let card = Scorecard::from_stats(*stats);
        let rule = self
            .rules
            .iter()
            .find(|rule| rule.condition.matches(&card))
            .or_else(|| self.rules.last());
        rule.map_or_else(
            || Outcome {
                id: String::from("balanced-path"),
                title: String::from("The Balanced Path"),
                description: String::new(),
                stats: *stats,
                leading: stats.dominant_axes(),
            },
            |rule| Outcome {
                id: rule.id.clone(),
                title: rule.title.clone(),
                description: rule.description.clone(),
                stats: *stats,
                leading: stats.dominant_axes(),
            },
        )
    }
}

fn rule(id: &str, title: &str, description: &str, condition: Condition) -> OutcomeRule {
    OutcomeRule {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        condition,
    }
}

impl Default for OutcomeRules {
    fn default() -> Self {
        let dominant = |axis| Condition::Dominant {
            axis,
            above: OUTCOME_DOMINANT_THRESHOLD,
        };
        Self {
            rules: vec![
                rule(
                    "sovereign-nation",
                    "A Sovereign Greenland",
                    "Self-determination came first. Greenland charts its own course among nations.",
                    dominant(Axis::Sovereignty),
                ),
                rule(
                    "economic-powerhouse",
                    "Arctic Economic Powerhouse",
                    "Mines, fisheries and ports made Greenland a trading force in the north.",
                    dominant(Axis::Economy),
                ),
                rule(
                    "green-guardian",
                    "Guardian of the Ice",
                    "Greenland became the world's voice for the Arctic environment.",
                    dominant(Axis::Environment),
                ),
                rule(
                    "cultural-renaissance",
                    "Kalaallit Renaissance",
                    "Language, art and tradition flourish at the heart of national life.",
                    dominant(Axis::Culture),
                ),
                rule(
                    "dependent-territory",
                    "A Dependent Territory",
                    "Decisions were made elsewhere. Greenland's future is not its own.",
                    Condition::AxisBelow {
                        axis: Axis::Sovereignty,
                        value: OUTCOME_DEPENDENCY_THRESHOLD,
                    },
                ),
                rule(
                    "balanced-path",
                    "The Balanced Path",
                    "No single priority won out. Greenland moves forward carefully on every front.",
                    Condition::Always,
                ),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementRule {
    pub id: String,
    pub title: String,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
}

/// Every matching rule awards its badge, in rule order.
#[must_use]
pub fn award_achievements(rules: &[AchievementRule], card: &Scorecard) -> Vec<Achievement> {
    rules
        .iter()
        .filter(|rule| rule.condition.matches(card))
        .map(|rule| Achievement {
            id: rule.id.clone(),
            title: rule.title.clone(),
        })
        .collect()
}

#[must_use]
pub fn default_achievements() -> Vec<AchievementRule> {
    let badge = |id: &str, title: &str, condition| AchievementRule {
        id: id.to_string(),
        title: title.to_string(),
        condition,
    };
    let axis_badge = |axis| Condition::AxisAtLeast {
        axis,
        value: ACHIEVEMENT_AXIS_THRESHOLD,
    };
    vec![
        badge("economic-titan", "Economic Titan", axis_badge(Axis::Economy)),
        badge(
            "climate-champion",
            "Climate Champion",
            axis_badge(Axis::Environment),
        ),
        badge(
            "self-determination",
            "Self-Determination",
            axis_badge(Axis::Sovereignty),
        ),
        badge("culture-keeper", "Culture Keeper", axis_badge(Axis::Culture)),
        badge(
            "reformer",
            "Reformer",
            Condition::PoliciesAtLeast {
                count: ACHIEVEMENT_POLICY_COUNT,
            },
        ),
        badge(
            "fiscal-hawk",
            "Fiscal Hawk",
            Condition::BudgetAtLeast {
                value: ACHIEVEMENT_BUDGET_TARGET,
            },
        ),
        badge(
            "balanced-steward",
            "Balanced Steward",
            Condition::AllAtLeast {
                value: ACHIEVEMENT_BALANCED_FLOOR,
            },
        ),
    ]
}
