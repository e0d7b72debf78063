//! Turn-based policy simulator.
//!
//! A session runs for a fixed horizon of turns. Policies can be enacted once
//! each while affordable; ending a turn may interrupt play with a random event
//! that must be resolved before the turn advances.
use log::{debug, info};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::{
    STRATEGY_EVENT_CHANCE, STRATEGY_HORIZON, STRATEGY_INCOME_PER_ECONOMY_POINT,
    STRATEGY_PASSIVE_ENVIRONMENT_DECAY, STRATEGY_STARTING_BUDGET,
};
use crate::error::GameError;
use crate::outcome::{
    Achievement, AchievementRule, Scorecard, award_achievements, default_achievements,
};
use crate::stats::{Axis, Effect, StatVector, apply_budget};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub cost: i64,
    #[serde(default)]
    pub effect: Effect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOption {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub effect: Effect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomEvent {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub options: Vec<EventOption>,
}

impl RandomEvent {
    #[must_use]
    pub fn option(&self, option_id: &str) -> Option<&EventOption> {
        self.options.iter().find(|option| option.id == option_id)
    }
}

/// Tuning for the policy simulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "StrategyConfig::default_horizon")]
    pub horizon: u32,
    /// Probability that ending a turn draws a random event.
    #[serde(default = "StrategyConfig::default_event_chance")]
    pub event_chance: f64,
    #[serde(default = "StrategyConfig::default_starting_budget")]
    pub starting_budget: i64,
    #[serde(default)]
    pub starting_stats: StatVector,
    #[serde(default = "StrategyConfig::default_income_per_economy_point")]
    pub income_per_economy_point: i64,
    /// Applied after income on every turn advance.
    #[serde(default = "StrategyConfig::default_passive")]
    pub passive: Effect,
    #[serde(default = "default_achievements")]
    pub achievements: Vec<AchievementRule>,
}

impl StrategyConfig {
    const fn default_horizon() -> u32 {
        STRATEGY_HORIZON
    }

    const fn default_event_chance() -> f64 {
        STRATEGY_EVENT_CHANCE
    }

    const fn default_starting_budget() -> i64 {
        STRATEGY_STARTING_BUDGET
    }

    const fn default_income_per_economy_point() -> i64 {
        STRATEGY_INCOME_PER_ECONOMY_POINT
    }

    fn default_passive() -> Effect {
        Effect::new().with(Axis::Environment, STRATEGY_PASSIVE_ENVIRONMENT_DECAY)
    }

    /// Force values into ranges the scheduler can use.
    pub fn sanitize(&mut self) {
        if !(0.0..=1.0).contains(&self.event_chance) {
            self.event_chance = Self::default_event_chance();
        }
        self.horizon = self.horizon.max(1);
        self.starting_budget = self.starting_budget.max(0);
        self.starting_stats.clamp();
    }
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            horizon: Self::default_horizon(),
            event_chance: Self::default_event_chance(),
            starting_budget: Self::default_starting_budget(),
            starting_stats: StatVector::baseline(),
            income_per_economy_point: Self::default_income_per_economy_point(),
            passive: Self::default_passive(),
            achievements: default_achievements(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum StrategyPhase {
    Setup,
    Playing,
    EventPending { event: String },
    Finished { achievements: Vec<Achievement> },
}

impl StrategyPhase {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Setup => "in setup",
            Self::Playing => "playing",
            Self::EventPending { .. } => "an event is pending",
            Self::Finished { .. } => "finished",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnLogEntry {
    PolicyEnacted { turn: u32, policy: String, cost: i64 },
    EventDrawn { turn: u32, event: String },
    EventResolved { turn: u32, event: String, option: String },
    TurnAdvanced { turn: u32, income: i64 },
}

/// What happened when a turn was ended or an event resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    EventDrawn { event: String },
    Advanced { turn: u32, income: i64 },
    Finished { achievements: Vec<Achievement> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyState {
    #[serde(flatten)]
    pub phase: StrategyPhase,
    pub turn: u32,
    pub horizon: u32,
    pub stats: StatVector,
    pub budget: i64,
    pub enacted: Vec<String>,
    pub seen_events: Vec<String>,
    pub log: Vec<TurnLogEntry>,
}

#[derive(Debug, Clone)]
pub struct StrategyGame {
    policies: Arc<Vec<Policy>>,
    events: Arc<Vec<RandomEvent>>,
    cfg: StrategyConfig,
    phase: StrategyPhase,
    turn: u32,
    stats: StatVector,
    budget: i64,
    enacted: Vec<String>,
    seen_events: Vec<String>,
    log: Vec<TurnLogEntry>,
}

impl StrategyGame {
    #[must_use]
    pub fn new(
        policies: Arc<Vec<Policy>>,
        events: Arc<Vec<RandomEvent>>,
        cfg: &StrategyConfig,
    ) -> Self {
        let mut cfg = cfg.clone();
        cfg.sanitize();
        Self {
            policies,
            events,
            phase: StrategyPhase::Setup,
            turn: 0,
            stats: cfg.starting_stats,
            budget: cfg.starting_budget,
            enacted: Vec::new(),
            seen_events: Vec::new(),
            log: Vec::new(),
            cfg,
        }
    }

    /// Leave setup and begin turn 1.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidTransition`] unless the game is in setup.
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.phase != StrategyPhase::Setup {
            return Err(self.invalid("start"));
        }
        self.turn = 1;
        self.stats = self.cfg.starting_stats;
        self.budget = self.cfg.starting_budget;
        self.phase = StrategyPhase::Playing;
        Ok(())
    }

    #[must_use]
    pub fn policy(&self, policy_id: &str) -> Option<&Policy> {
        self.policies.iter().find(|policy| policy.id == policy_id)
    }

    #[must_use]
    pub fn is_enacted(&self, policy_id: &str) -> bool {
        self.enacted.iter().any(|id| id == policy_id)
    }

    /// Whether the enact action should be offered for `policy_id` right now.
    #[must_use]
    pub fn can_enact(&self, policy_id: &str) -> bool {
        self.phase == StrategyPhase::Playing
            && !self.is_enacted(policy_id)
            && self
                .policy(policy_id)
                .is_some_and(|policy| self.budget >= policy.cost)
    }

    /// Pay for a policy and apply its effect. Each policy can be enacted once.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::AlreadyEnacted`], [`GameError::Unaffordable`],
    /// [`GameError::UnknownId`], or [`GameError::InvalidTransition`] outside play.
    pub fn enact_policy(&mut self, policy_id: &str) -> Result<(), GameError> {
        if self.phase != StrategyPhase::Playing {
            return Err(self.invalid("enact a policy"));
        }
        let policies = Arc::clone(&self.policies);
        let policy = policies
            .iter()
            .find(|policy| policy.id == policy_id)
            .ok_or_else(|| GameError::unknown("policy", policy_id))?;
        if self.is_enacted(policy_id) {
            debug!("strategy: `{policy_id}` already enacted");
            return Err(GameError::AlreadyEnacted(policy_id.to_string()));
        }
        if self.budget < policy.cost {
            return Err(GameError::Unaffordable {
                id: policy.id.clone(),
                cost: policy.cost,
                budget: self.budget,
            });
        }

        self.budget = apply_budget(self.budget - policy.cost, policy.effect.budget);
        self.stats.apply_in_place(&policy.effect);
        self.enacted.push(policy.id.clone());
        self.log.push(TurnLogEntry::PolicyEnacted {
            turn: self.turn,
            policy: policy.id.clone(),
            cost: policy.cost,
        });
        Ok(())
    }

    /// End the current turn. May draw an unseen random event instead of advancing.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidTransition`] unless the game is playing.
    pub fn end_turn<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<TurnOutcome, GameError> {
        if self.phase != StrategyPhase::Playing {
            return Err(self.invalid("end the turn"));
        }
        if rng.gen_bool(self.cfg.event_chance) {
            let events = Arc::clone(&self.events);
            let pool: Vec<&RandomEvent> = events
                .iter()
                .filter(|event| !self.seen_events.contains(&event.id))
                .collect();
            if let Some(event) = pool.choose(rng) {
                let event_id = event.id.clone();
                self.log.push(TurnLogEntry::EventDrawn {
                    turn: self.turn,
                    event: event_id.clone(),
                });
                self.phase = StrategyPhase::EventPending {
                    event: event_id.clone(),
                };
                return Ok(TurnOutcome::EventDrawn { event: event_id });
            }
        }
        Ok(self.advance_turn())
    }

    /// Resolve the pending event with one of its options, then advance the turn.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidTransition`] when no event is pending or
    /// [`GameError::UnknownId`] for an option the event does not offer.
    pub fn resolve_event(&mut self, option_id: &str) -> Result<TurnOutcome, GameError> {
        let StrategyPhase::EventPending { event: event_id } = &self.phase else {
            return Err(self.invalid("resolve an event"));
        };
        let events = Arc::clone(&self.events);
        let event = events
            .iter()
            .find(|event| &event.id == event_id)
            .ok_or_else(|| GameError::unknown("event", event_id.as_str()))?;
        let option = event
            .option(option_id)
            .ok_or_else(|| GameError::unknown("event option", option_id))?;

        self.stats.apply_in_place(&option.effect);
        self.budget = apply_budget(self.budget, option.effect.budget);
        self.seen_events.push(event.id.clone());
        self.log.push(TurnLogEntry::EventResolved {
            turn: self.turn,
            event: event.id.clone(),
            option: option.id.clone(),
        });
        self.phase = StrategyPhase::Playing;
        Ok(self.advance_turn())
    }

    fn advance_turn(&mut self) -> TurnOutcome {
        let income =
            i64::from(self.stats.economy).saturating_mul(self.cfg.income_per_economy_point);
        self.budget = apply_budget(self.budget, income);
        self.stats.apply_in_place(&self.cfg.passive);
        self.budget = apply_budget(self.budget, self.cfg.passive.budget);
        self.turn += 1;
        self.log.push(TurnLogEntry::TurnAdvanced {
            turn: self.turn,
            income,
        });

        if self.turn > self.cfg.horizon {
            let achievements = award_achievements(&self.cfg.achievements, &self.scorecard());
            info!(
                "strategy: finished with {} achievements, budget {}",
                achievements.len(),
                self.budget
            );
            self.phase = StrategyPhase::Finished {
                achievements: achievements.clone(),
            };
            TurnOutcome::Finished { achievements }
        } else {
            self.phase = StrategyPhase::Playing;
            TurnOutcome::Advanced {
                turn: self.turn,
                income,
            }
        }
    }

    /// Discard the session and return to setup.
    pub fn restart(&mut self) {
        self.phase = StrategyPhase::Setup;
        self.turn = 0;
        self.stats = self.cfg.starting_stats;
        self.budget = self.cfg.starting_budget;
        self.enacted.clear();
        self.seen_events.clear();
        self.log.clear();
    }

    #[must_use]
    pub fn scorecard(&self) -> Scorecard {
        Scorecard {
            stats: self.stats,
            budget: self.budget,
            enacted_policies: self.enacted.len(),
        }
    }

    #[must_use]
    pub fn pending_event(&self) -> Option<&RandomEvent> {
        match &self.phase {
            StrategyPhase::EventPending { event } => self.events.iter().find(|e| &e.id == event),
            _ => None,
        }
    }

    #[must_use]
    pub fn achievements(&self) -> Option<&[Achievement]> {
        match &self.phase {
            StrategyPhase::Finished { achievements } => Some(achievements),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        matches!(self.phase, StrategyPhase::Finished { .. })
    }

    #[must_use]
    pub const fn phase(&self) -> &StrategyPhase {
        &self.phase
    }

    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    #[must_use]
    pub const fn stats(&self) -> StatVector {
        self.stats
    }

    #[must_use]
    pub const fn budget(&self) -> i64 {
        self.budget
    }

    #[must_use]
    pub fn enacted(&self) -> &[String] {
        &self.enacted
    }

    #[must_use]
    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    #[must_use]
    pub fn log(&self) -> &[TurnLogEntry] {
        &self.log
    }

    #[must_use]
    pub const fn config(&self) -> &StrategyConfig {
        &self.cfg
    }

    #[must_use]
    pub fn snapshot(&self) -> StrategyState {
        StrategyState {
            phase: self.phase.clone(),
            turn: self.turn,
            horizon: self.cfg.horizon,
            stats: self.stats,
            budget: self.budget,
            enacted: self.enacted.clone(),
            seen_events: self.seen_events.clone(),
            log: self.log.clone(),
        }
    }

    fn invalid(&self, action: &'static str) -> GameError {
        GameError::InvalidTransition {
            action,
            phase: self.phase.label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use rand::rngs::mock::StepRng;

    fn policies() -> Arc<Vec<Policy>> {
        Arc::new(vec![
            Policy {
                id: "mining-law".to_string(),
                name: "Mining Law".to_string(),
                description: String::new(),
                category: "economy".to_string(),
                cost: 200,
                effect: Effect::new()
                    .with(Axis::Economy, 15)
                    .with(Axis::Environment, -10),
            },
            Policy {
                id: "space-port".to_string(),
                name: "Space Port".to_string(),
                description: String::new(),
                category: "economy".to_string(),
                cost: 5_000,
                effect: Effect::new().with(Axis::Economy, 40),
            },
        ])
    }

    fn events() -> Arc<Vec<RandomEvent>> {
        Arc::new(vec![RandomEvent {
            id: "storm".to_string(),
            title: "Storm".to_string(),
            description: String::new(),
            options: vec![EventOption {
                id: "repair".to_string(),
                label: "Repair".to_string(),
                effect: Effect::new().with_budget(-100),
            }],
        }])
    }

    fn never_events() -> StrategyConfig {
        StrategyConfig {
            event_chance: 0.0,
            ..StrategyConfig::default()
        }
    }

    #[test]
    fn enact_is_idempotent() {
        let mut game = StrategyGame::new(policies(), events(), &never_events());
        game.start().unwrap();
        game.enact_policy("mining-law").unwrap();
        let stats = game.stats();
        let budget = game.budget();
        assert_eq!(budget, 300);
        assert_eq!(
            game.enact_policy("mining-law"),
            Err(GameError::AlreadyEnacted("mining-law".to_string()))
        );
        assert_eq!(game.stats(), stats);
        assert_eq!(game.budget(), budget);
        assert!(!game.can_enact("mining-law"));
    }

    #[test]
    fn unaffordable_policy_is_rejected() {
        let mut game = StrategyGame::new(policies(), events(), &never_events());
        game.start().unwrap();
        assert!(!game.can_enact("space-port"));
        assert!(matches!(
            game.enact_policy("space-port"),
            Err(GameError::Unaffordable { cost: 5_000, budget: 500, .. })
        ));
        assert!(game.enacted().is_empty());
    }

    #[test]
    fn horizon_finishes_on_tenth_advance() {
        let mut game = StrategyGame::new(policies(), events(), &never_events());
        game.start().unwrap();
        let mut rng = SmallRng::seed_from_u64(5);
        for advance in 1..=10 {
            assert!(!game.is_finished(), "finished early at advance {advance}");
            game.end_turn(&mut rng).unwrap();
        }
        assert!(game.is_finished());
        assert_eq!(game.turn(), 11);
        assert!(game.end_turn(&mut rng).is_err());
    }

    #[test]
    fn advancing_pays_income_and_decays_environment() {
        let mut game = StrategyGame::new(policies(), events(), &never_events());
        game.start().unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        assert_eq!(
            game.end_turn(&mut rng).unwrap(),
            TurnOutcome::Advanced {
                turn: 2,
                income: 100
            }
        );
        assert_eq!(game.budget(), 600);
        assert_eq!(game.stats().environment, 48);
    }

    #[test]
    fn event_must_be_resolved_before_play_resumes() {
        let cfg = StrategyConfig {
            event_chance: 1.0,
            ..StrategyConfig::default()
        };
        let mut game = StrategyGame::new(policies(), events(), &cfg);
        game.start().unwrap();
        let mut rng = StepRng::new(0, 1);
        assert_eq!(
            game.end_turn(&mut rng).unwrap(),
            TurnOutcome::EventDrawn {
                event: "storm".to_string()
            }
        );
        assert!(game.enact_policy("mining-law").unwrap_err().is_silent());
        assert!(game.end_turn(&mut rng).is_err());
        assert!(matches!(
            game.resolve_event("ignore"),
            Err(GameError::UnknownId { .. })
        ));
        let outcome = game.resolve_event("repair").unwrap();
        assert!(matches!(outcome, TurnOutcome::Advanced { turn: 2, .. }));
        assert_eq!(game.budget(), 500);

        // The only event has been seen, so the next turn simply advances.
        assert!(matches!(
            game.end_turn(&mut rng).unwrap(),
            TurnOutcome::Advanced { turn: 3, .. }
        ));
    }

    #[test]
    fn sanitize_repairs_bad_probability() {
        let cfg = StrategyConfig {
            event_chance: f64::NAN,
            horizon: 0,
            ..StrategyConfig::default()
        };
        let game = StrategyGame::new(policies(), events(), &cfg);
        assert!((game.config().event_chance - 0.6).abs() < f64::EPSILON);
        assert_eq!(game.config().horizon, 1);
    }
}
