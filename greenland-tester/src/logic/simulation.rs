//! Drives one registry session with a bot and checks engine invariants after every step.
use anyhow::{Context, Result};
use greenland_game::{
    GameConfig, GameError, GameKind, GameState, Outcome, SessionConfig, SessionId,
    SessionRegistry, SessionState, StatVector, StrategyPhase, TriviaPhase, WalkPhase, share_text,
};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use thiserror::Error;
use twox_hash::XxHash64;

use super::bots::{Bot, BotMove, BotStrategy};

/// Hard stop for a single playthrough.
pub const DEFAULT_MAX_STEPS: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationPlan {
    pub game: GameKind,
    pub strategy: BotStrategy,
    pub max_steps: usize,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(game: GameKind, strategy: BotStrategy) -> Self {
        Self {
            game,
            strategy,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[must_use]
    pub fn name(&self) -> String {
        format!("{}/{}", self.game.as_str(), self.strategy.label())
    }
}

/// Broken engine guarantee observed during a playthrough.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum InvariantViolation {
    #[error("step {step}: {axis} = {value} is outside 0..=100")]
    StatOutOfBounds {
        step: usize,
        axis: String,
        value: i32,
    },
    #[error("step {step}: budget went negative ({budget})")]
    NegativeBudget { step: usize, budget: i64 },
    #[error("step {step}: turn {turn} is past horizon {horizon}")]
    TurnPastHorizon { step: usize, turn: u32, horizon: u32 },
    #[error("step {step}: turn went backwards from {before} to {after}")]
    TurnRegressed { step: usize, before: u32, after: u32 },
    #[error("step {step}: walk took {taken} choices, expected at most {expected}")]
    WalkTooLong {
        step: usize,
        taken: usize,
        expected: usize,
    },
    #[error("step {step}: score dropped from {before} to {after}")]
    ScoreDropped { step: usize, before: u32, after: u32 },
    #[error("step {step}: {answered} answers recorded for a {total}-question round")]
    TooManyAnswers {
        step: usize,
        answered: usize,
        total: usize,
    },
    #[error("step {step}: cell ({x}, {y}) is off the grid or shared")]
    BadPlacement { step: usize, x: u32, y: u32 },
    #[error("step {step}: {action} was rejected: {reason}")]
    Rejected {
        step: usize,
        action: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub game: GameKind,
    pub strategy: BotStrategy,
    pub seed: u64,
    pub share_code: String,
    pub steps: usize,
    pub finished: bool,
    pub final_state: SessionState,
    pub outcome: Option<Outcome>,
    pub grade: Option<String>,
    pub share_text: String,
    pub transcript_hash: u64,
    pub moves: Vec<BotMove>,
    pub violations: Vec<InvariantViolation>,
}

impl SimulationSummary {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.finished && self.violations.is_empty()
    }

    /// Short result label: outcome title, trivia grade, or the last phase reached.
    #[must_use]
    pub fn ending(&self) -> String {
        if let Some(outcome) = &self.outcome {
            return outcome.title.clone();
        }
        if let Some(grade) = &self.grade {
            return format!("grade {grade}");
        }
        if self.finished {
            "finished".to_string()
        } else {
            "unfinished".to_string()
        }
    }
}

pub struct GameSimulator {
    registry: SessionRegistry,
}

impl GameSimulator {
    #[must_use]
    pub const fn new(registry: SessionRegistry) -> Self {
        Self { registry }
    }

    /// Simulator over the embedded catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded catalog fails validation.
    pub fn with_defaults() -> Result<Self> {
        let registry = SessionRegistry::with_defaults().context("embedded catalog is invalid")?;
        Ok(Self::new(registry))
    }

    #[must_use]
    pub const fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Play one session to completion and end it.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be created or snapshotted.
    pub fn run(&mut self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let id = self
            .registry
            .start_session(SessionConfig::new(plan.game).with_seed(seed))
            .with_context(|| format!("failed to start {} session", plan.game))?;
        let result = self.play(id, plan);
        let ended = self.registry.end_session(id);
        if let Err(err) = &ended {
            debug!("session {id} could not be ended: {err}");
        }
        result
    }

    fn play(&mut self, id: SessionId, plan: &SimulationPlan) -> Result<SimulationSummary> {
        let cfg = self.registry.config().clone();
        let mut state = self.registry.state(id)?;
        // The session seed is canonical, so reporting it replays the run.
        let seed = state.seed;
        let mut bot = Bot::new(plan.strategy, seed);
        let mut hasher = XxHash64::with_seed(0);
        hash_state(&mut hasher, &state)?;

        let mut moves = Vec::new();
        let mut violations = check_state(&cfg, 0, &state);
        let mut steps = 0;
        let mut stopped = false;

        while steps < plan.max_steps {
            let next = bot.next_move(&self.registry, &state);
            if next == BotMove::Stop {
                stopped = true;
                break;
            }
            steps += 1;
            trace!("{} step {steps}: {next:?}", plan.name());
            match apply_move(&mut self.registry, id, &next) {
                Ok(after) => {
                    violations.extend(check_transition(&cfg, steps, &state, &after));
                    hash_state(&mut hasher, &after)?;
                    state = after;
                }
                Err(err) => {
                    violations.push(InvariantViolation::Rejected {
                        step: steps,
                        action: format!("{next:?}"),
                        reason: err.to_string(),
                    });
                    moves.push(next);
                    break;
                }
            }
            moves.push(next);
        }

        let finished = stopped && is_complete(&cfg, &state);
        let outcome = match plan.game {
            GameKind::Trivia => None,
            _ if finished => self.registry.get_outcome(id).ok(),
            _ => None,
        };
        let grade = match &state.game {
            GameState::Trivia(trivia) => match &trivia.phase {
                TriviaPhase::Finished { grade } => Some(grade.clone()),
                _ => None,
            },
            _ => None,
        };

        debug!(
            "{} seed {seed}: {steps} steps, finished {finished}, {} violations",
            plan.name(),
            violations.len()
        );

        Ok(SimulationSummary {
            game: plan.game,
            strategy: plan.strategy,
            seed,
            share_code: state.share_code.clone(),
            steps,
            finished,
            share_text: share_text(&state),
            final_state: state,
            outcome,
            grade,
            transcript_hash: hasher.finish(),
            moves,
            violations,
        })
    }
}

fn hash_state(hasher: &mut XxHash64, state: &SessionState) -> Result<()> {
    let json = serde_json::to_string(state)?;
    hasher.write(json.as_bytes());
    Ok(())
}

fn apply_move(
    registry: &mut SessionRegistry,
    id: SessionId,
    next: &BotMove,
) -> Result<SessionState, GameError> {
    match next {
        BotMove::Choose { choice } => registry.apply_choice(id, choice),
        BotMove::Enact { policy } => registry.enact_policy(id, policy),
        BotMove::EndTurn => registry.end_turn(id),
        BotMove::Resolve { option } => registry.resolve_event(id, option),
        BotMove::Answer { option } => registry.answer(id, *option),
        BotMove::Tick => registry.tick(id),
        BotMove::NextQuestion => registry.next_question(id),
        BotMove::Place { building, x, y } => registry.place_building(id, building, *x, *y),
        BotMove::Remove { x, y } => registry.remove_building(id, *x, *y),
        BotMove::Stop => registry.state(id),
    }
}

/// Whether the session reached its natural end. Map sessions end whenever the bot stops.
fn is_complete(cfg: &GameConfig, state: &SessionState) -> bool {
    match &state.game {
        GameState::Decide(walk) => {
            matches!(walk.phase, WalkPhase::Terminal { .. })
                && cfg.decide.expected_depth.is_none_or(|depth| walk.step == depth)
        }
        GameState::Strategy(strategy) => {
            matches!(strategy.phase, StrategyPhase::Finished { .. })
                && strategy.turn == strategy.horizon + 1
        }
        GameState::Trivia(trivia) => {
            matches!(trivia.phase, TriviaPhase::Finished { .. })
                && trivia.history.len() == trivia.total
        }
        GameState::MapBuilder(_) => true,
    }
}

fn stat_violations(step: usize, stats: &StatVector) -> Vec<InvariantViolation> {
    stats
        .iter()
        .filter(|(_, value)| !(0..=100).contains(value))
        .map(|(axis, value)| InvariantViolation::StatOutOfBounds {
            step,
            axis: axis.as_str().to_string(),
            value,
        })
        .collect()
}

fn budget_violation(step: usize, budget: i64) -> Option<InvariantViolation> {
    (budget < 0).then_some(InvariantViolation::NegativeBudget { step, budget })
}

/// Checks that hold for any single snapshot.
#[must_use]
pub fn check_state(cfg: &GameConfig, step: usize, state: &SessionState) -> Vec<InvariantViolation> {
    let mut found = Vec::new();
    match &state.game {
        GameState::Decide(walk) => {
            found.extend(stat_violations(step, &walk.stats));
            if let Some(expected) = cfg.decide.expected_depth
                && walk.step > expected
            {
                found.push(InvariantViolation::WalkTooLong {
                    step,
                    taken: walk.step,
                    expected,
                });
            }
        }
        GameState::Strategy(strategy) => {
            found.extend(stat_violations(step, &strategy.stats));
            found.extend(budget_violation(step, strategy.budget));
            if strategy.turn > strategy.horizon + 1 {
                found.push(InvariantViolation::TurnPastHorizon {
                    step,
                    turn: strategy.turn,
                    horizon: strategy.horizon,
                });
            }
        }
        GameState::Trivia(trivia) => {
            if trivia.history.len() > trivia.total {
                found.push(InvariantViolation::TooManyAnswers {
                    step,
                    answered: trivia.history.len(),
                    total: trivia.total,
                });
            }
        }
        GameState::MapBuilder(map) => {
            found.extend(stat_violations(step, &map.stats));
            found.extend(budget_violation(step, map.budget));
            for (i, p) in map.placements.iter().enumerate() {
                let off_grid = p.x >= map.width || p.y >= map.height;
                let shared = map.placements[..i]
                    .iter()
                    .any(|other| other.x == p.x && other.y == p.y);
                if off_grid || shared {
                    found.push(InvariantViolation::BadPlacement { step, x: p.x, y: p.y });
                }
            }
        }
    }
    found
}

/// Snapshot checks plus the ones comparing a state with its predecessor.
#[must_use]
pub fn check_transition(
    cfg: &GameConfig,
    step: usize,
    before: &SessionState,
    after: &SessionState,
) -> Vec<InvariantViolation> {
    let mut found = check_state(cfg, step, after);
    match (&before.game, &after.game) {
        (GameState::Strategy(a), GameState::Strategy(b)) if b.turn < a.turn => {
            found.push(InvariantViolation::TurnRegressed {
                step,
                before: a.turn,
                after: b.turn,
            });
        }
        (GameState::Trivia(a), GameState::Trivia(b)) if b.score < a.score => {
            found.push(InvariantViolation::ScoreDropped {
                step,
                before: a.score,
                after: b.score,
            });
        }
        _ => {}
    }
    found
}
