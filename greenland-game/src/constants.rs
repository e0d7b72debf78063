//! Centralized balance and tuning constants for the Greenland game engines.
//!
//! Every `Default` configuration is sourced from here so that gameplay can
//! only be retuned through reviewed code changes.

// Stat bounds --------------------------------------------------------------
pub const STAT_MIN: i32 = 0;
pub const STAT_MAX: i32 = 100;
pub const STAT_BASELINE: i32 = 50;

// Decision tree ------------------------------------------------------------
pub(crate) const DECIDE_EXPECTED_DEPTH: usize = 5;

// Policy simulator ---------------------------------------------------------
pub(crate) const STRATEGY_HORIZON: u32 = 10;
pub(crate) const STRATEGY_EVENT_CHANCE: f64 = 0.6;
pub(crate) const STRATEGY_STARTING_BUDGET: i64 = 500;
pub(crate) const STRATEGY_INCOME_PER_ECONOMY_POINT: i64 = 2;
pub(crate) const STRATEGY_PASSIVE_ENVIRONMENT_DECAY: i32 = -2;
pub(crate) const ACHIEVEMENT_AXIS_THRESHOLD: i32 = 80;
pub(crate) const ACHIEVEMENT_BALANCED_FLOOR: i32 = 60;
pub(crate) const ACHIEVEMENT_POLICY_COUNT: usize = 5;
pub(crate) const ACHIEVEMENT_BUDGET_TARGET: i64 = 1_000;

// Trivia -------------------------------------------------------------------
pub(crate) const TRIVIA_QUESTIONS_PER_ROUND: usize = 10;
pub(crate) const TRIVIA_SECONDS_PER_QUESTION: u32 = 15;
pub(crate) const TRIVIA_TIME_BONUS_PER_SECOND: u32 = 5;
pub(crate) const TRIVIA_STREAK_STEP_PCT: u32 = 10;
pub(crate) const TRIVIA_STREAK_CAP: u32 = 5;
pub(crate) const TRIVIA_GRADE_LADDER: [(usize, &str); 5] =
    [(9, "A+"), (8, "A"), (7, "B"), (6, "C"), (5, "D")];
pub(crate) const TRIVIA_FAILING_GRADE: &str = "F";

// Map builder --------------------------------------------------------------
pub(crate) const MAP_STARTING_BUDGET: i64 = 1_000;
pub(crate) const MAP_REFUND_PCT: u32 = 50;
pub(crate) const MAP_GRID_WIDTH: u32 = 8;
pub(crate) const MAP_GRID_HEIGHT: u32 = 6;

// Outcome classification ---------------------------------------------------
pub(crate) const OUTCOME_DOMINANT_THRESHOLD: i32 = 60;
pub(crate) const OUTCOME_DEPENDENCY_THRESHOLD: i32 = 30;
