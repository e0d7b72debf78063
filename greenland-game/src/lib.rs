//! Greenland Game Engines
//!
//! Platform-agnostic core logic for the "Greenland: The Untold Story" mini-games:
//! a branching decision walk, a turn-based policy simulator, a timed trivia
//! quiz and a map builder. Nothing here renders or performs I/O; a
//! presentation layer drives sessions through [`SessionRegistry`].

pub mod catalog;
pub mod config;
pub mod constants;
pub mod decide;
pub mod error;
pub mod map_builder;
pub mod numbers;
pub mod outcome;
pub mod rng;
pub mod session;
pub mod share;
pub mod stats;
pub mod strategy;
pub mod trivia;

// Re-export commonly used types
pub use catalog::{ContentCatalog, EmbeddedCatalog};
pub use config::GameConfig;
pub use decide::{
    Choice, ChoiceRecord, DecideConfig, DecideGame, DecideState, DecisionNode, ScenarioGraph,
    WalkPhase, WalkStep,
};
pub use error::{CatalogError, GameError, ShareCodeError};
pub use map_builder::{Building, MapBuilder, MapConfig, MapState, Placement};
pub use outcome::{
    Achievement, AchievementRule, Condition, Outcome, OutcomeRule, OutcomeRules, Scorecard,
    award_achievements, default_achievements,
};
pub use rng::{CountingRng, SessionRng};
pub use session::{GameKind, GameState, SessionConfig, SessionId, SessionRegistry, SessionState};
pub use share::{ShareCode, share_text};
pub use stats::{Axis, AxisSet, Effect, StatVector, apply_budget};
pub use strategy::{
    EventOption, Policy, RandomEvent, StrategyConfig, StrategyGame, StrategyPhase, StrategyState,
    TurnLogEntry, TurnOutcome,
};
pub use trivia::{
    AnswerRecord, Question, Tick, TriviaConfig, TriviaPhase, TriviaRound, TriviaState, grade_for,
    score_answer,
};

/// Source of content and tuning for a [`SessionRegistry`].
/// Platform-specific implementations should provide this
pub trait CatalogLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the content catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read or parsed.
    fn load_catalog(&self) -> Result<ContentCatalog, Self::Error>;

    /// Load engine tuning.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be read or parsed.
    fn load_config(&self) -> Result<GameConfig, Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct JsonLoader {
        catalog: &'static str,
        config: &'static str,
        loads: Cell<u32>,
    }

    impl CatalogLoader for JsonLoader {
        type Error = CatalogError;

        fn load_catalog(&self) -> Result<ContentCatalog, Self::Error> {
            self.loads.set(self.loads.get() + 1);
            ContentCatalog::from_json(self.catalog)
        }

        fn load_config(&self) -> Result<GameConfig, Self::Error> {
            self.loads.set(self.loads.get() + 1);
            GameConfig::from_json(self.config)
        }
    }

    const TINY_CATALOG: &str = r#"{
        "scenario": {"root": "only", "nodes": [
            {"id": "only", "prompt": "Pick one", "choices": [
                {"id": "sovereign", "label": "Go it alone",
                    "effect": {"stats": {"sovereignty": 30}}},
                {"id": "stay", "label": "Stay put"}
            ]}
        ]},
        "questions": [
            {"id": "q", "prompt": "Capital?", "options": ["Nuuk", "Oslo"], "correct": 0}
        ]
    }"#;

    #[test]
    fn registry_from_custom_loader() {
        let loader = JsonLoader {
            catalog: TINY_CATALOG,
            config: r#"{"decide": {"expected_depth": 1}}"#,
            loads: Cell::new(0),
        };
        let mut registry = SessionRegistry::from_loader(&loader).unwrap();
        assert_eq!(loader.loads.get(), 2);

        let id = registry
            .start_session(SessionConfig::new(GameKind::Decide).with_seed(1))
            .unwrap();
        registry.apply_choice(id, "sovereign").unwrap();
        assert_eq!(registry.get_outcome(id).unwrap().id, "sovereign-nation");
    }

    #[test]
    fn loader_errors_surface() {
        let loader = JsonLoader {
            catalog: "{",
            config: "{}",
            loads: Cell::new(0),
        };
        let err = SessionRegistry::from_loader(&loader).unwrap_err();
        assert!(err.to_string().contains("catalog JSON"));
    }

    #[test]
    fn embedded_loader_builds_registry() {
        let registry = SessionRegistry::from_loader(&EmbeddedCatalog).unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.policies().len(), 8);
    }
}
