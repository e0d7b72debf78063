//! Aggregate tuning for every engine.
use serde::{Deserialize, Serialize};

use crate::decide::DecideConfig;
use crate::error::CatalogError;
use crate::map_builder::MapConfig;
use crate::outcome::OutcomeRules;
use crate::strategy::StrategyConfig;
use crate::trivia::TriviaConfig;

/// Tuning shared by every session in a registry. Missing sections fall back to defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub decide: DecideConfig,
    /// Includes the achievement rules awarded when a strategy session finishes.
    pub strategy: StrategyConfig,
    pub trivia: TriviaConfig,
    pub map: MapConfig,
    pub outcomes: OutcomeRules,
}

impl GameConfig {
    /// Parse a (possibly partial) configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Json`] for malformed JSON or
    /// [`CatalogError::NonExhaustiveOutcomes`] for an outcome list that could fail to match.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let mut cfg: Self = serde_json::from_str(json)?;
        cfg.outcomes.validate()?;
        cfg.decide.sanitize();
        cfg.strategy.sanitize();
        cfg.map.sanitize();
        Ok(cfg)
    }
}
