//! Read-only content shared by every session, plus load-time validation.
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::CatalogLoader;
use crate::config::GameConfig;
use crate::decide::ScenarioGraph;
use crate::error::CatalogError;
use crate::map_builder::Building;
use crate::strategy::{Policy, RandomEvent};
use crate::trivia::Question;

const DEFAULT_SCENARIO: &str = include_str!("../assets/data/scenario.json");
const DEFAULT_POLICIES: &str = include_str!("../assets/data/policies.json");
const DEFAULT_EVENTS: &str = include_str!("../assets/data/events.json");
const DEFAULT_QUESTIONS: &str = include_str!("../assets/data/trivia.json");
const DEFAULT_BUILDINGS: &str = include_str!("../assets/data/buildings.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCatalog {
    pub scenario: ScenarioGraph,
    #[serde(default)]
    pub policies: Vec<Policy>,
    #[serde(default)]
    pub events: Vec<RandomEvent>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub buildings: Vec<Building>,
}

impl ContentCatalog {
    /// Parse a single catalog document. The scenario graph is validated while parsing.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] when the JSON is malformed or the scenario graph is invalid.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(json)?)
    }

    /// The catalog bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Json`] if an embedded asset fails to parse.
    pub fn load_default() -> Result<Self, CatalogError> {
        Ok(Self {
            scenario: serde_json::from_str(DEFAULT_SCENARIO)?,
            policies: serde_json::from_str(DEFAULT_POLICIES)?,
            events: serde_json::from_str(DEFAULT_EVENTS)?,
            questions: serde_json::from_str(DEFAULT_QUESTIONS)?,
            buildings: serde_json::from_str(DEFAULT_BUILDINGS)?,
        })
    }

    /// Check the catalog against the configuration it will be played with.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: duplicate ids, negative costs, events
    /// without options, malformed questions, an empty question bank, scenario
    /// paths of the wrong length, or outcome rules that could fail to match.
    pub fn validate(&self, cfg: &GameConfig) -> Result<(), CatalogError> {
        if let Some(expected) = cfg.decide.expected_depth {
            self.scenario.validate_depth(expected)?;
        }
        cfg.outcomes.validate()?;

        unique_ids("policy", self.policies.iter().map(|p| p.id.as_str()))?;
        for policy in &self.policies {
            non_negative("policy", &policy.id, policy.cost)?;
        }

        unique_ids("event", self.events.iter().map(|e| e.id.as_str()))?;
        for event in &self.events {
            if event.options.is_empty() {
                return Err(CatalogError::EmptyOptions(event.id.clone()));
            }
            unique_ids("event option", event.options.iter().map(|o| o.id.as_str()))?;
        }

        if self.questions.is_empty() {
            return Err(CatalogError::EmptyQuestionBank);
        }
        unique_ids("question", self.questions.iter().map(|q| q.id.as_str()))?;
        if let Some(bad) = self
            .questions
            .iter()
            .find(|q| q.options.len() < 2 || q.correct >= q.options.len())
        {
            return Err(CatalogError::InvalidQuestion {
                id: bad.id.clone(),
                correct: bad.correct,
                options: bad.options.len(),
            });
        }

        unique_ids("building", self.buildings.iter().map(|b| b.id.as_str()))?;
        for building in &self.buildings {
            non_negative("building", &building.id, building.cost)?;
        }

        debug!(
            "catalog: {} nodes, {} policies, {} events, {} questions, {} buildings",
            self.scenario.len(),
            self.policies.len(),
            self.events.len(),
            self.questions.len(),
            self.buildings.len()
        );
        Ok(())
    }
}

fn unique_ids<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateId {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

fn non_negative(kind: &'static str, id: &str, cost: i64) -> Result<(), CatalogError> {
    if cost < 0 {
        return Err(CatalogError::NegativeCost {
            kind,
            id: id.to_string(),
            cost,
        });
    }
    Ok(())
}

/// Loader for the catalog and configuration compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedCatalog;

impl CatalogLoader for EmbeddedCatalog {
    type Error = CatalogError;

    fn load_catalog(&self) -> Result<ContentCatalog, Self::Error> {
        ContentCatalog::load_default()
    }

    fn load_config(&self) -> Result<GameConfig, Self::Error> {
        Ok(GameConfig::default())
    }
}
