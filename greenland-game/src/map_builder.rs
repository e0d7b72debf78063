//! Grid placement with budget accounting.
//!
//! Stats are recomputed from the placement list in order, so removing a
//! building reverses its contribution.
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::constants::{MAP_GRID_HEIGHT, MAP_GRID_WIDTH, MAP_REFUND_PCT, MAP_STARTING_BUDGET};
use crate::error::GameError;
use crate::numbers::pct_of;
use crate::outcome::{Outcome, OutcomeRules};
use crate::stats::{Effect, StatVector, apply_budget};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub cost: i64,
    #[serde(default)]
    pub effect: Effect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub width: u32,
    pub height: u32,
    pub starting_budget: i64,
    pub refund_pct: u32,
    pub baseline: StatVector,
}

impl MapConfig {
    /// Clamp the baseline into the stat range and cap refunds at the full cost.
    pub fn sanitize(&mut self) {
        self.starting_budget = self.starting_budget.max(0);
        self.refund_pct = self.refund_pct.min(100);
        self.baseline.clamp();
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: MAP_GRID_WIDTH,
            height: MAP_GRID_HEIGHT,
            starting_budget: MAP_STARTING_BUDGET,
            refund_pct: MAP_REFUND_PCT,
            baseline: StatVector::baseline(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub building: String,
    pub x: u32,
    pub y: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapState {
    pub width: u32,
    pub height: u32,
    pub budget: i64,
    pub stats: StatVector,
    pub placements: Vec<Placement>,
}

#[derive(Debug, Clone)]
pub struct MapBuilder {
    buildings: Arc<Vec<Building>>,
    cfg: MapConfig,
    budget: i64,
    placements: Vec<Placement>,
}

impl MapBuilder {
    #[must_use]
    pub fn new(buildings: Arc<Vec<Building>>, cfg: &MapConfig) -> Self {
        let mut cfg = cfg.clone();
        cfg.sanitize();
        Self {
            buildings,
            budget: cfg.starting_budget,
            cfg,
            placements: Vec::new(),
        }
    }

    #[must_use]
    pub fn building(&self, building_id: &str) -> Option<&Building> {
        self.buildings.iter().find(|b| b.id == building_id)
    }

    #[must_use]
    pub fn occupant(&self, x: u32, y: u32) -> Option<&Placement> {
        self.placements.iter().find(|p| p.x == x && p.y == y)
    }

    fn check_bounds(&self, x: u32, y: u32) -> Result<(), GameError> {
        if x >= self.cfg.width || y >= self.cfg.height {
            return Err(GameError::OutOfBounds {
                x,
                y,
                width: self.cfg.width,
                height: self.cfg.height,
            });
        }
        Ok(())
    }

    /// Build on an empty cell.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`], [`GameError::CellOccupied`],
    /// [`GameError::UnknownId`] or [`GameError::Unaffordable`].
    pub fn place(&mut self, building_id: &str, x: u32, y: u32) -> Result<(), GameError> {
        self.check_bounds(x, y)?;
        if self.occupant(x, y).is_some() {
            return Err(GameError::CellOccupied { x, y });
        }
        let building = self
            .building(building_id)
            .ok_or_else(|| GameError::unknown("building", building_id))?;
        if self.budget < building.cost {
            return Err(GameError::Unaffordable {
                id: building.id.clone(),
                cost: building.cost,
                budget: self.budget,
            });
        }
        let cost = building.cost;
        let delta = building.effect.budget;
        let id = building.id.clone();

        self.budget = apply_budget(self.budget - cost, delta);
        debug!("map: placed `{id}` at ({x}, {y}), budget {}", self.budget);
        self.placements.push(Placement { building: id, x, y });
        Ok(())
    }

    /// Demolish the building on a cell and return the refund paid.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::OutOfBounds`] or [`GameError::InvalidTransition`] for an empty cell.
    pub fn remove(&mut self, x: u32, y: u32) -> Result<i64, GameError> {
        self.check_bounds(x, y)?;
        let position = self
            .placements
            .iter()
            .position(|p| p.x == x && p.y == y)
            .ok_or(GameError::InvalidTransition {
                action: "remove a building",
                phase: "the cell is empty",
            })?;
        let placement = self.placements.remove(position);
        let refund = self
            .building(&placement.building)
            .map_or(0, |b| pct_of(b.cost, self.cfg.refund_pct));
        self.budget = apply_budget(self.budget, refund);
        debug!(
            "map: removed `{}` at ({x}, {y}), refunded {refund}",
            placement.building
        );
        Ok(refund)
    }

    /// Baseline with every placed building applied in placement order.
    #[must_use]
    pub fn stats(&self) -> StatVector {
        self.placements
            .iter()
            .filter_map(|p| self.building(&p.building))
            .fold(self.cfg.baseline, |stats, b| stats.apply(&b.effect))
    }

    #[must_use]
    pub fn assess(&self, rules: &OutcomeRules) -> Outcome {
        rules.classify(&self.stats())
    }

    pub fn clear(&mut self) {
        self.placements.clear();
        self.budget = self.cfg.starting_budget;
    }

    #[must_use]
    pub const fn budget(&self) -> i64 {
        self.budget
    }

    #[must_use]
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    #[must_use]
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    #[must_use]
    pub const fn config(&self) -> &MapConfig {
        &self.cfg
    }

    #[must_use]
    pub fn snapshot(&self) -> MapState {
        MapState {
            width: self.cfg.width,
            height: self.cfg.height,
            budget: self.budget,
            stats: self.stats(),
            placements: self.placements.clone(),
        }
    }
}
