//! Stat accumulation: bounded national-condition axes and the effects that move them.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::constants::{STAT_BASELINE, STAT_MAX, STAT_MIN};

/// Named stat axis. Declaration order is the fixed tie-break priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Sovereignty,
    Economy,
    Environment,
    #[serde(alias = "happiness")]
    Culture,
}

/// Small inline set of axes, used for ties at the maximum.
pub type AxisSet = SmallVec<[Axis; 4]>;

impl Axis {
    pub const ALL: [Self; 4] = [
        Self::Sovereignty,
        Self::Economy,
        Self::Environment,
        Self::Culture,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sovereignty => "sovereignty",
            Self::Economy => "economy",
            Self::Environment => "environment",
            Self::Culture => "culture",
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sovereignty => "Sovereignty",
            Self::Economy => "Economy",
            Self::Environment => "Environment",
            Self::Culture => "Culture",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sovereignty" => Ok(Self::Sovereignty),
            "economy" => Ok(Self::Economy),
            "environment" => Ok(Self::Environment),
            "culture" | "happiness" => Ok(Self::Culture),
            _ => Err(()),
        }
    }
}

/// Signed per-axis deltas plus an optional budget delta, applied atomically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Effect {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub stats: BTreeMap<Axis, i32>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub budget: i64,
}

#[allow(clippy::trivially_copy_pass_by_ref)]
const fn is_zero(value: &i64) -> bool {
    *value == 0
}

impl Effect {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper adding a delta for one axis.
    #[must_use]
    pub fn with(mut self, axis: Axis, delta: i32) -> Self {
        let entry = self.stats.entry(axis).or_insert(0);
        *entry = entry.saturating_add(delta);
        self
    }

    #[must_use]
    pub fn with_budget(mut self, delta: i64) -> Self {
        self.budget = delta;
        self
    }

    #[must_use]
    pub fn delta(&self, axis: Axis) -> Option<i32> {
        self.stats.get(&axis).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty() && self.budget == 0
    }

    /// Sum two effects axis by axis.
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        let mut merged = self.clone();
        for (&axis, &delta) in &other.stats {
            merged = merged.with(axis, delta);
        }
        merged.budget = merged.budget.saturating_add(other.budget);
        merged
    }
}

/// Bounded 0..=100 score per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatVector {
    pub sovereignty: i32,
    pub economy: i32,
    pub environment: i32,
    pub culture: i32,
}

impl Default for StatVector {
    fn default() -> Self {
        Self::baseline()
    }
}

impl StatVector {
    /// Every axis at the fixed starting baseline.
    #[must_use]
    pub const fn baseline() -> Self {
        Self::uniform(STAT_BASELINE)
    }

    #[must_use]
    pub const fn uniform(value: i32) -> Self {
        Self {
            sovereignty: value,
            economy: value,
            environment: value,
            culture: value,
        }
    }

    #[must_use]
    pub const fn get(&self, axis: Axis) -> i32 {
        match axis {
            Axis::Sovereignty => self.sovereignty,
            Axis::Economy => self.economy,
            Axis::Environment => self.environment,
            Axis::Culture => self.culture,
        }
    }

    const fn slot_mut(&mut self, axis: Axis) -> &mut i32 {
        match axis {
            Axis::Sovereignty => &mut self.sovereignty,
            Axis::Economy => &mut self.economy,
            Axis::Environment => &mut self.environment,
            Axis::Culture => &mut self.culture,
        }
    }

    /// Set one axis, clamped into range.
    pub const fn set(&mut self, axis: Axis, value: i32) {
        *self.slot_mut(axis) = clamp_stat(value);
    }

    /// Clamp every axis into `[STAT_MIN, STAT_MAX]`.
    pub const fn clamp(&mut self) {
        self.sovereignty = clamp_stat(self.sovereignty);
        self.economy = clamp_stat(self.economy);
        self.environment = clamp_stat(self.environment);
        self.culture = clamp_stat(self.culture);
    }

    /// Apply an effect: each present axis is added then clamped, absent axes are untouched.
    #[must_use]
    pub fn apply(&self, effect: &Effect) -> Self {
        let mut next = *self;
        next.apply_in_place(effect);
        next
    }

    pub fn apply_in_place(&mut self, effect: &Effect) {
        for (&axis, &delta) in &effect.stats {
            let slot = self.slot_mut(axis);
            *slot = clamp_stat(slot.saturating_add(delta));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Axis, i32)> + '_ {
        Axis::ALL.iter().map(move |&axis| (axis, self.get(axis)))
    }

    #[must_use]
    pub fn max_value(&self) -> i32 {
        self.iter().map(|(_, v)| v).max().unwrap_or(STAT_MIN)
    }

    /// Whether `axis` holds the maximum value (ties count).
    #[must_use]
    pub fn is_max(&self, axis: Axis) -> bool {
        self.get(axis) >= self.max_value()
    }

    /// First maximal axis in priority order.
    #[must_use]
    pub fn dominant(&self) -> Axis {
        let max = self.max_value();
        Axis::ALL
            .into_iter()
            .find(|&axis| self.get(axis) == max)
            .unwrap_or(Axis::Sovereignty)
    }

    #[must_use]
    pub fn dominant_axes(&self) -> AxisSet {
        let max = self.max_value();
        Axis::ALL
            .into_iter()
            .filter(|&axis| self.get(axis) == max)
            .collect()
    }

    #[must_use]
    pub fn min_value(&self) -> i32 {
        self.iter().map(|(_, v)| v).min().unwrap_or(STAT_MIN)
    }

    #[must_use]
    pub fn total(&self) -> i32 {
        self.iter().map(|(_, v)| v).sum()
    }

    #[must_use]
    pub fn is_within_bounds(&self) -> bool {
        self.iter().all(|(_, v)| (STAT_MIN..=STAT_MAX).contains(&v))
    }
}

const fn clamp_stat(value: i32) -> i32 {
    if value < STAT_MIN {
        STAT_MIN
    } else if value > STAT_MAX {
        STAT_MAX
    } else {
        value
    }
}

/// Add a budget delta, flooring at zero. Budgets are never capped.
#[must_use]
pub const fn apply_budget(budget: i64, delta: i64) -> i64 {
    let next = budget.saturating_add(delta);
    if next < 0 { 0 } else { next }
}
