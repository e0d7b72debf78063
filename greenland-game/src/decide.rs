//! "Decide Greenland's Future": a branching scenario graph walked one choice at a time.
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use crate::constants::DECIDE_EXPECTED_DEPTH;
use crate::error::{CatalogError, GameError};
use crate::outcome::{Outcome, OutcomeRules};
use crate::stats::{Effect, StatVector};

/// A selectable answer on a decision node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub effect: Effect,
    /// Next node id; `None` ends the walk.
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionNode {
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub prompt: String,
    pub choices: Vec<Choice>,
}

impl DecisionNode {
    #[must_use]
    pub fn choice(&self, choice_id: &str) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.id == choice_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScenarioData {
    root: String,
    nodes: Vec<DecisionNode>,
}

/// Validated directed acyclic graph of decision nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScenarioData", into = "ScenarioData")]
pub struct ScenarioGraph {
    root: String,
    nodes: BTreeMap<String, DecisionNode>,
    order: Vec<String>,
}

impl TryFrom<ScenarioData> for ScenarioGraph {
    type Error = CatalogError;

    fn try_from(data: ScenarioData) -> Result<Self, Self::Error> {
        Self::new(data.root, data.nodes)
    }
}

impl From<ScenarioGraph> for ScenarioData {
    fn from(graph: ScenarioGraph) -> Self {
        let ScenarioGraph {
            root,
            mut nodes,
            order,
        } = graph;
        let nodes = order.iter().filter_map(|id| nodes.remove(id)).collect();
        Self { root, nodes }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Open,
    Closed,
}

impl ScenarioGraph {
    /// Build and validate a graph.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate ids, a missing root, nodes without choices,
    /// dangling `next` pointers, cycles, or nodes unreachable from the root.
    pub fn new(root: impl Into<String>, nodes: Vec<DecisionNode>) -> Result<Self, CatalogError> {
        let root = root.into();
        let mut map = BTreeMap::new();
        let mut order = Vec::with_capacity(nodes.len());
        for node in nodes {
            if node.choices.is_empty() {
                return Err(CatalogError::EmptyChoices(node.id));
            }
            let mut seen_choices = BTreeSet::new();
            for choice in &node.choices {
                if !seen_choices.insert(choice.id.as_str()) {
                    return Err(CatalogError::DuplicateId {
                        kind: "choice",
                        id: format!("{}/{}", node.id, choice.id),
                    });
                }
            }
            if map.contains_key(&node.id) {
                return Err(CatalogError::DuplicateId {
                    kind: "scenario node",
                    id: node.id,
                });
            }
            order.push(node.id.clone());
            map.insert(node.id.clone(), node);
        }
        if !map.contains_key(&root) {
            return Err(CatalogError::MissingRoot(root));
        }
        for node in map.values() {
            for choice in &node.choices {
                if let Some(target) = &choice.next
                    && !map.contains_key(target)
                {
                    return Err(CatalogError::DanglingNext {
                        node: node.id.clone(),
                        choice: choice.id.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        let graph = Self {
            root,
            nodes: map,
            order,
        };
        let orphan = {
            let mut visits = HashMap::new();
            graph.check_acyclic(&graph.root, &mut visits)?;
            graph
                .order
                .iter()
                .find(|id| !visits.contains_key(id.as_str()))
                .cloned()
        };
        match orphan {
            Some(orphan) => Err(CatalogError::Unreachable(orphan)),
            None => Ok(graph),
        }
    }

    fn check_acyclic<'a>(
        &'a self,
        id: &'a str,
        visits: &mut HashMap<&'a str, Visit>,
    ) -> Result<(), CatalogError> {
        match visits.get(id) {
            Some(Visit::Closed) => return Ok(()),
            Some(Visit::Open) => return Err(CatalogError::Cycle(id.to_string())),
            None => {}
        }
        visits.insert(id, Visit::Open);
        if let Some(node) = self.nodes.get(id) {
            for target in node.choices.iter().filter_map(|c| c.next.as_deref()) {
                self.check_acyclic(target, visits)?;
            }
        }
        visits.insert(id, Visit::Closed);
        Ok(())
    }

    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    #[must_use]
    pub fn node(&self, id: &str) -> Option<&DecisionNode> {
        self.nodes.get(id)
    }

    /// Nodes in their declared order.
    pub fn nodes(&self) -> impl Iterator<Item = &DecisionNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Shortest and longest number of choices from the root to the end of a walk.
    #[must_use]
    pub fn depth_range(&self) -> (usize, usize) {
        let mut memo = HashMap::new();
        self.span(&self.root, &mut memo)
    }

    fn span<'a>(
        &'a self,
        id: &'a str,
        memo: &mut HashMap<&'a str, (usize, usize)>,
    ) -> (usize, usize) {
        if let Some(&cached) = memo.get(id) {
            return cached;
        }
        let mut range: Option<(usize, usize)> = None;
        if let Some(node) = self.nodes.get(id) {
            for choice in &node.choices {
                let (lo, hi) = match choice.next.as_deref() {
                    Some(next) => {
                        let (lo, hi) = self.span(next, memo);
                        (lo + 1, hi + 1)
                    }
                    None => (1, 1),
                };
                range = Some(range.map_or((lo, hi), |(a, b)| (a.min(lo), b.max(hi))));
            }
        }
        let range = range.unwrap_or((0, 0));
        memo.insert(id, range);
        range
    }

    /// Require every walk to take exactly `expected` choices.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnexpectedDepth`] when any path is shorter or longer.
    pub fn validate_depth(&self, expected: usize) -> Result<(), CatalogError> {
        let (min, max) = self.depth_range();
        if min == expected && max == expected {
            Ok(())
        } else {
            Err(CatalogError::UnexpectedDepth { min, max, expected })
        }
    }
}

/// Tuning for the decision-tree game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecideConfig {
    #[serde(default)]
    pub baseline: StatVector,
    /// When set, load-time validation requires every path to have this many choices.
    #[serde(default = "DecideConfig::default_expected_depth")]
    pub expected_depth: Option<usize>,
}

impl DecideConfig {
    /// Pull a hand-edited baseline back into the stat range.
    pub const fn sanitize(&mut self) {
        self.baseline.clamp();
    }

    #[allow(clippy::unnecessary_wraps)]
    const fn default_expected_depth() -> Option<usize> {
        Some(DECIDE_EXPECTED_DEPTH)
    }
}

impl Default for DecideConfig {
    fn default() -> Self {
        Self {
            baseline: StatVector::baseline(),
            expected_depth: Self::default_expected_depth(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum WalkPhase {
    Idle,
    InProgress { node: String },
    Terminal { outcome: Outcome },
}

impl WalkPhase {
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::InProgress { .. } => "in progress",
            Self::Terminal { .. } => "terminal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    pub node: String,
    pub choice: String,
    pub stats_after: StatVector,
}

/// Result of completing a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkStep {
    Moved { node: String },
    Finished(Outcome),
}

/// Serializable view of a walk for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecideState {
    #[serde(flatten)]
    pub phase: WalkPhase,
    pub stats: StatVector,
    pub step: usize,
    pub locked: bool,
    pub history: Vec<ChoiceRecord>,
}

/// One play-through of the scenario graph.
#[derive(Debug, Clone)]
pub struct DecideGame {
    graph: Arc<ScenarioGraph>,
    rules: Arc<OutcomeRules>,
    baseline: StatVector,
    stats: StatVector,
    phase: WalkPhase,
    pending: Option<String>,
    history: Vec<ChoiceRecord>,
}

impl DecideGame {
    #[must_use]
    pub fn new(graph: Arc<ScenarioGraph>, rules: Arc<OutcomeRules>, cfg: &DecideConfig) -> Self {
        let mut baseline = cfg.baseline;
        baseline.clamp();
        Self {
            graph,
            rules,
            baseline,
            stats: baseline,
            phase: WalkPhase::Idle,
            pending: None,
            history: Vec::new(),
        }
    }

    /// Enter the root node with baseline stats.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidTransition`] unless the walk is idle.
    pub fn start(&mut self) -> Result<(), GameError> {
        if self.phase != WalkPhase::Idle {
            return Err(self.invalid("start"));
        }
        self.stats = self.baseline;
        self.phase = WalkPhase::InProgress {
            node: self.graph.root().to_string(),
        };
        Ok(())
    }

    /// Lock in a choice on the current node; effects apply on [`Self::complete_transition`].
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Locked`] while a previous choice is pending,
    /// [`GameError::InvalidTransition`] outside a walk, or
    /// [`GameError::UnknownId`] for a choice the node does not offer.
    pub fn select_choice(&mut self, choice_id: &str) -> Result<(), GameError> {
        if self.pending.is_some() {
            debug!("decide: ignoring `{choice_id}` while a transition is in progress");
            return Err(GameError::Locked);
        }
        let node = self.current_node().ok_or_else(|| self.invalid("choose"))?;
        if node.choice(choice_id).is_none() {
            return Err(GameError::unknown("choice", choice_id));
        }
        self.pending = Some(choice_id.to_string());
        Ok(())
    }

    /// Apply the pending choice and move along its edge.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidTransition`] when no choice is pending.
    pub fn complete_transition(&mut self) -> Result<WalkStep, GameError> {
        let Some(choice_id) = self.pending.clone() else {
            return Err(self.invalid("complete a transition"));
        };
        let graph = Arc::clone(&self.graph);
        let (node, choice) = self
            .current_node_in(&graph)
            .and_then(|node| node.choice(&choice_id).map(|choice| (node, choice)))
            .ok_or_else(|| GameError::unknown("choice", choice_id.as_str()))?;

        self.pending = None;
        self.stats = self.stats.apply(&choice.effect);
        self.history.push(ChoiceRecord {
            node: node.id.clone(),
            choice: choice.id.clone(),
            stats_after: self.stats,
        });

        if let Some(next) = &choice.next {
            self.phase = WalkPhase::InProgress { node: next.clone() };
            Ok(WalkStep::Moved { node: next.clone() })
        } else {
            let outcome = self.rules.classify(&self.stats);
            info!(
                "decide: walk finished after {} choices with `{}`",
                self.history.len(),
                outcome.id
            );
            self.phase = WalkPhase::Terminal {
                outcome: outcome.clone(),
            };
            Ok(WalkStep::Finished(outcome))
        }
    }

    /// Select and immediately complete a choice.
    ///
    /// # Errors
    ///
    /// See [`Self::select_choice`].
    pub fn apply_choice(&mut self, choice_id: &str) -> Result<WalkStep, GameError> {
        self.select_choice(choice_id)?;
        self.complete_transition()
    }

    /// Discard the walk and return to idle.
    pub fn restart(&mut self) {
        self.stats = self.baseline;
        self.phase = WalkPhase::Idle;
        self.pending = None;
        self.history.clear();
    }

    #[must_use]
    pub fn current_node(&self) -> Option<&DecisionNode> {
        self.current_node_in(&self.graph)
    }

    fn current_node_in<'g>(&self, graph: &'g ScenarioGraph) -> Option<&'g DecisionNode> {
        match &self.phase {
            WalkPhase::InProgress { node } => graph.node(node),
            WalkPhase::Idle | WalkPhase::Terminal { .. } => None,
        }
    }

    #[must_use]
    pub const fn stats(&self) -> StatVector {
        self.stats
    }

    #[must_use]
    pub const fn phase(&self) -> &WalkPhase {
        &self.phase
    }

    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.pending.is_some()
    }

    #[must_use]
    pub fn history(&self) -> &[ChoiceRecord] {
        &self.history
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<&Outcome> {
        match &self.phase {
            WalkPhase::Terminal { outcome } => Some(outcome),
            WalkPhase::Idle | WalkPhase::InProgress { .. } => None,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> DecideState {
        DecideState {
            phase: self.phase.clone(),
            stats: self.stats,
            step: self.history.len(),
            locked: self.is_locked(),
            history: self.history.clone(),
        }
    }

    fn invalid(&self, action: &'static str) -> GameError {
        GameError::InvalidTransition {
            action,
            phase: self.phase.label(),
        }
    }
}
