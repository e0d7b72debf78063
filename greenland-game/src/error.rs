//! Error types for session operations and catalog validation.
use thiserror::Error;

use crate::session::{GameKind, SessionId};

/// Rejected game operation. The session is left untouched whenever one of these is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("session {0} not found")]
    UnknownSession(SessionId),
    #[error("{action} is not allowed while {phase}")]
    InvalidTransition {
        action: &'static str,
        phase: &'static str,
    },
    #[error("a transition is already in progress")]
    Locked,
    #[error("unknown {kind} `{id}`")]
    UnknownId { kind: &'static str, id: String },
    #[error("`{id}` costs {cost} but only {budget} is available")]
    Unaffordable { id: String, cost: i64, budget: i64 },
    #[error("policy `{0}` has already been enacted")]
    AlreadyEnacted(String),
    #[error("cell ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    #[error("cell ({x}, {y}) is already occupied")]
    CellOccupied { x: u32, y: u32 },
    #[error("{actual} session cannot {action}")]
    WrongGame {
        action: &'static str,
        actual: GameKind,
    },
    #[error("the game has not finished yet")]
    NotFinished,
}

impl GameError {
    pub(crate) fn unknown(kind: &'static str, id: impl Into<String>) -> Self {
        Self::UnknownId {
            kind,
            id: id.into(),
        }
    }

    /// Errors a presentation layer is expected to swallow silently.
    #[must_use]
    pub const fn is_silent(&self) -> bool {
        matches!(self, Self::Locked | Self::InvalidTransition { .. })
    }
}

/// Content catalog failed load-time validation.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate {kind} id `{id}`")]
    DuplicateId { kind: &'static str, id: String },
    #[error("scenario root `{0}` does not exist")]
    MissingRoot(String),
    #[error("scenario node `{0}` has no choices")]
    EmptyChoices(String),
    #[error("choice `{choice}` on node `{node}` points at missing node `{target}`")]
    DanglingNext {
        node: String,
        choice: String,
        target: String,
    },
    #[error("scenario graph contains a cycle through `{0}`")]
    Cycle(String),
    #[error("scenario node `{0}` is unreachable from the root")]
    Unreachable(String),
    #[error("scenario paths span {min}..={max} choices, expected exactly {expected}")]
    UnexpectedDepth {
        min: usize,
        max: usize,
        expected: usize,
    },
    #[error("event `{0}` has no options")]
    EmptyOptions(String),
    #[error(
        "question `{id}` needs at least two options and a valid answer \
         (correct {correct}, options {options})"
    )]
    InvalidQuestion {
        id: String,
        correct: usize,
        options: usize,
    },
    #[error("the question bank is empty")]
    EmptyQuestionBank,
    #[error("{kind} `{id}` has a negative cost ({cost})")]
    NegativeCost {
        kind: &'static str,
        id: String,
        cost: i64,
    },
    #[error("outcome rules are empty or do not end with an unconditional rule")]
    NonExhaustiveOutcomes,
}

/// A share code could not be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShareCodeError {
    #[error("`{0}` is not a share code")]
    Malformed(String),
    #[error("unknown game prefix `{0}`")]
    UnknownGame(String),
    #[error("unknown share word `{0}`")]
    UnknownWord(String),
}
