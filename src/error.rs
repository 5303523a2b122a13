//! Error kinds surfaced by the generation pipeline. Retryable kinds are
//! absorbed by the orchestrator's attempt loop; the rest abort generation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structural rules checked by the grid validators; carried inside
/// `Error::InvariantViolation` diagnostics.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Invariant {
    /// No two clue boxes are orthogonally adjacent.
    ClueBoxAdjacency,
    /// The top-left cell is a clue box unless a blocker overlaps it, in which
    /// case the cells just past the blocker's edges are.
    CornerLicensing,
    /// The bottom-right 2x2 region contains no clue box.
    BottomRightZone,
    /// Every run of length >= 2 has a clue box adjacent to its first cell in
    /// a direction-legal position.
    SlotLicensing,
    /// Every clue box licenses at least one slot of length >= 2.
    ClueBoxUtility,
    /// Every frozen run of length >= 3 spells a dictionary word.
    WordValidity,
    /// No word appears in more than one slot.
    WordUniqueness,
}

impl fmt::Display for Invariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Invariant::ClueBoxAdjacency => "clue-box-adjacency",
            Invariant::CornerLicensing => "corner-licensing",
            Invariant::BottomRightZone => "bottom-right-zone",
            Invariant::SlotLicensing => "slot-licensing",
            Invariant::ClueBoxUtility => "clue-box-utility",
            Invariant::WordValidity => "word-validity",
            Invariant::WordUniqueness => "word-uniqueness",
        };
        write!(f, "{name}")
    }
}

/// The failure kind recorded for one generation attempt.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ThemePlacement,
    LayoutInfeasible,
    FillUnsat,
    FillTimeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::ThemePlacement => "theme-placement-failed",
            FailureKind::LayoutInfeasible => "layout-infeasible",
            FailureKind::FillUnsat => "fill-unsat",
            FailureKind::FillTimeout => "fill-timeout",
        };
        write!(f, "{name}")
    }
}

/// One entry of the attempt trace attached to a terminal failure.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct AttemptFailure {
    pub attempt: usize,
    pub kind: FailureKind,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("blocker rectangle out of bounds: {0}")]
    BlockerOutOfBounds(String),

    #[error("theme placement failed: {0}")]
    ThemePlacementFailed(String),

    #[error("layout infeasible: {0}")]
    LayoutInfeasible(String),

    #[error("fill proved unsatisfiable")]
    FillUnsat,

    #[error("fill timed out")]
    FillTimeout,

    #[error("invariant {invariant} violated: {detail}")]
    InvariantViolation { invariant: Invariant, detail: String },

    #[error("generation failed after {attempts} attempts; last failure: {last}")]
    GenerationFailed {
        attempts: usize,
        last: FailureKind,
        trace: Vec<AttemptFailure>,
    },
}

impl Error {
    /// The trace entry this error contributes, if the orchestrator may retry
    /// past it.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Error::ThemePlacementFailed(_) => Some(FailureKind::ThemePlacement),
            Error::LayoutInfeasible(_) => Some(FailureKind::LayoutInfeasible),
            Error::FillUnsat => Some(FailureKind::FillUnsat),
            Error::FillTimeout => Some(FailureKind::FillTimeout),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_retryable(&self) -> bool {
        self.failure_kind().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(Error::FillUnsat.is_retryable());
        assert!(Error::LayoutInfeasible("x".into()).is_retryable());
        assert!(!Error::InvalidConfig("x".into()).is_retryable());
        assert!(!Error::InvariantViolation {
            invariant: Invariant::WordUniqueness,
            detail: "x".into(),
        }
        .is_retryable());
    }
}
