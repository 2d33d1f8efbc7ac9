//! Error types for diagram construction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::SiteId;

/// Result type for diagram construction.
pub type Result<T, E = VoronoiError> = std::result::Result<T, E>;

/// Errors that stop the construction of a diagram.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VoronoiError {
    /// The input was rejected before the sweep started. This is the only error a caller is
    /// expected to handle, e.g. by deduplicating the sites and trying again.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// The sweep reached a state that correct code never produces.
    #[error("internal invariant violated: {0}")]
    InvariantViolation(#[from] InvariantViolation),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidInput {
    #[error("no sites were supplied")]
    EmptySiteSet,

    #[error("bounding rectangle ({xmin}, {ymin})-({xmax}, {ymax}) is empty or not finite")]
    InvalidBounds {
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
    },

    #[error("site {id} has a non-finite coordinate ({x}, {y})")]
    NonFiniteSite { id: SiteId, x: f64, y: f64 },

    #[error("site {id} at ({x}, {y}) lies outside the bounding rectangle")]
    SiteOutOfBounds { id: SiteId, x: f64, y: f64 },

    #[error("sites {first} and {second} share the coordinates ({x}, {y})")]
    DuplicateCoordinates {
        first: SiteId,
        second: SiteId,
        x: f64,
        y: f64,
    },

    #[error("site id {id} is used by more than one site")]
    DuplicateId { id: SiteId },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvariantViolation {
    #[error("event at sweep y {y} was dequeued after an event at sweep y {last}")]
    EventOutOfOrder { y: f64, last: f64 },

    #[error("beach line out of order at sweep y {y}: breakpoint {left} precedes {right}")]
    BeachLineUnordered { y: f64, left: f64, right: f64 },

    #[error("no arc lies above x = {x} at sweep y {y}")]
    ArcNotFound { x: f64, y: f64 },

    #[error("circle event of arc {arc} fired without a neighbor on both sides")]
    OrphanCircleEvent { arc: usize },

    #[error("bisector between sites {0} and {1} was given a third endpoint")]
    BisectorOverfilled(SiteId, SiteId),
}

/// A triple of consecutive arcs whose sites are collinear within tolerance. Such a triple is
/// treated as never converging, and the sweep goes on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DegeneracyWarning {
    /// Sites of the left, middle and right arc.
    pub sites: [SiteId; 3],
    /// The normalized turn of the triple, see [`crate::geometry::turn`].
    pub turn: f64,
}

impl std::fmt::Display for DegeneracyWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c] = self.sites;
        write!(
            f,
            "sites {a}, {b} and {c} are collinear within tolerance (turn {:e})",
            self.turn
        )
    }
}
