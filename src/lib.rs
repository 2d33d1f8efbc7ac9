//! Planar Voronoi diagrams with Fortune's sweep-line algorithm.
//!
//! A horizontal sweep line moves through the sites in increasing `y`. Behind it, the beach line
//! (the envelope of one parabola per site) separates the part of the diagram that is already
//! fixed from the part that can still change. Site events split arcs of the beach line, circle
//! events squeeze them out and emit vertices. The finished bisectors are clipped to a bounding
//! rectangle and assembled into cells.
//!
//! ```
//! use fortune_voronoi::{compute_voronoi, BoundingBox, Site};
//!
//! let sites = [
//!     Site::new(0, 0.0, 0.0),
//!     Site::new(1, 4.0, 0.0),
//!     Site::new(2, 2.0, 4.0),
//! ];
//! let diagram = compute_voronoi(&sites, BoundingBox::new(-10.0, -10.0, 10.0, 10.0)).unwrap();
//!
//! let v = diagram.vertices()[0];
//! assert_eq!((v.x, v.y), (2.0, 1.5));
//! assert!(diagram.cell(2).unwrap().contains(sites[2].pos()));
//! ```

pub mod beachline;
pub mod bisector;
pub mod builder;
pub mod clip;
pub mod config;
pub mod diagram;
pub mod error;
pub mod event_queue;
pub mod geometry;
pub mod io;


/// Index of a site in the sweep order of one build.
pub type SiteIdx = u32;

pub use bisector::Line;
pub use builder::{compute_voronoi, DiagramBuilder, SweepState};
pub use config::{BoundingBox, SweepConfig};
pub use diagram::{Cell, Diagram, Edge, HalfEdge, SweepStats};
pub use error::{DegeneracyWarning, InvalidInput, InvariantViolation, Result, VoronoiError};
pub use geometry::{Point, Site, SiteId, Vertex};
