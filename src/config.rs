use serde::{Deserialize, Serialize};

use crate::error::InvalidInput;
use crate::geometry::{Point, Site};

/// Default for [`SweepConfig::collinear_tolerance`].
pub const DEFAULT_COLLINEAR_TOLERANCE: f64 = 1e-10;

/// Default for [`SweepConfig::vertex_tolerance`].
pub const DEFAULT_VERTEX_TOLERANCE: f64 = 1e-9;

/// Numeric and validation settings of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Three consecutive arcs only schedule a circle event when the sine of the turn through
    /// their sites is above this value. Smaller turns are reported as a
    /// [`DegeneracyWarning`](crate::DegeneracyWarning) and treated as collinear.
    pub collinear_tolerance: f64,
    /// Distance tolerance, relative to the larger of 1 and the diagonal of the bounding
    /// rectangle. Circle events predicted this far behind the sweep line are clamped to it,
    /// consecutive vertices this close are merged, and vertices this far outside the rectangle
    /// still count as inside.
    pub vertex_tolerance: f64,
    /// Reject an empty site set instead of returning the bare rectangle.
    pub require_sites: bool,
    /// Verify the ordering of the beach line after every event. The check is linear in the
    /// length of the beach line, so it defaults to debug builds only. Short beach lines are
    /// checked either way.
    pub check_invariants: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            collinear_tolerance: DEFAULT_COLLINEAR_TOLERANCE,
            vertex_tolerance: DEFAULT_VERTEX_TOLERANCE,
            require_sites: false,
            check_invariants: cfg!(debug_assertions),
        }
    }
}

impl SweepConfig {
    #[must_use]
    pub fn with_collinear_tolerance(mut self, tolerance: f64) -> Self {
        self.collinear_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_vertex_tolerance(mut self, tolerance: f64) -> Self {
        self.vertex_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn with_require_sites(mut self, require: bool) -> Self {
        self.require_sites = require;
        self
    }

    #[must_use]
    pub fn with_check_invariants(mut self, check: bool) -> Self {
        self.check_invariants = check;
        self
    }
}

/// The clipping rectangle of a diagram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    pub const fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// The bounding box of `sites`, grown by `margin` on every side, or `None` when there are
    /// no sites.
    pub fn around(sites: &[Site], margin: f64) -> Option<Self> {
        let first = sites.first()?;
        let mut bounds = Self::new(first.x, first.y, first.x, first.y);
        for site in &sites[1..] {
            bounds.xmin = bounds.xmin.min(site.x);
            bounds.ymin = bounds.ymin.min(site.y);
            bounds.xmax = bounds.xmax.max(site.x);
            bounds.ymax = bounds.ymax.max(site.y);
        }
        bounds.xmin -= margin;
        bounds.ymin -= margin;
        bounds.xmax += margin;
        bounds.ymax += margin;
        Some(bounds)
    }

    pub fn validate(&self) -> Result<(), InvalidInput> {
        let finite = [self.xmin, self.ymin, self.xmax, self.ymax]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.xmin >= self.xmax || self.ymin >= self.ymax {
            return Err(InvalidInput::InvalidBounds {
                xmin: self.xmin,
                ymin: self.ymin,
                xmax: self.xmax,
                ymax: self.ymax,
            });
        }
        Ok(())
    }

    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn diagonal(&self) -> f64 {
        self.width().hypot(self.height())
    }

    pub fn contains(&self, p: Point) -> bool {
        self.contains_within(p, 0.0)
    }

    /// Like [`Self::contains`], but accepts points up to `tolerance` outside.
    pub fn contains_within(&self, p: Point, tolerance: f64) -> bool {
        p.x >= self.xmin - tolerance
            && p.x <= self.xmax + tolerance
            && p.y >= self.ymin - tolerance
            && p.y <= self.ymax + tolerance
    }

    /// The corners in counter-clockwise order, starting at the lower left one.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.xmin, self.ymin),
            Point::new(self.xmax, self.ymin),
            Point::new(self.xmax, self.ymax),
            Point::new(self.xmin, self.ymax),
        ]
    }
}
