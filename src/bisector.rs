use serde::{Deserialize, Serialize};

use crate::error::InvariantViolation;
use crate::geometry::{Point, Site};
use crate::SiteIdx;

/// Index of a bisector in the builder's bisector table.
pub type BisectorIdx = usize;

/// Index of a vertex in the builder's vertex table.
pub type VertexIdx = usize;

/// A line `a·x + b·y = c`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Line {
    /// The perpendicular bisector of `p` and `q`.
    pub fn bisecting(p: Point, q: Point) -> Self {
        let d = q - p;
        Self {
            a: d.x,
            b: d.y,
            c: (q.dot(q) - p.dot(p)) / 2.0,
        }
    }

    /// Signed distance of `p` to the line, positive on the side the normal `(a, b)` points to.
    pub fn signed_distance(&self, p: Point) -> f64 {
        (self.a * p.x + self.b * p.y - self.c) / self.a.hypot(self.b)
    }
}

/// The boundary between the regions of two sites.
///
/// The line is parametrized as `origin + t·direction`, with the origin at the midpoint of the
/// sites and `direction = rot90(s1 - s0)`. Seen from the beach line, the breakpoint between an
/// arc of `a` on the left and an arc of `b` on the right moves along `rot90(b - a)`: the one with
/// `s0` on its left moves towards `+t` and ends the bisector at slot 1, the other moves towards
/// `-t` and ends it at slot 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Bisector {
    pub sites: [SiteIdx; 2],
    pub line: Line,
    /// The vertices at the `-t` and `+t` ends, or `None` where the bisector is still unbounded.
    pub endpoints: [Option<VertexIdx>; 2],
}

impl Bisector {
    pub fn new(sites: &[Site], s0: SiteIdx, s1: SiteIdx) -> Self {
        let (p, q) = (sites[s0 as usize].pos(), sites[s1 as usize].pos());
        Self {
            sites: [s0, s1],
            line: Line::bisecting(p, q),
            endpoints: [None, None],
        }
    }

    /// The endpoint slot ended by the breakpoint whose left arc belongs to `left_site`.
    pub fn slot_for(&self, left_site: SiteIdx) -> usize {
        if left_site == self.sites[0] {
            1
        } else {
            0
        }
    }

    /// Fix the end traced by the breakpoint whose left arc belongs to `left_site`.
    pub fn finish(
        &mut self,
        sites: &[Site],
        left_site: SiteIdx,
        vertex: VertexIdx,
    ) -> Result<(), InvariantViolation> {
        let slot = self.slot_for(left_site);
        if self.endpoints[slot].is_some() {
            let [s0, s1] = self.sites;
            return Err(InvariantViolation::BisectorOverfilled(
                sites[s0 as usize].id,
                sites[s1 as usize].id,
            ));
        }
        self.endpoints[slot] = Some(vertex);
        Ok(())
    }

    pub fn origin(&self, sites: &[Site]) -> Point {
        let [s0, s1] = self.sites;
        sites[s0 as usize].pos().midpoint(sites[s1 as usize].pos())
    }

    pub fn direction(&self, sites: &[Site]) -> Point {
        let [s0, s1] = self.sites;
        (sites[s1 as usize].pos() - sites[s0 as usize].pos()).rot90()
    }

    /// The parameter of the projection of `p` onto the line.
    pub fn param(&self, sites: &[Site], p: Point) -> f64 {
        let d = self.direction(sites);
        (p - self.origin(sites)).dot(d) / d.dot(d)
    }

    pub fn at(&self, sites: &[Site], t: f64) -> Point {
        self.origin(sites) + self.direction(sites) * t
    }

    /// True when both ends are the same vertex, which happens where several circle events
    /// collapse into one vertex.
    pub fn is_degenerate(&self) -> bool {
        matches!(self.endpoints, [Some(a), Some(b)] if a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn line_of_two_sites() {
        let line = Line::bisecting(Point::new(0.0, 0.0), Point::new(2.0, 0.0));
        assert_relative_eq!(line.signed_distance(Point::new(1.0, 7.0)), 0.0);
        assert!(line.signed_distance(Point::new(2.0, 0.0)) > 0.0);
        assert!(line.signed_distance(Point::new(0.0, 0.0)) < 0.0);
    }

    #[test]
    fn slots() {
        let sites = [Site::new(0, 0.0, 0.0), Site::new(1, 0.0, 2.0)];
        let mut b = Bisector::new(&sites, 0, 1);

        // the breakpoint with site 0 on the left moves to -x, which is +t
        assert_eq!(b.direction(&sites), Point::new(-2.0, 0.0));
        assert_eq!(b.slot_for(0), 1);
        assert_eq!(b.slot_for(1), 0);

        b.finish(&sites, 0, 3).unwrap();
        b.finish(&sites, 1, 3).unwrap();
        assert!(b.is_degenerate());
        assert_eq!(
            b.finish(&sites, 1, 4),
            Err(InvariantViolation::BisectorOverfilled(0, 1))
        );
    }

    #[test]
    fn param_round_trip() {
        let sites = [Site::new(0, 1.0, 1.0), Site::new(1, 3.0, 2.0)];
        let b = Bisector::new(&sites, 0, 1);
        let p = b.at(&sites, 2.5);
        assert_relative_eq!(b.param(&sites, p), 2.5, epsilon = 1e-12);
        assert_relative_eq!(b.line.signed_distance(p), 0.0, epsilon = 1e-12);
    }
}
