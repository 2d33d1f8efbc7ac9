//! The sweep itself: validation, the event loop and batch builds.

use std::collections::HashSet;

use log::{debug, trace};
use rayon::prelude::*;

use crate::beachline::{ArcIdx, BeachLine};
use crate::bisector::{Bisector, VertexIdx};
use crate::config::{BoundingBox, SweepConfig};
use crate::diagram::{Diagram, SweepOutput, SweepStats};
use crate::error::{DegeneracyWarning, InvalidInput, InvariantViolation, Result};
use crate::event_queue::{CircleEvent, Event, EventQueue, SiteEvent};
use crate::geometry::{breakpoint_x, circumcenter, dist, turn, Point, Site, SiteId, Vertex};
use crate::SiteIdx;

/// Builds Voronoi diagrams clipped to a fixed rectangle.
///
/// ```
/// use fortune_voronoi::{BoundingBox, DiagramBuilder, Site};
///
/// let sites = [
///     Site::new(0, 0.0, 0.0),
///     Site::new(1, 4.0, 0.0),
///     Site::new(2, 2.0, 4.0),
/// ];
/// let diagram = DiagramBuilder::new(BoundingBox::new(-10.0, -10.0, 10.0, 10.0))
///     .build(&sites)
///     .unwrap();
/// assert_eq!(diagram.vertices().len(), 1);
/// assert_eq!(diagram.edges().len(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiagramBuilder {
    bounds: BoundingBox,
    config: SweepConfig,
}

impl DiagramBuilder {
    pub fn new(bounds: BoundingBox) -> Self {
        Self {
            bounds,
            config: SweepConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: SweepConfig) -> Self {
        self.config = config;
        self
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    pub fn config(&self) -> &SweepConfig {
        &self.config
    }

    pub fn build(&self, sites: &[Site]) -> Result<Diagram> {
        self.build_observed(sites, &mut |_| {})
    }

    /// Like [`Self::build`], but calls `on_progress` after the initial beach line is set up and
    /// after every processed event.
    pub fn build_observed(
        &self,
        sites: &[Site],
        on_progress: &mut impl FnMut(&SweepState),
    ) -> Result<Diagram> {
        let sites = prepare(&self.bounds, &self.config, sites)?;

        if sites.len() < 2 {
            debug!("trivial diagram of {} site(s)", sites.len());
            return Ok(Diagram::trivial(self.bounds, &sites));
        }

        let tolerance = self.config.vertex_tolerance * self.bounds.diagonal().max(1.0);
        let mut sweep = Sweep::new(&sites, &self.config, tolerance);
        sweep.run(on_progress)?;

        let output = sweep.finish();
        debug!(
            "swept {} sites: {} circle events fired, {} invalidated, {} warnings",
            output.stats.site_events,
            output.stats.circle_events_fired,
            output.stats.circle_events_invalidated,
            output.warnings.len()
        );
        Ok(Diagram::assemble(self.bounds, output, tolerance))
    }

    /// Build one diagram per site set, in parallel.
    pub fn build_many<S>(&self, site_sets: &[S]) -> Vec<Result<Diagram>>
    where
        S: AsRef<[Site]> + Sync,
    {
        site_sets
            .par_iter()
            .map(|sites| self.build(sites.as_ref()))
            .collect()
    }
}

/// Build the diagram of `sites` clipped to `bounds`, with the default [`SweepConfig`].
pub fn compute_voronoi(sites: &[Site], bounds: BoundingBox) -> Result<Diagram> {
    DiagramBuilder::new(bounds).build(sites)
}

/// A read-only view of a sweep in progress.
pub struct SweepState<'a> {
    sweep_y: f64,
    sites: &'a [Site],
    beach: &'a BeachLine,
    vertices: &'a [Point],
    pending: usize,
}

impl SweepState<'_> {
    /// The y of the sweep line.
    pub fn sweep_y(&self) -> f64 {
        self.sweep_y
    }

    /// The sites of the arcs, from left to right.
    pub fn beach_line(&self) -> Vec<SiteId> {
        self.beach
            .sites()
            .map(|s| self.sites[s as usize].id)
            .collect()
    }

    /// The x coordinates of the breakpoints between consecutive arcs.
    pub fn breakpoints(&self) -> Vec<f64> {
        let arcs: Vec<Point> = self
            .beach
            .sites()
            .map(|s| self.sites[s as usize].pos())
            .collect();
        arcs.windows(2)
            .map(|w| breakpoint_x(w[0], w[1], self.sweep_y))
            .collect()
    }

    /// The vertices found so far.
    pub fn vertices(&self) -> &[Vertex] {
        self.vertices
    }

    /// Number of queued events, invalidated ones included.
    pub fn pending_events(&self) -> usize {
        self.pending
    }
}

/// Check the input and return the sites in sweep order.
fn prepare(
    bounds: &BoundingBox,
    config: &SweepConfig,
    sites: &[Site],
) -> std::result::Result<Vec<Site>, InvalidInput> {
    bounds.validate()?;

    if sites.is_empty() && config.require_sites {
        return Err(InvalidInput::EmptySiteSet);
    }

    let mut ids = HashSet::with_capacity(sites.len());
    for site in sites {
        let Site { id, x, y } = *site;
        if !site.pos().is_finite() {
            return Err(InvalidInput::NonFiniteSite { id, x, y });
        }
        if !bounds.contains(site.pos()) {
            return Err(InvalidInput::SiteOutOfBounds { id, x, y });
        }
        if !ids.insert(id) {
            return Err(InvalidInput::DuplicateId { id });
        }
    }

    // `+ 0.0` turns -0.0 into 0.0, which the sweep order would otherwise tell apart.
    let mut sorted: Vec<Site> = sites
        .iter()
        .map(|s| Site::new(s.id, s.x + 0.0, s.y + 0.0))
        .collect();
    sorted.sort_by(|a, b| a.pos().cmp(&b.pos()).then(a.id.cmp(&b.id)));

    if let Some(w) = sorted.windows(2).find(|w| w[0].pos() == w[1].pos()) {
        return Err(InvalidInput::DuplicateCoordinates {
            first: w[0].id,
            second: w[1].id,
            x: w[0].x,
            y: w[0].y,
        });
    }

    Ok(sorted)
}

/// Beach lines up to this many arcs are checked after every event regardless of
/// [`SweepConfig::check_invariants`].
const ALWAYS_CHECKED_ARCS: usize = 64;

struct Sweep<'a> {
    sites: &'a [Site],
    config: &'a SweepConfig,
    tolerance: f64,
    queue: EventQueue,
    beach: BeachLine,
    bisectors: Vec<Bisector>,
    vertices: Vec<Point>,
    last_vertex: Option<VertexIdx>,
    warnings: Vec<DegeneracyWarning>,
    warned: HashSet<[SiteIdx; 3]>,
    sweep_y: f64,
    site_events: usize,
    circles_fired: usize,
    merged_vertices: usize,
}

impl<'a> Sweep<'a> {
    fn new(sites: &'a [Site], config: &'a SweepConfig, tolerance: f64) -> Self {
        let mut queue = EventQueue::new();
        for (i, site) in sites.iter().enumerate() {
            queue.push_site(i as SiteIdx, site.id, site.pos());
        }
        Self {
            sites,
            config,
            tolerance,
            queue,
            beach: BeachLine::new(),
            bisectors: Vec::new(),
            vertices: Vec::new(),
            last_vertex: None,
            warnings: Vec::new(),
            warned: HashSet::new(),
            sweep_y: f64::NEG_INFINITY,
            site_events: 0,
            circles_fired: 0,
            merged_vertices: 0,
        }
    }

    fn state(&self) -> SweepState<'_> {
        SweepState {
            sweep_y: self.sweep_y,
            sites: self.sites,
            beach: &self.beach,
            vertices: &self.vertices,
            pending: self.queue.len(),
        }
    }

    /// Verify the beach line when `check_invariants` asks for it, or when it is short enough
    /// for the check to be cheap.
    fn check_order(&self) -> Result<()> {
        if self.config.check_invariants || self.beach.len() <= ALWAYS_CHECKED_ARCS {
            self.beach
                .check_order(self.sites, self.sweep_y, self.tolerance)?;
        }
        Ok(())
    }

    fn run(&mut self, on_progress: &mut impl FnMut(&SweepState)) -> Result<()> {
        self.initial_chain();
        on_progress(&self.state());

        while let Some(event) = self.queue.pop_min() {
            let y = event.pos().y;
            if y < self.sweep_y {
                return Err(InvariantViolation::EventOutOfOrder {
                    y,
                    last: self.sweep_y,
                }
                .into());
            }
            self.sweep_y = y;

            match event {
                Event::Site(site) => self.handle_site(site)?,
                Event::Circle(circle) => self.handle_circle(circle)?,
            }

            self.check_order()?;
            on_progress(&self.state());
        }

        Ok(())
    }

    /// Start the beach line with every site at the lowest y. Their arcs are vertical rays side
    /// by side, separated by vertical bisectors.
    fn initial_chain(&mut self) {
        let Some(Event::Site(first)) = self.queue.pop_min() else {
            return;
        };
        self.sweep_y = first.pos.y;
        self.site_events += 1;
        let mut last = self.beach.push_back(first.site);
        let mut last_site = first.site;

        while let Some(&Event::Site(next)) = self.queue.peek_min() {
            if next.pos.y != first.pos.y {
                break;
            }
            self.queue.pop_min();
            self.site_events += 1;

            let b = self.bisectors.len();
            self.bisectors
                .push(Bisector::new(self.sites, last_site, next.site));
            let arc = self.beach.push_back(next.site);
            self.beach.arc_mut(last).right = Some(b);
            self.beach.arc_mut(arc).left = Some(b);

            last = arc;
            last_site = next.site;
        }
        trace!("initial beach line: {:?}", self.beach);
    }

    fn handle_site(&mut self, event: SiteEvent) -> Result<()> {
        trace!("site {} at {:?}", event.id, event.pos);
        self.site_events += 1;

        // Find the arc above the new site.
        let arc = self
            .beach
            .locate(self.sites, event.pos.x, event.pos.y)
            .ok_or(InvariantViolation::ArcNotFound {
                x: event.pos.x,
                y: event.pos.y,
            })?;

        // The split arc no longer vanishes where it was predicted to.
        if let Some(handle) = self.beach.arc_mut(arc).circle.take() {
            self.queue.invalidate(handle);
        }

        let split_site = self.beach.arc(arc).site;
        let b = self.bisectors.len();
        self.bisectors
            .push(Bisector::new(self.sites, split_site, event.site));

        let (left, _, right) = self.beach.insert_above(arc, event.site, b);

        self.check_circle(left);
        self.check_circle(right);
        Ok(())
    }

    fn handle_circle(&mut self, event: CircleEvent) -> Result<()> {
        trace!(
            "circle of sites {:?} at y {}, vertex {:?}",
            event.sites,
            event.y,
            event.vertex
        );
        let orphan = InvariantViolation::OrphanCircleEvent { arc: event.arc };

        let arc = self.beach.arc(event.arc);
        if arc.circle != Some(event.handle) {
            return Err(orphan.into());
        }
        let (Some(prev), Some(next)) = (self.beach.prev(event.arc), self.beach.next(event.arc))
        else {
            return Err(orphan.into());
        };
        let (Some(left_bisector), Some(right_bisector)) = (arc.left, arc.right) else {
            return Err(orphan.into());
        };
        let site = arc.site;
        let left_site = self.beach.arc(prev).site;
        let right_site = self.beach.arc(next).site;

        self.beach.arc_mut(event.arc).circle = None;
        for neighbor in [prev, next] {
            if let Some(handle) = self.beach.arc_mut(neighbor).circle.take() {
                self.queue.invalidate(handle);
            }
        }
        self.circles_fired += 1;

        let vertex = self.emit_vertex(event.vertex);

        self.bisectors[left_bisector].finish(self.sites, left_site, vertex)?;
        self.bisectors[right_bisector].finish(self.sites, site, vertex)?;

        let mut merged = Bisector::new(self.sites, left_site, right_site);
        merged.endpoints[0] = Some(vertex);
        let b = self.bisectors.len();
        self.bisectors.push(merged);

        let (left, right) = self.beach.remove(event.arc, b)?;

        self.check_circle(left);
        self.check_circle(right);
        Ok(())
    }

    /// Record the vertex of a fired circle event. Several circle events of co-circular sites
    /// fire one after the other at the same point, and they share a single vertex.
    fn emit_vertex(&mut self, p: Point) -> VertexIdx {
        if let Some(last) = self.last_vertex {
            if dist(self.vertices[last], p) <= self.tolerance {
                self.merged_vertices += 1;
                return last;
            }
        }
        self.vertices.push(p);
        let v = self.vertices.len() - 1;
        self.last_vertex = Some(v);
        v
    }

    /// Schedule the circle event of `arc` if it and its neighbors converge.
    fn check_circle(&mut self, arc: ArcIdx) {
        let (Some(prev), Some(next)) = (self.beach.prev(arc), self.beach.next(arc)) else {
            return;
        };
        let triple = [prev, arc, next].map(|a| self.beach.arc(a).site);
        let [l, m, r] = triple;
        if l == r {
            return;
        }

        let [a, b, c] = triple.map(|s| self.sites[s as usize].pos());
        let ids = triple.map(|s| self.sites[s as usize].id);

        let t = turn(a, b, c);
        if t <= self.config.collinear_tolerance {
            let mut key = triple;
            key.sort_unstable();
            if t.abs() <= self.config.collinear_tolerance && self.warned.insert(key) {
                let warning = DegeneracyWarning { sites: ids, turn: t };
                debug!("{warning}");
                self.warnings.push(warning);
            }
            return;
        }

        let Some(center) = circumcenter(a, b, c) else {
            return;
        };
        let mut y = center.y + dist(center, b);
        if y < self.sweep_y {
            if y < self.sweep_y - self.tolerance {
                trace!("circle of sites {ids:?} at y {y} is behind the sweep line, ignored");
                return;
            }
            y = self.sweep_y;
        }

        let handle = self.queue.schedule_circle(arc, center, y, ids);
        self.beach.arc_mut(arc).circle = Some(handle);
        trace!(
            "scheduled circle of sites {:?} (arcs {} {} {}) at y {}",
            ids,
            l,
            m,
            r,
            y
        );
    }

    fn finish(self) -> SweepOutput {
        let stats = SweepStats {
            site_events: self.site_events,
            circle_events_scheduled: self.queue.circles_scheduled(),
            circle_events_invalidated: self.queue.circles_invalidated(),
            circle_events_fired: self.circles_fired,
            merged_vertices: self.merged_vertices,
        };
        SweepOutput {
            sites: self.sites.to_vec(),
            bisectors: self.bisectors,
            vertices: self.vertices,
            stats,
            warnings: self.warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VoronoiError;

    const BOX: BoundingBox = BoundingBox::new(-10.0, -10.0, 10.0, 10.0);

    #[test]
    fn short_beach_line_is_always_checked() {
        let sites = [Site::new(0, 0.0, 0.0), Site::new(1, 4.0, 1.0)];
        let lenient = SweepConfig::default().with_check_invariants(false);
        let strict = lenient.with_check_invariants(true);
        fn unordered<'a>(sites: &'a [Site], config: &'a SweepConfig) -> Sweep<'a> {
            let mut sweep = Sweep::new(sites, config, 1e-9);
            sweep.sweep_y = 2.0;
            for site in [1, 0, 1] {
                sweep.beach.push_back(site);
            }
            sweep
        }

        let mut sweep = unordered(&sites, &lenient);
        assert!(matches!(
            sweep.check_order(),
            Err(VoronoiError::InvariantViolation(
                InvariantViolation::BeachLineUnordered { .. }
            ))
        ));

        // a long beach line is left to `check_invariants`
        for _ in 0..ALWAYS_CHECKED_ARCS {
            sweep.beach.push_back(0);
        }
        assert!(sweep.check_order().is_ok());

        let mut sweep = unordered(&sites, &strict);
        for _ in 0..ALWAYS_CHECKED_ARCS {
            sweep.beach.push_back(0);
        }
        assert!(sweep.check_order().is_err());
    }

    #[test]
    fn prepare_sorts_in_sweep_order() {
        let sites = [
            Site::new(7, 1.0, 2.0),
            Site::new(3, -0.0, 1.0),
            Site::new(5, 0.5, 1.0),
        ];
        let sorted = prepare(&BOX, &SweepConfig::default(), &sites).unwrap();
        assert_eq!(
            sorted.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![3, 5, 7]
        );
        assert!(sorted[0].x.is_sign_positive());
    }

    #[test]
    fn prepare_rejects_bad_input() {
        let config = SweepConfig::default();
        let check = |sites: &[Site]| prepare(&BOX, &config, sites).unwrap_err();

        assert_eq!(
            check(&[Site::new(0, f64::NAN, 0.0)]).to_string(),
            "site 0 has a non-finite coordinate (NaN, 0)"
        );
        assert_eq!(
            check(&[Site::new(4, 11.0, 0.0)]),
            InvalidInput::SiteOutOfBounds {
                id: 4,
                x: 11.0,
                y: 0.0
            }
        );
        assert_eq!(
            check(&[Site::new(1, 0.0, 0.0), Site::new(1, 1.0, 0.0)]),
            InvalidInput::DuplicateId { id: 1 }
        );
        assert_eq!(
            check(&[Site::new(9, 1.0, 1.0), Site::new(2, 1.0, 1.0)]),
            InvalidInput::DuplicateCoordinates {
                first: 2,
                second: 9,
                x: 1.0,
                y: 1.0
            }
        );
        // -0.0 and 0.0 are the same coordinate
        assert!(matches!(
            check(&[Site::new(0, 0.0, 0.0), Site::new(1, -0.0, 0.0)]),
            InvalidInput::DuplicateCoordinates { .. }
        ));

        assert!(prepare(&BOX, &config, &[]).unwrap().is_empty());
        assert_eq!(
            prepare(&BOX, &config.with_require_sites(true), &[]),
            Err(InvalidInput::EmptySiteSet)
        );
        assert!(matches!(
            prepare(&BoundingBox::new(0.0, 0.0, 0.0, 1.0), &config, &[]),
            Err(InvalidInput::InvalidBounds { .. })
        ));
    }

    #[test]
    fn site_on_breakpoint() {
        // Site 2 lands on the breakpoint of sites 0 and 1, and the circle through all three
        // reaches y = 4 right away.
        let sites = [
            Site::new(0, 0.0, 0.0),
            Site::new(1, 4.0, 0.0),
            Site::new(2, 2.0, 4.0),
        ];
        let sorted = prepare(&BOX, &SweepConfig::default(), &sites).unwrap();
        let config = SweepConfig::default();
        let mut sweep = Sweep::new(&sorted, &config, 1e-9);
        sweep.run(&mut |_| {}).unwrap();

        assert_eq!(sweep.circles_fired, 1);
        assert_eq!(sweep.vertices, vec![Point::new(2.0, 1.5)]);
        assert_eq!(sweep.beach.sites().collect::<Vec<_>>(), vec![0, 2, 1]);
    }
}
