use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::bisector::{Bisector, Line};
use crate::clip::{clip_line, clip_polygon, polygon_area, HalfPlane};
use crate::config::BoundingBox;
use crate::error::DegeneracyWarning;
use crate::geometry::{dist, Point, Site, SiteId, Vertex};
use crate::SiteIdx;

/// Counters collected during a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SweepStats {
    pub site_events: usize,
    pub circle_events_scheduled: usize,
    pub circle_events_invalidated: usize,
    pub circle_events_fired: usize,
    /// Fired circle events whose vertex coincided with the previous one and was merged into it.
    pub merged_vertices: usize,
}

/// A finished bisector, clipped to the bounding rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// The two sites this edge separates. Going from `endpoints[0]` to `endpoints[1]`, the
    /// first site is on the left.
    pub sites: [SiteId; 2],
    /// The perpendicular bisector of the two sites.
    pub line: Line,
    pub endpoints: [Vertex; 2],
    /// Index into [`Diagram::vertices`] of each endpoint, or `None` where the edge was cut by
    /// the bounding rectangle.
    pub vertices: [Option<usize>; 2],
}

/// One side of an [`Edge`], directed counter-clockwise around the cell of `site`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HalfEdge {
    pub site: SiteId,
    pub from: Vertex,
    pub to: Vertex,
}

impl Edge {
    pub fn half_edges(&self) -> [HalfEdge; 2] {
        let [a, b] = self.endpoints;
        [
            HalfEdge {
                site: self.sites[0],
                from: a,
                to: b,
            },
            HalfEdge {
                site: self.sites[1],
                from: b,
                to: a,
            },
        ]
    }

    pub fn length(&self) -> f64 {
        dist(self.endpoints[0], self.endpoints[1])
    }

    /// The site on the other side of the edge, if `site` is one of its two sites.
    pub fn other_site(&self, site: SiteId) -> Option<SiteId> {
        match self.sites {
            [a, b] if a == site => Some(b),
            [a, b] if b == site => Some(a),
            _ => None,
        }
    }
}

/// The region of one site, clipped to the bounding rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// `None` only for the single region of a diagram without sites.
    pub site: Option<SiteId>,
    /// Counter-clockwise polygon.
    pub polygon: Vec<Vertex>,
    /// Indices into [`Diagram::edges`] of the edges bounding this cell.
    pub edges: Vec<usize>,
}

impl Cell {
    pub fn area(&self) -> f64 {
        polygon_area(&self.polygon)
    }

    /// Whether `p` lies inside the polygon or on its boundary.
    pub fn contains(&self, p: Point) -> bool {
        let n = self.polygon.len();
        n >= 3
            && (0..n).all(|i| {
                let a = self.polygon[i];
                let b = self.polygon[(i + 1) % n];
                (b - a).perp_dot(p - a) >= -1e-9 * (b - a).length()
            })
    }
}

/// A Voronoi diagram clipped to a rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    bounds: BoundingBox,
    /// Sorted by id.
    sites: Vec<Site>,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    /// Sorted by site id.
    cells: Vec<Cell>,
    stats: SweepStats,
    warnings: Vec<DegeneracyWarning>,
}

/// Everything the sweep leaves behind, indexed by sweep order of the sites.
pub(crate) struct SweepOutput {
    pub sites: Vec<Site>,
    pub bisectors: Vec<Bisector>,
    pub vertices: Vec<Point>,
    pub stats: SweepStats,
    pub warnings: Vec<DegeneracyWarning>,
}

impl Diagram {
    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// The input sites, sorted by id.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// The vertices of the diagram that lie in the bounding rectangle.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// The clipped edges, ordered by their pair of site ids.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// All cells, ordered by site id.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, site: SiteId) -> Option<&Cell> {
        self.cells
            .binary_search_by_key(&Some(site), |c| c.site)
            .ok()
            .map(|i| &self.cells[i])
    }

    /// The sites whose cells share an edge with the cell of `site`.
    pub fn neighbors(&self, site: SiteId) -> impl Iterator<Item = SiteId> + '_ {
        self.cell(site)
            .into_iter()
            .flat_map(|c| c.edges.iter())
            .filter_map(move |&e| self.edges[e].other_site(site))
    }

    pub fn stats(&self) -> &SweepStats {
        &self.stats
    }

    /// Collinear triples the sweep ignored.
    pub fn warnings(&self) -> &[DegeneracyWarning] {
        &self.warnings
    }

    /// The diagram of zero or one site: the whole rectangle is a single region.
    pub(crate) fn trivial(bounds: BoundingBox, sites: &[Site]) -> Self {
        let cell = Cell {
            site: sites.first().map(|s| s.id),
            polygon: bounds.corners().to_vec(),
            edges: Vec::new(),
        };
        Self {
            bounds,
            sites: sites.to_vec(),
            vertices: Vec::new(),
            edges: Vec::new(),
            cells: vec![cell],
            stats: SweepStats {
                site_events: sites.len(),
                ..SweepStats::default()
            },
            warnings: Vec::new(),
        }
    }

    /// Clip the bisectors of a finished sweep and build the cells.
    pub(crate) fn assemble(bounds: BoundingBox, output: SweepOutput, tolerance: f64) -> Self {
        let SweepOutput {
            sites,
            bisectors,
            vertices: raw_vertices,
            stats,
            warnings,
        } = output;

        let mut vertex_map = vec![None; raw_vertices.len()];
        let mut vertices = Vec::new();
        for (i, v) in raw_vertices.iter().enumerate() {
            if bounds.contains_within(*v, tolerance) {
                vertex_map[i] = Some(vertices.len());
                vertices.push(*v);
            }
        }

        let mut neighbors: Vec<Vec<SiteIdx>> = vec![Vec::new(); sites.len()];
        let mut clipped = Vec::new();
        for bisector in &bisectors {
            let [s0, s1] = bisector.sites;
            neighbors[s0 as usize].push(s1);
            neighbors[s1 as usize].push(s0);

            if bisector.is_degenerate() {
                continue;
            }
            let edge = clip_bisector(
                bisector,
                &sites,
                &raw_vertices,
                &vertex_map,
                &bounds,
                tolerance,
            );
            if let Some(edge) = edge {
                clipped.push((edge, bisector.sites));
            }
        }

        clipped.sort_by_key(|(e, _)| {
            let [a, b] = e.sites;
            (a.min(b), a.max(b))
        });

        let mut incident: Vec<Vec<usize>> = vec![Vec::new(); sites.len()];
        for (e, (_, pair)) in clipped.iter().enumerate() {
            for s in pair {
                incident[*s as usize].push(e);
            }
        }
        let edges: Vec<Edge> = clipped.into_iter().map(|(e, _)| e).collect();

        let mut cells: Vec<Cell> = sites
            .iter()
            .enumerate()
            .map(|(i, site)| {
                let mut polygon = bounds.corners().to_vec();
                for &n in &neighbors[i] {
                    let half_plane = HalfPlane::closer_to(site.pos(), sites[n as usize].pos());
                    polygon = clip_polygon(&polygon, &half_plane, tolerance);
                }
                let snap_to: Vec<Point> = incident[i]
                    .iter()
                    .flat_map(|&e| edges[e].endpoints)
                    .collect();
                Cell {
                    site: Some(site.id),
                    polygon: tidy_polygon(polygon, &snap_to, tolerance),
                    edges: incident[i].clone(),
                }
            })
            .collect();
        cells.sort_by_key(|c| c.site);

        let mut sites = sites;
        sites.sort_by_key(|s| s.id);

        debug!(
            "assembled diagram: {} sites, {} vertices, {} edges",
            sites.len(),
            vertices.len(),
            edges.len()
        );

        Self {
            bounds,
            sites,
            vertices,
            edges,
            cells,
            stats,
            warnings,
        }
    }
}

fn clip_bisector(
    bisector: &Bisector,
    sites: &[Site],
    raw_vertices: &[Point],
    vertex_map: &[Option<usize>],
    bounds: &BoundingBox,
    tolerance: f64,
) -> Option<Edge> {
    let origin = bisector.origin(sites);
    let dir = bisector.direction(sites);

    let ends = bisector
        .endpoints
        .map(|v| v.map(|v| (v, bisector.param(sites, raw_vertices[v]))));
    let t0 = ends[0].map_or(f64::NEG_INFINITY, |(_, t)| t);
    let t1 = ends[1].map_or(f64::INFINITY, |(_, t)| t);

    let [s0, s1] = bisector.sites.map(|s| sites[s as usize].id);
    if t0 > t1 {
        // Only rounding can reverse a segment, and then it is tiny.
        let gap = (t0 - t1) * dir.length();
        if gap > tolerance {
            warn!("bisector of sites {s0} and {s1} is reversed by {gap}");
        }
        return None;
    }

    let (c0, c1) = clip_line(origin, dir, t0, t1, bounds)?;

    let end = |slot: usize, c: f64, t: f64| match ends[slot] {
        Some((v, _)) if c == t => (raw_vertices[v], vertex_map[v]),
        _ => (origin + dir * c, None),
    };
    let (p0, v0) = end(0, c0, t0);
    let (p1, v1) = end(1, c1, t1);

    if dist(p0, p1) <= tolerance {
        return None;
    }

    Some(Edge {
        sites: [s0, s1],
        line: bisector.line,
        endpoints: [p0, p1],
        vertices: [v0, v1],
    })
}

/// Drop repeated points of a clipped polygon and snap the rest onto nearby edge endpoints, so
/// cells and edges share their coordinates.
fn tidy_polygon(polygon: Vec<Point>, snap_to: &[Point], tolerance: f64) -> Vec<Point> {
    let mut out: Vec<Point> = Vec::with_capacity(polygon.len());
    for p in polygon {
        let p = snap_to
            .iter()
            .copied()
            .find(|&q| dist(p, q) <= tolerance)
            .unwrap_or(p);
        if out.last().map_or(true, |&last| dist(last, p) > tolerance) {
            out.push(p);
        }
    }
    while out.len() > 1 && dist(out[0], out[out.len() - 1]) <= tolerance {
        out.pop();
    }
    out
}
