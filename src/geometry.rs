use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Opaque identifier of a site, chosen by the caller.
pub type SiteId = u64;

/// A point in 2D space. It is ordered in sweep order: by `y`, then by `x`.
#[derive(PartialEq, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A vertex of the diagram.
pub type Vertex = Point;

impl std::ops::Sub for Point {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}
impl std::ops::Add for Point {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}
impl std::ops::Mul<f64> for Point {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}
impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn dot(&self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn perp_dot(&self, other: Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// The vector rotated by a quarter turn counter-clockwise.
    pub fn rot90(&self) -> Self {
        Self::new(-self.y, self.x)
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn midpoint(self, other: Self) -> Self {
        Self::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}
impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Point")
            .field(&self.x)
            .field(&self.y)
            .finish()
    }
}
impl std::hash::Hash for Point {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
    }
}
impl Eq for Point {}
impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        self.y.total_cmp(&other.y).then(self.x.total_cmp(&other.x))
    }
}

/// An input point of the diagram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: SiteId,
    pub x: f64,
    pub y: f64,
}

impl Site {
    pub const fn new(id: SiteId, x: f64, y: f64) -> Self {
        Self { id, x, y }
    }

    pub fn pos(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

pub fn dist(a: Point, b: Point) -> f64 {
    (a - b).length()
}

/// Sine of the turn from `b - a` to `c - b`. Positive for a counter-clockwise turn, zero when
/// the points are collinear or two of them coincide.
pub fn turn(a: Point, b: Point, c: Point) -> f64 {
    let ab = b - a;
    let bc = c - b;
    let norm = ab.length() * bc.length();
    if norm == 0.0 {
        return 0.0;
    }
    ab.perp_dot(bc) / norm
}

/// Finds the circumcenter of the triangle formed by the points `a`, `b`, and `c`.
pub fn circumcenter(a: Point, b: Point, c: Point) -> Option<Point> {
    // Translating to `a` keeps the squared terms small for sites far from the origin.
    let b = b - a;
    let c = c - a;
    let d = 2.0 * b.perp_dot(c);

    if d == 0.0 {
        return None;
    }

    let b2 = b.dot(b);
    let c2 = c.dot(c);
    let ux = (c.y * b2 - b.y * c2) / d;
    let uy = (b.x * c2 - c.x * b2) / d;

    let center = Point::new(a.x + ux, a.y + uy);
    center.is_finite().then_some(center)
}

/// The y value of the parabola with focus `focus` and horizontal directrix at `directrix`, at
/// the given x. The directrix is the sweep line, so the parabola opens downwards.
pub fn parabola_y(focus: Point, directrix: f64, x: f64) -> f64 {
    let dx = x - focus.x;
    (dx * dx + focus.y * focus.y - directrix * directrix) / (2.0 * (focus.y - directrix))
}

/// The x coordinate of the breakpoint between the arc of `left` and the arc of `right`, when
/// the sweep line is at `directrix`.
///
/// Arcs whose focus lies on the directrix are vertical rays, so the breakpoint sits at their
/// x. Two such foci, or any two foci at the same height, meet on their vertical bisector.
pub fn breakpoint_x(left: Point, right: Point, directrix: f64) -> f64 {
    if left.y == right.y {
        return (left.x + right.x) / 2.0;
    }
    if left.y == directrix {
        return left.x;
    }
    if right.y == directrix {
        return right.x;
    }

    // With `u = x - left.x`, the arcs meet where
    // `(p2 - p1)·u² + 2·p1·dx·u + p1·(p2·(p1 - p2) - dx²) = 0`, `p1` and `p2` being the offsets
    // of the foci from the directrix. The discriminant factors into `p1·p2·|right - left|²`.
    let p1 = left.y - directrix;
    let p2 = right.y - directrix;
    let dx = right.x - left.x;

    let a = p2 - p1;
    let b = p1 * dx;
    let c = p1 * (p2 * (p1 - p2) - dx * dx);
    let s = (p1 * p2).max(0.0).sqrt() * dx.hypot(p1 - p2);

    // the root computed as `c / q` stays accurate when `a` is tiny
    let q = -(b + b.signum() * s);
    let (r1, r2) = (q / a, c / q);
    let (lo, hi) = if r1 <= r2 { (r1, r2) } else { (r2, r1) };
    let (lo, hi) = (left.x + lo, left.x + hi);

    // The focus closer to the sweep line has the narrower arc. It is the one sitting between
    // the two intersections, so `left` ends at the larger root when it is the narrow one.
    if left.y > right.y {
        hi
    } else {
        lo
    }
}
