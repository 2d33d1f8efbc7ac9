use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::bisector::BisectorIdx;
use crate::error::InvariantViolation;
use crate::event_queue::CircleHandle;
use crate::geometry::{breakpoint_x, Site};
use crate::SiteIdx;

/// Stable handle of an arc in the beach line arena.
pub type ArcIdx = usize;

const LEFT: usize = 0;
const RIGHT: usize = 1;

/// A parabolic arc of the beach line.
#[derive(Clone, Debug)]
pub struct Arc {
    pub site: SiteIdx,
    /// The bisector traced by the breakpoint with the previous arc.
    pub left: Option<BisectorIdx>,
    /// The bisector traced by the breakpoint with the next arc.
    pub right: Option<BisectorIdx>,
    /// The circle event that would squeeze this arc out, if one is scheduled.
    pub circle: Option<CircleHandle>,
    prev: Option<ArcIdx>,
    next: Option<ArcIdx>,
    parent: Option<ArcIdx>,
    children: [Option<ArcIdx>; 2],
    priority: u32,
}

/// The sequence of arcs closest to the sweep line, from left to right.
///
/// Arcs live in an arena and are threaded twice: as a doubly linked list in beach line order,
/// and as a treap over the same order, which gives expected O(log n) search, insertion and
/// removal. The treap stores no keys. Searching recomputes the breakpoints of each visited arc
/// from its neighbors' sites and the current sweep line, so the structure stays valid as the
/// sweep advances.
#[derive(Clone)]
pub struct BeachLine {
    arcs: Vec<Arc>,
    free: Vec<ArcIdx>,
    root: Option<ArcIdx>,
    first: Option<ArcIdx>,
    last: Option<ArcIdx>,
    len: usize,
    rng: SmallRng,
}

impl std::fmt::Debug for BeachLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|a| self.arcs[a].site))
            .finish()
    }
}

impl Default for BeachLine {
    fn default() -> Self {
        Self::new()
    }
}

impl BeachLine {
    pub fn new() -> Self {
        Self {
            arcs: Vec::new(),
            free: Vec::new(),
            root: None,
            first: None,
            last: None,
            len: 0,
            rng: SmallRng::seed_from_u64(0x5eed_0f_a2c5),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn arc(&self, idx: ArcIdx) -> &Arc {
        &self.arcs[idx]
    }

    pub fn arc_mut(&mut self, idx: ArcIdx) -> &mut Arc {
        &mut self.arcs[idx]
    }

    pub fn prev(&self, idx: ArcIdx) -> Option<ArcIdx> {
        self.arcs[idx].prev
    }

    pub fn next(&self, idx: ArcIdx) -> Option<ArcIdx> {
        self.arcs[idx].next
    }

    /// The arcs from left to right.
    pub fn iter(&self) -> impl Iterator<Item = ArcIdx> + '_ {
        std::iter::successors(self.first, |&a| self.arcs[a].next)
    }

    /// The sites of the arcs from left to right.
    pub fn sites(&self) -> impl Iterator<Item = SiteIdx> + '_ {
        self.iter().map(|a| self.arcs[a].site)
    }

    /// Find the arc above the vertical line at `x`, with the sweep line at `y`.
    ///
    /// If `x` falls exactly on a breakpoint, the arc whose site has the smaller id is returned.
    /// Both sides of a breakpoint compute it from the same two sites, so the decision is the
    /// same wherever the descent meets it.
    pub fn locate(&self, sites: &[Site], x: f64, y: f64) -> Option<ArcIdx> {
        let mut node = self.root?;
        loop {
            let arc = &self.arcs[node];
            let this = &sites[arc.site as usize];

            if let Some(prev) = arc.prev {
                let left = &sites[self.arcs[prev].site as usize];
                let bx = breakpoint_x(left.pos(), this.pos(), y);
                if x < bx || (x == bx && left.id < this.id) {
                    node = arc.children[LEFT]?;
                    continue;
                }
            }

            if let Some(next) = arc.next {
                let right = &sites[self.arcs[next].site as usize];
                let bx = breakpoint_x(this.pos(), right.pos(), y);
                if x > bx || (x == bx && right.id < this.id) {
                    node = arc.children[RIGHT]?;
                    continue;
                }
            }

            return Some(node);
        }
    }

    /// Append an arc at the right end of the beach line.
    pub fn push_back(&mut self, site: SiteIdx) -> ArcIdx {
        let idx = self.alloc(site);
        match self.last {
            Some(last) => self.link_after(last, idx),
            None => {
                self.root = Some(idx);
                self.first = Some(idx);
                self.last = Some(idx);
            }
        }
        self.len += 1;
        idx
    }

    /// Split `arc` by a new arc of `site`, creating the sequence (left copy, new arc, right
    /// copy). `arc` itself becomes the left copy and keeps its left bisector; the right copy
    /// takes over its right bisector. Both breakpoints of the new arc trace `bisector`.
    ///
    /// Returns the (left, middle, right) arcs.
    pub fn insert_above(
        &mut self,
        arc: ArcIdx,
        site: SiteIdx,
        bisector: BisectorIdx,
    ) -> (ArcIdx, ArcIdx, ArcIdx) {
        let split_site = self.arcs[arc].site;
        let old_right = self.arcs[arc].right;

        let middle = self.alloc(site);
        self.link_after(arc, middle);
        let right = self.alloc(split_site);
        self.link_after(middle, right);
        self.len += 2;

        self.arcs[arc].right = Some(bisector);
        self.arcs[middle].left = Some(bisector);
        self.arcs[middle].right = Some(bisector);
        self.arcs[right].left = Some(bisector);
        self.arcs[right].right = old_right;

        (arc, middle, right)
    }

    /// Remove a squeezed arc. Its two neighbors become adjacent, separated by `merged`.
    ///
    /// Returns the (left, right) neighbors.
    pub fn remove(
        &mut self,
        arc: ArcIdx,
        merged: BisectorIdx,
    ) -> Result<(ArcIdx, ArcIdx), InvariantViolation> {
        let (Some(left), Some(right)) = (self.arcs[arc].prev, self.arcs[arc].next) else {
            return Err(InvariantViolation::OrphanCircleEvent { arc });
        };

        self.unlink(arc);

        self.arcs[left].right = Some(merged);
        self.arcs[right].left = Some(merged);

        Ok((left, right))
    }

    /// Check that the breakpoints are in non-decreasing order at sweep line `y`.
    pub fn check_order(
        &self,
        sites: &[Site],
        y: f64,
        tolerance: f64,
    ) -> Result<(), InvariantViolation> {
        let mut last = f64::NEG_INFINITY;
        for a in self.iter() {
            let Some(next) = self.arcs[a].next else {
                break;
            };
            let l = sites[self.arcs[a].site as usize].pos();
            let r = sites[self.arcs[next].site as usize].pos();
            let bx = breakpoint_x(l, r, y);
            if bx < last - tolerance {
                return Err(InvariantViolation::BeachLineUnordered {
                    y,
                    left: last,
                    right: bx,
                });
            }
            last = last.max(bx);
        }
        Ok(())
    }

    fn alloc(&mut self, site: SiteIdx) -> ArcIdx {
        let arc = Arc {
            site,
            left: None,
            right: None,
            circle: None,
            prev: None,
            next: None,
            parent: None,
            children: [None, None],
            priority: self.rng.gen(),
        };
        match self.free.pop() {
            Some(idx) => {
                self.arcs[idx] = arc;
                idx
            }
            None => {
                self.arcs.push(arc);
                self.arcs.len() - 1
            }
        }
    }

    /// Insert the detached node `idx` right after `anchor`, both in the list and in the tree.
    fn link_after(&mut self, anchor: ArcIdx, idx: ArcIdx) {
        let next = self.arcs[anchor].next;
        self.arcs[idx].prev = Some(anchor);
        self.arcs[idx].next = next;
        self.arcs[anchor].next = Some(idx);
        match next {
            Some(n) => self.arcs[n].prev = Some(idx),
            None => self.last = Some(idx),
        }

        // The in-order successor of `anchor` is the leftmost node of its right subtree, whose
        // left slot is free. Without a right subtree, the right slot of `anchor` is free.
        let (parent, side) = match self.arcs[anchor].children[RIGHT] {
            None => (anchor, RIGHT),
            Some(mut node) => {
                while let Some(l) = self.arcs[node].children[LEFT] {
                    node = l;
                }
                (node, LEFT)
            }
        };
        self.arcs[parent].children[side] = Some(idx);
        self.arcs[idx].parent = Some(parent);

        while let Some(p) = self.arcs[idx].parent {
            if self.arcs[p].priority >= self.arcs[idx].priority {
                break;
            }
            self.rotate_up(idx);
        }
    }

    /// Detach `idx` from the list and the tree, and recycle its slot.
    fn unlink(&mut self, idx: ArcIdx) {
        // rotate the node down until it is a leaf
        loop {
            let [l, r] = self.arcs[idx].children;
            let child = match (l, r) {
                (None, None) => break,
                (Some(c), None) | (None, Some(c)) => c,
                (Some(l), Some(r)) => {
                    if self.arcs[l].priority > self.arcs[r].priority {
                        l
                    } else {
                        r
                    }
                }
            };
            self.rotate_up(child);
        }

        match self.arcs[idx].parent {
            Some(p) => {
                let side = self.side_of(p, idx);
                self.arcs[p].children[side] = None;
            }
            None => self.root = None,
        }

        let (prev, next) = (self.arcs[idx].prev, self.arcs[idx].next);
        match prev {
            Some(p) => self.arcs[p].next = next,
            None => self.first = next,
        }
        match next {
            Some(n) => self.arcs[n].prev = prev,
            None => self.last = prev,
        }

        self.arcs[idx].parent = None;
        self.arcs[idx].prev = None;
        self.arcs[idx].next = None;
        self.len -= 1;
        self.free.push(idx);
    }

    fn side_of(&self, parent: ArcIdx, child: ArcIdx) -> usize {
        if self.arcs[parent].children[LEFT] == Some(child) {
            LEFT
        } else {
            RIGHT
        }
    }

    /// Rotate `x` above its parent, preserving the in-order sequence.
    fn rotate_up(&mut self, x: ArcIdx) {
        let Some(p) = self.arcs[x].parent else {
            return;
        };
        let side = self.side_of(p, x);
        let other = 1 - side;
        let grandparent = self.arcs[p].parent;

        let moved = self.arcs[x].children[other];
        self.arcs[p].children[side] = moved;
        if let Some(m) = moved {
            self.arcs[m].parent = Some(p);
        }

        self.arcs[x].children[other] = Some(p);
        self.arcs[p].parent = Some(x);
        self.arcs[x].parent = grandparent;

        match grandparent {
            Some(g) => {
                let gside = self.side_of(g, p);
                self.arcs[g].children[gside] = Some(x);
            }
            None => self.root = Some(x),
        }
    }

    #[cfg(test)]
    fn in_order(&self) -> Vec<ArcIdx> {
        fn walk(beach: &BeachLine, node: Option<ArcIdx>, out: &mut Vec<ArcIdx>) {
            if let Some(n) = node {
                walk(beach, beach.arcs[n].children[LEFT], out);
                out.push(n);
                walk(beach, beach.arcs[n].children[RIGHT], out);
            }
        }
        let mut out = Vec::new();
        walk(self, self.root, &mut out);
        out
    }

    #[cfg(test)]
    fn is_heap_ordered(&self) -> bool {
        self.iter().all(|a| match self.arcs[a].parent {
            Some(p) => self.arcs[p].priority >= self.arcs[a].priority,
            None => self.root == Some(a),
        })
    }
}
