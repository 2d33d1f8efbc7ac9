use core::fmt;
use std::cmp::Ordering;

use crate::beachline::ArcIdx;
use crate::geometry::{Point, SiteId};
use crate::SiteIdx;

/// Handle of a scheduled circle event, used to invalidate it.
pub type CircleHandle = usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SiteEvent {
    pub site: SiteIdx,
    pub id: SiteId,
    pub pos: Point,
}

/// The moment the sweep line reaches the top of the circle through the sites of three
/// consecutive arcs, squeezing the middle one out of the beach line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleEvent {
    pub handle: CircleHandle,
    /// The arc that vanishes.
    pub arc: ArcIdx,
    /// The circumcenter, a vertex of the diagram.
    pub vertex: Point,
    /// The sweep y at which the event happens: the vertex y plus the circle radius.
    pub y: f64,
    /// Ids of the left, middle and right sites.
    pub sites: [SiteId; 3],
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Site(SiteEvent),
    Circle(CircleEvent),
}

impl Event {
    /// The position of the sweep line when this event happens, and the x where it happens.
    pub fn pos(&self) -> Point {
        match self {
            Event::Site(e) => e.pos,
            Event::Circle(e) => Point::new(e.vertex.x, e.y),
        }
    }
}

/// Total order of events: sweep y, then x, then site events before circle events. Remaining
/// ties are broken by site ids, and between circle events of the same sites by scheduling order.
fn event_cmp(a: &Event, b: &Event) -> Ordering {
    a.pos().cmp(&b.pos()).then_with(|| match (a, b) {
        (Event::Site(a), Event::Site(b)) => a.id.cmp(&b.id),
        (Event::Site(_), Event::Circle(_)) => Ordering::Less,
        (Event::Circle(_), Event::Site(_)) => Ordering::Greater,
        (Event::Circle(a), Event::Circle(b)) => {
            let [al, am, ar] = a.sites;
            let [bl, bm, br] = b.sites;
            (am, al, ar, a.handle).cmp(&(bm, bl, br, b.handle))
        }
    })
}

/// A min-heap, with a custom comparator.
struct Heap<T, F> {
    data: Vec<T>,
    cmp: F,
}
impl<T, F: Fn(&T, &T) -> Ordering> Heap<T, F> {
    fn new(cmp: F) -> Self {
        Heap {
            data: Vec::new(),
            cmp,
        }
    }

    fn push(&mut self, value: T) {
        self.data.push(value);
        self.sift_up(self.data.len() - 1);
    }

    fn pop(&mut self) -> Option<T> {
        if self.data.is_empty() {
            return None;
        }
        let ret = self.data.swap_remove(0);
        self.sift_down(0);
        Some(ret)
    }

    fn peek(&self) -> Option<&T> {
        self.data.first()
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn less(&self, i: usize, j: usize) -> bool {
        (self.cmp)(&self.data[i], &self.data[j]) == Ordering::Less
    }

    fn sift_up(&mut self, mut i: usize) {
        while i > 0 {
            let p = (i - 1) / 2;
            if !self.less(i, p) {
                break;
            }
            self.data.swap(i, p);
            i = p;
        }
    }

    fn sift_down(&mut self, mut i: usize) {
        while 2 * i + 1 < self.data.len() {
            let l = 2 * i + 1;
            let r = 2 * i + 2;
            let mut j = l;
            if r < self.data.len() && self.less(r, l) {
                j = r;
            }
            if !self.less(j, i) {
                break;
            }
            self.data.swap(i, j);
            i = j;
        }
    }
}

impl<T: fmt::Debug, F> fmt::Debug for Heap<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.data)
    }
}

/// The event schedule of the sweep.
///
/// Circle events are never searched for and removed. [`EventQueue::invalidate`] marks them
/// dead in O(1) and the queue drops them when they reach the front.
#[derive(Debug)]
pub struct EventQueue {
    heap: Heap<Event, fn(&Event, &Event) -> Ordering>,
    /// Liveness of every circle event ever scheduled, indexed by handle.
    live: Vec<bool>,
    invalidated: usize,
    skipped: usize,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self {
            heap: Heap::new(event_cmp as fn(&Event, &Event) -> Ordering),
            live: Vec::new(),
            invalidated: 0,
            skipped: 0,
        }
    }

    pub fn push_site(&mut self, site: SiteIdx, id: SiteId, pos: Point) {
        self.heap.push(Event::Site(SiteEvent { site, id, pos }));
    }

    /// Schedule a circle event and return the handle that can invalidate it.
    pub fn schedule_circle(
        &mut self,
        arc: ArcIdx,
        vertex: Point,
        y: f64,
        sites: [SiteId; 3],
    ) -> CircleHandle {
        let handle = self.live.len();
        self.live.push(true);
        self.heap.push(Event::Circle(CircleEvent {
            handle,
            arc,
            vertex,
            y,
            sites,
        }));
        handle
    }

    /// Mark a circle event as dead. Returns false if it was already dead or has been popped.
    pub fn invalidate(&mut self, handle: CircleHandle) -> bool {
        let was_live = std::mem::replace(&mut self.live[handle], false);
        if was_live {
            self.invalidated += 1;
        }
        was_live
    }

    /// The next live event, if any.
    pub fn peek_min(&mut self) -> Option<&Event> {
        self.discard_dead();
        self.heap.peek()
    }

    /// Remove and return the next live event. An empty queue ends the sweep.
    pub fn pop_min(&mut self) -> Option<Event> {
        self.discard_dead();
        let event = self.heap.pop()?;
        if let Event::Circle(circle) = &event {
            self.live[circle.handle] = false;
        }
        Some(event)
    }

    fn discard_dead(&mut self) {
        while let Some(Event::Circle(circle)) = self.heap.peek() {
            if self.live[circle.handle] {
                break;
            }
            self.heap.pop();
            self.skipped += 1;
        }
    }

    /// Number of queued entries, dead ones included.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.len() == 0
    }

    pub fn circles_scheduled(&self) -> usize {
        self.live.len()
    }

    pub fn circles_invalidated(&self) -> usize {
        self.invalidated
    }

    /// Dead circle events dropped from the front of the queue so far.
    pub fn circles_skipped(&self) -> usize {
        self.skipped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_heap() {
        let mut heap = Heap::new(|a: &i32, b: &i32| a.cmp(b));
        assert_eq!(heap.pop(), None);
        heap.push(3);
        heap.push(2);
        heap.push(1);
        heap.push(4);
        assert_eq!(heap.len(), 4);
        assert_eq!(heap.pop(), Some(1));
        assert_eq!(heap.pop(), Some(2));
        assert_eq!(heap.pop(), Some(3));
        assert_eq!(heap.pop(), Some(4));
        assert_eq!(heap.pop(), None);
        assert_eq!(heap.len(), 0);
    }

    proptest! {
        #[test]
        fn always_sort(mut items: Vec<u32>) {
            let mut heap = Heap::new(u32::cmp);

            for item in items.iter().copied() {
                heap.push(item);
            }

            let mut heap_order = vec![];
            while let Some(item) = heap.pop() {
                heap_order.push(item);
            }

            items.sort();

            prop_assert_eq!(items, heap_order);
        }
    }

    fn popped_positions(queue: &mut EventQueue) -> Vec<(f64, f64)> {
        let mut out = vec![];
        while let Some(event) = queue.pop_min() {
            let p = event.pos();
            out.push((p.x, p.y));
        }
        out
    }

    #[test]
    fn events_in_sweep_order() {
        let mut queue = EventQueue::new();
        queue.push_site(0, 10, Point::new(3.0, 1.0));
        queue.push_site(1, 11, Point::new(-1.0, 2.0));
        queue.push_site(2, 12, Point::new(1.0, 1.0));
        queue.schedule_circle(0, Point::new(0.0, 0.5), 1.5, [10, 11, 12]);

        assert_eq!(
            popped_positions(&mut queue),
            vec![(1.0, 1.0), (3.0, 1.0), (0.0, 1.5), (-1.0, 2.0)]
        );
    }

    #[test]
    fn site_before_circle_at_same_position() {
        let mut queue = EventQueue::new();
        queue.schedule_circle(0, Point::new(1.0, 0.0), 2.0, [0, 1, 2]);
        queue.push_site(3, 3, Point::new(1.0, 2.0));

        assert!(matches!(queue.pop_min(), Some(Event::Site(_))));
        assert!(matches!(queue.pop_min(), Some(Event::Circle(_))));
        assert_eq!(queue.pop_min(), None);
    }

    #[test]
    fn coincident_circles_ordered_by_middle_site() {
        let mut queue = EventQueue::new();
        queue.schedule_circle(7, Point::new(1.0, 1.0), 3.0, [0, 5, 2]);
        queue.schedule_circle(8, Point::new(1.0, 1.0), 3.0, [4, 1, 3]);

        let Some(Event::Circle(first)) = queue.pop_min() else {
            panic!("expected a circle event");
        };
        assert_eq!(first.arc, 8);
    }

    #[test]
    fn invalidated_circles_are_skipped() {
        let mut queue = EventQueue::new();
        let a = queue.schedule_circle(0, Point::new(0.0, 0.0), 1.0, [0, 1, 2]);
        let b = queue.schedule_circle(1, Point::new(0.0, 0.0), 2.0, [1, 2, 3]);
        queue.push_site(0, 0, Point::new(0.0, 3.0));

        assert!(queue.invalidate(a));
        assert!(!queue.invalidate(a));
        assert_eq!(queue.circles_invalidated(), 1);

        let Some(Event::Circle(first)) = queue.peek_min().copied() else {
            panic!("expected a circle event");
        };
        assert_eq!(first.handle, b);
        assert_eq!(queue.circles_skipped(), 1);

        queue.pop_min();
        // popped events can no longer be invalidated
        assert!(!queue.invalidate(b));
        assert!(matches!(queue.pop_min(), Some(Event::Site(_))));
        assert!(queue.pop_min().is_none());
        assert!(queue.is_empty());
        assert_eq!(queue.circles_scheduled(), 2);
    }
}
