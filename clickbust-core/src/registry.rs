//! # Pending-Touch Registry
//!
//! Recent gesture-start positions, oldest first. Each entry is matchable
//! until its eviction fires or a click consumes it, whichever comes first.
//!
//! Eviction is driven by the host: [`TouchRegistry::register`] returns an
//! [`EvictionTicket`] that the host schedules and later hands back to
//! [`TouchRegistry::evict`]. Tickets are never cancelled; evicting a point that
//! was already consumed is a no-op.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::config::Tolerance;
use crate::event::Point;

/// A registered gesture start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingTouch {
    /// Where the gesture started.
    pub point: Point,
    /// When it was registered (ms).
    pub registered_at_ms: u64,
}

/// A deferred eviction the host must schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvictionTicket {
    /// Point to evict.
    pub point: Point,
    /// Delay from registration until eviction (ms).
    pub delay_ms: u64,
    /// Absolute time the eviction is due (ms).
    pub due_at_ms: u64,
}

/// Ordered store of pending gesture starts.
#[derive(Debug, Clone)]
pub struct TouchRegistry {
    pending: VecDeque<PendingTouch>,
    eviction_window_ms: u64,
}

impl TouchRegistry {
    /// Create an empty registry whose entries live for `eviction_window_ms`.
    #[must_use]
    pub fn new(eviction_window_ms: u64) -> Self {
        Self {
            pending: VecDeque::new(),
            eviction_window_ms,
        }
    }

    /// Append a point and describe its eviction.
    pub fn register(&mut self, point: Point, now_ms: u64) -> EvictionTicket {
        self.pending.push_back(PendingTouch {
            point,
            registered_at_ms: now_ms,
        });
        EvictionTicket {
            point,
            delay_ms: self.eviction_window_ms,
            due_at_ms: now_ms.saturating_add(self.eviction_window_ms),
        }
    }

    /// Remove the oldest entry equal to the ticket's point, if any is left.
    pub fn evict(&mut self, ticket: &EvictionTicket) -> bool {
        match self.pending.iter().position(|p| p.point == ticket.point) {
            Some(index) => {
                self.pending.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove and return the oldest entry within `tolerance` of `point`.
    ///
    /// Both axes must be strictly within tolerance. The first qualifying entry
    /// wins even if a later one is closer.
    pub fn find_and_consume(&mut self, point: Point, tolerance: Tolerance) -> Option<PendingTouch> {
        let index = self
            .pending
            .iter()
            .position(|p| within(p.point, point, tolerance))?;
        self.pending.remove(index)
    }

    /// Remove every entry within `tolerance` of the origin.
    pub fn purge_origin(&mut self, tolerance: Tolerance) -> usize {
        let before = self.pending.len();
        self.pending
            .retain(|p| !within(p.point, Point::ORIGIN, tolerance));
        before - self.pending.len()
    }

    /// Whether an entry equal to `point` is pending.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        self.pending.iter().any(|p| p.point == point)
    }

    /// Pending entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &PendingTouch> {
        self.pending.iter()
    }

    /// Number of pending entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Lifetime of an entry (ms).
    #[must_use]
    pub const fn eviction_window_ms(&self) -> u64 {
        self.eviction_window_ms
    }
}

fn within(a: Point, b: Point, tolerance: Tolerance) -> bool {
    (a.x - b.x).abs() < tolerance.x && (a.y - b.y).abs() < tolerance.y
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TOL: Tolerance = Tolerance::new(25.0, 25.0);

    fn registry_with(points: &[(f32, f32)]) -> TouchRegistry {
        let mut registry = TouchRegistry::new(2500);
        for (i, &(x, y)) in points.iter().enumerate() {
            registry.register(Point::new(x, y), i as u64);
        }
        registry
    }

    #[test]
    fn register_returns_ticket_due_after_window() {
        let mut registry = TouchRegistry::new(2500);
        let ticket = registry.register(Point::new(100.0, 100.0), 1_000);
        assert_eq!(ticket.due_at_ms, 3_500);
        assert_eq!(ticket.delay_ms, 2500);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn match_is_strict_per_axis() {
        let mut registry = registry_with(&[(100.0, 100.0)]);
        assert!(registry.find_and_consume(Point::new(125.0, 100.0), TOL).is_none());
        assert!(registry.find_and_consume(Point::new(100.0, 75.0), TOL).is_none());
        let hit = registry.find_and_consume(Point::new(124.5, 75.5), TOL);
        assert_eq!(hit.map(|p| p.point), Some(Point::new(100.0, 100.0)));
        assert!(registry.is_empty());
    }

    #[test]
    fn box_test_not_radius() {
        // Distance ~33.9 but inside the box on both axes.
        let mut registry = registry_with(&[(0.0, 0.0)]);
        assert!(registry.find_and_consume(Point::new(24.0, 24.0), TOL).is_some());
    }

    #[test]
    fn first_qualifying_entry_wins() {
        let mut registry = registry_with(&[(100.0, 100.0), (101.0, 101.0)]);
        let hit = registry
            .find_and_consume(Point::new(101.0, 101.0), TOL)
            .expect("match");
        assert_eq!(hit.point, Point::new(100.0, 100.0));
        assert!(registry.contains(Point::new(101.0, 101.0)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn ticket_delay_follows_configured_window() {
        let mut registry = TouchRegistry::new(700);
        assert_eq!(registry.eviction_window_ms(), 700);
        let ticket = registry.register(Point::new(1.0, 2.0), 40);
        assert_eq!(ticket.delay_ms, 700);
        assert_eq!(ticket.due_at_ms, 740);
    }

    #[test]
    fn evict_after_consume_is_a_no_op() {
        let mut registry = TouchRegistry::new(2500);
        let ticket = registry.register(Point::new(10.0, 10.0), 0);
        assert!(registry.find_and_consume(Point::new(10.0, 10.0), TOL).is_some());
        assert!(!registry.evict(&ticket));
    }

    #[test]
    fn evict_removes_by_equality() {
        let mut registry = TouchRegistry::new(2500);
        let ticket = registry.register(Point::new(10.0, 10.0), 0);
        registry.register(Point::new(50.0, 50.0), 5);
        assert!(registry.evict(&ticket));
        assert_eq!(
            registry.iter().map(|p| p.point).collect::<Vec<_>>(),
            vec![Point::new(50.0, 50.0)]
        );
    }

    #[test]
    fn purge_origin_removes_near_zero_entries() {
        let mut registry = registry_with(&[(0.0, 0.0), (3.0, 20.0), (30.0, 0.0), (200.0, 200.0)]);
        assert_eq!(registry.purge_origin(TOL), 2);
        assert_eq!(
            registry.iter().map(|p| p.point).collect::<Vec<_>>(),
            vec![Point::new(30.0, 0.0), Point::new(200.0, 200.0)]
        );
    }

    proptest! {
        #[test]
        fn consumed_entry_is_removed_exactly_once(
            x in 1.0f32..1000.0,
            y in 1.0f32..1000.0,
            dx in -24.0f32..24.0,
            dy in -24.0f32..24.0,
        ) {
            let mut registry = TouchRegistry::new(2500);
            let ticket = registry.register(Point::new(x, y), 0);
            let hit = registry.find_and_consume(Point::new(x + dx, y + dy), TOL);
            prop_assert!(hit.is_some());
            prop_assert!(registry.is_empty());
            prop_assert!(!registry.evict(&ticket));
        }

        #[test]
        fn far_clicks_never_match(
            x in 0.0f32..1000.0,
            y in 0.0f32..1000.0,
            dx in 26.0f32..500.0,
        ) {
            let mut registry = TouchRegistry::new(2500);
            registry.register(Point::new(x, y), 0);
            prop_assert!(registry.find_and_consume(Point::new(x + dx, y), TOL).is_none());
            prop_assert_eq!(registry.len(), 1);
        }
    }
}
