//! Deadline queue for playback ticks.
//!
//! Deadlines are absolute engine times. The embedder asks
//! [`next_deadline`](TickQueue::next_deadline) how long to sleep, then
//! drains everything due with [`pop_due`](TickQueue::pop_due).
//!
//! Cancellation never reaches into the heap. A cancelled run bumps its
//! panel's generation, and the orchestrator drops popped entries whose
//! generation no longer matches; abandoned entries drain harmlessly.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Duration;

use crate::panel::PanelId;
use crate::playback::Generation;

/// A due tick, popped from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEntry {
    pub due: Duration,
    pub panel: PanelId,
    pub generation: Generation,
}

// Ordered by due time, then insertion sequence. The sequence is unique, so
// ties within one due time pop in insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Slot {
    due: Duration,
    seq: u64,
    panel: PanelId,
    generation: Generation,
}

/// Min-heap of pending ticks.
#[derive(Debug, Default)]
pub struct TickQueue {
    heap: BinaryHeap<Reverse<Slot>>,
    seq: u64,
}

impl TickQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Enqueues a tick for `panel` at absolute time `due`, stamped with the
    /// generation current at scheduling time.
    pub fn schedule(&mut self, due: Duration, panel: PanelId, generation: Generation) {
        self.heap.push(Reverse(Slot {
            due,
            seq: self.seq,
            panel,
            generation,
        }));
        self.seq += 1;
    }

    /// Earliest pending deadline, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse(slot)| slot.due)
    }

    /// Pops the earliest entry due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<TickEntry> {
        let Reverse(slot) = self.heap.peek()?;
        if slot.due > now {
            return None;
        }
        self.heap.pop().map(|Reverse(slot)| TickEntry {
            due: slot.due,
            panel: slot.panel,
            generation: slot.generation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn generation() -> Generation {
        Generation::default()
    }

    #[test]
    fn pops_in_due_order() {
        let mut queue = TickQueue::new();
        queue.schedule(ms(90), PanelId::new(1), generation());
        queue.schedule(ms(30), PanelId::new(2), generation());
        queue.schedule(ms(60), PanelId::new(3), generation());

        let order: Vec<PanelId> =
            std::iter::from_fn(|| queue.pop_due(ms(100)).map(|e| e.panel)).collect();
        assert_eq!(
            order,
            vec![PanelId::new(2), PanelId::new(3), PanelId::new(1)]
        );
    }

    #[test]
    fn ties_pop_in_insertion_order() {
        let mut queue = TickQueue::new();
        queue.schedule(ms(50), PanelId::new(4), generation());
        queue.schedule(ms(50), PanelId::new(2), generation());
        queue.schedule(ms(50), PanelId::new(9), generation());

        let order: Vec<PanelId> =
            std::iter::from_fn(|| queue.pop_due(ms(50)).map(|e| e.panel)).collect();
        assert_eq!(
            order,
            vec![PanelId::new(4), PanelId::new(2), PanelId::new(9)]
        );
    }

    #[test]
    fn nothing_pops_before_its_deadline() {
        let mut queue = TickQueue::new();
        queue.schedule(ms(50), PanelId::new(1), generation());

        assert_eq!(queue.pop_due(ms(49)), None);
        assert_eq!(queue.len(), 1);

        // Inclusive at exactly the deadline.
        let entry = queue.pop_due(ms(50)).unwrap();
        assert_eq!(entry.due, ms(50));
        assert!(queue.is_empty());
    }

    #[test]
    fn next_deadline_tracks_the_earliest_entry() {
        let mut queue = TickQueue::new();
        assert_eq!(queue.next_deadline(), None);

        queue.schedule(ms(80), PanelId::new(1), generation());
        queue.schedule(ms(20), PanelId::new(2), generation());
        assert_eq!(queue.next_deadline(), Some(ms(20)));

        queue.pop_due(ms(20)).unwrap();
        assert_eq!(queue.next_deadline(), Some(ms(80)));
    }

    #[test]
    fn interleaved_cadences_keep_relative_order() {
        let mut queue = TickQueue::new();
        // Panel 1 every 40ms, panel 2 every 100ms.
        for i in 1..=5 {
            queue.schedule(ms(40 * i), PanelId::new(1), generation());
        }
        for i in 1..=2 {
            queue.schedule(ms(100 * i), PanelId::new(2), generation());
        }

        let order: Vec<(u64, PanelId)> =
            std::iter::from_fn(|| queue.pop_due(ms(200)).map(|e| (e.due.as_millis() as u64, e.panel)))
                .collect();
        assert_eq!(
            order,
            vec![
                (40, PanelId::new(1)),
                (80, PanelId::new(1)),
                (100, PanelId::new(2)),
                (120, PanelId::new(1)),
                (160, PanelId::new(1)),
                (200, PanelId::new(1)),
                (200, PanelId::new(2)),
            ]
        );
    }
}
