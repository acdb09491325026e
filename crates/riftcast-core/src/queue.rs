//! Time-ordered queue of pending events.
//!
//! The queue owns a logical clock and a min-heap of [`ScheduledEvent`]s keyed
//! by `(fire_time, sequence)`. Sequence numbers increase monotonically with
//! every insertion, so events that share a fire time come out in the order
//! they were scheduled.
//!
//! # Draining
//!
//! Two ways to consume due events:
//!
//! - [`EventQueue::drain_up_to`] returns a lazy iterator. It borrows the queue,
//!   so nothing can be scheduled while it is alive.
//! - [`EventQueue::pop_due`] hands out one event at a time. A caller can
//!   schedule between pops, and anything inserted with a fire time within the
//!   drain target is picked up by the same loop. This is how the simulation
//!   delivers damage, since delivery hooks may schedule follow-up events.
//!
//! # Invariants
//!
//! - `fire_time >= now` for every queued event
//! - an event is handed out at most once
//! - no two queued events share a sequence number
//!
//! # Example
//!
//! ```
//! use riftcast_core::queue::{EventQueue, SimTime};
//!
//! let mut queue = EventQueue::new();
//! queue.schedule(2.0, "late").unwrap();
//! queue.schedule(1.0, "early").unwrap();
//! queue.schedule(1.0, "early, second").unwrap();
//!
//! let fired: Vec<_> = queue
//!     .drain_up_to(SimTime::from_secs(5.0))
//!     .map(|event| event.payload)
//!     .collect();
//! assert_eq!(fired, vec!["early", "early, second", "late"]);
//! assert_eq!(queue.now(), SimTime::from_secs(5.0));
//! ```

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

// =============================================================================
// SimTime
// =============================================================================

/// A point on the simulation timeline, in seconds.
///
/// `SimTime` is totally ordered through [`f64::total_cmp`] so it can key a
/// heap. Constructors only produce finite, non-negative values.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime(f64);

impl SimTime {
    /// The start of every simulation.
    pub const ZERO: Self = Self(0.0);

    /// Creates a time from seconds. Negative or non-finite input maps to zero.
    #[must_use]
    pub fn from_secs(secs: f64) -> Self {
        if secs.is_finite() && secs > 0.0 {
            Self(secs)
        } else {
            Self::ZERO
        }
    }

    /// Seconds since the start of the simulation.
    #[must_use]
    pub const fn as_secs(self) -> f64 {
        self.0
    }

    /// Returns `self + delay`, rejecting delays that would move backwards.
    pub fn after(self, delay: f64) -> Result<Self, ScheduleError> {
        if !delay.is_finite() {
            return Err(ScheduleError::NonFiniteDelay);
        }
        if delay < 0.0 {
            return Err(ScheduleError::NegativeDelay(delay));
        }
        Ok(Self(self.0 + delay))
    }

    /// Seconds from `earlier` to `self`, saturating at zero.
    #[must_use]
    pub fn since(self, earlier: Self) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.0)
    }
}

// =============================================================================
// ScheduledEvent
// =============================================================================

/// Insertion sequence number of a scheduled event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventSeq(u64);

impl EventSeq {
    /// Returns the raw sequence number.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EventSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "event:{}", self.0)
    }
}

/// An event owned by the queue until it fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent<T> {
    /// When the event fires.
    pub fire_at: SimTime,
    /// Insertion order, the tie-breaker for equal fire times.
    pub seq: EventSeq,
    /// Data handed to whoever drains the event.
    pub payload: T,
}

/// Heap entry reversing the `(fire_at, seq)` order so the max-heap pops the
/// earliest event first.
struct Slot<T>(ScheduledEvent<T>);

impl<T> Slot<T> {
    fn key(&self) -> (SimTime, EventSeq) {
        (self.0.fire_at, self.0.seq)
    }
}

impl<T> PartialEq for Slot<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl<T> Eq for Slot<T> {}

impl<T> PartialOrd for Slot<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Slot<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

// =============================================================================
// EventQueue
// =============================================================================

/// Min-heap of pending events plus the logical clock they are scheduled
/// against.
pub struct EventQueue<T> {
    heap: BinaryHeap<Slot<T>>,
    now: SimTime,
    next_seq: u64,
}

impl<T> fmt::Debug for EventQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("now", &self.now)
            .field("pending", &self.heap.len())
            .field("next_seq", &self.next_seq)
            .finish()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> EventQueue<T> {
    /// Creates an empty queue at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            now: SimTime::ZERO,
            next_seq: 0,
        }
    }

    /// Current logical time.
    #[must_use]
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Schedules `payload` to fire `delay` seconds from now.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError`] if `delay` is negative or not finite. The
    /// queue is left unchanged.
    pub fn schedule(&mut self, delay: f64, payload: T) -> Result<EventSeq, ScheduleError> {
        let fire_at = self.now.after(delay)?;
        Ok(self.insert(fire_at, payload))
    }

    /// Schedules `payload` at an absolute time.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::NegativeDelay`] if `at` lies before `now`.
    pub fn schedule_at(&mut self, at: SimTime, payload: T) -> Result<EventSeq, ScheduleError> {
        if at < self.now {
            return Err(ScheduleError::NegativeDelay(
                at.as_secs() - self.now.as_secs(),
            ));
        }
        Ok(self.insert(at, payload))
    }

    fn insert(&mut self, fire_at: SimTime, payload: T) -> EventSeq {
        let seq = EventSeq(self.next_seq);
        self.next_seq += 1;
        self.heap.push(Slot(ScheduledEvent {
            fire_at,
            seq,
            payload,
        }));
        seq
    }

    /// Removes and returns the earliest event if it fires at or before
    /// `until`, moving the clock to its fire time.
    ///
    /// Callers may schedule between calls; see the module docs.
    pub fn pop_due(&mut self, until: SimTime) -> Option<ScheduledEvent<T>> {
        let due = self.heap.peek().is_some_and(|slot| slot.0.fire_at <= until);
        if !due {
            return None;
        }
        let Slot(event) = self.heap.pop()?;
        if event.fire_at > self.now {
            self.now = event.fire_at;
        }
        Some(event)
    }

    /// Lazily yields every event due at or before `until`, in
    /// `(fire_time, sequence)` order.
    ///
    /// Once the iterator is exhausted the clock stands at `until`. Dropping it
    /// early leaves the clock at the last yielded event and the remaining
    /// events queued.
    pub fn drain_up_to(&mut self, until: SimTime) -> DrainUpTo<'_, T> {
        DrainUpTo { queue: self, until }
    }

    /// Moves the clock forward to `time` without firing anything.
    ///
    /// Has no effect if `time` is not after `now`. Callers are expected to
    /// have drained due events first; events left behind keep their fire
    /// times and come out on the next drain.
    pub fn advance_to(&mut self, time: SimTime) {
        if time > self.now {
            self.now = time;
        }
    }

    /// Fire time of the earliest pending event.
    #[must_use]
    pub fn peek_time(&self) -> Option<SimTime> {
        self.heap.peek().map(|slot| slot.0.fire_at)
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Discards every pending event. The clock and sequence counter are kept.
    pub fn clear(&mut self) -> usize {
        let dropped = self.heap.len();
        self.heap.clear();
        dropped
    }
}

/// Iterator returned by [`EventQueue::drain_up_to`].
pub struct DrainUpTo<'a, T> {
    queue: &'a mut EventQueue<T>,
    until: SimTime,
}

impl<T> Iterator for DrainUpTo<'_, T> {
    type Item = ScheduledEvent<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let event = self.queue.pop_due(self.until);
        if event.is_none() {
            self.queue.advance_to(self.until);
        }
        event
    }
}
