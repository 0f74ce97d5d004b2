//! Cooperative timer scheduler.
//!
//! Replaces the UI re-render loop of a browser host as the owner of every
//! delayed or periodic callback. The host feeds monotonic timestamps into
//! [`Scheduler::advance`]; due events come back in a deterministic order.
//! Every handle carries an owner tag so a state machine can tear down all
//! of its outstanding timers when its governing state is replaced, which
//! keeps stale callbacks from ever touching discarded state.

use serde::{Deserialize, Serialize};

/// Handle returned by the schedule calls; usable for targeted cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(u64);

/// Which subsystem owns a timer. Teardown is per-owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerOwner {
    Session,
    Mission,
    Classmates,
    Roster,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry<E> {
    id: TimerId,
    owner: TimerOwner,
    due_ms: u64,
    period_ms: Option<u64>,
    event: E,
}

/// Single-threaded timer wheel over caller-supplied milliseconds.
#[derive(Debug, Clone, Default)]
pub struct Scheduler<E> {
    entries: Vec<Entry<E>>,
    next_id: u64,
}

impl<E: Clone> Scheduler<E> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    fn push(&mut self, owner: TimerOwner, due_ms: u64, period_ms: Option<u64>, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.entries.push(Entry {
            id,
            owner,
            due_ms,
            period_ms,
            event,
        });
        id
    }

    /// Fire `event` once, `delay_ms` after `now_ms`.
    pub fn schedule_in(
        &mut self,
        owner: TimerOwner,
        event: E,
        now_ms: u64,
        delay_ms: u64,
    ) -> TimerId {
        self.push(owner, now_ms.saturating_add(delay_ms), None, event)
    }

    /// Fire `event` every `period_ms`, first at `now_ms + period_ms`.
    pub fn schedule_every(
        &mut self,
        owner: TimerOwner,
        event: E,
        now_ms: u64,
        period_ms: u64,
    ) -> TimerId {
        let period = period_ms.max(1);
        self.push(
            owner,
            now_ms.saturating_add(period),
            Some(period),
            event,
        )
    }

    /// Cancel a single timer. Returns whether it was still pending.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Cancel every timer belonging to `owner`. Returns how many died.
    pub fn cancel_owner(&mut self, owner: TimerOwner) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.owner != owner);
        before - self.entries.len()
    }

    #[must_use]
    pub fn has_owner(&self, owner: TimerOwner) -> bool {
        self.entries.iter().any(|entry| entry.owner == owner)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drain every event due at or before `now_ms`, in (due, insertion)
    /// order. Periodic timers re-arm themselves; a large time jump fires
    /// each elapsed period so the simulation cannot silently skip ticks.
    pub fn advance(&mut self, now_ms: u64) -> Vec<E> {
        let mut due: Vec<(u64, TimerId, E)> = Vec::new();
        for entry in &mut self.entries {
            if let Some(period) = entry.period_ms {
                while entry.due_ms <= now_ms {
                    due.push((entry.due_ms, entry.id, entry.event.clone()));
                    entry.due_ms += period;
                }
            } else if entry.due_ms <= now_ms {
                due.push((entry.due_ms, entry.id, entry.event.clone()));
            }
        }
        self.entries
            .retain(|entry| entry.period_ms.is_some() || entry.due_ms > now_ms);
        due.sort_by_key(|(due_ms, id, _)| (*due_ms, *id));
        due.into_iter().map(|(_, _, event)| event).collect()
    }
}
