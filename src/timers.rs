//! One-shot deferred actions keyed to the encounter's game clock.
//!
//! Every entry names the entity it acts on. Destroying an entity must go
//! through [`TimerRegistry::cancel_owner`] so no stale action fires later;
//! dispatchers still re-check liveness when an action comes due.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Clone, Debug)]
struct TimerEntry<A> {
    id: u64,
    owner: String,
    fire_at: u64,
    action: A,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DueTimer<A> {
    pub id: TimerId,
    pub owner: String,
    pub fire_at: u64,
    pub action: A,
}

#[derive(Clone, Debug)]
pub struct TimerRegistry<A> {
    entries: Vec<TimerEntry<A>>,
    next_id: u64,
}

impl<A> Default for TimerRegistry<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> TimerRegistry<A> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    pub fn schedule(&mut self, owner: &str, fire_at: u64, action: A) -> TimerId {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        self.entries.push(TimerEntry {
            id,
            owner: owner.to_string(),
            fire_at,
            action,
        });
        TimerId(id)
    }

    /// Drops every pending entry owned by `owner`; returns how many were dropped.
    pub fn cancel_owner(&mut self, owner: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.owner != owner);
        before - self.entries.len()
    }

    pub fn cancel_where(&mut self, owner: &str, predicate: impl Fn(&A) -> bool) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|entry| entry.owner != owner || !predicate(&entry.action));
        before - self.entries.len()
    }

    pub fn pending_for(&self, owner: &str) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.owner == owner)
            .count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_fire_at(&self) -> Option<u64> {
        self.entries.iter().map(|entry| entry.fire_at).min()
    }

    /// Removes and returns all entries with `fire_at <= now_ms`, ordered by
    /// fire time and then by scheduling order.
    pub fn poll_due(&mut self, now_ms: u64) -> Vec<DueTimer<A>> {
        let mut due = Vec::new();
        let mut index = 0;
        while index < self.entries.len() {
            if self.entries[index].fire_at <= now_ms {
                let entry = self.entries.swap_remove(index);
                due.push(DueTimer {
                    id: TimerId(entry.id),
                    owner: entry.owner,
                    fire_at: entry.fire_at,
                    action: entry.action,
                });
                continue;
            }
            index += 1;
        }
        due.sort_by_key(|timer| (timer.fire_at, timer.id));
        due
    }
}
