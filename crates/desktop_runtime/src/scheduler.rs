//! Deterministic collapsing scheduler driven by an external clock.
//!
//! Each key holds at most one pending deadline. Re-arming a key replaces its deadline, so a burst
//! of arms inside the delay fires exactly once, after the last arm.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollapsingScheduler<K: Ord + Copy> {
    /// Deadline per armed key.
    pending: BTreeMap<K, u64>,
}

impl<K: Ord + Copy> Default for CollapsingScheduler<K> {
    fn default() -> Self {
        Self {
            pending: BTreeMap::new(),
        }
    }
}

impl<K: Ord + Copy> CollapsingScheduler<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms `key` to fire `delay_ms` after `now_ms`, superseding any pending deadline.
    pub fn arm(&mut self, key: K, now_ms: u64, delay_ms: u64) {
        self.pending.insert(key, now_ms.saturating_add(delay_ms));
    }

    pub fn cancel(&mut self, key: K) -> bool {
        self.pending.remove(&key).is_some()
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn is_armed(&self, key: K) -> bool {
        self.pending.contains_key(&key)
    }

    /// Earliest pending deadline across every key.
    pub fn next_due_at(&self) -> Option<u64> {
        self.pending.values().min().copied()
    }

    /// Removes and returns every key whose deadline is at or before `now_ms`, earliest first.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<K> {
        let mut due: Vec<(u64, K)> = self
            .pending
            .iter()
            .filter(|(_, due_at_ms)| **due_at_ms <= now_ms)
            .map(|(key, due_at_ms)| (*due_at_ms, *key))
            .collect();
        due.sort();
        for (_, key) in &due {
            self.pending.remove(key);
        }
        due.into_iter().map(|(_, key)| key).collect()
    }
}
