//! Per-user creation cooldown

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use ticket_core::UserId;

/// Outcome of a cooldown consultation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownStatus {
    Allowed,
    Blocked { remaining_seconds: u64 },
}

/// Last successful ticket request per user.
///
/// Entries are never evicted: only the delta against "now" matters, so a
/// stale entry for a user who left is harmless in a process-lifetime
/// store. Deployments that want to bound the map can call
/// [`purge_older_than`](CooldownTracker::purge_older_than) on a timer.
#[derive(Debug, Default)]
pub struct CooldownTracker {
    last_request: HashMap<UserId, DateTime<Utc>>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consult the cooldown without consuming the slot.
    pub fn check(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
        window_seconds: u64,
    ) -> CooldownStatus {
        let last = match self.last_request.get(user) {
            Some(last) => *last,
            None => return CooldownStatus::Allowed,
        };

        let elapsed = now.signed_duration_since(last);
        if elapsed >= Duration::seconds(window_seconds as i64) {
            return CooldownStatus::Allowed;
        }

        // Round the remainder up: 29.5s left reads as "30s".
        let remaining_ms = window_seconds as i64 * 1000 - elapsed.num_milliseconds();
        let remaining_seconds = ((remaining_ms + 999) / 1000).max(0) as u64;
        CooldownStatus::Blocked { remaining_seconds }
    }

    /// Consult the cooldown and, when allowed, record `now` as the new
    /// last-request time. A blocked call changes nothing.
    pub fn try_consume(
        &mut self,
        user: &UserId,
        now: DateTime<Utc>,
        window_seconds: u64,
    ) -> CooldownStatus {
        let status = self.check(user, now, window_seconds);
        if status == CooldownStatus::Allowed {
            self.last_request.insert(user.clone(), now);
        }
        status
    }

    /// Record `now` unconditionally. The controller uses this after a
    /// successful provisioning whose `check` already passed under the
    /// same lock scope.
    pub fn record(&mut self, user: &UserId, now: DateTime<Utc>) {
        self.last_request.insert(user.clone(), now);
    }

    /// Drop entries last touched before `horizon`.
    pub fn purge_older_than(&mut self, horizon: DateTime<Utc>) {
        self.last_request.retain(|_, last| *last >= horizon);
    }

    pub fn len(&self) -> usize {
        self.last_request.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_request.is_empty()
    }
}
