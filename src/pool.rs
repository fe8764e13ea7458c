//! Connection Pool (C3): a bounded, deque-ordered container of [`Session`]s
//! per endpoint.

use std::collections::VecDeque;

use crate::session::{Session, SessionState};

/// Bounded cache of reusable sessions to one endpoint (spec §4.3).
///
/// `acquire` is O(n) over pool entries, scanning for the first non-`InUse`
/// session; creation order is preserved. The pool does not rebalance or
/// evict idle sessions on its own.
pub struct Pool {
    capacity: usize,
    entries: VecDeque<Session>,
    /// Sessions handed out by `acquire` but not yet returned via `put_back`
    /// or `release` — counted against `capacity` alongside `entries` so a
    /// checked-out session still occupies its slot (spec §4.3).
    checked_out: usize,
}

impl Pool {
    pub fn new(capacity: usize) -> Self {
        Pool {
            capacity,
            entries: VecDeque::new(),
            checked_out: 0,
        }
    }

    pub fn with_pool_size(&mut self, capacity: usize) -> &mut Self {
        self.capacity = capacity;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len() + self.checked_out
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a non-`InUse` session if one exists; otherwise creates a new
    /// one if under capacity and runs `initializer` on it exactly once.
    /// Returns `None` when the pool is saturated — not an error, callers
    /// buffer or drop the request (spec §4.3, §4.7).
    ///
    /// A reused idle session is checked with [`Session::check_idle`] first
    /// (spec §4.1 `monitor_for_error`) so a peer that closed while the
    /// session sat idle in the pool is reconnected rather than handed back
    /// out as if still live.
    pub fn acquire(
        &mut self,
        make_session: impl FnOnce() -> Session,
        initializer: impl FnOnce(&mut Session),
    ) -> Option<Session> {
        if let Some(idx) = self
            .entries
            .iter()
            .position(|s| s.state() != SessionState::InUse)
        {
            let mut session = self.entries.remove(idx)?;
            session.check_idle();
            self.checked_out += 1;
            return Some(session);
        }

        if self.entries.len() + self.checked_out >= self.capacity {
            return None;
        }

        let mut session = make_session();
        initializer(&mut session);
        self.checked_out += 1;
        Some(session)
    }

    /// Returns a session to the pool for reuse by a future `acquire`. This
    /// is the "lend, don't own" half of acquire/release — sessions handed
    /// out are not tracked until put back here.
    pub fn put_back(&mut self, session: Session) {
        self.checked_out = self.checked_out.saturating_sub(1);
        if self.entries.len() < self.capacity {
            self.entries.push_back(session);
        }
    }

    /// Removes a session from the pool and closes its transport (spec §4.3
    /// `release`). Used when the peer signaled no keep-alive, so the
    /// session should not be reused.
    pub async fn release(&mut self, mut session: Session) {
        self.checked_out = self.checked_out.saturating_sub(1);
        session.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquire_respects_capacity() {
        let mut pool = Pool::new(1);
        let a = pool.acquire(Session::new_plain, |_| {}).unwrap();
        assert!(pool.acquire(Session::new_plain, |_| {}).is_none());
        pool.put_back(a);
        assert!(pool.acquire(Session::new_plain, |_| {}).is_some());
    }

    #[tokio::test]
    async fn release_closes_and_forgets() {
        let mut pool = Pool::new(2);
        let s = pool.acquire(Session::new_plain, |_| {}).unwrap();
        pool.release(s).await;
        assert_eq!(pool.len(), 0);
    }
}
