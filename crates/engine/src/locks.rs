//! Per-ticket mutual exclusion.
//!
//! Every read-modify-write of a ticket happens while holding that ticket's
//! lock. Different tickets never contend. Entries are dropped from the map
//! once nobody holds or waits on them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use campusdesk_core::types::DbId;
use tokio::sync::OwnedMutexGuard;

/// Held for the duration of one ticket mutation.
pub type TicketGuard = OwnedMutexGuard<()>;

#[derive(Debug, Default)]
pub struct TicketLocks {
    inner: Mutex<HashMap<DbId, Arc<tokio::sync::Mutex<()>>>>,
}

impl TicketLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `ticket_id`.
    pub async fn acquire(&self, ticket_id: DbId) -> TicketGuard {
        let lock = {
            let mut map = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            Arc::clone(map.entry(ticket_id).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of tickets with a live lock entry.
    pub fn tracked(&self) -> usize {
        self.inner.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn same_ticket_is_exclusive() {
        let locks = Arc::new(TicketLocks::new());
        let guard = locks.acquire(1).await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire(1).await;
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should acquire after release")
            .unwrap();
    }

    #[tokio::test]
    async fn different_tickets_do_not_contend() {
        let locks = TicketLocks::new();
        let _a = locks.acquire(1).await;
        let _b = tokio::time::timeout(Duration::from_millis(100), locks.acquire(2))
            .await
            .expect("independent ticket should lock immediately");
    }

    #[tokio::test]
    async fn released_entries_are_pruned() {
        let locks = TicketLocks::new();
        for id in 0..10 {
            let _guard = locks.acquire(id).await;
        }
        let _last = locks.acquire(99).await;
        assert_eq!(locks.tracked(), 1);
    }
}
