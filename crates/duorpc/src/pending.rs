//! # Future Manager
//!
//! Allocates call sequence numbers and correlates replies with the calls
//! waiting for them.
//!
//! ## Invariants
//!
//! - A sequence number is unique among the calls currently pending.
//! - Every pending call is resolved at most once. Resolving removes the entry
//!   from the table atomically, so whichever of reply, failure, timeout,
//!   cancellation or teardown comes first wins and the rest are no-ops.
//! - The table is never locked across an `.await`. Callers wait on a oneshot
//!   receiver owned by their [`CallHandle`].

use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;
use std::time::Instant;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::oneshot;

use crate::error::Error;
use crate::error::Result;

type Table = DashMap<u64, PendingCall>;

/// Bookkeeping for one outstanding call.
struct PendingCall {
    tx: oneshot::Sender<Result<Vec<u8>>>,
    created: Instant,
}

impl PendingCall {
    fn age(&self) -> Duration {
        self.created.elapsed()
    }
}

/// The caller's side of a pending call.
///
/// Awaited through [`crate::Gateway::await_result`]. Dropping an unresolved
/// handle forgets the call; a reply that arrives later is treated as stale.
#[derive(Debug)]
pub struct CallHandle {
    seq: u64,
    pub(crate) rx: oneshot::Receiver<Result<Vec<u8>>>,
    table: Weak<Table>,
}

impl CallHandle {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Cancels the call. Returns `false` if it had already been resolved.
    pub fn cancel(self) -> bool {
        match self.table.upgrade() {
            Some(table) => resolve(&table, self.seq, Err(Error::Cancelled)),
            None => false,
        }
    }
}

impl Drop for CallHandle {
    fn drop(&mut self) {
        if let Some(table) = self.table.upgrade() {
            table.remove(&self.seq);
        }
    }
}

/// Table of pending calls for one gateway.
#[derive(Clone)]
pub struct FutureManager {
    table: Arc<Table>,
    next_seq: Arc<AtomicU64>,
}

impl Default for FutureManager {
    fn default() -> Self {
        Self::new()
    }
}

impl FutureManager {
    pub fn new() -> Self {
        Self {
            table: Arc::new(DashMap::new()),
            next_seq: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Registers a new pending call and returns its sequence number together
    /// with the handle the caller waits on.
    pub fn register(&self) -> (u64, CallHandle) {
        let (tx, rx) = oneshot::channel();
        let pending = PendingCall { tx, created: Instant::now() };

        loop {
            let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
            // Skip numbers still held by a call from a previous wrap-around.
            if let Entry::Vacant(slot) = self.table.entry(seq) {
                slot.insert(pending);
                let handle = CallHandle { seq, rx, table: Arc::downgrade(&self.table) };
                return (seq, handle);
            }
        }
    }

    /// Fulfils the call `seq` with `payload`.
    ///
    /// Returns `false` when no such call is pending, which is expected for
    /// duplicated replies and replies to calls that already timed out.
    pub fn complete(&self, seq: u64, payload: Vec<u8>) -> bool {
        resolve(&self.table, seq, Ok(payload))
    }

    /// Fails the call `seq` with `error`. Same lookup rules as [`Self::complete`].
    pub fn fail(&self, seq: u64, error: Error) -> bool {
        resolve(&self.table, seq, Err(error))
    }

    /// Removes the call `seq` and resolves it with [`Error::Cancelled`].
    pub fn cancel(&self, seq: u64) -> bool {
        resolve(&self.table, seq, Err(Error::Cancelled))
    }

    /// Resolves every pending call with `error`. Returns how many were failed.
    pub fn fail_all(&self, error: Error) -> usize {
        let keys: Vec<u64> = self.table.iter().map(|e| *e.key()).collect();
        keys.into_iter()
            .filter(|seq| resolve(&self.table, *seq, Err(error.clone())))
            .count()
    }

    pub fn contains(&self, seq: u64) -> bool {
        self.table.contains_key(&seq)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

fn resolve(table: &Table, seq: u64, result: Result<Vec<u8>>) -> bool {
    let Some((_, pending)) = table.remove(&seq) else {
        return false;
    };

    tracing::trace!(seq, age_us = pending.age().as_micros() as u64, ok = result.is_ok(), "resolved call");
    // The receiver may have been dropped mid-flight; nothing left to notify.
    let _ = pending.tx.send(result);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_assigns_distinct_seqs() {
        let manager = FutureManager::new();
        let (a, _ha) = manager.register();
        let (b, _hb) = manager.register();

        assert_ne!(a, b);
        assert_eq!(manager.len(), 2);
        assert!(manager.contains(a) && manager.contains(b));
    }

    #[test]
    fn test_register_skips_seq_still_pending() {
        let manager = FutureManager::new();
        let (first, _held) = manager.register();

        // Force the counter back onto a live entry, as after a wrap-around.
        manager.next_seq.store(first, Ordering::Relaxed);
        let (second, _h) = manager.register();

        assert_ne!(first, second);
        assert_eq!(manager.len(), 2);
    }

    #[tokio::test]
    async fn test_complete_resolves_once() {
        let manager = FutureManager::new();
        let (seq, mut handle) = manager.register();

        assert!(manager.complete(seq, vec![1, 2, 3]));
        assert!(!manager.complete(seq, vec![9]));
        assert!(!manager.fail(seq, Error::Remote("late".into())));
        assert!(!manager.cancel(seq));

        let result = (&mut handle.rx).await.unwrap();
        assert_eq!(result, Ok(vec![1, 2, 3]));
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_fail_resolves_with_error() {
        let manager = FutureManager::new();
        let (seq, mut handle) = manager.register();

        assert!(manager.fail(seq, Error::Remote("boom".into())));
        assert_eq!((&mut handle.rx).await.unwrap(), Err(Error::Remote("boom".into())));
    }

    #[test]
    fn test_unknown_seq_is_not_an_error() {
        let manager = FutureManager::new();
        let (_seq, _handle) = manager.register();

        assert!(!manager.complete(12345, vec![]));
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test]
    async fn test_handle_cancel() {
        let manager = FutureManager::new();
        let (seq, handle) = manager.register();

        assert!(handle.cancel());
        assert!(!manager.contains(seq));
        assert!(!manager.complete(seq, vec![1]));
    }

    #[tokio::test]
    async fn test_fail_all_resolves_every_call_once() {
        let manager = FutureManager::new();
        let mut handles: Vec<CallHandle> = (0..5).map(|_| manager.register().1).collect();

        assert_eq!(manager.fail_all(Error::Teardown), 5);
        assert_eq!(manager.fail_all(Error::Teardown), 0);
        assert!(manager.is_empty());

        for handle in &mut handles {
            assert_eq!((&mut handle.rx).await.unwrap(), Err(Error::Teardown));
        }
    }

    #[test]
    fn test_dropped_handle_forgets_call() {
        let manager = FutureManager::new();
        let (seq, handle) = manager.register();
        drop(handle);

        assert!(!manager.contains(seq));
        assert!(!manager.complete(seq, vec![]));
    }

    #[test]
    fn test_concurrent_registration_is_unique() {
        let manager = FutureManager::new();
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let manager = manager.clone();
                std::thread::spawn(move || {
                    (0..200).map(|_| manager.register()).collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seqs = Vec::new();
        let mut handles = Vec::new();
        for thread in threads {
            for (seq, handle) in thread.join().unwrap() {
                seqs.push(seq);
                handles.push(handle);
            }
        }

        seqs.sort_unstable();
        seqs.dedup();
        assert_eq!(seqs.len(), 1600);
        assert_eq!(manager.len(), 1600);
    }
}
