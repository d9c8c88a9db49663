//! ChunkBarrier - per-chunk countdown rendezvous
//!
//! Sized to the number of sinks a chunk was handed to. Each sink worker
//! arrives once; the read side waits until the count reaches zero.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Countdown barrier scoped to one chunk
#[derive(Debug)]
pub struct ChunkBarrier {
    seq: u64,
    remaining: AtomicUsize,
    notify: Notify,
}

impl ChunkBarrier {
    /// Create a barrier for chunk `seq` expecting `parties` arrivals
    pub fn new(seq: u64, parties: usize) -> Arc<Self> {
        Arc::new(Self {
            seq,
            remaining: AtomicUsize::new(parties),
            notify: Notify::new(),
        })
    }

    /// Chunk sequence number this barrier belongs to
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Arrivals still outstanding
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    pub fn is_resolved(&self) -> bool {
        self.remaining() == 0
    }

    /// Record one arrival
    ///
    /// Returns the number of arrivals still outstanding. Arriving at a
    /// resolved barrier has no effect.
    pub fn arrive(&self) -> usize {
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));

        match previous {
            Ok(1) => {
                self.notify.notify_waiters();
                0
            }
            Ok(n) => n - 1,
            Err(_) => 0,
        }
    }

    /// Wait until every party has arrived
    pub async fn wait(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_resolved() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{timeout, Duration};

    #[tokio::test]
    async fn test_zero_parties_resolved() {
        let barrier = ChunkBarrier::new(0, 0);
        assert!(barrier.is_resolved());
        barrier.wait().await;
    }

    #[tokio::test]
    async fn test_wait_blocks_until_all_arrive() {
        let barrier = ChunkBarrier::new(3, 2);
        assert_eq!(barrier.seq(), 3);

        assert_eq!(barrier.arrive(), 1);
        assert!(timeout(Duration::from_millis(20), barrier.wait())
            .await
            .is_err());

        assert_eq!(barrier.arrive(), 0);
        timeout(Duration::from_millis(100), barrier.wait())
            .await
            .expect("barrier should resolve");
    }

    #[tokio::test]
    async fn test_arrivals_from_tasks() {
        let barrier = ChunkBarrier::new(0, 8);

        for _ in 0..8 {
            let b = Arc::clone(&barrier);
            tokio::spawn(async move {
                b.arrive();
            });
        }

        timeout(Duration::from_secs(1), barrier.wait())
            .await
            .expect("barrier should resolve");
        assert_eq!(barrier.remaining(), 0);
    }

    #[test]
    fn test_extra_arrival_ignored() {
        let barrier = ChunkBarrier::new(0, 1);
        assert_eq!(barrier.arrive(), 0);
        assert_eq!(barrier.arrive(), 0);
        assert_eq!(barrier.remaining(), 0);
    }
}
