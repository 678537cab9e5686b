//! Process-wide spacing throttle for outbound chat API requests

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Enforces a minimum interval between outbound requests.
///
/// A single throttle instance is shared by every call the chat client makes,
/// keyed on the wall-clock of the last reserved slot rather than per
/// endpoint. The check-and-reserve is atomic: two tasks can never both pass
/// the spacing check and burst the provider. The wait itself happens outside
/// the lock.
#[derive(Debug)]
pub struct RequestThrottle {
    /// Minimum interval between requests
    interval: Duration,
    /// Next slot at which a request may go out
    next_slot: Mutex<Option<Instant>>,
}

impl RequestThrottle {
    /// Create a throttle with the given minimum interval between requests
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// Reserve the next request slot, sleeping until it arrives
    pub async fn acquire(&self) {
        let slot = {
            let mut next = self
                .next_slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let now = Instant::now();
            let slot = next.map_or(now, |n| n.max(now));
            *next = Some(slot + self.interval);
            slot
        };

        tokio::time::sleep_until(slot).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn spaces_sequential_requests() {
        let throttle = RequestThrottle::new(Duration::from_millis(20));

        let start = Instant::now();
        throttle.acquire().await;
        throttle.acquire().await;
        throttle.acquire().await;

        // First slot is immediate; the next two each wait one interval
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn concurrent_acquires_never_share_a_slot() {
        use std::sync::Arc;

        let throttle = Arc::new(RequestThrottle::new(Duration::from_millis(15)));
        let start = Instant::now();

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let throttle = throttle.clone();
                tokio::spawn(async move {
                    throttle.acquire().await;
                    Instant::now()
                })
            })
            .collect();

        let mut times = Vec::new();
        for task in tasks {
            times.push(task.await.unwrap());
        }
        times.sort();

        for pair in times.windows(2) {
            let gap = pair[1].duration_since(pair[0]);
            assert!(gap >= Duration::from_millis(10), "gap too small: {gap:?}");
        }

        // 4 requests = 3 enforced gaps
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[tokio::test]
    async fn first_acquire_is_immediate() {
        let throttle = RequestThrottle::new(Duration::from_millis(100));

        let start = Instant::now();
        throttle.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
