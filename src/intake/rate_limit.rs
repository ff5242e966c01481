use std::{
    collections::{HashMap, VecDeque},
    time::{Duration, Instant},
};

use tokio::sync::Mutex;

/// Sliding-window admission control keyed by client identity.
///
/// Every attempt is recorded before the verdict, so rejected traffic keeps
/// the window saturated until the client actually backs off. The identity map
/// is bounded: past `max_identities`, identities idle for a full window are
/// dropped, then the stalest of the remainder. The identity being served is
/// never evicted.
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    window: Duration,
    max_requests: usize,
    max_identities: usize,
    attempts: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(window: Duration, max_requests: usize, max_identities: usize) -> Self {
        Self {
            window,
            max_requests,
            max_identities,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    pub async fn admit(&self, identity: &str) -> bool {
        self.admit_at(identity, Instant::now()).await
    }

    /// Records the attempt at `now` and returns whether it fits the window.
    pub async fn admit_at(&self, identity: &str, now: Instant) -> bool {
        let mut attempts = self.attempts.lock().await;

        let log = attempts.entry(identity.to_string()).or_default();
        while let Some(oldest) = log.front() {
            if now.duration_since(*oldest) < self.window {
                break;
            }
            log.pop_front();
        }
        log.push_back(now);
        let admitted = log.len() <= self.max_requests;

        if attempts.len() > self.max_identities {
            evict_excess_identities(&mut attempts, identity, now, self.window, self.max_identities);
        }

        admitted
    }

    pub async fn tracked_identities(&self) -> usize {
        self.attempts.lock().await.len()
    }
}

fn evict_excess_identities(
    attempts: &mut HashMap<String, VecDeque<Instant>>,
    current: &str,
    now: Instant,
    window: Duration,
    max_identities: usize,
) {
    attempts.retain(|identity, log| {
        if identity == current {
            return true;
        }
        log.back()
            .is_some_and(|latest| now.duration_since(*latest) < window)
    });

    if attempts.len() <= max_identities {
        return;
    }

    let mut by_staleness: Vec<(String, Instant)> = attempts
        .iter()
        .filter(|(identity, _)| identity.as_str() != current)
        .filter_map(|(identity, log)| log.back().map(|latest| (identity.clone(), *latest)))
        .collect();
    by_staleness.sort_by_key(|(_, latest)| *latest);

    let excess = attempts.len().saturating_sub(max_identities);
    for (identity, _) in by_staleness.into_iter().take(excess) {
        attempts.remove(&identity);
    }
}
