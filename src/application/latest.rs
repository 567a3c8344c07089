//! Latest-wins request guard for overlapping asynchronous refreshes.

use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

/// Opaque, monotonically increasing request ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Hands out tokens per key and remembers the newest one issued, so a
/// response can tell whether a later request has superseded it.
#[derive(Debug)]
pub struct LatestWins<K: Eq + Hash> {
    next: AtomicU64,
    latest: DashMap<K, RequestToken>,
}

impl<K: Eq + Hash> Default for LatestWins<K> {
    fn default() -> Self {
        Self {
            next: AtomicU64::new(1),
            latest: DashMap::new(),
        }
    }
}

impl<K: Eq + Hash> LatestWins<K> {
    pub fn issue(&self, key: K) -> RequestToken {
        let token = RequestToken(self.next.fetch_add(1, Ordering::Relaxed));
        self.latest
            .entry(key)
            .and_modify(|current| *current = (*current).max(token))
            .or_insert(token);
        token
    }

    pub fn is_latest(&self, key: &K, token: RequestToken) -> bool {
        self.latest
            .get(key)
            .is_some_and(|current| *current == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_tokens_supersede_earlier_ones() {
        let guard = LatestWins::default();
        let first = guard.issue("dex-tvl");
        let second = guard.issue("dex-tvl");
        assert!(first < second);
        assert!(!guard.is_latest(&"dex-tvl", first));
        assert!(guard.is_latest(&"dex-tvl", second));
    }

    #[test]
    fn keys_are_independent() {
        let guard = LatestWins::default();
        let tvl = guard.issue("dex-tvl");
        let pools = guard.issue("pool-volume");
        assert!(guard.is_latest(&"dex-tvl", tvl));
        assert!(guard.is_latest(&"pool-volume", pools));
        assert!(!guard.is_latest(&"aggregator-volume", tvl));
    }
}
