//! Cache State Module
//!
//! Plain, serializable form of a cache's contents, produced by
//! [`TtlCache::to_state`](super::TtlCache::to_state) and consumed by
//! [`TtlCache::restore`](super::TtlCache::restore).

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One stored entry with its absolute expiry time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry<K, V> {
    pub key: K,
    pub value: V,
    pub expires_at: Duration,
}

/// Snapshot of everything a cache needs to resume.
///
/// `entries` are listed soonest expiry first; `lru_order` lists the same
/// keys from least to most recently used. Expiry times are relative to the
/// clock the state was taken with, so restore with the same kind of clock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheState<K, V> {
    pub maxsize: usize,
    pub ttl: Duration,
    pub entries: Vec<StateEntry<K, V>>,
    pub lru_order: Vec<K>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CacheState<String, String> {
        CacheState {
            maxsize: 64,
            ttl: Duration::from_secs(30),
            entries: vec![
                StateEntry {
                    key: "a".to_string(),
                    value: "apple".to_string(),
                    expires_at: Duration::from_secs(40),
                },
                StateEntry {
                    key: "b".to_string(),
                    value: "banana".to_string(),
                    expires_at: Duration::from_millis(41_500),
                },
            ],
            lru_order: vec!["b".to_string(), "a".to_string()],
        }
    }

    #[test]
    fn test_state_survives_json() {
        let state = sample();
        let json = serde_json::to_string(&state).unwrap();
        let decoded: CacheState<String, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, state);
    }

    #[test]
    fn test_expiry_serializes_as_secs_and_nanos() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["entries"][1]["expires_at"]["secs"], 41);
        assert_eq!(json["entries"][1]["expires_at"]["nanos"], 500_000_000);
        assert_eq!(json["lru_order"][0], "b");
    }
}
