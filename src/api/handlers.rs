//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use tokio::sync::Mutex;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::cache::{ByteSize, SystemClock, TtlCache};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, KeysResponse, PopResponse,
    SetRequest, SetResponse, StatsResponse,
};

/// The cache as served over HTTP: string values sized in bytes.
pub type ServerCache = TtlCache<String, String, SystemClock, ByteSize>;

/// Application state shared across all handlers.
///
/// Every cache operation, reads included, updates LRU order or purges, so
/// the cache sits behind a single mutex rather than a read-write lock.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<Mutex<ServerCache>>,
}

impl AppState {
    /// Creates a new AppState with the given cache.
    pub fn new(cache: ServerCache) -> Self {
        Self {
            cache: Arc::new(Mutex::new(cache)),
        }
    }

    /// Creates a new AppState from configuration.
    pub fn from_config(config: &Config) -> Self {
        let cache = TtlCache::with_sizer(config.max_size, config.ttl(), SystemClock, ByteSize);
        Self::new(cache)
    }
}

/// Handler for PUT /set
///
/// Stores a key-value pair under the server-wide TTL.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let mut cache = state.cache.lock().await;
    cache.set(req.key.clone(), req.value)?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
///
/// Retrieves a live value and marks it most recently used.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let mut cache = state.cache.lock().await;
    let value = cache.get(&key)?.clone();
    let ttl_remaining_ms = cache
        .ttl_remaining(&key)
        .map_or(0, |left| u64::try_from(left.as_millis()).unwrap_or(u64::MAX));

    Ok(Json(GetResponse::new(key, value, ttl_remaining_ms)))
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let mut cache = state.cache.lock().await;
    cache.delete(&key)?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /pop
///
/// Removes and returns the least recently used live entry.
pub async fn pop_handler(State(state): State<AppState>) -> Result<Json<PopResponse>> {
    let mut cache = state.cache.lock().await;
    let (key, value) = cache.pop_lru()?;

    Ok(Json(PopResponse { key, value }))
}

/// Handler for GET /keys
pub async fn keys_handler(State(state): State<AppState>) -> Json<KeysResponse> {
    let cache = state.cache.lock().await;
    let keys = cache.keys().cloned().collect();

    Json(KeysResponse { keys })
}

/// Handler for DELETE /clear
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let mut cache = state.cache.lock().await;
    let cleared = cache.len();
    cache.clear();

    Json(ClearResponse::new(cleared))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let mut cache = state.cache.lock().await;
    let current_size = cache.current_size();
    let stats = cache.stats();

    Json(StatsResponse::new(
        &stats,
        current_size,
        cache.maxsize(),
        cache.ttl().as_secs(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_state(max_size: usize) -> AppState {
        AppState::new(TtlCache::with_sizer(
            max_size,
            Duration::from_secs(300),
            SystemClock,
            ByteSize,
        ))
    }

    fn set_request(key: &str, value: &str) -> Json<SetRequest> {
        Json(SetRequest {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state(1024);

        let result = set_handler(State(state.clone()), set_request("test_key", "test_value")).await;
        assert!(result.is_ok());

        let response = get_handler(State(state.clone()), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, "test_value");
        assert!(response.ttl_remaining_ms > 0);
        assert!(response.ttl_remaining_ms <= 300_000);
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state(1024);

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_set_rejects_empty_key() {
        let state = test_state(1024);

        let result = set_handler(State(state), set_request("", "value")).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_set_rejects_value_over_budget() {
        let state = test_state(4);

        let result = set_handler(State(state), set_request("k", "too long")).await;
        assert!(matches!(result, Err(CacheError::ValueTooLarge { .. })));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state(1024);
        set_handler(State(state.clone()), set_request("to_delete", "value"))
            .await
            .unwrap();

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());

        let result = get_handler(State(state), Path("to_delete".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_pop_handler_returns_lru_entry() {
        let state = test_state(1024);
        set_handler(State(state.clone()), set_request("first", "1")).await.unwrap();
        set_handler(State(state.clone()), set_request("second", "2")).await.unwrap();

        let response = pop_handler(State(state.clone())).await.unwrap();
        assert_eq!(response.key, "first");
        assert_eq!(response.value, "1");

        pop_handler(State(state.clone())).await.unwrap();
        let result = pop_handler(State(state)).await;
        assert!(matches!(result, Err(CacheError::Empty)));
    }

    #[tokio::test]
    async fn test_keys_and_clear_handlers() {
        let state = test_state(1024);
        set_handler(State(state.clone()), set_request("a", "1")).await.unwrap();
        set_handler(State(state.clone()), set_request("b", "2")).await.unwrap();

        let keys = keys_handler(State(state.clone())).await;
        assert_eq!(keys.keys, vec!["a".to_string(), "b".to_string()]);

        let cleared = clear_handler(State(state.clone())).await;
        assert_eq!(cleared.cleared, 2);
        assert!(keys_handler(State(state)).await.keys.is_empty());
    }

    #[tokio::test]
    async fn test_stats_handler_reports_byte_size() {
        let state = test_state(1024);
        set_handler(State(state.clone()), set_request("k", "hello")).await.unwrap();
        let _ = get_handler(State(state.clone()), Path("k".to_string())).await;
        let _ = get_handler(State(state.clone()), Path("missing".to_string())).await;

        let stats = stats_handler(State(state)).await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.current_size, 5);
        assert_eq!(stats.maxsize, 1024);
        assert_eq!(stats.ttl_secs, 300);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
