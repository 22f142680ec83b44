//! Cache Module
//!
//! Provides a bounded in-memory cache with TTL expiration and LRU eviction.

mod clock;
mod expiry;
mod lru;
mod state;
mod stats;
mod store;
mod ttl;


// Re-export public types
pub use clock::{Clock, ManualClock, MonotonicClock, Snapshot, SystemClock, Timer};
pub use expiry::ExpiryIndex;
pub use lru::LruTracker;
pub use state::{CacheState, StateEntry};
pub use stats::{CacheEvent, CacheStats};
pub use store::{BoundedStore, ByteSize, Evictor, Sizer, UnitSize};
pub use ttl::{Iter, TtlCache};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;
