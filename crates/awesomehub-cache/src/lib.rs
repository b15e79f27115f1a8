// In-memory read-through cache
// Keeps upstream calls down; entries live until a read finds them stale

pub mod cache;
pub mod clock;
pub mod store;

pub use cache::ReadThroughCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{CacheEntry, CacheStore, MemoryStore};
