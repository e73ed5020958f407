//! Read-path caching.
//!
//! # Design Decisions
//! - Per-entry TTL with lazy eviction; no sweeper task
//! - Internally synchronized with `DashMap`, so one instance per network
//!   can be shared by every task without outer locking
//! - TTLs come from configured tiers, never hard-coded at call sites

pub mod tiers;
pub mod ttl;

pub use tiers::CacheTier;
pub use ttl::{CacheEntry, TtlCache};
