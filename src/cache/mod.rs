//! In-memory result cache for the listing read path.
//!
//! One bounded LRU store maps normalized pagination parameters to listing
//! results, with a uniform per-entry TTL. The listing service consults it
//! only for turbo requests; entries expire lazily and are never served past
//! their deadline.

mod config;
mod keys;
mod lock;
mod store;

pub use config::CacheConfig;
pub use keys::listing_key;
pub use store::ListingCache;
