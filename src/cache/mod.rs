// Client cache module
// Author: kelexine (https://github.com/kelexine)

pub mod manager;
pub mod models;

pub use manager::ModelClientCache;
pub use models::{CacheEntry, CacheKey, CacheStats, ClientRequest};
