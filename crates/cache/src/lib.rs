pub mod cache;
pub mod error;
pub mod keys;

pub use cache::{Cache, DEFAULT_TTL_SECONDS};
pub use error::{CacheError, CacheResult};
pub use keys::CacheKeys;
