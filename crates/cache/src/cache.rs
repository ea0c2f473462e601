use crate::error::CacheResult;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Default TTL for cached entries, matching the original service's 24h expiry.
pub const DEFAULT_TTL_SECONDS: u64 = 86_400;

/// A TTL'd key/value cache over Redis, used to memoize per-file flat-node
/// lists and per-image captions (§4.8, §B.1, §B.2 of SPEC_FULL.md).
#[derive(Clone)]
pub struct Cache {
    conn: ConnectionManager,
    ttl_seconds: u64,
}

impl Cache {
    pub async fn connect(redis_url: &str) -> CacheResult<Self> {
        Self::connect_with_ttl(redis_url, DEFAULT_TTL_SECONDS).await
    }

    pub async fn connect_with_ttl(redis_url: &str, ttl_seconds: u64) -> CacheResult<Self> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn, ttl_seconds })
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        let mut conn = self.conn.clone();
        let raw: Option<Vec<u8>> = conn.get(key).await?;
        match raw {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> CacheResult<()> {
        let bytes = serde_json::to_vec(value)?;
        let mut conn = self.conn.clone();
        let _: () = conn.set_ex(key, bytes, self.ttl_seconds).await?;
        Ok(())
    }

    pub async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }
}
