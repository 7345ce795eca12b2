// src/cache.rs
//! Cache-aside layer for collection results.
//!
//! The backend is an optimization, never a correctness dependency: an
//! unreachable or failing Redis degrades every call to a miss/no-op and the
//! request proceeds with live collection.

use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;
use tracing::{info, warn};

const KEY_NAMESPACE: &str = "nr";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Deterministic key for a collection request. Topics and sources are trimmed
/// and sorted independently, so key derivation is order-insensitive.
pub fn cache_key(topics: &[String], sources: &[String]) -> String {
    let mut t: Vec<String> = topics.iter().map(|s| s.trim().to_string()).collect();
    let mut s: Vec<String> = sources.iter().map(|s| s.trim().to_string()).collect();
    t.sort();
    s.sort();

    let raw = format!("collect:{}:{}", t.join(","), s.join(","));
    let digest = Sha256::digest(raw.as_bytes());

    let mut hex = String::with_capacity(32);
    for b in digest.iter().take(16) {
        use std::fmt::Write as _;
        let _ = write!(&mut hex, "{b:02x}");
    }
    format!("{KEY_NAMESPACE}:{hex}")
}

/// Process-wide cache handle with optional connectivity folded into the API:
/// `get` on a dead backend is a miss, `set` is a no-op.
#[derive(Clone)]
pub struct ResultCache {
    conn: Option<ConnectionManager>,
    ttl_secs: u64,
}

impl ResultCache {
    /// Connect at startup. Failure is logged and yields a disabled cache.
    pub async fn connect(url: &str, ttl_secs: u64) -> Self {
        match Self::try_connect(url).await {
            Ok(conn) => {
                info!("cache backend connected");
                Self {
                    conn: Some(conn),
                    ttl_secs,
                }
            }
            Err(e) => {
                warn!(error = %e, "cache backend unavailable, caching disabled");
                Self::disabled(ttl_secs)
            }
        }
    }

    async fn try_connect(url: &str) -> anyhow::Result<ConnectionManager> {
        let client = redis::Client::open(url)?;
        let mut conn = tokio::time::timeout(CONNECT_TIMEOUT, client.get_connection_manager())
            .await
            .map_err(|_| anyhow::anyhow!("connect timed out"))??;
        // Liveness check before declaring the cache usable.
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(conn)
    }

    pub fn disabled(ttl_secs: u64) -> Self {
        Self {
            conn: None,
            ttl_secs,
        }
    }

    pub fn is_available(&self) -> bool {
        self.conn.is_some()
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let mut conn = self.conn.clone()?;
        match conn.get::<_, Option<String>>(key).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Write-through with TTL. Entries are only ever overwritten wholesale.
    pub async fn set(&self, key: &str, value: &str) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        if let Err(e) = conn.set_ex::<_, _, ()>(key, value, self.ttl_secs).await {
            warn!(error = %e, "cache write failed");
        }
    }
}

/// Per-key single-flight: concurrent identical requests queue behind the first
/// one, then re-check the cache instead of repeating the collection run.
#[derive(Default)]
pub struct Singleflight {
    inflight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Singleflight {
    /// Hold the returned guard for the duration of the cache-miss work.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut map = self.inflight.lock().expect("singleflight map lock");
            // Drop slots nobody is waiting on.
            map.retain(|_, v| Arc::strong_count(v) > 1);
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        slot.lock_owned().await
    }
}
