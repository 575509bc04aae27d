//! Transport client caching.
//!
//! Building a client is expensive (TLS state, certificate resolution), so
//! clients are memoized on the subset of options that affects client-level
//! configuration. Entries live under a sliding expiry: each hit resets the
//! entry's clock. Concurrent lookups for the same cold key may race and
//! build duplicate clients; the last write wins and the losers are simply
//! dropped.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::defaults;
use crate::error::HttpTaskError;
use crate::transport::{TransportClient, TransportClientBuilder};
use crate::types::Options;

struct CacheEntry {
    client: TransportClient,
    last_access: Instant,
}

/// Memoizes transport clients per options projection.
pub struct ClientCache {
    builder: Arc<dyn TransportClientBuilder>,
    entries: RwLock<HashMap<String, CacheEntry>>,
    expiry: Duration,
}

impl ClientCache {
    /// Cache with the default one-hour sliding expiry.
    pub fn new(builder: Arc<dyn TransportClientBuilder>) -> Self {
        Self::with_expiry(builder, defaults::cache::SLIDING_EXPIRY)
    }

    /// Cache with an explicit sliding expiry.
    pub fn with_expiry(builder: Arc<dyn TransportClientBuilder>, expiry: Duration) -> Self {
        Self {
            builder,
            entries: RwLock::new(HashMap::new()),
            expiry,
        }
    }

    /// Return the cached client for the options' projection, building and
    /// storing one on a miss or after expiry.
    pub fn get_or_create(&self, options: &Options) -> Result<TransportClient, HttpTaskError> {
        let key = client_cache_key(options);
        if let Some(client) = self.lookup(&key) {
            return Ok(client);
        }

        debug!(key_len = key.len(), "building transport client for cold cache key");
        let client = self.builder.build(options)?;
        let mut entries = write_lock(&self.entries);
        entries.insert(
            key,
            CacheEntry {
                client: client.clone(),
                last_access: Instant::now(),
            },
        );
        Ok(client)
    }

    /// Remove every cached client unconditionally.
    pub fn clear(&self) {
        write_lock(&self.entries).clear();
    }

    fn lookup(&self, key: &str) -> Option<TransportClient> {
        {
            let entries = read_lock(&self.entries);
            let entry = entries.get(key)?;
            if entry.last_access.elapsed() > self.expiry {
                return None;
            }
        }
        // Refresh the sliding window. The entry may have been cleared or
        // replaced between the locks; treat that as a miss.
        let mut entries = write_lock(&self.entries);
        let entry = entries.get_mut(key)?;
        if entry.last_access.elapsed() > self.expiry {
            return None;
        }
        entry.last_access = Instant::now();
        Some(entry.client.clone())
    }
}

/// Cache key over every option that affects client construction. The bearer
/// token is request-scoped, not client-scoped, and is deliberately excluded.
fn client_cache_key(options: &Options) -> String {
    format!(
        "{:?}:{}:{}:{:?}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}:{}",
        options.authentication,
        options.username,
        options.password,
        options.certificate_source,
        options.certificate_file_path,
        options.certificate_base64,
        options.certificate_key_phrase,
        options.certificate_thumbprint,
        options.load_entire_chain,
        options.timeout_seconds,
        options.follow_redirects,
        options.allow_invalid_certificate,
        options.allow_invalid_response_charset,
        options.throw_on_error_response,
        options.automatic_cookie_handling,
    )
}

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
