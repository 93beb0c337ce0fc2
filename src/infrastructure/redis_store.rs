//! Redis-backed counter store.
//!
//! Lets several application instances share one set of counters, so a
//! subject cannot multiply its allowance by spreading requests across
//! instances.
//!
//! ## Data model
//!
//! - Key: `{prefix}{action}:{subject}:{window_index}`, one key per subject,
//!   action and fixed window
//! - Value: plain integer maintained by `INCR`
//! - TTL: set when the key is created, window length plus a grace period,
//!   so finished windows clean themselves up
//!
//! The increment and the expiry run in one Lua script, so a crash between
//! them cannot leave an immortal key and concurrent callers on different
//! instances each observe a distinct count.
//!
//! The window index is derived from the caller's timestamp, so a request
//! whose timestamp is skewed into an earlier window increments that window's
//! key and reports that window's start.
//!
//! ## Runtime
//!
//! `CounterStore` is synchronous. Inside a multi-threaded tokio runtime the
//! call is bridged with `block_in_place`; outside any runtime a temporary
//! current-thread runtime is created. From inside a current-thread runtime
//! the call cannot block without stalling that runtime, so it fails with
//! `StoreError::unavailable`; use [`RedisCounterStore::increment_async`]
//! there instead.
//!
//! ## Example
//!
//! ```rust,ignore
//! use action_throttle::{DecisionEngine, RedisCounterStore, RedisCounterStoreConfig};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = RedisCounterStoreConfig {
//!         key_prefix: "throttle:".to_string(),
//!         operation_timeout: Duration::from_millis(50),
//!         ..Default::default()
//!     };
//!
//!     let store = RedisCounterStore::connect_with_config("redis://127.0.0.1/", config)
//!         .await
//!         .expect("Failed to connect to Redis");
//!
//!     let engine = DecisionEngine::builder()
//!         .with_standard_policies()
//!         .build_with_store(store)
//!         .unwrap();
//! }
//! ```

use crate::application::ports::{CounterKey, CounterStore, StoreError};
use crate::domain::window::{CounterReading, Window};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, RedisError, Script};
use std::fmt;
use std::future::Future;
use std::time::{Duration, SystemTime};
use tokio::runtime::RuntimeFlavor;

const INCREMENT_SCRIPT: &str = r#"
local count = redis.call('INCR', KEYS[1])
if count == 1 then
    redis.call('PEXPIRE', KEYS[1], ARGV[1])
end
return count
"#;

/// Configuration for the Redis counter store.
#[derive(Debug, Clone)]
pub struct RedisCounterStoreConfig {
    /// Key prefix for Redis keys (default: "action-throttle:")
    pub key_prefix: String,
    /// Upper bound on one increment round trip (default: 100ms)
    pub operation_timeout: Duration,
    /// Extra lifetime of a key past its window end (default: 60s)
    pub expiry_grace: Duration,
}

impl Default for RedisCounterStoreConfig {
    fn default() -> Self {
        Self {
            key_prefix: "action-throttle:".to_string(),
            operation_timeout: Duration::from_millis(100),
            expiry_grace: Duration::from_secs(60),
        }
    }
}

/// Redis-backed counter store for multi-instance deployments.
#[derive(Clone)]
pub struct RedisCounterStore {
    connection: ConnectionManager,
    script: Script,
    config: RedisCounterStoreConfig,
}

impl fmt::Debug for RedisCounterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCounterStore")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RedisCounterStore {
    /// Connect to Redis with default configuration.
    ///
    /// # Arguments
    /// * `url` - Redis connection URL (e.g., "redis://127.0.0.1/")
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect(url: &str) -> Result<Self, RedisError> {
        Self::connect_with_config(url, RedisCounterStoreConfig::default()).await
    }

    /// Connect to Redis with custom configuration.
    ///
    /// # Errors
    /// Returns error if connection fails.
    pub async fn connect_with_config(
        url: &str,
        config: RedisCounterStoreConfig,
    ) -> Result<Self, RedisError> {
        let client = Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;

        Ok(Self {
            connection,
            script: Script::new(INCREMENT_SCRIPT),
            config,
        })
    }

    /// Get the store configuration.
    pub fn config(&self) -> &RedisCounterStoreConfig {
        &self.config
    }

    /// Increment a counter, asynchronously.
    ///
    /// Same contract as [`CounterStore::increment_and_get`], for callers
    /// already running inside async code.
    ///
    /// # Errors
    /// `StoreError::timeout` if Redis does not answer within the configured
    /// operation timeout, `StoreError::unavailable` for any other failure.
    pub async fn increment_async(
        &self,
        key: &CounterKey,
        window: Duration,
        now: SystemTime,
    ) -> Result<CounterReading, StoreError> {
        let current = Window::containing(now, window);
        let redis_key = self.key(key, &current);
        let ttl_ms = u64::try_from((window + self.config.expiry_grace).as_millis())
            .unwrap_or(u64::MAX);

        let mut conn = self.connection.clone();
        let mut invocation = self.script.key(&redis_key);
        invocation.arg(ttl_ms);
        let reply = invocation.invoke_async::<_, u64>(&mut conn);

        let count = tokio::time::timeout(self.config.operation_timeout, reply)
            .await
            .map_err(|_| {
                StoreError::timeout(format!(
                    "no reply for {} within {:?}",
                    redis_key, self.config.operation_timeout
                ))
            })?
            .map_err(|e| store_error(&redis_key, e))?;

        Ok(CounterReading {
            count,
            window_start: current.start(),
        })
    }

    /// Delete every key under this store's prefix.
    ///
    /// Returns the number of keys deleted.
    ///
    /// # Errors
    /// Returns error if a SCAN or DEL fails.
    pub async fn clear(&self) -> Result<usize, RedisError> {
        let pattern = format!("{}*", self.config.key_prefix);
        let mut conn = self.connection.clone();
        let mut cursor: u64 = 0;
        let mut deleted = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let removed: usize = conn.del(&keys).await?;
                deleted += removed;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(deleted)
    }

    fn key(&self, key: &CounterKey, window: &Window) -> String {
        format!(
            "{}{}:{}:{}",
            self.config.key_prefix,
            key.action,
            key.subject,
            window.index()
        )
    }
}

impl CounterStore for RedisCounterStore {
    fn increment_and_get(
        &self,
        key: &CounterKey,
        window: Duration,
        now: SystemTime,
    ) -> Result<CounterReading, StoreError> {
        block_on(self.increment_async(key, window, now))?
    }
}

/// Run a future to completion from synchronous code.
fn block_on<F: Future>(future: F) -> Result<F::Output, StoreError> {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        if handle.runtime_flavor() == RuntimeFlavor::CurrentThread {
            return Err(StoreError::unavailable(
                "synchronous call from a current-thread runtime; use increment_async",
            ));
        }
        Ok(tokio::task::block_in_place(|| handle.block_on(future)))
    } else {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| StoreError::unavailable(format!("failed to start tokio runtime: {e}")))?;
        Ok(rt.block_on(future))
    }
}

fn store_error(key: &str, e: RedisError) -> StoreError {
    if e.is_timeout() {
        StoreError::timeout(format!("{key}: {e}"))
    } else {
        StoreError::unavailable(format!("{key}: {e}"))
    }
}
