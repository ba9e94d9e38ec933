//! Redis-backed store.
//!
//! The primary and cache partitions live in adjacent logical databases
//! (`db` and `db + 1`) and each owns an independent connection. Every
//! operation runs a health probe first; a failed probe triggers a bounded
//! reconnect loop with a fixed one-second pause between attempts. All
//! network calls are wrapped in the configured socket timeout, and a
//! timeout is treated as a connection failure.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::StoreError;
use crate::traits::Store;

/// Pause between reconnection attempts.
const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Connection settings for the Redis store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Logical database index of the primary partition; the cache
    /// partition uses the next index.
    #[serde(default)]
    pub db: i64,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_socket_timeout_ms")]
    pub socket_timeout_ms: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    6379
}
fn default_socket_timeout_ms() -> u64 {
    500
}
fn default_cache_ttl_secs() -> u64 {
    3600
}
fn default_max_retries() -> u32 {
    3
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db: 0,
            password: None,
            socket_timeout_ms: default_socket_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl StoreConfig {
    pub fn socket_timeout(&self) -> Duration {
        Duration::from_millis(self.socket_timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Bounded reconnect loop: up to `max_retries` attempts with a fixed
/// pause between them, reporting the last failure when the budget is
/// exhausted.
pub(crate) async fn connect_with_retry<T, F, Fut>(
    max_retries: u32,
    pause: Duration,
    mut connect: F,
) -> Result<T, String>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, String>>,
{
    let attempts = max_retries.max(1);
    let mut last = String::new();
    for attempt in 1..=attempts {
        match connect().await {
            Ok(value) => return Ok(value),
            Err(message) => {
                tracing::warn!(attempt, error = %message, "connection attempt failed");
                last = message;
            }
        }
        if attempt < attempts {
            tokio::time::sleep(pause).await;
        }
    }
    Err(format!("gave up after {attempts} attempts: {last}"))
}

/// One connection-bearing partition.
struct Partition {
    label: &'static str,
    client: Client,
    conn: Mutex<Option<MultiplexedConnection>>,
    timeout: Duration,
    max_retries: u32,
}

impl Partition {
    fn new(cfg: &StoreConfig, db: i64, label: &'static str) -> Result<Self, StoreError> {
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(cfg.host.clone(), cfg.port),
            redis: RedisConnectionInfo {
                db,
                username: None,
                password: cfg.password.clone(),
                ..Default::default()
            },
        };
        let client =
            Client::open(info).map_err(|e| StoreError::connection(format!("{label}: {e}")))?;
        Ok(Self {
            label,
            client,
            conn: Mutex::new(None),
            timeout: cfg.socket_timeout(),
            max_retries: cfg.max_retries,
        })
    }

    /// Health-probe the cached connection and hand out a clone; reconnect
    /// under the bounded retry policy when the probe fails or no
    /// connection exists yet.
    async fn connection(&self) -> Result<MultiplexedConnection, StoreError> {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_ref() {
            let mut probe = conn.clone();
            let pong = tokio::time::timeout(
                self.timeout,
                redis::cmd("PING").query_async::<String>(&mut probe),
            )
            .await;
            if matches!(pong, Ok(Ok(_))) {
                return Ok(conn.clone());
            }
            tracing::warn!(partition = self.label, "health probe failed, reconnecting");
            *guard = None;
        }

        let client = self.client.clone();
        let timeout = self.timeout;
        let conn = connect_with_retry(self.max_retries, RETRY_PAUSE, || {
            let client = client.clone();
            async move {
                match tokio::time::timeout(timeout, client.get_multiplexed_async_connection())
                    .await
                {
                    Ok(Ok(conn)) => Ok(conn),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("connect timed out after {timeout:?}")),
                }
            }
        })
        .await
        .map_err(|message| StoreError::connection(format!("{}: {message}", self.label)))?;

        *guard = Some(conn.clone());
        Ok(conn)
    }

    /// Run one driver call under the socket timeout, mapping driver
    /// errors and timeouts to connection failures.
    async fn run<T>(
        &self,
        op: impl Future<Output = redis::RedisResult<T>>,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, op).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(StoreError::connection(format!("{}: {e}", self.label))),
            Err(_) => Err(StoreError::connection(format!(
                "{}: operation timed out after {:?}",
                self.label, self.timeout
            ))),
        }
    }
}

/// Redis store with a durable primary partition and a TTL cache partition.
pub struct RedisStore {
    primary: Partition,
    cache: Partition,
    ttl: Duration,
}

impl RedisStore {
    /// Connections are established lazily on first use.
    pub fn new(cfg: &StoreConfig) -> Result<Self, StoreError> {
        Ok(Self {
            primary: Partition::new(cfg, cfg.db, "primary")?,
            cache: Partition::new(cfg, cfg.db + 1, "cache")?,
            ttl: cfg.cache_ttl(),
        })
    }

    async fn primary_read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.primary.connection().await?;
        self.primary.run(conn.get::<_, Option<String>>(key)).await
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn get(&self, key: &str) -> Result<String, StoreError> {
        self.primary_read(key)
            .await?
            .ok_or_else(|| StoreError::not_found(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let mut conn = self.primary.connection().await?;
        self.primary.run(conn.set::<_, _, ()>(key, value)).await?;
        Ok(true)
    }

    async fn delete(&self, key: &str) -> Result<usize, StoreError> {
        let mut conn = self.primary.connection().await?;
        self.primary.run(conn.del::<_, usize>(key)).await
    }

    async fn cache_get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.cache.connection().await?;
        if let Some(value) = self.cache.run(conn.get::<_, Option<String>>(key)).await? {
            return Ok(Some(value));
        }
        tracing::debug!(key, "cache miss, falling through to the primary partition");
        match self.primary_read(key).await {
            Ok(value) => Ok(value),
            Err(err) => {
                tracing::warn!(key, error = %err, "best-effort primary read failed");
                Ok(None)
            }
        }
    }

    async fn cache_set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.cache.connection().await?;
        self.cache
            .run(conn.set_ex::<_, _, ()>(key, value, self.ttl.as_secs()))
            .await
    }
}
