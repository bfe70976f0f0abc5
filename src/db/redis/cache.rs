use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, OnceCell};
use tokio::time::timeout;

use crate::error::AppError;
use crate::error::AppResult;

/// Keys for values cached in Redis
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Poster URL lookup, keyed by the item's external id
    Poster(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Poster(external_id) => write!(f, "poster:{}", external_id.trim()),
        }
    }
}

/// Creates a Redis client for poster caching
///
/// Opening the client does not connect; connection errors surface on first use
/// and are treated as cache misses by callers.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Budget for a read; a slow or unreachable Redis counts as a miss after this
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Budget for one background write, including connecting
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Pending background write
struct CacheWrite {
    key: String,
    value: String,
    ttl: u64,
}

/// Connection shared by readers and the writer task, opened on first use
#[derive(Clone)]
struct LazyConnection {
    client: Client,
    manager: Arc<OnceCell<ConnectionManager>>,
}

impl LazyConnection {
    fn new(client: Client) -> Self {
        Self {
            client,
            manager: Arc::new(OnceCell::new()),
        }
    }

    async fn get(&self) -> AppResult<ConnectionManager> {
        let manager = self
            .manager
            .get_or_try_init(|| self.client.get_connection_manager())
            .await?;
        Ok(manager.clone())
    }
}

/// Redis-backed read-through cache with fire-and-forget writes
#[derive(Clone)]
pub struct Cache {
    connection: LazyConnection,
    write_tx: mpsc::UnboundedSender<CacheWrite>,
}

/// Stops the background writer once queued writes are flushed
pub struct CacheWriterHandle {
    shutdown_tx: oneshot::Sender<oneshot::Sender<usize>>,
}

impl CacheWriterHandle {
    /// Signals the writer and waits until it has drained its queue
    pub async fn shutdown(self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.shutdown_tx.send(done_tx).is_err() {
            tracing::warn!("Cache writer already stopped");
            return;
        }

        match done_rx.await {
            Ok(flushed) => tracing::info!(flushed = flushed, "Cache writer stopped"),
            Err(_) => tracing::warn!("Cache writer exited without acknowledging shutdown"),
        }
    }
}

impl Cache {
    /// Creates the cache and spawns its writer task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(client: Client) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let connection = LazyConnection::new(client);

        tokio::spawn(Self::writer_task(connection.clone(), write_rx, shutdown_rx));

        (
            Self {
                connection,
                write_tx,
            },
            CacheWriterHandle { shutdown_tx },
        )
    }

    async fn writer_task(
        connection: LazyConnection,
        mut write_rx: mpsc::UnboundedReceiver<CacheWrite>,
        mut shutdown_rx: oneshot::Receiver<oneshot::Sender<usize>>,
    ) {
        tracing::debug!("Cache writer task started");

        loop {
            tokio::select! {
                Some(write) = write_rx.recv() => {
                    if let Err(e) = Self::write(&connection, write).await {
                        tracing::warn!(error = %e, "Failed to write to Redis cache");
                    }
                }
                done = &mut shutdown_rx => {
                    let mut flushed = 0;
                    while let Ok(write) = write_rx.try_recv() {
                        match Self::write(&connection, write).await {
                            Ok(()) => flushed += 1,
                            Err(e) => tracing::warn!(error = %e, "Failed to flush cache write during shutdown"),
                        }
                    }
                    if let Ok(done) = done {
                        let _ = done.send(flushed);
                    }
                    break;
                }
            }
        }
    }

    async fn write(connection: &LazyConnection, write: CacheWrite) -> AppResult<()> {
        let key = write.key.clone();
        let set = async {
            let mut conn = connection.get().await?;
            let _: () = conn.set_ex(write.key, write.value, write.ttl).await?;
            Ok::<_, AppError>(())
        };

        timeout(WRITE_TIMEOUT, set)
            .await
            .map_err(|_| AppError::Internal(format!("Cache write for {} timed out", key)))?
    }

    /// Reads and deserializes the value stored under `key`, if any
    ///
    /// Fails with `Internal` when Redis does not answer within `READ_TIMEOUT`.
    pub async fn get_from_cache<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let read = async {
            let mut conn = self.connection.get().await?;
            let cached: Option<String> = conn.get(key.to_string()).await?;
            Ok::<_, AppError>(cached)
        };

        let cached = timeout(READ_TIMEOUT, read)
            .await
            .map_err(|_| AppError::Internal(format!("Cache read for {} timed out", key)))??;

        cached
            .map(|json| {
                serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error for {}: {}", key, e))
                })
            })
            .transpose()
    }

    /// Queues a write without waiting for Redis
    pub fn set_in_background<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let value = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, key = %key, "Cache serialization error");
                return;
            }
        };

        let write = CacheWrite {
            key: key.to_string(),
            value,
            ttl,
        };

        if self.write_tx.send(write).is_err() {
            tracing::warn!(key = %key, "Cache writer is stopped, dropping write");
        }
    }
}
