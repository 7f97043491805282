use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client, ErrorKind, RedisError};
use tokio::sync::{mpsc, OnceCell};
use tokio::task::JoinHandle;

use crate::error::{AppError, AppResult};
use crate::services::sources::KeyValueCache;

/// Creates a Redis client for caching
///
/// Opening a client does not connect. The shared connection is established on the
/// first cache access, so an unreachable Redis only surfaces there.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Lazily established, reconnecting Redis connection with a per-operation deadline
struct RedisConnection {
    client: Client,
    manager: OnceCell<ConnectionManager>,
    timeout: Duration,
}

impl RedisConnection {
    fn new(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            manager: OnceCell::new(),
            timeout,
        }
    }

    /// Runs `op` against the shared connection, failing once the deadline passes
    ///
    /// The deadline covers connecting too, so a server that accepts connections
    /// but never replies yields `AppError::Cache` instead of stalling the caller.
    async fn bounded<T, F, Fut>(&self, op: F) -> AppResult<T>
    where
        F: FnOnce(ConnectionManager) -> Fut,
        Fut: Future<Output = Result<T, RedisError>>,
    {
        let attempt = async {
            let manager = self
                .manager
                .get_or_try_init(|| ConnectionManager::new(self.client.clone()))
                .await?
                .clone();
            op(manager).await
        };

        match tokio::time::timeout(self.timeout, attempt).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(AppError::Cache(RedisError::from((
                ErrorKind::IoError,
                "Redis operation timed out",
                format!("no reply within {} ms", self.timeout.as_millis()),
            )))),
        }
    }
}

/// Message for asynchronous cache writes
struct CacheWriteMessage {
    key: String,
    value: String,
    ttl: u64,
}

/// Redis-backed key-value cache with a non-blocking write path
#[derive(Clone)]
pub struct RedisCache {
    connection: Arc<RedisConnection>,
    write_tx: mpsc::UnboundedSender<CacheWriteMessage>,
}

/// Handle for gracefully shutting down the cache writer
pub struct CacheWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CacheWriterHandle {
    /// Stops the writer once every queued write has been attempted
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Cache writer task failed");
        }
    }
}

impl RedisCache {
    /// Creates a new cache and spawns its background writer task
    ///
    /// Every read and write is abandoned after `timeout`.
    pub fn new(redis_client: Client, timeout: Duration) -> (Self, CacheWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let connection = Arc::new(RedisConnection::new(redis_client, timeout));
        let task = tokio::spawn(Self::cache_writer_task(
            connection.clone(),
            write_rx,
            shutdown_rx,
        ));

        let cache = Self {
            connection,
            write_tx,
        };

        (cache, CacheWriterHandle { shutdown_tx, task })
    }

    /// Background task that processes cache write messages
    ///
    /// On shutdown signal, drains the messages already queued before exiting.
    async fn cache_writer_task(
        connection: Arc<RedisConnection>,
        mut write_rx: mpsc::UnboundedReceiver<CacheWriteMessage>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::debug!("Cache writer started");

        loop {
            tokio::select! {
                Some(msg) = write_rx.recv() => {
                    let key = msg.key.clone();
                    if let Err(e) = Self::write_to_redis(&connection, msg).await {
                        tracing::warn!(key = %key, error = %e, "Dropped recommendation cache write");
                    }
                }
                _ = shutdown_rx.recv() => break,
            }
        }

        write_rx.close();
        let (mut flushed, mut failed) = (0usize, 0usize);
        while let Some(msg) = write_rx.recv().await {
            match Self::write_to_redis(&connection, msg).await {
                Ok(()) => flushed += 1,
                Err(_) => failed += 1,
            }
        }
        tracing::info!(flushed, failed, "Cache writer stopped");
    }

    /// Writes a single message to Redis
    async fn write_to_redis(connection: &RedisConnection, msg: CacheWriteMessage) -> AppResult<()> {
        connection
            .bounded(|mut conn| async move { conn.set_ex(msg.key, msg.value, msg.ttl).await })
            .await
    }
}

#[async_trait::async_trait]
impl KeyValueCache for RedisCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.connection
            .bounded(|mut conn| async move { conn.get(key).await })
            .await
    }

    /// Queues the write for the background task and returns immediately
    async fn set_with_ttl(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        let msg = CacheWriteMessage {
            key: key.to_string(),
            value,
            ttl: ttl_seconds,
        };

        self.write_tx
            .send(msg)
            .map_err(|e| AppError::Internal(format!("Cache writer stopped: {}", e)))
    }
}

// Tests against a live server read REDIS_URL and are ignored by default.

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(200);

    fn redis_url() -> String {
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string())
    }

    /// Address of a server that accepts connections and never replies
    pub(crate) async fn silent_redis_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });
        format!("redis://{}", addr)
    }

    #[tokio::test]
    async fn test_silent_redis_read_times_out() {
        let client = create_redis_client(&silent_redis_url().await).unwrap();
        let (cache, _handle) = RedisCache::new(client, TIMEOUT);

        let result = tokio::time::timeout(Duration::from_secs(5), cache.get("recommendations:1"))
            .await
            .expect("read must give up on its own deadline");

        assert!(matches!(result, Err(AppError::Cache(_))));
    }

    #[tokio::test]
    async fn test_writer_shutdown_completes_against_silent_redis() {
        let client = create_redis_client(&silent_redis_url().await).unwrap();
        let (cache, handle) = RedisCache::new(client, TIMEOUT);

        cache
            .set_with_ttl("recommendations:1", "[]".to_string(), 60)
            .await
            .unwrap();
        cache
            .set_with_ttl("recommendations:2", "[]".to_string(), 60)
            .await
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle.shutdown())
            .await
            .expect("queued writes must be abandoned after their deadline");
    }

    #[tokio::test]
    async fn test_unreachable_redis_reports_cache_error() {
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, _handle) = RedisCache::new(client, TIMEOUT);

        let result = cache.get("recommendations:1").await;

        assert!(matches!(result, Err(AppError::Cache(_))));
    }

    #[tokio::test]
    async fn test_set_with_ttl_does_not_block_when_unreachable() {
        let client = create_redis_client("redis://127.0.0.1:1").unwrap();
        let (cache, handle) = RedisCache::new(client, TIMEOUT);

        let result = cache
            .set_with_ttl("recommendations:1", "[]".to_string(), 60)
            .await;

        assert!(result.is_ok());
        handle.shutdown().await;
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_set_with_ttl_writes_to_cache() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, _handle) = RedisCache::new(client.clone(), TIMEOUT);

        let key = "recommendations:test_async_write";
        cache
            .set_with_ttl(key, "[1,2]".to_string(), 60)
            .await
            .unwrap();

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        let retrieved = cache.get(key).await.unwrap();
        assert_eq!(retrieved, Some("[1,2]".to_string()));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(key).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_cache_writer_graceful_shutdown() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, handle) = RedisCache::new(client.clone(), TIMEOUT);

        let key = "recommendations:test_shutdown";
        cache
            .set_with_ttl(key, "[]".to_string(), 60)
            .await
            .unwrap();

        handle.shutdown().await;

        let retrieved = cache.get(key).await.unwrap();
        assert_eq!(retrieved, Some("[]".to_string()));

        let mut conn = client.get_multiplexed_async_connection().await.unwrap();
        let _: () = conn.del(key).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running Redis server"]
    async fn test_cache_miss() {
        let client = create_redis_client(&redis_url()).unwrap();
        let (cache, _handle) = RedisCache::new(client, TIMEOUT);

        let retrieved = cache.get("recommendations:nonexistent_12345").await.unwrap();

        assert_eq!(retrieved, None);
    }
}
