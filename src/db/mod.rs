pub mod cache;
pub mod memory;
pub mod postgres;
pub mod redis;

pub use cache::{Cache, CacheKey};
pub use memory::{InMemoryStore, MemoryCache};
pub use postgres::{create_pool, PgStore};
pub use self::redis::{create_redis_client, CacheWriterHandle, RedisCache};
