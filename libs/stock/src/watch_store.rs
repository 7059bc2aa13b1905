use std::{collections::HashMap, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use fred::prelude::*;
use fred::types::SetOptions;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::{
    error::StoreError,
    watch_list::{RECORD_VERSION, WatchList},
};

/// Per-user watch list persistence.
#[async_trait]
pub trait WatchListStore: Send + Sync {
    /// Load a user's list. Absent records load as empty; so do malformed ones,
    /// which are logged.
    async fn load(&self, user_id: &str) -> Result<WatchList, StoreError>;

    /// Replace the user's record with `list`.
    async fn save(&self, user_id: &str, list: &WatchList) -> Result<(), StoreError>;

    /// Prepare the backing store before serving traffic.
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

fn decode_or_empty(user_id: &str, raw: Option<String>) -> WatchList {
    let Some(raw) = raw else {
        return WatchList::new();
    };

    match WatchList::decode(&raw) {
        Ok(list) => list,
        Err(e) => {
            warn!(user_id, error = %e, "discarding malformed watch list record");
            WatchList::new()
        }
    }
}

#[derive(Clone)]
pub struct RedisWatchListStore {
    client: Client,
    key_prefix: String,
}

impl RedisWatchListStore {
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Connect to `redis_url`, keeping every key under `key_prefix`.
    pub async fn new(
        redis_url: &str,
        key_prefix: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let key_prefix = key_prefix.into();

        let client = Builder::from_config(Config::from_url(redis_url)?)
            .with_connection_config(|config| config.connection_timeout = connect_timeout)
            .build()?;

        let prefix = key_prefix.clone();
        client.on_error(move |(error, server)| {
            let prefix = prefix.clone();
            async move {
                error!(key_prefix = %prefix, ?server, ?error, "watch list store connection error");
                Ok(())
            }
        });

        client.connect();
        client.wait_for_connect().await?;
        info!(key_prefix = %key_prefix, "connected to watch list store");

        Ok(Self { client, key_prefix })
    }

    fn watchlist_key(&self, user_id: &str) -> String {
        format!("{}:watchlist:{}", self.key_prefix, user_id)
    }

    fn schema_key(&self) -> String {
        format!("{}:schema", self.key_prefix)
    }
}

#[async_trait]
impl WatchListStore for RedisWatchListStore {
    async fn load(&self, user_id: &str) -> Result<WatchList, StoreError> {
        let raw: Option<String> = self.client.get(self.watchlist_key(user_id)).await?;
        Ok(decode_or_empty(user_id, raw))
    }

    async fn save(&self, user_id: &str, list: &WatchList) -> Result<(), StoreError> {
        let _: () = self
            .client
            .set(self.watchlist_key(user_id), list.encode(), None, None, false)
            .await?;

        Ok(())
    }

    /// Record the layout version on first start, refuse to run against a
    /// store written with a different one.
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let _: Option<String> = self
            .client
            .set(
                self.schema_key(),
                RECORD_VERSION.to_string(),
                None,
                Some(SetOptions::NX),
                false,
            )
            .await?;

        let found: Option<String> = self.client.get(self.schema_key()).await?;
        match found {
            Some(v) if v == RECORD_VERSION.to_string() => {
                info!(version = RECORD_VERSION, "watch list store ready");
                Ok(())
            }
            other => Err(StoreError::SchemaMismatch {
                found: other.unwrap_or_default(),
                expected: RECORD_VERSION,
            }),
        }
    }
}

/// Process-local store holding encoded records, same format as Redis.
#[derive(Default)]
pub struct MemoryWatchListStore {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryWatchListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw record text as-is.
    pub async fn insert_raw(&self, user_id: &str, raw: impl Into<String>) {
        self.records
            .write()
            .await
            .insert(user_id.to_string(), raw.into());
    }

    pub async fn raw(&self, user_id: &str) -> Option<String> {
        self.records.read().await.get(user_id).cloned()
    }
}

#[async_trait]
impl WatchListStore for MemoryWatchListStore {
    async fn load(&self, user_id: &str) -> Result<WatchList, StoreError> {
        Ok(decode_or_empty(user_id, self.raw(user_id).await))
    }

    async fn save(&self, user_id: &str, list: &WatchList) -> Result<(), StoreError> {
        self.insert_raw(user_id, list.encode()).await;
        Ok(())
    }
}
