use crate::db::Storage;
use crate::error::DermisError;
use moka::future::Cache;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

pub type PromptMap = Arc<HashMap<String, String>>;

/// Model name to prompt text, read through a short-lived cache.
#[derive(Clone)]
pub struct PromptStore {
    storage: Storage,
    cache: Cache<(), PromptMap>,
}

impl PromptStore {
    pub fn new(storage: Storage, ttl: Duration) -> Self {
        let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
        Self { storage, cache }
    }

    /// All prompts. Storage failures surface as [`DermisError::PromptFetch`].
    pub async fn get_all(&self) -> Result<PromptMap, DermisError> {
        let storage = self.storage.clone();
        self.cache
            .try_get_with((), async move {
                let rows = storage.list_prompts().await?;
                Ok::<_, DermisError>(Arc::new(
                    rows.into_iter().map(|p| (p.model, p.prompt)).collect(),
                ))
            })
            .await
            .map_err(|e| DermisError::PromptFetch(e.to_string()))
    }

    pub async fn get(&self, model: &str) -> Result<Option<String>, DermisError> {
        Ok(self.get_all().await?.get(model).cloned())
    }

    pub async fn set(&self, model: &str, prompt: &str) -> Result<i64, DermisError> {
        let id = self.storage.upsert_prompt(model, prompt).await?;
        self.cache.invalidate(&()).await;
        info!(model, id, chars = prompt.len(), "prompt updated");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn store(ttl: Duration) -> PromptStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let storage = Storage::new(pool);
        storage.init_schema().await.unwrap();
        PromptStore::new(storage, ttl)
    }

    #[tokio::test]
    async fn set_invalidates_cached_map() {
        let s = store(Duration::from_secs(3600)).await;
        assert!(s.get("vision").await.unwrap().is_none());

        s.set("vision", "look closely").await.unwrap();
        assert_eq!(s.get("vision").await.unwrap().as_deref(), Some("look closely"));

        s.set("vision", "look again").await.unwrap();
        let all = s.get_all().await.unwrap();
        assert_eq!(all.get("vision").map(String::as_str), Some("look again"));
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn storage_failure_is_a_prompt_fetch_error() {
        let s = store(Duration::from_secs(1)).await;
        s.storage.close().await;
        let err = s.get_all().await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to fetch prompt: "));
    }
}
