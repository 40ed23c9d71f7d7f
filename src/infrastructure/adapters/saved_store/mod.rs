use async_trait::async_trait;
use std::{collections::HashMap, path::PathBuf};
use tokio::sync::RwLock;

use crate::{
    domain::{DomainError, NotificationPatch, Notifications, SavedSearch},
    ports::SavedSearchRepository,
};

type SearchMap = HashMap<String, SavedSearch>;

fn insert_into(searches: &mut SearchMap, search: &SavedSearch) -> Result<(), DomainError> {
    if searches.contains_key(&search.id) {
        return Err(DomainError::Storage(format!("duplicate saved search id {}", search.id)));
    }
    searches.insert(search.id.clone(), search.clone());
    Ok(())
}

fn patch_in(searches: &mut SearchMap, id: &str, patch: &NotificationPatch) -> Option<Notifications> {
    searches.get_mut(id).map(|search| {
        search.notifications.apply(patch);
        search.notifications
    })
}

pub struct InMemorySavedSearchRepository {
    searches: RwLock<SearchMap>,
}

impl InMemorySavedSearchRepository {
    pub fn new() -> Self {
        Self::with_searches(Vec::new())
    }

    fn with_searches(searches: Vec<SavedSearch>) -> Self {
        Self {
            searches: RwLock::new(searches.into_iter().map(|s| (s.id.clone(), s)).collect()),
        }
    }
}

impl Default for InMemorySavedSearchRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SavedSearchRepository for InMemorySavedSearchRepository {
    async fn insert(&self, search: &SavedSearch) -> Result<(), DomainError> {
        insert_into(&mut *self.searches.write().await, search)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<SavedSearch>, DomainError> {
        Ok(self.searches.read().await.get(id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<SavedSearch>, DomainError> {
        Ok(self.searches.read().await.values().cloned().collect())
    }

    async fn update_notifications(
        &self,
        id: &str,
        patch: &NotificationPatch,
    ) -> Result<Option<Notifications>, DomainError> {
        Ok(patch_in(&mut *self.searches.write().await, id, patch))
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        Ok(self.searches.write().await.remove(id).is_some())
    }
}

/// Saved searches persisted as a JSON array, rewritten after each mutation.
///
/// A mutation is applied to a copy of the map, written to disk, and only then
/// swapped in, so a failed write leaves memory and file in agreement.
pub struct JsonFileSavedSearchRepository {
    path: PathBuf,
    inner: InMemorySavedSearchRepository,
}

impl JsonFileSavedSearchRepository {
    /// Loads existing records; a missing file starts an empty store.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let path = path.into();
        let searches: Vec<SavedSearch> = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| DomainError::Storage(format!("{}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(DomainError::Storage(format!("{}: {}", path.display(), e))),
        };

        tracing::info!("Loaded {} saved searches from {}", searches.len(), path.display());
        Ok(Self {
            path,
            inner: InMemorySavedSearchRepository::with_searches(searches),
        })
    }

    /// Runs `mutate` on a copy of the store and commits it once persisted.
    /// `mutate` reports whether anything changed; unchanged copies are not written.
    async fn commit<T, F>(&self, mutate: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut SearchMap) -> Result<(T, bool), DomainError>,
    {
        let mut searches = self.inner.searches.write().await;
        let mut candidate = searches.clone();
        let (out, changed) = mutate(&mut candidate)?;
        if changed {
            self.persist(&candidate).await?;
            *searches = candidate;
        }
        Ok(out)
    }

    async fn persist(&self, searches: &SearchMap) -> Result<(), DomainError> {
        let mut records: Vec<&SavedSearch> = searches.values().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        let json = serde_json::to_string_pretty(&records)
            .map_err(|e| DomainError::Storage(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainError::Storage(format!("{}: {}", parent.display(), e)))?;
        }

        let mut tmp_name = self.path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        tokio::fs::write(&tmp_path, json)
            .await
            .map_err(|e| DomainError::Storage(format!("{}: {}", tmp_path.display(), e)))?;

        if let Err(e) = tokio::fs::rename(&tmp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(DomainError::Storage(format!("{}: {}", self.path.display(), e)));
        }
        Ok(())
    }
}

#[async_trait]
impl SavedSearchRepository for JsonFileSavedSearchRepository {
    async fn insert(&self, search: &SavedSearch) -> Result<(), DomainError> {
        self.commit(|searches| insert_into(searches, search).map(|()| ((), true)))
            .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<SavedSearch>, DomainError> {
        self.inner.find_by_id(id).await
    }

    async fn find_all(&self) -> Result<Vec<SavedSearch>, DomainError> {
        self.inner.find_all().await
    }

    async fn update_notifications(
        &self,
        id: &str,
        patch: &NotificationPatch,
    ) -> Result<Option<Notifications>, DomainError> {
        self.commit(|searches| {
            let updated = patch_in(searches, id, patch);
            Ok((updated, updated.is_some()))
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        self.commit(|searches| {
            let removed = searches.remove(id).is_some();
            Ok((removed, removed))
        })
        .await
    }
}
