pub mod scanner;

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    domain::{
        evaluate, DomainError, Filters, NotificationPatch, Notifications, QuerySpec, SavedSearch,
        SearchResult,
    },
    ports::{Clock, ListingCatalog, SavedSearchRepository},
};

pub use scanner::Scanner;

pub struct SearchService {
    catalog: Arc<dyn ListingCatalog>,
    clock: Arc<dyn Clock>,
}

impl SearchService {
    pub fn new(catalog: Arc<dyn ListingCatalog>, clock: Arc<dyn Clock>) -> Self {
        Self { catalog, clock }
    }

    /// Runs `spec` against a fresh catalog snapshot.
    ///
    /// Catalog failures never propagate: the caller gets an empty result that
    /// carries the error message.
    pub async fn search(&self, spec: &QuerySpec) -> SearchResult {
        match self.catalog.snapshot().await {
            Ok(listings) => {
                let result = evaluate(&listings, spec, self.clock.now());
                tracing::debug!(
                    "Search {:?} matched {} of {} listings from {}",
                    spec.effective_query(),
                    result.total,
                    listings.len(),
                    self.catalog.catalog_name()
                );
                result
            }
            Err(e) => {
                tracing::warn!("Catalog {} failed: {}", self.catalog.catalog_name(), e);
                let mut result = SearchResult::empty(spec.effective_query());
                result.error = Some(e.to_string());
                result
            }
        }
    }

    pub fn catalog_name(&self) -> &'static str {
        self.catalog.catalog_name()
    }
}

pub struct SavedSearchService {
    repository: Arc<dyn SavedSearchRepository>,
    search: Arc<SearchService>,
}

impl SavedSearchService {
    pub fn new(repository: Arc<dyn SavedSearchRepository>, search: Arc<SearchService>) -> Self {
        Self { repository, search }
    }

    pub async fn create(&self, query: String, filters: Filters) -> Result<SavedSearch, DomainError> {
        let saved = SavedSearch {
            id: Uuid::new_v4().to_string(),
            query,
            filters,
            notifications: Notifications::default(),
            created_at: Utc::now(),
        };
        self.repository.insert(&saved).await?;
        tracing::info!("Saved search {} created", saved.id);
        Ok(saved)
    }

    /// All saved searches, most recently created first.
    pub async fn list(&self) -> Result<Vec<SavedSearch>, DomainError> {
        let mut searches = self.repository.find_all().await?;
        searches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(searches)
    }

    pub async fn get(&self, id: &str) -> Result<SavedSearch, DomainError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(id.to_string()))
    }

    pub async fn delete(&self, id: &str) -> Result<(), DomainError> {
        if self.repository.delete(id).await? {
            tracing::info!("Saved search {} deleted", id);
            Ok(())
        } else {
            Err(DomainError::NotFound(id.to_string()))
        }
    }

    pub async fn patch_notifications(
        &self,
        id: &str,
        patch: &NotificationPatch,
    ) -> Result<Notifications, DomainError> {
        let notifications = self
            .repository
            .update_notifications(id, patch)
            .await?
            .ok_or_else(|| DomainError::NotFound(id.to_string()))?;
        tracing::info!(
            "Saved search {} notifications: email={} push={}",
            id,
            notifications.email,
            notifications.push
        );
        Ok(notifications)
    }

    /// Re-executes a saved search against the live catalog.
    pub async fn replay(&self, id: &str) -> Result<SearchResult, DomainError> {
        let saved = self.get(id).await?;
        Ok(self.search.search(&saved.to_query_spec()).await)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::infrastructure::adapters::saved_store::InMemorySavedSearchRepository;

    fn services() -> (Arc<SearchService>, SavedSearchService) {
        let search = Arc::new(SearchService::new(
            Arc::new(StaticCatalog(sample_catalog())),
            Arc::new(FixedClock(fixed_now())),
        ));
        let saved = SavedSearchService::new(
            Arc::new(InMemorySavedSearchRepository::new()),
            search.clone(),
        );
        (search, saved)
    }

    #[tokio::test]
    async fn test_search_uses_injected_clock() {
        let (search, _) = services();
        let spec = QuerySpec::new(
            None,
            Filters {
                category: Some("Electronics".into()),
                ..Default::default()
            },
        );
        let result = search.search(&spec).await;
        assert_eq!(result.total, 1);
        assert_eq!(result.listings[0].listing.id, "laptop");
        assert_eq!(result.listings[0].relative_time, "2h ago");
    }

    #[tokio::test]
    async fn test_catalog_failure_yields_empty_result_with_error() {
        let search = SearchService::new(Arc::new(FailingCatalog), Arc::new(FixedClock(fixed_now())));
        let result = search
            .search(&QuerySpec::new(Some("bike".into()), Filters::default()))
            .await;
        assert!(result.listings.is_empty());
        assert_eq!(result.total, 0);
        assert_eq!(result.query, "bike");
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_saved_search_lifecycle() {
        let (_, saved) = services();

        let first = saved.create("laptop".into(), Filters::default()).await.unwrap();
        let second = saved.create("oven".into(), Filters::default()).await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(first.notifications, Notifications::default());

        let listed = saved.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at >= listed[1].created_at);

        let notifications = saved
            .patch_notifications(&first.id, &NotificationPatch { email: None, push: Some(true) })
            .await
            .unwrap();
        assert_eq!(notifications, Notifications { email: false, push: true });
        assert_eq!(saved.get(&first.id).await.unwrap().notifications, notifications);

        saved.delete(&first.id).await.unwrap();
        assert_eq!(saved.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (_, saved) = services();

        assert!(matches!(saved.delete("missing").await, Err(DomainError::NotFound(_))));
        assert!(matches!(
            saved.patch_notifications("missing", &NotificationPatch::default()).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(matches!(saved.replay("missing").await, Err(DomainError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_replay_runs_stored_filters() {
        let (_, saved) = services();
        let filters = Filters {
            price_min: Some(1000.0),
            ..Default::default()
        };
        let created = saved.create(String::new(), filters).await.unwrap();

        let result = saved.replay(&created.id).await.unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.listings[0].listing.id, "oven");
        assert_eq!(result.query, "");
    }
}
