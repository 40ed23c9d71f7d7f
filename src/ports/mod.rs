use crate::domain::{DomainError, Listing, NotificationPatch, Notifications, SavedSearch};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait ListingCatalog: Send + Sync {
    /// Immutable snapshot of the current catalog.
    async fn snapshot(&self) -> Result<Vec<Listing>, DomainError>;
    fn catalog_name(&self) -> &'static str;
}

#[async_trait]
pub trait SavedSearchRepository: Send + Sync {
    async fn insert(&self, search: &SavedSearch) -> Result<(), DomainError>;
    async fn find_by_id(&self, id: &str) -> Result<Option<SavedSearch>, DomainError>;
    async fn find_all(&self) -> Result<Vec<SavedSearch>, DomainError>;
    async fn update_notifications(
        &self,
        id: &str,
        patch: &NotificationPatch,
    ) -> Result<Option<Notifications>, DomainError>;
    /// Returns `false` when nothing was stored under `id`.
    async fn delete(&self, id: &str) -> Result<bool, DomainError>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<(), DomainError>;
    fn notifier_name(&self) -> &'static str;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
