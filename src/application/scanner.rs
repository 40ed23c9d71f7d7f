use std::{sync::Arc, time::Duration};

use crate::{
    application::SavedSearchService,
    domain::DomainError,
    ports::Notifier,
};

const NOTIFICATION_TITLE: &str = "Marketplace Finder";

/// Periodically replays saved searches that have a notification channel
/// enabled and reports the newest match on each enabled channel.
pub struct Scanner {
    saved: Arc<SavedSearchService>,
    push: Arc<dyn Notifier>,
    email: Arc<dyn Notifier>,
}

impl Scanner {
    pub fn new(
        saved: Arc<SavedSearchService>,
        push: Arc<dyn Notifier>,
        email: Arc<dyn Notifier>,
    ) -> Self {
        Self { saved, push, email }
    }

    /// One pass over all saved searches. Returns the number of notifications
    /// delivered; a failed delivery is logged and does not stop the pass.
    pub async fn scan_once(&self) -> Result<usize, DomainError> {
        let searches = self.saved.list().await?;
        let mut sent = 0;

        for search in searches.iter().filter(|s| s.notifications.any_enabled()) {
            let result = match self.saved.replay(&search.id).await {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!("Scan of saved search {} failed: {}", search.id, e);
                    continue;
                }
            };

            if let Some(error) = &result.error {
                tracing::warn!("Scan of saved search {} failed: {}", search.id, error);
                continue;
            }

            let Some(first) = result.listings.first() else {
                continue;
            };

            let message = format!("New item: {}", first.listing.title);
            let channels = [
                (search.notifications.push, &self.push),
                (search.notifications.email, &self.email),
            ];
            for (_, notifier) in channels.iter().filter(|(enabled, _)| *enabled) {
                match notifier.notify(NOTIFICATION_TITLE, &message).await {
                    Ok(()) => sent += 1,
                    Err(e) => tracing::warn!(
                        "Notifier {} failed for saved search {}: {}",
                        notifier.notifier_name(),
                        search.id,
                        e
                    ),
                }
            }
        }

        tracing::info!("Scanned {} saved searches, sent {} notifications", searches.len(), sent);
        Ok(sent)
    }

    pub async fn run(self: Arc<Self>, period: Duration) {
        let mut interval = tokio::time::interval(period);
        // the first tick completes immediately
        interval.tick().await;

        loop {
            interval.tick().await;
            if let Err(e) = self.scan_once().await {
                tracing::warn!("Saved search scan failed: {}", e);
            }
        }
    }
}
