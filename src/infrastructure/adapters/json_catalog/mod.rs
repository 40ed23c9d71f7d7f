use async_trait::async_trait;
use std::path::PathBuf;

use crate::{
    domain::{DomainError, Listing},
    ports::ListingCatalog,
};

/// Catalog backed by a JSON array of listings on disk.
///
/// The file is re-read for every snapshot so edits show up without a restart.
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

#[async_trait]
impl ListingCatalog for JsonFileCatalog {
    async fn snapshot(&self) -> Result<Vec<Listing>, DomainError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| DomainError::Catalog(format!("{}: {}", self.path.display(), e)))?;

        let listings: Vec<Listing> = serde_json::from_str(&raw)
            .map_err(|e| DomainError::Catalog(format!("{}: {}", self.path.display(), e)))?;

        tracing::debug!("Loaded {} listings from {}", listings.len(), self.path.display());
        Ok(listings)
    }

    fn catalog_name(&self) -> &'static str {
        "json-file"
    }
}
