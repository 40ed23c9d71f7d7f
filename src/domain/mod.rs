pub mod engine;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub use engine::evaluate;

/// Sentinel condition value that disables the condition filter.
pub const ANY_CONDITION: &str = "Any";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub city: String,
    pub category: String,
    pub image_url: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    #[serde(default)]
    pub condition: Option<String>,
}

/// A listing as returned by a search, with its recency label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedListing {
    #[serde(flatten)]
    pub listing: Listing,
    pub relative_time: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRange {
    #[default]
    Any,
    #[serde(rename = "last_24h")]
    Last24h,
    #[serde(rename = "last_3d")]
    Last3d,
    #[serde(rename = "last_7d")]
    Last7d,
}

impl DateRange {
    /// Unknown values fall back to `Any`.
    pub fn parse(value: &str) -> Self {
        match value {
            "last_24h" => DateRange::Last24h,
            "last_3d" => DateRange::Last3d,
            "last_7d" => DateRange::Last7d,
            _ => DateRange::Any,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DateRange::Any => "any",
            DateRange::Last24h => "last_24h",
            DateRange::Last3d => "last_3d",
            DateRange::Last7d => "last_7d",
        }
    }

    pub fn max_age(&self) -> Option<chrono::Duration> {
        match self {
            DateRange::Any => None,
            DateRange::Last24h => Some(chrono::Duration::hours(24)),
            DateRange::Last3d => Some(chrono::Duration::days(3)),
            DateRange::Last7d => Some(chrono::Duration::days(7)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    #[default]
    DateDesc,
    DateAsc,
    PriceAsc,
    PriceDesc,
}

impl SortBy {
    /// Unknown values fall back to `DateDesc`.
    pub fn parse(value: &str) -> Self {
        match value {
            "date_asc" => SortBy::DateAsc,
            "price_asc" => SortBy::PriceAsc,
            "price_desc" => SortBy::PriceDesc,
            _ => SortBy::DateDesc,
        }
    }
}

impl<'de> Deserialize<'de> for DateRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .map(DateRange::parse)
            .unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for SortBy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(value
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .map(SortBy::parse)
            .unwrap_or_default())
    }
}

/// Filter set shared by search requests and saved searches.
///
/// Field names follow the wire format. `location` and `radius` are carried
/// through for clients but do not take part in evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_number", skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuerySpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(flatten)]
    pub filters: Filters,
}

impl QuerySpec {
    pub fn new(query: Option<String>, filters: Filters) -> Self {
        Self { query, filters }
    }

    /// The text query as echoed back to clients.
    pub fn effective_query(&self) -> &str {
        self.query.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub listings: Vec<AnnotatedListing>,
    pub total: usize,
    pub query: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResult {
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            listings: Vec::new(),
            total: 0,
            query: query.into(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notifications {
    #[serde(default)]
    pub email: bool,
    #[serde(default)]
    pub push: bool,
}

impl Notifications {
    pub fn any_enabled(&self) -> bool {
        self.email || self.push
    }

    pub fn apply(&mut self, patch: &NotificationPatch) {
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(push) = patch.push {
            self.push = push;
        }
    }
}

/// Partial update of notification flags; `None` leaves a flag untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPatch {
    #[serde(default)]
    pub email: Option<bool>,
    #[serde(default)]
    pub push: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedSearch {
    pub id: String,
    pub query: String,
    pub filters: Filters,
    pub notifications: Notifications,
    pub created_at: DateTime<Utc>,
}

impl SavedSearch {
    /// The query spec this saved search re-executes with.
    pub fn to_query_spec(&self) -> QuerySpec {
        let query = if self.query.is_empty() {
            None
        } else {
            Some(self.query.clone())
        };
        QuerySpec::new(query, self.filters.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Saved search not found: {0}")]
    NotFound(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Notification error: {0}")]
    Notification(String),
}

/// Accepts a number, a numeric string, an empty string or null.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}
