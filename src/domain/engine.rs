//! Listing query engine.
//!
//! Filtering, ordering and recency labelling over an in-memory catalog
//! snapshot. Everything here is a pure function of its inputs; `now` is always
//! passed in by the caller.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use super::{AnnotatedListing, Listing, QuerySpec, SearchResult, SortBy, ANY_CONDITION};

/// Evaluate `spec` against `catalog` as of `now`.
pub fn evaluate(catalog: &[Listing], spec: &QuerySpec, now: DateTime<Utc>) -> SearchResult {
    let needle = spec
        .query
        .as_deref()
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let mut matched: Vec<&Listing> = catalog
        .iter()
        .filter(|listing| matches(listing, spec, needle.as_deref(), now))
        .collect();

    // sort_by is stable, ties keep catalog order
    matched.sort_by(|a, b| compare(a, b, spec.filters.sort_by));

    let listings: Vec<AnnotatedListing> = matched
        .into_iter()
        .map(|listing| AnnotatedListing {
            listing: listing.clone(),
            relative_time: relative_time(listing.published_at, now),
        })
        .collect();

    SearchResult {
        total: listings.len(),
        listings,
        query: spec.effective_query().to_string(),
        error: None,
    }
}

fn matches(listing: &Listing, spec: &QuerySpec, needle: Option<&str>, now: DateTime<Utc>) -> bool {
    let filters = &spec.filters;

    if let Some(category) = filters.category.as_deref().filter(|c| !c.is_empty()) {
        if listing.category != category {
            return false;
        }
    }

    if filters.price_min.is_some_and(|min| listing.price < min) {
        return false;
    }
    if filters.price_max.is_some_and(|max| listing.price > max) {
        return false;
    }

    if let Some(condition) = filters.condition.as_deref() {
        if condition != ANY_CONDITION && listing.condition.as_deref() != Some(condition) {
            return false;
        }
    }

    // whole seconds, matching the resolution of catalog timestamps
    if let Some(max_age) = filters.date_range.max_age() {
        if (now - listing.published_at).num_seconds() > max_age.num_seconds() {
            return false;
        }
    }

    match needle {
        Some(needle) => listing.title.to_lowercase().contains(needle),
        None => true,
    }
}

fn compare(a: &Listing, b: &Listing, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::PriceAsc => a.price.total_cmp(&b.price),
        SortBy::PriceDesc => b.price.total_cmp(&a.price),
        SortBy::DateAsc => a.published_at.cmp(&b.published_at),
        SortBy::DateDesc => b.published_at.cmp(&a.published_at),
    }
}

/// Human label for the age of a listing: `"5m ago"`, `"2h ago"`, `"3d ago"`.
///
/// Minute granularity is the finest; anything younger than two minutes,
/// including listings dated in the future, reads `"1m ago"`.
pub fn relative_time(published_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - published_at).num_seconds().max(0);

    if seconds < 3_600 {
        format!("{}m ago", (seconds / 60).max(1))
    } else if seconds < 86_400 {
        format!("{}h ago", seconds / 3_600)
    } else {
        format!("{}d ago", seconds / 86_400)
    }
}
