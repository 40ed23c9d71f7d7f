use clap::{Parser, Subcommand};

use crate::domain::{DateRange, Filters, NotificationPatch, SortBy};

#[derive(Parser)]
#[command(name = "marketplace-finder")]
#[command(about = "Search a marketplace listing catalog and manage saved searches")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API and the saved search scanner
    Serve {
        /// Listen address (overrides BIND_ADDR / PORT)
        #[arg(short, long)]
        bind: Option<String>,

        /// Do not run the periodic saved search scanner
        #[arg(long)]
        no_scan: bool,
    },

    /// Search the catalog
    Search {
        /// Text to match against listing titles
        query: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,

        /// Limit number of printed results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Manage saved searches
    Saved {
        #[command(subcommand)]
        action: SavedAction,
    },

    /// Run one pass of the saved search scanner
    Scan,
}

#[derive(Subcommand)]
pub enum SavedAction {
    /// List saved searches
    List,

    /// Save a search
    Create {
        /// Text to match against listing titles
        query: Option<String>,

        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Delete a saved search
    Delete {
        id: String,
    },

    /// Toggle notification channels
    Notify {
        id: String,

        /// Enable or disable e-mail notifications
        #[arg(long)]
        email: Option<bool>,

        /// Enable or disable push notifications
        #[arg(long)]
        push: Option<bool>,
    },

    /// Run a saved search against the catalog
    Run {
        id: String,
    },
}

#[derive(clap::Args, Debug, Default)]
pub struct FilterArgs {
    /// Exact category, e.g. Electronics
    #[arg(short, long)]
    pub category: Option<String>,

    /// Inclusive lower price bound
    #[arg(long)]
    pub price_min: Option<f64>,

    /// Inclusive upper price bound
    #[arg(long)]
    pub price_max: Option<f64>,

    /// Exact condition, or Any
    #[arg(long)]
    pub condition: Option<String>,

    /// any, last_24h, last_3d or last_7d
    #[arg(short, long, default_value = "any")]
    pub date_range: String,

    /// date_desc, date_asc, price_asc or price_desc
    #[arg(short, long, default_value = "date_desc")]
    pub sort_by: String,

    /// Location, stored with saved searches
    #[arg(long)]
    pub location: Option<String>,

    /// Radius around the location, stored with saved searches
    #[arg(long)]
    pub radius: Option<f64>,
}

impl FilterArgs {
    pub fn into_filters(self) -> Filters {
        Filters {
            category: self.category,
            price_min: self.price_min,
            price_max: self.price_max,
            condition: self.condition,
            date_range: DateRange::parse(&self.date_range),
            sort_by: SortBy::parse(&self.sort_by),
            location: self.location,
            radius: self.radius,
        }
    }
}

pub fn notification_patch(email: Option<bool>, push: Option<bool>) -> NotificationPatch {
    NotificationPatch { email, push }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_args_become_filters() {
        let cli = Cli::parse_from([
            "marketplace-finder",
            "search",
            "laptop",
            "--category",
            "Electronics",
            "--price-max",
            "900",
            "--date-range",
            "last_24h",
            "--sort-by",
            "price_desc",
        ]);

        match cli.command {
            Commands::Search { query, filters, limit } => {
                assert_eq!(query.as_deref(), Some("laptop"));
                assert_eq!(limit, None);
                let filters = filters.into_filters();
                assert_eq!(filters.category.as_deref(), Some("Electronics"));
                assert_eq!(filters.price_max, Some(900.0));
                assert_eq!(filters.date_range, DateRange::Last24h);
                assert_eq!(filters.sort_by, SortBy::PriceDesc);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_unknown_sort_falls_back() {
        let filters = FilterArgs {
            sort_by: "cheapest".into(),
            date_range: "last_month".into(),
            ..Default::default()
        }
        .into_filters();
        assert_eq!(filters.sort_by, SortBy::DateDesc);
        assert_eq!(filters.date_range, DateRange::Any);
    }

    #[test]
    fn test_notify_flags() {
        let cli = Cli::parse_from(["marketplace-finder", "saved", "notify", "abc", "--push", "true"]);
        match cli.command {
            Commands::Saved {
                action: SavedAction::Notify { id, email, push },
            } => {
                assert_eq!(id, "abc");
                assert_eq!(notification_patch(email, push), NotificationPatch { email: None, push: Some(true) });
            }
            _ => panic!("expected saved notify command"),
        }
    }
}
