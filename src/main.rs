mod domain;
mod ports;
mod application;
mod infrastructure;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    application::{SavedSearchService, Scanner, SearchService},
    domain::{QuerySpec, SearchResult},
    infrastructure::{
        adapters::{
            email::EmailNotifier,
            json_catalog::JsonFileCatalog,
            pushover::{LogNotifier, PushoverNotifier},
            saved_store::{InMemorySavedSearchRepository, JsonFileSavedSearchRepository},
        },
        cli::{notification_patch, Cli, Commands, SavedAction},
        config::Config,
        http::{self, AppState},
    },
    ports::{Notifier, SavedSearchRepository, SystemClock},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose {
        "marketplace_finder=debug,info"
    } else {
        "marketplace_finder=info,warn,error"
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    let catalog = JsonFileCatalog::new(config.catalog_path.clone());
    tracing::info!("Using listing catalog at {}", catalog.path().display());
    let search = Arc::new(SearchService::new(Arc::new(catalog), Arc::new(SystemClock)));

    let repository: Arc<dyn SavedSearchRepository> = match &config.saved_searches_path {
        Some(path) => Arc::new(JsonFileSavedSearchRepository::open(path).await?),
        None => {
            tracing::warn!("SAVED_SEARCHES_PATH not set, saved searches are kept in memory");
            Arc::new(InMemorySavedSearchRepository::new())
        }
    };
    let saved = Arc::new(SavedSearchService::new(repository, search.clone()));

    match cli.command {
        Commands::Serve { bind, no_scan } => {
            if !no_scan {
                let scanner = Arc::new(Scanner::new(
                    saved.clone(),
                    push_notifier(&config),
                    email_notifier(&config),
                ));
                tokio::spawn(scanner.run(config.scan_interval));
                tracing::info!(
                    "Saved search scanner running every {}s",
                    config.scan_interval.as_secs()
                );
            }

            let addr = bind.unwrap_or_else(|| config.bind_addr.clone());
            let app = http::router(Arc::new(AppState {
                search: search.clone(),
                saved,
            }));

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            tracing::info!("Marketplace Finder API listening on http://{}", addr);
            tracing::info!("Search backed by {} catalog", search.catalog_name());

            axum::serve(listener, app).await.context("HTTP server failed")?;
        }

        Commands::Search { query, filters, limit } => {
            let spec = QuerySpec::new(query, filters.into_filters());
            let result = search.search(&spec).await;
            if let Some(error) = &result.error {
                eprintln!("Error searching catalog: {}", error);
                std::process::exit(1);
            }
            print_results(&result, limit);
        }

        Commands::Saved { action } => match action {
            SavedAction::List => {
                let searches = saved.list().await?;
                if searches.is_empty() {
                    println!("No saved searches yet.");
                }
                for entry in searches {
                    let title = if entry.query.is_empty() {
                        "(no query)"
                    } else {
                        entry.query.as_str()
                    };
                    println!("\n--- {} ---", title);
                    println!("ID: {}", entry.id);
                    println!("Created: {}", entry.created_at);
                    println!(
                        "Filters: {} • {} • {}",
                        entry.filters.category.as_deref().unwrap_or("Any"),
                        entry.filters.location.as_deref().unwrap_or("—"),
                        entry.filters.date_range.as_str()
                    );
                    println!(
                        "Notifications: email={} push={}",
                        entry.notifications.email, entry.notifications.push
                    );
                }
            }

            SavedAction::Create { query, filters } => {
                let created = saved
                    .create(query.unwrap_or_default(), filters.into_filters())
                    .await?;
                println!("Saved search {}", created.id);
            }

            SavedAction::Delete { id } => {
                saved.delete(&id).await?;
                println!("Deleted saved search {}", id);
            }

            SavedAction::Notify { id, email, push } => {
                let notifications = saved
                    .patch_notifications(&id, &notification_patch(email, push))
                    .await?;
                println!(
                    "Notifications for {}: email={} push={}",
                    id, notifications.email, notifications.push
                );
            }

            SavedAction::Run { id } => {
                let result = saved.replay(&id).await?;
                print_results(&result, None);
            }
        },

        Commands::Scan => {
            let scanner = Scanner::new(saved, push_notifier(&config), email_notifier(&config));
            let sent = scanner.scan_once().await?;
            println!("Sent {} notifications", sent);
        }
    }

    Ok(())
}

fn push_notifier(config: &Config) -> Arc<dyn Notifier> {
    if let Some(creds) = &config.pushover {
        match PushoverNotifier::new(creds.token.clone(), creds.user.clone()) {
            Ok(notifier) => {
                tracing::info!("Pushover notifications configured");
                return Arc::new(notifier);
            }
            Err(e) => tracing::warn!("Failed to configure Pushover: {}", e),
        }
    }
    Arc::new(LogNotifier)
}

fn email_notifier(config: &Config) -> Arc<dyn Notifier> {
    if let Some(smtp) = &config.smtp {
        match EmailNotifier::new(
            &smtp.host,
            smtp.port,
            smtp.user.clone(),
            smtp.password.clone(),
            &smtp.to,
        ) {
            Ok(notifier) => {
                tracing::info!("Email notifications configured via {}", smtp.host);
                return Arc::new(notifier);
            }
            Err(e) => tracing::warn!("Failed to configure email: {}", e),
        }
    }
    Arc::new(LogNotifier)
}

fn print_results(result: &SearchResult, limit: Option<usize>) {
    let display_limit = limit.unwrap_or(result.total);
    println!(
        "Found {} listings (showing first {}):",
        result.total,
        display_limit.min(result.total)
    );

    for item in result.listings.iter().take(display_limit) {
        let listing = &item.listing;
        println!("\n--- {} ---", listing.title);
        println!("ID: {}", listing.id);
        println!("Price: {:.2}", listing.price);
        println!("Category: {}", listing.category);
        if let Some(condition) = &listing.condition {
            println!("Condition: {}", condition);
        }
        println!("City: {}", listing.city);
        println!("Published: {}", item.relative_time);
        println!("URL: {}", listing.url);
    }
}
