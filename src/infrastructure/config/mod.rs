use std::{env, path::PathBuf, time::Duration};

const DEFAULT_PORT: u16 = 8001;
const DEFAULT_CATALOG_PATH: &str = "data/catalog.json";
const DEFAULT_SCAN_INTERVAL_MINUTES: u64 = 10;
const DEFAULT_SMTP_PORT: u16 = 587;

/// Runtime settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub catalog_path: PathBuf,
    pub saved_searches_path: Option<PathBuf>,
    pub pushover: Option<PushoverCredentials>,
    pub smtp: Option<SmtpSettings>,
    pub scan_interval: Duration,
}

#[derive(Debug, Clone)]
pub struct PushoverCredentials {
    pub token: String,
    pub user: String,
}

/// SMTP relay used for e-mail notifications (STARTTLS).
#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Recipient; defaults to `user`.
    pub to: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = non_empty("BIND_ADDR").unwrap_or_else(|| {
            let port = non_empty("PORT")
                .and_then(|p| p.parse::<u16>().ok())
                .unwrap_or(DEFAULT_PORT);
            format!("0.0.0.0:{}", port)
        });

        let pushover = match (non_empty("PUSHOVER_TOKEN"), non_empty("PUSHOVER_USER")) {
            (Some(token), Some(user)) => Some(PushoverCredentials { token, user }),
            _ => None,
        };

        let smtp = match (non_empty("SMTP_HOST"), non_empty("SMTP_USER"), non_empty("SMTP_PASS")) {
            (Some(host), Some(user), Some(password)) => Some(SmtpSettings {
                host,
                port: non_empty("SMTP_PORT")
                    .and_then(|p| p.parse::<u16>().ok())
                    .unwrap_or(DEFAULT_SMTP_PORT),
                to: non_empty("SMTP_TO").unwrap_or_else(|| user.clone()),
                user,
                password,
            }),
            _ => None,
        };

        let scan_secs = non_empty("SCAN_INTERVAL_MINUTES")
            .and_then(|m| m.parse::<u64>().ok())
            .filter(|m| *m > 0)
            .and_then(|m| m.checked_mul(60))
            .unwrap_or(DEFAULT_SCAN_INTERVAL_MINUTES * 60);

        Self {
            bind_addr,
            catalog_path: non_empty("CATALOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG_PATH)),
            saved_searches_path: non_empty("SAVED_SEARCHES_PATH").map(PathBuf::from),
            pushover,
            smtp,
            scan_interval: Duration::from_secs(scan_secs),
        }
    }
}
