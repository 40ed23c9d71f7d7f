use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{domain::DomainError, ports::Notifier};

const PUSHOVER_MESSAGES_URL: &str = "https://api.pushover.net/1/messages.json";

#[derive(Debug, Serialize)]
struct PushoverMessage<'a> {
    token: &'a str,
    user: &'a str,
    title: &'a str,
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct PushoverResponse {
    status: i32,
    #[serde(default)]
    errors: Vec<String>,
}

pub struct PushoverNotifier {
    client: reqwest::Client,
    endpoint: String,
    token: String,
    user: String,
}

impl PushoverNotifier {
    pub fn new(token: String, user: String) -> Result<Self, DomainError> {
        Self::with_endpoint(token, user, PUSHOVER_MESSAGES_URL.to_string())
    }

    pub fn with_endpoint(token: String, user: String, endpoint: String) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()
            .map_err(|e| DomainError::Notification(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            token,
            user,
        })
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<(), DomainError> {
        let form = PushoverMessage {
            token: &self.token,
            user: &self.user,
            title,
            message,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| DomainError::Notification(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .map_err(|e| DomainError::Notification(e.to_string()))?;
            return Err(DomainError::Notification(format!(
                "Pushover API error ({}): {}",
                status, error_text
            )));
        }

        let body: PushoverResponse = response
            .json()
            .await
            .map_err(|e| DomainError::Notification(e.to_string()))?;

        if body.status != 1 {
            return Err(DomainError::Notification(format!(
                "Pushover rejected message: {}",
                body.errors.join(", ")
            )));
        }

        tracing::info!("Pushover notification sent: {}", message);
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "Pushover"
    }
}

/// Fallback used for a channel whose credentials are not configured.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<(), DomainError> {
        tracing::info!("[delivery disabled] {}: {}", title, message);
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "log"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Form, Json, Router};
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    type Received = Arc<Mutex<Vec<HashMap<String, String>>>>;

    async fn spawn_endpoint(status: i32) -> (String, Received) {
        let received: Received = Arc::default();
        let sink = received.clone();
        let app = Router::new().route(
            "/1/messages.json",
            post(move |Form(form): Form<HashMap<String, String>>| {
                let sink = sink.clone();
                async move {
                    sink.lock().unwrap().push(form);
                    Json(serde_json::json!({ "status": status, "errors": ["user key is invalid"] }))
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/1/messages.json", addr), received)
    }

    #[tokio::test]
    async fn test_posts_form_to_endpoint() {
        let (endpoint, received) = spawn_endpoint(1).await;
        let notifier =
            PushoverNotifier::with_endpoint("app-token".into(), "user-key".into(), endpoint).unwrap();

        notifier
            .notify("Marketplace Finder", "New item: Gaming Laptop")
            .await
            .unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0]["token"], "app-token");
        assert_eq!(received[0]["user"], "user-key");
        assert_eq!(received[0]["title"], "Marketplace Finder");
        assert_eq!(received[0]["message"], "New item: Gaming Laptop");
    }

    #[tokio::test]
    async fn test_rejected_message_is_an_error() {
        let (endpoint, _) = spawn_endpoint(0).await;
        let notifier =
            PushoverNotifier::with_endpoint("app-token".into(), "bad-user".into(), endpoint).unwrap();

        let result = notifier.notify("Marketplace Finder", "hello").await;
        assert!(matches!(result, Err(DomainError::Notification(_))));
    }
}
