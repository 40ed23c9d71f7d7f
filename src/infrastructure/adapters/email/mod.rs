use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{domain::DomainError, ports::Notifier};

/// Sends notifications as plain-text mail through an SMTP relay.
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// STARTTLS relay authenticated as `user`, which is also the sender.
    pub fn new(
        host: &str,
        port: u16,
        user: String,
        password: String,
        to: &str,
    ) -> Result<Self, DomainError> {
        let from = parse_mailbox(&user)?;
        let to = parse_mailbox(to)?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| DomainError::Notification(e.to_string()))?
            .port(port)
            .credentials(Credentials::new(user, password))
            .build();

        Ok(Self { transport, from, to })
    }

    #[cfg(test)]
    fn unencrypted(host: &str, port: u16, from: &str, to: &str) -> Result<Self, DomainError> {
        Ok(Self {
            transport: AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
                .port(port)
                .build(),
            from: parse_mailbox(from)?,
            to: parse_mailbox(to)?,
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, DomainError> {
    address
        .parse()
        .map_err(|e| DomainError::Notification(format!("invalid address {}: {}", address, e)))
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<(), DomainError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(title)
            .header(ContentType::TEXT_PLAIN)
            .body(message.to_string())
            .map_err(|e| DomainError::Notification(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| DomainError::Notification(format!("SMTP error: {}", e)))?;

        tracing::info!("Email notification sent to {}: {}", self.to, message);
        Ok(())
    }

    fn notifier_name(&self) -> &'static str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

    /// Minimal SMTP endpoint that accepts one session and keeps each DATA payload.
    async fn spawn_smtp() -> (u16, Arc<Mutex<Vec<String>>>) {
        let received: Arc<Mutex<Vec<String>>> = Arc::default();
        let sink = received.clone();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (read, mut write) = stream.into_split();
            let mut lines = BufReader::new(read);
            write.write_all(b"220 localhost ESMTP\r\n").await.unwrap();

            let mut line = String::new();
            loop {
                line.clear();
                if lines.read_line(&mut line).await.unwrap_or(0) == 0 {
                    break;
                }
                let command = line.to_ascii_uppercase();
                if command.starts_with("DATA") {
                    write.write_all(b"354 end with .\r\n").await.unwrap();
                    let mut data = String::new();
                    loop {
                        line.clear();
                        if lines.read_line(&mut line).await.unwrap_or(0) == 0 || line == ".\r\n" {
                            break;
                        }
                        data.push_str(&line);
                    }
                    sink.lock().unwrap().push(data);
                    write.write_all(b"250 queued\r\n").await.unwrap();
                } else if command.starts_with("QUIT") {
                    write.write_all(b"221 bye\r\n").await.unwrap();
                    break;
                } else {
                    write.write_all(b"250 localhost\r\n").await.unwrap();
                }
            }
        });

        (port, received)
    }

    #[tokio::test]
    async fn test_sends_plain_text_mail() {
        let (port, received) = spawn_smtp().await;
        let notifier =
            EmailNotifier::unencrypted("127.0.0.1", port, "alerts@example.com", "me@example.com")
                .unwrap();

        notifier
            .notify("Marketplace Finder", "New item: Gaming Laptop")
            .await
            .unwrap();

        let received = received.lock().unwrap();
        assert_eq!(received.len(), 1);
        assert!(received[0].contains("Subject: Marketplace Finder"));
        assert!(received[0].contains("To: me@example.com"));
        assert!(received[0].contains("New item: Gaming Laptop"));
    }

    #[tokio::test]
    async fn test_invalid_address_is_rejected() {
        let result = EmailNotifier::new(
            "smtp.example.com",
            587,
            "not-an-address".into(),
            "secret".into(),
            "me@example.com",
        );
        assert!(matches!(result, Err(DomainError::Notification(_))));

        assert!(EmailNotifier::new(
            "smtp.example.com",
            587,
            "alerts@example.com".into(),
            "secret".into(),
            "me@example.com",
        )
        .is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_an_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let notifier =
            EmailNotifier::unencrypted("127.0.0.1", port, "alerts@example.com", "me@example.com")
                .unwrap();
        let result = notifier.notify("Marketplace Finder", "hello").await;
        assert!(matches!(result, Err(DomainError::Notification(_))));
    }
}
