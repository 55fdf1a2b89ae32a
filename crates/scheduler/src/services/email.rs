//! Email service for delivering the daily analysis report.
//!
//! Supported providers:
//! - `console`: Logs emails to console (development)
//! - `sendgrid`: Uses SendGrid API

use std::sync::Arc;

use domain::services::{Delivery, Notifier, NotifyError};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::EmailConfig;

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email service for sending the analysis report.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl EmailService {
    /// Creates a new EmailService with the given configuration.
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }

    /// Check if email service is enabled.
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Send a plain-text email.
    ///
    /// A disabled service is a deliberate skip, not a send: the caller's
    /// status trail must say why no email arrived.
    pub async fn send_text(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<Delivery, EmailError> {
        if !self.config.enabled {
            debug!(
                to = %to,
                subject = %subject,
                "Email service disabled, skipping send"
            );
            return Ok(Delivery::Skipped("email delivery disabled".to_string()));
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(to, subject, body),
            "sendgrid" => self.send_sendgrid(to, subject, body).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }?;

        Ok(Delivery::Sent)
    }

    /// Console provider - logs email to console (for development).
    fn send_console(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        info!(
            to = %to,
            subject = %subject,
            from = %self.config.sender_email,
            from_name = %self.config.sender_name,
            "Email (console provider)"
        );
        info!(body = %body, "Email body");
        Ok(())
    }

    /// SendGrid provider - sends via SendGrid API.
    async fn send_sendgrid(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let payload = serde_json::json!({
            "personalizations": [{
                "to": [{ "email": to }]
            }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": subject,
            "content": [{
                "type": "text/plain",
                "value": body
            }]
        });

        let response = self
            .client
            .post("https://api.sendgrid.com/v3/mail/send")
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %to, subject = %subject, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(status = %status, error = %error_body, "SendGrid API error");
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, error_body
            )))
        }
    }
}

#[async_trait::async_trait]
impl Notifier for EmailService {
    async fn send(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<Delivery, NotifyError> {
        self.send_text(recipient, subject, body)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EmailConfig {
        EmailConfig {
            enabled: true,
            provider: "console".to_string(),
            sendgrid_api_key: String::new(),
            sender_email: "test@example.com".to_string(),
            sender_name: "Test".to_string(),
            recipient: "operator@example.com".to_string(),
        }
    }

    #[test]
    fn test_email_service_creation() {
        let service = EmailService::new(test_config());
        assert!(service.is_enabled());
    }

    #[tokio::test]
    async fn test_send_console_email() {
        let service = EmailService::new(test_config());
        let result = service
            .send_text("user@example.com", "Test Subject", "Test body")
            .await;
        assert_eq!(result.unwrap(), Delivery::Sent);
    }

    #[tokio::test]
    async fn test_send_disabled_reports_a_skip() {
        let mut config = test_config();
        config.enabled = false;
        let service = EmailService::new(config);

        // Not an error, but not a send either; the reason is surfaced so
        // the run's status record can explain why no email arrived.
        let result = service.send_text("user@example.com", "Test", "Test").await;
        assert!(matches!(
            result,
            Ok(Delivery::Skipped(ref reason)) if reason.contains("disabled")
        ));
    }

    #[tokio::test]
    async fn test_unknown_provider_fails() {
        let mut config = test_config();
        config.provider = "carrier-pigeon".to_string();
        let service = EmailService::new(config);

        let result = service.send_text("user@example.com", "Test", "Test").await;
        assert!(matches!(result, Err(EmailError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_sendgrid_without_key_fails() {
        let mut config = test_config();
        config.provider = "sendgrid".to_string();
        let service = EmailService::new(config);

        let result = service.send_text("user@example.com", "Test", "Test").await;
        assert!(matches!(result, Err(EmailError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_notifier_impl_delegates() {
        let service = EmailService::new(test_config());
        let result = Notifier::send(&service, "user@example.com", "Subject", "Body").await;
        assert_eq!(result.unwrap(), Delivery::Sent);
    }
}
