//! Delivery of verification codes.
//!
//! Dispatch is fire-and-forget from the caller's point of view: the
//! orchestrator spawns the send and only logs the outcome.

use crate::error::NotifyError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_sms(&self, phone_number: &str, body: &str) -> Result<(), NotifyError>;

    async fn send_mail(&self, email: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_sms(&self, phone_number: &str, body: &str) -> Result<(), NotifyError> {
        info!(to = %phone_number, len = body.len(), "sms delivery stub");
        Ok(())
    }

    async fn send_mail(&self, email: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!(to = %email, subject = %subject, len = body.len(), "mail delivery stub");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SmscRequest<'a> {
    login: &'a str,
    psw: &'a str,
    phones: &'a str,
    mes: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    subj: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sender: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mail: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct SmscResponse {
    #[serde(default)]
    error: Option<String>,
}

/// Client for the SMSC REST gateway, which delivers both SMS and email.
#[derive(Debug, Clone)]
pub struct SmscNotifier {
    client: reqwest::Client,
    endpoint: String,
    login: String,
    password: String,
    mail_from: Option<String>,
}

impl SmscNotifier {
    pub fn new(host: &str, login: &str, password: &str, mail_from: Option<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/rest/send/", host.trim_end_matches('/')),
            login: login.to_string(),
            password: password.to_string(),
            mail_from,
        })
    }

    async fn post(&self, request: &SmscRequest<'_>) -> Result<(), NotifyError> {
        debug!("Posting message to SMSC gateway {}", self.endpoint);
        let res = self.client.post(&self.endpoint).json(request).send().await?;

        let status = res.status();
        if !status.is_success() {
            error!("SMSC gateway answered with status {}", status);
            return Err(NotifyError::Gateway(format!("http status {}", status)));
        }

        let body: SmscResponse = res.json().await?;
        match body.error {
            Some(err) if !err.is_empty() => {
                error!("SMSC gateway rejected message: {}", err);
                Err(NotifyError::Gateway(err))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Notifier for SmscNotifier {
    async fn send_sms(&self, phone_number: &str, body: &str) -> Result<(), NotifyError> {
        self.post(&SmscRequest {
            login: &self.login,
            psw: &self.password,
            phones: phone_number,
            mes: body,
            subj: None,
            sender: None,
            mail: None,
        })
        .await
    }

    async fn send_mail(&self, email: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        self.post(&SmscRequest {
            login: &self.login,
            psw: &self.password,
            phones: email,
            mes: body,
            subj: Some(subject),
            sender: self.mail_from.as_deref(),
            mail: Some(1),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_normalised() {
        let with_slash = SmscNotifier::new("https://smsc.kz/", "u", "p", None).unwrap();
        let without = SmscNotifier::new("https://smsc.kz", "u", "p", None).unwrap();
        assert_eq!(with_slash.endpoint, "https://smsc.kz/rest/send/");
        assert_eq!(without.endpoint, with_slash.endpoint);
    }

    #[test]
    fn test_sms_request_omits_mail_fields() {
        let request = SmscRequest {
            login: "u",
            psw: "p",
            phones: "77011234567",
            mes: "Your verify code is: 123456",
            subj: None,
            sender: None,
            mail: None,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["phones"], "77011234567");
        assert!(json.get("mail").is_none());
        assert!(json.get("subj").is_none());
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let notifier = LogNotifier;
        notifier.send_sms("77011234567", "code").await.unwrap();
        notifier.send_mail("a@example.com", "subject", "code").await.unwrap();
    }
}
