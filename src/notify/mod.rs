//! Best-effort downstream notifications.
//!
//! Everything here runs after the primary write has committed. Failures are
//! logged by the caller and never change the HTTP outcome. When the relevant
//! credentials are absent the corresponding path is simply disabled.

use async_trait::async_trait;
use md5::{Digest, Md5};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

use crate::config::NotifyConfig;
use crate::store::{ContactSubmission, WaitlistEntry};

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("service responded {status}: {body}")]
    Rejected { status: u16, body: String },
}

impl From<reqwest::Error> for NotifyError {
    fn from(err: reqwest::Error) -> Self {
        NotifyError::Request(err.to_string())
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Email the team about a new contact submission.
    async fn contact_received(&self, submission: &ContactSubmission) -> Result<(), NotifyError>;

    /// Upsert the subscriber into the mailing list and trigger the welcome
    /// automation.
    async fn waitlist_subscribed(&self, entry: &WaitlistEntry) -> Result<(), NotifyError>;
}

/// Notifier that does nothing, for deployments without email or mailing-list
/// credentials and for tests.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn contact_received(&self, _submission: &ContactSubmission) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn waitlist_subscribed(&self, _entry: &WaitlistEntry) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Talks to the transactional email endpoint and the mailing-list API over
/// HTTP. Built from [`NotifyConfig`]; each unconfigured path is skipped.
pub struct HttpNotifier {
    client: reqwest::Client,
    config: NotifyConfig,
    /// Overrides the mailing-list API host, for tests.
    list_base_url: Option<String>,
}

impl HttpNotifier {
    pub fn new(config: NotifyConfig) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            list_base_url: None,
        })
    }

    pub fn with_list_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.list_base_url = Some(base_url.into());
        self
    }

    fn list_url(&self, audience_id: &str, member_hash: &str) -> String {
        match &self.list_base_url {
            Some(base) => format!("{}/3.0/lists/{}/members/{}", base, audience_id, member_hash),
            None => {
                let prefix = self.config.list_server_prefix.as_deref().unwrap_or("us1");
                format!(
                    "https://{}.api.mailchimp.com/3.0/lists/{}/members/{}",
                    prefix, audience_id, member_hash
                )
            }
        }
    }

    async fn upsert_member(
        &self,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        tags: Vec<String>,
    ) -> Result<(), NotifyError> {
        let (api_key, audience_id) = match (
            self.config.list_api_key.as_deref(),
            self.config.list_audience_id.as_deref(),
        ) {
            (Some(key), Some(audience)) => (key, audience),
            _ => {
                warn!("mailing list not configured, skipping upsert");
                return Ok(());
            }
        };

        let url = self.list_url(audience_id, &member_hash(email));
        let body = json!({
            "email_address": email,
            "status_if_new": "pending",
            "status": "subscribed",
            "merge_fields": {
                "FNAME": first_name.unwrap_or(""),
                "LNAME": last_name.unwrap_or(""),
            },
            "tags": tags,
        });

        let response = self
            .client
            .put(&url)
            .basic_auth("anystring", Some(api_key))
            .json(&body)
            .send()
            .await?;

        ensure_success(response).await
    }

    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        plain_text: &str,
        html: &str,
    ) -> Result<(), NotifyError> {
        let endpoint = match self.config.email_endpoint.as_deref() {
            Some(endpoint) => endpoint,
            None => {
                warn!("email endpoint not configured, skipping send");
                return Ok(());
            }
        };

        let body = json!({
            "senderAddress": self.config.sender_address,
            "recipients": { "to": [{ "address": recipient }] },
            "content": {
                "subject": subject,
                "plainText": plain_text,
                "html": html,
            }
        });

        let mut request = self.client.post(endpoint).json(&body);
        if let Some(key) = self.config.email_access_key.as_deref() {
            request = request.bearer_auth(key);
        }

        ensure_success(request.send().await?).await
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<(), NotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(NotifyError::Rejected {
        status: status.as_u16(),
        body,
    })
}

/// Mailing-list member id: MD5 of the lowercased address, per the list API.
fn member_hash(email: &str) -> String {
    let digest = Md5::digest(email.to_lowercase().as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn contact_received(&self, submission: &ContactSubmission) -> Result<(), NotifyError> {
        let subject = format!("New Contact Form: {}", submission.subject);
        let plain_text = format!(
            "Name: {}\nEmail: {}\n\nMessage:\n{}",
            submission.name, submission.email, submission.message
        );
        let html = format!(
            "<h2>New Contact Form Submission</h2>\
             <p><strong>Name:</strong> {}</p>\
             <p><strong>Email:</strong> {}</p>\
             <p><strong>Subject:</strong> {}</p>\
             <p><strong>Message:</strong></p><p>{}</p>",
            submission.name,
            submission.email,
            submission.subject,
            submission.message.replace('\n', "<br>")
        );

        self.send_email(&self.config.contact_recipient, &subject, &plain_text, &html)
            .await
    }

    async fn waitlist_subscribed(&self, entry: &WaitlistEntry) -> Result<(), NotifyError> {
        let source = entry.source.clone().unwrap_or_else(|| "direct".to_string());
        self.upsert_member(
            &entry.email,
            entry.first_name.as_deref(),
            entry.last_name.as_deref(),
            vec![
                "waitlist-2026".to_string(),
                source,
                "welcome-email".to_string(),
            ],
        )
        .await
    }
}
