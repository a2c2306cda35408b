//! SES mailer
//!
//! Thin wrapper over `aws-sdk-ses` used by the best-effort notification
//! paths. Sender and operator addresses come from the environment.

use aws_sdk_ses::types::{Body, Content, Destination, Message};
use aws_sdk_ses::Client;
use tracing::info;

use crate::errors::{Error, Result};
use crate::templates::EmailContent;

/// Sender address (from environment)
const FROM_EMAIL_ENV: &str = "CONTACT_FORM_EMAIL";
/// Operator notification address (from environment)
const ADMIN_EMAIL_ENV: &str = "ADMIN_EMAIL";

pub struct Mailer {
    client: Client,
    from_address: String,
    admin_address: String,
}

impl Mailer {
    pub fn new(client: Client, from_address: String, admin_address: String) -> Self {
        Self {
            client,
            from_address,
            admin_address,
        }
    }

    pub fn from_env(client: Client) -> Result<Self> {
        let from_address = std::env::var(FROM_EMAIL_ENV)
            .map_err(|_| Error::Config(format!("{FROM_EMAIL_ENV} not set")))?;
        let admin_address = std::env::var(ADMIN_EMAIL_ENV)
            .map_err(|_| Error::Config(format!("{ADMIN_EMAIL_ENV} not set")))?;
        Ok(Self::new(client, from_address, admin_address))
    }

    /// Send to a registrant.
    pub async fn send_to_registrant(&self, to: &str, content: &EmailContent) -> Result<()> {
        self.send(to, content).await
    }

    /// Send to the operator address.
    pub async fn send_to_admin(&self, content: &EmailContent) -> Result<()> {
        let to = self.admin_address.clone();
        self.send(&to, content).await
    }

    async fn send(&self, to: &str, content: &EmailContent) -> Result<()> {
        let mut body = Body::builder().text(utf8_content(&content.text)?);
        if let Some(html) = &content.html {
            body = body.html(utf8_content(html)?);
        }

        let message = Message::builder()
            .subject(utf8_content(&content.subject)?)
            .body(body.build())
            .build();

        self.client
            .send_email()
            .source(&self.from_address)
            .destination(Destination::builder().to_addresses(to).build())
            .message(message)
            .send()
            .await
            .map_err(|e| Error::Email(e.to_string()))?;

        info!(to = %to, subject = %content.subject, "email dispatched");
        Ok(())
    }
}

fn utf8_content(data: &str) -> Result<Content> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| Error::Email(e.to_string()))
}
