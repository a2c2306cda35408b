//! Meta Conversions API client
//!
//! Forwards registration and purchase completions as server-side
//! conversion events. User identifiers are SHA-256 hashed before they
//! leave the process; event ids reuse the registration id so Meta can
//! deduplicate retried sends.

use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::info;

use crate::errors::{Error, Result};
use crate::models::RegistrationType;

const PIXEL_ID_ENV: &str = "META_PIXEL_ID";
const ACCESS_TOKEN_ENV: &str = "META_ACCESS_TOKEN";
/// Optional: routes events to Meta's test console instead of reporting
const TEST_EVENT_CODE_ENV: &str = "META_TEST_EVENT_CODE";

const API_VERSION: &str = "v21.0";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Unhashed user identifiers attached to an event.
#[derive(Debug, Clone, Default)]
pub struct UserData {
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Passed through unhashed, per the API contract
    pub client_user_agent: Option<String>,
}

pub struct ConversionsClient {
    http: reqwest::Client,
    pixel_id: String,
    access_token: String,
    test_event_code: Option<String>,
}

impl ConversionsClient {
    pub fn from_env() -> Result<Self> {
        let pixel_id = std::env::var(PIXEL_ID_ENV)
            .map_err(|_| Error::Config(format!("{PIXEL_ID_ENV} not set")))?;
        let access_token = std::env::var(ACCESS_TOKEN_ENV)
            .map_err(|_| Error::Config(format!("{ACCESS_TOKEN_ENV} not set")))?;
        let test_event_code = std::env::var(TEST_EVENT_CODE_ENV).ok();

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::Analytics(e.to_string()))?;

        Ok(Self {
            http,
            pixel_id,
            access_token,
            test_event_code,
        })
    }

    /// CompleteRegistration, tagged with the registration type so
    /// downstream reporting can distinguish the flows.
    pub async fn complete_registration(
        &self,
        user: &UserData,
        source_url: Option<&str>,
        registration_id: &str,
        registration_type: RegistrationType,
    ) -> Result<()> {
        let custom_data = json!({
            "registration_type": registration_type.as_str(),
            "content_name": content_name(registration_type),
            "content_category": registration_type.as_str(),
        });
        let event_id = format!("registration_{registration_id}");
        self.send_event("CompleteRegistration", user, Some(custom_data), source_url, &event_id)
            .await
    }

    /// Purchase, carrying the amount in major units and the currency.
    pub async fn purchase(
        &self,
        user: &UserData,
        value: f64,
        currency: &str,
        registration_id: &str,
    ) -> Result<()> {
        let custom_data = json!({
            "currency": currency,
            "value": value,
        });
        let event_id = format!("purchase_{registration_id}");
        self.send_event("Purchase", user, Some(custom_data), None, &event_id)
            .await
    }

    async fn send_event(
        &self,
        event_name: &str,
        user: &UserData,
        custom_data: Option<Value>,
        source_url: Option<&str>,
        event_id: &str,
    ) -> Result<()> {
        let payload = build_payload(
            event_name,
            chrono::Utc::now().timestamp(),
            user,
            custom_data,
            source_url,
            event_id,
            &self.access_token,
            self.test_event_code.as_deref(),
        );

        let url = format!(
            "https://graph.facebook.com/{API_VERSION}/{}/events",
            self.pixel_id
        );

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::Analytics(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Error::Analytics(format!(
                "conversions api returned {}",
                response.status()
            )));
        }

        info!(event = event_name, event_id = %event_id, "conversion event sent");
        Ok(())
    }
}

/// SHA-256 hex digest of the lower-cased identifier, per the
/// Conversions API user-data requirements.
pub fn hash_identifier(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.to_lowercase().as_bytes());
    hex::encode(hasher.finalize())
}

fn content_name(registration_type: RegistrationType) -> &'static str {
    match registration_type {
        RegistrationType::Course => "AI Automation Mastery Course",
        RegistrationType::Livestream => "AI Tax Automation Livestream",
        RegistrationType::Application => "AI Automation Mastery Application",
    }
}

#[allow(clippy::too_many_arguments)]
fn build_payload(
    event_name: &str,
    event_time: i64,
    user: &UserData,
    custom_data: Option<Value>,
    source_url: Option<&str>,
    event_id: &str,
    access_token: &str,
    test_event_code: Option<&str>,
) -> Value {
    let mut user_data = serde_json::Map::new();
    if let Some(email) = &user.email {
        user_data.insert("em".into(), json!([hash_identifier(email)]));
    }
    if let Some(phone) = &user.phone {
        user_data.insert("ph".into(), json!([hash_identifier(phone)]));
    }
    if let Some(agent) = &user.client_user_agent {
        user_data.insert("client_user_agent".into(), json!(agent));
    }

    let mut event = json!({
        "event_name": event_name,
        "event_time": event_time,
        "action_source": "website",
        "user_data": user_data,
        "event_id": event_id,
    });
    if let Some(url) = source_url {
        event["event_source_url"] = json!(url);
    }
    if let Some(custom) = custom_data {
        event["custom_data"] = custom;
    }

    let mut payload = json!({
        "data": [event],
        "access_token": access_token,
    });
    if let Some(code) = test_event_code {
        payload["test_event_code"] = json!(code);
    }

    payload
}
