//! Stripe webhook verification and payload types
//!
//! The `stripe-signature` header carries `t=<unix ts>,v1=<hex hmac>`
//! where the HMAC-SHA256 is computed over `"{t}.{payload}"` with the
//! endpoint's shared secret. Verification happens before any field of
//! the payload is trusted.

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::errors::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Webhook secret (from environment)
const WEBHOOK_SECRET_ENV: &str = "STRIPE_WEBHOOK_SECRET";

/// Maximum accepted age of a signed notification, in seconds.
/// Bounds replay of captured payloads.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// The only event type that mutates registration state.
pub const CHECKOUT_COMPLETED: &str = "checkout.session.completed";

/// Signed event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: CheckoutSession,
}

/// The slice of a checkout session this system consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Minor currency units (e.g. cents)
    #[serde(default)]
    pub amount_total: i64,
    #[serde(default)]
    pub currency: Option<String>,
    /// The registration_id our endpoints hand to checkout
    #[serde(default)]
    pub client_reference_id: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Verifier bound to one endpoint secret.
pub struct Webhook {
    secret: String,
}

impl Webhook {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn from_env() -> Result<Self> {
        let secret = std::env::var(WEBHOOK_SECRET_ENV)
            .map_err(|_| Error::Config(format!("{WEBHOOK_SECRET_ENV} not set")))?;
        Ok(Self::new(secret))
    }

    /// Verify the signature header, then parse the event payload.
    pub fn construct_event(&self, payload: &str, sig_header: &str) -> Result<WebhookEvent> {
        self.verify(payload, sig_header, Utc::now().timestamp())?;
        serde_json::from_str(payload).map_err(|e| Error::InvalidPayload(e.to_string()))
    }

    fn verify(&self, payload: &str, sig_header: &str, now: i64) -> Result<()> {
        let mut timestamp: Option<&str> = None;
        let mut v1_signature: Option<&str> = None;

        for part in sig_header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = Some(value),
                Some(("v1", value)) => v1_signature = Some(value),
                _ => {}
            }
        }

        let timestamp = timestamp
            .ok_or_else(|| Error::InvalidSignature("missing timestamp".to_string()))?
            .parse::<i64>()
            .map_err(|_| Error::InvalidSignature("malformed timestamp".to_string()))?;
        let v1_signature = v1_signature
            .ok_or_else(|| Error::InvalidSignature("missing v1 signature".to_string()))?;

        if (now - timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
            return Err(Error::InvalidSignature(
                "timestamp outside tolerance".to_string(),
            ));
        }

        let expected = hex::decode(v1_signature)
            .map_err(|_| Error::InvalidSignature("malformed v1 signature".to_string()))?;

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| Error::Internal(e.to_string()))?;
        mac.update(format!("{timestamp}.{payload}").as_bytes());
        mac.verify_slice(&expected)
            .map_err(|_| Error::InvalidSignature("signature mismatch".to_string()))
    }
}
