//! Test fixtures and utilities

use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Generate a unique email for testing
pub fn unique_email() -> String {
    format!("test-{}@example.com", &Uuid::new_v4().to_string()[..8])
}

/// Generate a unique referral code for testing
pub fn unique_referral_code() -> String {
    format!("test-code-{}", &Uuid::new_v4().to_string()[..8])
}

/// Check if API URL is configured (loads .env first)
pub fn api_url_configured() -> bool {
    dotenvy::dotenv().ok();
    std::env::var("COURSEFLOW_API_URL").is_ok()
}

/// Webhook secret shared with the deployed stack, if configured
pub fn webhook_secret() -> Option<String> {
    dotenvy::dotenv().ok();
    std::env::var("STRIPE_WEBHOOK_SECRET").ok()
}

/// Skip test if API URL is not configured
#[macro_export]
macro_rules! skip_if_no_api {
    () => {
        if !$crate::fixtures::api_url_configured() {
            eprintln!("Skipping test: COURSEFLOW_API_URL not set");
            return;
        }
    };
}

/// A checkout.session.completed payload referencing a registration id.
pub fn checkout_payload(registration_id: Option<&str>, email: &str, amount_total: i64) -> String {
    let reference = match registration_id {
        Some(id) => format!(r#""client_reference_id": "{id}","#),
        None => String::new(),
    };
    format!(
        r#"{{
            "id": "evt_{suffix}",
            "type": "checkout.session.completed",
            "data": {{
                "object": {{
                    "id": "cs_test_{suffix}",
                    "amount_total": {amount_total},
                    "currency": "aud",
                    {reference}
                    "customer_details": {{"email": "{email}"}}
                }}
            }}
        }}"#,
        suffix = &Uuid::new_v4().to_string()[..8],
    )
}

/// Stripe-style signature header over the payload.
pub fn sign_webhook(payload: &str, secret: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key size");
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    format!(
        "t={},v1={}",
        timestamp,
        hex::encode(mac.finalize().into_bytes())
    )
}
