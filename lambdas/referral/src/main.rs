//! Courseflow Referral Lambda
//!
//! Handles POST /referral: appends an immutable referral-click record
//! with best-effort request metadata. No update or delete path exists.

use aws_config::BehaviorVersion;
use chrono::Utc;
use courseflow_core::http::{error_response, json_response, preflight_response};
use courseflow_core::policy::{validate_referral, MAX_USER_AGENT_LEN};
use courseflow_core::{Error, ReferralEvent, ReferralRequest, ReferralResponse, ReferralStore};
use lambda_http::{run, service_fn, Body, Error as LambdaError, Request, Response};
use tracing::info;
use uuid::Uuid;

async fn handler(store: &ReferralStore, event: Request) -> Result<Response<Body>, LambdaError> {
    if event.method().as_str() == "OPTIONS" {
        return preflight_response();
    }

    let body_str = match std::str::from_utf8(event.body()) {
        Ok(s) => s,
        Err(_) => {
            return error_response(Error::InvalidPayload(
                "request body is not valid UTF-8".to_string(),
            ))
        }
    };
    let request: ReferralRequest = match serde_json::from_str(body_str) {
        Ok(r) => r,
        Err(e) => return error_response(Error::InvalidPayload(e.to_string())),
    };

    let (event_name, referral_code) = match validate_referral(&request) {
        Ok(fields) => fields,
        Err(e) => return error_response(e),
    };

    let referral_event = ReferralEvent {
        event_id: Uuid::new_v4().to_string(),
        event_name,
        referral_code,
        timestamp: Utc::now(),
        user_agent: truncated_header(&event, "user-agent"),
        source_ip: source_ip(&event),
    };

    if let Err(e) = store.record(&referral_event).await {
        return error_response(e);
    }

    info!(
        event_id = %referral_event.event_id,
        referral_code = %referral_event.referral_code,
        "referral event recorded"
    );

    json_response(
        200,
        &ReferralResponse {
            message: "Referral event recorded successfully".to_string(),
            event_id: referral_event.event_id,
        },
    )
}

/// Header value truncated so oversized agents can't bloat the table.
fn truncated_header(event: &Request, name: &str) -> String {
    event
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.chars().take(MAX_USER_AGENT_LEN).collect())
        .unwrap_or_else(|| "unknown".to_string())
}

/// First hop of x-forwarded-for, as set by the API gateway.
fn source_ip(event: &Request) -> String {
    event
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let store = ReferralStore::new(aws_sdk_dynamodb::Client::new(&config));

    run(service_fn(|event: Request| handler(&store, event))).await
}
