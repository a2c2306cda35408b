//! Courseflow Payment Webhook Lambda
//!
//! Handles POST /webhook: Stripe checkout notifications. Verifies the
//! signature, resolves the notification back to a registration record,
//! and performs the single pending -> paid transition.
//!
//! Resolution order:
//! 1. `client_reference_id` (the registration_id handed to checkout),
//!    via the registration_id secondary index. Authoritative.
//! 2. Billing email against pending records in the default course, via
//!    a legacy table scan. Kept for older client integrations only.

use aws_config::BehaviorVersion;
use chrono::Utc;
use courseflow_core::conversions::{ConversionsClient, UserData};
use courseflow_core::http::{error_response, json_response, preflight_response};
use courseflow_core::notify::best_effort;
use courseflow_core::stripe::{CheckoutSession, Webhook, CHECKOUT_COMPLETED};
use courseflow_core::{
    normalize_email, policy, templates, Error, Mailer, PaymentUpdate, RegistrationRecord,
    RegistrationStatus, RegistrationStore, WebhookResponse,
};
use lambda_http::{run, service_fn, Body, Error as LambdaError, Request, Response};
use tracing::{info, warn};

async fn handler(
    store: &RegistrationStore,
    mailer: Option<&Mailer>,
    conversions: Option<&ConversionsClient>,
    webhook: &Webhook,
    event: Request,
) -> Result<Response<Body>, LambdaError> {
    if event.method().as_str() == "OPTIONS" {
        return preflight_response();
    }

    let payload = match std::str::from_utf8(event.body()) {
        Ok(s) => s,
        Err(_) => {
            return error_response(Error::InvalidPayload(
                "request body is not valid UTF-8".to_string(),
            ))
        }
    };
    let signature = match event
        .headers()
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    {
        Some(s) => s,
        None => {
            return error_response(Error::InvalidSignature(
                "missing stripe-signature header".to_string(),
            ))
        }
    };

    // Nothing in the payload is trusted until the signature checks out.
    let stripe_event = match webhook.construct_event(payload, signature) {
        Ok(ev) => ev,
        Err(e) => return error_response(e),
    };

    if stripe_event.event_type != CHECKOUT_COMPLETED {
        info!(event_type = %stripe_event.event_type, "ignoring webhook event");
        return json_response(200, &WebhookResponse { received: true });
    }

    let session = stripe_event.data.object;
    let record = match reconcile(store, &session).await {
        Ok(record) => record,
        Err(e) => return error_response(e),
    };

    let amount = record.payment_amount.unwrap_or_default();
    let currency = session
        .currency
        .as_deref()
        .unwrap_or("usd")
        .to_uppercase();

    if let Some(mailer) = mailer {
        best_effort(
            "payment_receipt_email",
            mailer.send_to_registrant(
                &record.email,
                &templates::payment_receipt(&record.name, &record.registration_id, amount),
            ),
        )
        .await;
        best_effort(
            "payment_admin_email",
            mailer.send_to_admin(&templates::payment_notice(&record, amount, &session.id)),
        )
        .await;
    }
    if let Some(client) = conversions {
        let user = UserData {
            email: Some(record.email.clone()),
            ..Default::default()
        };
        best_effort(
            "meta_purchase",
            client.purchase(&user, amount, &currency, &record.registration_id),
        )
        .await;
    }

    info!(
        registration_id = %record.registration_id,
        amount = amount,
        "payment reconciled"
    );

    json_response(200, &WebhookResponse { received: true })
}

/// Match the notification to a registration and transition it to paid.
async fn reconcile(
    store: &RegistrationStore,
    session: &CheckoutSession,
) -> courseflow_core::Result<RegistrationRecord> {
    let record = match session
        .client_reference_id
        .as_deref()
        .filter(|s| !s.is_empty())
    {
        Some(registration_id) => store
            .find_by_registration_id(registration_id)
            .await?
            .ok_or_else(|| Error::RegistrationNotFound(registration_id.to_string()))?,
        None => {
            let email = session
                .customer_details
                .as_ref()
                .and_then(|details| details.email.as_deref())
                .map(normalize_email)
                .ok_or_else(|| {
                    Error::InvalidPayload("checkout session has no customer email".to_string())
                })?;
            warn!(email = %email, "notification carries no reference id, using email fallback");
            store
                .find_pending_fallback(&email)
                .await?
                .ok_or(Error::RegistrationNotFound(email))?
        }
    };

    if record.payment_status == RegistrationStatus::Paid {
        // Stripe retries on non-200; re-applying the same update is safe
        info!(registration_id = %record.registration_id, "record already paid, re-applying");
    }

    let payment = PaymentUpdate {
        amount: policy::amount_from_minor_units(session.amount_total),
        session_id: session.id.clone(),
        paid_at: Utc::now(),
    };
    store
        .mark_paid(&record.course_id, &record.email, &payment)
        .await?;

    Ok(RegistrationRecord {
        payment_status: RegistrationStatus::Paid,
        payment_amount: Some(payment.amount),
        payment_date: Some(payment.paid_at),
        stripe_session_id: payment.session_id,
        ..record
    })
}

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .init();

    let config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let store = RegistrationStore::new(aws_sdk_dynamodb::Client::new(&config));
    let webhook = Webhook::from_env()?;
    let mailer = match Mailer::from_env(aws_sdk_ses::Client::new(&config)) {
        Ok(mailer) => Some(mailer),
        Err(e) => {
            warn!(error = %e, "mailer disabled");
            None
        }
    };
    let conversions = match ConversionsClient::from_env() {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "conversions client disabled");
            None
        }
    };

    run(service_fn(|event: Request| {
        handler(&store, mailer.as_ref(), conversions.as_ref(), &webhook, event)
    }))
    .await
}
