//! Courseflow Livestream/Application Lambda
//!
//! Handles POST /livestream: free registrations. The default flow signs
//! a registrant up for the livestream (immediately paid at $0); the
//! `application` variant files a course application awaiting approval.
//! Duplicates are a hard conflict on this path, unlike /register.

use aws_config::BehaviorVersion;
use courseflow_core::conversions::{ConversionsClient, UserData};
use courseflow_core::http::{error_response, json_response, preflight_response};
use courseflow_core::notify::best_effort;
use courseflow_core::{
    normalize_email, policy, templates, Error, FreeRegisterRequest, Mailer, RegisterResponse,
    RegistrationRecord, RegistrationStatus, RegistrationStore, RegistrationType,
    DEFAULT_COURSE_ID, LIVESTREAM_COURSE_ID,
};
use lambda_http::{run, service_fn, Body, Error as LambdaError, Request, Response};
use tracing::{info, warn};

async fn handler(
    store: &RegistrationStore,
    mailer: Option<&Mailer>,
    conversions: Option<&ConversionsClient>,
    event: Request,
) -> Result<Response<Body>, LambdaError> {
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
    let request: FreeRegisterRequest = match serde_json::from_str(body_str) {
        Ok(r) => r,
        Err(e) => return error_response(Error::InvalidPayload(e.to_string())),
    };

    let record = match register_free(store, &request).await {
        Ok(record) => record,
        Err(e) => return error_response(e),
    };

    notify(mailer, conversions, &event, &record).await;

    info!(
        registration_id = %record.registration_id,
        email = %record.email,
        registration_type = record.registration_type.as_str(),
        "free registration created"
    );

    json_response(
        200,
        &RegisterResponse {
            message: "Registration successful".to_string(),
            registration_id: record.registration_id,
        },
    )
}

/// Validate the submission and write the record for the requested flow.
async fn register_free(
    store: &RegistrationStore,
    request: &FreeRegisterRequest,
) -> courseflow_core::Result<RegistrationRecord> {
    let name = request.name.trim();
    let email = normalize_email(&request.email);

    if name.is_empty() {
        return Err(Error::MissingRequiredField("name".to_string()));
    }
    if email.is_empty() {
        return Err(Error::MissingRequiredField("email".to_string()));
    }

    let (course_id, status) = match request.registration_type {
        RegistrationType::Livestream => (LIVESTREAM_COURSE_ID, RegistrationStatus::Paid),
        RegistrationType::Application => (DEFAULT_COURSE_ID, RegistrationStatus::Applied),
        RegistrationType::Course => {
            return Err(Error::Validation(
                "registration_type must be livestream or application".to_string(),
            ))
        }
    };

    let existing = store.get(course_id, &email).await?;
    policy::check_free_duplicate(existing.as_ref())?;

    let mut record =
        RegistrationRecord::new(course_id, email, name, request.registration_type, status);
    record.phone = request.phone.clone();
    record.company = request.company.clone();
    record.automation_interest = request.automation_interest.clone();
    record.payment_amount = Some(0.0);

    store.put(&record).await?;
    Ok(record)
}

/// Confirmation email, operator notice, and analytics event. All
/// best-effort: the registration already succeeded.
async fn notify(
    mailer: Option<&Mailer>,
    conversions: Option<&ConversionsClient>,
    event: &Request,
    record: &RegistrationRecord,
) {
    if let Some(mailer) = mailer {
        let confirmation = match record.registration_type {
            RegistrationType::Application => {
                templates::application_received(&record.name, &record.registration_id)
            }
            _ => templates::livestream_confirmation(&record.name, &record.registration_id),
        };
        best_effort(
            "confirmation_email",
            mailer.send_to_registrant(&record.email, &confirmation),
        )
        .await;
        best_effort(
            "admin_notification_email",
            mailer.send_to_admin(&templates::registration_notice(record)),
        )
        .await;
    }

    if let Some(client) = conversions {
        let user = UserData {
            email: Some(record.email.clone()),
            phone: None,
            client_user_agent: header(event, "user-agent"),
        };
        let source_url = header(event, "referer");
        best_effort(
            "meta_complete_registration",
            client.complete_registration(
                &user,
                source_url.as_deref(),
                &record.registration_id,
                record.registration_type,
            ),
        )
        .await;
    }
}

fn header(event: &Request, name: &str) -> Option<String> {
    event
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
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
        handler(&store, mailer.as_ref(), conversions.as_ref(), event)
    }))
    .await
}
