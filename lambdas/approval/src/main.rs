//! Courseflow Application Approval Lambda
//!
//! Handles POST /approve: moves an application from applied back to
//! pending so the applicant can complete a paid registration, and sends
//! them an acceptance email with a pre-filled registration link.

use aws_config::BehaviorVersion;
use chrono::Utc;
use courseflow_core::http::{error_response, json_response, preflight_response};
use courseflow_core::notify::best_effort;
use courseflow_core::{
    templates, ApprovalRequest, ApprovalResponse, Error, Mailer, RegistrationRecord,
    RegistrationStatus, RegistrationStore,
};
use lambda_http::{run, service_fn, Body, Error as LambdaError, Request, Response};
use tracing::{info, warn};
use url::form_urlencoded;

const BASE_URL_ENV: &str = "BASE_URL";
const DEFAULT_BASE_URL: &str = "https://courseflow.example.com";

async fn handler(
    store: &RegistrationStore,
    mailer: Option<&Mailer>,
    base_url: &str,
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
    let request: ApprovalRequest = match serde_json::from_str(body_str) {
        Ok(r) => r,
        Err(e) => return error_response(Error::InvalidPayload(e.to_string())),
    };
    let application_id = match request
        .application_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        Some(id) => id.trim().to_string(),
        None => return error_response(Error::MissingRequiredField("application_id".to_string())),
    };

    let application = match approve(store, &application_id).await {
        Ok(application) => application,
        Err(e) => return error_response(e),
    };

    let registration_url = registration_url(base_url, &application);

    if let Some(mailer) = mailer {
        best_effort(
            "acceptance_email",
            mailer.send_to_registrant(
                &application.email,
                &templates::application_acceptance(
                    &application.name,
                    &application_id,
                    &registration_url,
                ),
            ),
        )
        .await;
    }

    info!(application_id = %application_id, email = %application.email, "application approved");

    json_response(
        200,
        &ApprovalResponse {
            message: "Application approved successfully".to_string(),
            application_id,
            registration_url,
        },
    )
}

/// Resolve the application and move it from applied to pending.
async fn approve(
    store: &RegistrationStore,
    application_id: &str,
) -> courseflow_core::Result<RegistrationRecord> {
    let application = store
        .find_by_registration_id(application_id)
        .await?
        .ok_or_else(|| Error::ApplicationNotFound(application_id.to_string()))?;

    if application.payment_status != RegistrationStatus::Applied {
        return Err(Error::InvalidApplicationStatus(
            application.payment_status.as_str().to_string(),
        ));
    }

    store
        .approve(&application.course_id, &application.email, Utc::now())
        .await?;

    Ok(application)
}

/// Registration form link with the applicant's details pre-filled.
fn registration_url(base_url: &str, application: &RegistrationRecord) -> String {
    let mut name_parts = application.name.split_whitespace();
    let first_name = name_parts.next().unwrap_or("").to_string();
    let last_name = name_parts.collect::<Vec<_>>().join(" ");

    let params: Vec<(&str, &str)> = vec![
        ("applicant_id", &application.registration_id),
        ("email", &application.email),
        ("firstName", &first_name),
        ("lastName", &last_name),
        ("phone", &application.phone),
        ("company", &application.company),
        ("jobTitle", &application.job_title),
        ("automationInterest", &application.automation_interest),
    ];

    let query: String = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().filter(|(_, v)| !v.is_empty()))
        .finish();

    format!("{base_url}/register.html?{query}")
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
    let base_url = std::env::var(BASE_URL_ENV).unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    let mailer = match Mailer::from_env(aws_sdk_ses::Client::new(&config)) {
        Ok(mailer) => Some(mailer),
        Err(e) => {
            warn!(error = %e, "mailer disabled");
            None
        }
    };

    run(service_fn(|event: Request| {
        handler(&store, mailer.as_ref(), &base_url, event)
    }))
    .await
}
