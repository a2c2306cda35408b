//! Courseflow Registration Lambda
//!
//! Handles POST /register: validates a course registration submission,
//! creates or overwrites the pending record, and forwards a best-effort
//! analytics event.

use aws_config::BehaviorVersion;
use courseflow_core::conversions::{ConversionsClient, UserData};
use courseflow_core::http::{error_response, json_response, preflight_response};
use courseflow_core::notify::best_effort;
use courseflow_core::{
    normalize_email, policy, Error, RegisterRequest, RegisterResponse, RegistrationRecord,
    RegistrationStatus, RegistrationStore, RegistrationType, VALID_COURSE_IDS,
};
use lambda_http::{run, service_fn, Body, Error as LambdaError, Request, Response};
use tracing::{info, warn};

async fn handler(
    store: &RegistrationStore,
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
    let request: RegisterRequest = match serde_json::from_str(body_str) {
        Ok(r) => r,
        Err(e) => return error_response(Error::InvalidPayload(e.to_string())),
    };

    let record = match register(store, &request).await {
        Ok(record) => record,
        Err(e) => return error_response(e),
    };

    // Analytics ride along after the write; a failure here must not
    // fail the registration.
    if let Some(client) = conversions {
        let user = UserData {
            email: Some(record.email.clone()),
            phone: (!record.phone.is_empty()).then(|| record.phone.clone()),
            client_user_agent: header(&event, "user-agent"),
        };
        let source_url = header(&event, "referer");
        best_effort(
            "meta_complete_registration",
            client.complete_registration(
                &user,
                source_url.as_deref(),
                &record.registration_id,
                RegistrationType::Course,
            ),
        )
        .await;
    }

    info!(
        registration_id = %record.registration_id,
        email = %record.email,
        course_id = %record.course_id,
        "registration created"
    );

    json_response(
        200,
        &RegisterResponse {
            message: "Registration successful".to_string(),
            registration_id: record.registration_id,
        },
    )
}

/// Validate the submission and write the pending record.
async fn register(
    store: &RegistrationStore,
    request: &RegisterRequest,
) -> courseflow_core::Result<RegistrationRecord> {
    let email = normalize_email(&request.email);

    if email.is_empty() {
        return Err(Error::MissingRequiredField("email".to_string()));
    }
    if request.name.trim().is_empty() {
        return Err(Error::MissingRequiredField("name".to_string()));
    }
    if request.dietary_requirements.trim().is_empty() {
        return Err(Error::MissingRequiredField("dietary_requirements".to_string()));
    }
    if !VALID_COURSE_IDS.contains(&request.course_id.as_str()) {
        return Err(Error::InvalidCourseId(request.course_id.clone()));
    }

    // Auto-fill path: the submission references an approved application
    if let Some(applicant_id) = request.applicant_id.as_deref().filter(|s| !s.is_empty()) {
        let application = store.find_by_registration_id(applicant_id).await?;
        policy::verify_application(application.as_ref(), applicant_id, &email)?;
        info!(applicant_id = %applicant_id, "application verified for auto-fill registration");
    }

    let existing = store.get(&request.course_id, &email).await?;
    policy::check_course_duplicate(existing.as_ref())?;
    if existing.is_some() {
        info!(email = %email, course_id = %request.course_id, "overwriting non-paid registration");
    }

    let mut record = RegistrationRecord::new(
        request.course_id.clone(),
        email,
        request.name.trim(),
        RegistrationType::Course,
        RegistrationStatus::Pending,
    );
    record.phone = request.phone.clone();
    record.company = request.company.clone();
    record.job_title = request.job_title.clone();
    record.referral_source = request.referral_source.clone();
    record.automation_interest = request.automation_interest.clone();
    record.dietary_requirements = request.dietary_requirements.clone();

    store.put(&record).await?;
    Ok(record)
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
    let conversions = match ConversionsClient::from_env() {
        Ok(client) => Some(client),
        Err(e) => {
            warn!(error = %e, "conversions client disabled");
            None
        }
    };

    run(service_fn(|event: Request| {
        handler(&store, conversions.as_ref(), event)
    }))
    .await
}
