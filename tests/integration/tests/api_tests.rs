//! Integration tests for the Courseflow API
//!
//! Run with:
//!   COURSEFLOW_API_URL=https://your-api.execute-api.us-west-2.amazonaws.com \
//!   STRIPE_WEBHOOK_SECRET=whsec_... cargo test
//!
//! These tests require a deployed Courseflow instance. Webhook tests
//! additionally need the stack's shared webhook secret to sign
//! synthetic notifications.

use courseflow_integration_tests::{
    client::{
        ApprovalRequest, CourseflowClient, FreeRegisterRequest, ReferralRequest, RegisterRequest,
    },
    fixtures::{checkout_payload, sign_webhook, unique_email, unique_referral_code, webhook_secret},
    skip_if_no_api,
};
use pretty_assertions::assert_eq;

/// Helper to get client or skip test
fn get_client() -> Option<CourseflowClient> {
    dotenvy::dotenv().ok();
    match std::env::var("COURSEFLOW_API_URL") {
        Ok(url) => Some(CourseflowClient::new(&url)),
        Err(_) => {
            eprintln!("Skipping: COURSEFLOW_API_URL not set");
            None
        }
    }
}

fn course_registration(email: &str) -> RegisterRequest {
    RegisterRequest {
        email: email.to_string(),
        course_id: "test-course".to_string(),
        name: "Integration Test".to_string(),
        dietary_requirements: Some("none".to_string()),
        ..Default::default()
    }
}

// ============================================================================
// Registration Tests
// ============================================================================

#[tokio::test]
async fn test_register_returns_registration_id() {
    let Some(client) = get_client() else { return };

    let email = unique_email();
    let response = client
        .register(&course_registration(&email))
        .await
        .expect("Failed to register");

    assert_eq!(response.message, "Registration successful");
    assert!(!response.registration_id.is_empty());
}

#[tokio::test]
async fn test_register_invalid_course_rejected() {
    let Some(client) = get_client() else { return };

    let mut request = course_registration(&unique_email());
    request.course_id = "bogus-course".to_string();

    let err = client.register(&request).await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(400));
    assert!(err.has_code("invalid_course_id"));
}

#[tokio::test]
async fn test_register_missing_dietary_requirements_rejected() {
    let Some(client) = get_client() else { return };

    let mut request = course_registration(&unique_email());
    request.dietary_requirements = None;

    let err = client.register(&request).await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(400));
    assert!(err.has_code("missing_required_field"));
}

#[tokio::test]
async fn test_pending_resubmission_returns_new_id() {
    let Some(client) = get_client() else { return };

    let email = unique_email();
    let first = client
        .register(&course_registration(&email))
        .await
        .expect("First registration failed");

    // A pending record may be overwritten by a corrected submission
    let second = client
        .register(&course_registration(&email))
        .await
        .expect("Resubmission should overwrite a pending record");

    assert_ne!(first.registration_id, second.registration_id);
}

#[tokio::test]
async fn test_email_is_normalized() {
    let Some(client) = get_client() else { return };

    let email = unique_email();
    client
        .register(&course_registration(&email.to_uppercase()))
        .await
        .expect("Upper-cased registration failed");

    // Same address in lowercase hits the same record: still pending, so
    // the overwrite path accepts it rather than duplicating
    client
        .register(&course_registration(&email))
        .await
        .expect("Lower-cased resubmission should overwrite, not conflict");
}

// ============================================================================
// Payment Reconciliation Tests
// ============================================================================

#[tokio::test]
async fn test_register_and_reconcile_round_trip() {
    let Some(client) = get_client() else { return };
    let Some(secret) = webhook_secret() else {
        eprintln!("Skipping: STRIPE_WEBHOOK_SECRET not set");
        return;
    };

    // Register -> pending
    let email = unique_email();
    let registration = client
        .register(&course_registration(&email))
        .await
        .expect("Failed to register");

    // Notification referencing the registration id, 5000 minor units
    let payload = checkout_payload(Some(&registration.registration_id), &email, 5000);
    let signature = sign_webhook(&payload, &secret);
    let response = client
        .webhook(&payload, &signature)
        .await
        .expect("Webhook delivery failed");
    assert!(response.received);

    // The record is now paid: re-registration is rejected
    let err = client
        .register(&course_registration(&email))
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(400));
    assert!(err.has_code("email_already_registered"));
}

#[tokio::test]
async fn test_webhook_tampered_signature_rejected() {
    let Some(client) = get_client() else { return };
    let Some(secret) = webhook_secret() else {
        eprintln!("Skipping: STRIPE_WEBHOOK_SECRET not set");
        return;
    };

    let email = unique_email();
    let registration = client
        .register(&course_registration(&email))
        .await
        .expect("Failed to register");

    let payload = checkout_payload(Some(&registration.registration_id), &email, 5000);
    let signature = sign_webhook(&payload, "not-the-real-secret");
    let err = client.webhook(&payload, &signature).await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(400));
    assert!(err.has_code("invalid_signature"));

    // The record stays pending: registering again still overwrites
    client
        .register(&course_registration(&email))
        .await
        .expect("Record should still be pending after rejected webhook");
}

#[tokio::test]
async fn test_webhook_unknown_reference_not_found() {
    let Some(client) = get_client() else { return };
    let Some(secret) = webhook_secret() else {
        eprintln!("Skipping: STRIPE_WEBHOOK_SECRET not set");
        return;
    };

    let payload = checkout_payload(Some("does-not-exist"), &unique_email(), 5000);
    let signature = sign_webhook(&payload, &secret);
    let err = client.webhook(&payload, &signature).await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
    assert!(err.has_code("registration_not_found"));
}

#[tokio::test]
async fn test_webhook_email_fallback_resolution() {
    let Some(client) = get_client() else { return };
    let Some(secret) = webhook_secret() else {
        eprintln!("Skipping: STRIPE_WEBHOOK_SECRET not set");
        return;
    };

    // The fallback only searches the default course
    let email = unique_email();
    let mut request = course_registration(&email);
    request.course_id = "01_ai_automation_for_non_coders".to_string();
    client.register(&request).await.expect("Failed to register");

    // Notification with no reference id, matched by billing email
    let payload = checkout_payload(None, &email, 61200);
    let signature = sign_webhook(&payload, &secret);
    let response = client
        .webhook(&payload, &signature)
        .await
        .expect("Fallback webhook delivery failed");
    assert!(response.received);

    // The record transitioned to paid
    let err = client.register(&request).await.unwrap_err();
    assert!(err.has_code("email_already_registered"));
}

#[tokio::test]
async fn test_webhook_email_fallback_no_match() {
    let Some(client) = get_client() else { return };
    let Some(secret) = webhook_secret() else {
        eprintln!("Skipping: STRIPE_WEBHOOK_SECRET not set");
        return;
    };

    let payload = checkout_payload(None, &unique_email(), 5000);
    let signature = sign_webhook(&payload, &secret);
    let err = client.webhook(&payload, &signature).await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
    assert!(err.has_code("registration_not_found"));
}

#[tokio::test]
async fn test_webhook_ignores_other_event_types() {
    let Some(client) = get_client() else { return };
    let Some(secret) = webhook_secret() else {
        eprintln!("Skipping: STRIPE_WEBHOOK_SECRET not set");
        return;
    };

    let payload = r#"{"id":"evt_x","type":"payment_intent.created","data":{"object":{"id":"pi_1"}}}"#;
    let signature = sign_webhook(payload, &secret);
    let response = client
        .webhook(payload, &signature)
        .await
        .expect("Unhandled event types should still be acknowledged");
    assert!(response.received);
}

// ============================================================================
// Livestream / Application Tests
// ============================================================================

#[tokio::test]
async fn test_livestream_registration() {
    let Some(client) = get_client() else { return };

    let response = client
        .register_free(&FreeRegisterRequest {
            name: "Integration Test".to_string(),
            email: unique_email(),
            registration_type: None,
        })
        .await
        .expect("Livestream registration failed");

    assert!(!response.registration_id.is_empty());
}

#[tokio::test]
async fn test_livestream_duplicate_conflicts() {
    let Some(client) = get_client() else { return };

    let email = unique_email();
    let request = FreeRegisterRequest {
        name: "Integration Test".to_string(),
        email: email.clone(),
        registration_type: None,
    };

    client
        .register_free(&request)
        .await
        .expect("First livestream registration failed");

    let err = client.register_free(&request).await.unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(409));
    assert!(err.has_code("registration_exists"));
}

#[tokio::test]
async fn test_livestream_missing_name_rejected() {
    let Some(client) = get_client() else { return };

    let err = client
        .register_free(&FreeRegisterRequest {
            name: "   ".to_string(),
            email: unique_email(),
            registration_type: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(400));
    assert!(err.has_code("missing_required_field"));
}

#[tokio::test]
async fn test_application_approval_flow() {
    let Some(client) = get_client() else { return };

    // Apply -> applied
    let email = unique_email();
    let application = client
        .register_free(&FreeRegisterRequest {
            name: "Integration Test".to_string(),
            email: email.clone(),
            registration_type: Some("application".to_string()),
        })
        .await
        .expect("Application failed");

    // Approve -> pending, with a pre-filled registration link
    let approval = client
        .approve(&ApprovalRequest {
            application_id: application.registration_id.clone(),
        })
        .await
        .expect("Approval failed");
    assert!(approval
        .registration_url
        .contains(&application.registration_id));

    // A second approval finds the application no longer in applied
    let err = client
        .approve(&ApprovalRequest {
            application_id: application.registration_id.clone(),
        })
        .await
        .unwrap_err();
    assert!(err.has_code("invalid_application_status"));

    // Auto-fill registration referencing the approved application
    let mut request = course_registration(&email);
    request.course_id = "01_ai_automation_for_non_coders".to_string();
    request.applicant_id = Some(application.registration_id.clone());
    client
        .register(&request)
        .await
        .expect("Auto-fill registration failed");
}

#[tokio::test]
async fn test_approval_unknown_application_not_found() {
    let Some(client) = get_client() else { return };

    let err = client
        .approve(&ApprovalRequest {
            application_id: "does-not-exist".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(404));
    assert!(err.has_code("application_not_found"));
}

// ============================================================================
// Referral Tests
// ============================================================================

#[tokio::test]
async fn test_referral_event_recorded() {
    skip_if_no_api!();
    let client = CourseflowClient::new(&std::env::var("COURSEFLOW_API_URL").unwrap());

    let response = client
        .referral(&ReferralRequest {
            event_name: "click".to_string(),
            referral_code: unique_referral_code(),
        })
        .await
        .expect("Referral event failed");

    assert_eq!(response.message, "Referral event recorded successfully");
    assert!(!response.event_id.is_empty());
}

#[tokio::test]
async fn test_referral_invalid_code_rejected() {
    let Some(client) = get_client() else { return };

    let err = client
        .referral(&ReferralRequest {
            event_name: "click".to_string(),
            referral_code: "abc 123!".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(400));
    assert!(err.has_code("validation_error"));
}

#[tokio::test]
async fn test_referral_missing_fields_rejected() {
    let Some(client) = get_client() else { return };

    let err = client
        .referral(&ReferralRequest {
            event_name: String::new(),
            referral_code: unique_referral_code(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status().map(|s| s.as_u16()), Some(400));
    assert!(err.has_code("validation_error"));
}

