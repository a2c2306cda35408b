//! Domain models for Courseflow
//!
//! These types represent the core entities in the system:
//! - Registration records: one row per (course, email) pair
//! - Referral events: append-only click audit records
//! - Request and response bodies for the HTTP handlers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Course identifiers accepted by the registration endpoint.
pub const VALID_COURSE_IDS: &[&str] = &[
    "01_ai_automation_for_non_coders",
    "test-course",
    "tax-livestream-01",
];

/// Course sold through Stripe checkout. Also the course searched by the
/// legacy email fallback when a payment notification carries no
/// reference id.
pub const DEFAULT_COURSE_ID: &str = "01_ai_automation_for_non_coders";

/// Fixed course for free livestream signups.
pub const LIVESTREAM_COURSE_ID: &str = "tax-livestream-01";

/// Lower-cases and trims an email so stores and lookups always agree.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Payment lifecycle of a registration.
///
/// `pending -> paid` via the Stripe webhook; `applied -> pending` via the
/// approval step. A `paid` record is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    /// Awaiting checkout (or an approved application awaiting checkout)
    Pending,
    /// Application submitted, not yet approved
    Applied,
    /// Payment confirmed (zero-amount for the free flows)
    Paid,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Pending => "pending",
            RegistrationStatus::Applied => "applied",
            RegistrationStatus::Paid => "paid",
        }
    }
}

/// Which signup flow produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationType {
    Course,
    Livestream,
    Application,
}

impl RegistrationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationType::Course => "course",
            RegistrationType::Livestream => "livestream",
            RegistrationType::Application => "application",
        }
    }
}

fn default_referral_source() -> String {
    "direct".to_string()
}

/// One registration attempt, keyed by (course_id, email).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub course_id: String,
    /// Normalized (trimmed, lower-cased) before storage
    pub email: String,
    /// Assigned at creation; passed to Stripe as the client reference
    pub registration_id: String,
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default = "default_referral_source")]
    pub referral_source: String,
    #[serde(default)]
    pub automation_interest: String,
    #[serde(default)]
    pub dietary_requirements: String,
    pub payment_status: RegistrationStatus,
    pub registration_type: RegistrationType,
    pub registration_date: DateTime<Utc>,
    /// Stripe checkout session reference; empty until the webhook fires
    #[serde(default)]
    pub stripe_session_id: String,
    /// Major currency units, populated on the pending -> paid transition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_date: Option<DateTime<Utc>>,
}

impl RegistrationRecord {
    /// New record with a fresh registration id and a server-assigned
    /// timestamp; profile fields start empty.
    pub fn new(
        course_id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
        registration_type: RegistrationType,
        payment_status: RegistrationStatus,
    ) -> Self {
        Self {
            course_id: course_id.into(),
            email: email.into(),
            registration_id: Uuid::new_v4().to_string(),
            name: name.into(),
            phone: String::new(),
            company: String::new(),
            job_title: String::new(),
            referral_source: default_referral_source(),
            automation_interest: String::new(),
            dietary_requirements: String::new(),
            payment_status,
            registration_type,
            registration_date: Utc::now(),
            stripe_session_id: String::new(),
            payment_amount: None,
            payment_date: None,
            approval_date: None,
        }
    }
}

/// Fields written by the pending -> paid transition.
#[derive(Debug, Clone)]
pub struct PaymentUpdate {
    /// Major currency units
    pub amount: f64,
    pub session_id: String,
    pub paid_at: DateTime<Utc>,
}

/// Course registration submission. Presence of required fields is
/// checked by the handler so the API reports a stable error code
/// instead of a deserialization failure.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub course_id: String,
    /// Set when an approved application pre-fills the form
    #[serde(default)]
    pub applicant_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub job_title: String,
    #[serde(default = "default_referral_source")]
    pub referral_source: String,
    #[serde(default)]
    pub automation_interest: String,
    #[serde(default)]
    pub dietary_requirements: String,
}

fn default_livestream_type() -> RegistrationType {
    RegistrationType::Livestream
}

/// Free registration submission (livestream or course application).
#[derive(Debug, Clone, Deserialize)]
pub struct FreeRegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_livestream_type")]
    pub registration_type: RegistrationType,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub automation_interest: String,
}

/// Successful registration response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub registration_id: String,
}

/// Webhook acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookResponse {
    pub received: bool,
}

/// Referral click submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferralRequest {
    #[serde(default)]
    pub event_name: Option<String>,
    #[serde(default)]
    pub referral_code: Option<String>,
}

/// Response after recording a referral event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralResponse {
    pub message: String,
    pub event_id: String,
}

/// Append-only referral click record, keyed by event_id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralEvent {
    pub event_id: String,
    pub event_name: String,
    pub referral_code: String,
    pub timestamp: DateTime<Utc>,
    /// Truncated request metadata, best-effort
    pub user_agent: String,
    pub source_ip: String,
}

/// Application approval submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalRequest {
    #[serde(default)]
    pub application_id: Option<String>,
}

/// Response after approving an application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalResponse {
    pub message: String,
    pub application_id: String,
    /// Pre-filled registration form link sent to the applicant
    pub registration_url: String,
}

/// API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}
