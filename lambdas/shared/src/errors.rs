//! Error types for Courseflow

use thiserror::Error;

/// Result type alias using Courseflow Error
pub type Result<T> = std::result::Result<T, Error>;

/// Courseflow error types
#[derive(Error, Debug)]
pub enum Error {
    /// Course id outside the allow-list
    #[error("Invalid course ID: {0}")]
    InvalidCourseId(String),

    /// Required submission field absent or empty
    #[error("{0} is required")]
    MissingRequiredField(String),

    /// (course, email) already holds a paid registration
    #[error("This email has already been registered and paid for this course")]
    EmailAlreadyRegistered(String),

    /// Free-path duplicate: any existing record is a conflict
    #[error("Registration already exists for this email")]
    RegistrationExists(String),

    /// Referenced application does not exist (registration pre-check)
    #[error("Application not found or invalid: {0}")]
    InvalidApplication(String),

    /// Application is not in the status the operation expects
    #[error("Application is not approved for registration (status: {0})")]
    InvalidApplicationStatus(String),

    /// Submission email does not match the referenced application
    #[error("Email does not match the application")]
    EmailMismatch(String),

    /// Referenced application does not exist (approval step)
    #[error("Application not found: {0}")]
    ApplicationNotFound(String),

    /// Payment notification could not be matched to a registration
    #[error("Registration not found: {0}")]
    RegistrationNotFound(String),

    /// Malformed request or webhook body
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Webhook signature missing, malformed, stale, or wrong
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// DynamoDB error
    #[error("Database error: {0}")]
    Database(String),

    /// JSON Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// DynamoDB serialization error
    #[error("DynamoDB serialization error: {0}")]
    DynamoSerialization(String),

    /// SES dispatch failure (best-effort paths only)
    #[error("Email error: {0}")]
    Email(String),

    /// Conversions API failure (best-effort paths only)
    #[error("Analytics error: {0}")]
    Analytics(String),

    /// Missing or unusable environment configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Returns the error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidCourseId(_) => "invalid_course_id",
            Error::MissingRequiredField(_) => "missing_required_field",
            Error::EmailAlreadyRegistered(_) => "email_already_registered",
            Error::RegistrationExists(_) => "registration_exists",
            Error::InvalidApplication(_) => "invalid_application",
            Error::InvalidApplicationStatus(_) => "invalid_application_status",
            Error::EmailMismatch(_) => "email_mismatch",
            Error::ApplicationNotFound(_) => "application_not_found",
            Error::RegistrationNotFound(_) => "registration_not_found",
            Error::InvalidPayload(_) => "invalid_payload",
            Error::InvalidSignature(_) => "invalid_signature",
            Error::Validation(_) => "validation_error",
            Error::Database(_) => "database_error",
            Error::Serialization(_) => "serialization_error",
            Error::DynamoSerialization(_) => "serialization_error",
            Error::Email(_) => "email_error",
            Error::Analytics(_) => "analytics_error",
            Error::Config(_) => "config_error",
            Error::Internal(_) => "internal_error",
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::InvalidCourseId(_) => 400,
            Error::MissingRequiredField(_) => 400,
            Error::EmailAlreadyRegistered(_) => 400,
            Error::RegistrationExists(_) => 409,
            Error::InvalidApplication(_) => 400,
            Error::InvalidApplicationStatus(_) => 400,
            Error::EmailMismatch(_) => 400,
            Error::ApplicationNotFound(_) => 404,
            Error::RegistrationNotFound(_) => 404,
            Error::InvalidPayload(_) => 400,
            Error::InvalidSignature(_) => 400,
            Error::Validation(_) => 400,
            Error::Database(_) => 500,
            Error::Serialization(_) => 400,
            Error::DynamoSerialization(_) => 500,
            Error::Email(_) => 500,
            Error::Analytics(_) => 500,
            Error::Config(_) => 500,
            Error::Internal(_) => 500,
        }
    }
}
