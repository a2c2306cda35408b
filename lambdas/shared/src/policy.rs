//! Registration state policy
//!
//! The store is plain CRUD; the rules about what may overwrite what live
//! here, where they can be tested without a database.
//!
//! The two duplicate policies are deliberately different: the paid-course
//! path overwrites abandoned (non-paid) submissions, while the free paths
//! treat any existing record as a hard conflict. See DESIGN.md.

use crate::errors::{Error, Result};
use crate::models::{ReferralRequest, RegistrationRecord, RegistrationStatus};

/// Upper bound on referral event_name and referral_code length.
pub const MAX_REFERRAL_FIELD_LEN: usize = 100;

/// Upper bound on captured request metadata (user agent).
pub const MAX_USER_AGENT_LEN: usize = 200;

/// Duplicate policy for the paid-course path: a paid record blocks
/// re-registration; anything else is overwritten by the new submission.
pub fn check_course_duplicate(existing: Option<&RegistrationRecord>) -> Result<()> {
    match existing {
        Some(record) if record.payment_status == RegistrationStatus::Paid => {
            Err(Error::EmailAlreadyRegistered(record.email.clone()))
        }
        _ => Ok(()),
    }
}

/// Duplicate policy for the free paths (livestream, application): any
/// existing record for the (course, email) pair is a conflict.
pub fn check_free_duplicate(existing: Option<&RegistrationRecord>) -> Result<()> {
    match existing {
        Some(record) => Err(Error::RegistrationExists(record.registration_id.clone())),
        None => Ok(()),
    }
}

/// Pre-checks an approved application before an auto-fill registration.
/// The application must exist, have been approved (status moved back to
/// pending), and belong to the submitting email.
pub fn verify_application(
    application: Option<&RegistrationRecord>,
    applicant_id: &str,
    email: &str,
) -> Result<()> {
    let Some(application) = application else {
        return Err(Error::InvalidApplication(applicant_id.to_string()));
    };
    if application.payment_status != RegistrationStatus::Pending {
        return Err(Error::InvalidApplicationStatus(
            application.payment_status.as_str().to_string(),
        ));
    }
    if application.email != email {
        return Err(Error::EmailMismatch(email.to_string()));
    }
    Ok(())
}

/// Converts a minor-unit amount from the payment provider (e.g. cents)
/// into the major-unit figure stored on the record.
pub fn amount_from_minor_units(minor: i64) -> f64 {
    minor as f64 / 100.0
}

/// Validates a referral submission, returning the cleaned
/// (event_name, referral_code) pair.
pub fn validate_referral(request: &ReferralRequest) -> Result<(String, String)> {
    let event_name = request.event_name.as_deref().unwrap_or("").trim();
    let referral_code = request.referral_code.as_deref().unwrap_or("").trim();

    if event_name.is_empty() || referral_code.is_empty() {
        return Err(Error::Validation(
            "Missing required fields: event_name and referral_code".to_string(),
        ));
    }
    if event_name.len() > MAX_REFERRAL_FIELD_LEN || referral_code.len() > MAX_REFERRAL_FIELD_LEN {
        return Err(Error::Validation("Field values too long".to_string()));
    }
    if !referral_code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(Error::Validation("Invalid referral code format".to_string()));
    }

    Ok((event_name.to_string(), referral_code.to_string()))
}
