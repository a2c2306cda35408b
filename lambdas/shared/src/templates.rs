//! Email bodies for the registration flows
//!
//! Pure functions so content can be tested without an SES client.

use chrono::Utc;

use crate::models::RegistrationRecord;

/// A rendered email: subject, plain-text body, optional HTML body.
#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

/// Confirmation sent to a livestream registrant.
pub fn livestream_confirmation(name: &str, registration_id: &str) -> EmailContent {
    let subject = "Welcome to the AI Tax Automation Livestream!".to_string();

    let text = format!(
        "Hi {name},\n\
         \n\
         Thank you for registering for our AI Tax Automation Livestream!\n\
         \n\
         Registration Details:\n\
         - Registration ID: {registration_id}\n\
         - Format: Online Livestream\n\
         - Cost: FREE\n\
         \n\
         We'll send you the livestream link and access details closer to the\n\
         event date. Make sure to check your email regularly.\n\
         \n\
         Best regards,\n\
         The AI Automation Team"
    );

    let html = format!(
        "<html><body style=\"font-family: sans-serif; color: #333; max-width: 600px; margin: 0 auto;\">\
         <h1>AI Tax Automation Livestream</h1>\
         <p>Hi {name},</p>\
         <p>Thank you for registering for our <strong>AI Tax Automation Livestream</strong>!</p>\
         <div style=\"background-color: #f8f8f8; border-left: 4px solid #000; padding: 20px;\">\
         <p><strong>Registration ID:</strong> {registration_id}</p>\
         <p><strong>Format:</strong> Online Livestream</p>\
         <p><strong>Cost:</strong> FREE</p>\
         </div>\
         <p>We'll send you the livestream link and access details closer to the event date.</p>\
         <p>Best regards,<br>The AI Automation Team</p>\
         </body></html>"
    );

    EmailContent {
        subject,
        text,
        html: Some(html),
    }
}

/// Acknowledgement sent to a course applicant while their application is
/// under review.
pub fn application_received(name: &str, registration_id: &str) -> EmailContent {
    let subject = "Your Course Application Has Been Received".to_string();

    let text = format!(
        "Hi {name},\n\
         \n\
         Thank you for applying for A.I. Automation for Non Coders!\n\
         \n\
         Application ID: {registration_id}\n\
         \n\
         We review every application and will be in touch shortly. If your\n\
         application is accepted you'll receive a registration link to\n\
         complete your enrolment.\n\
         \n\
         Best regards,\n\
         The AI Automation Team"
    );

    EmailContent {
        subject,
        text,
        html: None,
    }
}

/// Operator notification for a new free registration.
pub fn registration_notice(record: &RegistrationRecord) -> EmailContent {
    let subject = format!(
        "[{} Registration] New signup from {}",
        capitalize(record.registration_type.as_str()),
        record.name
    );

    let text = format!(
        "New {} registration\n\
         \n\
         Registration Details:\n\
         - Name: {}\n\
         - Email: {}\n\
         - Registration ID: {}\n\
         - Course: {}\n\
         - Payment Status: {}\n\
         - Registration Time: {}\n\
         \n\
         This is an automated notification.",
        record.registration_type.as_str(),
        record.name,
        record.email,
        record.registration_id,
        record.course_id,
        record.payment_status.as_str(),
        Utc::now().to_rfc3339(),
    );

    EmailContent {
        subject,
        text,
        html: None,
    }
}

/// Receipt sent to the registrant after payment completes.
pub fn payment_receipt(name: &str, registration_id: &str, amount: f64) -> EmailContent {
    let subject = "Course Registration Confirmed".to_string();

    let text = format!(
        "Hi {name},\n\
         \n\
         Your payment has been processed successfully!\n\
         \n\
         Registration ID: {registration_id}\n\
         Amount Paid: ${amount:.2}\n\
         \n\
         Please bring your laptop and charger to all sessions. The venue\n\
         will be confirmed shortly and you'll receive another email with\n\
         location details.\n\
         \n\
         Thank you for registering!"
    );

    EmailContent {
        subject,
        text,
        html: None,
    }
}

/// Operator notification for a completed payment.
pub fn payment_notice(record: &RegistrationRecord, amount: f64, session_id: &str) -> EmailContent {
    let subject = "New Course Registration Payment".to_string();

    let text = format!(
        "New payment received:\n\
         \n\
         Name: {}\n\
         Email: {}\n\
         Registration ID: {}\n\
         Amount: ${amount:.2}\n\
         Stripe Session ID: {session_id}",
        record.name, record.email, record.registration_id,
    );

    EmailContent {
        subject,
        text,
        html: None,
    }
}

/// Acceptance email sent when an application is approved, carrying the
/// pre-filled registration link.
pub fn application_acceptance(
    name: &str,
    application_id: &str,
    registration_url: &str,
) -> EmailContent {
    let subject = "Your Application Has Been Accepted!".to_string();

    let text = format!(
        "Hi {name},\n\
         \n\
         Great news - your application for A.I. Automation for Non Coders\n\
         has been accepted!\n\
         \n\
         Application ID: {application_id}\n\
         \n\
         Complete your registration here (your details are pre-filled):\n\
         {registration_url}\n\
         \n\
         We're excited to have you join us!\n\
         \n\
         Best regards,\n\
         - Louka"
    );

    let html = format!(
        "<html><body style=\"font-family: sans-serif; color: #333; max-width: 600px; margin: 0 auto;\">\
         <p>Hi {name},</p>\
         <p>Great news - your application for <strong>A.I. Automation for Non Coders</strong> has been accepted!</p>\
         <p><strong>Application ID:</strong> {application_id}</p>\
         <p><a href=\"{registration_url}\">Complete your registration</a> (your details are pre-filled).</p>\
         <p>We're excited to have you join us!</p>\
         <p>Best regards,<br>- Louka</p>\
         </body></html>"
    );

    EmailContent {
        subject,
        text,
        html: Some(html),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
