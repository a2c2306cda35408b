//! Courseflow Core Library
//!
//! Shared functionality for Courseflow Lambda functions including:
//! - Domain models and validation
//! - DynamoDB stores
//! - Registration state policy
//! - Stripe webhook verification
//! - SES mailer and templates
//! - Meta Conversions API client
//! - Error types and HTTP response helpers

pub mod conversions;
pub mod email;
pub mod errors;
pub mod http;
pub mod models;
pub mod notify;
pub mod policy;
pub mod store;
pub mod stripe;
pub mod templates;

pub use email::Mailer;
pub use errors::{Error, Result};
pub use models::*;
pub use store::{ReferralStore, RegistrationStore};
