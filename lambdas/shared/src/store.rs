//! DynamoDB operations for Courseflow
//!
//! Two tables:
//!
//! | Table                | Keys                          | Indexes               |
//! |----------------------|-------------------------------|-----------------------|
//! | course_registrations | course_id (PK) + email (SK)   | registration_id-index |
//! | referral_events      | event_id (PK)                 | referral_code-index   |
//!
//! All operations are single-item reads/writes or filtered scans; there
//! are no transactions and no conditional writes. Concurrent submissions
//! for the same (course, email) race last-writer-wins, which is the
//! documented behavior of the registration endpoints.

use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use serde_dynamo::{from_item, to_item};
use std::collections::HashMap;
use tracing::warn;

use crate::errors::{Error, Result};
use crate::models::*;

/// Registration table name (from environment)
const TABLE_NAME_ENV: &str = "TABLE_NAME";
const DEFAULT_TABLE_NAME: &str = "course_registrations";

/// Referral events table name (from environment)
const REFERRAL_TABLE_ENV: &str = "REFERRAL_EVENTS_TABLE";
const DEFAULT_REFERRAL_TABLE: &str = "referral_events";

/// GSI keyed on registration_id, used by webhook and approval resolution
const REGISTRATION_ID_INDEX: &str = "registration_id-index";

/// DynamoDB client for registration records
pub struct RegistrationStore {
    client: Client,
    table_name: String,
}

impl RegistrationStore {
    /// Create a new store, reading the table name from the environment
    pub fn new(client: Client) -> Self {
        let table_name =
            std::env::var(TABLE_NAME_ENV).unwrap_or_else(|_| DEFAULT_TABLE_NAME.to_string());
        Self { client, table_name }
    }

    /// Create with explicit table name (for testing)
    pub fn with_table_name(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// Look up a registration by its composite key. The email must
    /// already be normalized.
    pub async fn get(&self, course_id: &str, email: &str) -> Result<Option<RegistrationRecord>> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("course_id", AttributeValue::S(course_id.to_string()))
            .key("email", AttributeValue::S(email.to_string()))
            .send()
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        match result.item {
            Some(item) => Ok(Some(
                from_item(item).map_err(|e| Error::DynamoSerialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    /// Write a registration record, overwriting any existing item under
    /// the same (course_id, email). Callers enforce the duplicate policy
    /// with a prior `get`; two concurrent writers race last-writer-wins.
    pub async fn put(&self, record: &RegistrationRecord) -> Result<()> {
        let item: HashMap<String, AttributeValue> =
            to_item(record).map_err(|e| Error::DynamoSerialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    /// Authoritative lookup via the registration_id secondary index.
    pub async fn find_by_registration_id(
        &self,
        registration_id: &str,
    ) -> Result<Option<RegistrationRecord>> {
        let result = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(REGISTRATION_ID_INDEX)
            .key_condition_expression("registration_id = :rid")
            .expression_attribute_values(":rid", AttributeValue::S(registration_id.to_string()))
            .send()
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        match result.items.unwrap_or_default().into_iter().next() {
            Some(item) => Ok(Some(
                from_item(item).map_err(|e| Error::DynamoSerialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    /// Legacy resolution for payment notifications that carry no
    /// reference id: scans for a pending record in the default course
    /// matching the billing email. O(table size) and ambiguous under
    /// re-registrations, kept only for older client integrations; every
    /// use is logged so the path can be monitored and retired.
    pub async fn find_pending_fallback(&self, email: &str) -> Result<Option<RegistrationRecord>> {
        warn!(email = %email, "resolving payment via legacy email scan");

        let result = self
            .client
            .scan()
            .table_name(&self.table_name)
            .filter_expression("course_id = :course AND email = :email AND payment_status = :status")
            .expression_attribute_values(":course", AttributeValue::S(DEFAULT_COURSE_ID.to_string()))
            .expression_attribute_values(":email", AttributeValue::S(email.to_string()))
            .expression_attribute_values(
                ":status",
                AttributeValue::S(RegistrationStatus::Pending.as_str().to_string()),
            )
            .send()
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        let items = result.items.unwrap_or_default();
        if items.len() > 1 {
            warn!(email = %email, matches = items.len(), "ambiguous email fallback match, using first");
        }

        match items.into_iter().next() {
            Some(item) => Ok(Some(
                from_item(item).map_err(|e| Error::DynamoSerialization(e.to_string()))?,
            )),
            None => Ok(None),
        }
    }

    /// Transition a record to paid and attach the payment metadata.
    pub async fn mark_paid(
        &self,
        course_id: &str,
        email: &str,
        payment: &PaymentUpdate,
    ) -> Result<()> {
        self.client
            .update_item()
            .table_name(&self.table_name)
            .key("course_id", AttributeValue::S(course_id.to_string()))
            .key("email", AttributeValue::S(email.to_string()))
            .update_expression(
                "SET payment_status = :status, payment_date = :date, \
                 stripe_session_id = :session_id, payment_amount = :amount",
            )
            .expression_attribute_values(
                ":status",
                AttributeValue::S(RegistrationStatus::Paid.as_str().to_string()),
            )
            .expression_attribute_values(
                ":date",
                AttributeValue::S(payment.paid_at.to_rfc3339()),
            )
            .expression_attribute_values(
                ":session_id",
                AttributeValue::S(payment.session_id.clone()),
            )
            .expression_attribute_values(":amount", AttributeValue::N(payment.amount.to_string()))
            .send()
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }

    /// Approval step: applied -> pending, stamping the approval date.
    pub async fn approve(
        &self,
        course_id: &str,
        email: &str,
        approved_at: DateTime<Utc>,
    ) -> Result<()> {
        self.client
            .update_item()
            .table_name(&self.table_name)
            .key("course_id", AttributeValue::S(course_id.to_string()))
            .key("email", AttributeValue::S(email.to_string()))
            .update_expression("SET payment_status = :status, approval_date = :date")
            .expression_attribute_values(
                ":status",
                AttributeValue::S(RegistrationStatus::Pending.as_str().to_string()),
            )
            .expression_attribute_values(":date", AttributeValue::S(approved_at.to_rfc3339()))
            .send()
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }
}

/// DynamoDB client for the append-only referral event log
pub struct ReferralStore {
    client: Client,
    table_name: String,
}

impl ReferralStore {
    /// Create a new store, reading the table name from the environment
    pub fn new(client: Client) -> Self {
        let table_name = std::env::var(REFERRAL_TABLE_ENV)
            .unwrap_or_else(|_| DEFAULT_REFERRAL_TABLE.to_string());
        Self { client, table_name }
    }

    /// Create with explicit table name (for testing)
    pub fn with_table_name(client: Client, table_name: String) -> Self {
        Self { client, table_name }
    }

    /// Append a referral event. No update or delete path exists.
    pub async fn record(&self, event: &ReferralEvent) -> Result<()> {
        let item: HashMap<String, AttributeValue> =
            to_item(event).map_err(|e| Error::DynamoSerialization(e.to_string()))?;

        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(())
    }
}
