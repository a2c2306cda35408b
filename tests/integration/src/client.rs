//! Courseflow API client for testing

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

/// API client for Courseflow
pub struct CourseflowClient {
    client: Client,
    base_url: String,
}

// Request/Response types

#[derive(Debug, Clone, Default, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub course_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary_requirements: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FreeRegisterRequest {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterResponse {
    pub message: String,
    pub registration_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferralRequest {
    pub event_name: String,
    pub referral_code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReferralResponse {
    pub message: String,
    pub event_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovalRequest {
    pub application_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalResponse {
    pub message: String,
    pub application_id: String,
    pub registration_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookResponse {
    pub received: bool,
}

/// API error
#[derive(Debug)]
pub enum ApiError {
    /// Non-2xx response with body
    Http { status: StatusCode, body: String },
    /// Request failed to complete
    Request(reqwest::Error),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Http { status, body } => write!(f, "HTTP {status}: {body}"),
            ApiError::Request(e) => write!(f, "Request error: {e}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Request(e)
    }
}

impl ApiError {
    /// Status code if the server answered at all
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            ApiError::Request(_) => None,
        }
    }

    /// Whether the error body carries the given machine-readable code
    pub fn has_code(&self, code: &str) -> bool {
        match self {
            ApiError::Http { body, .. } => body.contains(code),
            ApiError::Request(_) => false,
        }
    }
}

impl CourseflowClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<RegisterResponse, ApiError> {
        self.post_json("/register", req).await
    }

    pub async fn register_free(
        &self,
        req: &FreeRegisterRequest,
    ) -> Result<RegisterResponse, ApiError> {
        self.post_json("/livestream", req).await
    }

    pub async fn referral(&self, req: &ReferralRequest) -> Result<ReferralResponse, ApiError> {
        self.post_json("/referral", req).await
    }

    pub async fn approve(&self, req: &ApprovalRequest) -> Result<ApprovalResponse, ApiError> {
        self.post_json("/approve", req).await
    }

    /// Deliver a raw webhook payload with a pre-computed signature header.
    pub async fn webhook(
        &self,
        payload: &str,
        signature: &str,
    ) -> Result<WebhookResponse, ApiError> {
        let response = self
            .client
            .post(format!("{}/webhook", self.base_url))
            .header("Content-Type", "application/json")
            .header("stripe-signature", signature)
            .body(payload.to_string())
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;
        Self::parse(response).await
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::Http { status, body })
        }
    }
}
