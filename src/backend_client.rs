use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use std::time::Duration;

use crate::config::Config;
use crate::errors::{ClientError, DEFAULT_LOGIN_FAILURE};
use crate::models::{ApiErrorBody, Customer, CustomerFields, CustomerId, LoginRequest, LoginResponse};
use crate::session::SessionContext;

/// Remote customer collection.
///
/// Every call is independent: nothing here caches, retries, or deduplicates.
#[async_trait]
pub trait CustomerBackend: Send + Sync {
    /// `GET /customer`
    async fn fetch_all(&self) -> Result<Vec<Customer>, ClientError>;

    /// `GET /customer/{id}`
    async fn fetch_one(&self, id: &CustomerId) -> Result<Customer, ClientError>;

    /// `POST /customer`
    async fn create(&self, fields: &CustomerFields) -> Result<Customer, ClientError>;

    /// `PUT /customer/{id}`
    async fn update(&self, id: &CustomerId, fields: &CustomerFields)
        -> Result<Customer, ClientError>;

    /// `DELETE /customer/{id}`
    async fn delete(&self, id: &CustomerId) -> Result<(), ClientError>;
}

/// Login collaborator. Returns the opaque session token.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> Result<String, ClientError>;
}

fn build_http_client(timeout: Option<Duration>) -> Result<reqwest::Client, ClientError> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| ClientError::ExternalApiError(format!("Failed to create HTTP client: {}", e)))
}

/// Maps a non-success response onto the client error taxonomy.
async fn check_status(response: Response, action: &str) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    tracing::error!("{} failed with {}: {}", action, status, error_text);

    let detail = format!("{} returned {}: {}", action, status, error_text);
    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized(detail),
        StatusCode::NOT_FOUND => ClientError::NotFound(detail),
        StatusCode::BAD_REQUEST => ClientError::BadRequest(detail),
        _ => ClientError::ExternalApiError(detail),
    })
}

/// HTTP implementation of [`CustomerBackend`].
///
/// The session credential is attached as a bearer header on every call.
#[derive(Clone)]
pub struct HttpCustomerBackend {
    client: reqwest::Client,
    base_url: String,
    session: SessionContext,
}

impl HttpCustomerBackend {
    /// Creates a new `HttpCustomerBackend`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The backend base URL, without a trailing slash.
    /// * `session` - The session whose credential is presented on each call.
    /// * `timeout` - Optional per-request timeout.
    pub fn new(
        base_url: String,
        session: SessionContext,
        timeout: Option<Duration>,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn from_config(config: &Config, session: SessionContext) -> Result<Self, ClientError> {
        Self::new(config.api_base_url.clone(), session, config.http_timeout)
    }

    fn collection_url(&self) -> String {
        format!("{}/customer", self.base_url)
    }

    fn record_url(&self, id: &CustomerId) -> String {
        format!("{}/customer/{}", self.base_url, id)
    }

    fn authorization(&self) -> String {
        format!("Bearer {}", self.session.token())
    }
}

#[async_trait]
impl CustomerBackend for HttpCustomerBackend {
    async fn fetch_all(&self) -> Result<Vec<Customer>, ClientError> {
        let url = self.collection_url();
        tracing::info!("Fetching customer collection: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.authorization())
            .send()
            .await
            .map_err(|e| ClientError::ExternalApiError(format!("Customer list request failed: {}", e)))?;
        let response = check_status(response, "Customer list").await?;

        let customers: Vec<Customer> = response.json().await.map_err(|e| {
            ClientError::ExternalApiError(format!("Failed to parse customer list: {}", e))
        })?;

        tracing::info!("✓ Fetched {} customers", customers.len());
        Ok(customers)
    }

    async fn fetch_one(&self, id: &CustomerId) -> Result<Customer, ClientError> {
        let url = self.record_url(id);
        tracing::info!("Fetching customer {}", id);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.authorization())
            .send()
            .await
            .map_err(|e| ClientError::ExternalApiError(format!("Customer request failed: {}", e)))?;
        let response = check_status(response, "Customer lookup").await?;

        response.json().await.map_err(|e| {
            ClientError::ExternalApiError(format!("Failed to parse customer {}: {}", id, e))
        })
    }

    async fn create(&self, fields: &CustomerFields) -> Result<Customer, ClientError> {
        let url = self.collection_url();
        tracing::info!("Creating customer '{}'", fields.username);

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.authorization())
            .json(fields)
            .send()
            .await
            .map_err(|e| ClientError::ExternalApiError(format!("Failed to create customer: {}", e)))?;
        let response = check_status(response, "Customer creation").await?;

        let created: Customer = response.json().await.map_err(|e| {
            ClientError::ExternalApiError(format!("Failed to parse created customer: {}", e))
        })?;

        tracing::info!("✓ Customer created: {}", created.id);
        Ok(created)
    }

    async fn update(
        &self,
        id: &CustomerId,
        fields: &CustomerFields,
    ) -> Result<Customer, ClientError> {
        let url = self.record_url(id);
        tracing::info!("Updating customer {}", id);

        let response = self
            .client
            .put(&url)
            .header("Authorization", self.authorization())
            .json(fields)
            .send()
            .await
            .map_err(|e| ClientError::ExternalApiError(format!("Failed to update customer: {}", e)))?;
        let response = check_status(response, "Customer update").await?;

        let updated: Customer = response.json().await.map_err(|e| {
            ClientError::ExternalApiError(format!("Failed to parse updated customer: {}", e))
        })?;

        tracing::info!("✓ Customer updated: {}", updated.id);
        Ok(updated)
    }

    async fn delete(&self, id: &CustomerId) -> Result<(), ClientError> {
        let url = self.record_url(id);
        tracing::info!("Deleting customer {}", id);

        let response = self
            .client
            .delete(&url)
            .header("Authorization", self.authorization())
            .send()
            .await
            .map_err(|e| ClientError::ExternalApiError(format!("Failed to delete customer: {}", e)))?;
        check_status(response, "Customer deletion").await?;

        tracing::info!("✓ Customer deleted: {}", id);
        Ok(())
    }
}

/// Client for the unauthenticated endpoints: login and the public status
/// pages.
#[derive(Clone)]
pub struct PublicApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl PublicApiClient {
    pub fn new(base_url: String, timeout: Option<Duration>) -> Result<Self, ClientError> {
        Ok(Self {
            client: build_http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ClientError> {
        Self::new(config.auth_base_url.clone(), config.http_timeout)
    }

    /// `GET /api/public/health`
    pub async fn health(&self) -> Result<String, ClientError> {
        self.get_text("/api/public/health", "Health check").await
    }

    /// `GET /api/public/info`
    pub async fn info(&self) -> Result<String, ClientError> {
        self.get_text("/api/public/info", "Service info").await
    }

    async fn get_text(&self, path: &str, action: &str) -> Result<String, ClientError> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{}: {}", action, url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::ExternalApiError(format!("{} request failed: {}", action, e)))?;
        let response = check_status(response, action).await?;

        response
            .text()
            .await
            .map_err(|e| ClientError::ExternalApiError(format!("Failed to read {}: {}", action, e)))
    }
}

#[async_trait]
impl AuthBackend for PublicApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<String, ClientError> {
        let url = format!("{}/api/auth/login", self.base_url);
        tracing::info!("Signing in as {}", email);

        let response = self
            .client
            .post(&url)
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Login request failed: {}", e);
                ClientError::AuthFailed(DEFAULT_LOGIN_FAILURE.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!("Login rejected with {}", status);

            let message = serde_json::from_str::<ApiErrorBody>(&error_text)
                .ok()
                .and_then(|body| body.message)
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LOGIN_FAILURE.to_string());
            return Err(ClientError::AuthFailed(message));
        }

        let body: LoginResponse = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse login response: {}", e);
            ClientError::AuthFailed(DEFAULT_LOGIN_FAILURE.to_string())
        })?;

        if body.token.trim().is_empty() {
            tracing::warn!("Login response carried an empty token");
            return Err(ClientError::AuthFailed(DEFAULT_LOGIN_FAILURE.to_string()));
        }

        tracing::info!("✓ Signed in as {}", email);
        Ok(body.token)
    }
}
