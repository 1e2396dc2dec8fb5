mod files;

use async_trait::async_trait;
use deskline_domain::{
    ChatMessage, CoreError, CoreResult, FileDescriptor, Ticket,
};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::interface::{
    CreateTicketRequest, HelpdeskBackend, LoginOutcome, LoginRequest, RegisterBuildingRequest,
    RegisterCustomerRequest, RegisterWorkerRequest, UpdateTicketRequest,
};

const DEFAULT_API_URL: &str = "https://api-osius.up.railway.app";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBackendConfig {
    pub api_url: String,
    pub request_timeout: Duration,
}

impl Default for HttpBackendConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl HttpBackendConfig {
    pub fn from_settings(
        api_url: impl Into<String>,
        request_timeout: Duration,
    ) -> Result<Self, CoreError> {
        let api_url = api_url.into().trim().trim_end_matches('/').to_owned();
        if api_url.is_empty() {
            return Err(CoreError::Configuration(
                "backend.api_url is empty. Provide a non-empty base url.".to_owned(),
            ));
        }
        if request_timeout.is_zero() {
            return Err(CoreError::Configuration(
                "backend.request_timeout_secs must be greater than zero.".to_owned(),
            ));
        }

        Ok(Self {
            api_url,
            request_timeout,
        })
    }
}

#[derive(Debug, Clone)]
pub struct HttpHelpdeskBackend {
    config: HttpBackendConfig,
    client: Client,
}

impl HttpHelpdeskBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self, CoreError> {
        if config.api_url.trim().is_empty() {
            return Err(CoreError::Configuration(
                "backend.api_url is empty. Provide a non-empty base url.".to_owned(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.request_timeout)
            .default_headers(headers)
            .build()
            .map_err(|error| {
                CoreError::Configuration(format!("failed to build helpdesk HTTP client: {error}"))
            })?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &HttpBackendConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> String {
        let base = self.config.api_url.trim_end_matches('/');
        let suffix = path.trim_start_matches('/');
        format!("{base}/{suffix}")
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> CoreResult<T> {
        let body = self.request_text(request).await?;
        serde_json::from_str(&body).map_err(|error| {
            CoreError::Backend(format!("helpdesk API response was malformed JSON: {error}"))
        })
    }

    async fn request_status_only(&self, request: reqwest::RequestBuilder) -> CoreResult<()> {
        self.request_text(request).await.map(|_| ())
    }

    async fn request_text(&self, request: reqwest::RequestBuilder) -> CoreResult<String> {
        let response = request
            .send()
            .await
            .map_err(|error| CoreError::Backend(format!("helpdesk API request failed: {error}")))?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            CoreError::Backend(format!("helpdesk API response read failed: {error}"))
        })?;

        if status.is_success() {
            return Ok(body);
        }

        // The backend reports failures as {"error": "..."}; fall back to the
        // raw body when it does not.
        let detail = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|payload| {
                payload
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| format!("helpdesk API request failed with status {status}: {body}"));
        Err(CoreError::Backend(detail))
    }
}

#[async_trait]
impl HelpdeskBackend for HttpHelpdeskBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn health_check(&self) -> CoreResult<()> {
        self.request_status_only(self.client.get(self.endpoint("tickets")))
            .await
    }

    async fn login(&self, request: LoginRequest) -> CoreResult<LoginOutcome> {
        debug!(email = %request.email, "logging in against helpdesk backend");
        self.request_json(self.client.post(self.endpoint("login")).json(&request))
            .await
    }

    async fn list_tickets(&self) -> CoreResult<Vec<Ticket>> {
        self.request_json(self.client.get(self.endpoint("tickets")))
            .await
    }

    async fn create_ticket(&self, request: CreateTicketRequest) -> CoreResult<Ticket> {
        self.request_json(self.client.post(self.endpoint("tickets")).json(&request))
            .await
    }

    async fn update_ticket(&self, id: &str, request: UpdateTicketRequest) -> CoreResult<()> {
        self.request_status_only(
            self.client
                .put(self.endpoint(&format!("tickets/{id}")))
                .json(&request),
        )
        .await
    }

    async fn message_history(&self, ticket_id: &str) -> CoreResult<Vec<ChatMessage>> {
        self.request_json(self.client.get(self.endpoint(&format!("messages/{ticket_id}"))))
            .await
    }

    async fn ticket_files(&self, ticket_id: &str) -> CoreResult<Vec<FileDescriptor>> {
        let records: Vec<Value> = self
            .request_json(
                self.client
                    .get(self.endpoint(&format!("tickets/{ticket_id}/files"))),
            )
            .await?;
        Ok(records
            .iter()
            .map(|record| files::normalize_file_record(record, &self.config.api_url))
            .collect())
    }

    async fn register_worker(&self, request: RegisterWorkerRequest) -> CoreResult<()> {
        self.request_status_only(self.client.post(self.endpoint("workers")).json(&request))
            .await
    }

    async fn register_building(&self, request: RegisterBuildingRequest) -> CoreResult<()> {
        self.request_status_only(self.client.post(self.endpoint("buildings")).json(&request))
            .await
    }

    async fn register_customer(&self, request: RegisterCustomerRequest) -> CoreResult<()> {
        self.request_status_only(self.client.post(self.endpoint("customers")).json(&request))
            .await
    }
}
