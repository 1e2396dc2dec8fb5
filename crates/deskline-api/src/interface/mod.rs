use std::fmt;

use async_trait::async_trait;
use deskline_domain::{
    ChatMessage, CoreError, CoreResult, FileDescriptor, Ticket, TicketStatus, UserSession,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginOutcome {
    #[serde(rename = "userType")]
    pub user_type: String,
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
}

impl LoginOutcome {
    /// A missing id means the backend authenticated an administrator
    /// account that predates per-user ids.
    pub fn into_session(self) -> UserSession {
        UserSession {
            user_type: self.user_type,
            name: self.name,
            id: self.id.unwrap_or_else(|| "ADMIN".to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTicketRequest {
    pub title: String,
    pub description: String,
    #[serde(rename = "Customer", skip_serializing_if = "String::is_empty")]
    pub customer: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub building: String,
    pub status: TicketStatus,
    #[serde(rename = "notificationType", skip_serializing_if = "String::is_empty")]
    pub notification_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct UpdateTicketRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TicketStatus>,
}

impl UpdateTicketRequest {
    pub fn status_transition(status: TicketStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RegisterWorkerRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterWorkerRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RegisterWorkerRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterBuildingRequest {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterCustomerRequest {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub building: String,
}

/// The remote helpdesk service as seen by this client. Implementations own
/// transport and wire details; callers deal in domain types only.
#[async_trait]
pub trait HelpdeskBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn health_check(&self) -> CoreResult<()>;
    async fn login(&self, request: LoginRequest) -> CoreResult<LoginOutcome>;
    async fn list_tickets(&self) -> CoreResult<Vec<Ticket>>;
    async fn create_ticket(&self, request: CreateTicketRequest) -> CoreResult<Ticket>;
    async fn update_ticket(&self, id: &str, request: UpdateTicketRequest) -> CoreResult<()>;
    async fn message_history(&self, ticket_id: &str) -> CoreResult<Vec<ChatMessage>>;
    async fn ticket_files(&self, ticket_id: &str) -> CoreResult<Vec<FileDescriptor>>;

    async fn register_worker(&self, _request: RegisterWorkerRequest) -> CoreResult<()> {
        Err(CoreError::Backend(format!(
            "worker registration is not supported by the {} backend",
            self.name()
        )))
    }

    async fn register_building(&self, _request: RegisterBuildingRequest) -> CoreResult<()> {
        Err(CoreError::Backend(format!(
            "building registration is not supported by the {} backend",
            self.name()
        )))
    }

    async fn register_customer(&self, _request: RegisterCustomerRequest) -> CoreResult<()> {
        Err(CoreError::Backend(format!(
            "customer registration is not supported by the {} backend",
            self.name()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::{LoginOutcome, LoginRequest, UpdateTicketRequest};
    use deskline_domain::TicketStatus;

    #[test]
    fn login_request_debug_redacts_password() {
        let request = LoginRequest::new("worker@osius.nl", "hunter2");
        let rendered = format!("{request:?}");
        assert!(rendered.contains("worker@osius.nl"));
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn login_outcome_without_id_falls_back_to_admin_marker() {
        let outcome: LoginOutcome =
            serde_json::from_str(r#"{"userType": "admin", "name": "Admin"}"#)
                .expect("decode login outcome");
        let session = outcome.into_session();
        assert_eq!(session.id, "ADMIN");
        assert!(session.is_admin());
    }

    #[test]
    fn status_transition_serializes_only_the_status_field() {
        let request = UpdateTicketRequest::status_transition(TicketStatus::Done);
        let rendered = serde_json::to_string(&request).expect("serialize update");
        assert_eq!(rendered, r#"{"status":"done"}"#);
    }
}
