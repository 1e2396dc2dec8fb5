use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Local;
use deskline_domain::{
    ChatMessage, CoreError, CoreResult, FileDescriptor, Ticket, TicketStatus,
};

use crate::interface::{
    CreateTicketRequest, HelpdeskBackend, LoginOutcome, LoginRequest, RegisterBuildingRequest,
    RegisterCustomerRequest, RegisterWorkerRequest, UpdateTicketRequest,
};

/// In-memory stand-in for the hosted helpdesk service. Useful for demos
/// and for driving the UI without network access; state lives for the
/// lifetime of the process only.
#[derive(Debug, Clone)]
pub struct DemoHelpdeskBackend {
    state: Arc<Mutex<DemoState>>,
}

#[derive(Debug)]
struct DemoState {
    tickets: Vec<Ticket>,
    messages: Vec<ChatMessage>,
    files: Vec<(String, FileDescriptor)>,
    next_ticket_number: u32,
}

impl Default for DemoHelpdeskBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DemoHelpdeskBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DemoState::seeded())),
        }
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, DemoState> {
        self.state
            .lock()
            .expect("demo helpdesk state lock poisoned")
    }
}

impl DemoState {
    fn seeded() -> Self {
        let tickets = vec![
            demo_ticket(
                "d-1",
                "T-101",
                "Leaking radiator in hallway",
                "Water is pooling under the radiator on the second floor.",
                "Jansen BV",
                "Keizersgracht 12",
                TicketStatus::Todo,
                "Klacht",
            ),
            demo_ticket(
                "d-2",
                "T-102",
                "Replace entrance lock",
                "The front door lock sticks when it is cold outside.",
                "De Vries Beheer",
                "Stationsplein 4",
                TicketStatus::InProgress,
                "Vraag",
            ),
            demo_ticket(
                "d-3",
                "T-103",
                "Elevator inspection",
                "Yearly inspection booked, waiting on the report.",
                "Jansen BV",
                "Keizersgracht 12",
                TicketStatus::InProgress,
                "Comentaar",
            ),
            demo_ticket(
                "d-4",
                "T-104",
                "Repainted stairwell",
                "Stairwell repainted, tenants are happy with the result.",
                "Bakker Vastgoed",
                "Marktstraat 9",
                TicketStatus::Done,
                "Complimenten",
            ),
        ];

        let messages = vec![
            demo_message("T-102", "Support", "We ordered a replacement cylinder.", "2026-01-10T09:12:00+01:00"),
            demo_message("T-102", "You", "Great, the tenant will be home all week.", "2026-01-10T09:15:30+01:00"),
            demo_message("T-103", "Support", "Inspector is scheduled for Thursday.", "2026-01-11T14:02:10+01:00"),
        ];

        let files = vec![
            (
                "T-101".to_owned(),
                FileDescriptor::new(
                    "radiator.jpg",
                    "https://api-osius.up.railway.app/uploads/radiator.jpg",
                ),
            ),
            (
                "T-103".to_owned(),
                FileDescriptor::new(
                    "inspection-report.pdf",
                    "https://api-osius.up.railway.app/uploads/inspection-report.pdf",
                ),
            ),
        ];

        Self {
            tickets,
            messages,
            files,
            next_ticket_number: 105,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn demo_ticket(
    id: &str,
    ticket_id: &str,
    title: &str,
    description: &str,
    customer: &str,
    building: &str,
    status: TicketStatus,
    notification_type: &str,
) -> Ticket {
    Ticket {
        id: id.to_owned(),
        ticket_id: ticket_id.to_owned(),
        title: title.to_owned(),
        description: description.to_owned(),
        customer: customer.to_owned(),
        date: "2026-01-09".to_owned(),
        building: building.to_owned(),
        status,
        notification_type: notification_type.to_owned(),
    }
}

fn demo_message(ticket_id: &str, sender: &str, text: &str, created_at: &str) -> ChatMessage {
    ChatMessage {
        ticket_id: ticket_id.to_owned(),
        sender: sender.to_owned(),
        text: text.to_owned(),
        created_at: created_at.to_owned(),
        file: None,
        correlation_id: None,
    }
}

#[async_trait]
impl HelpdeskBackend for DemoHelpdeskBackend {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn health_check(&self) -> CoreResult<()> {
        Ok(())
    }

    async fn login(&self, request: LoginRequest) -> CoreResult<LoginOutcome> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(CoreError::Validation(
                "email and password are required".to_owned(),
            ));
        }
        let name = request
            .email
            .split('@')
            .next()
            .filter(|part| !part.is_empty())
            .unwrap_or("Demo Worker")
            .to_owned();
        Ok(LoginOutcome {
            user_type: "worker".to_owned(),
            name,
            id: Some("demo-worker-1".to_owned()),
        })
    }

    async fn list_tickets(&self) -> CoreResult<Vec<Ticket>> {
        Ok(self.lock_state().tickets.clone())
    }

    async fn create_ticket(&self, request: CreateTicketRequest) -> CoreResult<Ticket> {
        let mut state = self.lock_state();
        let number = state.next_ticket_number;
        state.next_ticket_number += 1;

        let ticket = Ticket {
            id: format!("d-{number}"),
            ticket_id: format!("T-{number}"),
            title: request.title,
            description: request.description,
            customer: request.customer,
            date: Local::now().format("%Y-%m-%d").to_string(),
            building: request.building,
            status: request.status,
            notification_type: request.notification_type,
        };
        state.tickets.push(ticket.clone());
        Ok(ticket)
    }

    async fn update_ticket(&self, id: &str, request: UpdateTicketRequest) -> CoreResult<()> {
        let mut state = self.lock_state();
        let ticket = state
            .tickets
            .iter_mut()
            .find(|ticket| ticket.id == id || ticket.ticket_id == id)
            .ok_or_else(|| CoreError::Backend(format!("no demo ticket with id {id}")))?;

        if let Some(title) = request.title {
            ticket.title = title;
        }
        if let Some(description) = request.description {
            ticket.description = description;
        }
        if let Some(status) = request.status {
            ticket.status = status;
        }
        Ok(())
    }

    async fn message_history(&self, ticket_id: &str) -> CoreResult<Vec<ChatMessage>> {
        Ok(self
            .lock_state()
            .messages
            .iter()
            .filter(|message| message.ticket_id == ticket_id)
            .cloned()
            .collect())
    }

    async fn ticket_files(&self, ticket_id: &str) -> CoreResult<Vec<FileDescriptor>> {
        Ok(self
            .lock_state()
            .files
            .iter()
            .filter(|(owner, _)| owner == ticket_id)
            .map(|(_, descriptor)| descriptor.clone())
            .collect())
    }

    async fn register_worker(&self, request: RegisterWorkerRequest) -> CoreResult<()> {
        if request.email.trim().is_empty() {
            return Err(CoreError::Validation("worker email is required".to_owned()));
        }
        Ok(())
    }

    async fn register_building(&self, request: RegisterBuildingRequest) -> CoreResult<()> {
        if request.name.trim().is_empty() {
            return Err(CoreError::Validation("building name is required".to_owned()));
        }
        Ok(())
    }

    async fn register_customer(&self, request: RegisterCustomerRequest) -> CoreResult<()> {
        if request.name.trim().is_empty() {
            return Err(CoreError::Validation("customer name is required".to_owned()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::DemoHelpdeskBackend;
    use crate::interface::{
        CreateTicketRequest, HelpdeskBackend, LoginRequest, UpdateTicketRequest,
    };
    use deskline_domain::TicketStatus;
    use std::time::Duration;

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn seeded_tickets_cover_every_status_column() {
        let backend = DemoHelpdeskBackend::new();
        let tickets = tokio::time::timeout(TEST_TIMEOUT, backend.list_tickets())
            .await
            .expect("list within timeout")
            .expect("list tickets");

        for status in TicketStatus::ALL {
            assert!(
                tickets.iter().any(|ticket| ticket.status == status),
                "missing seeded ticket for {status:?}"
            );
        }
    }

    #[tokio::test]
    async fn create_then_update_moves_a_ticket_through_statuses() {
        let backend = DemoHelpdeskBackend::new();
        let created = backend
            .create_ticket(CreateTicketRequest {
                title: "Broken intercom".to_owned(),
                description: "Unit 3B cannot hear callers.".to_owned(),
                customer: "Jansen BV".to_owned(),
                building: "Keizersgracht 12".to_owned(),
                status: TicketStatus::Todo,
                notification_type: "Klacht".to_owned(),
            })
            .await
            .expect("create ticket");
        assert_eq!(created.ticket_id, "T-105");
        assert_eq!(created.status, TicketStatus::Todo);

        backend
            .update_ticket(
                &created.id,
                UpdateTicketRequest::status_transition(TicketStatus::InProgress),
            )
            .await
            .expect("update ticket");

        let tickets = backend.list_tickets().await.expect("list tickets");
        let updated = tickets
            .iter()
            .find(|ticket| ticket.id == created.id)
            .expect("created ticket is listed");
        assert_eq!(updated.status, TicketStatus::InProgress);
    }

    #[tokio::test]
    async fn message_history_is_scoped_to_the_requested_ticket() {
        let backend = DemoHelpdeskBackend::new();
        let history = backend
            .message_history("T-102")
            .await
            .expect("message history");
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|message| message.ticket_id == "T-102"));

        let empty = backend
            .message_history("T-999")
            .await
            .expect("empty history");
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn login_rejects_blank_credentials_and_derives_a_name() {
        let backend = DemoHelpdeskBackend::new();
        backend
            .login(LoginRequest::new("  ", "secret"))
            .await
            .expect_err("blank email is rejected");

        let outcome = backend
            .login(LoginRequest::new("sanne@osius.nl", "secret"))
            .await
            .expect("login succeeds");
        assert_eq!(outcome.name, "sanne");
        assert_eq!(outcome.user_type, "worker");
    }

    #[tokio::test]
    async fn register_endpoints_accept_wellformed_requests() {
        let backend = DemoHelpdeskBackend::new();
        backend
            .register_building(crate::interface::RegisterBuildingRequest {
                name: "Marktstraat 9".to_owned(),
                address: "Marktstraat 9, Utrecht".to_owned(),
            })
            .await
            .expect("register building");

        backend
            .register_building(crate::interface::RegisterBuildingRequest {
                name: " ".to_owned(),
                address: String::new(),
            })
            .await
            .expect_err("blank building name is rejected");
    }
}
