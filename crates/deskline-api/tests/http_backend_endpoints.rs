use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use deskline_api::{
    CreateTicketRequest, HelpdeskBackend, HttpBackendConfig, HttpHelpdeskBackend, LoginRequest,
    RegisterWorkerRequest, UpdateTicketRequest,
};
use deskline_domain::{CoreError, MediaKind, TicketStatus};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

const TEST_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Clone, Default)]
struct MockState {
    updated_tickets: Arc<Mutex<Vec<(String, Value)>>>,
    registered_workers: Arc<Mutex<Vec<Value>>>,
}

async fn login(Json(request): Json<Value>) -> (StatusCode, Json<Value>) {
    let email = request.get("email").and_then(Value::as_str).unwrap_or("");
    let password = request
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or("");
    if email == "sanne@osius.nl" && password == "hunter2" {
        (
            StatusCode::OK,
            Json(json!({"userType": "worker", "name": "Sanne", "id": "w-7"})),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid credentials"})),
        )
    }
}

async fn list_tickets() -> Json<Value> {
    Json(json!([
        {
            "id": "64f1",
            "ticketId": "T-101",
            "title": "Leaking radiator",
            "description": "Water under the hallway radiator.",
            "Customer": "Jansen BV",
            "date": "2026-01-09",
            "building": "Keizersgracht 12",
            "status": "ToDo",
            "notificationType": "Klacht"
        },
        {
            "id": "64f2",
            "ticketId": "T-102",
            "title": "Replace entrance lock",
            "date": "2026-01-10",
            "status": "somethingNew"
        }
    ]))
}

async fn create_ticket(Json(request): Json<Value>) -> (StatusCode, Json<Value>) {
    let mut ticket = request;
    ticket["id"] = json!("64f9");
    ticket["ticketId"] = json!("T-109");
    ticket["date"] = json!("2026-01-12");
    (StatusCode::CREATED, Json(ticket))
}

async fn update_ticket(
    State(state): State<MockState>,
    Path(id): Path<String>,
    Json(request): Json<Value>,
) -> StatusCode {
    state
        .updated_tickets
        .lock()
        .expect("updated tickets lock")
        .push((id, request));
    StatusCode::OK
}

async fn message_history(Path(ticket_id): Path<String>) -> Json<Value> {
    Json(json!([
        {
            "ticket_id": ticket_id,
            "sender": "Support",
            "text": "We ordered the part.",
            "created_at": "2026-01-10T09:12:00+01:00"
        }
    ]))
}

async fn ticket_files() -> Json<Value> {
    Json(json!([
        {"Filename": "roof plan.png", "fileUrl": "http://localhost:8080/uploads/roof plan.png"},
        {"url": "https://cdn.example.net/report.pdf"}
    ]))
}

async fn register_worker(
    State(state): State<MockState>,
    Json(request): Json<Value>,
) -> StatusCode {
    state
        .registered_workers
        .lock()
        .expect("registered workers lock")
        .push(request);
    StatusCode::CREATED
}

async fn spawn_mock_server() -> (String, MockState, oneshot::Sender<()>, tokio::task::JoinHandle<()>)
{
    let state = MockState::default();
    let app = Router::new()
        .route("/login", post(login))
        .route("/tickets", get(list_tickets).post(create_ticket))
        .route("/tickets/{id}", put(update_ticket))
        .route("/tickets/{id}/files", get(ticket_files))
        .route("/messages/{ticket_id}", get(message_history))
        .route("/workers", post(register_worker))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind mock server listener");
    let address: SocketAddr = listener.local_addr().expect("mock listener local addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let handle = tokio::spawn(async move {
        let server = axum::serve(listener, app).with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        });
        server.await.expect("run mock server");
    });
    (format!("http://{address}"), state, shutdown_tx, handle)
}

fn backend_for(base_url: &str) -> HttpHelpdeskBackend {
    let config = HttpBackendConfig::from_settings(base_url, TEST_TIMEOUT)
        .expect("mock server backend config");
    HttpHelpdeskBackend::new(config).expect("http backend")
}

#[tokio::test]
async fn login_decodes_session_and_surfaces_backend_error_detail() {
    let (base_url, _state, shutdown_tx, server_task) = spawn_mock_server().await;
    let backend = backend_for(&base_url);

    let outcome = backend
        .login(LoginRequest::new("sanne@osius.nl", "hunter2"))
        .await
        .expect("login succeeds");
    let session = outcome.into_session();
    assert_eq!(session.name, "Sanne");
    assert_eq!(session.id, "w-7");
    assert!(!session.is_admin());

    let error = backend
        .login(LoginRequest::new("sanne@osius.nl", "wrong"))
        .await
        .expect_err("bad password is rejected");
    match error {
        CoreError::Backend(detail) => assert_eq!(detail, "Invalid credentials"),
        other => panic!("unexpected error variant: {other:?}"),
    }

    let _ = shutdown_tx.send(());
    let _ = server_task.await;
}

#[tokio::test]
async fn list_tickets_tolerates_sparse_records_and_unknown_statuses() {
    let (base_url, _state, shutdown_tx, server_task) = spawn_mock_server().await;
    let backend = backend_for(&base_url);

    let tickets = backend.list_tickets().await.expect("list tickets");
    assert_eq!(tickets.len(), 2);

    let full = &tickets[0];
    assert_eq!(full.ticket_id, "T-101");
    assert_eq!(full.customer, "Jansen BV");
    assert_eq!(full.status, TicketStatus::Todo);

    let sparse = &tickets[1];
    assert!(sparse.customer.is_empty());
    assert!(sparse.notification_type.is_empty());
    assert_eq!(sparse.status, TicketStatus::Todo);

    let _ = shutdown_tx.send(());
    let _ = server_task.await;
}

#[tokio::test]
async fn create_and_update_round_trip_through_the_ticket_endpoints() {
    let (base_url, state, shutdown_tx, server_task) = spawn_mock_server().await;
    let backend = backend_for(&base_url);

    let created = backend
        .create_ticket(CreateTicketRequest {
            title: "Broken intercom".to_owned(),
            description: "Unit 3B cannot hear callers.".to_owned(),
            customer: "Jansen BV".to_owned(),
            building: String::new(),
            status: TicketStatus::Todo,
            notification_type: "Klacht".to_owned(),
        })
        .await
        .expect("create ticket");
    assert_eq!(created.ticket_id, "T-109");
    assert_eq!(created.title, "Broken intercom");
    assert!(created.building.is_empty());

    backend
        .update_ticket(
            "64f9",
            UpdateTicketRequest::status_transition(TicketStatus::Done),
        )
        .await
        .expect("update ticket");

    let updates = state
        .updated_tickets
        .lock()
        .expect("updated tickets lock")
        .clone();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, "64f9");
    assert_eq!(updates[0].1, json!({"status": "done"}));

    let _ = shutdown_tx.send(());
    let _ = server_task.await;
}

#[tokio::test]
async fn message_history_is_fetched_per_ticket() {
    let (base_url, _state, shutdown_tx, server_task) = spawn_mock_server().await;
    let backend = backend_for(&base_url);

    let history = backend
        .message_history("T-101")
        .await
        .expect("message history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].ticket_id, "T-101");
    assert_eq!(history[0].sender, "Support");

    let _ = shutdown_tx.send(());
    let _ = server_task.await;
}

#[tokio::test]
async fn ticket_files_are_normalized_before_they_reach_the_caller() {
    let (base_url, _state, shutdown_tx, server_task) = spawn_mock_server().await;
    let backend = backend_for(&base_url);

    let files = backend.ticket_files("T-101").await.expect("ticket files");
    assert_eq!(files.len(), 2);

    let image = &files[0];
    assert_eq!(image.name, "roof plan.png");
    assert_eq!(image.media_kind, MediaKind::Image);
    assert_eq!(image.uri, format!("{base_url}/uploads/roof%20plan.png"));

    let document = &files[1];
    assert_eq!(document.name, "Unnamed");
    assert_eq!(document.media_kind, MediaKind::Other);
    assert_eq!(document.uri, "https://cdn.example.net/report.pdf");

    let _ = shutdown_tx.send(());
    let _ = server_task.await;
}

#[tokio::test]
async fn register_worker_posts_the_expected_payload() {
    let (base_url, state, shutdown_tx, server_task) = spawn_mock_server().await;
    let backend = backend_for(&base_url);

    backend
        .register_worker(RegisterWorkerRequest {
            name: "Sanne".to_owned(),
            email: "sanne@osius.nl".to_owned(),
            password: "hunter2".to_owned(),
        })
        .await
        .expect("register worker");

    let registered = state
        .registered_workers
        .lock()
        .expect("registered workers lock")
        .clone();
    assert_eq!(registered.len(), 1);
    assert_eq!(
        registered[0],
        json!({"name": "Sanne", "email": "sanne@osius.nl", "password": "hunter2"})
    );

    let _ = shutdown_tx.send(());
    let _ = server_task.await;
}
