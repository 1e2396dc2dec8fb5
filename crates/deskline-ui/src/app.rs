use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use deskline_api::{HelpdeskBackend, LoginOutcome, LoginRequest, UpdateTicketRequest};
use deskline_domain::{
    CoreError, FileDescriptor, Notice, Ticket, TicketStatus, UserSession,
};
use deskline_live::{ChannelState, MessageFeed, MessageTransmitter};
use deskline_session::SessionStore;
use tokio::runtime::Handle as TokioHandle;
use tokio::sync::{mpsc, watch};
use tracing::info;

use crate::events::UiEvent;
use crate::input::InputField;
use crate::notices::NoticeQueue;

/// Hardwired administrator account; the backend never sees it.
const ADMIN_EMAIL: &str = "admin@osius.nl";
const ADMIN_PASSWORD: &str = "admin";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    Main,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MainTab {
    Dashboard,
    Tickets,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewOptions {
    pub notice_ttl: Duration,
    pub description_preview_lines: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoginFocus {
    Email,
    Password,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoginForm {
    pub(crate) email: InputField,
    pub(crate) password: InputField,
    pub(crate) focus: LoginFocus,
    pub(crate) submitting: bool,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self {
            email: InputField::default(),
            password: InputField::default(),
            focus: LoginFocus::Email,
            submitting: false,
        }
    }
}

/// View state of one opened ticket. Dropped wholesale when the detail
/// closes; the message lists live on in the feed.
#[derive(Debug)]
pub(crate) struct TicketDetail {
    pub(crate) record_id: String,
    pub(crate) ticket_id: String,
    pub(crate) history_loading: bool,
    pub(crate) files_loading: bool,
    pub(crate) files: Vec<FileDescriptor>,
    pub(crate) description_expanded: bool,
    pub(crate) draft: InputField,
    pub(crate) attach_prompt: Option<InputField>,
    pub(crate) scroll: u16,
    pub(crate) pinned: bool,
}

impl TicketDetail {
    fn new(record_id: String, ticket_id: String) -> Self {
        Self {
            record_id,
            ticket_id,
            history_loading: true,
            files_loading: true,
            files: Vec::new(),
            description_expanded: false,
            draft: InputField::default(),
            attach_prompt: None,
            scroll: 0,
            pinned: true,
        }
    }
}

/// All UI state plus the seams to the backend, the live channel, and
/// the session store. Mutation happens only on the UI thread; async
/// work re-enters through [`App::apply_event`].
pub struct App {
    backend: Arc<dyn HelpdeskBackend>,
    transmitter: Arc<dyn MessageTransmitter>,
    channel_state: watch::Receiver<ChannelState>,
    store: SessionStore,
    pub(crate) view: ViewOptions,
    events_tx: mpsc::UnboundedSender<UiEvent>,
    pub(crate) session: Option<UserSession>,
    pub(crate) screen: Screen,
    pub(crate) login: LoginForm,
    pub(crate) tab: MainTab,
    pub(crate) status_tab: TicketStatus,
    pub(crate) tickets: Vec<Ticket>,
    pub(crate) tickets_loading: bool,
    pub(crate) selected: usize,
    pub(crate) detail: Option<TicketDetail>,
    pub(crate) feed: MessageFeed,
    pub(crate) notices: NoticeQueue,
    should_quit: bool,
}

impl App {
    pub fn new(
        backend: Arc<dyn HelpdeskBackend>,
        transmitter: Arc<dyn MessageTransmitter>,
        channel_state: watch::Receiver<ChannelState>,
        store: SessionStore,
        view: ViewOptions,
        events_tx: mpsc::UnboundedSender<UiEvent>,
    ) -> Self {
        let notices = NoticeQueue::new(view.notice_ttl);
        Self {
            backend,
            transmitter,
            channel_state,
            store,
            view,
            events_tx,
            session: None,
            screen: Screen::Login,
            login: LoginForm::default(),
            tab: MainTab::Dashboard,
            status_tab: TicketStatus::Todo,
            tickets: Vec::new(),
            tickets_loading: false,
            selected: 0,
            detail: None,
            feed: MessageFeed::new(),
            notices,
            should_quit: false,
        }
    }

    /// Skips the login screen with a session restored from disk.
    pub fn resume(&mut self, session: UserSession) {
        info!(user_type = %session.user_type, "resuming persisted session");
        self.session = Some(session);
        self.screen = Screen::Main;
        self.refresh_tickets();
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub(crate) fn channel_state(&self) -> ChannelState {
        *self.channel_state.borrow()
    }

    pub(crate) fn visible_tickets(&self) -> Vec<&Ticket> {
        self.tickets
            .iter()
            .filter(|ticket| ticket.status == self.status_tab)
            .collect()
    }

    pub(crate) fn status_counts(&self) -> [(TicketStatus, usize); 3] {
        TicketStatus::ALL.map(|status| {
            let count = self
                .tickets
                .iter()
                .filter(|ticket| ticket.status == status)
                .count();
            (status, count)
        })
    }

    pub(crate) fn notification_breakdown(&self) -> Vec<(String, u64)> {
        let mut counts: BTreeMap<String, u64> = BTreeMap::new();
        for ticket in &self.tickets {
            let key = if ticket.notification_type.trim().is_empty() {
                "Other".to_owned()
            } else {
                ticket.notification_type.clone()
            };
            *counts.entry(key).or_insert(0) += 1;
        }
        let mut breakdown: Vec<(String, u64)> = counts.into_iter().collect();
        breakdown.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(&right.0)));
        breakdown
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }
        match self.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Main => self.handle_main_key(key),
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                self.login.focus = match self.login.focus {
                    LoginFocus::Email => LoginFocus::Password,
                    LoginFocus::Password => LoginFocus::Email,
                };
            }
            KeyCode::Enter => self.submit_login(),
            KeyCode::Backspace => self.focused_login_field().backspace(),
            KeyCode::Left => self.focused_login_field().move_left(),
            KeyCode::Right => self.focused_login_field().move_right(),
            KeyCode::Char(ch) => self.focused_login_field().insert(ch),
            _ => {}
        }
    }

    fn focused_login_field(&mut self) -> &mut InputField {
        match self.login.focus {
            LoginFocus::Email => &mut self.login.email,
            LoginFocus::Password => &mut self.login.password,
        }
    }

    fn handle_main_key(&mut self, key: KeyEvent) {
        let in_attach_prompt = self
            .detail
            .as_ref()
            .is_some_and(|detail| detail.attach_prompt.is_some());
        if in_attach_prompt {
            self.handle_attach_key(key);
        } else if self.detail.is_some() {
            self.handle_detail_key(key);
        } else {
            self.handle_board_key(key);
        }
    }

    fn handle_board_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('l') {
            self.logout();
            return;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::BackTab => {
                self.tab = match self.tab {
                    MainTab::Dashboard => MainTab::Tickets,
                    MainTab::Tickets => MainTab::Dashboard,
                };
            }
            KeyCode::Char('r') => self.refresh_tickets(),
            KeyCode::Left if self.tab == MainTab::Tickets => self.shift_status_tab(-1),
            KeyCode::Right if self.tab == MainTab::Tickets => self.shift_status_tab(1),
            KeyCode::Up if self.tab == MainTab::Tickets => {
                self.selected = self.selected.saturating_sub(1);
            }
            KeyCode::Down if self.tab == MainTab::Tickets => {
                let last = self.visible_tickets().len().saturating_sub(1);
                self.selected = (self.selected + 1).min(last);
            }
            KeyCode::Enter if self.tab == MainTab::Tickets => self.open_selected_ticket(),
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('d') => {
                    if let Some(detail) = self.detail.as_mut() {
                        detail.description_expanded = !detail.description_expanded;
                    }
                }
                KeyCode::Char('s') => self.cycle_detail_status(),
                KeyCode::Char('a') => {
                    if let Some(detail) = self.detail.as_mut() {
                        detail.attach_prompt = Some(InputField::default());
                    }
                }
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Esc => self.close_detail(),
            KeyCode::Enter => self.send_draft(),
            KeyCode::Up => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.pinned = false;
                    detail.scroll = detail.scroll.saturating_sub(1);
                }
            }
            KeyCode::Down => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.scroll = detail.scroll.saturating_add(1);
                }
            }
            KeyCode::End => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.pinned = true;
                }
            }
            KeyCode::Backspace => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.draft.backspace();
                }
            }
            KeyCode::Left => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.draft.move_left();
                }
            }
            KeyCode::Right => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.draft.move_right();
                }
            }
            KeyCode::Char(ch) => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.draft.insert(ch);
                }
            }
            _ => {}
        }
    }

    fn handle_attach_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                if let Some(detail) = self.detail.as_mut() {
                    detail.attach_prompt = None;
                }
            }
            KeyCode::Enter => self.confirm_attach(),
            KeyCode::Backspace => {
                if let Some(prompt) = self.attach_prompt_mut() {
                    prompt.backspace();
                }
            }
            KeyCode::Left => {
                if let Some(prompt) = self.attach_prompt_mut() {
                    prompt.move_left();
                }
            }
            KeyCode::Right => {
                if let Some(prompt) = self.attach_prompt_mut() {
                    prompt.move_right();
                }
            }
            KeyCode::Char(ch) => {
                if let Some(prompt) = self.attach_prompt_mut() {
                    prompt.insert(ch);
                }
            }
            _ => {}
        }
    }

    fn attach_prompt_mut(&mut self) -> Option<&mut InputField> {
        self.detail
            .as_mut()
            .and_then(|detail| detail.attach_prompt.as_mut())
    }

    fn submit_login(&mut self) {
        if self.login.submitting {
            return;
        }
        let email = self.login.email.value().trim().to_owned();
        let password = self.login.password.value().to_owned();
        if email.is_empty() || password.is_empty() {
            self.notices.push(Notice::from(&CoreError::Validation(
                "email and password are both required".to_owned(),
            )));
            return;
        }
        if email == ADMIN_EMAIL && password == ADMIN_PASSWORD {
            self.complete_login(UserSession {
                user_type: "admin".to_owned(),
                name: "Admin".to_owned(),
                id: "ADMIN".to_owned(),
            });
            return;
        }

        self.login.submitting = true;
        let backend = Arc::clone(&self.backend);
        self.spawn_task(async move {
            let result = backend
                .login(LoginRequest::new(email, password))
                .await
                .map(LoginOutcome::into_session);
            UiEvent::LoginFinished(result)
        });
    }

    fn complete_login(&mut self, session: UserSession) {
        if let Err(error) = self.store.store(&session) {
            self.notices.push(Notice::from(&error));
        }
        info!(user_type = %session.user_type, "logged in");
        self.session = Some(session);
        self.login = LoginForm::default();
        self.screen = Screen::Main;
        self.tab = MainTab::Dashboard;
        self.refresh_tickets();
    }

    fn refresh_tickets(&mut self) {
        if self.tickets_loading {
            return;
        }
        self.tickets_loading = true;
        let backend = Arc::clone(&self.backend);
        self.spawn_task(async move { UiEvent::TicketsLoaded(backend.list_tickets().await) });
    }

    /// Opens the selected ticket and fires one history fetch and one
    /// files fetch for it.
    fn open_selected_ticket(&mut self) {
        let Some(ticket) = self
            .visible_tickets()
            .get(self.selected)
            .map(|ticket| (*ticket).clone())
        else {
            return;
        };
        self.feed.open(&ticket.ticket_id);
        self.detail = Some(TicketDetail::new(
            ticket.id.clone(),
            ticket.ticket_id.clone(),
        ));

        let backend = Arc::clone(&self.backend);
        let ticket_id = ticket.ticket_id.clone();
        self.spawn_task(async move {
            let result = backend.message_history(&ticket_id).await;
            UiEvent::HistoryLoaded { ticket_id, result }
        });

        let backend = Arc::clone(&self.backend);
        let ticket_id = ticket.ticket_id;
        self.spawn_task(async move {
            let result = backend.ticket_files(&ticket_id).await;
            UiEvent::FilesLoaded { ticket_id, result }
        });
    }

    fn close_detail(&mut self) {
        self.feed.close();
        self.detail = None;
    }

    fn cycle_detail_status(&mut self) {
        let Some(detail) = self.detail.as_ref() else {
            return;
        };
        let Some(ticket) = self
            .tickets
            .iter()
            .find(|ticket| ticket.id == detail.record_id)
        else {
            return;
        };
        let position = TicketStatus::ALL
            .iter()
            .position(|status| *status == ticket.status)
            .unwrap_or(0);
        let next = TicketStatus::ALL[(position + 1) % TicketStatus::ALL.len()];

        let backend = Arc::clone(&self.backend);
        let id = ticket.id.clone();
        self.spawn_task(async move {
            let result = backend
                .update_ticket(&id, UpdateTicketRequest::status_transition(next))
                .await;
            UiEvent::TicketUpdated {
                id,
                status: next,
                result,
            }
        });
    }

    /// A refused send keeps the draft so nothing typed is lost.
    fn send_draft(&mut self) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        let text = detail.draft.value().trim().to_owned();
        if text.is_empty() {
            return;
        }
        let ticket_id = detail.ticket_id.clone();
        match self.feed.send(self.transmitter.as_ref(), &ticket_id, text) {
            Ok(()) => {
                detail.draft.clear();
                detail.pinned = true;
            }
            Err(error) => self.notices.push(Notice::from(&error)),
        }
    }

    fn confirm_attach(&mut self) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        let Some(prompt) = detail.attach_prompt.as_ref() else {
            return;
        };
        let path = prompt.value().trim().to_owned();
        if path.is_empty() {
            self.notices.push(Notice::from(&CoreError::Validation(
                "a file path is required to attach a file".to_owned(),
            )));
            return;
        }
        let name = std::path::Path::new(&path)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.clone());
        let descriptor = FileDescriptor::new(name, path);
        let ticket_id = detail.ticket_id.clone();
        match self
            .feed
            .send_file(self.transmitter.as_ref(), &ticket_id, &descriptor)
        {
            Ok(()) => {
                detail.attach_prompt = None;
                detail.pinned = true;
            }
            Err(error) => self.notices.push(Notice::from(&error)),
        }
    }

    fn logout(&mut self) {
        if let Err(error) = self.store.clear() {
            self.notices.push(Notice::from(&error));
        }
        info!("logged out");
        self.session = None;
        self.screen = Screen::Login;
        self.login = LoginForm::default();
        self.tab = MainTab::Dashboard;
        self.status_tab = TicketStatus::Todo;
        self.tickets.clear();
        self.tickets_loading = false;
        self.selected = 0;
        self.detail = None;
        self.feed = MessageFeed::new();
    }

    fn shift_status_tab(&mut self, delta: isize) {
        let position = TicketStatus::ALL
            .iter()
            .position(|status| *status == self.status_tab)
            .unwrap_or(0) as isize;
        let shifted = position + delta;
        if (0..TicketStatus::ALL.len() as isize).contains(&shifted) {
            self.status_tab = TicketStatus::ALL[shifted as usize];
            self.selected = 0;
        }
    }

    fn clamp_selection(&mut self) {
        let last = self.visible_tickets().len().saturating_sub(1);
        self.selected = self.selected.min(last);
    }

    pub fn apply_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::LoginFinished(result) => {
                self.login.submitting = false;
                match result {
                    Ok(session) => self.complete_login(session),
                    Err(error) => self.notices.push(Notice::from(&error)),
                }
            }
            UiEvent::TicketsLoaded(result) => {
                self.tickets_loading = false;
                match result {
                    Ok(tickets) => {
                        self.tickets = tickets;
                        self.clamp_selection();
                    }
                    Err(error) => self.notices.push(Notice::from(&error)),
                }
            }
            UiEvent::TicketUpdated { id, status, result } => match result {
                Ok(()) => {
                    if let Some(ticket) =
                        self.tickets.iter_mut().find(|ticket| ticket.id == id)
                    {
                        ticket.status = status;
                    }
                    self.clamp_selection();
                    self.notices
                        .push(Notice::info(format!("ticket moved to {}", status.label())));
                }
                Err(error) => self.notices.push(Notice::from(&error)),
            },
            UiEvent::HistoryLoaded { ticket_id, result } => match result {
                Ok(history) => {
                    self.feed.replace_history(&ticket_id, &history);
                    if let Some(detail) = self
                        .detail
                        .as_mut()
                        .filter(|detail| detail.ticket_id == ticket_id)
                    {
                        detail.history_loading = false;
                        detail.pinned = true;
                    }
                }
                Err(error) => {
                    if let Some(detail) = self
                        .detail
                        .as_mut()
                        .filter(|detail| detail.ticket_id == ticket_id)
                    {
                        detail.history_loading = false;
                    }
                    self.notices.push(Notice::from(&error));
                }
            },
            UiEvent::FilesLoaded { ticket_id, result } => match result {
                Ok(files) => {
                    if let Some(detail) = self
                        .detail
                        .as_mut()
                        .filter(|detail| detail.ticket_id == ticket_id)
                    {
                        detail.files_loading = false;
                        detail.files = files;
                    }
                }
                Err(error) => {
                    if let Some(detail) = self
                        .detail
                        .as_mut()
                        .filter(|detail| detail.ticket_id == ticket_id)
                    {
                        detail.files_loading = false;
                    }
                    self.notices.push(Notice::from(&error));
                }
            },
            UiEvent::Push(message) => {
                let outcome = self.feed.apply_push(&message);
                if outcome.scroll_to_latest {
                    if let Some(detail) = self
                        .detail
                        .as_mut()
                        .filter(|detail| detail.ticket_id == outcome.ticket_id)
                    {
                        detail.pinned = true;
                    }
                }
            }
        }
    }

    fn spawn_task<F>(&mut self, work: F)
    where
        F: Future<Output = UiEvent> + Send + 'static,
    {
        let events = self.events_tx.clone();
        match TokioHandle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    let _ = events.send(work.await);
                });
            }
            Err(_) => self.notices.push(Notice::warn(
                "background work skipped: tokio runtime is not active",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use deskline_api::{
        CreateTicketRequest, HelpdeskBackend, LoginOutcome, LoginRequest, UpdateTicketRequest,
    };
    use deskline_domain::{
        ChatMessage, CoreError, CoreResult, FileDescriptor, Ticket, TicketStatus, UserSession,
    };
    use deskline_live::{ChannelState, MessageTransmitter};
    use deskline_session::SessionStore;
    use tokio::sync::{mpsc, watch};

    use super::{App, MainTab, Screen, TicketDetail, ViewOptions};
    use crate::events::UiEvent;

    #[derive(Default)]
    struct StubBackend {
        tickets: Vec<Ticket>,
        fail_login: bool,
        login_calls: AtomicUsize,
        history_calls: AtomicUsize,
        files_calls: AtomicUsize,
        updates: Mutex<Vec<(String, UpdateTicketRequest)>>,
    }

    #[async_trait]
    impl HelpdeskBackend for StubBackend {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn health_check(&self) -> CoreResult<()> {
            Ok(())
        }

        async fn login(&self, request: LoginRequest) -> CoreResult<LoginOutcome> {
            self.login_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_login {
                return Err(CoreError::Backend("Invalid credentials".to_owned()));
            }
            Ok(LoginOutcome {
                user_type: "worker".to_owned(),
                name: request.email,
                id: Some("w-1".to_owned()),
            })
        }

        async fn list_tickets(&self) -> CoreResult<Vec<Ticket>> {
            Ok(self.tickets.clone())
        }

        async fn create_ticket(&self, _request: CreateTicketRequest) -> CoreResult<Ticket> {
            Err(CoreError::Backend("create_ticket is not scripted".to_owned()))
        }

        async fn update_ticket(&self, id: &str, request: UpdateTicketRequest) -> CoreResult<()> {
            self.updates
                .lock()
                .expect("updates lock")
                .push((id.to_owned(), request));
            Ok(())
        }

        async fn message_history(&self, ticket_id: &str) -> CoreResult<Vec<ChatMessage>> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![ChatMessage {
                ticket_id: ticket_id.to_owned(),
                sender: "Support".to_owned(),
                text: "we are on it".to_owned(),
                created_at: "2026-01-12T09:15:42+01:00".to_owned(),
                file: None,
                correlation_id: None,
            }])
        }

        async fn ticket_files(&self, _ticket_id: &str) -> CoreResult<Vec<FileDescriptor>> {
            self.files_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![FileDescriptor::new(
                "leak.png",
                "https://host/uploads/leak.png",
            )])
        }
    }

    #[derive(Default)]
    struct RecordingTransmitter {
        sent: Mutex<Vec<ChatMessage>>,
    }

    impl MessageTransmitter for RecordingTransmitter {
        fn transmit(&self, message: ChatMessage) -> CoreResult<()> {
            self.sent.lock().expect("sent lock").push(message);
            Ok(())
        }
    }

    struct RefusingTransmitter;

    impl MessageTransmitter for RefusingTransmitter {
        fn transmit(&self, _message: ChatMessage) -> CoreResult<()> {
            Err(CoreError::Connectivity(
                "live channel is not open; message was not sent".to_owned(),
            ))
        }
    }

    fn stub_ticket(id: &str, ticket_id: &str, status: TicketStatus) -> Ticket {
        Ticket {
            id: id.to_owned(),
            ticket_id: ticket_id.to_owned(),
            title: "Broken elevator".to_owned(),
            description: "Stuck between floors 2 and 3.".to_owned(),
            customer: "Sanne".to_owned(),
            date: "2026-01-12".to_owned(),
            building: "North wing".to_owned(),
            status,
            notification_type: "Klacht".to_owned(),
        }
    }

    fn test_app(
        backend: Arc<StubBackend>,
        transmitter: Arc<dyn MessageTransmitter>,
    ) -> (App, mpsc::UnboundedReceiver<UiEvent>) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (_state_tx, state_rx) = watch::channel(ChannelState::Open);
        let store = SessionStore::in_memory().expect("session store");
        let app = App::new(
            backend,
            transmitter,
            state_rx,
            store,
            ViewOptions {
                notice_ttl: Duration::from_secs(4),
                description_preview_lines: 2,
            },
            events_tx,
        );
        (app, events_rx)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut App, text: &str) {
        for ch in text.chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
    }

    fn worker_session() -> UserSession {
        UserSession {
            user_type: "worker".to_owned(),
            name: "Sanne".to_owned(),
            id: "w-7".to_owned(),
        }
    }

    #[tokio::test]
    async fn admin_shortcut_logs_in_without_touching_the_backend() {
        let backend = Arc::new(StubBackend::default());
        let (mut app, mut events) = test_app(Arc::clone(&backend), Arc::new(RecordingTransmitter::default()));

        type_text(&mut app, "admin@osius.nl");
        app.handle_key(key(KeyCode::Tab));
        type_text(&mut app, "admin");
        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.screen, Screen::Main);
        let session = app.session.as_ref().expect("session");
        assert!(session.is_admin());
        assert_eq!(backend.login_calls.load(Ordering::SeqCst), 0);
        assert!(app.store.load().expect("load").is_some());

        let event = events.recv().await.expect("tickets event");
        assert!(matches!(event, UiEvent::TicketsLoaded(Ok(_))));
    }

    #[test]
    fn empty_login_fields_surface_a_validation_notice() {
        let (mut app, _events) = test_app(
            Arc::new(StubBackend::default()),
            Arc::new(RecordingTransmitter::default()),
        );

        app.handle_key(key(KeyCode::Enter));

        assert_eq!(app.screen, Screen::Login);
        assert_eq!(app.notices.len(), 1);
    }

    #[tokio::test]
    async fn backend_login_failure_keeps_the_login_screen() {
        let backend = Arc::new(StubBackend {
            fail_login: true,
            ..StubBackend::default()
        });
        let (mut app, mut events) = test_app(backend, Arc::new(RecordingTransmitter::default()));

        type_text(&mut app, "worker@osius.nl");
        app.handle_key(key(KeyCode::Tab));
        type_text(&mut app, "hunter2");
        app.handle_key(key(KeyCode::Enter));
        assert!(app.login.submitting);

        let event = events.recv().await.expect("login event");
        app.apply_event(event);

        assert_eq!(app.screen, Screen::Login);
        assert!(!app.login.submitting);
        assert_eq!(app.notices.len(), 1);
        assert!(app.store.load().expect("load").is_none());
    }

    #[tokio::test]
    async fn opening_a_ticket_fetches_history_and_files_once() {
        let backend = Arc::new(StubBackend {
            tickets: vec![stub_ticket("64f1", "T-1", TicketStatus::Todo)],
            ..StubBackend::default()
        });
        let (mut app, mut events) = test_app(Arc::clone(&backend), Arc::new(RecordingTransmitter::default()));

        app.resume(worker_session());
        let event = events.recv().await.expect("tickets event");
        app.apply_event(event);

        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.tab, MainTab::Tickets);
        app.handle_key(key(KeyCode::Enter));

        for _ in 0..2 {
            let event = events.recv().await.expect("detail event");
            app.apply_event(event);
        }

        assert_eq!(backend.history_calls.load(Ordering::SeqCst), 1);
        assert_eq!(backend.files_calls.load(Ordering::SeqCst), 1);
        let detail = app.detail.as_ref().expect("detail");
        assert!(!detail.history_loading);
        assert!(!detail.files_loading);
        assert_eq!(detail.files.len(), 1);
        assert_eq!(app.feed.messages("T-1").len(), 1);
        assert_eq!(app.feed.open_ticket(), Some("T-1"));
    }

    #[test]
    fn refused_send_keeps_the_draft_and_raises_one_notice() {
        let (mut app, _events) = test_app(
            Arc::new(StubBackend::default()),
            Arc::new(RefusingTransmitter),
        );
        app.session = Some(worker_session());
        app.screen = Screen::Main;
        app.detail = Some(TicketDetail::new("64f1".to_owned(), "T-1".to_owned()));
        app.feed.open("T-1");

        type_text(&mut app, "on my way");
        app.handle_key(key(KeyCode::Enter));

        let detail = app.detail.as_ref().expect("detail");
        assert_eq!(detail.draft.value(), "on my way");
        assert!(app.feed.messages("T-1").is_empty());
        assert_eq!(app.notices.len(), 1);
    }

    #[test]
    fn successful_send_clears_the_draft_and_follows_the_feed() {
        let transmitter = Arc::new(RecordingTransmitter::default());
        let (mut app, _events) = test_app(Arc::new(StubBackend::default()), Arc::clone(&transmitter) as _);
        app.session = Some(worker_session());
        app.screen = Screen::Main;
        app.detail = Some(TicketDetail::new("64f1".to_owned(), "T-1".to_owned()));
        app.feed.open("T-1");

        type_text(&mut app, "on my way");
        app.handle_key(key(KeyCode::Enter));

        let detail = app.detail.as_ref().expect("detail");
        assert!(detail.draft.is_empty());
        assert!(detail.pinned);
        assert_eq!(transmitter.sent.lock().expect("sent lock").len(), 1);
        assert_eq!(app.feed.messages("T-1").len(), 1);
    }

    #[test]
    fn push_pins_the_scroll_only_for_the_open_ticket() {
        let (mut app, _events) = test_app(
            Arc::new(StubBackend::default()),
            Arc::new(RecordingTransmitter::default()),
        );
        app.session = Some(worker_session());
        app.screen = Screen::Main;
        app.detail = Some(TicketDetail::new("64f1".to_owned(), "T-1".to_owned()));
        app.feed.open("T-1");
        app.detail.as_mut().expect("detail").pinned = false;

        let foreign = ChatMessage {
            ticket_id: "T-2".to_owned(),
            sender: "Support".to_owned(),
            text: "elsewhere".to_owned(),
            created_at: "2026-01-12T09:15:42+01:00".to_owned(),
            file: None,
            correlation_id: None,
        };
        app.apply_event(UiEvent::Push(foreign.clone()));
        assert_eq!(app.feed.messages("T-2").len(), 1);
        assert!(!app.detail.as_ref().expect("detail").pinned);

        let own = ChatMessage {
            ticket_id: "T-1".to_owned(),
            ..foreign
        };
        app.apply_event(UiEvent::Push(own));
        assert!(app.detail.as_ref().expect("detail").pinned);
    }

    #[tokio::test]
    async fn status_cycle_sends_one_update_and_applies_it_on_success() {
        let backend = Arc::new(StubBackend {
            tickets: vec![stub_ticket("64f1", "T-1", TicketStatus::Todo)],
            ..StubBackend::default()
        });
        let (mut app, mut events) = test_app(Arc::clone(&backend), Arc::new(RecordingTransmitter::default()));

        app.resume(worker_session());
        let event = events.recv().await.expect("tickets event");
        app.apply_event(event);
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Enter));
        for _ in 0..2 {
            let event = events.recv().await.expect("detail event");
            app.apply_event(event);
        }

        app.handle_key(ctrl('s'));
        let event = events.recv().await.expect("update event");
        app.apply_event(event);

        let updates = backend.updates.lock().expect("updates lock");
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "64f1");
        assert_eq!(updates[0].1.status, Some(TicketStatus::InProgress));
        assert_eq!(app.tickets[0].status, TicketStatus::InProgress);
    }

    #[tokio::test]
    async fn logout_clears_the_persisted_session() {
        let (mut app, mut events) = test_app(
            Arc::new(StubBackend::default()),
            Arc::new(RecordingTransmitter::default()),
        );

        type_text(&mut app, "admin@osius.nl");
        app.handle_key(key(KeyCode::Tab));
        type_text(&mut app, "admin");
        app.handle_key(key(KeyCode::Enter));
        let event = events.recv().await.expect("tickets event");
        app.apply_event(event);

        app.handle_key(ctrl('l'));

        assert_eq!(app.screen, Screen::Login);
        assert!(app.session.is_none());
        assert!(app.tickets.is_empty());
        assert!(app.store.load().expect("load").is_none());
    }

    #[test]
    fn dashboard_breakdown_counts_and_sorts_notification_types() {
        let (mut app, _events) = test_app(
            Arc::new(StubBackend::default()),
            Arc::new(RecordingTransmitter::default()),
        );
        app.tickets = vec![
            stub_ticket("1", "T-1", TicketStatus::Todo),
            stub_ticket("2", "T-2", TicketStatus::InProgress),
            {
                let mut ticket = stub_ticket("3", "T-3", TicketStatus::Done);
                ticket.notification_type = "Vraag".to_owned();
                ticket
            },
            {
                let mut ticket = stub_ticket("4", "T-4", TicketStatus::Done);
                ticket.notification_type = String::new();
                ticket
            },
        ];

        let counts = app.status_counts();
        assert_eq!(counts[0], (TicketStatus::Todo, 1));
        assert_eq!(counts[2], (TicketStatus::Done, 2));

        let breakdown = app.notification_breakdown();
        assert_eq!(breakdown[0], ("Klacht".to_owned(), 2));
        assert_eq!(breakdown[1], ("Other".to_owned(), 1));
        assert_eq!(breakdown[2], ("Vraag".to_owned(), 1));
    }
}
