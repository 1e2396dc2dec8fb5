use deskline_domain::{
    ChatMessage, CoreResult, FileDescriptor, Ticket, TicketStatus, UserSession,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::warn;

/// Results of dispatched async work, delivered back to the UI thread
/// through the event channel. One variant per backend call plus the
/// live push stream.
#[derive(Debug)]
pub enum UiEvent {
    LoginFinished(CoreResult<UserSession>),
    TicketsLoaded(CoreResult<Vec<Ticket>>),
    TicketUpdated {
        id: String,
        status: TicketStatus,
        result: CoreResult<()>,
    },
    HistoryLoaded {
        ticket_id: String,
        result: CoreResult<Vec<ChatMessage>>,
    },
    FilesLoaded {
        ticket_id: String,
        result: CoreResult<Vec<FileDescriptor>>,
    },
    Push(ChatMessage),
}

/// Bridges the live channel's broadcast stream onto the UI event
/// channel. Ends when either side goes away; a lagged subscriber skips
/// the overwritten messages and keeps going.
pub fn forward_pushes(
    mut pushes: broadcast::Receiver<ChatMessage>,
    events: mpsc::UnboundedSender<UiEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match pushes.recv().await {
                Ok(message) => {
                    if events.send(UiEvent::Push(message)).is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "push subscriber lagged behind the live channel");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
