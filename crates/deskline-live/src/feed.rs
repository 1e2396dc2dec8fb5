use std::collections::HashMap;

use chrono::Local;
use deskline_domain::{ChatMessage, CoreResult, FeedMessage, FileAttachment, FileDescriptor};
use uuid::Uuid;

use crate::channel::{LiveChannel, LiveSender};

/// Text carried by a message whose payload is the file itself.
pub const FILE_MESSAGE_TEXT: &str = "Sent a file";

const LOCAL_SENDER: &str = "You";

/// Outbound seam for the feed. In production this is the [`LiveChannel`];
/// tests script delivery outcomes.
pub trait MessageTransmitter: Send + Sync {
    fn transmit(&self, message: ChatMessage) -> CoreResult<()>;
}

impl MessageTransmitter for LiveChannel {
    fn transmit(&self, message: ChatMessage) -> CoreResult<()> {
        self.send(message)
    }
}

impl MessageTransmitter for LiveSender {
    fn transmit(&self, message: ChatMessage) -> CoreResult<()> {
        self.send(message)
    }
}

/// What a push did to the feed, so the caller can decide whether to
/// follow the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushOutcome {
    pub ticket_id: String,
    pub reconciled: bool,
    pub scroll_to_latest: bool,
}

/// Per-ticket message lists plus the optimistic-send bookkeeping. All
/// mutation happens on the caller's event loop; pushes re-enter through
/// [`MessageFeed::apply_push`].
#[derive(Debug, Default)]
pub struct MessageFeed {
    lists: HashMap<String, Vec<FeedMessage>>,
    open_ticket: Option<String>,
}

impl MessageFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, ticket_id: &str) {
        self.open_ticket = Some(ticket_id.to_owned());
    }

    pub fn close(&mut self) {
        self.open_ticket = None;
    }

    pub fn open_ticket(&self) -> Option<&str> {
        self.open_ticket.as_deref()
    }

    pub fn messages(&self, ticket_id: &str) -> &[FeedMessage] {
        self.lists.get(ticket_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Result of a history fetch replaces the cached list wholesale.
    /// This is also the dedup point for anything re-shown across a
    /// reconnect window.
    pub fn replace_history(&mut self, ticket_id: &str, history: &[ChatMessage]) {
        let list = history
            .iter()
            .map(|message| FeedMessage::from_wire(message, true))
            .collect();
        self.lists.insert(ticket_id.to_owned(), list);
    }

    /// Sends `text` over the transmitter and appends it optimistically.
    /// A refused transmit leaves the feed untouched so the caller can
    /// keep the draft.
    pub fn send(
        &mut self,
        transmitter: &dyn MessageTransmitter,
        ticket_id: &str,
        text: impl Into<String>,
    ) -> CoreResult<()> {
        let message = outgoing_message(ticket_id, text.into(), None);
        transmitter.transmit(message.clone())?;
        self.append_pending(&message);
        Ok(())
    }

    pub fn send_file(
        &mut self,
        transmitter: &dyn MessageTransmitter,
        ticket_id: &str,
        descriptor: &FileDescriptor,
    ) -> CoreResult<()> {
        let message = outgoing_message(
            ticket_id,
            FILE_MESSAGE_TEXT.to_owned(),
            Some(FileAttachment::from(descriptor)),
        );
        transmitter.transmit(message.clone())?;
        self.append_pending(&message);
        Ok(())
    }

    /// Applies one pushed message. The echo of an own send is reconciled
    /// in place; everything else is appended to its ticket's list, open
    /// or not.
    pub fn apply_push(&mut self, message: &ChatMessage) -> PushOutcome {
        let list = self.lists.entry(message.ticket_id.clone()).or_default();

        let reconciled = message
            .correlation_id
            .as_deref()
            .and_then(|correlation_id| {
                list.iter_mut().find(|entry| {
                    !entry.delivered && entry.correlation_id.as_deref() == Some(correlation_id)
                })
            })
            .map(|pending| {
                pending.delivered = true;
            })
            .is_some();

        if !reconciled {
            list.push(FeedMessage::from_wire(message, true));
        }

        PushOutcome {
            ticket_id: message.ticket_id.clone(),
            reconciled,
            scroll_to_latest: self.open_ticket.as_deref() == Some(message.ticket_id.as_str()),
        }
    }

    fn append_pending(&mut self, message: &ChatMessage) {
        self.lists
            .entry(message.ticket_id.clone())
            .or_default()
            .push(FeedMessage::from_wire(message, false));
    }
}

fn outgoing_message(ticket_id: &str, text: String, file: Option<FileAttachment>) -> ChatMessage {
    ChatMessage {
        ticket_id: ticket_id.to_owned(),
        sender: LOCAL_SENDER.to_owned(),
        text,
        created_at: Local::now().to_rfc3339(),
        file,
        correlation_id: Some(Uuid::new_v4().to_string()),
    }
}
