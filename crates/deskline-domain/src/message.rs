use chrono::DateTime;
use serde::{Deserialize, Serialize};

use crate::files::{FileDescriptor, MediaKind};

/// Wire form of a file carried inside a chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub name: String,
    pub uri: String,
    #[serde(rename = "type")]
    pub media_type: String,
}

impl From<&FileAttachment> for FileDescriptor {
    fn from(value: &FileAttachment) -> Self {
        FileDescriptor::new(value.name.clone(), value.uri.clone())
    }
}

impl From<&FileDescriptor> for FileAttachment {
    fn from(value: &FileDescriptor) -> Self {
        let media_type = match value.media_kind {
            MediaKind::Image => "image",
            MediaKind::Other => "file",
        };
        Self {
            name: value.name.clone(),
            uri: value.uri.clone(),
            media_type: media_type.to_owned(),
        }
    }
}

/// One chat message as exchanged with the backend, both over the history
/// endpoint and as a push frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub ticket_id: String,
    pub sender: String,
    pub text: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileAttachment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
}

/// Display form of a chat message. `time` is HH:MM:SS in the timestamp's
/// own offset; an unparseable timestamp is shown as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMessage {
    pub sender: String,
    pub text: String,
    pub time: String,
    pub file: Option<FileDescriptor>,
    pub delivered: bool,
    pub correlation_id: Option<String>,
}

impl FeedMessage {
    pub fn from_wire(message: &ChatMessage, delivered: bool) -> Self {
        Self {
            sender: message.sender.clone(),
            text: message.text.clone(),
            time: format_clock_time(&message.created_at),
            file: message.file.as_ref().map(FileDescriptor::from),
            delivered,
            correlation_id: message.correlation_id.clone(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.sender == "You"
    }
}

pub(crate) fn format_clock_time(created_at: &str) -> String {
    match DateTime::parse_from_rfc3339(created_at) {
        Ok(parsed) => parsed.format("%H:%M:%S").to_string(),
        Err(_) => created_at.to_owned(),
    }
}
