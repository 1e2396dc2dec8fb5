use serde::{Deserialize, Serialize};

/// Ticket lifecycle bucket. The backend emits inconsistent casing per
/// variant, so wire mapping goes through strings instead of serde renames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TicketStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TicketStatus {
    pub const ALL: [TicketStatus; 3] = [Self::Todo, Self::InProgress, Self::Done];

    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::Todo => "ToDo",
            Self::InProgress => "inProgress",
            Self::Done => "done",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Todo => "To Do",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }
}

impl From<String> for TicketStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "inProgress" | "InProgress" | "in_progress" => Self::InProgress,
            "done" | "Done" => Self::Done,
            // Unknown states land in the first column rather than failing
            // the whole list decode.
            _ => Self::Todo,
        }
    }
}

impl From<TicketStatus> for String {
    fn from(value: TicketStatus) -> Self {
        value.wire_name().to_owned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    #[serde(rename = "ticketId")]
    pub ticket_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "Customer", default)]
    pub customer: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub building: String,
    #[serde(default)]
    pub status: TicketStatus,
    #[serde(rename = "notificationType", default)]
    pub notification_type: String,
}
