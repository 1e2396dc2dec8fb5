mod error;
mod files;
mod message;
mod notice;
mod session;
mod ticket;

pub use error::{CoreError, CoreResult};
pub use files::{FileDescriptor, MediaKind};
pub use message::{ChatMessage, FeedMessage, FileAttachment};
pub use notice::{Notice, NoticeLevel};
pub use session::UserSession;
pub use ticket::{Ticket, TicketStatus};
