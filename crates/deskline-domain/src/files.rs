use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Image,
    Other,
}

impl MediaKind {
    /// Classification is by uri extension only; the backend does not send a
    /// content type for ticket files.
    pub fn from_uri(uri: &str) -> Self {
        let lower = uri.to_ascii_lowercase();
        if lower.ends_with(".jpg") || lower.ends_with(".jpeg") || lower.ends_with(".png") {
            Self::Image
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    pub uri: String,
    pub media_kind: MediaKind,
}

impl FileDescriptor {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let media_kind = MediaKind::from_uri(&uri);
        Self {
            name: name.into(),
            uri,
            media_kind,
        }
    }
}
