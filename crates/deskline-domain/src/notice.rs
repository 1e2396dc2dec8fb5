use crate::error::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}

/// Transient toast-style message drawn over the current screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn warn(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warn,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

impl From<&CoreError> for Notice {
    fn from(value: &CoreError) -> Self {
        match value {
            CoreError::Connectivity(_) | CoreError::Validation(_) => Self::warn(value.to_string()),
            _ => Self::error(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Notice, NoticeLevel};
    use crate::error::CoreError;

    #[test]
    fn connectivity_errors_surface_as_warnings() {
        let notice = Notice::from(&CoreError::Connectivity("not connected".to_owned()));
        assert_eq!(notice.level, NoticeLevel::Warn);
    }

    #[test]
    fn backend_errors_surface_as_errors() {
        let notice = Notice::from(&CoreError::Backend("500".to_owned()));
        assert_eq!(notice.level, NoticeLevel::Error);
    }
}
