use serde::{Deserialize, Serialize};

/// The three values that survive a restart. Everything else about a login
/// is re-derived from the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    pub user_type: String,
    pub name: String,
    pub id: String,
}

impl UserSession {
    pub fn is_admin(&self) -> bool {
        self.user_type.eq_ignore_ascii_case("admin")
    }
}
