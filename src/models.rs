use serde::Deserialize;

/// UserRecord
///
/// One entry of the user table (`users.json`). Read-only after load.
#[derive(Debug, Clone, PartialEq, Deserialize, Default)]
pub struct UserRecord {
    // Member number; matched exactly at login.
    pub id: String,
    // Display name; matched case-insensitively at login.
    pub surname: String,
    // 1 = active, anything else = deactivated.
    pub active: u8,
    // Authorization groups, in table order.
    #[serde(default)]
    pub groups: Vec<String>,
}

impl UserRecord {
    pub fn is_active(&self) -> bool {
        self.active == 1
    }

    pub fn in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }
}

/// LoginForm
///
/// Fields posted by the login page. Missing fields deserialize as `None` so
/// validation can answer with a redirect instead of a rejection.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    pub surname: Option<String>,
    pub id_number: Option<String>,
    pub redirect: Option<String>,
}

/// Query string accepted by the login endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub logout: Option<String>,
}

/// Query string inspected on gated pages; `error` only affects what the
/// login prompt displays.
#[derive(Debug, Default, Deserialize)]
pub struct GateQuery {
    pub error: Option<String>,
}

/// LoginNotice
///
/// Message shown above the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginNotice {
    /// No matching active user (`?error=1`), or a revoked session.
    UnknownUser,
    /// Surname or member number left blank (`?error=empty`).
    EmptyFields,
}

impl LoginNotice {
    pub fn from_query(error: Option<&str>) -> Option<Self> {
        match error {
            Some("1") => Some(Self::UnknownUser),
            Some("empty") => Some(Self::EmptyFields),
            _ => None,
        }
    }
}
