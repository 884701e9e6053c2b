use serde::{Deserialize, Serialize};

/// The authenticated back-office user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Admin {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Payload of a successful `POST /auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginData {
    pub admin: Admin,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

/// A live admin session: token pair plus cached profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user: Admin,
    /// RFC 3339 timestamp of the login
    pub login_timestamp: String,
    /// Set when the session was synthesized offline from the demo credentials
    pub demo: bool,
}
