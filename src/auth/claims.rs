use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of JWT: access, refresh or password reset.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    #[serde(alias = "Access")]
    Access,
    #[serde(alias = "Refresh")]
    Refresh,
    #[serde(alias = "Reset")]
    Reset,
}

/// Who the token was issued to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,       // user ID, nil for the admin
    pub iat: usize,      // issued at (unix timestamp)
    pub exp: usize,      // expires at (unix timestamp)
    pub iss: String,     // issuer
    pub aud: String,     // audience
    pub kind: TokenKind, // token type
    #[serde(default)]
    pub role: Role,
    /// Password hash fingerprint, only on reset tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pwd: Option<String>,
}
