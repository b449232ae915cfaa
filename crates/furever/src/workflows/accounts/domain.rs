use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the identity provider to an account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Authorization level carried on a session. Admin is granted server-side by
/// the identity provider; there is no client-held gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Adopter,
    Admin,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Adopter => "adopter",
            Role::Admin => "admin",
        }
    }
}

/// An authenticated session resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub verified: bool,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A user's contact profile as stored in the `profiles` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub email_verified: bool,
}

/// Registration form payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationForm {
    pub full_name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub password: String,
    pub confirm_password: String,
}

/// Outcome of a successful registration; the account still needs e-mail
/// verification before it can sign in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationReceipt {
    pub user_id: UserId,
    pub email: String,
    pub verification_sent: bool,
}

/// Partial contact update applied to an existing profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub phone_number: String,
    pub address: String,
}
