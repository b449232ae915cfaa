use async_trait::async_trait;

use super::domain::{Profile, Session, UserId};

/// Failures surfaced by the external identity provider. Messages from the
/// underlying service are preserved in `Unavailable`.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("this e-mail is already registered")]
    EmailAlreadyRegistered,
    #[error("password is too weak")]
    WeakPassword,
    #[error("incorrect e-mail or password")]
    InvalidCredentials,
    #[error("no account exists for this identity")]
    AccountNotFound,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Port over the hosted authentication service. Implementations own account
/// records, verification state, and session tokens; the library never keeps
/// an authoritative copy.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<UserId, IdentityError>;

    /// Exchange credentials for a session. Succeeds for unverified accounts;
    /// callers decide whether to keep or discard the session.
    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, IdentityError>;

    async fn send_verification(&self, user: &UserId) -> Result<(), IdentityError>;

    async fn is_verified(&self, user: &UserId) -> Result<bool, IdentityError>;

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError>;

    /// Resolve a bearer token to its live session, if any.
    async fn resolve(&self, token: &str) -> Result<Option<Session>, IdentityError>;
}

/// Failures surfaced by the `profiles` collection port.
#[derive(Debug, thiserror::Error)]
pub enum ProfileStoreError {
    #[error("profile not found")]
    NotFound,
    #[error("profile store unavailable: {0}")]
    Unavailable(String),
}

/// Port over the `profiles` collection, keyed by identity user id.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Insert or replace the whole profile document (last-writer-wins).
    async fn upsert(&self, user: &UserId, profile: Profile) -> Result<(), ProfileStoreError>;

    async fn fetch(&self, user: &UserId) -> Result<Option<Profile>, ProfileStoreError>;

    /// All profiles, newest registration first.
    async fn list_all(&self) -> Result<Vec<(UserId, Profile)>, ProfileStoreError>;

    async fn count(&self) -> Result<usize, ProfileStoreError>;
}
