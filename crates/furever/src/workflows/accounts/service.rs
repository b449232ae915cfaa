use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{
    Profile, ProfileUpdate, RegistrationForm, RegistrationReceipt, Session, UserId,
};
use super::provider::{IdentityError, IdentityProvider, ProfileRepository, ProfileStoreError};

/// Minimum password length enforced at registration.
pub const MIN_PASSWORD_CHARS: usize = 6;

/// Validation errors raised before any provider or store call is made.
#[derive(Debug, thiserror::Error)]
pub enum AccountViolation {
    #[error("full name is required")]
    MissingFullName,
    #[error("'{0}' is not a valid e-mail address")]
    InvalidEmail(String),
    #[error("phone number is required")]
    MissingPhone,
    #[error("address is required")]
    MissingAddress,
    #[error("password must be at least {minimum} characters")]
    PasswordTooShort { minimum: usize },
    #[error("passwords do not match")]
    PasswordMismatch,
}

/// Error raised by the account service.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error(transparent)]
    Validation(#[from] AccountViolation),
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Profiles(#[from] ProfileStoreError),
    #[error("e-mail not verified yet; a fresh verification link was sent")]
    EmailNotVerified,
    #[error("sign in required")]
    NotSignedIn,
    #[error("administrator role required")]
    AdminRequired,
}

/// Service composing the identity provider and the `profiles` collection.
pub struct AccountService<I, R> {
    identity: Arc<I>,
    profiles: Arc<R>,
}

impl<I, R> AccountService<I, R>
where
    I: IdentityProvider + 'static,
    R: ProfileRepository + 'static,
{
    pub fn new(identity: Arc<I>, profiles: Arc<R>) -> Self {
        Self { identity, profiles }
    }

    /// Create the account, send the verification e-mail, then persist the
    /// contact profile. The caller must verify before signing in.
    pub async fn register(
        &self,
        form: RegistrationForm,
    ) -> Result<RegistrationReceipt, AccountError> {
        check_registration(&form)?;

        let email = form.email.trim().to_string();
        let user_id = self
            .identity
            .create_account(&email, &form.password, form.full_name.trim())
            .await?;

        self.identity.send_verification(&user_id).await?;

        self.profiles
            .upsert(
                &user_id,
                Profile {
                    full_name: form.full_name.trim().to_string(),
                    email: email.clone(),
                    phone_number: form.phone_number.trim().to_string(),
                    address: form.address.trim().to_string(),
                    created_at: Utc::now(),
                    email_verified: false,
                },
            )
            .await?;

        info!(%email, "account registered, awaiting verification");

        Ok(RegistrationReceipt {
            user_id,
            email,
            verification_sent: true,
        })
    }

    /// Exchange credentials for a session. Unverified accounts get the
    /// verification link re-sent and the fresh session discarded.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AccountError> {
        if !is_valid_email(email) {
            return Err(AccountViolation::InvalidEmail(email.to_string()).into());
        }

        let session = self.identity.authenticate(email.trim(), password).await?;

        if !session.verified {
            if let Err(err) = self.identity.send_verification(&session.user_id).await {
                warn!(%email, error = %err, "could not re-send verification e-mail");
            }
            self.identity.sign_out(&session.token).await?;
            return Err(AccountError::EmailNotVerified);
        }

        Ok(session)
    }

    pub async fn sign_out(&self, token: &str) -> Result<(), AccountError> {
        self.identity.sign_out(token).await?;
        Ok(())
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<(), AccountError> {
        if !is_valid_email(email) {
            return Err(AccountViolation::InvalidEmail(email.to_string()).into());
        }
        self.identity.send_password_reset(email.trim()).await?;
        Ok(())
    }

    /// Resolve a bearer token to its session; absent tokens mean the caller
    /// is not signed in.
    pub async fn authorize(&self, token: &str) -> Result<Session, AccountError> {
        self.identity
            .resolve(token)
            .await?
            .ok_or(AccountError::NotSignedIn)
    }

    /// Every registered profile, newest first (admin user table).
    pub async fn registered_users(
        &self,
        session: &Session,
    ) -> Result<Vec<(UserId, Profile)>, AccountError> {
        if !session.is_admin() {
            return Err(AccountError::AdminRequired);
        }
        Ok(self.profiles.list_all().await?)
    }

    pub async fn profile(&self, user: &UserId) -> Result<Profile, AccountError> {
        let profile = self
            .profiles
            .fetch(user)
            .await?
            .ok_or(ProfileStoreError::NotFound)?;
        Ok(profile)
    }

    /// Apply a contact update to the stored profile, read-modify-write.
    pub async fn update_profile(
        &self,
        session: &Session,
        update: ProfileUpdate,
    ) -> Result<Profile, AccountError> {
        check_profile_update(&update)?;

        let mut profile = self
            .profiles
            .fetch(&session.user_id)
            .await?
            .ok_or(ProfileStoreError::NotFound)?;

        profile.full_name = update.full_name.trim().to_string();
        profile.phone_number = update.phone_number.trim().to_string();
        profile.address = update.address.trim().to_string();

        self.profiles
            .upsert(&session.user_id, profile.clone())
            .await?;
        Ok(profile)
    }
}

fn check_registration(form: &RegistrationForm) -> Result<(), AccountViolation> {
    if form.full_name.trim().is_empty() {
        return Err(AccountViolation::MissingFullName);
    }
    if !is_valid_email(&form.email) {
        return Err(AccountViolation::InvalidEmail(form.email.clone()));
    }
    if form.phone_number.trim().is_empty() {
        return Err(AccountViolation::MissingPhone);
    }
    if form.address.trim().is_empty() {
        return Err(AccountViolation::MissingAddress);
    }
    if form.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AccountViolation::PasswordTooShort {
            minimum: MIN_PASSWORD_CHARS,
        });
    }
    if form.password != form.confirm_password {
        return Err(AccountViolation::PasswordMismatch);
    }
    Ok(())
}

fn check_profile_update(update: &ProfileUpdate) -> Result<(), AccountViolation> {
    if update.full_name.trim().is_empty() {
        return Err(AccountViolation::MissingFullName);
    }
    if update.phone_number.trim().is_empty() {
        return Err(AccountViolation::MissingPhone);
    }
    if update.address.trim().is_empty() {
        return Err(AccountViolation::MissingAddress);
    }
    Ok(())
}

/// Mirrors the one-`@`, dotted-domain, no-whitespace shape check applied on
/// the public forms.
pub(crate) fn is_valid_email(raw: &str) -> bool {
    let email = raw.trim();
    if email.is_empty() || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((head, tail)) => !head.is_empty() && !tail.is_empty(),
        None => false,
    }
}
