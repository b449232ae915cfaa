//! Account registration, sign-in, and profile workflows backed by the
//! external identity provider and the `profiles` collection.

pub mod domain;
pub mod provider;
pub mod router;
pub mod service;

pub use domain::{
    Profile, ProfileUpdate, RegistrationForm, RegistrationReceipt, Role, Session, UserId,
};
pub use provider::{IdentityError, IdentityProvider, ProfileRepository, ProfileStoreError};
pub use router::account_router;
pub use service::{AccountError, AccountService, AccountViolation};
