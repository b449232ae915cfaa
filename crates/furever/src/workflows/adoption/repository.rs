use async_trait::async_trait;

use super::domain::{Application, ApplicationId, Pet, PetId, PetStatus};

/// Error enumeration for document-store failures. Underlying client messages
/// are preserved in `Unavailable`.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

/// Port over the `pets` collection.
///
/// Updates replace the whole document, last-writer-wins; there are no
/// optimistic-concurrency tokens. Listing order is newest first; whether an
/// adapter sorts server-side or post-sorts a small result set is its call.
#[async_trait]
pub trait PetRepository: Send + Sync {
    async fn insert(&self, pet: Pet) -> Result<Pet, RepositoryError>;

    async fn fetch(&self, id: &PetId) -> Result<Option<Pet>, RepositoryError>;

    async fn update(&self, pet: Pet) -> Result<(), RepositoryError>;

    /// Hard delete. `NotFound` when the id does not exist.
    async fn delete(&self, id: &PetId) -> Result<(), RepositoryError>;

    /// All pets in the given status, newest first.
    async fn list_by_status(&self, status: PetStatus) -> Result<Vec<Pet>, RepositoryError>;

    /// Exact-name lookup among approved pets; the legacy-reference fallback
    /// used when an application carries no pet id.
    async fn find_approved_by_name(&self, name: &str) -> Result<Option<Pet>, RepositoryError>;

    async fn count_by_status(&self, status: PetStatus) -> Result<usize, RepositoryError>;
}

/// Port over the `adoption_applications` collection.
#[async_trait]
pub trait ApplicationRepository: Send + Sync {
    async fn insert(&self, application: Application) -> Result<Application, RepositoryError>;

    async fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;

    async fn update(&self, application: Application) -> Result<(), RepositoryError>;

    async fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError>;

    /// Every application regardless of status, newest first.
    async fn list_all(&self) -> Result<Vec<Application>, RepositoryError>;

    /// Single-field equality filter on the applicant e-mail, unordered. The
    /// engine sorts and status-filters the (small) result itself rather than
    /// demanding a compound index from the store.
    async fn list_by_applicant_email(
        &self,
        email: &str,
    ) -> Result<Vec<Application>, RepositoryError>;

    async fn count_all(&self) -> Result<usize, RepositoryError>;
}
