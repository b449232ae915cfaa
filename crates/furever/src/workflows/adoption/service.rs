use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::category::category_for_breed;
use super::domain::{
    AdoptionRequest, Application, ApplicationId, ApplicationStatus, DirectAddForm, OwnerContact,
    Pet, PetCategory, PetId, PetSnapshot, PetStatus, RequestTally, SurrenderSubmission,
};
use super::intake::{IntakeGuard, IntakeViolation};
use super::repository::{ApplicationRepository, PetRepository, RepositoryError};
use crate::workflows::accounts::domain::Session;
use crate::workflows::accounts::provider::{ProfileRepository, ProfileStoreError};

/// Error raised by the adoption workflow service.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Intake(#[from] IntakeViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Profiles(#[from] ProfileStoreError),
    #[error("pet '{0}' not found")]
    PetNotFound(String),
    #[error("application '{0}' not found")]
    ApplicationNotFound(String),
    #[error("pet is not available for adoption (status: {})", .0.label())]
    PetUnavailable(PetStatus),
    #[error("pet cannot move from {} to {}", .from.label(), .to.label())]
    InvalidTransition { from: PetStatus, to: PetStatus },
    #[error("application was already reviewed (status: {})", .0.label())]
    AlreadyReviewed(ApplicationStatus),
    #[error("administrator role required")]
    AdminRequired,
    #[error("only the submitter may cancel this request")]
    NotSubmitter,
    #[error("pet '{}' was marked adopted but the application could not be updated: {}", .pet_id.0, .source)]
    ApprovalIncomplete {
        pet_id: PetId,
        source: RepositoryError,
    },
}

/// How the referenced pet was handled while approving an application.
#[derive(Debug, Clone, PartialEq)]
pub enum PetResolution {
    /// Pet found in `approved` state and transitioned to `adopted`.
    Adopted(Pet),
    /// Pet found but not in a state that may transition to `adopted`; it was
    /// left untouched.
    Unchanged(Pet),
    /// No pet could be located by id or by name. The application is still
    /// approved; callers should surface this as a warning, not a failure.
    Missing,
}

impl PetResolution {
    pub fn is_missing(&self) -> bool {
        matches!(self, PetResolution::Missing)
    }
}

/// Outcome of an application approval.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationApproval {
    pub application: Application,
    pub pet: PetResolution,
}

/// Dashboard tallies recomputed from the store on every request; no
/// materialized counters are kept anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DashboardCounts {
    pub pending_pets: usize,
    pub approved_pets: usize,
    pub adopted_pets: usize,
    pub registered_profiles: usize,
    pub adoption_applications: usize,
}

/// Service owning the pet and application state machines. Every operation
/// reads current state from the store, decides, and writes back; there is no
/// in-memory authoritative copy.
pub struct AdoptionService<P, A, U> {
    guard: IntakeGuard,
    pets: Arc<P>,
    applications: Arc<A>,
    profiles: Arc<U>,
}

static PET_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static APPLICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_pet_id() -> PetId {
    let id = PET_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    PetId(format!("pet-{id:06}"))
}

fn next_application_id() -> ApplicationId {
    let id = APPLICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ApplicationId(format!("app-{id:06}"))
}

fn require_admin(session: &Session) -> Result<(), WorkflowError> {
    if session.is_admin() {
        Ok(())
    } else {
        Err(WorkflowError::AdminRequired)
    }
}

impl<P, A, U> AdoptionService<P, A, U>
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
{
    pub fn new(pets: Arc<P>, applications: Arc<A>, profiles: Arc<U>) -> Self {
        Self {
            guard: IntakeGuard::new(),
            pets,
            applications,
            profiles,
        }
    }

    /// Submit a surrender: the pet enters the review queue as `pending`.
    pub async fn submit_surrender(
        &self,
        session: &Session,
        submission: SurrenderSubmission,
    ) -> Result<Pet, WorkflowError> {
        self.guard.check_surrender(&submission)?;

        let pet = Pet {
            id: next_pet_id(),
            name: submission.name.trim().to_string(),
            category: submission.category,
            breed: submission.breed.trim().to_string(),
            age: submission.age,
            gender: submission.gender,
            size: submission.size,
            description: submission.description.trim().to_string(),
            image: submission.image,
            status: PetStatus::Pending,
            created_at: Utc::now(),
            adopted_at: None,
            adopted_by: None,
            owner_id: Some(session.user_id.clone()),
            owner: submission.owner,
            added_by: None,
        };

        let stored = self.pets.insert(pet).await?;
        info!(pet = %stored.id.0, name = %stored.name, "surrender submitted");
        Ok(stored)
    }

    /// Administrator direct-add: skips review, lands as `approved` with the
    /// shelter placeholder as owner.
    pub async fn add_pet(
        &self,
        session: &Session,
        form: DirectAddForm,
    ) -> Result<Pet, WorkflowError> {
        require_admin(session)?;
        self.guard.check_direct_add(&form)?;

        let pet = Pet {
            id: next_pet_id(),
            name: form.name.trim().to_string(),
            category: form.category,
            breed: form.breed.trim().to_string(),
            age: form.age,
            gender: form.gender,
            size: form.size,
            description: form.description.trim().to_string(),
            image: form.image,
            status: PetStatus::Approved,
            created_at: Utc::now(),
            adopted_at: None,
            adopted_by: None,
            owner_id: None,
            owner: OwnerContact::shelter_placeholder(),
            added_by: Some("admin".to_string()),
        };

        let stored = self.pets.insert(pet).await?;
        info!(pet = %stored.id.0, name = %stored.name, "pet added by administrator");
        Ok(stored)
    }

    /// `pending -> approved`; the pet becomes publicly listed.
    pub async fn approve_pet(&self, session: &Session, id: &PetId) -> Result<Pet, WorkflowError> {
        self.transition_pet(session, id, PetStatus::Approved).await
    }

    /// `pending -> rejected`; the pet stays queryable but never listed.
    pub async fn reject_pet(&self, session: &Session, id: &PetId) -> Result<Pet, WorkflowError> {
        self.transition_pet(session, id, PetStatus::Rejected).await
    }

    async fn transition_pet(
        &self,
        session: &Session,
        id: &PetId,
        to: PetStatus,
    ) -> Result<Pet, WorkflowError> {
        require_admin(session)?;

        let mut pet = self
            .pets
            .fetch(id)
            .await?
            .ok_or_else(|| WorkflowError::PetNotFound(id.0.clone()))?;

        if pet.status != PetStatus::Pending {
            return Err(WorkflowError::InvalidTransition {
                from: pet.status,
                to,
            });
        }

        pet.status = to;
        self.pets.update(pet.clone()).await?;
        info!(pet = %pet.id.0, status = to.label(), "pet reviewed");
        Ok(pet)
    }

    /// Hard delete, any status, irreversible. Applications referencing the
    /// pet keep functioning on their denormalized snapshot.
    pub async fn remove_pet(&self, session: &Session, id: &PetId) -> Result<(), WorkflowError> {
        require_admin(session)?;
        match self.pets.delete(id).await {
            Ok(()) => {
                info!(pet = %id.0, "pet removed");
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(WorkflowError::PetNotFound(id.0.clone())),
            Err(err) => Err(err.into()),
        }
    }

    /// Public listing: approved pets only, newest first, optionally narrowed
    /// to a category inferred from the breed text.
    pub async fn listings(
        &self,
        category: Option<PetCategory>,
    ) -> Result<Vec<Pet>, WorkflowError> {
        let mut pets = self.pets.list_by_status(PetStatus::Approved).await?;
        if let Some(wanted) = category {
            pets.retain(|pet| category_for_breed(&pet.breed) == wanted);
        }
        Ok(pets)
    }

    /// Profile page lookup: exact name among approved pets.
    pub async fn pet_profile(&self, name: &str) -> Result<Pet, WorkflowError> {
        self.pets
            .find_approved_by_name(name)
            .await?
            .ok_or_else(|| WorkflowError::PetNotFound(name.to_string()))
    }

    /// Detail lookup by id, any status (admin views).
    pub async fn pet(&self, id: &PetId) -> Result<Pet, WorkflowError> {
        self.pets
            .fetch(id)
            .await?
            .ok_or_else(|| WorkflowError::PetNotFound(id.0.clone()))
    }

    /// Review queues for the admin dashboard.
    pub async fn pets_by_status(
        &self,
        session: &Session,
        status: PetStatus,
    ) -> Result<Vec<Pet>, WorkflowError> {
        require_admin(session)?;
        Ok(self.pets.list_by_status(status).await?)
    }

    /// Submit an adoption request against a pet that is currently approved.
    /// The check is best-effort; a racing approval elsewhere is accepted.
    pub async fn submit_application(
        &self,
        session: &Session,
        request: AdoptionRequest,
    ) -> Result<Application, WorkflowError> {
        self.guard.check_request(&request)?;

        let pet = self
            .pets
            .fetch(&request.pet_id)
            .await?
            .ok_or_else(|| WorkflowError::PetNotFound(request.pet_id.0.clone()))?;
        if pet.status != PetStatus::Approved {
            return Err(WorkflowError::PetUnavailable(pet.status));
        }

        let application = Application {
            id: next_application_id(),
            pet_id: Some(pet.id.clone()),
            pet: PetSnapshot::from_pet(&pet),
            applicant_id: Some(session.user_id.clone()),
            applicant: request.applicant,
            message: request.message.trim().to_string(),
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
            reviewed_at: None,
        };

        let stored = self.applications.insert(application).await?;
        info!(
            application = %stored.id.0,
            pet = %pet.id.0,
            "adoption request submitted"
        );
        Ok(stored)
    }

    /// Approve an application: the one multi-entity operation. The pet write
    /// and the application write are sequential and not atomic; a failure
    /// between them surfaces as [`WorkflowError::ApprovalIncomplete`] with
    /// the pet already adopted and the application still pending.
    pub async fn approve_application(
        &self,
        session: &Session,
        id: &ApplicationId,
    ) -> Result<ApplicationApproval, WorkflowError> {
        require_admin(session)?;

        let mut application = self
            .applications
            .fetch(id)
            .await?
            .ok_or_else(|| WorkflowError::ApplicationNotFound(id.0.clone()))?;
        if application.status != ApplicationStatus::Pending {
            return Err(WorkflowError::AlreadyReviewed(application.status));
        }

        let located = match &application.pet_id {
            Some(pet_id) => self.pets.fetch(pet_id).await?,
            None => {
                // Legacy records reference the pet by name only.
                self.pets
                    .find_approved_by_name(&application.pet.name)
                    .await?
            }
        };

        let resolution = match located {
            Some(mut pet) if pet.status == PetStatus::Approved => {
                pet.status = PetStatus::Adopted;
                pet.adopted_at = Some(Utc::now());
                pet.adopted_by = Some(application.applicant.name.clone());
                self.pets.update(pet.clone()).await?;
                application.pet = PetSnapshot::from_pet(&pet);
                PetResolution::Adopted(pet)
            }
            Some(pet) => {
                // Anything but approved may not move to adopted; refresh the
                // snapshot and leave the record alone.
                application.pet = PetSnapshot::from_pet(&pet);
                PetResolution::Unchanged(pet)
            }
            None => PetResolution::Missing,
        };

        application.status = ApplicationStatus::Approved;
        application.reviewed_at = Some(Utc::now());

        if let Err(source) = self.applications.update(application.clone()).await {
            if let PetResolution::Adopted(pet) = &resolution {
                return Err(WorkflowError::ApprovalIncomplete {
                    pet_id: pet.id.clone(),
                    source,
                });
            }
            return Err(source.into());
        }

        match &resolution {
            PetResolution::Adopted(pet) => info!(
                application = %application.id.0,
                pet = %pet.id.0,
                adopter = %application.applicant.name,
                "application approved, pet adopted"
            ),
            PetResolution::Unchanged(pet) => warn!(
                application = %application.id.0,
                pet = %pet.id.0,
                status = pet.status.label(),
                "application approved but pet was not adoptable"
            ),
            PetResolution::Missing => warn!(
                application = %application.id.0,
                "application approved but the pet could not be located"
            ),
        }

        Ok(ApplicationApproval {
            application,
            pet: resolution,
        })
    }

    /// `pending -> rejected`; stamps the review time, never touches the pet.
    pub async fn reject_application(
        &self,
        session: &Session,
        id: &ApplicationId,
    ) -> Result<Application, WorkflowError> {
        require_admin(session)?;

        let mut application = self
            .applications
            .fetch(id)
            .await?
            .ok_or_else(|| WorkflowError::ApplicationNotFound(id.0.clone()))?;
        if application.status != ApplicationStatus::Pending {
            return Err(WorkflowError::AlreadyReviewed(application.status));
        }

        application.status = ApplicationStatus::Rejected;
        application.reviewed_at = Some(Utc::now());
        self.applications.update(application.clone()).await?;
        info!(application = %application.id.0, "application rejected");
        Ok(application)
    }

    /// Administrator delete, permanent, any status.
    pub async fn delete_application(
        &self,
        session: &Session,
        id: &ApplicationId,
    ) -> Result<(), WorkflowError> {
        require_admin(session)?;
        match self.applications.delete(id).await {
            Ok(()) => {
                info!(application = %id.0, "application deleted");
                Ok(())
            }
            Err(RepositoryError::NotFound) => {
                Err(WorkflowError::ApplicationNotFound(id.0.clone()))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Submitter cancel: permanent delete, permitted only while pending.
    pub async fn cancel_request(
        &self,
        session: &Session,
        id: &ApplicationId,
    ) -> Result<(), WorkflowError> {
        let application = self
            .applications
            .fetch(id)
            .await?
            .ok_or_else(|| WorkflowError::ApplicationNotFound(id.0.clone()))?;

        let owns = application.applicant_id.as_ref() == Some(&session.user_id)
            || application.applicant.email.eq_ignore_ascii_case(&session.email);
        if !owns {
            return Err(WorkflowError::NotSubmitter);
        }
        if application.status != ApplicationStatus::Pending {
            return Err(WorkflowError::AlreadyReviewed(application.status));
        }

        self.applications.delete(id).await?;
        info!(application = %id.0, "request cancelled by submitter");
        Ok(())
    }

    /// All applications, newest first (admin table).
    pub async fn applications_overview(
        &self,
        session: &Session,
    ) -> Result<Vec<Application>, WorkflowError> {
        require_admin(session)?;
        Ok(self.applications.list_all().await?)
    }

    /// The caller's own requests, newest first, with status tallies. Sorting
    /// happens here over the single-field query result.
    pub async fn my_requests(
        &self,
        session: &Session,
    ) -> Result<(Vec<Application>, RequestTally), WorkflowError> {
        let mut requests = self
            .applications
            .list_by_applicant_email(&session.email)
            .await?;
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let tally = RequestTally::of(&requests);
        Ok((requests, tally))
    }

    /// The caller's approved adoptions, newest first. Snapshot-first: records
    /// with an incomplete snapshot get missing fields filled from the live
    /// pet when it still exists, purely for display.
    pub async fn my_adopted_pets(
        &self,
        session: &Session,
    ) -> Result<Vec<Application>, WorkflowError> {
        let mut adoptions = self
            .applications
            .list_by_applicant_email(&session.email)
            .await?;
        adoptions.retain(|application| application.status == ApplicationStatus::Approved);
        adoptions.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        for adoption in &mut adoptions {
            if adoption.pet.is_complete() {
                continue;
            }
            let Some(pet_id) = &adoption.pet_id else {
                continue;
            };
            match self.pets.fetch(pet_id).await {
                Ok(Some(pet)) => adoption.pet.fill_missing_from(&pet),
                Ok(None) => {}
                Err(err) => {
                    warn!(pet = %pet_id.0, error = %err, "could not backfill pet details");
                }
            }
        }

        Ok(adoptions)
    }

    /// Recompute dashboard tallies from source records. The five count
    /// queries are independent and run concurrently; results combine only
    /// after all complete.
    pub async fn dashboard(&self, session: &Session) -> Result<DashboardCounts, WorkflowError> {
        require_admin(session)?;

        let (pending_pets, approved_pets, adopted_pets, registered_profiles, applications) =
            tokio::try_join!(
                async {
                    self.pets
                        .count_by_status(PetStatus::Pending)
                        .await
                        .map_err(WorkflowError::from)
                },
                async {
                    self.pets
                        .count_by_status(PetStatus::Approved)
                        .await
                        .map_err(WorkflowError::from)
                },
                async {
                    self.pets
                        .count_by_status(PetStatus::Adopted)
                        .await
                        .map_err(WorkflowError::from)
                },
                async { self.profiles.count().await.map_err(WorkflowError::from) },
                async {
                    self.applications
                        .count_all()
                        .await
                        .map_err(WorkflowError::from)
                },
            )?;

        Ok(DashboardCounts {
            pending_pets,
            approved_pets,
            adopted_pets,
            registered_profiles,
            adoption_applications: applications,
        })
    }
}
