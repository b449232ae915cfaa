//! The adoption workflow engine: pet and application lifecycles, intake
//! validation, breed-based category inference, and dashboard tallies.
//!
//! State machines: pets move `pending -> {approved, rejected}` and
//! `approved -> adopted`; applications move `pending -> {approved,
//! rejected}`. Approving an application is the only operation touching both
//! collections, and its two writes are deliberately not atomic (see
//! [`service::AdoptionService::approve_application`]).

pub mod category;
pub mod domain;
pub mod intake;
pub mod repository;
pub mod router;
pub mod service;

pub use category::category_for_breed;
pub use domain::{
    AdoptionRequest, ApplicantContact, Application, ApplicationId, ApplicationStatus,
    DirectAddForm, OwnerContact, Pet, PetCategory, PetGender, PetId, PetImage, PetSize,
    PetSnapshot, PetStatus, RequestTally, SurrenderSubmission,
};
pub use intake::{IntakeGuard, IntakeViolation, MAX_IMAGE_BYTES, MIN_MESSAGE_CHARS};
pub use repository::{ApplicationRepository, PetRepository, RepositoryError};
pub use router::{adoption_router, AdoptionApi};
pub use service::{
    AdoptionService, ApplicationApproval, DashboardCounts, PetResolution, WorkflowError,
};
