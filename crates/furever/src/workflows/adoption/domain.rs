use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::accounts::domain::UserId;

/// Identifier wrapper for pet records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PetId(pub String);

/// Identifier wrapper for adoption applications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Lifecycle status of a pet record.
///
/// Legal transitions are `Pending -> {Approved, Rejected}` and
/// `Approved -> Adopted`; nothing ever re-enters `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    Pending,
    Approved,
    Rejected,
    Adopted,
}

impl PetStatus {
    pub const fn label(self) -> &'static str {
        match self {
            PetStatus::Pending => "pending",
            PetStatus::Approved => "approved",
            PetStatus::Rejected => "rejected",
            PetStatus::Adopted => "adopted",
        }
    }
}

/// Coarse species bucket used for browsing filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetCategory {
    Dog,
    Cat,
    Other,
}

impl PetCategory {
    pub const fn label(self) -> &'static str {
        match self {
            PetCategory::Dog => "dog",
            PetCategory::Cat => "cat",
            PetCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetGender {
    Male,
    Female,
}

impl PetGender {
    pub const fn label(self) -> &'static str {
        match self {
            PetGender::Male => "male",
            PetGender::Female => "female",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetSize {
    Small,
    Medium,
    Large,
}

impl PetSize {
    pub const fn label(self) -> &'static str {
        match self {
            PetSize::Small => "small",
            PetSize::Medium => "medium",
            PetSize::Large => "large",
        }
    }
}

/// Photo stored inline as a data URI plus its declared media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PetImage {
    #[serde(rename = "image_url")]
    pub data_url: String,
    #[serde(rename = "image_type")]
    pub mime_type: String,
}

/// Contact details of the person surrendering a pet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerContact {
    #[serde(rename = "owner_name")]
    pub name: String,
    #[serde(rename = "owner_email")]
    pub email: String,
    #[serde(rename = "owner_phone")]
    pub phone: String,
    #[serde(rename = "owner_address")]
    pub address: String,
}

impl OwnerContact {
    /// Placeholder owner attached to pets the shelter adds directly.
    pub fn shelter_placeholder() -> Self {
        Self {
            name: "Admin".to_string(),
            email: "admin@furever.home".to_string(),
            phone: "N/A".to_string(),
            address: "N/A".to_string(),
        }
    }
}

/// A pet record as stored in the `pets` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub id: PetId,
    pub name: String,
    pub category: PetCategory,
    pub breed: String,
    pub age: u32,
    pub gender: PetGender,
    pub size: PetSize,
    pub description: String,
    #[serde(flatten)]
    pub image: PetImage,
    pub status: PetStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adopted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adopted_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<UserId>,
    #[serde(flatten)]
    pub owner: OwnerContact,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_by: Option<String>,
}

/// Status of an adoption application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

/// Denormalized copy of a pet's display fields embedded in an application.
///
/// Captured at submission and rewritten at approval so "my adopted pets"
/// views never need a live join; deliberately allowed to go stale relative
/// to the source record afterwards. Fields other than the name are optional
/// to accommodate legacy records with thin references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetSnapshot {
    #[serde(rename = "pet_name")]
    pub name: String,
    #[serde(rename = "pet_breed", skip_serializing_if = "Option::is_none")]
    pub breed: Option<String>,
    #[serde(rename = "pet_age", skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(rename = "pet_gender", skip_serializing_if = "Option::is_none")]
    pub gender: Option<PetGender>,
    #[serde(rename = "pet_size", skip_serializing_if = "Option::is_none")]
    pub size: Option<PetSize>,
    #[serde(rename = "pet_description", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "pet_image_url", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl PetSnapshot {
    pub fn from_pet(pet: &Pet) -> Self {
        Self {
            name: pet.name.clone(),
            breed: Some(pet.breed.clone()),
            age: Some(pet.age),
            gender: Some(pet.gender),
            size: Some(pet.size),
            description: Some(pet.description.clone()),
            image_url: Some(pet.image.data_url.clone()),
        }
    }

    /// Whether the snapshot carries enough data to render without a join.
    pub fn is_complete(&self) -> bool {
        self.breed.is_some() && self.image_url.is_some()
    }

    /// Fill only the missing fields from a freshly fetched pet, leaving any
    /// already-captured snapshot data untouched.
    pub fn fill_missing_from(&mut self, pet: &Pet) {
        if self.breed.is_none() {
            self.breed = Some(pet.breed.clone());
        }
        if self.age.is_none() {
            self.age = Some(pet.age);
        }
        if self.gender.is_none() {
            self.gender = Some(pet.gender);
        }
        if self.size.is_none() {
            self.size = Some(pet.size);
        }
        if self.description.is_none() {
            self.description = Some(pet.description.clone());
        }
        if self.image_url.is_none() {
            self.image_url = Some(pet.image.data_url.clone());
        }
    }
}

/// Contact details supplied by the applicant on the adoption form. The name
/// here is what gets stamped onto the pet as `adopted_by`, not necessarily
/// the authenticated display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantContact {
    #[serde(rename = "applicant_name")]
    pub name: String,
    #[serde(rename = "applicant_email")]
    pub email: String,
    #[serde(rename = "applicant_phone")]
    pub phone: String,
    #[serde(rename = "applicant_address")]
    pub address: String,
}

/// An adoption application as stored in the `adoption_applications`
/// collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pet_id: Option<PetId>,
    #[serde(flatten)]
    pub pet: PetSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant_id: Option<UserId>,
    #[serde(flatten)]
    pub applicant: ApplicantContact,
    pub message: String,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
}

/// Surrender form payload; validated by the intake guard before any write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurrenderSubmission {
    pub name: String,
    pub category: PetCategory,
    pub breed: String,
    pub age: u32,
    pub gender: PetGender,
    pub size: PetSize,
    pub description: String,
    pub image: PetImage,
    pub owner: OwnerContact,
}

/// Direct-add form used by administrators; bypasses the pending review and
/// carries no owner contact (a shelter placeholder is attached instead).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectAddForm {
    pub name: String,
    pub category: PetCategory,
    pub breed: String,
    pub age: u32,
    pub gender: PetGender,
    pub size: PetSize,
    pub description: String,
    pub image: PetImage,
}

/// Adoption form payload submitted against an approved pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdoptionRequest {
    pub pet_id: PetId,
    pub applicant: ApplicantContact,
    pub message: String,
}

/// Tally of a user's adoption requests by status, recomputed from the
/// fetched records on every load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RequestTally {
    pub all: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
}

impl RequestTally {
    pub fn of(requests: &[Application]) -> Self {
        let mut tally = Self {
            all: requests.len(),
            ..Self::default()
        };
        for request in requests {
            match request.status {
                ApplicationStatus::Pending => tally.pending += 1,
                ApplicationStatus::Approved => tally.approved += 1,
                ApplicationStatus::Rejected => tally.rejected += 1,
            }
        }
        tally
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pet() -> Pet {
        Pet {
            id: PetId("pet-000001".to_string()),
            name: "Biscuit".to_string(),
            category: PetCategory::Dog,
            breed: "Golden Retriever".to_string(),
            age: 3,
            gender: PetGender::Male,
            size: PetSize::Large,
            description: "Loves fetch and long naps.".to_string(),
            image: PetImage {
                data_url: "data:image/jpeg;base64,/9j/4AAQ".to_string(),
                mime_type: "image/jpeg".to_string(),
            },
            status: PetStatus::Approved,
            created_at: Utc::now(),
            adopted_at: None,
            adopted_by: None,
            owner_id: None,
            owner: OwnerContact::shelter_placeholder(),
            added_by: Some("admin".to_string()),
        }
    }

    #[test]
    fn pet_serializes_with_collection_field_names() {
        let value = serde_json::to_value(pet()).expect("pet serializes");
        assert_eq!(value["status"], "approved");
        assert_eq!(value["image_url"], "data:image/jpeg;base64,/9j/4AAQ");
        assert_eq!(value["image_type"], "image/jpeg");
        assert_eq!(value["owner_name"], "Admin");
        assert_eq!(value["owner_email"], "admin@furever.home");
        assert!(value.get("adopted_at").is_none());
    }

    #[test]
    fn snapshot_fill_only_overrides_missing_fields() {
        let pet = pet();
        let mut snapshot = PetSnapshot {
            name: "Old Name".to_string(),
            breed: Some("Recorded Breed".to_string()),
            age: None,
            gender: None,
            size: None,
            description: None,
            image_url: None,
        };

        snapshot.fill_missing_from(&pet);

        assert_eq!(snapshot.name, "Old Name");
        assert_eq!(snapshot.breed.as_deref(), Some("Recorded Breed"));
        assert_eq!(snapshot.age, Some(3));
        assert_eq!(
            snapshot.image_url.as_deref(),
            Some("data:image/jpeg;base64,/9j/4AAQ")
        );
    }

    #[test]
    fn snapshot_from_pet_is_complete() {
        let snapshot = PetSnapshot::from_pet(&pet());
        assert!(snapshot.is_complete());
        assert_eq!(snapshot.name, "Biscuit");
        assert_eq!(snapshot.gender, Some(PetGender::Male));
    }

    #[test]
    fn request_tally_counts_by_status() {
        let base = Application {
            id: ApplicationId("app-000001".to_string()),
            pet_id: Some(PetId("pet-000001".to_string())),
            pet: PetSnapshot::from_pet(&pet()),
            applicant_id: None,
            applicant: ApplicantContact {
                name: "Dana Cruz".to_string(),
                email: "dana@example.com".to_string(),
                phone: "555-0101".to_string(),
                address: "12 Harbor Lane".to_string(),
            },
            message: "We have a fenced yard and two kids who adore dogs.".to_string(),
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
            reviewed_at: None,
        };
        let mut approved = base.clone();
        approved.status = ApplicationStatus::Approved;
        let mut rejected = base.clone();
        rejected.status = ApplicationStatus::Rejected;

        let tally = RequestTally::of(&[base, approved, rejected]);
        assert_eq!(tally.all, 3);
        assert_eq!(tally.pending, 1);
        assert_eq!(tally.approved, 1);
        assert_eq!(tally.rejected, 1);
    }
}
