//! In-memory infrastructure adapters.
//!
//! Development and test stand-ins for the hosted document store and identity
//! provider. Listing queries post-filter and sort the (small) in-memory
//! result sets; a production adapter is free to push the same semantics down
//! to indexed queries instead.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use furever::config::AdminConfig;
use furever::workflows::accounts::domain::{Profile, Role, Session, UserId};
use furever::workflows::accounts::provider::{
    IdentityError, IdentityProvider, ProfileRepository, ProfileStoreError,
};
use furever::workflows::accounts::AccountService;
use furever::workflows::adoption::{
    AdoptionService, Application, ApplicationId, ApplicationRepository, OwnerContact, Pet,
    PetCategory, PetGender, PetId, PetImage, PetRepository, PetSize, PetStatus, RepositoryError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
pub(crate) struct InMemoryPetRepository {
    records: Mutex<HashMap<PetId, Pet>>,
}

#[async_trait]
impl PetRepository for InMemoryPetRepository {
    async fn insert(&self, pet: Pet) -> Result<Pet, RepositoryError> {
        let mut records = self.records.lock().expect("pet repository mutex poisoned");
        if records.contains_key(&pet.id) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(pet.id.clone(), pet.clone());
        Ok(pet)
    }

    async fn fetch(&self, id: &PetId) -> Result<Option<Pet>, RepositoryError> {
        let records = self.records.lock().expect("pet repository mutex poisoned");
        Ok(records.get(id).cloned())
    }

    async fn update(&self, pet: Pet) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().expect("pet repository mutex poisoned");
        if !records.contains_key(&pet.id) {
            return Err(RepositoryError::NotFound);
        }
        records.insert(pet.id.clone(), pet);
        Ok(())
    }

    async fn delete(&self, id: &PetId) -> Result<(), RepositoryError> {
        let mut records = self.records.lock().expect("pet repository mutex poisoned");
        records.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    async fn list_by_status(&self, status: PetStatus) -> Result<Vec<Pet>, RepositoryError> {
        let records = self.records.lock().expect("pet repository mutex poisoned");
        let mut pets: Vec<_> = records
            .values()
            .filter(|pet| pet.status == status)
            .cloned()
            .collect();
        pets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pets)
    }

    async fn find_approved_by_name(&self, name: &str) -> Result<Option<Pet>, RepositoryError> {
        let records = self.records.lock().expect("pet repository mutex poisoned");
        Ok(records
            .values()
            .find(|pet| pet.status == PetStatus::Approved && pet.name == name)
            .cloned())
    }

    async fn count_by_status(&self, status: PetStatus) -> Result<usize, RepositoryError> {
        let records = self.records.lock().expect("pet repository mutex poisoned");
        Ok(records.values().filter(|pet| pet.status == status).count())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryApplicationRepository {
    records: Mutex<HashMap<ApplicationId, Application>>,
}

#[async_trait]
impl ApplicationRepository for InMemoryApplicationRepository {
    async fn insert(&self, application: Application) -> Result<Application, RepositoryError> {
        let mut records = self
            .records
            .lock()
            .expect("application repository mutex poisoned");
        if records.contains_key(&application.id) {
            return Err(RepositoryError::Conflict);
        }
        records.insert(application.id.clone(), application.clone());
        Ok(application)
    }

    async fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError> {
        let records = self
            .records
            .lock()
            .expect("application repository mutex poisoned");
        Ok(records.get(id).cloned())
    }

    async fn update(&self, application: Application) -> Result<(), RepositoryError> {
        let mut records = self
            .records
            .lock()
            .expect("application repository mutex poisoned");
        if !records.contains_key(&application.id) {
            return Err(RepositoryError::NotFound);
        }
        records.insert(application.id.clone(), application);
        Ok(())
    }

    async fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError> {
        let mut records = self
            .records
            .lock()
            .expect("application repository mutex poisoned");
        records.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<Application>, RepositoryError> {
        let records = self
            .records
            .lock()
            .expect("application repository mutex poisoned");
        let mut all: Vec<_> = records.values().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn list_by_applicant_email(
        &self,
        email: &str,
    ) -> Result<Vec<Application>, RepositoryError> {
        let records = self
            .records
            .lock()
            .expect("application repository mutex poisoned");
        Ok(records
            .values()
            .filter(|application| application.applicant.email == email)
            .cloned()
            .collect())
    }

    async fn count_all(&self) -> Result<usize, RepositoryError> {
        let records = self
            .records
            .lock()
            .expect("application repository mutex poisoned");
        Ok(records.len())
    }
}

#[derive(Default)]
pub(crate) struct InMemoryProfileRepository {
    records: Mutex<HashMap<UserId, Profile>>,
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn upsert(&self, user: &UserId, profile: Profile) -> Result<(), ProfileStoreError> {
        self.records
            .lock()
            .expect("profile repository mutex poisoned")
            .insert(user.clone(), profile);
        Ok(())
    }

    async fn fetch(&self, user: &UserId) -> Result<Option<Profile>, ProfileStoreError> {
        Ok(self
            .records
            .lock()
            .expect("profile repository mutex poisoned")
            .get(user)
            .cloned())
    }

    async fn list_all(&self) -> Result<Vec<(UserId, Profile)>, ProfileStoreError> {
        let records = self
            .records
            .lock()
            .expect("profile repository mutex poisoned");
        let mut all: Vec<_> = records
            .iter()
            .map(|(id, profile)| (id.clone(), profile.clone()))
            .collect();
        all.sort_by(|a, b| b.1.created_at.cmp(&a.1.created_at));
        Ok(all)
    }

    async fn count(&self) -> Result<usize, ProfileStoreError> {
        Ok(self
            .records
            .lock()
            .expect("profile repository mutex poisoned")
            .len())
    }
}

struct StoredAccount {
    user_id: UserId,
    password: String,
    display_name: String,
    verified: bool,
}

/// Identity provider stand-in. Accounts whose e-mail appears in the
/// bootstrap list get the administrator role on their sessions; verification
/// e-mails are logged rather than delivered, with an explicit hook to flip
/// the verified bit for demos and tests.
pub(crate) struct InMemoryIdentityProvider {
    admin_emails: HashSet<String>,
    accounts: Mutex<HashMap<String, StoredAccount>>,
    sessions: Mutex<HashMap<String, Session>>,
    user_sequence: AtomicU64,
    token_sequence: AtomicU64,
}

impl InMemoryIdentityProvider {
    pub(crate) fn new(admin: &AdminConfig) -> Self {
        Self {
            admin_emails: admin
                .bootstrap_emails
                .iter()
                .map(|email| email.to_ascii_lowercase())
                .collect(),
            accounts: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
            user_sequence: AtomicU64::new(1),
            token_sequence: AtomicU64::new(1),
        }
    }

    /// Demo/test hook standing in for the user clicking the e-mailed link.
    pub(crate) fn mark_verified(&self, email: &str) {
        let mut accounts = self.accounts.lock().expect("identity mutex poisoned");
        if let Some(account) = accounts.get_mut(&email.to_ascii_lowercase()) {
            account.verified = true;
        }
    }

    fn role_for(&self, email: &str) -> Role {
        if self.admin_emails.contains(&email.to_ascii_lowercase()) {
            Role::Admin
        } else {
            Role::Adopter
        }
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<UserId, IdentityError> {
        let key = email.to_ascii_lowercase();
        let mut accounts = self.accounts.lock().expect("identity mutex poisoned");
        if accounts.contains_key(&key) {
            return Err(IdentityError::EmailAlreadyRegistered);
        }
        if password.chars().count() < 6 {
            return Err(IdentityError::WeakPassword);
        }
        let id = self.user_sequence.fetch_add(1, Ordering::Relaxed);
        let user_id = UserId(format!("user-{id:06}"));
        accounts.insert(
            key,
            StoredAccount {
                user_id: user_id.clone(),
                password: password.to_string(),
                display_name: display_name.to_string(),
                verified: false,
            },
        );
        Ok(user_id)
    }

    async fn authenticate(&self, email: &str, password: &str) -> Result<Session, IdentityError> {
        let key = email.to_ascii_lowercase();
        let accounts = self.accounts.lock().expect("identity mutex poisoned");
        let account = accounts
            .get(&key)
            .filter(|account| account.password == password)
            .ok_or(IdentityError::InvalidCredentials)?;

        let token = format!(
            "session-{:06}",
            self.token_sequence.fetch_add(1, Ordering::Relaxed)
        );
        let session = Session {
            token: token.clone(),
            user_id: account.user_id.clone(),
            email: email.to_string(),
            display_name: account.display_name.clone(),
            role: self.role_for(email),
            verified: account.verified,
        };
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .insert(token, session.clone());
        Ok(session)
    }

    async fn send_verification(&self, user: &UserId) -> Result<(), IdentityError> {
        info!(user = %user.0, "verification e-mail queued");
        Ok(())
    }

    async fn is_verified(&self, user: &UserId) -> Result<bool, IdentityError> {
        let accounts = self.accounts.lock().expect("identity mutex poisoned");
        accounts
            .values()
            .find(|account| account.user_id == *user)
            .map(|account| account.verified)
            .ok_or(IdentityError::AccountNotFound)
    }

    async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .remove(token);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        info!(%email, "password reset e-mail queued");
        Ok(())
    }

    async fn resolve(&self, token: &str) -> Result<Option<Session>, IdentityError> {
        Ok(self
            .sessions
            .lock()
            .expect("session mutex poisoned")
            .get(token)
            .cloned())
    }
}

pub(crate) type Workflows =
    AdoptionService<InMemoryPetRepository, InMemoryApplicationRepository, InMemoryProfileRepository>;
pub(crate) type Accounts = AccountService<InMemoryIdentityProvider, InMemoryProfileRepository>;

/// Fully wired in-memory backend shared by the server, the demo command,
/// and the route tests.
pub(crate) struct Backend {
    pub(crate) workflows: Arc<Workflows>,
    pub(crate) accounts: Arc<Accounts>,
    pub(crate) identity: Arc<InMemoryIdentityProvider>,
    pub(crate) pets: Arc<InMemoryPetRepository>,
}

pub(crate) fn build_backend(admin: &AdminConfig) -> Backend {
    let pets = Arc::new(InMemoryPetRepository::default());
    let applications = Arc::new(InMemoryApplicationRepository::default());
    let profiles = Arc::new(InMemoryProfileRepository::default());
    let identity = Arc::new(InMemoryIdentityProvider::new(admin));

    Backend {
        workflows: Arc::new(AdoptionService::new(
            pets.clone(),
            applications,
            profiles.clone(),
        )),
        accounts: Arc::new(AccountService::new(identity.clone(), profiles)),
        identity,
        pets,
    }
}

/// Seed a couple of approved pets so a fresh dev server has something to
/// list.
pub(crate) async fn seed_demo_pets(pets: &InMemoryPetRepository) -> Result<(), RepositoryError> {
    let samples = [
        (
            "seed-pet-000001",
            "Biscuit",
            PetCategory::Dog,
            "Golden Retriever",
            3,
            PetGender::Male,
            PetSize::Large,
            "House-trained, loves fetch, good with kids.",
        ),
        (
            "seed-pet-000002",
            "Mochi",
            PetCategory::Cat,
            "Siamese",
            2,
            PetGender::Female,
            PetSize::Small,
            "Quiet lap cat, happiest on a sunny windowsill.",
        ),
    ];

    for (id, name, category, breed, age, gender, size, description) in samples {
        pets.insert(Pet {
            id: PetId(id.to_string()),
            name: name.to_string(),
            category,
            breed: breed.to_string(),
            age,
            gender,
            size,
            description: description.to_string(),
            image: PetImage {
                data_url: "data:image/jpeg;base64,/9j/4AAQSkZJRg==".to_string(),
                mime_type: "image/jpeg".to_string(),
            },
            status: PetStatus::Approved,
            created_at: Utc::now(),
            adopted_at: None,
            adopted_by: None,
            owner_id: None,
            owner: OwnerContact::shelter_placeholder(),
            added_by: Some("admin".to_string()),
        })
        .await?;
    }
    info!("seeded demo pets");
    Ok(())
}
