use clap::Args;

use furever::config::AdminConfig;
use furever::error::AppError;
use furever::workflows::accounts::domain::RegistrationForm;
use furever::workflows::accounts::provider::IdentityProvider;
use furever::workflows::adoption::{
    AdoptionRequest, ApplicantContact, OwnerContact, PetCategory, PetGender, PetImage,
    PetResolution, PetSize, SurrenderSubmission,
};

use crate::infra::{build_backend, Backend};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// E-mail granted the administrator role for the demo run
    #[arg(long, default_value = "shelter@furever.home")]
    pub(crate) admin_email: String,
}

fn demo_err(err: impl std::fmt::Display) -> AppError {
    AppError::Io(std::io::Error::other(err.to_string()))
}

/// Scripted walkthrough of the whole adoption workflow against the
/// in-memory backend: register + verify two accounts, surrender a pet,
/// review it, apply, approve, and show the resulting dashboard.
pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let backend = build_backend(&AdminConfig {
        bootstrap_emails: vec![args.admin_email.clone()],
    });

    println!("== FurEver Home workflow demo ==\n");

    let (admin, adopter) = sign_in_participants(&backend, &args.admin_email).await?;

    let pet = backend
        .workflows
        .submit_surrender(
            &adopter,
            SurrenderSubmission {
                name: "Biscuit".to_string(),
                category: PetCategory::Dog,
                breed: "Golden Retriever".to_string(),
                age: 3,
                gender: PetGender::Male,
                size: PetSize::Large,
                description: "House-trained, loves fetch, good with kids.".to_string(),
                image: PetImage {
                    data_url: "data:image/jpeg;base64,/9j/4AAQSkZJRg==".to_string(),
                    mime_type: "image/jpeg".to_string(),
                },
                owner: OwnerContact {
                    name: "Dana Cruz".to_string(),
                    email: "dana@example.com".to_string(),
                    phone: "555-0101".to_string(),
                    address: "12 Harbor Lane".to_string(),
                },
            },
        )
        .await
        .map_err(demo_err)?;
    println!(
        "surrender submitted: {} ({}) -> status {}",
        pet.name,
        pet.id.0,
        pet.status.label()
    );

    let approved = backend
        .workflows
        .approve_pet(&admin, &pet.id)
        .await
        .map_err(demo_err)?;
    println!("admin review: {} -> status {}", approved.name, approved.status.label());

    let listed = backend.workflows.listings(None).await.map_err(demo_err)?;
    println!("public listing now shows {} pet(s)", listed.len());

    let application = backend
        .workflows
        .submit_application(
            &adopter,
            AdoptionRequest {
                pet_id: pet.id.clone(),
                applicant: ApplicantContact {
                    name: "Dana Cruz".to_string(),
                    email: "dana@example.com".to_string(),
                    phone: "555-0101".to_string(),
                    address: "12 Harbor Lane".to_string(),
                },
                message: "We have a fenced yard and plenty of time for walks.".to_string(),
            },
        )
        .await
        .map_err(demo_err)?;
    println!(
        "adoption request {} submitted -> status {}",
        application.id.0,
        application.status.label()
    );

    let approval = backend
        .workflows
        .approve_application(&admin, &application.id)
        .await
        .map_err(demo_err)?;
    match &approval.pet {
        PetResolution::Adopted(adopted) => println!(
            "application approved: {} adopted by {}",
            adopted.name,
            adopted.adopted_by.as_deref().unwrap_or("unknown")
        ),
        PetResolution::Unchanged(pet) => println!(
            "application approved, but {} was not adoptable (status {})",
            pet.name,
            pet.status.label()
        ),
        PetResolution::Missing => {
            println!("application approved, but the pet could not be located")
        }
    }

    let counts = backend
        .workflows
        .dashboard(&admin)
        .await
        .map_err(demo_err)?;
    println!(
        "\ndashboard: pending={} approved={} adopted={} profiles={} applications={}",
        counts.pending_pets,
        counts.approved_pets,
        counts.adopted_pets,
        counts.registered_profiles,
        counts.adoption_applications
    );

    let adoptions = backend
        .workflows
        .my_adopted_pets(&adopter)
        .await
        .map_err(demo_err)?;
    for adoption in &adoptions {
        println!(
            "adopted view: {} ({}) via request {}",
            adoption.pet.name,
            adoption.pet.breed.as_deref().unwrap_or("unknown breed"),
            adoption.id.0
        );
    }

    println!("\n== demo complete ==");
    Ok(())
}

async fn sign_in_participants(
    backend: &Backend,
    admin_email: &str,
) -> Result<
    (
        furever::workflows::accounts::domain::Session,
        furever::workflows::accounts::domain::Session,
    ),
    AppError,
> {
    for (name, email) in [("Shelter Staff", admin_email), ("Dana Cruz", "dana@example.com")] {
        let receipt = backend
            .accounts
            .register(RegistrationForm {
                full_name: name.to_string(),
                email: email.to_string(),
                phone_number: "555-0101".to_string(),
                address: "12 Harbor Lane".to_string(),
                password: "hunter22".to_string(),
                confirm_password: "hunter22".to_string(),
            })
            .await
            .map_err(demo_err)?;
        // Stand-in for the user clicking the verification link.
        backend.identity.mark_verified(email);
        let verified = backend
            .identity
            .is_verified(&receipt.user_id)
            .await
            .map_err(demo_err)?;
        println!("registered {email} (verified: {verified})");
    }

    let admin = backend
        .accounts
        .sign_in(admin_email, "hunter22")
        .await
        .map_err(demo_err)?;
    let adopter = backend
        .accounts
        .sign_in("dana@example.com", "hunter22")
        .await
        .map_err(demo_err)?;
    println!(
        "signed in {} ({}) and {} ({})\n",
        admin.email,
        admin.role.label(),
        adopter.email,
        adopter.role.label()
    );
    Ok((admin, adopter))
}
