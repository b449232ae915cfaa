use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use serde_json::json;

use super::domain::{
    AdoptionRequest, ApplicationId, DirectAddForm, PetCategory, PetId, PetStatus,
    SurrenderSubmission,
};
use super::repository::{ApplicationRepository, PetRepository, RepositoryError};
use super::service::{AdoptionService, PetResolution, WorkflowError};
use crate::workflows::accounts::domain::Session;
use crate::workflows::accounts::provider::{IdentityProvider, ProfileRepository};
use crate::workflows::accounts::router::{account_error_response, bearer_token};
use crate::workflows::accounts::service::AccountService;

/// Shared state for the adoption endpoints: the workflow service plus the
/// account service used to resolve bearer tokens.
pub struct AdoptionApi<P, A, U, I> {
    pub workflows: Arc<AdoptionService<P, A, U>>,
    pub accounts: Arc<AccountService<I, U>>,
}

impl<P, A, U, I> Clone for AdoptionApi<P, A, U, I> {
    fn clone(&self) -> Self {
        Self {
            workflows: Arc::clone(&self.workflows),
            accounts: Arc::clone(&self.accounts),
        }
    }
}

/// Router builder exposing the adoption workflow endpoints.
pub fn adoption_router<P, A, U, I>(api: AdoptionApi<P, A, U, I>) -> Router
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    Router::new()
        .route("/api/v1/pets", get(listings_handler::<P, A, U, I>))
        .route(
            "/api/v1/pets/category/:category",
            get(category_listings_handler::<P, A, U, I>),
        )
        .route(
            "/api/v1/pets/profile/:name",
            get(pet_profile_handler::<P, A, U, I>),
        )
        .route("/api/v1/pets/:id", get(pet_handler::<P, A, U, I>))
        .route(
            "/api/v1/pets/surrender",
            post(surrender_handler::<P, A, U, I>),
        )
        .route(
            "/api/v1/applications",
            post(submit_application_handler::<P, A, U, I>),
        )
        .route(
            "/api/v1/applications/mine",
            get(my_requests_handler::<P, A, U, I>),
        )
        .route(
            "/api/v1/applications/adopted",
            get(my_adopted_handler::<P, A, U, I>),
        )
        .route(
            "/api/v1/applications/:id",
            delete(cancel_request_handler::<P, A, U, I>),
        )
        .route("/api/v1/admin/pets", post(add_pet_handler::<P, A, U, I>))
        .route(
            "/api/v1/admin/pets/status/:status",
            get(pets_by_status_handler::<P, A, U, I>),
        )
        .route(
            "/api/v1/admin/pets/:id/approve",
            post(approve_pet_handler::<P, A, U, I>),
        )
        .route(
            "/api/v1/admin/pets/:id/reject",
            post(reject_pet_handler::<P, A, U, I>),
        )
        .route(
            "/api/v1/admin/pets/:id",
            delete(remove_pet_handler::<P, A, U, I>),
        )
        .route(
            "/api/v1/admin/applications",
            get(applications_overview_handler::<P, A, U, I>),
        )
        .route(
            "/api/v1/admin/applications/:id/approve",
            post(approve_application_handler::<P, A, U, I>),
        )
        .route(
            "/api/v1/admin/applications/:id/reject",
            post(reject_application_handler::<P, A, U, I>),
        )
        .route(
            "/api/v1/admin/applications/:id",
            delete(delete_application_handler::<P, A, U, I>),
        )
        .route(
            "/api/v1/admin/dashboard",
            get(dashboard_handler::<P, A, U, I>),
        )
        .with_state(api)
}

fn workflow_error_response(err: WorkflowError) -> Response {
    let status = match &err {
        WorkflowError::Intake(_) => StatusCode::UNPROCESSABLE_ENTITY,
        WorkflowError::PetNotFound(_) | WorkflowError::ApplicationNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        WorkflowError::AdminRequired | WorkflowError::NotSubmitter => StatusCode::FORBIDDEN,
        WorkflowError::PetUnavailable(_)
        | WorkflowError::InvalidTransition { .. }
        | WorkflowError::AlreadyReviewed(_) => StatusCode::CONFLICT,
        WorkflowError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        WorkflowError::Repository(_)
        | WorkflowError::Profiles(_)
        | WorkflowError::ApprovalIncomplete { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}

fn parse_status(raw: &str) -> Option<PetStatus> {
    match raw {
        "pending" => Some(PetStatus::Pending),
        "approved" => Some(PetStatus::Approved),
        "rejected" => Some(PetStatus::Rejected),
        "adopted" => Some(PetStatus::Adopted),
        _ => None,
    }
}

fn parse_category(raw: &str) -> Option<PetCategory> {
    match raw {
        "dog" => Some(PetCategory::Dog),
        "cat" => Some(PetCategory::Cat),
        "other" => Some(PetCategory::Other),
        _ => None,
    }
}

async fn session_or_response<P, A, U, I>(
    api: &AdoptionApi<P, A, U, I>,
    headers: &HeaderMap,
) -> Result<Session, Response>
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let Some(token) = bearer_token(headers) else {
        return Err(account_error_response(
            crate::workflows::accounts::service::AccountError::NotSignedIn,
        ));
    };
    api.accounts
        .authorize(token)
        .await
        .map_err(account_error_response)
}

async fn listings_handler<P, A, U, I>(State(api): State<AdoptionApi<P, A, U, I>>) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    match api.workflows.listings(None).await {
        Ok(pets) => (StatusCode::OK, axum::Json(pets)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn category_listings_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    Path(category): Path<String>,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let Some(category) = parse_category(&category) else {
        let payload = json!({ "error": format!("unknown category '{category}'") });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };
    match api.workflows.listings(Some(category)).await {
        Ok(pets) => (StatusCode::OK, axum::Json(pets)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn pet_profile_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    Path(name): Path<String>,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    match api.workflows.pet_profile(&name).await {
        Ok(pet) => (StatusCode::OK, axum::Json(pet)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn pet_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    Path(id): Path<String>,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    match api.workflows.pet(&PetId(id)).await {
        Ok(pet) => (StatusCode::OK, axum::Json(pet)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn surrender_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    headers: HeaderMap,
    axum::Json(submission): axum::Json<SurrenderSubmission>,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let session = match session_or_response(&api, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match api.workflows.submit_surrender(&session, submission).await {
        Ok(pet) => (StatusCode::CREATED, axum::Json(pet)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn submit_application_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    headers: HeaderMap,
    axum::Json(request): axum::Json<AdoptionRequest>,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let session = match session_or_response(&api, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match api.workflows.submit_application(&session, request).await {
        Ok(application) => (StatusCode::CREATED, axum::Json(application)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn my_requests_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    headers: HeaderMap,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let session = match session_or_response(&api, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match api.workflows.my_requests(&session).await {
        Ok((requests, tally)) => (
            StatusCode::OK,
            axum::Json(json!({ "requests": requests, "counts": tally })),
        )
            .into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn my_adopted_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    headers: HeaderMap,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let session = match session_or_response(&api, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match api.workflows.my_adopted_pets(&session).await {
        Ok(adoptions) => (StatusCode::OK, axum::Json(adoptions)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn cancel_request_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let session = match session_or_response(&api, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match api
        .workflows
        .cancel_request(&session, &ApplicationId(id))
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            axum::Json(json!({ "status": "cancelled" })),
        )
            .into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn add_pet_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    headers: HeaderMap,
    axum::Json(form): axum::Json<DirectAddForm>,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let session = match session_or_response(&api, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match api.workflows.add_pet(&session, form).await {
        Ok(pet) => (StatusCode::CREATED, axum::Json(pet)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn pets_by_status_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    headers: HeaderMap,
    Path(status): Path<String>,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let session = match session_or_response(&api, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    let Some(status) = parse_status(&status) else {
        let payload = json!({ "error": format!("unknown status '{status}'") });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };
    match api.workflows.pets_by_status(&session, status).await {
        Ok(pets) => (StatusCode::OK, axum::Json(pets)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn approve_pet_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let session = match session_or_response(&api, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match api.workflows.approve_pet(&session, &PetId(id)).await {
        Ok(pet) => (StatusCode::OK, axum::Json(pet)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn reject_pet_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let session = match session_or_response(&api, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match api.workflows.reject_pet(&session, &PetId(id)).await {
        Ok(pet) => (StatusCode::OK, axum::Json(pet)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn remove_pet_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let session = match session_or_response(&api, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match api.workflows.remove_pet(&session, &PetId(id)).await {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "status": "removed" }))).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn applications_overview_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    headers: HeaderMap,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let session = match session_or_response(&api, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match api.workflows.applications_overview(&session).await {
        Ok(applications) => (StatusCode::OK, axum::Json(applications)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn approve_application_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let session = match session_or_response(&api, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match api
        .workflows
        .approve_application(&session, &ApplicationId(id))
        .await
    {
        Ok(approval) => {
            let payload = match &approval.pet {
                PetResolution::Adopted(pet) => json!({
                    "application": approval.application,
                    "pet": pet,
                    "outcome": "adopted",
                }),
                PetResolution::Unchanged(pet) => json!({
                    "application": approval.application,
                    "pet": pet,
                    "outcome": "not_adoptable",
                }),
                PetResolution::Missing => json!({
                    "application": approval.application,
                    "pet": serde_json::Value::Null,
                    "outcome": "pet_missing",
                    "warning": "application approved, but pet details not found",
                }),
            };
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => workflow_error_response(err),
    }
}

async fn reject_application_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let session = match session_or_response(&api, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match api
        .workflows
        .reject_application(&session, &ApplicationId(id))
        .await
    {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn delete_application_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let session = match session_or_response(&api, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match api
        .workflows
        .delete_application(&session, &ApplicationId(id))
        .await
    {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "status": "deleted" }))).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

async fn dashboard_handler<P, A, U, I>(
    State(api): State<AdoptionApi<P, A, U, I>>,
    headers: HeaderMap,
) -> Response
where
    P: PetRepository + 'static,
    A: ApplicationRepository + 'static,
    U: ProfileRepository + 'static,
    I: IdentityProvider + 'static,
{
    let session = match session_or_response(&api, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match api.workflows.dashboard(&session).await {
        Ok(counts) => (StatusCode::OK, axum::Json(counts)).into_response(),
        Err(err) => workflow_error_response(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_statuses_and_categories() {
        assert_eq!(parse_status("pending"), Some(PetStatus::Pending));
        assert_eq!(parse_status("adopted"), Some(PetStatus::Adopted));
        assert_eq!(parse_status("lost"), None);
        assert_eq!(parse_category("dog"), Some(PetCategory::Dog));
        assert_eq!(parse_category("hamster"), None);
    }
}
