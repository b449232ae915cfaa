use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ProfileUpdate, RegistrationForm};
use super::provider::{IdentityError, IdentityProvider, ProfileRepository, ProfileStoreError};
use super::service::{AccountError, AccountService};

/// Router builder exposing the account endpoints.
pub fn account_router<I, R>(service: Arc<AccountService<I, R>>) -> Router
where
    I: IdentityProvider + 'static,
    R: ProfileRepository + 'static,
{
    Router::new()
        .route("/api/v1/auth/register", post(register_handler::<I, R>))
        .route("/api/v1/auth/signin", post(signin_handler::<I, R>))
        .route("/api/v1/auth/signout", post(signout_handler::<I, R>))
        .route("/api/v1/auth/reset", post(reset_handler::<I, R>))
        .route(
            "/api/v1/profile",
            get(profile_handler::<I, R>).put(update_profile_handler::<I, R>),
        )
        .route("/api/v1/admin/users", get(registered_users_handler::<I, R>))
        .with_state(service)
}

/// Pull the bearer token out of the `Authorization` header, if any.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

pub(crate) fn account_error_response(err: AccountError) -> Response {
    let status = match &err {
        AccountError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AccountError::Identity(IdentityError::EmailAlreadyRegistered) => StatusCode::CONFLICT,
        AccountError::Identity(IdentityError::WeakPassword) => StatusCode::UNPROCESSABLE_ENTITY,
        AccountError::Identity(IdentityError::InvalidCredentials) => StatusCode::UNAUTHORIZED,
        AccountError::Identity(IdentityError::AccountNotFound) => StatusCode::NOT_FOUND,
        AccountError::Identity(IdentityError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        AccountError::Profiles(ProfileStoreError::NotFound) => StatusCode::NOT_FOUND,
        AccountError::Profiles(ProfileStoreError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        AccountError::EmailNotVerified => StatusCode::FORBIDDEN,
        AccountError::NotSignedIn => StatusCode::UNAUTHORIZED,
        AccountError::AdminRequired => StatusCode::FORBIDDEN,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}

async fn register_handler<I, R>(
    State(service): State<Arc<AccountService<I, R>>>,
    axum::Json(form): axum::Json<RegistrationForm>,
) -> Response
where
    I: IdentityProvider + 'static,
    R: ProfileRepository + 'static,
{
    match service.register(form).await {
        Ok(receipt) => (StatusCode::CREATED, axum::Json(receipt)).into_response(),
        Err(err) => account_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
struct SignInRequest {
    email: String,
    password: String,
}

async fn signin_handler<I, R>(
    State(service): State<Arc<AccountService<I, R>>>,
    axum::Json(credentials): axum::Json<SignInRequest>,
) -> Response
where
    I: IdentityProvider + 'static,
    R: ProfileRepository + 'static,
{
    match service
        .sign_in(&credentials.email, &credentials.password)
        .await
    {
        Ok(session) => (StatusCode::OK, axum::Json(session)).into_response(),
        Err(err) => account_error_response(err),
    }
}

async fn signout_handler<I, R>(
    State(service): State<Arc<AccountService<I, R>>>,
    headers: HeaderMap,
) -> Response
where
    I: IdentityProvider + 'static,
    R: ProfileRepository + 'static,
{
    let Some(token) = bearer_token(&headers) else {
        return account_error_response(AccountError::NotSignedIn);
    };
    match service.sign_out(token).await {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "status": "signed_out" }))).into_response(),
        Err(err) => account_error_response(err),
    }
}

#[derive(Debug, Deserialize)]
struct ResetRequest {
    email: String,
}

async fn reset_handler<I, R>(
    State(service): State<Arc<AccountService<I, R>>>,
    axum::Json(request): axum::Json<ResetRequest>,
) -> Response
where
    I: IdentityProvider + 'static,
    R: ProfileRepository + 'static,
{
    match service.request_password_reset(&request.email).await {
        Ok(()) => (
            StatusCode::OK,
            axum::Json(json!({ "status": "reset_link_sent" })),
        )
            .into_response(),
        Err(err) => account_error_response(err),
    }
}

async fn profile_handler<I, R>(
    State(service): State<Arc<AccountService<I, R>>>,
    headers: HeaderMap,
) -> Response
where
    I: IdentityProvider + 'static,
    R: ProfileRepository + 'static,
{
    let session = match authorize(&service, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match service.profile(&session.user_id).await {
        Ok(profile) => (StatusCode::OK, axum::Json(profile)).into_response(),
        Err(err) => account_error_response(err),
    }
}

async fn update_profile_handler<I, R>(
    State(service): State<Arc<AccountService<I, R>>>,
    headers: HeaderMap,
    axum::Json(update): axum::Json<ProfileUpdate>,
) -> Response
where
    I: IdentityProvider + 'static,
    R: ProfileRepository + 'static,
{
    let session = match authorize(&service, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match service.update_profile(&session, update).await {
        Ok(profile) => (StatusCode::OK, axum::Json(profile)).into_response(),
        Err(err) => account_error_response(err),
    }
}

async fn registered_users_handler<I, R>(
    State(service): State<Arc<AccountService<I, R>>>,
    headers: HeaderMap,
) -> Response
where
    I: IdentityProvider + 'static,
    R: ProfileRepository + 'static,
{
    let session = match authorize(&service, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    match service.registered_users(&session).await {
        Ok(users) => {
            let users: Vec<_> = users
                .into_iter()
                .map(|(id, profile)| json!({ "id": id, "profile": profile }))
                .collect();
            (StatusCode::OK, axum::Json(users)).into_response()
        }
        Err(err) => account_error_response(err),
    }
}

async fn authorize<I, R>(
    service: &AccountService<I, R>,
    headers: &HeaderMap,
) -> Result<super::domain::Session, Response>
where
    I: IdentityProvider + 'static,
    R: ProfileRepository + 'static,
{
    let Some(token) = bearer_token(headers) else {
        return Err(account_error_response(AccountError::NotSignedIn));
    };
    service
        .authorize(token)
        .await
        .map_err(account_error_response)
}
