use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use furever::workflows::accounts::account_router;
use furever::workflows::adoption::{adoption_router, AdoptionApi};

use crate::infra::{Accounts, AppState, Workflows};

pub(crate) fn with_workflow_routes(
    workflows: Arc<Workflows>,
    accounts: Arc<Accounts>,
) -> axum::Router {
    adoption_router(AdoptionApi {
        workflows,
        accounts: accounts.clone(),
    })
    .merge(account_router(accounts))
    .route("/health", axum::routing::get(healthcheck))
    .route("/ready", axum::routing::get(readiness_endpoint))
    .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::build_backend;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use furever::config::AdminConfig;
    use serde_json::Value;
    use tower::util::ServiceExt;

    const ADMIN_EMAIL: &str = "shelter@furever.home";

    fn router_with_backend() -> (axum::Router, crate::infra::Backend) {
        let backend = build_backend(&AdminConfig {
            bootstrap_emails: vec![ADMIN_EMAIL.to_string()],
        });
        let router = with_workflow_routes(backend.workflows.clone(), backend.accounts.clone());
        (router, backend)
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
            .body(Body::from(body.to_string()))
            .expect("request builds")
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).expect("request builds")
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body reads");
        serde_json::from_slice(&bytes).expect("body is json")
    }

    async fn register_and_sign_in(
        router: &axum::Router,
        backend: &crate::infra::Backend,
        name: &str,
        email: &str,
    ) -> String {
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/auth/register",
                None,
                json!({
                    "full_name": name,
                    "email": email,
                    "phone_number": "555-0101",
                    "address": "12 Harbor Lane",
                    "password": "hunter22",
                    "confirm_password": "hunter22",
                }),
            ))
            .await
            .expect("register call works");
        assert_eq!(response.status(), StatusCode::CREATED);

        backend.identity.mark_verified(email);

        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/auth/signin",
                None,
                json!({ "email": email, "password": "hunter22" }),
            ))
            .await
            .expect("signin call works");
        assert_eq!(response.status(), StatusCode::OK);
        let session = body_json(response).await;
        session["token"]
            .as_str()
            .expect("session token present")
            .to_string()
    }

    fn surrender_body() -> Value {
        json!({
            "name": "Biscuit",
            "category": "dog",
            "breed": "Golden Retriever",
            "age": 3,
            "gender": "male",
            "size": "large",
            "description": "House-trained, loves fetch, good with kids.",
            "image": {
                "image_url": "data:image/jpeg;base64,/9j/4AAQSkZJRg==",
                "image_type": "image/jpeg",
            },
            "owner": {
                "owner_name": "Rey Santos",
                "owner_email": "rey@example.com",
                "owner_phone": "555-0134",
                "owner_address": "7 Mango Ave",
            },
        })
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let (router, _) = router_with_backend();
        let response = router
            .oneshot(get_request("/health", None))
            .await
            .expect("health call works");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn unverified_accounts_cannot_sign_in() {
        let (router, _) = router_with_backend();
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/auth/register",
                None,
                json!({
                    "full_name": "Dana Cruz",
                    "email": "dana@example.com",
                    "phone_number": "555-0101",
                    "address": "12 Harbor Lane",
                    "password": "hunter22",
                    "confirm_password": "hunter22",
                }),
            ))
            .await
            .expect("register call works");
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = router
            .oneshot(json_request(
                "POST",
                "/api/v1/auth/signin",
                None,
                json!({ "email": "dana@example.com", "password": "hunter22" }),
            ))
            .await
            .expect("signin call works");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn surrender_requires_a_session() {
        let (router, _) = router_with_backend();
        let response = router
            .oneshot(json_request(
                "POST",
                "/api/v1/pets/surrender",
                None,
                surrender_body(),
            ))
            .await
            .expect("surrender call works");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn admin_endpoints_reject_adopter_sessions() {
        let (router, backend) = router_with_backend();
        let token = register_and_sign_in(&router, &backend, "Dana Cruz", "dana@example.com").await;

        let response = router
            .oneshot(get_request("/api/v1/admin/dashboard", Some(&token)))
            .await
            .expect("dashboard call works");
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn full_adoption_flow_over_http() {
        let (router, backend) = router_with_backend();
        let user_token =
            register_and_sign_in(&router, &backend, "Dana Cruz", "dana@example.com").await;
        let admin_token =
            register_and_sign_in(&router, &backend, "Shelter Staff", ADMIN_EMAIL).await;

        // Surrender a pet.
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/pets/surrender",
                Some(&user_token),
                surrender_body(),
            ))
            .await
            .expect("surrender call works");
        assert_eq!(response.status(), StatusCode::CREATED);
        let pet = body_json(response).await;
        let pet_id = pet["id"].as_str().expect("pet id present").to_string();
        assert_eq!(pet["status"], "pending");

        // Not listed while pending.
        let response = router
            .clone()
            .oneshot(get_request("/api/v1/pets", None))
            .await
            .expect("listing call works");
        assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(0));

        // Admin approves; listing now shows the pet, dog filter included.
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/admin/pets/{pet_id}/approve"),
                Some(&admin_token),
                json!({}),
            ))
            .await
            .expect("approve call works");
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .clone()
            .oneshot(get_request("/api/v1/pets/category/dog", None))
            .await
            .expect("listing call works");
        assert_eq!(body_json(response).await.as_array().map(Vec::len), Some(1));

        // User applies.
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/applications",
                Some(&user_token),
                json!({
                    "pet_id": pet_id,
                    "applicant": {
                        "applicant_name": "Dana Cruz",
                        "applicant_email": "dana@example.com",
                        "applicant_phone": "555-0101",
                        "applicant_address": "12 Harbor Lane",
                    },
                    "message": "We have a fenced yard and plenty of time for walks.",
                }),
            ))
            .await
            .expect("application call works");
        assert_eq!(response.status(), StatusCode::CREATED);
        let application = body_json(response).await;
        let application_id = application["id"]
            .as_str()
            .expect("application id present")
            .to_string();

        // Admin approves the application; the pet is adopted.
        let response = router
            .clone()
            .oneshot(json_request(
                "POST",
                &format!("/api/v1/admin/applications/{application_id}/approve"),
                Some(&admin_token),
                json!({}),
            ))
            .await
            .expect("approval call works");
        assert_eq!(response.status(), StatusCode::OK);
        let approval = body_json(response).await;
        assert_eq!(approval["outcome"], "adopted");
        assert_eq!(approval["pet"]["status"], "adopted");
        assert_eq!(approval["pet"]["adopted_by"], "Dana Cruz");
        assert_eq!(approval["application"]["status"], "approved");

        // Dashboard reflects the adoption.
        let response = router
            .clone()
            .oneshot(get_request("/api/v1/admin/dashboard", Some(&admin_token)))
            .await
            .expect("dashboard call works");
        let counts = body_json(response).await;
        assert_eq!(counts["adopted_pets"], 1);
        assert_eq!(counts["approved_pets"], 0);
        assert_eq!(counts["adoption_applications"], 1);
        assert_eq!(counts["registered_profiles"], 2);

        // The adopter sees the pet in their adopted view.
        let response = router
            .clone()
            .oneshot(get_request("/api/v1/applications/adopted", Some(&user_token)))
            .await
            .expect("adopted view call works");
        let adopted = body_json(response).await;
        assert_eq!(adopted.as_array().map(Vec::len), Some(1));
        assert_eq!(adopted[0]["pet_name"], "Biscuit");

        // Both registrations show up in the admin user table.
        let response = router
            .oneshot(get_request("/api/v1/admin/users", Some(&admin_token)))
            .await
            .expect("user table call works");
        let users = body_json(response).await;
        assert_eq!(users.as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn unknown_category_is_a_bad_request() {
        let (router, _) = router_with_backend();
        let response = router
            .oneshot(get_request("/api/v1/pets/category/hamster", None))
            .await
            .expect("listing call works");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
