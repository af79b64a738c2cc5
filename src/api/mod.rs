//! API layer - HTTP handlers and routing
//!
//! This module contains all HTTP endpoints:
//! - Record API endpoints (public reads, admin-gated writes)
//! - Auth API endpoints (login, logout, current user)
//!
//! Routes live under `/api/v1`. Reads are public; every write goes through
//! the auth and admin middleware.

pub mod auth;
pub mod middleware;
pub mod records;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState, AuthenticatedUser};

/// Uploads are capped at 5 MiB; leave headroom for the other form fields.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Build the main API router
pub fn build_api_router(state: AppState) -> Router<AppState> {
    // Admin routes (all record writes)
    let admin_routes = Router::new()
        .route("/{resource}", post(records::create_record))
        .route("/{resource}/{id}", patch(records::update_record))
        .route("/{resource}/{id}", delete(records::delete_record))
        .nest("/auth", auth::protected_router())
        .route_layer(axum_middleware::from_fn(middleware::require_admin))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::require_auth,
        ));

    // Public routes
    Router::new()
        .route("/{resource}", get(records::get_collection))
        .route("/{resource}/{id}", get(records::get_record))
        .route("/{resource}/{id}/image", get(records::get_record_image))
        .nest("/auth", auth::public_router())
        .merge(admin_routes)
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
            .allow_credentials(true),
        Err(_) => {
            tracing::warn!(origin = %cors_origin, "Invalid CORS origin; using permissive CORS");
            CorsLayer::permissive()
        }
    };

    Router::new()
        .nest("/api/v1", build_api_router(state.clone()))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared test fixtures: an app state over in-memory SQLite and a
    //! ready-made admin session.

    use std::sync::Arc;

    use super::AppState;
    use crate::config::AuthConfig;
    use crate::db::repositories::{
        SqlxRecordRepository, SqlxSessionRepository, SqlxUserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::services::{RecordService, UserService};

    pub(crate) const ADMIN_USERNAME: &str = "gaffer";
    pub(crate) const ADMIN_PASSWORD: &str = "touchline";

    /// Build an `AppState` over a fresh in-memory database with the admin
    /// account bootstrapped.
    pub(crate) async fn test_state() -> AppState {
        let pool = create_test_pool().await.unwrap();
        migrations::run_migrations(&pool).await.unwrap();

        let user_service = Arc::new(UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
            168,
        ));
        user_service
            .bootstrap_admin(&AuthConfig {
                admin_username: ADMIN_USERNAME.to_string(),
                admin_password: ADMIN_PASSWORD.to_string(),
                session_ttl_hours: 168,
            })
            .await
            .unwrap();

        AppState {
            record_service: Arc::new(RecordService::new(SqlxRecordRepository::boxed(pool))),
            user_service,
        }
    }

    /// Open an admin session and return its token
    pub(crate) async fn admin_token(state: &AppState) -> String {
        state
            .user_service
            .login(ADMIN_USERNAME, ADMIN_PASSWORD)
            .await
            .unwrap()
            .token
    }
}

#[cfg(test)]
mod tests {
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::Value;

    use super::testing::{admin_token, test_state};
    use super::*;

    async fn server() -> (TestServer, AppState) {
        let state = test_state().await;
        let server = TestServer::new(build_router(state.clone(), "http://localhost:3000"))
            .expect("Failed to build test server");
        (server, state)
    }

    fn career_form() -> MultipartForm {
        MultipartForm::new()
            .add_text("title", "Striker years")
            .add_text("content", "Scored plenty in the second division.")
            .add_text("date", "1998-2004")
            .add_text("imageSource", "URL")
            .add_text("imageUrl", "https://example.com/a.jpg")
    }

    // ========================================================================
    // Public reads
    // ========================================================================

    #[tokio::test]
    async fn test_list_unknown_resource_is_404() {
        let (server, _) = server().await;
        let response = server.get("/api/v1/trophy-cabinet").await;
        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn test_empty_collection_lists_empty_array() {
        let (server, _) = server().await;
        let response = server.get("/api/v1/player-career").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_missing_singleton_is_404() {
        let (server, _) = server().await;
        let response = server.get("/api/v1/early-life").await;
        response.assert_status_not_found();
    }

    // ========================================================================
    // Admin gate
    // ========================================================================

    #[tokio::test]
    async fn test_create_without_token_is_401() {
        let (server, _) = server().await;
        let response = server
            .post("/api/v1/player-career")
            .multipart(career_form())
            .await;
        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_delete_with_bad_token_is_401() {
        let (server, _) = server().await;
        let response = server
            .delete("/api/v1/player-career/1")
            .authorization_bearer("not-a-session")
            .await;
        response.assert_status_unauthorized();
    }

    // ========================================================================
    // Write round trips
    // ========================================================================

    #[tokio::test]
    async fn test_create_fetch_update_delete() {
        let (server, state) = server().await;
        let token = admin_token(&state).await;

        let created = server
            .post("/api/v1/player-career")
            .authorization_bearer(&token)
            .multipart(career_form())
            .await;
        created.assert_status(axum::http::StatusCode::CREATED);
        let record = created.json::<Value>();
        let id = record["id"].as_i64().unwrap();
        assert_eq!(record["title"], "Striker years");
        assert_eq!(record["imageSource"], "URL");

        let fetched = server
            .get(&format!("/api/v1/player-career/{}", id))
            .await;
        fetched.assert_status_ok();
        assert_eq!(fetched.json::<Value>()["date"], "1998-2004");

        let updated = server
            .patch(&format!("/api/v1/player-career/{}", id))
            .authorization_bearer(&token)
            .multipart(MultipartForm::new().add_text("title", "Final seasons"))
            .await;
        updated.assert_status_ok();
        assert_eq!(updated.json::<Value>()["title"], "Final seasons");

        let deleted = server
            .delete(&format!("/api/v1/player-career/{}", id))
            .authorization_bearer(&token)
            .await;
        deleted.assert_status(axum::http::StatusCode::NO_CONTENT);

        server
            .get(&format!("/api/v1/player-career/{}", id))
            .await
            .assert_status_not_found();
    }

    #[tokio::test]
    async fn test_invalid_create_reports_field_errors() {
        let (server, state) = server().await;
        let token = admin_token(&state).await;

        let response = server
            .post("/api/v1/coaching-career")
            .authorization_bearer(&token)
            .multipart(
                MultipartForm::new()
                    .add_text("title", "Hi")
                    .add_text("imageSource", "URL"),
            )
            .await;
        response.assert_status_bad_request();

        let body = response.json::<Value>();
        assert_eq!(
            body["errors"]["title"],
            "Title must be at least 6 characters long"
        );
        assert_eq!(body["errors"]["content"], "Content is required");
        assert_eq!(body["errors"]["date"], "Date is required");
        assert_eq!(body["errors"]["image"], "Please provide an image.");
    }

    #[tokio::test]
    async fn test_uploaded_image_is_served_back() {
        let (server, state) = server().await;
        let token = admin_token(&state).await;

        let bytes = vec![0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a];
        let form = MultipartForm::new()
            .add_text("title", "Growing up")
            .add_text("content", "Kicked a ball against the garage door.")
            .add_text("imageSource", "UPLOAD")
            .add_part(
                "imageFile",
                Part::bytes(bytes.clone())
                    .file_name("me.png")
                    .mime_type("image/png"),
            );

        let created = server
            .post("/api/v1/early-life")
            .authorization_bearer(&token)
            .multipart(form)
            .await;
        created.assert_status(axum::http::StatusCode::CREATED);
        let id = created.json::<Value>()["id"].as_i64().unwrap();

        // The singleton read returns the record without an id
        let singleton = server.get("/api/v1/early-life").await;
        singleton.assert_status_ok();
        assert_eq!(singleton.json::<Value>()["id"].as_i64().unwrap(), id);

        let image = server
            .get(&format!("/api/v1/early-life/{}/image", id))
            .await;
        image.assert_status_ok();
        assert_eq!(image.header("content-type"), "image/png");
        assert_eq!(image.as_bytes().as_ref(), bytes.as_slice());
    }

    #[tokio::test]
    async fn test_image_endpoint_404_for_url_records() {
        let (server, state) = server().await;
        let token = admin_token(&state).await;

        let created = server
            .post("/api/v1/player-career")
            .authorization_bearer(&token)
            .multipart(career_form())
            .await;
        let id = created.json::<Value>()["id"].as_i64().unwrap();

        server
            .get(&format!("/api/v1/player-career/{}/image", id))
            .await
            .assert_status_not_found();
    }

    // ========================================================================
    // Auth endpoints
    // ========================================================================

    #[tokio::test]
    async fn test_login_logout_me() {
        let (server, _) = server().await;

        let login = server
            .post("/api/v1/auth/login")
            .json(&serde_json::json!({
                "username": super::testing::ADMIN_USERNAME,
                "password": super::testing::ADMIN_PASSWORD,
            }))
            .await;
        login.assert_status_ok();
        let token = login.json::<Value>()["token"].as_str().unwrap().to_string();

        let me = server
            .get("/api/v1/auth/me")
            .authorization_bearer(&token)
            .await;
        me.assert_status_ok();
        assert_eq!(me.json::<Value>()["username"], "gaffer");

        server
            .post("/api/v1/auth/logout")
            .authorization_bearer(&token)
            .await
            .assert_status_ok();

        server
            .get("/api/v1/auth/me")
            .authorization_bearer(&token)
            .await
            .assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_is_401() {
        let (server, _) = server().await;
        server
            .post("/api/v1/auth/login")
            .json(&serde_json::json!({
                "username": super::testing::ADMIN_USERNAME,
                "password": "wrong",
            }))
            .await
            .assert_status_unauthorized();
    }
}
