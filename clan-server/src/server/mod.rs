mod acl;
pub mod auth;
mod chores;
mod config;
mod family;
mod meals;
mod onboarding;
mod shopping;

use crate::server::auth::AuthCtx;
use crate::storage::StorageError;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware;
use axum::response::Response as AxumResponse;
use axum::{
    Json, Router,
    http::{Method, StatusCode, header},
    routing::{delete, get, post, put},
};
use chrono::{DateTime, NaiveDateTime, Utc};
use clan_shared::api::{self, API_V1_PREFIX};
use clan_shared::domain::ValidationError;
pub use config::{AppConfig, ConfigError, FamilyConfig};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Span, info_span};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: crate::storage::Store,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: AppConfig, store: crate::storage::Store) -> Self {
        Self {
            config,
            store,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

#[derive(Clone, Debug)]
struct ReqId(pub String);

pub fn router(state: AppState) -> Router {
    let family_scoped = Router::new()
        .route(
            "/api/v1/family/{family_id}",
            get(family::api_get_family).put(family::api_rename_family),
        )
        .route(
            "/api/v1/family/{family_id}/dashboard",
            get(family::api_dashboard),
        )
        .route(
            "/api/v1/family/{family_id}/members",
            get(family::api_list_members).post(family::api_add_member),
        )
        .route(
            "/api/v1/family/{family_id}/members/{id}",
            put(family::api_update_member).delete(family::api_delete_member),
        )
        .route(
            "/api/v1/family/{family_id}/chores",
            get(chores::api_list_chores).post(chores::api_create_chore),
        )
        .route(
            "/api/v1/family/{family_id}/chores/{id}",
            put(chores::api_update_chore).delete(chores::api_delete_chore),
        )
        .route(
            "/api/v1/family/{family_id}/chores/{id}/toggle",
            post(chores::api_toggle_chore),
        )
        .route(
            "/api/v1/family/{family_id}/chores/{id}/status",
            put(chores::api_set_chore_status),
        )
        .route(
            "/api/v1/family/{family_id}/shopping",
            get(shopping::api_list_shopping).post(shopping::api_add_shopping_item),
        )
        .route(
            "/api/v1/family/{family_id}/shopping/clear-purchased",
            post(shopping::api_clear_purchased),
        )
        .route(
            "/api/v1/family/{family_id}/shopping/{id}",
            delete(shopping::api_delete_shopping_item),
        )
        .route(
            "/api/v1/family/{family_id}/shopping/{id}/toggle",
            post(shopping::api_toggle_shopping_item),
        )
        .route(
            "/api/v1/family/{family_id}/meals",
            get(meals::api_list_meals).post(meals::api_create_meal),
        )
        .route(
            "/api/v1/family/{family_id}/meals/{id}",
            put(meals::api_update_meal).delete(meals::api_delete_meal),
        )
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            acl::enforce_family_scope,
        ))
        .layer(middleware::from_fn(set_auth_span_fields))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    let private = Router::new()
        .route("/api/v1/auth/logout", post(auth::api_auth_logout))
        .route("/api/v1/auth/renew", post(auth::api_auth_renew))
        .route("/api/v1/me", get(onboarding::api_me))
        .route("/api/v1/me/onboarding", get(onboarding::api_me_onboarding))
        .route("/api/v1/me/route", get(onboarding::api_me_route))
        .route("/api/v1/me/family", post(onboarding::api_ensure_family))
        .route(
            "/api/v1/onboarding/family",
            post(onboarding::api_onboarding_family),
        )
        .route(
            "/api/v1/onboarding/complete",
            post(onboarding::api_onboarding_complete),
        )
        .with_state(state.clone())
        .layer(middleware::from_fn(set_auth_span_fields))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    // Trace with request context (method, path, request_id)
    let trace = TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
        let request_id = req
            .extensions()
            .get::<ReqId>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info_span!(
            "request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
            email = tracing::field::Empty,
            family_id = tracing::field::Empty
        )
    });

    let app = Router::new()
        .route("/healthz", get(health))
        .route("/api/v1/version", get(api_version))
        .route("/api/v1/auth/signup", post(auth::api_auth_signup))
        .route("/api/v1/auth/login", post(auth::api_auth_login))
        .merge(private)
        .merge(family_scoped)
        .fallback(not_found)
        .with_state(state.clone())
        .layer(trace)
        .layer(middleware::from_fn(add_security_headers))
        .layer(middleware::from_fn(add_request_id));

    // Optionally add CORS for dev if configured
    if let Some(origin) = &state.config.dev_cors_origin {
        let hv = header::HeaderValue::from_str(origin)
            .unwrap_or(header::HeaderValue::from_static("http://localhost:5173"));
        let cors = CorsLayer::new()
            .allow_origin(hv)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
        app.layer(cors)
    } else {
        app
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn api_version() -> Json<api::VersionDto> {
    Json(api::VersionDto {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn not_found(uri: axum::http::Uri) -> AppError {
    AppError::not_found(format!("no route for {}", uri.path()))
}

async fn add_request_id(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let hdr = HeaderName::from_static("x-request-id");
    // Use provided x-request-id if present, else generate
    let rid = req
        .headers()
        .get(&hdr)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(ReqId(rid.clone()));
    let mut resp = next.run(req).await;
    if let Ok(hv) = HeaderValue::from_str(&rid) {
        resp.headers_mut().insert(hdr, hv);
    }
    Ok(resp)
}

async fn add_security_headers(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let path = req.uri().path().to_string();
    let mut resp = next.run(req).await;

    let headers = resp.headers_mut();
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-resource-policy"),
        HeaderValue::from_static("same-origin"),
    );

    // Disable caching for API and health endpoints
    if path == "/healthz" || path.starts_with(API_V1_PREFIX) {
        headers.insert(
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        );
        headers.insert(
            HeaderName::from_static("pragma"),
            HeaderValue::from_static("no-cache"),
        );
    }

    Ok(resp)
}

/// Sits between bearer auth and the handlers, so `AuthCtx` is already present.
async fn set_auth_span_fields(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    if let Some(auth) = req.extensions().get::<AuthCtx>() {
        Span::current().record("email", tracing::field::display(&auth.claims.sub));
    }
    Ok(next.run(req).await)
}

/// Stored timestamps are naive UTC.
pub(crate) fn utc(t: NaiveDateTime) -> DateTime<Utc> {
    t.and_utc()
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized,
    Forbidden,
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl AppError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }
    fn unauthorized() -> Self {
        Self::Unauthorized
    }
    fn forbidden() -> Self {
        Self::Forbidden
    }
    fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }
    fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidInput(m) => Self::BadRequest(m),
            StorageError::NotFound(m) => Self::NotFound(m),
            StorageError::Conflict(m) => Self::Conflict(m),
            other => Self::internal(other),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, msg, kind, detail) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m, "bad_request", None),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized".into(),
                "unauthorized",
                None,
            ),
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".into(), "forbidden", None),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m, "not_found", None),
            AppError::Conflict(m) => (StatusCode::CONFLICT, m, "conflict", None),
            // Do not leak internal error details to clients, but log them
            AppError::Internal(m) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".into(),
                "internal",
                Some(m),
            ),
        };
        if let Some(detail) = detail {
            tracing::error!(
                status = %status,
                kind = kind,
                message = %msg,
                detail = %detail,
                "request failed"
            );
        } else if status.is_client_error() {
            tracing::warn!(status = %status, kind = kind, message = %msg, "request rejected");
        }
        let body = axum::Json(ErrorBody { error: msg });
        (status, body).into_response()
    }
}
