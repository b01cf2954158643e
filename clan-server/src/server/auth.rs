use axum::extract::{Extension, State};
use axum::http::{Request, StatusCode, header};
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use clan_shared::api;
use clan_shared::domain;
use clan_shared::jwt::{self, JwtClaims};
use tracing::{error, info, warn};

use super::{AppError, AppState};
use crate::storage::models::Identity;

/// How many days of inactivity before a session is considered expired.
const USER_SESSION_IDLE_DAYS: i64 = 14;
/// How many days before mandatory re-login.
const USER_TOKEN_TTL_DAYS: i64 = 30;

#[derive(Clone, Debug)]
pub struct AuthCtx {
    pub claims: JwtClaims,
}

impl AuthCtx {
    /// Loads the identity behind the token; a deleted identity is unauthorized.
    pub async fn identity(&self, state: &AppState) -> Result<Identity, AppError> {
        state
            .store
            .get_identity(&self.claims.identity_id)
            .await
            .map_err(AppError::internal)?
            .ok_or_else(|| {
                warn!(identity_id = %self.claims.identity_id, "auth: identity no longer exists");
                AppError::unauthorized()
            })
    }
}

pub async fn require_bearer(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header_val = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(AppError::unauthorized)?;
    let header_str = header_val.to_str().map_err(|_| AppError::unauthorized())?;
    let Some(token) = header_str.strip_prefix("Bearer ") else {
        return Err(AppError::unauthorized());
    };

    let claims = jwt::decode_and_verify(token, state.config.jwt_secret.as_bytes()).map_err(|e| {
        warn!(error=%e, "auth: jwt decode failed");
        AppError::unauthorized()
    })?;

    let jti = claims.jti.clone();
    let cutoff = Utc::now() - Duration::days(USER_SESSION_IDLE_DAYS);
    match state
        .store
        .touch_session_with_cutoff(&jti, cutoff.naive_utc())
        .await
    {
        Ok(true) => {}
        Ok(false) => {
            warn!(
                jti = %jti,
                email = %claims.sub,
                cutoff = %cutoff,
                "auth: session missing or expired (last_used_at < cutoff)"
            );
            return Err(AppError::unauthorized());
        }
        Err(e) => {
            error!(jti = %jti, error=%e, "auth: touch_session_with_cutoff failed");
            return Err(AppError::internal(e));
        }
    }
    req.extensions_mut().insert(AuthCtx { claims });
    Ok(next.run(req).await)
}

pub async fn issue_jwt_for_identity(
    state: &AppState,
    identity: &Identity,
) -> Result<String, AppError> {
    let jti = uuid::Uuid::new_v4().to_string();
    let exp = (Utc::now() + Duration::days(USER_TOKEN_TTL_DAYS)).timestamp();
    let claims = JwtClaims {
        sub: identity.email.clone(),
        jti: jti.clone(),
        exp,
        identity_id: identity.id.clone(),
    };

    state
        .store
        .create_session(&jti, &identity.email)
        .await
        .map_err(|e| {
            error!(email = %identity.email, error=%e, "login: create_session failed");
            AppError::internal(e)
        })?;
    jwt::encode(&claims, state.config.jwt_secret.as_bytes()).map_err(|e| {
        error!(email = %identity.email, error=%e, "login: jwt encode failed");
        AppError::internal(e)
    })
}

pub async fn api_auth_signup(
    State(state): State<AppState>,
    Json(body): Json<api::SignUpReq>,
) -> Result<(StatusCode, Json<api::IdentityDto>), AppError> {
    let email = domain::validate_email(&body.email)?;
    domain::validate_password(&body.password)?;
    let name = domain::required("name", &body.name)?;

    let cost = state.config.password_cost;
    let password = body.password;
    let password_hash = tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .map_err(AppError::internal)?
        .map_err(AppError::internal)?;
    let identity = state
        .store
        .create_identity(&email, &name, &password_hash)
        .await?;
    info!(email = %identity.email, identity_id = %identity.id, "signup: identity created");
    Ok((StatusCode::CREATED, Json(identity_dto(&identity))))
}

pub async fn api_auth_login(
    State(state): State<AppState>,
    Json(body): Json<api::AuthReq>,
) -> Result<Json<api::AuthResp>, AppError> {
    let email = body.email.trim().to_ascii_lowercase();
    let identity = state
        .store
        .find_identity_by_email(&email)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| {
            warn!(email = %email, "login: unknown email");
            AppError::unauthorized()
        })?;
    if !verify(&body.password, &identity.password_hash).map_err(|e| {
        error!(email = %email, error=%e, "login: bcrypt verify failed");
        AppError::internal(e)
    })? {
        warn!(email = %email, "login: invalid password");
        return Err(AppError::unauthorized());
    }
    let token = issue_jwt_for_identity(&state, &identity).await?;
    Ok(Json(api::AuthResp { token }))
}

pub async fn api_auth_logout(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<StatusCode, AppError> {
    state
        .store
        .delete_session(&auth.claims.jti)
        .await
        .map_err(AppError::internal)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Issues a fresh token and retires the one used to call it.
pub async fn api_auth_renew(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<api::AuthResp>, AppError> {
    let identity = auth.identity(&state).await?;
    let token = issue_jwt_for_identity(&state, &identity).await?;
    state
        .store
        .delete_session(&auth.claims.jti)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(api::AuthResp { token }))
}

pub fn identity_dto(identity: &Identity) -> api::IdentityDto {
    api::IdentityDto {
        id: identity.id.clone(),
        email: identity.email.clone(),
        name: identity.name.clone(),
    }
}
