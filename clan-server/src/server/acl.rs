use super::{AppError, AppState, auth::AuthCtx};
use axum::response::Response;
use axum::{
    extract::{OriginalUri, State},
    http::Request,
    middleware::Next,
};
use clan_shared::path::family_id_from_path;
use tracing::Span;

/// The caller's membership, resolved once per family-scoped request.
#[derive(Clone, Debug)]
pub struct FamilyCtx {
    pub family_id: String,
    pub member_id: String,
}

/// Admits a request under `/api/v1/family/{family_id}` only when the caller's
/// member row belongs to that family.
pub async fn enforce_family_scope(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AppError> {
    let path = req
        .extensions()
        .get::<OriginalUri>()
        .map(|orig| orig.0.path().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let Some(auth) = req.extensions().get::<AuthCtx>() else {
        return Err(AppError::unauthorized());
    };
    let claims = auth.claims.clone();

    let Some(requested) = family_id_from_path(&path) else {
        tracing::warn!(path = %path, "ACL: path outside family scope");
        return Err(AppError::forbidden());
    };

    let member = state
        .store
        .member_for_identity(&claims.identity_id)
        .await
        .map_err(AppError::internal)?;
    let Some(member) = member.filter(|m| m.family_id.as_deref() == Some(requested.as_str()))
    else {
        tracing::warn!(
            method = %req.method(),
            path = %path,
            email = %claims.sub,
            requested_family = %requested,
            "ACL: caller is not a member of the requested family; denying"
        );
        return Err(AppError::forbidden());
    };

    Span::current().record("family_id", tracing::field::display(&requested));
    req.extensions_mut().insert(FamilyCtx {
        family_id: requested,
        member_id: member.id,
    });
    Ok(next.run(req).await)
}
