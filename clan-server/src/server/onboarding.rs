//! Current-identity endpoints: profile, onboarding progress, route guard and
//! family provisioning.

use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::Json;
use clan_shared::api::{
    EnsureFamilyResp, FamilyDto, FamilyNameReq, MeDto, OnboardingStatusDto, RouteDecisionDto,
    RouteQuery,
};
use clan_shared::domain::{self, OnboardingStatus};
use clan_shared::guard::{Screen, route_decision};
use tracing::info;

use super::auth::{AuthCtx, identity_dto};
use super::family::{family_dto, member_dto};
use super::{AppError, AppState};
use crate::storage::models::Member;

pub(crate) fn onboarding_status(
    state: &AppState,
    member: Option<&Member>,
) -> OnboardingStatusDto {
    let completed = member.is_some_and(|m| m.onboarding_completed);
    let family_id = member.and_then(|m| m.family_id.clone());
    let status = OnboardingStatus {
        completed,
        has_family: family_id.is_some(),
    };
    OnboardingStatusDto {
        completed,
        has_family: status.has_family,
        family_id,
        stage: status.stage(),
        min_members: state.config.family.min_onboarding_members,
    }
}

async fn caller_member(state: &AppState, auth: &AuthCtx) -> Result<Option<Member>, AppError> {
    state
        .store
        .member_for_identity(&auth.claims.identity_id)
        .await
        .map_err(AppError::internal)
}

pub async fn api_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<MeDto>, AppError> {
    let identity = auth.identity(&state).await?;
    let member = caller_member(&state, &auth).await?;
    let status = onboarding_status(&state, member.as_ref());
    let member = member.map(member_dto).transpose()?;
    Ok(Json(MeDto {
        identity: identity_dto(&identity),
        member,
        status,
    }))
}

pub async fn api_me_onboarding(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<OnboardingStatusDto>, AppError> {
    let member = caller_member(&state, &auth).await?;
    Ok(Json(onboarding_status(&state, member.as_ref())))
}

pub async fn api_me_route(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Query(q): Query<RouteQuery>,
) -> Result<Json<RouteDecisionDto>, AppError> {
    let screen: Screen = q
        .path
        .parse()
        .map_err(|e: domain::ParseEnumError| AppError::bad_request(e.to_string()))?;
    let member = caller_member(&state, &auth).await?;
    let status = onboarding_status(&state, member.as_ref()).status();
    let decision = route_decision(screen, Some(&status));
    Ok(Json(RouteDecisionDto::new(screen, decision)))
}

/// Get-or-create the caller's family with the configured default name.
pub async fn api_ensure_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<Json<EnsureFamilyResp>, AppError> {
    let identity = auth.identity(&state).await?;
    let (family, created) = state
        .store
        .ensure_family(&identity, &state.config.family.default_name)
        .await?;
    if created {
        info!(email = %identity.email, family_id = %family.id, "provision: family created");
    }
    Ok(Json(EnsureFamilyResp {
        family_id: family.id,
        created,
    }))
}

pub async fn api_onboarding_family(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
    Json(body): Json<FamilyNameReq>,
) -> Result<Json<FamilyDto>, AppError> {
    let name = domain::required("family name", &body.name)?;
    let identity = auth.identity(&state).await?;
    let (family, created) = state
        .store
        .create_family_for_identity(&identity, &name)
        .await?;
    info!(
        email = %identity.email,
        family_id = %family.id,
        created,
        "onboarding: family step saved"
    );
    Ok(Json(family_dto(family)))
}

pub async fn api_onboarding_complete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthCtx>,
) -> Result<StatusCode, AppError> {
    let member = caller_member(&state, &auth).await?;
    let Some(family_id) = member.as_ref().and_then(|m| m.family_id.clone()) else {
        return Err(AppError::bad_request("create your family first"));
    };
    let count = state.store.count_members(&family_id).await?;
    domain::ensure_can_finish(
        usize::try_from(count).unwrap_or(0),
        state.config.family.min_onboarding_members,
    )?;
    state
        .store
        .set_onboarding_completed(&auth.claims.identity_id)
        .await?;
    info!(family_id = %family_id, members = count, "onboarding: completed");
    Ok(StatusCode::NO_CONTENT)
}
