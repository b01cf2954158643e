use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, NaiveTime, Utc};
use clan_shared::api::{
    DashboardStatsDto, FamilyDto, FamilyNameReq, MemberDto, NewMemberReq, UpdateMemberReq,
};
use clan_shared::auth::Role;
use clan_shared::domain;
use serde::Deserialize;
use tracing::info;

use super::acl::FamilyCtx;
use super::{AppError, AppState, utc};
use crate::storage::models::{Family, Member};

#[derive(Deserialize)]
pub(crate) struct ItemPath {
    pub id: String,
}

pub(crate) fn family_dto(f: Family) -> FamilyDto {
    FamilyDto {
        id: f.id,
        name: f.name,
    }
}

pub(crate) fn member_dto(m: Member) -> Result<MemberDto, AppError> {
    let role: Role = m.role.parse().map_err(AppError::internal)?;
    Ok(MemberDto {
        id: m.id,
        email: m.email,
        name: m.name,
        role,
        family_id: m.family_id,
        onboarding_completed: m.onboarding_completed,
        created_at: utc(m.created_at),
    })
}

pub async fn api_get_family(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
) -> Result<Json<FamilyDto>, AppError> {
    let family = state
        .store
        .get_family(&fam.family_id)
        .await?
        .ok_or_else(|| AppError::not_found("family not found"))?;
    Ok(Json(family_dto(family)))
}

pub async fn api_rename_family(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
    Json(body): Json<FamilyNameReq>,
) -> Result<Json<FamilyDto>, AppError> {
    let name = domain::required("family name", &body.name)?;
    let family = state
        .store
        .rename_family(&fam.family_id, &name)
        .await?
        .ok_or_else(|| AppError::not_found("family not found"))?;
    Ok(Json(family_dto(family)))
}

pub async fn api_list_members(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
) -> Result<Json<Vec<MemberDto>>, AppError> {
    let rows = state.store.list_members(&fam.family_id).await?;
    let items = rows
        .into_iter()
        .map(member_dto)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}

pub async fn api_add_member(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
    Json(body): Json<NewMemberReq>,
) -> Result<(StatusCode, Json<MemberDto>), AppError> {
    let name = domain::required("name", &body.name)?;
    let email = match domain::optional_text(body.email.as_deref()) {
        Some(email) => domain::validate_email(&email)?,
        None => domain::placeholder_email(&name, &state.config.family.placeholder_email_domain),
    };
    let member = state
        .store
        .add_member(&fam.family_id, &name, body.role, &email)
        .await?;
    info!(family_id = %fam.family_id, member_id = %member.id, role = %body.role, "members: added");
    Ok((StatusCode::CREATED, Json(member_dto(member)?)))
}

pub async fn api_update_member(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
    Path(p): Path<ItemPath>,
    Json(body): Json<UpdateMemberReq>,
) -> Result<Json<MemberDto>, AppError> {
    let name = body
        .name
        .as_deref()
        .map(|n| domain::required("name", n))
        .transpose()?;
    let member = state
        .store
        .update_member(&fam.family_id, &p.id, name.as_deref(), body.role)
        .await?
        .ok_or_else(|| AppError::not_found(format!("member not found: {}", p.id)))?;
    Ok(Json(member_dto(member)?))
}

pub async fn api_delete_member(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
    Path(p): Path<ItemPath>,
) -> Result<StatusCode, AppError> {
    if p.id == fam.member_id {
        return Err(AppError::bad_request("you cannot remove yourself"));
    }
    if !state.store.delete_member(&fam.family_id, &p.id).await? {
        return Err(AppError::not_found(format!("member not found: {}", p.id)));
    }
    info!(family_id = %fam.family_id, member_id = %p.id, "members: removed");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn api_dashboard(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
) -> Result<Json<DashboardStatsDto>, AppError> {
    let day_start = Utc::now().date_naive().and_time(NaiveTime::MIN);
    let day_end = day_start + Duration::days(1);
    let stats = state
        .store
        .family_stats(&fam.family_id, day_start, day_end)
        .await?;
    Ok(Json(DashboardStatsDto {
        total_chores: stats.total_chores,
        open_chores: stats.open_chores,
        completed_today: stats.completed_today,
        shopping_needed: stats.shopping_needed,
        meals_planned: stats.meals_planned,
    }))
}
