use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use clan_shared::api::{ChoreDto, ChoreStatusReq, NewChoreReq, UpdateChoreReq};
use clan_shared::domain::{self, ChoreStatus, DEFAULT_CHORE_POINTS};

use super::acl::FamilyCtx;
use super::family::ItemPath;
use super::{AppError, AppState, utc};
use crate::storage::ChoreRow;
use crate::storage::models::ChoreChanges;

fn chore_dto((c, assignee_name): ChoreRow) -> Result<ChoreDto, AppError> {
    let status: ChoreStatus = c.status.parse().map_err(AppError::internal)?;
    Ok(ChoreDto {
        id: c.id,
        title: c.title,
        description: c.description,
        assigned_to: c.assigned_to,
        assignee_name,
        points: c.points,
        status,
        due_date: c.due_date,
        created_at: utc(c.created_at),
        completed_at: c.completed_at.map(utc),
    })
}

fn chore_changes(
    title: &str,
    description: Option<&str>,
    assigned_to: Option<&str>,
    points: i32,
    due_date: Option<chrono::NaiveDate>,
) -> Result<ChoreChanges, AppError> {
    Ok(ChoreChanges {
        title: domain::required("title", title)?,
        description: domain::optional_text(description),
        assigned_to: domain::optional_text(assigned_to),
        points: domain::validate_points(points)?,
        due_date,
    })
}

fn chore_not_found(id: &str) -> AppError {
    AppError::not_found(format!("chore not found: {id}"))
}

pub async fn api_list_chores(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
) -> Result<Json<Vec<ChoreDto>>, AppError> {
    let rows = state.store.list_chores(&fam.family_id).await?;
    let items = rows
        .into_iter()
        .map(chore_dto)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}

pub async fn api_create_chore(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
    Json(body): Json<NewChoreReq>,
) -> Result<(StatusCode, Json<ChoreDto>), AppError> {
    let fields = chore_changes(
        &body.title,
        body.description.as_deref(),
        body.assigned_to.as_deref(),
        body.points.unwrap_or(DEFAULT_CHORE_POINTS),
        body.due_date,
    )?;
    let row = state.store.create_chore(&fam.family_id, fields).await?;
    Ok((StatusCode::CREATED, Json(chore_dto(row)?)))
}

pub async fn api_update_chore(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
    Path(p): Path<ItemPath>,
    Json(body): Json<UpdateChoreReq>,
) -> Result<Json<ChoreDto>, AppError> {
    let fields = chore_changes(
        &body.title,
        body.description.as_deref(),
        body.assigned_to.as_deref(),
        body.points,
        body.due_date,
    )?;
    let row = state
        .store
        .update_chore(&fam.family_id, &p.id, fields)
        .await?
        .ok_or_else(|| chore_not_found(&p.id))?;
    Ok(Json(chore_dto(row)?))
}

pub async fn api_toggle_chore(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
    Path(p): Path<ItemPath>,
) -> Result<Json<ChoreDto>, AppError> {
    let row = state
        .store
        .set_chore_status(&fam.family_id, &p.id, None)
        .await?
        .ok_or_else(|| chore_not_found(&p.id))?;
    Ok(Json(chore_dto(row)?))
}

pub async fn api_set_chore_status(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
    Path(p): Path<ItemPath>,
    Json(body): Json<ChoreStatusReq>,
) -> Result<Json<ChoreDto>, AppError> {
    let row = state
        .store
        .set_chore_status(&fam.family_id, &p.id, Some(body.status))
        .await?
        .ok_or_else(|| chore_not_found(&p.id))?;
    Ok(Json(chore_dto(row)?))
}

pub async fn api_delete_chore(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
    Path(p): Path<ItemPath>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_chore(&fam.family_id, &p.id).await? {
        return Err(chore_not_found(&p.id));
    }
    Ok(StatusCode::NO_CONTENT)
}
