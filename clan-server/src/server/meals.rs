use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use clan_shared::api::{MealSlotDto, NewMealSlotReq, UpdateMealSlotReq};
use clan_shared::domain::{self, DayOfWeek, MealType};

use super::acl::FamilyCtx;
use super::family::ItemPath;
use super::{AppError, AppState, utc};
use crate::storage::models::{MealSlot, MealSlotChanges};

fn slot_dto(m: MealSlot) -> Result<MealSlotDto, AppError> {
    let day = u8::try_from(m.day_of_week)
        .map_err(AppError::internal)
        .and_then(|d| DayOfWeek::new(d).map_err(AppError::internal))?;
    let meal_type: MealType = m.meal_type.parse().map_err(AppError::internal)?;
    Ok(MealSlotDto {
        id: m.id,
        day_of_week: day,
        meal_type,
        meal_name: m.meal_name,
        recipe_notes: m.recipe_notes,
        created_at: utc(m.created_at),
    })
}

/// Blank name or notes are stored as NULL.
fn slot_changes(meal_name: Option<&str>, recipe_notes: Option<&str>) -> MealSlotChanges {
    MealSlotChanges {
        meal_name: domain::optional_text(meal_name),
        recipe_notes: domain::optional_text(recipe_notes),
    }
}

pub async fn api_list_meals(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
) -> Result<Json<Vec<MealSlotDto>>, AppError> {
    let rows = state.store.list_meals(&fam.family_id).await?;
    let items = rows
        .into_iter()
        .map(slot_dto)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(items))
}

pub async fn api_create_meal(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
    Json(body): Json<NewMealSlotReq>,
) -> Result<(StatusCode, Json<MealSlotDto>), AppError> {
    let changes = slot_changes(body.meal_name.as_deref(), body.recipe_notes.as_deref());
    let slot = state
        .store
        .create_meal(
            &fam.family_id,
            body.day_of_week.index(),
            body.meal_type,
            changes,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(slot_dto(slot)?)))
}

pub async fn api_update_meal(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
    Path(p): Path<ItemPath>,
    Json(body): Json<UpdateMealSlotReq>,
) -> Result<Json<MealSlotDto>, AppError> {
    let changes = slot_changes(body.meal_name.as_deref(), body.recipe_notes.as_deref());
    let slot = state
        .store
        .update_meal(&fam.family_id, &p.id, changes)
        .await?
        .ok_or_else(|| AppError::not_found(format!("meal slot not found: {}", p.id)))?;
    Ok(Json(slot_dto(slot)?))
}

pub async fn api_delete_meal(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
    Path(p): Path<ItemPath>,
) -> Result<StatusCode, AppError> {
    if !state.store.delete_meal(&fam.family_id, &p.id).await? {
        return Err(AppError::not_found(format!("meal slot not found: {}", p.id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
