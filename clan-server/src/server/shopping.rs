use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use clan_shared::api::{ClearPurchasedResp, NewShoppingItemReq, ShoppingItemDto};
use clan_shared::domain;
use tracing::info;

use super::acl::FamilyCtx;
use super::family::ItemPath;
use super::{AppError, AppState, utc};
use crate::storage::models::ShoppingItem;

fn item_dto(i: ShoppingItem) -> ShoppingItemDto {
    ShoppingItemDto {
        id: i.id,
        name: i.name,
        checked: i.checked,
        category: i.category,
        created_at: utc(i.created_at),
    }
}

pub async fn api_list_shopping(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
) -> Result<Json<Vec<ShoppingItemDto>>, AppError> {
    let rows = state.store.list_shopping(&fam.family_id).await?;
    Ok(Json(rows.into_iter().map(item_dto).collect()))
}

pub async fn api_add_shopping_item(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
    Json(body): Json<NewShoppingItemReq>,
) -> Result<(StatusCode, Json<ShoppingItemDto>), AppError> {
    let name = domain::required("name", &body.name)?;
    let category = domain::optional_text(body.category.as_deref());
    let item = state
        .store
        .add_shopping_item(&fam.family_id, &name, category.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(item_dto(item))))
}

pub async fn api_toggle_shopping_item(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
    Path(p): Path<ItemPath>,
) -> Result<Json<ShoppingItemDto>, AppError> {
    let item = state
        .store
        .toggle_shopping_item(&fam.family_id, &p.id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("item not found: {}", p.id)))?;
    Ok(Json(item_dto(item)))
}

pub async fn api_delete_shopping_item(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
    Path(p): Path<ItemPath>,
) -> Result<StatusCode, AppError> {
    if !state
        .store
        .delete_shopping_item(&fam.family_id, &p.id)
        .await?
    {
        return Err(AppError::not_found(format!("item not found: {}", p.id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn api_clear_purchased(
    State(state): State<AppState>,
    Extension(fam): Extension<FamilyCtx>,
) -> Result<Json<ClearPurchasedResp>, AppError> {
    let deleted = state.store.clear_purchased(&fam.family_id).await?;
    info!(family_id = %fam.family_id, deleted, "shopping: cleared purchased items");
    Ok(Json(ClearPurchasedResp { deleted }))
}
