//! Interface between the screens and the family data service.

use async_trait::async_trait;
use clan_shared::api::rest::{self, RestError};
use clan_shared::api::{
    ChoreDto, ChoreStatusReq, ClearPurchasedResp, DashboardStatsDto, EnsureFamilyResp, FamilyDto,
    FamilyNameReq, MeDto, MealSlotDto, MemberDto, NewChoreReq, NewMealSlotReq, NewMemberReq,
    NewShoppingItemReq, OnboardingStatusDto, RouteDecisionDto, ShoppingItemDto, UpdateChoreReq,
    UpdateMealSlotReq, UpdateMemberReq,
};
use clan_shared::guard::Screen;
use tracing::warn;

use crate::AppError;

/// Row-scoped operations the screens need, already bound to a signed-in identity.
#[async_trait]
pub trait FamilyBackend: Send + Sync {
    async fn me(&self) -> Result<MeDto, AppError>;
    async fn onboarding_status(&self) -> Result<OnboardingStatusDto, AppError>;
    async fn route(&self, screen: Screen) -> Result<RouteDecisionDto, AppError>;
    async fn ensure_family(&self) -> Result<EnsureFamilyResp, AppError>;
    async fn create_family(&self, name: &str) -> Result<FamilyDto, AppError>;
    async fn complete_onboarding(&self) -> Result<(), AppError>;

    async fn get_family(&self, family_id: &str) -> Result<FamilyDto, AppError>;
    async fn rename_family(&self, family_id: &str, name: &str) -> Result<FamilyDto, AppError>;
    async fn list_members(&self, family_id: &str) -> Result<Vec<MemberDto>, AppError>;
    async fn add_member(&self, family_id: &str, req: &NewMemberReq) -> Result<MemberDto, AppError>;
    async fn update_member(
        &self,
        family_id: &str,
        member_id: &str,
        req: &UpdateMemberReq,
    ) -> Result<MemberDto, AppError>;
    async fn delete_member(&self, family_id: &str, member_id: &str) -> Result<(), AppError>;

    async fn list_chores(&self, family_id: &str) -> Result<Vec<ChoreDto>, AppError>;
    async fn create_chore(&self, family_id: &str, req: &NewChoreReq) -> Result<ChoreDto, AppError>;
    async fn update_chore(
        &self,
        family_id: &str,
        chore_id: &str,
        req: &UpdateChoreReq,
    ) -> Result<ChoreDto, AppError>;
    async fn toggle_chore(&self, family_id: &str, chore_id: &str) -> Result<ChoreDto, AppError>;
    async fn set_chore_status(
        &self,
        family_id: &str,
        chore_id: &str,
        req: &ChoreStatusReq,
    ) -> Result<ChoreDto, AppError>;
    async fn delete_chore(&self, family_id: &str, chore_id: &str) -> Result<(), AppError>;

    async fn list_shopping(&self, family_id: &str) -> Result<Vec<ShoppingItemDto>, AppError>;
    async fn add_shopping_item(
        &self,
        family_id: &str,
        req: &NewShoppingItemReq,
    ) -> Result<ShoppingItemDto, AppError>;
    async fn toggle_shopping_item(
        &self,
        family_id: &str,
        item_id: &str,
    ) -> Result<ShoppingItemDto, AppError>;
    async fn delete_shopping_item(&self, family_id: &str, item_id: &str) -> Result<(), AppError>;
    async fn clear_purchased(&self, family_id: &str) -> Result<ClearPurchasedResp, AppError>;

    async fn list_meals(&self, family_id: &str) -> Result<Vec<MealSlotDto>, AppError>;
    async fn create_meal(
        &self,
        family_id: &str,
        req: &NewMealSlotReq,
    ) -> Result<MealSlotDto, AppError>;
    async fn update_meal(
        &self,
        family_id: &str,
        slot_id: &str,
        req: &UpdateMealSlotReq,
    ) -> Result<MealSlotDto, AppError>;
    async fn delete_meal(&self, family_id: &str, slot_id: &str) -> Result<(), AppError>;

    async fn dashboard(&self, family_id: &str) -> Result<DashboardStatsDto, AppError>;
}

/// `FamilyBackend` over the HTTP API.
pub struct RestBackend {
    base: String,
    token: String,
}

impl RestBackend {
    pub fn new(base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            token: token.into(),
        }
    }
}

/// Logs a failed request at the call site and turns it into a displayable error.
pub(crate) fn request_failed(op: &'static str) -> impl FnOnce(RestError) -> AppError {
    move |e| {
        warn!(op, error = %e, "request failed");
        match e.status() {
            Some(401) => AppError::NotSignedIn,
            _ => AppError::Http(e.message()),
        }
    }
}

#[async_trait]
impl FamilyBackend for RestBackend {
    async fn me(&self) -> Result<MeDto, AppError> {
        rest::me(&self.base, &self.token)
            .await
            .map_err(request_failed("me"))
    }

    async fn onboarding_status(&self) -> Result<OnboardingStatusDto, AppError> {
        rest::onboarding_status(&self.base, &self.token)
            .await
            .map_err(request_failed("onboarding_status"))
    }

    async fn route(&self, screen: Screen) -> Result<RouteDecisionDto, AppError> {
        rest::route(&self.base, &self.token, screen.path())
            .await
            .map_err(request_failed("route"))
    }

    async fn ensure_family(&self) -> Result<EnsureFamilyResp, AppError> {
        rest::ensure_family(&self.base, &self.token)
            .await
            .map_err(request_failed("ensure_family"))
    }

    async fn create_family(&self, name: &str) -> Result<FamilyDto, AppError> {
        let req = FamilyNameReq {
            name: name.to_string(),
        };
        rest::onboarding_create_family(&self.base, &self.token, &req)
            .await
            .map_err(request_failed("create_family"))
    }

    async fn complete_onboarding(&self) -> Result<(), AppError> {
        rest::onboarding_complete(&self.base, &self.token)
            .await
            .map_err(request_failed("complete_onboarding"))
    }

    async fn get_family(&self, family_id: &str) -> Result<FamilyDto, AppError> {
        rest::get_family(&self.base, family_id, &self.token)
            .await
            .map_err(request_failed("get_family"))
    }

    async fn rename_family(&self, family_id: &str, name: &str) -> Result<FamilyDto, AppError> {
        let req = FamilyNameReq {
            name: name.to_string(),
        };
        rest::rename_family(&self.base, family_id, &self.token, &req)
            .await
            .map_err(request_failed("rename_family"))
    }

    async fn list_members(&self, family_id: &str) -> Result<Vec<MemberDto>, AppError> {
        rest::list_members(&self.base, family_id, &self.token)
            .await
            .map_err(request_failed("list_members"))
    }

    async fn add_member(&self, family_id: &str, req: &NewMemberReq) -> Result<MemberDto, AppError> {
        rest::add_member(&self.base, family_id, &self.token, req)
            .await
            .map_err(request_failed("add_member"))
    }

    async fn update_member(
        &self,
        family_id: &str,
        member_id: &str,
        req: &UpdateMemberReq,
    ) -> Result<MemberDto, AppError> {
        rest::update_member(&self.base, family_id, member_id, &self.token, req)
            .await
            .map_err(request_failed("update_member"))
    }

    async fn delete_member(&self, family_id: &str, member_id: &str) -> Result<(), AppError> {
        rest::delete_member(&self.base, family_id, member_id, &self.token)
            .await
            .map_err(request_failed("delete_member"))
    }

    async fn list_chores(&self, family_id: &str) -> Result<Vec<ChoreDto>, AppError> {
        rest::list_chores(&self.base, family_id, &self.token)
            .await
            .map_err(request_failed("list_chores"))
    }

    async fn create_chore(&self, family_id: &str, req: &NewChoreReq) -> Result<ChoreDto, AppError> {
        rest::create_chore(&self.base, family_id, &self.token, req)
            .await
            .map_err(request_failed("create_chore"))
    }

    async fn update_chore(
        &self,
        family_id: &str,
        chore_id: &str,
        req: &UpdateChoreReq,
    ) -> Result<ChoreDto, AppError> {
        rest::update_chore(&self.base, family_id, chore_id, &self.token, req)
            .await
            .map_err(request_failed("update_chore"))
    }

    async fn toggle_chore(&self, family_id: &str, chore_id: &str) -> Result<ChoreDto, AppError> {
        rest::toggle_chore(&self.base, family_id, chore_id, &self.token)
            .await
            .map_err(request_failed("toggle_chore"))
    }

    async fn set_chore_status(
        &self,
        family_id: &str,
        chore_id: &str,
        req: &ChoreStatusReq,
    ) -> Result<ChoreDto, AppError> {
        rest::set_chore_status(&self.base, family_id, chore_id, &self.token, req)
            .await
            .map_err(request_failed("set_chore_status"))
    }

    async fn delete_chore(&self, family_id: &str, chore_id: &str) -> Result<(), AppError> {
        rest::delete_chore(&self.base, family_id, chore_id, &self.token)
            .await
            .map_err(request_failed("delete_chore"))
    }

    async fn list_shopping(&self, family_id: &str) -> Result<Vec<ShoppingItemDto>, AppError> {
        rest::list_shopping(&self.base, family_id, &self.token)
            .await
            .map_err(request_failed("list_shopping"))
    }

    async fn add_shopping_item(
        &self,
        family_id: &str,
        req: &NewShoppingItemReq,
    ) -> Result<ShoppingItemDto, AppError> {
        rest::add_shopping_item(&self.base, family_id, &self.token, req)
            .await
            .map_err(request_failed("add_shopping_item"))
    }

    async fn toggle_shopping_item(
        &self,
        family_id: &str,
        item_id: &str,
    ) -> Result<ShoppingItemDto, AppError> {
        rest::toggle_shopping_item(&self.base, family_id, item_id, &self.token)
            .await
            .map_err(request_failed("toggle_shopping_item"))
    }

    async fn delete_shopping_item(&self, family_id: &str, item_id: &str) -> Result<(), AppError> {
        rest::delete_shopping_item(&self.base, family_id, item_id, &self.token)
            .await
            .map_err(request_failed("delete_shopping_item"))
    }

    async fn clear_purchased(&self, family_id: &str) -> Result<ClearPurchasedResp, AppError> {
        rest::clear_purchased(&self.base, family_id, &self.token)
            .await
            .map_err(request_failed("clear_purchased"))
    }

    async fn list_meals(&self, family_id: &str) -> Result<Vec<MealSlotDto>, AppError> {
        rest::list_meals(&self.base, family_id, &self.token)
            .await
            .map_err(request_failed("list_meals"))
    }

    async fn create_meal(
        &self,
        family_id: &str,
        req: &NewMealSlotReq,
    ) -> Result<MealSlotDto, AppError> {
        rest::create_meal(&self.base, family_id, &self.token, req)
            .await
            .map_err(request_failed("create_meal"))
    }

    async fn update_meal(
        &self,
        family_id: &str,
        slot_id: &str,
        req: &UpdateMealSlotReq,
    ) -> Result<MealSlotDto, AppError> {
        rest::update_meal(&self.base, family_id, slot_id, &self.token, req)
            .await
            .map_err(request_failed("update_meal"))
    }

    async fn delete_meal(&self, family_id: &str, slot_id: &str) -> Result<(), AppError> {
        rest::delete_meal(&self.base, family_id, slot_id, &self.token)
            .await
            .map_err(request_failed("delete_meal"))
    }

    async fn dashboard(&self, family_id: &str) -> Result<DashboardStatsDto, AppError> {
        rest::dashboard(&self.base, family_id, &self.token)
            .await
            .map_err(request_failed("dashboard"))
    }
}
