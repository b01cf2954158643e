//! Minimal REST client helpers for consumers (clients).

use super::endpoints as ep;
use super::*;
use once_cell::sync::Lazy;
use reqwest::Method;
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("http: {0}")]
    Http(String),
    #[error("status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("serde: {0}")]
    Serde(String),
}

impl RestError {
    /// Human-readable message; prefers the server's `{"error"}` body.
    pub fn message(&self) -> String {
        match self {
            RestError::Status { body, status } => serde_json::from_str::<ErrorDto>(body)
                .map(|e| e.error)
                .unwrap_or_else(|_| format!("request failed with status {status}")),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            RestError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .pool_max_idle_per_host(2)
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_default()
});

fn http_err(e: reqwest::Error) -> RestError {
    RestError::Http(e.to_string())
}

async fn check_status(res: reqwest::Response) -> Result<reqwest::Response, RestError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    Err(RestError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn handle_json<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, RestError> {
    check_status(res)
        .await?
        .json::<T>()
        .await
        .map_err(|e| RestError::Serde(e.to_string()))
}

async fn handle_empty(res: reqwest::Response) -> Result<(), RestError> {
    check_status(res).await.map(|_| ())
}

fn with_bearer(rb: reqwest::RequestBuilder, bearer: Option<&str>) -> reqwest::RequestBuilder {
    match bearer {
        Some(token) => rb.bearer_auth(token),
        None => rb,
    }
}

async fn get_json<T: DeserializeOwned>(url: String, bearer: Option<&str>) -> Result<T, RestError> {
    let res = with_bearer(HTTP_CLIENT.get(url), bearer)
        .send()
        .await
        .map_err(http_err)?;
    handle_json(res).await
}

async fn send_json<B, T>(
    method: Method,
    url: String,
    bearer: Option<&str>,
    body: Option<&B>,
) -> Result<T, RestError>
where
    B: serde::Serialize + ?Sized,
    T: DeserializeOwned,
{
    let mut rb = with_bearer(HTTP_CLIENT.request(method, url), bearer);
    if let Some(body) = body {
        rb = rb.json(body);
    }
    let res = rb.send().await.map_err(http_err)?;
    handle_json(res).await
}

async fn send_empty(
    method: Method,
    url: String,
    bearer: &str,
) -> Result<(), RestError> {
    let res = HTTP_CLIENT
        .request(method, url)
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(http_err)?;
    handle_empty(res).await
}

// Public endpoints

pub async fn server_version(base: &str) -> Result<VersionDto, RestError> {
    get_json(ep::version(base), None).await
}

pub async fn signup(base: &str, req: &SignUpReq) -> Result<IdentityDto, RestError> {
    send_json(Method::POST, ep::auth_signup(base), None, Some(req)).await
}

pub async fn login(base: &str, req: &AuthReq) -> Result<AuthResp, RestError> {
    send_json(Method::POST, ep::auth_login(base), None, Some(req)).await
}

// Session

pub async fn logout(base: &str, bearer: &str) -> Result<(), RestError> {
    send_empty(Method::POST, ep::auth_logout(base), bearer).await
}

pub async fn renew_token(base: &str, bearer: &str) -> Result<AuthResp, RestError> {
    send_json::<(), _>(Method::POST, ep::auth_renew(base), Some(bearer), None).await
}

pub async fn me(base: &str, bearer: &str) -> Result<MeDto, RestError> {
    get_json(ep::me(base), Some(bearer)).await
}

pub async fn onboarding_status(base: &str, bearer: &str) -> Result<OnboardingStatusDto, RestError> {
    get_json(ep::me_onboarding(base), Some(bearer)).await
}

pub async fn route(base: &str, bearer: &str, path: &str) -> Result<RouteDecisionDto, RestError> {
    get_json(ep::me_route(base, path), Some(bearer)).await
}

pub async fn ensure_family(base: &str, bearer: &str) -> Result<EnsureFamilyResp, RestError> {
    send_json::<(), _>(Method::POST, ep::me_family(base), Some(bearer), None).await
}

// Onboarding

pub async fn onboarding_create_family(
    base: &str,
    bearer: &str,
    req: &FamilyNameReq,
) -> Result<FamilyDto, RestError> {
    send_json(Method::POST, ep::onboarding_family(base), Some(bearer), Some(req)).await
}

pub async fn onboarding_complete(base: &str, bearer: &str) -> Result<(), RestError> {
    send_empty(Method::POST, ep::onboarding_complete(base), bearer).await
}

// Family and members

pub async fn get_family(base: &str, family_id: &str, bearer: &str) -> Result<FamilyDto, RestError> {
    get_json(ep::family(base, family_id), Some(bearer)).await
}

pub async fn rename_family(
    base: &str,
    family_id: &str,
    bearer: &str,
    req: &FamilyNameReq,
) -> Result<FamilyDto, RestError> {
    send_json(Method::PUT, ep::family(base, family_id), Some(bearer), Some(req)).await
}

pub async fn list_members(
    base: &str,
    family_id: &str,
    bearer: &str,
) -> Result<Vec<MemberDto>, RestError> {
    get_json(ep::members(base, family_id), Some(bearer)).await
}

pub async fn add_member(
    base: &str,
    family_id: &str,
    bearer: &str,
    req: &NewMemberReq,
) -> Result<MemberDto, RestError> {
    send_json(Method::POST, ep::members(base, family_id), Some(bearer), Some(req)).await
}

pub async fn update_member(
    base: &str,
    family_id: &str,
    member_id: &str,
    bearer: &str,
    req: &UpdateMemberReq,
) -> Result<MemberDto, RestError> {
    let url = ep::member(base, family_id, member_id);
    send_json(Method::PUT, url, Some(bearer), Some(req)).await
}

pub async fn delete_member(
    base: &str,
    family_id: &str,
    member_id: &str,
    bearer: &str,
) -> Result<(), RestError> {
    send_empty(Method::DELETE, ep::member(base, family_id, member_id), bearer).await
}

// Chores

pub async fn list_chores(
    base: &str,
    family_id: &str,
    bearer: &str,
) -> Result<Vec<ChoreDto>, RestError> {
    get_json(ep::chores(base, family_id), Some(bearer)).await
}

pub async fn create_chore(
    base: &str,
    family_id: &str,
    bearer: &str,
    req: &NewChoreReq,
) -> Result<ChoreDto, RestError> {
    send_json(Method::POST, ep::chores(base, family_id), Some(bearer), Some(req)).await
}

pub async fn update_chore(
    base: &str,
    family_id: &str,
    chore_id: &str,
    bearer: &str,
    req: &UpdateChoreReq,
) -> Result<ChoreDto, RestError> {
    let url = ep::chore(base, family_id, chore_id);
    send_json(Method::PUT, url, Some(bearer), Some(req)).await
}

pub async fn toggle_chore(
    base: &str,
    family_id: &str,
    chore_id: &str,
    bearer: &str,
) -> Result<ChoreDto, RestError> {
    let url = ep::chore_toggle(base, family_id, chore_id);
    send_json::<(), _>(Method::POST, url, Some(bearer), None).await
}

pub async fn set_chore_status(
    base: &str,
    family_id: &str,
    chore_id: &str,
    bearer: &str,
    req: &ChoreStatusReq,
) -> Result<ChoreDto, RestError> {
    let url = ep::chore_status(base, family_id, chore_id);
    send_json(Method::PUT, url, Some(bearer), Some(req)).await
}

pub async fn delete_chore(
    base: &str,
    family_id: &str,
    chore_id: &str,
    bearer: &str,
) -> Result<(), RestError> {
    send_empty(Method::DELETE, ep::chore(base, family_id, chore_id), bearer).await
}

// Shopping

pub async fn list_shopping(
    base: &str,
    family_id: &str,
    bearer: &str,
) -> Result<Vec<ShoppingItemDto>, RestError> {
    get_json(ep::shopping(base, family_id), Some(bearer)).await
}

pub async fn add_shopping_item(
    base: &str,
    family_id: &str,
    bearer: &str,
    req: &NewShoppingItemReq,
) -> Result<ShoppingItemDto, RestError> {
    send_json(Method::POST, ep::shopping(base, family_id), Some(bearer), Some(req)).await
}

pub async fn toggle_shopping_item(
    base: &str,
    family_id: &str,
    item_id: &str,
    bearer: &str,
) -> Result<ShoppingItemDto, RestError> {
    let url = ep::shopping_toggle(base, family_id, item_id);
    send_json::<(), _>(Method::POST, url, Some(bearer), None).await
}

pub async fn delete_shopping_item(
    base: &str,
    family_id: &str,
    item_id: &str,
    bearer: &str,
) -> Result<(), RestError> {
    send_empty(Method::DELETE, ep::shopping_item(base, family_id, item_id), bearer).await
}

pub async fn clear_purchased(
    base: &str,
    family_id: &str,
    bearer: &str,
) -> Result<ClearPurchasedResp, RestError> {
    let url = ep::shopping_clear_purchased(base, family_id);
    send_json::<(), _>(Method::POST, url, Some(bearer), None).await
}

// Meals

pub async fn list_meals(
    base: &str,
    family_id: &str,
    bearer: &str,
) -> Result<Vec<MealSlotDto>, RestError> {
    get_json(ep::meals(base, family_id), Some(bearer)).await
}

pub async fn create_meal(
    base: &str,
    family_id: &str,
    bearer: &str,
    req: &NewMealSlotReq,
) -> Result<MealSlotDto, RestError> {
    send_json(Method::POST, ep::meals(base, family_id), Some(bearer), Some(req)).await
}

pub async fn update_meal(
    base: &str,
    family_id: &str,
    slot_id: &str,
    bearer: &str,
    req: &UpdateMealSlotReq,
) -> Result<MealSlotDto, RestError> {
    let url = ep::meal(base, family_id, slot_id);
    send_json(Method::PUT, url, Some(bearer), Some(req)).await
}

pub async fn delete_meal(
    base: &str,
    family_id: &str,
    slot_id: &str,
    bearer: &str,
) -> Result<(), RestError> {
    send_empty(Method::DELETE, ep::meal(base, family_id, slot_id), bearer).await
}

// Dashboard

pub async fn dashboard(
    base: &str,
    family_id: &str,
    bearer: &str,
) -> Result<DashboardStatsDto, RestError> {
    get_json(ep::dashboard(base, family_id), Some(bearer)).await
}
