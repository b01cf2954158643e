use chrono::{DateTime, NaiveDate, Utc};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::domain::{
    ChoreStatus, DayOfWeek, MealType, OnboardingStage, OnboardingStatus, ParseEnumError,
};
use crate::guard::{RouteDecision, Screen};

pub mod endpoints;
#[cfg(feature = "rest-client")]
pub mod rest;

pub const API_V1_PREFIX: &str = "/api/v1";

/// Unreserved characters stay readable in path segments (UUIDs keep their dashes).
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub(crate) fn enc(s: &str) -> String {
    utf8_percent_encode(s, SEGMENT).to_string()
}

/// Path prefix for every row owned by `family_id`.
pub fn family_scope(family_id: &str) -> String {
    format!("{}/family/{}", API_V1_PREFIX, enc(family_id))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDto {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VersionDto {
    pub version: String,
}

// Auth
#[derive(Debug, Serialize, Deserialize)]
pub struct SignUpReq {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResp {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityDto {
    pub id: String,
    pub email: String,
    pub name: String,
}

// Current identity and onboarding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingStatusDto {
    pub completed: bool,
    pub has_family: bool,
    pub family_id: Option<String>,
    pub stage: OnboardingStage,
    /// Members needed before onboarding can finish, as configured on the server.
    #[serde(default = "default_min_members")]
    pub min_members: usize,
}

fn default_min_members() -> usize {
    crate::domain::DEFAULT_MIN_MEMBERS
}

impl OnboardingStatusDto {
    pub fn status(&self) -> OnboardingStatus {
        OnboardingStatus {
            completed: self.completed,
            has_family: self.has_family,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeDto {
    pub identity: IdentityDto,
    pub member: Option<MemberDto>,
    pub status: OnboardingStatusDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RouteQuery {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDecisionDto {
    pub path: String,
    pub allowed: bool,
    pub redirect: Option<String>,
}

impl RouteDecisionDto {
    pub fn new(screen: Screen, decision: RouteDecision) -> Self {
        Self {
            path: screen.path().to_string(),
            allowed: decision == RouteDecision::Allow,
            redirect: decision.redirect_target().map(|s| s.path().to_string()),
        }
    }

    pub fn decision(&self) -> Result<RouteDecision, ParseEnumError> {
        match &self.redirect {
            Some(to) => Ok(RouteDecision::Redirect(to.parse()?)),
            None => Ok(RouteDecision::Allow),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsureFamilyResp {
    pub family_id: String,
    pub created: bool,
}

// Family and members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyDto {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FamilyNameReq {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberDto {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub family_id: Option<String>,
    pub onboarding_completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewMemberReq {
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateMemberReq {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

// Chores
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoreDto {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    /// Present only while the assignee still resolves to a member.
    pub assignee_name: Option<String>,
    pub points: i32,
    pub status: ChoreStatus,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChoreReq {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub points: Option<i32>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Full replacement of a chore's editable fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateChoreReq {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    pub points: i32,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChoreStatusReq {
    pub status: ChoreStatus,
}

// Shopping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingItemDto {
    pub id: String,
    pub name: String,
    pub checked: bool,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewShoppingItemReq {
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClearPurchasedResp {
    pub deleted: usize,
}

// Meals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealSlotDto {
    pub id: String,
    pub day_of_week: DayOfWeek,
    pub meal_type: MealType,
    pub meal_name: Option<String>,
    pub recipe_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMealSlotReq {
    pub day_of_week: DayOfWeek,
    pub meal_type: MealType,
    #[serde(default)]
    pub meal_name: Option<String>,
    #[serde(default)]
    pub recipe_notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMealSlotReq {
    #[serde(default)]
    pub meal_name: Option<String>,
    #[serde(default)]
    pub recipe_notes: Option<String>,
}

// Dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStatsDto {
    pub total_chores: i64,
    pub open_chores: i64,
    pub completed_today: i64,
    pub shopping_needed: i64,
    pub meals_planned: i64,
}
