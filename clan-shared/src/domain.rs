use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name given to families created by auto-provisioning.
pub const DEFAULT_FAMILY_NAME: &str = "My Family";
/// Minimum number of members (including the acting parent) before onboarding can finish.
pub const DEFAULT_MIN_MEMBERS: usize = 2;
/// Domain used for member emails generated when none is supplied.
pub const DEFAULT_PLACEHOLDER_DOMAIN: &str = "family.local";
/// Delay before the onboarding confirmation moves on to the dashboard.
pub const COMPLETION_REDIRECT_SECS: u64 = 3;
/// Points given to a chore when the caller does not choose.
pub const DEFAULT_CHORE_POINTS: i32 = 10;
pub const MIN_PASSWORD_LEN: usize = 6;

pub const NOT_ENOUGH_MEMBERS_MSG: &str = "Please add at least one family member to continue.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Errors caught before any request leaves the caller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },
    #[error("invalid email address")]
    InvalidEmail,
    #[error("password must be at least {0} characters")]
    PasswordTooShort(usize),
    #[error("{}", NOT_ENOUGH_MEMBERS_MSG)]
    NotEnoughMembers { have: usize, need: usize },
}

/// Returns the trimmed value or a `Required` error when it is blank.
pub fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Blank optional text collapses to `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = required("email", email)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
            Ok(email.to_ascii_lowercase())
        }
        _ => Err(ValidationError::InvalidEmail),
    }
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort(MIN_PASSWORD_LEN));
    }
    Ok(())
}

pub fn validate_points(points: i32) -> Result<i32, ValidationError> {
    if points < 0 {
        return Err(ValidationError::OutOfRange {
            field: "points",
            min: 0,
            max: i32::MAX as i64,
        });
    }
    Ok(points)
}

/// Email for a member added without one: name lowercased, whitespace removed.
pub fn placeholder_email(name: &str, domain: &str) -> String {
    let local: String = name
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    format!("{}@{}", local, domain)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChoreStatus {
    Open,
    InProgress,
    Completed,
}

impl ChoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChoreStatus::Open => "open",
            ChoreStatus::InProgress => "in_progress",
            ChoreStatus::Completed => "completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ChoreStatus::Completed)
    }

    /// Completed flips back to open; anything else becomes completed.
    pub fn toggled(self) -> ChoreStatus {
        match self {
            ChoreStatus::Completed => ChoreStatus::Open,
            ChoreStatus::Open | ChoreStatus::InProgress => ChoreStatus::Completed,
        }
    }
}

impl fmt::Display for ChoreStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChoreStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "open" => Ok(ChoreStatus::Open),
            "in_progress" => Ok(ChoreStatus::InProgress),
            "completed" | "done" => Ok(ChoreStatus::Completed),
            _ => Err(ParseEnumError::new("chore status", s)),
        }
    }
}

/// Result of moving a chore to `next`, keeping `completed_at` set iff completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub status: ChoreStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

impl StatusChange {
    pub fn apply(
        current: ChoreStatus,
        current_completed_at: Option<DateTime<Utc>>,
        next: ChoreStatus,
        now: DateTime<Utc>,
    ) -> Self {
        let completed_at = match (current, next) {
            (ChoreStatus::Completed, ChoreStatus::Completed) => current_completed_at.or(Some(now)),
            (_, ChoreStatus::Completed) => Some(now),
            _ => None,
        };
        Self {
            status: next,
            completed_at,
        }
    }

    pub fn toggle(
        current: ChoreStatus,
        current_completed_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::apply(current, current_completed_at, current.toggled(), now)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    pub const ALL: [MealType; 3] = [MealType::Breakfast, MealType::Lunch, MealType::Dinner];

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            _ => Err(ParseEnumError::new("meal type", s)),
        }
    }
}

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Day of the week, 0 = Sunday.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayOfWeek(u8);

impl DayOfWeek {
    pub fn new(day: u8) -> Result<Self, ValidationError> {
        if (day as usize) < DAY_NAMES.len() {
            Ok(DayOfWeek(day))
        } else {
            Err(ValidationError::OutOfRange {
                field: "day_of_week",
                min: 0,
                max: 6,
            })
        }
    }

    pub fn all() -> impl Iterator<Item = DayOfWeek> {
        (0..DAY_NAMES.len() as u8).map(DayOfWeek)
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    pub fn name(&self) -> &'static str {
        DAY_NAMES[self.0 as usize]
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        DayOfWeek::new(value)
    }
}

impl From<DayOfWeek> for u8 {
    fn from(value: DayOfWeek) -> Self {
        value.0
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DayOfWeek {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        if let Ok(n) = needle.parse::<u8>() {
            return DayOfWeek::new(n).map_err(|_| ParseEnumError::new("day", s));
        }
        DAY_NAMES
            .iter()
            .position(|name| {
                let name = name.to_ascii_lowercase();
                needle.len() >= 3 && name.starts_with(&needle)
            })
            .map(|i| DayOfWeek(i as u8))
            .ok_or_else(|| ParseEnumError::new("day", s))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChoreFilter {
    #[default]
    All,
    Open,
    Completed,
}

impl ChoreFilter {
    pub fn matches(&self, status: ChoreStatus) -> bool {
        match self {
            ChoreFilter::All => true,
            ChoreFilter::Open => !status.is_completed(),
            ChoreFilter::Completed => status.is_completed(),
        }
    }
}

impl FromStr for ChoreFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ChoreFilter::All),
            "open" => Ok(ChoreFilter::Open),
            "completed" | "done" => Ok(ChoreFilter::Completed),
            _ => Err(ParseEnumError::new("chore filter", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShoppingFilter {
    #[default]
    All,
    Needed,
    Purchased,
}

impl ShoppingFilter {
    pub fn matches(&self, checked: bool) -> bool {
        match self {
            ShoppingFilter::All => true,
            ShoppingFilter::Needed => !checked,
            ShoppingFilter::Purchased => checked,
        }
    }
}

impl FromStr for ShoppingFilter {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(ShoppingFilter::All),
            "needed" => Ok(ShoppingFilter::Needed),
            "purchased" => Ok(ShoppingFilter::Purchased),
            _ => Err(ParseEnumError::new("shopping filter", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStage {
    NeedsFamily,
    NeedsMembers,
    Complete,
}

/// Onboarding progress of one identity, as stored on its member row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OnboardingStatus {
    pub completed: bool,
    pub has_family: bool,
}

impl OnboardingStatus {
    /// Completion without a family counts as needing a family.
    pub fn stage(&self) -> OnboardingStage {
        match (self.has_family, self.completed) {
            (false, _) => OnboardingStage::NeedsFamily,
            (true, false) => OnboardingStage::NeedsMembers,
            (true, true) => OnboardingStage::Complete,
        }
    }
}

pub fn ensure_can_finish(member_count: usize, min_members: usize) -> Result<(), ValidationError> {
    if member_count < min_members {
        return Err(ValidationError::NotEnoughMembers {
            have: member_count,
            need: min_members,
        });
    }
    Ok(())
}
