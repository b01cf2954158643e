//! Navigation preconditions: which screen an identity may open given its
//! onboarding progress, and where to send it otherwise.

use std::fmt;
use std::str::FromStr;

use crate::domain::{OnboardingStage, OnboardingStatus, ParseEnumError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Landing,
    Login,
    OnboardingFamily,
    OnboardingMembers,
    OnboardingComplete,
    Dashboard,
    Chores,
    Shopping,
    Meals,
    FamilySettings,
}

impl Screen {
    pub const ALL: [Screen; 10] = [
        Screen::Landing,
        Screen::Login,
        Screen::OnboardingFamily,
        Screen::OnboardingMembers,
        Screen::OnboardingComplete,
        Screen::Dashboard,
        Screen::Chores,
        Screen::Shopping,
        Screen::Meals,
        Screen::FamilySettings,
    ];

    pub fn path(&self) -> &'static str {
        match self {
            Screen::Landing => "/",
            Screen::Login => "/login",
            Screen::OnboardingFamily => "/onboarding/family",
            Screen::OnboardingMembers => "/onboarding/members",
            Screen::OnboardingComplete => "/onboarding/complete",
            Screen::Dashboard => "/dashboard",
            Screen::Chores => "/chores",
            Screen::Shopping => "/shopping",
            Screen::Meals => "/meals",
            Screen::FamilySettings => "/settings/family",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Screen::Landing | Screen::Login)
    }

    /// Screens of the main application that show family-scoped rows.
    pub fn is_family_scoped(&self) -> bool {
        matches!(
            self,
            Screen::Dashboard
                | Screen::Chores
                | Screen::Shopping
                | Screen::Meals
                | Screen::FamilySettings
        )
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

impl FromStr for Screen {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let normalized = if trimmed.len() > 1 {
            trimmed.trim_end_matches('/')
        } else {
            trimmed
        };
        Screen::ALL
            .iter()
            .copied()
            .find(|screen| screen.path() == normalized)
            .ok_or_else(|| ParseEnumError::new("route", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(Screen),
}

impl RouteDecision {
    pub fn redirect_target(&self) -> Option<Screen> {
        match self {
            RouteDecision::Allow => None,
            RouteDecision::Redirect(to) => Some(*to),
        }
    }
}

/// Decide whether `screen` may open. `status` is `None` when nobody is signed in.
pub fn route_decision(screen: Screen, status: Option<&OnboardingStatus>) -> RouteDecision {
    if screen.is_public() {
        return RouteDecision::Allow;
    }
    let Some(status) = status else {
        return RouteDecision::Redirect(Screen::Login);
    };
    let stage = status.stage();
    match screen {
        Screen::Landing | Screen::Login => RouteDecision::Allow,
        Screen::OnboardingFamily => match stage {
            OnboardingStage::Complete => RouteDecision::Redirect(Screen::Dashboard),
            _ => RouteDecision::Allow,
        },
        Screen::OnboardingMembers => match stage {
            OnboardingStage::NeedsFamily => RouteDecision::Redirect(Screen::OnboardingFamily),
            _ => RouteDecision::Allow,
        },
        Screen::OnboardingComplete => match stage {
            OnboardingStage::NeedsFamily => RouteDecision::Redirect(Screen::OnboardingFamily),
            OnboardingStage::NeedsMembers => RouteDecision::Redirect(Screen::OnboardingMembers),
            OnboardingStage::Complete => RouteDecision::Allow,
        },
        Screen::Dashboard
        | Screen::Chores
        | Screen::Shopping
        | Screen::Meals
        | Screen::FamilySettings => match stage {
            OnboardingStage::Complete => RouteDecision::Allow,
            _ => RouteDecision::Redirect(Screen::OnboardingFamily),
        },
    }
}

/// Where a freshly signed-in identity should land.
pub fn landing_after_login(status: &OnboardingStatus) -> Screen {
    match status.stage() {
        OnboardingStage::Complete => Screen::Dashboard,
        _ => Screen::OnboardingFamily,
    }
}
