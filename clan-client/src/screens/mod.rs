//! Screens of the application. Each one is entered through [`enter`], which
//! provisions a family where needed and applies the route guard before any
//! family-scoped rows are loaded.

pub mod chores;
pub mod dashboard;
pub mod family;
pub mod meals;
pub mod onboarding;
pub mod shopping;

use std::io::{self, Write};

use clan_shared::api::{IdentityDto, MemberDto, OnboardingStatusDto};
use clan_shared::guard::{RouteDecision, Screen, route_decision};
use tracing::{debug, info};

use crate::AppError;
use crate::backend::FamilyBackend;

/// Who is acting and on which family. Passed to every screen instead of any
/// global session state.
#[derive(Debug, Clone)]
pub struct ScreenCtx {
    pub identity: IdentityDto,
    pub member: Option<MemberDto>,
    pub status: OnboardingStatusDto,
}

impl ScreenCtx {
    pub fn family_id(&self) -> Result<&str, AppError> {
        self.status
            .family_id
            .as_deref()
            .ok_or(AppError::Redirect(Screen::OnboardingFamily))
    }

    pub fn member_id(&self) -> Option<&str> {
        self.member.as_ref().map(|m| m.id.as_str())
    }
}

/// Runs provisioning for main-app screens, then the guard. A guard failure is
/// returned as [`AppError::Redirect`].
pub async fn enter(backend: &dyn FamilyBackend, screen: Screen) -> Result<ScreenCtx, AppError> {
    if screen.is_family_scoped() {
        let provisioned = backend.ensure_family().await?;
        if provisioned.created {
            info!(family_id = %provisioned.family_id, "provisioned a family for this account");
        }
    }
    let me = backend.me().await?;
    let decision = route_decision(screen, Some(&me.status.status()));
    debug!(screen = %screen, ?decision, "route guard");
    match decision {
        RouteDecision::Allow => Ok(ScreenCtx {
            identity: me.identity,
            member: me.member,
            status: me.status,
        }),
        RouteDecision::Redirect(to) => Err(AppError::Redirect(to)),
    }
}

/// The command that opens `screen`.
pub fn command_hint(screen: Screen) -> &'static str {
    match screen {
        Screen::Landing | Screen::Login => "clan login",
        Screen::OnboardingFamily => "clan onboarding family <NAME>",
        Screen::OnboardingMembers => "clan onboarding members add <NAME>",
        Screen::OnboardingComplete => "clan onboarding finish",
        Screen::Dashboard => "clan dashboard",
        Screen::Chores => "clan chores",
        Screen::Shopping => "clan shopping",
        Screen::Meals => "clan meals",
        Screen::FamilySettings => "clan family",
    }
}

/// Asks before an irreversible action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Reads y/N from the terminal.
pub struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N]: ");
        io::stdout().flush().ok();
        let mut buf = String::new();
        if io::stdin().read_line(&mut buf).is_err() {
            return false;
        }
        matches!(buf.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

/// Used with `--yes`.
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

const MIN_ID_PREFIX: usize = 4;

/// Finds the row whose id equals `needle` or uniquely starts with it.
pub(crate) fn resolve_id<'a, T>(
    items: &'a [T],
    id_of: impl Fn(&T) -> &str,
    needle: &str,
    kind: &str,
) -> Result<&'a T, AppError> {
    let needle = needle.trim();
    if let Some(exact) = items.iter().find(|i| id_of(i) == needle) {
        return Ok(exact);
    }
    if needle.len() < MIN_ID_PREFIX {
        return Err(AppError::Usage(format!("no {kind} with id {needle}")));
    }
    let mut matches = items.iter().filter(|i| id_of(i).starts_with(needle));
    match (matches.next(), matches.next()) {
        (Some(one), None) => Ok(one),
        (Some(_), Some(_)) => Err(AppError::Usage(format!(
            "id {needle} matches more than one {kind}"
        ))),
        (None, _) => Err(AppError::Usage(format!("no {kind} with id {needle}"))),
    }
}

pub(crate) fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
