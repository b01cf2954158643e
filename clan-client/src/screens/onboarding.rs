use std::time::Duration;

use clan_shared::api::FamilyDto;
use clan_shared::domain::{self, COMPLETION_REDIRECT_SECS};
use clan_shared::guard::Screen;
use tokio::sync::oneshot;
use tracing::info;

use super::enter;
use crate::AppError;
use crate::backend::FamilyBackend;

/// Family step. Submitting it again renames the family created earlier.
pub async fn create_family(backend: &dyn FamilyBackend, name: &str) -> Result<FamilyDto, AppError> {
    let name = domain::required("family name", name)?;
    enter(backend, Screen::OnboardingFamily).await?;
    let family = backend.create_family(&name).await?;
    info!(family_id = %family.id, "onboarding: family saved");
    Ok(family)
}

/// Marks onboarding complete once the family has enough members.
pub async fn finish(backend: &dyn FamilyBackend) -> Result<(), AppError> {
    let ctx = enter(backend, Screen::OnboardingMembers).await?;
    let family_id = ctx.family_id()?;
    let members = backend.list_members(family_id).await?;
    domain::ensure_can_finish(members.len(), ctx.status.min_members)?;
    backend.complete_onboarding().await?;
    info!(family_id, "onboarding: completed");
    Ok(())
}

pub fn completion_message() -> String {
    format!(
        "You're all set! Opening your dashboard in {COMPLETION_REDIRECT_SECS} seconds \
         (press Enter to go now)."
    )
}

/// Resolves after the confirmation delay or as soon as Enter is pressed.
pub async fn wait_to_advance() {
    let (tx, rx) = oneshot::channel();
    // A detached thread so a pending read never holds up process exit.
    std::thread::spawn(move || {
        let mut buf = String::new();
        let _ = std::io::stdin().read_line(&mut buf);
        let _ = tx.send(());
    });
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(COMPLETION_REDIRECT_SECS)) => {}
        _ = rx => {}
    }
}
