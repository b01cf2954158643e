use clan_shared::api::{DashboardStatsDto, FamilyDto};
use clan_shared::guard::Screen;

use super::enter;
use crate::AppError;
use crate::backend::FamilyBackend;

pub struct Dashboard {
    pub greeting_name: String,
    pub family: FamilyDto,
    pub stats: DashboardStatsDto,
}

impl Dashboard {
    pub async fn load(backend: &dyn FamilyBackend) -> Result<Self, AppError> {
        let ctx = enter(backend, Screen::Dashboard).await?;
        let family_id = ctx.family_id()?;
        let family = backend.get_family(family_id).await?;
        let stats = backend.dashboard(family_id).await?;
        let greeting_name = ctx
            .member
            .as_ref()
            .map(|m| m.name.clone())
            .unwrap_or_else(|| ctx.identity.name.clone());
        Ok(Self {
            greeting_name,
            family,
            stats,
        })
    }

    pub fn render(&self) -> String {
        let s = &self.stats;
        format!(
            "Hi {}! Here is {} today.\n\
             \x20 chores:   {} open of {} ({} completed today)\n\
             \x20 shopping: {} item(s) needed\n\
             \x20 meals:    {} planned this week\n",
            self.greeting_name,
            self.family.name,
            s.open_chores,
            s.total_chores,
            s.completed_today,
            s.shopping_needed,
            s.meals_planned
        )
    }
}
