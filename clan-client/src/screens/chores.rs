use std::fmt::Write;

use chrono::{Local, NaiveDate};
use clan_shared::api::{ChoreDto, ChoreStatusReq, MemberDto, NewChoreReq, UpdateChoreReq};
use clan_shared::domain::{self, ChoreFilter, ChoreStatus, DEFAULT_CHORE_POINTS};
use clan_shared::guard::Screen;
use tracing::info;

use super::{Confirm, ScreenCtx, enter, resolve_id, short_id};
use crate::AppError;
use crate::backend::FamilyBackend;

#[derive(Debug, Clone, Default)]
pub struct ChoreInput {
    pub title: String,
    pub description: Option<String>,
    /// Member id, id prefix or name.
    pub assignee: Option<String>,
    pub points: Option<i32>,
    pub due_date: Option<NaiveDate>,
}

/// Fields left as `None` keep their current value.
#[derive(Debug, Clone, Default)]
pub struct ChoreEdit {
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee: Option<String>,
    pub unassign: bool,
    pub points: Option<i32>,
    pub due_date: Option<NaiveDate>,
    pub clear_due: bool,
}

pub struct ChoresScreen<'a> {
    backend: &'a dyn FamilyBackend,
    ctx: ScreenCtx,
    family_id: String,
    chores: Vec<ChoreDto>,
    members: Vec<MemberDto>,
}

impl<'a> ChoresScreen<'a> {
    pub async fn open(backend: &'a dyn FamilyBackend) -> Result<Self, AppError> {
        let ctx = enter(backend, Screen::Chores).await?;
        let family_id = ctx.family_id()?.to_string();
        let mut screen = Self {
            backend,
            ctx,
            family_id,
            chores: Vec::new(),
            members: Vec::new(),
        };
        screen.reload().await?;
        Ok(screen)
    }

    pub fn ctx(&self) -> &ScreenCtx {
        &self.ctx
    }

    pub async fn reload(&mut self) -> Result<(), AppError> {
        self.chores = self.backend.list_chores(&self.family_id).await?;
        self.members = self.backend.list_members(&self.family_id).await?;
        Ok(())
    }

    pub fn chores(&self) -> &[ChoreDto] {
        &self.chores
    }

    pub fn filtered(&self, filter: ChoreFilter) -> Vec<&ChoreDto> {
        self.chores
            .iter()
            .filter(|c| filter.matches(c.status))
            .collect()
    }

    pub async fn add(&mut self, input: ChoreInput) -> Result<ChoreDto, AppError> {
        let title = domain::required("title", &input.title)?;
        let points = domain::validate_points(input.points.unwrap_or(DEFAULT_CHORE_POINTS))?;
        let assigned_to = match input.assignee.as_deref() {
            Some(who) => Some(self.member(who)?.id.clone()),
            None => None,
        };
        let req = NewChoreReq {
            title,
            description: domain::optional_text(input.description.as_deref()),
            assigned_to,
            points: Some(points),
            due_date: input.due_date,
        };
        let chore = self.backend.create_chore(&self.family_id, &req).await?;
        info!(chore_id = %chore.id, "chore created");
        self.reload().await?;
        Ok(chore)
    }

    pub async fn edit(&mut self, id: &str, edit: ChoreEdit) -> Result<ChoreDto, AppError> {
        let current = self.find(id)?.clone();
        let title = match edit.title.as_deref() {
            Some(t) => domain::required("title", t)?,
            None => current.title.clone(),
        };
        let points = domain::validate_points(edit.points.unwrap_or(current.points))?;
        let assigned_to = if edit.unassign {
            None
        } else {
            match edit.assignee.as_deref() {
                Some(who) => Some(self.member(who)?.id.clone()),
                None => current.assigned_to.clone(),
            }
        };
        let description = match edit.description.as_deref() {
            Some(d) => domain::optional_text(Some(d)),
            None => current.description.clone(),
        };
        let due_date = if edit.clear_due {
            None
        } else {
            edit.due_date.or(current.due_date)
        };
        let req = UpdateChoreReq {
            title,
            description,
            assigned_to,
            points,
            due_date,
        };
        let chore = self
            .backend
            .update_chore(&self.family_id, &current.id, &req)
            .await?;
        self.reload().await?;
        Ok(chore)
    }

    pub async fn toggle(&mut self, id: &str) -> Result<ChoreDto, AppError> {
        let chore_id = self.find(id)?.id.clone();
        let chore = self.backend.toggle_chore(&self.family_id, &chore_id).await?;
        self.reload().await?;
        Ok(chore)
    }

    pub async fn set_status(
        &mut self,
        id: &str,
        status: ChoreStatus,
    ) -> Result<ChoreDto, AppError> {
        let chore_id = self.find(id)?.id.clone();
        let chore = self
            .backend
            .set_chore_status(&self.family_id, &chore_id, &ChoreStatusReq { status })
            .await?;
        self.reload().await?;
        Ok(chore)
    }

    /// Returns `false` when the user declined.
    pub async fn delete(&mut self, id: &str, confirm: &dyn Confirm) -> Result<bool, AppError> {
        let chore = self.find(id)?.clone();
        if !confirm.confirm(&format!("Delete chore \"{}\"?", chore.title)) {
            return Ok(false);
        }
        self.backend.delete_chore(&self.family_id, &chore.id).await?;
        info!(chore_id = %chore.id, "chore deleted");
        self.reload().await?;
        Ok(true)
    }

    pub fn render(&self, filter: ChoreFilter) -> String {
        let open = self.filtered(ChoreFilter::Open).len();
        let done = self.filtered(ChoreFilter::Completed).len();
        let mut out = format!("Chores ({open} open, {done} completed)\n");
        let rows = self.filtered(filter);
        if rows.is_empty() {
            out.push_str("  nothing here yet\n");
            return out;
        }
        let today = Local::now().date_naive();
        for c in rows {
            let mark = match c.status {
                ChoreStatus::Open => "[ ]",
                ChoreStatus::InProgress => "[~]",
                ChoreStatus::Completed => "[x]",
            };
            let who = c.assignee_name.as_deref().unwrap_or("unassigned");
            let _ = write!(
                out,
                "  {mark} {:<8}  {:<28} {:>4} pts  {who}",
                short_id(&c.id),
                c.title,
                c.points
            );
            if let Some(due) = c.due_date {
                let _ = write!(out, "  due {due}");
                if due < today && !c.status.is_completed() {
                    out.push_str(" (overdue)");
                }
            }
            if let Some(at) = c.completed_at {
                let _ = write!(out, "  done {}", at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
            }
            out.push('\n');
            if let Some(d) = &c.description {
                let _ = writeln!(out, "        {d}");
            }
        }
        out
    }

    fn find(&self, id: &str) -> Result<&ChoreDto, AppError> {
        resolve_id(&self.chores, |c| c.id.as_str(), id, "chore")
    }

    fn member(&self, who: &str) -> Result<&MemberDto, AppError> {
        find_member(&self.members, who)
    }
}

/// Matches a member by name (case-insensitive) or by id.
pub(crate) fn find_member<'m>(
    members: &'m [MemberDto],
    who: &str,
) -> Result<&'m MemberDto, AppError> {
    let wanted = who.trim();
    let mut by_name = members
        .iter()
        .filter(|m| m.name.eq_ignore_ascii_case(wanted));
    match (by_name.next(), by_name.next()) {
        (Some(one), None) => Ok(one),
        (Some(_), Some(_)) => Err(AppError::Usage(format!(
            "more than one member is called {wanted}; use the id"
        ))),
        (None, _) => resolve_id(members, |m| m.id.as_str(), wanted, "member"),
    }
}
