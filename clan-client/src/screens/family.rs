//! Family settings: rename the family and manage its members. The onboarding
//! members step reuses this screen behind its own guard.

use std::fmt::Write;

use clan_shared::api::{FamilyDto, MemberDto, NewMemberReq, UpdateMemberReq};
use clan_shared::auth::Role;
use clan_shared::domain;
use clan_shared::guard::Screen;
use tracing::info;

use super::chores::find_member;
use super::{Confirm, ScreenCtx, enter, short_id};
use crate::AppError;
use crate::backend::FamilyBackend;

#[derive(Debug, Clone)]
pub struct MemberInput {
    pub name: String,
    pub role: Role,
    pub email: Option<String>,
}

pub struct FamilyScreen<'a> {
    backend: &'a dyn FamilyBackend,
    ctx: ScreenCtx,
    family_id: String,
    family: FamilyDto,
    members: Vec<MemberDto>,
}

impl<'a> FamilyScreen<'a> {
    pub async fn open(backend: &'a dyn FamilyBackend) -> Result<Self, AppError> {
        Self::open_at(backend, Screen::FamilySettings).await
    }

    pub async fn open_at(backend: &'a dyn FamilyBackend, screen: Screen) -> Result<Self, AppError> {
        let ctx = enter(backend, screen).await?;
        let family_id = ctx.family_id()?.to_string();
        let family = backend.get_family(&family_id).await?;
        let members = backend.list_members(&family_id).await?;
        Ok(Self {
            backend,
            ctx,
            family_id,
            family,
            members,
        })
    }

    pub async fn reload(&mut self) -> Result<(), AppError> {
        self.family = self.backend.get_family(&self.family_id).await?;
        self.members = self.backend.list_members(&self.family_id).await?;
        Ok(())
    }

    pub fn family(&self) -> &FamilyDto {
        &self.family
    }

    pub fn members(&self) -> &[MemberDto] {
        &self.members
    }

    pub async fn rename(&mut self, name: &str) -> Result<FamilyDto, AppError> {
        let name = domain::required("family name", name)?;
        let family = self.backend.rename_family(&self.family_id, &name).await?;
        self.reload().await?;
        Ok(family)
    }

    pub async fn add_member(&mut self, input: MemberInput) -> Result<MemberDto, AppError> {
        let name = domain::required("name", &input.name)?;
        let email = match domain::optional_text(input.email.as_deref()) {
            Some(e) => Some(domain::validate_email(&e)?),
            None => None,
        };
        let req = NewMemberReq {
            name,
            role: input.role,
            email,
        };
        let member = self.backend.add_member(&self.family_id, &req).await?;
        info!(member_id = %member.id, role = %member.role, "member added");
        self.reload().await?;
        Ok(member)
    }

    pub async fn edit_member(
        &mut self,
        who: &str,
        name: Option<&str>,
        role: Option<Role>,
    ) -> Result<MemberDto, AppError> {
        let member_id = find_member(&self.members, who)?.id.clone();
        let name = match name {
            Some(n) => Some(domain::required("name", n)?),
            None => None,
        };
        if name.is_none() && role.is_none() {
            return Err(AppError::Usage("nothing to change".into()));
        }
        let req = UpdateMemberReq { name, role };
        let member = self
            .backend
            .update_member(&self.family_id, &member_id, &req)
            .await?;
        self.reload().await?;
        Ok(member)
    }

    /// Removing yourself is never offered.
    pub async fn remove_member(
        &mut self,
        who: &str,
        confirm: &dyn Confirm,
    ) -> Result<bool, AppError> {
        let member = find_member(&self.members, who)?.clone();
        if self.ctx.member_id() == Some(member.id.as_str()) {
            return Err(AppError::Usage("you cannot remove yourself".into()));
        }
        if !confirm.confirm(&format!(
            "Remove {} from the family? Their chores become unassigned.",
            member.name
        )) {
            return Ok(false);
        }
        self.backend
            .delete_member(&self.family_id, &member.id)
            .await?;
        info!(member_id = %member.id, "member removed");
        self.reload().await?;
        Ok(true)
    }

    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.family.name);
        let _ = writeln!(out, "Members ({})", self.members.len());
        for m in &self.members {
            let you = if self.ctx.member_id() == Some(m.id.as_str()) {
                "  (you)"
            } else {
                ""
            };
            let _ = writeln!(
                out,
                "  {:<8}  {:<20} {:<7} {}{you}",
                short_id(&m.id),
                m.name,
                m.role,
                m.email
            );
        }
        out
    }
}
