use std::fmt::Write;

use clan_shared::api::{NewShoppingItemReq, ShoppingItemDto};
use clan_shared::domain::{self, ShoppingFilter};
use clan_shared::guard::Screen;
use tracing::info;

use super::{Confirm, enter, resolve_id, short_id};
use crate::AppError;
use crate::backend::FamilyBackend;

pub struct ShoppingScreen<'a> {
    backend: &'a dyn FamilyBackend,
    family_id: String,
    items: Vec<ShoppingItemDto>,
}

impl<'a> ShoppingScreen<'a> {
    pub async fn open(backend: &'a dyn FamilyBackend) -> Result<Self, AppError> {
        let ctx = enter(backend, Screen::Shopping).await?;
        let mut screen = Self {
            backend,
            family_id: ctx.family_id()?.to_string(),
            items: Vec::new(),
        };
        screen.reload().await?;
        Ok(screen)
    }

    pub async fn reload(&mut self) -> Result<(), AppError> {
        self.items = self.backend.list_shopping(&self.family_id).await?;
        Ok(())
    }

    pub fn items(&self) -> &[ShoppingItemDto] {
        &self.items
    }

    pub fn filtered(&self, filter: ShoppingFilter) -> Vec<&ShoppingItemDto> {
        self.items
            .iter()
            .filter(|i| filter.matches(i.checked))
            .collect()
    }

    pub async fn add(
        &mut self,
        name: &str,
        category: Option<&str>,
    ) -> Result<ShoppingItemDto, AppError> {
        let req = NewShoppingItemReq {
            name: domain::required("name", name)?,
            category: domain::optional_text(category),
        };
        let item = self.backend.add_shopping_item(&self.family_id, &req).await?;
        self.reload().await?;
        Ok(item)
    }

    pub async fn toggle(&mut self, id: &str) -> Result<ShoppingItemDto, AppError> {
        let item_id = self.find(id)?.id.clone();
        let item = self
            .backend
            .toggle_shopping_item(&self.family_id, &item_id)
            .await?;
        self.reload().await?;
        Ok(item)
    }

    pub async fn delete(&mut self, id: &str, confirm: &dyn Confirm) -> Result<bool, AppError> {
        let item = self.find(id)?.clone();
        if !confirm.confirm(&format!("Remove \"{}\" from the list?", item.name)) {
            return Ok(false);
        }
        self.backend
            .delete_shopping_item(&self.family_id, &item.id)
            .await?;
        self.reload().await?;
        Ok(true)
    }

    /// Deletes every purchased item. `None` when declined or nothing to clear.
    pub async fn clear_purchased(
        &mut self,
        confirm: &dyn Confirm,
    ) -> Result<Option<usize>, AppError> {
        let purchased = self.filtered(ShoppingFilter::Purchased).len();
        if purchased == 0 {
            return Ok(None);
        }
        if !confirm.confirm(&format!("Clear {purchased} purchased item(s)?")) {
            return Ok(None);
        }
        let resp = self.backend.clear_purchased(&self.family_id).await?;
        info!(deleted = resp.deleted, "purchased items cleared");
        self.reload().await?;
        Ok(Some(resp.deleted))
    }

    pub fn render(&self, filter: ShoppingFilter) -> String {
        let needed = self.filtered(ShoppingFilter::Needed).len();
        let purchased = self.filtered(ShoppingFilter::Purchased).len();
        let mut out = format!("Shopping list ({needed} needed, {purchased} purchased)\n");
        let rows = self.filtered(filter);
        if rows.is_empty() {
            out.push_str("  nothing here yet\n");
            return out;
        }
        for i in rows {
            let mark = if i.checked { "[x]" } else { "[ ]" };
            let _ = write!(out, "  {mark} {:<8}  {}", short_id(&i.id), i.name);
            if let Some(c) = &i.category {
                let _ = write!(out, "  ({c})");
            }
            out.push('\n');
        }
        out
    }

    fn find(&self, id: &str) -> Result<&ShoppingItemDto, AppError> {
        resolve_id(&self.items, |i| i.id.as_str(), id, "item")
    }
}
