use std::fmt::Write;

use clan_shared::api::{MealSlotDto, NewMealSlotReq, UpdateMealSlotReq};
use clan_shared::domain::{self, DayOfWeek, MealType};
use clan_shared::guard::Screen;

use super::{Confirm, enter};
use crate::AppError;
use crate::backend::FamilyBackend;

fn merge_text(input: Option<&str>, current: Option<String>) -> Option<String> {
    match input {
        Some(text) => domain::optional_text(Some(text)),
        None => current,
    }
}

pub struct MealsScreen<'a> {
    backend: &'a dyn FamilyBackend,
    family_id: String,
    slots: Vec<MealSlotDto>,
}

impl<'a> MealsScreen<'a> {
    pub async fn open(backend: &'a dyn FamilyBackend) -> Result<Self, AppError> {
        let ctx = enter(backend, Screen::Meals).await?;
        let mut screen = Self {
            backend,
            family_id: ctx.family_id()?.to_string(),
            slots: Vec::new(),
        };
        screen.reload().await?;
        Ok(screen)
    }

    pub async fn reload(&mut self) -> Result<(), AppError> {
        self.slots = self.backend.list_meals(&self.family_id).await?;
        Ok(())
    }

    pub fn slots(&self) -> &[MealSlotDto] {
        &self.slots
    }

    pub fn slot(&self, day: DayOfWeek, meal_type: MealType) -> Option<&MealSlotDto> {
        self.slots
            .iter()
            .find(|s| s.day_of_week == day && s.meal_type == meal_type)
    }

    /// Updates the loaded slot for the cell, or inserts one when the cell is empty.
    /// `None` keeps the slot's current value; blank text clears it.
    pub async fn save(
        &mut self,
        day: DayOfWeek,
        meal_type: MealType,
        meal_name: Option<&str>,
        recipe_notes: Option<&str>,
    ) -> Result<MealSlotDto, AppError> {
        let saved = match self.slot(day, meal_type).cloned() {
            Some(current) => {
                let req = UpdateMealSlotReq {
                    meal_name: merge_text(meal_name, current.meal_name),
                    recipe_notes: merge_text(recipe_notes, current.recipe_notes),
                };
                self.backend
                    .update_meal(&self.family_id, &current.id, &req)
                    .await?
            }
            None => {
                let req = NewMealSlotReq {
                    day_of_week: day,
                    meal_type,
                    meal_name: domain::optional_text(meal_name),
                    recipe_notes: domain::optional_text(recipe_notes),
                };
                self.backend.create_meal(&self.family_id, &req).await?
            }
        };
        self.reload().await?;
        Ok(saved)
    }

    pub async fn clear(
        &mut self,
        day: DayOfWeek,
        meal_type: MealType,
        confirm: &dyn Confirm,
    ) -> Result<bool, AppError> {
        let slot_id = self
            .slot(day, meal_type)
            .map(|s| s.id.clone())
            .ok_or_else(|| AppError::Usage(format!("no {meal_type} planned for {day}")))?;
        if !confirm.confirm(&format!("Clear {meal_type} on {day}?")) {
            return Ok(false);
        }
        self.backend.delete_meal(&self.family_id, &slot_id).await?;
        self.reload().await?;
        Ok(true)
    }

    /// One line per day with breakfast, lunch and dinner columns.
    pub fn render(&self) -> String {
        let mut out = String::from("Meal plan\n");
        let _ = writeln!(out, "  {:<10} {:<22} {:<22} {}", "", "breakfast", "lunch", "dinner");
        for day in DayOfWeek::all() {
            let _ = write!(out, "  {:<10}", day.name());
            for meal_type in MealType::ALL {
                let cell = self
                    .slot(day, meal_type)
                    .and_then(|s| s.meal_name.as_deref())
                    .unwrap_or("-");
                let _ = write!(out, " {cell:<22}");
            }
            out.truncate(out.trim_end().len());
            out.push('\n');
        }
        let notes: Vec<&MealSlotDto> = self
            .slots
            .iter()
            .filter(|s| s.recipe_notes.is_some())
            .collect();
        if !notes.is_empty() {
            out.push_str("Notes\n");
            for s in notes {
                let _ = writeln!(
                    out,
                    "  {} {}: {}",
                    s.day_of_week,
                    s.meal_type,
                    s.recipe_notes.as_deref().unwrap_or_default()
                );
            }
        }
        out
    }
}
