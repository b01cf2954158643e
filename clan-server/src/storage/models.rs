use crate::storage::schema::{
    chores, families, identities, meal_slots, sessions, shopping_items, users,
};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = identities)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = identities)]
pub struct NewIdentity<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = sessions)]
pub struct NewSession<'a> {
    pub jti: &'a str,
    pub email: &'a str,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = families)]
pub struct Family {
    pub id: String,
    pub name: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = families)]
pub struct NewFamily<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub created_at: NaiveDateTime,
}

/// A family member row. Rows added by a parent carry no `identity_id`.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = users)]
pub struct Member {
    pub id: String,
    pub identity_id: Option<String>,
    pub email: String,
    pub name: String,
    pub role: String,
    pub family_id: Option<String>,
    pub onboarding_completed: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewMember<'a> {
    pub id: &'a str,
    pub identity_id: Option<&'a str>,
    pub email: &'a str,
    pub name: &'a str,
    pub role: &'a str,
    pub family_id: Option<&'a str>,
    pub onboarding_completed: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = chores)]
pub struct Chore {
    pub id: String,
    pub family_id: String,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub points: i32,
    pub status: String,
    pub due_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

#[derive(Insertable)]
#[diesel(table_name = chores)]
pub struct NewChore<'a> {
    pub id: &'a str,
    pub family_id: &'a str,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub assigned_to: Option<&'a str>,
    pub points: i32,
    pub status: &'a str,
    pub due_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
}

/// Editable chore fields; `None` values are written as NULL.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = chores)]
#[diesel(treat_none_as_null = true)]
pub struct ChoreChanges {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<String>,
    pub points: i32,
    pub due_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = shopping_items)]
pub struct ShoppingItem {
    pub id: String,
    pub family_id: String,
    pub name: String,
    pub checked: bool,
    pub category: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = shopping_items)]
pub struct NewShoppingItem<'a> {
    pub id: &'a str,
    pub family_id: &'a str,
    pub name: &'a str,
    pub checked: bool,
    pub category: Option<&'a str>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = meal_slots)]
pub struct MealSlot {
    pub id: String,
    pub family_id: String,
    pub day_of_week: i32,
    pub meal_type: String,
    pub meal_name: Option<String>,
    pub recipe_notes: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = meal_slots)]
pub struct NewMealSlot<'a> {
    pub id: &'a str,
    pub family_id: &'a str,
    pub day_of_week: i32,
    pub meal_type: &'a str,
    pub meal_name: Option<&'a str>,
    pub recipe_notes: Option<&'a str>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = meal_slots)]
#[diesel(treat_none_as_null = true)]
pub struct MealSlotChanges {
    pub meal_name: Option<String>,
    pub recipe_notes: Option<String>,
}

/// Per-family counters behind the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FamilyStats {
    pub total_chores: i64,
    pub open_chores: i64,
    pub completed_today: i64,
    pub shopping_needed: i64,
    pub meals_planned: i64,
}
