pub mod models;
pub mod schema;

use chrono::{NaiveDateTime, Utc};
use clan_shared::auth::Role;
use clan_shared::domain::{ChoreStatus, MealType, StatusChange};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::DatabaseErrorKind;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use models::{
    Chore, ChoreChanges, Family, FamilyStats, Identity, MealSlot, MealSlotChanges, Member,
    NewChore, NewFamily, NewIdentity, NewMealSlot, NewMember, NewSession, NewShoppingItem,
    ShoppingItem,
};
use schema::{chores, families, identities, meal_slots, sessions, shopping_items, users};
use tracing::{debug, info, trace};
use uuid::Uuid;

/// Structured error type for all storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A Diesel ORM error (query failure, constraint violation, etc.)
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    /// Failed to acquire or build a connection from the pool.
    #[error("pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    /// A `spawn_blocking` task panicked or was cancelled.
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),

    /// A database migration failed to apply.
    #[error("migration error: {0}")]
    Migration(String),

    /// The caller supplied invalid input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A row the operation depends on does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness rule rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// A chore together with its assignee's display name, when the assignee still
/// resolves to a member of the same family.
pub type ChoreRow = (Chore, Option<String>);

#[derive(Clone)]
pub struct Store {
    pool: Pool<ConnectionManager<SqliteConnection>>,
}

impl Store {
    pub async fn connect_sqlite(path: &str) -> Result<Self, StorageError> {
        let url = path.to_string();
        let manager = ConnectionManager::<SqliteConnection>::new(url);
        let pool = Pool::builder().max_size(8).build(manager)?;

        // Run pending Diesel migrations on startup (auto-init empty DBs)
        {
            let pool_clone = pool.clone();
            tokio::task::spawn_blocking(move || -> Result<(), StorageError> {
                const MIGRATIONS: EmbeddedMigrations = embed_migrations!();
                let mut conn = pool_clone.get()?;
                configure_sqlite_conn(&mut conn)?;
                let applied = conn
                    .run_pending_migrations(MIGRATIONS)
                    .map_err(|e| StorageError::Migration(e.to_string()))?;
                if !applied.is_empty() {
                    info!(count = applied.len(), "storage: applied migrations");
                }
                Ok(())
            })
            .await??;
        }

        Ok(Store { pool })
    }

    /// Runs `f` on a pooled, configured connection off the async runtime.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> Result<T, StorageError> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> Result<T, StorageError> {
            let mut conn = pool.get()?;
            configure_sqlite_conn(&mut conn)?;
            f(&mut conn)
        })
        .await?
    }

    // Identities

    pub async fn create_identity(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
    ) -> Result<Identity, StorageError> {
        let email = email.to_string();
        let name = name.to_string();
        let hash = password_hash.to_string();
        self.with_conn(move |conn| {
            let id = Uuid::new_v4().to_string();
            let row = NewIdentity {
                id: &id,
                email: &email,
                name: &name,
                password_hash: &hash,
                created_at: now(),
            };
            match diesel::insert_into(identities::table)
                .values(&row)
                .returning(Identity::as_returning())
                .get_result(conn)
            {
                Ok(identity) => Ok(identity),
                Err(diesel::result::Error::DatabaseError(
                    DatabaseErrorKind::UniqueViolation,
                    _,
                )) => {
                    Err(StorageError::Conflict(format!(
                        "an account already exists for {email}"
                    )))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    pub async fn find_identity_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Identity>, StorageError> {
        let email = email.to_string();
        self.with_conn(move |conn| {
            Ok(identities::table
                .filter(identities::email.eq(&email))
                .select(Identity::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn get_identity(&self, identity_id: &str) -> Result<Option<Identity>, StorageError> {
        let iid = identity_id.to_string();
        self.with_conn(move |conn| {
            Ok(identities::table
                .find(&iid)
                .select(Identity::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    // Session helpers for JWT inactivity windows
    pub async fn create_session(&self, jti_: &str, email_: &str) -> Result<(), StorageError> {
        let j = jti_.to_string();
        let e = email_.to_string();
        self.with_conn(move |conn| {
            let new = NewSession { jti: &j, email: &e };
            diesel::insert_into(sessions::table)
                .values(&new)
                .on_conflict_do_nothing()
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    pub async fn delete_session(&self, jti_: &str) -> Result<bool, StorageError> {
        let j = jti_.to_string();
        self.with_conn(move |conn| {
            let deleted =
                diesel::delete(sessions::table.filter(sessions::jti.eq(&j))).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    /// Touch session atomically, but only if it hasn't expired.
    /// Returns `true` if the session was found and updated, `false` otherwise.
    pub async fn touch_session_with_cutoff(
        &self,
        jti_: &str,
        cutoff: NaiveDateTime,
    ) -> Result<bool, StorageError> {
        let j = jti_.to_string();
        self.with_conn(move |conn| {
            let updated = diesel::update(
                sessions::table
                    .filter(sessions::jti.eq(&j))
                    .filter(sessions::last_used_at.ge(cutoff)),
            )
            .set(sessions::last_used_at.eq(now()))
            .execute(conn)?;
            Ok(updated > 0)
        })
        .await
    }

    // Provisioning

    /// The member row linked to `identity_id`, if any.
    pub async fn member_for_identity(
        &self,
        identity_id: &str,
    ) -> Result<Option<Member>, StorageError> {
        let iid = identity_id.to_string();
        self.with_conn(move |conn| member_for_identity_sync(conn, &iid))
            .await
    }

    /// Get-or-create the family of `identity`. Returns the family and whether it
    /// was created by this call. Safe to call concurrently for one identity.
    pub async fn ensure_family(
        &self,
        identity: &Identity,
        default_name: &str,
    ) -> Result<(Family, bool), StorageError> {
        let identity = identity.clone();
        let name = default_name.to_string();
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| provision(conn, &identity, &name, false))
        })
        .await
    }

    /// Onboarding family step: creates the family named `name` for `identity`,
    /// or renames the one it already has.
    pub async fn create_family_for_identity(
        &self,
        identity: &Identity,
        name: &str,
    ) -> Result<(Family, bool), StorageError> {
        let identity = identity.clone();
        let name = name.to_string();
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| provision(conn, &identity, &name, true))
        })
        .await
    }

    pub async fn set_onboarding_completed(&self, identity_id: &str) -> Result<bool, StorageError> {
        let iid = identity_id.to_string();
        self.with_conn(move |conn| {
            let updated = diesel::update(users::table.filter(users::identity_id.eq(&iid)))
                .set(users::onboarding_completed.eq(true))
                .execute(conn)?;
            Ok(updated > 0)
        })
        .await
    }

    // Families

    pub async fn get_family(&self, family_id: &str) -> Result<Option<Family>, StorageError> {
        let fid = family_id.to_string();
        self.with_conn(move |conn| {
            Ok(families::table
                .find(&fid)
                .select(Family::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    pub async fn rename_family(
        &self,
        family_id: &str,
        name: &str,
    ) -> Result<Option<Family>, StorageError> {
        let fid = family_id.to_string();
        let name = name.to_string();
        self.with_conn(move |conn| {
            Ok(diesel::update(families::table.find(&fid))
                .set(families::name.eq(&name))
                .returning(Family::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    // Members

    pub async fn list_members(&self, family_id: &str) -> Result<Vec<Member>, StorageError> {
        let fid = family_id.to_string();
        self.with_conn(move |conn| {
            Ok(users::table
                .filter(users::family_id.eq(&fid))
                .order((users::created_at.asc(), users::id.asc()))
                .select(Member::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn count_members(&self, family_id: &str) -> Result<i64, StorageError> {
        let fid = family_id.to_string();
        self.with_conn(move |conn| {
            Ok(users::table
                .filter(users::family_id.eq(&fid))
                .count()
                .get_result(conn)?)
        })
        .await
    }

    /// Adds a member managed by a parent; such rows count as onboarded.
    pub async fn add_member(
        &self,
        family_id: &str,
        name: &str,
        role: Role,
        email: &str,
    ) -> Result<Member, StorageError> {
        let fid = family_id.to_string();
        let name = name.to_string();
        let email = email.to_string();
        self.with_conn(move |conn| {
            let id = Uuid::new_v4().to_string();
            let row = NewMember {
                id: &id,
                identity_id: None,
                email: &email,
                name: &name,
                role: role.as_str(),
                family_id: Some(&fid),
                onboarding_completed: true,
                created_at: now(),
            };
            Ok(diesel::insert_into(users::table)
                .values(&row)
                .returning(Member::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn update_member(
        &self,
        family_id: &str,
        member_id: &str,
        name: Option<&str>,
        role: Option<Role>,
    ) -> Result<Option<Member>, StorageError> {
        let fid = family_id.to_string();
        let mid = member_id.to_string();
        let name = name.map(str::to_string);
        self.with_conn(move |conn| {
            let Some(member) = users::table
                .filter(users::id.eq(&mid))
                .filter(users::family_id.eq(&fid))
                .select(Member::as_select())
                .first(conn)
                .optional()?
            else {
                return Ok(None);
            };
            if name.is_none() && role.is_none() {
                return Ok(Some(member));
            }
            let name = name.unwrap_or(member.name);
            let role = role.map(|r| r.as_str().to_string()).unwrap_or(member.role);
            Ok(Some(
                diesel::update(users::table.find(&member.id))
                    .set((users::name.eq(&name), users::role.eq(&role)))
                    .returning(Member::as_returning())
                    .get_result(conn)?,
            ))
        })
        .await
    }

    /// Removes a member and clears every chore assignment pointing at it.
    pub async fn delete_member(
        &self,
        family_id: &str,
        member_id: &str,
    ) -> Result<bool, StorageError> {
        let fid = family_id.to_string();
        let mid = member_id.to_string();
        self.with_conn(move |conn| {
            conn.immediate_transaction(|conn| -> Result<bool, StorageError> {
                let unassigned = diesel::update(
                    chores::table
                        .filter(chores::family_id.eq(&fid))
                        .filter(chores::assigned_to.eq(&mid)),
                )
                .set(chores::assigned_to.eq(None::<String>))
                .execute(conn)?;
                let deleted = diesel::delete(
                    users::table
                        .filter(users::id.eq(&mid))
                        .filter(users::family_id.eq(&fid)),
                )
                .execute(conn)?;
                debug!(member_id = %mid, unassigned, deleted, "storage: delete_member");
                Ok(deleted > 0)
            })
        })
        .await
    }

    // Chores

    pub async fn list_chores(&self, family_id: &str) -> Result<Vec<ChoreRow>, StorageError> {
        let fid = family_id.to_string();
        self.with_conn(move |conn| {
            Ok(chores::table
                .left_join(
                    users::table.on(users::id
                        .nullable()
                        .eq(chores::assigned_to)
                        .and(users::family_id.eq(chores::family_id.nullable()))),
                )
                .filter(chores::family_id.eq(&fid))
                .order((chores::created_at.desc(), chores::id.asc()))
                .select((Chore::as_select(), users::name.nullable()))
                .load::<ChoreRow>(conn)?)
        })
        .await
    }

    pub async fn create_chore(
        &self,
        family_id: &str,
        fields: ChoreChanges,
    ) -> Result<ChoreRow, StorageError> {
        let fid = family_id.to_string();
        self.with_conn(move |conn| {
            check_assignee(conn, &fid, fields.assigned_to.as_deref())?;
            let id = Uuid::new_v4().to_string();
            let row = NewChore {
                id: &id,
                family_id: &fid,
                title: &fields.title,
                description: fields.description.as_deref(),
                assigned_to: fields.assigned_to.as_deref(),
                points: fields.points,
                status: ChoreStatus::Open.as_str(),
                due_date: fields.due_date,
                created_at: now(),
            };
            diesel::insert_into(chores::table)
                .values(&row)
                .execute(conn)?;
            load_chore_row(conn, &fid, &id)?
                .ok_or_else(|| StorageError::NotFound(format!("chore {id}")))
        })
        .await
    }

    pub async fn update_chore(
        &self,
        family_id: &str,
        chore_id: &str,
        fields: ChoreChanges,
    ) -> Result<Option<ChoreRow>, StorageError> {
        let fid = family_id.to_string();
        let cid = chore_id.to_string();
        self.with_conn(move |conn| {
            check_assignee(conn, &fid, fields.assigned_to.as_deref())?;
            let updated = diesel::update(
                chores::table
                    .filter(chores::id.eq(&cid))
                    .filter(chores::family_id.eq(&fid)),
            )
            .set(&fields)
            .execute(conn)?;
            if updated == 0 {
                return Ok(None);
            }
            load_chore_row(conn, &fid, &cid)
        })
        .await
    }

    /// Moves a chore to `next`, or flips it when `next` is `None`, keeping
    /// `completed_at` set exactly while the chore is completed.
    pub async fn set_chore_status(
        &self,
        family_id: &str,
        chore_id: &str,
        next: Option<ChoreStatus>,
    ) -> Result<Option<ChoreRow>, StorageError> {
        let fid = family_id.to_string();
        let cid = chore_id.to_string();
        self.with_conn(move |conn| {
            let Some(chore) = chores::table
                .filter(chores::id.eq(&cid))
                .filter(chores::family_id.eq(&fid))
                .select(Chore::as_select())
                .first(conn)
                .optional()?
            else {
                return Ok(None);
            };
            let current: ChoreStatus = chore
                .status
                .parse()
                .map_err(|e: clan_shared::domain::ParseEnumError| {
                    StorageError::InvalidInput(e.to_string())
                })?;
            let completed_at = chore.completed_at.map(|t| t.and_utc());
            let now = Utc::now();
            let change = match next {
                Some(next) => StatusChange::apply(current, completed_at, next, now),
                None => StatusChange::toggle(current, completed_at, now),
            };
            trace!(chore_id = %cid, from = %current, to = %change.status, "storage: chore status");
            diesel::update(chores::table.find(&chore.id))
                .set((
                    chores::status.eq(change.status.as_str()),
                    chores::completed_at.eq(change.completed_at.map(|t| t.naive_utc())),
                ))
                .execute(conn)?;
            load_chore_row(conn, &fid, &cid)
        })
        .await
    }

    pub async fn delete_chore(
        &self,
        family_id: &str,
        chore_id: &str,
    ) -> Result<bool, StorageError> {
        let fid = family_id.to_string();
        let cid = chore_id.to_string();
        self.with_conn(move |conn| {
            let deleted = diesel::delete(
                chores::table
                    .filter(chores::id.eq(&cid))
                    .filter(chores::family_id.eq(&fid)),
            )
            .execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    // Shopping

    pub async fn list_shopping(&self, family_id: &str) -> Result<Vec<ShoppingItem>, StorageError> {
        let fid = family_id.to_string();
        self.with_conn(move |conn| {
            Ok(shopping_items::table
                .filter(shopping_items::family_id.eq(&fid))
                .order((shopping_items::created_at.asc(), shopping_items::id.asc()))
                .select(ShoppingItem::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn add_shopping_item(
        &self,
        family_id: &str,
        name: &str,
        category: Option<&str>,
    ) -> Result<ShoppingItem, StorageError> {
        let fid = family_id.to_string();
        let name = name.to_string();
        let category = category.map(str::to_string);
        self.with_conn(move |conn| {
            let id = Uuid::new_v4().to_string();
            let row = NewShoppingItem {
                id: &id,
                family_id: &fid,
                name: &name,
                checked: false,
                category: category.as_deref(),
                created_at: now(),
            };
            Ok(diesel::insert_into(shopping_items::table)
                .values(&row)
                .returning(ShoppingItem::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn toggle_shopping_item(
        &self,
        family_id: &str,
        item_id: &str,
    ) -> Result<Option<ShoppingItem>, StorageError> {
        let fid = family_id.to_string();
        let iid = item_id.to_string();
        self.with_conn(move |conn| {
            Ok(diesel::update(
                shopping_items::table
                    .filter(shopping_items::id.eq(&iid))
                    .filter(shopping_items::family_id.eq(&fid)),
            )
            .set(shopping_items::checked.eq(diesel::dsl::not(shopping_items::checked)))
            .returning(ShoppingItem::as_returning())
            .get_result(conn)
            .optional()?)
        })
        .await
    }

    pub async fn delete_shopping_item(
        &self,
        family_id: &str,
        item_id: &str,
    ) -> Result<bool, StorageError> {
        let fid = family_id.to_string();
        let iid = item_id.to_string();
        self.with_conn(move |conn| {
            let deleted = diesel::delete(
                shopping_items::table
                    .filter(shopping_items::id.eq(&iid))
                    .filter(shopping_items::family_id.eq(&fid)),
            )
            .execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    /// Deletes every purchased item of the family; returns how many went.
    pub async fn clear_purchased(&self, family_id: &str) -> Result<usize, StorageError> {
        let fid = family_id.to_string();
        self.with_conn(move |conn| {
            Ok(diesel::delete(
                shopping_items::table
                    .filter(shopping_items::family_id.eq(&fid))
                    .filter(shopping_items::checked.eq(true)),
            )
            .execute(conn)?)
        })
        .await
    }

    // Meals

    /// Slots ordered by day, then breakfast, lunch, dinner.
    pub async fn list_meals(&self, family_id: &str) -> Result<Vec<MealSlot>, StorageError> {
        let fid = family_id.to_string();
        let mut rows = self
            .with_conn(move |conn| {
                Ok(meal_slots::table
                    .filter(meal_slots::family_id.eq(&fid))
                    .order((meal_slots::day_of_week.asc(), meal_slots::created_at.asc()))
                    .select(MealSlot::as_select())
                    .load(conn)?)
            })
            .await?;
        rows.sort_by_key(|m| (m.day_of_week, m.meal_type.parse::<MealType>().ok()));
        Ok(rows)
    }

    pub async fn create_meal(
        &self,
        family_id: &str,
        day_of_week: u8,
        meal_type: MealType,
        changes: MealSlotChanges,
    ) -> Result<MealSlot, StorageError> {
        let fid = family_id.to_string();
        self.with_conn(move |conn| {
            let id = Uuid::new_v4().to_string();
            let row = NewMealSlot {
                id: &id,
                family_id: &fid,
                day_of_week: i32::from(day_of_week),
                meal_type: meal_type.as_str(),
                meal_name: changes.meal_name.as_deref(),
                recipe_notes: changes.recipe_notes.as_deref(),
                created_at: now(),
            };
            Ok(diesel::insert_into(meal_slots::table)
                .values(&row)
                .returning(MealSlot::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn update_meal(
        &self,
        family_id: &str,
        slot_id: &str,
        changes: MealSlotChanges,
    ) -> Result<Option<MealSlot>, StorageError> {
        let fid = family_id.to_string();
        let sid = slot_id.to_string();
        self.with_conn(move |conn| {
            Ok(diesel::update(
                meal_slots::table
                    .filter(meal_slots::id.eq(&sid))
                    .filter(meal_slots::family_id.eq(&fid)),
            )
            .set(&changes)
            .returning(MealSlot::as_returning())
            .get_result(conn)
            .optional()?)
        })
        .await
    }

    pub async fn delete_meal(&self, family_id: &str, slot_id: &str) -> Result<bool, StorageError> {
        let fid = family_id.to_string();
        let sid = slot_id.to_string();
        self.with_conn(move |conn| {
            let deleted = diesel::delete(
                meal_slots::table
                    .filter(meal_slots::id.eq(&sid))
                    .filter(meal_slots::family_id.eq(&fid)),
            )
            .execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }

    // Dashboard

    /// Counters for the family; "today" is the half-open UTC range `[day_start, day_end)`.
    pub async fn family_stats(
        &self,
        family_id: &str,
        day_start: NaiveDateTime,
        day_end: NaiveDateTime,
    ) -> Result<FamilyStats, StorageError> {
        let fid = family_id.to_string();
        self.with_conn(move |conn| {
            let total_chores = chores::table
                .filter(chores::family_id.eq(&fid))
                .count()
                .get_result(conn)?;
            let open_chores = chores::table
                .filter(chores::family_id.eq(&fid))
                .filter(chores::status.ne(ChoreStatus::Completed.as_str()))
                .count()
                .get_result(conn)?;
            let completed_today = chores::table
                .filter(chores::family_id.eq(&fid))
                .filter(chores::status.eq(ChoreStatus::Completed.as_str()))
                .filter(chores::completed_at.ge(day_start))
                .filter(chores::completed_at.lt(day_end))
                .count()
                .get_result(conn)?;
            let shopping_needed = shopping_items::table
                .filter(shopping_items::family_id.eq(&fid))
                .filter(shopping_items::checked.eq(false))
                .count()
                .get_result(conn)?;
            let meals_planned = meal_slots::table
                .filter(meal_slots::family_id.eq(&fid))
                .count()
                .get_result(conn)?;
            Ok(FamilyStats {
                total_chores,
                open_chores,
                completed_today,
                shopping_needed,
                meals_planned,
            })
        })
        .await
    }
}

fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

fn member_for_identity_sync(
    conn: &mut SqliteConnection,
    identity_id: &str,
) -> Result<Option<Member>, StorageError> {
    Ok(users::table
        .filter(users::identity_id.eq(identity_id))
        .select(Member::as_select())
        .first(conn)
        .optional()?)
}

/// Links the oldest unclaimed member row carrying `identity`'s email, as added
/// by a parent before that person signed up.
fn claim_member_by_email(
    conn: &mut SqliteConnection,
    identity: &Identity,
) -> Result<Option<Member>, StorageError> {
    let email = identity.email.to_lowercase();
    let Some(member) = users::table
        .filter(users::email.eq(&email))
        .filter(users::identity_id.is_null())
        .order((users::created_at.asc(), users::id.asc()))
        .select(Member::as_select())
        .first(conn)
        .optional()?
    else {
        return Ok(None);
    };
    let linked = diesel::update(users::table.find(&member.id))
        .set(users::identity_id.eq(Some(&identity.id)))
        .returning(Member::as_returning())
        .get_result(conn)?;
    info!(
        member_id = %member.id,
        identity_id = %identity.id,
        "provision: claimed member by email"
    );
    Ok(Some(linked))
}

/// Shared body of provisioning and the onboarding family step. Must run inside
/// an immediate transaction so concurrent callers for one identity serialize.
fn provision(
    conn: &mut SqliteConnection,
    identity: &Identity,
    family_name: &str,
    rename_existing: bool,
) -> Result<(Family, bool), StorageError> {
    let (existing, claimed) = match member_for_identity_sync(conn, &identity.id)? {
        Some(member) => (Some(member), false),
        None => {
            let member = claim_member_by_email(conn, identity)?;
            let claimed = member.is_some();
            (member, claimed)
        }
    };
    if let Some(fid) = existing.as_ref().and_then(|m| m.family_id.as_deref()) {
        // A claimed row joins the inviting family as is.
        let family = if rename_existing && !claimed {
            diesel::update(families::table.find(fid))
                .set(families::name.eq(family_name))
                .returning(Family::as_returning())
                .get_result(conn)?
        } else {
            families::table
                .find(fid)
                .select(Family::as_select())
                .first(conn)?
        };
        return Ok((family, false));
    }

    let family_id = Uuid::new_v4().to_string();
    let family = diesel::insert_into(families::table)
        .values(&NewFamily {
            id: &family_id,
            name: family_name,
            created_at: now(),
        })
        .returning(Family::as_returning())
        .get_result(conn)?;

    match existing {
        Some(member) => {
            diesel::update(users::table.find(&member.id))
                .set(users::family_id.eq(Some(&family_id)))
                .execute(conn)?;
            info!(
                member_id = %member.id,
                family_id = %family_id,
                "provision: linked member to new family"
            );
        }
        None => {
            let member_id = Uuid::new_v4().to_string();
            let display = if identity.name.trim().is_empty() {
                identity.email.as_str()
            } else {
                identity.name.trim()
            };
            diesel::insert_into(users::table)
                .values(&NewMember {
                    id: &member_id,
                    identity_id: Some(&identity.id),
                    email: &identity.email,
                    name: display,
                    role: Role::Parent.as_str(),
                    family_id: Some(&family_id),
                    onboarding_completed: false,
                    created_at: now(),
                })
                .execute(conn)?;
            info!(
                member_id = %member_id,
                family_id = %family_id,
                "provision: created family and parent member"
            );
        }
    }
    Ok((family, true))
}

fn load_chore_row(
    conn: &mut SqliteConnection,
    family_id: &str,
    chore_id: &str,
) -> Result<Option<ChoreRow>, StorageError> {
    Ok(chores::table
        .left_join(
            users::table.on(users::id
                .nullable()
                .eq(chores::assigned_to)
                .and(users::family_id.eq(chores::family_id.nullable()))),
        )
        .filter(chores::id.eq(chore_id))
        .filter(chores::family_id.eq(family_id))
        .select((Chore::as_select(), users::name.nullable()))
        .first::<ChoreRow>(conn)
        .optional()?)
}

fn check_assignee(
    conn: &mut SqliteConnection,
    family_id: &str,
    assignee: Option<&str>,
) -> Result<(), StorageError> {
    let Some(assignee) = assignee else {
        return Ok(());
    };
    let found: i64 = users::table
        .filter(users::id.eq(assignee))
        .filter(users::family_id.eq(family_id))
        .count()
        .get_result(conn)?;
    if found == 0 {
        return Err(StorageError::InvalidInput(format!(
            "assignee {assignee} is not a member of this family"
        )));
    }
    Ok(())
}

fn configure_sqlite_conn(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    // Enable WAL for better read/write concurrency and set a busy timeout
    diesel::sql_query("PRAGMA journal_mode=WAL;").execute(conn)?;
    diesel::sql_query("PRAGMA synchronous=NORMAL;").execute(conn)?;
    diesel::sql_query("PRAGMA busy_timeout=5000;").execute(conn)?;
    diesel::sql_query("PRAGMA foreign_keys=ON;").execute(conn)?;
    Ok(())
}
