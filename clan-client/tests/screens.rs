use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use clan_client::AppError;
use clan_client::backend::FamilyBackend;
use clan_client::screens::chores::{ChoreEdit, ChoreInput, ChoresScreen};
use clan_client::screens::family::{FamilyScreen, MemberInput};
use clan_client::screens::meals::MealsScreen;
use clan_client::screens::shopping::ShoppingScreen;
use clan_client::screens::{Confirm, enter, onboarding};
use clan_shared::api::{
    ChoreDto, ChoreStatusReq, ClearPurchasedResp, DashboardStatsDto, EnsureFamilyResp, FamilyDto,
    IdentityDto, MeDto, MealSlotDto, MemberDto, NewChoreReq, NewMealSlotReq, NewMemberReq,
    NewShoppingItemReq, OnboardingStatusDto, RouteDecisionDto, ShoppingItemDto, UpdateChoreReq,
    UpdateMealSlotReq, UpdateMemberReq,
};
use clan_shared::auth::Role;
use clan_shared::domain::{
    self, ChoreFilter, ChoreStatus, DayOfWeek, MealType, NOT_ENOUGH_MEMBERS_MSG, OnboardingStatus,
    ShoppingFilter, StatusChange,
};
use clan_shared::guard::{Screen, route_decision};

#[derive(Default)]
struct State {
    next_id: u32,
    family: Option<FamilyDto>,
    /// The signed-in identity's own member row, by id.
    me: Option<String>,
    completed: bool,
    /// Server-side onboarding threshold; `None` uses the default.
    min_members: Option<usize>,
    members: Vec<MemberDto>,
    chores: Vec<ChoreDto>,
    shopping: Vec<ShoppingItemDto>,
    meals: Vec<MealSlotDto>,
    calls: Vec<&'static str>,
}

impl State {
    fn id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{:04}", self.next_id)
    }

    fn my_member(&self) -> Option<MemberDto> {
        let id = self.me.as_ref()?;
        self.members.iter().find(|m| &m.id == id).cloned().map(|mut m| {
            m.onboarding_completed = self.completed;
            m
        })
    }

    fn status(&self) -> OnboardingStatusDto {
        let family_id = self.family.as_ref().map(|f| f.id.clone());
        let status = OnboardingStatus {
            completed: self.completed,
            has_family: family_id.is_some(),
        };
        OnboardingStatusDto {
            completed: self.completed,
            has_family: status.has_family,
            family_id,
            stage: status.stage(),
            min_members: self.min_members.unwrap_or(domain::DEFAULT_MIN_MEMBERS),
        }
    }

    fn create_family(&mut self, name: &str) -> FamilyDto {
        let family = FamilyDto {
            id: self.id("fam"),
            name: name.to_string(),
        };
        let member_id = self.id("mem");
        self.members.push(MemberDto {
            id: member_id.clone(),
            email: "ann@example.com".into(),
            name: "Ann".into(),
            role: Role::Parent,
            family_id: Some(family.id.clone()),
            onboarding_completed: false,
            created_at: Utc::now(),
        });
        self.me = Some(member_id);
        self.family = Some(family.clone());
        family
    }

    fn check_family(&self, family_id: &str) -> Result<(), AppError> {
        match &self.family {
            Some(f) if f.id == family_id => Ok(()),
            _ => Err(AppError::Http("forbidden".into())),
        }
    }

    fn assignee_name(&self, id: Option<&str>) -> Option<String> {
        let id = id?;
        self.members
            .iter()
            .find(|m| m.id == id)
            .map(|m| m.name.clone())
    }
}

/// Keeps every row in memory and records which operations ran.
#[derive(Default)]
struct FakeBackend {
    state: Mutex<State>,
}

impl FakeBackend {
    fn with_min_members(min_members: usize) -> Self {
        let backend = Self::default();
        backend.state.lock().unwrap().min_members = Some(min_members);
        backend
    }

    fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    fn count(&self, op: &str) -> usize {
        self.calls().iter().filter(|c| **c == op).count()
    }

    fn ids_issued(&self) -> usize {
        self.state.lock().unwrap().next_id as usize
    }

    fn with<T>(&self, op: &'static str, f: impl FnOnce(&mut State) -> T) -> T {
        let mut st = self.state.lock().unwrap();
        st.calls.push(op);
        f(&mut st)
    }
}

struct Answer(bool);

impl Confirm for Answer {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

#[async_trait]
impl FamilyBackend for FakeBackend {
    async fn me(&self) -> Result<MeDto, AppError> {
        Ok(self.with("me", |st| MeDto {
            identity: IdentityDto {
                id: "ident-1".into(),
                email: "ann@example.com".into(),
                name: "Ann".into(),
            },
            member: st.my_member(),
            status: st.status(),
        }))
    }

    async fn onboarding_status(&self) -> Result<OnboardingStatusDto, AppError> {
        Ok(self.with("onboarding_status", |st| st.status()))
    }

    async fn route(&self, screen: Screen) -> Result<RouteDecisionDto, AppError> {
        Ok(self.with("route", |st| {
            let decision = route_decision(screen, Some(&st.status().status()));
            RouteDecisionDto::new(screen, decision)
        }))
    }

    async fn ensure_family(&self) -> Result<EnsureFamilyResp, AppError> {
        Ok(self.with("ensure_family", |st| match &st.family {
            Some(f) => EnsureFamilyResp {
                family_id: f.id.clone(),
                created: false,
            },
            None => EnsureFamilyResp {
                family_id: st.create_family(domain::DEFAULT_FAMILY_NAME).id,
                created: true,
            },
        }))
    }

    async fn create_family(&self, name: &str) -> Result<FamilyDto, AppError> {
        Ok(self.with("create_family", |st| match st.family.as_mut() {
            Some(f) => {
                f.name = name.to_string();
                f.clone()
            }
            None => st.create_family(name),
        }))
    }

    async fn complete_onboarding(&self) -> Result<(), AppError> {
        self.with("complete_onboarding", |st| {
            if st.members.len() < domain::DEFAULT_MIN_MEMBERS {
                return Err(AppError::Http(NOT_ENOUGH_MEMBERS_MSG.into()));
            }
            st.completed = true;
            Ok(())
        })
    }

    async fn get_family(&self, family_id: &str) -> Result<FamilyDto, AppError> {
        self.with("get_family", |st| {
            st.check_family(family_id)?;
            st.family.clone().ok_or(AppError::Http("not found".into()))
        })
    }

    async fn rename_family(&self, family_id: &str, name: &str) -> Result<FamilyDto, AppError> {
        self.with("rename_family", |st| {
            st.check_family(family_id)?;
            let f = st.family.as_mut().ok_or(AppError::Http("not found".into()))?;
            f.name = name.to_string();
            Ok(f.clone())
        })
    }

    async fn list_members(&self, family_id: &str) -> Result<Vec<MemberDto>, AppError> {
        self.with("list_members", |st| {
            st.check_family(family_id)?;
            Ok(st.members.clone())
        })
    }

    async fn add_member(&self, family_id: &str, req: &NewMemberReq) -> Result<MemberDto, AppError> {
        self.with("add_member", |st| {
            st.check_family(family_id)?;
            let member = MemberDto {
                id: st.id("mem"),
                email: req.email.clone().unwrap_or_else(|| {
                    domain::placeholder_email(&req.name, domain::DEFAULT_PLACEHOLDER_DOMAIN)
                }),
                name: req.name.clone(),
                role: req.role,
                family_id: Some(family_id.to_string()),
                onboarding_completed: true,
                created_at: Utc::now(),
            };
            st.members.push(member.clone());
            Ok(member)
        })
    }

    async fn update_member(
        &self,
        family_id: &str,
        member_id: &str,
        req: &UpdateMemberReq,
    ) -> Result<MemberDto, AppError> {
        self.with("update_member", |st| {
            st.check_family(family_id)?;
            let m = st
                .members
                .iter_mut()
                .find(|m| m.id == member_id)
                .ok_or(AppError::Http("not found".into()))?;
            if let Some(n) = &req.name {
                m.name = n.clone();
            }
            if let Some(r) = req.role {
                m.role = r;
            }
            Ok(m.clone())
        })
    }

    async fn delete_member(&self, family_id: &str, member_id: &str) -> Result<(), AppError> {
        self.with("delete_member", |st| {
            st.check_family(family_id)?;
            for c in st.chores.iter_mut() {
                if c.assigned_to.as_deref() == Some(member_id) {
                    c.assigned_to = None;
                    c.assignee_name = None;
                }
            }
            st.members.retain(|m| m.id != member_id);
            Ok(())
        })
    }

    async fn list_chores(&self, family_id: &str) -> Result<Vec<ChoreDto>, AppError> {
        self.with("list_chores", |st| {
            st.check_family(family_id)?;
            Ok(st.chores.iter().rev().cloned().collect())
        })
    }

    async fn create_chore(&self, family_id: &str, req: &NewChoreReq) -> Result<ChoreDto, AppError> {
        self.with("create_chore", |st| {
            st.check_family(family_id)?;
            let chore = ChoreDto {
                id: st.id("chore"),
                title: req.title.clone(),
                description: req.description.clone(),
                assigned_to: req.assigned_to.clone(),
                assignee_name: st.assignee_name(req.assigned_to.as_deref()),
                points: req.points.unwrap_or(domain::DEFAULT_CHORE_POINTS),
                status: ChoreStatus::Open,
                due_date: req.due_date,
                created_at: Utc::now(),
                completed_at: None,
            };
            st.chores.push(chore.clone());
            Ok(chore)
        })
    }

    async fn update_chore(
        &self,
        family_id: &str,
        chore_id: &str,
        req: &UpdateChoreReq,
    ) -> Result<ChoreDto, AppError> {
        self.with("update_chore", |st| {
            st.check_family(family_id)?;
            let name = st.assignee_name(req.assigned_to.as_deref());
            let c = st
                .chores
                .iter_mut()
                .find(|c| c.id == chore_id)
                .ok_or(AppError::Http("not found".into()))?;
            c.title = req.title.clone();
            c.description = req.description.clone();
            c.assigned_to = req.assigned_to.clone();
            c.assignee_name = name;
            c.points = req.points;
            c.due_date = req.due_date;
            Ok(c.clone())
        })
    }

    async fn toggle_chore(&self, family_id: &str, chore_id: &str) -> Result<ChoreDto, AppError> {
        self.with("toggle_chore", |st| {
            st.check_family(family_id)?;
            let c = st
                .chores
                .iter_mut()
                .find(|c| c.id == chore_id)
                .ok_or(AppError::Http("not found".into()))?;
            let change = StatusChange::toggle(c.status, c.completed_at, Utc::now());
            c.status = change.status;
            c.completed_at = change.completed_at;
            Ok(c.clone())
        })
    }

    async fn set_chore_status(
        &self,
        family_id: &str,
        chore_id: &str,
        req: &ChoreStatusReq,
    ) -> Result<ChoreDto, AppError> {
        self.with("set_chore_status", |st| {
            st.check_family(family_id)?;
            let c = st
                .chores
                .iter_mut()
                .find(|c| c.id == chore_id)
                .ok_or(AppError::Http("not found".into()))?;
            let change = StatusChange::apply(c.status, c.completed_at, req.status, Utc::now());
            c.status = change.status;
            c.completed_at = change.completed_at;
            Ok(c.clone())
        })
    }

    async fn delete_chore(&self, family_id: &str, chore_id: &str) -> Result<(), AppError> {
        self.with("delete_chore", |st| {
            st.check_family(family_id)?;
            st.chores.retain(|c| c.id != chore_id);
            Ok(())
        })
    }

    async fn list_shopping(&self, family_id: &str) -> Result<Vec<ShoppingItemDto>, AppError> {
        self.with("list_shopping", |st| {
            st.check_family(family_id)?;
            Ok(st.shopping.clone())
        })
    }

    async fn add_shopping_item(
        &self,
        family_id: &str,
        req: &NewShoppingItemReq,
    ) -> Result<ShoppingItemDto, AppError> {
        self.with("add_shopping_item", |st| {
            st.check_family(family_id)?;
            let item = ShoppingItemDto {
                id: st.id("item"),
                name: req.name.clone(),
                checked: false,
                category: req.category.clone(),
                created_at: Utc::now(),
            };
            st.shopping.push(item.clone());
            Ok(item)
        })
    }

    async fn toggle_shopping_item(
        &self,
        family_id: &str,
        item_id: &str,
    ) -> Result<ShoppingItemDto, AppError> {
        self.with("toggle_shopping_item", |st| {
            st.check_family(family_id)?;
            let i = st
                .shopping
                .iter_mut()
                .find(|i| i.id == item_id)
                .ok_or(AppError::Http("not found".into()))?;
            i.checked = !i.checked;
            Ok(i.clone())
        })
    }

    async fn delete_shopping_item(&self, family_id: &str, item_id: &str) -> Result<(), AppError> {
        self.with("delete_shopping_item", |st| {
            st.check_family(family_id)?;
            st.shopping.retain(|i| i.id != item_id);
            Ok(())
        })
    }

    async fn clear_purchased(&self, family_id: &str) -> Result<ClearPurchasedResp, AppError> {
        self.with("clear_purchased", |st| {
            st.check_family(family_id)?;
            let before = st.shopping.len();
            st.shopping.retain(|i| !i.checked);
            Ok(ClearPurchasedResp {
                deleted: before - st.shopping.len(),
            })
        })
    }

    async fn list_meals(&self, family_id: &str) -> Result<Vec<MealSlotDto>, AppError> {
        self.with("list_meals", |st| {
            st.check_family(family_id)?;
            let mut slots = st.meals.clone();
            slots.sort_by_key(|s| (s.day_of_week, s.meal_type));
            Ok(slots)
        })
    }

    async fn create_meal(
        &self,
        family_id: &str,
        req: &NewMealSlotReq,
    ) -> Result<MealSlotDto, AppError> {
        self.with("create_meal", |st| {
            st.check_family(family_id)?;
            let slot = MealSlotDto {
                id: st.id("meal"),
                day_of_week: req.day_of_week,
                meal_type: req.meal_type,
                meal_name: req.meal_name.clone(),
                recipe_notes: req.recipe_notes.clone(),
                created_at: Utc::now(),
            };
            st.meals.push(slot.clone());
            Ok(slot)
        })
    }

    async fn update_meal(
        &self,
        family_id: &str,
        slot_id: &str,
        req: &UpdateMealSlotReq,
    ) -> Result<MealSlotDto, AppError> {
        self.with("update_meal", |st| {
            st.check_family(family_id)?;
            let s = st
                .meals
                .iter_mut()
                .find(|s| s.id == slot_id)
                .ok_or(AppError::Http("not found".into()))?;
            s.meal_name = req.meal_name.clone();
            s.recipe_notes = req.recipe_notes.clone();
            Ok(s.clone())
        })
    }

    async fn delete_meal(&self, family_id: &str, slot_id: &str) -> Result<(), AppError> {
        self.with("delete_meal", |st| {
            st.check_family(family_id)?;
            st.meals.retain(|s| s.id != slot_id);
            Ok(())
        })
    }

    async fn dashboard(&self, family_id: &str) -> Result<DashboardStatsDto, AppError> {
        self.with("dashboard", |st| {
            st.check_family(family_id)?;
            let today = Utc::now().date_naive();
            Ok(DashboardStatsDto {
                total_chores: st.chores.len() as i64,
                open_chores: st
                    .chores
                    .iter()
                    .filter(|c| !c.status.is_completed())
                    .count() as i64,
                completed_today: st
                    .chores
                    .iter()
                    .filter(|c| c.completed_at.is_some_and(|at| at.date_naive() == today))
                    .count() as i64,
                shopping_needed: st.shopping.iter().filter(|i| !i.checked).count() as i64,
                meals_planned: st.meals.len() as i64,
            })
        })
    }
}

/// A backend whose identity has finished onboarding with one child member.
async fn onboarded() -> FakeBackend {
    let backend = FakeBackend::default();
    onboarding::create_family(&backend, "The Smiths").await.unwrap();
    let mut members = FamilyScreen::open_at(&backend, Screen::OnboardingMembers)
        .await
        .unwrap();
    members
        .add_member(MemberInput {
            name: "Kid".into(),
            role: Role::Child,
            email: None,
        })
        .await
        .unwrap();
    onboarding::finish(&backend).await.unwrap();
    backend
}

#[tokio::test]
async fn main_screen_provisions_then_redirects_to_family_step() {
    let backend = FakeBackend::default();

    let err = ChoresScreen::open(&backend).await.err().unwrap();
    assert!(matches!(err, AppError::Redirect(Screen::OnboardingFamily)));
    assert_eq!(backend.count("ensure_family"), 1);
    assert_eq!(backend.count("list_chores"), 0);

    // Entering again reuses the provisioned family.
    let err = ShoppingScreen::open(&backend).await.err().unwrap();
    assert!(matches!(err, AppError::Redirect(Screen::OnboardingFamily)));
    // one family id plus one member id
    assert_eq!(backend.ids_issued(), 2);

    // The family step renames the provisioned family instead of adding one.
    let family = onboarding::create_family(&backend, "The Smiths").await.unwrap();
    assert_eq!(family.name, "The Smiths");
    assert_eq!(backend.ids_issued(), 2);
}

#[tokio::test]
async fn blank_family_name_is_rejected_before_any_request() {
    let backend = FakeBackend::default();
    let err = onboarding::create_family(&backend, "   ").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn onboarding_requires_a_second_member() {
    let backend = FakeBackend::default();
    onboarding::create_family(&backend, "The Smiths").await.unwrap();

    let err = enter(&backend, Screen::OnboardingComplete).await.unwrap_err();
    assert!(matches!(err, AppError::Redirect(Screen::OnboardingMembers)));

    let err = onboarding::finish(&backend).await.unwrap_err();
    assert_eq!(err.to_string(), NOT_ENOUGH_MEMBERS_MSG);
    assert_eq!(backend.count("complete_onboarding"), 0);

    let mut members = FamilyScreen::open_at(&backend, Screen::OnboardingMembers)
        .await
        .unwrap();
    let kid = members
        .add_member(MemberInput {
            name: "Billy Joe".into(),
            role: Role::Child,
            email: None,
        })
        .await
        .unwrap();
    assert_eq!(kid.email, "billyjoe@family.local");
    assert_eq!(members.members().len(), 2);

    onboarding::finish(&backend).await.unwrap();
    assert_eq!(backend.count("complete_onboarding"), 1);
    assert!(enter(&backend, Screen::Dashboard).await.is_ok());
    let err = enter(&backend, Screen::OnboardingFamily).await.unwrap_err();
    assert!(matches!(err, AppError::Redirect(Screen::Dashboard)));
}

#[tokio::test]
async fn onboarding_threshold_follows_the_server() {
    let backend = FakeBackend::with_min_members(3);
    onboarding::create_family(&backend, "The Smiths").await.unwrap();
    let mut members = FamilyScreen::open_at(&backend, Screen::OnboardingMembers)
        .await
        .unwrap();
    members
        .add_member(MemberInput {
            name: "Kid".into(),
            role: Role::Child,
            email: None,
        })
        .await
        .unwrap();

    let err = onboarding::finish(&backend).await.unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation(domain::ValidationError::NotEnoughMembers { have: 2, .. })
    ));
    assert_eq!(backend.count("complete_onboarding"), 0);

    members
        .add_member(MemberInput {
            name: "Baby".into(),
            role: Role::Child,
            email: None,
        })
        .await
        .unwrap();
    onboarding::finish(&backend).await.unwrap();
    assert_eq!(backend.count("complete_onboarding"), 1);
}

#[tokio::test]
async fn chore_filters_partition_and_toggle_round_trips() {
    let backend = onboarded().await;
    let mut screen = ChoresScreen::open(&backend).await.unwrap();

    let before = backend.count("create_chore");
    let err = screen
        .add(ChoreInput {
            title: "  ".into(),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let err = screen
        .add(ChoreInput {
            title: "Sweep".into(),
            points: Some(-3),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let err = screen
        .add(ChoreInput {
            title: "Sweep".into(),
            assignee: Some("Nobody".into()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Usage(_)));
    assert_eq!(backend.count("create_chore"), before);

    let dishes = screen
        .add(ChoreInput {
            title: "Dishes".into(),
            assignee: Some("kid".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(dishes.points, 10);
    assert_eq!(dishes.assignee_name.as_deref(), Some("Kid"));
    for title in ["Laundry", "Trash"] {
        screen
            .add(ChoreInput {
                title: title.into(),
                ..Default::default()
            })
            .await
            .unwrap();
    }
    // Newest first after the reload
    assert_eq!(screen.chores()[0].title, "Trash");

    let toggled = screen.toggle(&dishes.id).await.unwrap();
    assert_eq!(toggled.status, ChoreStatus::Completed);
    assert!(toggled.completed_at.is_some());

    let all = screen.filtered(ChoreFilter::All).len();
    let open = screen.filtered(ChoreFilter::Open);
    let done = screen.filtered(ChoreFilter::Completed);
    assert_eq!(all, 3);
    assert_eq!(open.len() + done.len(), all);
    assert!(open.iter().all(|c| done.iter().all(|d| d.id != c.id)));

    let back = screen.toggle(&dishes.id).await.unwrap();
    assert_eq!(back.status, ChoreStatus::Open);
    assert!(back.completed_at.is_none());

    let progress = screen
        .set_status(&dishes.id, ChoreStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(progress.status, ChoreStatus::InProgress);
    assert_eq!(screen.filtered(ChoreFilter::Open).len(), 3);

    let rendered = screen.render(ChoreFilter::All);
    assert!(rendered.contains("[~]"));
    assert!(rendered.contains("Kid"));
}

#[tokio::test]
async fn chore_edit_keeps_unchanged_fields() {
    let backend = onboarded().await;
    let mut screen = ChoresScreen::open(&backend).await.unwrap();
    let chore = screen
        .add(ChoreInput {
            title: "Walk dog".into(),
            description: Some("twice".into()),
            assignee: Some("Kid".into()),
            points: Some(7),
            due_date: None,
        })
        .await
        .unwrap();

    let edited = screen
        .edit(
            &chore.id,
            ChoreEdit {
                title: Some("Walk the dog".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(edited.title, "Walk the dog");
    assert_eq!(edited.points, 7);
    assert_eq!(edited.description.as_deref(), Some("twice"));
    assert_eq!(edited.assignee_name.as_deref(), Some("Kid"));

    let edited = screen
        .edit(
            &chore.id,
            ChoreEdit {
                unassign: true,
                description: Some(" ".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(edited.assigned_to.is_none());
    assert!(edited.description.is_none());
}

#[tokio::test]
async fn declined_delete_keeps_the_row() {
    let backend = onboarded().await;
    let mut screen = ChoresScreen::open(&backend).await.unwrap();
    let chore = screen
        .add(ChoreInput {
            title: "Vacuum".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert!(!screen.delete(&chore.id, &Answer(false)).await.unwrap());
    assert_eq!(backend.count("delete_chore"), 0);
    assert_eq!(screen.chores().len(), 1);

    // A unique id prefix is enough.
    assert!(screen.delete(&chore.id[..8], &Answer(true)).await.unwrap());
    assert!(screen.chores().is_empty());
}

#[tokio::test]
async fn shopping_clear_purchased_removes_only_checked_items() {
    let backend = onboarded().await;
    let mut screen = ShoppingScreen::open(&backend).await.unwrap();

    let err = screen.add(" ", None).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let milk = screen.add("Milk", Some("dairy")).await.unwrap();
    let bread = screen.add("Bread", Some("  ")).await.unwrap();
    assert!(bread.category.is_none());
    screen.add("Eggs", None).await.unwrap();

    // Nothing purchased yet: no prompt, no request
    assert_eq!(screen.clear_purchased(&Answer(true)).await.unwrap(), None);
    assert_eq!(backend.count("clear_purchased"), 0);

    screen.toggle(&milk.id).await.unwrap();
    screen.toggle(&bread.id).await.unwrap();
    assert_eq!(screen.filtered(ShoppingFilter::Needed).len(), 1);
    assert_eq!(
        screen.filtered(ShoppingFilter::Needed).len()
            + screen.filtered(ShoppingFilter::Purchased).len(),
        screen.filtered(ShoppingFilter::All).len()
    );

    assert_eq!(screen.clear_purchased(&Answer(false)).await.unwrap(), None);
    assert_eq!(screen.items().len(), 3);

    assert_eq!(screen.clear_purchased(&Answer(true)).await.unwrap(), Some(2));
    let names: Vec<&str> = screen.items().iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["Eggs"]);
}

#[tokio::test]
async fn saving_a_meal_cell_twice_updates_in_place() {
    let backend = onboarded().await;
    let mut screen = MealsScreen::open(&backend).await.unwrap();
    let monday = DayOfWeek::new(1).unwrap();

    screen
        .save(monday, MealType::Dinner, Some("Tacos"), None)
        .await
        .unwrap();
    screen
        .save(monday, MealType::Dinner, Some("Pasta"), Some("extra cheese"))
        .await
        .unwrap();
    assert_eq!(backend.count("create_meal"), 1);
    assert_eq!(backend.count("update_meal"), 1);

    let cells: Vec<_> = screen
        .slots()
        .iter()
        .filter(|s| s.day_of_week == monday && s.meal_type == MealType::Dinner)
        .collect();
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0].meal_name.as_deref(), Some("Pasta"));
    assert_eq!(cells[0].recipe_notes.as_deref(), Some("extra cheese"));

    let blank = screen
        .save(monday, MealType::Dinner, Some(" "), Some(""))
        .await
        .unwrap();
    assert!(blank.meal_name.is_none());
    assert!(blank.recipe_notes.is_none());

    let err = screen
        .clear(DayOfWeek::new(2).unwrap(), MealType::Lunch, &Answer(true))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Usage(_)));
    assert!(
        screen
            .clear(monday, MealType::Dinner, &Answer(true))
            .await
            .unwrap()
    );
    assert!(screen.slots().is_empty());
    assert!(screen.render().contains("Monday"));
}

#[tokio::test]
async fn saving_only_the_meal_name_keeps_its_notes() {
    let backend = onboarded().await;
    let mut screen = MealsScreen::open(&backend).await.unwrap();
    let monday = DayOfWeek::new(1).unwrap();

    screen
        .save(monday, MealType::Dinner, Some("Tacos"), Some("extra cheese"))
        .await
        .unwrap();
    let renamed = screen
        .save(monday, MealType::Dinner, Some("Pasta"), None)
        .await
        .unwrap();
    assert_eq!(renamed.meal_name.as_deref(), Some("Pasta"));
    assert_eq!(renamed.recipe_notes.as_deref(), Some("extra cheese"));

    let renoted = screen
        .save(monday, MealType::Dinner, None, Some("no onions"))
        .await
        .unwrap();
    assert_eq!(renoted.meal_name.as_deref(), Some("Pasta"));
    assert_eq!(renoted.recipe_notes.as_deref(), Some("no onions"));
    let cell = screen.slot(monday, MealType::Dinner).unwrap();
    assert_eq!(cell.recipe_notes.as_deref(), Some("no onions"));
}

#[tokio::test]
async fn removing_a_member_unassigns_their_chores_but_never_yourself() {
    let backend = onboarded().await;
    let mut chores = ChoresScreen::open(&backend).await.unwrap();
    chores
        .add(ChoreInput {
            title: "Feed cat".into(),
            assignee: Some("Kid".into()),
            ..Default::default()
        })
        .await
        .unwrap();

    let mut family = FamilyScreen::open(&backend).await.unwrap();
    let err = family.remove_member("Ann", &Answer(true)).await.unwrap_err();
    assert!(matches!(err, AppError::Usage(_)));
    assert_eq!(backend.count("delete_member"), 0);

    assert!(family.remove_member("kid", &Answer(true)).await.unwrap());
    assert_eq!(family.members().len(), 1);

    chores.reload().await.unwrap();
    assert!(chores.chores()[0].assigned_to.is_none());
    assert!(chores.render(ChoreFilter::All).contains("unassigned"));

    let err = family.rename("").await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    let renamed = family.rename("Smith Clan").await.unwrap();
    assert_eq!(renamed.name, "Smith Clan");
    assert!(family.render().starts_with("Smith Clan"));
}
