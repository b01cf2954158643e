use super::{API_V1_PREFIX, enc, family_scope};

fn base_join(base: &str, path: &str) -> String {
    let b = base.trim_end_matches('/');
    let p = path.trim_start_matches('/');
    format!("{}/{}", b, p)
}

fn v1(base: &str, rest: &str) -> String {
    base_join(base, &format!("{}/{}", API_V1_PREFIX, rest))
}

fn scoped(base: &str, family_id: &str, rest: &str) -> String {
    base_join(base, &format!("{}/{}", family_scope(family_id), rest))
}

pub fn version(base: &str) -> String {
    v1(base, "version")
}

pub fn auth_signup(base: &str) -> String {
    v1(base, "auth/signup")
}
pub fn auth_login(base: &str) -> String {
    v1(base, "auth/login")
}
pub fn auth_logout(base: &str) -> String {
    v1(base, "auth/logout")
}
pub fn auth_renew(base: &str) -> String {
    v1(base, "auth/renew")
}

pub fn me(base: &str) -> String {
    v1(base, "me")
}
pub fn me_onboarding(base: &str) -> String {
    v1(base, "me/onboarding")
}
pub fn me_route(base: &str, path: &str) -> String {
    format!("{}?path={}", v1(base, "me/route"), enc(path))
}
pub fn me_family(base: &str) -> String {
    v1(base, "me/family")
}

pub fn onboarding_family(base: &str) -> String {
    v1(base, "onboarding/family")
}
pub fn onboarding_complete(base: &str) -> String {
    v1(base, "onboarding/complete")
}

pub fn family(base: &str, family_id: &str) -> String {
    base_join(base, &family_scope(family_id))
}
pub fn dashboard(base: &str, family_id: &str) -> String {
    scoped(base, family_id, "dashboard")
}

pub fn members(base: &str, family_id: &str) -> String {
    scoped(base, family_id, "members")
}
pub fn member(base: &str, family_id: &str, member_id: &str) -> String {
    scoped(base, family_id, &format!("members/{}", enc(member_id)))
}

pub fn chores(base: &str, family_id: &str) -> String {
    scoped(base, family_id, "chores")
}
pub fn chore(base: &str, family_id: &str, chore_id: &str) -> String {
    scoped(base, family_id, &format!("chores/{}", enc(chore_id)))
}
pub fn chore_toggle(base: &str, family_id: &str, chore_id: &str) -> String {
    scoped(base, family_id, &format!("chores/{}/toggle", enc(chore_id)))
}
pub fn chore_status(base: &str, family_id: &str, chore_id: &str) -> String {
    scoped(base, family_id, &format!("chores/{}/status", enc(chore_id)))
}

pub fn shopping(base: &str, family_id: &str) -> String {
    scoped(base, family_id, "shopping")
}
pub fn shopping_item(base: &str, family_id: &str, item_id: &str) -> String {
    scoped(base, family_id, &format!("shopping/{}", enc(item_id)))
}
pub fn shopping_toggle(base: &str, family_id: &str, item_id: &str) -> String {
    scoped(base, family_id, &format!("shopping/{}/toggle", enc(item_id)))
}
pub fn shopping_clear_purchased(base: &str, family_id: &str) -> String {
    scoped(base, family_id, "shopping/clear-purchased")
}

pub fn meals(base: &str, family_id: &str) -> String {
    scoped(base, family_id, "meals")
}
pub fn meal(base: &str, family_id: &str, slot_id: &str) -> String {
    scoped(base, family_id, &format!("meals/{}", enc(slot_id)))
}
