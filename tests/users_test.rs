//! Integration tests for user persistence.

mod common;

use backpack::models::user::{self, NewUser};
use backpack_orm::{Filter, Value};
use chrono::NaiveDate;
use common::TestHarness;

fn alice() -> NewUser<'static> {
    NewUser {
        username: "alice",
        email: "alice@example.com",
        password_hash: "hashed",
        birth_date: NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(),
    }
}

#[test]
fn register_user() {
    let h = TestHarness::new();
    let created = user::register(&h.repo(), &h.catalog.user, &alice()).unwrap();

    let json = user::public_json(&created).unwrap();
    assert_eq!(json["username"], "alice");
    assert_eq!(json["verified"], false);
    assert!(json["userId"].is_string());
}

#[test]
fn login_lookup_prefers_username() {
    let h = TestHarness::new();
    let repo = h.repo();
    user::register(&repo, &h.catalog.user, &alice()).unwrap();

    let by_name =
        user::find_by_login(&repo, &h.catalog.user, Some("alice"), Some("nobody@x")).unwrap();
    assert!(by_name.is_some());

    let missing =
        user::find_by_login(&repo, &h.catalog.user, Some("bob"), Some("alice@example.com"))
            .unwrap();
    assert!(missing.is_none());
}

#[test]
fn stored_user_keeps_typed_values() {
    let h = TestHarness::new();
    let repo = h.repo();
    let created = user::register(&repo, &h.catalog.user, &alice()).unwrap();

    let stored = repo
        .find_one(&h.catalog.user, &Filter::by("id", created.id().clone()))
        .unwrap()
        .unwrap();
    assert_eq!(
        stored.get("birth_date").unwrap(),
        &Value::from(NaiveDate::from_ymd_opt(1990, 1, 15).unwrap())
    );
    assert_eq!(stored.get("verified").unwrap(), &Value::Boolean(false));
    assert_eq!(
        stored.get("created_at").unwrap(),
        created.get("created_at").unwrap()
    );
}

#[test]
fn verify_user() {
    let h = TestHarness::new();
    let repo = h.repo();
    let mut created = user::register(&repo, &h.catalog.user, &alice()).unwrap();
    let token = created
        .get("verification_token")
        .unwrap()
        .as_str()
        .unwrap()
        .to_string();

    assert!(user::verify(&repo, &mut created, &token).unwrap());

    let stored = user::find_by_login(&repo, &h.catalog.user, Some("alice"), None)
        .unwrap()
        .unwrap();
    assert_eq!(user::public_json(&stored).unwrap()["verified"], true);
}
