//! Integration tests for accounts and orders persisted through a pool.

mod common;

use assert_matches::assert_matches;
use backpack::models::ledger::{orders_for, place_order};
use backpack_orm::{Error, Filter, State, Value};
use common::TestHarness;

#[test]
fn insert_and_find_account() {
    let h = TestHarness::new();
    let account = h.account("A", 0);

    let found = h
        .repo()
        .find_one(&h.catalog.account, &Filter::by("id", account.id().clone()))
        .unwrap()
        .unwrap();
    assert_eq!(found, account);
    assert_eq!(found.state(), State::Persisted);
}

#[test]
fn find_all_rehydrates_account_on_each_order() {
    let h = TestHarness::new();
    let repo = h.repo();
    let mut account = h.account("A", 100);

    place_order(&repo, &h.catalog.order, &mut account, 10).unwrap();
    place_order(&repo, &h.catalog.order, &mut account, 20).unwrap();

    let orders = orders_for(&repo, &h.catalog.order, &account).unwrap();
    let totals: Vec<_> = orders
        .iter()
        .map(|o| o.get("total").unwrap().clone())
        .collect();
    assert_eq!(totals, [Value::Integer(10), Value::Integer(20)]);
    for order in &orders {
        let owner = order.related("account").unwrap().unwrap();
        assert_eq!(owner.id(), account.id());
        assert_eq!(owner.get("balance").unwrap(), &Value::Integer(70));
    }
}

#[test]
fn deleting_account_cascades_to_orders() {
    let h = TestHarness::new();
    let repo = h.repo();
    let mut account = h.account("A", 50);
    let other = h.account("B", 0);
    place_order(&repo, &h.catalog.order, &mut account, 5).unwrap();

    let removed = repo.remove(&mut account).unwrap();
    assert_eq!(removed, 1);
    assert_eq!(account.state(), State::Deleted);

    let remaining = repo.find_all(&h.catalog.order, &Filter::new()).unwrap();
    assert!(remaining.is_empty());
    let accounts = repo.find_all(&h.catalog.account, &Filter::new()).unwrap();
    assert_eq!(accounts, [other]);
}

#[test]
fn delete_requires_a_filter() {
    let h = TestHarness::new();
    h.account("A", 0);

    let result = h.repo().delete(&h.catalog.account, &Filter::new());
    assert_matches!(result, Err(Error::EmptyFilter { .. }));

    assert_eq!(h.repo().delete_all(&h.catalog.account).unwrap(), 1);
}

#[test]
fn update_after_delete_is_rejected() {
    let h = TestHarness::new();
    let repo = h.repo();
    let mut account = h.account("A", 0);
    repo.remove(&mut account).unwrap();

    account.set("name", "B").unwrap();
    assert_matches!(repo.update(&account), Err(Error::InvalidState { .. }));
}

#[test]
fn order_for_unknown_account_violates_foreign_key() {
    let h = TestHarness::new();
    let repo = h.repo();

    let mut order = repo
        .create(&h.catalog.order, [("total", Value::from(1))])
        .unwrap();
    order.set_key("account", "no-such-account").unwrap();

    let err = repo.insert(&mut order).unwrap_err();
    assert!(err.is_storage());
    assert_eq!(order.state(), State::Transient);
}
