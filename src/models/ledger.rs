//! Accounts and the orders placed against them.

use std::sync::Arc;

use backpack_orm::{
    EntityType, Executor, Field, Filter, Generator, LogicalType, Record, Repository, Result,
    Value,
};

pub fn account() -> Result<Arc<EntityType>> {
    EntityType::builder("Account")
        .field(
            "id",
            Field::new(LogicalType::text())
                .primary_key()
                .generated(Generator::Uuid),
        )
        .field("name", Field::new(LogicalType::text()).required())
        .field("balance", Field::new(LogicalType::Integer).default(0))
        .build()
}

/// `order` is reserved in SQL, so the table is `orders`.
pub fn order(account: &Arc<EntityType>) -> Result<Arc<EntityType>> {
    EntityType::builder("Order")
        .table("orders")
        .field(
            "id",
            Field::new(LogicalType::Integer)
                .primary_key()
                .generated(Generator::AutoIncrement),
        )
        .field("account", Field::references(account).required())
        .field("total", Field::new(LogicalType::Integer).required())
        .field(
            "placed_at",
            Field::new(LogicalType::DateTime)
                .column("placedAt")
                .required()
                .default_now(),
        )
        .build()
}

/// Record an order for `account` and debit its balance.
///
/// Nothing is written when the debit would overflow the balance.
pub fn place_order<X: Executor + ?Sized>(
    repo: &Repository<'_, X>,
    orders: &Arc<EntityType>,
    account: &mut Record,
    total: i64,
) -> anyhow::Result<Record> {
    let balance = account.get("balance")?.as_i64().unwrap_or_default();
    let Some(remaining) = balance.checked_sub(total) else {
        anyhow::bail!(
            "order total {total} overflows balance {balance} of account {}",
            account.id()
        );
    };

    let mut order = repo.create(
        orders,
        [
            ("account", Value::from(account.clone())),
            ("total", Value::from(total)),
        ],
    )?;
    repo.insert(&mut order)?;

    account.set("balance", remaining)?;
    repo.update(account)?;

    Ok(order)
}

/// Orders placed against `account`, each with its account resolved.
pub fn orders_for<X: Executor + ?Sized>(
    repo: &Repository<'_, X>,
    orders: &Arc<EntityType>,
    account: &Record,
) -> Result<Vec<Record>> {
    repo.find_all(orders, &Filter::by("account", account.id().clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use backpack_orm::pool::init_memory_pool;

    #[test]
    fn test_place_order_debits_balance() {
        let accounts = account().unwrap();
        let orders = order(&accounts).unwrap();
        let pool = init_memory_pool().unwrap();
        let repo = Repository::new(&pool);

        let mut acct = repo
            .create(
                &accounts,
                [("name", Value::from("A")), ("balance", Value::from(100))],
            )
            .unwrap();
        repo.insert(&mut acct).unwrap();

        let placed = place_order(&repo, &orders, &mut acct, 30).unwrap();
        assert_eq!(placed.id(), &Value::Integer(1));
        assert_eq!(acct.get("balance").unwrap(), &Value::Integer(70));

        let stored = repo
            .find_one(&accounts, &Filter::by("id", acct.id().clone()))
            .unwrap()
            .unwrap();
        assert_eq!(stored.get("balance").unwrap(), &Value::Integer(70));

        let listed = orders_for(&repo, &orders, &acct).unwrap();
        assert_eq!(listed.len(), 1);
        let owner = listed[0].related("account").unwrap().unwrap();
        assert_eq!(owner.get("name").unwrap(), &Value::from("A"));
    }

    #[test]
    fn test_place_order_overflow_writes_nothing() {
        let accounts = account().unwrap();
        let orders = order(&accounts).unwrap();
        let pool = init_memory_pool().unwrap();
        let repo = Repository::new(&pool);

        let mut acct = repo
            .create(
                &accounts,
                [("name", Value::from("A")), ("balance", Value::from(i64::MIN))],
            )
            .unwrap();
        repo.insert(&mut acct).unwrap();

        let err = place_order(&repo, &orders, &mut acct, 1).unwrap_err();
        assert!(err.to_string().contains("overflows"));
        assert_eq!(acct.get("balance").unwrap(), &Value::Integer(i64::MIN));

        repo.ensure_table(&orders).unwrap();
        assert!(orders_for(&repo, &orders, &acct).unwrap().is_empty());
        let stored = repo
            .find_one(&accounts, &Filter::by("id", acct.id().clone()))
            .unwrap()
            .unwrap();
        assert_eq!(stored.get("balance").unwrap(), &Value::Integer(i64::MIN));
    }
}
