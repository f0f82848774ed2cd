//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which builds the model [`Catalog`] over an
//! in-memory pool with every table already created.

use backpack::models::Catalog;
use backpack_orm::pool::{init_memory_pool, DbPool};
use backpack_orm::{Record, Repository, Value};

pub struct TestHarness {
    pub db: DbPool,
    pub catalog: Catalog,
}

impl TestHarness {
    pub fn new() -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let catalog = Catalog::build().expect("catalog declarations are valid");
        catalog
            .ensure_tables(&Repository::new(&db))
            .expect("failed to create tables");

        Self { db, catalog }
    }

    pub fn repo(&self) -> Repository<'_, DbPool> {
        Repository::new(&self.db)
    }

    /// Insert an account with the given name and starting balance.
    #[allow(dead_code)]
    pub fn account(&self, name: &str, balance: i64) -> Record {
        let repo = self.repo();
        let mut account = repo
            .create(
                &self.catalog.account,
                [("name", Value::from(name)), ("balance", Value::from(balance))],
            )
            .expect("valid account");
        repo.insert(&mut account).expect("insert account");
        account
    }
}
