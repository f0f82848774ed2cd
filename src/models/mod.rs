//! Entity declarations for the application's tables.
//!
//! All entities are built once at startup into a [`Catalog`]; relationship
//! fields hold the same `Arc<EntityType>` the catalog hands out.

pub mod ledger;
pub mod user;

use std::sync::Arc;

use backpack_orm::{EntityType, Executor, Repository, Result};

/// Every entity the application declares.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub user: Arc<EntityType>,
    pub account: Arc<EntityType>,
    pub order: Arc<EntityType>,
}

impl Catalog {
    /// Declare and validate all entities.
    pub fn build() -> Result<Self> {
        let account = ledger::account()?;
        let order = ledger::order(&account)?;

        Ok(Self {
            user: user::entity()?,
            account,
            order,
        })
    }

    /// Entities with referenced tables before the tables that reference them.
    pub fn entities(&self) -> [&Arc<EntityType>; 3] {
        [&self.user, &self.account, &self.order]
    }

    /// Create every table that does not exist yet.
    pub fn ensure_tables<X: Executor + ?Sized>(&self, repo: &Repository<'_, X>) -> Result<()> {
        for entity in self.entities() {
            repo.ensure_table(entity)?;
        }
        Ok(())
    }
}
