//! Persistence façade: runs generated statements through an [`Executor`]
//! and turns result rows back into records.
//!
//! ```
//! use backpack_orm::pool::init_memory_pool;
//! use backpack_orm::{EntityType, Field, Filter, Generator, LogicalType, Repository, Value};
//!
//! let account = EntityType::builder("Account")
//!     .field("id", Field::new(LogicalType::text()).primary_key().generated(Generator::Uuid))
//!     .field("name", Field::new(LogicalType::text()).required())
//!     .field("balance", Field::new(LogicalType::Integer).default(0))
//!     .build()
//!     .unwrap();
//!
//! let pool = init_memory_pool().unwrap();
//! let repo = Repository::new(&pool);
//!
//! let mut record = repo.create(&account, [("name", Value::from("A"))]).unwrap();
//! repo.insert(&mut record).unwrap();
//!
//! let found = repo.find_one(&account, &Filter::by("name", "A")).unwrap().unwrap();
//! assert_eq!(found.id(), record.id());
//! ```

use std::sync::Arc;

use crate::entity::EntityType;
use crate::error::{Error, Result};
use crate::executor::{Executor, Row};
use crate::field::Generator;
use crate::record::{Record, State};
use crate::sql::{self, Filter, Statement};
use crate::value::Value;

/// CRUD operations for records, bound to one executor.
pub struct Repository<'a, X: ?Sized> {
    executor: &'a X,
}

impl<'a, X: Executor + ?Sized> Repository<'a, X> {
    pub fn new(executor: &'a X) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &'a X {
        self.executor
    }

    /// `CREATE TABLE IF NOT EXISTS` for `entity`. Safe to call repeatedly.
    pub fn ensure_table(&self, entity: &EntityType) -> Result<()> {
        tracing::trace!(table = entity.table_name(), "ensuring table exists");
        let ddl = sql::create_table(entity, self.executor.dialect());
        self.executor.execute(&Statement::new(ddl))?;
        Ok(())
    }

    /// Construct a transient record and make sure its table exists.
    pub fn create<I, K>(&self, entity: &Arc<EntityType>, values: I) -> Result<Record>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let record = Record::new(entity, values)?;
        self.ensure_table(entity)?;
        Ok(record)
    }

    /// Insert a transient record.
    ///
    /// An auto-increment primary key is written back from the engine.
    pub fn insert(&self, record: &mut Record) -> Result<()> {
        record.expect_state(State::Transient, "insert")?;
        let execution = self.executor.execute(&sql::insert(record))?;

        let entity = Arc::clone(record.entity());
        if entity.primary_key().generator() == Generator::AutoIncrement {
            if let Some(id) = execution.last_insert_id {
                record.assign(entity.primary_key_index(), Value::Integer(id));
            }
        }
        record.set_state(State::Persisted);
        Ok(())
    }

    /// First row matching `filter`, with relationships resolved.
    pub fn find_one(&self, entity: &Arc<EntityType>, filter: &Filter) -> Result<Option<Record>> {
        let rows = self.executor.query(&sql::select(entity, filter, true))?;
        rows.first().map(|row| self.rehydrate(entity, row)).transpose()
    }

    /// All rows matching `filter`, with relationships resolved.
    pub fn find_all(&self, entity: &Arc<EntityType>, filter: &Filter) -> Result<Vec<Record>> {
        let rows = self.executor.query(&sql::select(entity, filter, false))?;
        rows.iter().map(|row| self.rehydrate(entity, row)).collect()
    }

    /// Write every non-key field of a persisted record.
    ///
    /// Fails with `NotFound` when no stored row has the record's key.
    pub fn update(&self, record: &Record) -> Result<()> {
        record.expect_state(State::Persisted, "update")?;
        let Some(statement) = sql::update(record) else {
            return Ok(());
        };

        let execution = self.executor.execute(&statement)?;
        if execution.rows_affected == 0 {
            return Err(Error::not_found(format!(
                "{} with {} = {}",
                record.entity().name(),
                record.entity().primary_key().name(),
                record.id()
            )));
        }
        Ok(())
    }

    /// Delete every row matching `filter` and return how many went.
    ///
    /// A filter with no condition on a declared attribute is refused with
    /// `EmptyFilter`; use [`delete_all`](Self::delete_all) to clear a table.
    pub fn delete(&self, entity: &EntityType, filter: &Filter) -> Result<usize> {
        if filter.matching(entity).next().is_none() {
            return Err(Error::EmptyFilter {
                entity: entity.name().to_string(),
            });
        }
        Ok(self.executor.execute(&sql::delete(entity, filter))?.rows_affected)
    }

    /// Delete every row of `entity`'s table.
    pub fn delete_all(&self, entity: &EntityType) -> Result<usize> {
        Ok(self
            .executor
            .execute(&sql::delete(entity, &Filter::new()))?
            .rows_affected)
    }

    /// Delete the row behind a persisted record and mark the record deleted.
    pub fn remove(&self, record: &mut Record) -> Result<usize> {
        record.expect_state(State::Persisted, "remove")?;
        let entity = Arc::clone(record.entity());
        let filter = Filter::by(entity.primary_key().name(), record.id().clone());
        let removed = self.executor.execute(&sql::delete(&entity, &filter))?.rows_affected;
        record.set_state(State::Deleted);
        Ok(removed)
    }

    /// Resolve a relationship attribute on read.
    ///
    /// A raw key is looked up on the target entity and, when found, replaced
    /// by the loaded record. An already resolved record is returned without
    /// touching storage. Returns `None` for null or dangling keys.
    pub fn resolve<'r>(&self, record: &'r mut Record, attribute: &str) -> Result<Option<&'r Record>> {
        let (i, target) = {
            let (i, field) = record.entity().require(attribute)?;
            let fk = field.foreign_key().ok_or_else(|| {
                Error::configuration(format!(
                    "{}.{attribute} is not a relationship",
                    record.entity().name()
                ))
            })?;
            (i, Arc::clone(fk.target()))
        };

        let key = match record.value_at(i) {
            Value::Null => return Ok(None),
            Value::Entity(_) => None,
            raw => Some(raw.clone()),
        };
        if let Some(key) = key {
            match self.load_by_key(&target, key)? {
                Some(found) => record.assign(i, Value::from(found)),
                None => return Ok(None),
            }
        }

        Ok(record.value_at(i).as_record())
    }

    /// Build a record from a row, loading each referenced record one level
    /// deep. The loaded records keep their own foreign keys raw, and a key
    /// that matches no stored row is left raw rather than nulled, so the
    /// record still writes back the value it was read with.
    fn rehydrate(&self, entity: &Arc<EntityType>, row: &Row) -> Result<Record> {
        let mut record = Record::from_row(entity, row)?;

        for (i, field) in entity.fields().iter().enumerate() {
            let Some(fk) = field.foreign_key() else {
                continue;
            };
            let key = record.value_at(i);
            if key.is_null() {
                continue;
            }
            if let Some(found) = self.load_by_key(fk.target(), key.clone())? {
                record.assign(i, Value::from(found));
            }
        }

        Ok(record)
    }

    /// Target record with primary key `key`, without resolving its relationships.
    fn load_by_key(&self, target: &Arc<EntityType>, key: Value) -> Result<Option<Record>> {
        let filter = Filter::by(target.primary_key().name(), key);
        let rows = self.executor.query(&sql::select(target, &filter, true))?;
        rows.first()
            .map(|row| Record::from_row(target, row))
            .transpose()
    }
}
