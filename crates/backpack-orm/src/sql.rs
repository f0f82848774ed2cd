//! SQL generation from the metamodel and record state.
//!
//! Identifiers come only from the metamodel; every value travels as a bound
//! `?` parameter.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::EntityType;
use crate::field::Field;
use crate::record::Record;
use crate::value::Value;

/// SQL dialect used for the engine-specific parts of DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Sqlite,
    MySql,
}

impl Dialect {
    /// Key constraints in the order the dialect expects them.
    pub(crate) fn key_clauses(self, primary_key: bool, auto_increment: bool) -> Vec<&'static str> {
        let clauses = match self {
            Self::MySql => [
                auto_increment.then_some("AUTO_INCREMENT"),
                primary_key.then_some("PRIMARY KEY"),
            ],
            Self::Sqlite => [
                primary_key.then_some("PRIMARY KEY"),
                auto_increment.then_some("AUTOINCREMENT"),
            ],
        };
        clauses.into_iter().flatten().collect()
    }

    pub fn current_date(self) -> &'static str {
        match self {
            Self::Sqlite => "CURRENT_DATE",
            Self::MySql => "(CURRENT_DATE)",
        }
    }

    pub fn current_timestamp(self) -> &'static str {
        "CURRENT_TIMESTAMP"
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => write!(f, "sqlite"),
            Self::MySql => write!(f, "mysql"),
        }
    }
}

/// SQL text plus positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self::with_params(sql, Vec::new())
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// Equality filter keyed by attribute name, combined with AND.
///
/// Keys that name no attribute of the queried entity are dropped.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Filter {
    conditions: Vec<(String, Value)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter on a single attribute.
    pub fn by(attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().with(attribute, value)
    }

    /// Add an equality condition.
    pub fn with(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.conditions.push((attribute.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Conditions that apply to `entity`, with their fields.
    pub fn matching<'a>(
        &'a self,
        entity: &'a EntityType,
    ) -> impl Iterator<Item = (&'a Field, &'a Value)> + 'a {
        self.conditions
            .iter()
            .filter_map(move |(attribute, value)| entity.field(attribute).map(|f| (f, value)))
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Filter {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |filter, (k, v)| filter.with(k, v))
    }
}

/// `CREATE TABLE IF NOT EXISTS` for `entity`; foreign keys follow the columns.
pub fn create_table(entity: &EntityType, dialect: Dialect) -> String {
    let columns = entity
        .fields()
        .iter()
        .map(|field| format!("{} {}", field.column_name(), field.render_column_ddl(dialect)));
    let foreign_keys = entity
        .fields()
        .iter()
        .filter_map(Field::foreign_key_constraint);
    let definitions: Vec<String> = columns.chain(foreign_keys).collect();

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({});",
        entity.table_name(),
        definitions.join(", ")
    )
}

/// INSERT of every field in declaration order.
pub fn insert(record: &Record) -> Statement {
    let row = record.serialize();
    let placeholders = vec!["?"; row.len()].join(", ");
    Statement::with_params(
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            record.entity().table_name(),
            row.columns().join(", "),
            placeholders
        ),
        row.values().to_vec(),
    )
}

/// SELECT with an equality filter, optionally limited to one row.
pub fn select(entity: &EntityType, filter: &Filter, limit_one: bool) -> Statement {
    let (clause, params) = where_clause(entity, filter);
    let mut sql = format!("SELECT * FROM {}{}", entity.table_name(), clause);
    if limit_one {
        sql.push_str(" LIMIT 1");
    }
    Statement::with_params(sql, params)
}

/// UPDATE of every non-key field, keyed on the current primary key.
///
/// Returns `None` when the entity has nothing but its primary key.
pub fn update(record: &Record) -> Option<Statement> {
    let entity = record.entity();
    let (assignments, mut params): (Vec<_>, Vec<_>) = record
        .iter()
        .filter(|(field, _)| !field.is_primary_key())
        .map(|(field, value)| (format!("{} = ?", field.column_name()), value.to_column()))
        .unzip();
    if assignments.is_empty() {
        return None;
    }
    params.push(record.id().clone());

    Some(Statement::with_params(
        format!(
            "UPDATE {} SET {} WHERE {} = ?",
            entity.table_name(),
            assignments.join(", "),
            entity.primary_key().column_name()
        ),
        params,
    ))
}

/// DELETE of all rows matching `filter`. An empty filter deletes every row.
pub fn delete(entity: &EntityType, filter: &Filter) -> Statement {
    let (clause, params) = where_clause(entity, filter);
    Statement::with_params(format!("DELETE FROM {}{}", entity.table_name(), clause), params)
}

/// ` WHERE a = ? AND b = ?` (empty when nothing applies) and its parameters.
fn where_clause(entity: &EntityType, filter: &Filter) -> (String, Vec<Value>) {
    let (conditions, params): (Vec<_>, Vec<_>) = filter
        .matching(entity)
        .map(|(field, value)| (format!("{} = ?", field.column_name()), value.to_column()))
        .unzip();

    if conditions.is_empty() {
        (String::new(), params)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Field, Generator};
    use crate::types::LogicalType;
    use std::sync::Arc;

    fn account() -> Arc<EntityType> {
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
            .unwrap()
    }

    fn order(account: &Arc<EntityType>) -> Arc<EntityType> {
        EntityType::builder("Order")
            .table("orders")
            .field(
                "id",
                Field::new(LogicalType::Integer)
                    .primary_key()
                    .generated(Generator::AutoIncrement),
            )
            .field("account", Field::references(account))
            .field("total", Field::new(LogicalType::Integer).required())
            .build()
            .unwrap()
    }

    #[test]
    fn test_create_table() {
        assert_eq!(
            create_table(&account(), Dialect::Sqlite),
            "CREATE TABLE IF NOT EXISTS account (id VARCHAR(255) PRIMARY KEY, \
             name VARCHAR(255) NOT NULL, balance INTEGER DEFAULT 0);"
        );
    }

    #[test]
    fn test_create_table_with_foreign_key() {
        let orders = order(&account());
        assert_eq!(
            create_table(&orders, Dialect::MySql),
            "CREATE TABLE IF NOT EXISTS orders (id INTEGER AUTO_INCREMENT PRIMARY KEY, \
             account VARCHAR(255), total INTEGER NOT NULL, \
             FOREIGN KEY (account) REFERENCES account(id) ON DELETE CASCADE);"
        );
    }

    #[test]
    fn test_insert() {
        let entity = account();
        let record = Record::new(
            &entity,
            [("id", Value::from("a1")), ("name", Value::from("A"))],
        )
        .unwrap();
        let stmt = insert(&record);
        assert_eq!(
            stmt.sql,
            "INSERT INTO account (id, name, balance) VALUES (?, ?, ?)"
        );
        assert_eq!(
            stmt.params,
            vec![Value::from("a1"), Value::from("A"), Value::Integer(0)]
        );
    }

    #[test]
    fn test_insert_serializes_relationship_to_key() {
        let accounts = account();
        let orders = order(&accounts);
        let owner = Record::new(&accounts, [("id", Value::from("a1"))]).unwrap();
        let record = Record::new(
            &orders,
            [("account", Value::from(owner)), ("total", Value::from(5))],
        )
        .unwrap();

        let stmt = insert(&record);
        assert_eq!(stmt.sql, "INSERT INTO orders (id, account, total) VALUES (?, ?, ?)");
        assert_eq!(
            stmt.params,
            vec![Value::Null, Value::from("a1"), Value::Integer(5)]
        );
    }

    #[test]
    fn test_select() {
        let entity = account();
        let filter = Filter::new().with("name", "A").with("balance", 0);
        let stmt = select(&entity, &filter, true);
        assert_eq!(
            stmt.sql,
            "SELECT * FROM account WHERE name = ? AND balance = ? LIMIT 1"
        );
        assert_eq!(stmt.params, vec![Value::from("A"), Value::Integer(0)]);

        let stmt = select(&entity, &Filter::new(), false);
        assert_eq!(stmt.sql, "SELECT * FROM account");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn test_unknown_filter_keys_are_dropped() {
        let entity = account();
        let filter = Filter::new().with("nickname", "x").with("name", "A");
        let stmt = select(&entity, &filter, false);
        assert_eq!(stmt.sql, "SELECT * FROM account WHERE name = ?");
        assert_eq!(stmt.params, vec![Value::from("A")]);
    }

    #[test]
    fn test_filter_uses_column_names() {
        let entity = EntityType::builder("User")
            .field("id", Field::new(LogicalType::text()).column("userId").primary_key())
            .build()
            .unwrap();
        let stmt = select(&entity, &Filter::by("id", "u1"), true);
        assert_eq!(stmt.sql, "SELECT * FROM user WHERE userId = ? LIMIT 1");
    }

    #[test]
    fn test_update() {
        let entity = account();
        let record = Record::new(
            &entity,
            [("id", Value::from("a1")), ("name", Value::from("B"))],
        )
        .unwrap();
        let stmt = update(&record).unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE account SET name = ?, balance = ? WHERE id = ?"
        );
        assert_eq!(
            stmt.params,
            vec![Value::from("B"), Value::Integer(0), Value::from("a1")]
        );
    }

    #[test]
    fn test_update_key_only_entity() {
        let entity = EntityType::builder("Tag")
            .field("label", Field::new(LogicalType::text()).primary_key())
            .build()
            .unwrap();
        let record = Record::new(&entity, [("label", Value::from("x"))]).unwrap();
        assert!(update(&record).is_none());
    }

    #[test]
    fn test_delete() {
        let entity = account();
        let stmt = delete(&entity, &Filter::by("name", "A"));
        assert_eq!(stmt.sql, "DELETE FROM account WHERE name = ?");

        let stmt = delete(&entity, &Filter::new());
        assert_eq!(stmt.sql, "DELETE FROM account");
    }

    #[test]
    fn test_filter_from_iter() {
        let filter: Filter = [("name", "A"), ("id", "a1")].into_iter().collect();
        assert_eq!(filter, Filter::new().with("name", "A").with("id", "a1"));
    }

    #[test]
    fn test_dialect_serde() {
        let dialect: Dialect = serde_json::from_str("\"mysql\"").unwrap();
        assert_eq!(dialect, Dialect::MySql);
        assert_eq!(Dialect::default().to_string(), "sqlite");
    }
}
