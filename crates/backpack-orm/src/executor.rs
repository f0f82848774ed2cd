//! Execution interface between generated statements and a SQL engine.
//!
//! An [`Executor`] runs exactly one statement per call. Implementations are
//! provided for a plain [`rusqlite::Connection`] and for the r2d2 pool in
//! [`crate::pool`], which checks a connection out for the duration of the
//! call.

use rusqlite::{params_from_iter, Connection};

use crate::error::{Error, Result};
use crate::sql::{Dialect, Statement};
use crate::value::Value;

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Execution {
    pub rows_affected: usize,
    /// Row id most recently generated by the engine on this connection.
    pub last_insert_id: Option<i64>,
}

/// One result row: column names with their raw storage values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn push(&mut self, column: impl Into<String>, value: Value) {
        self.columns.push(column.into());
        self.values.push(value);
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(String::as_str).zip(&self.values)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// A synchronous SQL engine.
///
/// Errors from the engine are returned unchanged as [`Error::Storage`] or
/// [`Error::Pool`].
pub trait Executor {
    /// Dialect used when rendering DDL for this engine.
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    /// Run a statement that returns no rows.
    fn execute(&self, statement: &Statement) -> Result<Execution>;

    /// Run a statement and collect its rows.
    fn query(&self, statement: &Statement) -> Result<Vec<Row>>;
}

impl Executor for Connection {
    fn execute(&self, statement: &Statement) -> Result<Execution> {
        tracing::debug!(sql = %statement.sql, params = statement.params.len(), "executing statement");
        let rows_affected = Connection::execute(
            self,
            &statement.sql,
            params_from_iter(statement.params.iter()),
        )?;
        Ok(Execution {
            rows_affected,
            last_insert_id: Some(self.last_insert_rowid()),
        })
    }

    fn query(&self, statement: &Statement) -> Result<Vec<Row>> {
        tracing::debug!(sql = %statement.sql, params = statement.params.len(), "running query");
        let mut stmt = self.prepare(&statement.sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(statement.params.iter()))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(columns.len());
            for (i, column) in columns.iter().enumerate() {
                let value = Value::from_storage(row.get_ref(i)?)
                    .map_err(|message| Error::decode(column.as_str(), message))?;
                values.push(value);
            }
            result.push(Row::new(columns.clone(), values));
        }

        Ok(result)
    }
}
