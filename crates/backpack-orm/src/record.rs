//! Entity instances: live records validated against their [`EntityType`].

use std::fmt;
use std::sync::Arc;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::entity::EntityType;
use crate::error::{Error, Result};
use crate::executor::Row;
use crate::field::Field;
use crate::value::Value;

/// Persistence lifecycle of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Constructed, never inserted.
    Transient,
    /// Inserted or loaded from storage.
    Persisted,
    /// Row removed; the record is stale.
    Deleted,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Persisted => write!(f, "persisted"),
            Self::Deleted => write!(f, "deleted"),
        }
    }
}

/// A record of one entity: one value per declared field.
#[derive(Clone)]
pub struct Record {
    entity: Arc<EntityType>,
    values: Vec<Value>,
    state: State,
}

impl Record {
    /// Construct a transient record without touching storage.
    ///
    /// Supplied values win; other fields get a generated UUID or their static
    /// default. Supplied values are type-checked like [`Record::set`].
    ///
    /// The entity's table is not created here. Use
    /// [`Repository::create`](crate::Repository::create) when the record is
    /// headed for storage; it also ensures the table exists.
    pub fn new<I, K>(entity: &Arc<EntityType>, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut supplied: Vec<Option<Value>> = vec![None; entity.fields().len()];
        for (attribute, value) in values {
            let (i, field) = entity.require(attribute.as_ref())?;
            check(entity, field, &value)?;
            supplied[i] = Some(value);
        }

        let values = entity
            .fields()
            .iter()
            .zip(supplied)
            .map(|(field, value)| value.unwrap_or_else(|| field.initial_value()))
            .collect();

        Ok(Self {
            entity: Arc::clone(entity),
            values,
            state: State::Transient,
        })
    }

    /// Rebuild a record from a result row without any I/O.
    ///
    /// Columns are matched to fields by column name and decoded to the
    /// field's type. Relationship columns keep the raw key; columns the
    /// entity does not declare are ignored.
    pub fn from_row(entity: &Arc<EntityType>, row: &Row) -> Result<Self> {
        let mut values = vec![Value::Null; entity.fields().len()];
        for (column, raw) in row.iter() {
            let Some((i, field)) = entity.field_by_column(column) else {
                tracing::trace!(table = entity.table_name(), column, "ignoring unmapped column");
                continue;
            };
            values[i] = field
                .logical_type()
                .decode(raw.clone())
                .map_err(|message| Error::decode(column, message))?;
        }

        Ok(Self {
            entity: Arc::clone(entity),
            values,
            state: State::Persisted,
        })
    }

    /// Column values in declaration order, relationships collapsed to keys.
    pub fn serialize(&self) -> Row {
        let mut row = Row::default();
        for (field, value) in self.iter() {
            row.push(field.column_name(), value.to_column());
        }
        row
    }

    pub fn entity(&self) -> &Arc<EntityType> {
        &self.entity
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Current value of `attribute`.
    ///
    /// Relationship attributes return whatever is held: a resolved
    /// [`Value::Entity`], a raw key, or null. Use
    /// [`Repository::resolve`](crate::Repository::resolve) to load a raw key.
    pub fn get(&self, attribute: &str) -> Result<&Value> {
        let (i, _) = self.entity.require(attribute)?;
        Ok(&self.values[i])
    }

    /// Assign `attribute`, rejecting values of the wrong representation.
    ///
    /// Null is accepted for every field; `required` is enforced by storage.
    pub fn set(&mut self, attribute: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let (i, field) = self.entity.require(attribute)?;
        check(&self.entity, field, &value)?;
        self.values[i] = value;
        Ok(())
    }

    /// Store a raw foreign key in a relationship attribute, to be resolved
    /// on read.
    pub fn set_key(&mut self, attribute: &str, key: impl Into<Value>) -> Result<()> {
        let key = key.into();
        let (i, field) = self.entity.require(attribute)?;
        let fk = field.foreign_key().ok_or_else(|| {
            Error::configuration(format!(
                "{}.{attribute} is not a relationship",
                self.entity.name()
            ))
        })?;
        if !key.is_null() && !fk.logical_type().accepts(&key) {
            return Err(Error::TypeMismatch {
                entity: self.entity.name().to_string(),
                attribute: attribute.to_string(),
                expected: fk.logical_type().native().to_string(),
                found: key.kind(),
            });
        }
        self.values[i] = key;
        Ok(())
    }

    /// The resolved record held by a relationship attribute, if any.
    pub fn related(&self, attribute: &str) -> Result<Option<&Record>> {
        Ok(self.get(attribute)?.as_record())
    }

    /// Value of the primary key field.
    pub fn id(&self) -> &Value {
        &self.values[self.entity.primary_key_index()]
    }

    /// Fields paired with their current values, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Field, &Value)> {
        self.entity.fields().iter().zip(&self.values)
    }

    /// JSON object keyed by attribute name.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    pub(crate) fn value_at(&self, i: usize) -> &Value {
        &self.values[i]
    }

    /// Unchecked write used by the persistence layer.
    pub(crate) fn assign(&mut self, i: usize, value: Value) {
        self.values[i] = value;
    }

    pub(crate) fn set_state(&mut self, state: State) {
        self.state = state;
    }

    pub(crate) fn expect_state(&self, expected: State, operation: &'static str) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(Error::InvalidState {
                entity: self.entity.name().to_string(),
                state: self.state,
                operation,
            })
        }
    }
}

fn check(entity: &EntityType, field: &Field, value: &Value) -> Result<()> {
    if field.accepts(value) {
        Ok(())
    } else {
        Err(Error::TypeMismatch {
            entity: entity.name().to_string(),
            attribute: field.name().to_string(),
            expected: field.expected(),
            found: value.kind(),
        })
    }
}

/// Records compare by entity and attribute values; lifecycle state is ignored.
impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.entity.name() == other.entity.name() && self.values == other.values
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] ", self.entity.name(), self.state)?;
        f.debug_map()
            .entries(self.iter().map(|(field, value)| (field.name(), value)))
            .finish()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (", self.entity.name())?;
        for (i, (field, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match value {
                Value::Entity(record) => write!(f, "{}: {}", field.name(), record.id())?,
                value => write!(f, "{}: {}", field.name(), value)?,
            }
        }
        write!(f, ")")
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (field, value) in self.iter() {
            map.serialize_entry(field.name(), value)?;
        }
        map.end()
    }
}
