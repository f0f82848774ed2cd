//! Field descriptors: per-attribute schema metadata.
//!
//! A [`Field`] is declared with a builder and registered on an entity by
//! [`EntityBuilder::field`](crate::entity::EntityBuilder::field), which
//! assigns its attribute name and, unless overridden, its column name.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::entity::EntityType;
use crate::error::{Error, Result};
use crate::sql::Dialect;
use crate::types::LogicalType;
use crate::value::Value;

/// Primary-key value generation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Generator {
    /// The caller supplies the value.
    #[default]
    None,
    /// A random UUID string is generated at construction.
    Uuid,
    /// The storage engine assigns the value on insert.
    AutoIncrement,
}

/// Static default for a field.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Literal(Value),
    /// The current date or timestamp, depending on the field's type.
    Now,
}

/// A reference from one entity to another entity's primary key.
#[derive(Clone)]
pub struct ForeignKey {
    target: Arc<EntityType>,
    column: String,
    logical_type: LogicalType,
}

impl ForeignKey {
    pub fn target(&self) -> &Arc<EntityType> {
        &self.target
    }

    /// Referenced column on the target table.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Type of the referenced key, used for the referencing column.
    pub fn logical_type(&self) -> LogicalType {
        self.logical_type
    }
}

impl fmt::Debug for ForeignKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignKey")
            .field("target", &self.target.name())
            .field("column", &self.column)
            .field("logical_type", &self.logical_type)
            .finish()
    }
}

/// What an attribute maps to.
#[derive(Debug, Clone)]
pub enum Mapped {
    Scalar(LogicalType),
    Reference(ForeignKey),
}

/// Schema metadata for one entity attribute.
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    column: Option<String>,
    mapped: Mapped,
    required: bool,
    unique: bool,
    primary_key: bool,
    default: Option<DefaultValue>,
    generator: Generator,
}

impl Field {
    /// Declare a scalar field.
    pub fn new(logical_type: LogicalType) -> Self {
        Self::with_mapping(Mapped::Scalar(logical_type))
    }

    /// Declare a relationship to `target`, stored as a foreign key on the
    /// target's primary key column.
    pub fn references(target: &Arc<EntityType>) -> Self {
        let key = target.primary_key();
        Self::with_mapping(Mapped::Reference(ForeignKey {
            target: Arc::clone(target),
            column: key.column_name().to_string(),
            logical_type: key.logical_type(),
        }))
    }

    fn with_mapping(mapped: Mapped) -> Self {
        Self {
            name: String::new(),
            column: None,
            mapped,
            required: false,
            unique: false,
            primary_key: false,
            default: None,
            generator: Generator::None,
        }
    }

    /// Override the storage column name.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    pub fn default_now(mut self) -> Self {
        self.default = Some(DefaultValue::Now);
        self
    }

    pub fn generated(mut self, generator: Generator) -> Self {
        self.generator = generator;
        self
    }

    /// Attribute name; empty until registered on an entity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage column name.
    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }

    pub fn mapped(&self) -> &Mapped {
        &self.mapped
    }

    /// Type stored in this field's column.
    pub fn logical_type(&self) -> LogicalType {
        match &self.mapped {
            Mapped::Scalar(ty) => *ty,
            Mapped::Reference(fk) => fk.logical_type,
        }
    }

    pub fn foreign_key(&self) -> Option<&ForeignKey> {
        match &self.mapped {
            Mapped::Reference(fk) => Some(fk),
            Mapped::Scalar(_) => None,
        }
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    pub fn generator(&self) -> Generator {
        self.generator
    }

    /// Whether `value` may be assigned to this field. Null always may.
    pub fn accepts(&self, value: &Value) -> bool {
        match (&self.mapped, value) {
            (_, Value::Null) => true,
            (Mapped::Scalar(ty), value) => ty.accepts(value),
            (Mapped::Reference(fk), Value::Entity(record)) => {
                record.entity().name() == fk.target.name()
            }
            (Mapped::Reference(_), _) => false,
        }
    }

    /// Human-readable expected representation for error messages.
    pub fn expected(&self) -> String {
        match &self.mapped {
            Mapped::Scalar(ty) => ty.native().to_string(),
            Mapped::Reference(fk) => fk.target.name().to_string(),
        }
    }

    /// Column type and constraints, without the column name:
    /// `<sqlType> [NOT NULL] [UNIQUE] [DEFAULT ..] [key clauses]`.
    pub fn render_column_ddl(&self, dialect: Dialect) -> String {
        let mut parts = vec![self.logical_type().sql_name()];
        if self.required {
            parts.push("NOT NULL".to_string());
        }
        if self.unique {
            parts.push("UNIQUE".to_string());
        }
        if let Some(default) = self.render_default(dialect) {
            parts.push(format!("DEFAULT {default}"));
        }
        let auto_increment = self.generator == Generator::AutoIncrement;
        parts.extend(
            dialect
                .key_clauses(self.primary_key, auto_increment)
                .into_iter()
                .map(str::to_string),
        );
        parts.join(" ")
    }

    /// Temporal types render the current-time sentinel whatever the default.
    fn render_default(&self, dialect: Dialect) -> Option<String> {
        let default = self.default.as_ref()?;
        match (self.logical_type(), default) {
            (LogicalType::Date, _) => Some(dialect.current_date().to_string()),
            (LogicalType::DateTime, _) => Some(dialect.current_timestamp().to_string()),
            (_, DefaultValue::Literal(value)) => Some(value.sql_literal()),
            (_, DefaultValue::Now) => None,
        }
    }

    /// Table-level foreign key constraint, if this is a relationship.
    pub fn foreign_key_constraint(&self) -> Option<String> {
        self.foreign_key().map(|fk| {
            format!(
                "FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE CASCADE",
                self.column_name(),
                fk.target.table_name(),
                fk.column
            )
        })
    }

    /// Value a freshly constructed record starts with.
    pub(crate) fn initial_value(&self) -> Value {
        if self.generator == Generator::Uuid {
            return Value::Text(Uuid::new_v4().to_string());
        }
        match (&self.default, self.logical_type()) {
            (Some(DefaultValue::Literal(value)), _) => value.clone(),
            (Some(DefaultValue::Now), LogicalType::Date) => Value::Date(Utc::now().date_naive()),
            (Some(DefaultValue::Now), _) => Value::DateTime(Utc::now().naive_utc()),
            (None, _) => Value::Null,
        }
    }

    pub(crate) fn register(&mut self, name: &str) {
        self.name = name.to_string();
        if self.column.as_deref().map_or(true, str::is_empty) {
            self.column = Some(name.to_string());
        }
    }

    /// Reject declarations that cannot produce a working table.
    pub(crate) fn validate(&self, entity: &str) -> Result<()> {
        let defect = |msg: &str| Err(Error::configuration(format!("{entity}.{}: {msg}", self.name)));

        match (self.generator, &self.mapped) {
            (Generator::None, _) => {}
            (_, Mapped::Reference(_)) => return defect("relationship fields cannot be generated"),
            (Generator::Uuid, Mapped::Scalar(LogicalType::Text { .. })) => {}
            (Generator::Uuid, _) => return defect("UUID generation requires a text type"),
            (Generator::AutoIncrement, Mapped::Scalar(LogicalType::Integer)) => {}
            (Generator::AutoIncrement, _) => {
                return defect("auto-increment generation requires an integer type")
            }
        }
        if self.generator == Generator::AutoIncrement && !self.primary_key {
            return defect("auto-increment is only supported on the primary key");
        }

        match (&self.default, &self.mapped) {
            (None, _) => Ok(()),
            (Some(_), Mapped::Reference(_)) => defect("relationship fields cannot have a default"),
            (Some(DefaultValue::Now), Mapped::Scalar(ty)) if !ty.is_temporal() => {
                defect("a current-time default requires a date or datetime type")
            }
            (Some(DefaultValue::Literal(value)), Mapped::Scalar(ty))
                if !value.is_null() && !ty.accepts(value) =>
            {
                defect(&format!("default {} is not a {}", value.kind(), ty.native()))
            }
            (Some(_), _) => Ok(()),
        }
    }
}
