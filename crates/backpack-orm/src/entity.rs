//! Entity metamodel: the immutable schema of one table.
//!
//! Entities are declared once at startup through [`EntityType::builder`].
//! The resulting `Arc<EntityType>` is shared by every record of that entity
//! and by every relationship field that references it.
//!
//! ```
//! use backpack_orm::{EntityType, Field, Generator, LogicalType};
//!
//! let account = EntityType::builder("Account")
//!     .field("id", Field::new(LogicalType::text()).primary_key().generated(Generator::Uuid))
//!     .field("name", Field::new(LogicalType::text()).required())
//!     .field("balance", Field::new(LogicalType::Integer).default(0))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(account.table_name(), "account");
//! assert_eq!(account.primary_key().name(), "id");
//! ```

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::field::Field;

/// Schema of one entity: table name plus fields in declaration order.
pub struct EntityType {
    name: String,
    table: String,
    fields: Vec<Field>,
    index: HashMap<String, usize>,
    primary_key: usize,
}

impl EntityType {
    /// Start declaring an entity named `name`.
    pub fn builder(name: impl Into<String>) -> EntityBuilder {
        EntityBuilder {
            name: name.into(),
            table: None,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, attribute: &str) -> Option<&Field> {
        self.index.get(attribute).map(|&i| &self.fields[i])
    }

    /// Position and descriptor of `attribute`, or `AttributeNotFound`.
    pub fn require(&self, attribute: &str) -> Result<(usize, &Field)> {
        self.index
            .get(attribute)
            .map(|&i| (i, &self.fields[i]))
            .ok_or_else(|| Error::attribute_not_found(&self.name, attribute))
    }

    /// Field stored in `column`.
    pub fn field_by_column(&self, column: &str) -> Option<(usize, &Field)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, field)| field.column_name() == column)
    }

    pub fn primary_key(&self) -> &Field {
        &self.fields[self.primary_key]
    }

    pub(crate) fn primary_key_index(&self) -> usize {
        self.primary_key
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityType")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Declaration of an entity, turned into an [`EntityType`] by [`build`].
///
/// [`build`]: EntityBuilder::build
#[derive(Debug)]
pub struct EntityBuilder {
    name: String,
    table: Option<String>,
    fields: Vec<(String, Field)>,
}

impl EntityBuilder {
    /// Override the table name (defaults to the lower-cased entity name).
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Declare the next attribute.
    pub fn field(mut self, attribute: impl Into<String>, field: Field) -> Self {
        self.fields.push((attribute.into(), field));
        self
    }

    /// Register the declared fields and validate the result.
    ///
    /// Fails with `Configuration` when there is not exactly one primary key,
    /// when attribute or column names collide, or when a field's generator
    /// or default does not fit its type.
    pub fn build(self) -> Result<Arc<EntityType>> {
        let mut fields = Vec::with_capacity(self.fields.len());
        let mut index = HashMap::with_capacity(self.fields.len());
        let mut columns = HashSet::with_capacity(self.fields.len());

        for (attribute, mut field) in self.fields {
            field.register(&attribute);
            field.validate(&self.name)?;
            if index.insert(attribute.clone(), fields.len()).is_some() {
                return Err(Error::configuration(format!(
                    "{}: attribute {attribute} declared twice",
                    self.name
                )));
            }
            if !columns.insert(field.column_name().to_string()) {
                return Err(Error::configuration(format!(
                    "{}: column {} is used by more than one field",
                    self.name,
                    field.column_name()
                )));
            }
            fields.push(field);
        }

        let mut keys = fields
            .iter()
            .enumerate()
            .filter(|(_, field)| field.is_primary_key())
            .map(|(i, _)| i);
        let primary_key = match (keys.next(), keys.next()) {
            (Some(i), None) => i,
            (None, _) => {
                return Err(Error::configuration(format!(
                    "{} has no primary key",
                    self.name
                )))
            }
            (Some(_), Some(_)) => {
                return Err(Error::configuration(format!(
                    "{} declares more than one primary key",
                    self.name
                )))
            }
        };

        let table = self.table.unwrap_or_else(|| self.name.to_lowercase());

        Ok(Arc::new(EntityType {
            name: self.name,
            table,
            fields,
            index,
            primary_key,
        }))
    }
}
