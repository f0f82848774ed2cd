//! Backpack-ORM: declarative entity mapping over SQL.
//!
//! Entities are declared as typed field lists; the crate derives table DDL,
//! type-checked attribute access, relationship resolution, and CRUD
//! statements from that declaration. Statements run through the
//! [`Executor`] trait, implemented for rusqlite connections and r2d2 pools.
//!
//! # Modules
//!
//! - `types` - Logical field types and their SQL names
//! - `field` - Field descriptors and column DDL
//! - `entity` - Entity metamodel and its builder
//! - `record` - Live records with validated attribute access
//! - `sql` - Statement generation and dialects
//! - `executor` - Execution interface
//! - `pool` - Connection pool management
//! - `repository` - CRUD façade and row rehydration
//!
//! # Example
//!
//! ```no_run
//! use backpack_orm::pool::{init_pool, DEFAULT_POOL_SIZE};
//! use backpack_orm::{EntityType, Field, Filter, Generator, LogicalType, Repository, Value};
//!
//! let user = EntityType::builder("User")
//!     .field("id", Field::new(LogicalType::text()).primary_key().generated(Generator::Uuid))
//!     .field("username", Field::new(LogicalType::varchar(25)).required().unique())
//!     .build()
//!     .unwrap();
//!
//! let pool = init_pool("/var/lib/backpack/db.sqlite", DEFAULT_POOL_SIZE).unwrap();
//! let repo = Repository::new(&pool);
//!
//! let mut admin = repo.create(&user, [("username", Value::from("admin"))]).unwrap();
//! repo.insert(&mut admin).unwrap();
//! println!("Created user: {}", admin);
//!
//! let found = repo.find_one(&user, &Filter::by("username", "admin")).unwrap();
//! assert!(found.is_some());
//! ```

pub mod entity;
pub mod error;
pub mod executor;
pub mod field;
pub mod pool;
pub mod record;
pub mod repository;
pub mod sql;
pub mod types;
pub mod value;

pub use entity::{EntityBuilder, EntityType};
pub use error::{Error, Result};
pub use executor::{Execution, Executor, Row};
pub use field::{DefaultValue, Field, ForeignKey, Generator, Mapped};
pub use record::{Record, State};
pub use repository::Repository;
pub use sql::{Dialect, Filter, Statement};
pub use types::LogicalType;
pub use value::Value;
