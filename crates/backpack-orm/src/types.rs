//! Type catalog: logical field types and their SQL / in-memory counterparts.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::value::{Value, DATETIME_FORMAT, DATE_FORMAT};

/// Default `VARCHAR` length for text fields.
pub const DEFAULT_TEXT_LENGTH: u32 = 255;

/// Accepted textual encodings when reading a DATETIME column back.
const DATETIME_READ_FORMATS: &[&str] = &[DATETIME_FORMAT, "%Y-%m-%dT%H:%M:%S%.f"];

/// Abstract scalar type of an entity attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalType {
    /// 64-bit signed integer.
    Integer,
    /// Bounded text.
    Text { max_length: u32 },
    /// Calendar date without time.
    Date,
    /// Date and time without zone.
    DateTime,
    /// Boolean flag.
    Boolean,
}

impl LogicalType {
    /// Text with the default maximum length.
    pub const fn text() -> Self {
        Self::Text {
            max_length: DEFAULT_TEXT_LENGTH,
        }
    }

    /// Text with an explicit maximum length.
    pub const fn varchar(max_length: u32) -> Self {
        Self::Text { max_length }
    }

    /// Native SQL type name used in DDL.
    pub fn sql_name(&self) -> String {
        match self {
            Self::Integer => "INTEGER".to_string(),
            Self::Text { max_length } => format!("VARCHAR({max_length})"),
            Self::Date => "DATE".to_string(),
            Self::DateTime => "DATETIME".to_string(),
            Self::Boolean => "BOOLEAN".to_string(),
        }
    }

    /// Name of the in-memory representation, matching [`Value::kind`].
    pub fn native(&self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Text { .. } => "text",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Boolean => "boolean",
        }
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }

    /// Whether a non-null value has this type's in-memory representation.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Integer, Value::Integer(_))
                | (Self::Text { .. }, Value::Text(_))
                | (Self::Date, Value::Date(_))
                | (Self::DateTime, Value::DateTime(_))
                | (Self::Boolean, Value::Boolean(_))
        )
    }

    /// Convert a raw storage value into this type's representation.
    ///
    /// SQLite hands back dates as text and booleans as integers, so those are
    /// parsed here. Anything else that does not already conform is rejected.
    pub fn decode(&self, raw: Value) -> Result<Value, String> {
        match (self, raw) {
            (_, Value::Null) => Ok(Value::Null),
            (Self::Boolean, Value::Integer(i)) => Ok(Value::Boolean(i != 0)),
            (Self::Date, Value::Text(s)) => NaiveDate::parse_from_str(&s, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|e| format!("invalid date {s:?}: {e}")),
            (Self::DateTime, Value::Text(s)) => DATETIME_READ_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(&s, fmt).ok())
                .map(Value::DateTime)
                .ok_or_else(|| format!("invalid datetime {s:?}")),
            (ty, value) if ty.accepts(&value) => Ok(value),
            (ty, value) => Err(format!("expected {}, got {}", ty.native(), value.kind())),
        }
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_names() {
        assert_eq!(LogicalType::Integer.sql_name(), "INTEGER");
        assert_eq!(LogicalType::text().sql_name(), "VARCHAR(255)");
        assert_eq!(LogicalType::varchar(25).sql_name(), "VARCHAR(25)");
        assert_eq!(LogicalType::Date.sql_name(), "DATE");
        assert_eq!(LogicalType::DateTime.sql_name(), "DATETIME");
        assert_eq!(LogicalType::Boolean.to_string(), "BOOLEAN");
    }

    #[test]
    fn test_accepts() {
        assert!(LogicalType::Integer.accepts(&Value::Integer(3)));
        assert!(!LogicalType::Integer.accepts(&Value::Text("3".into())));
        assert!(LogicalType::varchar(2).accepts(&Value::Text("long text".into())));
        assert!(!LogicalType::Boolean.accepts(&Value::Integer(1)));
        assert!(!LogicalType::Date.accepts(&Value::Null));
    }

    #[test]
    fn test_decode_sqlite_storage() {
        assert_eq!(
            LogicalType::Boolean.decode(Value::Integer(1)),
            Ok(Value::Boolean(true))
        );
        assert_eq!(
            LogicalType::Date.decode(Value::Text("2024-02-29".into())),
            Ok(Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
        );

        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(
            LogicalType::DateTime.decode(Value::Text("2024-05-01 12:30:00".into())),
            Ok(Value::DateTime(expected))
        );
        assert_eq!(
            LogicalType::DateTime.decode(Value::Text("2024-05-01T12:30:00".into())),
            Ok(Value::DateTime(expected))
        );
        assert_eq!(LogicalType::text().decode(Value::Null), Ok(Value::Null));
    }

    #[test]
    fn test_decode_rejects_mismatch() {
        assert!(LogicalType::Integer.decode(Value::Text("x".into())).is_err());
        assert!(LogicalType::Date.decode(Value::Text("yesterday".into())).is_err());
    }
}
