/*
 *
 *  *
 *  *      Copyright (c) 2018-2025, SnackCloud All rights reserved.
 *  *
 *  *   Redistribution and use in source and binary forms, with or without
 *  *   modification, are permitted provided that the following conditions are met:
 *  *
 *  *   Redistributions of source code must retain the above copyright notice,
 *  *   this list of conditions and the following disclaimer.
 *  *   Redistributions in binary form must reproduce the above copyright
 *  *   notice, this list of conditions and the following disclaimer in the
 *  *   documentation and/or other materials provided with the distribution.
 *  *   Neither the name of the www.snackcloud.cn developer nor the names of its
 *  *   contributors may be used to endorse or promote products derived from
 *  *   this software without specific prior written permission.
 *  *   Author: SnackCloud
 *  *
 *
 */

//! The engine's runtime value type and string/type coercion.

use crate::errors::{EngineError, EngineResult};
use crate::types::AttrType;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A runtime value flowing through bind maps, filters and mapped rows.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Text(String),
    Integer(i32),
    Long(i64),
    Decimal(BigDecimal),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value the way it should appear in a bind-parameter
    /// log line or a `Display`-based diagnostic.
    pub fn render(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Text(s) => format!("'{s}'"),
            Value::Integer(i) => i.to_string(),
            Value::Long(l) => l.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::Boolean(b) => b.to_string(),
            Value::Date(d) => d.format("%Y-%m-%d").to_string(),
            Value::DateTime(dt) => dt.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Value::List(items) => {
                let joined = items.iter().map(Value::render).collect::<Vec<_>>().join(", ");
                format!("[{joined}]")
            }
        }
    }

    /// Coerce a raw string into the declared attribute/parameter type,
    /// per the empty/null handling and format rules.
    pub fn coerce_str(raw: &str, target: &AttrType) -> EngineResult<Value> {
        if raw.trim().is_empty() {
            return Ok(Value::Null);
        }
        match target {
            AttrType::String => Ok(Value::Text(raw.to_string())),
            AttrType::Integer => raw
                .trim()
                .parse::<i32>()
                .map(Value::Integer)
                .map_err(|_| EngineError::ValidationError(format!("'{raw}' is not a valid integer"))),
            AttrType::Long => raw
                .trim()
                .parse::<i64>()
                .map(Value::Long)
                .map_err(|_| EngineError::ValidationError(format!("'{raw}' is not a valid long"))),
            AttrType::Decimal => BigDecimal::from_str(raw.trim())
                .map(Value::Decimal)
                .map_err(|_| EngineError::ValidationError(format!("'{raw}' is not a valid decimal"))),
            AttrType::Boolean => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Value::Boolean(true)),
                "false" | "0" | "no" => Ok(Value::Boolean(false)),
                _ => Err(EngineError::ValidationError(format!("'{raw}' is not a valid boolean"))),
            },
            AttrType::LocalDate => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| EngineError::ValidationError(format!("'{raw}' is not a valid ISO date"))),
            AttrType::LocalDateTime => parse_local_date_time(raw.trim())
                .map(Value::DateTime)
                .ok_or_else(|| EngineError::ValidationError(format!("'{raw}' is not a valid ISO date-time"))),
            AttrType::List(inner) => Ok(Value::List(
                raw.split(',')
                    .map(|part| Value::coerce_str(part.trim(), inner))
                    .collect::<EngineResult<Vec<_>>>()?,
            )),
        }
    }

    /// Coerce `value2` of a `BETWEEN` filter using `value1`'s declared type.
    pub fn coerce_between_second(raw: &str, target: &AttrType) -> EngineResult<Value> {
        Value::coerce_str(raw, target)
    }

    /// Heuristic parse used for undeclared request parameters and
    /// filters against attributes whose type cannot be resolved:
    /// boolean → integer → decimal → ISO date → ISO date-time → string.
    pub fn heuristic_parse(raw: &str) -> Value {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Null;
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "true" => return Value::Boolean(true),
            "false" => return Value::Boolean(false),
            _ => {}
        }
        if let Ok(i) = trimmed.parse::<i32>() {
            return Value::Integer(i);
        }
        if let Ok(l) = trimmed.parse::<i64>() {
            return Value::Long(l);
        }
        if let Ok(d) = BigDecimal::from_str(trimmed) {
            return Value::Decimal(d);
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return Value::Date(date);
        }
        if let Some(dt) = parse_local_date_time(trimmed) {
            return Value::DateTime(dt);
        }
        Value::Text(trimmed.to_string())
    }
}

fn parse_local_date_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[cfg(feature = "sqlite")]
impl rusqlite::types::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, Value as SqlValue};
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
            Value::Text(s) => ToSqlOutput::Owned(SqlValue::Text(s.clone())),
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i as i64)),
            Value::Long(l) => ToSqlOutput::Owned(SqlValue::Integer(*l)),
            // SQLite has no native decimal type; store the exact textual form.
            Value::Decimal(d) => ToSqlOutput::Owned(SqlValue::Text(d.to_string())),
            Value::Boolean(b) => ToSqlOutput::Owned(SqlValue::Integer(*b as i64)),
            Value::Date(d) => ToSqlOutput::Owned(SqlValue::Text(d.format("%Y-%m-%d").to_string())),
            Value::DateTime(dt) => ToSqlOutput::Owned(SqlValue::Text(dt.format("%Y-%m-%dT%H:%M:%S").to_string())),
            Value::List(_) => {
                return Err(rusqlite::Error::ToSqlConversionFailure(
                    "a list value cannot be bound directly; expand it to one bind per element".into(),
                ))
            }
        })
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i32(*i),
            Value::Long(l) => serializer.serialize_i64(*l),
            Value::Decimal(d) => serializer.collect_str(d),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
            Value::DateTime(dt) => serializer.collect_str(&dt.format("%Y-%m-%dT%H:%M:%S")),
            Value::List(items) => items.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_coerces_to_null() {
        assert_eq!(Value::coerce_str("  ", &AttrType::Integer).unwrap(), Value::Null);
    }

    #[test]
    fn coerces_declared_integer() {
        assert_eq!(Value::coerce_str("42", &AttrType::Integer).unwrap(), Value::Integer(42));
    }

    #[test]
    fn rejects_bad_integer() {
        assert!(Value::coerce_str("abc", &AttrType::Integer).is_err());
    }

    #[test]
    fn coerces_iso_date() {
        assert_eq!(
            Value::coerce_str("2024-01-15", &AttrType::LocalDate).unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap())
        );
    }

    #[test]
    fn heuristic_prefers_integer_over_decimal() {
        assert_eq!(Value::heuristic_parse("42"), Value::Integer(42));
    }

    #[test]
    fn heuristic_falls_back_to_string() {
        assert_eq!(Value::heuristic_parse("hello"), Value::Text("hello".to_string()));
    }

    #[test]
    fn heuristic_parses_boolean_before_numeric() {
        assert_eq!(Value::heuristic_parse("true"), Value::Boolean(true));
    }
}
