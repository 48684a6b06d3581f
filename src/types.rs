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

//! Declared types, on both sides of the driver boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The SQL-side type of a result-set column, as reported by a driver's
/// result metadata (or inferred from a metadata probe).
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum SqlType {
    Bool,
    Tinyint,
    Smallint,
    Int,
    Bigint,
    Real,
    Float,
    Double,
    Numeric,
    Char,
    Varchar,
    Text,
    Json,
    Uuid,
    Date,
    Timestamp,
    Time,
    Blob,
}

impl SqlType {
    pub fn is_integer_type(&self) -> bool {
        matches!(
            self,
            SqlType::Tinyint | SqlType::Smallint | SqlType::Int | SqlType::Bigint
        )
    }

    pub fn is_decimal_type(&self) -> bool {
        matches!(self, SqlType::Real | SqlType::Float | SqlType::Double | SqlType::Numeric)
    }

    pub fn is_text_type(&self) -> bool {
        matches!(self, SqlType::Char | SqlType::Varchar | SqlType::Text | SqlType::Json | SqlType::Uuid)
    }

    /// Derive the declared attribute type a definition should use for a
    /// dynamically discovered column of this SQL type.
    pub fn default_attr_type(&self) -> AttrType {
        match self {
            SqlType::Bool => AttrType::Boolean,
            SqlType::Tinyint | SqlType::Smallint | SqlType::Int => AttrType::Integer,
            SqlType::Bigint => AttrType::Long,
            SqlType::Real | SqlType::Float | SqlType::Double | SqlType::Numeric => AttrType::Decimal,
            SqlType::Char | SqlType::Varchar | SqlType::Text | SqlType::Json | SqlType::Uuid => {
                AttrType::String
            }
            SqlType::Date => AttrType::LocalDate,
            SqlType::Timestamp | SqlType::Time => AttrType::LocalDateTime,
            SqlType::Blob => AttrType::String,
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// The declared, attribute/parameter-side type of a value.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum AttrType {
    String,
    Integer,
    Long,
    Decimal,
    Boolean,
    LocalDate,
    LocalDateTime,
    List(Box<AttrType>),
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrType::String => write!(f, "string"),
            AttrType::Integer => write!(f, "integer"),
            AttrType::Long => write!(f, "long"),
            AttrType::Decimal => write!(f, "decimal"),
            AttrType::Boolean => write!(f, "boolean"),
            AttrType::LocalDate => write!(f, "local-date"),
            AttrType::LocalDateTime => write!(f, "local-date-time"),
            AttrType::List(inner) => write!(f, "list<{inner}>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_maps_to_decimal() {
        assert_eq!(SqlType::Numeric.default_attr_type(), AttrType::Decimal);
    }

    #[test]
    fn timestamp_maps_to_local_date_time() {
        assert_eq!(SqlType::Timestamp.default_attr_type(), AttrType::LocalDateTime);
    }

    #[test]
    fn varchar_maps_to_string() {
        assert_eq!(SqlType::Varchar.default_attr_type(), AttrType::String);
    }
}
