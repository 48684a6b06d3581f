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

//! Pooled `Database` adapters. Each backend is behind its own feature
//! flag; the rest of the engine only ever depends on the `Database`
//! trait in [`crate::database`].

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres-driver")]
pub mod postgres;

use crate::types::SqlType;

/// Heuristic SQL-type guess from a driver-reported declared type name,
/// for backends (SQLite) whose column metadata is a free-form string
/// rather than a fixed catalog type.
pub(crate) fn sql_type_from_decl(decl: Option<&str>) -> SqlType {
    let decl = match decl {
        Some(d) => d.to_ascii_uppercase(),
        None => return SqlType::Text,
    };
    if decl.contains("BOOL") {
        SqlType::Bool
    } else if decl.contains("BIGINT") {
        SqlType::Bigint
    } else if decl.contains("TINYINT") {
        SqlType::Tinyint
    } else if decl.contains("SMALLINT") {
        SqlType::Smallint
    } else if decl.contains("INT") {
        SqlType::Int
    } else if decl.contains("DOUBLE") {
        SqlType::Double
    } else if decl.contains("FLOAT") {
        SqlType::Float
    } else if decl.contains("REAL") {
        SqlType::Real
    } else if decl.contains("NUMERIC") || decl.contains("DECIMAL") {
        SqlType::Numeric
    } else if decl.contains("DATETIME") || decl.contains("TIMESTAMP") {
        SqlType::Timestamp
    } else if decl.contains("DATE") {
        SqlType::Date
    } else if decl.contains("TIME") {
        SqlType::Time
    } else if decl.contains("BLOB") {
        SqlType::Blob
    } else if decl.contains("JSON") {
        SqlType::Json
    } else if decl.contains("UUID") {
        SqlType::Uuid
    } else if decl.contains("CHAR") {
        SqlType::Varchar
    } else {
        SqlType::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_declared_type_defaults_to_text() {
        assert_eq!(sql_type_from_decl(None), SqlType::Text);
    }

    #[test]
    fn recognizes_integer_family() {
        assert_eq!(sql_type_from_decl(Some("BIGINT")), SqlType::Bigint);
        assert_eq!(sql_type_from_decl(Some("INTEGER")), SqlType::Int);
    }
}
