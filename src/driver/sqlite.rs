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

//! Pooled SQLite `Database` adapter, grounded on the teacher's
//! `SqliteConnectionManager` (file-vs-memory source, `r2d2::ManageConnection`).

use crate::config::EngineConfig;
use crate::database::{BindMap, ColumnMeta, Database, DriverRow};
use crate::driver::sql_type_from_decl;
use crate::errors::EngineResult;
use crate::types::SqlType;
use crate::value::Value;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;
use tracing::trace;

#[derive(Debug)]
enum Source {
    File(PathBuf),
    Memory,
}

/// `r2d2::ManageConnection` for `rusqlite`, file-or-memory.
#[derive(Debug)]
pub struct SqliteConnectionManager {
    source: Source,
    flags: OpenFlags,
}

impl SqliteConnectionManager {
    pub fn file(path: impl Into<PathBuf>) -> SqliteConnectionManager {
        SqliteConnectionManager { source: Source::File(path.into()), flags: OpenFlags::default() }
    }

    pub fn memory() -> SqliteConnectionManager {
        SqliteConnectionManager { source: Source::Memory, flags: OpenFlags::default() }
    }
}

impl r2d2::ManageConnection for SqliteConnectionManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    fn connect(&self) -> Result<Connection, rusqlite::Error> {
        match &self.source {
            Source::File(path) => Connection::open_with_flags(path, self.flags),
            Source::Memory => Connection::open_in_memory_with_flags(self.flags),
        }
    }

    fn is_valid(&self, conn: &mut Connection) -> Result<(), rusqlite::Error> {
        conn.execute_batch("SELECT 1")
    }

    fn has_broken(&self, conn: &mut Connection) -> bool {
        self.is_valid(conn).is_err()
    }
}

pub type SqlitePool = r2d2::Pool<SqliteConnectionManager>;

/// Parse a `sqlite:` connection URL (or a bare path, or `:memory:`)
/// into the source `rusqlite::Connection::open` expects.
fn parse_connection_url(url: &str) -> SqliteConnectionManager {
    let trimmed = url.trim();
    if trimmed == ":memory:" || trimmed == "sqlite::memory:" {
        return SqliteConnectionManager::memory();
    }
    let path = trimmed.strip_prefix("sqlite://").or_else(|| trimmed.strip_prefix("sqlite:")).unwrap_or(trimmed);
    SqliteConnectionManager::file(path)
}

pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    pub fn new(config: &EngineConfig) -> EngineResult<SqliteDatabase> {
        let url = config.connection_url().unwrap_or(":memory:");
        let manager = parse_connection_url(url);
        let pool = r2d2::Pool::builder()
            .max_size(config.max_size())
            .min_idle(config.min_idle())
            .connection_timeout(config.connection_timeout())
            .build(manager)?;
        Ok(SqliteDatabase { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Build `(":name", &dyn ToSql)` pairs for a named-parameter bind map;
/// `rusqlite` recognizes `:name` placeholders directly.
fn bind_names(binds: &BindMap) -> Vec<String> {
    binds.keys().map(|name| format!(":{name}")).collect()
}

fn sqlite_value(value_ref: ValueRef<'_>, sql_type: SqlType) -> Value {
    if matches!(value_ref, ValueRef::Null) {
        return Value::Null;
    }
    match sql_type {
        SqlType::Bool => Value::Boolean(value_ref.as_i64().map(|i| i != 0).unwrap_or(false)),
        SqlType::Tinyint | SqlType::Smallint | SqlType::Int => {
            Value::Integer(value_ref.as_i64().unwrap_or_default() as i32)
        }
        SqlType::Bigint => Value::Long(value_ref.as_i64().unwrap_or_default()),
        SqlType::Real | SqlType::Float | SqlType::Double => value_ref
            .as_f64()
            .ok()
            .and_then(|f| BigDecimal::from_str(&f.to_string()).ok())
            .map(Value::Decimal)
            .unwrap_or(Value::Null),
        SqlType::Numeric => match value_ref {
            ValueRef::Text(t) => std::str::from_utf8(t)
                .ok()
                .and_then(|s| BigDecimal::from_str(s).ok())
                .map(Value::Decimal)
                .unwrap_or(Value::Null),
            ValueRef::Integer(i) => Value::Decimal(BigDecimal::from(i)),
            ValueRef::Real(f) => BigDecimal::from_str(&f.to_string()).map(Value::Decimal).unwrap_or(Value::Null),
            _ => Value::Null,
        },
        SqlType::Date => match value_ref {
            ValueRef::Text(t) => std::str::from_utf8(t)
                .ok()
                .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
                .map(Value::Date)
                .unwrap_or(Value::Null),
            _ => Value::Null,
        },
        SqlType::Timestamp | SqlType::Time => match value_ref {
            ValueRef::Text(t) => std::str::from_utf8(t)
                .ok()
                .and_then(|s| {
                    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
                        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
                        .ok()
                })
                .map(Value::DateTime)
                .unwrap_or(Value::Null),
            _ => Value::Null,
        },
        SqlType::Blob => match value_ref {
            ValueRef::Blob(b) => Value::Text(String::from_utf8_lossy(b).into_owned()),
            _ => Value::Null,
        },
        SqlType::Char | SqlType::Varchar | SqlType::Text | SqlType::Json | SqlType::Uuid => match value_ref {
            ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Integer(i) => Value::Text(i.to_string()),
            ValueRef::Real(f) => Value::Text(f.to_string()),
            _ => Value::Null,
        },
    }
}

impl Database for SqliteDatabase {
    fn query(&self, sql: &str, binds: &BindMap, _fetch_size: u32) -> EngineResult<Vec<DriverRow>> {
        let started = Instant::now();
        trace!(%sql, "preparing");
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<(String, SqlType)> = stmt
            .columns()
            .iter()
            .map(|c| (c.name().to_ascii_uppercase(), sql_type_from_decl(c.decl_type())))
            .collect();

        let names = bind_names(binds);
        let bind_refs: Vec<(&str, &dyn rusqlite::types::ToSql)> =
            names.iter().zip(binds.values()).map(|(n, v)| (n.as_str(), v as &dyn rusqlite::types::ToSql)).collect();

        let mut rows = Vec::new();
        let mut mapped = stmt.query(bind_refs.as_slice())?;
        while let Some(row) = mapped.next()? {
            let mut driver_row = DriverRow::default();
            for (idx, (name, sql_type)) in columns.iter().enumerate() {
                let value_ref = row.get_ref(idx)?;
                driver_row.columns.push((name.clone(), sqlite_value(value_ref, *sql_type)));
            }
            rows.push(driver_row);
        }
        trace!(rows = rows.len(), cost_ms = started.elapsed().as_millis(), "query completed");
        Ok(rows)
    }

    fn query_count(&self, sql: &str, binds: &BindMap) -> EngineResult<i64> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(sql)?;
        let names = bind_names(binds);
        let bind_refs: Vec<(&str, &dyn rusqlite::types::ToSql)> =
            names.iter().zip(binds.values()).map(|(n, v)| (n.as_str(), v as &dyn rusqlite::types::ToSql)).collect();
        let count: i64 = stmt.query_row(bind_refs.as_slice(), |row| row.get(0))?;
        Ok(count)
    }

    fn probe_metadata(&self, sql: &str, dummy_binds: &BindMap) -> EngineResult<Vec<ColumnMeta>> {
        let wrapped = format!("SELECT * FROM ({sql}) probe_subquery WHERE 1=0");
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&wrapped)?;
        let names = bind_names(dummy_binds);
        let bind_refs: Vec<(&str, &dyn rusqlite::types::ToSql)> = names
            .iter()
            .zip(dummy_binds.values())
            .map(|(n, v)| (n.as_str(), v as &dyn rusqlite::types::ToSql))
            .collect();
        let _ = stmt.query(bind_refs.as_slice())?;
        Ok(stmt
            .columns()
            .iter()
            .map(|c| ColumnMeta {
                name: c.name().to_string(),
                label: None,
                sql_type: sql_type_from_decl(c.decl_type()),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_url_is_recognized() {
        let manager = parse_connection_url("sqlite::memory:");
        assert!(matches!(manager.source, Source::Memory));
    }

    #[test]
    fn file_url_strips_scheme() {
        let manager = parse_connection_url("sqlite:///tmp/app.db");
        match manager.source {
            Source::File(path) => assert_eq!(path, PathBuf::from("/tmp/app.db")),
            _ => panic!("expected file source"),
        }
    }

    #[test]
    fn query_roundtrips_through_pool() {
        let config = EngineConfig::default().set_connection_url(":memory:");
        let database = SqliteDatabase::new(&config).unwrap();
        {
            let conn = database.pool().get().unwrap();
            conn.execute_batch("CREATE TABLE emp (emp_id INTEGER, name TEXT)").unwrap();
            conn.execute("INSERT INTO emp (emp_id, name) VALUES (1, 'Ada')", ()).unwrap();
        }
        let binds = BindMap::new();
        let rows = database.query("SELECT emp_id, name FROM emp", &binds, 100).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("EMP_ID"), Some(&Value::Long(1)));
    }
}
