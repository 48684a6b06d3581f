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

//! Pooled PostgreSQL `Database` adapter, grounded on the teacher's
//! `PostgresConnectionManager` (`postgres::Config` + `r2d2::ManageConnection`).
//! `postgres` only understands positional `$n` binds, so named `:name`
//! placeholders are rewritten to positional form before every call.

use crate::config::EngineConfig;
use crate::database::{BindMap, ColumnMeta, Database, DriverRow};
use crate::errors::EngineResult;
use crate::types::SqlType;
use crate::value::Value;
use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use postgres::types::Type;
use postgres::{Client, NoTls};
use regex::Regex;
use std::str::FromStr;
use std::time::Instant;
use tracing::trace;

#[derive(Debug)]
pub struct PostgresConnectionManager {
    config: postgres::Config,
}

impl PostgresConnectionManager {
    pub fn new(connection_url: &str) -> EngineResult<PostgresConnectionManager> {
        let config = postgres::Config::from_str(connection_url).map_err(crate::errors::EngineError::from)?;
        Ok(PostgresConnectionManager { config })
    }
}

impl r2d2::ManageConnection for PostgresConnectionManager {
    type Connection = Client;
    type Error = postgres::Error;

    fn connect(&self) -> Result<Client, postgres::Error> {
        self.config.connect(NoTls)
    }

    fn is_valid(&self, conn: &mut Client) -> Result<(), postgres::Error> {
        conn.simple_query("SELECT 1").map(|_| ())
    }

    fn has_broken(&self, conn: &mut Client) -> bool {
        conn.is_closed()
    }
}

pub type PostgresPool = r2d2::Pool<PostgresConnectionManager>;

pub struct PostgresDatabase {
    pool: PostgresPool,
}

impl PostgresDatabase {
    pub fn new(config: &EngineConfig) -> EngineResult<PostgresDatabase> {
        let url = config.connection_url().ok_or_else(|| {
            crate::errors::EngineError::DefinitionError("postgres driver requires a connection URL".to_string())
        })?;
        let manager = PostgresConnectionManager::new(url)?;
        let pool = r2d2::Pool::builder()
            .max_size(config.max_size())
            .min_idle(config.min_idle())
            .connection_timeout(config.connection_timeout())
            .build(manager)?;
        Ok(PostgresDatabase { pool })
    }

    pub fn pool(&self) -> &PostgresPool {
        &self.pool
    }
}

static NAMED_BIND: Lazy<Regex> = Lazy::new(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").unwrap());

/// Rewrite every `:name` occurrence into `$n` in first-seen order,
/// returning the rewritten SQL and the ordered bind values to pass
/// positionally. A name referenced more than once reuses its first
/// assigned `$n` slot.
fn rewrite_named_binds<'a>(sql: &str, binds: &'a BindMap) -> EngineResult<(String, Vec<&'a Value>)> {
    let mut ordered: Vec<&str> = Vec::new();
    let rewritten = NAMED_BIND.replace_all(sql, |caps: &regex::Captures| {
        let name = caps.get(1).unwrap().as_str();
        let position = match ordered.iter().position(|n| *n == name) {
            Some(idx) => idx,
            None => {
                ordered.push(name);
                ordered.len() - 1
            }
        };
        format!("${}", position + 1)
    });
    let mut values = Vec::with_capacity(ordered.len());
    for name in &ordered {
        let value = binds.get(*name).ok_or_else(|| {
            crate::errors::EngineError::ExecutionError(format!("no bind value supplied for parameter ':{name}'"))
        })?;
        values.push(value);
    }
    Ok((rewritten.into_owned(), values))
}

fn postgres_sql_type(ty: &Type) -> SqlType {
    match *ty {
        Type::BOOL => SqlType::Bool,
        Type::INT2 => SqlType::Smallint,
        Type::INT4 => SqlType::Int,
        Type::INT8 => SqlType::Bigint,
        Type::FLOAT4 => SqlType::Real,
        Type::FLOAT8 => SqlType::Double,
        Type::NUMERIC => SqlType::Numeric,
        Type::DATE => SqlType::Date,
        Type::TIME => SqlType::Time,
        Type::TIMESTAMP | Type::TIMESTAMPTZ => SqlType::Timestamp,
        Type::JSON | Type::JSONB => SqlType::Json,
        Type::UUID => SqlType::Uuid,
        Type::BYTEA => SqlType::Blob,
        Type::BPCHAR => SqlType::Char,
        Type::VARCHAR => SqlType::Varchar,
        _ => SqlType::Text,
    }
}

fn postgres_value(row: &postgres::Row, idx: usize, sql_type: SqlType) -> Value {
    macro_rules! get_or_null {
        ($t:ty, $wrap:expr) => {
            row.try_get::<_, Option<$t>>(idx).ok().flatten().map($wrap).unwrap_or(Value::Null)
        };
    }
    match sql_type {
        SqlType::Bool => get_or_null!(bool, Value::Boolean),
        SqlType::Tinyint | SqlType::Smallint => get_or_null!(i16, |v| Value::Integer(v as i32)),
        SqlType::Int => get_or_null!(i32, Value::Integer),
        SqlType::Bigint => get_or_null!(i64, Value::Long),
        SqlType::Real | SqlType::Float => get_or_null!(f32, |v: f32| BigDecimal::from_str(&v.to_string())
            .map(Value::Decimal)
            .unwrap_or(Value::Null)),
        SqlType::Double => get_or_null!(f64, |v: f64| BigDecimal::from_str(&v.to_string())
            .map(Value::Decimal)
            .unwrap_or(Value::Null)),
        // postgres has no BigDecimal FromSql impl; read the numeric's
        // text representation and parse it, same as the teacher's adapter.
        SqlType::Numeric => get_or_null!(String, |s: String| BigDecimal::from_str(&s)
            .map(Value::Decimal)
            .unwrap_or(Value::Null)),
        SqlType::Date => get_or_null!(NaiveDate, Value::Date),
        SqlType::Timestamp | SqlType::Time => get_or_null!(NaiveDateTime, Value::DateTime),
        SqlType::Blob => get_or_null!(Vec<u8>, |b: Vec<u8>| Value::Text(String::from_utf8_lossy(&b).into_owned())),
        SqlType::Char | SqlType::Varchar | SqlType::Text | SqlType::Json | SqlType::Uuid => {
            get_or_null!(String, Value::Text)
        }
    }
}

impl Database for PostgresDatabase {
    fn query(&self, sql: &str, binds: &BindMap, _fetch_size: u32) -> EngineResult<Vec<DriverRow>> {
        let started = Instant::now();
        let (rewritten, values) = rewrite_named_binds(sql, binds)?;
        trace!(sql = %rewritten, "preparing");
        let mut conn = self.pool.get()?;
        let params: Vec<&(dyn postgres::types::ToSql + Sync)> =
            values.iter().map(|v| *v as &(dyn postgres::types::ToSql + Sync)).collect();
        let rows = conn.query(rewritten.as_str(), params.as_slice())?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let mut driver_row = DriverRow::default();
            for (idx, column) in row.columns().iter().enumerate() {
                let sql_type = postgres_sql_type(column.type_());
                driver_row.columns.push((column.name().to_ascii_uppercase(), postgres_value(row, idx, sql_type)));
            }
            out.push(driver_row);
        }
        trace!(rows = out.len(), cost_ms = started.elapsed().as_millis(), "query completed");
        Ok(out)
    }

    fn query_count(&self, sql: &str, binds: &BindMap) -> EngineResult<i64> {
        let (rewritten, values) = rewrite_named_binds(sql, binds)?;
        let mut conn = self.pool.get()?;
        let params: Vec<&(dyn postgres::types::ToSql + Sync)> =
            values.iter().map(|v| *v as &(dyn postgres::types::ToSql + Sync)).collect();
        let row = conn.query_one(rewritten.as_str(), params.as_slice())?;
        Ok(row.get::<_, i64>(0))
    }

    fn probe_metadata(&self, sql: &str, dummy_binds: &BindMap) -> EngineResult<Vec<ColumnMeta>> {
        let wrapped = format!("SELECT * FROM ({sql}) probe_subquery WHERE 1=0");
        let (rewritten, values) = rewrite_named_binds(&wrapped, dummy_binds)?;
        let mut conn = self.pool.get()?;
        let params: Vec<&(dyn postgres::types::ToSql + Sync)> =
            values.iter().map(|v| *v as &(dyn postgres::types::ToSql + Sync)).collect();
        let rows = conn.query(rewritten.as_str(), params.as_slice())?;
        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|c| ColumnMeta { name: c.name().to_string(), label: None, sql_type: postgres_sql_type(c.type_()) })
                    .collect()
            })
            .unwrap_or_default();
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    #[test]
    fn rewrites_repeated_named_binds_to_shared_positions() {
        let mut binds: BindMap = IndexMap::new();
        binds.insert("deptId".to_string(), Value::Integer(10));
        let (sql, values) = rewrite_named_binds("WHERE dept = :deptId OR mgr_dept = :deptId", &binds).unwrap();
        assert_eq!(sql, "WHERE dept = $1 OR mgr_dept = $1");
        assert_eq!(values.len(), 1);
    }

    #[test]
    fn rewrites_distinct_named_binds_in_order() {
        let mut binds: BindMap = IndexMap::new();
        binds.insert("a".to_string(), Value::Integer(1));
        binds.insert("b".to_string(), Value::Integer(2));
        let (sql, values) = rewrite_named_binds(":a AND :b", &binds).unwrap();
        assert_eq!(sql, "$1 AND $2");
        assert_eq!(values, vec![&Value::Integer(1), &Value::Integer(2)]);
    }

    #[test]
    fn missing_bind_value_is_an_error() {
        let binds: BindMap = IndexMap::new();
        assert!(rewrite_named_binds(":missing", &binds).is_err());
    }
}
