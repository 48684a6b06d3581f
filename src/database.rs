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

//! The read-only database boundary. Narrowed from the teacher's
//! `Database` trait (`start_transaction`/`execute_result`/...) to the
//! three operations this engine ever needs: a row fetch, a scalar
//! count, and a metadata probe.

use crate::errors::EngineResult;
use crate::types::SqlType;
use crate::value::Value;
use indexmap::IndexMap;

/// One driver-reported column in a result set, as discovered by
/// [`Database::probe_metadata`] or alongside a row fetch.
#[derive(Debug, Clone)]
pub struct ColumnMeta {
    pub name: String,
    pub label: Option<String>,
    pub sql_type: SqlType,
}

/// A single fetched row: upper-cased column name -> value, in
/// driver-reported column order.
#[derive(Debug, Clone, Default)]
pub struct DriverRow {
    pub columns: Vec<(String, Value)>,
}

impl DriverRow {
    pub fn get(&self, column: &str) -> Option<&Value> {
        let upper = column.to_ascii_uppercase();
        self.columns.iter().find(|(name, _)| *name == upper).map(|(_, v)| v)
    }
}

pub type BindMap = IndexMap<String, Value>;

/// The only collaborator the execution pipeline needs to talk to a
/// relational database. Object-safe, `Send + Sync`, so a single
/// `Arc<dyn Database>` can be shared across request tasks.
pub trait Database: Send + Sync {
    /// Run `sql` with `binds`, honoring `fetch_size` as a driver hint
    /// where supported, and return every fetched row.
    fn query(&self, sql: &str, binds: &BindMap, fetch_size: u32) -> EngineResult<Vec<DriverRow>>;

    /// Run a `SELECT COUNT(*) ...` query and return the scalar.
    fn query_count(&self, sql: &str, binds: &BindMap) -> EngineResult<i64>;

    /// Discover result-set column metadata for `sql` without running
    /// it to completion. Implementations that cannot avoid execution
    /// must fall back to a zero-row probe (`WHERE 1=0`), per
    /// `dummy_binds`-style placeholder values supplied by the caller.
    fn probe_metadata(&self, sql: &str, dummy_binds: &BindMap) -> EngineResult<Vec<ColumnMeta>>;
}
