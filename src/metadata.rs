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

//! Ahead-of-time discovery of a query's result-set shape, without
//! executing the query itself. Populated once per definition and then
//! read-only (see [`crate::definition::QueryDefinition::metadata_cache`]).

use crate::database::{ColumnMeta, Database};
use crate::definition::QueryDefinition;
use crate::errors::EngineResult;
use crate::types::{AttrType, SqlType};
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;
use tracing::warn;

/// Per-definition summary of result-set columns and their Rust-side
/// types, built by [`build`] and published once via
/// [`QueryDefinition::set_metadata_cache`].
#[derive(Debug, Clone)]
pub struct MetadataCache {
    /// Upper-cased column name -> 1-based column index.
    pub column_index: HashMap<String, usize>,
    /// 1-based column index -> SQL type as reported by the driver.
    pub sql_type_by_index: HashMap<usize, SqlType>,
    pub column_names: Vec<String>,
    pub column_labels: Vec<String>,
    /// Upper-cased column name -> inferred attribute type.
    pub attr_type_by_column: HashMap<String, AttrType>,
    /// Declared attribute name -> column index.
    pub attribute_to_index: HashMap<String, usize>,
    /// Declared attribute name -> SQL type of its backing column.
    pub attribute_to_sql_type: HashMap<String, SqlType>,
    pub column_count: usize,
    pub initialized: bool,
}

impl MetadataCache {
    fn empty() -> MetadataCache {
        MetadataCache {
            column_index: HashMap::new(),
            sql_type_by_index: HashMap::new(),
            column_names: Vec::new(),
            column_labels: Vec::new(),
            attr_type_by_column: HashMap::new(),
            attribute_to_index: HashMap::new(),
            attribute_to_sql_type: HashMap::new(),
            column_count: 0,
            initialized: false,
        }
    }

    pub fn column_index_of(&self, column: &str) -> Option<usize> {
        self.column_index.get(&column.to_ascii_uppercase()).copied()
    }

    pub fn sql_type_of(&self, column: &str) -> Option<SqlType> {
        self.column_index_of(column).and_then(|idx| self.sql_type_by_index.get(&idx).copied())
    }
}

/// Build dummy bind values for every declared parameter: the default
/// if present, else a type-appropriate zero/empty value.
fn dummy_binds(def: &QueryDefinition) -> IndexMap<String, Value> {
    let mut binds = IndexMap::new();
    for (name, param) in &def.params {
        let value = param.default_value.clone().unwrap_or_else(|| dummy_value(&param.attr_type));
        binds.insert(name.clone(), value);
    }
    binds
}

fn dummy_value(attr_type: &AttrType) -> Value {
    match attr_type {
        AttrType::String => Value::Text(String::new()),
        AttrType::Integer => Value::Integer(0),
        AttrType::Long => Value::Long(0),
        AttrType::Decimal => Value::Decimal(Default::default()),
        AttrType::Boolean => Value::Boolean(false),
        AttrType::LocalDate => Value::Date(chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()),
        AttrType::LocalDateTime => {
            Value::DateTime(chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap())
        }
        AttrType::List(inner) => Value::List(vec![dummy_value(inner)]),
    }
}

/// Discover column metadata for `def` without running its full SQL.
/// Strategy: ask the driver to probe; the driver itself decides
/// whether it can do so without execution or must fall back to
/// `WHERE 1=0` (see `Database::probe_metadata`).
pub fn build(def: &QueryDefinition, database: &dyn Database) -> EngineResult<MetadataCache> {
    let binds = dummy_binds(def);
    let columns: Vec<ColumnMeta> = database.probe_metadata(&def.sql, &binds)?;

    let mut cache = MetadataCache::empty();
    cache.column_count = columns.len();
    for (idx, col) in columns.iter().enumerate() {
        let index = idx + 1;
        let upper = col.name.to_ascii_uppercase();
        cache.column_index.insert(upper.clone(), index);
        cache.sql_type_by_index.insert(index, col.sql_type);
        cache.column_names.push(col.name.clone());
        cache.column_labels.push(col.label.clone().unwrap_or_else(|| col.name.clone()));
        cache.attr_type_by_column.insert(upper, col.sql_type.default_attr_type());
    }

    for (name, attr) in &def.attributes {
        if attr.is_virtual {
            continue;
        }
        let lookup_key = if cache.column_index.contains_key(&attr.alias_name) {
            Some(attr.alias_name.clone())
        } else {
            let upper_name = attr.name.to_ascii_uppercase();
            cache.column_index.contains_key(&upper_name).then_some(upper_name)
        };
        match lookup_key {
            Some(key) => {
                let index = cache.column_index[&key];
                cache.attribute_to_index.insert(name.clone(), index);
                if let Some(sql_type) = cache.sql_type_by_index.get(&index) {
                    cache.attribute_to_sql_type.insert(name.clone(), *sql_type);
                }
            }
            None => {
                warn!(
                    query = %def.name,
                    attribute = %name,
                    alias = %attr.alias_name,
                    "no result-set column found for non-virtual attribute"
                );
            }
        }
    }

    cache.initialized = true;
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::AttributeDef;

    #[test]
    fn dummy_value_for_integer_is_zero() {
        assert_eq!(dummy_value(&AttrType::Integer), Value::Integer(0));
    }

    #[test]
    fn empty_cache_reports_uninitialized() {
        let cache = MetadataCache::empty();
        assert!(!cache.initialized);
        assert_eq!(cache.column_count, 0);
    }

    #[test]
    fn attribute_def_alias_is_used_for_lookup_key() {
        let attr = AttributeDef::new("empId", AttrType::Long).alias("EMP_ID");
        assert_eq!(attr.alias_name, "EMP_ID");
    }
}
