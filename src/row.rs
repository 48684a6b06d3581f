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

//! The output row: an insertion-ordered attribute map, backed by a
//! raw uppercase column map available to calculators.

use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize)]
pub struct Row {
    attributes: IndexMap<String, Value>,
    #[serde(skip)]
    raw: HashMap<String, Value>,
}

impl Row {
    pub fn new() -> Row {
        Row { attributes: IndexMap::new(), raw: HashMap::new() }
    }

    /// Insert a raw column value keyed by its upper-cased column name.
    pub fn put_raw(&mut self, column: impl Into<String>, value: Value) {
        self.raw.insert(column.into().to_ascii_uppercase(), value);
    }

    /// Look up a raw column by name, case-insensitively.
    pub fn get_raw(&self, column: &str) -> Option<&Value> {
        self.raw.get(&column.to_ascii_uppercase())
    }

    pub fn raw_columns(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.raw.iter()
    }

    /// Project a raw column into the public attribute map.
    pub fn set_attribute(&mut self, attribute: impl Into<String>, value: Value) {
        self.attributes.insert(attribute.into(), value);
    }

    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attributes.iter()
    }

    pub fn into_attributes(self) -> IndexMap<String, Value> {
        self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_lookup_is_case_insensitive() {
        let mut row = Row::new();
        row.put_raw("Emp_Id", Value::Long(7));
        assert_eq!(row.get_raw("EMP_ID"), Some(&Value::Long(7)));
        assert_eq!(row.get_raw("emp_id"), Some(&Value::Long(7)));
    }

    #[test]
    fn attribute_projection_preserves_insertion_order() {
        let mut row = Row::new();
        row.set_attribute("id", Value::Long(1));
        row.set_attribute("name", Value::Text("Ada".into()));
        let keys: Vec<&String> = row.attributes().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["id", "name"]);
    }
}
