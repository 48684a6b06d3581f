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

//! The Select/LOV helper: a thin `value`+`label` projection of mapped
//! rows for dropdown-style consumers. No route surface is implemented
//! here; routing is out of scope for this crate.

use crate::row::Row;
use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SelectItem {
    pub value: Value,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additions: Option<IndexMap<String, Value>>,
}

/// `Value::render` quotes text for SQL-log purposes, which is wrong
/// for a display label; unwrap `Text` values directly and fall back to
/// `render` for everything else.
fn label_text(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        other => other.render(),
    }
}

/// Project rows into `{value, label}` pairs. Rows missing either
/// attribute are skipped rather than producing a partial item.
/// Remaining attributes beyond `value_attr`/`label_attr` are carried
/// as `additions`, or omitted entirely when none remain.
pub fn rows_to_select_items(rows: &[Row], value_attr: &str, label_attr: &str) -> Vec<SelectItem> {
    rows.iter()
        .filter_map(|row| {
            let value = row.get(value_attr)?.clone();
            let label = label_text(row.get(label_attr)?);
            let additions: IndexMap<String, Value> = row
                .attributes()
                .filter(|(name, _)| name.as_str() != value_attr && name.as_str() != label_attr)
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect();
            let additions = if additions.is_empty() { None } else { Some(additions) };
            Some(SelectItem { value, label, additions })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, name: &str) -> Row {
        let mut row = Row::new();
        row.set_attribute("empId", Value::Long(id));
        row.set_attribute("fullName", Value::Text(name.to_string()));
        row
    }

    #[test]
    fn projects_value_and_label() {
        let rows = vec![row(1, "Ada")];
        let items = rows_to_select_items(&rows, "empId", "fullName");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].value, Value::Long(1));
        assert_eq!(items[0].label, "Ada");
        assert!(items[0].additions.is_none());
    }

    #[test]
    fn rows_missing_either_attribute_are_skipped() {
        let mut incomplete = Row::new();
        incomplete.set_attribute("empId", Value::Long(2));
        let rows = vec![incomplete];
        let items = rows_to_select_items(&rows, "empId", "fullName");
        assert!(items.is_empty());
    }

    #[test]
    fn remaining_attributes_carried_as_additions() {
        let mut row = row(1, "Ada");
        row.set_attribute("department", Value::Text("Engineering".into()));
        let items = rows_to_select_items(&[row], "empId", "fullName");
        let additions = items[0].additions.as_ref().unwrap();
        assert_eq!(additions.get("department"), Some(&Value::Text("Engineering".into())));
    }
}
