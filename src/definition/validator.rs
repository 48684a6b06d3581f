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

//! Structural validation, run at build time and again at registration.

use super::QueryDefinition;
use crate::errors::{EngineError, EngineResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static BIND_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r":([A-Za-z_][A-Za-z0-9_]*)").unwrap());

const SYSTEM_PAGINATION_NAMES: &[&str] = &["offset", "limit", "startRow", "endRow", "_start", "_end"];

/// Scan `sql` for `:name` bind placeholders outside string literals
/// and line comments.
pub fn extract_bind_params(sql: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut seen = HashSet::new();
    for line in sql.lines() {
        let code = match line.find("--") {
            Some(idx) => &line[..idx],
            None => line,
        };
        let mut in_string = false;
        let mut buf = String::new();
        for ch in code.chars() {
            if ch == '\'' {
                in_string = !in_string;
            }
            if !in_string {
                buf.push(ch);
            } else {
                buf.push(' ');
            }
        }
        for cap in BIND_PARAM.captures_iter(&buf) {
            let name = cap[1].to_string();
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }
    }
    names
}

static TRAILING_INDEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+)_\d+$").unwrap());

fn is_filter_generated(name: &str, def: &QueryDefinition) -> bool {
    const SUFFIXES: &[&str] = &[
        "_ne", "_gt", "_gte", "_lt", "_lte", "_like", "_notlike", "_in", "_notin", "_between",
        "_contains", "_startswith", "_endswith",
    ];
    if def.attributes.contains_key(name) {
        return true;
    }
    for suffix in SUFFIXES {
        if let Some(attr) = name.strip_suffix(suffix) {
            if def.attributes.contains_key(attr) {
                return true;
            }
        }
    }
    // `attrName_1`, `attrName_2`, ... `attrName_i`: BETWEEN's two bounds
    // and IN/NOT_IN's per-value placeholders, per the assembler's
    // bind-naming convention.
    if let Some(caps) = TRAILING_INDEX.captures(name) {
        if def.attributes.contains_key(&caps[1]) {
            return true;
        }
    }
    false
}

/// Validate a fully-built definition: duplicate namespaces (already
/// enforced by the builder, re-checked here for definitions built by
/// hand), virtual-attribute invariants, and bind-parameter closure.
pub fn validate(def: &QueryDefinition) -> EngineResult<()> {
    for (name, attr) in &def.attributes {
        if attr.is_virtual && attr.calculator.is_none() {
            return Err(EngineError::DefinitionError(format!(
                "virtual attribute '{name}' has no calculator"
            )));
        }
        if attr.is_virtual && attr.filterable {
            return Err(EngineError::DefinitionError(format!(
                "virtual attribute '{name}' cannot be filterable"
            )));
        }
        if attr.is_virtual && attr.sortable && attr.sort_property.is_none() {
            return Err(EngineError::DefinitionError(format!(
                "virtual attribute '{name}' is sortable but has no sortProperty"
            )));
        }
        if def.params.contains_key(name) || def.criteria.contains_key(name) {
            return Err(EngineError::DefinitionError(format!(
                "'{name}' is declared as both an attribute and a parameter/criterion"
            )));
        }
    }
    for name in def.params.keys() {
        if def.criteria.contains_key(name) {
            return Err(EngineError::DefinitionError(format!(
                "'{name}' is declared as both a parameter and a criterion"
            )));
        }
    }

    let mut referenced = extract_bind_params(&def.sql);
    for criterion in def.criteria.values() {
        referenced.extend(extract_bind_params(&criterion.sql));
    }
    referenced.sort();
    referenced.dedup();

    for name in &referenced {
        let declared = def.params.contains_key(name);
        let system = SYSTEM_PAGINATION_NAMES.contains(&name.as_str());
        let filter_generated = is_filter_generated(name, def);
        if !declared && !system && !filter_generated {
            return Err(EngineError::DefinitionError(format!(
                "query '{}' references undeclared bind parameter ':{name}'",
                def.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::AttributeDef;
    use crate::types::AttrType;

    #[test]
    fn extracts_bind_params_ignoring_line_comments() {
        let sql = "SELECT * FROM emp WHERE 1=1 --deptCriterion\nAND id = :id";
        let params = extract_bind_params(sql);
        assert_eq!(params, vec!["id".to_string()]);
    }

    #[test]
    fn extracts_bind_params_ignoring_string_literals() {
        let sql = "SELECT * FROM emp WHERE note = ':notAParam' AND id = :id";
        let params = extract_bind_params(sql);
        assert_eq!(params, vec!["id".to_string()]);
    }

    #[test]
    fn rejects_undeclared_bind_parameter() {
        let def = QueryDefinition::builder("bad")
            .sql("SELECT * FROM emp WHERE id = :id")
            .build();
        assert!(def.is_err());
    }

    #[test]
    fn accepts_filter_generated_bind_parameter() {
        let def = QueryDefinition::builder("emps")
            .sql("SELECT emp_id, salary FROM emp WHERE 1=1 --salaryFilter")
            .attribute(AttributeDef::new("salary", AttrType::Decimal))
            .criteria(crate::definition::CriteriaDef::new("salaryFilter", "AND salary >= :salary_gte"))
            .build();
        assert!(def.is_ok(), "{def:?}");
    }

    #[test]
    fn accepts_system_pagination_names() {
        let def = QueryDefinition::builder("paged")
            .sql("SELECT id FROM emp WHERE 1=1 OFFSET :offset ROWS FETCH NEXT :limit ROWS ONLY")
            .attribute(AttributeDef::new("id", AttrType::Long))
            .build();
        assert!(def.is_ok(), "{def:?}");
    }
}
