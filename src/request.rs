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

//! Transport-agnostic HTTP request grammar: maps a generic URL
//! parameter multimap (or a typed POST body) into a [`QueryRequest`].
//! This module never binds a socket or depends on a web framework —
//! callers supply the already-decoded parameter map.

use crate::config::EngineConfig;
use crate::definition::{AttributeDef, QueryDefinition};
use crate::errors::{EngineError, EngineResult};
use crate::filter::{Filter, FilterArg, FilterOp};
use crate::pagination::Pagination;
use crate::sort::SortSpec;
use crate::value::Value;
use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashMap;

/// A decoded URL parameter multimap, as a request provider would hand
/// it over (one key may repeat, e.g. `filter.status=a&filter.status=b`).
pub type RawParams = IndexMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetaVerbosity {
    Full,
    Minimal,
    #[default]
    None,
}

impl MetaVerbosity {
    fn parse(raw: &str) -> MetaVerbosity {
        match raw.to_ascii_lowercase().as_str() {
            "full" => MetaVerbosity::Full,
            "minimal" => MetaVerbosity::Minimal,
            _ => MetaVerbosity::None,
        }
    }
}

/// A fully typed, validated request intent: ready for
/// `QueryExecutor::execute`.
#[derive(Debug, Clone)]
pub struct QueryRequest {
    pub query_name: String,
    pub params: IndexMap<String, Value>,
    pub filters: Vec<Filter>,
    pub sorts: Vec<SortSpec>,
    pub pagination: Option<Pagination>,
    pub selected_fields: Option<Vec<String>>,
    pub meta: MetaVerbosity,
}

impl QueryRequest {
    /// Parse the `GET /api/query/{name}` URL grammar (§4.6) against
    /// `def`'s declared attributes/parameters.
    pub fn from_query_params(
        query_name: impl Into<String>,
        def: &QueryDefinition,
        raw: &RawParams,
        config: &EngineConfig,
    ) -> EngineResult<QueryRequest> {
        Ok(QueryRequest {
            query_name: query_name.into(),
            params: parse_named_params(def, raw)?,
            filters: parse_filters(def, raw)?,
            sorts: parse_sorts(def, raw)?,
            pagination: parse_pagination(raw, config)?,
            selected_fields: parse_select(raw),
            meta: parse_meta(raw),
        })
    }

    /// Parse a `POST /api/query/{name}` body: `{params, filters, sorts,
    /// start, end, includeMetadata}`, with the same semantics as the
    /// GET grammar applied to already-structured JSON.
    pub fn from_body(
        query_name: impl Into<String>,
        def: &QueryDefinition,
        body: &RequestBody,
    ) -> EngineResult<QueryRequest> {
        let mut params = IndexMap::new();
        for (name, value) in &body.params {
            let Some(param) = def.param(name) else { continue };
            let Some(raw) = json_scalar_to_string(value) else { continue };
            if raw.trim().is_empty() {
                continue;
            }
            params.insert(name.clone(), Value::coerce_str(&raw, &param.attr_type)?);
        }

        let mut filters = Vec::with_capacity(body.filters.len());
        for f in &body.filters {
            let attr = filterable_attr(def, &f.attribute)?;
            let op = FilterOp::from_shortcut(&f.operator)
                .ok_or_else(|| EngineError::ValidationError(format!("unknown filter operator '{}'", f.operator)))?;
            let arg = match op {
                FilterOp::In | FilterOp::NotIn => {
                    let values = f.values.clone().unwrap_or_default();
                    let coerced = values
                        .iter()
                        .filter_map(json_scalar_to_string)
                        .map(|s| Value::coerce_str(&s, &attr.attr_type))
                        .collect::<EngineResult<Vec<_>>>()?;
                    FilterArg::Many(coerced)
                }
                FilterOp::IsNull | FilterOp::IsNotNull => FilterArg::None,
                FilterOp::Between => {
                    let v1 = f
                        .value
                        .as_ref()
                        .and_then(json_scalar_to_string)
                        .ok_or_else(|| EngineError::ValidationError(format!("filter on '{}' missing value", f.attribute)))?;
                    let v2 = f
                        .value2
                        .as_ref()
                        .and_then(json_scalar_to_string)
                        .ok_or_else(|| EngineError::ValidationError(format!("filter on '{}' missing value2", f.attribute)))?;
                    FilterArg::Two(
                        Value::coerce_str(&v1, &attr.attr_type)?,
                        Value::coerce_between_second(&v2, &attr.attr_type)?,
                    )
                }
                _ => {
                    let raw = f
                        .value
                        .as_ref()
                        .and_then(json_scalar_to_string)
                        .ok_or_else(|| EngineError::ValidationError(format!("filter on '{}' missing value", f.attribute)))?;
                    FilterArg::One(Value::coerce_str(&raw, &attr.attr_type)?)
                }
            };
            filters.push(Filter::new(f.attribute.clone(), op, arg)?);
        }

        let mut sorts = Vec::with_capacity(body.sorts.len());
        for token in &body.sorts {
            let spec = SortSpec::parse_token(token);
            let attr = def
                .attribute(&spec.attribute)
                .ok_or_else(|| EngineError::ValidationError(format!("unknown sort attribute '{}'", spec.attribute)))?;
            if !attr.sortable {
                return Err(EngineError::ValidationError(format!("attribute '{}' is not sortable", spec.attribute)));
            }
            sorts.push(spec);
        }

        let pagination = match (body.start, body.end) {
            (Some(start), Some(end)) => Some(Pagination::new(start, end)),
            _ => None,
        };

        Ok(QueryRequest {
            query_name: query_name.into(),
            params,
            filters,
            sorts,
            pagination,
            selected_fields: body.select.clone(),
            meta: if body.include_metadata { MetaVerbosity::Full } else { MetaVerbosity::None },
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    #[serde(default)]
    pub params: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub filters: Vec<FilterBody>,
    #[serde(default)]
    pub sorts: Vec<String>,
    pub start: Option<i64>,
    pub end: Option<i64>,
    #[serde(default, rename = "includeMetadata")]
    pub include_metadata: bool,
    #[serde(default)]
    pub select: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FilterBody {
    pub attribute: String,
    pub operator: String,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub value2: Option<serde_json::Value>,
    #[serde(default)]
    pub values: Option<Vec<serde_json::Value>>,
}

fn json_scalar_to_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(b.to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            Some(items.iter().filter_map(json_scalar_to_string).collect::<Vec<_>>().join(","))
        }
        serde_json::Value::Object(_) => None,
    }
}

fn filterable_attr<'a>(def: &'a QueryDefinition, name: &str) -> EngineResult<&'a AttributeDef> {
    let attr = def
        .attribute(name)
        .ok_or_else(|| EngineError::ValidationError(format!("unknown filter attribute '{name}'")))?;
    if attr.is_virtual || !attr.filterable {
        return Err(EngineError::ValidationError(format!("attribute '{name}' is not filterable")));
    }
    Ok(attr)
}

fn parse_meta(raw: &RawParams) -> MetaVerbosity {
    raw.get("_meta").and_then(|v| v.first()).map(|s| MetaVerbosity::parse(s)).unwrap_or_default()
}

fn parse_select(raw: &RawParams) -> Option<Vec<String>> {
    let value = raw.get("_select")?.first()?;
    let fields: Vec<String> = value.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
    if fields.is_empty() {
        None
    } else {
        Some(fields)
    }
}

fn parse_pagination(raw: &RawParams, config: &EngineConfig) -> EngineResult<Option<Pagination>> {
    let start = raw
        .get("_start")
        .and_then(|v| v.first())
        .map(|s| s.trim().parse::<i64>())
        .transpose()
        .map_err(|_| EngineError::ValidationError("'_start' is not a valid integer".to_string()))?;
    let end = raw
        .get("_end")
        .and_then(|v| v.first())
        .map(|s| s.trim().parse::<i64>())
        .transpose()
        .map_err(|_| EngineError::ValidationError("'_end' is not a valid integer".to_string()))?;

    let default_size = config.rest_default_page_size() as i64;
    let max_size = config.rest_max_page_size() as i64;

    let pagination = match (start, end) {
        (Some(start), Some(end)) => Pagination::new(start, (end).min(start + max_size)),
        (Some(start), None) => Pagination::new(start, start + default_size),
        (None, Some(end)) => Pagination::new((end - default_size).max(0), end),
        (None, None) => return Ok(None),
    };
    Ok(Some(pagination))
}

fn parse_sorts(def: &QueryDefinition, raw: &RawParams) -> EngineResult<Vec<SortSpec>> {
    let Some(values) = raw.get("sort") else { return Ok(Vec::new()) };
    let joined = values.join(",");
    let mut specs = Vec::new();
    for token in joined.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let spec = SortSpec::parse_token(token);
        let attr = def
            .attribute(&spec.attribute)
            .ok_or_else(|| EngineError::ValidationError(format!("unknown sort attribute '{}'", spec.attribute)))?;
        if !attr.sortable {
            return Err(EngineError::ValidationError(format!("attribute '{}' is not sortable", spec.attribute)));
        }
        specs.push(spec);
    }
    Ok(specs)
}

fn parse_named_params(def: &QueryDefinition, raw: &RawParams) -> EngineResult<IndexMap<String, Value>> {
    let mut out = IndexMap::new();
    for (name, param) in &def.params {
        let Some(values) = raw.get(name) else { continue };
        let joined = values.join(",");
        if joined.trim().is_empty() {
            continue;
        }
        out.insert(name.clone(), Value::coerce_str(&joined, &param.attr_type)?);
    }
    Ok(out)
}

/// `filter.<attr>=v[,v]` (simple), `filter.<attr>.<op>=v` (operator
/// shortcut), and the two-key `filter.<attr>.op=between` +
/// `filter.<attr>.value`/`value2` form.
fn parse_filters(def: &QueryDefinition, raw: &RawParams) -> EngineResult<Vec<Filter>> {
    let mut simple: IndexMap<String, Vec<String>> = IndexMap::new();
    let mut shortcut: IndexMap<String, (String, Vec<String>)> = IndexMap::new();
    let mut between_op: HashMap<String, String> = HashMap::new();
    let mut between_value: HashMap<String, String> = HashMap::new();
    let mut between_value2: HashMap<String, String> = HashMap::new();

    for (key, values) in raw {
        let Some(rest) = key.strip_prefix("filter.") else { continue };
        match rest.split_once('.') {
            None => {
                simple.insert(rest.to_string(), values.clone());
            }
            Some((attr, "op")) => {
                if let Some(v) = values.first() {
                    between_op.insert(attr.to_string(), v.clone());
                }
            }
            Some((attr, "value")) => {
                if let Some(v) = values.first() {
                    between_value.insert(attr.to_string(), v.clone());
                }
            }
            Some((attr, "value2")) => {
                if let Some(v) = values.first() {
                    between_value2.insert(attr.to_string(), v.clone());
                }
            }
            Some((attr, op)) => {
                shortcut.insert(attr.to_string(), (op.to_string(), values.clone()));
            }
        }
    }

    let mut filters = Vec::new();

    for (attr_name, values) in simple {
        let attr = filterable_attr(def, &attr_name)?;
        let values: Vec<String> = values.into_iter().filter(|v| !v.trim().is_empty()).collect();
        if values.is_empty() {
            continue;
        }
        if values.len() == 1 {
            let value = Value::coerce_str(&values[0], &attr.attr_type)?;
            filters.push(Filter::new(attr_name, FilterOp::Equals, FilterArg::One(value))?);
        } else {
            let coerced = values
                .iter()
                .map(|v| Value::coerce_str(v, &attr.attr_type))
                .collect::<EngineResult<Vec<_>>>()?;
            filters.push(Filter::new(attr_name, FilterOp::In, FilterArg::Many(coerced))?);
        }
    }

    for (attr_name, op_value) in between_op {
        if !op_value.eq_ignore_ascii_case("between") {
            return Err(EngineError::ValidationError(format!("unknown filter operator '{op_value}'")));
        }
        let attr = filterable_attr(def, &attr_name)?;
        let v1 = between_value
            .get(&attr_name)
            .ok_or_else(|| EngineError::ValidationError(format!("BETWEEN filter on '{attr_name}' missing value")))?;
        let v2 = between_value2.get(&attr_name).ok_or_else(|| {
            EngineError::ValidationError(format!("BETWEEN filter on '{attr_name}' missing value2"))
        })?;
        let value1 = Value::coerce_str(v1, &attr.attr_type)?;
        let value2 = Value::coerce_between_second(v2, &attr.attr_type)?;
        filters.push(Filter::new(attr_name, FilterOp::Between, FilterArg::Two(value1, value2))?);
    }

    for (attr_name, (op_str, values)) in shortcut {
        let op = FilterOp::from_shortcut(&op_str)
            .ok_or_else(|| EngineError::ValidationError(format!("unknown filter operator '{op_str}'")))?;
        let attr = filterable_attr(def, &attr_name)?;
        let arg = match op {
            FilterOp::In | FilterOp::NotIn => {
                let joined = values.join(",");
                let items: Vec<&str> = joined.split(',').map(str::trim).filter(|v| !v.is_empty()).collect();
                let coerced =
                    items.iter().map(|v| Value::coerce_str(v, &attr.attr_type)).collect::<EngineResult<Vec<_>>>()?;
                FilterArg::Many(coerced)
            }
            FilterOp::IsNull | FilterOp::IsNotNull => FilterArg::None,
            FilterOp::Contains | FilterOp::StartsWith | FilterOp::EndsWith => {
                let raw = values.first().cloned().unwrap_or_default();
                if raw.trim().is_empty() {
                    continue;
                }
                let wrapped = match op {
                    FilterOp::Contains => format!("%{raw}%"),
                    FilterOp::StartsWith => format!("{raw}%"),
                    FilterOp::EndsWith => format!("%{raw}"),
                    _ => unreachable!(),
                };
                FilterArg::One(Value::coerce_str(&wrapped, &attr.attr_type)?)
            }
            _ => {
                let raw = values.first().cloned().unwrap_or_default();
                if raw.trim().is_empty() {
                    continue;
                }
                FilterArg::One(Value::coerce_str(&raw, &attr.attr_type)?)
            }
        };
        filters.push(Filter::new(attr_name, op, arg)?);
    }

    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AttrType;

    fn def() -> QueryDefinition {
        QueryDefinition::builder("emps")
            .sql("SELECT emp_id, salary, dept FROM emp WHERE 1=1")
            .attribute(AttributeDef::new("empId", AttrType::Long).alias("emp_id"))
            .attribute(AttributeDef::new("salary", AttrType::Long).alias("salary"))
            .attribute(AttributeDef::new("firstName", AttrType::String).alias("first_name").filterable(true))
            .attribute(AttributeDef::new("dept", AttrType::String).alias("dept").sortable(false))
            .build()
            .unwrap()
    }

    fn raw(pairs: &[(&str, &str)]) -> RawParams {
        let mut map: RawParams = IndexMap::new();
        for (k, v) in pairs {
            map.entry(k.to_string()).or_default().push(v.to_string());
        }
        map
    }

    #[test]
    fn single_value_filter_becomes_equals() {
        let params = raw(&[("filter.salary", "50000")]);
        let filters = parse_filters(&def(), &params).unwrap();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].operator, FilterOp::Equals);
    }

    #[test]
    fn multi_value_filter_becomes_in() {
        let params = raw(&[("filter.salary", "50000,60000")]);
        let filters = parse_filters(&def(), &params).unwrap();
        assert_eq!(filters[0].operator, FilterOp::In);
    }

    #[test]
    fn shortcut_operator_parses_gte() {
        let params = raw(&[("filter.salary.gte", "50000")]);
        let filters = parse_filters(&def(), &params).unwrap();
        assert_eq!(filters[0].operator, FilterOp::Gte);
    }

    #[test]
    fn between_uses_op_value_value2_keys() {
        let params = raw(&[
            ("filter.salary.op", "between"),
            ("filter.salary.value", "1000"),
            ("filter.salary.value2", "2000"),
        ]);
        let filters = parse_filters(&def(), &params).unwrap();
        assert_eq!(filters[0].operator, FilterOp::Between);
        assert_eq!(filters[0].arg, FilterArg::Two(Value::Long(1000), Value::Long(2000)));
    }

    #[test]
    fn non_filterable_sort_target_is_rejected() {
        let params = raw(&[("sort", "dept.asc")]);
        let err = parse_sorts(&def(), &params);
        assert!(err.is_err());
    }

    #[test]
    fn in_shortcut_splits_single_value_on_commas() {
        let params = raw(&[("filter.salary.in", "1000,2000,3000")]);
        let filters = parse_filters(&def(), &params).unwrap();
        match &filters[0].arg {
            FilterArg::Many(values) => assert_eq!(values.len(), 3),
            other => panic!("expected Many, got {other:?}"),
        }
    }

    #[test]
    fn pagination_defaults_page_size_from_start() {
        let params = raw(&[("_start", "20")]);
        let config = EngineConfig::default().set_rest_default_page_size(10);
        let pagination = parse_pagination(&params, &config).unwrap().unwrap();
        assert_eq!(pagination.start, 20);
        assert_eq!(pagination.end, 30);
    }
}
