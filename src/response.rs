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

//! The response envelope: list form (with pagination metadata), the
//! single-record form, and the HTTP status mapping a transport adapter
//! would use. This crate never serializes to bytes or binds a socket —
//! callers hand these types to whatever serializer/framework they use.

use crate::context::{AppliedCriterion, QueryContext};
use crate::definition::QueryDefinition;
use crate::errors::EngineError;
use crate::filter::{Filter, FilterArg};
use crate::pagination::Pagination;
use crate::pipeline::ExecutionResult;
use crate::row::Row;
use crate::sort::SortSpec;
use crate::types::AttrType;
use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct AppliedFilterView {
    pub attribute: String,
    pub operator: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value2: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
}

fn filter_view(filter: &Filter) -> AppliedFilterView {
    let operator = match filter.operator {
        crate::filter::FilterOp::Equals => "eq",
        crate::filter::FilterOp::NotEquals => "ne",
        crate::filter::FilterOp::Gt => "gt",
        crate::filter::FilterOp::Gte => "gte",
        crate::filter::FilterOp::Lt => "lt",
        crate::filter::FilterOp::Lte => "lte",
        crate::filter::FilterOp::Like => "like",
        crate::filter::FilterOp::NotLike => "notlike",
        crate::filter::FilterOp::In => "in",
        crate::filter::FilterOp::NotIn => "notin",
        crate::filter::FilterOp::Between => "between",
        crate::filter::FilterOp::IsNull => "null",
        crate::filter::FilterOp::IsNotNull => "notnull",
        crate::filter::FilterOp::Contains => "contains",
        crate::filter::FilterOp::StartsWith => "startswith",
        crate::filter::FilterOp::EndsWith => "endswith",
    };
    let (value, value2, values) = match &filter.arg {
        FilterArg::None => (None, None, None),
        FilterArg::One(v) => (Some(v.clone()), None, None),
        FilterArg::Two(a, b) => (Some(a.clone()), Some(b.clone()), None),
        FilterArg::Many(vs) => (None, None, Some(vs.clone())),
    };
    AppliedFilterView { attribute: filter.attribute.clone(), operator, value, value2, values }
}

#[derive(Debug, Clone, Serialize)]
pub struct AppliedSortView {
    pub attribute: String,
    pub direction: &'static str,
}

fn sort_view(sort: &SortSpec) -> AppliedSortView {
    AppliedSortView { attribute: sort.attribute.clone(), direction: sort.direction.as_sql() }
}

#[derive(Debug, Clone, Serialize)]
pub struct AttributeDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: AttrType,
    pub filterable: bool,
    pub sortable: bool,
    pub is_virtual: bool,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub ui_hints: IndexMap<String, Value>,
    /// Set by an external security collaborator, if any; this engine
    /// never restricts an attribute on its own.
    pub restricted: bool,
}

fn attribute_descriptor(name: &str, attr: &crate::definition::AttributeDef) -> AttributeDescriptor {
    AttributeDescriptor {
        name: name.to_string(),
        attr_type: attr.attr_type.clone(),
        filterable: attr.filterable,
        sortable: attr.sortable,
        is_virtual: attr.is_virtual,
        ui_hints: attr.ui_hints.clone(),
        restricted: false,
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct PerformanceMetadata {
    pub execution_time_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    pub applied_criteria: Vec<AppliedCriterion>,
    pub applied_filters: Vec<AppliedFilterView>,
    pub applied_sort: Vec<AppliedSortView>,
    pub parameters: IndexMap<String, Value>,
    pub attributes: Vec<AttributeDescriptor>,
    pub performance: PerformanceMetadata,
}

fn build_metadata(def: &QueryDefinition, ctx: &QueryContext) -> ResponseMetadata {
    ResponseMetadata {
        pagination: ctx.pagination,
        applied_criteria: ctx.applied_criteria.clone(),
        applied_filters: ctx.filters.iter().map(filter_view).collect(),
        applied_sort: ctx.sorts.iter().map(sort_view).collect(),
        parameters: ctx.params.clone(),
        attributes: def.attributes.iter().map(|(name, attr)| attribute_descriptor(name, attr)).collect(),
        performance: PerformanceMetadata { execution_time_ms: ctx.execution_time_ms },
    }
}

fn project_row(row: &Row, selected: Option<&[String]>) -> IndexMap<String, Value> {
    match selected {
        Some(fields) => fields.iter().filter_map(|f| row.get(f).map(|v| (f.clone(), v.clone()))).collect(),
        None => row.attributes().map(|(k, v)| (k.clone(), v.clone())).collect(),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub data: Vec<IndexMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
    pub count: i64,
    pub success: bool,
}

impl QueryResponse {
    /// Build the list envelope for an execution result. `count`
    /// reflects the pagination total when known, else the number of
    /// rows returned.
    pub fn from_execution(result: &ExecutionResult, def: &QueryDefinition) -> QueryResponse {
        let selected = result.context.selected_fields.as_deref();
        let data: Vec<IndexMap<String, Value>> = result.rows.iter().map(|row| project_row(row, selected)).collect();
        let count = result
            .context
            .pagination
            .and_then(|p| p.total)
            .unwrap_or(data.len() as i64);
        let metadata = result.context.include_metadata.then(|| build_metadata(def, &result.context));
        QueryResponse { data, metadata, count, success: true }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SingleRecordResponse {
    pub data: Option<IndexMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
    pub success: bool,
}

impl SingleRecordResponse {
    /// The single-record form: the first row, or `None` when the
    /// result set is empty (a 404-equivalent at the HTTP boundary, see
    /// [`status_for_single_record`]).
    pub fn from_execution(result: &ExecutionResult, def: &QueryDefinition) -> SingleRecordResponse {
        let selected = result.context.selected_fields.as_deref();
        let data = result.rows.first().map(|row| project_row(row, selected));
        let metadata = result.context.include_metadata.then(|| build_metadata(def, &result.context));
        SingleRecordResponse { data, metadata, success: true }
    }
}

/// The conventional HTTP status for an [`EngineError`], for
/// collaborators that do choose to surface this engine over HTTP.
pub fn status_for(err: &EngineError) -> u16 {
    err.status_code()
}

/// 404 when a single-record response found nothing, else 200.
pub fn status_for_single_record(response: &SingleRecordResponse) -> u16 {
    if response.data.is_some() {
        200
    } else {
        404
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::QueryContext;
    use crate::definition::AttributeDef;
    use crate::types::AttrType;
    use crate::value::Value;

    fn def() -> QueryDefinition {
        QueryDefinition::builder("emps")
            .sql("SELECT emp_id FROM emp WHERE 1=1")
            .attribute(AttributeDef::new("empId", AttrType::Long).alias("emp_id"))
            .build()
            .unwrap()
    }

    fn result_with_rows(rows: Vec<Row>, ctx: QueryContext) -> ExecutionResult {
        ExecutionResult { rows, context: ctx }
    }

    #[test]
    fn count_falls_back_to_row_count_without_pagination_total() {
        let mut row = Row::new();
        row.set_attribute("empId", Value::Long(1));
        let ctx = QueryContext::new("emps");
        let response = QueryResponse::from_execution(&result_with_rows(vec![row], ctx), &def());
        assert_eq!(response.count, 1);
        assert!(response.metadata.is_none());
    }

    #[test]
    fn count_uses_pagination_total_when_present() {
        let mut ctx = QueryContext::new("emps");
        let mut pagination = Pagination::new(0, 10);
        pagination.total = Some(57);
        ctx.pagination = Some(pagination);
        let response = QueryResponse::from_execution(&result_with_rows(vec![], ctx), &def());
        assert_eq!(response.count, 57);
    }

    #[test]
    fn single_record_response_is_404_equivalent_when_empty() {
        let ctx = QueryContext::new("emps");
        let response = SingleRecordResponse::from_execution(&result_with_rows(vec![], ctx), &def());
        assert_eq!(status_for_single_record(&response), 404);
    }

    #[test]
    fn select_narrows_projected_fields() {
        let mut row = Row::new();
        row.set_attribute("empId", Value::Long(1));
        row.set_attribute("firstName", Value::Text("Ada".into()));
        let mut ctx = QueryContext::new("emps");
        ctx.selected_fields = Some(vec!["empId".to_string()]);
        let response = QueryResponse::from_execution(&result_with_rows(vec![row], ctx), &def());
        assert_eq!(response.data[0].len(), 1);
        assert!(response.data[0].contains_key("empId"));
    }

    #[test]
    fn metadata_included_when_requested() {
        let mut ctx = QueryContext::new("emps");
        ctx.include_metadata = true;
        let response = QueryResponse::from_execution(&result_with_rows(vec![], ctx), &def());
        assert!(response.metadata.is_some());
    }
}
