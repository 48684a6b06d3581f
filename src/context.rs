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

//! Per-execution mutable state. A `QueryContext` is never shared
//! across executions; each request builds its own.

use crate::filter::Filter;
use crate::pagination::Pagination;
use crate::sort::SortSpec;
use crate::value::Value;
use indexmap::IndexMap;
use serde::Serialize;

/// Record of a criterion applied (or skipped) during assembly, kept
/// for the response metadata's audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct AppliedCriterion {
    pub name: String,
    pub fragment: String,
    pub bind_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct QueryContext {
    pub query_name: String,
    pub params: IndexMap<String, Value>,
    pub filters: Vec<Filter>,
    pub sorts: Vec<SortSpec>,
    pub pagination: Option<Pagination>,
    pub selected_fields: Option<Vec<String>>,
    pub applied_criteria: Vec<AppliedCriterion>,
    pub total_count: Option<i64>,
    pub execution_time_ms: Option<u64>,
    pub include_metadata: bool,
}

impl QueryContext {
    pub fn new(query_name: impl Into<String>) -> QueryContext {
        QueryContext {
            query_name: query_name.into(),
            params: IndexMap::new(),
            filters: Vec::new(),
            sorts: Vec::new(),
            pagination: None,
            selected_fields: None,
            applied_criteria: Vec::new(),
            total_count: None,
            execution_time_ms: None,
            include_metadata: false,
        }
    }

    pub fn with_params(mut self, params: IndexMap<String, Value>) -> QueryContext {
        self.params = params;
        self
    }

    pub fn with_filters(mut self, filters: Vec<Filter>) -> QueryContext {
        self.filters = filters;
        self
    }

    pub fn with_sorts(mut self, sorts: Vec<SortSpec>) -> QueryContext {
        self.sorts = sorts;
        self
    }

    pub fn with_pagination(mut self, pagination: Option<Pagination>) -> QueryContext {
        self.pagination = pagination;
        self
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    pub fn set_param(&mut self, name: impl Into<String>, value: Value) {
        self.params.insert(name.into(), value);
    }
}
