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

//! Processor and calculator hooks, modeled as tagged function values
//! rather than a trait-object hierarchy, since each hook shape has a
//! fixed, distinct signature.

use crate::context::QueryContext;
use crate::errors::EngineResult;
use crate::pipeline::ExecutionResult;
use crate::row::Row;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Runs before SQL assembly; may mutate the context (add params, alter
/// pagination).
#[derive(Clone)]
pub struct PreProcessor(pub Arc<dyn Fn(&mut QueryContext) -> EngineResult<()> + Send + Sync>);

impl PreProcessor {
    pub fn new<F>(f: F) -> PreProcessor
    where
        F: Fn(&mut QueryContext) -> EngineResult<()> + Send + Sync + 'static,
    {
        PreProcessor(Arc::new(f))
    }

    pub fn call(&self, ctx: &mut QueryContext) -> EngineResult<()> {
        (self.0)(ctx)
    }
}

impl fmt::Debug for PreProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PreProcessor(..)")
    }
}

/// Runs once per mapped row; returns the row, possibly mutated.
#[derive(Clone)]
pub struct RowProcessor(pub Arc<dyn Fn(Row, &QueryContext) -> EngineResult<Row> + Send + Sync>);

impl RowProcessor {
    pub fn new<F>(f: F) -> RowProcessor
    where
        F: Fn(Row, &QueryContext) -> EngineResult<Row> + Send + Sync + 'static,
    {
        RowProcessor(Arc::new(f))
    }

    pub fn call(&self, row: Row, ctx: &QueryContext) -> EngineResult<Row> {
        (self.0)(row, ctx)
    }
}

impl fmt::Debug for RowProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RowProcessor(..)")
    }
}

/// Runs once on the assembled result; returns a result, possibly new.
#[derive(Clone)]
pub struct PostProcessor(pub Arc<dyn Fn(ExecutionResult, &QueryContext) -> EngineResult<ExecutionResult> + Send + Sync>);

impl PostProcessor {
    pub fn new<F>(f: F) -> PostProcessor
    where
        F: Fn(ExecutionResult, &QueryContext) -> EngineResult<ExecutionResult> + Send + Sync + 'static,
    {
        PostProcessor(Arc::new(f))
    }

    pub fn call(&self, result: ExecutionResult, ctx: &QueryContext) -> EngineResult<ExecutionResult> {
        (self.0)(result, ctx)
    }
}

impl fmt::Debug for PostProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PostProcessor(..)")
    }
}

/// The two calculator shapes a virtual [`AttributeDef`](crate::definition::AttributeDef)
/// may declare: a per-row calculation, or one that additionally sees
/// every row already mapped in this execution (a second, aggregate
/// pass over the result set).
#[derive(Clone)]
pub enum Calculator {
    Simple(Arc<dyn Fn(&Row, &QueryContext) -> Value + Send + Sync>),
    Aggregate(Arc<dyn Fn(&Row, &[Row], &QueryContext) -> Value + Send + Sync>),
}

impl Calculator {
    pub fn simple<F>(f: F) -> Calculator
    where
        F: Fn(&Row, &QueryContext) -> Value + Send + Sync + 'static,
    {
        Calculator::Simple(Arc::new(f))
    }

    pub fn aggregate<F>(f: F) -> Calculator
    where
        F: Fn(&Row, &[Row], &QueryContext) -> Value + Send + Sync + 'static,
    {
        Calculator::Aggregate(Arc::new(f))
    }

    pub fn is_aggregate(&self) -> bool {
        matches!(self, Calculator::Aggregate(_))
    }
}

impl fmt::Debug for Calculator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Calculator::Simple(_) => f.write_str("Calculator::Simple(..)"),
            Calculator::Aggregate(_) => f.write_str("Calculator::Aggregate(..)"),
        }
    }
}

/// Value-transformation hook applied last for a row's attribute: value
/// in, formatted string out, overwriting the attribute value.
#[derive(Clone)]
pub struct Formatter(pub Arc<dyn Fn(&Value) -> Value + Send + Sync>);

impl Formatter {
    pub fn new<F>(f: F) -> Formatter
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Formatter(Arc::new(f))
    }
}

impl fmt::Debug for Formatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Formatter(..)")
    }
}
