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

//! Orchestrates a single request end to end: pre-processors, SQL
//! assembly, fetch, row mapping, row/post-processors and timing.

use crate::assembler::SqlAssembler;
use crate::config::EngineConfig;
use crate::context::QueryContext;
use crate::database::Database;
use crate::definition::QueryDefinition;
use crate::errors::{EngineError, EngineResult};
use crate::mapper;
use crate::registry::Registry;
use crate::request::QueryRequest;
use crate::row::Row;
use std::sync::Arc;
use std::time::Instant;
use tracing::{trace, warn};

/// The fetched, mapped and processed rows for one execution, plus the
/// context they were produced under (criteria applied, pagination
/// totals, timing). Post-processors receive and may replace this.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub rows: Vec<Row>,
    pub context: QueryContext,
}

/// Stateless orchestration entry point; all durable state lives in the
/// `Registry` and the `Database` the caller supplies.
pub struct ExecutionPipeline;

impl ExecutionPipeline {
    /// Build the starting `QueryContext` for a request: named
    /// parameters merged with declared defaults, filters, sorts,
    /// pagination and metadata verbosity carried over verbatim.
    pub fn build_context(def: &QueryDefinition, request: &QueryRequest) -> EngineResult<QueryContext> {
        let mut params = request.params.clone();
        for (name, param) in &def.params {
            if !params.contains_key(name) {
                if let Some(default) = &param.default_value {
                    params.insert(name.clone(), default.clone());
                } else if param.required {
                    return Err(EngineError::ValidationError(format!(
                        "query '{}' requires parameter '{name}'",
                        def.name
                    )));
                }
            }
        }
        for (name, value) in params.clone() {
            if let Some(param) = def.param(&name) {
                if let Some(validator) = &param.validator {
                    validator(&value)?;
                }
            }
        }

        let mut ctx = QueryContext::new(request.query_name.clone())
            .with_params(params)
            .with_filters(request.filters.clone())
            .with_sorts(request.sorts.clone())
            .with_pagination(request.pagination.clone());
        ctx.selected_fields = request.selected_fields.clone();
        ctx.include_metadata = !matches!(request.meta, crate::request::MetaVerbosity::None);

        for (name, param) in &def.params {
            if let Some(processor) = &param.processor {
                if let Some(value) = ctx.param(name).cloned() {
                    let processed = processor(value, &ctx)?;
                    ctx.set_param(name.clone(), processed);
                }
            }
        }
        Ok(ctx)
    }
}

/// The engine's public entry point: resolves a definition from the
/// registry, runs it against a database, returns a fully processed
/// [`ExecutionResult`].
pub struct QueryExecutor {
    registry: Arc<Registry>,
    database: Arc<dyn Database>,
    config: EngineConfig,
}

impl QueryExecutor {
    pub fn new(registry: Arc<Registry>, database: Arc<dyn Database>, config: EngineConfig) -> QueryExecutor {
        QueryExecutor { registry, database, config }
    }

    pub fn execute(&self, request: &QueryRequest) -> EngineResult<ExecutionResult> {
        let started = Instant::now();
        let def = self.registry.get(&request.query_name)?;
        let mut ctx = ExecutionPipeline::build_context(&def, request)?;

        for processor in &def.pre_processors {
            processor.call(&mut ctx)?;
        }

        let sql_result = SqlAssembler::assemble(&def, &mut ctx, self.config.database_dialect())?;

        if def.pagination_enabled && ctx.pagination.is_some() {
            let count_query = SqlAssembler::build_count_query(&def, &ctx)?;
            match self.database.query_count(&count_query.sql, &count_query.params) {
                Ok(total) => {
                    if let Some(pagination) = ctx.pagination.as_mut() {
                        pagination.total = Some(total);
                    }
                    ctx.total_count = Some(total);
                }
                Err(err) => {
                    warn!(query = %def.name, error = %err, "count query failed, total omitted");
                }
            }
        }

        trace!(query = %def.name, sql = %sql_result.sql, "executing");
        let driver_rows = self.database.query(&sql_result.sql, &sql_result.params, def.fetch_size)?;

        let mapped = mapper::map_rows(&def, &ctx, driver_rows);
        let rows = run_row_processors(&def, &ctx, mapped, self.config.fail_on_row_processor_error())?;

        let mut result = ExecutionResult { rows, context: ctx };
        let post_ctx = result.context.clone();
        for processor in &def.post_processors {
            result = processor.call(result, &post_ctx)?;
        }

        result.context.execution_time_ms = Some(started.elapsed().as_millis() as u64);
        trace!(
            query = %def.name,
            rows = result.rows.len(),
            elapsed_ms = result.context.execution_time_ms,
            "execution completed"
        );
        Ok(result)
    }
}

/// Run each row through every declared row processor in order. A
/// failing processor degrades that row (keeps it as last computed,
/// logs a warning) unless `fail_on_error`, in which case the whole
/// execution fails.
fn run_row_processors(
    def: &QueryDefinition,
    ctx: &QueryContext,
    rows: Vec<Row>,
    fail_on_error: bool,
) -> EngineResult<Vec<Row>> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut current = row;
        for processor in &def.row_processors {
            match processor.call(current.clone(), ctx) {
                Ok(updated) => current = updated,
                Err(err) => {
                    if fail_on_error {
                        return Err(err);
                    }
                    warn!(query = %def.name, error = %err, "row processor failed, degrading row");
                    break;
                }
            }
        }
        out.push(current);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{ColumnMeta, DriverRow};
    use crate::definition::{AttributeDef, ParamDef};
    use crate::request::RawParams;
    use crate::types::AttrType;
    use crate::value::Value;
    use indexmap::IndexMap;
    use std::sync::Mutex;

    struct FakeDatabase {
        rows: Vec<DriverRow>,
        count: i64,
        queries: Mutex<Vec<String>>,
    }

    impl Database for FakeDatabase {
        fn query(&self, sql: &str, _binds: &crate::database::BindMap, _fetch_size: u32) -> EngineResult<Vec<DriverRow>> {
            self.queries.lock().unwrap().push(sql.to_string());
            Ok(self.rows.clone())
        }

        fn query_count(&self, _sql: &str, _binds: &crate::database::BindMap) -> EngineResult<i64> {
            Ok(self.count)
        }

        fn probe_metadata(&self, _sql: &str, _binds: &crate::database::BindMap) -> EngineResult<Vec<ColumnMeta>> {
            Ok(Vec::new())
        }
    }

    fn def() -> QueryDefinition {
        QueryDefinition::builder("emps")
            .sql("SELECT emp_id, salary FROM emp WHERE 1=1")
            .param(ParamDef::new("dept", AttrType::Integer).default_value(Value::Integer(10)))
            .attribute(AttributeDef::new("empId", AttrType::Long).alias("emp_id"))
            .attribute(AttributeDef::new("salary", AttrType::Long).alias("salary"))
            .build()
            .unwrap()
    }

    #[test]
    fn executes_and_reports_timing() {
        let registry = Arc::new(Registry::new());
        registry.register(def()).unwrap();
        let database = Arc::new(FakeDatabase {
            rows: vec![DriverRow {
                columns: vec![("EMP_ID".to_string(), Value::Long(1)), ("SALARY".to_string(), Value::Long(1000))],
            }],
            count: 1,
            queries: Mutex::new(Vec::new()),
        });
        let executor = QueryExecutor::new(registry, database, EngineConfig::default());
        let raw: RawParams = IndexMap::new();
        let request =
            QueryRequest::from_query_params("emps", &executor.registry.get("emps").unwrap(), &raw, &EngineConfig::default())
                .unwrap();
        let result = executor.execute(&request).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].get("empId"), Some(&Value::Long(1)));
        assert!(result.context.execution_time_ms.is_some());
    }

    #[test]
    fn missing_required_parameter_without_default_fails() {
        let def = QueryDefinition::builder("needs_param")
            .sql("SELECT id FROM emp WHERE 1=1")
            .param(ParamDef::new("id", AttrType::Long).required(true))
            .attribute(AttributeDef::new("id", AttrType::Long))
            .build()
            .unwrap();
        let request = QueryRequest {
            query_name: "needs_param".to_string(),
            params: IndexMap::new(),
            filters: vec![],
            sorts: vec![],
            pagination: None,
            selected_fields: None,
            meta: crate::request::MetaVerbosity::None,
        };
        let err = ExecutionPipeline::build_context(&def, &request);
        assert!(err.is_err());
    }

    #[test]
    fn param_processor_runs_after_defaulting() {
        let def = QueryDefinition::builder("emps")
            .sql("SELECT emp_id FROM emp WHERE 1=1")
            .param(
                ParamDef::new("dept", AttrType::Integer)
                    .default_value(Value::Integer(10))
                    .processor(|value, _ctx| match value {
                        Value::Integer(i) => Ok(Value::Integer(i * 10)),
                        other => Ok(other),
                    }),
            )
            .attribute(AttributeDef::new("empId", AttrType::Long).alias("emp_id"))
            .build()
            .unwrap();
        let request = QueryRequest {
            query_name: "emps".to_string(),
            params: IndexMap::new(),
            filters: vec![],
            sorts: vec![],
            pagination: None,
            selected_fields: None,
            meta: crate::request::MetaVerbosity::None,
        };
        let ctx = ExecutionPipeline::build_context(&def, &request).unwrap();
        assert_eq!(ctx.param("dept"), Some(&Value::Integer(100)));
    }
}
