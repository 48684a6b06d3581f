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

//! Dynamic SQL assembly: criteria substitution, filter projection,
//! sort, dialect-sensitive pagination and the separate count-query
//! derivation. Deterministic given the same [`QueryContext`].

use crate::context::{AppliedCriterion, QueryContext};
use crate::database::BindMap;
use crate::definition::{validator, AttributeDef, CriteriaDef, QueryDefinition};
use crate::dialect::{Dialect, PaginationStrategy};
use crate::errors::{EngineError, EngineResult};
use crate::filter::{Filter, FilterArg, FilterOp};
use crate::pagination::Pagination;
use crate::sort::SortSpec;
use crate::types::AttrType;
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

static CLEANUP: Lazy<Regex> = Lazy::new(|| Regex::new(r"--[A-Za-z_][A-Za-z0-9_]*").unwrap());

/// Assembled SQL plus the bind map it expects.
#[derive(Debug, Clone)]
pub struct SqlResult {
    pub sql: String,
    pub params: BindMap,
}

/// Stateless assembly entry point; all inputs travel through
/// [`QueryDefinition`] and [`QueryContext`].
pub struct SqlAssembler;

impl SqlAssembler {
    /// Assemble the main, row-fetching SQL for `ctx`. Records the
    /// applied (and skipped) criteria onto `ctx.applied_criteria`.
    pub fn assemble(def: &QueryDefinition, ctx: &mut QueryContext, dialect: Dialect) -> EngineResult<SqlResult> {
        let (mut sql, applied) = substitute_criteria(def, ctx);
        ctx.applied_criteria = applied;

        let mut binds: BindMap = ctx.params.clone();
        sql = apply_filters(def, &ctx.filters, sql, &mut binds)?;
        sql = apply_sort(sql, def, &ctx.sorts)?;

        if def.pagination_enabled {
            if let Some(pagination) = &ctx.pagination {
                sql = apply_pagination(sql, pagination, dialect, &mut binds);
            }
        }

        let sql = sql.trim().to_string();
        trace!(query = %def.name, %sql, "assembled sql");
        Ok(SqlResult { sql, params: binds })
    }

    /// Assemble `SELECT COUNT(*) FROM (<criteria+filters>) count_query`,
    /// skipping sort and pagination entirely.
    pub fn build_count_query(def: &QueryDefinition, ctx: &QueryContext) -> EngineResult<SqlResult> {
        let (mut sql, _applied) = substitute_criteria(def, ctx);
        let mut binds: BindMap = ctx.params.clone();
        sql = apply_filters(def, &ctx.filters, sql, &mut binds)?;
        let wrapped = format!("SELECT COUNT(*) FROM ({}) count_query", sql.trim());
        trace!(query = %def.name, sql = %wrapped, "assembled count query");
        Ok(SqlResult { sql: wrapped, params: binds })
    }
}

/// A criterion applies iff its `condition` predicate returns true, or,
/// absent a condition, iff every bind parameter it references is
/// present and non-null in `ctx.params`.
fn criterion_applies(crit: &CriteriaDef, ctx: &QueryContext) -> bool {
    if let Some(condition) = &crit.condition {
        return condition(ctx);
    }
    let referenced = validator::extract_bind_params(&crit.sql);
    referenced.iter().all(|name| ctx.params.get(name).map(|v| !v.is_null()).unwrap_or(false))
}

/// Substitute every criterion's `--name` placeholder with its fragment
/// (if it applies) or with an empty string, then strip any placeholder
/// left unmatched by a declared criterion.
fn substitute_criteria(def: &QueryDefinition, ctx: &QueryContext) -> (String, Vec<AppliedCriterion>) {
    let mut sql = def.sql.clone();
    let mut applied = Vec::new();
    for (name, crit) in &def.criteria {
        let placeholder = Regex::new(&format!(r"--{}\b", regex::escape(name))).unwrap();
        if criterion_applies(crit, ctx) {
            sql = placeholder.replace_all(&sql, crit.sql.as_str()).to_string();
            applied.push(AppliedCriterion {
                name: name.clone(),
                fragment: crit.sql.clone(),
                bind_names: validator::extract_bind_params(&crit.sql),
            });
        } else {
            sql = placeholder.replace_all(&sql, "").to_string();
        }
    }
    sql = CLEANUP.replace_all(&sql, "").to_string();
    (sql, applied)
}

fn apply_filters(
    def: &QueryDefinition,
    filters: &[Filter],
    mut sql: String,
    binds: &mut BindMap,
) -> EngineResult<String> {
    for filter in filters {
        let attr = def
            .attribute(&filter.attribute)
            .ok_or_else(|| EngineError::ValidationError(format!("unknown filter attribute '{}'", filter.attribute)))?;
        if attr.is_virtual {
            return Err(EngineError::ValidationError(format!(
                "attribute '{}' is virtual and cannot be filtered",
                filter.attribute
            )));
        }
        if !attr.filterable {
            return Err(EngineError::ValidationError(format!(
                "attribute '{}' is not filterable",
                filter.attribute
            )));
        }
        let (clause, pairs) = build_filter_clause(attr, filter)?;
        sql.push_str(" AND ");
        sql.push_str(&clause);
        for (name, value) in pairs {
            binds.insert(name, value);
        }
    }
    Ok(sql)
}

/// Build the SQL predicate and bind pairs for a single filter. Bind
/// names follow `attrName[_op[_1|_2]]`: plain `attrName` for EQUALS,
/// `attrName_<suffix>` for the other single-value operators,
/// `attrName_1`/`attrName_2` for BETWEEN, `attrName_1..N` for IN/NOT_IN.
fn build_filter_clause(attr: &AttributeDef, filter: &Filter) -> EngineResult<(String, Vec<(String, Value)>)> {
    let expr = attr.alias_name.as_str();
    let name = filter.attribute.as_str();
    let is_text = matches!(attr.attr_type, AttrType::String);

    match (filter.operator, &filter.arg) {
        (FilterOp::Equals, FilterArg::One(v)) => {
            let bind = name.to_string();
            let clause = if is_text {
                format!("UPPER({expr}) = UPPER(:{bind})")
            } else {
                format!("{expr} = :{bind}")
            };
            Ok((clause, vec![(bind, v.clone())]))
        }
        (FilterOp::NotEquals, FilterArg::One(v)) => {
            let bind = format!("{name}_ne");
            let clause = if is_text {
                format!("UPPER({expr}) <> UPPER(:{bind})")
            } else {
                format!("{expr} <> :{bind}")
            };
            Ok((clause, vec![(bind, v.clone())]))
        }
        (FilterOp::Gt, FilterArg::One(v)) => {
            let bind = format!("{name}_gt");
            Ok((format!("{expr} > :{bind}"), vec![(bind, v.clone())]))
        }
        (FilterOp::Gte, FilterArg::One(v)) => {
            let bind = format!("{name}_gte");
            Ok((format!("{expr} >= :{bind}"), vec![(bind, v.clone())]))
        }
        (FilterOp::Lt, FilterArg::One(v)) => {
            let bind = format!("{name}_lt");
            Ok((format!("{expr} < :{bind}"), vec![(bind, v.clone())]))
        }
        (FilterOp::Lte, FilterArg::One(v)) => {
            let bind = format!("{name}_lte");
            Ok((format!("{expr} <= :{bind}"), vec![(bind, v.clone())]))
        }
        (FilterOp::Like, FilterArg::One(v)) => {
            let bind = format!("{name}_like");
            let clause = if is_text {
                format!("UPPER({expr}) LIKE UPPER(:{bind})")
            } else {
                format!("{expr} LIKE :{bind}")
            };
            Ok((clause, vec![(bind, v.clone())]))
        }
        (FilterOp::NotLike, FilterArg::One(v)) => {
            let bind = format!("{name}_notlike");
            let clause = if is_text {
                format!("UPPER({expr}) NOT LIKE UPPER(:{bind})")
            } else {
                format!("{expr} NOT LIKE :{bind}")
            };
            Ok((clause, vec![(bind, v.clone())]))
        }
        (op @ (FilterOp::Contains | FilterOp::StartsWith | FilterOp::EndsWith), FilterArg::One(v)) => {
            let bind = format!("{name}{}", op.bind_suffix());
            Ok((format!("UPPER({expr}) LIKE UPPER(:{bind})"), vec![(bind, v.clone())]))
        }
        (FilterOp::In, FilterArg::Many(values)) => build_list_clause(expr, name, values, true),
        (FilterOp::NotIn, FilterArg::Many(values)) => build_list_clause(expr, name, values, false),
        (FilterOp::Between, FilterArg::Two(a, b)) => {
            let b1 = format!("{name}_1");
            let b2 = format!("{name}_2");
            Ok((format!("{expr} BETWEEN :{b1} AND :{b2}"), vec![(b1, a.clone()), (b2, b.clone())]))
        }
        (FilterOp::IsNull, FilterArg::None) => Ok((format!("{expr} IS NULL"), Vec::new())),
        (FilterOp::IsNotNull, FilterArg::None) => Ok((format!("{expr} IS NOT NULL"), Vec::new())),
        (op, _) => Err(EngineError::ValidationError(format!(
            "filter operator {op:?} received a mismatched argument for '{name}'"
        ))),
    }
}

fn build_list_clause(
    expr: &str,
    name: &str,
    values: &[Value],
    is_in: bool,
) -> EngineResult<(String, Vec<(String, Value)>)> {
    if values.is_empty() {
        let clause = if is_in { "1=0".to_string() } else { "1=1".to_string() };
        return Ok((clause, Vec::new()));
    }
    let mut binds = Vec::with_capacity(values.len());
    let mut placeholders = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        let bind = format!("{name}_{}", i + 1);
        placeholders.push(format!(":{bind}"));
        binds.push((bind, value.clone()));
    }
    let op = if is_in { "IN" } else { "NOT IN" };
    Ok((format!("{expr} {op} ({})", placeholders.join(", ")), binds))
}

fn apply_sort(sql: String, def: &QueryDefinition, sorts: &[SortSpec]) -> EngineResult<String> {
    if sorts.is_empty() {
        return Ok(sql);
    }
    let mut parts = Vec::with_capacity(sorts.len());
    for sort in sorts {
        let attr = def
            .attribute(&sort.attribute)
            .ok_or_else(|| EngineError::ValidationError(format!("unknown sort attribute '{}'", sort.attribute)))?;
        if !attr.sortable {
            return Err(EngineError::ValidationError(format!(
                "attribute '{}' is not sortable",
                sort.attribute
            )));
        }
        let target = attr.sql_sort_target().ok_or_else(|| {
            EngineError::DefinitionError(format!(
                "virtual attribute '{}' is sortable but declares no sortProperty",
                sort.attribute
            ))
        })?;
        parts.push(format!("{target} {}", sort.direction.as_sql()));
    }
    Ok(format!("{sql} ORDER BY {}", parts.join(", ")))
}

fn apply_pagination(sql: String, pagination: &Pagination, dialect: Dialect, binds: &mut BindMap) -> String {
    match dialect.pagination_strategy() {
        PaginationStrategy::OracleRowNum => {
            binds.insert("startRow".to_string(), Value::Long(pagination.start));
            binds.insert("endRow".to_string(), Value::Long(pagination.end));
            format!("SELECT * FROM (SELECT a.*, ROWNUM rn FROM ({sql}) a WHERE ROWNUM <= :endRow) WHERE rn > :startRow")
        }
        PaginationStrategy::OffsetFetch => {
            binds.insert("offset".to_string(), Value::Long(pagination.offset()));
            binds.insert("limit".to_string(), Value::Long(pagination.limit()));
            format!("{sql} OFFSET :offset ROWS FETCH NEXT :limit ROWS ONLY")
        }
        PaginationStrategy::LimitOffset => {
            binds.insert("offset".to_string(), Value::Long(pagination.offset()));
            binds.insert("limit".to_string(), Value::Long(pagination.limit()));
            format!("{sql} LIMIT :limit OFFSET :offset")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{AttributeDef, CriteriaDef, ParamDef, QueryDefinition};
    use crate::sort::SortDirection;

    fn emps_def() -> QueryDefinition {
        QueryDefinition::builder("emps")
            .sql("SELECT emp_id, first_name FROM emp WHERE 1=1 --deptCriterion --statusCriterion")
            .param(ParamDef::new("dept", AttrType::Integer).default_value(Value::Integer(10)))
            .param(ParamDef::new("status", AttrType::String))
            .attribute(AttributeDef::new("empId", AttrType::Long).alias("emp_id"))
            .attribute(AttributeDef::new("firstName", AttrType::String).alias("first_name"))
            .attribute(AttributeDef::new("salary", AttrType::Decimal).alias("salary"))
            .criteria(CriteriaDef::new("deptCriterion", "AND dept_id = :dept"))
            .criteria(CriteriaDef::new("statusCriterion", "AND status = :status"))
            .build()
            .unwrap()
    }

    /// S1: default parameter present, the other criterion absent -> erased.
    #[test]
    fn s1_default_parameter_and_erased_criterion() {
        let def = emps_def();
        let mut ctx = QueryContext::new("emps");
        ctx.set_param("dept", Value::Integer(10));
        let result = SqlAssembler::assemble(&def, &mut ctx, Dialect::Sqlite).unwrap();
        assert!(result.sql.contains("AND dept_id = :dept"));
        assert!(!result.sql.contains("statusCriterion"));
        assert!(!result.sql.contains("status"));
        assert_eq!(result.params.get("dept"), Some(&Value::Integer(10)));
        assert_eq!(ctx.applied_criteria.len(), 1);
        assert_eq!(ctx.applied_criteria[0].name, "deptCriterion");
    }

    /// S2: filter shortcut + sort + Oracle 12c+ offset/fetch pagination.
    #[test]
    fn s2_filter_sort_and_offset_fetch_pagination() {
        let def = emps_def();
        let mut ctx = QueryContext::new("emps");
        ctx.set_param("dept", Value::Integer(10));
        ctx.filters = vec![Filter::new("salary", FilterOp::Gte, FilterArg::One(Value::Integer(50000))).unwrap()];
        ctx.sorts = vec![SortSpec::new("salary", SortDirection::Desc)];
        ctx.pagination = Some(Pagination::new(20, 40));
        let result = SqlAssembler::assemble(&def, &mut ctx, Dialect::Oracle12cPlus).unwrap();
        assert!(result.sql.contains("AND SALARY >= :salary_gte"));
        assert!(result.sql.contains("ORDER BY SALARY DESC"));
        assert!(result.sql.ends_with("OFFSET :offset ROWS FETCH NEXT :limit ROWS ONLY"));
        assert_eq!(result.params.get("salary_gte"), Some(&Value::Integer(50000)));
        assert_eq!(result.params.get("offset"), Some(&Value::Long(20)));
        assert_eq!(result.params.get("limit"), Some(&Value::Long(20)));
    }

    /// S4: same request against Oracle 11g uses the ROWNUM wrap.
    #[test]
    fn s4_oracle_11g_rownum_wrap() {
        let def = emps_def();
        let mut ctx = QueryContext::new("emps");
        ctx.set_param("dept", Value::Integer(10));
        ctx.pagination = Some(Pagination::new(20, 40));
        let result = SqlAssembler::assemble(&def, &mut ctx, Dialect::Oracle11g).unwrap();
        assert!(result.sql.starts_with("SELECT * FROM (SELECT a.*, ROWNUM rn FROM ("));
        assert!(result.sql.ends_with("WHERE rn > :startRow"));
        assert_eq!(result.params.get("startRow"), Some(&Value::Long(20)));
        assert_eq!(result.params.get("endRow"), Some(&Value::Long(40)));
    }

    /// S6: virtual attribute sort forwarding to its sortProperty.
    #[test]
    fn s6_virtual_sort_forwarding() {
        use crate::processors::Calculator;
        let def = QueryDefinition::builder("emps_full")
            .sql("SELECT emp_id, last_name FROM emp WHERE 1=1")
            .attribute(AttributeDef::new("lastName", AttrType::String).alias("last_name"))
            .attribute(
                AttributeDef::new("fullName", AttrType::String)
                    .virtual_with(Calculator::simple(|_, _| Value::Null))
                    .sort_property("lastName"),
            )
            .build()
            .unwrap();
        let mut ctx = QueryContext::new("emps_full");
        ctx.sorts = vec![SortSpec::new("fullName", SortDirection::Asc)];
        let result = SqlAssembler::assemble(&def, &mut ctx, Dialect::Sqlite).unwrap();
        assert!(result.sql.contains("ORDER BY lastName ASC"));
    }

    #[test]
    fn empty_in_list_emits_false_predicate() {
        let def = emps_def();
        let mut ctx = QueryContext::new("emps");
        ctx.set_param("dept", Value::Integer(10));
        ctx.filters = vec![Filter::new("salary", FilterOp::In, FilterArg::Many(vec![])).unwrap()];
        let result = SqlAssembler::assemble(&def, &mut ctx, Dialect::Sqlite).unwrap();
        assert!(result.sql.contains("1=0"));
    }

    #[test]
    fn empty_not_in_list_emits_true_predicate() {
        let def = emps_def();
        let mut ctx = QueryContext::new("emps");
        ctx.set_param("dept", Value::Integer(10));
        ctx.filters = vec![Filter::new("salary", FilterOp::NotIn, FilterArg::Many(vec![])).unwrap()];
        let result = SqlAssembler::assemble(&def, &mut ctx, Dialect::Sqlite).unwrap();
        assert!(result.sql.contains("1=1"));
    }

    #[test]
    fn virtual_attribute_cannot_be_filtered() {
        use crate::processors::Calculator;
        let def = QueryDefinition::builder("emps_full")
            .sql("SELECT emp_id FROM emp WHERE 1=1")
            .attribute(AttributeDef::new("empId", AttrType::Long).alias("emp_id"))
            .attribute(
                AttributeDef::new("fullName", AttrType::String)
                    .virtual_with(Calculator::simple(|_, _| Value::Null)),
            )
            .build()
            .unwrap();
        let mut ctx = QueryContext::new("emps_full");
        ctx.filters = vec![Filter::equals("fullName", Value::Text("Ada".into()))];
        let err = SqlAssembler::assemble(&def, &mut ctx, Dialect::Sqlite);
        assert!(err.is_err());
    }

    #[test]
    fn count_query_wraps_without_sort_or_pagination() {
        let def = emps_def();
        let mut ctx = QueryContext::new("emps");
        ctx.set_param("dept", Value::Integer(10));
        ctx.sorts = vec![SortSpec::new("firstName", SortDirection::Asc)];
        ctx.pagination = Some(Pagination::new(0, 10));
        let result = SqlAssembler::build_count_query(&def, &ctx).unwrap();
        assert!(result.sql.starts_with("SELECT COUNT(*) FROM ("));
        assert!(result.sql.ends_with("count_query"));
        assert!(!result.sql.contains("ORDER BY"));
        assert!(!result.sql.contains("LIMIT"));
    }

    #[test]
    fn between_uses_indexed_bind_names() {
        let def = emps_def();
        let mut ctx = QueryContext::new("emps");
        ctx.set_param("dept", Value::Integer(10));
        ctx.filters = vec![Filter::new(
            "salary",
            FilterOp::Between,
            FilterArg::Two(Value::Integer(1000), Value::Integer(2000)),
        )
        .unwrap()];
        let result = SqlAssembler::assemble(&def, &mut ctx, Dialect::Sqlite).unwrap();
        assert!(result.sql.contains("SALARY BETWEEN :salary_1 AND :salary_2"));
        assert_eq!(result.params.get("salary_1"), Some(&Value::Integer(1000)));
        assert_eq!(result.params.get("salary_2"), Some(&Value::Integer(2000)));
    }
}
