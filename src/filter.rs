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

//! Runtime filter predicates applied to a query's attributes.

use crate::errors::{EngineError, EngineResult};
use crate::value::Value;

/// Operator of a [`Filter`]. Arity is enforced by [`Filter::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Equals,
    NotEquals,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
    Contains,
    StartsWith,
    EndsWith,
}

impl FilterOp {
    pub fn from_shortcut(op: &str) -> Option<FilterOp> {
        Some(match op {
            "eq" => FilterOp::Equals,
            "ne" => FilterOp::NotEquals,
            "gt" => FilterOp::Gt,
            "gte" => FilterOp::Gte,
            "lt" => FilterOp::Lt,
            "lte" => FilterOp::Lte,
            "like" => FilterOp::Like,
            "notlike" => FilterOp::NotLike,
            "in" => FilterOp::In,
            "notin" => FilterOp::NotIn,
            "between" => FilterOp::Between,
            "null" => FilterOp::IsNull,
            "notnull" => FilterOp::IsNotNull,
            "contains" => FilterOp::Contains,
            "startswith" => FilterOp::StartsWith,
            "endswith" => FilterOp::EndsWith,
            _ => return None,
        })
    }

    /// The bind-parameter name suffix convention for this operator, per
    /// the assembler's `attrName[_op[_1|_2]]` scheme.
    pub fn bind_suffix(&self) -> &'static str {
        match self {
            FilterOp::Equals => "",
            FilterOp::NotEquals => "_ne",
            FilterOp::Gt => "_gt",
            FilterOp::Gte => "_gte",
            FilterOp::Lt => "_lt",
            FilterOp::Lte => "_lte",
            FilterOp::Like => "_like",
            FilterOp::NotLike => "_notlike",
            FilterOp::In => "_in",
            FilterOp::NotIn => "_notin",
            FilterOp::Between => "_between",
            FilterOp::IsNull | FilterOp::IsNotNull => "",
            FilterOp::Contains => "_contains",
            FilterOp::StartsWith => "_startswith",
            FilterOp::EndsWith => "_endswith",
        }
    }
}

/// Payload shape carried by a filter, matching the operator's arity.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterArg {
    None,
    One(Value),
    Two(Value, Value),
    Many(Vec<Value>),
}

#[derive(Debug, Clone)]
pub struct Filter {
    pub attribute: String,
    pub operator: FilterOp,
    pub arg: FilterArg,
}

impl Filter {
    pub fn new(attribute: impl Into<String>, operator: FilterOp, arg: FilterArg) -> EngineResult<Filter> {
        let attribute = attribute.into();
        let arity_ok = match (operator, &arg) {
            (
                FilterOp::Equals
                | FilterOp::NotEquals
                | FilterOp::Gt
                | FilterOp::Gte
                | FilterOp::Lt
                | FilterOp::Lte
                | FilterOp::Like
                | FilterOp::NotLike
                | FilterOp::Contains
                | FilterOp::StartsWith
                | FilterOp::EndsWith,
                FilterArg::One(_),
            ) => true,
            (FilterOp::In | FilterOp::NotIn, FilterArg::Many(_)) => true,
            (FilterOp::Between, FilterArg::Two(_, _)) => true,
            (FilterOp::IsNull | FilterOp::IsNotNull, FilterArg::None) => true,
            _ => false,
        };
        if !arity_ok {
            return Err(EngineError::ValidationError(format!(
                "filter operator {operator:?} on '{attribute}' received an argument of the wrong arity"
            )));
        }
        Ok(Filter { attribute, operator, arg })
    }

    pub fn equals(attribute: impl Into<String>, value: Value) -> Filter {
        Filter { attribute: attribute.into(), operator: FilterOp::Equals, arg: FilterArg::One(value) }
    }

    pub fn is_in(attribute: impl Into<String>, values: Vec<Value>) -> Filter {
        Filter { attribute: attribute.into(), operator: FilterOp::In, arg: FilterArg::Many(values) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn between_requires_two_values() {
        let err = Filter::new("age", FilterOp::Between, FilterArg::One(Value::Integer(1)));
        assert!(err.is_err());
    }

    #[test]
    fn is_null_requires_no_value() {
        let ok = Filter::new("deletedAt", FilterOp::IsNull, FilterArg::None);
        assert!(ok.is_ok());
    }

    #[test]
    fn shortcut_parses_known_operators() {
        assert_eq!(FilterOp::from_shortcut("gte"), Some(FilterOp::Gte));
        assert_eq!(FilterOp::from_shortcut("bogus"), None);
    }
}
