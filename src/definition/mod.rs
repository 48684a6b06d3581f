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

//! The immutable query definition model: a name bound to a SQL
//! template, its typed attributes/parameters/criteria, and its
//! processor hooks.

pub mod validator;

use crate::context::QueryContext;
use crate::errors::{EngineError, EngineResult};
use crate::metadata::MetadataCache;
use crate::processors::{Calculator, Formatter, PostProcessor, PreProcessor, RowProcessor};
use crate::types::AttrType;
use crate::value::Value;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use std::time::Duration;

/// Strategy for naming attributes discovered dynamically from result
/// metadata (see the registry's merge of statically-declared and
/// dynamically-discovered attributes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DynamicNamingStrategy {
    #[default]
    AsIs,
    CamelCase,
}

#[derive(Debug, Clone)]
pub struct AttributeDef {
    pub name: String,
    pub alias_name: String,
    pub attr_type: AttrType,
    pub is_virtual: bool,
    pub calculator: Option<Calculator>,
    pub formatter: Option<Formatter>,
    pub filterable: bool,
    pub sortable: bool,
    pub sort_property: Option<String>,
    pub primary_key: bool,
    /// UI-hint fields (label, widget, etc.) ignored by the core but
    /// carried through to the metadata response verbatim.
    pub ui_hints: IndexMap<String, Value>,
}

impl AttributeDef {
    pub fn new(name: impl Into<String>, attr_type: AttrType) -> AttributeDef {
        let name = name.into();
        AttributeDef {
            alias_name: name.to_ascii_uppercase(),
            name,
            attr_type,
            is_virtual: false,
            calculator: None,
            formatter: None,
            filterable: true,
            sortable: true,
            sort_property: None,
            primary_key: false,
            ui_hints: IndexMap::new(),
        }
    }

    pub fn alias(mut self, alias_name: impl Into<String>) -> AttributeDef {
        self.alias_name = alias_name.into().to_ascii_uppercase();
        self
    }

    pub fn virtual_with(mut self, calculator: Calculator) -> AttributeDef {
        self.is_virtual = true;
        self.calculator = Some(calculator);
        self.filterable = false;
        self
    }

    pub fn formatter(mut self, formatter: Formatter) -> AttributeDef {
        self.formatter = Some(formatter);
        self
    }

    pub fn filterable(mut self, filterable: bool) -> AttributeDef {
        self.filterable = filterable;
        self
    }

    pub fn sortable(mut self, sortable: bool) -> AttributeDef {
        self.sortable = sortable;
        self
    }

    pub fn sort_property(mut self, sort_property: impl Into<String>) -> AttributeDef {
        self.sort_property = Some(sort_property.into());
        self
    }

    pub fn primary_key(mut self, primary_key: bool) -> AttributeDef {
        self.primary_key = primary_key;
        self
    }

    /// The SQL-side expression to sort/filter against for this
    /// attribute: `alias_name` for non-virtual attributes, the
    /// forwarded `sort_property` for virtual ones.
    pub fn sql_sort_target(&self) -> Option<&str> {
        if self.is_virtual {
            self.sort_property.as_deref()
        } else {
            Some(self.alias_name.as_str())
        }
    }
}

pub type ParamProcessor = std::sync::Arc<dyn Fn(Value, &QueryContext) -> EngineResult<Value> + Send + Sync>;
pub type ParamValidator = std::sync::Arc<dyn Fn(&Value) -> EngineResult<()> + Send + Sync>;

#[derive(Clone)]
pub struct ParamDef {
    pub name: String,
    pub attr_type: AttrType,
    pub required: bool,
    pub default_value: Option<Value>,
    pub processor: Option<ParamProcessor>,
    pub validator: Option<ParamValidator>,
}

impl std::fmt::Debug for ParamDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamDef")
            .field("name", &self.name)
            .field("attr_type", &self.attr_type)
            .field("required", &self.required)
            .field("default_value", &self.default_value)
            .finish()
    }
}

impl ParamDef {
    pub fn new(name: impl Into<String>, attr_type: AttrType) -> ParamDef {
        ParamDef {
            name: name.into(),
            attr_type,
            required: false,
            default_value: None,
            processor: None,
            validator: None,
        }
    }

    pub fn required(mut self, required: bool) -> ParamDef {
        self.required = required;
        self
    }

    pub fn default_value(mut self, value: Value) -> ParamDef {
        self.default_value = Some(value);
        self
    }

    pub fn processor<F>(mut self, f: F) -> ParamDef
    where
        F: Fn(Value, &QueryContext) -> EngineResult<Value> + Send + Sync + 'static,
    {
        self.processor = Some(std::sync::Arc::new(f));
        self
    }

    pub fn validator<F>(mut self, f: F) -> ParamDef
    where
        F: Fn(&Value) -> EngineResult<()> + Send + Sync + 'static,
    {
        self.validator = Some(std::sync::Arc::new(f));
        self
    }
}

pub type CriteriaCondition = std::sync::Arc<dyn Fn(&QueryContext) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct CriteriaDef {
    pub name: String,
    pub sql: String,
    pub condition: Option<CriteriaCondition>,
}

impl std::fmt::Debug for CriteriaDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CriteriaDef").field("name", &self.name).field("sql", &self.sql).finish()
    }
}

impl CriteriaDef {
    pub fn new(name: impl Into<String>, sql: impl Into<String>) -> CriteriaDef {
        CriteriaDef { name: name.into(), sql: sql.into(), condition: None }
    }

    pub fn condition<F>(mut self, f: F) -> CriteriaDef
    where
        F: Fn(&QueryContext) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(std::sync::Arc::new(f));
        self
    }
}

#[derive(Debug)]
pub struct QueryDefinition {
    pub name: String,
    pub sql: String,
    pub attributes: IndexMap<String, AttributeDef>,
    pub params: IndexMap<String, ParamDef>,
    pub criteria: IndexMap<String, CriteriaDef>,
    pub pre_processors: Vec<PreProcessor>,
    pub row_processors: Vec<RowProcessor>,
    pub post_processors: Vec<PostProcessor>,
    pub query_timeout: Duration,
    pub fetch_size: u32,
    pub pagination_enabled: bool,
    pub dynamic_attributes_enabled: bool,
    pub dynamic_naming_strategy: DynamicNamingStrategy,
    pub metadata_cache: OnceCell<MetadataCache>,
}

impl QueryDefinition {
    pub fn builder(name: impl Into<String>) -> QueryDefinitionBuilder {
        QueryDefinitionBuilder::new(name)
    }

    /// Read-only accessor for the lazily-populated metadata cache. A
    /// definition without a cache yet is not an error; callers fall
    /// back to driver-supplied row metadata.
    pub fn metadata_cache(&self) -> Option<&MetadataCache> {
        self.metadata_cache.get()
    }

    /// Publish-once assignment of the metadata cache. Returns `Err`
    /// with the rejected cache if one was already published.
    pub fn set_metadata_cache(&self, cache: MetadataCache) -> Result<(), MetadataCache> {
        self.metadata_cache.set(cache)
    }

    pub fn attribute(&self, name: &str) -> Option<&AttributeDef> {
        self.attributes.get(name)
    }

    pub fn param(&self, name: &str) -> Option<&ParamDef> {
        self.params.get(name)
    }
}

pub struct QueryDefinitionBuilder {
    name: String,
    sql: Option<String>,
    attributes: IndexMap<String, AttributeDef>,
    params: IndexMap<String, ParamDef>,
    criteria: IndexMap<String, CriteriaDef>,
    pre_processors: Vec<PreProcessor>,
    row_processors: Vec<RowProcessor>,
    post_processors: Vec<PostProcessor>,
    query_timeout: Duration,
    fetch_size: u32,
    pagination_enabled: bool,
    dynamic_attributes_enabled: bool,
    dynamic_naming_strategy: DynamicNamingStrategy,
    duplicate_errors: Vec<String>,
}

impl QueryDefinitionBuilder {
    pub fn new(name: impl Into<String>) -> QueryDefinitionBuilder {
        QueryDefinitionBuilder {
            name: name.into(),
            sql: None,
            attributes: IndexMap::new(),
            params: IndexMap::new(),
            criteria: IndexMap::new(),
            pre_processors: Vec::new(),
            row_processors: Vec::new(),
            post_processors: Vec::new(),
            query_timeout: Duration::from_secs(30),
            fetch_size: 100,
            pagination_enabled: true,
            dynamic_attributes_enabled: false,
            dynamic_naming_strategy: DynamicNamingStrategy::default(),
            duplicate_errors: Vec::new(),
        }
    }

    pub fn sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }

    pub fn attribute(mut self, attribute: AttributeDef) -> Self {
        if self.attributes.contains_key(&attribute.name) {
            self.duplicate_errors.push(format!("duplicate attribute name '{}'", attribute.name));
            return self;
        }
        if !attribute.is_virtual {
            let collision = self
                .attributes
                .values()
                .any(|existing| !existing.is_virtual && existing.alias_name == attribute.alias_name);
            if collision {
                self.duplicate_errors.push(format!(
                    "duplicate alias name '{}' among non-virtual attributes",
                    attribute.alias_name
                ));
                return self;
            }
        }
        self.attributes.insert(attribute.name.clone(), attribute);
        self
    }

    pub fn param(mut self, param: ParamDef) -> Self {
        if self.params.contains_key(&param.name) {
            self.duplicate_errors.push(format!("duplicate parameter name '{}'", param.name));
            return self;
        }
        self.params.insert(param.name.clone(), param);
        self
    }

    pub fn criteria(mut self, criteria: CriteriaDef) -> Self {
        if self.criteria.contains_key(&criteria.name) {
            self.duplicate_errors.push(format!("duplicate criteria name '{}'", criteria.name));
            return self;
        }
        self.criteria.insert(criteria.name.clone(), criteria);
        self
    }

    pub fn pre_processor(mut self, processor: PreProcessor) -> Self {
        self.pre_processors.push(processor);
        self
    }

    pub fn row_processor(mut self, processor: RowProcessor) -> Self {
        self.row_processors.push(processor);
        self
    }

    pub fn post_processor(mut self, processor: PostProcessor) -> Self {
        self.post_processors.push(processor);
        self
    }

    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn fetch_size(mut self, fetch_size: u32) -> Self {
        self.fetch_size = fetch_size;
        self
    }

    pub fn pagination_enabled(mut self, enabled: bool) -> Self {
        self.pagination_enabled = enabled;
        self
    }

    pub fn dynamic_attributes_enabled(mut self, enabled: bool) -> Self {
        self.dynamic_attributes_enabled = enabled;
        self
    }

    pub fn dynamic_naming_strategy(mut self, strategy: DynamicNamingStrategy) -> Self {
        self.dynamic_naming_strategy = strategy;
        self
    }

    pub fn build(self) -> EngineResult<QueryDefinition> {
        if let Some(first) = self.duplicate_errors.first() {
            return Err(EngineError::DefinitionError(format!("query '{}': {first}", self.name)));
        }
        let sql = self.sql.ok_or_else(|| {
            EngineError::DefinitionError(format!("query '{}' has no SQL template", self.name))
        })?;
        let def = QueryDefinition {
            name: self.name,
            sql,
            attributes: self.attributes,
            params: self.params,
            criteria: self.criteria,
            pre_processors: self.pre_processors,
            row_processors: self.row_processors,
            post_processors: self.post_processors,
            query_timeout: self.query_timeout,
            fetch_size: self.fetch_size,
            pagination_enabled: self.pagination_enabled,
            dynamic_attributes_enabled: self.dynamic_attributes_enabled,
            dynamic_naming_strategy: self.dynamic_naming_strategy,
            metadata_cache: OnceCell::new(),
        };
        validator::validate(&def)?;
        Ok(def)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_sql() {
        let err = QueryDefinition::builder("no_sql").build();
        assert!(err.is_err());
    }

    #[test]
    fn virtual_attribute_sorts_on_sort_property() {
        let attr = AttributeDef::new("fullName", AttrType::String)
            .virtual_with(Calculator::simple(|_, _| Value::Null))
            .sort_property("lastName");
        assert_eq!(attr.sql_sort_target(), Some("lastName"));
    }

    #[test]
    fn non_virtual_attribute_sorts_on_alias() {
        let attr = AttributeDef::new("salary", AttrType::Decimal).alias("SAL");
        assert_eq!(attr.sql_sort_target(), Some("SAL"));
    }
}
