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

//! Thread-safe registry of named query definitions: wait-free reads,
//! publish-once writes.

use crate::definition::QueryDefinition;
use crate::errors::{EngineError, EngineResult};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Default)]
pub struct Registry {
    definitions: DashMap<String, Arc<QueryDefinition>>,
}

impl Registry {
    pub fn new() -> Registry {
        Registry { definitions: DashMap::new() }
    }

    /// Register a definition. Fails with `DEFINITION_ERROR` if a
    /// definition with the same name is already registered; callers
    /// must `clear()` (or remove individually, if that capability is
    /// added later) before re-registering a name.
    pub fn register(&self, definition: QueryDefinition) -> EngineResult<()> {
        match self.definitions.entry(definition.name.clone()) {
            Entry::Occupied(_) => Err(EngineError::DefinitionError(format!(
                "a query named '{}' is already registered",
                definition.name
            ))),
            Entry::Vacant(slot) => {
                debug!(query = %definition.name, "registering query definition");
                slot.insert(Arc::new(definition));
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> EngineResult<Arc<QueryDefinition>> {
        self.definitions
            .get(name)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| EngineError::QueryNotFound(name.to_string()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn size(&self) -> usize {
        self.definitions.len()
    }

    pub fn all_queries(&self) -> Vec<Arc<QueryDefinition>> {
        self.definitions.iter().map(|entry| Arc::clone(entry.value())).collect()
    }

    pub fn clear(&self) {
        warn!(count = self.definitions.len(), "clearing query registry");
        self.definitions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::AttributeDef;
    use crate::types::AttrType;

    fn sample(name: &str) -> QueryDefinition {
        QueryDefinition::builder(name)
            .sql("SELECT id FROM emp WHERE 1=1")
            .attribute(AttributeDef::new("id", AttrType::Long))
            .build()
            .unwrap()
    }

    #[test]
    fn register_then_get_round_trips() {
        let registry = Registry::new();
        registry.register(sample("emps")).unwrap();
        assert!(registry.exists("emps"));
        assert_eq!(registry.get("emps").unwrap().name, "emps");
    }

    #[test]
    fn re_registering_same_name_fails() {
        let registry = Registry::new();
        registry.register(sample("emps")).unwrap();
        let err = registry.register(sample("emps"));
        assert!(err.is_err());
    }

    #[test]
    fn clear_allows_re_registration() {
        let registry = Registry::new();
        registry.register(sample("emps")).unwrap();
        registry.clear();
        assert!(registry.register(sample("emps")).is_ok());
    }

    #[test]
    fn lookup_of_unknown_name_is_query_not_found() {
        let registry = Registry::new();
        match registry.get("missing") {
            Err(EngineError::QueryNotFound(_)) => {}
            other => panic!("expected QueryNotFound, got {other:?}"),
        }
    }
}
