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
#![allow(clippy::too_many_arguments)]

//! This crate offers:
//!
//! *   A registry of named, declarative SQL query definitions;
//! *   Dynamic SQL assembly from named bind parameters and optional
//!     criteria fragments, with dialect-aware pagination;
//! *   A typed execution pipeline: pre-processors, fetch, row mapping,
//!     virtual attributes, row/post-processors and response metadata;
//! *   An ahead-of-time metadata cache for dynamic attribute typing;
//! *   A transport-agnostic HTTP request grammar and response envelope.
//!
//! ## Installation
//!
//! Add this to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! queryforge = { version = "0.1", features = ["sqlite"] }
//! ```
//!
//! For PostgreSQL support:
//! ```toml
//! [dependencies]
//! queryforge = { version = "0.1", features = ["postgres-driver"] }
//! ```
//!
//! ## Quick start
//!
//! ```no_run
//! use queryforge::prelude::*;
//!
//! let registry = Registry::new();
//! let def = QueryDefinition::builder("orders.by_customer")
//!     .sql("SELECT id, customer_id, total FROM orders WHERE 1=1 --status")
//!     .param(ParamDef::new("customer_id", AttrType::Long))
//!     .attribute(AttributeDef::new("id", AttrType::Long))
//!     .attribute(AttributeDef::new("customer_id", AttrType::Long))
//!     .attribute(AttributeDef::new("total", AttrType::Decimal))
//!     .criteria(CriteriaDef::new("status", "AND status = :status"))
//!     .build()
//!     .unwrap();
//! registry.register(def).unwrap();
//! ```

pub mod assembler;
pub mod config;
pub mod context;
pub mod database;
pub mod definition;
pub mod dialect;
pub mod driver;
pub mod errors;
pub mod filter;
pub mod mapper;
pub mod metadata;
pub mod pagination;
pub mod pipeline;
pub mod pool;
pub mod processors;
pub mod registry;
pub mod request;
pub mod response;
pub mod row;
pub mod select;
pub mod sort;
pub mod types;
pub mod value;

pub mod prelude {
    //! Convenient re-export of the types most callers need.
    pub use crate::assembler::SqlAssembler;
    pub use crate::config::EngineConfig;
    pub use crate::context::QueryContext;
    pub use crate::definition::{AttributeDef, CriteriaDef, ParamDef, QueryDefinition};
    pub use crate::dialect::Dialect;
    pub use crate::errors::{EngineError, EngineResult};
    pub use crate::filter::{Filter, FilterOp};
    pub use crate::pagination::Pagination;
    pub use crate::pipeline::{ExecutionPipeline, QueryExecutor};
    pub use crate::registry::Registry;
    pub use crate::request::QueryRequest;
    pub use crate::response::{QueryResponse, SingleRecordResponse};
    pub use crate::row::Row;
    pub use crate::select::{rows_to_select_items, SelectItem};
    pub use crate::sort::{SortDirection, SortSpec};
    pub use crate::types::AttrType;
    pub use crate::value::Value;
}
