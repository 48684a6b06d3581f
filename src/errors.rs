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

//!
//! Common Errors.
//!
use std::error::Error;
use std::fmt;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Stable error taxonomy. The variant names double as the error code
/// surfaced to callers (see [`EngineError::code`]).
#[derive(Debug)]
pub enum EngineError {
    /// No definition registered under the requested name.
    QueryNotFound(String),
    /// The definition itself is malformed: duplicate name, unknown
    /// bind parameter, dangling criteria reference, etc.
    DefinitionError(String),
    /// A request failed validation against a definition: unknown
    /// parameter, type coercion failure, unknown filter attribute,
    /// bad pagination bounds.
    ValidationError(String),
    /// The database raised an error while assembling or running the
    /// query.
    ExecutionError(String),
    /// The query did not complete within the configured timeout.
    TimeoutError(String),
    /// Rejected by a security policy collaborator.
    SecurityError(String),

    /// Keep original SQLite error.
    #[cfg(feature = "sqlite")]
    SqliteError(rusqlite::Error),

    /// Keep original PostgreSQL error.
    #[cfg(feature = "postgres-driver")]
    PostgresError(postgres::error::Error),

    /// Keep original connection-pool error.
    #[cfg(any(feature = "sqlite", feature = "postgres-driver"))]
    R2D2Error(r2d2::Error),

    /// Keep original URL parse error.
    UrlParseError(url::ParseError),

    /// Keep original date/time parse error.
    ChronoParseError(chrono::ParseError),

    Unknown,
}

impl EngineError {
    /// The stable machine-readable code for this error, suitable for
    /// logging and for mapping to an HTTP status.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::QueryNotFound(_) => "QUERY_NOT_FOUND",
            EngineError::DefinitionError(_) => "DEFINITION_ERROR",
            EngineError::ValidationError(_) => "VALIDATION_ERROR",
            EngineError::ExecutionError(_) => "EXECUTION_ERROR",
            EngineError::TimeoutError(_) => "TIMEOUT_ERROR",
            EngineError::SecurityError(_) => "SECURITY_ERROR",
            #[cfg(feature = "sqlite")]
            EngineError::SqliteError(_) => "EXECUTION_ERROR",
            #[cfg(feature = "postgres-driver")]
            EngineError::PostgresError(_) => "EXECUTION_ERROR",
            #[cfg(any(feature = "sqlite", feature = "postgres-driver"))]
            EngineError::R2D2Error(_) => "EXECUTION_ERROR",
            EngineError::UrlParseError(_) => "DEFINITION_ERROR",
            EngineError::ChronoParseError(_) => "VALIDATION_ERROR",
            EngineError::Unknown => "EXECUTION_ERROR",
        }
    }

    /// The conventional HTTP status for this error, for collaborators
    /// that do choose to surface this engine over HTTP.
    pub fn status_code(&self) -> u16 {
        match self.code() {
            "QUERY_NOT_FOUND" => 404,
            "VALIDATION_ERROR" => 400,
            "SECURITY_ERROR" => 403,
            "TIMEOUT_ERROR" => 504,
            "DEFINITION_ERROR" | "EXECUTION_ERROR" => 500,
            _ => 500,
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::QueryNotFound(e) => write!(f, "Query not found: {e}"),
            EngineError::DefinitionError(e) => write!(f, "Invalid query definition: {e}"),
            EngineError::ValidationError(e) => write!(f, "Validation error: {e}"),
            EngineError::ExecutionError(e) => write!(f, "Execution error: {e}"),
            EngineError::TimeoutError(e) => write!(f, "Query timed out: {e}"),
            EngineError::SecurityError(e) => write!(f, "Rejected by security policy: {e}"),
            #[cfg(feature = "sqlite")]
            EngineError::SqliteError(e) => write!(f, "SQLite error: {e}"),
            #[cfg(feature = "postgres-driver")]
            EngineError::PostgresError(e) => write!(f, "Postgres error: {e}"),
            #[cfg(any(feature = "sqlite", feature = "postgres-driver"))]
            EngineError::R2D2Error(e) => write!(f, "Pool error: {e}"),
            EngineError::UrlParseError(e) => write!(f, "URL parse error: {e}"),
            EngineError::ChronoParseError(e) => write!(f, "Date/time parse error: {e}"),
            EngineError::Unknown => write!(f, "Unknown error"),
        }
    }
}

impl Error for EngineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            #[cfg(feature = "sqlite")]
            EngineError::SqliteError(err) => Some(err),
            #[cfg(feature = "postgres-driver")]
            EngineError::PostgresError(err) => Some(err),
            #[cfg(any(feature = "sqlite", feature = "postgres-driver"))]
            EngineError::R2D2Error(err) => Some(err),
            EngineError::UrlParseError(err) => Some(err),
            EngineError::ChronoParseError(err) => Some(err),
            _ => None,
        }
    }
}

//
// ───────────────────────────────────────────────
//   CONVERSIONS (From<T> → EngineError)
// ───────────────────────────────────────────────
//

impl From<url::ParseError> for EngineError {
    fn from(err: url::ParseError) -> Self {
        EngineError::UrlParseError(err)
    }
}

impl From<chrono::ParseError> for EngineError {
    fn from(err: chrono::ParseError) -> Self {
        EngineError::ChronoParseError(err)
    }
}

#[cfg(any(feature = "sqlite", feature = "postgres-driver"))]
impl From<r2d2::Error> for EngineError {
    fn from(err: r2d2::Error) -> Self {
        EngineError::R2D2Error(err)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        EngineError::SqliteError(err)
    }
}

#[cfg(feature = "postgres-driver")]
impl From<postgres::error::Error> for EngineError {
    fn from(err: postgres::error::Error) -> Self {
        EngineError::PostgresError(err)
    }
}
