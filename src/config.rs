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

//! Engine-wide configuration: dialect, REST pagination defaults,
//! fetch/timeout knobs, metadata-cache prewarm policy and connection
//! pool sizing. Built with the teacher's chained-setter style.

use crate::dialect::Dialect;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    connection_url: Option<String>,
    database_dialect: Dialect,
    rest_default_page_size: u32,
    rest_max_page_size: u32,
    fetch_size: u32,
    query_timeout: Duration,
    metadata_cache_prewarm: bool,
    metadata_cache_fail_on_startup: bool,
    max_size: u32,
    min_idle: Option<u32>,
    connection_timeout: Duration,
    /// Row-processor exception policy (Open Question (b) in
    /// `SPEC_FULL.md`): degrade the row by default rather than fail
    /// the whole response.
    fail_on_row_processor_error: bool,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            connection_url: None,
            database_dialect: Dialect::Sqlite,
            rest_default_page_size: 20,
            rest_max_page_size: 200,
            fetch_size: 100,
            query_timeout: Duration::from_secs(30),
            metadata_cache_prewarm: false,
            metadata_cache_fail_on_startup: false,
            max_size: 10,
            min_idle: None,
            connection_timeout: Duration::from_secs(30),
            fail_on_row_processor_error: false,
        }
    }
}

impl EngineConfig {
    pub fn new(url: &str) -> Result<EngineConfig, url::ParseError> {
        Url::parse(url)?;
        Ok(EngineConfig { connection_url: Some(url.to_string()), ..EngineConfig::default() })
    }

    pub fn set_connection_url(mut self, url: impl Into<String>) -> Self {
        self.connection_url = Some(url.into());
        self
    }

    pub fn connection_url(&self) -> Option<&str> {
        self.connection_url.as_deref()
    }

    pub fn set_database_dialect(mut self, dialect: Dialect) -> Self {
        self.database_dialect = dialect;
        self
    }

    pub fn set_database_dialect_str(mut self, dialect: &str) -> Result<Self, String> {
        self.database_dialect = Dialect::from_str(dialect)?;
        Ok(self)
    }

    pub fn database_dialect(&self) -> Dialect {
        self.database_dialect
    }

    pub fn set_rest_default_page_size(mut self, size: u32) -> Self {
        self.rest_default_page_size = size;
        self
    }

    pub fn rest_default_page_size(&self) -> u32 {
        self.rest_default_page_size
    }

    pub fn set_rest_max_page_size(mut self, size: u32) -> Self {
        self.rest_max_page_size = size;
        self
    }

    pub fn rest_max_page_size(&self) -> u32 {
        self.rest_max_page_size
    }

    pub fn set_fetch_size(mut self, fetch_size: u32) -> Self {
        self.fetch_size = fetch_size;
        self
    }

    pub fn fetch_size(&self) -> u32 {
        self.fetch_size
    }

    pub fn set_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    pub fn set_metadata_cache_prewarm(mut self, prewarm: bool) -> Self {
        self.metadata_cache_prewarm = prewarm;
        self
    }

    pub fn metadata_cache_prewarm(&self) -> bool {
        self.metadata_cache_prewarm
    }

    pub fn set_metadata_cache_fail_on_startup(mut self, fail: bool) -> Self {
        self.metadata_cache_fail_on_startup = fail;
        self
    }

    pub fn metadata_cache_fail_on_startup(&self) -> bool {
        self.metadata_cache_fail_on_startup
    }

    pub fn set_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    pub fn set_min_idle(mut self, min_idle: Option<u32>) -> Self {
        self.min_idle = min_idle;
        self
    }

    pub fn min_idle(&self) -> Option<u32> {
        self.min_idle
    }

    pub fn set_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    pub fn set_fail_on_row_processor_error(mut self, fail: bool) -> Self {
        self.fail_on_row_processor_error = fail;
        self
    }

    pub fn fail_on_row_processor_error(&self) -> bool {
        self.fail_on_row_processor_error
    }
}

/// Recognized `rest.*`/`jdbc.*`/`metadata.cache.*`-style configuration
/// option names, parsed from a generic string multimap (e.g. a
/// properties file or environment). Unrecognized keys are ignored.
pub fn apply_option(config: EngineConfig, key: &str, value: &str) -> EngineConfig {
    match key {
        "databaseDialect" => {
            config.clone().set_database_dialect_str(value).unwrap_or(config)
        }
        "rest.defaultPageSize" => {
            value.parse().map(|v| config.clone().set_rest_default_page_size(v)).unwrap_or(config)
        }
        "rest.maxPageSize" => {
            value.parse().map(|v| config.clone().set_rest_max_page_size(v)).unwrap_or(config)
        }
        "jdbc.fetchSize" => value.parse().map(|v| config.clone().set_fetch_size(v)).unwrap_or(config),
        "jdbc.queryTimeout" => value
            .parse()
            .map(|secs: u64| config.clone().set_query_timeout(Duration::from_secs(secs)))
            .unwrap_or(config),
        "metadata.cache.prewarm" => {
            value.parse().map(|v| config.clone().set_metadata_cache_prewarm(v)).unwrap_or(config)
        }
        "metadata.cache.failOnStartup" => value
            .parse()
            .map(|v| config.clone().set_metadata_cache_fail_on_startup(v))
            .unwrap_or(config),
        _ => config,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let config = EngineConfig::default();
        assert_eq!(config.fetch_size(), 100);
        assert_eq!(config.query_timeout(), Duration::from_secs(30));
        assert_eq!(config.database_dialect(), Dialect::Sqlite);
    }

    #[test]
    fn apply_option_parses_dialect() {
        let config = apply_option(EngineConfig::default(), "databaseDialect", "POSTGRESQL");
        assert_eq!(config.database_dialect(), Dialect::Postgresql);
    }

    #[test]
    fn apply_option_ignores_unknown_key() {
        let config = apply_option(EngineConfig::default(), "bogus.key", "123");
        assert_eq!(config.fetch_size(), 100);
    }
}
