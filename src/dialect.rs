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

//! Target-database SQL flavor. Controls pagination emission only; a
//! live connection is only bundled for [`Dialect::Sqlite`] and
//! [`Dialect::Postgresql`] (see `driver`), the rest are SQL-generation
//! targets.

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Oracle11g,
    Oracle12cPlus,
    Postgresql,
    Mysql,
    MariaDb,
    SqlServer,
    H2,
    Hsqldb,
    Sqlite,
}

/// The pagination strategy a dialect dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationStrategy {
    /// `SELECT * FROM (SELECT a.*, ROWNUM rn FROM (<sql>) a WHERE ROWNUM <= :endRow) WHERE rn > :startRow`
    OracleRowNum,
    /// `OFFSET :offset ROWS FETCH NEXT :limit ROWS ONLY`
    OffsetFetch,
    /// `LIMIT :limit OFFSET :offset`
    LimitOffset,
}

impl Dialect {
    pub fn pagination_strategy(&self) -> PaginationStrategy {
        match self {
            Dialect::Oracle11g => PaginationStrategy::OracleRowNum,
            Dialect::Oracle12cPlus | Dialect::Postgresql | Dialect::SqlServer => {
                PaginationStrategy::OffsetFetch
            }
            Dialect::Mysql | Dialect::MariaDb | Dialect::H2 | Dialect::Sqlite | Dialect::Hsqldb => {
                PaginationStrategy::LimitOffset
            }
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "ORACLE_11G" => Dialect::Oracle11g,
            "ORACLE_12C+" | "ORACLE_12C_PLUS" => Dialect::Oracle12cPlus,
            "POSTGRESQL" => Dialect::Postgresql,
            "MYSQL" => Dialect::Mysql,
            "MARIADB" => Dialect::MariaDb,
            "SQLSERVER" => Dialect::SqlServer,
            "H2" => Dialect::H2,
            "HSQLDB" => Dialect::Hsqldb,
            "SQLITE" => Dialect::Sqlite,
            other => return Err(format!("unrecognized database dialect '{other}'")),
        })
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dialect::Oracle11g => "ORACLE_11G",
            Dialect::Oracle12cPlus => "ORACLE_12C+",
            Dialect::Postgresql => "POSTGRESQL",
            Dialect::Mysql => "MYSQL",
            Dialect::MariaDb => "MARIADB",
            Dialect::SqlServer => "SQLSERVER",
            Dialect::H2 => "H2",
            Dialect::Hsqldb => "HSQLDB",
            Dialect::Sqlite => "SQLITE",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oracle_11g_uses_rownum_wrap() {
        assert_eq!(Dialect::Oracle11g.pagination_strategy(), PaginationStrategy::OracleRowNum);
    }

    #[test]
    fn mysql_uses_limit_offset() {
        assert_eq!(Dialect::Mysql.pagination_strategy(), PaginationStrategy::LimitOffset);
    }

    #[test]
    fn postgres_uses_offset_fetch() {
        assert_eq!(Dialect::Postgresql.pagination_strategy(), PaginationStrategy::OffsetFetch);
    }

    #[test]
    fn parses_plus_suffixed_dialect_name() {
        assert_eq!("ORACLE_12C+".parse::<Dialect>().unwrap(), Dialect::Oracle12cPlus);
    }
}
