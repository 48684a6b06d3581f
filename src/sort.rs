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

//! Ordering requests; list order is priority order.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn from_suffix(suffix: &str) -> SortDirection {
        match suffix.to_ascii_lowercase().as_str() {
            "desc" => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SortSpec {
    pub attribute: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(attribute: impl Into<String>, direction: SortDirection) -> SortSpec {
        SortSpec { attribute: attribute.into(), direction }
    }

    /// Parse a single `attr[.asc|.desc]` token from the `sort=` grammar.
    pub fn parse_token(token: &str) -> SortSpec {
        match token.rsplit_once('.') {
            Some((attr, suffix)) if suffix.eq_ignore_ascii_case("asc") || suffix.eq_ignore_ascii_case("desc") => {
                SortSpec::new(attr, SortDirection::from_suffix(suffix))
            }
            _ => SortSpec::new(token, SortDirection::Asc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_ascending() {
        let spec = SortSpec::parse_token("salary");
        assert_eq!(spec.attribute, "salary");
        assert_eq!(spec.direction, SortDirection::Asc);
    }

    #[test]
    fn parses_explicit_descending() {
        let spec = SortSpec::parse_token("salary.desc");
        assert_eq!(spec.attribute, "salary");
        assert_eq!(spec.direction, SortDirection::Desc);
    }
}
