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

//! End-exclusive row-range pagination.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pagination {
    pub start: i64,
    pub end: i64,
    pub total: Option<i64>,
}

impl Pagination {
    pub fn new(start: i64, end: i64) -> Pagination {
        Pagination { start, end, total: None }
    }

    pub fn page_size(&self) -> i64 {
        self.end - self.start
    }

    pub fn limit(&self) -> i64 {
        self.page_size()
    }

    pub fn offset(&self) -> i64 {
        self.start
    }

    pub fn has_next(&self, rows_returned: usize) -> bool {
        match self.total {
            Some(total) => self.end < total,
            None => rows_returned as i64 >= self.page_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_end_minus_start() {
        let p = Pagination::new(20, 40);
        assert_eq!(p.page_size(), 20);
    }

    #[test]
    fn has_next_uses_total_when_known() {
        let mut p = Pagination::new(0, 10);
        p.total = Some(25);
        assert!(p.has_next(10));
        p.total = Some(10);
        assert!(!p.has_next(10));
    }
}
