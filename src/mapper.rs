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

//! Converts fetched driver rows into attribute-keyed [`Row`]s, applies
//! virtual-attribute calculators (including the aggregate second pass)
//! and attribute formatters.

use crate::context::QueryContext;
use crate::database::DriverRow;
use crate::definition::QueryDefinition;
use crate::processors::Calculator;
use crate::row::Row;
use tracing::warn;

/// Result sets larger than this are mapped in fixed-size batches to
/// bound peak allocation; semantics are unchanged either way.
const BATCH_SIZE: usize = 1000;

/// Project every fetched row into the definition's attribute space and
/// run virtual-attribute calculators, including the aggregate second
/// pass over the full mapped set.
pub fn map_rows(def: &QueryDefinition, ctx: &QueryContext, driver_rows: Vec<DriverRow>) -> Vec<Row> {
    let mut rows = Vec::with_capacity(driver_rows.len());
    for chunk in driver_rows.chunks(BATCH_SIZE) {
        for driver_row in chunk {
            rows.push(project_row(def, driver_row));
        }
    }

    run_simple_calculators(def, ctx, &mut rows);
    run_aggregate_calculators(def, ctx, &mut rows);
    apply_formatters(def, &mut rows);
    rows
}

/// Raw-column extraction plus non-virtual attribute projection for a
/// single row.
fn project_row(def: &QueryDefinition, driver_row: &DriverRow) -> Row {
    let mut row = Row::new();
    for (column, value) in &driver_row.columns {
        row.put_raw(column.clone(), value.clone());
    }
    for (name, attr) in &def.attributes {
        if attr.is_virtual {
            continue;
        }
        if let Some(value) = row.get_raw(&attr.alias_name) {
            row.set_attribute(name.clone(), value.clone());
        }
    }
    row
}

fn run_simple_calculators(def: &QueryDefinition, ctx: &QueryContext, rows: &mut [Row]) {
    for (name, attr) in &def.attributes {
        let Some(Calculator::Simple(calc)) = &attr.calculator else { continue };
        for row in rows.iter_mut() {
            let value = invoke_calculator(name, || calc(row, ctx));
            row.set_attribute(name.clone(), value);
        }
    }
}

/// Run a calculator, catching a panicking calculator body the way the
/// spec's "on exception, log and set null" degrades a failed virtual
/// attribute rather than failing the whole row.
fn invoke_calculator<F>(attribute: &str, f: F) -> crate::value::Value
where
    F: FnOnce() -> crate::value::Value,
{
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(value) => value,
        Err(_) => {
            warn!(attribute, "virtual attribute calculator panicked, degrading to null");
            crate::value::Value::Null
        }
    }
}

/// Aggregate calculators see every already-mapped row in the result
/// set; invoked in a second pass after the simple calculators have run
/// so aggregate attributes may reference simple virtual attributes.
fn run_aggregate_calculators(def: &QueryDefinition, ctx: &QueryContext, rows: &mut Vec<Row>) {
    let aggregate_attrs: Vec<&str> = def
        .attributes
        .iter()
        .filter_map(|(name, attr)| match &attr.calculator {
            Some(Calculator::Aggregate(_)) => Some(name.as_str()),
            _ => None,
        })
        .collect();
    if aggregate_attrs.is_empty() {
        return;
    }
    let snapshot = rows.clone();
    for name in aggregate_attrs {
        let Some(Calculator::Aggregate(calc)) = def.attribute(name).and_then(|a| a.calculator.as_ref()) else {
            continue;
        };
        for row in rows.iter_mut() {
            let value = invoke_calculator(name, || calc(row, &snapshot, ctx));
            row.set_attribute(name.to_string(), value);
        }
    }
}

fn apply_formatters(def: &QueryDefinition, rows: &mut [Row]) {
    for (name, attr) in &def.attributes {
        let Some(formatter) = &attr.formatter else { continue };
        for row in rows.iter_mut() {
            if let Some(current) = row.get(name) {
                let formatted = (formatter.0)(current);
                row.set_attribute(name.clone(), formatted);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::AttributeDef;
    use crate::types::AttrType;
    use crate::value::Value;

    fn sample_def() -> QueryDefinition {
        QueryDefinition::builder("emps")
            .sql("SELECT emp_id, first_name FROM emp WHERE 1=1")
            .attribute(AttributeDef::new("empId", AttrType::Long).alias("emp_id"))
            .attribute(AttributeDef::new("firstName", AttrType::String).alias("first_name"))
            .build()
            .unwrap()
    }

    fn driver_row(pairs: &[(&str, Value)]) -> DriverRow {
        DriverRow { columns: pairs.iter().map(|(k, v)| (k.to_ascii_uppercase(), v.clone())).collect() }
    }

    #[test]
    fn projects_non_virtual_attributes_from_raw_columns() {
        let def = sample_def();
        let ctx = QueryContext::new("emps");
        let rows = map_rows(
            &def,
            &ctx,
            vec![driver_row(&[("emp_id", Value::Long(1)), ("first_name", Value::Text("Ada".into()))])],
        );
        assert_eq!(rows[0].get("empId"), Some(&Value::Long(1)));
        assert_eq!(rows[0].get("firstName"), Some(&Value::Text("Ada".into())));
    }

    #[test]
    fn virtual_attribute_never_reads_from_raw_columns_directly() {
        use crate::processors::Calculator;
        let def = QueryDefinition::builder("emps_full")
            .sql("SELECT emp_id, last_name FROM emp WHERE 1=1")
            .attribute(AttributeDef::new("lastName", AttrType::String).alias("last_name"))
            .attribute(
                AttributeDef::new("fullName", AttrType::String)
                    .virtual_with(Calculator::simple(|row, _| {
                        let last = row.get_raw("LAST_NAME").and_then(|v| v.as_text()).unwrap_or_default();
                        Value::Text(format!("Dr. {last}"))
                    }))
                    .sort_property("lastName"),
            )
            .build()
            .unwrap();
        let ctx = QueryContext::new("emps_full");
        let rows = map_rows(&def, &ctx, vec![driver_row(&[("last_name", Value::Text("Lovelace".into()))])]);
        assert_eq!(rows[0].get("fullName"), Some(&Value::Text("Dr. Lovelace".into())));
    }

    #[test]
    fn aggregate_calculator_sees_every_mapped_row() {
        use crate::processors::Calculator;
        let def = QueryDefinition::builder("emps_rank")
            .sql("SELECT emp_id, salary FROM emp WHERE 1=1")
            .attribute(AttributeDef::new("empId", AttrType::Long).alias("emp_id"))
            .attribute(AttributeDef::new("salary", AttrType::Long).alias("salary"))
            .attribute(
                AttributeDef::new("isTopPaid", AttrType::Boolean)
                    .virtual_with(Calculator::aggregate(|row, all, _| {
                        let this = row.get("salary").and_then(|v| match v {
                            Value::Long(l) => Some(*l),
                            _ => None,
                        });
                        let max = all
                            .iter()
                            .filter_map(|r| match r.get("salary") {
                                Some(Value::Long(l)) => Some(*l),
                                _ => None,
                            })
                            .max();
                        Value::Boolean(this.is_some() && this == max)
                    })),
            )
            .build()
            .unwrap();
        let ctx = QueryContext::new("emps_rank");
        let rows = map_rows(
            &def,
            &ctx,
            vec![
                driver_row(&[("emp_id", Value::Long(1)), ("salary", Value::Long(1000))]),
                driver_row(&[("emp_id", Value::Long(2)), ("salary", Value::Long(5000))]),
            ],
        );
        assert_eq!(rows[0].get("isTopPaid"), Some(&Value::Boolean(false)));
        assert_eq!(rows[1].get("isTopPaid"), Some(&Value::Boolean(true)));
    }
}
