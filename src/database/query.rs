//! SQL rendering for `find_many`
//!
//! Position-after-cursor is expressed with row numbers over the effective
//! order: the page starts `skip` rows after the first row whose cursor column
//! equals the cursor value. `rowid` breaks ties so equal keys keep insertion
//! order. Values are inlined as escaped literals; the cursor literal is cast
//! to the column's declared type.

use super::engine::TableColumn;
use crate::delegate::is_operator_object;
use crate::error::{Error, Result};
use crate::pagination::FindManyArgs;
use crate::types::{JsonObject, OrderBy};
use serde_json::Value;

/// Quote an identifier (`a"b` -> `"a""b"`)
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Render a scalar JSON value as a SQL literal
pub fn sql_literal(value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Bool(b) => Ok(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(format!("'{}'", s.replace('\'', "''"))),
        other => Err(Error::invalid_argument(
            "where",
            format!("cannot compare against {other}"),
        )),
    }
}

/// Render the full `find_many` query for `table`
pub fn build_find_many(table: &str, table_columns: &[TableColumn], args: &FindManyArgs) -> Result<String> {
    let names: Vec<String> = table_columns.iter().map(|c| c.name.clone()).collect();
    let columns = names.as_slice();
    let cols = columns
        .iter()
        .map(|c| quote_ident(c))
        .collect::<Vec<_>>()
        .join(", ");
    let order = order_clause(&args.order_by, columns)?;

    let filter = match args.filter() {
        Some(filter) => where_clause(filter, columns)?,
        None => "TRUE".to_string(),
    };

    let mut sql = format!(
        "WITH filtered AS (SELECT {cols}, rowid AS __rid FROM {} WHERE {filter})",
        quote_ident(table)
    );

    let distinct = args.distinct();
    let source = if distinct.is_empty() {
        "filtered"
    } else {
        let keys = distinct
            .iter()
            .map(|field| column(field, columns, "distinct"))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        // first row of each group in the effective order
        sql.push_str(&format!(
            ", deduped AS (SELECT * FROM filtered QUALIFY ROW_NUMBER() OVER (PARTITION BY {keys} ORDER BY {order}) = 1)"
        ));
        "deduped"
    };

    sql.push_str(&format!(
        ", ordered AS (SELECT {cols}, ROW_NUMBER() OVER (ORDER BY {order}) AS __row FROM {source})"
    ));

    let start = match &args.cursor {
        Some(cursor) => {
            let anchor = cursor_anchor(&cursor.field, &cursor.value, table_columns)?;
            // an unknown cursor makes the bound NULL, so nothing matches
            format!(
                "__row >= (SELECT MIN(__row) FROM ordered WHERE {anchor}) + {}",
                args.skip
            )
        }
        None => format!("__row > {}", args.skip),
    };

    sql.push_str(&format!(
        " SELECT {cols} FROM ordered WHERE {start} ORDER BY __row LIMIT {}",
        args.take
    ));
    Ok(sql)
}

/// Predicate matching the cursor record
///
/// Records carry blobs as base64 text and decimals and timestamps as strings,
/// so the literal is converted back before comparing.
fn cursor_anchor(field: &str, value: &Value, table_columns: &[TableColumn]) -> Result<String> {
    let Some(col) = table_columns.iter().find(|c| c.name == field) else {
        return Err(Error::invalid_argument(
            "cursor",
            format!("unknown field '{field}'"),
        ));
    };
    let ident = quote_ident(&col.name);
    if value.is_null() {
        return Ok(format!("{ident} IS NULL"));
    }

    let literal = sql_literal(value)?;
    if col.data_type.eq_ignore_ascii_case("BLOB") {
        Ok(format!("{ident} = from_base64({literal})"))
    } else {
        Ok(format!("{ident} = CAST({literal} AS {})", col.data_type))
    }
}

fn column(field: &str, columns: &[String], argument: &str) -> Result<String> {
    if columns.iter().any(|c| c == field) {
        Ok(quote_ident(field))
    } else {
        Err(Error::invalid_argument(
            argument,
            format!("unknown field '{field}'"),
        ))
    }
}

/// Null sorts lowest in both directions, matching the in-memory ordering
fn order_clause(order_by: &OrderBy, columns: &[String]) -> Result<String> {
    let mut parts = Vec::with_capacity(order_by.len() + 1);
    for entry in order_by {
        let field = column(&entry.field, columns, "orderBy")?;
        let nulls = if entry.order.is_desc() { "NULLS LAST" } else { "NULLS FIRST" };
        parts.push(format!("{field} {} {nulls}", entry.order.as_sql()));
    }
    parts.push("__rid".to_string());
    Ok(parts.join(", "))
}

fn where_list(value: &Value) -> Result<Vec<&JsonObject>> {
    match value {
        Value::Object(map) => Ok(vec![map]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_object().ok_or_else(|| {
                    Error::invalid_argument("where", format!("expected an object, got {item}"))
                })
            })
            .collect(),
        other => Err(Error::invalid_argument(
            "where",
            format!("expected an object or array, got {other}"),
        )),
    }
}

fn combine(
    subs: &[&JsonObject],
    columns: &[String],
    joiner: &str,
    empty: &str,
) -> Result<String> {
    if subs.is_empty() {
        return Ok(empty.to_string());
    }
    let parts = subs
        .iter()
        .map(|sub| where_clause(sub, columns))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("({})", parts.join(joiner)))
}

/// Render a `where` filter as a SQL condition
pub fn where_clause(filter: &JsonObject, columns: &[String]) -> Result<String> {
    let mut parts = Vec::with_capacity(filter.len());
    for (key, condition) in filter {
        let part = match key.as_str() {
            "AND" => combine(&where_list(condition)?, columns, " AND ", "TRUE")?,
            "OR" => combine(&where_list(condition)?, columns, " OR ", "FALSE")?,
            "NOT" => format!(
                "NOT COALESCE({}, FALSE)",
                combine(&where_list(condition)?, columns, " OR ", "FALSE")?
            ),
            field => {
                let col = column(field, columns, "where")?;
                if is_operator_object(condition) {
                    operators_clause(&col, condition)?
                } else {
                    equals(&col, condition)?
                }
            }
        };
        parts.push(part);
    }

    if parts.is_empty() {
        Ok("TRUE".to_string())
    } else {
        Ok(format!("({})", parts.join(" AND ")))
    }
}

fn equals(col: &str, value: &Value) -> Result<String> {
    if value.is_null() {
        Ok(format!("{col} IS NULL"))
    } else {
        Ok(format!("{col} = {}", sql_literal(value)?))
    }
}

fn operators_clause(col: &str, operators: &Value) -> Result<String> {
    let Value::Object(operators) = operators else {
        return equals(col, operators);
    };

    let mut parts = Vec::with_capacity(operators.len());
    for (op, operand) in operators {
        let part = match op.as_str() {
            "equals" => equals(col, operand)?,
            "not" => {
                if is_operator_object(operand) {
                    format!("NOT COALESCE({}, FALSE)", operators_clause(col, operand)?)
                } else if operand.is_null() {
                    format!("{col} IS NOT NULL")
                } else {
                    format!("{col} IS DISTINCT FROM {}", sql_literal(operand)?)
                }
            }
            "in" | "notIn" => {
                let items = operand.as_array().ok_or_else(|| {
                    Error::invalid_argument("where", format!("'{op}' expects an array"))
                })?;
                let list = if items.is_empty() {
                    "FALSE".to_string()
                } else {
                    let matches = items
                        .iter()
                        .map(|item| equals(col, item))
                        .collect::<Result<Vec<_>>>()?;
                    format!("COALESCE(({}), FALSE)", matches.join(" OR "))
                };
                if op == "in" {
                    list
                } else {
                    format!("NOT {list}")
                }
            }
            "lt" | "lte" | "gt" | "gte" => {
                let cmp = match op.as_str() {
                    "lt" => "<",
                    "lte" => "<=",
                    "gt" => ">",
                    _ => ">=",
                };
                format!("{col} {cmp} {}", sql_literal(operand)?)
            }
            "contains" | "startsWith" | "endsWith" => {
                let Some(needle) = operand.as_str() else {
                    return Err(Error::invalid_argument(
                        "where",
                        format!("'{op}' expects a string"),
                    ));
                };
                let func = match op.as_str() {
                    "contains" => "contains",
                    "startsWith" => "starts_with",
                    _ => "ends_with",
                };
                format!(
                    "{func}(CAST({col} AS VARCHAR), {})",
                    sql_literal(&Value::String(needle.to_string()))?
                )
            }
            other => {
                return Err(Error::invalid_argument(
                    "where",
                    format!("unsupported operator '{other}'"),
                ))
            }
        };
        parts.push(part);
    }

    Ok(format!("({})", parts.join(" AND ")))
}
