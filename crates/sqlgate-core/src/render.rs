//! Deterministic rendering of a [`QuerySpec`] into T-SQL text.
//!
//! The renderer is a pure function of the representation: fixed clause
//! order, explicit `INNER JOIN ... ON` syntax, and the OFFSET/FETCH paging
//! idiom. It emits no comments and exactly one statement, so its output is
//! shaped to pass the validator whenever the representation's tables are
//! allowlisted.

use std::fmt::Write;

use crate::error::SpecError;
use crate::types::{Connector, JoinKind, QuerySpec, TableRef};

/// Renders the representation to T-SQL.
///
/// Runs [`QuerySpec::check`] first; structurally invalid specs never
/// produce SQL text.
pub fn render(spec: &QuerySpec) -> Result<String, SpecError> {
    spec.check()?;

    let mut sql = String::new();

    write_select(&mut sql, spec);
    write_from(&mut sql, spec)?;
    write_where(&mut sql, spec);
    write_group_by(&mut sql, spec);
    write_order_by(&mut sql, spec);

    write!(
        sql,
        "\nOFFSET {} ROWS\nFETCH NEXT {} ROWS ONLY;",
        spec.paging.offset, spec.paging.fetch
    )
    .expect("writing to String cannot fail");

    Ok(sql)
}

fn write_select(sql: &mut String, spec: &QuerySpec) {
    sql.push_str("SELECT ");
    for (index, column) in spec.columns.iter().enumerate() {
        if index > 0 {
            sql.push_str(", ");
        }
        let base = column.to_string();
        match column.aggregate {
            Some(agg) => {
                sql.push_str(agg.as_str());
                sql.push('(');
                sql.push_str(&base);
                sql.push(')');
            }
            None => sql.push_str(&base),
        }
        if let Some(alias) = &column.alias {
            sql.push_str(" AS ");
            sql.push_str(alias);
        }
    }
}

fn write_from(sql: &mut String, spec: &QuerySpec) -> Result<(), SpecError> {
    sql.push_str("\nFROM ");
    write_table(sql, &spec.tables[0]);

    // Tables joined explicitly come out as JOIN clauses; any leftovers are
    // appended to FROM as additional comma sources.
    let mut joined: Vec<&str> = vec![spec.tables[0].reference_name()];

    for join in &spec.joins {
        let right = spec
            .tables
            .iter()
            .find(|t| t.reference_name() == join.right_table)
            .ok_or_else(|| SpecError::UnknownAlias {
                alias: join.right_table.clone(),
                context: "join",
            })?;
        joined.push(right.reference_name());

        sql.push('\n');
        sql.push_str(join.kind.as_str());
        sql.push_str(" JOIN ");
        write_table(sql, right);
        if join.kind != JoinKind::Cross {
            write!(
                sql,
                " ON {}.{} = {}.{}",
                join.left_table, join.left_column, join.right_table, join.right_column
            )
            .expect("writing to String cannot fail");
        }
    }

    for table in &spec.tables[1..] {
        if !joined.contains(&table.reference_name()) {
            sql.push_str(", ");
            write_table(sql, table);
        }
    }

    Ok(())
}

fn write_table(sql: &mut String, table: &TableRef) {
    sql.push_str(&table.name);
    if let Some(alias) = &table.alias {
        sql.push_str(" AS ");
        sql.push_str(alias);
    }
}

fn write_where(sql: &mut String, spec: &QuerySpec) {
    for (index, filter) in spec.filters.iter().enumerate() {
        if index == 0 {
            sql.push_str("\nWHERE ");
        } else {
            sql.push_str(match filter.connector {
                Connector::And => " AND ",
                Connector::Or => " OR ",
            });
        }
        write!(
            sql,
            "{} {} {}",
            filter.column,
            filter.op.as_sql(),
            literal(&filter.value)
        )
        .expect("writing to String cannot fail");
    }
}

fn write_group_by(sql: &mut String, spec: &QuerySpec) {
    if !spec.is_aggregated() {
        return;
    }
    // Every non-aggregated projection column becomes a grouping key, in
    // projection order, so rendered aggregates always satisfy the
    // aggregation-consistency check.
    let keys: Vec<String> = spec
        .columns
        .iter()
        .filter(|c| c.aggregate.is_none())
        .map(ToString::to_string)
        .collect();
    if keys.is_empty() {
        return;
    }
    sql.push_str("\nGROUP BY ");
    sql.push_str(&keys.join(", "));
}

fn write_order_by(sql: &mut String, spec: &QuerySpec) {
    sql.push_str("\nORDER BY ");
    for (index, key) in spec.order_by.iter().enumerate() {
        if index > 0 {
            sql.push_str(", ");
        }
        sql.push_str(&key.column);
        sql.push(' ');
        sql.push_str(key.direction.as_str());
    }
}

fn literal(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.parse::<f64>().is_ok() {
        trimmed.to_string()
    } else {
        format!("'{}'", trimmed.replace('\'', "''"))
    }
}
