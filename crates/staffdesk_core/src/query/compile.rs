//! Descriptor to SQL compilation.
//!
//! # Invariants
//! - Identifiers in the SQL text come only from `schema` allow-lists.
//! - Every literal is emitted as a `?` placeholder with a bound value.

use super::parser::{AggregateFn, CompareOp, Expr, Literal, QueryDescriptor, SelectItem};
use super::schema::{Column, ColumnKind, QueryEntity};
use super::{QueryError, QueryResult};
use rusqlite::types::Value;

/// Parameterized statement ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<Value>,
    /// Output columns in select order.
    pub columns: Vec<OutputColumn>,
    /// Single aggregate without grouping; the result is one raw value.
    pub scalar: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumn {
    pub label: String,
    pub kind: ColumnKind,
}

pub fn compile(descriptor: &QueryDescriptor) -> QueryResult<CompiledQuery> {
    let entity = descriptor.entity;
    let mut params = Vec::new();

    let group_column = descriptor
        .group_by
        .as_deref()
        .map(|field| resolve(entity, field))
        .transpose()?;

    let (select_sql, columns) = compile_projection(entity, &descriptor.projection, group_column)?;
    let mut sql = format!("SELECT {select_sql} FROM \"{}\"", entity.table());

    if let Some(filter) = descriptor.filter.as_ref() {
        let where_sql = compile_expr(entity, filter, &mut params)?;
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
    }

    if let Some(column) = group_column {
        sql.push_str(&format!(" GROUP BY \"{}\"", column.name));
    }

    if let Some(order_by) = descriptor.order_by.as_ref() {
        let column = resolve(entity, &order_by.field)?;
        let direction = if order_by.descending { "DESC" } else { "ASC" };
        sql.push_str(&format!(" ORDER BY \"{}\" {direction}", column.name));
    }

    if let Some(limit) = descriptor.limit {
        sql.push_str(" LIMIT ?");
        params.push(Value::Integer(i64::from(limit)));
    }

    let scalar = group_column.is_none()
        && matches!(descriptor.projection.as_slice(), [SelectItem::Aggregate { .. }]);

    Ok(CompiledQuery {
        sql,
        params,
        columns,
        scalar,
    })
}

fn compile_projection(
    entity: QueryEntity,
    projection: &[SelectItem],
    group_column: Option<&'static Column>,
) -> QueryResult<(String, Vec<OutputColumn>)> {
    if projection.is_empty() {
        if group_column.is_some() {
            return Err(QueryError::Invalid(
                "group by requires an explicit select list".to_string(),
            ));
        }
        let columns: Vec<OutputColumn> = entity
            .columns()
            .iter()
            .map(|column| OutputColumn {
                label: column.name.to_string(),
                kind: column.kind,
            })
            .collect();
        let sql = quoted_list(columns.iter().map(|column| column.label.as_str()));
        return Ok((sql, columns));
    }

    let has_aggregate = projection
        .iter()
        .any(|item| matches!(item, SelectItem::Aggregate { .. }));

    let mut parts = Vec::with_capacity(projection.len());
    let mut columns = Vec::with_capacity(projection.len());
    for item in projection {
        match item {
            SelectItem::Field(field) => {
                let column = resolve(entity, field)?;
                if has_aggregate && group_column.map(|g| g.name) != Some(column.name) {
                    return Err(QueryError::Invalid(format!(
                        "field `{}` must be the group by field when aggregates are selected",
                        column.name
                    )));
                }
                parts.push(format!("\"{}\"", column.name));
                columns.push(OutputColumn {
                    label: column.name.to_string(),
                    kind: column.kind,
                });
            }
            SelectItem::Aggregate { func, field } => {
                let column = field
                    .as_deref()
                    .map(|field| resolve(entity, field))
                    .transpose()?;
                let (expr, label, kind) = aggregate_sql(*func, column)?;
                parts.push(format!("{expr} AS \"{label}\""));
                columns.push(OutputColumn { label, kind });
            }
        }
    }

    Ok((parts.join(", "), columns))
}

fn aggregate_sql(
    func: AggregateFn,
    column: Option<&'static Column>,
) -> QueryResult<(String, String, ColumnKind)> {
    let Some(column) = column else {
        if func != AggregateFn::Count {
            return Err(QueryError::Invalid(format!(
                "{}(*) is not supported; name a field",
                func.name()
            )));
        }
        return Ok(("COUNT(*)".to_string(), "count(*)".to_string(), ColumnKind::Integer));
    };

    let numeric = matches!(column.kind, ColumnKind::Integer | ColumnKind::Decimal);
    let kind = match func {
        AggregateFn::Count => ColumnKind::Integer,
        AggregateFn::Sum | AggregateFn::Avg if !numeric => {
            return Err(QueryError::Invalid(format!(
                "{}() needs a numeric field, `{}` is not numeric",
                func.name(),
                column.name
            )))
        }
        AggregateFn::Sum | AggregateFn::Avg => ColumnKind::Decimal,
        AggregateFn::Min | AggregateFn::Max => column.kind,
    };

    let expr = format!("{}(\"{}\")", func.name().to_ascii_uppercase(), column.name);
    let label = format!("{}({})", func.name(), column.name);
    Ok((expr, label, kind))
}

fn compile_expr(entity: QueryEntity, expr: &Expr, params: &mut Vec<Value>) -> QueryResult<String> {
    match expr {
        Expr::And(operands) => compile_chain(entity, operands, " AND ", params),
        Expr::Or(operands) => compile_chain(entity, operands, " OR ", params),
        Expr::Not(inner) => Ok(format!("(NOT {})", compile_expr(entity, inner, params)?)),
        Expr::Compare { field, op, value } => {
            let column = resolve(entity, field)?;
            if *op == CompareOp::Like && !matches!(value, Literal::Text(_)) {
                return Err(QueryError::Invalid(format!(
                    "like on `{}` needs a quoted pattern",
                    column.name
                )));
            }
            params.push(bind(column, value)?);
            Ok(format!("\"{}\" {} ?", column.name, op.sql()))
        }
        Expr::IsNull { field, negated } => {
            let column = resolve(entity, field)?;
            let keyword = if *negated { "IS NOT NULL" } else { "IS NULL" };
            Ok(format!("\"{}\" {keyword}", column.name))
        }
        Expr::InList {
            field,
            values,
            negated,
        } => {
            let column = resolve(entity, field)?;
            for value in values {
                params.push(bind(column, value)?);
            }
            let placeholders = vec!["?"; values.len()].join(", ");
            let keyword = if *negated { "NOT IN" } else { "IN" };
            Ok(format!("\"{}\" {keyword} ({placeholders})", column.name))
        }
        Expr::Between { field, low, high } => {
            let column = resolve(entity, field)?;
            params.push(bind(column, low)?);
            params.push(bind(column, high)?);
            Ok(format!("\"{}\" BETWEEN ? AND ?", column.name))
        }
    }
}

fn compile_chain(
    entity: QueryEntity,
    operands: &[Expr],
    joiner: &str,
    params: &mut Vec<Value>,
) -> QueryResult<String> {
    let parts = operands
        .iter()
        .map(|operand| compile_expr(entity, operand, params))
        .collect::<QueryResult<Vec<_>>>()?;
    Ok(format!("({})", parts.join(joiner)))
}

fn resolve(entity: QueryEntity, field: &str) -> QueryResult<&'static Column> {
    entity.column(field).ok_or_else(|| QueryError::UnknownField {
        entity: entity.table(),
        field: field.to_string(),
    })
}

/// Converts a literal into a bound value compatible with `column`.
fn bind(column: &Column, literal: &Literal) -> QueryResult<Value> {
    let mismatch = || {
        QueryError::Invalid(format!(
            "value {literal:?} does not match field `{}`",
            column.name
        ))
    };

    match (column.kind, literal) {
        (ColumnKind::Bool, Literal::Bool(value)) => Ok(Value::Integer(i64::from(*value))),
        (ColumnKind::Bool, Literal::Integer(value @ (0 | 1))) => Ok(Value::Integer(*value)),
        (ColumnKind::Bool, _) | (_, Literal::Bool(_)) => Err(mismatch()),
        (ColumnKind::Date, Literal::Date(date)) => Ok(Value::Text(date.format("%Y-%m-%d").to_string())),
        (ColumnKind::Date, Literal::Text(text)) => Ok(Value::Text(text.clone())),
        (ColumnKind::Date, _) | (_, Literal::Date(_)) => Err(mismatch()),
        (_, Literal::Integer(value)) => Ok(Value::Integer(*value)),
        (_, Literal::Decimal(value)) => Ok(Value::Real(*value)),
        (_, Literal::Text(text)) => Ok(Value::Text(text.clone())),
    }
}

fn quoted_list<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::compile;
    use crate::query::parser::parse_query;
    use crate::query::QueryError;
    use chrono::NaiveDate;
    use rusqlite::types::Value;

    fn compile_text(text: &str) -> Result<super::CompiledQuery, QueryError> {
        let today = NaiveDate::from_ymd_opt(2024, 1, 15).expect("valid date");
        compile(&parse_query(text, today)?)
    }

    #[test]
    fn literals_become_bound_parameters() {
        let compiled = compile_text("employees where name = 'x'' OR 1=1 --' and active = true")
            .expect("compiles");
        assert_eq!(
            compiled.sql,
            "SELECT \"id\", \"name\", \"age\", \"email\", \"salary\", \"bonus\", \"hire_date\", \"active\", \"gender\", \"dep_id\", \"manager_id\" FROM \"employees\" WHERE (\"name\" = ? AND \"active\" = ?)"
        );
        assert_eq!(
            compiled.params,
            vec![Value::Text("x' OR 1=1 --".to_string()), Value::Integer(1)]
        );
        assert!(!compiled.scalar);
    }

    #[test]
    fn single_aggregate_without_group_is_scalar() {
        let compiled = compile_text("departments select sum(budget)").expect("compiles");
        assert_eq!(
            compiled.sql,
            "SELECT SUM(\"budget\") AS \"sum(budget)\" FROM \"departments\""
        );
        assert!(compiled.scalar);
    }

    #[test]
    fn grouped_aggregate_is_tabular() {
        let compiled = compile_text(
            "employees select dep_id, count(*) group by dep_id order by dep_id limit 10",
        )
        .expect("compiles");
        assert_eq!(
            compiled.sql,
            "SELECT \"dep_id\", COUNT(*) AS \"count(*)\" FROM \"employees\" GROUP BY \"dep_id\" ORDER BY \"dep_id\" ASC LIMIT ?"
        );
        assert_eq!(compiled.params, vec![Value::Integer(10)]);
        assert!(!compiled.scalar);
    }

    #[test]
    fn rejects_unknown_fields_and_type_mismatches() {
        assert!(matches!(
            compile_text("roles where budget > 3"),
            Err(QueryError::UnknownField { .. })
        ));
        assert!(matches!(
            compile_text("employees where age = true"),
            Err(QueryError::Invalid(_))
        ));
        assert!(matches!(
            compile_text("employees select name, count(*)"),
            Err(QueryError::Invalid(_))
        ));
        assert!(matches!(
            compile_text("employees select sum(name)"),
            Err(QueryError::Invalid(_))
        ));
    }

    #[test]
    fn date_helpers_bind_iso_text() {
        let compiled =
            compile_text("employees where hire_date >= days_ago(14)").expect("compiles");
        assert_eq!(compiled.params, vec![Value::Text("2024-01-01".to_string())]);
    }

    #[test]
    fn chains_join_in_one_group() {
        let compiled = compile_text(
            "departments where id = 1 or id = 2 or (name = 'IT' and not budget < 10)",
        )
        .expect("compiles");
        assert!(compiled.sql.ends_with(
            "WHERE (\"id\" = ? OR \"id\" = ? OR (\"name\" = ? AND (NOT \"budget\" < ?)))"
        ));
        assert_eq!(compiled.params.len(), 4);
    }
}
