//! The structured query representation emitted by the candidate generator.
//!
//! A [`QuerySpec`] is a closed intermediate form: the generator fills in
//! tables, columns, joins, filters, sort keys, and paging, and the renderer
//! turns it into T-SQL deterministically. Free-text SQL never crosses the
//! generator boundary, which removes most syntax-level hallucination before
//! the validator even runs.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::SpecError;

/// A table or view reference in the FROM clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableRef {
    /// Fully-qualified `schema.table` name.
    pub name: String,
    /// Alias unique within the query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl TableRef {
    /// Name other clauses use to refer to this table: the alias when
    /// present, otherwise the qualified name.
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Aggregate functions the representation admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFn {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
            Self::Min => "MIN",
            Self::Max => "MAX",
        }
    }
}

/// A projected column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ColumnRef {
    /// Alias of the source table; required when more than one table is in
    /// scope, optional for single-table queries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// Column name.
    pub name: String,
    /// Output alias (`AS ...`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Aggregate applied to the column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<AggregateFn>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "INNER",
            Self::Left => "LEFT",
            Self::Right => "RIGHT",
            Self::Full => "FULL",
            Self::Cross => "CROSS",
        }
    }
}

/// An equi-join between two declared aliases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JoinSpec {
    pub kind: JoinKind,
    pub left_table: String,
    pub left_column: String,
    pub right_table: String,
    pub right_column: String,
}

/// Comparison operators the representation admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    Like,
}

impl FilterOp {
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Like => "LIKE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Connector {
    #[default]
    And,
    Or,
}

/// A WHERE predicate. The first predicate's connector is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterPredicate {
    /// Column, optionally alias-qualified (`p.Color`).
    pub column: String,
    pub op: FilterOp,
    /// Literal value; numeric-looking values render bare, everything else
    /// renders as a quoted string literal.
    pub value: String,
    #[serde(default)]
    pub connector: Connector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// One ORDER BY key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SortKey {
    /// Column, optionally alias-qualified (`p.ProductID`).
    pub column: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// OFFSET/FETCH paging. A fetch size is always required; unbounded result
/// sets are not expressible in this representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Paging {
    pub offset: u64,
    pub fetch: u32,
}

/// The complete query representation.
///
/// Invariant, checked by [`QuerySpec::check`] before any rendering: every
/// alias referenced by columns, joins, filters, or sort keys is declared in
/// `tables`, aliases are unique, and paging carries a non-zero fetch with at
/// least one sort key to anchor it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuerySpec {
    pub tables: Vec<TableRef>,
    pub columns: Vec<ColumnRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub joins: Vec<JoinSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<FilterPredicate>,
    pub order_by: Vec<SortKey>,
    pub paging: Paging,
}

impl QuerySpec {
    /// Verifies the structural invariants. Rejected specs never reach the
    /// renderer.
    pub fn check(&self) -> Result<(), SpecError> {
        if self.tables.is_empty() {
            return Err(SpecError::NoTables);
        }
        if self.columns.is_empty() {
            return Err(SpecError::NoColumns);
        }
        if self.order_by.is_empty() {
            return Err(SpecError::MissingOrderBy);
        }
        if self.paging.fetch == 0 {
            return Err(SpecError::ZeroFetch);
        }

        let mut declared = BTreeSet::new();
        for table in &self.tables {
            if !declared.insert(table.reference_name().to_string()) {
                return Err(SpecError::DuplicateAlias(
                    table.reference_name().to_string(),
                ));
            }
        }

        for column in &self.columns {
            if let Some(alias) = &column.table {
                self.require_declared(&declared, alias, "column projection")?;
            }
        }
        for join in &self.joins {
            self.require_declared(&declared, &join.left_table, "join")?;
            self.require_declared(&declared, &join.right_table, "join")?;
        }
        for filter in &self.filters {
            if let Some(alias) = qualifier(&filter.column) {
                self.require_declared(&declared, alias, "filter")?;
            }
        }
        for key in &self.order_by {
            if let Some(alias) = qualifier(&key.column) {
                self.require_declared(&declared, alias, "order by")?;
            }
        }

        Ok(())
    }

    /// True when any projected column carries an aggregate.
    pub fn is_aggregated(&self) -> bool {
        self.columns.iter().any(|c| c.aggregate.is_some())
    }

    fn require_declared(
        &self,
        declared: &BTreeSet<String>,
        alias: &str,
        context: &'static str,
    ) -> Result<(), SpecError> {
        if declared.contains(alias) {
            Ok(())
        } else {
            Err(SpecError::UnknownAlias {
                alias: alias.to_string(),
                context,
            })
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{table}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// Alias portion of a possibly-qualified column reference.
pub(crate) fn qualifier(column: &str) -> Option<&str> {
    column.split_once('.').map(|(alias, _)| alias)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> QuerySpec {
        QuerySpec {
            tables: vec![TableRef {
                name: "Production.Product".into(),
                alias: Some("p".into()),
            }],
            columns: vec![ColumnRef {
                table: Some("p".into()),
                name: "ProductID".into(),
                alias: None,
                aggregate: None,
            }],
            joins: vec![],
            filters: vec![],
            order_by: vec![SortKey {
                column: "p.ProductID".into(),
                direction: SortDirection::Asc,
            }],
            paging: Paging {
                offset: 0,
                fetch: 20,
            },
        }
    }

    #[test]
    fn valid_spec_passes() {
        assert!(spec().check().is_ok());
    }

    #[test]
    fn undeclared_column_alias_is_rejected() {
        let mut s = spec();
        s.columns[0].table = Some("x".into());
        assert!(matches!(
            s.check(),
            Err(SpecError::UnknownAlias { alias, .. }) if alias == "x"
        ));
    }

    #[test]
    fn undeclared_order_by_qualifier_is_rejected() {
        let mut s = spec();
        s.order_by[0].column = "q.ProductID".into();
        assert!(s.check().is_err());
    }

    #[test]
    fn duplicate_alias_is_rejected() {
        let mut s = spec();
        s.tables.push(TableRef {
            name: "Sales.Customer".into(),
            alias: Some("p".into()),
        });
        assert!(matches!(s.check(), Err(SpecError::DuplicateAlias(a)) if a == "p"));
    }

    #[test]
    fn zero_fetch_is_rejected() {
        let mut s = spec();
        s.paging.fetch = 0;
        assert!(matches!(s.check(), Err(SpecError::ZeroFetch)));
    }

    #[test]
    fn empty_order_by_is_rejected() {
        let mut s = spec();
        s.order_by.clear();
        assert!(matches!(s.check(), Err(SpecError::MissingOrderBy)));
    }

    #[test]
    fn deserializes_generator_output() {
        let json = r#"{
            "tables": [{"name": "Production.Product", "alias": "p"}],
            "columns": [{"table": "p", "name": "Name"}],
            "orderBy": [{"column": "p.ProductID", "direction": "ASC"}],
            "paging": {"offset": 0, "fetch": 20}
        }"#;
        let spec: QuerySpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.tables[0].reference_name(), "p");
        assert!(spec.check().is_ok());
    }
}
