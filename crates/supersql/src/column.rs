//! Column references and the operators applied to them.
//!
//! A [`Column`] carries at most one pending operation. Applying an operator
//! replaces whatever was pending before (last operator wins):
//!
//! ```ignore
//! let users = Table::new("users");
//! let adult = users.col("age").gte(18);          // age >= ?, argument 18
//! let newest = users.col("created_at").desc();   // created_at DESC
//! let join = users.col("id").eq_column(&orders.col("user_id"));
//! ```

use crate::error::{SqlError, SqlResult};
use crate::table::TableRef;
use crate::value::Value;
use std::fmt;

/// Sort direction of an ordering column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub fn keyword(self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Operation {
    /// `<column> <symbol> <argument>`
    Binary { symbol: String, argument: Value },
    /// `<column> ASC|DESC`
    Order(Order),
}

/// A reference to a single column, optionally owned by a [`Table`](crate::Table).
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    table: Option<TableRef>,
    alias: Option<String>,
    operation: Option<Operation>,
    parameterize: bool,
}

impl Column {
    /// A free-standing column, not attached to any table.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: None,
            alias: None,
            operation: None,
            parameterize: true,
        }
    }

    pub(crate) fn with_table(name: impl Into<String>, table: TableRef) -> Self {
        Self {
            table: Some(table),
            ..Self::new(name)
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display name used in column lists (`AS alias`).
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Whether operators render a placeholder (default) or inline the literal.
    pub fn parameterize(mut self, parameterize: bool) -> Self {
        self.parameterize = parameterize;
        self
    }

    pub fn is_parameterized(&self) -> bool {
        self.parameterize
    }

    // ==================== comparison ====================

    /// `column = value`
    pub fn eq(self, value: impl Into<Value>) -> Self {
        self.op("=", value)
    }

    /// `column <> value`
    pub fn ne(self, value: impl Into<Value>) -> Self {
        self.op("<>", value)
    }

    /// `column > value`
    pub fn gt(self, value: impl Into<Value>) -> Self {
        self.op(">", value)
    }

    /// `column >= value`
    pub fn gte(self, value: impl Into<Value>) -> Self {
        self.op(">=", value)
    }

    /// `column < value`
    pub fn lt(self, value: impl Into<Value>) -> Self {
        self.op("<", value)
    }

    /// `column <= value`
    pub fn lte(self, value: impl Into<Value>) -> Self {
        self.op("<=", value)
    }

    /// `column * value`
    pub fn mul(self, value: impl Into<Value>) -> Self {
        self.op("*", value)
    }

    /// `column LIKE '%value%'`
    pub fn contains(self, value: impl fmt::Display) -> Self {
        self.op("LIKE", format!("%{value}%"))
    }

    /// `column LIKE <pattern>` with the wildcard placement chosen by `mask`.
    ///
    /// | mask | pattern |
    /// |------|---------|
    /// | `%%` | `%value%` |
    /// | `%-`, `%_` | `%value` |
    /// | `-%`, `_%` | `value%` |
    pub fn like(self, value: impl fmt::Display, mask: &str) -> SqlResult<Self> {
        if !matches!(mask, "%%" | "%-" | "-%" | "%_" | "_%") {
            return Err(SqlError::invalid_argument(format!(
                "invalid LIKE mask '{mask}', expected one of %%, %-, -%, %_, _%"
            )));
        }
        let mut pattern = String::new();
        if mask.starts_with('%') {
            pattern.push('%');
        }
        pattern.push_str(&value.to_string());
        if mask.ends_with('%') {
            pattern.push('%');
        }
        Ok(self.op("LIKE", pattern))
    }

    /// Apply an arbitrary binary operator.
    ///
    /// Renders `column <symbol> <placeholder>` when parameterized, otherwise
    /// `column <symbol> <literal>`.
    pub fn op(mut self, symbol: impl Into<String>, value: impl Into<Value>) -> Self {
        self.operation = Some(Operation::Binary {
            symbol: symbol.into(),
            argument: value.into(),
        });
        self
    }

    // ==================== ordering ====================

    /// `column ASC`, for `ORDER BY`.
    pub fn asc(mut self) -> Self {
        self.operation = Some(Operation::Order(Order::Asc));
        self
    }

    /// `column DESC`, for `ORDER BY`.
    pub fn desc(mut self) -> Self {
        self.operation = Some(Operation::Order(Order::Desc));
        self
    }

    // ==================== column-to-column ====================

    /// `self = other`, with no argument binding. Used for `ON` predicates.
    pub fn eq_column(&self, other: &Column) -> JoinPredicate {
        self.compare_column("=", other)
    }

    /// `self <> other`
    pub fn ne_column(&self, other: &Column) -> JoinPredicate {
        self.compare_column("<>", other)
    }

    /// `self <symbol> other`
    pub fn compare_column(&self, symbol: &'static str, other: &Column) -> JoinPredicate {
        JoinPredicate::Columns {
            left: self.clone(),
            symbol,
            right: other.clone(),
        }
    }

    // ==================== inspection ====================

    /// Argument awaiting placeholder substitution, if an operator is pending.
    pub fn argument(&self) -> Option<&Value> {
        match &self.operation {
            Some(Operation::Binary { argument, .. }) => Some(argument),
            _ => None,
        }
    }

    /// Whether a binary operator (and therefore an argument) is pending.
    pub fn is_bound(&self) -> bool {
        matches!(self.operation, Some(Operation::Binary { .. }))
    }

    pub(crate) fn operation(&self) -> Option<&Operation> {
        self.operation.as_ref()
    }

    /// Pending fragment with `?` standing in for the argument.
    pub fn fragment(&self) -> Option<String> {
        self.fragment_with("?")
    }

    /// Pending fragment with the given placeholder text for the argument.
    ///
    /// Non-parameterized columns inline their literal instead.
    pub fn fragment_with(&self, placeholder: &str) -> Option<String> {
        let column = self.qualified_name();
        match self.operation.as_ref()? {
            Operation::Binary { symbol, argument } => Some(if self.parameterize {
                format!("{column} {symbol} {placeholder}")
            } else {
                format!("{column} {symbol} {}", argument.quote())
            }),
            Operation::Order(order) => Some(format!("{column} {}", order.keyword())),
        }
    }

    /// Name qualified by the owning table's alias, without the column alias.
    pub fn qualified_name(&self) -> String {
        match self.table.as_ref().and_then(TableRef::qualifier) {
            Some(prefix) => format!("{prefix}.{}", self.name),
            None => self.name.clone(),
        }
    }

    /// Column list form: `[table_alias.]name[ AS alias]`.
    pub fn to_text(&self) -> String {
        let name = self.qualified_name();
        match &self.alias {
            Some(alias) => format!("{name} AS {alias}"),
            None => name,
        }
    }

    /// Text for `ORDER BY`: the column plus its direction, if one was applied.
    pub(crate) fn order_text(&self) -> String {
        match self.operation {
            Some(Operation::Order(order)) => format!("{} {}", self.qualified_name(), order.keyword()),
            _ => self.qualified_name(),
        }
    }

    /// Reject columns that cannot be rendered.
    pub fn coerce(&self) -> SqlResult<()> {
        if self.name.trim().is_empty() {
            return Err(SqlError::invalid_argument("column name cannot be empty"));
        }
        Ok(())
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::new(name)
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Column::new(name)
    }
}

impl From<&Column> for Column {
    fn from(c: &Column) -> Self {
        c.clone()
    }
}

/// A predicate for `ON`: a column-to-column comparison or raw text.
#[derive(Debug, Clone)]
pub enum JoinPredicate {
    Columns {
        left: Column,
        symbol: &'static str,
        right: Column,
    },
    Raw(String),
}

impl JoinPredicate {
    pub fn to_text(&self) -> String {
        match self {
            JoinPredicate::Columns {
                left,
                symbol,
                right,
            } => format!("{} {} {}", left.qualified_name(), symbol, right.qualified_name()),
            JoinPredicate::Raw(sql) => sql.clone(),
        }
    }
}

impl fmt::Display for JoinPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl From<&str> for JoinPredicate {
    fn from(sql: &str) -> Self {
        JoinPredicate::Raw(sql.to_string())
    }
}

impl From<String> for JoinPredicate {
    fn from(sql: String) -> Self {
        JoinPredicate::Raw(sql)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    #[test]
    fn plain_column_renders_name() {
        assert_eq!(Column::new("name").to_text(), "name");
        assert_eq!(Column::new("foo").alias("other").to_text(), "foo AS other");
    }

    #[test]
    fn comparison_operators_bind_one_argument() {
        let cases = [
            (Column::new("id").eq(5), "id = ?"),
            (Column::new("id").ne(100), "id <> ?"),
            (Column::new("id").gt(100), "id > ?"),
            (Column::new("id").gte(100), "id >= ?"),
            (Column::new("id").lt(100), "id < ?"),
            (Column::new("id").lte(100), "id <= ?"),
            (Column::new("id").mul(100), "id * ?"),
        ];
        for (column, expected) in cases {
            assert_eq!(column.fragment().as_deref(), Some(expected));
            assert!(column.is_bound());
        }
        assert_eq!(Column::new("id").eq(5).argument(), Some(&Value::Int(5)));
    }

    #[test]
    fn last_operator_wins() {
        let c = Column::new("id").eq(1).gt(2);
        assert_eq!(c.fragment().as_deref(), Some("id > ?"));
        assert_eq!(c.argument(), Some(&Value::Int(2)));

        let c = Column::new("id").eq(1).desc();
        assert_eq!(c.fragment().as_deref(), Some("id DESC"));
        assert_eq!(c.argument(), None);
    }

    #[test]
    fn contains_wraps_in_wildcards() {
        let c = Column::new("id").contains("abc");
        assert_eq!(c.fragment().as_deref(), Some("id LIKE ?"));
        assert_eq!(c.argument(), Some(&Value::from("%abc%")));
    }

    #[test]
    fn like_masks() {
        let arg = |mask: &str| {
            Column::new("name")
                .like("yimu", mask)
                .unwrap()
                .argument()
                .cloned()
                .unwrap()
        };
        assert_eq!(arg("%%"), Value::from("%yimu%"));
        assert_eq!(arg("-%"), Value::from("yimu%"));
        assert_eq!(arg("%-"), Value::from("%yimu"));
        assert_eq!(arg("_%"), Value::from("yimu%"));
        assert_eq!(arg("%_"), Value::from("%yimu"));
    }

    #[test]
    fn like_rejects_unknown_mask() {
        let err = Column::new("name").like("abc", "").unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn unparameterized_columns_inline_literals() {
        let c = Column::new("age").parameterize(false).gt(18);
        assert_eq!(c.fragment().as_deref(), Some("age > 18"));
        let c = Column::new("name").parameterize(false).eq("x");
        assert_eq!(c.fragment().as_deref(), Some("name = 'x'"));
    }

    #[test]
    fn ordering_fragments() {
        assert_eq!(Column::new("age").asc().fragment().as_deref(), Some("age ASC"));
        assert_eq!(Column::new("age").desc().order_text(), "age DESC");
        assert_eq!(Column::new("age").order_text(), "age");
    }

    #[test]
    fn column_comparison_binds_nothing() {
        let foo = Table::new("foo").alias("f");
        let bar = Table::new("bar").alias("b");
        let p = foo.col("id").eq_column(&bar.col("id"));
        assert_eq!(p.to_text(), "f.id = b.id");
    }

    #[test]
    fn qualified_fragment_uses_table_alias() {
        let bar = Table::new("bar").alias("b");
        assert_eq!(bar.col("id").eq(5).fragment_with("$1").as_deref(), Some("b.id = $1"));
    }

    #[test]
    fn empty_names_fail_coercion() {
        assert!(Column::new("").coerce().unwrap_err().is_invalid_argument());
        assert!(Column::new("id").coerce().is_ok());
    }
}
