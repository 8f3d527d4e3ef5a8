//! The statement builder.
//!
//! A [`Query`] records clauses in call order and renders them, joined by single
//! spaces, only when asked. Arguments are appended at call time and each clause
//! remembers where its arguments start, so placeholders are numbered correctly
//! whatever dialect the statement is finally rendered for.
//!
//! # Usage
//!
//! ```ignore
//! use supersql::{Dialect, Query, Table};
//!
//! let foo = Table::new("foo");
//! let q = Query::new(Dialect::Numbered)
//!     .update(&foo)?
//!     .set([("name", "alpha"), ("email", "beta")])?
//!     .where_(foo.col("id").eq(5))?;
//!
//! assert_eq!(q.to_sql(), "UPDATE foo SET name = $1, email = $2 WHERE id = $3");
//! ```

pub(crate) mod clause;


use crate::case::Case;
use crate::client::Driver;
use crate::column::{Column, JoinPredicate, Operation, Order};
use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::monitor::{HookAction, NoopHook, QueryContext, QueryHook, QueryResult, TracingSqlHook};
use crate::param::{Argument, ArgumentList, Inline};
use crate::row::Rows;
use crate::table::{Relation, Table};
use crate::value::Value;
use clause::{Clause, Connective, Predicate, Renderer};
use std::fmt;
use std::time::Instant;

pub use clause::SelectItem;

/// The kind of statement a builder produces, fixed by the first clause that sets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
}

/// A filter for `WHERE`, `AND` and `OR`.
#[derive(Debug, Clone)]
pub enum Condition {
    /// A column with a pending operator (`age > ?`), or a bare column.
    Column(Column),
    /// Raw text with one `?` marker and the value bound to it.
    Raw { sql: String, param: Option<Value> },
}

impl Condition {
    /// Raw text with one `?` marker and its value.
    pub fn raw(sql: impl Into<String>, param: impl Into<Value>) -> Self {
        Condition::Raw {
            sql: sql.into(),
            param: Some(param.into()),
        }
    }
}

impl From<Column> for Condition {
    fn from(c: Column) -> Self {
        Condition::Column(c)
    }
}

impl From<&Column> for Condition {
    fn from(c: &Column) -> Self {
        Condition::Column(c.clone())
    }
}

impl From<&str> for Condition {
    fn from(sql: &str) -> Self {
        Condition::Raw {
            sql: sql.to_string(),
            param: None,
        }
    }
}

impl From<String> for Condition {
    fn from(sql: String) -> Self {
        Condition::Raw { sql, param: None }
    }
}

impl<V: Into<Value>> From<(&str, V)> for Condition {
    fn from((sql, param): (&str, V)) -> Self {
        Condition::raw(sql, param)
    }
}

/// Where the first `VALUES` row sits in the argument list.
#[derive(Debug, Clone, Copy)]
struct ValuesSlot {
    first: usize,
    width: usize,
}

/// A statement under construction.
///
/// Clause methods consume the builder and return it, or an error when the call
/// breaks the clause's contract. Cloning copies the clause list and arguments;
/// clones never observe each other's later calls.
#[derive(Debug, Clone, Default)]
pub struct Query {
    dialect: Dialect,
    clauses: Vec<Clause>,
    arguments: ArgumentList,
    pending_values: Vec<Vec<Value>>,
    values_slot: Option<ValuesSlot>,
    kind: Option<StatementKind>,
}

impl Query {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    /// Change the dialect used by [`Query::to_sql`].
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// A `CASE` builder for use in [`Query::select`].
    ///
    /// With `parameterize`, bound branch values become arguments of this
    /// statement; otherwise they are inlined.
    pub fn case(&self, parameterize: bool) -> Case {
        if parameterize {
            Case::parameterized()
        } else {
            Case::new()
        }
    }

    fn push(mut self, clause: Clause) -> Self {
        self.clauses.push(clause);
        self
    }

    fn mark(&mut self, kind: StatementKind) {
        if self.kind.is_none() {
            self.kind = Some(kind);
        }
    }

    fn bind(&mut self, value: Value, inline: Inline) -> usize {
        self.arguments.push(Argument::new(value, inline))
    }

    // ==================== SELECT ====================

    /// `SELECT <items>`, or `SELECT *` when `items` is empty.
    ///
    /// Literal items must be strings, integers, floats or booleans. A [`Case`]
    /// must be closed with `end()`; its bound arguments join this statement.
    pub fn select<I>(mut self, items: impl IntoIterator<Item = I>) -> SqlResult<Self>
    where
        I: Into<SelectItem>,
    {
        let items: Vec<SelectItem> = items.into_iter().map(Into::into).collect();
        for item in &items {
            match item {
                SelectItem::Column(c) => c.coerce()?,
                SelectItem::Literal(v) if !v.is_scalar() => {
                    return Err(SqlError::invalid_argument(format!(
                        "SELECT accepts string, integer, float or boolean literals, got {}",
                        v.kind()
                    )));
                }
                SelectItem::Literal(_) => {}
                SelectItem::Case(case) => case.validate()?,
            }
        }
        let first = self.arguments.len() + 1;
        for item in &items {
            if let SelectItem::Case(case) = item {
                for value in case.arguments() {
                    self.bind(value, Inline::Verbatim);
                }
            }
        }
        self.mark(StatementKind::Select);
        Ok(self.push(Clause::Select { items, first }))
    }

    /// `SELECT *`
    pub fn select_all(mut self) -> Self {
        self.mark(StatementKind::Select);
        self.push(Clause::Select {
            items: Vec::new(),
            first: 1,
        })
    }

    /// `FROM <relations>`
    pub fn from<R>(self, relations: impl IntoIterator<Item = R>) -> SqlResult<Self>
    where
        R: Into<Relation>,
    {
        let relations = coerce_relations(relations)?;
        Ok(self.push(Clause::From(relations)))
    }

    // ==================== filters ====================

    /// `WHERE <condition>`
    ///
    /// Raw text must carry its value: `where_(("identifier = ?", 5))`. A column
    /// must have a comparison pending, or none at all (`WHERE active`).
    pub fn where_(self, condition: impl Into<Condition>) -> SqlResult<Self> {
        self.filter(Connective::Where, condition.into())
    }

    /// `AND <condition>`
    pub fn and(self, condition: impl Into<Condition>) -> SqlResult<Self> {
        self.filter(Connective::And, condition.into())
    }

    /// `OR <condition>`
    pub fn or(self, condition: impl Into<Condition>) -> SqlResult<Self> {
        self.filter(Connective::Or, condition.into())
    }

    fn filter(mut self, connective: Connective, condition: Condition) -> SqlResult<Self> {
        let (predicate, position) = match condition {
            Condition::Raw { sql, param: None } => {
                return Err(SqlError::MissingParameter(format!(
                    "raw condition '{sql}' needs a bound value"
                )));
            }
            Condition::Raw {
                sql,
                param: Some(value),
            } => {
                let markers = sql.matches('?').count();
                if markers != 1 {
                    return Err(SqlError::invalid_argument(format!(
                        "raw condition '{sql}' must contain exactly one '?', found {markers}"
                    )));
                }
                let position = self.bind(value, Inline::Quoted);
                (Predicate::Raw(sql), Some(position))
            }
            Condition::Column(column) => {
                column.coerce()?;
                let position = match column.operation() {
                    Some(Operation::Order(_)) => {
                        return Err(SqlError::invalid_argument(format!(
                            "column '{}' carries an ordering, not a comparison",
                            column.name()
                        )));
                    }
                    Some(Operation::Binary { argument, .. }) if column.is_parameterized() => {
                        Some(self.bind(argument.clone(), Inline::Verbatim))
                    }
                    _ => None,
                };
                (Predicate::Column(column), position)
            }
        };
        Ok(self.push(Clause::Filter {
            connective,
            predicate,
            position,
        }))
    }

    /// `IN (<options>)`; `IN (NULL)` when there are none.
    pub fn in_<V>(mut self, options: impl IntoIterator<Item = V>) -> Self
    where
        V: Into<Value>,
    {
        let first = self.arguments.len() + 1;
        let mut count = 0;
        for option in options {
            self.bind(option.into(), Inline::Verbatim);
            count += 1;
        }
        self.push(Clause::In { first, count })
    }

    // ==================== joins ====================

    /// `JOIN <relation>`
    pub fn join(self, relation: impl Into<Relation>) -> SqlResult<Self> {
        let relation = relation.into();
        relation.coerce()?;
        Ok(self.push(Clause::Join(relation)))
    }

    /// `ON <predicate>`, usually built with [`Column::eq_column`].
    pub fn on(self, predicate: impl Into<JoinPredicate>) -> Self {
        self.push(Clause::On(predicate.into()))
    }

    // ==================== ordering and paging ====================

    /// `ORDER BY <columns>`, each with its own `ASC`/`DESC` if one was applied.
    pub fn order_by<C>(self, columns: impl IntoIterator<Item = C>) -> SqlResult<Self>
    where
        C: Into<Column>,
    {
        let columns = coerce_columns(columns)?;
        Ok(self.push(Clause::OrderBy(columns)))
    }

    /// A standalone `ASC`.
    pub fn asc(self) -> Self {
        self.push(Clause::Direction(Order::Asc))
    }

    /// A standalone `DESC`.
    pub fn desc(self) -> Self {
        self.push(Clause::Direction(Order::Desc))
    }

    /// `LIMIT n`, written literally.
    pub fn limit(self, n: impl Into<Value>) -> SqlResult<Self> {
        let n = non_negative_int("LIMIT", n.into())?;
        Ok(self.push(Clause::Limit(n)))
    }

    /// `OFFSET n`, written literally.
    pub fn offset(self, n: impl Into<Value>) -> SqlResult<Self> {
        let n = non_negative_int("OFFSET", n.into())?;
        Ok(self.push(Clause::Offset(n)))
    }

    // ==================== INSERT ====================

    /// `INSERT (<columns>)`, completed by a following [`Query::into`].
    pub fn insert<C>(mut self, columns: impl IntoIterator<Item = C>) -> SqlResult<Self>
    where
        C: Into<Column>,
    {
        let columns = coerce_columns(columns)?;
        self.mark(StatementKind::Insert);
        Ok(self.push(Clause::Insert {
            target: None,
            columns,
        }))
    }

    /// `INTO <relation>`.
    ///
    /// Directly after [`Query::insert`] this completes `INSERT INTO <relation> (<columns>)`.
    /// Anywhere else it renders a plain `INTO <relation>` (`SELECT * INTO t FROM s`).
    pub fn into(mut self, relation: impl Into<Relation>) -> SqlResult<Self> {
        let relation = relation.into();
        relation.coerce()?;

        if let Some(Clause::Insert { target, .. }) = self.clauses.last_mut() {
            if target.is_some() {
                return Err(SqlError::invalid_argument(
                    "INSERT already has a target relation",
                ));
            }
            *target = Some(relation);
            return Ok(self);
        }
        if self
            .clauses
            .iter()
            .any(|c| matches!(c, Clause::Insert { target: None, .. }))
        {
            return Err(SqlError::invalid_argument("INTO must directly follow INSERT"));
        }
        Ok(self.push(Clause::Into(relation)))
    }

    /// `INSERT INTO <relation> (<columns>)` in one call.
    pub fn insert_into<C>(
        mut self,
        relation: impl Into<Relation>,
        columns: impl IntoIterator<Item = C>,
    ) -> SqlResult<Self>
    where
        C: Into<Column>,
    {
        let relation = relation.into();
        relation.coerce()?;
        let columns = coerce_columns(columns)?;
        self.mark(StatementKind::Insert);
        Ok(self.push(Clause::Insert {
            target: Some(relation),
            columns,
        }))
    }

    /// `VALUES (<placeholders>)` sized to the row width.
    ///
    /// The first row is bound to the statement; every row is kept for
    /// multi-row execution, which runs the statement once per row.
    pub fn values<R, V>(mut self, rows: impl IntoIterator<Item = R>) -> SqlResult<Self>
    where
        R: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        if self.values_slot.is_some() {
            return Err(SqlError::invalid_argument("VALUES may only be given once"));
        }
        let rows: Vec<Vec<Value>> = rows
            .into_iter()
            .map(|row| row.into_iter().map(Into::into).collect())
            .collect();
        let Some(width) = rows.first().map(Vec::len) else {
            return Err(SqlError::invalid_argument("VALUES needs at least one row"));
        };
        if width == 0 {
            return Err(SqlError::invalid_argument("VALUES rows must not be empty"));
        }
        if let Some(row) = rows.iter().find(|r| r.len() != width) {
            return Err(SqlError::ValuesArityMismatch {
                expected: width,
                got: row.len(),
            });
        }

        let first = self.arguments.extend(
            rows[0]
                .iter()
                .cloned()
                .map(|v| Argument::new(v, Inline::Quoted)),
        );
        self.values_slot = Some(ValuesSlot { first, width });
        self.pending_values = rows;
        Ok(self.push(Clause::Values { first, width }))
    }

    // ==================== UPDATE / DELETE ====================

    /// `UPDATE <relation>`
    pub fn update(mut self, relation: impl Into<Relation>) -> SqlResult<Self> {
        let relation = relation.into();
        relation.coerce()?;
        self.mark(StatementKind::Update);
        Ok(self.push(Clause::Update(relation)))
    }

    /// `SET col = <placeholder>, ...`, binding values in iteration order.
    pub fn set<K, V>(mut self, assignments: impl IntoIterator<Item = (K, V)>) -> SqlResult<Self>
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let first = self.arguments.len() + 1;
        let mut columns = Vec::new();
        let mut values = Vec::new();
        for (column, value) in assignments {
            let column = column.into();
            if column.trim().is_empty() {
                return Err(SqlError::invalid_argument("SET column names must not be empty"));
            }
            columns.push(column);
            values.push(Argument::new(value, Inline::Quoted));
        }
        if columns.is_empty() {
            return Err(SqlError::invalid_argument("SET needs at least one assignment"));
        }
        self.arguments.extend(values);
        self.mark(StatementKind::Update);
        Ok(self.push(Clause::Set { columns, first }))
    }

    /// `DELETE`, usually followed by [`Query::from`].
    pub fn delete(mut self) -> Self {
        self.mark(StatementKind::Delete);
        self.push(Clause::Delete)
    }

    /// `RETURNING <columns>`
    pub fn returning<C>(self, columns: impl IntoIterator<Item = C>) -> SqlResult<Self>
    where
        C: Into<Column>,
    {
        let columns = coerce_columns(columns)?;
        Ok(self.push(Clause::Returning(columns)))
    }

    /// Literal SQL, written as given. Nothing in it is escaped or bound.
    pub fn raw(self, sql: impl Into<String>) -> Self {
        self.push(Clause::Raw(sql.into()))
    }

    /// `CREATE TABLE <name>`, using the conventional plural table name.
    pub fn create(self, relation: impl Into<Relation>) -> SqlResult<Self> {
        let relation = relation.into();
        relation.coerce()?;
        let name = Table::new(relation.base_name()).table_name();
        Ok(self.push(Clause::CreateTable(name)))
    }

    // ==================== rendering ====================

    fn render(&self, renderer: Renderer<'_>) -> String {
        self.clauses
            .iter()
            .map(|c| c.render(&renderer))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Statement text for this builder's dialect.
    pub fn to_sql(&self) -> String {
        self.to_sql_with(self.dialect)
    }

    /// Statement text for another dialect. Arguments are unaffected.
    pub fn to_sql_with(&self, dialect: Dialect) -> String {
        self.render(Renderer::Bind(dialect))
    }

    /// Statement text with every argument written inline.
    ///
    /// For logging and debugging only; the output is not safe to execute.
    pub fn to_unsafe_sql(&self) -> String {
        self.render(Renderer::Inline(&self.arguments))
    }

    /// Bound arguments in placeholder order.
    pub fn arguments(&self) -> Vec<Value> {
        self.arguments.values()
    }

    /// All rows given to [`Query::values`].
    pub fn pending_values(&self) -> &[Vec<Value>] {
        &self.pending_values
    }

    pub fn kind(&self) -> Option<StatementKind> {
        self.kind
    }

    /// Check that the statement is complete enough to execute.
    pub fn validate(&self) -> SqlResult<()> {
        if self.clauses.is_empty() {
            return Err(SqlError::invalid_argument("statement is empty"));
        }
        if self
            .clauses
            .iter()
            .any(|c| matches!(c, Clause::Insert { target: None, .. }))
        {
            return Err(SqlError::invalid_argument(
                "INSERT needs a target relation, call into() after insert()",
            ));
        }
        Ok(())
    }

    /// One argument set per pending `VALUES` row.
    fn parameter_sets(&self) -> Vec<Vec<Value>> {
        let base = self.arguments.values();
        let Some(slot) = self.values_slot else {
            return vec![base];
        };
        let start = slot.first - 1;
        self.pending_values
            .iter()
            .map(|row| {
                let mut params = base.clone();
                params[start..start + slot.width].clone_from_slice(row);
                params
            })
            .collect()
    }

    fn returns_rows(&self) -> bool {
        matches!(self.kind, None | Some(StatementKind::Select))
            || self.clauses.iter().any(|c| matches!(c, Clause::Returning(_)))
    }

    // ==================== execution ====================

    /// Execute against a driver, rendered for the driver's dialect.
    ///
    /// `SELECT` and `RETURNING` statements fetch rows. Multi-row `VALUES` runs
    /// once per row. Everything else reports the affected count.
    pub async fn execute(&self, driver: &impl Driver) -> SqlResult<Rows> {
        self.execute_with_hook(driver, &TracingSqlHook::default()).await
    }

    /// Execute without logging.
    pub async fn execute_quiet(&self, driver: &impl Driver) -> SqlResult<Rows> {
        self.execute_with_hook(driver, &NoopHook).await
    }

    /// Execute, passing the statement through `hook` first.
    pub async fn execute_with_hook(
        &self,
        driver: &impl Driver,
        hook: &dyn QueryHook,
    ) -> SqlResult<Rows> {
        self.validate()?;
        let rendered = self.to_sql_with(driver.dialect());
        let ctx = QueryContext::new(&rendered, self.arguments.len(), self.kind);
        let sql = match hook.before_query(&ctx) {
            HookAction::Continue => rendered,
            HookAction::ModifySql(sql) => sql,
            HookAction::Abort(reason) => {
                return Err(SqlError::Other(format!("statement aborted by hook: {reason}")));
            }
        };

        let started = Instant::now();
        let (rows, result) = if self.pending_values.len() > 1 {
            let affected = driver.execute_many(&sql, &self.parameter_sets()).await?;
            (Rows::affected_only(affected), QueryResult::Affected(affected))
        } else if self.returns_rows() {
            let rows = driver.fetch_all(&sql, &self.arguments.values()).await?;
            let count = rows.len();
            (Rows::new(rows), QueryResult::Rows(count))
        } else {
            let affected = driver.execute(&sql, &self.arguments.values()).await?;
            (Rows::affected_only(affected), QueryResult::Affected(affected))
        };
        hook.after_query(&ctx, started.elapsed(), &result);
        Ok(rows)
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}

fn coerce_relations<R: Into<Relation>>(
    relations: impl IntoIterator<Item = R>,
) -> SqlResult<Vec<Relation>> {
    relations
        .into_iter()
        .map(|r| {
            let r = r.into();
            r.coerce()?;
            Ok(r)
        })
        .collect()
}

fn coerce_columns<C: Into<Column>>(columns: impl IntoIterator<Item = C>) -> SqlResult<Vec<Column>> {
    columns
        .into_iter()
        .map(|c| {
            let c = c.into();
            c.coerce()?;
            Ok(c)
        })
        .collect()
}

fn non_negative_int(clause: &str, value: Value) -> SqlResult<i64> {
    match value.as_int() {
        Some(n) if n >= 0 => Ok(n),
        _ => Err(SqlError::invalid_argument(format!(
            "{clause} expects a non-negative integer, got {}",
            value.quote()
        ))),
    }
}
