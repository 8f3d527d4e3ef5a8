//! Clause variants recorded by [`Query`](super::Query) and their rendering.

use crate::case::Case;
use crate::column::{Column, JoinPredicate, Order};
use crate::dialect::Dialect;
use crate::param::{Argument, ArgumentList};
use crate::table::Relation;
use crate::value::Value;

/// How placeholders are written during a render pass.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Renderer<'a> {
    /// `?` or `$n`, for execution.
    Bind(Dialect),
    /// The argument itself, for logging and debugging.
    Inline(&'a ArgumentList),
}

impl Renderer<'_> {
    pub(crate) fn placeholder(&self, position: usize) -> String {
        match self {
            Renderer::Bind(dialect) => dialect.placeholder(position),
            Renderer::Inline(args) => args
                .get(position)
                .map_or_else(|| "?".to_string(), Argument::render_inline),
        }
    }

    fn placeholders(&self, first: usize, count: usize) -> String {
        let mut out = String::new();
        for p in first..first + count {
            if p > first {
                out.push_str(", ");
            }
            match self {
                Renderer::Bind(dialect) => dialect.write_placeholder(p, &mut out),
                Renderer::Inline(_) => out.push_str(&self.placeholder(p)),
            }
        }
        out
    }
}

/// An item of a `SELECT` list.
#[derive(Debug, Clone)]
pub enum SelectItem {
    Column(Column),
    /// A scalar literal: text renders as written, numbers and booleans inline.
    Literal(Value),
    Case(Case),
}

impl From<Column> for SelectItem {
    fn from(c: Column) -> Self {
        SelectItem::Column(c)
    }
}

impl From<&Column> for SelectItem {
    fn from(c: &Column) -> Self {
        SelectItem::Column(c.clone())
    }
}

impl From<Case> for SelectItem {
    fn from(c: Case) -> Self {
        SelectItem::Case(c)
    }
}

impl From<Value> for SelectItem {
    fn from(v: Value) -> Self {
        SelectItem::Literal(v)
    }
}

macro_rules! impl_select_literal {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SelectItem {
                fn from(v: $t) -> Self {
                    SelectItem::Literal(Value::from(v))
                }
            }
        )*
    };
}

impl_select_literal!(&str, String, i32, i64, f64, bool);

/// Keyword introducing a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Connective {
    Where,
    And,
    Or,
}

impl Connective {
    fn keyword(self) -> &'static str {
        match self {
            Connective::Where => "WHERE",
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Predicate {
    /// Column with a pending operator, or a bare column.
    Column(Column),
    /// Raw text holding exactly one `?` marker.
    Raw(String),
}

#[derive(Debug, Clone)]
pub(crate) enum Clause {
    Select { items: Vec<SelectItem>, first: usize },
    From(Vec<Relation>),
    Into(Relation),
    Filter { connective: Connective, predicate: Predicate, position: Option<usize> },
    In { first: usize, count: usize },
    Join(Relation),
    On(JoinPredicate),
    OrderBy(Vec<Column>),
    Direction(Order),
    Limit(i64),
    Offset(i64),
    Insert { target: Option<Relation>, columns: Vec<Column> },
    Values { first: usize, width: usize },
    Update(Relation),
    Set { columns: Vec<String>, first: usize },
    Delete,
    Returning(Vec<Column>),
    Raw(String),
    CreateTable(String),
}

impl Clause {
    pub(crate) fn render(&self, renderer: &Renderer<'_>) -> String {
        match self {
            Clause::Select { items, first } => {
                if items.is_empty() {
                    return "SELECT *".to_string();
                }
                let mut position = *first;
                let list: Vec<String> = items
                    .iter()
                    .map(|item| match item {
                        SelectItem::Column(c) => c.to_text(),
                        SelectItem::Literal(v) => v.inline(),
                        SelectItem::Case(case) => case.render(renderer, &mut position),
                    })
                    .collect();
                format!("SELECT {}", list.join(", "))
            }
            Clause::From(relations) => format!("FROM {}", relation_list(relations)),
            Clause::Into(relation) => format!("INTO {}", relation.to_text()),
            Clause::Filter {
                connective,
                predicate,
                position,
            } => {
                let text = match (predicate, position) {
                    (Predicate::Column(c), Some(p)) => c
                        .fragment_with(&renderer.placeholder(*p))
                        .unwrap_or_else(|| c.qualified_name()),
                    (Predicate::Column(c), None) => {
                        c.fragment().unwrap_or_else(|| c.qualified_name())
                    }
                    (Predicate::Raw(sql), Some(p)) => sql.replacen('?', &renderer.placeholder(*p), 1),
                    (Predicate::Raw(sql), None) => sql.clone(),
                };
                format!("{} {}", connective.keyword(), text)
            }
            Clause::In { first, count } => {
                if *count == 0 {
                    "IN (NULL)".to_string()
                } else {
                    format!("IN ({})", renderer.placeholders(*first, *count))
                }
            }
            Clause::Join(relation) => format!("JOIN {}", relation.to_text()),
            Clause::On(predicate) => format!("ON {}", predicate.to_text()),
            Clause::OrderBy(columns) => format!(
                "ORDER BY {}",
                columns
                    .iter()
                    .map(Column::order_text)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Clause::Direction(order) => order.keyword().to_string(),
            Clause::Limit(n) => format!("LIMIT {n}"),
            Clause::Offset(n) => format!("OFFSET {n}"),
            Clause::Insert { target, columns } => {
                let mut sql = match target {
                    Some(rel) => format!("INSERT INTO {}", rel.to_text()),
                    None => "INSERT".to_string(),
                };
                if !columns.is_empty() {
                    let names: Vec<&str> = columns.iter().map(Column::name).collect();
                    sql.push_str(&format!(" ({})", names.join(", ")));
                }
                sql
            }
            Clause::Values { first, width } => {
                format!("VALUES ({})", renderer.placeholders(*first, *width))
            }
            Clause::Update(relation) => format!("UPDATE {}", relation.to_text()),
            Clause::Set { columns, first } => {
                let pairs: Vec<String> = columns
                    .iter()
                    .enumerate()
                    .map(|(i, col)| format!("{col} = {}", renderer.placeholder(first + i)))
                    .collect();
                format!("SET {}", pairs.join(", "))
            }
            Clause::Delete => "DELETE".to_string(),
            Clause::Returning(columns) => format!(
                "RETURNING {}",
                columns
                    .iter()
                    .map(Column::qualified_name)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Clause::Raw(sql) => sql.clone(),
            Clause::CreateTable(name) => format!("CREATE TABLE {name}"),
        }
    }
}

fn relation_list(relations: &[Relation]) -> String {
    relations
        .iter()
        .map(Relation::to_text)
        .collect::<Vec<_>>()
        .join(", ")
}
