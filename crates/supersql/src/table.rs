//! Named relations and the columns derived from them.

use crate::column::Column;
use crate::error::{SqlError, SqlResult};
use heck::ToSnakeCase;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, Weak};

#[derive(Debug)]
pub(crate) struct TableInner {
    name: String,
    alias: RwLock<Option<String>>,
}

impl TableInner {
    fn alias(&self) -> Option<String> {
        self.alias
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A named table, optionally aliased.
///
/// Clones share the same relation: aliasing any handle is visible through all
/// of them and through every [`Column`] derived from them, so the alias may be
/// set after columns were handed to a builder.
///
/// ```ignore
/// let foo = Table::new("foo");
/// let q = Query::new(Dialect::Positional)
///     .select([foo.col("id")])?
///     .from([foo.alias("f")])?;
/// assert_eq!(q.to_sql(), "SELECT f.id FROM foo AS f");
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    inner: Arc<TableInner>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(TableInner {
                name: name.into(),
                alias: RwLock::new(None),
            }),
        }
    }

    /// Set (or overwrite) the alias and return a handle to the same relation.
    pub fn alias(&self, alias: impl Into<String>) -> Self {
        *self
            .inner
            .alias
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(alias.into());
        self.clone()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn alias_name(&self) -> Option<String> {
        self.inner.alias()
    }

    /// A column of this table, qualified by the table alias when one is set.
    ///
    /// The column holds a weak handle, so the table must outlive it for the
    /// alias to apply. A column taken from a temporary, as in
    /// `Table::new("foo").alias("f").col("id")`, renders unqualified.
    pub fn col(&self, name: impl Into<String>) -> Column {
        Column::with_table(name, TableRef(Arc::downgrade(&self.inner)))
    }

    /// `name` or `name AS alias`.
    pub fn to_text(&self) -> String {
        match self.inner.alias() {
            Some(alias) => format!("{} AS {}", self.inner.name, alias),
            None => self.inner.name.clone(),
        }
    }

    /// Conventional table name for this relation: snake_case, pluralized.
    ///
    /// `customer` becomes `customers`, `UserCategory` becomes `user_categories`.
    pub fn table_name(&self) -> String {
        tableize(&self.inner.name)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Non-owning handle from a column back to its table.
#[derive(Debug, Clone)]
pub(crate) struct TableRef(Weak<TableInner>);

impl TableRef {
    /// The alias columns are qualified with, if the table is alive and aliased.
    pub(crate) fn qualifier(&self) -> Option<String> {
        self.0.upgrade().and_then(|t| t.alias())
    }
}

/// Anything that may appear where a relation is expected (`FROM`, `JOIN`, `INTO`, ...).
#[derive(Debug, Clone)]
pub enum Relation {
    Table(Table),
    /// A relation given by name, rendered verbatim.
    Name(String),
}

impl Relation {
    /// Reject relations that cannot be rendered.
    pub fn coerce(&self) -> SqlResult<()> {
        let name = match self {
            Relation::Table(t) => t.name(),
            Relation::Name(n) => n.as_str(),
        };
        if name.trim().is_empty() {
            return Err(SqlError::invalid_argument(
                "a relation must be a table or a non-empty name",
            ));
        }
        Ok(())
    }

    pub fn to_text(&self) -> String {
        match self {
            Relation::Table(t) => t.to_text(),
            Relation::Name(n) => n.clone(),
        }
    }

    /// Underlying name, ignoring any alias.
    pub fn base_name(&self) -> &str {
        match self {
            Relation::Table(t) => t.name(),
            Relation::Name(n) => n,
        }
    }
}

impl From<Table> for Relation {
    fn from(t: Table) -> Self {
        Relation::Table(t)
    }
}

impl From<&Table> for Relation {
    fn from(t: &Table) -> Self {
        Relation::Table(t.clone())
    }
}

impl From<&str> for Relation {
    fn from(s: &str) -> Self {
        Relation::Name(s.to_string())
    }
}

impl From<String> for Relation {
    fn from(s: String) -> Self {
        Relation::Name(s)
    }
}

fn tableize(name: &str) -> String {
    pluralize(&name.to_snake_case())
}

fn pluralize(base: &str) -> String {
    if base.ends_with('y')
        && base.len() > 1
        && !matches!(
            base.chars().nth(base.len() - 2),
            Some('a' | 'e' | 'i' | 'o' | 'u')
        )
    {
        format!("{}ies", &base[..base.len() - 1])
    } else if base.ends_with('s')
        || base.ends_with('x')
        || base.ends_with('z')
        || base.ends_with("ch")
        || base.ends_with("sh")
    {
        format!("{base}es")
    } else {
        format!("{base}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_with_and_without_alias() {
        let t = Table::new("foo");
        assert_eq!(t.to_text(), "foo");
        let t = t.alias("f");
        assert_eq!(t.to_text(), "foo AS f");
        assert_eq!(t.to_string(), "foo AS f");
    }

    #[test]
    fn alias_can_be_overwritten() {
        let t = Table::new("foo").alias("a").alias("b");
        assert_eq!(t.alias_name().as_deref(), Some("b"));
    }

    #[test]
    fn derived_columns_follow_later_aliasing() {
        let t = Table::new("foo");
        let id = t.col("id");
        assert_eq!(id.to_text(), "id");
        t.alias("f");
        assert_eq!(id.to_text(), "f.id");
    }

    #[test]
    fn columns_outliving_their_table_render_unqualified() {
        let id = {
            let t = Table::new("foo").alias("f");
            t.col("id")
        };
        assert_eq!(id.to_text(), "id");
    }

    #[test]
    fn columns_of_a_temporary_table_lose_its_alias() {
        let id = Table::new("foo").alias("f").col("id");
        assert_eq!(id.to_text(), "id");

        let foo = Table::new("foo").alias("f");
        assert_eq!(foo.col("id").to_text(), "f.id");
    }

    #[test]
    fn table_names_are_pluralized_snake_case() {
        assert_eq!(Table::new("customer").table_name(), "customers");
        assert_eq!(Table::new("UserCategory").table_name(), "user_categories");
        assert_eq!(Table::new("box").table_name(), "boxes");
        assert_eq!(Table::new("day").table_name(), "days");
    }

    #[test]
    fn relation_coercion() {
        assert!(Relation::from("students").coerce().is_ok());
        assert!(Relation::from(Table::new("tab")).coerce().is_ok());
        assert!(Relation::from("  ").coerce().unwrap_err().is_invalid_argument());
    }
}
