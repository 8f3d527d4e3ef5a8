//! `CASE ... WHEN ... THEN ... ELSE ... END` expressions.

use crate::column::Column;
use crate::dialect::Dialect;
use crate::error::{SqlError, SqlResult};
use crate::query::clause::Renderer;
use crate::value::Value;
use std::fmt;

/// One side of a `WHEN`/`THEN`/`ELSE` step.
#[derive(Debug, Clone)]
pub enum Branch {
    /// A column, rendered with its pending operator if it has one.
    Column(Column),
    /// A literal, always rendered inline and quoted if textual.
    Literal(Value),
}

impl From<Column> for Branch {
    fn from(c: Column) -> Self {
        Branch::Column(c)
    }
}

impl From<&Column> for Branch {
    fn from(c: &Column) -> Self {
        Branch::Column(c.clone())
    }
}

impl From<Value> for Branch {
    fn from(v: Value) -> Self {
        Branch::Literal(v)
    }
}

macro_rules! impl_branch_literal {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Branch {
                fn from(v: $t) -> Self {
                    Branch::Literal(Value::from(v))
                }
            }
        )*
    };
}

impl_branch_literal!(&str, String, i32, i64, f64, bool);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    When,
    Then,
    Else,
    End,
    Aliased,
}

#[derive(Debug, Clone)]
enum Step {
    When(Branch),
    Then(Branch),
    Else(Branch),
}

/// Builder for a `CASE` expression, embedded in a `SELECT` list as one item.
///
/// Steps must follow `(when then)+ [else] end [alias]`. Out-of-order calls are
/// recorded and reported when the expression is embedded, following the same
/// deferred-error approach as the statement builder.
///
/// ```ignore
/// let tab = Table::new("tab");
/// let group = Case::new()
///     .when(tab.col("age").gt(18))
///     .then("can_vote")
///     .else_("no_vote")
///     .end()
///     .alias("age_group");
/// ```
#[derive(Debug, Clone)]
pub struct Case {
    steps: Vec<Step>,
    alias: Option<String>,
    state: State,
    parameterize: bool,
    error: Option<String>,
}

impl Default for Case {
    fn default() -> Self {
        Self::new()
    }
}

impl Case {
    /// A `CASE` whose operator arguments are inlined into the text.
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            alias: None,
            state: State::Start,
            parameterize: false,
            error: None,
        }
    }

    /// A `CASE` whose operator arguments are bound to the enclosing statement.
    pub fn parameterized() -> Self {
        Self {
            parameterize: true,
            ..Self::new()
        }
    }

    pub fn when(self, condition: impl Into<Branch>) -> Self {
        self.step(
            &[State::Start, State::Then],
            State::When,
            "WHEN",
            Step::When,
            condition.into(),
        )
    }

    pub fn then(self, result: impl Into<Branch>) -> Self {
        self.step(&[State::When], State::Then, "THEN", Step::Then, result.into())
    }

    pub fn else_(self, result: impl Into<Branch>) -> Self {
        self.step(&[State::Then], State::Else, "ELSE", Step::Else, result.into())
    }

    pub fn end(mut self) -> Self {
        if matches!(self.state, State::Then | State::Else) {
            self.state = State::End;
        } else {
            self.misuse("END");
        }
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        if self.state == State::End {
            self.alias = Some(alias.into());
            self.state = State::Aliased;
        } else {
            self.misuse("AS");
        }
        self
    }

    fn step(
        mut self,
        allowed: &[State],
        next: State,
        keyword: &str,
        make: impl FnOnce(Branch) -> Step,
        branch: Branch,
    ) -> Self {
        if allowed.contains(&self.state) {
            self.steps.push(make(branch));
            self.state = next;
        } else {
            self.misuse(keyword);
        }
        self
    }

    fn misuse(&mut self, keyword: &str) {
        if self.error.is_none() {
            self.error = Some(format!("CASE: {keyword} is not allowed after {:?}", self.state));
        }
    }

    /// Check that the expression is closed and was built in order.
    pub fn validate(&self) -> SqlResult<()> {
        if let Some(err) = &self.error {
            return Err(SqlError::invalid_argument(err.clone()));
        }
        if !matches!(self.state, State::End | State::Aliased) {
            return Err(SqlError::invalid_argument("CASE must be closed with END"));
        }
        Ok(())
    }

    /// Arguments this expression contributes to the enclosing statement.
    pub fn arguments(&self) -> Vec<Value> {
        if !self.parameterize {
            return Vec::new();
        }
        self.steps
            .iter()
            .filter_map(|step| match step.branch() {
                Branch::Column(c) if c.is_bound() => c.argument().cloned(),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn render(&self, renderer: &Renderer<'_>, position: &mut usize) -> String {
        let mut parts = vec!["CASE".to_string()];
        for step in &self.steps {
            let keyword = match step {
                Step::When(_) => "WHEN",
                Step::Then(_) => "THEN",
                Step::Else(_) => "ELSE",
            };
            parts.push(format!("{keyword} {}", self.render_branch(step.branch(), renderer, position)));
        }
        parts.push("END".to_string());
        if let Some(alias) = &self.alias {
            parts.push(format!("AS {alias}"));
        }
        parts.join(" ")
    }

    fn render_branch(&self, branch: &Branch, renderer: &Renderer<'_>, position: &mut usize) -> String {
        match branch {
            Branch::Literal(v) => v.quote(),
            Branch::Column(c) if !c.is_bound() => c.fragment().unwrap_or_else(|| c.qualified_name()),
            Branch::Column(c) if self.parameterize => {
                let placeholder = renderer.placeholder(*position);
                *position += 1;
                // Placeholder text belongs to the enclosing statement.
                c.clone().parameterize(true).fragment_with(&placeholder).unwrap_or_default()
            }
            Branch::Column(c) => c.clone().parameterize(false).fragment().unwrap_or_default(),
        }
    }

    /// Text of the expression with `?` for any bound arguments.
    pub fn to_text(&self) -> String {
        let renderer = Renderer::Bind(Dialect::Positional);
        let mut position = 1;
        self.render(&renderer, &mut position)
    }
}

impl Step {
    fn branch(&self) -> &Branch {
        match self {
            Step::When(b) | Step::Then(b) | Step::Else(b) => b,
        }
    }
}

impl fmt::Display for Case {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    #[test]
    fn inlines_operator_arguments_by_default() {
        let tab = Table::new("tab");
        let case = Case::new()
            .when(tab.col("age").gt(18))
            .then("can_vote")
            .else_("no_vote")
            .end()
            .alias("age_group");
        assert!(case.validate().is_ok());
        assert_eq!(
            case.to_text(),
            "CASE WHEN age > 18 THEN 'can_vote' ELSE 'no_vote' END AS age_group"
        );
        assert!(case.arguments().is_empty());
    }

    #[test]
    fn bare_columns_render_verbatim() {
        let tab = Table::new("tab");
        let case = Case::new()
            .when(tab.col("age"))
            .then(tab.col("can_vote"))
            .else_("no_vote")
            .end();
        assert_eq!(case.to_text(), "CASE WHEN age THEN can_vote ELSE 'no_vote' END");
    }

    #[test]
    fn arithmetic_branches() {
        let tab = Table::new("tab");
        let case = Case::new()
            .when(tab.col("age").gt(18))
            .then(tab.col("age").mul(10))
            .else_(tab.col("age"))
            .end()
            .alias("age_group");
        assert_eq!(
            case.to_text(),
            "CASE WHEN age > 18 THEN age * 10 ELSE age END AS age_group"
        );
    }

    #[test]
    fn parameterized_case_exposes_arguments() {
        let case = Case::parameterized()
            .when(Column::new("age").gt(18))
            .then("adult")
            .when(Column::new("age").gt(12))
            .then("teen")
            .end();
        assert_eq!(case.arguments(), vec![Value::Int(18), Value::Int(12)]);
        assert_eq!(
            case.to_text(),
            "CASE WHEN age > ? THEN 'adult' WHEN age > ? THEN 'teen' END"
        );
    }

    #[test]
    fn end_without_when_is_rejected() {
        assert!(Case::new().end().validate().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn then_before_when_is_rejected() {
        let case = Case::new().then("x").when(Column::new("a")).then("y").end();
        assert!(case.validate().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn unclosed_case_is_rejected() {
        let case = Case::new().when(Column::new("a")).then("y");
        assert!(case.validate().unwrap_err().is_invalid_argument());
    }
}
