//! Ordered argument storage for statement builders.

use crate::value::Value;

/// How an argument is written when a statement is rendered with inline values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inline {
    /// Written as-is (`email = a@you.io`).
    Verbatim,
    /// Written as a quoted literal (`email = 'a@you.io'`).
    Quoted,
}

/// A bound argument: the value sent to the driver plus its inline style.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    value: Value,
    inline: Inline,
}

impl Argument {
    pub fn new(value: impl Into<Value>, inline: Inline) -> Self {
        Self {
            value: value.into(),
            inline,
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Text substituted for this argument's placeholder by unsafe rendering.
    pub fn render_inline(&self) -> String {
        match self.inline {
            Inline::Verbatim => self.value.inline(),
            Inline::Quoted => self.value.quote(),
        }
    }
}

/// The positional argument list of a statement.
///
/// Entry `n` (0-based) corresponds to placeholder `$n+1`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArgumentList {
    args: Vec<Argument>,
}

impl ArgumentList {
    /// Create a new empty argument list.
    pub fn new() -> Self {
        Self { args: Vec::new() }
    }

    /// Add an argument and return its 1-based index.
    pub fn push(&mut self, arg: Argument) -> usize {
        self.args.push(arg);
        self.args.len()
    }

    /// Add several arguments and return the 1-based index of the first one.
    pub fn extend(&mut self, args: impl IntoIterator<Item = Argument>) -> usize {
        let first = self.args.len() + 1;
        self.args.extend(args);
        first
    }

    /// Get the current argument count.
    pub fn len(&self) -> usize {
        self.args.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Argument at a 1-based position.
    pub fn get(&self, position: usize) -> Option<&Argument> {
        position.checked_sub(1).and_then(|i| self.args.get(i))
    }

    /// Owned copies of the bound values, in placeholder order.
    pub fn values(&self) -> Vec<Value> {
        self.args.iter().map(|a| a.value.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_returns_one_based_index() {
        let mut args = ArgumentList::new();
        assert_eq!(args.push(Argument::new(1, Inline::Verbatim)), 1);
        assert_eq!(args.push(Argument::new("x", Inline::Quoted)), 2);
        assert_eq!(args.len(), 2);
        assert_eq!(args.get(2).unwrap().value(), &Value::from("x"));
        assert!(args.get(0).is_none());
    }

    #[test]
    fn extend_reports_first_position() {
        let mut args = ArgumentList::new();
        args.push(Argument::new(1, Inline::Verbatim));
        let first = args.extend([
            Argument::new(2, Inline::Verbatim),
            Argument::new(3, Inline::Verbatim),
        ]);
        assert_eq!(first, 2);
        assert_eq!(args.values(), vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn inline_style_controls_quoting() {
        assert_eq!(Argument::new("a", Inline::Verbatim).render_inline(), "a");
        assert_eq!(Argument::new("a", Inline::Quoted).render_inline(), "'a'");
        assert_eq!(Argument::new(5, Inline::Quoted).render_inline(), "5");
    }
}
