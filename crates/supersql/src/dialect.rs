//! Placeholder dialects and database vendors.

use crate::error::{SqlError, SqlResult};
use std::fmt;
use std::str::FromStr;

/// How bound arguments are marked in statement text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Every placeholder is a bare `?` (SQLite, MySQL).
    #[default]
    Positional,
    /// Placeholders carry their 1-based argument position: `$1`, `$2` (Postgres).
    Numbered,
}

impl Dialect {
    /// Placeholder text for the argument at a 1-based position.
    pub fn placeholder(self, position: usize) -> String {
        match self {
            Dialect::Positional => "?".to_string(),
            Dialect::Numbered => format!("${position}"),
        }
    }

    /// Append the placeholder for a 1-based position to `out`.
    pub fn write_placeholder(self, position: usize, out: &mut String) {
        match self {
            Dialect::Positional => out.push('?'),
            Dialect::Numbered => {
                use std::fmt::Write;
                let _ = write!(out, "${position}");
            }
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::Positional => write!(f, "positional"),
            Dialect::Numbered => write!(f, "numbered"),
        }
    }
}

impl FromStr for Dialect {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positional" | "generic" | "?" => Ok(Dialect::Positional),
            "numbered" | "postgres" | "$" => Ok(Dialect::Numbered),
            other => Err(SqlError::UnsupportedVendor(format!(
                "no placeholder dialect named '{other}'"
            ))),
        }
    }
}

/// A database engine, as named by the scheme of a connection string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Vendor {
    Postgres,
    Sqlite,
    MySql,
}

impl Vendor {
    /// Resolve the vendor from a DSN such as `postgres://user@host/db`.
    pub fn from_dsn(dsn: &str) -> SqlResult<Self> {
        let dsn = dsn.trim();
        if dsn.is_empty() {
            return Err(SqlError::UnsupportedVendor(
                "a connection string is required to resolve the vendor".to_string(),
            ));
        }
        let Some((scheme, _)) = dsn.split_once("://") else {
            return Err(SqlError::UnsupportedVendor(format!(
                "connection string '{dsn}' has no scheme"
            )));
        };
        scheme.parse()
    }

    /// The placeholder dialect this vendor's drivers expect.
    pub fn dialect(self) -> Dialect {
        match self {
            Vendor::Postgres => Dialect::Numbered,
            Vendor::Sqlite | Vendor::MySql => Dialect::Positional,
        }
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vendor::Postgres => write!(f, "postgres"),
            Vendor::Sqlite => write!(f, "sqlite"),
            Vendor::MySql => write!(f, "mysql"),
        }
    }
}

impl FromStr for Vendor {
    type Err = SqlError;

    fn from_str(s: &str) -> SqlResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Vendor::Postgres),
            "sqlite" => Ok(Vendor::Sqlite),
            "mysql" | "mariadb" => Ok(Vendor::MySql),
            other => Err(SqlError::UnsupportedVendor(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_per_dialect() {
        assert_eq!(Dialect::Positional.placeholder(3), "?");
        assert_eq!(Dialect::Numbered.placeholder(3), "$3");

        let mut out = String::from("id = ");
        Dialect::Numbered.write_placeholder(12, &mut out);
        assert_eq!(out, "id = $12");
    }

    #[test]
    fn vendor_from_dsn() {
        assert_eq!(Vendor::from_dsn("postgres://u@h/db").unwrap(), Vendor::Postgres);
        assert_eq!(Vendor::from_dsn("postgresql://u@h/db").unwrap(), Vendor::Postgres);
        assert_eq!(Vendor::from_dsn("sqlite://data.db").unwrap(), Vendor::Sqlite);
        assert_eq!(Vendor::from_dsn("mysql://h/db").unwrap(), Vendor::MySql);
    }

    #[test]
    fn unknown_vendor_is_rejected() {
        assert!(matches!(
            Vendor::from_dsn("oracle://h/db"),
            Err(SqlError::UnsupportedVendor(_))
        ));
        assert!(matches!(Vendor::from_dsn(""), Err(SqlError::UnsupportedVendor(_))));
        assert!(matches!(
            Vendor::from_dsn("no-scheme"),
            Err(SqlError::UnsupportedVendor(_))
        ));
    }

    #[test]
    fn vendor_dialects() {
        assert_eq!(Vendor::Postgres.dialect(), Dialect::Numbered);
        assert_eq!(Vendor::Sqlite.dialect(), Dialect::Positional);
        assert_eq!(Vendor::MySql.dialect(), Dialect::Positional);
    }

    #[test]
    fn dialect_from_str() {
        assert_eq!("numbered".parse::<Dialect>().unwrap(), Dialect::Numbered);
        assert_eq!("generic".parse::<Dialect>().unwrap(), Dialect::Positional);
        assert!("colon".parse::<Dialect>().is_err());
    }
}
