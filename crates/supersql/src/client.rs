//! The execution bridge between rendered statements and a database driver.

use crate::dialect::Dialect;
use crate::error::SqlResult;
use crate::row::Row;
use crate::value::Value;
use tokio_postgres::types::ToSql;

/// A database connection that can run rendered statements.
///
/// Implemented for `tokio_postgres` clients and transactions, and for pooled
/// clients with the `pool` feature. Driver errors surface unchanged as
/// [`SqlError::Query`](crate::SqlError::Query).
pub trait Driver: Send + Sync {
    /// Placeholder dialect the driver expects.
    fn dialect(&self) -> Dialect;

    /// Run a statement and return every row it produced.
    fn fetch_all(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = SqlResult<Vec<Row>>> + Send;

    /// Run a statement and return the number of rows affected.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = SqlResult<u64>> + Send;

    /// Run one statement once per parameter set, returning the total affected.
    fn execute_many(
        &self,
        sql: &str,
        param_sets: &[Vec<Value>],
    ) -> impl std::future::Future<Output = SqlResult<u64>> + Send {
        async move {
            let mut total = 0;
            for params in param_sets {
                total += self.execute(sql, params).await?;
            }
            Ok(total)
        }
    }
}

fn as_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

impl Driver for tokio_postgres::Client {
    fn dialect(&self) -> Dialect {
        Dialect::Numbered
    }

    async fn fetch_all(&self, sql: &str, params: &[Value]) -> SqlResult<Vec<Row>> {
        let rows = tokio_postgres::Client::query(self, sql, &as_refs(params)).await?;
        rows.iter().map(Row::from_pg).collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> SqlResult<u64> {
        Ok(tokio_postgres::Client::execute(self, sql, &as_refs(params)).await?)
    }

    async fn execute_many(&self, sql: &str, param_sets: &[Vec<Value>]) -> SqlResult<u64> {
        let stmt = tokio_postgres::Client::prepare(self, sql).await?;
        let mut total = 0;
        for params in param_sets {
            total += tokio_postgres::Client::execute(self, &stmt, &as_refs(params)).await?;
        }
        Ok(total)
    }
}

impl Driver for tokio_postgres::Transaction<'_> {
    fn dialect(&self) -> Dialect {
        Dialect::Numbered
    }

    async fn fetch_all(&self, sql: &str, params: &[Value]) -> SqlResult<Vec<Row>> {
        let rows = tokio_postgres::Transaction::query(self, sql, &as_refs(params)).await?;
        rows.iter().map(Row::from_pg).collect()
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> SqlResult<u64> {
        Ok(tokio_postgres::Transaction::execute(self, sql, &as_refs(params)).await?)
    }

    async fn execute_many(&self, sql: &str, param_sets: &[Vec<Value>]) -> SqlResult<u64> {
        let stmt = tokio_postgres::Transaction::prepare(self, sql).await?;
        let mut total = 0;
        for params in param_sets {
            total += tokio_postgres::Transaction::execute(self, &stmt, &as_refs(params)).await?;
        }
        Ok(total)
    }
}

#[cfg(feature = "pool")]
impl Driver for deadpool_postgres::Client {
    fn dialect(&self) -> Dialect {
        Dialect::Numbered
    }

    async fn fetch_all(&self, sql: &str, params: &[Value]) -> SqlResult<Vec<Row>> {
        // Delegate to the deref target (ClientWrapper / tokio_postgres::Client).
        let client: &tokio_postgres::Client = self;
        Driver::fetch_all(client, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> SqlResult<u64> {
        let client: &tokio_postgres::Client = self;
        Driver::execute(client, sql, params).await
    }

    async fn execute_many(&self, sql: &str, param_sets: &[Vec<Value>]) -> SqlResult<u64> {
        let client: &tokio_postgres::Client = self;
        Driver::execute_many(client, sql, param_sets).await
    }
}
