//! Record mapper: typed select/insert/update/delete over a per-type column schema.

mod record;

pub use record::{Element, Field, Record, Schema};

use crate::error::MapperError;
use crate::sql::{self, QueryBuf, Selector};
use sqlx::postgres::PgRow;
use sqlx::PgPool;

/// Executes mapper statements. Every call is one round trip; nothing is cached or retried.
#[derive(Clone, Debug, Default)]
pub struct Mapper {
    pool: Option<PgPool>,
}

impl Mapper {
    pub fn new(pool: PgPool) -> Self {
        Mapper { pool: Some(pool) }
    }

    /// A mapper with no database behind it. Every operation fails with `NoConnection`.
    pub fn disconnected() -> Self {
        Mapper { pool: None }
    }

    pub fn is_connected(&self) -> bool {
        self.pool.is_some()
    }

    pub fn pool(&self) -> Result<&PgPool, MapperError> {
        self.pool.as_ref().ok_or(MapperError::NoConnection)
    }

    /// Fill `dest` with the first row matching `selectors`. Returns `false`, leaving
    /// `dest` untouched, when nothing matched. At most one row is fetched.
    pub async fn find_one<R>(&self, dest: &mut R, table: &str, selectors: &[Selector]) -> Result<bool, MapperError>
    where
        R: Record + Element<Record = R>,
    {
        let mut rows: Vec<R> = Vec::new();
        self.find_many_limited(&mut rows, table, selectors, Some(1)).await?;
        match rows.into_iter().next() {
            Some(row) => {
                *dest = row;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Like `find_one`, but a missing row is `MapperError::NotFound`.
    pub async fn get<R>(&self, dest: &mut R, table: &str, selectors: &[Selector]) -> Result<(), MapperError>
    where
        R: Record + Element<Record = R>,
    {
        if self.find_one(dest, table, selectors).await? {
            Ok(())
        } else {
            Err(MapperError::NotFound(format!("no row in {} matched", table)))
        }
    }

    /// Replace `dest` with every row matching `selectors`. Zero rows is an empty `dest`.
    pub async fn find_many<E: Element>(
        &self,
        dest: &mut Vec<E>,
        table: &str,
        selectors: &[Selector],
    ) -> Result<usize, MapperError> {
        self.find_many_limited(dest, table, selectors, None).await
    }

    pub async fn find_many_limited<E: Element>(
        &self,
        dest: &mut Vec<E>,
        table: &str,
        selectors: &[Selector],
        limit: Option<u32>,
    ) -> Result<usize, MapperError> {
        let columns = columns_of::<E::Record>()?;
        let pool = self.pool()?;
        let q = sql::select(columns, table, selectors, limit);
        let rows = fetch_all(pool, &q).await?;
        let mut records = Vec::with_capacity(rows.len());
        for row in &rows {
            let record = E::Record::from_row(row).map_err(|source| MapperError::Decode {
                table: table.to_string(),
                source,
            })?;
            records.push(E::from_record(record));
        }
        *dest = records;
        Ok(dest.len())
    }

    pub async fn exists(&self, table: &str, selectors: &[Selector]) -> Result<bool, MapperError> {
        let pool = self.pool()?;
        let q = sql::exists(table, selectors);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(&q)
            .fetch_optional(pool)
            .await
            .map_err(|source| MapperError::Query {
                operation: "exists",
                source,
            })?;
        Ok(row.is_some())
    }

    /// Insert `record` with every mapped column. Returns the affected row count.
    pub async fn create<R: Record>(&self, table: &str, record: &R) -> Result<u64, MapperError> {
        let columns = columns_of::<R>()?;
        let pool = self.pool()?;
        let q = sql::insert(columns, table, record.bind_values());
        execute(pool, &q, "insert").await
    }

    /// Overwrite every mapped column of the rows matching `selectors`.
    pub async fn update<R: Record>(
        &self,
        table: &str,
        record: &R,
        selectors: &[Selector],
    ) -> Result<u64, MapperError> {
        let columns = columns_of::<R>()?;
        let pool = self.pool()?;
        let q = sql::update(columns, table, record.bind_values(), selectors);
        execute(pool, &q, "update").await
    }

    pub async fn delete(&self, table: &str, selectors: &[Selector]) -> Result<u64, MapperError> {
        let pool = self.pool()?;
        let q = sql::delete(table, selectors);
        execute(pool, &q, "delete").await
    }
}

fn columns_of<R: Record>() -> Result<&'static [&'static str], MapperError> {
    let schema = R::schema();
    if schema.columns().is_empty() {
        return Err(MapperError::Misuse(format!(
            "{} maps no fields to columns",
            schema.type_name()
        )));
    }
    Ok(schema.columns())
}

fn bind_all(q: &QueryBuf) -> sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments> {
    let mut query = sqlx::query(&q.sql);
    for p in &q.params {
        query = query.bind(p.clone());
    }
    query
}

async fn fetch_all(pool: &PgPool, q: &QueryBuf) -> Result<Vec<PgRow>, MapperError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    bind_all(q)
        .fetch_all(pool)
        .await
        .map_err(|source| MapperError::Query {
            operation: "select",
            source,
        })
}

async fn execute(pool: &PgPool, q: &QueryBuf, operation: &'static str) -> Result<u64, MapperError> {
    tracing::debug!(sql = %q.sql, params = ?q.params, "query");
    let result = bind_all(q)
        .execute(pool)
        .await
        .map_err(|source| MapperError::Query { operation, source })?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::SqlValue;
    use std::sync::OnceLock;

    #[derive(Debug, Default)]
    struct Item {
        id: i64,
        status: Option<String>,
    }

    crate::impl_record!(Item { id, status });

    #[derive(Debug, Default)]
    struct Opaque;

    impl Record for Opaque {
        fn schema() -> &'static Schema {
            static SCHEMA: OnceLock<Schema> = OnceLock::new();
            SCHEMA.get_or_init(|| Schema::new("Opaque", Vec::new()))
        }

        fn bind_values(&self) -> Vec<SqlValue> {
            Vec::new()
        }

        fn from_row(_: &PgRow) -> Result<Self, sqlx::Error> {
            Ok(Opaque)
        }
    }

    impl Element for Opaque {
        type Record = Opaque;

        fn from_record(record: Opaque) -> Self {
            record
        }
    }

    #[tokio::test]
    async fn disconnected_mapper_reports_no_connection() {
        let mapper = Mapper::disconnected();
        let mut items: Vec<Item> = Vec::new();
        let err = mapper.find_many(&mut items, "items", &[]).await.unwrap_err();
        assert!(matches!(err, MapperError::NoConnection));
        let err = mapper.exists("items", &[Selector::eq("id", 1i64)]).await.unwrap_err();
        assert!(matches!(err, MapperError::NoConnection));
        let err = mapper.delete("items", &[]).await.unwrap_err();
        assert!(matches!(err, MapperError::NoConnection));
    }

    #[tokio::test]
    async fn unmapped_type_is_misuse_before_connection() {
        let mapper = Mapper::disconnected();
        let err = mapper.create("things", &Opaque).await.unwrap_err();
        assert!(matches!(err, MapperError::Misuse(_)));
        let mut one = Opaque;
        let err = mapper.get(&mut one, "things", &[]).await.unwrap_err();
        assert!(matches!(err, MapperError::Misuse(_)));
    }

    #[tokio::test]
    async fn failed_lookup_leaves_destination_untouched() {
        let mapper = Mapper::disconnected();
        let mut item = Item {
            id: 7,
            status: Some("active".into()),
        };
        assert!(mapper.find_one(&mut item, "items", &[]).await.is_err());
        assert_eq!(item.id, 7);
        assert_eq!(item.status.as_deref(), Some("active"));
    }
}
