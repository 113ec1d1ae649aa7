//! Values bound to statement placeholders.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::types::Oid;
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};

/// A value that can be bound to a PostgreSQL query. `Null` doubles as the
/// selector sentinel: a selector holding it compares against a literal NULL
/// and binds nothing.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F64(f64),
    Text(String),
    Uuid(uuid::Uuid),
    Timestamp(DateTime<Utc>),
    NaiveTimestamp(NaiveDateTime),
    Date(NaiveDate),
    Json(Value),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }
}

macro_rules! from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(v: $ty) -> Self {
                    SqlValue::$variant(v)
                }
            }
        )*
    };
}

from_scalar! {
    bool => Bool,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f64 => F64,
    String => Text,
    uuid::Uuid => Uuid,
    DateTime<Utc> => Timestamp,
    NaiveDateTime => NaiveTimestamp,
    NaiveDate => Date,
    Value => Json,
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<&String> for SqlValue {
    fn from(v: &String) -> Self {
        SqlValue::Text(v.clone())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

impl<'q> Encode<'q, Postgres> for SqlValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match self {
            SqlValue::Null => IsNull::Yes,
            SqlValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf)?,
            SqlValue::I16(n) => <i16 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            SqlValue::I32(n) => <i32 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            SqlValue::I64(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            SqlValue::F64(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf)?,
            SqlValue::Text(s) => <String as Encode<Postgres>>::encode_by_ref(s, buf)?,
            SqlValue::Uuid(u) => <uuid::Uuid as Encode<Postgres>>::encode_by_ref(u, buf)?,
            SqlValue::Timestamp(t) => <DateTime<Utc> as Encode<Postgres>>::encode_by_ref(t, buf)?,
            SqlValue::NaiveTimestamp(t) => <NaiveDateTime as Encode<Postgres>>::encode_by_ref(t, buf)?,
            SqlValue::Date(d) => <NaiveDate as Encode<Postgres>>::encode_by_ref(d, buf)?,
            SqlValue::Json(v) => <Value as Encode<Postgres>>::encode_by_ref(v, buf)?,
        })
    }

    /// Concrete type per variant so the server sees `int8`, `uuid`, ... rather than text.
    fn produces(&self) -> Option<PgTypeInfo> {
        Some(match self {
            SqlValue::Null => return None,
            SqlValue::Bool(_) => <bool as Type<Postgres>>::type_info(),
            SqlValue::I16(_) => <i16 as Type<Postgres>>::type_info(),
            SqlValue::I32(_) => <i32 as Type<Postgres>>::type_info(),
            SqlValue::I64(_) => <i64 as Type<Postgres>>::type_info(),
            SqlValue::F64(_) => <f64 as Type<Postgres>>::type_info(),
            SqlValue::Text(_) => <String as Type<Postgres>>::type_info(),
            SqlValue::Uuid(_) => <uuid::Uuid as Type<Postgres>>::type_info(),
            SqlValue::Timestamp(_) => <DateTime<Utc> as Type<Postgres>>::type_info(),
            SqlValue::NaiveTimestamp(_) => <NaiveDateTime as Type<Postgres>>::type_info(),
            SqlValue::Date(_) => <NaiveDate as Type<Postgres>>::type_info(),
            SqlValue::Json(_) => <Value as Type<Postgres>>::type_info(),
        })
    }
}

impl Type<Postgres> for SqlValue {
    /// Unspecified (oid 0): lets the server infer the type of a NULL parameter from context.
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_oid(Oid(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_maps_none_to_null() {
        assert_eq!(SqlValue::from(None::<String>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some(7i64)), SqlValue::I64(7));
        assert!(SqlValue::from(Option::<uuid::Uuid>::None).is_null());
    }

    #[test]
    fn str_becomes_text() {
        assert_eq!(SqlValue::from("active"), SqlValue::Text("active".into()));
    }
}
