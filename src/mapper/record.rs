//! Per-type field schema: which fields map to which columns, built once per type.

use crate::sql::SqlValue;
use sqlx::postgres::PgRow;

/// One mapped field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub column: &'static str,
}

impl Field {
    pub const fn new(name: &'static str, column: &'static str) -> Self {
        Field { name, column }
    }
}

/// Ordered field list of a record type. Column order here is the order of
/// `Record::bind_values` and of every generated column list.
#[derive(Clone, Debug)]
pub struct Schema {
    type_name: &'static str,
    fields: Vec<Field>,
    columns: Vec<&'static str>,
}

impl Schema {
    pub fn new(type_name: &'static str, fields: Vec<Field>) -> Self {
        let columns = fields.iter().map(|f| f.column).collect();
        Schema {
            type_name,
            fields,
            columns,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn column_of(&self, field: &str) -> Option<&'static str> {
        self.fields.iter().find(|f| f.name == field).map(|f| f.column)
    }
}

/// A type the mapper can read from and write to a table.
///
/// Implement it with [`impl_record!`](crate::impl_record) rather than by hand:
///
/// ```ignore
/// #[derive(Default)]
/// struct Item {
///     id: i64,
///     status: Option<String>,
///     region: Option<String>,
/// }
///
/// resource_sdk::impl_record!(Item { id, status, region => "region_code" });
/// ```
pub trait Record: Sized + Send + Unpin + 'static {
    fn schema() -> &'static Schema;

    /// Current field values in schema order. Unset optional fields bind as NULL.
    fn bind_values(&self) -> Vec<SqlValue>;

    /// Build a record from a row selected with `schema().columns()`.
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error>;
}

/// Element kind of a collection filled by `Mapper::find_many`: the record
/// itself, or a boxed or shared record.
pub trait Element: Send + Sized {
    type Record: Record;

    fn from_record(record: Self::Record) -> Self;
}

impl<R: Record + Sync> Element for std::sync::Arc<R> {
    type Record = R;

    fn from_record(record: R) -> Self {
        std::sync::Arc::new(record)
    }
}

/// Implements [`Record`] and [`Element`] (for `T` and `Box<T>`) for a
/// struct. Listed fields are mapped; `field => "column"` renames the column.
/// The struct must implement `Default`; unlisted fields keep their default
/// when a row is read.
#[macro_export]
macro_rules! impl_record {
    ($ty:ty { $($field:ident $(=> $column:literal)?),+ $(,)? }) => {
        impl $crate::mapper::Record for $ty {
            fn schema() -> &'static $crate::mapper::Schema {
                static SCHEMA: ::std::sync::OnceLock<$crate::mapper::Schema> = ::std::sync::OnceLock::new();
                SCHEMA.get_or_init(|| {
                    $crate::mapper::Schema::new(
                        ::std::any::type_name::<$ty>(),
                        vec![$($crate::mapper::Field::new(
                            stringify!($field),
                            $crate::__column_name!($field $(=> $column)?),
                        )),+],
                    )
                })
            }

            fn bind_values(&self) -> ::std::vec::Vec<$crate::sql::SqlValue> {
                vec![$($crate::sql::SqlValue::from(::std::clone::Clone::clone(&self.$field))),+]
            }

            #[allow(clippy::needless_update)]
            fn from_row(row: &$crate::sqlx::postgres::PgRow) -> ::std::result::Result<Self, $crate::sqlx::Error> {
                ::std::result::Result::Ok(Self {
                    $($field: $crate::sqlx::Row::try_get(row, $crate::__column_name!($field $(=> $column)?))?,)+
                    ..::std::default::Default::default()
                })
            }
        }

        impl $crate::mapper::Element for $ty {
            type Record = $ty;
            fn from_record(record: $ty) -> Self {
                record
            }
        }

        impl $crate::mapper::Element for ::std::boxed::Box<$ty> {
            type Record = $ty;
            fn from_record(record: $ty) -> Self {
                ::std::boxed::Box::new(record)
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __column_name {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident => $column:literal) => {
        $column
    };
}
