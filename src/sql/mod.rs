//! Statement text and bind values for the mapper. Table, column and operator
//! strings come from trusted code; only values are parameters.

mod builder;
mod params;

pub use builder::{build_where, delete, exists, insert, select, update, QueryBuf, Selector};
pub use params::SqlValue;
