//! Builds parameterized SELECT, INSERT, UPDATE, DELETE from column lists and selectors.
//!
//! Table, column and operator strings are trusted and pasted verbatim; only
//! values travel as parameters.

use crate::sql::SqlValue;

/// One `column operator value` term of a WHERE clause.
#[derive(Clone, Debug, PartialEq)]
pub struct Selector {
    pub column: String,
    pub operator: String,
    pub value: SqlValue,
}

impl Selector {
    pub fn new(column: impl Into<String>, operator: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Selector {
            column: column.into(),
            operator: operator.into(),
            value: value.into(),
        }
    }

    /// Shorthand for `column = value`.
    pub fn eq(column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self::new(column, "=", value)
    }

    /// Compare against a literal NULL, e.g. `Selector::null("region", "IS NOT")`.
    pub fn null(column: impl Into<String>, operator: impl Into<String>) -> Self {
        Self::new(column, operator, SqlValue::Null)
    }
}

/// SQL text plus the parameters to bind, in placeholder order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlValue>,
}

/// `WHERE a = $k AND b != NULL ...`, terms in caller order, placeholders numbered
/// from `offset + 1`. Null-valued selectors bind nothing. Empty for no selectors.
pub fn build_where(offset: usize, selectors: &[Selector]) -> (String, Vec<SqlValue>) {
    let mut terms = Vec::with_capacity(selectors.len());
    let mut params = Vec::new();
    for s in selectors {
        if s.value.is_null() {
            terms.push(format!("{} {} NULL", s.column, s.operator));
        } else {
            params.push(s.value.clone());
            terms.push(format!("{} {} ${}", s.column, s.operator, offset + params.len()));
        }
    }
    if terms.is_empty() {
        return (String::new(), params);
    }
    (format!("WHERE {}", terms.join(" AND ")), params)
}

fn with_where(mut sql: String, where_clause: &str) -> String {
    if !where_clause.is_empty() {
        sql.push(' ');
        sql.push_str(where_clause);
    }
    sql
}

pub fn select(columns: &[&str], table: &str, selectors: &[Selector], limit: Option<u32>) -> QueryBuf {
    let (where_clause, params) = build_where(0, selectors);
    let mut sql = with_where(format!("SELECT {} FROM {}", columns.join(","), table), &where_clause);
    if let Some(n) = limit {
        sql.push_str(&format!(" LIMIT {}", n));
    }
    QueryBuf { sql, params }
}

pub fn exists(table: &str, selectors: &[Selector]) -> QueryBuf {
    let (where_clause, params) = build_where(0, selectors);
    let mut sql = with_where(format!("SELECT 1 FROM {}", table), &where_clause);
    sql.push_str(" LIMIT 1");
    QueryBuf { sql, params }
}

/// `values` must be in `columns` order.
pub fn insert(columns: &[&str], table: &str, values: Vec<SqlValue>) -> QueryBuf {
    let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("${}", n)).collect();
    QueryBuf {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(","),
            placeholders.join(",")
        ),
        params: values,
    }
}

/// SET parameters come first; the WHERE clause continues numbering after them.
pub fn update(columns: &[&str], table: &str, values: Vec<SqlValue>, selectors: &[Selector]) -> QueryBuf {
    let sets: Vec<String> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{} = ${}", c, i + 1))
        .collect();
    let (where_clause, where_params) = build_where(columns.len(), selectors);
    let mut params = values;
    params.extend(where_params);
    QueryBuf {
        sql: with_where(format!("UPDATE {} SET {}", table, sets.join(", ")), &where_clause),
        params,
    }
}

pub fn delete(table: &str, selectors: &[Selector]) -> QueryBuf {
    let (where_clause, params) = build_where(0, selectors);
    QueryBuf {
        sql: with_where(format!("DELETE FROM {}", table), &where_clause),
        params,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn where_binds_values_and_inlines_null() {
        let (sql, params) = build_where(
            0,
            &[Selector::new("status", "=", "active"), Selector::null("region", "!=")],
        );
        assert_eq!(sql, "WHERE status = $1 AND region != NULL");
        assert_eq!(params, vec![SqlValue::Text("active".into())]);
    }

    #[test]
    fn where_empty_for_no_selectors() {
        let (sql, params) = build_where(0, &[]);
        assert!(sql.is_empty());
        assert!(params.is_empty());
    }

    #[test]
    fn where_numbering_honours_offset_and_skips_nulls() {
        let (sql, params) = build_where(
            2,
            &[
                Selector::eq("track", "net"),
                Selector::null("deleted_at", "IS"),
                Selector::new("seq", ">", 4i32),
            ],
        );
        assert_eq!(sql, "WHERE track = $3 AND deleted_at IS NULL AND seq > $4");
        assert_eq!(params.len(), 2);
        assert_eq!(params[1], SqlValue::I32(4));
    }

    #[test]
    fn none_value_acts_as_null_sentinel() {
        let (sql, params) = build_where(0, &[Selector::new("owner", "IS", None::<String>)]);
        assert_eq!(sql, "WHERE owner IS NULL");
        assert!(params.is_empty());
    }

    #[test]
    fn select_with_and_without_where() {
        let q = select(&["id", "status"], "items", &[], None);
        assert_eq!(q.sql, "SELECT id,status FROM items");
        let q = select(&["id", "status"], "items", &[Selector::eq("status", "active")], Some(10));
        assert_eq!(q.sql, "SELECT id,status FROM items WHERE status = $1 LIMIT 10");
        assert_eq!(q.params.len(), 1);
    }

    #[test]
    fn exists_limits_to_one_row() {
        let q = exists("items", &[Selector::eq("id", 1i64)]);
        assert_eq!(q.sql, "SELECT 1 FROM items WHERE id = $1 LIMIT 1");
        assert_eq!(exists("items", &[]).sql, "SELECT 1 FROM items LIMIT 1");
    }

    #[test]
    fn insert_numbers_every_column() {
        let q = insert(&["id", "status"], "items", vec![SqlValue::I64(3), SqlValue::Null]);
        assert_eq!(q.sql, "INSERT INTO items (id,status) VALUES ($1,$2)");
        assert_eq!(q.params, vec![SqlValue::I64(3), SqlValue::Null]);
    }

    #[test]
    fn update_continues_numbering_into_where() {
        let q = update(
            &["id", "status"],
            "items",
            vec![SqlValue::I64(3), SqlValue::Text("closed".into())],
            &[Selector::eq("id", 3i64)],
        );
        assert_eq!(q.sql, "UPDATE items SET id = $1, status = $2 WHERE id = $3");
        assert_eq!(q.params.len(), 3);
        assert_eq!(q.params[2], SqlValue::I64(3));
    }

    #[test]
    fn delete_builds_where() {
        let q = delete("items", &[Selector::eq("status", "closed")]);
        assert_eq!(q.sql, "DELETE FROM items WHERE status = $1");
    }
}
