//! Schema metadata statements. Keys and values are bound, never inlined.

use sea_query::{Expr, Query, SqliteQueryBuilder};

use crate::schema::Metadata;

/// SELECT value FROM metadata WHERE key = ?
///
/// Binds: key
pub fn select_value() -> String {
    Query::select()
        .column(Metadata::Value)
        .from(Metadata::Table)
        .and_where(Expr::col(Metadata::Key).eq(Expr::cust("?")))
        .to_string(SqliteQueryBuilder)
}

/// INSERT INTO metadata (key, value) VALUES (?, ?)
///
/// Binds: key, value
pub fn insert() -> String {
    Query::insert()
        .into_table(Metadata::Table)
        .columns([Metadata::Key, Metadata::Value])
        .values_panic([Expr::cust("?"), Expr::cust("?")])
        .to_string(SqliteQueryBuilder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_bind_key_and_value() {
        assert_eq!(select_value().matches('?').count(), 1);
        assert_eq!(insert().matches('?').count(), 2);
        assert!(insert().starts_with("INSERT INTO \"metadata\""));
    }
}
