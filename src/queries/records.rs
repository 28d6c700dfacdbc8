//! Record statements. Every user-supplied value is a `?` placeholder; the doc
//! comment on each builder gives the bind order.

use sea_query::{Expr, Order, Query, SelectStatement, SimpleExpr, SqliteQueryBuilder};

use crate::schema::Records;

fn param() -> SimpleExpr {
    Expr::cust("?")
}

fn select_columns() -> SelectStatement {
    Query::select()
        .columns([
            Records::Id,
            Records::Name,
            Records::Description,
            Records::Level,
            Records::Location,
            Records::Images,
        ])
        .from(Records::Table)
        .to_owned()
}

/// SELECT id, name, description, level, location, images FROM records
/// ORDER BY created_at_ms, rowid
pub fn select_all() -> String {
    select_columns()
        .order_by(Records::CreatedAtMs, Order::Asc)
        .order_by_expr(Expr::cust("rowid"), Order::Asc)
        .to_string(SqliteQueryBuilder)
}

/// SELECT id, name, description, level, location, images FROM records WHERE id = ?
///
/// Binds: id
pub fn select_by_id() -> String {
    select_columns()
        .and_where(Expr::col(Records::Id).eq(param()))
        .to_string(SqliteQueryBuilder)
}

/// INSERT INTO records (id, name, description, level, location, images, created_at_ms)
/// VALUES (?, ?, ?, ?, ?, ?, ?)
///
/// Binds: id, name, description, level, location, images (JSON), created_at_ms
pub fn insert() -> String {
    Query::insert()
        .into_table(Records::Table)
        .columns([
            Records::Id,
            Records::Name,
            Records::Description,
            Records::Level,
            Records::Location,
            Records::Images,
            Records::CreatedAtMs,
        ])
        .values_panic([param(), param(), param(), param(), param(), param(), param()])
        .to_string(SqliteQueryBuilder)
}

/// UPDATE records SET <column> = ?, ... WHERE id = ?
/// RETURNING id, name, description, level, location, images
///
/// Only the given columns are written, so one statement does the merge.
/// Binds: one value per column in the given order, then id
pub fn update(columns: &[Records]) -> String {
    Query::update()
        .table(Records::Table)
        .values(columns.iter().map(|column| (*column, param())))
        .and_where(Expr::col(Records::Id).eq(param()))
        .returning(Query::returning().columns([
            Records::Id,
            Records::Name,
            Records::Description,
            Records::Level,
            Records::Location,
            Records::Images,
        ]))
        .to_string(SqliteQueryBuilder)
}

/// DELETE FROM records WHERE id = ?
///
/// Binds: id
pub fn delete() -> String {
    Query::delete()
        .from_table(Records::Table)
        .and_where(Expr::col(Records::Id).eq(param()))
        .to_string(SqliteQueryBuilder)
}
