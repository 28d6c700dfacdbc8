use sea_query::{ColumnDef, Index, SqliteQueryBuilder, Table};

use crate::schema::{Metadata, Records};

/// CREATE TABLE IF NOT EXISTS metadata (key TEXT PRIMARY KEY, value TEXT NOT NULL)
pub fn create_metadata_table() -> String {
    Table::create()
        .table(Metadata::Table)
        .if_not_exists()
        .col(ColumnDef::new(Metadata::Key).string().primary_key())
        .col(ColumnDef::new(Metadata::Value).string().not_null())
        .to_string(SqliteQueryBuilder)
}

/// CREATE TABLE IF NOT EXISTS records (
///     id TEXT PRIMARY KEY,
///     name TEXT,
///     description TEXT,
///     level TEXT,
///     location TEXT,
///     images TEXT NOT NULL DEFAULT '[]',
///     created_at_ms INTEGER NOT NULL
/// )
pub fn create_records_table() -> String {
    Table::create()
        .table(Records::Table)
        .if_not_exists()
        .col(ColumnDef::new(Records::Id).string().primary_key())
        .col(ColumnDef::new(Records::Name).string().null())
        .col(ColumnDef::new(Records::Description).string().null())
        .col(ColumnDef::new(Records::Level).string().null())
        .col(ColumnDef::new(Records::Location).string().null())
        .col(
            ColumnDef::new(Records::Images)
                .string()
                .not_null()
                .default("[]"),
        )
        .col(
            ColumnDef::new(Records::CreatedAtMs)
                .big_integer()
                .not_null(),
        )
        .to_string(SqliteQueryBuilder)
}

/// CREATE INDEX IF NOT EXISTS idx_records_created_at ON records(created_at_ms)
pub fn create_records_created_at_index() -> String {
    Index::create()
        .if_not_exists()
        .name("idx_records_created_at")
        .table(Records::Table)
        .col(Records::CreatedAtMs)
        .to_string(SqliteQueryBuilder)
}
