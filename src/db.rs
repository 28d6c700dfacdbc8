//! SQLite record store.
//!
//! Records are kept one row per document with the image list serialised as a
//! JSON array. The store performs no validation beyond the casting done in
//! [`crate::record::RecordPatch`].

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::path::Path;

use crate::constants::{generate_record_id, EXPECTED_DB_VERSION};
use crate::queries::{ddl, metadata, records};
use crate::record::{Record, RecordPatch};
use crate::schema::Records;

pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// Open a file-based database pool for production use
/// Creates the file if missing and enables WAL mode
pub async fn open_database(db_path: &Path) -> Result<SqlitePool, DynError> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    log::info!("SQLite database: {}", db_path.display());
    Ok(pool)
}

/// Create a pool on a fresh database inside a temporary directory.
/// The directory is removed when the returned guard drops.
pub async fn create_test_connection_in_temporary_file(
) -> Result<(SqlitePool, tempfile::TempDir), DynError> {
    let dir = tempfile::tempdir()?;
    let pool = open_database(&dir.path().join("test.sqlite")).await?;
    Ok((pool, dir))
}

/// Create tables and indexes, then stamp or verify the schema version
pub async fn init_database_schema(pool: &SqlitePool) -> Result<(), DynError> {
    sqlx::query(&ddl::create_metadata_table())
        .execute(pool)
        .await?;
    sqlx::query(&ddl::create_records_table())
        .execute(pool)
        .await?;
    sqlx::query(&ddl::create_records_created_at_index())
        .execute(pool)
        .await?;

    match query_metadata(pool, "version").await? {
        None => {
            sqlx::query(&metadata::insert())
                .bind("version")
                .bind(EXPECTED_DB_VERSION)
                .execute(pool)
                .await?;
        }
        Some(version) if version == EXPECTED_DB_VERSION => {}
        Some(version) => {
            return Err(format!(
                "Unsupported database version: '{}'. This application only supports version '{}'",
                version, EXPECTED_DB_VERSION
            )
            .into());
        }
    }

    Ok(())
}

/// Query a single metadata value by key
pub async fn query_metadata(pool: &SqlitePool, key: &str) -> Result<Option<String>, DynError> {
    let row = sqlx::query(&metadata::select_value())
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| row.get::<String, _>(0)))
}

fn record_from_row(row: &SqliteRow) -> Result<Record, DynError> {
    let images: String = row.try_get(5)?;
    Ok(Record {
        id: row.try_get(0)?,
        name: row.try_get(1)?,
        description: row.try_get(2)?,
        level: row.try_get(3)?,
        location: row.try_get(4)?,
        images: serde_json::from_str(&images)?,
    })
}

fn images_json(record: &Record) -> Result<String, DynError> {
    Ok(serde_json::to_string(&record.images)?)
}

/// All records in creation order
pub async fn list_records(pool: &SqlitePool) -> Result<Vec<Record>, DynError> {
    let rows = sqlx::query(&records::select_all()).fetch_all(pool).await?;
    rows.iter().map(record_from_row).collect()
}

pub async fn get_record(pool: &SqlitePool, id: &str) -> Result<Option<Record>, DynError> {
    let row = sqlx::query(&records::select_by_id())
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.as_ref().map(record_from_row).transpose()
}

/// Store a new record built from `fields` under a freshly generated id
pub async fn create_record(pool: &SqlitePool, fields: &RecordPatch) -> Result<Record, DynError> {
    let mut record = Record::new(generate_record_id());
    record.apply(fields);

    let created_at_ms = chrono::Utc::now().timestamp_millis();
    sqlx::query(&records::insert())
        .bind(&record.id)
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.level)
        .bind(&record.location)
        .bind(images_json(&record)?)
        .bind(created_at_ms)
        .execute(pool)
        .await?;

    log::debug!("Created record {}", record.id);
    Ok(record)
}

/// Merge `patch` into the stored record. Returns None when no record has `id`.
///
/// Only the fields present in the patch are written, in a single UPDATE.
/// Concurrent updates wait on SQLite's write lock and resolve field by field
/// as last write wins.
pub async fn update_record(
    pool: &SqlitePool,
    id: &str,
    patch: &RecordPatch,
) -> Result<Option<Record>, DynError> {
    let mut columns = Vec::new();
    let mut values: Vec<Option<String>> = Vec::new();

    let text_fields = [
        (Records::Name, &patch.name),
        (Records::Description, &patch.description),
        (Records::Level, &patch.level),
        (Records::Location, &patch.location),
    ];
    for (column, field) in text_fields {
        if let Some(value) = field {
            columns.push(column);
            values.push(value.clone());
        }
    }
    if let Some(images) = &patch.images {
        columns.push(Records::Images);
        values.push(Some(serde_json::to_string(images)?));
    }

    if columns.is_empty() {
        return get_record(pool, id).await;
    }

    let sql = records::update(&columns);
    let mut query = sqlx::query(&sql);
    for value in values {
        query = query.bind(value);
    }
    let row = query.bind(id).fetch_optional(pool).await?;

    let record = row.as_ref().map(record_from_row).transpose()?;
    if let Some(record) = &record {
        log::debug!("Updated record {} ({} fields)", record.id, columns.len());
    }
    Ok(record)
}

/// Remove a record. Returns the number of rows deleted (0 or 1).
pub async fn delete_record(pool: &SqlitePool, id: &str) -> Result<u64, DynError> {
    let result = sqlx::query(&records::delete())
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
