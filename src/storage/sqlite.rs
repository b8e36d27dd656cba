//! SQLite contact table
//!
//! This module provides the SQLite implementation of [`ContactTable`].

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{ContactTable, StorageError, StorageResult};
use crate::storage::{datetime_from_millis, join_set, split_set, ContactRecord};
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteTable {
    conn: Connection,
}

impl SqliteTable {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteTable)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database or create the schema
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

impl ContactTable for SqliteTable {
    fn load_all(&mut self) -> StorageResult<Vec<ContactRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT url, title, timestamp, phones, emails, addresses FROM contact_info ORDER BY url",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (url, title, timestamp, phones, emails, addresses) = row?;
            let collected_at = datetime_from_millis(timestamp).ok_or_else(|| {
                StorageError::Timestamp(format!("{} for {}", timestamp, url))
            })?;

            records.push(ContactRecord {
                url,
                title,
                phones: split_set(&phones),
                emails: split_set(&emails),
                addresses: split_set(&addresses),
                collected_at,
            });
        }

        Ok(records)
    }

    fn upsert(&mut self, record: &ContactRecord) -> StorageResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO contact_info (url, title, timestamp, phones, emails, addresses)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.url,
                record.title,
                record.collected_at.timestamp_millis(),
                join_set(&record.phones),
                join_set(&record.emails),
                join_set(&record.addresses),
            ],
        )?;
        Ok(())
    }

    fn delete_all(&mut self) -> StorageResult<()> {
        self.conn.execute("DELETE FROM contact_info", [])?;
        Ok(())
    }
}
