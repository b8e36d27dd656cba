//! SQLite schema for the contact table

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per crawled URL; sets are joined with ';;'
CREATE TABLE IF NOT EXISTS contact_info (
    url TEXT PRIMARY KEY,
    title TEXT,
    timestamp BIGINT NOT NULL,
    phones TEXT NOT NULL DEFAULT '',
    emails TEXT NOT NULL DEFAULT '',
    addresses TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_contact_info_timestamp ON contact_info(timestamp);
"#;

/// Creates the contact table if it does not exist
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
