//! Pipe-delimited flat-file backend and export
//!
//! One record per line: `id|url|companyName|phones|emails|addresses|collectedAt`.
//! `id` is the collected-at time in epoch milliseconds, `collectedAt` is
//! RFC 3339, and the three sets are joined with [`SET_DELIMITER`].
//!
//! [`SET_DELIMITER`]: crate::storage::SET_DELIMITER

use crate::storage::traits::{ContactTable, StorageError, StorageResult};
use crate::storage::{join_set, split_set, ContactRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const FIELD_COUNT: usize = 7;

/// Append-only flat-file table
///
/// Upserts append a line; on load the last line for a URL wins, which gives
/// the same replace semantics as the SQLite table.
pub struct FlatFileTable {
    path: PathBuf,
}

impl FlatFileTable {
    /// Opens the file at `path`, creating it (and parent directories) if needed
    pub fn open(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl ContactTable for FlatFileTable {
    fn load_all(&mut self) -> StorageResult<Vec<ContactRecord>> {
        let reader = BufReader::new(File::open(&self.path)?);
        let mut by_url = BTreeMap::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match parse_line(&line, index + 1) {
                Ok(record) => {
                    by_url.insert(record.url.clone(), record);
                }
                Err(e) => tracing::warn!("Skipping {} in {}", e, self.path.display()),
            }
        }

        Ok(by_url.into_values().collect())
    }

    fn upsert(&mut self, record: &ContactRecord) -> StorageResult<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(file, "{}", format_line(record))?;
        Ok(())
    }

    fn delete_all(&mut self) -> StorageResult<()> {
        File::create(&self.path)?;
        Ok(())
    }
}

/// Writes `records` to `path` in the flat-file format, replacing the file
pub fn write_flat_file(path: &Path, records: &[ContactRecord]) -> StorageResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        writeln!(writer, "{}", format_line(record))?;
    }
    writer.flush()?;
    Ok(())
}

fn format_line(record: &ContactRecord) -> String {
    [
        record.collected_at.timestamp_millis().to_string(),
        clean_field(&record.url),
        clean_field(record.title.as_deref().unwrap_or_default()),
        clean_field(&join_set(&record.phones)),
        clean_field(&join_set(&record.emails)),
        clean_field(&join_set(&record.addresses)),
        record
            .collected_at
            .to_rfc3339_opts(SecondsFormat::Millis, true),
    ]
    .join("|")
}

/// Field separators and line breaks inside a value would split the line
fn clean_field(value: &str) -> String {
    value.replace(['|', '\n', '\r'], " ")
}

fn parse_line(line: &str, line_number: usize) -> StorageResult<ContactRecord> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() != FIELD_COUNT {
        return Err(StorageError::CorruptLine {
            line: line_number,
            reason: format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
        });
    }

    let url = fields[1].trim();
    if url.is_empty() {
        return Err(StorageError::CorruptLine {
            line: line_number,
            reason: "empty url".to_string(),
        });
    }

    let collected_at = DateTime::parse_from_rfc3339(fields[6].trim())
        .map_err(|e| StorageError::CorruptLine {
            line: line_number,
            reason: format!("bad collectedAt: {}", e),
        })?
        .with_timezone(&Utc);

    let title = Some(fields[2].trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    Ok(ContactRecord {
        url: url.to_string(),
        title,
        phones: split_set(fields[3]),
        emails: split_set(fields[4]),
        addresses: split_set(fields[5]),
        collected_at,
    })
}
