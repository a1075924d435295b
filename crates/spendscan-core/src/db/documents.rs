//! Processed document index

use std::collections::HashSet;

use rusqlite::params;

use super::{parse_datetime, Database};
use crate::error::Result;
use crate::models::ProcessedDocument;

impl Database {
    /// Whether a document with this name was already ingested
    pub fn is_document_processed(&self, name: &str) -> Result<bool> {
        let conn = self.conn()?;
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM processed_documents WHERE name = ?)",
            params![name],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Names of every ingested document
    pub fn processed_document_names(&self) -> Result<HashSet<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT name FROM processed_documents")?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<HashSet<_>, _>>()?;
        Ok(names)
    }

    /// List ingested documents, most recent first
    pub fn list_processed_documents(&self) -> Result<Vec<ProcessedDocument>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT name, records_added, processed_at FROM processed_documents ORDER BY processed_at DESC, name",
        )?;

        let documents = stmt
            .query_map([], |row| {
                let processed_at: String = row.get(2)?;
                Ok(ProcessedDocument {
                    name: row.get(0)?,
                    records_added: row.get(1)?,
                    processed_at: parse_datetime(&processed_at),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(documents)
    }
}
