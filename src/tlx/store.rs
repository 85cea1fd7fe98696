//! SQLite-backed collection of experiment result documents.
//!
//! Every result is kept as a JSON document. Documents are never rewritten: older
//! documents with other field names stay as they are and are normalized when read.

use chrono::SecondsFormat;
use rusqlite::{params, Connection};
use serde_json::Value as JSValue;

use crate::tlx::document::StoredResult;
use crate::tlx::*;

pub struct ResultStore {
    conn: Connection,
}

impl ResultStore {
    /// Opens the store described by the connection string: `:memory:`, a
    /// `sqlite://` URL or a file path.
    pub fn open(database_url: &str) -> TlxResult<ResultStore> {
        let path = database_url
            .strip_prefix("sqlite://")
            .or_else(|| database_url.strip_prefix("sqlite:"))
            .unwrap_or(database_url);
        debug!("ResultStore::open: {:?}", path);
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .context(DatabaseSnafu {})?;
        Self::create_tables(&conn)?;
        Ok(ResultStore { conn })
    }

    fn create_tables(conn: &Connection) -> TlxResult<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS experiment_results (\
               id INTEGER PRIMARY KEY AUTOINCREMENT,\
               created_at TEXT NOT NULL,\
               document TEXT NOT NULL\
             );\
             CREATE INDEX IF NOT EXISTS experiment_results_created_at \
               ON experiment_results(created_at);",
        )
        .context(DatabaseSnafu {})
    }

    /// Writes all the results in a single transaction.
    pub fn insert_many(&mut self, records: &[ExperimentResult]) -> TlxResult<usize> {
        let tx = self.conn.transaction().context(DatabaseSnafu {})?;
        {
            let mut stmt = tx
                .prepare("INSERT INTO experiment_results (created_at, document) VALUES (?1, ?2)")
                .context(DatabaseSnafu {})?;
            for r in records {
                let doc = serde_json::to_string(r).context(ParsingJsonSnafu {})?;
                let created_at = r.created_at.to_rfc3339_opts(SecondsFormat::Millis, true);
                stmt.execute(params![created_at, doc])
                    .context(DatabaseSnafu {})?;
            }
        }
        tx.commit().context(DatabaseSnafu {})?;
        info!("insert_many: wrote {} results", records.len());
        Ok(records.len())
    }

    /// Stores a document as given, whatever its field names.
    #[cfg(test)]
    pub fn insert_document(&self, doc: &JSValue) -> TlxResult<i64> {
        let created_at = doc
            .get("createdAt")
            .or_else(|| doc.get("created_at"))
            .and_then(|v| v.as_str())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let text = serde_json::to_string(doc).context(ParsingJsonSnafu {})?;
        self.conn
            .execute(
                "INSERT INTO experiment_results (created_at, document) VALUES (?1, ?2)",
                params![created_at, text],
            )
            .context(DatabaseSnafu {})?;
        Ok(self.conn.last_insert_rowid())
    }

    /// All the stored results, newest first, with their field names normalized.
    pub fn load_all(&self) -> TlxResult<Vec<StoredResult>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, document FROM experiment_results ORDER BY created_at DESC, id DESC")
            .context(DatabaseSnafu {})?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))
            .context(DatabaseSnafu {})?;

        let mut res: Vec<StoredResult> = Vec::new();
        for row in rows {
            let (id, text) = row.context(DatabaseSnafu {})?;
            match serde_json::from_str::<JSValue>(&text) {
                Ok(doc) => res.push(StoredResult::from_document(id, &doc)),
                Err(e) => {
                    // Kept, so that it is counted, but it can never be valid.
                    warn!("load_all: document {} is not valid JSON: {}", id, e);
                    res.push(StoredResult::from_document(id, &JSValue::Null));
                }
            }
        }
        debug!("load_all: {} documents", res.len());
        Ok(res)
    }
}
