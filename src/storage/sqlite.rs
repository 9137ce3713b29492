//! SQLite storage backend for network summaries

use super::traits::{OpenStore, StorageError, StorageResult, SummaryStore};
use crate::cx::MetadataCollection;
use crate::loader::{NetworkSummary, Visibility};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

/// SQLite-backed summary store
///
/// One row per network. Summary lists, metadata and provenance are stored as
/// JSON text. Thread-safe via internal mutex on the connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS networks (
                id TEXT PRIMARY KEY,
                name TEXT,
                description TEXT,
                version TEXT,
                visibility TEXT NOT NULL DEFAULT 'PRIVATE',
                node_count INTEGER NOT NULL DEFAULT 0,
                edge_count INTEGER NOT NULL DEFAULT 0,
                creation_time TEXT NOT NULL,
                modification_time TEXT NOT NULL,
                properties_json TEXT NOT NULL DEFAULT '[]',
                warnings_json TEXT NOT NULL DEFAULT '[]',
                metadata_json TEXT,
                provenance_json TEXT,
                is_complete INTEGER NOT NULL DEFAULT 0,
                error_message TEXT
            );

            -- Enable WAL mode so summaries can be read while a load commits
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn parse_time(text: &str) -> StorageResult<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(text)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| StorageError::DateParse(format!("{}: {}", text, e)))
    }

    fn parse_visibility(text: &str) -> Visibility {
        match text {
            "PUBLIC" => Visibility::Public,
            _ => Visibility::Private,
        }
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl SummaryStore for SqliteStore {
    fn register_network(&self, id: &Uuid, created: DateTime<Utc>) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let created = created.to_rfc3339();
        conn.execute(
            r#"
            INSERT INTO networks (id, creation_time, modification_time)
            VALUES (?1, ?2, ?2)
            ON CONFLICT(id) DO NOTHING
            "#,
            params![id.to_string(), created],
        )?;
        Ok(())
    }

    fn network_creation_time(&self, id: &Uuid) -> StorageResult<Option<DateTime<Utc>>> {
        let conn = self.conn.lock().unwrap();
        let created: Option<String> = conn
            .query_row(
                "SELECT creation_time FROM networks WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        created.as_deref().map(Self::parse_time).transpose()
    }

    fn save_network(
        &self,
        summary: &NetworkSummary,
        provenance: Option<&Value>,
        metadata: &MetadataCollection,
    ) -> StorageResult<()> {
        let properties_json = serde_json::to_string(&summary.properties)?;
        let warnings_json = serde_json::to_string(&summary.warnings)?;
        let metadata_json = serde_json::to_string(metadata)?;
        let provenance_json = provenance.map(serde_json::to_string).transpose()?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO networks (id, name, description, version, visibility, node_count, edge_count,
                                  creation_time, modification_time, properties_json, warnings_json,
                                  metadata_json, provenance_json, is_complete, error_message)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, 1, NULL)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                version = excluded.version,
                visibility = excluded.visibility,
                node_count = excluded.node_count,
                edge_count = excluded.edge_count,
                creation_time = excluded.creation_time,
                modification_time = excluded.modification_time,
                properties_json = excluded.properties_json,
                warnings_json = excluded.warnings_json,
                metadata_json = excluded.metadata_json,
                provenance_json = excluded.provenance_json,
                is_complete = 1,
                error_message = NULL
            "#,
            params![
                summary.external_id.to_string(),
                summary.name,
                summary.description,
                summary.version,
                summary.visibility.as_str(),
                summary.node_count as i64,
                summary.edge_count as i64,
                summary.creation_time.to_rfc3339(),
                summary.modification_time.to_rfc3339(),
                properties_json,
                warnings_json,
                metadata_json,
                provenance_json,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn set_error_message(&self, id: &Uuid, message: &str) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        let now = Utc::now().to_rfc3339();
        conn.execute(
            r#"
            INSERT INTO networks (id, creation_time, modification_time, error_message)
            VALUES (?1, ?2, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET
                error_message = excluded.error_message,
                modification_time = excluded.modification_time
            "#,
            params![id.to_string(), now, message],
        )?;
        Ok(())
    }

    fn load_summary(&self, id: &Uuid) -> StorageResult<Option<NetworkSummary>> {
        let conn = self.conn.lock().unwrap();
        let row = conn
            .query_row(
                r#"
                SELECT name, description, version, visibility, node_count, edge_count,
                       creation_time, modification_time, properties_json, warnings_json
                FROM networks WHERE id = ?1
                "#,
                params![id.to_string()],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i64>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, String>(6)?,
                        row.get::<_, String>(7)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, String>(9)?,
                    ))
                },
            )
            .optional()?;

        let Some((name, description, version, visibility, nodes, edges, created, modified, props, warnings)) =
            row
        else {
            return Ok(None);
        };

        Ok(Some(NetworkSummary {
            external_id: *id,
            visibility: Self::parse_visibility(&visibility),
            node_count: nodes as u64,
            edge_count: edges as u64,
            creation_time: Self::parse_time(&created)?,
            modification_time: Self::parse_time(&modified)?,
            name,
            description,
            version,
            properties: serde_json::from_str(&props)?,
            warnings: serde_json::from_str(&warnings)?,
        }))
    }

    fn load_metadata(&self, id: &Uuid) -> StorageResult<Option<MetadataCollection>> {
        let conn = self.conn.lock().unwrap();
        let json: Option<Option<String>> = conn
            .query_row(
                "SELECT metadata_json FROM networks WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        match json.flatten() {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn error_message(&self, id: &Uuid) -> StorageResult<Option<String>> {
        let conn = self.conn.lock().unwrap();
        let message: Option<Option<String>> = conn
            .query_row(
                "SELECT error_message FROM networks WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(message.flatten())
    }

    fn is_complete(&self, id: &Uuid) -> StorageResult<bool> {
        let conn = self.conn.lock().unwrap();
        let complete: Option<bool> = conn
            .query_row(
                "SELECT is_complete FROM networks WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(complete.unwrap_or(false))
    }
}
