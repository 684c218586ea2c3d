use crate::config::StorageConfig;
use crate::error::{HcChatError, Result};
use crate::session::Session;
use anyhow::Context;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// Key under which the session list is stored
pub const DEFAULT_STORAGE_KEY: &str = "hc_sessions_v1";

/// Environment variable that overrides the database location
pub const SESSIONS_DB_ENV: &str = "HCCHAT_SESSIONS_DB";

/// Durable record of the session list
///
/// The whole list is kept as one serialized JSON array in a key/value table.
/// Every save replaces the record inside a single transaction, so readers
/// never observe a partial write.
pub struct SqliteStorage {
    db_path: PathBuf,
    key: String,
}

impl SqliteStorage {
    /// Create a new storage instance
    ///
    /// Initializes the database file in the user's data directory, unless
    /// `HCCHAT_SESSIONS_DB` points somewhere else.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var(SESSIONS_DB_ENV) {
            return Self::new_with_path(override_path);
        }

        let proj_dirs = ProjectDirs::from("com", "healthconnect", "hcchat")
            .ok_or_else(|| HcChatError::Storage("Could not determine data directory".into()))?;

        let data_dir = proj_dirs.data_dir();
        std::fs::create_dir_all(data_dir)
            .context("Failed to create data directory")
            .map_err(|e| HcChatError::Storage(e.to_string()))?;

        Self::new_with_path(data_dir.join("sessions.db"))
    }

    /// Create a new storage instance that uses the specified database path.
    ///
    /// # Examples
    ///
    /// ```
    /// use hcchat::storage::SqliteStorage;
    ///
    /// let dir = std::env::temp_dir().join("hcchat-doc");
    /// let storage = SqliteStorage::new_with_path(dir.join("sessions.db")).unwrap();
    /// assert_eq!(storage.key(), "hc_sessions_v1");
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        // Ensure parent directory exists so opening the DB file succeeds.
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create parent directory for database")
                    .map_err(|e| HcChatError::Storage(e.to_string()))?;
            }
        }

        let storage = Self {
            db_path,
            key: DEFAULT_STORAGE_KEY.to_string(),
        };
        storage.init()?;
        Ok(storage)
    }

    /// Open the storage described by configuration
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let storage = match &config.path {
            Some(path) => Self::new_with_path(path)?,
            None => Self::new()?,
        };
        Ok(storage.with_key(config.key.clone()))
    }

    /// Use a different record key in the same database
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Path of the backing database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Key of the session record
    pub fn key(&self) -> &str {
        &self.key
    }

    fn open(&self) -> Result<Connection> {
        Connection::open(&self.db_path)
            .context("Failed to open database")
            .map_err(|e| HcChatError::Storage(e.to_string()).into())
    }

    /// Initialize the database schema
    fn init(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
            [],
        )
        .context("Failed to create tables")
        .map_err(|e| HcChatError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Load the stored session list
    ///
    /// Never fails: a missing record, unreadable database, malformed JSON,
    /// or a value that is not an array all yield an empty list.
    pub fn load(&self) -> Vec<Session> {
        let raw = match self.read_raw() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!("No session record under key {}", self.key);
                return Vec::new();
            }
            Err(e) => {
                tracing::warn!("Failed to read session record, starting empty: {}", e);
                return Vec::new();
            }
        };

        match decode_sessions(&raw) {
            Ok(sessions) => {
                tracing::debug!("Loaded {} sessions", sessions.len());
                sessions
            }
            Err(e) => {
                tracing::warn!("{}; starting with an empty session list", e);
                Vec::new()
            }
        }
    }

    /// Replace the stored session list
    ///
    /// The whole list is written in one transaction, so readers see either
    /// the previous list or this one.
    ///
    /// # Errors
    ///
    /// Returns `HcChatError::Storage` when serialization or the write fails
    pub fn save(&self, sessions: &[Session]) -> Result<()> {
        let value = serde_json::to_string(sessions)
            .context("Failed to serialize sessions")
            .map_err(|e| HcChatError::Storage(e.to_string()))?;
        self.write_raw(&value)?;
        tracing::debug!("Saved {} sessions", sessions.len());
        Ok(())
    }

    fn read_raw(&self) -> Result<Option<String>> {
        let conn = self.open()?;
        let value = conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?",
                params![self.key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .context("Failed to query session record")
            .map_err(|e| HcChatError::Storage(e.to_string()))?;
        Ok(value)
    }

    /// Write the raw record value, bypassing serialization
    pub(crate) fn write_raw(&self, value: &str) -> Result<()> {
        let mut conn = self.open()?;
        let now = chrono::Utc::now().to_rfc3339();

        let tx = conn
            .transaction()
            .context("Failed to start transaction")
            .map_err(|e| HcChatError::Storage(e.to_string()))?;

        tx.execute(
            "INSERT INTO kv_store (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![self.key, value, now],
        )
        .context("Failed to write session record")
        .map_err(|e| HcChatError::Storage(e.to_string()))?;

        tx.commit()
            .context("Failed to commit transaction")
            .map_err(|e| HcChatError::Storage(e.to_string()))?;

        Ok(())
    }
}

/// Decode a serialized session list
fn decode_sessions(raw: &str) -> std::result::Result<Vec<Session>, HcChatError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| HcChatError::StorageParse(e.to_string()))?;
    if !value.is_array() {
        return Err(HcChatError::StorageParse(
            "session record is not an array".to_string(),
        ));
    }
    serde_json::from_value(value).map_err(|e| HcChatError::StorageParse(e.to_string()))
}
