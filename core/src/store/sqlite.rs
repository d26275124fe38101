//! SQLite backend. One row per subject, rewritten in a single transaction.

use super::{BundleMap, BundleStorage};
use crate::{
    error::{NoDropError, NoDropResult},
    snapshot::SubjectBundle,
};
use rusqlite::{params, Connection};

pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &str) -> NoDropResult<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> NoDropResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> NoDropResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_subject_bundle.sql"))?;
        Ok(())
    }

    /// Number of persisted rows (for tests and runner summaries).
    pub fn bundle_count(&self) -> NoDropResult<i64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM subject_bundle",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Overwrite one row's JSON verbatim (for corruption tests).
    pub fn write_raw(&self, subject: u64, bundle_json: &str) -> NoDropResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO subject_bundle (subject_id, bundle_json, saved_at)
             VALUES (?1, ?2, ?3)",
            params![subject as i64, bundle_json, chrono::Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl BundleStorage for SqliteStorage {
    fn read_all(&self) -> NoDropResult<BundleMap> {
        let mut stmt = self.conn.prepare(
            "SELECT subject_id, bundle_json FROM subject_bundle ORDER BY subject_id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)? as u64, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut bundles = BundleMap::new();
        for (subject, json) in rows {
            let bundle: SubjectBundle = serde_json::from_str(&json).map_err(|e| {
                NoDropError::CorruptBundle { subject, reason: e.to_string() }
            })?;
            bundles.insert(subject, bundle);
        }
        Ok(bundles)
    }

    fn write_all(&mut self, bundles: &BundleMap) -> NoDropResult<()> {
        let saved_at = chrono::Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM subject_bundle", [])?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO subject_bundle (subject_id, bundle_json, saved_at)
                 VALUES (?1, ?2, ?3)",
            )?;
            for (subject, bundle) in bundles {
                let json = serde_json::to_string(bundle)?;
                insert.execute(params![*subject as i64, json, saved_at])?;
            }
        }
        tx.commit()?;
        log::debug!("sqlite: wrote {} bundles", bundles.len());
        Ok(())
    }
}
