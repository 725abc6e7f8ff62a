//! Summary repository contracts and SQLite implementation.
//!
//! # Invariants
//! - `summaries.item_uuid` is the primary key; writes are upserts.
//! - Repository stores text as given; validation happens above this layer.

use crate::db::{
    ensure_schema_ready, placeholders, DbError, TableContract, MAX_BATCH_SIZE,
};
use crate::model::folder::ItemId;
use crate::model::summary::Summary;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const SUMMARY_TABLES: &[TableContract] = &[TableContract {
    table: "summaries",
    columns: &["item_uuid", "summary", "created_at", "updated_at"],
}];

pub type SummaryRepoResult<T> = Result<T, SummaryRepoError>;

/// Errors from summary repository operations.
#[derive(Debug)]
pub enum SummaryRepoError {
    Db(DbError),
    InvalidData(String),
}

impl Display for SummaryRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid summary data: {message}"),
        }
    }
}

impl Error for SummaryRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for SummaryRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for SummaryRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract for item summaries.
pub trait SummaryRepository {
    /// Inserts or overwrites the summary for `item`.
    fn upsert_summary(&self, item: ItemId, text: &str) -> SummaryRepoResult<Summary>;
    fn get_summary(&self, item: ItemId) -> SummaryRepoResult<Option<Summary>>;
    /// Deletes one summary. Returns whether a row existed.
    fn delete_summary(&self, item: ItemId) -> SummaryRepoResult<bool>;
    /// Deletes summaries for every listed item. Returns the number removed.
    fn delete_summaries(&self, items: &[ItemId]) -> SummaryRepoResult<usize>;
}

/// SQLite-backed summary repository.
pub struct SqliteSummaryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteSummaryRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> SummaryRepoResult<Self> {
        ensure_schema_ready(conn, SUMMARY_TABLES)?;
        Ok(Self { conn })
    }
}

impl SummaryRepository for SqliteSummaryRepository<'_> {
    fn upsert_summary(&self, item: ItemId, text: &str) -> SummaryRepoResult<Summary> {
        self.conn.execute(
            "INSERT INTO summaries (item_uuid, summary)
             VALUES (?1, ?2)
             ON CONFLICT(item_uuid) DO UPDATE SET
                summary = excluded.summary,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![item.to_string(), text],
        )?;
        self.get_summary(item)?.ok_or_else(|| {
            SummaryRepoError::InvalidData(format!("summary for {item} missing after upsert"))
        })
    }

    fn get_summary(&self, item: ItemId) -> SummaryRepoResult<Option<Summary>> {
        let mut stmt = self.conn.prepare(
            "SELECT item_uuid, summary, created_at, updated_at
             FROM summaries
             WHERE item_uuid = ?1;",
        )?;
        let mut rows = stmt.query([item.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_summary_row(row)?));
        }
        Ok(None)
    }

    fn delete_summary(&self, item: ItemId) -> SummaryRepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM summaries WHERE item_uuid = ?1;",
            [item.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn delete_summaries(&self, items: &[ItemId]) -> SummaryRepoResult<usize> {
        let ids: Vec<String> = items.iter().map(ToString::to_string).collect();
        let mut removed = 0usize;
        for chunk in ids.chunks(MAX_BATCH_SIZE) {
            let sql = format!(
                "DELETE FROM summaries WHERE item_uuid IN ({});",
                placeholders(chunk.len())
            );
            removed += self.conn.execute(&sql, params_from_iter(chunk.iter()))?;
        }
        Ok(removed)
    }
}

fn parse_summary_row(row: &Row<'_>) -> SummaryRepoResult<Summary> {
    let item_text: String = row.get("item_uuid")?;
    let item = Uuid::parse_str(&item_text).map_err(|_| {
        SummaryRepoError::InvalidData(format!(
            "invalid uuid `{item_text}` in summaries.item_uuid"
        ))
    })?;
    Ok(Summary {
        item,
        text: row.get("summary")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
