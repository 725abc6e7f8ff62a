//! Folder hierarchy repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist folders, their ordered sub-folder lists and item memberships.
//! - Keep SQL details and ordering behavior inside the repository boundary.
//!
//! # Invariants
//! - Sub-folder listing is deterministic: `position ASC`.
//! - A folder id appears in at most one sub-folder list (unique index).
//! - An item id appears in at most one folder (unique index).
//! - Each mutating call runs in one immediate transaction.

use crate::db::{
    ensure_schema_ready, placeholders, DbError, TableContract, MAX_BATCH_SIZE,
};
use crate::model::folder::{Folder, FolderId, ItemId, UserId};
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const FOLDER_TABLES: &[TableContract] = &[
    TableContract {
        table: "folders",
        columns: &["folder_uuid", "owner_uuid", "title", "created_at", "updated_at"],
    },
    TableContract {
        table: "folder_subfolders",
        columns: &["parent_uuid", "child_uuid", "position"],
    },
    TableContract {
        table: "folder_items",
        columns: &["folder_uuid", "item_uuid"],
    },
];

/// Result type used by folder repository operations.
pub type FolderRepoResult<T> = Result<T, FolderRepoError>;

/// Errors from folder repository operations.
#[derive(Debug)]
pub enum FolderRepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target folder does not exist.
    FolderNotFound(FolderId),
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for FolderRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::FolderNotFound(id) => write!(f, "folder not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid folder data: {message}"),
        }
    }
}

impl Error for FolderRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::FolderNotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for FolderRepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for FolderRepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Storage contract for the folder hierarchy.
///
/// Implementations resolve parent-of by reverse lookup over sub-folder
/// lists; no parent pointer is stored on the folder itself.
pub trait FolderRepository {
    /// Inserts one folder. When `parent` is given, the new id is appended to
    /// the parent's sub-folders in the same write.
    fn insert_folder(
        &self,
        owner: UserId,
        title: &str,
        parent: Option<FolderId>,
    ) -> FolderRepoResult<Folder>;
    /// Loads one folder with its sub-folders and items.
    fn get_folder(&self, id: FolderId) -> FolderRepoResult<Option<Folder>>;
    /// Returns whether the user owns any folder at all.
    fn owner_has_folders(&self, owner: UserId) -> FolderRepoResult<bool>;
    /// Lists every folder owned by the user in creation order.
    fn list_owner_folders(&self, owner: UserId) -> FolderRepoResult<Vec<Folder>>;
    /// Returns the user's earliest folder that no other folder lists.
    fn find_root_folder(&self, owner: UserId) -> FolderRepoResult<Option<Folder>>;
    /// Returns the folder whose sub-folders contain `child`.
    fn find_parent(&self, child: FolderId) -> FolderRepoResult<Option<FolderId>>;
    /// Returns the folder currently holding `item`.
    fn find_item_folder(&self, item: ItemId) -> FolderRepoResult<Option<FolderId>>;
    /// Replaces one folder title.
    fn rename_folder(&self, id: FolderId, title: &str) -> FolderRepoResult<()>;
    /// Detaches `folder` from its current parent, if any, and appends it to
    /// `new_parent`. Returns the previous parent.
    fn reparent_folder(
        &self,
        folder: FolderId,
        new_parent: FolderId,
    ) -> FolderRepoResult<Option<FolderId>>;
    /// Moves `item` into `folder`, removing it from any other folder first.
    /// Returns the folder that held the item before the call.
    fn place_item(&self, item: ItemId, folder: FolderId) -> FolderRepoResult<Option<FolderId>>;
    /// Removes `item` from whichever folder holds it. Returns that folder.
    fn remove_item(&self, item: ItemId) -> FolderRepoResult<Option<FolderId>>;
    /// Detaches `root` from its parent and deletes every folder in `closure`.
    /// Returns the items the deleted folders held.
    fn delete_folders(&self, root: FolderId, closure: &[FolderId])
        -> FolderRepoResult<Vec<ItemId>>;
}

/// SQLite-backed folder repository.
pub struct SqliteFolderRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFolderRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> FolderRepoResult<Self> {
        ensure_schema_ready(conn, FOLDER_TABLES)?;
        Ok(Self { conn })
    }
}

impl FolderRepository for SqliteFolderRepository<'_> {
    fn insert_folder(
        &self,
        owner: UserId,
        title: &str,
        parent: Option<FolderId>,
    ) -> FolderRepoResult<Folder> {
        let folder_uuid = Uuid::new_v4();
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if let Some(parent) = parent {
            ensure_folder_exists(&tx, parent)?;
        }

        tx.execute(
            "INSERT INTO folders (folder_uuid, owner_uuid, title)
             VALUES (?1, ?2, ?3);",
            params![folder_uuid.to_string(), owner.to_string(), title],
        )?;
        if let Some(parent) = parent {
            append_subfolder(&tx, parent, folder_uuid)?;
        }
        tx.commit()?;

        load_folder(self.conn, folder_uuid)?.ok_or(FolderRepoError::FolderNotFound(folder_uuid))
    }

    fn get_folder(&self, id: FolderId) -> FolderRepoResult<Option<Folder>> {
        load_folder(self.conn, id)
    }

    fn owner_has_folders(&self, owner: UserId) -> FolderRepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM folders
                WHERE owner_uuid = ?1
            );",
            [owner.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn list_owner_folders(&self, owner: UserId) -> FolderRepoResult<Vec<Folder>> {
        let mut stmt = self.conn.prepare(
            "SELECT folder_uuid, owner_uuid, title, created_at, updated_at
             FROM folders
             WHERE owner_uuid = ?1
             ORDER BY rowid ASC;",
        )?;
        let mut rows = stmt.query([owner.to_string()])?;
        let mut folders = Vec::new();
        while let Some(row) = rows.next()? {
            folders.push(parse_folder_row(row)?);
        }
        drop(rows);

        for folder in &mut folders {
            fill_memberships(self.conn, folder)?;
        }
        Ok(folders)
    }

    fn find_root_folder(&self, owner: UserId) -> FolderRepoResult<Option<Folder>> {
        let mut stmt = self.conn.prepare(
            "SELECT f.folder_uuid
             FROM folders f
             WHERE f.owner_uuid = ?1
               AND NOT EXISTS (
                 SELECT 1
                 FROM folder_subfolders s
                 WHERE s.child_uuid = f.folder_uuid
               )
             ORDER BY f.rowid ASC
             LIMIT 1;",
        )?;
        let mut rows = stmt.query([owner.to_string()])?;
        let root_uuid = match rows.next()? {
            Some(row) => {
                let value: String = row.get(0)?;
                parse_uuid(&value, "folders.folder_uuid")?
            }
            None => return Ok(None),
        };
        load_folder(self.conn, root_uuid)
    }

    fn find_parent(&self, child: FolderId) -> FolderRepoResult<Option<FolderId>> {
        parent_of(self.conn, child)
    }

    fn find_item_folder(&self, item: ItemId) -> FolderRepoResult<Option<FolderId>> {
        folder_of_item(self.conn, item)
    }

    fn rename_folder(&self, id: FolderId, title: &str) -> FolderRepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE folders
             SET title = ?2,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE folder_uuid = ?1;",
            params![id.to_string(), title],
        )?;
        if changed == 0 {
            return Err(FolderRepoError::FolderNotFound(id));
        }
        Ok(())
    }

    fn reparent_folder(
        &self,
        folder: FolderId,
        new_parent: FolderId,
    ) -> FolderRepoResult<Option<FolderId>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_folder_exists(&tx, folder)?;
        ensure_folder_exists(&tx, new_parent)?;

        let previous = parent_of(&tx, folder)?;
        if let Some(previous) = previous {
            detach_subfolder(&tx, previous, folder)?;
        }
        append_subfolder(&tx, new_parent, folder)?;

        tx.commit()?;
        Ok(previous)
    }

    fn place_item(&self, item: ItemId, folder: FolderId) -> FolderRepoResult<Option<FolderId>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_folder_exists(&tx, folder)?;

        let previous = folder_of_item(&tx, item)?;
        if previous == Some(folder) {
            tx.commit()?;
            return Ok(previous);
        }
        if let Some(previous) = previous {
            detach_item(&tx, previous, item)?;
        }

        tx.execute(
            "INSERT INTO folder_items (folder_uuid, item_uuid) VALUES (?1, ?2);",
            params![folder.to_string(), item.to_string()],
        )?;
        touch_folder(&tx, folder)?;

        tx.commit()?;
        Ok(previous)
    }

    fn remove_item(&self, item: ItemId) -> FolderRepoResult<Option<FolderId>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let holder = folder_of_item(&tx, item)?;
        if let Some(holder) = holder {
            detach_item(&tx, holder, item)?;
        }
        tx.commit()?;
        Ok(holder)
    }

    fn delete_folders(
        &self,
        root: FolderId,
        closure: &[FolderId],
    ) -> FolderRepoResult<Vec<ItemId>> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        ensure_folder_exists(&tx, root)?;

        if let Some(parent) = parent_of(&tx, root)? {
            detach_subfolder(&tx, parent, root)?;
        }

        let ids: Vec<String> = closure.iter().map(ToString::to_string).collect();
        let mut orphaned = Vec::new();
        for chunk in ids.chunks(MAX_BATCH_SIZE) {
            let sql = format!(
                "SELECT item_uuid
                 FROM folder_items
                 WHERE folder_uuid IN ({})
                 ORDER BY folder_uuid ASC, rowid ASC;",
                placeholders(chunk.len())
            );
            let mut stmt = tx.prepare(&sql)?;
            let mut rows = stmt.query(params_from_iter(chunk.iter()))?;
            while let Some(row) = rows.next()? {
                let value: String = row.get(0)?;
                orphaned.push(parse_uuid(&value, "folder_items.item_uuid")?);
            }
        }

        for chunk in ids.chunks(MAX_BATCH_SIZE) {
            let sql = format!(
                "DELETE FROM folders WHERE folder_uuid IN ({});",
                placeholders(chunk.len())
            );
            tx.execute(&sql, params_from_iter(chunk.iter()))?;
        }

        tx.commit()?;
        Ok(orphaned)
    }
}

fn load_folder(conn: &Connection, id: FolderId) -> FolderRepoResult<Option<Folder>> {
    let mut stmt = conn.prepare(
        "SELECT folder_uuid, owner_uuid, title, created_at, updated_at
         FROM folders
         WHERE folder_uuid = ?1;",
    )?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut folder = match rows.next()? {
        Some(row) => parse_folder_row(row)?,
        None => return Ok(None),
    };
    fill_memberships(conn, &mut folder)?;
    Ok(Some(folder))
}

fn fill_memberships(conn: &Connection, folder: &mut Folder) -> FolderRepoResult<()> {
    let folder_uuid = folder.id.to_string();

    let mut stmt = conn.prepare(
        "SELECT child_uuid
         FROM folder_subfolders
         WHERE parent_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([folder_uuid.as_str()])?;
    let mut subfolders = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        subfolders.push(parse_uuid(&value, "folder_subfolders.child_uuid")?);
    }

    let mut stmt = conn.prepare(
        "SELECT item_uuid
         FROM folder_items
         WHERE folder_uuid = ?1;",
    )?;
    let mut rows = stmt.query([folder_uuid.as_str()])?;
    let mut items = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        items.insert(parse_uuid(&value, "folder_items.item_uuid")?);
    }

    folder.subfolders = subfolders;
    folder.items = items;
    Ok(())
}

fn ensure_folder_exists(conn: &Connection, id: FolderId) -> FolderRepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM folders
            WHERE folder_uuid = ?1
        );",
        [id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(FolderRepoError::FolderNotFound(id))
    }
}

fn parent_of(conn: &Connection, child: FolderId) -> FolderRepoResult<Option<FolderId>> {
    let mut stmt = conn.prepare(
        "SELECT parent_uuid
         FROM folder_subfolders
         WHERE child_uuid = ?1;",
    )?;
    let mut rows = stmt.query([child.to_string()])?;
    match rows.next()? {
        Some(row) => {
            let value: String = row.get(0)?;
            Ok(Some(parse_uuid(&value, "folder_subfolders.parent_uuid")?))
        }
        None => Ok(None),
    }
}

fn folder_of_item(conn: &Connection, item: ItemId) -> FolderRepoResult<Option<FolderId>> {
    let mut stmt = conn.prepare(
        "SELECT folder_uuid
         FROM folder_items
         WHERE item_uuid = ?1;",
    )?;
    let mut rows = stmt.query([item.to_string()])?;
    match rows.next()? {
        Some(row) => {
            let value: String = row.get(0)?;
            Ok(Some(parse_uuid(&value, "folder_items.folder_uuid")?))
        }
        None => Ok(None),
    }
}

/// Appends `child` to the end of `parent`'s sub-folders. No-op when present.
fn append_subfolder(conn: &Connection, parent: FolderId, child: FolderId) -> FolderRepoResult<()> {
    let present: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM folder_subfolders
            WHERE parent_uuid = ?1
              AND child_uuid = ?2
        );",
        params![parent.to_string(), child.to_string()],
        |row| row.get(0),
    )?;
    if present == 1 {
        return Ok(());
    }

    conn.execute(
        "INSERT INTO folder_subfolders (parent_uuid, child_uuid, position)
         SELECT ?1, ?2, COALESCE(MAX(position), -1) + 1
         FROM folder_subfolders
         WHERE parent_uuid = ?1;",
        params![parent.to_string(), child.to_string()],
    )?;
    touch_folder(conn, parent)
}

fn detach_subfolder(conn: &Connection, parent: FolderId, child: FolderId) -> FolderRepoResult<()> {
    conn.execute(
        "DELETE FROM folder_subfolders
         WHERE parent_uuid = ?1
           AND child_uuid = ?2;",
        params![parent.to_string(), child.to_string()],
    )?;
    touch_folder(conn, parent)
}

fn detach_item(conn: &Connection, folder: FolderId, item: ItemId) -> FolderRepoResult<()> {
    conn.execute(
        "DELETE FROM folder_items
         WHERE folder_uuid = ?1
           AND item_uuid = ?2;",
        params![folder.to_string(), item.to_string()],
    )?;
    touch_folder(conn, folder)
}

fn touch_folder(conn: &Connection, id: FolderId) -> FolderRepoResult<()> {
    conn.execute(
        "UPDATE folders
         SET updated_at = (strftime('%s', 'now') * 1000)
         WHERE folder_uuid = ?1;",
        [id.to_string()],
    )?;
    Ok(())
}

fn parse_folder_row(row: &Row<'_>) -> FolderRepoResult<Folder> {
    let folder_uuid: String = row.get("folder_uuid")?;
    let owner_uuid: String = row.get("owner_uuid")?;
    Ok(Folder {
        id: parse_uuid(&folder_uuid, "folders.folder_uuid")?,
        owner: parse_uuid(&owner_uuid, "folders.owner_uuid")?,
        title: row.get("title")?,
        subfolders: Vec::new(),
        items: BTreeSet::new(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_uuid(value: &str, column: &'static str) -> FolderRepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| FolderRepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}
