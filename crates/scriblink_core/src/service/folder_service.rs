//! Folder hierarchy use-case service.
//!
//! # Responsibility
//! - Enforce ownership, single-root and acyclicity above the repository.
//! - Provide root initialization, child creation, move, item placement and
//!   cascading delete.
//!
//! # Invariants
//! - Each user initializes at most one root, and only while owning nothing.
//! - A folder never moves under itself or any of its descendants.
//! - Parent-of is answered by reverse lookup; a folder without a parent
//!   detaches cleanly on move and delete.
//! - Traversals keep a visited set and skip child ids that no longer
//!   resolve.

use crate::error::ErrorKind;
use crate::model::folder::{Folder, FolderId, ItemId, UserId, ROOT_FOLDER_TITLE};
use crate::repo::folder_repo::{FolderRepoError, FolderRepository};
use log::info;
use std::collections::{HashSet, VecDeque};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Outcome of a cascading folder delete.
///
/// Items are only detached here; callers decide what happens to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderDeletion {
    /// Deleted folder ids, starting with the requested folder.
    pub removed_folders: Vec<FolderId>,
    /// Items that were held by any deleted folder.
    pub orphaned_items: Vec<ItemId>,
}

/// Errors from folder service operations.
#[derive(Debug)]
pub enum FolderServiceError {
    /// Title is blank after trim.
    InvalidTitle,
    /// User already owns folders, so a root cannot be initialized.
    AlreadyExists(UserId),
    /// Target folder does not exist.
    FolderNotFound(FolderId),
    /// Requested parent folder does not exist.
    ParentNotFound(FolderId),
    /// Parent exists but belongs to another user.
    NotOwner { user: UserId, folder: FolderId },
    /// Folder and destination parent belong to different users.
    OwnerMismatch {
        folder: FolderId,
        new_parent: FolderId,
    },
    /// Folder was asked to move under itself.
    SelfMove(FolderId),
    /// Destination parent is a descendant of the folder being moved.
    CyclicMove {
        folder: FolderId,
        new_parent: FolderId,
    },
    /// Item is not placed in any folder.
    ItemNotFound(ItemId),
    /// Repository-level failure.
    Repo(FolderRepoError),
}

impl FolderServiceError {
    /// Maps this error onto the caller-facing taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTitle => ErrorKind::InvalidInput,
            Self::AlreadyExists(_) | Self::SelfMove(_) | Self::CyclicMove { .. } => {
                ErrorKind::StructuralViolation
            }
            Self::FolderNotFound(_) | Self::ParentNotFound(_) | Self::ItemNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::NotOwner { .. } | Self::OwnerMismatch { .. } => ErrorKind::PermissionDenied,
            Self::Repo(_) => ErrorKind::Storage,
        }
    }
}

impl Display for FolderServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTitle => write!(f, "folder title must not be blank"),
            Self::AlreadyExists(user) => {
                write!(f, "user {user} already has folders; root cannot be initialized")
            }
            Self::FolderNotFound(id) => write!(f, "folder not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "parent folder not found: {id}"),
            Self::NotOwner { user, folder } => {
                write!(f, "user {user} does not own folder {folder}")
            }
            Self::OwnerMismatch { folder, new_parent } => write!(
                f,
                "folder {folder} and destination {new_parent} have different owners"
            ),
            Self::SelfMove(id) => write!(f, "folder {id} cannot be moved into itself"),
            Self::CyclicMove { folder, new_parent } => write!(
                f,
                "move would create cycle: destination {new_parent} is a descendant of folder {folder}"
            ),
            Self::ItemNotFound(id) => write!(f, "item is not in any folder: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FolderServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FolderRepoError> for FolderServiceError {
    fn from(value: FolderRepoError) -> Self {
        match value {
            FolderRepoError::FolderNotFound(id) => Self::FolderNotFound(id),
            other => Self::Repo(other),
        }
    }
}

pub type FolderServiceResult<T> = Result<T, FolderServiceError>;

/// Folder hierarchy service facade.
pub struct FolderService<R: FolderRepository> {
    repo: R,
}

impl<R: FolderRepository> FolderService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates the user's root folder.
    ///
    /// Fails when the user owns any folder, root or not.
    pub fn initialize_root(&self, user: UserId) -> FolderServiceResult<Folder> {
        if self.repo.owner_has_folders(user)? {
            return Err(FolderServiceError::AlreadyExists(user));
        }
        let root = self.repo.insert_folder(user, ROOT_FOLDER_TITLE, None)?;
        info!(
            "event=folder_root_init module=folder_service status=ok user={} folder={}",
            user, root.id
        );
        Ok(root)
    }

    /// Creates one folder under an existing parent owned by `user`.
    ///
    /// Parent lookup and ownership are checked before the title.
    pub fn create_child(
        &self,
        user: UserId,
        title: impl Into<String>,
        parent: FolderId,
    ) -> FolderServiceResult<Folder> {
        let parent_folder = self
            .repo
            .get_folder(parent)?
            .ok_or(FolderServiceError::ParentNotFound(parent))?;
        if !parent_folder.is_owned_by(user) {
            return Err(FolderServiceError::NotOwner {
                user,
                folder: parent,
            });
        }
        let title = normalize_title(title.into())?;

        let folder = self
            .repo
            .insert_folder(user, title.as_str(), Some(parent))
            .map_err(|err| match err {
                FolderRepoError::FolderNotFound(id) => FolderServiceError::ParentNotFound(id),
                other => other.into(),
            })?;
        info!(
            "event=folder_create module=folder_service status=ok folder={} parent={}",
            folder.id, parent
        );
        Ok(folder)
    }

    /// Re-parents `folder` under `new_parent` and returns the moved folder.
    pub fn move_folder(
        &self,
        folder: FolderId,
        new_parent: FolderId,
    ) -> FolderServiceResult<Folder> {
        let moving = self.get_folder(folder)?;
        let destination = self
            .repo
            .get_folder(new_parent)?
            .ok_or(FolderServiceError::ParentNotFound(new_parent))?;

        if moving.owner != destination.owner {
            return Err(FolderServiceError::OwnerMismatch { folder, new_parent });
        }
        if folder == new_parent {
            return Err(FolderServiceError::SelfMove(folder));
        }
        if self.is_descendant(new_parent, folder)? {
            return Err(FolderServiceError::CyclicMove { folder, new_parent });
        }

        let previous = self.repo.reparent_folder(folder, new_parent)?;
        info!(
            "event=folder_move module=folder_service status=ok folder={} new_parent={} previous_parent={}",
            folder,
            new_parent,
            previous.map_or_else(|| "none".to_string(), |id| id.to_string())
        );
        self.get_folder(folder)
    }

    /// Places `item` into `folder`, taking it out of any other folder first.
    ///
    /// Repeating the call with the same arguments is a no-op.
    pub fn insert_item(&self, item: ItemId, folder: FolderId) -> FolderServiceResult<()> {
        let previous = self.repo.place_item(item, folder)?;
        if previous != Some(folder) {
            info!(
                "event=folder_item_insert module=folder_service status=ok item={} folder={}",
                item, folder
            );
        }
        Ok(())
    }

    /// Deletes `folder` and every folder reachable through its sub-folders.
    ///
    /// Items held by deleted folders are detached and reported, not deleted.
    pub fn delete_folder(&self, folder: FolderId) -> FolderServiceResult<FolderDeletion> {
        self.get_folder(folder)?;
        let removed_folders = self.collect_subtree(folder)?;
        let orphaned_items = self.repo.delete_folders(folder, &removed_folders)?;
        info!(
            "event=folder_delete module=folder_service status=ok folder={} removed_folders={} orphaned_items={}",
            folder,
            removed_folders.len(),
            orphaned_items.len()
        );
        Ok(FolderDeletion {
            removed_folders,
            orphaned_items,
        })
    }

    /// Removes `item` from the folder holding it.
    pub fn delete_item(&self, item: ItemId) -> FolderServiceResult<()> {
        let holder = self
            .repo
            .remove_item(item)?
            .ok_or(FolderServiceError::ItemNotFound(item))?;
        info!(
            "event=folder_item_delete module=folder_service status=ok item={} folder={}",
            item, holder
        );
        Ok(())
    }

    /// Renames one folder.
    pub fn rename_folder(
        &self,
        folder: FolderId,
        title: impl Into<String>,
    ) -> FolderServiceResult<Folder> {
        let title = normalize_title(title.into())?;
        self.repo.rename_folder(folder, title.as_str())?;
        self.get_folder(folder)
    }

    /// Loads one folder.
    pub fn get_folder(&self, folder: FolderId) -> FolderServiceResult<Folder> {
        self.repo
            .get_folder(folder)?
            .ok_or(FolderServiceError::FolderNotFound(folder))
    }

    /// Returns the user's root folder, if initialized.
    pub fn root_folder(&self, user: UserId) -> FolderServiceResult<Option<Folder>> {
        self.repo.find_root_folder(user).map_err(Into::into)
    }

    /// Lists all folders owned by `user` in creation order.
    pub fn list_folders(&self, user: UserId) -> FolderServiceResult<Vec<Folder>> {
        self.repo.list_owner_folders(user).map_err(Into::into)
    }

    /// Returns the parent of `folder`, or `None` for roots and detached folders.
    pub fn find_parent(&self, folder: FolderId) -> FolderServiceResult<Option<FolderId>> {
        self.get_folder(folder)?;
        self.repo.find_parent(folder).map_err(Into::into)
    }

    /// Returns the folder currently holding `item`.
    pub fn folder_of_item(&self, item: ItemId) -> FolderServiceResult<Option<FolderId>> {
        self.repo.find_item_folder(item).map_err(Into::into)
    }

    /// Resolves the direct sub-folders of `folder` in order.
    ///
    /// Child ids that no longer resolve are skipped.
    pub fn children(&self, folder: FolderId) -> FolderServiceResult<Vec<Folder>> {
        let parent = self.get_folder(folder)?;
        let mut children = Vec::with_capacity(parent.subfolders.len());
        for child in parent.subfolders {
            if let Some(child) = self.repo.get_folder(child)? {
                children.push(child);
            }
        }
        Ok(children)
    }

    /// Lists items placed directly in `folder`.
    pub fn items(&self, folder: FolderId) -> FolderServiceResult<Vec<ItemId>> {
        Ok(self.get_folder(folder)?.items.into_iter().collect())
    }

    /// Returns whether `target` is reachable from `ancestor` through
    /// sub-folder edges.
    ///
    /// Breadth-first; stops at the first hit. Unresolvable children are dead
    /// edges and are not expanded.
    pub fn is_descendant(
        &self,
        target: FolderId,
        ancestor: FolderId,
    ) -> FolderServiceResult<bool> {
        let mut visited = HashSet::from([ancestor]);
        let mut queue = VecDeque::from([ancestor]);

        while let Some(current) = queue.pop_front() {
            let Some(folder) = self.repo.get_folder(current)? else {
                continue;
            };
            for child in folder.subfolders {
                if child == target {
                    return Ok(true);
                }
                if visited.insert(child) {
                    queue.push_back(child);
                }
            }
        }
        Ok(false)
    }

    /// Collects `root` and every folder reachable from it, root first.
    fn collect_subtree(&self, root: FolderId) -> FolderServiceResult<Vec<FolderId>> {
        let mut visited = HashSet::new();
        let mut closure = Vec::new();
        let mut stack = vec![root];

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            let Some(folder) = self.repo.get_folder(current)? else {
                continue;
            };
            closure.push(current);
            stack.extend(folder.subfolders.into_iter().rev());
        }
        Ok(closure)
    }
}

fn normalize_title(value: String) -> FolderServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(FolderServiceError::InvalidTitle);
    }
    Ok(trimmed.to_string())
}
