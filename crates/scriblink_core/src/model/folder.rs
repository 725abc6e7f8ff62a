//! Folder domain model.
//!
//! # Responsibility
//! - Define the container record used by the folder hierarchy.
//! - Name the opaque identifiers exchanged with external collaborators.
//!
//! # Invariants
//! - `owner` never changes after creation.
//! - `subfolders` keeps insertion order and holds no duplicates.
//! - Parent-of is not stored here; it is the folder whose `subfolders`
//!   lists this id.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable folder identifier.
pub type FolderId = Uuid;

/// Opaque item identifier (for example a note), owned outside this crate.
pub type ItemId = Uuid;

/// Opaque user identifier. Ownership checks compare it by value only.
pub type UserId = Uuid;

/// Title given to the folder created by root initialization.
pub const ROOT_FOLDER_TITLE: &str = "Root";

/// Named container of sub-folders and item references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub owner: UserId,
    pub title: String,
    /// Child folders in insertion order.
    pub subfolders: Vec<FolderId>,
    /// Items placed directly in this folder.
    pub items: BTreeSet<ItemId>,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms update timestamp.
    pub updated_at: i64,
}

impl Folder {
    /// Returns whether `child` is a direct sub-folder.
    pub fn has_subfolder(&self, child: FolderId) -> bool {
        self.subfolders.contains(&child)
    }

    /// Returns whether `item` is placed directly in this folder.
    pub fn has_item(&self, item: ItemId) -> bool {
        self.items.contains(&item)
    }

    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == user
    }

    /// Returns whether the folder has neither sub-folders nor items.
    pub fn is_empty(&self) -> bool {
        self.subfolders.is_empty() && self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Folder, ROOT_FOLDER_TITLE};
    use std::collections::BTreeSet;
    use uuid::Uuid;

    fn folder() -> Folder {
        Folder {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            title: ROOT_FOLDER_TITLE.to_string(),
            subfolders: Vec::new(),
            items: BTreeSet::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn membership_helpers_reflect_contents() {
        let mut value = folder();
        assert!(value.is_empty());

        let child = Uuid::new_v4();
        let item = Uuid::new_v4();
        value.subfolders.push(child);
        value.items.insert(item);

        assert!(value.has_subfolder(child));
        assert!(value.has_item(item));
        assert!(!value.has_item(child));
        assert!(!value.is_empty());
    }

    #[test]
    fn serializes_with_plain_field_names() {
        let value = folder();
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["title"], "Root");
        assert!(json["subfolders"].as_array().unwrap().is_empty());
    }
}
