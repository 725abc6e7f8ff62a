//! Summary domain model.
//!
//! # Invariants
//! - At most one summary exists per item id.

use crate::model::folder::ItemId;
use serde::{Deserialize, Serialize};

/// Short text summary attached to one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub item: ItemId,
    pub text: String,
    /// Epoch ms creation timestamp.
    pub created_at: i64,
    /// Epoch ms timestamp of the last overwrite.
    pub updated_at: i64,
}
