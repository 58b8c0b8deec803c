//! Pure move validation over materialized paths.
//!
//! These checks run before any row is touched; every rejection is a
//! `Validation` error so callers can distinguish bad requests from
//! missing resources or denied permissions.

use filevault_core::FolderPath;
use filevault_core::error::AppError;
use filevault_core::result::AppResult;
use filevault_entity::folder::Folder;

/// The path a folder will have after landing under `dest`
/// (`None` = account root).
pub fn destination_path(folder: &Folder, dest: Option<&Folder>) -> FolderPath {
    match dest {
        Some(parent) => parent.path.child(folder.id),
        None => FolderPath::root(folder.id),
    }
}

/// Reject structurally invalid folder moves.
///
/// Self-moves and moves into the folder's own subtree would corrupt the
/// path invariant; trashed destinations would strand live rows under a
/// trashed ancestor.
pub fn validate_move(
    source: &Folder,
    dest: Option<&Folder>,
    dest_trashed: bool,
) -> AppResult<()> {
    let Some(dest) = dest else {
        return Ok(());
    };

    if dest.id == source.id {
        return Err(AppError::validation("A folder cannot be moved into itself"));
    }
    if source.path.covers(&dest.path) {
        return Err(AppError::validation(
            "A folder cannot be moved into its own subtree",
        ));
    }
    if dest_trashed {
        return Err(AppError::validation("Destination folder is in the trash"));
    }
    Ok(())
}

/// Whether the move leaves the folder exactly where it already is.
pub fn is_same_location(source: &Folder, new_parent_id: Option<uuid::Uuid>) -> bool {
    source.parent_id == new_parent_id
}
