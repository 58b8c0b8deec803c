//! Materialized folder paths.
//!
//! A folder's position in the tree is encoded as a slash-delimited string
//! of ancestor folder ids: `/id1/id2/.../idN/`. The format guarantees that
//! every ancestor's path is a strict prefix of every descendant's path,
//! which turns subtree membership into a string-prefix test and subtree
//! rewrites into a prefix replacement. No parent-pointer walking happens
//! at request time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// A materialized folder path of the form `/id1/id2/.../idN/`.
///
/// Always starts and ends with `/`. The last segment is the folder's own
/// id, so a folder's path covers itself as well as all descendants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct FolderPath(String);

impl FolderPath {
    /// Path of a root folder: `/{id}/`.
    pub fn root(id: Uuid) -> Self {
        Self(format!("/{id}/"))
    }

    /// Path of a direct child of this folder: `{self}{id}/`.
    pub fn child(&self, id: Uuid) -> Self {
        Self(format!("{}{}/", self.0, id))
    }

    /// Return the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `other` lies inside the subtree rooted at `self`.
    ///
    /// True for `self` itself: a folder's own path is a (non-strict)
    /// prefix of itself.
    pub fn covers(&self, other: &FolderPath) -> bool {
        other.0.starts_with(&self.0)
    }

    /// Rewrite this path after its subtree root moved from `old_prefix`
    /// to `new_prefix`, preserving the remainder.
    ///
    /// Returns `None` if `old_prefix` does not cover this path.
    pub fn rebase(&self, old_prefix: &FolderPath, new_prefix: &FolderPath) -> Option<FolderPath> {
        let suffix = self.0.strip_prefix(&old_prefix.0)?;
        Some(Self(format!("{}{}", new_prefix.0, suffix)))
    }

    /// The folder ids along this path, root first.
    pub fn segments(&self) -> Vec<Uuid> {
        self.0
            .split('/')
            .filter(|s| !s.is_empty())
            .filter_map(|s| Uuid::from_str(s).ok())
            .collect()
    }

    /// The id of the folder this path belongs to (its last segment).
    pub fn leaf(&self) -> Option<Uuid> {
        self.segments().pop()
    }

    /// The parent folder's path, or `None` for a root folder.
    pub fn parent(&self) -> Option<FolderPath> {
        let trimmed = self.0.strip_suffix('/')?;
        let cut = trimmed.rfind('/')?;
        if cut == 0 {
            return None;
        }
        Some(Self(trimmed[..=cut].to_string()))
    }

    /// Number of folders along this path (1 for a root folder).
    pub fn depth(&self) -> usize {
        self.segments().len()
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FolderPath {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.starts_with('/') || !s.ends_with('/') || s.len() < 3 {
            return Err(AppError::validation(format!(
                "Malformed folder path: '{s}'"
            )));
        }
        let segments: Vec<&str> = s.split('/').filter(|p| !p.is_empty()).collect();
        if segments.is_empty() || segments.iter().any(|p| Uuid::from_str(p).is_err()) {
            return Err(AppError::validation(format!(
                "Folder path segments must be UUIDs: '{s}'"
            )));
        }
        Ok(Self(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_of(ids: &[Uuid]) -> FolderPath {
        let mut path = FolderPath::root(ids[0]);
        for id in &ids[1..] {
            path = path.child(*id);
        }
        path
    }

    #[test]
    fn test_root_format() {
        let id = Uuid::new_v4();
        let path = FolderPath::root(id);
        assert_eq!(path.as_str(), format!("/{id}/"));
        assert_eq!(path.depth(), 1);
        assert_eq!(path.leaf(), Some(id));
        assert!(path.parent().is_none());
    }

    #[test]
    fn test_child_extends_parent() {
        let parent_id = Uuid::new_v4();
        let child_id = Uuid::new_v4();
        let parent = FolderPath::root(parent_id);
        let child = parent.child(child_id);
        assert_eq!(child.as_str(), format!("/{parent_id}/{child_id}/"));
        assert_eq!(child.parent(), Some(parent.clone()));
        assert!(parent.covers(&child));
        assert!(!child.covers(&parent));
    }

    #[test]
    fn test_covers_is_reflexive() {
        let path = FolderPath::root(Uuid::new_v4());
        assert!(path.covers(&path));
    }

    #[test]
    fn test_sibling_not_covered() {
        let root = FolderPath::root(Uuid::new_v4());
        let a = root.child(Uuid::new_v4());
        let b = root.child(Uuid::new_v4());
        assert!(!a.covers(&b));
        assert!(!b.covers(&a));
    }

    #[test]
    fn test_rebase_preserves_suffix() {
        let ids: Vec<Uuid> = (0..4).map(|_| Uuid::new_v4()).collect();
        // /a/b/c/d/ — move /a/b/ under a new root /x/.
        let moved = path_of(&ids[..2]);
        let deep = path_of(&ids);
        let new_root = FolderPath::root(Uuid::new_v4());
        let new_moved = new_root.child(ids[1]);

        let rebased = deep.rebase(&moved, &new_moved).expect("prefix must match");
        assert_eq!(
            rebased.as_str(),
            format!("{}{}/{}/", new_moved.as_str(), ids[2], ids[3])
        );
        assert!(new_moved.covers(&rebased));
    }

    #[test]
    fn test_rebase_rejects_non_prefix() {
        let a = FolderPath::root(Uuid::new_v4());
        let b = FolderPath::root(Uuid::new_v4());
        assert!(b.rebase(&a, &b).is_none());
    }

    #[test]
    fn test_segments_roundtrip() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let path = path_of(&ids);
        assert_eq!(path.segments(), ids);
        assert_eq!(path.depth(), 3);
        assert_eq!(path.leaf(), Some(ids[2]));
    }

    #[test]
    fn test_parse_validates_format() {
        let id = Uuid::new_v4();
        assert!(format!("/{id}/").parse::<FolderPath>().is_ok());
        assert!("/not-a-uuid/".parse::<FolderPath>().is_err());
        assert!(format!("/{id}").parse::<FolderPath>().is_err());
        assert!(format!("{id}/").parse::<FolderPath>().is_err());
        assert!("//".parse::<FolderPath>().is_err());
    }
}
