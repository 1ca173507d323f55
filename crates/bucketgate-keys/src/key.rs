//! Object-key composition
//!
//! A stored key is an optional sub-folder joined to a file name with exactly
//! one `/`. Both halves arrive already sanitized; composition only normalizes
//! the folder's separators, so the invariants of [`SanitizedKey`] carry over
//! to the joined key.

use crate::SanitizedKey;
use serde::{Serialize, Serializer};
use std::fmt;

const SEPARATOR: char = '/';
const CURRENT_DIR: &str = ".";

/// Final storage key for an object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey {
    folder: Option<String>,
    file_name: SanitizedKey,
    full: String,
}

impl ObjectKey {
    /// Join an optional sanitized folder and a sanitized file name
    ///
    /// Empty and `.` segments of the folder are dropped, which also removes
    /// leading, trailing and doubled separators. A folder with nothing left
    /// is treated as absent.
    pub fn compose(folder: Option<&SanitizedKey>, file_name: &SanitizedKey) -> Self {
        let folder = folder
            .map(|folder| {
                folder
                    .as_str()
                    .split(SEPARATOR)
                    .filter(|segment| !segment.is_empty() && *segment != CURRENT_DIR)
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .filter(|folder| !folder.is_empty());

        let full = match &folder {
            Some(folder) => format!("{folder}{SEPARATOR}{file_name}"),
            None => file_name.to_string(),
        };

        Self {
            folder,
            file_name: file_name.clone(),
            full,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// The file-name half of the key
    pub const fn file_name(&self) -> &SanitizedKey {
        &self.file_name
    }

    /// The normalized folder prefix, if any
    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    /// `/`-separated segments of the full key
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.full.split(SEPARATOR)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl Serialize for ObjectKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.full)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.full
    }
}

/// Default name for an upload that arrived without one
///
/// Takes the timestamp as an argument so the only clock read stays in the
/// request handler.
pub fn fallback_name(unix_millis: i64) -> String {
    format!("upload-{unix_millis}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SanitizePolicy, sanitize};

    fn name(raw: &str) -> SanitizedKey {
        sanitize(raw, &SanitizePolicy::file_name()).unwrap()
    }

    fn folder(raw: &str) -> SanitizedKey {
        sanitize(raw, &SanitizePolicy::folder()).unwrap()
    }

    #[test]
    fn test_compose_without_folder() {
        let key = ObjectKey::compose(None, &name("report.pdf"));
        assert_eq!(key.as_str(), "report.pdf");
        assert_eq!(key.folder(), None);
    }

    #[test]
    fn test_compose_with_folder() {
        let key = ObjectKey::compose(Some(&folder("photos/2024")), &name("cat.png"));
        assert_eq!(key.as_str(), "photos/2024/cat.png");
        assert_eq!(key.folder(), Some("photos/2024"));
        assert_eq!(key.file_name().as_str(), "cat.png");
    }

    #[test]
    fn test_compose_normalizes_separators() {
        let key = ObjectKey::compose(Some(&folder("//a///b/")), &name("c.txt"));
        assert_eq!(key.as_str(), "a/b/c.txt");
    }

    #[test]
    fn test_compose_drops_current_dir_segments() {
        let key = ObjectKey::compose(Some(&folder("./a/./b")), &name("c"));
        assert_eq!(key.as_str(), "a/b/c");
    }

    #[test]
    fn test_folder_of_only_separators_is_absent() {
        let key = ObjectKey::compose(Some(&folder("///")), &name("c"));
        assert_eq!(key.as_str(), "c");
        assert_eq!(key.folder(), None);
    }

    #[test]
    fn test_traversal_folder_cannot_escape() {
        let key = ObjectKey::compose(Some(&folder("../../secrets")), &name("../x"));
        assert_eq!(key.as_str(), "_/_/secrets/__x");
        assert!(!key.as_str().contains(".."));
    }

    #[test]
    fn test_segments() {
        let key = ObjectKey::compose(Some(&folder("a/b")), &name("c"));
        assert_eq!(key.segments().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_serializes_as_full_key() {
        let key = ObjectKey::compose(Some(&folder("a")), &name("b"));
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"a/b\"");
    }

    #[test]
    fn test_fallback_name() {
        assert_eq!(fallback_name(1_700_000_000_000), "upload-1700000000000");
    }
}
