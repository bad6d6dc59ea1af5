//! Remote entry and listing page types.

use serde::{Deserialize, Serialize};

/// Whether a remote entry is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Regular file
    File,
    /// Folder/directory
    Directory,
}

/// A snapshot of one object in the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Last path component, as displayed
    pub name: String,
    /// Full path with display casing (e.g. "/Reports/Q1.csv")
    pub path: String,
    /// Full path lower-cased, used for comparisons
    pub path_lower: String,
    /// File or directory
    pub kind: EntryKind,
    /// File size in bytes (0 for directories)
    pub size: u64,
    /// Revision identifier (files only)
    pub rev: Option<String>,
}

impl RemoteEntry {
    /// Build a file entry from its full path.
    pub fn file(path: impl Into<String>, size: u64, rev: Option<String>) -> Self {
        let path = path.into();
        Self {
            name: last_component(&path).to_string(),
            path_lower: path.to_lowercase(),
            path,
            kind: EntryKind::File,
            size,
            rev,
        }
    }

    /// Build a directory entry from its full path.
    pub fn directory(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            name: last_component(&path).to_string(),
            path_lower: path.to_lowercase(),
            path,
            kind: EntryKind::Directory,
            size: 0,
            rev: None,
        }
    }

    /// Check if this entry is a file.
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Check if this entry is a directory.
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

fn last_component(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// One page of a directory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListPage {
    /// Entries on this page, in store order
    pub entries: Vec<RemoteEntry>,
    /// Opaque token for fetching the next page
    pub cursor: String,
    /// Whether another page is available
    pub has_more: bool,
}

impl ListPage {
    /// Names of the entries on this page.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_constructors() {
        let file = RemoteEntry::file("/Data/Results.CSV", 42, Some("a1b2".to_string()));
        assert!(file.is_file());
        assert!(!file.is_directory());
        assert_eq!(file.name, "Results.CSV");
        assert_eq!(file.path_lower, "/data/results.csv");
        assert_eq!(file.size, 42);

        let dir = RemoteEntry::directory("/Data");
        assert!(dir.is_directory());
        assert_eq!(dir.name, "Data");
        assert_eq!(dir.size, 0);
        assert!(dir.rev.is_none());
    }

    #[test]
    fn test_page_names() {
        let page = ListPage {
            entries: vec![
                RemoteEntry::directory("/a"),
                RemoteEntry::file("/a/b.txt", 1, None),
            ],
            cursor: "c".to_string(),
            has_more: false,
        };
        assert_eq!(page.names(), vec!["a".to_string(), "b.txt".to_string()]);
    }
}
