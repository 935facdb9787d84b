use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Flat result of a delta aggregation: feed path key to the latest record
/// seen for it, or `None` when the path was deleted.
pub type DeltaMapping = HashMap<String, Option<ChangeRecord>>;

/// Metadata of one remote entry as reported by the change feed.
///
/// Only `path`, `is_dir`, `bytes` and `icon` drive tree building. The rest is
/// carried through untouched so raw mappings can be re-serialized.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChangeRecord {
    pub path: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub bytes: u64,
    #[serde(default)]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_mtime: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumb_exists: Option<bool>,
}

impl ChangeRecord {
    pub fn file(path: impl Into<String>, bytes: u64, icon: impl Into<String>) -> Self {
        Self {
            is_dir: false,
            bytes,
            icon: icon.into(),
            ..Self::bare(path.into())
        }
    }

    pub fn dir(path: impl Into<String>) -> Self {
        Self {
            is_dir: true,
            icon: "folder".to_string(),
            ..Self::bare(path.into())
        }
    }

    fn bare(path: String) -> Self {
        Self {
            path,
            is_dir: false,
            bytes: 0,
            icon: String::new(),
            size: None,
            modified: None,
            client_mtime: None,
            rev: None,
            revision: None,
            root: None,
            mime_type: None,
            thumb_exists: None,
        }
    }
}
