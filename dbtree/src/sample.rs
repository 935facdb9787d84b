//! Fixed mapping used to exercise the tree without a Dropbox account.

use dbtree_core::{ChangeRecord, DeltaMapping};

fn folder(path: &str, icon: &str, rev: &str, revision: u64, modified: &str) -> ChangeRecord {
    ChangeRecord {
        icon: icon.to_string(),
        size: Some("0 bytes".to_string()),
        modified: Some(modified.to_string()),
        rev: Some(rev.to_string()),
        revision: Some(revision),
        root: Some("dropbox".to_string()),
        thumb_exists: Some(false),
        ..ChangeRecord::dir(path)
    }
}

pub fn sample_mapping() -> DeltaMapping {
    let mut mapping = DeltaMapping::new();
    mapping.insert(
        "/photos".to_string(),
        Some(folder(
            "/Photos",
            "folder",
            "106cda493",
            1,
            "Thu, 29 Mar 2012 21:19:51 +0000",
        )),
    );
    mapping.insert(
        "/public".to_string(),
        Some(folder(
            "/Public",
            "folder_public",
            "206cda493",
            2,
            "Thu, 29 Mar 2012 21:19:51 +0000",
        )),
    );
    mapping.insert(
        "/public/myfolder".to_string(),
        Some(folder(
            "/Public/myfolder",
            "folder",
            "9d06cda493",
            157,
            "Thu, 29 Mar 2012 21:57:31 +0000",
        )),
    );
    mapping.insert(
        "/public/myfolder/myimagefile.png".to_string(),
        Some(ChangeRecord {
            size: Some("5.4 KB".to_string()),
            modified: Some("Tue, 29 Apr 2014 01:26:20 +0000".to_string()),
            client_mtime: Some("Tue, 29 Apr 2014 01:26:20 +0000".to_string()),
            rev: Some("9f06cda493".to_string()),
            revision: Some(159),
            root: Some("dropbox".to_string()),
            mime_type: Some("image/png".to_string()),
            thumb_exists: Some(true),
            ..ChangeRecord::file("/Public/myfolder/MyImageFile.PNG", 5575, "page_white_picture")
        }),
    );
    mapping.insert(
        "/mycssfile.css".to_string(),
        Some(ChangeRecord {
            size: Some("919 bytes".to_string()),
            modified: Some("Tue, 29 Apr 2014 01:17:44 +0000".to_string()),
            client_mtime: Some("Tue, 29 Apr 2014 01:17:44 +0000".to_string()),
            rev: Some("9e06cda493".to_string()),
            revision: Some(158),
            root: Some("dropbox".to_string()),
            mime_type: Some("text/css".to_string()),
            thumb_exists: Some(false),
            ..ChangeRecord::file("/MyCssFile.css", 919, "page_white_code")
        }),
    );
    mapping
}
