use super::*;
use serde_json::json;

fn build_in_order(
    entries: &[(&str, Option<ChangeRecord>)],
) -> Result<TreeNode, TreeInvariantViolation> {
    let mut builder = TreeBuilder::new();
    for (key, record) in entries {
        builder.insert(key, record.as_ref())?;
    }
    Ok(builder.finish())
}

fn canonical(mut tree: TreeNode) -> TreeNode {
    tree.sort_children_recursive();
    tree
}

fn permutations<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut out = Vec::new();
    for i in 0..items.len() {
        let mut rest = items.to_vec();
        let head = rest.remove(i);
        for mut tail in permutations(&rest) {
            tail.insert(0, head.clone());
            out.push(tail);
        }
    }
    out
}

fn mapping(entries: &[(&str, Option<ChangeRecord>)]) -> DeltaMapping {
    entries
        .iter()
        .map(|(key, record)| (key.to_string(), record.clone()))
        .collect()
}

fn assert_leaf_dir_consistency(node: &TreeNode, entries: &[(&str, Option<ChangeRecord>)]) {
    for (key, record) in entries {
        let Some(record) = record else { continue };
        let mut current = node;
        for segment in key.trim_start_matches('/').split('/') {
            current = current
                .child(segment)
                .unwrap_or_else(|| panic!("missing node for {key}"));
        }
        if record.is_dir {
            assert!(current.children.is_some(), "{key} should have children");
            assert!(current.size.is_none());
        } else {
            assert!(current.is_leaf(), "{key} should be a leaf");
            assert_eq!(current.size, Some(record.bytes));
            assert_eq!(current.icon.as_deref(), Some(record.icon.as_str()));
        }
        assert_eq!(current.name.as_deref(), Some(record.path.as_str()));
    }
}

#[test]
fn empty_mapping_yields_bare_root() {
    let tree = build_tree(&DeltaMapping::new()).unwrap();

    assert_eq!(
        serde_json::to_value(&tree).unwrap(),
        json!({ "id": "dropbox", "name": "Dropbox", "children": [] })
    );
}

#[test]
fn top_level_file_becomes_leaf_without_children_key() {
    let tree = build_tree(&mapping(&[(
        "/a.txt",
        Some(ChangeRecord::file("/a.txt", 10, "x")),
    )]))
    .unwrap();

    assert_eq!(
        serde_json::to_value(&tree).unwrap(),
        json!({
            "id": "dropbox",
            "name": "Dropbox",
            "children": [
                { "id": "a.txt", "name": "/a.txt", "size": 10, "icon": "x" }
            ]
        })
    );
}

#[test]
fn nested_file_creates_placeholder_folder() {
    let tree = build_tree(&mapping(&[(
        "/folder/a.txt",
        Some(ChangeRecord::file("/folder/a.txt", 5, "y")),
    )]))
    .unwrap();

    assert_eq!(
        serde_json::to_value(&tree).unwrap()["children"],
        json!([
            {
                "id": "folder",
                "children": [
                    { "id": "a.txt", "name": "/folder/a.txt", "size": 5, "icon": "y" }
                ]
            }
        ])
    );
}

#[test]
fn folder_record_and_child_share_one_node_in_either_order() {
    let folder = ("/folder", Some(ChangeRecord::dir("/Folder")));
    let file = ("/folder/a.txt", Some(ChangeRecord::file("/Folder/a.txt", 1, "z")));

    let parent_first = build_in_order(&[folder.clone(), file.clone()]).unwrap();
    let child_first = build_in_order(&[file, folder]).unwrap();

    assert_eq!(parent_first, child_first);
    let children = parent_first.children.as_ref().unwrap();
    assert_eq!(children.len(), 1);
    let node = &children[0];
    assert_eq!(node.id, "folder");
    assert_eq!(node.name.as_deref(), Some("/Folder"));
    assert_eq!(node.children.as_ref().unwrap().len(), 1);
    assert_eq!(node.child("a.txt").unwrap().size, Some(1));
}

#[test]
fn empty_directory_keeps_children_key() {
    let tree = build_tree(&mapping(&[("/photos", Some(ChangeRecord::dir("/Photos")))])).unwrap();

    assert_eq!(
        serde_json::to_value(&tree).unwrap()["children"],
        json!([{ "id": "photos", "name": "/Photos", "children": [] }])
    );
}

#[test]
fn deletions_are_not_materialized() {
    let tree = build_tree(&mapping(&[
        ("/gone/deep/file.txt", None),
        ("/kept.txt", Some(ChangeRecord::file("/kept.txt", 3, "page_white"))),
    ]))
    .unwrap();

    let children = tree.children.as_ref().unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, "kept.txt");
    assert!(tree.child("gone").is_none());
}

#[test]
fn order_independent_over_all_permutations() {
    let entries = vec![
        ("/a", Some(ChangeRecord::dir("/A"))),
        ("/a/b", Some(ChangeRecord::dir("/A/b"))),
        ("/a/b/c.txt", Some(ChangeRecord::file("/A/b/c.txt", 7, "page_white_text"))),
        ("/a/d.png", Some(ChangeRecord::file("/A/d.png", 9, "page_white_picture"))),
        ("/e/f.css", Some(ChangeRecord::file("/E/f.css", 11, "page_white_code"))),
    ];
    let expected = canonical(build_in_order(&entries).unwrap());

    for order in permutations(&entries) {
        let tree = canonical(build_in_order(&order).unwrap());
        assert_eq!(tree, expected);
        assert_leaf_dir_consistency(&tree, &entries);
    }

    let e = expected.child("e").unwrap();
    assert!(e.name.is_none(), "ancestors never receive metadata on their own");
    assert_eq!(expected.total_size(), 27);
}

#[test]
fn rebuilding_same_mapping_is_idempotent() {
    let input = mapping(&[
        ("/x/y/z.bin", Some(ChangeRecord::file("/x/y/z.bin", 1, "page_white"))),
        ("/x", Some(ChangeRecord::dir("/x"))),
        ("/w.txt", Some(ChangeRecord::file("/w.txt", 2, "page_white_text"))),
        ("/v", None),
    ]);

    let first = canonical(build_tree(&input).unwrap());
    let second = canonical(build_tree(&input).unwrap());

    assert_eq!(first, second);
}

#[test]
fn sibling_ids_stay_unique_under_shared_prefixes() {
    let tree = build_tree(&mapping(&[
        ("/docs/a.txt", Some(ChangeRecord::file("/docs/a.txt", 1, "x"))),
        ("/docs/b.txt", Some(ChangeRecord::file("/docs/b.txt", 1, "x"))),
        ("/docs/sub/c.txt", Some(ChangeRecord::file("/docs/sub/c.txt", 1, "x"))),
    ]))
    .unwrap();

    let root_children = tree.children.as_ref().unwrap();
    assert_eq!(root_children.len(), 1);
    let docs = tree.child("docs").unwrap();
    let mut ids: Vec<_> = docs
        .children
        .as_ref()
        .unwrap()
        .iter()
        .map(|node| node.id.as_str())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["a.txt", "b.txt", "sub"]);
}

#[test]
fn file_used_as_ancestor_is_reported() {
    let file = ("/a", Some(ChangeRecord::file("/a", 1, "x")));
    let nested = ("/a/b.txt", Some(ChangeRecord::file("/a/b.txt", 1, "x")));

    let err = build_in_order(&[file.clone(), nested.clone()]).unwrap_err();
    assert_eq!(
        err,
        TreeInvariantViolation::FileAsAncestor {
            path: "/a/b.txt".into(),
            segment: "a".into(),
        }
    );

    let err = build_in_order(&[nested, file]).unwrap_err();
    assert_eq!(
        err,
        TreeInvariantViolation::KindConflict {
            path: "/a".into(),
            existing_is_dir: true,
        }
    );
    assert!(err.to_string().contains("record is a file"));
}

#[test]
fn build_tree_returns_no_partial_tree_on_violation() {
    let input = mapping(&[
        ("/a", Some(ChangeRecord::file("/a", 1, "x"))),
        ("/a/b", Some(ChangeRecord::dir("/a/b"))),
        ("/ok.txt", Some(ChangeRecord::file("/ok.txt", 1, "x"))),
    ]);

    assert!(build_tree(&input).is_err());
}

#[test]
fn root_targeting_and_doubled_separators_are_normalized() {
    let tree = build_in_order(&[
        ("/", Some(ChangeRecord::dir("/"))),
        (
            "//music//song.mp3",
            Some(ChangeRecord::file("/Music/song.mp3", 4, "page_white_sound")),
        ),
    ])
    .unwrap();

    assert_eq!(tree.name.as_deref(), Some(ROOT_NAME));
    let music = tree.child("music").unwrap();
    assert!(music.child("song.mp3").unwrap().is_leaf());
}

#[test]
fn serialized_tree_omits_absent_fields_instead_of_null() {
    let tree = build_tree(&mapping(&[(
        "/folder/a.txt",
        Some(ChangeRecord::file("/folder/a.txt", 5, "y")),
    )]))
    .unwrap();

    let text = serde_json::to_string(&tree).unwrap();
    assert!(!text.contains("null"));
}

#[test]
fn directory_record_on_existing_file_is_reported() {
    let err = build_in_order(&[
        ("/a", Some(ChangeRecord::file("/a", 1, "x"))),
        ("/a/", Some(ChangeRecord::dir("/a"))),
    ])
    .unwrap_err();

    assert_eq!(
        err,
        TreeInvariantViolation::KindConflict {
            path: "/a/".into(),
            existing_is_dir: false,
        }
    );
    assert!(
        err.to_string()
            .contains("record is a directory but the tree already holds a file")
    );
}

#[test]
fn later_file_record_refreshes_leaf_metadata() {
    let tree = build_in_order(&[
        ("/notes.txt", Some(ChangeRecord::file("/notes.txt", 1, "page_white"))),
        ("//notes.txt", Some(ChangeRecord::file("/Notes.txt", 8, "page_white_text"))),
    ])
    .unwrap();

    let children = tree.children.as_ref().unwrap();
    assert_eq!(children.len(), 1);
    let leaf = &children[0];
    assert!(leaf.is_leaf());
    assert_eq!(leaf.name.as_deref(), Some("/Notes.txt"));
    assert_eq!(leaf.size, Some(8));
    assert_eq!(leaf.icon.as_deref(), Some("page_white_text"));
}
