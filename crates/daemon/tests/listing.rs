//! Integration tests for the directory listing

mod common_setup;

use std::fs;

use sheetd_daemon::listing::list_for_user;

use common_setup::{seed_sheet, setup_store, LABEL};

#[test]
fn test_listing_collects_and_prunes() {
    let (store, dir) = setup_store("alice", false);
    let root = dir.path();

    seed_sheet(root, "top.sheet", "Top");
    fs::create_dir_all(root.join("alpha")).unwrap();
    seed_sheet(&root.join("alpha"), "one.sheet", "One");
    fs::create_dir_all(root.join("delta/nested")).unwrap();
    seed_sheet(&root.join("delta/nested"), "two.sheet", "Two");

    // Branches with no documents anywhere below them disappear.
    fs::create_dir_all(root.join("beta/empty_inner")).unwrap();
    fs::create_dir_all(root.join("gamma")).unwrap();
    fs::write(root.join("gamma/notes.txt"), b"not a sheet").unwrap();

    // Hidden names are invisible, including entire subtrees.
    fs::create_dir_all(root.join(".archive")).unwrap();
    seed_sheet(&root.join(".archive"), "secret.sheet", "Secret");
    seed_sheet(root, ".draft.sheet", "Draft");

    let roots = list_for_user(&store, "Alice");
    assert_eq!(roots.len(), 1);

    let tree = &roots[0];
    assert_eq!(tree.name, LABEL);
    assert_eq!(tree.files, vec!["top.sheet"]);

    let dir_names: Vec<_> = tree.dirs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(dir_names, vec!["alpha", "delta"]);

    assert_eq!(tree.dirs[0].files, vec!["one.sheet"]);
    assert_eq!(tree.dirs[1].dirs[0].name, "nested");
    assert_eq!(tree.dirs[1].dirs[0].files, vec!["two.sheet"]);
}

#[test]
fn test_listing_without_documents_is_empty() {
    let (store, dir) = setup_store("alice", false);
    fs::create_dir_all(dir.path().join("a/b/c")).unwrap();

    assert!(list_for_user(&store, "Alice").is_empty());
}

#[test]
fn test_listing_orders_labels_case_insensitively() {
    let (store, dir) = setup_store("alice", false);
    seed_sheet(dir.path(), "one.sheet", "One");

    let second = tempfile::tempdir().unwrap();
    seed_sheet(second.path(), "two.sheet", "Two");

    let mut list = store.access_list("Alice").unwrap();
    list.insert(
        "Bravo".to_string(),
        sheetd_daemon::store::AccessGrant {
            dir: second.path().to_path_buf(),
            read_only: true,
        },
    );
    store.set_access_list("Alice", list);

    let roots = list_for_user(&store, "Alice");
    let names: Vec<_> = roots.iter().map(|r| r.name.as_str()).collect();
    // Case-insensitive order: "Bravo" before "campaign".
    assert_eq!(names, vec!["Bravo", "campaign"]);
}

#[test]
fn test_unknown_user_lists_nothing() {
    let (store, _dir) = setup_store("alice", false);
    assert!(list_for_user(&store, "ghost").is_empty());
}
