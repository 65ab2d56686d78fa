//! Shared scaffolding for daemon integration tests.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use common::prelude::Sheet;
use sheetd_daemon::store::{AccessGrant, CredentialStore};

pub const LABEL: &str = "campaign";

/// A store with one user holding a single grant over a fresh temp dir.
pub fn setup_store(user: &str, read_only: bool) -> (CredentialStore, TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = CredentialStore::new();
    assert!(store.create_user(user, "pw"));
    let mut list = BTreeMap::new();
    list.insert(
        LABEL.to_string(),
        AccessGrant {
            dir: dir.path().to_path_buf(),
            read_only,
        },
    );
    assert!(store.set_access_list(user, list));
    (store, dir)
}

/// Write a minimal document into `dir` and return its path.
pub fn seed_sheet(dir: &Path, file_name: &str, character: &str) -> PathBuf {
    let mut sheet = Sheet::new();
    sheet.profile.name = character.to_string();
    let path = dir.join(file_name);
    sheet.save(&path).expect("seed sheet");
    path
}
