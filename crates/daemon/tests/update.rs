//! Integration tests for the field update flow against the cache

mod common_setup;

use std::sync::Arc;

use sheetd_daemon::cache::{CachedSheet, SheetCache};
use sheetd_daemon::fields::{self, FieldUpdate, UpdateKind};

use common_setup::{seed_sheet, setup_store, LABEL};

fn text_update(key: &str, data: &str) -> FieldUpdate {
    FieldUpdate {
        kind: UpdateKind::Text,
        key: key.to_string(),
        data: data.to_string(),
    }
}

/// Mirror of the POST handler's republish step.
fn apply_and_republish(
    cache: &SheetCache,
    entry: &Arc<CachedSheet>,
    update: &FieldUpdate,
) -> Arc<CachedSheet> {
    let mut sheet = entry.sheet.clone();
    let changed = fields::apply(&mut sheet, update).unwrap();
    if !changed {
        return entry.clone();
    }
    sheet.mark_modified();
    let current_sum = sheet.checksum();
    let updated = Arc::new(CachedSheet {
        client_path: entry.client_path.clone(),
        path: entry.path.clone(),
        sheet,
        loaded_sum: entry.loaded_sum,
        current_sum,
    });
    cache.republish(updated.clone());
    updated
}

#[tokio::test]
async fn test_update_marks_dirty_and_stamps_modified() {
    let (store, dir) = setup_store("alice", false);
    seed_sheet(dir.path(), "conan.sheet", "Conan");
    let cache = SheetCache::new();
    let path = format!("{}/conan.sheet", LABEL);

    let (entry, _) = cache.resolve(&store, "Alice", &path).await.unwrap();
    let modified_before = entry.sheet.modified_on;

    let updated = apply_and_republish(&cache, &entry, &text_update("Identity.Name", "Conan II"));
    assert!(updated.dirty());
    assert_ne!(updated.current_sum, entry.current_sum);
    assert!(updated.sheet.modified_on >= modified_before);

    // The cache now serves the updated snapshot.
    let (resolved, _) = cache.resolve(&store, "Alice", &path).await.unwrap();
    assert!(Arc::ptr_eq(&resolved, &updated));
    assert_eq!(resolved.sheet.profile.name, "Conan II");
}

#[tokio::test]
async fn test_noop_update_leaves_entry_untouched() {
    let (store, dir) = setup_store("alice", false);
    seed_sheet(dir.path(), "conan.sheet", "Conan");
    let cache = SheetCache::new();
    let path = format!("{}/conan.sheet", LABEL);

    let (entry, _) = cache.resolve(&store, "Alice", &path).await.unwrap();

    // Whitespace-normalized equality with the current value: no new
    // snapshot, no checksum movement, no modified stamp.
    let same = apply_and_republish(&cache, &entry, &text_update("Identity.Name", "  Conan "));
    assert!(Arc::ptr_eq(&same, &entry));
    assert!(!same.dirty());
    assert_eq!(same.sheet.modified_on, entry.sheet.modified_on);
}

#[tokio::test]
async fn test_failed_validation_changes_nothing() {
    let (store, dir) = setup_store("alice", false);
    seed_sheet(dir.path(), "conan.sheet", "Conan");
    let cache = SheetCache::new();
    let path = format!("{}/conan.sheet", LABEL);

    let (entry, _) = cache.resolve(&store, "Alice", &path).await.unwrap();

    let mut sheet = entry.sheet.clone();
    let err = fields::apply(&mut sheet, &text_update("Description.SizeModifier", "150"));
    assert!(err.is_err());
    assert_eq!(sheet, entry.sheet);

    let (resolved, _) = cache.resolve(&store, "Alice", &path).await.unwrap();
    assert!(Arc::ptr_eq(&resolved, &entry));
    assert!(!resolved.dirty());
}
