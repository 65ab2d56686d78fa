use std::path::Path;

use serde::{Deserialize, Serialize};

use common::prelude::SHEET_EXT;

use crate::store::CredentialStore;

/// Names beginning with this marker are invisible to the listing; a
/// hidden directory hides its entire subtree.
const HIDDEN_MARKER: char = '.';

/// One branch of the pruned document tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirNode {
    /// Access-list label at the top level, bare path segment below.
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dirs: Vec<DirNode>,
}

impl DirNode {
    fn new(name: String) -> Self {
        DirNode {
            name,
            files: Vec::new(),
            dirs: Vec::new(),
        }
    }

    /// A node is kept only when its subtree holds at least one document.
    fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.is_empty()
    }
}

/// Build the pruned document tree for every grant in a user's access
/// list, labels in case-insensitive order. Unreadable roots are logged
/// and skipped rather than failing the whole listing.
pub fn list_for_user(store: &CredentialStore, user: &str) -> Vec<DirNode> {
    let Some(access) = store.access_list(user) else {
        return Vec::new();
    };
    let mut labels: Vec<_> = access.keys().cloned().collect();
    labels.sort_by_key(|label| label.to_lowercase());

    let mut roots = Vec::new();
    for label in labels {
        let grant = &access[&label];
        match walk(&grant.dir, label.clone()) {
            Ok(node) => {
                if !node.is_empty() {
                    roots.push(node);
                }
            }
            Err(e) => {
                tracing::warn!(label, dir = %grant.dir.display(), "skipping unreadable grant root: {e}");
            }
        }
    }
    roots
}

fn walk(dir: &Path, name: String) -> std::io::Result<DirNode> {
    let mut node = DirNode::new(name);
    let mut entries: Vec<_> = std::fs::read_dir(dir)?.collect::<Result<_, _>>()?;
    entries.sort_by_key(|e| e.file_name().to_string_lossy().to_lowercase());

    for entry in entries {
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();
        if file_name.starts_with(HIDDEN_MARKER) {
            continue;
        }
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            let child = walk(&entry.path(), file_name.to_string())?;
            // Bottom-up prune: branches without documents disappear.
            if !child.is_empty() {
                node.dirs.push(child);
            }
        } else if has_sheet_extension(&file_name) {
            node.files.push(file_name.to_string());
        }
    }
    Ok(node)
}

fn has_sheet_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(SHEET_EXT))
}
