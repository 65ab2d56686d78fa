//! Offline administration of the settings file.
//!
//! User management runs against the persisted settings directly, not a
//! live server; restart (or first start) the daemon to pick changes up.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use crate::settings::Settings;
use crate::store::{AccessGrant, CredentialStore};

#[derive(Debug, Subcommand)]
pub enum UserOp {
    /// Create a user account.
    Add {
        name: String,
        password: String,
    },
    /// Delete a user and every session they own.
    Remove { name: String },
    /// Rename a user, carrying their sessions along.
    Rename { old: String, new: String },
    /// Reset a user's password.
    Passwd {
        name: String,
        password: String,
    },
    /// Grant a user access to a directory under a label.
    Grant {
        name: String,
        label: String,
        dir: PathBuf,
        #[arg(long)]
        read_only: bool,
    },
    /// Revoke one labelled grant.
    Revoke { name: String, label: String },
    /// List users and their grants.
    List,
}

pub fn run_user_op(settings_path: &Path, op: UserOp) -> Result<()> {
    let settings = Settings::load(settings_path)
        .with_context(|| format!("loading {}", settings_path.display()))?;
    let listen_addr = settings.listen_addr;
    let store = CredentialStore::from_parts(settings.users, settings.sessions);

    match op {
        UserOp::Add { name, password } => {
            if !store.create_user(&name, &password) {
                bail!("user {name:?} already exists");
            }
            println!("created {name}");
        }
        UserOp::Remove { name } => {
            store.remove_user(&name);
            println!("removed {name}");
        }
        UserOp::Rename { old, new } => {
            if !store.rename_user(&old, &new) {
                bail!("cannot rename {old:?} to {new:?}");
            }
            println!("renamed {old} to {new}");
        }
        UserOp::Passwd { name, password } => {
            if !store.set_user_password(&name, &password) {
                bail!("no user named {name:?}");
            }
            println!("password updated for {name}");
        }
        UserOp::Grant {
            name,
            label,
            dir,
            read_only,
        } => {
            let mut list = match store.access_list(&name) {
                Some(list) => list,
                None => bail!("no user named {name:?}"),
            };
            list.insert(label.clone(), AccessGrant { dir, read_only });
            store.set_access_list(&name, list);
            println!("granted {label} to {name}");
        }
        UserOp::Revoke { name, label } => {
            let mut list = match store.access_list(&name) {
                Some(list) => list,
                None => bail!("no user named {name:?}"),
            };
            if list.remove(&label).is_none() {
                bail!("{name} has no grant labelled {label:?}");
            }
            store.set_access_list(&name, list);
            println!("revoked {label} from {name}");
        }
        UserOp::List => {
            for name in store.user_names() {
                println!("{name}");
                if let Some(list) = store.access_list(&name) {
                    for (label, grant) in list {
                        let mode = if grant.read_only { "ro" } else { "rw" };
                        println!("  {label} -> {} ({mode})", grant.dir.display());
                    }
                }
            }
            return Ok(());
        }
    }

    let (users, sessions) = store.snapshot();
    let mut settings = Settings {
        listen_addr,
        users,
        sessions,
    };
    settings
        .save(settings_path)
        .with_context(|| format!("saving {}", settings_path.display()))?;
    Ok(())
}
