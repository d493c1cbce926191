use std::collections::{BTreeMap, HashMap, hash_map::Entry};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::models::UserRecord;

/// GroupPathMap
///
/// Group name to the path prefixes that group restricts.
pub type GroupPathMap = BTreeMap<String, Vec<String>>;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Directory
///
/// The process-wide user table and group map. Built once at startup and never
/// mutated afterwards, so it is shared across requests without locking.
#[derive(Debug, Default)]
pub struct Directory {
    users: HashMap<String, UserRecord>,
    groups: GroupPathMap,
}

/// DirectoryState
///
/// The shared handle stored in the application state.
pub type DirectoryState = Arc<Directory>;

impl Directory {
    /// Indexes `users` by id. When ids repeat, the earliest record is kept.
    pub fn new(users: Vec<UserRecord>, groups: GroupPathMap) -> Self {
        let mut index = HashMap::with_capacity(users.len());
        for user in users {
            if let Entry::Vacant(slot) = index.entry(user.id.clone()) {
                slot.insert(user);
            } else {
                tracing::warn!(user_id = %user.id, "duplicate user id in table, keeping first");
            }
        }
        Self {
            users: index,
            groups,
        }
    }

    /// load
    ///
    /// Reads `users.json` (array of records) and `groups.json` (object of
    /// group to prefix list).
    pub fn load(
        users_file: impl AsRef<Path>,
        groups_file: impl AsRef<Path>,
    ) -> Result<Self, DirectoryError> {
        let users: Vec<UserRecord> = read_json(users_file.as_ref())?;
        let groups: GroupPathMap = read_json(groups_file.as_ref())?;

        tracing::info!(
            users = users.len(),
            groups = groups.len(),
            "directory loaded"
        );

        Ok(Self::new(users, groups))
    }

    /// Looks a user up by id, active or not.
    pub fn user(&self, id: &str) -> Option<&UserRecord> {
        self.users.get(id)
    }

    /// authenticate
    ///
    /// Login lookup: exact id, case-insensitive surname, active account. Only
    /// the record kept for the id is considered, the same one the gate checks
    /// on every request.
    pub fn authenticate(&self, id: &str, surname: &str) -> Option<&UserRecord> {
        self.users
            .get(id)
            .filter(|user| user.surname.to_lowercase() == surname.to_lowercase())
            .filter(|user| user.is_active())
    }

    pub fn group_paths(&self) -> &GroupPathMap {
        &self.groups
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DirectoryError> {
    let raw = std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| DirectoryError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
