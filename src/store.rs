use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::model::{leave_request::LeaveRequest, user::User};

pub const USERS_DB: &str = "users.json";
pub const LEAVE_REQUESTS_DB: &str = "leave_requests.json";

/// Whole-collection JSON persistence for users and leave requests.
///
/// There is no incremental API: every operation loads a full collection,
/// mutates it in memory and writes the full collection back. `lock` is the
/// advisory lock serializing one load-mutate-save cycle at a time; callers
/// that mutate must hold it via [`JsonStore::guard`] for the whole cycle.
pub struct JsonStore {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("creating data dir {}", dir.display()))?;
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    /// Advisory lock over both collections for a full load-mutate-save cycle.
    pub fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn load_users(&self) -> Result<Vec<User>> {
        self.read(USERS_DB)
    }

    pub fn save_users(&self, users: &[User]) -> Result<()> {
        self.write(USERS_DB, users)
    }

    pub fn load_requests(&self) -> Result<Vec<LeaveRequest>> {
        self.read(LEAVE_REQUESTS_DB)
    }

    pub fn save_requests(&self, requests: &[LeaveRequest]) -> Result<()> {
        self.write(LEAVE_REQUESTS_DB, requests)
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.dir.join(file);
        if !path.exists() {
            // A collection that was never written is an empty collection.
            return Ok(Vec::new());
        }
        let raw = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_slice(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    fn write<T: Serialize>(&self, file: &str, records: &[T]) -> Result<()> {
        let path = self.dir.join(file);
        let raw = serde_json::to_vec_pretty(records)?;
        atomic_write(&path, &raw).with_context(|| format!("writing {}", path.display()))
    }
}

/// Replace `path` in one step: write a temp file in the same directory, fsync,
/// then rename over the target. Either the whole collection lands or the
/// previous content stays intact.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::other("path has no parent"))?;
    let tmp = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name().and_then(|v| v.to_str()).unwrap_or("collection"),
        std::process::id(),
    ));

    {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp)?;
        file.write_all(content)?;
        file.sync_all()?;
    }

    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::model::role::Role;

    fn user(id: &str, role: Role, casual: u32) -> User {
        User {
            user_id: id.to_string(),
            name: format!("Name of {id}"),
            role,
            leave_balances: BTreeMap::from([("casual_leave".to_string(), casual)]),
        }
    }

    #[test]
    fn missing_collection_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        assert!(store.load_users().unwrap().is_empty());
        assert!(store.load_requests().unwrap().is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        store
            .save_users(&[user("user001", Role::Manager, 10)])
            .unwrap();

        let users = store.load_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_id, "user001");
        assert_eq!(users[0].role, Role::Manager);
        assert_eq!(users[0].leave_balances["casual_leave"], 10);
    }

    #[test]
    fn save_replaces_the_whole_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        store
            .save_users(&[
                user("user001", Role::Manager, 10),
                user("user002", Role::Employee, 5),
            ])
            .unwrap();
        store.save_users(&[user("user003", Role::Employee, 7)]).unwrap();

        let users = store.load_users().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].user_id, "user003");
    }

    #[test]
    fn role_defaults_to_employee_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(USERS_DB),
            r#"[{"user_id":"user009","name":"No Role","leave_balances":{"sick_leave":2}}]"#,
        )
        .unwrap();

        let store = JsonStore::open(dir.path()).unwrap();
        let users = store.load_users().unwrap();
        assert_eq!(users[0].role, Role::Employee);
    }
}
