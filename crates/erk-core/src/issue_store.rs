//! Issue storage: where objective bodies are read from and written back to.
//!
//! The roadmap engine never talks to storage itself. Callers fetch a body,
//! run it through [`crate::roadmap`], and write the whole body back in one
//! call. Serializing concurrent writers is the store's job.

use crate::error::{ErkError, Result};
use crate::{io, paths};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::PathBuf;

pub trait IssueStore {
    fn get_issue_body(&self, issue: u64) -> Result<String>;

    /// Replace the entire body. No patch semantics.
    fn update_issue_body(&self, issue: u64, body: &str) -> Result<()>;

    /// Post a comment and return its id.
    fn add_comment(&self, issue: u64, body: &str) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueComment {
    pub id: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// FileIssueStore
// ---------------------------------------------------------------------------

/// Issues as files: `<dir>/<n>.md` holds the body and
/// `<dir>/<n>.comments.yaml` the comment log.
#[derive(Debug, Clone)]
pub struct FileIssueStore {
    dir: PathBuf,
}

impl FileIssueStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Create or overwrite an issue body.
    pub fn create_issue(&self, issue: u64, body: &str) -> Result<()> {
        io::atomic_write(&paths::issue_body_path(&self.dir, issue), body.as_bytes())
    }

    pub fn comments(&self, issue: u64) -> Result<Vec<IssueComment>> {
        let path = paths::issue_comments_path(&self.dir, issue);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&path)?;
        let comments: Vec<IssueComment> = serde_yaml::from_str(&data)?;
        Ok(comments)
    }

    fn require_issue(&self, issue: u64) -> Result<PathBuf> {
        let path = paths::issue_body_path(&self.dir, issue);
        if !path.exists() {
            return Err(ErkError::IssueNotFound(issue));
        }
        Ok(path)
    }
}

impl IssueStore for FileIssueStore {
    fn get_issue_body(&self, issue: u64) -> Result<String> {
        let path = self.require_issue(issue)?;
        Ok(std::fs::read_to_string(path)?)
    }

    fn update_issue_body(&self, issue: u64, body: &str) -> Result<()> {
        let path = self.require_issue(issue)?;
        io::atomic_write(&path, body.as_bytes())?;
        tracing::info!(issue, bytes = body.len(), "wrote issue body");
        Ok(())
    }

    fn add_comment(&self, issue: u64, body: &str) -> Result<String> {
        self.require_issue(issue)?;
        let mut comments = self.comments(issue)?;
        let id = format!("C{}", comments.len() + 1);
        comments.push(IssueComment {
            id: id.clone(),
            body: body.to_string(),
            created_at: Utc::now(),
        });
        let data = serde_yaml::to_string(&comments)?;
        io::atomic_write(
            &paths::issue_comments_path(&self.dir, issue),
            data.as_bytes(),
        )?;
        tracing::info!(issue, comment = %id, "posted issue comment");
        Ok(id)
    }
}

// ---------------------------------------------------------------------------
// FakeIssueStore
// ---------------------------------------------------------------------------

/// In-memory store for tests. Records every body write and comment.
#[derive(Debug, Default)]
pub struct FakeIssueStore {
    bodies: RefCell<BTreeMap<u64, String>>,
    writes: RefCell<Vec<(u64, String)>>,
    comments: RefCell<Vec<(u64, String)>>,
}

impl FakeIssueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issue(self, issue: u64, body: impl Into<String>) -> Self {
        self.bodies.borrow_mut().insert(issue, body.into());
        self
    }

    pub fn body(&self, issue: u64) -> Option<String> {
        self.bodies.borrow().get(&issue).cloned()
    }

    /// Every `update_issue_body` call, in order.
    pub fn writes(&self) -> Vec<(u64, String)> {
        self.writes.borrow().clone()
    }

    pub fn posted_comments(&self) -> Vec<(u64, String)> {
        self.comments.borrow().clone()
    }
}

impl IssueStore for FakeIssueStore {
    fn get_issue_body(&self, issue: u64) -> Result<String> {
        self.body(issue).ok_or(ErkError::IssueNotFound(issue))
    }

    fn update_issue_body(&self, issue: u64, body: &str) -> Result<()> {
        let mut bodies = self.bodies.borrow_mut();
        let slot = bodies
            .get_mut(&issue)
            .ok_or(ErkError::IssueNotFound(issue))?;
        *slot = body.to_string();
        self.writes.borrow_mut().push((issue, body.to_string()));
        Ok(())
    }

    fn add_comment(&self, issue: u64, body: &str) -> Result<String> {
        if !self.bodies.borrow().contains_key(&issue) {
            return Err(ErkError::IssueNotFound(issue));
        }
        let mut comments = self.comments.borrow_mut();
        comments.push((issue, body.to_string()));
        Ok(format!("C{}", comments.len()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileIssueStore::new(dir.path().join("issues"));
        store.create_issue(42, "# Objective\n").unwrap();
        assert_eq!(store.get_issue_body(42).unwrap(), "# Objective\n");

        store.update_issue_body(42, "# Changed\n").unwrap();
        assert_eq!(store.get_issue_body(42).unwrap(), "# Changed\n");
    }

    #[test]
    fn file_store_missing_issue() {
        let dir = TempDir::new().unwrap();
        let store = FileIssueStore::new(dir.path());
        assert!(matches!(
            store.get_issue_body(1),
            Err(ErkError::IssueNotFound(1))
        ));
        assert!(matches!(
            store.update_issue_body(1, "x"),
            Err(ErkError::IssueNotFound(1))
        ));
        assert!(!dir.path().join("1.md").exists());
    }

    #[test]
    fn file_store_comments_append() {
        let dir = TempDir::new().unwrap();
        let store = FileIssueStore::new(dir.path());
        store.create_issue(7, "body").unwrap();
        assert_eq!(store.add_comment(7, "first").unwrap(), "C1");
        assert_eq!(store.add_comment(7, "second").unwrap(), "C2");

        let comments = store.comments(7).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[1].body, "second");
        assert_eq!(store.get_issue_body(7).unwrap(), "body");
    }

    #[test]
    fn fake_store_records_writes() {
        let store = FakeIssueStore::new().with_issue(3, "old");
        store.update_issue_body(3, "new").unwrap();
        assert_eq!(store.body(3).as_deref(), Some("new"));
        assert_eq!(store.writes(), vec![(3, "new".to_string())]);
        assert!(store.update_issue_body(4, "x").is_err());
        assert_eq!(store.add_comment(3, "hi").unwrap(), "C1");
        assert!(store.add_comment(9, "hi").is_err());
    }
}
