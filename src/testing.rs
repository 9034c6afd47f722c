//! In-memory fakes of the git and provider collaborators for tests.
//!
//! [`FakeRemotes`] stores a file snapshot per repository and branch. Opening a
//! repository writes the main branch snapshot into a fresh temporary
//! directory; pushing stores the working tree back. Every effect is recorded
//! so tests can assert on exact call sequences.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use walkdir::WalkDir;

use crate::error::{GitError, ProviderError};
use crate::git::{GitRepository, MAIN_BRANCH, RepositoryFactory};
use crate::provider::{PullRequestHandle, PullRequestProvider};

type Snapshot = BTreeMap<String, Vec<u8>>;

/// A recorded git effect, tagged with `org/repo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitOp {
    Open(String),
    Checkout(String, String),
    NewBranch(String, String),
    Commit(String, String),
    Push(String, String),
}

#[derive(Debug, Default)]
struct RemotesInner {
    branches: HashMap<(String, String), Snapshot>,
    ops: Vec<GitOp>,
    workspaces: Vec<PathBuf>,
    fail_push: bool,
}

/// Shared fake remote state, usable as a [`RepositoryFactory`].
#[derive(Debug, Clone, Default)]
pub struct FakeRemotes {
    inner: Arc<Mutex<RemotesInner>>,
}

impl FakeRemotes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a file on the main branch of `org/repo`.
    pub fn with_file(self, repo: &str, path: &str, content: &str) -> Self {
        {
            let mut inner = self.inner.lock().unwrap();
            inner
                .branches
                .entry((repo.to_string(), MAIN_BRANCH.to_string()))
                .or_default()
                .insert(path.to_string(), content.as_bytes().to_vec());
        }
        self
    }

    /// Makes every push fail.
    pub fn fail_push(self) -> Self {
        self.inner.lock().unwrap().fail_push = true;
        self
    }

    pub fn ops(&self) -> Vec<GitOp> {
        self.inner.lock().unwrap().ops.clone()
    }

    pub fn commits(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                GitOp::Commit(_, message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn pushes(&self) -> Vec<String> {
        self.ops()
            .into_iter()
            .filter_map(|op| match op {
                GitOp::Push(_, branch) => Some(branch),
                _ => None,
            })
            .collect()
    }

    pub fn workspaces(&self) -> Vec<PathBuf> {
        self.inner.lock().unwrap().workspaces.clone()
    }

    /// Reads a file from a pushed branch.
    pub fn file(&self, repo: &str, branch: &str, path: &str) -> Option<String> {
        let inner = self.inner.lock().unwrap();
        inner
            .branches
            .get(&(repo.to_string(), branch.to_string()))
            .and_then(|snapshot| snapshot.get(path))
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn has_branch(&self, repo: &str, branch: &str) -> bool {
        self.inner
            .lock()
            .unwrap()
            .branches
            .contains_key(&(repo.to_string(), branch.to_string()))
    }

    fn record(&self, op: GitOp) {
        self.inner.lock().unwrap().ops.push(op);
    }
}

impl RepositoryFactory for FakeRemotes {
    fn open(
        &self,
        organisation: &str,
        repository: &str,
    ) -> Result<Box<dyn GitRepository>, GitError> {
        let name = format!("{organisation}/{repository}");
        let workspace = TempDir::new().map_err(|e| GitError::Workspace {
            path: std::env::temp_dir(),
            message: e.to_string(),
        })?;

        let snapshot = {
            let mut inner = self.inner.lock().unwrap();
            inner.workspaces.push(workspace.path().to_path_buf());
            inner
                .branches
                .get(&(name.clone(), MAIN_BRANCH.to_string()))
                .cloned()
                .unwrap_or_default()
        };
        write_snapshot(workspace.path(), &snapshot);
        self.record(GitOp::Open(name.clone()));

        Ok(Box::new(FakeRepository {
            remotes: self.clone(),
            name,
            committed: snapshot,
            workspace,
        }))
    }
}

/// Working copy handed out by [`FakeRemotes`].
#[derive(Debug)]
pub struct FakeRepository {
    remotes: FakeRemotes,
    name: String,
    committed: Snapshot,
    workspace: TempDir,
}

impl GitRepository for FakeRepository {
    fn checkout(&mut self, reference: &str) -> Result<(), GitError> {
        let branch = {
            let inner = self.remotes.inner.lock().unwrap();
            inner
                .branches
                .get(&(self.name.clone(), reference.to_string()))
                .cloned()
        };
        if let Some(snapshot) = branch {
            clear_dir(self.workspace.path());
            write_snapshot(self.workspace.path(), &snapshot);
            self.committed = snapshot;
        }
        self.remotes
            .record(GitOp::Checkout(self.name.clone(), reference.to_string()));
        Ok(())
    }

    fn new_branch(&mut self, branch: &str) -> Result<(), GitError> {
        self.remotes
            .record(GitOp::NewBranch(self.name.clone(), branch.to_string()));
        Ok(())
    }

    fn commit(&mut self, message: &str) -> Result<bool, GitError> {
        let current = read_snapshot(self.workspace.path());
        if current == self.committed {
            return Ok(false);
        }
        self.committed = current;
        self.remotes
            .record(GitOp::Commit(self.name.clone(), message.to_string()));
        Ok(true)
    }

    fn push(&mut self, branch: &str) -> Result<(), GitError> {
        let mut inner = self.remotes.inner.lock().unwrap();
        if inner.fail_push {
            return Err(GitError::push(branch, "remote rejected"));
        }
        inner
            .branches
            .insert((self.name.clone(), branch.to_string()), self.committed.clone());
        inner.ops.push(GitOp::Push(self.name.clone(), branch.to_string()));
        Ok(())
    }

    fn root(&self) -> &Path {
        self.workspace.path()
    }
}

fn read_snapshot(root: &Path) -> Snapshot {
    WalkDir::new(root)
        .into_iter()
        .map(Result::unwrap)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry
                .path()
                .strip_prefix(root)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            (relative, std::fs::read(entry.path()).unwrap())
        })
        .collect()
}

fn write_snapshot(root: &Path, snapshot: &Snapshot) {
    for (relative, content) in snapshot {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }
}

fn clear_dir(root: &Path) {
    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.unwrap();
        if entry.file_type().is_dir() {
            std::fs::remove_dir_all(entry.path()).unwrap();
        } else {
            std::fs::remove_file(entry.path()).unwrap();
        }
    }
}

/// A recorded provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    Create {
        source: String,
        target: String,
        title: String,
    },
    Merge {
        number: u64,
    },
    DeleteBranch(String),
}

#[derive(Debug, Default)]
struct ProviderInner {
    calls: Vec<ProviderCall>,
    next_number: u64,
    fail_merge: Option<ProviderError>,
}

/// Recording pull request provider.
#[derive(Debug, Clone, Default)]
pub struct FakeProvider {
    inner: Arc<Mutex<ProviderInner>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_merge(self, error: ProviderError) -> Self {
        self.inner.lock().unwrap().fail_merge = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.inner.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl PullRequestProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn create_pull_request(
        &self,
        source: &str,
        target: &str,
        title: &str,
        _description: &str,
    ) -> Result<PullRequestHandle, ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        inner.next_number += 1;
        inner.calls.push(ProviderCall::Create {
            source: source.to_string(),
            target: target.to_string(),
            title: title.to_string(),
        });
        Ok(PullRequestHandle {
            number: inner.next_number,
            url: format!("https://example.com/pull/{}", inner.next_number),
        })
    }

    async fn merge_pull_request(
        &self,
        pull_request: &PullRequestHandle,
    ) -> Result<(), ProviderError> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(error) = inner.fail_merge.clone() {
            return Err(error);
        }
        inner.calls.push(ProviderCall::Merge {
            number: pull_request.number,
        });
        Ok(())
    }

    async fn delete_branch(&self, branch: &str) -> Result<(), ProviderError> {
        self.inner
            .lock()
            .unwrap()
            .calls
            .push(ProviderCall::DeleteBranch(branch.to_string()));
        Ok(())
    }
}
