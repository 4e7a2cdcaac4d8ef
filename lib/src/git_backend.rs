// Copyright 2023 The fnhist Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! [`Backend`] implementation reading a git repository through `gix`.

use std::collections::HashMap;
use std::fmt;
use std::fmt::Debug;
use std::path::Path;

use thiserror::Error;

use crate::backend::Backend;
use crate::backend::BackendError;
use crate::backend::BackendResult;
use crate::backend::Commit;
use crate::backend::FileIter;
use crate::backend::MillisSinceEpoch;
use crate::backend::Signature;
use crate::backend::Timestamp;
use crate::object_id::CommitId;
use crate::object_id::ObjectId as _;

#[derive(Debug, Error)]
pub enum GitBackendLoadError {
    #[error("Failed to open git repository")]
    OpenRepository(#[source] Box<gix::open::Error>),
}

/// Reads commits and blobs from a git working copy or bare repository.
pub struct GitBackend {
    // gix::Repository is cheap to derive from the thread-safe handle but
    // not Sync itself, so every operation works on a thread-local copy.
    base_repo: gix::ThreadSafeRepository,
}

impl GitBackend {
    pub fn load(path: &Path) -> Result<Self, GitBackendLoadError> {
        let base_repo = gix::ThreadSafeRepository::open(path)
            .map_err(|err| GitBackendLoadError::OpenRepository(Box::new(err)))?;
        Ok(Self { base_repo })
    }

    fn repo(&self) -> gix::Repository {
        self.base_repo.to_thread_local()
    }

    pub fn git_repo_path(&self) -> &Path {
        self.base_repo.path()
    }
}

impl Debug for GitBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitBackend")
            .field("path", &self.base_repo.path())
            .finish_non_exhaustive()
    }
}

fn to_read_object_err(
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    id: impl fmt::Display,
) -> BackendError {
    BackendError::ReadObject {
        hash: id.to_string(),
        source: err.into(),
    }
}

fn git_oid(id: &CommitId) -> BackendResult<gix::ObjectId> {
    gix::ObjectId::try_from(id.as_bytes()).map_err(|err| to_read_object_err(err, id))
}

fn signature_from_git(signature: gix::actor::SignatureRef) -> Signature {
    let time = signature.time().unwrap_or_default();
    Signature {
        name: String::from_utf8_lossy(signature.name).into_owned(),
        email: String::from_utf8_lossy(signature.email).into_owned(),
        timestamp: Timestamp {
            timestamp: MillisSinceEpoch(time.seconds * 1000),
            tz_offset: time.offset.div_euclid(60),
        },
    }
}

fn commit_from_git(id: CommitId, commit_ref: &gix::objs::CommitRef) -> Commit {
    Commit {
        parents: commit_ref
            .parents()
            .map(|oid| CommitId::from_bytes(oid.as_bytes()))
            .collect(),
        author: signature_from_git(commit_ref.author()),
        committer: signature_from_git(commit_ref.committer()),
        id,
    }
}

/// Recursively records `(path, blob id)` for every file under `tree`.
fn collect_tree_files(
    tree: gix::Tree<'_>,
    prefix: &str,
    out: &mut Vec<(String, gix::ObjectId)>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    for entry in tree.iter() {
        let entry = entry?;
        let name = entry.filename().to_string();
        let path = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        let mode = entry.mode();
        if mode.is_tree() {
            let subtree = entry.object()?.try_into_tree()?;
            collect_tree_files(subtree, &path, out)?;
        } else if mode.is_blob() {
            out.push((path, entry.oid().to_owned()));
        }
    }
    Ok(())
}

impl Backend for GitBackend {
    fn resolve_reference(&self, reference: &str) -> BackendResult<CommitId> {
        let repo = self.repo();
        // rev-parse handles both spellings the interface allows: a (full or
        // abbreviated) hash, or a branch short name.
        let id = repo
            .rev_parse_single(reference)
            .map_err(|_| BackendError::ReferenceNotFound {
                reference: reference.to_string(),
            })?;
        Ok(CommitId::from_bytes(id.as_bytes()))
    }

    fn commits_from(&self, head: &CommitId) -> BackendResult<HashMap<CommitId, Commit>> {
        let repo = self.repo();
        let head_oid = git_oid(head)?;
        let walk = repo
            .rev_walk([head_oid])
            .all()
            .map_err(|err| to_read_object_err(err, head))?;
        let mut commits = HashMap::new();
        for info in walk {
            let info = info.map_err(|err| to_read_object_err(err, head))?;
            let id = CommitId::from_bytes(info.id.as_bytes());
            let object = repo
                .find_object(info.id)
                .map_err(|err| to_read_object_err(err, &id))?;
            let commit_ref = object
                .try_to_commit_ref()
                .map_err(|err| to_read_object_err(err, &id))?;
            let commit = commit_from_git(id, &commit_ref);
            commits.insert(commit.id.clone(), commit);
        }
        Ok(commits)
    }

    fn files(&self, commit: &CommitId) -> BackendResult<FileIter<'_>> {
        let repo = self.repo();
        let commit_oid = git_oid(commit)?;
        let tree = repo
            .find_commit(commit_oid)
            .map_err(|err| BackendError::ListFiles {
                hash: commit.hex(),
                source: err.into(),
            })?
            .tree()
            .map_err(|err| BackendError::ListFiles {
                hash: commit.hex(),
                source: err.into(),
            })?;
        let mut entries = Vec::new();
        collect_tree_files(tree, "", &mut entries).map_err(|err| BackendError::ListFiles {
            hash: commit.hex(),
            source: err,
        })?;

        // Blob contents are read lazily so skipped paths cost nothing.
        let iter = entries.into_iter().map(move |(path, oid)| {
            let data = repo
                .find_object(oid)
                .map_err(|err| to_read_object_err(err, oid))?
                .detach()
                .data;
            Ok((path, data))
        });
        Ok(Box::new(iter))
    }
}
