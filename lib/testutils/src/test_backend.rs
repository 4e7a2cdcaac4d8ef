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

use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;

use fnhist_lib::backend::Backend;
use fnhist_lib::backend::BackendError;
use fnhist_lib::backend::BackendResult;
use fnhist_lib::backend::Commit;
use fnhist_lib::backend::FileIter;
use fnhist_lib::object_id::CommitId;

use crate::test_signature;

/// A fully in-memory [`Backend`]: commits, branches, and file contents are
/// declared up front by the test.
#[derive(Debug, Default)]
pub struct TestBackend {
    commits: HashMap<CommitId, Commit>,
    files: HashMap<CommitId, Vec<(String, String)>>,
    references: HashMap<String, CommitId>,
    broken_commits: HashSet<CommitId>,
}

impl TestBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a commit with the given hex id, parent hex ids, timestamp, and
    /// `(path, go source)` files.
    pub fn add_commit(
        &mut self,
        hex: &'static str,
        parents: &[&'static str],
        millis: i64,
        files: &[(&str, &str)],
    ) {
        let id = CommitId::from_hex(hex);
        let commit = Commit {
            id: id.clone(),
            parents: parents.iter().map(|p| CommitId::from_hex(p)).collect(),
            author: test_signature(millis),
            committer: test_signature(millis),
        };
        self.commits.insert(id.clone(), commit);
        self.files.insert(
            id,
            files
                .iter()
                .map(|(path, source)| (path.to_string(), source.to_string()))
                .collect(),
        );
    }

    /// Makes `name` resolvable as a branch pointing at `hex`.
    pub fn set_reference(&mut self, name: &str, hex: &'static str) {
        self.references
            .insert(name.to_string(), CommitId::from_hex(hex));
    }

    /// Makes file enumeration fail for the given commit.
    pub fn break_files(&mut self, hex: &'static str) {
        self.broken_commits.insert(CommitId::from_hex(hex));
    }
}

impl Backend for TestBackend {
    fn resolve_reference(&self, reference: &str) -> BackendResult<CommitId> {
        if let Some(id) = self.references.get(reference) {
            return Ok(id.clone());
        }
        if let Some(id) = CommitId::try_from_hex(reference) {
            if self.commits.contains_key(&id) {
                return Ok(id);
            }
        }
        Err(BackendError::ReferenceNotFound {
            reference: reference.to_string(),
        })
    }

    fn commits_from(&self, head: &CommitId) -> BackendResult<HashMap<CommitId, Commit>> {
        if !self.commits.contains_key(head) {
            return Err(BackendError::ObjectNotFound {
                hash: head.to_string(),
            });
        }
        let mut reachable = HashMap::new();
        let mut queue = VecDeque::from([head.clone()]);
        while let Some(id) = queue.pop_front() {
            if reachable.contains_key(&id) {
                continue;
            }
            let Some(commit) = self.commits.get(&id) else {
                continue;
            };
            reachable.insert(id, commit.clone());
            queue.extend(commit.parents.iter().cloned());
        }
        Ok(reachable)
    }

    fn files(&self, commit: &CommitId) -> BackendResult<FileIter<'_>> {
        if self.broken_commits.contains(commit) {
            return Err(BackendError::ListFiles {
                hash: commit.to_string(),
                source: std::io::Error::other("injected enumeration failure").into(),
            });
        }
        let entries = self.files.get(commit).cloned().unwrap_or_default();
        Ok(Box::new(
            entries
                .into_iter()
                .map(|(path, source)| Ok((path, source.into_bytes()))),
        ))
    }
}
