// Copyright 2025 The fnhist Authors
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

//! Tests of the gix-backed repository reader against real repositories.

use std::sync::Arc;

use assert_matches::assert_matches;
use fnhist_lib::backend::Backend;
use fnhist_lib::backend::BackendError;
use fnhist_lib::backend::MillisSinceEpoch;
use fnhist_lib::collector::AnalysisOptions;
use fnhist_lib::collector::create_history;
use fnhist_lib::git_backend::GitBackend;
use fnhist_lib::object_id::CommitId;

const FOO_V1: &str = "package sample\n\nfunc foo() int {\n\treturn 1\n}\n";
const FOO_V2: &str = "package sample\n\nfunc foo() int {\n\treturn 2\n}\n";

#[test]
fn test_read_linear_repository() {
    let temp_dir = tempfile::tempdir().unwrap();
    let git_repo = testutils::git::init(temp_dir.path());
    let first = testutils::git::add_commit(
        &git_repo,
        "refs/heads/main",
        "pkg/a.go",
        FOO_V1.as_bytes(),
        "add foo",
        1_700_000_000,
        &[],
    );
    let second = testutils::git::add_commit(
        &git_repo,
        "refs/heads/main",
        "pkg/a.go",
        FOO_V2.as_bytes(),
        "change foo",
        1_700_000_100,
        &[first.commit_id],
    );

    let backend = GitBackend::load(temp_dir.path()).unwrap();

    let head = backend.resolve_reference("main").unwrap();
    assert_eq!(head, CommitId::from_bytes(second.commit_id.as_bytes()));

    let commits = backend.commits_from(&head).unwrap();
    assert_eq!(commits.len(), 2);
    let head_commit = &commits[&head];
    assert_eq!(
        head_commit.parents,
        vec![CommitId::from_bytes(first.commit_id.as_bytes())]
    );
    assert_eq!(
        head_commit.author.timestamp.timestamp,
        MillisSinceEpoch(1_700_000_100_000)
    );

    let files: Vec<_> = backend
        .files(&head)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].0, "pkg/a.go");
    assert_eq!(files[0].1, FOO_V2.as_bytes());
}

#[test]
fn test_resolving_hash_and_branch() {
    let temp_dir = tempfile::tempdir().unwrap();
    let git_repo = testutils::git::init(temp_dir.path());
    let commit = testutils::git::add_commit(
        &git_repo,
        "refs/heads/main",
        "a.go",
        FOO_V1.as_bytes(),
        "init",
        1_700_000_000,
        &[],
    );
    let backend = GitBackend::load(temp_dir.path()).unwrap();

    let by_branch = backend.resolve_reference("main").unwrap();
    let by_hash = backend
        .resolve_reference(&commit.commit_id.to_string())
        .unwrap();
    assert_eq!(by_branch, by_hash);

    assert_matches!(
        backend.resolve_reference("does-not-exist"),
        Err(BackendError::ReferenceNotFound { .. })
    );
}

#[test]
fn test_full_analysis_over_git_repository() {
    let temp_dir = tempfile::tempdir().unwrap();
    let git_repo = testutils::git::init(temp_dir.path());
    let first = testutils::git::add_commit(
        &git_repo,
        "refs/heads/main",
        "pkg/a.go",
        FOO_V1.as_bytes(),
        "add foo",
        1_700_000_000,
        &[],
    );
    testutils::git::add_commit(
        &git_repo,
        "refs/heads/main",
        "pkg/a.go",
        FOO_V2.as_bytes(),
        "change foo",
        1_700_000_100,
        &[first.commit_id],
    );

    let backend = Arc::new(GitBackend::load(temp_dir.path()).unwrap());
    let history =
        create_history(backend, "main", None, &AnalysisOptions::default()).unwrap();

    assert_eq!(history.commits_analyzed(), 2);
    let entries = history.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, "pkg.foo");
    let foo = entries[0].1.lock().unwrap();
    assert_eq!(foo.elements.len(), 2);
    assert_eq!(foo.life_time, 2);
    assert_eq!(foo.versions(), 2);
}

#[test]
fn test_load_missing_repository_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    assert!(GitBackend::load(&temp_dir.path().join("nope")).is_err());
}
