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

//! Per-commit collection: file filtering, parsing, and history feeding.
//!
//! One bad file never fails a commit; unreadable or unparsable files are
//! logged and skipped, and the affected functions simply gain no entry at
//! that commit. Failing to enumerate a commit's files at all is fatal to
//! the walk.

use std::sync::Arc;

use thiserror::Error;

use crate::backend::Backend;
use crate::backend::BackendError;
use crate::backend::BackendResult;
use crate::backend::Commit;
use crate::go_parser;
use crate::graph::CommitGraph;
use crate::graph::GraphError;
use crate::history::History;
use crate::object_id::CommitId;
use crate::walker;
use crate::walker::WalkError;

/// Knobs of one analysis run.
#[derive(Clone, Debug, Default)]
pub struct AnalysisOptions {
    /// Analyze `_test.go` files too.
    pub include_tests: bool,
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Walk(#[from] WalkError),
}

/// Runs the whole analysis: resolves `start`, restricts the commit graph to
/// `[end, start]`, walks it, and returns the frozen history.
///
/// `end`, when given, is a commit hash; an unknown or malformed hash falls
/// back to the first-parent root, like an absent one.
pub fn create_history(
    backend: Arc<dyn Backend>,
    start: &str,
    end: Option<&str>,
    options: &AnalysisOptions,
) -> Result<Arc<History>, AnalyzeError> {
    let head = backend.resolve_reference(start)?;
    let commits = backend.commits_from(&head)?;
    let root = end.and_then(CommitId::try_from_hex);
    let graph = CommitGraph::build(&commits, &head, root.as_ref())?;
    tracing::info!(
        commits = graph.nodes.len(),
        head = %graph.head,
        root = %graph.root,
        "starting analysis",
    );
    let history = Arc::new(History::new());
    walker::walk(backend, &graph, history.clone(), options)?;
    Ok(history)
}

/// Whether the path names a Go source file the analysis should look at.
/// Vendored trees are never analyzed.
fn is_analyzable_path(path: &str, options: &AnalysisOptions) -> bool {
    if path
        .split('/')
        .any(|component| component == "vendor" || component == "Godeps")
    {
        return false;
    }
    if !path.ends_with(".go") {
        return false;
    }
    if !options.include_tests && path.ends_with("_test.go") {
        return false;
    }
    true
}

/// The `<directory>` part of a function id; `.` for files at the repo root.
fn directory_of(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((directory, _)) => directory,
        None => ".",
    }
}

/// Reads and parses every analyzable file of `commit`, feeding each found
/// function into `history`, then records the per-commit counters and marks
/// disappeared functions as deleted.
pub fn analyze_commit(
    backend: &dyn Backend,
    history: &History,
    commit: &Commit,
    options: &AnalysisOptions,
) -> BackendResult<()> {
    tracing::debug!(commit = %commit.id, "analyzing commit");
    let mut count: u64 = 0;
    let mut changed: u64 = 0;
    for entry in backend.files(&commit.id)? {
        let (path, bytes) = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(commit = %commit.id, %err, "skipping unreadable file");
                continue;
            }
        };
        if !is_analyzable_path(&path, options) {
            continue;
        }
        let Ok(source) = str::from_utf8(&bytes) else {
            tracing::warn!(commit = %commit.id, path, "skipping non-utf8 file");
            continue;
        };
        let declarations = match go_parser::parse_source(source, &path) {
            Ok(declarations) => declarations,
            Err(err) => {
                tracing::warn!(commit = %commit.id, path, %err, "skipping unparsable file");
                continue;
            }
        };
        let directory = directory_of(&path);
        for declaration in declarations {
            count += 1;
            let id = format!("{directory}.{}", declaration.signature);
            let function_history = history.get(&id);
            let added = function_history
                .lock()
                .unwrap()
                .add_element(declaration.node, commit, source);
            if added {
                changed += 1;
            }
        }
    }
    history.record_commit(commit, count, changed);
    history.check_for_deleted(commit);
    Ok(())
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("main.go", true; "root file")]
    #[test_case("collector/repo.go", true; "nested file")]
    #[test_case("README.md", false; "not a source file")]
    #[test_case("collector/repo.go.bak", false; "wrong suffix")]
    #[test_case("vendor/github.com/x/y.go", false; "vendored")]
    #[test_case("Godeps/_workspace/src/x.go", false; "godeps")]
    #[test_case("collector/repo_test.go", false; "test file")]
    fn test_path_filter(path: &str, analyzable: bool) {
        assert_eq!(
            is_analyzable_path(path, &AnalysisOptions::default()),
            analyzable
        );
    }

    #[test]
    fn test_path_filter_with_tests_enabled() {
        let with_tests = AnalysisOptions {
            include_tests: true,
        };
        assert!(is_analyzable_path("collector/repo_test.go", &with_tests));
        assert!(!is_analyzable_path("vendor/x/y_test.go", &with_tests));
    }

    #[test_case("collector/repo.go", "collector")]
    #[test_case("a/b/c.go", "a/b")]
    #[test_case("main.go", ".")]
    fn test_directory_of(path: &str, directory: &str) {
        assert_eq!(directory_of(path), directory);
    }
}
