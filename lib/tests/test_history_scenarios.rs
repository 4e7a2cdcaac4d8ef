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

//! End-to-end scenarios: in-memory repositories run through the full
//! pipeline (parse, graph, walk, fold).

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

use fnhist_lib::collector::AnalysisOptions;
use fnhist_lib::collector::create_history;
use fnhist_lib::history::FunctionHistory;
use fnhist_lib::history::History;
use fnhist_lib::object_id::CommitId;
use pretty_assertions::assert_eq;
use testutils::TestBackend;

const FOO_V1: &str = "package sample\n\nfunc foo() int {\n\treturn 1\n}\n";
const FOO_V1_REFORMATTED: &str =
    "package sample\n\n// foo returns a constant.\nfunc foo() int {\n\t// one\n\treturn 1\n}\n";
const FOO_V2: &str = "package sample\n\nfunc foo() int {\n\treturn 2\n}\n";
const FOO_V3: &str = "package sample\n\nfunc foo() int {\n\treturn 3\n}\n";
const BAR_V1: &str = "package sample\n\nfunc bar() int {\n\treturn 1\n}\n";
const NO_FUNCTIONS: &str = "package sample\n";

fn run(backend: TestBackend, start: &str) -> Arc<History> {
    create_history(Arc::new(backend), start, None, &AnalysisOptions::default()).unwrap()
}

fn function(history: &History, id: &str) -> Arc<Mutex<FunctionHistory>> {
    history
        .entries()
        .into_iter()
        .find(|(entry_id, _)| entry_id == id)
        .unwrap_or_else(|| panic!("no history for {id}"))
        .1
}

fn ids(history: &History) -> Vec<String> {
    history.entries().into_iter().map(|(id, _)| id).collect()
}

#[test]
fn test_single_commit_single_function() {
    let mut backend = TestBackend::new();
    backend.add_commit("01", &[], 1000, &[("pkg/a.go", FOO_V1)]);
    backend.set_reference("master", "01");
    let history = run(backend, "master");

    assert_eq!(ids(&history), vec!["pkg.foo".to_string()]);
    assert_eq!(history.commits_analyzed(), 1);
    assert_eq!(history.max_changed(), 1);

    let foo = function(&history, "pkg.foo");
    let foo = foo.lock().unwrap();
    let c1 = CommitId::from_hex("01");
    assert_eq!(foo.elements.len(), 1);
    let element = &foo.elements[&c1];
    assert!(element.new);
    assert!(element.parents.is_empty());
    assert_eq!(foo.life_time, 1);
    assert_eq!(foo.edit_life_time, 1);
    assert!(!foo.deleted);
    assert_eq!(foo.first, Some(c1.clone()));
    assert_eq!(foo.last, Some(c1.clone()));
    // The element's text is the declaration sliced out of the file.
    assert_eq!(element.text, "func foo() int {\n\treturn 1\n}");
    assert_eq!(element.offset, FOO_V1.find("func").unwrap());
}

#[test]
fn test_cosmetic_reformat_folds() {
    let mut backend = TestBackend::new();
    backend.add_commit("01", &[], 1000, &[("pkg/a.go", FOO_V1)]);
    backend.add_commit("02", &["01"], 2000, &[("pkg/a.go", FOO_V1_REFORMATTED)]);
    backend.set_reference("master", "02");
    let history = run(backend, "master");

    let foo = function(&history, "pkg.foo");
    let foo = foo.lock().unwrap();
    let c1 = CommitId::from_hex("01");
    let c2 = CommitId::from_hex("02");
    assert_eq!(foo.elements.len(), 1);
    assert_eq!(foo.parent_mapping[&c2], HashSet::from([c1]));
    assert_eq!(foo.life_time, 2);
    assert_eq!(foo.edit_life_time, 1);
    assert!(!foo.deleted);
}

#[test]
fn test_body_change_creates_second_version() {
    let mut backend = TestBackend::new();
    backend.add_commit("01", &[], 1000, &[("pkg/a.go", FOO_V1)]);
    backend.add_commit("02", &["01"], 2000, &[("pkg/a.go", FOO_V2)]);
    backend.set_reference("master", "02");
    let history = run(backend, "master");

    let foo = function(&history, "pkg.foo");
    let foo = foo.lock().unwrap();
    let c1 = CommitId::from_hex("01");
    let c2 = CommitId::from_hex("02");
    assert_eq!(foo.elements.len(), 2);
    assert!(foo.elements[&c1].new);
    assert!(foo.elements[&c2].new);
    assert_eq!(foo.elements[&c2].parents, HashSet::from([c1.clone()]));
    assert_eq!(foo.versions(), 2);
    assert_eq!(foo.stability(), 0.0);
    assert_eq!(history.max_changed(), 1);
}

#[test]
fn test_deletion_then_resurrection() {
    let mut backend = TestBackend::new();
    backend.add_commit("01", &[], 1000, &[("pkg/a.go", FOO_V1)]);
    backend.add_commit("02", &["01"], 2000, &[("pkg/a.go", NO_FUNCTIONS)]);
    backend.add_commit("03", &["02"], 3000, &[("pkg/a.go", FOO_V1)]);
    backend.set_reference("master", "03");
    let history = run(backend, "master");

    let foo = function(&history, "pkg.foo");
    let foo = foo.lock().unwrap();
    let c2 = CommitId::from_hex("02");
    let c3 = CommitId::from_hex("03");
    assert_eq!(foo.elements.len(), 3);
    let marker = &foo.elements[&c2];
    assert!(marker.func.is_none());
    assert!(!marker.new);
    // Nothing structurally matches a missing AST, so the re-added identical
    // declaration is a fresh revision.
    assert!(foo.elements[&c3].new);
    assert!(!foo.deleted);
}

#[test]
fn test_fork_merge_with_conflicting_edits() {
    let mut backend = TestBackend::new();
    backend.add_commit("01", &[], 1000, &[("pkg/a.go", FOO_V1)]);
    backend.add_commit("02", &["01"], 2000, &[("pkg/a.go", FOO_V2)]);
    backend.add_commit("03", &["01"], 3000, &[("pkg/a.go", FOO_V3)]);
    backend.add_commit("04", &["02", "03"], 4000, &[("pkg/a.go", FOO_V2)]);
    backend.set_reference("master", "04");
    let history = run(backend, "master");

    let foo = function(&history, "pkg.foo");
    let foo = foo.lock().unwrap();
    let c2 = CommitId::from_hex("02");
    let c3 = CommitId::from_hex("03");
    let c4 = CommitId::from_hex("04");
    assert_eq!(foo.elements.len(), 4);
    let merge = &foo.elements[&c4];
    // One side matches and the other differs, so the merge gets its own
    // element that is not a new revision.
    assert!(!merge.new);
    assert_eq!(merge.parents, HashSet::from([c2, c3]));
    assert_eq!(foo.parent_mapping[&c4], HashSet::from([c4.clone()]));
    assert_eq!(foo.life_time, 4);
}

#[test]
fn test_rename_splits_history() {
    let mut backend = TestBackend::new();
    backend.add_commit("01", &[], 1000, &[("pkg/a.go", FOO_V1)]);
    backend.add_commit("02", &["01"], 2000, &[("pkg/a.go", BAR_V1)]);
    backend.set_reference("master", "02");
    let history = run(backend, "master");

    assert_eq!(
        ids(&history),
        vec!["pkg.bar".to_string(), "pkg.foo".to_string()]
    );

    let foo = function(&history, "pkg.foo");
    let foo = foo.lock().unwrap();
    assert!(foo.deleted);
    assert_eq!(foo.elements.len(), 2);

    let bar = function(&history, "pkg.bar");
    let bar = bar.lock().unwrap();
    assert_eq!(bar.life_time, 1);
    assert_eq!(bar.elements.len(), 1);
}

#[test]
fn test_methods_and_plain_functions_do_not_collide() {
    let source = "package sample

type Server struct {
	count int
}

func (s *Server) Start() int {
	return s.count
}

func Start() int {
	return 0
}
";
    let mut backend = TestBackend::new();
    backend.add_commit("01", &[], 1000, &[("pkg/a.go", source)]);
    backend.set_reference("master", "01");
    let history = run(backend, "master");
    assert_eq!(
        ids(&history),
        vec!["pkg.Server.Start".to_string(), "pkg.Start".to_string()]
    );
}

#[test]
fn test_explicit_end_bounds_the_interval() {
    let mut backend = TestBackend::new();
    backend.add_commit("01", &[], 1000, &[("pkg/a.go", FOO_V1)]);
    backend.add_commit("02", &["01"], 2000, &[("pkg/a.go", FOO_V2)]);
    backend.add_commit("03", &["02"], 3000, &[("pkg/a.go", FOO_V3)]);
    backend.set_reference("master", "03");
    let history = create_history(
        Arc::new(backend),
        "master",
        Some("02"),
        &AnalysisOptions::default(),
    )
    .unwrap();

    // Only 02 and 03 are analyzed; the function's first revision is the one
    // seen at 02.
    assert_eq!(history.commits_analyzed(), 2);
    let foo = function(&history, "pkg.foo");
    let foo = foo.lock().unwrap();
    assert_eq!(foo.life_time, 2);
    assert_eq!(foo.elements.len(), 2);
    assert!(foo.elements[&CommitId::from_hex("02")].new);
}

#[test]
fn test_tests_excluded_by_default() {
    let mut backend = TestBackend::new();
    backend.add_commit(
        "01",
        &[],
        1000,
        &[("pkg/a_test.go", FOO_V1), ("vendor/dep/b.go", BAR_V1)],
    );
    backend.set_reference("master", "01");
    let history = run(backend, "master");
    assert_eq!(ids(&history), Vec::<String>::new());

    let mut backend = TestBackend::new();
    backend.add_commit("01", &[], 1000, &[("pkg/a_test.go", FOO_V1)]);
    backend.set_reference("master", "01");
    let history = create_history(
        Arc::new(backend),
        "master",
        None,
        &AnalysisOptions {
            include_tests: true,
        },
    )
    .unwrap();
    assert_eq!(ids(&history), vec!["pkg.foo".to_string()]);
}
