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

//! Per-function revision DAGs built from structural comparisons.
//!
//! A [`FunctionHistory`] keeps one [`HistoryElement`] per *distinct* revision
//! of a function. Re-observations of an existing revision don't create
//! elements; `parent_mapping` re-points the observing commit at the elements
//! it structurally matches, which is what lets long runs of untouched
//! commits collapse onto a single revision. Parent/child links between
//! elements are commit-id keys into the element map, never owning pointers,
//! so merge shapes cannot create reference cycles.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::ast::Node;
use crate::backend::Commit;
use crate::backend::MillisSinceEpoch;
use crate::object_id::CommitId;
use crate::same::is_same;

/// Directory-qualified syntactic signature, the persistent key of a function
/// across commits.
pub type FunctionId = String;

/// One distinct structural revision of a function. A "deleted" marker is an
/// element with no AST.
#[derive(Clone, Debug)]
pub struct HistoryElement {
    pub commit: Commit,
    pub func: Option<Arc<Node>>,
    /// Raw source of the declaration, sliced out of the containing file.
    pub text: String,
    /// Byte offset of `text` within the containing file.
    pub offset: usize,
    /// Structurally different from every logical parent.
    pub new: bool,
    pub parents: HashSet<CommitId>,
    pub children: HashSet<CommitId>,
}

/// The revision DAG of one function.
#[derive(Debug, Default)]
pub struct FunctionHistory {
    pub elements: HashMap<CommitId, HistoryElement>,
    /// Maps each observing commit to the element(s) that represent its
    /// revision of the function.
    pub parent_mapping: HashMap<CommitId, HashSet<CommitId>>,
    /// Number of commits in which the function was present at all.
    pub life_time: u64,
    /// `life_time` as of the most recent structural edit.
    pub edit_life_time: u64,
    pub first_appearance: Option<MillisSinceEpoch>,
    pub last_appearance: Option<MillisSinceEpoch>,
    /// The function was absent in the latest analyzed commit.
    pub deleted: bool,
    /// Terminal elements by commit timestamp, filled by [`Self::post_process`].
    pub first: Option<CommitId>,
    pub last: Option<CommitId>,
}

impl FunctionHistory {
    /// The logical parents of `commit`: every element its physical parents'
    /// observations resolve to.
    fn logical_parents(&self, commit: &Commit) -> HashSet<CommitId> {
        let mut parents = HashSet::new();
        for parent in &commit.parents {
            let Some(mapped) = self.parent_mapping.get(parent) else {
                continue;
            };
            for hash in mapped {
                if self.elements.contains_key(hash) {
                    parents.insert(hash.clone());
                }
            }
        }
        parents
    }

    /// Records an observation of the function at `commit`.
    ///
    /// Returns `true` iff a new element was created. When every logical
    /// parent already holds a structurally identical revision, the commit is
    /// re-pointed at those elements instead.
    pub fn add_element(&mut self, func: Arc<Node>, commit: &Commit, body: &str) -> bool {
        self.life_time += 1;
        let timestamp = commit.timestamp();
        self.first_appearance = Some(match self.first_appearance {
            Some(first) => first.min(timestamp),
            None => timestamp,
        });
        self.last_appearance = Some(match self.last_appearance {
            Some(last) => last.max(timestamp),
            None => timestamp,
        });

        let parents = self.logical_parents(commit);
        let mut any_same = false;
        let mut any_different = false;
        for hash in &parents {
            let parent_func = self.elements[hash].func.as_deref();
            if is_same(parent_func, Some(&func)) {
                any_same = true;
            } else {
                any_different = true;
            }
        }

        if !any_different && !self.elements.is_empty() {
            let same_parents = parents
                .iter()
                .filter(|hash| is_same(self.elements[*hash].func.as_deref(), Some(&func)))
                .cloned()
                .collect();
            self.parent_mapping.insert(commit.id.clone(), same_parents);
            return false;
        }

        let span = func.span();
        let element = HistoryElement {
            commit: commit.clone(),
            func: Some(func),
            text: body.get(span.pos..span.end).unwrap_or_default().to_string(),
            offset: span.pos,
            new: !any_same,
            parents: parents.clone(),
            children: HashSet::new(),
        };
        for parent in &parents {
            if let Some(parent_element) = self.elements.get_mut(parent) {
                parent_element.children.insert(commit.id.clone());
            }
        }
        self.elements.insert(commit.id.clone(), element);
        self.parent_mapping
            .insert(commit.id.clone(), HashSet::from([commit.id.clone()]));
        self.edit_life_time = self.life_time;
        self.deleted = false;
        true
    }

    /// Records that the function is absent at `commit`. Inserts a deleted
    /// marker only when some logical parent still had the function; repeated
    /// absence stays collapsed on the first marker.
    pub fn delete(&mut self, commit: &Commit) {
        if self.parent_mapping.contains_key(&commit.id) {
            return;
        }
        let parents = self.logical_parents(commit);
        let any_live = parents
            .iter()
            .any(|hash| self.elements[hash].func.is_some());
        if !any_live {
            // Not known at any parent, or already marked deleted there.
            if !parents.is_empty() {
                self.parent_mapping.insert(commit.id.clone(), parents);
            }
            return;
        }
        let element = HistoryElement {
            commit: commit.clone(),
            func: None,
            text: String::new(),
            offset: 0,
            new: false,
            parents: parents.clone(),
            children: HashSet::new(),
        };
        for parent in &parents {
            if let Some(parent_element) = self.elements.get_mut(parent) {
                parent_element.children.insert(commit.id.clone());
            }
        }
        self.elements.insert(commit.id.clone(), element);
        self.parent_mapping
            .insert(commit.id.clone(), HashSet::from([commit.id.clone()]));
        self.deleted = true;
    }

    /// Resolves `first`/`last` to the terminal elements by commit timestamp.
    /// Ties break on commit id so reruns are deterministic.
    pub fn post_process(&mut self) {
        let key = |id: &CommitId, element: &HistoryElement| (element.commit.timestamp(), id.clone());
        self.first = self
            .elements
            .iter()
            .min_by_key(|(id, element)| key(id, element))
            .map(|(id, _)| id.clone());
        self.last = self
            .elements
            .iter()
            .max_by_key(|(id, element)| key(id, element))
            .map(|(id, _)| id.clone());
    }

    /// Number of distinct structural revisions (deleted markers excluded).
    pub fn versions(&self) -> u64 {
        self.elements.values().filter(|element| element.new).count() as u64
    }

    /// `1 - versions/lifetime`; 1.0 for functions that never changed after
    /// appearing once per commit of their life.
    pub fn stability(&self) -> f64 {
        if self.life_time == 0 {
            return 1.0;
        }
        1.0 - self.versions() as f64 / self.life_time as f64
    }
}

/// The aggregate model: every function's history plus run-wide counters.
///
/// The walker is the only writer. The top-level mutex guards the id map and
/// nothing else; each function history carries its own lock, held only for
/// the duration of one operation. After the walk the structure is read-only.
#[derive(Debug, Default)]
pub struct History {
    data: Mutex<HashMap<FunctionId, Arc<Mutex<FunctionHistory>>>>,
    commits_analyzed: AtomicU64,
    max_changed: AtomicU64,
    count_per_commit: Mutex<HashMap<i64, u64>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// The history for `id`, created empty on first use.
    pub fn get(&self, id: &str) -> Arc<Mutex<FunctionHistory>> {
        let mut data = self.data.lock().unwrap();
        data.entry(id.to_owned()).or_default().clone()
    }

    /// Invokes [`FunctionHistory::delete`] on every known function for
    /// `commit`; functions observed at this commit were already re-pointed
    /// and are unaffected.
    pub fn check_for_deleted(&self, commit: &Commit) {
        let histories: Vec<_> = {
            let data = self.data.lock().unwrap();
            data.values().cloned().collect()
        };
        for history in histories {
            history.lock().unwrap().delete(commit);
        }
    }

    /// Records one analyzed commit: `count` function observations, of which
    /// `changed` produced new revisions.
    pub fn record_commit(&self, commit: &Commit, count: u64, changed: u64) {
        self.commits_analyzed.fetch_add(1, Ordering::Relaxed);
        self.max_changed.fetch_max(changed, Ordering::Relaxed);
        let mut counts = self.count_per_commit.lock().unwrap();
        counts.insert(commit.author.timestamp.timestamp.0, count);
    }

    /// Resolves terminal elements of every function history.
    pub fn post_process(&self) {
        for (_, history) in self.entries() {
            history.lock().unwrap().post_process();
        }
    }

    /// Stable snapshot of the per-function histories, sorted by id.
    pub fn entries(&self) -> Vec<(FunctionId, Arc<Mutex<FunctionHistory>>)> {
        let data = self.data.lock().unwrap();
        let mut entries: Vec<_> = data
            .iter()
            .map(|(id, history)| (id.clone(), history.clone()))
            .collect();
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        entries
    }

    pub fn commits_analyzed(&self) -> u64 {
        self.commits_analyzed.load(Ordering::Relaxed)
    }

    /// Largest number of new revisions any single commit produced.
    pub fn max_changed(&self) -> u64 {
        self.max_changed.load(Ordering::Relaxed)
    }

    /// Function observations per commit, keyed by author timestamp millis.
    pub fn count_per_commit(&self) -> HashMap<i64, u64> {
        self.count_per_commit.lock().unwrap().clone()
    }
}
