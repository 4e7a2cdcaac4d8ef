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

//! Restriction of the commit DAG to the analyzed interval.
//!
//! Given the full commit map and the interval endpoints, the builder keeps
//! exactly the commits that are both ancestors of the head and descendants
//! of the root, and prunes every edge leaving that set. The result is a DAG
//! whose unique source is the root (where the walk starts) and whose unique
//! sink is the head (where it ends).

use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;

use itertools::Itertools as _;
use thiserror::Error;

use crate::backend::Commit;
use crate::object_id::CommitId;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Head commit {0} is not in the commit set")]
    HeadNotFound(CommitId),
    #[error("Root commit {0} is not an ancestor of the head")]
    RootNotReachable(CommitId),
}

/// A commit with its parent and child edges inside the analyzed interval.
#[derive(Clone, Debug)]
pub struct CommitNode {
    pub commit: Commit,
    /// In-interval parents (older commits), in the commit's parent order.
    pub parents: Vec<CommitId>,
    /// In-interval children (newer commits), sorted by id.
    pub children: Vec<CommitId>,
}

/// The analyzed slice of the commit DAG.
#[derive(Clone, Debug)]
pub struct CommitGraph {
    /// The oldest retained commit; analysis starts here.
    pub root: CommitId,
    /// The newest retained commit; analysis ends here.
    pub head: CommitId,
    pub nodes: HashMap<CommitId, CommitNode>,
}

impl CommitGraph {
    /// Restricts `commits` to the interval `[root, head]`.
    ///
    /// `head` must be present. A missing or absent `root` falls back to the
    /// first-parent chain from the head down to a parentless commit.
    pub fn build(
        commits: &HashMap<CommitId, Commit>,
        head: &CommitId,
        root: Option<&CommitId>,
    ) -> Result<Self, GraphError> {
        if !commits.contains_key(head) {
            return Err(GraphError::HeadNotFound(head.clone()));
        }
        let root = match root {
            Some(root) if commits.contains_key(root) => root.clone(),
            _ => first_parent_root(commits, head),
        };

        // Children edges of the unrestricted graph.
        let mut children: HashMap<&CommitId, Vec<&CommitId>> = HashMap::new();
        for commit in commits.values() {
            for parent in &commit.parents {
                if commits.contains_key(parent) {
                    children.entry(parent).or_default().push(&commit.id);
                }
            }
        }

        // Each retained commit is reached both from the head through parent
        // edges and from the root through child edges: bump a counter on each
        // sweep and keep the nodes counted twice.
        let mut counters: HashMap<&CommitId, u32> = HashMap::new();
        bump_reachable(head, &mut counters, |id| {
            commits[id]
                .parents
                .iter()
                .filter(|parent| commits.contains_key(*parent))
                .collect()
        });
        bump_reachable(&root, &mut counters, |id| {
            children.get(id).cloned().unwrap_or_default()
        });
        let retained: HashSet<&CommitId> = counters
            .iter()
            .filter(|(_, count)| **count >= 2)
            .map(|(id, _)| *id)
            .collect();
        if !retained.contains(&root) {
            return Err(GraphError::RootNotReachable(root));
        }

        let nodes = retained
            .iter()
            .map(|id| {
                let commit = &commits[*id];
                let parents = commit
                    .parents
                    .iter()
                    .filter(|parent| retained.contains(parent))
                    .cloned()
                    .collect();
                let node_children: Vec<CommitId> = children
                    .get(*id)
                    .map(|child_ids| {
                        child_ids
                            .iter()
                            .filter(|child| retained.contains(**child))
                            .map(|child| (*child).clone())
                            .sorted()
                            .collect()
                    })
                    .unwrap_or_default();
                (
                    (*id).clone(),
                    CommitNode {
                        commit: commit.clone(),
                        parents,
                        children: node_children,
                    },
                )
            })
            .collect();

        Ok(Self {
            root,
            head: head.clone(),
            nodes,
        })
    }
}

/// The parentless commit found by following first-parent edges from `head`.
fn first_parent_root(commits: &HashMap<CommitId, Commit>, head: &CommitId) -> CommitId {
    let mut current = head.clone();
    loop {
        let commit = &commits[&current];
        match commit.parents.first() {
            Some(parent) if commits.contains_key(parent) => current = parent.clone(),
            _ => return current,
        }
    }
}

fn bump_reachable<'a>(
    start: &'a CommitId,
    counters: &mut HashMap<&'a CommitId, u32>,
    neighbors: impl Fn(&CommitId) -> Vec<&'a CommitId>,
) {
    let mut visited: HashSet<&CommitId> = HashSet::new();
    let mut queue: VecDeque<&CommitId> = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);
    while let Some(id) = queue.pop_front() {
        *counters.entry(id).or_default() += 1;
        for neighbor in neighbors(id) {
            if visited.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MillisSinceEpoch;
    use crate::backend::Signature;
    use crate::backend::Timestamp;

    fn signature(millis: i64) -> Signature {
        Signature {
            name: "Some One".to_string(),
            email: "some.one@example.com".to_string(),
            timestamp: Timestamp {
                timestamp: MillisSinceEpoch(millis),
                tz_offset: 0,
            },
        }
    }

    fn commit(id: &'static str, parents: &[&'static str]) -> (CommitId, Commit) {
        let commit = Commit {
            id: CommitId::from_hex(id),
            parents: parents.iter().map(|p| CommitId::from_hex(p)).collect(),
            author: signature(1000),
            committer: signature(1000),
        };
        (commit.id.clone(), commit)
    }

    fn commit_map(
        entries: &[(&'static str, &[&'static str])],
    ) -> HashMap<CommitId, Commit> {
        entries
            .iter()
            .map(|(id, parents)| commit(id, parents))
            .collect()
    }

    #[test]
    fn test_linear_history() {
        let commits = commit_map(&[("01", &[]), ("02", &["01"]), ("03", &["02"])]);
        let graph = CommitGraph::build(&commits, &CommitId::from_hex("03"), None).unwrap();
        assert_eq!(graph.root, CommitId::from_hex("01"));
        assert_eq!(graph.head, CommitId::from_hex("03"));
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(
            graph.nodes[&CommitId::from_hex("02")].children,
            vec![CommitId::from_hex("03")]
        );
        assert_eq!(
            graph.nodes[&CommitId::from_hex("02")].parents,
            vec![CommitId::from_hex("01")]
        );
    }

    #[test]
    fn test_explicit_root_restricts_interval() {
        let commits = commit_map(&[
            ("01", &[]),
            ("02", &["01"]),
            ("03", &["02"]),
            ("04", &["03"]),
        ]);
        let root = CommitId::from_hex("03");
        let graph =
            CommitGraph::build(&commits, &CommitId::from_hex("04"), Some(&root)).unwrap();
        assert_eq!(graph.root, root);
        assert_eq!(graph.nodes.len(), 2);
        // The edge into the pruned 02 is gone.
        assert!(graph.nodes[&root].parents.is_empty());
    }

    #[test]
    fn test_fork_merge_keeps_both_branches() {
        let commits = commit_map(&[
            ("01", &[]),
            ("02", &["01"]),
            ("03", &["01"]),
            ("04", &["02", "03"]),
        ]);
        let graph = CommitGraph::build(&commits, &CommitId::from_hex("04"), None).unwrap();
        assert_eq!(graph.nodes.len(), 4);
        let root_children = &graph.nodes[&CommitId::from_hex("01")].children;
        assert_eq!(
            root_children,
            &vec![CommitId::from_hex("02"), CommitId::from_hex("03")]
        );
        assert_eq!(
            graph.nodes[&CommitId::from_hex("04")].parents,
            vec![CommitId::from_hex("02"), CommitId::from_hex("03")]
        );
    }

    #[test]
    fn test_side_branch_outside_interval_is_pruned() {
        // 05 is not an ancestor of the head and must not be retained.
        let commits = commit_map(&[
            ("01", &[]),
            ("02", &["01"]),
            ("03", &["02"]),
            ("05", &["01"]),
        ]);
        let graph = CommitGraph::build(&commits, &CommitId::from_hex("03"), None).unwrap();
        assert_eq!(graph.nodes.len(), 3);
        assert!(!graph.nodes.contains_key(&CommitId::from_hex("05")));
        assert_eq!(
            graph.nodes[&CommitId::from_hex("01")].children,
            vec![CommitId::from_hex("02")]
        );
    }

    #[test]
    fn test_missing_head_is_an_error() {
        let commits = commit_map(&[("01", &[])]);
        let result = CommitGraph::build(&commits, &CommitId::from_hex("99"), None);
        assert!(matches!(result, Err(GraphError::HeadNotFound(_))));
    }

    #[test]
    fn test_unreachable_root_is_an_error() {
        let commits = commit_map(&[("01", &[]), ("02", &["01"]), ("05", &["01"])]);
        let root = CommitId::from_hex("05");
        let result = CommitGraph::build(&commits, &CommitId::from_hex("02"), Some(&root));
        assert!(matches!(result, Err(GraphError::RootNotReachable(_))));
    }

    #[test]
    fn test_absent_root_falls_back_to_first_parent_chain() {
        let commits = commit_map(&[("01", &[]), ("02", &["01"])]);
        let missing = CommitId::from_hex("aa");
        let graph =
            CommitGraph::build(&commits, &CommitId::from_hex("02"), Some(&missing)).unwrap();
        assert_eq!(graph.root, CommitId::from_hex("01"));
    }
}
