// Copyright 2024 The fnhist Authors
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

//! Greedy bipartite matching between two sibling sequences.
//!
//! Candidate pairs are scored by the similarity scorer, sorted by descending
//! score, and committed greedily. The result preserves the order of the left
//! sequence; unmatched left elements get no partner.

use crate::ast::Node;
use crate::compare::compare;

/// Candidates must score strictly above this to be considered. The scorer's
/// weighting was calibrated so that interesting pairs land around phi^-1;
/// raising the threshold toward that value trades recall for precision.
/// The default admits any pair with positive similarity and lets the
/// descending sort decide.
pub const MATCH_THRESHOLD: f64 = f64::EPSILON;

/// One entry of a matching, in left-sequence order.
#[derive(Clone, Copy, Debug)]
pub struct Matching<'a, T> {
    pub prev: &'a T,
    pub next: Option<&'a T>,
    /// The partner sits at a different index than `prev`.
    pub position_changed: bool,
    /// The partner comes before an already-matched predecessor's partner.
    pub order_changed: bool,
}

struct Candidate {
    a_pos: usize,
    b_pos: usize,
    score: f64,
}

/// Matches `a` against `b` using `score`, returning one entry per element of
/// `a` in order. `label` names the call site in trace output.
pub fn match_by<'a, T>(
    a: &'a [T],
    b: &'a [T],
    label: &'static str,
    score: impl Fn(&T, &T) -> f64,
) -> Vec<Matching<'a, T>> {
    let mut candidates = Vec::new();
    for (a_pos, a_elem) in a.iter().enumerate() {
        for (b_pos, b_elem) in b.iter().enumerate() {
            let score = score(a_elem, b_elem);
            if score > MATCH_THRESHOLD {
                candidates.push(Candidate { a_pos, b_pos, score });
            }
        }
    }

    // Stable descending sort; ties keep their generation order, so earlier
    // left elements win equal scores deterministically.
    candidates.sort_by(|x, y| y.score.total_cmp(&x.score));

    let mut used = vec![false; b.len()];
    let mut matched: Vec<Option<usize>> = vec![None; a.len()];
    for candidate in &candidates {
        if used[candidate.b_pos] || matched[candidate.a_pos].is_some() {
            continue;
        }
        tracing::debug!(
            target: "fnhist::matching",
            label,
            a_pos = candidate.a_pos,
            b_pos = candidate.b_pos,
            score = candidate.score,
            "matched pair",
        );
        used[candidate.b_pos] = true;
        matched[candidate.a_pos] = Some(candidate.b_pos);
    }

    let mut result = Vec::with_capacity(a.len());
    let mut max_b_pos = 0;
    for (a_pos, a_elem) in a.iter().enumerate() {
        match matched[a_pos] {
            None => result.push(Matching {
                prev: a_elem,
                next: None,
                position_changed: false,
                order_changed: false,
            }),
            Some(b_pos) => {
                // A match that lands before an already-matched predecessor's
                // partner crossed it.
                let order_changed = max_b_pos > b_pos && a_pos != b_pos;
                result.push(Matching {
                    prev: a_elem,
                    next: Some(&b[b_pos]),
                    position_changed: a_pos != b_pos,
                    order_changed,
                });
                max_b_pos = max_b_pos.max(b_pos);
            }
        }
    }
    result
}

/// Matches two node sequences with the structural similarity scorer.
pub fn match_nodes<'a>(
    a: &'a [Node],
    b: &'a [Node],
    label: &'static str,
) -> Vec<Matching<'a, Node>> {
    match_by(a, b, label, |x, y| compare(Some(x), Some(y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Span;

    fn ident(name: &str) -> Node {
        Node::Ident {
            span: Span::default(),
            name: name.to_string(),
        }
    }

    fn names<'a>(matches: &'a [Matching<'a, Node>]) -> Vec<(Option<&'a str>, Option<&'a str>)> {
        matches
            .iter()
            .map(|m| (m.prev.ident_name(), m.next.and_then(Node::ident_name)))
            .collect()
    }

    #[test]
    fn test_identical_sequences() {
        let a = vec![ident("x"), ident("y")];
        let b = vec![ident("x"), ident("y")];
        let matches = match_nodes(&a, &b, "test");
        assert_eq!(
            names(&matches),
            vec![(Some("x"), Some("x")), (Some("y"), Some("y"))]
        );
        assert!(matches.iter().all(|m| !m.position_changed && !m.order_changed));
    }

    #[test]
    fn test_unmatched_left_element() {
        let a = vec![ident("x"), ident("gone")];
        let b = vec![ident("x")];
        let matches = match_nodes(&a, &b, "test");
        assert_eq!(names(&matches), vec![(Some("x"), Some("x")), (Some("gone"), None)]);
    }

    #[test]
    fn test_reorder_sets_flags() {
        let a = vec![ident("x"), ident("y")];
        let b = vec![ident("y"), ident("x")];
        let matches = match_nodes(&a, &b, "test");
        assert_eq!(
            names(&matches),
            vec![(Some("x"), Some("x")), (Some("y"), Some("y"))]
        );
        assert!(matches[0].position_changed);
        assert!(!matches[0].order_changed);
        assert!(matches[1].position_changed);
        assert!(matches[1].order_changed);
    }

    #[test]
    fn test_zero_score_pairs_are_not_candidates() {
        let a = vec![ident("x")];
        let b = vec![ident("completely-different")];
        let matches = match_nodes(&a, &b, "test");
        assert_eq!(names(&matches), vec![(Some("x"), None)]);
    }
}
