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

//! Read-only statistics and chart series derived from a frozen [`History`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::backend::MillisSinceEpoch;
use crate::history::History;
use crate::object_id::CommitId;
use crate::same;

/// Summary numbers of one analysis run.
#[derive(Clone, Debug, Serialize)]
pub struct Stats {
    pub commits_analyzed: u64,
    pub total_functions: u64,
    pub average_versions_per_commit: f64,
    pub average_versions_per_function: f64,
    pub max_versions_in_commit: u64,
    pub never_changed: u64,
    pub most_changed: Option<MostChanged>,
    pub removed: u64,
    pub average_compared_depth: f64,
    /// Mean node count over all distinct revisions' ASTs.
    pub average_revision_size: f64,
}

#[derive(Clone, Debug, Serialize)]
pub struct MostChanged {
    pub function: String,
    pub versions: u64,
}

/// One point of a time series; `day` is an ISO `YYYY-MM-DD` date.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DayPoint {
    pub day: String,
    pub value: u64,
}

/// One point of the functions-count-in-time series, keyed by the commit's
/// author timestamp.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CountPoint {
    pub timestamp_millis: i64,
    pub value: u64,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub versions: u64,
    pub functions: u64,
}

/// Stability buckets: `stable >= 0.8`, `modified >= 0.5`, everything else
/// `active`, where stability is `1 - versions/lifetime`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StabilityPie {
    pub stable: u64,
    pub modified: u64,
    pub active: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct ChartData {
    pub version_histogram: Vec<HistogramBucket>,
    pub changed_per_day: Vec<DayPoint>,
    pub count_in_time: Vec<CountPoint>,
    pub stability: StabilityPie,
}

/// Read-only view of one function's history for presentation layers.
#[derive(Clone, Debug, Serialize)]
pub struct FunctionSummary {
    pub id: String,
    pub versions: u64,
    pub revisions: u64,
    pub life_time: u64,
    pub edit_life_time: u64,
    pub first_appearance: Option<MillisSinceEpoch>,
    pub last_appearance: Option<MillisSinceEpoch>,
    pub deleted: bool,
    pub first: Option<CommitId>,
    pub last: Option<CommitId>,
    pub stability: f64,
}

/// The full report handed to presentation layers.
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub stats: Stats,
    pub charts: ChartData,
    pub functions: Vec<FunctionSummary>,
}

/// Computes the report for a finished run.
pub fn report(history: &History) -> Report {
    let entries = history.entries();
    let commits_analyzed = history.commits_analyzed();
    let total_functions = entries.len() as u64;

    let mut total_versions: u64 = 0;
    let mut never_changed: u64 = 0;
    let mut removed: u64 = 0;
    let mut total_size: u64 = 0;
    let mut sized_revisions: u64 = 0;
    let mut most_changed: Option<MostChanged> = None;
    let mut histogram: BTreeMap<u64, u64> = BTreeMap::new();
    let mut changed_per_day: BTreeMap<String, u64> = BTreeMap::new();
    let mut stability = StabilityPie::default();
    let mut functions = Vec::with_capacity(entries.len());

    for (id, function_history) in &entries {
        let function_history = function_history.lock().unwrap();
        let versions = function_history.versions();
        total_versions += versions;
        if versions <= 1 {
            never_changed += 1;
        }
        if function_history.deleted {
            removed += 1;
        }
        if most_changed
            .as_ref()
            .is_none_or(|candidate| versions > candidate.versions)
        {
            most_changed = Some(MostChanged {
                function: id.clone(),
                versions,
            });
        }
        *histogram.entry(versions).or_default() += 1;

        for element in function_history.elements.values() {
            if let Some(func) = &element.func {
                total_size += same::size(func);
                sized_revisions += 1;
            }
            if !element.new {
                continue;
            }
            let millis = element.commit.timestamp().0;
            if let Some(datetime) = chrono::DateTime::from_timestamp_millis(millis) {
                *changed_per_day
                    .entry(datetime.date_naive().to_string())
                    .or_default() += 1;
            }
        }

        let score = function_history.stability();
        if score >= 0.8 {
            stability.stable += 1;
        } else if score >= 0.5 {
            stability.modified += 1;
        } else {
            stability.active += 1;
        }

        functions.push(FunctionSummary {
            id: id.clone(),
            versions,
            revisions: function_history.elements.len() as u64,
            life_time: function_history.life_time,
            edit_life_time: function_history.edit_life_time,
            first_appearance: function_history.first_appearance,
            last_appearance: function_history.last_appearance,
            deleted: function_history.deleted,
            first: function_history.first.clone(),
            last: function_history.last.clone(),
            stability: score,
        });
    }

    let average = |num: u64, den: u64| {
        if den == 0 { 0.0 } else { num as f64 / den as f64 }
    };
    let stats = Stats {
        commits_analyzed,
        total_functions,
        average_versions_per_commit: average(total_versions, commits_analyzed),
        average_versions_per_function: average(total_versions, total_functions),
        max_versions_in_commit: history.max_changed(),
        never_changed,
        most_changed,
        removed,
        average_compared_depth: same::average_compared_depth(),
        average_revision_size: average(total_size, sized_revisions),
    };

    let count_in_time = history
        .count_per_commit()
        .into_iter()
        .collect::<BTreeMap<_, _>>()
        .into_iter()
        .map(|(timestamp_millis, value)| CountPoint {
            timestamp_millis,
            value,
        })
        .collect();

    let charts = ChartData {
        version_histogram: histogram
            .into_iter()
            .map(|(versions, functions)| HistogramBucket {
                versions,
                functions,
            })
            .collect(),
        changed_per_day: changed_per_day
            .into_iter()
            .map(|(day, value)| DayPoint { day, value })
            .collect(),
        count_in_time,
        stability,
    };

    Report {
        stats,
        charts,
        functions,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ast::LitKind;
    use crate::ast::Node;
    use crate::ast::Span;
    use crate::backend::Commit;
    use crate::backend::MillisSinceEpoch;
    use crate::backend::Signature;
    use crate::backend::Timestamp;
    use crate::object_id::CommitId;

    fn commit(id: &'static str, parents: &[&'static str], millis: i64) -> Commit {
        let signature = Signature {
            name: "Some One".to_string(),
            email: "some.one@example.com".to_string(),
            timestamp: Timestamp {
                timestamp: MillisSinceEpoch(millis),
                tz_offset: 0,
            },
        };
        Commit {
            id: CommitId::from_hex(id),
            parents: parents.iter().map(|p| CommitId::from_hex(p)).collect(),
            author: signature.clone(),
            committer: signature,
        }
    }

    fn decl(value: &str) -> Arc<Node> {
        Arc::new(Node::FuncDecl {
            span: Span::new(0, 10),
            recv: None,
            name: Box::new(Node::Ident {
                span: Span::default(),
                name: "foo".to_string(),
            }),
            typ: Box::new(Node::FuncType {
                span: Span::default(),
                params: None,
                results: None,
            }),
            body: Some(Box::new(Node::ReturnStmt {
                span: Span::default(),
                results: vec![Node::BasicLit {
                    span: Span::default(),
                    kind: LitKind::Int,
                    value: value.to_string(),
                }],
            })),
        })
    }

    #[test]
    fn test_report_counts() {
        let history = History::new();
        let c1 = commit("01", &[], 86_400_000);
        let c2 = commit("02", &["01"], 172_800_000);

        let steady = history.get("pkg.steady");
        steady.lock().unwrap().add_element(decl("1"), &c1, "0123456789");
        steady.lock().unwrap().add_element(decl("1"), &c2, "0123456789");

        let busy = history.get("pkg.busy");
        busy.lock().unwrap().add_element(decl("1"), &c1, "0123456789");
        busy.lock().unwrap().add_element(decl("2"), &c2, "0123456789");

        history.record_commit(&c1, 2, 2);
        history.record_commit(&c2, 2, 1);
        history.post_process();

        let report = report(&history);
        assert_eq!(report.stats.commits_analyzed, 2);
        assert_eq!(report.stats.total_functions, 2);
        assert_eq!(report.stats.max_versions_in_commit, 2);
        assert_eq!(report.stats.never_changed, 1);
        assert_eq!(report.stats.removed, 0);
        let most_changed = report.stats.most_changed.unwrap();
        assert_eq!(most_changed.function, "pkg.busy");
        assert_eq!(most_changed.versions, 2);
        // 3 versions over 2 commits and 2 functions.
        assert_eq!(report.stats.average_versions_per_commit, 1.5);
        assert_eq!(report.stats.average_versions_per_function, 1.5);
        // Every fixture declaration is the same five-node tree.
        assert_eq!(report.stats.average_revision_size, 5.0);

        assert_eq!(
            report.charts.version_histogram,
            vec![
                HistogramBucket {
                    versions: 1,
                    functions: 1
                },
                HistogramBucket {
                    versions: 2,
                    functions: 1
                },
            ]
        );
        // steady: stability 1 - 1/2 = 0.5 -> modified;
        // busy: 1 - 2/2 = 0 -> active.
        assert_eq!(
            report.charts.stability,
            StabilityPie {
                stable: 0,
                modified: 1,
                active: 1
            }
        );
        assert_eq!(report.charts.count_in_time.len(), 2);
        assert_eq!(report.charts.changed_per_day.len(), 2);

        assert_eq!(report.functions.len(), 2);
        let busy_summary = report
            .functions
            .iter()
            .find(|summary| summary.id == "pkg.busy")
            .unwrap();
        assert_eq!(busy_summary.versions, 2);
        assert_eq!(busy_summary.life_time, 2);
        assert_eq!(busy_summary.stability, 0.0);
        assert!(!busy_summary.deleted);
        assert_eq!(busy_summary.first, Some(CommitId::from_hex("01")));
        assert_eq!(busy_summary.last, Some(CommitId::from_hex("02")));
    }
}
