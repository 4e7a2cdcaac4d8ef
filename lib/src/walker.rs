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

//! Parallel topological traversal of the commit graph.
//!
//! Every commit node runs as one task. A per-node semaphore counts parent
//! arrivals: the task first acquires as many permits as the node has
//! in-interval parents, so it cannot start before every parent's task has
//! finished and released its one permit per child. Releases happen in a
//! drop guard so they fire on failure paths too. A shared queued-set makes
//! sure exactly one task enqueues any given node.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::backend::Backend;
use crate::backend::BackendError;
use crate::collector;
use crate::collector::AnalysisOptions;
use crate::graph::CommitGraph;
use crate::history::History;
use crate::object_id::CommitId;

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("Failed to analyze commit {commit}")]
    Analyze {
        commit: CommitId,
        source: BackendError,
    },
    #[error("Failed to start the walker runtime")]
    Runtime(#[source] std::io::Error),
}

enum QueueMessage {
    Run(CommitId),
    Close,
}

/// Releases one permit to every child when dropped, whatever the exit path.
struct ArrivalSignal {
    semaphores: Arc<HashMap<CommitId, Arc<Semaphore>>>,
    children: Vec<CommitId>,
}

impl Drop for ArrivalSignal {
    fn drop(&mut self) {
        for child in &self.children {
            if let Some(semaphore) = self.semaphores.get(child) {
                semaphore.add_permits(1);
            }
        }
    }
}

/// Walks the graph from its root, analyzing every commit under the ordering
/// guarantees the history model needs: all logical parents of a commit are
/// fully analyzed before the commit itself.
pub fn walk(
    backend: Arc<dyn Backend>,
    graph: &CommitGraph,
    history: Arc<History>,
    options: &AnalysisOptions,
) -> Result<(), WalkError> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .thread_name("fnhist-walker")
        .build()
        .map_err(WalkError::Runtime)?;
    runtime.block_on(drive(backend, graph, history, options))
}

async fn drive(
    backend: Arc<dyn Backend>,
    graph: &CommitGraph,
    history: Arc<History>,
    options: &AnalysisOptions,
) -> Result<(), WalkError> {
    let semaphores: Arc<HashMap<CommitId, Arc<Semaphore>>> = Arc::new(
        graph
            .nodes
            .keys()
            .map(|id| (id.clone(), Arc::new(Semaphore::new(0))))
            .collect(),
    );
    let queued: Arc<Mutex<HashSet<CommitId>>> = Arc::new(Mutex::new(HashSet::new()));
    let (tx, mut rx) = mpsc::unbounded_channel();

    queued.lock().unwrap().insert(graph.root.clone());
    tx.send(QueueMessage::Run(graph.root.clone())).ok();

    let mut tasks: JoinSet<Result<(), WalkError>> = JoinSet::new();
    let mut first_error = None;
    loop {
        let id = tokio::select! {
            message = rx.recv() => match message {
                Some(QueueMessage::Run(id)) => id,
                Some(QueueMessage::Close) | None => break,
            },
            // Reap finished tasks as we go; a panicking task would otherwise
            // leave the queue open forever.
            Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                if let Some(err) = reap(joined) {
                    first_error.get_or_insert(err);
                    break;
                }
                continue;
            }
        };
        let node = &graph.nodes[&id];
        let commit = node.commit.clone();
        let parent_count = node.parents.len() as u32;
        let children = node.children.clone();
        let is_head = id == graph.head;

        let backend = backend.clone();
        let history = history.clone();
        let semaphores = semaphores.clone();
        let queued = queued.clone();
        let tx = tx.clone();
        let options = options.clone();
        tasks.spawn(async move {
            let semaphore = &semaphores[&id];
            let permits = semaphore
                .acquire_many(parent_count)
                .await
                .expect("arrival semaphores are never closed");
            permits.forget();

            let signal = ArrivalSignal {
                semaphores: semaphores.clone(),
                children: children.clone(),
            };
            let result = collector::analyze_commit(backend.as_ref(), &history, &commit, &options);
            drop(signal);

            match result {
                Ok(()) => {
                    if is_head {
                        tx.send(QueueMessage::Close).ok();
                    } else {
                        for child in children {
                            if queued.lock().unwrap().insert(child.clone()) {
                                tx.send(QueueMessage::Run(child)).ok();
                            }
                        }
                    }
                    Ok(())
                }
                Err(err) => {
                    tracing::error!(commit = %commit.id, %err, "commit analysis failed");
                    // Unblock the driver; remaining tasks are aborted below.
                    tx.send(QueueMessage::Close).ok();
                    Err(WalkError::Analyze {
                        commit: commit.id.clone(),
                        source: err,
                    })
                }
            }
        });
    }

    // The queue is closed; wait for the stragglers. On failure, abort
    // whatever is still blocked on its arrival semaphore.
    if first_error.is_some() {
        tasks.abort_all();
    }
    while let Some(joined) = tasks.join_next().await {
        if let Some(err) = reap(joined) {
            if first_error.is_none() {
                first_error = Some(err);
                tasks.abort_all();
            }
        }
    }
    match first_error {
        Some(err) => Err(err),
        None => {
            history.post_process();
            Ok(())
        }
    }
}

/// Turns a join result into the task's error, if any. Cancellations are
/// expected after an abort; panics are propagated.
fn reap(joined: Result<Result<(), WalkError>, tokio::task::JoinError>) -> Option<WalkError> {
    match joined {
        Ok(Ok(())) => None,
        Ok(Err(err)) => Some(err),
        Err(join_error) if join_error.is_cancelled() => None,
        Err(join_error) => std::panic::resume_unwind(join_error.into_panic()),
    }
}
