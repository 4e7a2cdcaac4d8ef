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

//! Helpers for authoring throwaway git repositories in tests.

use std::path::Path;

/// Initializes an isolated repository with a worktree at `directory`.
pub fn init(directory: impl AsRef<Path>) -> gix::Repository {
    gix::ThreadSafeRepository::init_opts(
        directory.as_ref(),
        gix::create::Kind::WithWorktree,
        gix::create::Options::default(),
        gix::open::Options::isolated(),
    )
    .unwrap()
    .to_thread_local()
}

fn signature(seconds: i64) -> gix::actor::Signature {
    gix::actor::Signature {
        name: "Some One".into(),
        email: "some.one@example.com".into(),
        time: gix::date::Time::new(seconds, 0),
    }
}

pub struct CommitResult {
    pub tree_id: gix::ObjectId,
    pub commit_id: gix::ObjectId,
}

/// Writes `content` at `filename` on top of the first parent's tree and
/// commits the result, updating `reference`.
pub fn add_commit(
    repo: &gix::Repository,
    reference: &str,
    filename: &str,
    content: &[u8],
    message: &str,
    seconds: i64,
    parents: &[gix::ObjectId],
) -> CommitResult {
    let blob_oid = repo.write_blob(content).unwrap();

    let parent_tree_editor = parents.first().map(|commit_id| {
        repo.find_commit(*commit_id)
            .unwrap()
            .tree()
            .unwrap()
            .edit()
            .unwrap()
    });
    let empty_tree_editor_fn = || {
        repo.edit_tree(gix::ObjectId::empty_tree(repo.object_hash()))
            .unwrap()
    };

    let mut tree_editor = parent_tree_editor.unwrap_or_else(empty_tree_editor_fn);
    tree_editor
        .upsert(filename, gix::object::tree::EntryKind::Blob, blob_oid)
        .unwrap();
    let tree_id = tree_editor.write().unwrap().detach();

    let signature = signature(seconds);
    let mut author_time_buf = gix::date::parse::TimeBuf::default();
    let mut committer_time_buf = gix::date::parse::TimeBuf::default();
    let commit_id = repo
        .commit_as(
            signature.to_ref(&mut committer_time_buf),
            signature.to_ref(&mut author_time_buf),
            reference,
            message,
            tree_id,
            parents.iter().copied(),
        )
        .unwrap()
        .detach();
    CommitResult { tree_id, commit_id }
}
