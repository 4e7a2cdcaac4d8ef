// Copyright 2022 The fnhist Authors
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

//! The interface the analysis consumes to read a versioned store.
//!
//! The core needs very little from a repository: commits with identities,
//! parent links and timestamps, and a way to enumerate a commit's files as
//! `(path, bytes)` pairs. Everything else (transport, refs, object formats)
//! stays behind the [`Backend`] trait.

use std::collections::HashMap;
use std::fmt::Debug;

use chrono::TimeZone as _;
use thiserror::Error;

use crate::object_id::CommitId;

#[derive(Debug, Error)]
#[error("Out-of-range date")]
pub struct TimestampOutOfRange;

/// Milliseconds since the UNIX epoch.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, serde::Serialize)]
pub struct MillisSinceEpoch(pub i64);

/// A timestamp with a timezone offset, as recorded in commit metadata.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd, serde::Serialize)]
pub struct Timestamp {
    pub timestamp: MillisSinceEpoch,
    // time zone offset in minutes
    pub tz_offset: i32,
}

impl Timestamp {
    pub fn from_datetime<Tz: chrono::TimeZone<Offset = chrono::offset::FixedOffset>>(
        datetime: chrono::DateTime<Tz>,
    ) -> Self {
        Self {
            timestamp: MillisSinceEpoch(datetime.timestamp_millis()),
            tz_offset: datetime.offset().local_minus_utc() / 60,
        }
    }

    pub fn to_datetime(
        &self,
    ) -> Result<chrono::DateTime<chrono::FixedOffset>, TimestampOutOfRange> {
        let utc = match chrono::Utc.timestamp_opt(
            self.timestamp.0.div_euclid(1000),
            (self.timestamp.0.rem_euclid(1000)) as u32 * 1000000,
        ) {
            chrono::LocalResult::None => {
                return Err(TimestampOutOfRange);
            }
            chrono::LocalResult::Single(x) => x,
            chrono::LocalResult::Ambiguous(y, _z) => y,
        };
        Ok(utc.with_timezone(
            &chrono::FixedOffset::east_opt(self.tz_offset * 60)
                .unwrap_or_else(|| chrono::FixedOffset::east_opt(0).unwrap()),
        ))
    }
}

/// Author or committer identity attached to a commit.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub timestamp: Timestamp,
}

/// An immutable commit record.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct Commit {
    pub id: CommitId,
    pub parents: Vec<CommitId>,
    pub author: Signature,
    pub committer: Signature,
}

impl Commit {
    /// The commit's position on the history timeline: the earlier of the
    /// author and committer timestamps. Rebases and cherry-picks move the
    /// committer stamp forward, so the minimum is the stabler of the two.
    pub fn timestamp(&self) -> MillisSinceEpoch {
        self.author
            .timestamp
            .timestamp
            .min(self.committer.timestamp.timestamp)
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Object {hash} not found")]
    ObjectNotFound { hash: String },
    #[error("Reference {reference} not found as a hash or branch")]
    ReferenceNotFound { reference: String },
    #[error("Error when reading object {hash}")]
    ReadObject {
        hash: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Error enumerating files of commit {hash}")]
    ListFiles {
        hash: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// A file of a commit's tree.
pub type FileEntry = (String, Vec<u8>);

/// Iterator over a commit's files. Individual `Err` items are per-file read
/// failures the caller may skip; failing to produce the iterator at all is
/// an enumeration failure and fatal to the walk.
pub type FileIter<'a> = Box<dyn Iterator<Item = BackendResult<FileEntry>> + Send + 'a>;

/// Read access to the versioned store.
pub trait Backend: Send + Sync + Debug {
    /// Resolves a start reference, given either as a (full) commit hash or a
    /// branch short name, to a commit id.
    fn resolve_reference(&self, reference: &str) -> BackendResult<CommitId>;

    /// Returns every commit reachable from `head` through parent edges,
    /// keyed by id. `head` itself is included.
    fn commits_from(&self, head: &CommitId) -> BackendResult<HashMap<CommitId, Commit>>;

    /// Enumerates the files of the commit's tree, recursively, as
    /// repo-relative slash-separated paths with blob contents.
    fn files(&self, commit: &CommitId) -> BackendResult<FileIter<'_>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timestamp(millis: i64) -> Timestamp {
        Timestamp {
            timestamp: MillisSinceEpoch(millis),
            tz_offset: 0,
        }
    }

    fn signature(millis: i64) -> Signature {
        Signature {
            name: "Some One".to_string(),
            email: "some.one@example.com".to_string(),
            timestamp: timestamp(millis),
        }
    }

    #[test]
    fn test_commit_timestamp_is_min_of_author_and_committer() {
        let commit = Commit {
            id: CommitId::from_hex("aa"),
            parents: vec![],
            author: signature(1000),
            committer: signature(2000),
        };
        assert_eq!(commit.timestamp(), MillisSinceEpoch(1000));
    }

    #[test]
    fn test_timestamp_datetime_round_trip() {
        let ts = timestamp(1_700_000_000_000);
        let datetime = ts.to_datetime().unwrap();
        assert_eq!(Timestamp::from_datetime(datetime), ts);
    }
}
