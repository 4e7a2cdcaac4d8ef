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

//! Shared fixtures for fnhist tests: an in-memory repository backend and
//! helpers for authoring throwaway git repositories.

pub mod git;
mod test_backend;

pub use test_backend::TestBackend;

use fnhist_lib::backend::MillisSinceEpoch;
use fnhist_lib::backend::Signature;
use fnhist_lib::backend::Timestamp;

/// A deterministic signature for fixture commits.
pub fn test_signature(millis: i64) -> Signature {
    Signature {
        name: "Some One".to_string(),
        email: "some.one@example.com".to_string(),
        timestamp: Timestamp {
            timestamp: MillisSinceEpoch(millis),
            tz_offset: 0,
        },
    }
}
