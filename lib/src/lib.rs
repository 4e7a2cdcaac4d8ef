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

//! Function-level history analysis for Go repositories.
//!
//! `fnhist-lib` walks a git commit graph in parallel topological order,
//! parses every Go file at every commit, and builds a per-function DAG of
//! *distinct* structural revisions: consecutive commits that don't touch a
//! function collapse onto one revision, cosmetic edits (comments,
//! formatting) don't count as changes, and merges track which side a
//! function's body came from. On top of the model it derives change
//! statistics and structural diff colorings for side-by-side browsing.

pub mod ast;
pub mod backend;
pub mod collector;
pub mod coloring;
pub mod compare;
pub mod diff;
pub mod git_backend;
pub mod go_parser;
pub mod graph;
pub mod hex_util;
pub mod history;
pub mod lcs;
pub mod matching;
pub mod object_id;
pub mod same;
pub mod stats;
pub mod walker;
