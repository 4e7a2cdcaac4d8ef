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

//! Colored byte ranges over a source buffer, the output shape of both diff
//! backends.

use serde::Serialize;

use crate::ast::Node;

/// Highlight class of a range. `Same` is the implicit default; the colorers
/// emit it only for ranges they explicitly verified as unchanged.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum Color {
    Same,
    New,
    Removed,
    Similar,
}

/// Which side of a comparison the coloring describes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    /// Color the old version; changed ranges are `Removed`.
    Old,
    /// Color the new version; changed ranges are `New`.
    New,
}

impl Mode {
    pub fn to_color(self) -> Color {
        match self {
            Self::Old => Color::Removed,
            Self::New => Color::New,
        }
    }
}

/// One colored byte range. `end` is exclusive.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct ColorChange {
    pub color: Color,
    pub pos: usize,
    pub end: usize,
}

impl ColorChange {
    pub fn new(color: Color, pos: usize, end: usize) -> Self {
        Self { color, pos, end }
    }

    /// Colors the node's entire span.
    pub fn of(color: Color, node: &Node) -> Self {
        let span = node.span();
        Self::new(color, span.pos, span.end)
    }
}

/// An ordered list of colored ranges.
pub type Coloring = Vec<ColorChange>;

/// Sorts the ranges and resolves overlaps so the result is pairwise
/// disjoint. Where two emitted ranges overlap, the smaller one wins and the
/// larger is clipped around it; empty ranges are dropped.
pub fn normalize(coloring: Coloring) -> Coloring {
    let mut by_size: Vec<ColorChange> = coloring
        .into_iter()
        .filter(|change| change.pos < change.end)
        .collect();
    by_size.sort_by_key(|change| (change.end - change.pos, change.pos));

    // Claimed intervals, kept sorted by position.
    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut result = Coloring::new();
    for change in by_size {
        let mut cursor = change.pos;
        for &(start, end) in &claimed {
            if end <= cursor {
                continue;
            }
            if start >= change.end {
                break;
            }
            if start > cursor {
                result.push(ColorChange::new(change.color, cursor, start));
            }
            cursor = cursor.max(end);
            if cursor >= change.end {
                break;
            }
        }
        if cursor < change.end {
            result.push(ColorChange::new(change.color, cursor, change.end));
        }
        claimed.push((change.pos, change.end));
        claimed.sort_unstable();
    }

    result.sort_by_key(|change| (change.pos, change.end));
    result
}
