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

//! Classical line-level longest-common-subsequence diff.
//!
//! The text backend produces the same `(color, pos, end)` output shape as
//! the structural colorer, with positions expressed as offsets into the
//! originating text (`a` in [`Mode::Old`], interleaved with `b`'s inserted
//! lines in [`Mode::New`]). The procedure is deterministic: equal inputs
//! always yield byte-identical colorings.

use crate::coloring::Color;
use crate::coloring::ColorChange;
use crate::coloring::Coloring;
use crate::coloring::Mode;

struct SimpleColoring<'a> {
    color: Color,
    data: &'a str,
}

/// Diffs two source strings line by line. `offset` shifts all emitted
/// positions, for buffers that are slices of a larger file.
pub fn lcs_diff(a: &str, b: &str, offset: usize, mode: Mode) -> Coloring {
    let a_lines: Vec<&str> = a.split('\n').collect();
    let b_lines: Vec<&str> = b.split('\n').collect();
    let table = lcs_table(&a_lines, &b_lines);

    let mut offset = offset;
    let mut coloring = Coloring::new();
    for simple in emit(&table, &a_lines, &b_lines, mode) {
        coloring.push(ColorChange::new(
            simple.color,
            offset,
            offset + simple.data.len(),
        ));
        offset += simple.data.len() + 1;
    }
    coloring
}

fn lcs_table(x: &[&str], y: &[&str]) -> Vec<Vec<usize>> {
    let m = x.len();
    let n = y.len();
    let mut table = vec![vec![0; n + 1]; m + 1];
    for i in 0..m {
        for j in 0..n {
            table[i + 1][j + 1] = if x[i] == y[j] {
                table[i][j] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }
    table
}

fn emit<'a>(
    table: &[Vec<usize>],
    x: &[&'a str],
    y: &[&'a str],
    mode: Mode,
) -> Vec<SimpleColoring<'a>> {
    let mut reversed = Vec::new();
    let mut i = x.len();
    let mut j = y.len();
    while i > 0 || j > 0 {
        if i > 0 && j > 0 && x[i - 1] == y[j - 1] {
            reversed.push(SimpleColoring {
                color: Color::Same,
                data: x[i - 1],
            });
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || table[i][j - 1] >= table[i - 1][j]) {
            if mode == Mode::New {
                reversed.push(SimpleColoring {
                    color: Color::New,
                    data: y[j - 1],
                });
            }
            j -= 1;
        } else {
            if mode == Mode::Old {
                reversed.push(SimpleColoring {
                    color: Color::Removed,
                    data: x[i - 1],
                });
            }
            i -= 1;
        }
    }
    reversed.reverse();
    reversed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_inputs_are_all_same() {
        let text = "a\nb\nc";
        let coloring = lcs_diff(text, text, 0, Mode::Old);
        assert_eq!(
            coloring,
            vec![
                ColorChange::new(Color::Same, 0, 1),
                ColorChange::new(Color::Same, 2, 3),
                ColorChange::new(Color::Same, 4, 5),
            ]
        );
    }

    #[test]
    fn test_removed_line() {
        let a = "keep\ngone\nkeep2";
        let b = "keep\nkeep2";
        let coloring = lcs_diff(a, b, 0, Mode::Old);
        assert_eq!(
            coloring,
            vec![
                ColorChange::new(Color::Same, 0, 4),
                ColorChange::new(Color::Removed, 5, 9),
                ColorChange::new(Color::Same, 10, 15),
            ]
        );
    }

    #[test]
    fn test_added_line_in_new_mode() {
        let a = "keep";
        let b = "keep\nadded";
        let coloring = lcs_diff(a, b, 0, Mode::New);
        assert_eq!(
            coloring,
            vec![
                ColorChange::new(Color::Same, 0, 4),
                ColorChange::new(Color::New, 5, 10),
            ]
        );
    }

    #[test]
    fn test_old_mode_never_emits_new() {
        let coloring = lcs_diff("x\ny", "x\nz\ny", 0, Mode::Old);
        assert!(coloring.iter().all(|c| c.color != Color::New));
    }

    #[test]
    fn test_offset_shifts_positions() {
        let coloring = lcs_diff("a", "a", 100, Mode::Old);
        assert_eq!(coloring, vec![ColorChange::new(Color::Same, 100, 101)]);
    }

    #[test]
    fn test_deterministic_rerun() {
        let a = "one\ntwo\nthree\nfour";
        let b = "one\nthree\nfour\nfive";
        let first = lcs_diff(a, b, 0, Mode::New);
        let second = lcs_diff(a, b, 0, Mode::New);
        assert_eq!(first, second);
    }
}
