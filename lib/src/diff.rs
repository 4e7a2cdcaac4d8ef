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

//! Structural diff coloring between two versions of a function.
//!
//! The walk recurses into children of the first argument and paints ranges
//! of its source buffer: unmatched or kind-changed nodes get the requesting
//! mode's color, matched-but-reordered list children get `Similar`, and
//! everything else recurses. Callers color the old version with [`Mode::Old`]
//! and the new version by swapping the arguments and using [`Mode::New`].

use crate::ast::Node;
use crate::coloring::Color;
use crate::coloring::ColorChange;
use crate::coloring::Coloring;
use crate::coloring::Mode;
use crate::coloring::normalize;
use crate::matching::Matching;
use crate::matching::match_nodes;

/// Produces the coloring of `a`'s source buffer against `b`.
///
/// As a special case, a missing counterpart colors the whole present node:
/// the first revision of a function is entirely `New`, a deleted revision
/// entirely `Removed`. The result is sorted and pairwise disjoint.
pub fn diff(a: Option<&Node>, b: Option<&Node>, mode: Mode) -> Coloring {
    let raw = match (a, b) {
        (None, Some(b)) if mode == Mode::New => vec![ColorChange::of(Color::New, b)],
        (Some(a), None) if mode == Mode::Old => vec![ColorChange::of(Color::Removed, a)],
        (Some(a), Some(b)) => diff_nodes(a, b, mode),
        (Some(a), None) => vec![ColorChange::of(mode.to_color(), a)],
        (None, _) => Coloring::new(),
    };
    normalize(raw)
}

fn whole(a: &Node, mode: Mode) -> Coloring {
    vec![ColorChange::of(mode.to_color(), a)]
}

fn diff_opt(a: &Option<Box<Node>>, b: &Option<Box<Node>>, mode: Mode) -> Coloring {
    match (a.as_deref(), b.as_deref()) {
        (Some(a), Some(b)) => diff_nodes(a, b, mode),
        (Some(a), None) => whole(a, mode),
        (None, _) => Coloring::new(),
    }
}

/// Colors a matched-up list: unmatched children are painted whole in the
/// mode color, reordered ones in `Similar`, and matched pairs recurse.
fn color_matches(matches: Vec<Matching<'_, Node>>, mode: Mode) -> Coloring {
    let mut coloring = Coloring::new();
    for matching in matches {
        match matching.next {
            None => coloring.push(ColorChange::of(mode.to_color(), matching.prev)),
            Some(_) if matching.order_changed => {
                coloring.push(ColorChange::of(Color::Similar, matching.prev));
            }
            Some(next) => coloring.extend(diff_nodes(matching.prev, next, mode)),
        }
    }
    coloring
}

fn diff_lists(a: &[Node], b: &[Node], mode: Mode, label: &'static str) -> Coloring {
    color_matches(match_nodes(a, b, label), mode)
}

fn diff_nodes(a: &Node, b: &Node, mode: Mode) -> Coloring {
    let mut coloring = Coloring::new();
    use Node::*;
    match (a, b) {
        // Declarations.
        (
            FuncDecl { name: a_name, typ: a_typ, body: a_body, .. },
            FuncDecl { name: b_name, typ: b_typ, body: b_body, .. },
        ) => {
            coloring.extend(diff_nodes(a_typ, b_typ, mode));
            coloring.extend(diff_nodes(a_name, b_name, mode));
            coloring.extend(diff_opt(a_body, b_body, mode));
        }
        (
            GenDecl { tok: a_tok, specs: a_specs, .. },
            GenDecl { tok: b_tok, specs: b_specs, .. },
        ) => {
            if a_tok != b_tok {
                return whole(a, mode);
            }
            coloring.extend(diff_lists(a_specs, b_specs, mode, "specs"));
        }
        (
            ValueSpec { names: a_names, typ: a_typ, values: a_values, .. },
            ValueSpec { names: b_names, typ: b_typ, values: b_values, .. },
        ) => {
            coloring.extend(diff_lists(a_names, b_names, mode, "names"));
            coloring.extend(diff_opt(a_typ, b_typ, mode));
            coloring.extend(diff_lists(a_values, b_values, mode, "values"));
        }
        (TypeSpec { name: a_name, typ: a_typ, .. }, TypeSpec { name: b_name, typ: b_typ, .. }) => {
            coloring.extend(diff_nodes(a_name, b_name, mode));
            coloring.extend(diff_nodes(a_typ, b_typ, mode));
        }
        (ImportSpec { name: a_name, .. }, ImportSpec { name: b_name, .. }) => {
            coloring.extend(diff_opt(a_name, b_name, mode));
        }

        // Statements.
        (BlockStmt { list: a_list, .. }, BlockStmt { list: b_list, .. }) => {
            coloring.extend(diff_lists(a_list, b_list, mode, "block"));
        }
        (
            ForStmt { init: a_init, cond: a_cond, post: a_post, body: a_body, .. },
            ForStmt { init: b_init, cond: b_cond, post: b_post, body: b_body, .. },
        ) => {
            coloring.extend(diff_opt(a_init, b_init, mode));
            coloring.extend(diff_opt(a_cond, b_cond, mode));
            coloring.extend(diff_opt(a_post, b_post, mode));
            coloring.extend(diff_nodes(a_body, b_body, mode));
        }
        (ExprStmt { x: a_x, .. }, ExprStmt { x: b_x, .. }) => {
            coloring.extend(diff_nodes(a_x, b_x, mode));
        }
        (
            IfStmt { init: a_init, cond: a_cond, body: a_body, els: a_els, .. },
            IfStmt { init: b_init, cond: b_cond, body: b_body, els: b_els, .. },
        ) => {
            coloring.extend(diff_opt(a_init, b_init, mode));
            coloring.extend(diff_nodes(a_cond, b_cond, mode));
            coloring.extend(diff_nodes(a_body, b_body, mode));
            coloring.extend(diff_opt(a_els, b_els, mode));
        }
        (
            AssignStmt { lhs: a_lhs, rhs: a_rhs, .. },
            AssignStmt { lhs: b_lhs, rhs: b_rhs, .. },
        ) => {
            coloring.extend(diff_lists(a_lhs, b_lhs, mode, "assign-lhs"));
            coloring.extend(diff_lists(a_rhs, b_rhs, mode, "assign-rhs"));
        }
        (
            SwitchStmt { init: a_init, tag: a_tag, body: a_body, .. },
            SwitchStmt { init: b_init, tag: b_tag, body: b_body, .. },
        ) => {
            coloring.extend(diff_opt(a_init, b_init, mode));
            coloring.extend(diff_opt(a_tag, b_tag, mode));
            coloring.extend(diff_nodes(a_body, b_body, mode));
        }
        (
            TypeSwitchStmt { init: a_init, assign: a_assign, body: a_body, .. },
            TypeSwitchStmt { init: b_init, assign: b_assign, body: b_body, .. },
        ) => {
            coloring.extend(diff_nodes(a_assign, b_assign, mode));
            coloring.extend(diff_opt(a_init, b_init, mode));
            coloring.extend(diff_nodes(a_body, b_body, mode));
        }
        (
            CaseClause { list: a_list, body: a_body, .. },
            CaseClause { list: b_list, body: b_body, .. },
        ) => {
            coloring.extend(diff_lists(a_list, b_list, mode, "case"));
            coloring.extend(diff_lists(a_body, b_body, mode, "case-body"));
        }
        (DeclStmt { decl: a_decl, .. }, DeclStmt { decl: b_decl, .. }) => {
            coloring.extend(diff_nodes(a_decl, b_decl, mode));
        }
        (
            ReturnStmt { results: a_results, .. },
            ReturnStmt { results: b_results, .. },
        ) => {
            coloring.extend(diff_lists(a_results, b_results, mode, "return"));
        }
        (
            RangeStmt { key: a_key, value: a_value, x: a_x, body: a_body, .. },
            RangeStmt { key: b_key, value: b_value, x: b_x, body: b_body, .. },
        ) => {
            coloring.extend(diff_opt(a_key, b_key, mode));
            coloring.extend(diff_opt(a_value, b_value, mode));
            coloring.extend(diff_nodes(a_x, b_x, mode));
            coloring.extend(diff_nodes(a_body, b_body, mode));
        }
        (
            IncDecStmt { x: a_x, tok: a_tok, .. },
            IncDecStmt { x: b_x, tok: b_tok, .. },
        ) => {
            if a_tok != b_tok {
                return whole(a, mode);
            }
            coloring.extend(diff_nodes(a_x, b_x, mode));
        }
        (
            BranchStmt { tok: a_tok, label: a_label, .. },
            BranchStmt { tok: b_tok, label: b_label, .. },
        ) => {
            if a_tok != b_tok {
                return whole(a, mode);
            }
            if let Some(a_label) = a_label {
                match b_label {
                    Some(b_label) => coloring.extend(diff_nodes(a_label, b_label, mode)),
                    None => return whole(a, mode),
                }
            }
        }
        (GoStmt { call: a_call, .. }, GoStmt { call: b_call, .. }) => {
            coloring.extend(diff_nodes(a_call, b_call, mode));
        }
        (DeferStmt { call: a_call, .. }, DeferStmt { call: b_call, .. }) => {
            coloring.extend(diff_nodes(a_call, b_call, mode));
        }
        (SelectStmt { body: a_body, .. }, SelectStmt { body: b_body, .. }) => {
            coloring.extend(diff_nodes(a_body, b_body, mode));
        }
        (
            CommClause { comm: a_comm, body: a_body, .. },
            CommClause { comm: b_comm, body: b_body, .. },
        ) => {
            coloring.extend(diff_opt(a_comm, b_comm, mode));
            coloring.extend(diff_lists(a_body, b_body, mode, "comm"));
        }
        (
            SendStmt { chan: a_chan, value: a_value, .. },
            SendStmt { chan: b_chan, value: b_value, .. },
        ) => {
            coloring.extend(diff_nodes(a_chan, b_chan, mode));
            coloring.extend(diff_nodes(a_value, b_value, mode));
        }
        (
            LabeledStmt { label: a_label, stmt: a_stmt, .. },
            LabeledStmt { label: b_label, stmt: b_stmt, .. },
        ) => {
            coloring.extend(diff_nodes(a_label, b_label, mode));
            coloring.extend(diff_nodes(a_stmt, b_stmt, mode));
        }
        (EmptyStmt { .. }, EmptyStmt { .. }) => {}
        (BadStmt { .. }, BadStmt { .. })
        | (BadExpr { .. }, BadExpr { .. })
        | (BadDecl { .. }, BadDecl { .. }) => {}

        // Expressions.
        (
            CallExpr { fun: a_fun, args: a_args, .. },
            CallExpr { fun: b_fun, args: b_args, .. },
        ) => {
            // A changed callee repaints the whole call; otherwise only the
            // arguments that moved or changed get colored.
            let fun_coloring = diff_nodes(a_fun, b_fun, mode);
            if !fun_coloring.is_empty() {
                return whole(a, mode);
            }
            coloring.extend(diff_lists(a_args, b_args, mode, "call"));
        }
        (
            SelectorExpr { x: a_x, sel: a_sel, .. },
            SelectorExpr { x: b_x, sel: b_sel, .. },
        ) => {
            if a_sel.ident_name() != b_sel.ident_name() {
                coloring.push(ColorChange::of(mode.to_color(), a_sel));
            }
            coloring.extend(diff_nodes(a_x, b_x, mode));
        }
        (Ident { name: a_name, .. }, Ident { name: b_name, .. }) => {
            if a_name != b_name {
                return whole(a, mode);
            }
        }
        (
            BinaryExpr { x: a_x, op: a_op, y: a_y, .. },
            BinaryExpr { x: b_x, op: b_op, y: b_y, .. },
        ) => {
            if a_op != b_op {
                return whole(a, mode);
            }
            coloring.extend(diff_nodes(a_x, b_x, mode));
            coloring.extend(diff_nodes(a_y, b_y, mode));
        }
        (StarExpr { x: a_x, .. }, StarExpr { x: b_x, .. }) => {
            coloring.extend(diff_nodes(a_x, b_x, mode));
        }
        (ParenExpr { x: a_x, .. }, ParenExpr { x: b_x, .. }) => {
            coloring.extend(diff_nodes(a_x, b_x, mode));
        }
        (
            UnaryExpr { op: a_op, x: a_x, .. },
            UnaryExpr { op: b_op, x: b_x, .. },
        ) => {
            if a_op != b_op {
                return whole(a, mode);
            }
            coloring.extend(diff_nodes(a_x, b_x, mode));
        }
        (
            BasicLit { kind: a_kind, value: a_value, .. },
            BasicLit { kind: b_kind, value: b_value, .. },
        ) => {
            if a_kind != b_kind || a_value != b_value {
                return whole(a, mode);
            }
        }
        (
            IndexExpr { x: a_x, index: a_index, .. },
            IndexExpr { x: b_x, index: b_index, .. },
        ) => {
            coloring.extend(diff_nodes(a_x, b_x, mode));
            coloring.extend(diff_nodes(a_index, b_index, mode));
        }
        (
            SliceExpr { x: a_x, low: a_low, high: a_high, max: a_max, .. },
            SliceExpr { x: b_x, low: b_low, high: b_high, max: b_max, .. },
        ) => {
            coloring.extend(diff_nodes(a_x, b_x, mode));
            coloring.extend(diff_opt(a_low, b_low, mode));
            coloring.extend(diff_opt(a_high, b_high, mode));
            coloring.extend(diff_opt(a_max, b_max, mode));
        }
        (
            KeyValueExpr { key: a_key, value: a_value, .. },
            KeyValueExpr { key: b_key, value: b_value, .. },
        ) => {
            coloring.extend(diff_nodes(a_key, b_key, mode));
            coloring.extend(diff_nodes(a_value, b_value, mode));
        }
        (
            CompositeLit { typ: a_typ, elts: a_elts, .. },
            CompositeLit { typ: b_typ, elts: b_elts, .. },
        ) => {
            coloring.extend(diff_opt(a_typ, b_typ, mode));
            coloring.extend(diff_lists(a_elts, b_elts, mode, "composite"));
        }
        (
            TypeAssertExpr { x: a_x, typ: a_typ, .. },
            TypeAssertExpr { x: b_x, typ: b_typ, .. },
        ) => {
            coloring.extend(diff_nodes(a_x, b_x, mode));
            coloring.extend(diff_opt(a_typ, b_typ, mode));
        }
        (
            FuncLit { typ: a_typ, body: a_body, .. },
            FuncLit { typ: b_typ, body: b_body, .. },
        ) => {
            coloring.extend(diff_nodes(a_typ, b_typ, mode));
            coloring.extend(diff_nodes(a_body, b_body, mode));
        }

        // Types reachable from a function signature.
        (
            FuncType { params: a_params, results: a_results, .. },
            FuncType { params: b_params, results: b_results, .. },
        ) => {
            coloring.extend(diff_opt(a_params, b_params, mode));
            coloring.extend(diff_opt(a_results, b_results, mode));
        }
        (FieldList { list: a_list, .. }, FieldList { list: b_list, .. }) => {
            coloring.extend(diff_lists(a_list, b_list, mode, "fields"));
        }
        (
            Field { names: a_names, typ: a_typ, .. },
            Field { names: b_names, typ: b_typ, .. },
        ) => {
            coloring.extend(diff_lists(a_names, b_names, mode, "field-names"));
            coloring.extend(diff_opt(a_typ, b_typ, mode));
        }
        (
            ArrayType { len: a_len, elt: a_elt, .. },
            ArrayType { len: b_len, elt: b_elt, .. },
        ) => {
            coloring.extend(diff_opt(a_len, b_len, mode));
            coloring.extend(diff_nodes(a_elt, b_elt, mode));
        }
        (
            MapType { key: a_key, value: a_value, .. },
            MapType { key: b_key, value: b_value, .. },
        ) => {
            coloring.extend(diff_nodes(a_key, b_key, mode));
            coloring.extend(diff_nodes(a_value, b_value, mode));
        }
        (ChanType { dir: a_dir, value: a_value, .. }, ChanType { dir: b_dir, value: b_value, .. }) => {
            if a_dir != b_dir {
                return whole(a, mode);
            }
            coloring.extend(diff_nodes(a_value, b_value, mode));
        }
        (StructType { fields: a_fields, .. }, StructType { fields: b_fields, .. }) => {
            coloring.extend(diff_opt(a_fields, b_fields, mode));
        }
        (
            InterfaceType { methods: a_methods, .. },
            InterfaceType { methods: b_methods, .. },
        ) => {
            coloring.extend(diff_opt(a_methods, b_methods, mode));
        }
        (Ellipsis { elt: a_elt, .. }, Ellipsis { elt: b_elt, .. }) => {
            coloring.extend(diff_opt(a_elt, b_elt, mode));
        }

        // Kinds with no position in a function diff behave as opaque leaves.
        (Package { .. }, _) | (Comment { .. }, _) | (CommentGroup { .. }, _) => {
            tracing::error!(kind = a.kind_name(), "diff: unexpected node kind");
            return whole(a, mode);
        }

        // Kind changed between the two versions.
        _ => return whole(a, mode),
    }
    coloring
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LitKind;
    use crate::ast::Span;
    use crate::ast::Tok;

    // Spans are laid out as if the nodes were printed one after another so
    // that range assertions are meaningful.
    fn ident(name: &str, pos: usize) -> Node {
        Node::Ident {
            span: Span::new(pos, pos + name.len()),
            name: name.to_string(),
        }
    }

    fn int_lit(value: &str, pos: usize) -> Node {
        Node::BasicLit {
            span: Span::new(pos, pos + value.len()),
            kind: LitKind::Int,
            value: value.to_string(),
        }
    }

    fn return_stmt(span: Span, results: Vec<Node>) -> Node {
        Node::ReturnStmt { span, results }
    }

    fn block(span: Span, list: Vec<Node>) -> Node {
        Node::BlockStmt { span, list }
    }

    #[test]
    fn test_identical_nodes_produce_no_coloring() {
        let a = block(
            Span::new(0, 20),
            vec![return_stmt(Span::new(2, 10), vec![ident("x", 9)])],
        );
        assert_eq!(diff(Some(&a), Some(&a.clone()), Mode::Old), vec![]);
        assert_eq!(diff(Some(&a), Some(&a.clone()), Mode::New), vec![]);
    }

    #[test]
    fn test_first_revision_is_all_new() {
        let b = block(Span::new(0, 20), vec![]);
        let coloring = diff(None, Some(&b), Mode::New);
        assert_eq!(coloring, vec![ColorChange::new(Color::New, 0, 20)]);
    }

    #[test]
    fn test_deleted_revision_is_all_removed() {
        let a = block(Span::new(0, 20), vec![]);
        let coloring = diff(Some(&a), None, Mode::Old);
        assert_eq!(coloring, vec![ColorChange::new(Color::Removed, 0, 20)]);
    }

    #[test]
    fn test_changed_literal_is_colored() {
        let a = return_stmt(Span::new(0, 8), vec![int_lit("1", 7)]);
        let b = return_stmt(Span::new(0, 8), vec![int_lit("2", 7)]);
        let coloring = diff(Some(&a), Some(&b), Mode::Old);
        assert_eq!(coloring, vec![ColorChange::new(Color::Removed, 7, 8)]);
    }

    #[test]
    fn test_mode_duality() {
        let a = block(
            Span::new(0, 30),
            vec![
                return_stmt(Span::new(2, 10), vec![ident("x", 9)]),
                return_stmt(Span::new(12, 20), vec![int_lit("1", 19)]),
            ],
        );
        let b = block(
            Span::new(0, 30),
            vec![return_stmt(Span::new(2, 10), vec![ident("y", 9)])],
        );
        let old = diff(Some(&a), Some(&b), Mode::Old);
        assert!(
            old.iter()
                .all(|c| matches!(c.color, Color::Same | Color::Removed | Color::Similar)),
            "{old:?}"
        );
        let new = diff(Some(&b), Some(&a), Mode::New);
        assert!(
            new.iter()
                .all(|c| matches!(c.color, Color::Same | Color::New | Color::Similar)),
            "{new:?}"
        );
    }

    #[test]
    fn test_reordered_statements_are_similar() {
        let call = |name: &str, pos: usize| Node::ExprStmt {
            span: Span::new(pos, pos + 10),
            x: Box::new(Node::CallExpr {
                span: Span::new(pos, pos + 10),
                fun: Box::new(ident(name, pos)),
                args: vec![],
            }),
        };
        let a = block(Span::new(0, 30), vec![call("first", 2), call("second", 14)]);
        let b = block(Span::new(0, 30), vec![call("second", 2), call("first", 14)]);
        let coloring = diff(Some(&a), Some(&b), Mode::Old);
        assert!(
            coloring.iter().any(|c| c.color == Color::Similar),
            "{coloring:?}"
        );
    }

    #[test]
    fn test_changed_callee_paints_whole_call() {
        let call = |name: &str| Node::CallExpr {
            span: Span::new(0, 12),
            fun: Box::new(ident(name, 0)),
            args: vec![ident("arg", 8)],
        };
        let a = call("foo");
        let b = call("bar");
        let coloring = diff(Some(&a), Some(&b), Mode::Old);
        assert_eq!(coloring, vec![ColorChange::new(Color::Removed, 0, 12)]);
    }

    #[test]
    fn test_ranges_stay_in_bounds_and_disjoint() {
        let a = block(
            Span::new(0, 40),
            vec![
                return_stmt(Span::new(2, 12), vec![int_lit("10", 9)]),
                Node::IfStmt {
                    span: Span::new(14, 38),
                    init: None,
                    cond: Box::new(ident("ok", 17)),
                    body: Box::new(block(Span::new(20, 36), vec![])),
                    els: None,
                },
            ],
        );
        let b = block(Span::new(0, 10), vec![]);
        let coloring = diff(Some(&a), Some(&b), Mode::Old);
        for change in &coloring {
            assert!(change.pos <= change.end);
            assert!(change.end <= 40);
        }
        for pair in coloring.windows(2) {
            assert!(pair[0].end <= pair[1].pos, "{coloring:?}");
        }
    }
}
