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

//! Weighted structural similarity between AST nodes.
//!
//! Scores live in `[0, 1]`. Where one child dominates a node structurally
//! (a loop body vs. its clauses, a call's arguments vs. its callee), the
//! primary child is weighted by phi^-1 and the secondary by 1 - phi^-1, so
//! shape dominates labels without collapsing the score range. List-valued
//! children are paired up by the matcher first and scored pairwise.

use crate::ast::Node;
use crate::matching::match_nodes;

/// The golden ratio; `1/PHI` is the primary-child weight.
pub const PHI: f64 = 1.618033988749895;

/// Returns the structural similarity of the two nodes in `[0, 1]`.
///
/// Two absent nodes are identical (1.0); one absent node shares nothing with
/// a present one (0.0). Nodes of different kinds score 0.0.
pub fn compare(a: Option<&Node>, b: Option<&Node>) -> f64 {
    let (a, b) = match (a, b) {
        (None, None) => return 1.0,
        (None, Some(_)) | (Some(_), None) => return 0.0,
        (Some(a), Some(b)) => (a, b),
    };
    score(a, b).clamp(0.0, 1.0)
}

fn compare_opt(a: &Option<Box<Node>>, b: &Option<Box<Node>>) -> f64 {
    compare(a.as_deref(), b.as_deref())
}

fn compare_node(a: &Node, b: &Node) -> f64 {
    compare(Some(a), Some(b))
}

/// Scores two matched-up lists: each matched pair contributes its similarity,
/// normalized by the longer list so unmatched elements count against it.
fn compare_matched(a: &[Node], b: &[Node], label: &'static str) -> f64 {
    let total = a.len().max(b.len());
    if total == 0 {
        return 0.0;
    }
    let mut score = 0.0;
    for matching in match_nodes(a, b, label) {
        if let Some(next) = matching.next {
            score += compare_node(matching.prev, next) / total as f64;
        }
    }
    score
}

fn score(a: &Node, b: &Node) -> f64 {
    let primary = 1.0 / PHI;
    let secondary = 1.0 - primary;
    let mut score = 0.0;
    use Node::*;
    match (a, b) {
        (BadStmt { .. }, BadStmt { .. }) => {
            score += 1.0;
        }
        (DeclStmt { decl: a_decl, .. }, DeclStmt { decl: b_decl, .. }) => {
            score += compare_node(a_decl, b_decl);
        }
        (EmptyStmt { .. }, EmptyStmt { .. }) => {
            score += 1.0;
        }
        (ExprStmt { x: a_x, .. }, ExprStmt { x: b_x, .. }) => {
            score += compare_node(a_x, b_x);
        }
        (
            SendStmt { chan: a_chan, value: a_value, .. },
            SendStmt { chan: b_chan, value: b_value, .. },
        ) => {
            score += compare_node(a_chan, b_chan) / 2.0;
            score += compare_node(a_value, b_value) / 2.0;
        }
        (
            IncDecStmt { x: a_x, tok: a_tok, .. },
            IncDecStmt { x: b_x, tok: b_tok, .. },
        ) => {
            score += compare_node(a_x, b_x) * primary;
            if a_tok == b_tok {
                score += secondary;
            }
        }
        (
            AssignStmt { lhs: a_lhs, rhs: a_rhs, .. },
            AssignStmt { lhs: b_lhs, rhs: b_rhs, .. },
        ) => {
            let min_lhs = a_lhs.len().min(b_lhs.len());
            for i in 0..min_lhs {
                score += compare_node(&a_lhs[i], &b_lhs[i]);
            }
            let min_rhs = a_rhs.len().min(b_rhs.len());
            for i in 0..min_rhs {
                score += compare_node(&a_rhs[i], &b_rhs[i]);
            }
            if min_lhs + min_rhs > 0 {
                score /= (min_lhs + min_rhs) as f64;
            }
        }
        (GoStmt { call: a_call, .. }, GoStmt { call: b_call, .. }) => {
            score += compare_node(a_call, b_call);
        }
        (DeferStmt { call: a_call, .. }, DeferStmt { call: b_call, .. }) => {
            score += compare_node(a_call, b_call);
        }
        (
            ReturnStmt { results: a_results, .. },
            ReturnStmt { results: b_results, .. },
        ) => {
            if a_results.is_empty() && b_results.is_empty() {
                score = 1.0;
            } else {
                score += compare_matched(a_results, b_results, "return");
            }
        }
        (
            BranchStmt { tok: a_tok, label: a_label, .. },
            BranchStmt { tok: b_tok, label: b_label, .. },
        ) => {
            if a_tok == b_tok {
                score += 1.0;
            }
            if a_label.is_some() {
                score /= 2.0;
                if b_label.is_some() {
                    score += compare_opt(a_label, b_label) / 2.0;
                }
            }
        }
        (BlockStmt { list: a_list, .. }, BlockStmt { list: b_list, .. }) => {
            score += compare_matched(a_list, b_list, "block");
        }
        (
            IfStmt { init: a_init, cond: a_cond, body: a_body, els: a_els, .. },
            IfStmt { init: b_init, cond: b_cond, body: b_body, els: b_els, .. },
        ) => {
            let mut parts = 2.0;
            if a_init.is_some() {
                parts += 1.0;
                score += compare_opt(a_init, b_init);
            }
            score += compare_node(a_cond, b_cond);
            score += compare_node(a_body, b_body);
            if a_els.is_some() {
                parts += 1.0;
                score += compare_opt(a_els, b_els);
            }
            score /= parts;
        }
        (
            SwitchStmt { init: a_init, body: a_body, .. },
            SwitchStmt { init: b_init, body: b_body, .. },
        ) => {
            score += compare_opt(a_init, b_init) * primary;
            score += compare_node(a_body, b_body) * secondary;
        }
        (
            TypeSwitchStmt { init: a_init, assign: a_assign, body: a_body, .. },
            TypeSwitchStmt { init: b_init, assign: b_assign, body: b_body, .. },
        ) => {
            score += compare_node(a_assign, b_assign) * secondary;
            if a_init.is_some() {
                score += compare_opt(a_init, b_init) * secondary;
                score /= 2.0;
            }
            score += compare_node(a_body, b_body) * primary;
        }
        (SelectStmt { body: a_body, .. }, SelectStmt { body: b_body, .. }) => {
            score += compare_node(a_body, b_body);
        }
        (
            ForStmt { init: a_init, cond: a_cond, post: a_post, body: a_body, .. },
            ForStmt { init: b_init, cond: b_cond, post: b_post, body: b_body, .. },
        ) => {
            let mut children = 0;
            if a_init.is_some() {
                children += 1;
                score += compare_opt(a_init, b_init);
            }
            if a_cond.is_some() {
                children += 1;
                score += compare_opt(a_cond, b_cond);
            }
            if a_post.is_some() {
                children += 1;
                score += compare_opt(a_post, b_post);
            }
            if children > 0 {
                score = (score * secondary) / children as f64;
            }
            score += compare_node(a_body, b_body) * primary;
        }
        (
            RangeStmt { key: a_key, value: a_value, x: a_x, body: a_body, .. },
            RangeStmt { key: b_key, value: b_value, x: b_x, body: b_body, .. },
        ) => {
            let mut children = 1;
            if a_key.is_some() {
                children += 1;
                score += compare_opt(a_key, b_key);
            }
            if a_value.is_some() {
                children += 1;
                score += compare_opt(a_value, b_value);
            }
            score += compare_node(a_x, b_x);
            score = (score * secondary) / children as f64;
            score += compare_node(a_body, b_body) * primary;
        }
        (Ident { name: a_name, .. }, Ident { name: b_name, .. }) => {
            if a_name == b_name {
                score += 1.0;
            }
        }
        (
            CallExpr { fun: a_fun, args: a_args, .. },
            CallExpr { fun: b_fun, args: b_args, .. },
        ) => {
            score += compare_matched(a_args, b_args, "call");
            score *= primary;
            score += compare_node(a_fun, b_fun) * secondary;
        }
        (StarExpr { x: a_x, .. }, StarExpr { x: b_x, .. }) => {
            score += compare_node(a_x, b_x);
        }
        (
            CaseClause { list: a_list, .. },
            CaseClause { list: b_list, .. },
        ) => {
            if a_list.is_empty() && b_list.is_empty() {
                score += 1.0;
            } else {
                score += compare_matched(a_list, b_list, "case");
            }
        }
        (
            SelectorExpr { x: a_x, sel: a_sel, .. },
            SelectorExpr { x: b_x, sel: b_sel, .. },
        ) => {
            score = compare_node(a_x, b_x) * primary;
            if a_sel.ident_name() == b_sel.ident_name() {
                score += secondary;
            }
        }
        (
            BasicLit { kind: a_kind, value: a_value, .. },
            BasicLit { kind: b_kind, value: b_value, .. },
        ) => {
            if a_kind == b_kind {
                score += 0.5;
                if a_value == b_value {
                    score += 0.5;
                }
            }
        }
        (
            TypeAssertExpr { x: a_x, typ: a_typ, .. },
            TypeAssertExpr { x: b_x, typ: b_typ, .. },
        ) => {
            score += compare_node(a_x, b_x);
            if a_typ.is_some() || b_typ.is_some() {
                score = (score + compare_opt(a_typ, b_typ)) / 2.0;
            }
        }
        (
            CompositeLit { typ: a_typ, .. },
            CompositeLit { typ: b_typ, .. },
        ) => {
            score += compare_opt(a_typ, b_typ);
        }
        (Field { typ: a_typ, .. }, Field { typ: b_typ, .. }) => {
            score += compare_opt(a_typ, b_typ);
        }
        (
            BinaryExpr { x: a_x, op: a_op, y: a_y, .. },
            BinaryExpr { x: b_x, op: b_op, y: b_y, .. },
        ) => {
            if a_op == b_op {
                score += 1.0 / 3.0;
            }
            score += (compare_node(a_x, b_x) + compare_node(a_y, b_y)) / 3.0;
        }
        (
            ArrayType { len: a_len, elt: a_elt, .. },
            ArrayType { len: b_len, elt: b_elt, .. },
        ) => {
            score += compare_node(a_elt, b_elt) * primary;
            if a_len.is_some() {
                score += compare_opt(a_len, b_len) * secondary;
            } else if b_len.is_none() {
                score += secondary;
            }
        }
        (
            FuncLit { typ: a_typ, body: a_body, .. },
            FuncLit { typ: b_typ, body: b_body, .. },
        ) => {
            score += compare_node(a_typ, b_typ) * secondary;
            score += compare_node(a_body, b_body) * primary;
        }
        (
            FuncType { params: a_params, results: a_results, .. },
            FuncType { params: b_params, results: b_results, .. },
        ) => {
            score += compare_opt(a_params, b_params) / 2.0;
            score += compare_opt(a_results, b_results) / 2.0;
        }
        (FieldList { list: a_list, .. }, FieldList { list: b_list, .. }) => {
            let total = a_list.len().max(b_list.len());
            if total == 0 {
                score += 1.0;
            } else {
                for matching in match_nodes(a_list, b_list, "fields") {
                    if matching.next.is_some() {
                        score += 1.0 / total as f64;
                    }
                }
            }
        }
        (
            IndexExpr { x: a_x, index: a_index, .. },
            IndexExpr { x: b_x, index: b_index, .. },
        ) => {
            score += compare_node(a_x, b_x) * primary;
            score += compare_node(a_index, b_index) * secondary;
        }
        (
            MapType { key: a_key, value: a_value, .. },
            MapType { key: b_key, value: b_value, .. },
        ) => {
            score += compare_node(a_key, b_key) / 2.0;
            score += compare_node(a_value, b_value) / 2.0;
        }
        (GenDecl { specs: a_specs, .. }, GenDecl { specs: b_specs, .. }) => {
            score += compare_matched(a_specs, b_specs, "specs");
        }
        (
            ValueSpec { names: a_names, .. },
            ValueSpec { names: b_names, .. },
        ) => {
            score += compare_matched(a_names, b_names, "names");
        }
        (ParenExpr { x: a_x, .. }, ParenExpr { x: b_x, .. }) => {
            score = compare_node(a_x, b_x);
        }
        (
            SliceExpr { x: a_x, low: a_low, high: a_high, max: a_max, .. },
            SliceExpr { x: b_x, low: b_low, high: b_high, max: b_max, .. },
        ) => {
            let mut parts = 0;
            if a_low.is_some() {
                parts += 1;
                score += compare_opt(a_low, b_low);
            }
            if a_high.is_some() {
                parts += 1;
                score += compare_opt(a_high, b_high);
            }
            if a_max.is_some() {
                parts += 1;
                score += compare_opt(a_max, b_max);
            }
            if parts > 0 {
                score = (score / parts as f64) * secondary;
            } else {
                score = secondary;
            }
            score += compare_node(a_x, b_x) * primary;
        }
        (
            UnaryExpr { op: a_op, x: a_x, .. },
            UnaryExpr { op: b_op, x: b_x, .. },
        ) => {
            if a_op == b_op {
                score += secondary;
            }
            score += compare_node(a_x, b_x) * primary;
        }
        (
            KeyValueExpr { key: a_key, value: a_value, .. },
            KeyValueExpr { key: b_key, value: b_value, .. },
        ) => {
            score += (compare_node(a_key, b_key) + compare_node(a_value, b_value)) / 2.0;
        }
        (
            InterfaceType { methods: a_methods, .. },
            InterfaceType { methods: b_methods, .. },
        ) => {
            score += compare_opt(a_methods, b_methods);
        }
        (
            ChanType { dir: a_dir, value: a_value, .. },
            ChanType { dir: b_dir, value: b_value, .. },
        ) => {
            score += compare_node(a_value, b_value) * primary;
            if a_dir == b_dir {
                score += secondary;
            }
        }
        (
            CommClause { comm: a_comm, body: a_body, .. },
            CommClause { comm: b_comm, body: b_body, .. },
        ) => {
            score += compare_opt(a_comm, b_comm) * primary;
            score += compare_matched(a_body, b_body, "comm") * secondary;
        }
        (
            LabeledStmt { label: a_label, stmt: a_stmt, .. },
            LabeledStmt { label: b_label, stmt: b_stmt, .. },
        ) => {
            score += compare_node(a_label, b_label) * secondary;
            score += compare_node(a_stmt, b_stmt) * primary;
        }
        // Kinds that never occur inside a function body (or carry no
        // meaningful partial similarity) score 0 against everything else.
        (BadDecl { .. }, _)
        | (BadExpr { .. }, _)
        | (Comment { .. }, _)
        | (CommentGroup { .. }, _)
        | (Ellipsis { .. }, _)
        | (FuncDecl { .. }, _)
        | (ImportSpec { .. }, _)
        | (Package { .. }, _)
        | (StructType { .. }, _)
        | (TypeSpec { .. }, _) => {
            tracing::error!(kind = a.kind_name(), "compare: unimplemented node kind");
        }
        _ => {}
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LitKind;
    use crate::ast::Span;
    use crate::ast::Tok;

    fn ident(name: &str) -> Node {
        Node::Ident {
            span: Span::default(),
            name: name.to_string(),
        }
    }

    fn int_lit(value: &str) -> Node {
        Node::BasicLit {
            span: Span::default(),
            kind: LitKind::Int,
            value: value.to_string(),
        }
    }

    fn binary(x: Node, op: Tok, y: Node) -> Node {
        Node::BinaryExpr {
            span: Span::default(),
            x: Box::new(x),
            op,
            y: Box::new(y),
        }
    }

    #[test]
    fn test_nulls() {
        assert_eq!(compare(None, None), 1.0);
        assert_eq!(compare(Some(&ident("x")), None), 0.0);
        assert_eq!(compare(None, Some(&ident("x"))), 0.0);
    }

    #[test]
    fn test_different_kinds_share_nothing() {
        assert_eq!(compare(Some(&ident("x")), Some(&int_lit("1"))), 0.0);
    }

    #[test]
    fn test_identical_scores_one() {
        let node = binary(ident("a"), Tok::Add, int_lit("1"));
        let score = compare(Some(&node), Some(&node));
        assert!((score - 1.0).abs() < 1e-9, "score = {score}");
    }

    #[test]
    fn test_basic_lit_partial_credit() {
        let one = int_lit("1");
        let two = int_lit("2");
        assert_eq!(compare(Some(&one), Some(&two)), 0.5);
        let string = Node::BasicLit {
            span: Span::default(),
            kind: LitKind::String,
            value: "\"1\"".to_string(),
        };
        assert_eq!(compare(Some(&one), Some(&string)), 0.0);
    }

    #[test]
    fn test_range_bounds() {
        let nodes = [
            ident("x"),
            int_lit("1"),
            binary(ident("a"), Tok::Add, int_lit("1")),
            binary(ident("a"), Tok::Sub, ident("b")),
            Node::ReturnStmt {
                span: Span::default(),
                results: vec![ident("x")],
            },
            Node::BlockStmt {
                span: Span::default(),
                list: vec![],
            },
        ];
        for a in &nodes {
            for b in &nodes {
                let score = compare(Some(a), Some(b));
                assert!((0.0..=1.0).contains(&score), "{a:?} vs {b:?} = {score}");
            }
        }
    }

    #[test]
    fn test_body_preserving_change_scores_high() {
        // A loop whose body is unchanged but whose condition changed keeps a
        // score above the phi^-1 pairing sweet spot.
        let body = Node::BlockStmt {
            span: Span::default(),
            list: vec![Node::ExprStmt {
                span: Span::default(),
                x: Box::new(Node::CallExpr {
                    span: Span::default(),
                    fun: Box::new(ident("work")),
                    args: vec![ident("item")],
                }),
            }],
        };
        let loop_with_cond = |cond: Node| Node::ForStmt {
            span: Span::default(),
            init: None,
            cond: Some(Box::new(cond)),
            post: None,
            body: Box::new(body.clone()),
        };
        let a = loop_with_cond(binary(ident("i"), Tok::Lss, int_lit("10")));
        let b = loop_with_cond(binary(ident("i"), Tok::Lss, int_lit("20")));
        let score = compare(Some(&a), Some(&b));
        assert!(score > 1.0 / PHI, "score = {score}");
    }
}
