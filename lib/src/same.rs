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

//! Structural equality over AST nodes.
//!
//! [`is_same`] decides revision identity for the function-history DAG, so it
//! must be conservative: a false negative only creates a redundant revision,
//! a false positive silently collapses a real edit. Comments, positions, and
//! token offsets are not structural and never participate.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use crate::ast::Node;

static COMPARED_CALLS: AtomicU64 = AtomicU64::new(0);
static COMPARED_DEPTH: AtomicU64 = AtomicU64::new(0);

/// Returns `true` iff the two nodes are structurally identical.
///
/// Also records the depth of the left operand for the average-depth
/// statistic, mirroring how deep the trees this predicate works on are.
pub fn is_same(a: Option<&Node>, b: Option<&Node>) -> bool {
    if let Some(a) = a {
        let depth = depth(a);
        if depth > 1 {
            COMPARED_CALLS.fetch_add(1, Ordering::Relaxed);
            COMPARED_DEPTH.fetch_add(depth as u64, Ordering::Relaxed);
        }
    }
    same(a, b)
}

/// Average depth over all instrumented [`is_same`] calls so far, or 0.0 if
/// none were deep enough to count.
pub fn average_compared_depth() -> f64 {
    let calls = COMPARED_CALLS.load(Ordering::Relaxed);
    if calls == 0 {
        return 0.0;
    }
    COMPARED_DEPTH.load(Ordering::Relaxed) as f64 / calls as f64
}

fn same_opt(a: &Option<Box<Node>>, b: &Option<Box<Node>>) -> bool {
    is_same(a.as_deref(), b.as_deref())
}

fn same_node(a: &Node, b: &Node) -> bool {
    is_same(Some(a), Some(b))
}

fn same_list(a: &[Node], b: &[Node]) -> bool {
    a.len() == b.len() && std::iter::zip(a, b).all(|(x, y)| same_node(x, y))
}

fn same(a: Option<&Node>, b: Option<&Node>) -> bool {
    let (a, b) = match (a, b) {
        (None, None) => return true,
        (None, Some(_)) | (Some(_), None) => return false,
        (Some(a), Some(b)) => (a, b),
    };
    use Node::*;
    match (a, b) {
        (
            ArrayType { len: a_len, elt: a_elt, .. },
            ArrayType { len: b_len, elt: b_elt, .. },
        ) => same_node(a_elt, b_elt) && same_opt(a_len, b_len),
        (
            AssignStmt { lhs: a_lhs, rhs: a_rhs, .. },
            AssignStmt { lhs: b_lhs, rhs: b_rhs, .. },
        ) => same_list(a_lhs, b_lhs) && same_list(a_rhs, b_rhs),
        (BadDecl { .. }, BadDecl { .. }) => true,
        (BadExpr { .. }, BadExpr { .. }) => true,
        (BadStmt { .. }, BadStmt { .. }) => true,
        (
            BasicLit { kind: a_kind, value: a_value, .. },
            BasicLit { kind: b_kind, value: b_value, .. },
        ) => a_kind == b_kind && a_value == b_value,
        (
            BinaryExpr { x: a_x, op: a_op, y: a_y, .. },
            BinaryExpr { x: b_x, op: b_op, y: b_y, .. },
        ) => a_op == b_op && same_node(a_x, b_x) && same_node(a_y, b_y),
        (BlockStmt { list: a_list, .. }, BlockStmt { list: b_list, .. }) => {
            same_list(a_list, b_list)
        }
        (
            BranchStmt { tok: a_tok, label: a_label, .. },
            BranchStmt { tok: b_tok, label: b_label, .. },
        ) => a_tok == b_tok && same_opt(a_label, b_label),
        (
            CallExpr { fun: a_fun, args: a_args, .. },
            CallExpr { fun: b_fun, args: b_args, .. },
        ) => same_list(a_args, b_args) && same_node(a_fun, b_fun),
        (
            CaseClause { list: a_list, body: a_body, .. },
            CaseClause { list: b_list, body: b_body, .. },
        ) => same_list(a_list, b_list) && same_list(a_body, b_body),
        (
            ChanType { dir: a_dir, value: a_value, .. },
            ChanType { dir: b_dir, value: b_value, .. },
        ) => a_dir == b_dir && same_node(a_value, b_value),
        (
            CommClause { comm: a_comm, body: a_body, .. },
            CommClause { comm: b_comm, body: b_body, .. },
        ) => same_list(a_body, b_body) && same_opt(a_comm, b_comm),
        // Comments are never structural.
        (Comment { .. }, Comment { .. }) => true,
        (CommentGroup { .. }, CommentGroup { .. }) => true,
        (
            CompositeLit { typ: a_typ, elts: a_elts, .. },
            CompositeLit { typ: b_typ, elts: b_elts, .. },
        ) => same_list(a_elts, b_elts) && same_opt(a_typ, b_typ),
        (DeclStmt { decl: a_decl, .. }, DeclStmt { decl: b_decl, .. }) => {
            same_node(a_decl, b_decl)
        }
        (DeferStmt { call: a_call, .. }, DeferStmt { call: b_call, .. }) => {
            same_node(a_call, b_call)
        }
        (Ellipsis { elt: a_elt, .. }, Ellipsis { elt: b_elt, .. }) => {
            same_opt(a_elt, b_elt)
        }
        (EmptyStmt { .. }, EmptyStmt { .. }) => true,
        (ExprStmt { x: a_x, .. }, ExprStmt { x: b_x, .. }) => same_node(a_x, b_x),
        (
            Field { names: a_names, typ: a_typ, .. },
            Field { names: b_names, typ: b_typ, .. },
        ) => same_list(a_names, b_names) && same_opt(a_typ, b_typ),
        (FieldList { list: a_list, .. }, FieldList { list: b_list, .. }) => {
            same_list(a_list, b_list)
        }
        (
            ForStmt { init: a_init, cond: a_cond, post: a_post, body: a_body, .. },
            ForStmt { init: b_init, cond: b_cond, post: b_post, body: b_body, .. },
        ) => {
            same_opt(a_init, b_init)
                && same_opt(a_cond, b_cond)
                && same_opt(a_post, b_post)
                && same_node(a_body, b_body)
        }
        // Comments and the receiver are excluded; the receiver is already
        // part of the function's signature.
        (
            FuncDecl { name: a_name, typ: a_typ, body: a_body, .. },
            FuncDecl { name: b_name, typ: b_typ, body: b_body, .. },
        ) => {
            same_node(a_name, b_name)
                && same_node(a_typ, b_typ)
                && same_opt(a_body, b_body)
        }
        (
            FuncLit { typ: a_typ, body: a_body, .. },
            FuncLit { typ: b_typ, body: b_body, .. },
        ) => same_node(a_typ, b_typ) && same_node(a_body, b_body),
        (
            FuncType { params: a_params, results: a_results, .. },
            FuncType { params: b_params, results: b_results, .. },
        ) => {
            same_opt(a_params, b_params)
                && same_opt(a_results, b_results)
        }
        (GenDecl { specs: a_specs, .. }, GenDecl { specs: b_specs, .. }) => {
            same_list(a_specs, b_specs)
        }
        (GoStmt { call: a_call, .. }, GoStmt { call: b_call, .. }) => {
            same_node(a_call, b_call)
        }
        (Ident { name: a_name, .. }, Ident { name: b_name, .. }) => a_name == b_name,
        (
            IfStmt { init: a_init, cond: a_cond, body: a_body, els: a_els, .. },
            IfStmt { init: b_init, cond: b_cond, body: b_body, els: b_els, .. },
        ) => {
            same_opt(a_init, b_init)
                && same_node(a_cond, b_cond)
                && same_node(a_body, b_body)
                && same_opt(a_els, b_els)
        }
        (ImportSpec { name: a_name, .. }, ImportSpec { name: b_name, .. }) => {
            same_opt(a_name, b_name)
        }
        (
            IncDecStmt { x: a_x, tok: a_tok, .. },
            IncDecStmt { x: b_x, tok: b_tok, .. },
        ) => a_tok == b_tok && same_node(a_x, b_x),
        (
            IndexExpr { x: a_x, index: a_index, .. },
            IndexExpr { x: b_x, index: b_index, .. },
        ) => same_node(a_x, b_x) && same_node(a_index, b_index),
        (
            InterfaceType { methods: a_methods, .. },
            InterfaceType { methods: b_methods, .. },
        ) => same_opt(a_methods, b_methods),
        (
            KeyValueExpr { key: a_key, value: a_value, .. },
            KeyValueExpr { key: b_key, value: b_value, .. },
        ) => same_node(a_value, b_value) && same_node(a_key, b_key),
        (
            LabeledStmt { label: a_label, stmt: a_stmt, .. },
            LabeledStmt { label: b_label, stmt: b_stmt, .. },
        ) => same_node(a_label, b_label) && same_node(a_stmt, b_stmt),
        (
            MapType { key: a_key, value: a_value, .. },
            MapType { key: b_key, value: b_value, .. },
        ) => same_node(a_key, b_key) && same_node(a_value, b_value),
        (Package { name: a_name, .. }, Package { name: b_name, .. }) => a_name == b_name,
        (ParenExpr { x: a_x, .. }, ParenExpr { x: b_x, .. }) => same_node(a_x, b_x),
        (
            RangeStmt { key: a_key, value: a_value, x: a_x, body: a_body, .. },
            RangeStmt { key: b_key, value: b_value, x: b_x, body: b_body, .. },
        ) => {
            same_opt(a_key, b_key)
                && same_opt(a_value, b_value)
                && same_node(a_x, b_x)
                && same_node(a_body, b_body)
        }
        (
            ReturnStmt { results: a_results, .. },
            ReturnStmt { results: b_results, .. },
        ) => same_list(a_results, b_results),
        (SelectStmt { body: a_body, .. }, SelectStmt { body: b_body, .. }) => {
            same_node(a_body, b_body)
        }
        (
            SelectorExpr { x: a_x, sel: a_sel, .. },
            SelectorExpr { x: b_x, sel: b_sel, .. },
        ) => same_node(a_x, b_x) && same_node(a_sel, b_sel),
        (
            SendStmt { chan: a_chan, value: a_value, .. },
            SendStmt { chan: b_chan, value: b_value, .. },
        ) => same_node(a_value, b_value) && same_node(a_chan, b_chan),
        (
            SliceExpr { x: a_x, low: a_low, high: a_high, max: a_max, .. },
            SliceExpr { x: b_x, low: b_low, high: b_high, max: b_max, .. },
        ) => {
            same_node(a_x, b_x)
                && same_opt(a_high, b_high)
                && same_opt(a_low, b_low)
                && same_opt(a_max, b_max)
        }
        (StarExpr { x: a_x, .. }, StarExpr { x: b_x, .. }) => same_node(a_x, b_x),
        (
            StructType { fields: a_fields, .. },
            StructType { fields: b_fields, .. },
        ) => same_opt(a_fields, b_fields),
        (
            SwitchStmt { init: a_init, tag: a_tag, body: a_body, .. },
            SwitchStmt { init: b_init, tag: b_tag, body: b_body, .. },
        ) => {
            same_opt(a_init, b_init)
                && same_opt(a_tag, b_tag)
                && same_node(a_body, b_body)
        }
        (
            TypeAssertExpr { x: a_x, typ: a_typ, .. },
            TypeAssertExpr { x: b_x, typ: b_typ, .. },
        ) => same_node(a_x, b_x) && same_opt(a_typ, b_typ),
        (
            TypeSpec { name: a_name, typ: a_typ, .. },
            TypeSpec { name: b_name, typ: b_typ, .. },
        ) => same_node(a_typ, b_typ) && same_node(a_name, b_name),
        (
            TypeSwitchStmt { init: a_init, assign: a_assign, body: a_body, .. },
            TypeSwitchStmt { init: b_init, assign: b_assign, body: b_body, .. },
        ) => {
            same_node(a_assign, b_assign)
                && same_opt(a_init, b_init)
                && same_node(a_body, b_body)
        }
        (
            UnaryExpr { op: a_op, x: a_x, .. },
            UnaryExpr { op: b_op, x: b_x, .. },
        ) => a_op == b_op && same_node(a_x, b_x),
        (
            ValueSpec { names: a_names, typ: a_typ, values: a_values, .. },
            ValueSpec { names: b_names, typ: b_typ, values: b_values, .. },
        ) => {
            same_list(a_names, b_names)
                && same_list(a_values, b_values)
                && same_opt(a_typ, b_typ)
        }
        _ => false,
    }
}

/// Number of nodes in the tree rooted at `node`.
///
/// Composite literals, function literals, and ellipses count as single
/// nodes; selector, index, and slice expressions count only their operand,
/// so the metric tracks the amount of code rather than syntactic wrapping.
pub fn size(node: &Node) -> u64 {
    let mut total = 1;
    use Node::*;
    match node {
        ArrayType { elt, .. } => total += size(elt),
        AssignStmt { lhs, rhs, .. } => total += size_list(lhs) + size_list(rhs),
        BadDecl { .. }
        | BadExpr { .. }
        | BadStmt { .. }
        | BasicLit { .. }
        | Comment { .. }
        | CommentGroup { .. }
        | CompositeLit { .. }
        | Ellipsis { .. }
        | EmptyStmt { .. }
        | FuncLit { .. }
        | Ident { .. }
        | Package { .. } => {}
        BinaryExpr { x, y, .. } => total += size(x) + size(y),
        BlockStmt { list, .. } => total += size_list(list),
        BranchStmt { label, .. } => total += size_opt(label),
        CallExpr { fun, args, .. } => total += size_list(args) + size(fun),
        CaseClause { list, body, .. } => total += size_list(list) + size_list(body),
        ChanType { value, .. } => total += size(value),
        CommClause { comm, body, .. } => total += size_opt(comm) + size_list(body),
        DeclStmt { decl, .. } => total += size(decl),
        DeferStmt { call, .. } => total += size(call),
        ExprStmt { x, .. } => total += size(x),
        Field { names, typ, .. } => total += size_list(names) + size_opt(typ),
        FieldList { list, .. } => total += size_list(list),
        ForStmt { init, cond, post, body, .. } => {
            total += size_opt(init) + size_opt(cond) + size_opt(post) + size(body);
        }
        FuncDecl { name, typ, body, .. } => {
            total += size(name) + size(typ) + size_opt(body);
        }
        FuncType { params, results, .. } => total += size_opt(params) + size_opt(results),
        GenDecl { specs, .. } => total += size_list(specs),
        GoStmt { call, .. } => total += size(call),
        IfStmt { init, cond, body, els, .. } => {
            total += size(body) + size(cond) + size_opt(els) + size_opt(init);
        }
        ImportSpec { name, path, .. } => total += size_opt(name) + size(path),
        IncDecStmt { x, .. } => total += size(x),
        IndexExpr { x, .. } => total += size(x),
        InterfaceType { methods, .. } => total += size_opt(methods),
        KeyValueExpr { key, value, .. } => total += size(key) + size(value),
        LabeledStmt { label, stmt, .. } => total += size(label) + size(stmt),
        MapType { key, value, .. } => total += size(key) + size(value),
        ParenExpr { x, .. } => total += size(x),
        RangeStmt { key, value, x, body, .. } => {
            total += size(body) + size_opt(value) + size(x) + size_opt(key);
        }
        ReturnStmt { results, .. } => total += size_list(results),
        SelectStmt { body, .. } => total += size(body),
        SelectorExpr { x, .. } => total += size(x),
        SendStmt { chan, value, .. } => total += size(chan) + size(value),
        SliceExpr { x, .. } => total += size(x),
        StarExpr { x, .. } => total += size(x),
        StructType { fields, .. } => total += size_opt(fields),
        SwitchStmt { init, tag, body, .. } => {
            total += size_opt(init) + size_opt(tag) + size(body);
        }
        TypeAssertExpr { x, typ, .. } => total += size(x) + size_opt(typ),
        TypeSpec { name, typ, .. } => total += size(name) + size(typ),
        TypeSwitchStmt { init, assign, body, .. } => {
            total += size_opt(init) + size(assign) + size(body);
        }
        UnaryExpr { x, .. } => total += size(x),
        ValueSpec { names, typ, values, .. } => {
            total += size_list(names) + size_opt(typ) + size_list(values);
        }
    }
    total
}

fn size_opt(node: &Option<Box<Node>>) -> u64 {
    node.as_deref().map(size).unwrap_or(0)
}

fn size_list(nodes: &[Node]) -> u64 {
    nodes.iter().map(size).sum()
}

/// Maximum nesting depth of the tree rooted at `node`.
pub fn depth(node: &Node) -> usize {
    depth_below(Some(node), 0)
}

fn depth_opt(node: &Option<Box<Node>>, depth: usize) -> usize {
    depth_below(node.as_deref(), depth)
}

fn depth_list(nodes: &[Node], depth: usize) -> usize {
    nodes
        .iter()
        .map(|node| depth_below(Some(node), depth))
        .max()
        .unwrap_or(depth)
}

fn depth_below(node: Option<&Node>, depth: usize) -> usize {
    let Some(node) = node else {
        return 0;
    };
    let depth = depth + 1;
    use Node::*;
    match node {
        ArrayType { len, elt, .. } => {
            depth_opt(len, depth).max(depth_below(Some(elt), depth))
        }
        AssignStmt { lhs, rhs, .. } => depth_list(lhs, depth).max(depth_list(rhs, depth)),
        BadDecl { .. }
        | BadExpr { .. }
        | BadStmt { .. }
        | BasicLit { .. }
        | Comment { .. }
        | CommentGroup { .. }
        | EmptyStmt { .. }
        | FieldList { .. }
        | GenDecl { .. }
        | Ident { .. }
        | Package { .. }
        | ReturnStmt { .. } => depth,
        BinaryExpr { x, y, .. } => {
            depth_below(Some(x), depth).max(depth_below(Some(y), depth))
        }
        BlockStmt { list, .. } => depth_list(list, depth),
        BranchStmt { label, .. } => depth.max(depth_opt(label, depth)),
        CallExpr { fun, args, .. } => {
            depth_list(args, depth).max(depth_below(Some(fun), depth))
        }
        CaseClause { list, body, .. } => depth_list(list, depth).max(depth_list(body, depth)),
        ChanType { value, .. } => depth_below(Some(value), depth),
        CommClause { comm, body, .. } => {
            depth_list(body, depth).max(depth_opt(comm, depth))
        }
        CompositeLit { typ, elts, .. } => {
            depth_list(elts, depth).max(depth_opt(typ, depth))
        }
        DeclStmt { decl, .. } => depth_below(Some(decl), depth),
        DeferStmt { call, .. } => depth_below(Some(call), depth),
        Ellipsis { elt, .. } => depth.max(depth_opt(elt, depth)),
        ExprStmt { x, .. } => depth_below(Some(x), depth),
        Field { typ, .. } => depth.max(depth_opt(typ, depth)),
        ForStmt { init, cond, post, body, .. } => depth_opt(init, depth)
            .max(depth_opt(cond, depth))
            .max(depth_opt(post, depth))
            .max(depth_below(Some(body), depth)),
        FuncDecl { name, typ, body, .. } => depth_below(Some(name), depth)
            .max(depth_below(Some(typ), depth))
            .max(depth_opt(body, depth)),
        FuncLit { typ, body, .. } => {
            depth_below(Some(typ), depth).max(depth_below(Some(body), depth))
        }
        FuncType { params, results, .. } => {
            depth_opt(params, depth).max(depth_opt(results, depth))
        }
        GoStmt { call, .. } => depth_below(Some(call), depth),
        IfStmt { init, cond, body, els, .. } => depth_opt(init, depth)
            .max(depth_below(Some(cond), depth))
            .max(depth_below(Some(body), depth))
            .max(depth_opt(els, depth)),
        ImportSpec { name, .. } => depth.max(depth_opt(name, depth)),
        IncDecStmt { x, .. } => depth_below(Some(x), depth),
        IndexExpr { x, index, .. } => {
            depth_below(Some(x), depth).max(depth_below(Some(index), depth))
        }
        InterfaceType { methods, .. } => depth.max(depth_opt(methods, depth)),
        KeyValueExpr { key, value, .. } => {
            depth_below(Some(value), depth).max(depth_below(Some(key), depth))
        }
        LabeledStmt { label, stmt, .. } => {
            depth_below(Some(label), depth).max(depth_below(Some(stmt), depth))
        }
        MapType { key, value, .. } => {
            depth_below(Some(key), depth).max(depth_below(Some(value), depth))
        }
        ParenExpr { x, .. } => depth_below(Some(x), depth),
        RangeStmt { key, value, x, body, .. } => depth_opt(key, depth)
            .max(depth_opt(value, depth))
            .max(depth_below(Some(x), depth))
            .max(depth_below(Some(body), depth)),
        SelectStmt { body, .. } => depth_below(Some(body), depth),
        SelectorExpr { x, sel, .. } => {
            depth_below(Some(x), depth).max(depth_below(Some(sel), depth))
        }
        SendStmt { chan, value, .. } => {
            depth_below(Some(value), depth).max(depth_below(Some(chan), depth))
        }
        SliceExpr { x, low, high, max, .. } => depth_below(Some(x), depth)
            .max(depth_opt(high, depth))
            .max(depth_opt(low, depth))
            .max(depth_opt(max, depth)),
        StarExpr { x, .. } => depth_below(Some(x), depth),
        StructType { fields, .. } => depth.max(depth_opt(fields, depth)),
        SwitchStmt { init, tag, body, .. } => depth_opt(init, depth)
            .max(depth_opt(tag, depth))
            .max(depth_below(Some(body), depth)),
        TypeAssertExpr { x, typ, .. } => {
            depth_below(Some(x), depth).max(depth_opt(typ, depth))
        }
        TypeSpec { name, typ, .. } => {
            depth_below(Some(typ), depth).max(depth_below(Some(name), depth))
        }
        TypeSwitchStmt { init, assign, body, .. } => depth_below(Some(assign), depth)
            .max(depth_opt(init, depth))
            .max(depth_below(Some(body), depth)),
        UnaryExpr { x, .. } => depth_below(Some(x), depth),
        ValueSpec { typ, .. } => depth.max(depth_opt(typ, depth)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LitKind;
    use crate::ast::Span;
    use crate::ast::Tok;

    fn ident_at(name: &str, pos: usize) -> Node {
        Node::Ident {
            span: Span::new(pos, pos + name.len()),
            name: name.to_string(),
        }
    }

    fn ident(name: &str) -> Node {
        ident_at(name, 0)
    }

    fn int_lit(value: &str) -> Node {
        Node::BasicLit {
            span: Span::default(),
            kind: LitKind::Int,
            value: value.to_string(),
        }
    }

    fn return_stmt(results: Vec<Node>) -> Node {
        Node::ReturnStmt {
            span: Span::default(),
            results,
        }
    }

    fn block(list: Vec<Node>) -> Node {
        Node::BlockStmt {
            span: Span::default(),
            list,
        }
    }

    #[test]
    fn test_nulls() {
        assert!(is_same(None, None));
        assert!(!is_same(Some(&ident("x")), None));
        assert!(!is_same(None, Some(&ident("x"))));
    }

    #[test]
    fn test_positions_are_not_structural() {
        assert!(is_same(Some(&ident_at("x", 0)), Some(&ident_at("x", 42))));
    }

    #[test]
    fn test_reflexive_and_symmetric() {
        let a = Node::BinaryExpr {
            span: Span::default(),
            x: Box::new(ident("a")),
            op: Tok::Add,
            y: Box::new(int_lit("1")),
        };
        let b = Node::BinaryExpr {
            span: Span::default(),
            x: Box::new(ident("a")),
            op: Tok::Add,
            y: Box::new(int_lit("2")),
        };
        assert!(is_same(Some(&a), Some(&a)));
        assert_eq!(is_same(Some(&a), Some(&b)), is_same(Some(&b), Some(&a)));
        assert!(!is_same(Some(&a), Some(&b)));
    }

    #[test]
    fn test_different_kinds() {
        assert!(!is_same(Some(&ident("x")), Some(&int_lit("1"))));
    }

    #[test]
    fn test_operator_is_structural() {
        let plus = Node::BinaryExpr {
            span: Span::default(),
            x: Box::new(ident("a")),
            op: Tok::Add,
            y: Box::new(ident("b")),
        };
        let minus = Node::BinaryExpr {
            span: Span::default(),
            x: Box::new(ident("a")),
            op: Tok::Sub,
            y: Box::new(ident("b")),
        };
        assert!(!is_same(Some(&plus), Some(&minus)));
    }

    #[test]
    fn test_list_lengths() {
        let short = block(vec![return_stmt(vec![ident("x")])]);
        let long = block(vec![
            return_stmt(vec![ident("x")]),
            Node::EmptyStmt {
                span: Span::default(),
            },
        ]);
        assert!(!is_same(Some(&short), Some(&long)));
    }

    #[test]
    fn test_comments_always_equal() {
        let a = Node::Comment {
            span: Span::default(),
            text: "// old".to_string(),
        };
        let b = Node::Comment {
            span: Span::default(),
            text: "// new and different".to_string(),
        };
        assert!(is_same(Some(&a), Some(&b)));
    }

    #[test]
    fn test_depth() {
        assert_eq!(depth(&ident("x")), 1);
        let nested = block(vec![return_stmt(vec![Node::BinaryExpr {
            span: Span::default(),
            x: Box::new(ident("a")),
            op: Tok::Add,
            y: Box::new(ident("b")),
        }])]);
        // Return statements are depth leaves; the block adds one level.
        assert_eq!(depth(&nested), 2);
    }

    #[test]
    fn test_size() {
        assert_eq!(size(&ident("x")), 1);
        assert_eq!(size(&int_lit("1")), 1);
        let sum = Node::BinaryExpr {
            span: Span::default(),
            x: Box::new(ident("a")),
            op: Tok::Add,
            y: Box::new(int_lit("1")),
        };
        assert_eq!(size(&sum), 3);
        // block { return a + 1 }: block + return + the three above.
        let nested = block(vec![return_stmt(vec![sum])]);
        assert_eq!(size(&nested), 5);
        // Absent optional children contribute nothing.
        let bare_loop = Node::ForStmt {
            span: Span::default(),
            init: None,
            cond: None,
            post: None,
            body: Box::new(block(vec![])),
        };
        assert_eq!(size(&bare_loop), 2);
    }
}
