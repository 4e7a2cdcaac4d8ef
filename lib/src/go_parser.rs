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

//! The Go source front end.
//!
//! Parses a source buffer with tree-sitter and lowers the concrete syntax
//! tree into the typed AST of [`crate::ast`]. Constructs the lowering does
//! not recognize become `Bad*` placeholder nodes instead of failing the
//! file; a buffer the grammar cannot parse at all is a [`ParseError`] and
//! the caller skips the file.

use std::sync::Arc;

use thiserror::Error;

use crate::ast::ChanDir;
use crate::ast::LitKind;
use crate::ast::Node;
use crate::ast::Span;
use crate::ast::Tok;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Go syntax error in {path}")]
    Syntax { path: String },
    #[error("Failed to load the Go grammar")]
    Language(#[from] tree_sitter::LanguageError),
}

/// A function declaration extracted from one file.
#[derive(Clone, Debug)]
pub struct FunctionDecl {
    /// Per-file signature: the declared name, `init[<file>]` for package
    /// initializers, `<receiver>.<name>` for methods.
    pub signature: String,
    /// The lowered declaration; the root is always a `FuncDecl`.
    pub node: Arc<Node>,
}

/// Parses `source` and returns its function declarations in file order.
///
/// `path` is the repo-relative file path, used for the `init` qualifier and
/// in error values.
pub fn parse_source(source: &str, path: &str) -> Result<Vec<FunctionDecl>, ParseError> {
    let mut parser = tree_sitter::Parser::new();
    parser.set_language(&tree_sitter_go::LANGUAGE.into())?;
    let Some(tree) = parser.parse(source, None) else {
        return Err(ParseError::Syntax {
            path: path.to_string(),
        });
    };
    let root = tree.root_node();
    if root.has_error() {
        return Err(ParseError::Syntax {
            path: path.to_string(),
        });
    }

    let lowering = Lowering { source };
    let mut declarations = Vec::new();
    let mut cursor = root.walk();
    for child in root.named_children(&mut cursor) {
        match child.kind() {
            "function_declaration" | "method_declaration" => {
                if let Some(declaration) = lowering.function_declaration(child, path) {
                    declarations.push(declaration);
                }
            }
            _ => {}
        }
    }
    Ok(declarations)
}

/// The file name qualifier for per-file `init` functions.
fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

struct Lowering<'s> {
    source: &'s str,
}

type TsNode<'t> = tree_sitter::Node<'t>;

impl Lowering<'_> {
    fn text(&self, node: TsNode<'_>) -> &str {
        &self.source[node.start_byte()..node.end_byte()]
    }

    fn span(&self, node: TsNode<'_>) -> Span {
        Span::new(node.start_byte(), node.end_byte())
    }

    fn function_declaration(&self, node: TsNode<'_>, path: &str) -> Option<FunctionDecl> {
        let name_node = node.child_by_field_name("name")?;
        let name = self.text(name_node).to_string();
        let receiver = node
            .child_by_field_name("receiver")
            .and_then(|list| self.receiver_type(list));

        let signature = match &receiver {
            Some(receiver_type) => format!("{}.{name}", receiver_type.type_text()),
            None if name == "init" => format!("init[{}]", file_name(path)),
            None => name.clone(),
        };

        let typ = Node::FuncType {
            span: self.span(node),
            params: node
                .child_by_field_name("parameters")
                .map(|params| Box::new(self.field_list(params))),
            results: node
                .child_by_field_name("result")
                .map(|result| Box::new(self.result_list(result))),
        };
        let recv = node.child_by_field_name("receiver").map(|list| {
            Box::new(self.field_list(list))
        });
        let body = node
            .child_by_field_name("body")
            .map(|body| Box::new(self.statement(body)));

        let decl = Node::FuncDecl {
            span: self.span(node),
            recv,
            name: Box::new(Node::Ident {
                span: self.span(name_node),
                name,
            }),
            typ: Box::new(typ),
            body,
        };
        Some(FunctionDecl {
            signature,
            node: Arc::new(decl),
        })
    }

    /// The receiver's type expression, from a one-entry parameter list.
    fn receiver_type(&self, list: TsNode<'_>) -> Option<Node> {
        let mut cursor = list.walk();
        let parameter = list
            .named_children(&mut cursor)
            .find(|child| child.kind() == "parameter_declaration")?;
        let typ = parameter.child_by_field_name("type")?;
        Some(self.type_expr(typ))
    }

    /// Lowers a `parameter_list` into a `FieldList`.
    fn field_list(&self, node: TsNode<'_>) -> Node {
        let mut fields = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "parameter_declaration" | "variadic_parameter_declaration" => {
                    fields.push(self.parameter(child));
                }
                _ => {}
            }
        }
        Node::FieldList {
            span: self.span(node),
            list: fields,
        }
    }

    fn parameter(&self, node: TsNode<'_>) -> Node {
        let mut names = Vec::new();
        let mut cursor = node.walk();
        for child in node.children_by_field_name("name", &mut cursor) {
            names.push(Node::Ident {
                span: self.span(child),
                name: self.text(child).to_string(),
            });
        }
        let mut typ = node
            .child_by_field_name("type")
            .map(|typ| Box::new(self.type_expr(typ)));
        if node.kind() == "variadic_parameter_declaration" {
            typ = Some(Box::new(Node::Ellipsis {
                span: self.span(node),
                elt: typ,
            }));
        }
        Node::Field {
            span: self.span(node),
            names,
            typ,
        }
    }

    /// A function result: either a parenthesized parameter list or a single
    /// bare type, normalized to a `FieldList` either way.
    fn result_list(&self, node: TsNode<'_>) -> Node {
        if node.kind() == "parameter_list" {
            return self.field_list(node);
        }
        let typ = self.type_expr(node);
        Node::FieldList {
            span: self.span(node),
            list: vec![Node::Field {
                span: self.span(node),
                names: vec![],
                typ: Some(Box::new(typ)),
            }],
        }
    }

    fn block(&self, node: TsNode<'_>) -> Node {
        let mut list = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if !is_statement_position(child) {
                continue;
            }
            list.push(self.statement(child));
        }
        Node::BlockStmt {
            span: self.span(node),
            list,
        }
    }

    fn opt_statement(&self, node: Option<TsNode<'_>>) -> Option<Box<Node>> {
        node.map(|node| Box::new(self.statement(node)))
    }

    fn opt_expr(&self, node: Option<TsNode<'_>>) -> Option<Box<Node>> {
        node.map(|node| Box::new(self.expr(node)))
    }

    /// Lowers the children of an `expression_list` (or a single expression)
    /// into a node list.
    fn expr_list(&self, node: TsNode<'_>) -> Vec<Node> {
        if node.kind() != "expression_list" {
            return vec![self.expr(node)];
        }
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .map(|child| self.expr(child))
            .collect()
    }

    fn statement(&self, node: TsNode<'_>) -> Node {
        let span = self.span(node);
        match node.kind() {
            "block" => self.block(node),
            "expression_statement" => match node.named_child(0) {
                Some(x) => Node::ExprStmt {
                    span,
                    x: Box::new(self.expr(x)),
                },
                None => Node::BadStmt { span },
            },
            "send_statement" => {
                match (
                    node.child_by_field_name("channel"),
                    node.child_by_field_name("value"),
                ) {
                    (Some(chan), Some(value)) => Node::SendStmt {
                        span,
                        chan: Box::new(self.expr(chan)),
                        value: Box::new(self.expr(value)),
                    },
                    _ => Node::BadStmt { span },
                }
            }
            "inc_statement" | "dec_statement" => match node.named_child(0) {
                Some(x) => Node::IncDecStmt {
                    span,
                    x: Box::new(self.expr(x)),
                    tok: if node.kind() == "inc_statement" {
                        Tok::Inc
                    } else {
                        Tok::Dec
                    },
                },
                None => Node::BadStmt { span },
            },
            "assignment_statement" => {
                let lhs = node
                    .child_by_field_name("left")
                    .map(|left| self.expr_list(left))
                    .unwrap_or_default();
                let rhs = node
                    .child_by_field_name("right")
                    .map(|right| self.expr_list(right))
                    .unwrap_or_default();
                let tok = node
                    .child_by_field_name("operator")
                    .and_then(|op| assign_tok(self.text(op)))
                    .unwrap_or(Tok::Assign);
                Node::AssignStmt { span, lhs, tok, rhs }
            }
            "short_var_declaration" => {
                let lhs = node
                    .child_by_field_name("left")
                    .map(|left| self.expr_list(left))
                    .unwrap_or_default();
                let rhs = node
                    .child_by_field_name("right")
                    .map(|right| self.expr_list(right))
                    .unwrap_or_default();
                Node::AssignStmt {
                    span,
                    lhs,
                    tok: Tok::Define,
                    rhs,
                }
            }
            "return_statement" => {
                let results = node
                    .named_child(0)
                    .map(|list| self.expr_list(list))
                    .unwrap_or_default();
                Node::ReturnStmt { span, results }
            }
            "go_statement" => match node.named_child(0) {
                Some(call) => Node::GoStmt {
                    span,
                    call: Box::new(self.expr(call)),
                },
                None => Node::BadStmt { span },
            },
            "defer_statement" => match node.named_child(0) {
                Some(call) => Node::DeferStmt {
                    span,
                    call: Box::new(self.expr(call)),
                },
                None => Node::BadStmt { span },
            },
            "if_statement" => {
                let Some(cond) = node.child_by_field_name("condition") else {
                    return Node::BadStmt { span };
                };
                let Some(body) = node.child_by_field_name("consequence") else {
                    return Node::BadStmt { span };
                };
                Node::IfStmt {
                    span,
                    init: self.opt_statement(node.child_by_field_name("initializer")),
                    cond: Box::new(self.expr(cond)),
                    body: Box::new(self.statement(body)),
                    els: self.opt_statement(node.child_by_field_name("alternative")),
                }
            }
            "for_statement" => self.for_statement(node),
            "expression_switch_statement" => Node::SwitchStmt {
                span,
                init: self.opt_statement(node.child_by_field_name("initializer")),
                tag: self.opt_expr(node.child_by_field_name("value")),
                body: Box::new(self.case_body(node)),
            },
            "type_switch_statement" => {
                let assign = match node.child_by_field_name("value") {
                    Some(value) => {
                        let assertion = Node::TypeAssertExpr {
                            span: self.span(value),
                            x: Box::new(self.expr(value)),
                            typ: None,
                        };
                        // `switch x := v.(type)` is an assignment; a bare
                        // `switch v.(type)` is an expression statement.
                        match node.child_by_field_name("alias") {
                            Some(alias) => Node::AssignStmt {
                                span: self.span(value),
                                lhs: self.expr_list(alias),
                                tok: Tok::Define,
                                rhs: vec![assertion],
                            },
                            None => Node::ExprStmt {
                                span: self.span(value),
                                x: Box::new(assertion),
                            },
                        }
                    }
                    None => Node::BadStmt { span },
                };
                Node::TypeSwitchStmt {
                    span,
                    init: self.opt_statement(node.child_by_field_name("initializer")),
                    assign: Box::new(assign),
                    body: Box::new(self.case_body(node)),
                }
            }
            "select_statement" => Node::SelectStmt {
                span,
                body: Box::new(self.case_body(node)),
            },
            "labeled_statement" => {
                let label = node.child_by_field_name("label");
                let mut cursor = node.walk();
                let stmt = node
                    .named_children(&mut cursor)
                    .filter(|child| Some(*child) != label && child.kind() != "comment")
                    .last();
                match (label, stmt) {
                    (Some(label), Some(stmt)) => Node::LabeledStmt {
                        span,
                        label: Box::new(Node::Ident {
                            span: self.span(label),
                            name: self.text(label).to_string(),
                        }),
                        stmt: Box::new(self.statement(stmt)),
                    },
                    _ => Node::BadStmt { span },
                }
            }
            "break_statement" | "continue_statement" | "goto_statement" => {
                let tok = match node.kind() {
                    "break_statement" => Tok::Break,
                    "continue_statement" => Tok::Continue,
                    _ => Tok::Goto,
                };
                let label = node.named_child(0).map(|label| {
                    Box::new(Node::Ident {
                        span: self.span(label),
                        name: self.text(label).to_string(),
                    })
                });
                Node::BranchStmt { span, tok, label }
            }
            "fallthrough_statement" => Node::BranchStmt {
                span,
                tok: Tok::Fallthrough,
                label: None,
            },
            "receive_statement" => {
                let Some(right) = node.child_by_field_name("right") else {
                    return Node::BadStmt { span };
                };
                match node.child_by_field_name("left") {
                    Some(left) => Node::AssignStmt {
                        span,
                        lhs: self.expr_list(left),
                        tok: Tok::Define,
                        rhs: vec![self.expr(right)],
                    },
                    None => Node::ExprStmt {
                        span,
                        x: Box::new(self.expr(right)),
                    },
                }
            }
            "empty_statement" => Node::EmptyStmt { span },
            "const_declaration" | "var_declaration" | "type_declaration" => Node::DeclStmt {
                span,
                decl: Box::new(self.gen_decl(node)),
            },
            "expression_case" | "type_case" | "default_case" => self.case_clause(node),
            "communication_case" => self.communication_case(node),
            _ => {
                // Bare expressions sometimes appear in statement position in
                // the grammar; anything else is opaque.
                if is_expression_kind(node.kind()) {
                    Node::ExprStmt {
                        span,
                        x: Box::new(self.expr(node)),
                    }
                } else {
                    tracing::debug!(kind = node.kind(), "lowering: opaque statement");
                    Node::BadStmt { span }
                }
            }
        }
    }

    fn for_statement(&self, node: TsNode<'_>) -> Node {
        let span = self.span(node);
        let mut cursor = node.walk();
        let clause = node
            .named_children(&mut cursor)
            .find(|child| matches!(child.kind(), "for_clause" | "range_clause"));
        let Some(body) = node.child_by_field_name("body") else {
            return Node::BadStmt { span };
        };
        let body = Box::new(self.statement(body));
        match clause {
            Some(clause) if clause.kind() == "range_clause" => {
                let Some(right) = clause.child_by_field_name("right") else {
                    return Node::BadStmt { span };
                };
                let mut key = None;
                let mut value = None;
                if let Some(left) = clause.child_by_field_name("left") {
                    let mut sides = self.expr_list(left).into_iter();
                    key = sides.next().map(Box::new);
                    value = sides.next().map(Box::new);
                }
                Node::RangeStmt {
                    span,
                    key,
                    value,
                    x: Box::new(self.expr(right)),
                    body,
                }
            }
            Some(clause) => Node::ForStmt {
                span,
                init: self.opt_statement(clause.child_by_field_name("initializer")),
                cond: self.opt_expr(clause.child_by_field_name("condition")),
                post: self.opt_statement(clause.child_by_field_name("update")),
                body,
            },
            None => {
                // `for {}` or `for cond {}`: any named child besides the body
                // is the condition.
                let mut cursor = node.walk();
                let cond = node
                    .named_children(&mut cursor)
                    .find(|child| child.kind() != "block" && is_expression_kind(child.kind()));
                Node::ForStmt {
                    span,
                    init: None,
                    cond: self.opt_expr(cond),
                    post: None,
                    body,
                }
            }
        }
    }

    /// Wraps the case clauses of a switch/select into a `BlockStmt`.
    fn case_body(&self, node: TsNode<'_>) -> Node {
        let in_select = node.kind() == "select_statement";
        let mut list = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "expression_case" | "type_case" => list.push(self.case_clause(child)),
                // A bare `default:` inside a select is a communication
                // clause with no communication.
                "default_case" if in_select => list.push(self.communication_case(child)),
                "default_case" => list.push(self.case_clause(child)),
                "communication_case" => list.push(self.communication_case(child)),
                _ => {}
            }
        }
        Node::BlockStmt {
            span: self.span(node),
            list,
        }
    }

    fn case_clause(&self, node: TsNode<'_>) -> Node {
        let span = self.span(node);
        let mut list = Vec::new();
        let mut clause_children: Vec<TsNode<'_>> = Vec::new();
        match node.kind() {
            "expression_case" => {
                if let Some(value) = node.child_by_field_name("value") {
                    list = self.expr_list(value);
                    clause_children.push(value);
                }
            }
            "type_case" => {
                let mut cursor = node.walk();
                for typ in node.children_by_field_name("type", &mut cursor) {
                    list.push(self.type_expr(typ));
                    clause_children.push(typ);
                }
            }
            _ => {}
        }
        let mut body = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if clause_children.contains(&child) || !is_statement_position(child) {
                continue;
            }
            body.push(self.statement(child));
        }
        Node::CaseClause { span, list, body }
    }

    fn communication_case(&self, node: TsNode<'_>) -> Node {
        let span = self.span(node);
        let comm = node
            .child_by_field_name("communication")
            .map(|comm| Box::new(self.statement(comm)));
        let mut body = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if node.child_by_field_name("communication") == Some(child) {
                continue;
            }
            if is_statement_position(child) {
                body.push(self.statement(child));
            }
        }
        Node::CommClause { span, comm, body }
    }

    /// Lowers a `const`/`var`/`type` declaration in statement position.
    fn gen_decl(&self, node: TsNode<'_>) -> Node {
        let span = self.span(node);
        let tok = match node.kind() {
            "const_declaration" => Tok::Const,
            "type_declaration" => Tok::Type,
            _ => Tok::Var,
        };
        let mut specs = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "const_spec" | "var_spec" => specs.push(self.value_spec(child)),
                "type_spec" => specs.push(self.type_spec(child)),
                _ => {}
            }
        }
        Node::GenDecl { span, tok, specs }
    }

    fn value_spec(&self, node: TsNode<'_>) -> Node {
        let mut names = Vec::new();
        let mut cursor = node.walk();
        for name in node.children_by_field_name("name", &mut cursor) {
            names.push(Node::Ident {
                span: self.span(name),
                name: self.text(name).to_string(),
            });
        }
        let values = node
            .child_by_field_name("value")
            .map(|value| self.expr_list(value))
            .unwrap_or_default();
        Node::ValueSpec {
            span: self.span(node),
            names,
            typ: node
                .child_by_field_name("type")
                .map(|typ| Box::new(self.type_expr(typ))),
            values,
        }
    }

    fn type_spec(&self, node: TsNode<'_>) -> Node {
        let span = self.span(node);
        match (
            node.child_by_field_name("name"),
            node.child_by_field_name("type"),
        ) {
            (Some(name), Some(typ)) => Node::TypeSpec {
                span,
                name: Box::new(Node::Ident {
                    span: self.span(name),
                    name: self.text(name).to_string(),
                }),
                typ: Box::new(self.type_expr(typ)),
            },
            _ => Node::BadDecl { span },
        }
    }

    fn expr(&self, node: TsNode<'_>) -> Node {
        let span = self.span(node);
        match node.kind() {
            "identifier" | "field_identifier" | "package_identifier" | "type_identifier"
            | "label_name" | "blank_identifier" | "true" | "false" | "nil" | "iota" => {
                Node::Ident {
                    span,
                    name: self.text(node).to_string(),
                }
            }
            "int_literal" => self.basic_lit(node, LitKind::Int),
            "float_literal" => self.basic_lit(node, LitKind::Float),
            "imaginary_literal" => self.basic_lit(node, LitKind::Imag),
            "rune_literal" => self.basic_lit(node, LitKind::Char),
            "raw_string_literal" | "interpreted_string_literal" => {
                self.basic_lit(node, LitKind::String)
            }
            "binary_expression" => {
                match (
                    node.child_by_field_name("left"),
                    node.child_by_field_name("operator"),
                    node.child_by_field_name("right"),
                ) {
                    (Some(left), Some(op), Some(right)) => Node::BinaryExpr {
                        span,
                        x: Box::new(self.expr(left)),
                        op: binary_tok(self.text(op)).unwrap_or(Tok::Add),
                        y: Box::new(self.expr(right)),
                    },
                    _ => Node::BadExpr { span },
                }
            }
            "unary_expression" => {
                match (
                    node.child_by_field_name("operator"),
                    node.child_by_field_name("operand"),
                ) {
                    (Some(op), Some(operand)) => {
                        let operand = Box::new(self.expr(operand));
                        match self.text(op) {
                            "*" => Node::StarExpr { span, x: operand },
                            op_text => Node::UnaryExpr {
                                span,
                                op: unary_tok(op_text).unwrap_or(Tok::Not),
                                x: operand,
                            },
                        }
                    }
                    _ => Node::BadExpr { span },
                }
            }
            "selector_expression" => {
                match (
                    node.child_by_field_name("operand"),
                    node.child_by_field_name("field"),
                ) {
                    (Some(operand), Some(field)) => Node::SelectorExpr {
                        span,
                        x: Box::new(self.expr(operand)),
                        sel: Box::new(Node::Ident {
                            span: self.span(field),
                            name: self.text(field).to_string(),
                        }),
                    },
                    _ => Node::BadExpr { span },
                }
            }
            "call_expression" => {
                let Some(function) = node.child_by_field_name("function") else {
                    return Node::BadExpr { span };
                };
                let args = node
                    .child_by_field_name("arguments")
                    .map(|arguments| {
                        let mut args = Vec::new();
                        let mut cursor = arguments.walk();
                        for child in arguments.named_children(&mut cursor) {
                            if child.kind() != "comment" {
                                args.push(self.argument(child));
                            }
                        }
                        args
                    })
                    .unwrap_or_default();
                Node::CallExpr {
                    span,
                    fun: Box::new(self.expr(function)),
                    args,
                }
            }
            "index_expression" => {
                match (
                    node.child_by_field_name("operand"),
                    node.child_by_field_name("index"),
                ) {
                    (Some(operand), Some(index)) => Node::IndexExpr {
                        span,
                        x: Box::new(self.expr(operand)),
                        index: Box::new(self.expr(index)),
                    },
                    _ => Node::BadExpr { span },
                }
            }
            "slice_expression" => match node.child_by_field_name("operand") {
                Some(operand) => Node::SliceExpr {
                    span,
                    x: Box::new(self.expr(operand)),
                    low: self.opt_expr(node.child_by_field_name("start")),
                    high: self.opt_expr(node.child_by_field_name("end")),
                    max: self.opt_expr(node.child_by_field_name("capacity")),
                },
                None => Node::BadExpr { span },
            },
            "type_assertion_expression" => {
                match (
                    node.child_by_field_name("operand"),
                    node.child_by_field_name("type"),
                ) {
                    (Some(operand), Some(typ)) => Node::TypeAssertExpr {
                        span,
                        x: Box::new(self.expr(operand)),
                        typ: Some(Box::new(self.type_expr(typ))),
                    },
                    _ => Node::BadExpr { span },
                }
            }
            "type_conversion_expression" => {
                // Syntactically a call of the type, as the language models it.
                match (
                    node.child_by_field_name("type"),
                    node.child_by_field_name("operand"),
                ) {
                    (Some(typ), Some(operand)) => Node::CallExpr {
                        span,
                        fun: Box::new(self.type_expr(typ)),
                        args: vec![self.expr(operand)],
                    },
                    _ => Node::BadExpr { span },
                }
            }
            "parenthesized_expression" => match node.named_child(0) {
                Some(x) => Node::ParenExpr {
                    span,
                    x: Box::new(self.expr(x)),
                },
                None => Node::BadExpr { span },
            },
            "composite_literal" => {
                let typ = node
                    .child_by_field_name("type")
                    .map(|typ| Box::new(self.type_expr(typ)));
                let elts = node
                    .child_by_field_name("body")
                    .map(|body| self.literal_value(body))
                    .unwrap_or_default();
                Node::CompositeLit { span, typ, elts }
            }
            "func_literal" => {
                let typ = Node::FuncType {
                    span,
                    params: node
                        .child_by_field_name("parameters")
                        .map(|params| Box::new(self.field_list(params))),
                    results: node
                        .child_by_field_name("result")
                        .map(|result| Box::new(self.result_list(result))),
                };
                match node.child_by_field_name("body") {
                    Some(body) => Node::FuncLit {
                        span,
                        typ: Box::new(typ),
                        body: Box::new(self.statement(body)),
                    },
                    None => Node::BadExpr { span },
                }
            }
            "keyed_element" => {
                let mut cursor = node.walk();
                let children: Vec<_> = node.named_children(&mut cursor).collect();
                match children.as_slice() {
                    [key, value] => Node::KeyValueExpr {
                        span,
                        key: Box::new(self.expr(self.unwrap_element(*key))),
                        value: Box::new(self.expr(self.unwrap_element(*value))),
                    },
                    _ => Node::BadExpr { span },
                }
            }
            "literal_element" => match node.named_child(0) {
                Some(inner) => self.expr(inner),
                None => Node::BadExpr { span },
            },
            "variadic_argument" => match node.named_child(0) {
                Some(inner) => self.expr(inner),
                None => Node::BadExpr { span },
            },
            _ if is_type_kind(node.kind()) => self.type_expr(node),
            _ => {
                tracing::debug!(kind = node.kind(), "lowering: opaque expression");
                Node::BadExpr { span }
            }
        }
    }

    /// Elements of `literal_value` wrap their payload; step into it.
    fn unwrap_element<'t>(&self, node: TsNode<'t>) -> TsNode<'t> {
        if matches!(node.kind(), "literal_element") {
            node.named_child(0).unwrap_or(node)
        } else {
            node
        }
    }

    fn literal_value(&self, node: TsNode<'_>) -> Vec<Node> {
        let mut elements = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "comment" {
                elements.push(self.expr(child));
            }
        }
        elements
    }

    fn argument(&self, node: TsNode<'_>) -> Node {
        if is_type_kind(node.kind()) {
            // make([]T, n) and friends take a type as first argument.
            self.type_expr(node)
        } else {
            self.expr(node)
        }
    }

    fn basic_lit(&self, node: TsNode<'_>, kind: LitKind) -> Node {
        Node::BasicLit {
            span: self.span(node),
            kind,
            value: self.text(node).to_string(),
        }
    }

    fn type_expr(&self, node: TsNode<'_>) -> Node {
        let span = self.span(node);
        match node.kind() {
            "type_identifier" | "identifier" => Node::Ident {
                span,
                name: self.text(node).to_string(),
            },
            "qualified_type" => {
                match (
                    node.child_by_field_name("package"),
                    node.child_by_field_name("name"),
                ) {
                    (Some(package), Some(name)) => Node::SelectorExpr {
                        span,
                        x: Box::new(Node::Ident {
                            span: self.span(package),
                            name: self.text(package).to_string(),
                        }),
                        sel: Box::new(Node::Ident {
                            span: self.span(name),
                            name: self.text(name).to_string(),
                        }),
                    },
                    _ => Node::BadExpr { span },
                }
            }
            "pointer_type" => match node.named_child(0) {
                Some(inner) => Node::StarExpr {
                    span,
                    x: Box::new(self.type_expr(inner)),
                },
                None => Node::BadExpr { span },
            },
            "array_type" => {
                match (
                    node.child_by_field_name("length"),
                    node.child_by_field_name("element"),
                ) {
                    (Some(length), Some(element)) => Node::ArrayType {
                        span,
                        len: Some(Box::new(self.expr(length))),
                        elt: Box::new(self.type_expr(element)),
                    },
                    _ => Node::BadExpr { span },
                }
            }
            "slice_type" => match node.child_by_field_name("element") {
                Some(element) => Node::ArrayType {
                    span,
                    len: None,
                    elt: Box::new(self.type_expr(element)),
                },
                None => Node::BadExpr { span },
            },
            "map_type" => {
                match (
                    node.child_by_field_name("key"),
                    node.child_by_field_name("value"),
                ) {
                    (Some(key), Some(value)) => Node::MapType {
                        span,
                        key: Box::new(self.type_expr(key)),
                        value: Box::new(self.type_expr(value)),
                    },
                    _ => Node::BadExpr { span },
                }
            }
            "channel_type" => match node.child_by_field_name("value") {
                Some(value) => {
                    let text = self.text(node);
                    let dir = if text.starts_with("<-") {
                        ChanDir::Recv
                    } else if text.starts_with("chan<-") {
                        ChanDir::Send
                    } else {
                        ChanDir::SendRecv
                    };
                    Node::ChanType {
                        span,
                        dir,
                        value: Box::new(self.type_expr(value)),
                    }
                }
                None => Node::BadExpr { span },
            },
            "function_type" => Node::FuncType {
                span,
                params: node
                    .child_by_field_name("parameters")
                    .map(|params| Box::new(self.field_list(params))),
                results: node
                    .child_by_field_name("result")
                    .map(|result| Box::new(self.result_list(result))),
            },
            "struct_type" => {
                let mut cursor = node.walk();
                let fields = node
                    .named_children(&mut cursor)
                    .find(|child| child.kind() == "field_declaration_list")
                    .map(|list| Box::new(self.struct_fields(list)));
                Node::StructType { span, fields }
            }
            "interface_type" => {
                let mut list = Vec::new();
                let mut cursor = node.walk();
                for child in node.named_children(&mut cursor) {
                    if child.kind() == "method_elem" || child.kind() == "method_spec" {
                        list.push(self.method_spec(child));
                    }
                }
                Node::InterfaceType {
                    span,
                    methods: Some(Box::new(Node::FieldList { span, list })),
                }
            }
            "parenthesized_type" => match node.named_child(0) {
                Some(inner) => Node::ParenExpr {
                    span,
                    x: Box::new(self.type_expr(inner)),
                },
                None => Node::BadExpr { span },
            },
            "generic_type" | "negated_type" | "union_type" => {
                tracing::debug!(kind = node.kind(), "lowering: opaque type");
                Node::BadExpr { span }
            }
            _ => self.expr_as_type_fallback(node),
        }
    }

    /// Length expressions and a few other positions can hold arbitrary
    /// expressions where a type is expected syntactically.
    fn expr_as_type_fallback(&self, node: TsNode<'_>) -> Node {
        if is_expression_kind(node.kind()) {
            self.expr(node)
        } else {
            tracing::debug!(kind = node.kind(), "lowering: opaque type");
            Node::BadExpr {
                span: self.span(node),
            }
        }
    }

    fn struct_fields(&self, node: TsNode<'_>) -> Node {
        let mut list = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "field_declaration" {
                continue;
            }
            let mut names = Vec::new();
            let mut name_cursor = child.walk();
            for name in child.children_by_field_name("name", &mut name_cursor) {
                names.push(Node::Ident {
                    span: self.span(name),
                    name: self.text(name).to_string(),
                });
            }
            list.push(Node::Field {
                span: self.span(child),
                names,
                typ: child
                    .child_by_field_name("type")
                    .map(|typ| Box::new(self.type_expr(typ))),
            });
        }
        Node::FieldList {
            span: self.span(node),
            list,
        }
    }

    fn method_spec(&self, node: TsNode<'_>) -> Node {
        let span = self.span(node);
        let names = node
            .child_by_field_name("name")
            .map(|name| {
                vec![Node::Ident {
                    span: self.span(name),
                    name: self.text(name).to_string(),
                }]
            })
            .unwrap_or_default();
        let typ = Node::FuncType {
            span,
            params: node
                .child_by_field_name("parameters")
                .map(|params| Box::new(self.field_list(params))),
            results: node
                .child_by_field_name("result")
                .map(|result| Box::new(self.result_list(result))),
        };
        Node::Field {
            span,
            names,
            typ: Some(Box::new(typ)),
        }
    }
}

/// Named node kinds that lower through `expr`.
fn is_expression_kind(kind: &str) -> bool {
    matches!(
        kind,
        "identifier"
            | "field_identifier"
            | "package_identifier"
            | "type_identifier"
            | "blank_identifier"
            | "label_name"
            | "true"
            | "false"
            | "nil"
            | "iota"
            | "int_literal"
            | "float_literal"
            | "imaginary_literal"
            | "rune_literal"
            | "raw_string_literal"
            | "interpreted_string_literal"
            | "binary_expression"
            | "unary_expression"
            | "selector_expression"
            | "call_expression"
            | "index_expression"
            | "slice_expression"
            | "type_assertion_expression"
            | "type_conversion_expression"
            | "parenthesized_expression"
            | "composite_literal"
            | "func_literal"
            | "keyed_element"
            | "literal_element"
            | "variadic_argument"
    )
}

fn is_type_kind(kind: &str) -> bool {
    matches!(
        kind,
        "type_identifier"
            | "qualified_type"
            | "pointer_type"
            | "array_type"
            | "slice_type"
            | "map_type"
            | "channel_type"
            | "function_type"
            | "struct_type"
            | "interface_type"
            | "parenthesized_type"
            | "generic_type"
    )
}

/// Kinds that may appear in a case or block body as statements.
fn is_statement_position(node: TsNode<'_>) -> bool {
    !matches!(node.kind(), "comment")
}

fn binary_tok(op: &str) -> Option<Tok> {
    let tok = match op {
        "+" => Tok::Add,
        "-" => Tok::Sub,
        "*" => Tok::Mul,
        "/" => Tok::Quo,
        "%" => Tok::Rem,
        "&" => Tok::And,
        "|" => Tok::Or,
        "^" => Tok::Xor,
        "<<" => Tok::Shl,
        ">>" => Tok::Shr,
        "&^" => Tok::AndNot,
        "&&" => Tok::LAnd,
        "||" => Tok::LOr,
        "==" => Tok::Eql,
        "<" => Tok::Lss,
        ">" => Tok::Gtr,
        "!=" => Tok::Neq,
        "<=" => Tok::Leq,
        ">=" => Tok::Geq,
        _ => return None,
    };
    Some(tok)
}

fn unary_tok(op: &str) -> Option<Tok> {
    let tok = match op {
        "+" => Tok::Add,
        "-" => Tok::Sub,
        "!" => Tok::Not,
        "^" => Tok::Xor,
        "&" => Tok::And,
        "<-" => Tok::Arrow,
        _ => return None,
    };
    Some(tok)
}

fn assign_tok(op: &str) -> Option<Tok> {
    let tok = match op {
        "=" => Tok::Assign,
        ":=" => Tok::Define,
        "+=" => Tok::AddAssign,
        "-=" => Tok::SubAssign,
        "*=" => Tok::MulAssign,
        "/=" => Tok::QuoAssign,
        "%=" => Tok::RemAssign,
        "&=" => Tok::AndAssign,
        "|=" => Tok::OrAssign,
        "^=" => Tok::XorAssign,
        "<<=" => Tok::ShlAssign,
        ">>=" => Tok::ShrAssign,
        "&^=" => Tok::AndNotAssign,
        _ => return None,
    };
    Some(tok)
}
