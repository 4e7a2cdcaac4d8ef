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

//! The typed Go AST this crate analyzes.
//!
//! One [`Node`] variant exists per Go node kind, so the structural walks
//! (equality, similarity, coloring) are exhaustive matches and the compiler
//! enforces case coverage as kinds are added. Children are stored as boxed
//! nodes or node lists; token positions are byte offsets into the source
//! buffer the node was parsed from.

use std::fmt;

/// Byte range of a node in its source buffer. `end` is exclusive.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Serialize)]
pub struct Span {
    pub pos: usize,
    pub end: usize,
}

impl Span {
    pub fn new(pos: usize, end: usize) -> Self {
        Self { pos, end }
    }
}

/// Go operator and keyword tokens that are structural (compared by value).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Tok {
    // Binary operators.
    Add,
    Sub,
    Mul,
    Quo,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
    LAnd,
    LOr,
    Eql,
    Lss,
    Gtr,
    Neq,
    Leq,
    Geq,
    // Unary-only operators (`&x`, `!x`, `<-ch`). Arithmetic unary operators
    // reuse the binary variants above.
    Not,
    Arrow,
    // Assignment operators.
    Assign,
    Define,
    AddAssign,
    SubAssign,
    MulAssign,
    QuoAssign,
    RemAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShlAssign,
    ShrAssign,
    AndNotAssign,
    // IncDecStmt.
    Inc,
    Dec,
    // BranchStmt keywords.
    Break,
    Continue,
    Goto,
    Fallthrough,
    // GenDecl keywords.
    Var,
    Const,
    Type,
    Import,
}

impl Tok {
    /// The operator's source text, as written in Go.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Quo => "/",
            Self::Rem => "%",
            Self::And => "&",
            Self::Or => "|",
            Self::Xor => "^",
            Self::Shl => "<<",
            Self::Shr => ">>",
            Self::AndNot => "&^",
            Self::LAnd => "&&",
            Self::LOr => "||",
            Self::Eql => "==",
            Self::Lss => "<",
            Self::Gtr => ">",
            Self::Neq => "!=",
            Self::Leq => "<=",
            Self::Geq => ">=",
            Self::Not => "!",
            Self::Arrow => "<-",
            Self::Assign => "=",
            Self::Define => ":=",
            Self::AddAssign => "+=",
            Self::SubAssign => "-=",
            Self::MulAssign => "*=",
            Self::QuoAssign => "/=",
            Self::RemAssign => "%=",
            Self::AndAssign => "&=",
            Self::OrAssign => "|=",
            Self::XorAssign => "^=",
            Self::ShlAssign => "<<=",
            Self::ShrAssign => ">>=",
            Self::AndNotAssign => "&^=",
            Self::Inc => "++",
            Self::Dec => "--",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Goto => "goto",
            Self::Fallthrough => "fallthrough",
            Self::Var => "var",
            Self::Const => "const",
            Self::Type => "type",
            Self::Import => "import",
        }
    }
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Literal kinds of a `BasicLit`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum LitKind {
    Int,
    Float,
    Imag,
    Char,
    String,
}

/// Channel direction of a `ChanType`.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ChanDir {
    Send,
    Recv,
    SendRecv,
}

/// A single node of the Go AST.
///
/// Variant payloads hold only structural fields plus the node's [`Span`];
/// comments attached to declarations are represented as nodes of their own
/// but never compared structurally.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    ArrayType {
        span: Span,
        len: Option<Box<Node>>,
        elt: Box<Node>,
    },
    AssignStmt {
        span: Span,
        lhs: Vec<Node>,
        tok: Tok,
        rhs: Vec<Node>,
    },
    BadDecl {
        span: Span,
    },
    BadExpr {
        span: Span,
    },
    BadStmt {
        span: Span,
    },
    BasicLit {
        span: Span,
        kind: LitKind,
        value: String,
    },
    BinaryExpr {
        span: Span,
        x: Box<Node>,
        op: Tok,
        y: Box<Node>,
    },
    BlockStmt {
        span: Span,
        list: Vec<Node>,
    },
    BranchStmt {
        span: Span,
        tok: Tok,
        label: Option<Box<Node>>,
    },
    CallExpr {
        span: Span,
        fun: Box<Node>,
        args: Vec<Node>,
    },
    CaseClause {
        span: Span,
        list: Vec<Node>,
        body: Vec<Node>,
    },
    ChanType {
        span: Span,
        dir: ChanDir,
        value: Box<Node>,
    },
    CommClause {
        span: Span,
        comm: Option<Box<Node>>,
        body: Vec<Node>,
    },
    Comment {
        span: Span,
        text: String,
    },
    CommentGroup {
        span: Span,
        list: Vec<Node>,
    },
    CompositeLit {
        span: Span,
        typ: Option<Box<Node>>,
        elts: Vec<Node>,
    },
    DeclStmt {
        span: Span,
        decl: Box<Node>,
    },
    DeferStmt {
        span: Span,
        call: Box<Node>,
    },
    Ellipsis {
        span: Span,
        elt: Option<Box<Node>>,
    },
    EmptyStmt {
        span: Span,
    },
    ExprStmt {
        span: Span,
        x: Box<Node>,
    },
    Field {
        span: Span,
        names: Vec<Node>,
        typ: Option<Box<Node>>,
    },
    FieldList {
        span: Span,
        list: Vec<Node>,
    },
    ForStmt {
        span: Span,
        init: Option<Box<Node>>,
        cond: Option<Box<Node>>,
        post: Option<Box<Node>>,
        body: Box<Node>,
    },
    FuncDecl {
        span: Span,
        recv: Option<Box<Node>>,
        name: Box<Node>,
        typ: Box<Node>,
        body: Option<Box<Node>>,
    },
    FuncLit {
        span: Span,
        typ: Box<Node>,
        body: Box<Node>,
    },
    FuncType {
        span: Span,
        params: Option<Box<Node>>,
        results: Option<Box<Node>>,
    },
    GenDecl {
        span: Span,
        tok: Tok,
        specs: Vec<Node>,
    },
    GoStmt {
        span: Span,
        call: Box<Node>,
    },
    Ident {
        span: Span,
        name: String,
    },
    IfStmt {
        span: Span,
        init: Option<Box<Node>>,
        cond: Box<Node>,
        body: Box<Node>,
        els: Option<Box<Node>>,
    },
    ImportSpec {
        span: Span,
        name: Option<Box<Node>>,
        path: Box<Node>,
    },
    IncDecStmt {
        span: Span,
        x: Box<Node>,
        tok: Tok,
    },
    IndexExpr {
        span: Span,
        x: Box<Node>,
        index: Box<Node>,
    },
    InterfaceType {
        span: Span,
        methods: Option<Box<Node>>,
    },
    KeyValueExpr {
        span: Span,
        key: Box<Node>,
        value: Box<Node>,
    },
    LabeledStmt {
        span: Span,
        label: Box<Node>,
        stmt: Box<Node>,
    },
    MapType {
        span: Span,
        key: Box<Node>,
        value: Box<Node>,
    },
    Package {
        span: Span,
        name: String,
    },
    ParenExpr {
        span: Span,
        x: Box<Node>,
    },
    RangeStmt {
        span: Span,
        key: Option<Box<Node>>,
        value: Option<Box<Node>>,
        x: Box<Node>,
        body: Box<Node>,
    },
    ReturnStmt {
        span: Span,
        results: Vec<Node>,
    },
    SelectStmt {
        span: Span,
        body: Box<Node>,
    },
    SelectorExpr {
        span: Span,
        x: Box<Node>,
        sel: Box<Node>,
    },
    SendStmt {
        span: Span,
        chan: Box<Node>,
        value: Box<Node>,
    },
    SliceExpr {
        span: Span,
        x: Box<Node>,
        low: Option<Box<Node>>,
        high: Option<Box<Node>>,
        max: Option<Box<Node>>,
    },
    StarExpr {
        span: Span,
        x: Box<Node>,
    },
    StructType {
        span: Span,
        fields: Option<Box<Node>>,
    },
    SwitchStmt {
        span: Span,
        init: Option<Box<Node>>,
        tag: Option<Box<Node>>,
        body: Box<Node>,
    },
    TypeAssertExpr {
        span: Span,
        x: Box<Node>,
        typ: Option<Box<Node>>,
    },
    TypeSpec {
        span: Span,
        name: Box<Node>,
        typ: Box<Node>,
    },
    TypeSwitchStmt {
        span: Span,
        init: Option<Box<Node>>,
        assign: Box<Node>,
        body: Box<Node>,
    },
    UnaryExpr {
        span: Span,
        op: Tok,
        x: Box<Node>,
    },
    ValueSpec {
        span: Span,
        names: Vec<Node>,
        typ: Option<Box<Node>>,
        values: Vec<Node>,
    },
}

impl Node {
    /// The node's byte range in its source buffer.
    pub fn span(&self) -> Span {
        match self {
            Self::ArrayType { span, .. }
            | Self::AssignStmt { span, .. }
            | Self::BadDecl { span }
            | Self::BadExpr { span }
            | Self::BadStmt { span }
            | Self::BasicLit { span, .. }
            | Self::BinaryExpr { span, .. }
            | Self::BlockStmt { span, .. }
            | Self::BranchStmt { span, .. }
            | Self::CallExpr { span, .. }
            | Self::CaseClause { span, .. }
            | Self::ChanType { span, .. }
            | Self::CommClause { span, .. }
            | Self::Comment { span, .. }
            | Self::CommentGroup { span, .. }
            | Self::CompositeLit { span, .. }
            | Self::DeclStmt { span, .. }
            | Self::DeferStmt { span, .. }
            | Self::Ellipsis { span, .. }
            | Self::EmptyStmt { span }
            | Self::ExprStmt { span, .. }
            | Self::Field { span, .. }
            | Self::FieldList { span, .. }
            | Self::ForStmt { span, .. }
            | Self::FuncDecl { span, .. }
            | Self::FuncLit { span, .. }
            | Self::FuncType { span, .. }
            | Self::GenDecl { span, .. }
            | Self::GoStmt { span, .. }
            | Self::Ident { span, .. }
            | Self::IfStmt { span, .. }
            | Self::ImportSpec { span, .. }
            | Self::IncDecStmt { span, .. }
            | Self::IndexExpr { span, .. }
            | Self::InterfaceType { span, .. }
            | Self::KeyValueExpr { span, .. }
            | Self::LabeledStmt { span, .. }
            | Self::MapType { span, .. }
            | Self::Package { span, .. }
            | Self::ParenExpr { span, .. }
            | Self::RangeStmt { span, .. }
            | Self::ReturnStmt { span, .. }
            | Self::SelectStmt { span, .. }
            | Self::SelectorExpr { span, .. }
            | Self::SendStmt { span, .. }
            | Self::SliceExpr { span, .. }
            | Self::StarExpr { span, .. }
            | Self::StructType { span, .. }
            | Self::SwitchStmt { span, .. }
            | Self::TypeAssertExpr { span, .. }
            | Self::TypeSpec { span, .. }
            | Self::TypeSwitchStmt { span, .. }
            | Self::UnaryExpr { span, .. }
            | Self::ValueSpec { span, .. } => *span,
        }
    }

    pub fn pos(&self) -> usize {
        self.span().pos
    }

    pub fn end(&self) -> usize {
        self.span().end
    }

    /// A short name of the node kind, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::ArrayType { .. } => "ArrayType",
            Self::AssignStmt { .. } => "AssignStmt",
            Self::BadDecl { .. } => "BadDecl",
            Self::BadExpr { .. } => "BadExpr",
            Self::BadStmt { .. } => "BadStmt",
            Self::BasicLit { .. } => "BasicLit",
            Self::BinaryExpr { .. } => "BinaryExpr",
            Self::BlockStmt { .. } => "BlockStmt",
            Self::BranchStmt { .. } => "BranchStmt",
            Self::CallExpr { .. } => "CallExpr",
            Self::CaseClause { .. } => "CaseClause",
            Self::ChanType { .. } => "ChanType",
            Self::CommClause { .. } => "CommClause",
            Self::Comment { .. } => "Comment",
            Self::CommentGroup { .. } => "CommentGroup",
            Self::CompositeLit { .. } => "CompositeLit",
            Self::DeclStmt { .. } => "DeclStmt",
            Self::DeferStmt { .. } => "DeferStmt",
            Self::Ellipsis { .. } => "Ellipsis",
            Self::EmptyStmt { .. } => "EmptyStmt",
            Self::ExprStmt { .. } => "ExprStmt",
            Self::Field { .. } => "Field",
            Self::FieldList { .. } => "FieldList",
            Self::ForStmt { .. } => "ForStmt",
            Self::FuncDecl { .. } => "FuncDecl",
            Self::FuncLit { .. } => "FuncLit",
            Self::FuncType { .. } => "FuncType",
            Self::GenDecl { .. } => "GenDecl",
            Self::GoStmt { .. } => "GoStmt",
            Self::Ident { .. } => "Ident",
            Self::IfStmt { .. } => "IfStmt",
            Self::ImportSpec { .. } => "ImportSpec",
            Self::IncDecStmt { .. } => "IncDecStmt",
            Self::IndexExpr { .. } => "IndexExpr",
            Self::InterfaceType { .. } => "InterfaceType",
            Self::KeyValueExpr { .. } => "KeyValueExpr",
            Self::LabeledStmt { .. } => "LabeledStmt",
            Self::MapType { .. } => "MapType",
            Self::Package { .. } => "Package",
            Self::ParenExpr { .. } => "ParenExpr",
            Self::RangeStmt { .. } => "RangeStmt",
            Self::ReturnStmt { .. } => "ReturnStmt",
            Self::SelectStmt { .. } => "SelectStmt",
            Self::SelectorExpr { .. } => "SelectorExpr",
            Self::SendStmt { .. } => "SendStmt",
            Self::SliceExpr { .. } => "SliceExpr",
            Self::StarExpr { .. } => "StarExpr",
            Self::StructType { .. } => "StructType",
            Self::SwitchStmt { .. } => "SwitchStmt",
            Self::TypeAssertExpr { .. } => "TypeAssertExpr",
            Self::TypeSpec { .. } => "TypeSpec",
            Self::TypeSwitchStmt { .. } => "TypeSwitchStmt",
            Self::UnaryExpr { .. } => "UnaryExpr",
            Self::ValueSpec { .. } => "ValueSpec",
        }
    }

    /// The identifier's name, if this node is an `Ident`.
    pub fn ident_name(&self) -> Option<&str> {
        match self {
            Self::Ident { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Syntactic text of a receiver or type expression, used when computing
    /// method signatures. Unknown forms degrade to their kind name rather
    /// than failing the declaration.
    pub fn type_text(&self) -> String {
        match self {
            Self::Ident { name, .. } => name.clone(),
            Self::SelectorExpr { x, sel, .. } => {
                format!("{}.{}", x.type_text(), sel.type_text())
            }
            Self::StarExpr { x, .. } => x.type_text(),
            Self::ParenExpr { x, .. } => x.type_text(),
            Self::ArrayType { len, elt, .. } => match len {
                Some(len) => format!("[{}]{}", len.type_text(), elt.type_text()),
                None => format!("[]{}", elt.type_text()),
            },
            Self::MapType { key, value, .. } => {
                format!("map[{}]{}", key.type_text(), value.type_text())
            }
            Self::InterfaceType { methods, .. } => {
                let empty = match methods.as_deref() {
                    None => true,
                    Some(Self::FieldList { list, .. }) => list.is_empty(),
                    Some(_) => false,
                };
                if empty {
                    "interface{}".to_string()
                } else {
                    "interface".to_string()
                }
            }
            Self::BasicLit { value, .. } => value.clone(),
            other => other.kind_name().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Node {
        Node::Ident {
            span: Span::default(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_receiver_type_text() {
        let pointer = Node::StarExpr {
            span: Span::default(),
            x: Box::new(ident("Server")),
        };
        assert_eq!(pointer.type_text(), "Server");

        let qualified = Node::SelectorExpr {
            span: Span::default(),
            x: Box::new(ident("http")),
            sel: Box::new(ident("Handler")),
        };
        assert_eq!(qualified.type_text(), "http.Handler");

        let array = Node::ArrayType {
            span: Span::default(),
            len: Some(Box::new(Node::BasicLit {
                span: Span::default(),
                kind: LitKind::Int,
                value: "4".to_string(),
            })),
            elt: Box::new(ident("byte")),
        };
        assert_eq!(array.type_text(), "[4]byte");

        let map = Node::MapType {
            span: Span::default(),
            key: Box::new(ident("string")),
            value: Box::new(ident("int")),
        };
        assert_eq!(map.type_text(), "map[string]int");

        let empty_iface = Node::InterfaceType {
            span: Span::default(),
            methods: Some(Box::new(Node::FieldList {
                span: Span::default(),
                list: vec![],
            })),
        };
        assert_eq!(empty_iface.type_text(), "interface{}");
    }

    #[test]
    fn test_span_dispatch() {
        let node = Node::ReturnStmt {
            span: Span::new(10, 25),
            results: vec![],
        };
        assert_eq!(node.pos(), 10);
        assert_eq!(node.end(), 25);
        assert_eq!(node.kind_name(), "ReturnStmt");
    }
}
