//! Statements.

use crate::expr::Expr;
use crate::types::TypeRef;
use jts_common::Span;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    #[serde(default)]
    pub stmts: Vec<Stmt>,
    #[serde(default)]
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self {
            stmts,
            span: Span::DUMMY,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatchClause {
    pub name: String,
    /// More than one entry for multi-catch (`catch (A | B e)`).
    pub types: Vec<TypeRef>,
    pub body: Block,
}

/// One `case label:` or `default:` entry of a switch; statements fall
/// through to the next entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchCase {
    /// `None` for `default`.
    #[serde(default)]
    pub label: Option<Expr>,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "camelCase")]
pub enum Stmt {
    Block(Block),
    LocalVar {
        name: String,
        #[serde(rename = "type")]
        ty: TypeRef,
        #[serde(default)]
        init: Option<Expr>,
        #[serde(default)]
        span: Span,
    },
    Expr {
        expr: Expr,
    },
    Return {
        #[serde(default)]
        value: Option<Expr>,
    },
    If {
        cond: Expr,
        then: Box<Stmt>,
        #[serde(default)]
        els: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    DoWhile {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        #[serde(default)]
        init: Vec<Stmt>,
        #[serde(default)]
        cond: Option<Expr>,
        #[serde(default)]
        update: Vec<Expr>,
        body: Box<Stmt>,
    },
    ForEach {
        name: String,
        #[serde(rename = "type")]
        ty: TypeRef,
        iterable: Expr,
        body: Box<Stmt>,
    },
    Throw {
        value: Expr,
    },
    Try {
        body: Block,
        #[serde(default)]
        catches: Vec<CatchClause>,
        #[serde(default)]
        finally: Option<Block>,
    },
    /// `this(...)` or `super(...)` as the first statement of a constructor.
    ExplicitCtorCall {
        is_this: bool,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
    Break {
        #[serde(default)]
        label: Option<String>,
    },
    Continue {
        #[serde(default)]
        label: Option<String>,
    },
    Empty,
    /// All cases share one block scope.
    Switch {
        selector: Expr,
        #[serde(default)]
        cases: Vec<SwitchCase>,
        #[serde(default)]
        span: Span,
    },
    Labeled {
        label: String,
        body: Box<Stmt>,
    },
    Assert {
        check: Expr,
        #[serde(default)]
        message: Option<Expr>,
        #[serde(default)]
        span: Span,
    },
    Synchronized {
        lock: Expr,
        body: Block,
        #[serde(default)]
        span: Span,
    },
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Self::Expr { expr }
    }

    pub fn local(name: impl Into<String>, ty: TypeRef, init: Option<Expr>) -> Self {
        Self::LocalVar {
            name: name.into(),
            ty,
            init,
            span: Span::DUMMY,
        }
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Self::Return { value }
    }

    pub fn labeled(label: impl Into<String>, body: Stmt) -> Self {
        Self::Labeled {
            label: label.into(),
            body: Box::new(body),
        }
    }
}
