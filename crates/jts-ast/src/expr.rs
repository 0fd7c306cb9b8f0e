//! Expressions, including the qualified forms produced by the engine.
//!
//! Source expressions (`Name`, `This`, `New`, ...) come from the parser.
//! After qualification, no `Name` remains in a lowered body: every reference
//! is one of
//!
//! - `Local` for locals and parameters,
//! - `FieldAccess` on `This` for own instance members,
//! - `FieldAccess` on `OuterThis` for enclosing-instance members,
//! - `CapturedLocal` for locals of an anonymous class's creating scope,
//! - `FieldAccess` on `TypePath` for statics.
//!
//! The qualifier leaves these forms untouched when it sees them again.

use crate::decl::MemberDecl;
use crate::stmt::Block;
use crate::types::TypeRef;
use jts_common::Span;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Literal {
    /// Numeric literal kept as source text (`1`, `2.5f`, `0x1F`).
    Number { text: String },
    Char { value: String },
    String { value: String },
    Boolean { value: bool },
    Null,
}

/// One step from a unit's instance to its enclosing instance.
///
/// `slot` is the capture slot on `from` holding the `to` instance; it is
/// filled in once capture slots are known.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureHop {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<String>,
}

/// Value passed for one capture slot at a creation site.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureArg {
    pub slot: String,
    pub value: Expr,
}

/// Lambda parameter; `ty` is `None` when the type is inferred.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LambdaParam {
    pub name: String,
    #[serde(default, rename = "type")]
    pub ty: Option<TypeRef>,
}

impl LambdaParam {
    /// Declared type, `Object` when inferred.
    pub fn declared_type(&self) -> TypeRef {
        self.ty.clone().unwrap_or_else(|| TypeRef::named("Object"))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LambdaBody {
    Expr(Box<Expr>),
    Block(Block),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "node", rename_all = "camelCase")]
pub enum Expr {
    Literal {
        value: Literal,
    },
    /// Bare identifier.
    Name {
        name: String,
        #[serde(default)]
        span: Span,
    },
    FieldAccess {
        target: Box<Expr>,
        name: String,
        #[serde(default)]
        span: Span,
    },
    MethodCall {
        #[serde(default)]
        target: Option<Box<Expr>>,
        name: String,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
    /// `new T(args)`, `outer.new T(args)` or `new T(args) { body }`.
    New {
        #[serde(rename = "type")]
        ty: TypeRef,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        outer: Option<Box<Expr>>,
        #[serde(default)]
        body: Option<Vec<MemberDecl>>,
        #[serde(default)]
        span: Span,
    },
    /// `this` or `Outer.this`.
    This {
        #[serde(default)]
        qualifier: Option<String>,
        #[serde(default)]
        span: Span,
    },
    Super {
        #[serde(default)]
        span: Span,
    },
    /// `target op value`; `op` is `=` or a compound operator like `+=`.
    Assign {
        op: String,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Binary {
        op: String,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: String,
        operand: Box<Expr>,
        #[serde(default)]
        postfix: bool,
    },
    Conditional {
        cond: Box<Expr>,
        then: Box<Expr>,
        els: Box<Expr>,
    },
    Cast {
        #[serde(rename = "type")]
        ty: TypeRef,
        expr: Box<Expr>,
    },
    InstanceOf {
        expr: Box<Expr>,
        #[serde(rename = "type")]
        ty: TypeRef,
    },
    ArrayAccess {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    /// `new T[n][m]` or `new T[] { ... }`.
    ArrayNew {
        element: TypeRef,
        #[serde(default)]
        dims: Vec<Expr>,
        #[serde(default)]
        init: Option<Vec<Expr>>,
    },
    /// Bare `{ a, b }` array initializer.
    ArrayInit {
        elements: Vec<Expr>,
    },
    /// `(a, b) -> body`. `this` inside the body is the enclosing `this`.
    Lambda {
        #[serde(default)]
        params: Vec<LambdaParam>,
        body: LambdaBody,
        #[serde(default)]
        span: Span,
    },
    /// `target::name`; `target` is a type name or an expression.
    MethodReference {
        target: Box<Expr>,
        name: String,
        #[serde(default)]
        span: Span,
    },
    /// `T.class`.
    ClassLiteral {
        #[serde(rename = "type")]
        ty: TypeRef,
    },

    // =========================================================================
    // Qualified forms
    // =========================================================================
    /// Local variable or parameter, already escaped.
    Local {
        name: String,
    },
    /// Enclosing instance reached through capture slots, one hop per level.
    OuterThis {
        hops: Vec<CaptureHop>,
    },
    /// Local of an anonymous unit's creating scope, read from its capture slot
    /// on the unit reached after `hops`.
    CapturedLocal {
        name: String,
        hops: Vec<CaptureHop>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        slot: Option<String>,
    },
    /// Fully qualified type used as a receiver (`test.Test6.B`).
    TypePath {
        path: String,
    },
    /// Instantiation of a type unit of the compilation unit.
    NewUnit {
        path: String,
        #[serde(default)]
        args: Vec<Expr>,
        /// Enclosing instance for the new object, before it is moved into
        /// `captures`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        outer: Option<Box<Expr>>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        captures: Vec<CaptureArg>,
        #[serde(default)]
        anonymous: bool,
        #[serde(default)]
        span: Span,
    },
}

impl Expr {
    pub fn name(name: impl Into<String>) -> Self {
        Self::Name {
            name: name.into(),
            span: Span::DUMMY,
        }
    }

    pub fn number(text: impl Into<String>) -> Self {
        Self::Literal {
            value: Literal::Number { text: text.into() },
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::Literal {
            value: Literal::String {
                value: value.into(),
            },
        }
    }

    pub const fn null() -> Self {
        Self::Literal {
            value: Literal::Null,
        }
    }

    pub const fn this() -> Self {
        Self::This {
            qualifier: None,
            span: Span::DUMMY,
        }
    }

    pub fn outer_this(qualifier: impl Into<String>) -> Self {
        Self::This {
            qualifier: Some(qualifier.into()),
            span: Span::DUMMY,
        }
    }

    pub fn field(target: Expr, name: impl Into<String>) -> Self {
        Self::FieldAccess {
            target: Box::new(target),
            name: name.into(),
            span: Span::DUMMY,
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::MethodCall {
            target: None,
            name: name.into(),
            args,
            span: Span::DUMMY,
        }
    }

    pub fn call_on(target: Expr, name: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::MethodCall {
            target: Some(Box::new(target)),
            name: name.into(),
            args,
            span: Span::DUMMY,
        }
    }

    pub fn new_object(ty: TypeRef, args: Vec<Expr>) -> Self {
        Self::New {
            ty,
            args,
            outer: None,
            body: None,
            span: Span::DUMMY,
        }
    }

    pub fn new_anonymous(ty: TypeRef, args: Vec<Expr>, body: Vec<MemberDecl>) -> Self {
        Self::New {
            ty,
            args,
            outer: None,
            body: Some(body),
            span: Span::DUMMY,
        }
    }

    pub fn assign(target: Expr, value: Expr) -> Self {
        Self::Assign {
            op: "=".to_string(),
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    pub fn binary(op: impl Into<String>, left: Expr, right: Expr) -> Self {
        Self::Binary {
            op: op.into(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn lambda(params: &[&str], body: LambdaBody) -> Self {
        Self::Lambda {
            params: params
                .iter()
                .map(|name| LambdaParam {
                    name: (*name).to_string(),
                    ty: None,
                })
                .collect(),
            body,
            span: Span::DUMMY,
        }
    }

    /// Attach a source span to the node kinds that carry one.
    #[must_use]
    pub fn at(mut self, at: Span) -> Self {
        match &mut self {
            Self::Name { span, .. }
            | Self::FieldAccess { span, .. }
            | Self::MethodCall { span, .. }
            | Self::New { span, .. }
            | Self::This { span, .. }
            | Self::Super { span }
            | Self::Lambda { span, .. }
            | Self::MethodReference { span, .. }
            | Self::NewUnit { span, .. } => *span = at,
            _ => {}
        }
        self
    }

    /// Source span, `Span::DUMMY` for node kinds without one.
    pub fn span(&self) -> Span {
        match self {
            Self::Name { span, .. }
            | Self::FieldAccess { span, .. }
            | Self::MethodCall { span, .. }
            | Self::New { span, .. }
            | Self::This { span, .. }
            | Self::Super { span }
            | Self::Lambda { span, .. }
            | Self::MethodReference { span, .. }
            | Self::NewUnit { span, .. } => *span,
            _ => Span::DUMMY,
        }
    }

    /// Dotted source name (`a.b.c`) when this is a chain of bare names.
    pub fn dotted_name(&self) -> Option<String> {
        match self {
            Self::Name { name, .. } => Some(name.clone()),
            Self::FieldAccess { target, name, .. } => {
                let mut prefix = target.dotted_name()?;
                prefix.push('.');
                prefix.push_str(name);
                Some(prefix)
            }
            _ => None,
        }
    }

    /// True for receivers whose evaluation has no side effects.
    pub const fn is_pure_receiver(&self) -> bool {
        matches!(
            self,
            Self::This { .. } | Self::OuterThis { .. } | Self::Local { .. } | Self::TypePath { .. }
        )
    }
}
