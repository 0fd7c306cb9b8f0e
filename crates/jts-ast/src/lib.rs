//! AST model consumed and produced by the jts lowering engine.
//!
//! The input is one fully parsed, type-annotated compilation unit, usually
//! decoded from JSON produced by an external parser. The same node types carry
//! the qualified output: the engine only adds the variants documented as
//! "qualified forms" in [`expr`] and fills in [`TypeRef::Named`] resolutions.

pub mod decl;
pub mod expr;
pub mod modifiers;
pub mod stmt;
pub mod types;
pub mod visit;

pub use decl::{
    CompilationUnit, ConstructorDecl, DeclKind, FieldDecl, Import, InitializerDecl, MemberDecl,
    MethodDecl, Param, TypeDecl,
};
pub use expr::{CaptureArg, CaptureHop, Expr, LambdaBody, LambdaParam, Literal};
pub use modifiers::{Modifiers, Visibility};
pub use stmt::{Block, CatchClause, Stmt, SwitchCase};
pub use types::{PrimitiveKind, TypeRef};
pub use visit::Visitor;

#[cfg(test)]
#[path = "../tests/ast_tests.rs"]
mod ast_tests;

#[cfg(test)]
#[path = "../tests/visit_tests.rs"]
mod visit_tests;
