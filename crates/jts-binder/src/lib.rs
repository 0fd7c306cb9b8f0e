//! Symbol table and scope-chain resolution.
//!
//! - [`builder::SymbolTableBuilder`] walks a compilation unit once and
//!   registers every type unit (named, nested and anonymous) and member.
//! - [`type_lookup`] resolves type names as they are written in a unit.
//! - [`scope::ScopeArena`] tracks local bindings while a body is walked.
//! - [`resolver::Resolver`] builds the ordered binding chain for a name.
//!
//! The table is immutable once built; later stages take it by shared
//! reference.

pub mod builder;
pub mod resolver;
pub mod scope;
pub mod symbols;
pub mod type_lookup;

pub use builder::SymbolTableBuilder;
pub use resolver::{Binding, BindingKind, ExecContext, MethodTarget, Resolver};
pub use scope::{LocalBinding, Scope, ScopeArena, ScopeId, ScopeKind};
pub use symbols::{
    AnonymousOrigin, AnonymousSite, Member, MemberId, MemberKind, MemberSource, SymbolTable,
    TypeUnit, TypeUnitId, UnitKind,
};
pub use type_lookup::TypeTarget;

#[cfg(test)]
#[path = "../tests/builder_tests.rs"]
mod builder_tests;

#[cfg(test)]
#[path = "../tests/type_lookup_tests.rs"]
mod type_lookup_tests;

#[cfg(test)]
#[path = "../tests/resolver_tests.rs"]
mod resolver_tests;
