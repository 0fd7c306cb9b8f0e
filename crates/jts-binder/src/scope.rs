//! Lexical scopes for locals and parameters.
//!
//! Scopes are pushed and popped while a member body is walked; each scope is
//! kept in the arena after it is exited so its parent links stay valid.

use jts_ast::TypeRef;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const NONE: ScopeId = ScopeId(u32::MAX);

    pub fn is_none(&self) -> bool {
        self.0 == u32::MAX
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    /// Parameters of a method or constructor (empty for field initializers).
    Member,
    Block,
}

/// A local variable or parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocalBinding {
    /// Name in the source.
    pub name: String,
    /// Name in the output, escaped when it collides with a reserved word.
    pub emitted: String,
    pub ty: TypeRef,
}

#[derive(Clone, Debug)]
pub struct Scope {
    pub parent: ScopeId,
    pub kind: ScopeKind,
    pub bindings: SmallVec<[LocalBinding; 4]>,
}

impl Scope {
    pub fn new(parent: ScopeId, kind: ScopeKind) -> Self {
        Self {
            parent,
            kind,
            bindings: SmallVec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ScopeArena {
    scopes: Vec<Scope>,
    current: ScopeId,
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeArena {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            current: ScopeId::NONE,
        }
    }

    pub fn current(&self) -> ScopeId {
        self.current
    }

    /// Enter a new scope nested in the current one.
    pub fn enter(&mut self, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope::new(self.current, kind));
        self.current = id;
        id
    }

    /// Return to the parent of the current scope.
    pub fn exit(&mut self) {
        if let Some(scope) = self.scopes.get(self.current.0 as usize) {
            self.current = scope.parent;
        }
    }

    /// Declare a binding in the current scope.
    pub fn declare(&mut self, binding: LocalBinding) {
        if let Some(scope) = self.scopes.get_mut(self.current.0 as usize) {
            scope.bindings.push(binding);
        }
    }

    /// Innermost binding named `name` visible from the current scope.
    pub fn lookup(&self, name: &str) -> Option<&LocalBinding> {
        let mut id = self.current;
        while let Some(scope) = self.scopes.get(id.0 as usize) {
            if let Some(binding) = scope.bindings.iter().rev().find(|b| b.name == name) {
                return Some(binding);
            }
            id = scope.parent;
        }
        None
    }

    /// Every binding visible from the current scope, outermost first.
    pub fn visible(&self) -> Vec<LocalBinding> {
        let mut chain = Vec::new();
        let mut id = self.current;
        while let Some(scope) = self.scopes.get(id.0 as usize) {
            chain.push(scope);
            id = scope.parent;
        }
        chain
            .into_iter()
            .rev()
            .flat_map(|scope| scope.bindings.iter().cloned())
            .collect()
    }
}
