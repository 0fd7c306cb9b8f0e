//! Type units, members and the symbol table that owns them.
//!
//! Units and members live in flat arenas addressed by `TypeUnitId` and
//! `MemberId`. Enclosing and supertype relations are id links, never
//! ownership, so sibling nested types that refer to each other do not form
//! reference cycles.

use crate::scope::LocalBinding;
use jts_ast::{
    ConstructorDecl, FieldDecl, Import, InitializerDecl, MethodDecl, Modifiers, Param, TypeRef,
    Visibility,
};
use jts_common::Span;
use jts_common::limits::MAX_SUPERTYPE_DEPTH;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Index of a type unit in `SymbolTable::units`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeUnitId(pub u32);

impl TypeUnitId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a member in `SymbolTable::members`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub u32);

impl MemberId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitKind {
    Class,
    Interface,
    Anonymous,
}

/// Where an anonymous class is instantiated: the `n`-th anonymous `new`
/// (pre-order, zero based) inside one member.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AnonymousSite {
    pub member: MemberId,
    pub ordinal: u32,
}

#[derive(Clone, Debug)]
pub struct AnonymousOrigin {
    pub site: AnonymousSite,
    /// Base type as written after `new`.
    pub base: TypeRef,
    /// Set once supertypes are resolved.
    pub base_is_interface: bool,
    /// Locals and parameters in scope at the creation site, outermost first.
    pub creation_locals: Vec<LocalBinding>,
}

#[derive(Clone, Debug)]
pub struct TypeUnit {
    pub id: TypeUnitId,
    /// Simple name; `$1`, `$2`, ... for anonymous units.
    pub name: String,
    /// Package plus enclosing chain, e.g. `test.Test6.A`.
    pub path: String,
    pub kind: UnitKind,
    pub modifiers: Modifiers,
    pub type_params: Vec<String>,
    pub enclosing: Option<TypeUnitId>,
    /// Top-level, declared static, an interface, or nested in an interface.
    pub is_static: bool,
    /// Instances carry a reference to an instance of `enclosing`.
    pub has_enclosing_instance: bool,
    pub extends: Option<TypeRef>,
    pub implements: Vec<TypeRef>,
    /// Supertypes that are units of this table.
    pub supertypes: Vec<TypeUnitId>,
    /// Superclass outside the table, if any.
    pub external_superclass: Option<String>,
    pub members: Vec<MemberId>,
    pub nested: Vec<TypeUnitId>,
    pub anonymous: Option<AnonymousOrigin>,
    pub span: Span,
}

impl TypeUnit {
    #[inline]
    pub fn is_interface(&self) -> bool {
        self.kind == UnitKind::Interface
    }

    #[inline]
    pub fn is_anonymous(&self) -> bool {
        self.kind == UnitKind::Anonymous
    }

    /// Path of the enclosing namespace (`test.Test5` for `test.Test5.C`).
    pub fn namespace(&self) -> &str {
        self.path
            .rsplit_once('.')
            .map_or("", |(namespace, _)| namespace)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MemberKind {
    Field,
    Method,
    Constructor,
    Initializer,
}

/// Declaration a member was built from.
#[derive(Clone, Debug)]
pub enum MemberSource {
    Field(FieldDecl),
    Method(MethodDecl),
    Constructor(ConstructorDecl),
    Initializer(InitializerDecl),
}

pub const CONSTRUCTOR_NAME: &str = "<init>";
pub const STATIC_INITIALIZER_NAME: &str = "<clinit>";
pub const INSTANCE_INITIALIZER_NAME: &str = "<instinit>";

#[derive(Clone, Debug)]
pub struct Member {
    pub id: MemberId,
    pub owner: TypeUnitId,
    pub name: String,
    pub kind: MemberKind,
    pub is_static: bool,
    pub visibility: Visibility,
    /// Position among the owner's members.
    pub index: u32,
    pub source: MemberSource,
    pub span: Span,
}

impl Member {
    pub fn params(&self) -> &[Param] {
        match &self.source {
            MemberSource::Method(method) => &method.params,
            MemberSource::Constructor(ctor) => &ctor.params,
            MemberSource::Field(_) | MemberSource::Initializer(_) => &[],
        }
    }

    pub fn is_varargs(&self) -> bool {
        self.params().last().is_some_and(|param| param.varargs)
    }

    pub fn field_type(&self) -> Option<&TypeRef> {
        match &self.source {
            MemberSource::Field(field) => Some(&field.ty),
            _ => None,
        }
    }

    pub fn return_type(&self) -> Option<&TypeRef> {
        match &self.source {
            MemberSource::Method(method) => Some(&method.return_type),
            _ => None,
        }
    }

    /// Method-level type parameters.
    pub fn type_params(&self) -> &[String] {
        match &self.source {
            MemberSource::Method(method) => &method.type_params,
            _ => &[],
        }
    }
}

/// Every type unit and member of one compilation unit.
#[derive(Clone, Debug, Default)]
pub struct SymbolTable {
    pub file_name: String,
    pub package: Option<String>,
    pub imports: Vec<Import>,
    pub units: Vec<TypeUnit>,
    pub members: Vec<Member>,
    /// Top-level units in declaration order.
    pub roots: Vec<TypeUnitId>,
    pub(crate) by_path: FxHashMap<String, TypeUnitId>,
    pub(crate) anonymous_sites: FxHashMap<AnonymousSite, TypeUnitId>,
}

impl SymbolTable {
    /// Unit for an id handed out by this table.
    #[inline]
    pub fn unit(&self, id: TypeUnitId) -> &TypeUnit {
        &self.units[id.index()]
    }

    #[inline]
    pub fn member(&self, id: MemberId) -> &Member {
        &self.members[id.index()]
    }

    pub fn lookup(&self, path: &str) -> Option<TypeUnitId> {
        self.by_path.get(path).copied()
    }

    pub fn anonymous_unit(&self, site: AnonymousSite) -> Option<TypeUnitId> {
        self.anonymous_sites.get(&site).copied()
    }

    pub fn unit_ids(&self) -> impl Iterator<Item = TypeUnitId> + '_ {
        self.units.iter().map(|unit| unit.id)
    }

    pub fn members_of(&self, unit: TypeUnitId) -> impl Iterator<Item = &Member> + '_ {
        self.unit(unit).members.iter().map(|&id| self.member(id))
    }

    /// Path of the unit owning `member`.
    pub fn owner_path(&self, member: MemberId) -> &str {
        &self.unit(self.member(member).owner).path
    }

    /// `unit` followed by its enclosing units, innermost first.
    pub fn enclosing_chain(&self, unit: TypeUnitId) -> impl Iterator<Item = TypeUnitId> + '_ {
        std::iter::successors(Some(unit), move |&id| self.unit(id).enclosing)
    }

    /// Named nested type `name` declared directly in `unit`.
    pub fn nested_named(&self, unit: TypeUnitId, name: &str) -> Option<TypeUnitId> {
        self.unit(unit)
            .nested
            .iter()
            .copied()
            .find(|&id| !self.unit(id).is_anonymous() && self.unit(id).name == name)
    }

    /// `unit` and its supertypes in the table, breadth first, each once.
    pub fn hierarchy(&self, unit: TypeUnitId) -> Vec<TypeUnitId> {
        let mut order = vec![unit];
        let mut seen = FxHashSet::default();
        seen.insert(unit);
        let mut level_start = 0;
        for _ in 0..MAX_SUPERTYPE_DEPTH {
            let level_end = order.len();
            if level_start == level_end {
                break;
            }
            for i in level_start..level_end {
                for &sup in &self.unit(order[i]).supertypes {
                    if seen.insert(sup) {
                        order.push(sup);
                    }
                }
            }
            level_start = level_end;
        }
        order
    }

    /// Member type `name` of `unit`, including member types of its supertypes.
    pub fn member_type(&self, unit: TypeUnitId, name: &str) -> Option<TypeUnitId> {
        self.hierarchy(unit)
            .into_iter()
            .find_map(|id| self.nested_named(id, name))
    }

    /// Field `name` declared in `unit` or inherited from a supertype in the
    /// table, with the requested static-ness.
    pub fn find_field(&self, unit: TypeUnitId, name: &str, is_static: bool) -> Option<MemberId> {
        self.find_member(unit, name, MemberKind::Field, is_static)
    }

    /// First method named `name` (any arity) in `unit` or its supertypes.
    pub fn find_method(&self, unit: TypeUnitId, name: &str, is_static: bool) -> Option<MemberId> {
        self.find_member(unit, name, MemberKind::Method, is_static)
    }

    fn find_member(
        &self,
        unit: TypeUnitId,
        name: &str,
        kind: MemberKind,
        is_static: bool,
    ) -> Option<MemberId> {
        self.hierarchy(unit).into_iter().find_map(|id| {
            self.members_of(id)
                .find(|m| m.kind == kind && m.is_static == is_static && m.name == name)
                .map(|m| m.id)
        })
    }

    /// Paths of every proper supertype of `unit`: supertypes in the table,
    /// breadth first, then their superclasses outside the table.
    pub fn supertype_paths(&self, unit: TypeUnitId) -> Vec<String> {
        let hierarchy = self.hierarchy(unit);
        let external = hierarchy
            .iter()
            .filter_map(|&id| self.unit(id).external_superclass.clone());
        hierarchy
            .iter()
            .skip(1)
            .map(|&id| self.unit(id).path.clone())
            .chain(external)
            .collect()
    }

    /// True when instances of `unit` are instances of `target`.
    pub fn is_subtype_of(&self, unit: TypeUnitId, target: TypeUnitId) -> bool {
        self.hierarchy(unit).contains(&target)
    }

    /// Pre-order position of every unit: roots in declaration order, each
    /// followed by its nested units.
    pub fn declaration_order(&self) -> Vec<TypeUnitId> {
        let mut order = Vec::with_capacity(self.units.len());
        let mut stack: Vec<TypeUnitId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.unit(id).nested.iter().rev().copied());
        }
        order
    }
}
