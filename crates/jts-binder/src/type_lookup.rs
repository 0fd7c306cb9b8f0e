//! Type-name resolution.
//!
//! A simple name is looked up in this order:
//!
//! 1. type parameters of the method and of the enclosing units,
//! 2. member types along the enclosing chain (innermost first, inherited
//!    member types included), then the enclosing units themselves,
//! 3. single-type imports,
//! 4. top-level types of the compilation unit,
//! 5. asterisk imports, matched against the table and `externalTypes`,
//! 6. ambient `java.lang` types.
//!
//! Dotted names resolve their first segment this way and walk nested types
//! from there; failing that, the longest known package prefix is tried.

use crate::symbols::{SymbolTable, TypeUnitId};
use jts_common::LoweringOptions;
use tracing::trace;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeTarget {
    Unit(TypeUnitId),
    /// Fully qualified type the engine has no declaration for.
    External(String),
    TypeParam,
}

impl TypeTarget {
    /// Fully qualified path, `None` for type parameters.
    pub fn path(&self, table: &SymbolTable) -> Option<String> {
        match self {
            Self::Unit(id) => Some(table.unit(*id).path.clone()),
            Self::External(path) => Some(path.clone()),
            Self::TypeParam => None,
        }
    }

    pub fn unit(&self) -> Option<TypeUnitId> {
        match self {
            Self::Unit(id) => Some(*id),
            _ => None,
        }
    }
}

pub struct TypeLookup<'a> {
    table: &'a SymbolTable,
    options: &'a LoweringOptions,
}

impl<'a> TypeLookup<'a> {
    pub fn new(table: &'a SymbolTable, options: &'a LoweringOptions) -> Self {
        Self { table, options }
    }

    /// Resolve `name` as written inside `context` (or at top level).
    pub fn resolve(
        &self,
        context: Option<TypeUnitId>,
        type_params: &[String],
        name: &str,
    ) -> Option<TypeTarget> {
        let mut segments = name.split('.');
        let first = segments.next()?;
        let rest: Vec<&str> = segments.collect();

        let target = match self.resolve_simple(context, type_params, first) {
            Some(target) => self.walk_nested(target, &rest),
            None if rest.is_empty() => None,
            None => self.resolve_qualified(name),
        };
        trace!(name, ?target, "resolve type");
        target
    }

    fn resolve_simple(
        &self,
        context: Option<TypeUnitId>,
        type_params: &[String],
        name: &str,
    ) -> Option<TypeTarget> {
        if type_params.iter().any(|p| p == name) {
            return Some(TypeTarget::TypeParam);
        }

        if let Some(context) = context {
            for id in self.table.enclosing_chain(context) {
                let unit = self.table.unit(id);
                if unit.type_params.iter().any(|p| p == name) {
                    return Some(TypeTarget::TypeParam);
                }
                if let Some(member) = self.table.member_type(id, name) {
                    return Some(TypeTarget::Unit(member));
                }
                if !unit.is_anonymous() && unit.name == name {
                    return Some(TypeTarget::Unit(id));
                }
            }
        }

        for import in &self.table.imports {
            if import.is_static || import.is_asterisk || import.simple_name() != name {
                continue;
            }
            return Some(match self.table.lookup(&import.path) {
                Some(id) => TypeTarget::Unit(id),
                None => TypeTarget::External(import.path.clone()),
            });
        }

        if let Some(&root) = self
            .table
            .roots
            .iter()
            .find(|&&id| self.table.unit(id).name == name)
        {
            return Some(TypeTarget::Unit(root));
        }

        for import in &self.table.imports {
            if import.is_static || !import.is_asterisk {
                continue;
            }
            let candidate = format!("{}.{name}", import.path);
            if let Some(id) = self.table.lookup(&candidate) {
                return Some(TypeTarget::Unit(id));
            }
            if self.options.is_external_type(&candidate) {
                return Some(TypeTarget::External(candidate));
            }
        }

        self.options
            .ambient_type_path(name)
            .map(TypeTarget::External)
    }

    fn walk_nested(&self, mut target: TypeTarget, rest: &[&str]) -> Option<TypeTarget> {
        for segment in rest {
            target = match target {
                TypeTarget::Unit(id) => TypeTarget::Unit(self.table.member_type(id, segment)?),
                TypeTarget::External(path) => TypeTarget::External(format!("{path}.{segment}")),
                TypeTarget::TypeParam => return None,
            };
        }
        Some(target)
    }

    /// `pkg.Type.Nested` style names: shortest prefix naming a known type.
    fn resolve_qualified(&self, name: &str) -> Option<TypeTarget> {
        let segments: Vec<&str> = name.split('.').collect();
        if let Some((target, consumed)) = self.package_prefix(&segments) {
            return match target {
                TypeTarget::External(_) => Some(TypeTarget::External(name.to_string())),
                target => self.walk_nested(target, &segments[consumed..]),
            };
        }
        // Fully qualified names of library types (`java.util.List`).
        segments
            .first()
            .is_some_and(|first| first.starts_with(|c: char| c.is_ascii_lowercase()))
            .then(|| TypeTarget::External(name.to_string()))
    }

    /// Shortest prefix of `segments` that is the full path of a unit of the
    /// table or of a configured external type, with the number of segments
    /// it spans.
    pub fn package_prefix(&self, segments: &[&str]) -> Option<(TypeTarget, usize)> {
        (1..=segments.len()).find_map(|split| {
            let prefix = segments[..split].join(".");
            if let Some(id) = self.table.lookup(&prefix) {
                Some((TypeTarget::Unit(id), split))
            } else if self.options.is_external_type(&prefix) {
                Some((TypeTarget::External(prefix), split))
            } else {
                None
            }
        })
    }

    /// Member type `name` of a resolved type.
    pub fn nested(&self, target: &TypeTarget, name: &str) -> Option<TypeTarget> {
        match target {
            TypeTarget::Unit(id) => self.table.member_type(*id, name).map(TypeTarget::Unit),
            _ => None,
        }
    }
}

/// Resolve `name` inside `context` with a throwaway `TypeLookup`.
pub fn resolve_type(
    table: &SymbolTable,
    options: &LoweringOptions,
    context: Option<TypeUnitId>,
    type_params: &[String],
    name: &str,
) -> Option<TypeTarget> {
    TypeLookup::new(table, options).resolve(context, type_params, name)
}
