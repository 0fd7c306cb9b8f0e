//! Scope-chain resolution.
//!
//! For an executable context (a member body or field initializer of one type
//! unit), a name is looked up along an ordered chain of binding sites:
//!
//! 1. locals and parameters (`Local`),
//! 2. instance fields of the unit and its supertypes (`InstanceField`),
//! 3. for anonymous units, locals of the creating scope (`CapturedLocal`),
//! 4. steps 2 and 3 for each enclosing instance, nearest first
//!    (`EnclosingInstanceField`, `CapturedLocal` with depth),
//! 5. static fields of the unit and of every enclosing unit (`StaticField`),
//! 6. static imports (`ImportedSymbol`).
//!
//! Static contexts skip steps 2-4. A static nested unit cuts the instance
//! chain: enclosing units past it only contribute statics.

use crate::scope::ScopeArena;
use crate::symbols::{MemberId, SymbolTable, TypeUnitId};
use jts_ast::{CaptureHop, TypeRef};
use jts_common::LoweringOptions;
use jts_common::limits::MAX_ENCLOSING_DEPTH;
use smallvec::SmallVec;
use tracing::trace;

/// Where a body executes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExecContext {
    pub unit: TypeUnitId,
    /// Static method, static initializer or static field initializer.
    pub is_static: bool,
    pub member: Option<MemberId>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindingKind {
    Local,
    /// Field of `this`; `owner` is the unit of the context.
    InstanceField { owner: TypeUnitId },
    /// Local of the creating scope of anonymous unit `unit`, `depth` enclosing
    /// hops away from the context.
    CapturedLocal { depth: u32, unit: TypeUnitId },
    /// Field of the enclosing instance `depth` hops away; `owner` is the unit
    /// of that instance.
    EnclosingInstanceField { depth: u32, owner: TypeUnitId },
    /// Static field declared by `owner`.
    StaticField { owner: TypeUnitId },
    /// Statically imported member, by full path.
    ImportedSymbol { path: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    /// Output name; differs from `name` for escaped locals.
    pub emitted: String,
    pub kind: BindingKind,
    pub ty: Option<TypeRef>,
}

/// Receiver of an unqualified method call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MethodTarget {
    Instance,
    EnclosingInstance { depth: u32 },
    Static { owner: TypeUnitId },
    Imported { path: String },
}

#[derive(Clone, Copy, Debug)]
struct Level {
    unit: TypeUnitId,
    depth: u32,
    has_instance: bool,
}

pub struct Resolver<'a> {
    table: &'a SymbolTable,
    options: &'a LoweringOptions,
}

impl<'a> Resolver<'a> {
    pub fn new(table: &'a SymbolTable, options: &'a LoweringOptions) -> Self {
        Self { table, options }
    }

    pub fn table(&self) -> &'a SymbolTable {
        self.table
    }

    /// The context's unit and its enclosing units, with the enclosing-instance
    /// depth of each and whether an instance of it is reachable.
    fn levels(&self, ctx: ExecContext) -> SmallVec<[Level; 4]> {
        let mut levels = SmallVec::new();
        let mut has_instance = !ctx.is_static;
        let mut current = Some(ctx.unit);
        let mut depth = 0;
        while let Some(id) = current {
            if depth > MAX_ENCLOSING_DEPTH {
                break;
            }
            levels.push(Level {
                unit: id,
                depth,
                has_instance,
            });
            let unit = self.table.unit(id);
            has_instance = has_instance && unit.has_enclosing_instance;
            current = unit.enclosing;
            depth += 1;
        }
        levels
    }

    /// Every binding of `name` visible in `ctx`, highest priority first.
    pub fn chain(&self, ctx: ExecContext, scopes: &ScopeArena, name: &str) -> Vec<Binding> {
        let mut chain = Vec::new();

        if let Some(local) = scopes.lookup(name) {
            chain.push(Binding {
                name: local.name.clone(),
                emitted: local.emitted.clone(),
                kind: BindingKind::Local,
                ty: Some(local.ty.clone()),
            });
        }

        let levels = self.levels(ctx);
        for level in levels.iter().filter(|level| level.has_instance) {
            if let Some(field) = self.table.find_field(level.unit, name, false) {
                let kind = if level.depth == 0 {
                    BindingKind::InstanceField { owner: level.unit }
                } else {
                    BindingKind::EnclosingInstanceField {
                        depth: level.depth,
                        owner: level.unit,
                    }
                };
                chain.push(self.field_binding(field, kind));
            }
            let captured = self
                .table
                .unit(level.unit)
                .anonymous
                .as_ref()
                .and_then(|origin| origin.creation_locals.iter().rev().find(|l| l.name == name));
            if let Some(local) = captured {
                chain.push(Binding {
                    name: local.name.clone(),
                    emitted: local.emitted.clone(),
                    kind: BindingKind::CapturedLocal {
                        depth: level.depth,
                        unit: level.unit,
                    },
                    ty: Some(local.ty.clone()),
                });
            }
        }

        for level in &levels {
            if let Some(field) = self.table.find_field(level.unit, name, true) {
                let owner = self.table.member(field).owner;
                chain.push(self.field_binding(field, BindingKind::StaticField { owner }));
            }
        }

        if let Some(path) = self.static_import(name, true) {
            chain.push(Binding {
                name: name.to_string(),
                emitted: name.to_string(),
                kind: BindingKind::ImportedSymbol { path },
                ty: None,
            });
        }

        trace!(name, candidates = chain.len(), "binding chain");
        chain
    }

    /// Highest-priority binding of `name`, if any.
    pub fn resolve(&self, ctx: ExecContext, scopes: &ScopeArena, name: &str) -> Option<Binding> {
        self.chain(ctx, scopes, name).into_iter().next()
    }

    fn field_binding(&self, field: MemberId, kind: BindingKind) -> Binding {
        let member = self.table.member(field);
        Binding {
            name: member.name.clone(),
            emitted: member.name.clone(),
            kind,
            ty: member.field_type().cloned(),
        }
    }

    /// Receiver for an unqualified call of method `name`, with the same
    /// priority as fields.
    pub fn resolve_method(&self, ctx: ExecContext, name: &str) -> Option<MethodTarget> {
        let levels = self.levels(ctx);
        for level in levels.iter().filter(|level| level.has_instance) {
            if self.table.find_method(level.unit, name, false).is_some() {
                return Some(if level.depth == 0 {
                    MethodTarget::Instance
                } else {
                    MethodTarget::EnclosingInstance { depth: level.depth }
                });
            }
        }
        for level in &levels {
            if let Some(method) = self.table.find_method(level.unit, name, true) {
                return Some(MethodTarget::Static {
                    owner: self.table.member(method).owner,
                });
            }
        }
        self.static_import(name, false)
            .map(|path| MethodTarget::Imported { path })
    }

    /// Full path of a statically imported field (or method) `name`.
    fn static_import(&self, name: &str, field: bool) -> Option<String> {
        for import in self.table.imports.iter().filter(|i| i.is_static) {
            if !import.is_asterisk {
                if import.simple_name() == name {
                    return Some(import.path.clone());
                }
                continue;
            }
            let Some(owner) = self.table.lookup(&import.path) else {
                continue;
            };
            let found = if field {
                self.table.find_field(owner, name, true).is_some()
            } else {
                self.table.find_method(owner, name, true).is_some()
            };
            if found {
                return Some(format!("{}.{name}", import.path));
            }
        }
        None
    }

    /// Binding for a name nothing in the table declares, attributed to the
    /// nearest unit that extends a class outside the table.
    ///
    /// Only consulted when `assumeExternalMembers` is on.
    pub fn resolve_external_inherited(&self, ctx: ExecContext, name: &str) -> Option<Binding> {
        if !self.options.assume_external_members {
            return None;
        }
        self.levels(ctx).into_iter().find_map(|level| {
            let unit = self.table.unit(level.unit);
            let superclass = unit.external_superclass.as_ref()?;
            let kind = match (level.has_instance, level.depth) {
                (true, 0) => BindingKind::InstanceField { owner: level.unit },
                (true, depth) => BindingKind::EnclosingInstanceField {
                    depth,
                    owner: level.unit,
                },
                (false, _) => BindingKind::ImportedSymbol {
                    path: format!("{superclass}.{name}"),
                },
            };
            trace!(name, superclass = %superclass, "assuming inherited external member");
            Some(Binding {
                name: name.to_string(),
                emitted: name.to_string(),
                kind,
                ty: None,
            })
        })
    }

    /// Method counterpart of [`Self::resolve_external_inherited`].
    pub fn resolve_external_method(&self, ctx: ExecContext, name: &str) -> Option<MethodTarget> {
        self.resolve_external_inherited(ctx, name)
            .map(|binding| match binding.kind {
                BindingKind::EnclosingInstanceField { depth, .. } => {
                    MethodTarget::EnclosingInstance { depth }
                }
                BindingKind::ImportedSymbol { path } => MethodTarget::Imported { path },
                _ => MethodTarget::Instance,
            })
    }

    /// Enclosing-instance depth at which an instance of `target` is reachable
    /// from `ctx` (`0` for `this`).
    pub fn instance_depth(&self, ctx: ExecContext, target: TypeUnitId) -> Option<u32> {
        self.levels(ctx)
            .into_iter()
            .filter(|level| level.has_instance)
            .find(|level| self.table.is_subtype_of(level.unit, target))
            .map(|level| level.depth)
    }

    /// The `depth` hops from `unit` outwards, slots left unassigned.
    pub fn hops(&self, unit: TypeUnitId, depth: u32) -> Vec<CaptureHop> {
        let chain: Vec<TypeUnitId> = self
            .table
            .enclosing_chain(unit)
            .take(depth as usize + 1)
            .collect();
        chain
            .windows(2)
            .map(|pair| CaptureHop {
                from: self.table.unit(pair[0]).path.clone(),
                to: self.table.unit(pair[1]).path.clone(),
                slot: None,
            })
            .collect()
    }

    /// Units passed through by `depth` hops from `unit`: the unit itself and
    /// the next `depth - 1` enclosing units. Each needs a slot for its
    /// enclosing instance.
    pub fn hop_units(&self, unit: TypeUnitId, depth: u32) -> Vec<TypeUnitId> {
        self.table
            .enclosing_chain(unit)
            .take(depth as usize)
            .collect()
    }

    /// Unit reached after `depth` hops from `unit`.
    pub fn unit_at_depth(&self, unit: TypeUnitId, depth: u32) -> Option<TypeUnitId> {
        self.table.enclosing_chain(unit).nth(depth as usize)
    }
}
