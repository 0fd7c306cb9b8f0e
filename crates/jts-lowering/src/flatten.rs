//! Nested-type flattening.
//!
//! Every unit, nested and anonymous ones included, becomes a standalone
//! `LoweredUnit` named by its full path. A unit that reads its enclosing
//! instance (directly or on the way to an outer one) gets a capture slot for
//! it; an anonymous unit gets one more slot per creating-scope local it reads.
//! Slots are set at construction, so every `NewUnit` of such a unit receives
//! one capture argument per slot.
//!
//! Slot need is settled before any slot is created: creating `new Inner()`
//! from a unit that reaches the implicit outer instance through `k` hops makes
//! those hops live, but only when `Inner` itself keeps its enclosing
//! instance. That is a fixpoint over the recorded creation sites.

use crate::program::{CaptureKind, CaptureSlot, CaptureSlotId, LoweredUnit};
use crate::qualifier::{CreationSite, QualifiedUnit, RequestKind, resolve_type_ref};
use fixedbitset::FixedBitSet;
use indexmap::IndexSet;
use jts_ast::{Block, CaptureArg, CaptureHop, Expr, LambdaBody, Stmt, TypeRef};
use jts_binder::type_lookup::TypeLookup;
use jts_binder::{MemberKind, Resolver, SymbolTable, TypeUnitId};
use jts_common::{LoweringOptions, LoweringResult};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

/// Slot names chosen for each unit.
#[derive(Default)]
struct SlotNames {
    enclosing: FxHashMap<TypeUnitId, String>,
    /// `(unit, emitted local)` -> slot name.
    locals: FxHashMap<(TypeUnitId, String), String>,
    /// Local slots of each unit in slot order, as `(emitted local, slot name)`.
    local_order: FxHashMap<TypeUnitId, Vec<(String, String)>>,
}

pub struct Flattener<'a> {
    table: &'a SymbolTable,
    options: &'a LoweringOptions,
    resolver: Resolver<'a>,
    lookup: TypeLookup<'a>,
}

impl<'a> Flattener<'a> {
    pub fn new(table: &'a SymbolTable, options: &'a LoweringOptions) -> Self {
        Self {
            table,
            options,
            resolver: Resolver::new(table, options),
            lookup: TypeLookup::new(table, options),
        }
    }

    /// Lift every qualified unit and create the capture slots its code needs.
    ///
    /// Units come back in declaration pre-order, with the slot arena.
    #[tracing::instrument(level = "debug", skip_all, fields(units = qualified.len()))]
    pub fn flatten(
        &self,
        qualified: Vec<QualifiedUnit>,
    ) -> LoweringResult<(Vec<LoweredUnit>, Vec<CaptureSlot>)> {
        let (needs_enclosing, local_requests) = self.slot_needs(&qualified);

        let mut slots = Vec::new();
        let mut names = SlotNames::default();
        let order = self.table.declaration_order();
        for &id in &order {
            self.create_slots(id, &needs_enclosing, &local_requests, &mut slots, &mut names);
        }

        let mut by_unit: FxHashMap<TypeUnitId, QualifiedUnit> =
            qualified.into_iter().map(|q| (q.unit, q)).collect();
        let mut units = Vec::with_capacity(order.len());
        for id in order {
            let Some(mut q) = by_unit.remove(&id) else {
                continue;
            };
            let mut filler = SlotFiller {
                table: self.table,
                names: &names,
                unit: id,
            };
            for member in &mut q.members {
                if let Some(init) = &mut member.init {
                    filler.expr(init);
                }
                if let Some(body) = &mut member.body {
                    filler.block(body);
                }
            }
            units.push(self.lowered_unit(id, q, &slots));
        }
        Ok((units, slots))
    }

    /// Which units need their enclosing-instance slot, and which creating-scope
    /// locals each anonymous unit reads.
    fn slot_needs(
        &self,
        qualified: &[QualifiedUnit],
    ) -> (FixedBitSet, FxHashMap<TypeUnitId, FxHashSet<String>>) {
        let mut needs = FixedBitSet::with_capacity(self.table.units.len());
        let mut locals: FxHashMap<TypeUnitId, FxHashSet<String>> = FxHashMap::default();

        for request in qualified.iter().flat_map(|q| &q.requests) {
            match &request.kind {
                RequestKind::EnclosingInstance => {
                    if self.table.unit(request.unit).has_enclosing_instance {
                        needs.insert(request.unit.index());
                    }
                }
                RequestKind::Local { emitted } => {
                    locals
                        .entry(request.unit)
                        .or_default()
                        .insert(emitted.clone());
                }
            }
        }

        let deferred: Vec<(&CreationSite, u32)> = qualified
            .iter()
            .flat_map(|q| &q.creation_sites)
            .filter_map(|site| match site.implicit_outer_depth {
                Some(depth) if depth > 0 => Some((site, depth)),
                _ => None,
            })
            .collect();
        let mut changed = true;
        while changed {
            changed = false;
            for &(site, depth) in &deferred {
                if !needs.contains(site.target.index()) {
                    continue;
                }
                for unit in self.resolver.hop_units(site.creator, depth) {
                    if !needs.put(unit.index()) {
                        trace!(unit = %self.table.unit(unit).path, "enclosing slot needed by creation site");
                        changed = true;
                    }
                }
            }
        }

        (needs, locals)
    }

    fn create_slots(
        &self,
        id: TypeUnitId,
        needs_enclosing: &FixedBitSet,
        local_requests: &FxHashMap<TypeUnitId, FxHashSet<String>>,
        slots: &mut Vec<CaptureSlot>,
        names: &mut SlotNames,
    ) {
        let unit = self.table.unit(id);
        let mut taken: FxHashSet<String> = self
            .table
            .members_of(id)
            .filter(|m| matches!(m.kind, MemberKind::Field | MemberKind::Method))
            .map(|m| m.name.clone())
            .collect();
        let mut add = |name: String, kind: CaptureKind, slots: &mut Vec<CaptureSlot>| {
            let name = unique_name(&mut taken, name);
            slots.push(CaptureSlot {
                id: CaptureSlotId(slots.len() as u32),
                owner: unit.path.clone(),
                name: name.clone(),
                kind,
            });
            name
        };

        if let Some(enclosing) = unit.enclosing.filter(|_| needs_enclosing.contains(id.index())) {
            let base = if unit.is_anonymous() {
                self.options.anonymous_capture_name.clone()
            } else {
                format!(
                    "{}{}",
                    self.table.unit(enclosing).name,
                    self.options.capture_suffix
                )
            };
            let target = self.table.unit(enclosing).path.clone();
            let name = add(base, CaptureKind::EnclosingInstance { target }, slots);
            debug!(unit = %unit.path, slot = %name, "enclosing-instance slot");
            names.enclosing.insert(id, name);
        }

        let (Some(origin), Some(requested)) = (&unit.anonymous, local_requests.get(&id)) else {
            return;
        };
        let mut seen = IndexSet::new();
        for local in &origin.creation_locals {
            if !requested.contains(&local.emitted) || !seen.insert(local.emitted.clone()) {
                continue;
            }
            let base = format!("{}{}", self.options.local_capture_prefix, local.emitted);
            let name = add(
                base,
                CaptureKind::Local {
                    local: local.name.clone(),
                    emitted: local.emitted.clone(),
                    ty: resolve_type_ref(&self.lookup, self.table, unit.enclosing, &[], &local.ty),
                },
                slots,
            );
            debug!(unit = %unit.path, slot = %name, "captured-local slot");
            names
                .locals
                .insert((id, local.emitted.clone()), name.clone());
            names
                .local_order
                .entry(id)
                .or_default()
                .push((local.emitted.clone(), name));
        }
    }

    fn lowered_unit(&self, id: TypeUnitId, q: QualifiedUnit, slots: &[CaptureSlot]) -> LoweredUnit {
        let unit = self.table.unit(id);
        let resolve = |ty: &TypeRef| {
            resolve_type_ref(&self.lookup, self.table, unit.enclosing, &unit.type_params, ty)
        };

        let (extends, implements) = match &unit.anonymous {
            Some(origin) if origin.base_is_interface => (None, vec![resolve(&origin.base)]),
            Some(origin) => (Some(resolve(&origin.base)), Vec::new()),
            None => (
                unit.extends.as_ref().map(resolve),
                unit.implements.iter().map(resolve).collect(),
            ),
        };

        LoweredUnit {
            path: unit.path.clone(),
            name: unit.name.clone(),
            namespace: unit.namespace().to_string(),
            kind: unit.kind,
            is_static: unit.is_static,
            enclosing: unit.enclosing.map(|e| self.table.unit(e).path.clone()),
            extends,
            implements,
            capture_slots: slots
                .iter()
                .filter(|slot| slot.owner == unit.path)
                .map(|slot| slot.id)
                .collect(),
            members: q.members,
            dispatch: q.dispatch,
            span: unit.span,
        }
    }
}

/// `base`, or `base_1`, `base_2`, ... when taken.
fn unique_name(taken: &mut FxHashSet<String>, base: String) -> String {
    let mut name = base.clone();
    let mut suffix = 1;
    while taken.contains(&name) {
        name = format!("{base}_{suffix}");
        suffix += 1;
    }
    taken.insert(name.clone());
    name
}

/// Fills slot names into hops and captured locals, and capture arguments
/// into creation sites, for the bodies of one unit.
struct SlotFiller<'f> {
    table: &'f SymbolTable,
    names: &'f SlotNames,
    unit: TypeUnitId,
}

impl SlotFiller<'_> {
    fn hops(&self, hops: &mut [CaptureHop]) {
        for hop in hops {
            hop.slot = self
                .table
                .lookup(&hop.from)
                .and_then(|from| self.names.enclosing.get(&from))
                .cloned();
        }
    }

    fn block(&mut self, block: &mut Block) {
        for stmt in &mut block.stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Block(block) => self.block(block),
            Stmt::LocalVar { init, .. } => {
                if let Some(init) = init {
                    self.expr(init);
                }
            }
            Stmt::Expr { expr } | Stmt::Throw { value: expr } => self.expr(expr),
            Stmt::Return { value } => {
                if let Some(value) = value {
                    self.expr(value);
                }
            }
            Stmt::If { cond, then, els } => {
                self.expr(cond);
                self.stmt(then);
                if let Some(els) = els {
                    self.stmt(els);
                }
            }
            Stmt::While { cond, body } | Stmt::DoWhile { body, cond } => {
                self.expr(cond);
                self.stmt(body);
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                for stmt in init {
                    self.stmt(stmt);
                }
                if let Some(cond) = cond {
                    self.expr(cond);
                }
                for expr in update {
                    self.expr(expr);
                }
                self.stmt(body);
            }
            Stmt::ForEach { iterable, body, .. } => {
                self.expr(iterable);
                self.stmt(body);
            }
            Stmt::Try {
                body,
                catches,
                finally,
            } => {
                self.block(body);
                for clause in catches {
                    self.block(&mut clause.body);
                }
                if let Some(finally) = finally {
                    self.block(finally);
                }
            }
            Stmt::ExplicitCtorCall { args, .. } => {
                for arg in args {
                    self.expr(arg);
                }
            }
            Stmt::Synchronized { lock, body, .. } => {
                self.expr(lock);
                self.block(body);
            }
            Stmt::Switch {
                selector, cases, ..
            } => {
                self.expr(selector);
                for case in cases {
                    if let Some(label) = &mut case.label {
                        self.expr(label);
                    }
                    for stmt in &mut case.body {
                        self.stmt(stmt);
                    }
                }
            }
            Stmt::Labeled { body, .. } => self.stmt(body),
            Stmt::Assert { check, message, .. } => {
                self.expr(check);
                if let Some(message) = message {
                    self.expr(message);
                }
            }
            Stmt::Break { .. } | Stmt::Continue { .. } | Stmt::Empty => {}
        }
    }

    fn exprs(&mut self, exprs: &mut [Expr]) {
        for expr in exprs {
            self.expr(expr);
        }
    }

    fn expr(&mut self, expr: &mut Expr) {
        match expr {
            Expr::OuterThis { hops } => self.hops(hops),
            Expr::CapturedLocal { name, hops, slot } => {
                self.hops(hops);
                let holder = hops
                    .last()
                    .and_then(|hop| self.table.lookup(&hop.to))
                    .unwrap_or(self.unit);
                *slot = self.names.locals.get(&(holder, name.clone())).cloned();
            }
            Expr::NewUnit {
                path,
                args,
                outer,
                captures,
                ..
            } => {
                if let Some(value) = outer.as_deref_mut() {
                    self.expr(value);
                }
                self.exprs(args);
                self.exprs_of(captures);
                let Some(target) = self.table.lookup(path) else {
                    return;
                };
                if let Some(slot) = self.names.enclosing.get(&target) {
                    if let Some(value) = outer.take() {
                        captures.push(CaptureArg {
                            slot: slot.clone(),
                            value: *value,
                        });
                    }
                } else if outer.as_deref().is_some_and(Expr::is_pure_receiver) {
                    *outer = None;
                }
                for (emitted, slot) in self.names.local_order.get(&target).into_iter().flatten() {
                    if captures.iter().any(|c| &c.slot == slot) {
                        continue;
                    }
                    captures.push(CaptureArg {
                        slot: slot.clone(),
                        value: Expr::Local {
                            name: emitted.clone(),
                        },
                    });
                }
            }
            Expr::FieldAccess { target, .. } => self.expr(target),
            Expr::MethodCall { target, args, .. } => {
                if let Some(target) = target {
                    self.expr(target);
                }
                self.exprs(args);
            }
            Expr::New { args, outer, .. } => {
                if let Some(outer) = outer {
                    self.expr(outer);
                }
                self.exprs(args);
            }
            Expr::Assign { target, value, .. } => {
                self.expr(target);
                self.expr(value);
            }
            Expr::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            Expr::Unary { operand, .. } => self.expr(operand),
            Expr::Conditional { cond, then, els } => {
                self.expr(cond);
                self.expr(then);
                self.expr(els);
            }
            Expr::Cast { expr, .. } | Expr::InstanceOf { expr, .. } => self.expr(expr),
            Expr::ArrayAccess { array, index } => {
                self.expr(array);
                self.expr(index);
            }
            Expr::ArrayNew { dims, init, .. } => {
                self.exprs(dims);
                if let Some(init) = init {
                    self.exprs(init);
                }
            }
            Expr::ArrayInit { elements } => self.exprs(elements),
            Expr::Lambda { body, .. } => match body {
                LambdaBody::Expr(expr) => self.expr(expr),
                LambdaBody::Block(block) => self.block(block),
            },
            Expr::MethodReference { target, .. } => self.expr(target),
            Expr::Literal { .. }
            | Expr::ClassLiteral { .. }
            | Expr::Name { .. }
            | Expr::This { .. }
            | Expr::Super { .. }
            | Expr::Local { .. }
            | Expr::TypePath { .. } => {}
        }
    }

    fn exprs_of(&mut self, captures: &mut [CaptureArg]) {
        for capture in captures {
            self.expr(&mut capture.value);
        }
    }
}
