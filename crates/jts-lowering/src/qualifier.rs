//! Reference qualification.
//!
//! Every bare name in an initializer or body is rewritten to an access with
//! an explicit receiver, using the binding the resolver picks:
//!
//! | binding                      | rewritten to                          |
//! |------------------------------|---------------------------------------|
//! | local / parameter            | `Local`                               |
//! | instance field               | `this.name`                           |
//! | enclosing-instance field     | `OuterThis(hops).name`                |
//! | captured creating-scope local| `CapturedLocal`                       |
//! | static field                 | `TypePath(owner).name`                |
//! | static import                | `TypePath(imported owner).name`       |
//!
//! Unqualified calls get the same receivers, `Outer.this` becomes
//! `OuterThis`, `new` of a unit of the table becomes `NewUnit`, and type
//! references get their fully qualified path. Qualified forms are left as
//! they are, so qualifying twice yields the same tree.
//!
//! Besides the rewritten members, qualification reports which capture slots
//! the rewritten code reads (`CaptureRequest`) and where units are
//! instantiated (`CreationSite`); the flattener turns these into slots.

use crate::program::{LoweredMember, LoweredParam};
use jts_ast::{
    Block, CaptureArg, CatchClause, Expr, LambdaBody, LambdaParam, Param, Stmt, SwitchCase,
    TypeRef,
};
use jts_binder::type_lookup::{TypeLookup, TypeTarget};
use jts_binder::{
    AnonymousSite, Binding, BindingKind, ExecContext, LocalBinding, Member, MemberSource,
    MethodTarget, Resolver, ScopeArena, ScopeKind, SymbolTable, TypeUnitId,
};
use jts_common::limits::MAX_BODY_DEPTH;
use jts_common::{LoweringError, LoweringOptions, LoweringResult, Span};
use rayon::prelude::*;
use tracing::{debug, trace};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// The unit needs a slot for its enclosing instance.
    EnclosingInstance,
    /// The anonymous unit needs a slot for creating-scope local `emitted`.
    Local { emitted: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CaptureRequest {
    pub unit: TypeUnitId,
    pub kind: RequestKind,
}

/// Instantiation of a unit that may need its enclosing instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreationSite {
    pub creator: TypeUnitId,
    pub target: TypeUnitId,
    /// Enclosing-instance depth of the implicit outer instance, relative to
    /// `creator`. `None` when the source passed one explicitly.
    pub implicit_outer_depth: Option<u32>,
}

/// Qualified members of one unit plus what they need from the flattener.
#[derive(Clone, Debug)]
pub struct QualifiedUnit {
    pub unit: TypeUnitId,
    pub members: Vec<LoweredMember>,
    pub dispatch: Vec<crate::overloads::DispatchEntry>,
    pub requests: Vec<CaptureRequest>,
    pub creation_sites: Vec<CreationSite>,
}

pub struct Qualifier<'a> {
    table: &'a SymbolTable,
    options: &'a LoweringOptions,
    resolver: Resolver<'a>,
    lookup: TypeLookup<'a>,
}

impl<'a> Qualifier<'a> {
    pub fn new(table: &'a SymbolTable, options: &'a LoweringOptions) -> Self {
        Self {
            table,
            options,
            resolver: Resolver::new(table, options),
            lookup: TypeLookup::new(table, options),
        }
    }

    /// Qualify every unit of the table, in table order.
    ///
    /// Units do not depend on each other here, so with `parallel` set they
    /// are qualified on the rayon pool; the result is the same either way.
    #[tracing::instrument(level = "debug", skip_all, fields(units = self.table.units.len()))]
    pub fn qualify_all(&self) -> LoweringResult<Vec<QualifiedUnit>> {
        let ids: Vec<TypeUnitId> = self.table.unit_ids().collect();
        let results: Vec<LoweringResult<QualifiedUnit>> = if self.options.parallel {
            ids.par_iter().map(|&id| self.qualify_unit(id)).collect()
        } else {
            ids.iter().map(|&id| self.qualify_unit(id)).collect()
        };
        results.into_iter().collect()
    }

    pub fn qualify_unit(&self, unit: TypeUnitId) -> LoweringResult<QualifiedUnit> {
        let mut qualified = QualifiedUnit {
            unit,
            members: Vec::new(),
            dispatch: Vec::new(),
            requests: Vec::new(),
            creation_sites: Vec::new(),
        };
        for member in self.table.members_of(unit) {
            let mut body = BodyQualifier::new(self, ExecContext {
                unit,
                is_static: member.is_static,
                member: Some(member.id),
            });
            body.type_params = member.type_params().to_vec();
            let lowered = body.member(member)?;
            qualified.members.push(lowered);
            qualified.requests.append(&mut body.requests);
            qualified.creation_sites.append(&mut body.creation_sites);
        }
        debug!(
            unit = %self.table.unit(unit).path,
            requests = qualified.requests.len(),
            creation_sites = qualified.creation_sites.len(),
            "qualified unit"
        );
        Ok(qualified)
    }

    /// Qualify a standalone expression in `ctx` with the given locals in scope.
    pub fn qualify_expr(
        &self,
        ctx: ExecContext,
        locals: &[LocalBinding],
        expr: &Expr,
    ) -> LoweringResult<Expr> {
        let mut body = BodyQualifier::new(self, ctx);
        body.scopes.enter(ScopeKind::Member);
        for local in locals {
            body.scopes.declare(local.clone());
        }
        body.expr(expr)
    }

    /// Qualify a block in `ctx` with `params` in scope.
    pub fn qualify_block(
        &self,
        ctx: ExecContext,
        params: &[LoweredParam],
        block: &Block,
    ) -> LoweringResult<Block> {
        let mut body = BodyQualifier::new(self, ctx);
        body.scopes.enter(ScopeKind::Member);
        for param in params {
            body.scopes.declare(LocalBinding {
                name: param.name.clone(),
                emitted: param.name.clone(),
                ty: param.ty.clone(),
            });
        }
        body.block(block)
    }
}

/// Qualification state for one member body.
struct BodyQualifier<'q, 'a> {
    q: &'q Qualifier<'a>,
    ctx: ExecContext,
    scopes: ScopeArena,
    type_params: Vec<String>,
    /// Anonymous classes met so far, in the order the builder numbered them.
    ordinal: u32,
    depth: u32,
    requests: Vec<CaptureRequest>,
    creation_sites: Vec<CreationSite>,
}

impl<'q, 'a> BodyQualifier<'q, 'a> {
    fn new(q: &'q Qualifier<'a>, ctx: ExecContext) -> Self {
        Self {
            q,
            ctx,
            scopes: ScopeArena::new(),
            type_params: Vec::new(),
            ordinal: 0,
            depth: 0,
            requests: Vec::new(),
            creation_sites: Vec::new(),
        }
    }

    fn unit_path(&self) -> &'a str {
        &self.q.table.unit(self.ctx.unit).path
    }

    fn member_name(&self) -> Option<String> {
        self.ctx
            .member
            .map(|id| self.q.table.member(id).name.clone())
    }

    fn unresolved(&self, name: &str, span: Span) -> LoweringError {
        LoweringError::UnresolvedIdentifier {
            unit: self.unit_path().to_string(),
            member: self.member_name(),
            name: name.to_string(),
            span,
        }
    }

    // =========================================================================
    // Members
    // =========================================================================

    fn member(&mut self, member: &Member) -> LoweringResult<LoweredMember> {
        let in_interface = self.q.table.unit(member.owner).is_interface();
        let mut lowered = LoweredMember {
            id: member.id,
            name: member.name.clone(),
            source_name: member.name.clone(),
            kind: member.kind,
            is_static: member.is_static,
            is_abstract: false,
            visibility: member.visibility,
            ty: None,
            params: Vec::new(),
            return_type: None,
            init: None,
            body: None,
            init_order: None,
            span: member.span,
        };

        self.scopes.enter(ScopeKind::Member);
        match &member.source {
            MemberSource::Field(field) => {
                lowered.ty = Some(self.ty(&field.ty));
                lowered.init = field.init.as_ref().map(|e| self.expr(e)).transpose()?;
            }
            MemberSource::Method(method) => {
                lowered.params = self.params(&method.params);
                lowered.return_type = Some(self.ty(&method.return_type));
                lowered.is_abstract = method.modifiers.is_abstract()
                    || (in_interface && method.body.is_none() && !method.modifiers.is_static());
                lowered.body = method.body.as_ref().map(|b| self.block(b)).transpose()?;
            }
            MemberSource::Constructor(ctor) => {
                lowered.params = self.params(&ctor.params);
                lowered.body = Some(self.block(&ctor.body)?);
            }
            MemberSource::Initializer(init) => {
                lowered.body = Some(self.block(&init.body)?);
            }
        }
        self.scopes.exit();
        Ok(lowered)
    }

    fn params(&mut self, params: &[Param]) -> Vec<LoweredParam> {
        params
            .iter()
            .map(|param| {
                let ty = self.ty(&param.ty);
                let emitted = self.declare(&param.name, if param.varargs {
                    TypeRef::array(ty.clone())
                } else {
                    ty.clone()
                });
                LoweredParam {
                    name: emitted,
                    ty,
                    varargs: param.varargs,
                }
            })
            .collect()
    }

    /// Declare a local in the current scope; returns its emitted name.
    fn declare(&mut self, name: &str, ty: TypeRef) -> String {
        let emitted = self.q.options.escape_identifier(name).into_owned();
        self.scopes.declare(LocalBinding {
            name: name.to_string(),
            emitted: emitted.clone(),
            ty,
        });
        emitted
    }

    // =========================================================================
    // Types
    // =========================================================================

    fn ty(&self, ty: &TypeRef) -> TypeRef {
        resolve_type_ref(
            &self.q.lookup,
            self.q.table,
            Some(self.ctx.unit),
            &self.type_params,
            ty,
        )
    }

    fn resolve_type_name(&self, name: &str) -> Option<TypeTarget> {
        self.q
            .lookup
            .resolve(Some(self.ctx.unit), &self.type_params, name)
    }

    // =========================================================================
    // Statements
    // =========================================================================

    fn block(&mut self, block: &Block) -> LoweringResult<Block> {
        self.scopes.enter(ScopeKind::Block);
        let stmts = block
            .stmts
            .iter()
            .map(|stmt| self.stmt(stmt))
            .collect::<LoweringResult<Vec<_>>>();
        self.scopes.exit();
        Ok(Block {
            stmts: stmts?,
            span: block.span,
        })
    }

    fn boxed_stmt(&mut self, stmt: &Stmt) -> LoweringResult<Box<Stmt>> {
        self.stmt(stmt).map(Box::new)
    }

    fn opt_expr(&mut self, expr: Option<&Expr>) -> LoweringResult<Option<Expr>> {
        expr.map(|e| self.expr(e)).transpose()
    }

    fn exprs(&mut self, exprs: &[Expr]) -> LoweringResult<Vec<Expr>> {
        exprs.iter().map(|e| self.expr(e)).collect()
    }

    fn stmt(&mut self, stmt: &Stmt) -> LoweringResult<Stmt> {
        Ok(match stmt {
            Stmt::Block(block) => Stmt::Block(self.block(block)?),
            Stmt::LocalVar {
                name,
                ty,
                init,
                span,
            } => {
                let init = self.opt_expr(init.as_ref())?;
                let ty = self.ty(ty);
                let emitted = self.declare(name, ty.clone());
                Stmt::LocalVar {
                    name: emitted,
                    ty,
                    init,
                    span: *span,
                }
            }
            Stmt::Expr { expr } => Stmt::Expr {
                expr: self.expr(expr)?,
            },
            Stmt::Return { value } => Stmt::Return {
                value: self.opt_expr(value.as_ref())?,
            },
            Stmt::If { cond, then, els } => Stmt::If {
                cond: self.expr(cond)?,
                then: self.boxed_stmt(then)?,
                els: els.as_deref().map(|s| self.boxed_stmt(s)).transpose()?,
            },
            Stmt::While { cond, body } => Stmt::While {
                cond: self.expr(cond)?,
                body: self.boxed_stmt(body)?,
            },
            Stmt::DoWhile { body, cond } => {
                let body = self.boxed_stmt(body)?;
                Stmt::DoWhile {
                    body,
                    cond: self.expr(cond)?,
                }
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => {
                self.scopes.enter(ScopeKind::Block);
                let result = (|| {
                    let init = init
                        .iter()
                        .map(|s| self.stmt(s))
                        .collect::<LoweringResult<Vec<_>>>()?;
                    let cond = self.opt_expr(cond.as_ref())?;
                    let update = self.exprs(update)?;
                    let body = self.boxed_stmt(body)?;
                    Ok(Stmt::For {
                        init,
                        cond,
                        update,
                        body,
                    })
                })();
                self.scopes.exit();
                result?
            }
            Stmt::ForEach {
                name,
                ty,
                iterable,
                body,
            } => {
                let iterable = self.expr(iterable)?;
                let ty = self.ty(ty);
                self.scopes.enter(ScopeKind::Block);
                let emitted = self.declare(name, ty.clone());
                let body = self.boxed_stmt(body);
                self.scopes.exit();
                Stmt::ForEach {
                    name: emitted,
                    ty,
                    iterable,
                    body: body?,
                }
            }
            Stmt::Throw { value } => Stmt::Throw {
                value: self.expr(value)?,
            },
            Stmt::Try {
                body,
                catches,
                finally,
            } => {
                let body = self.block(body)?;
                let mut lowered = Vec::with_capacity(catches.len());
                for clause in catches {
                    let types: Vec<TypeRef> = clause.types.iter().map(|t| self.ty(t)).collect();
                    self.scopes.enter(ScopeKind::Block);
                    let emitted = self.declare(
                        &clause.name,
                        types.first().cloned().unwrap_or(TypeRef::Void),
                    );
                    let clause_body = self.block(&clause.body);
                    self.scopes.exit();
                    lowered.push(CatchClause {
                        name: emitted,
                        types,
                        body: clause_body?,
                    });
                }
                let finally = finally.as_ref().map(|b| self.block(b)).transpose()?;
                Stmt::Try {
                    body,
                    catches: lowered,
                    finally,
                }
            }
            Stmt::ExplicitCtorCall {
                is_this,
                args,
                span,
            } => Stmt::ExplicitCtorCall {
                is_this: *is_this,
                args: self.exprs(args)?,
                span: *span,
            },
            Stmt::Synchronized { lock, body, .. } => {
                // The target has no monitors: keep the lock's side effects only.
                let lock = self.expr(lock)?;
                let mut block = self.block(body)?;
                if !lock.is_pure_receiver() {
                    block.stmts.insert(0, Stmt::Expr { expr: lock });
                }
                Stmt::Block(block)
            }
            Stmt::Switch {
                selector,
                cases,
                span,
            } => {
                let selector = self.expr(selector)?;
                self.scopes.enter(ScopeKind::Block);
                let cases = self.switch_cases(cases);
                self.scopes.exit();
                Stmt::Switch {
                    selector,
                    cases: cases?,
                    span: *span,
                }
            }
            Stmt::Labeled { label, body } => Stmt::Labeled {
                label: label.clone(),
                body: self.boxed_stmt(body)?,
            },
            Stmt::Assert {
                check,
                message,
                span,
            } => Stmt::Assert {
                check: self.expr(check)?,
                message: self.opt_expr(message.as_ref())?,
                span: *span,
            },
            Stmt::Break { .. } | Stmt::Continue { .. } | Stmt::Empty => stmt.clone(),
        })
    }

    fn switch_cases(&mut self, cases: &[SwitchCase]) -> LoweringResult<Vec<SwitchCase>> {
        cases
            .iter()
            .map(|case| {
                Ok(SwitchCase {
                    label: self.opt_expr(case.label.as_ref())?,
                    body: case
                        .body
                        .iter()
                        .map(|stmt| self.stmt(stmt))
                        .collect::<LoweringResult<Vec<_>>>()?,
                })
            })
            .collect()
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    fn expr(&mut self, expr: &Expr) -> LoweringResult<Expr> {
        self.depth += 1;
        let result = if self.depth > MAX_BODY_DEPTH {
            Err(LoweringError::Unsupported {
                unit: self.unit_path().to_string(),
                reason: "expression nesting is too deep".to_string(),
                span: expr.span(),
            })
        } else {
            self.expr_inner(expr)
        };
        self.depth -= 1;
        result
    }

    fn boxed(&mut self, expr: &Expr) -> LoweringResult<Box<Expr>> {
        self.expr(expr).map(Box::new)
    }

    fn expr_inner(&mut self, expr: &Expr) -> LoweringResult<Expr> {
        Ok(match expr {
            Expr::Name { .. } => self.dotted(expr)?,
            Expr::FieldAccess { target, name, span } => {
                if target.dotted_name().is_some() {
                    self.dotted(expr)?
                } else {
                    Expr::FieldAccess {
                        target: self.boxed(target)?,
                        name: name.clone(),
                        span: *span,
                    }
                }
            }
            Expr::MethodCall {
                target,
                name,
                args,
                span,
            } => {
                let target = match target {
                    Some(target) if target.dotted_name().is_some() => self.dotted(target)?,
                    Some(target) => self.expr(target)?,
                    None => self.method_receiver(name, *span)?,
                };
                Expr::MethodCall {
                    target: Some(Box::new(target)),
                    name: name.clone(),
                    args: self.exprs(args)?,
                    span: *span,
                }
            }
            Expr::New {
                ty,
                args,
                outer,
                body,
                span,
            } => self.new_expr(ty, args, outer.as_deref(), body.is_some(), *span)?,
            Expr::This {
                qualifier: Some(qualifier),
                span,
            } => self.qualified_this(qualifier, *span)?,
            Expr::Assign { op, target, value } => Expr::Assign {
                op: op.clone(),
                target: self.boxed(target)?,
                value: self.boxed(value)?,
            },
            Expr::Binary { op, left, right } => Expr::Binary {
                op: op.clone(),
                left: self.boxed(left)?,
                right: self.boxed(right)?,
            },
            Expr::Unary {
                op,
                operand,
                postfix,
            } => Expr::Unary {
                op: op.clone(),
                operand: self.boxed(operand)?,
                postfix: *postfix,
            },
            Expr::Conditional { cond, then, els } => Expr::Conditional {
                cond: self.boxed(cond)?,
                then: self.boxed(then)?,
                els: self.boxed(els)?,
            },
            Expr::Cast { ty, expr } => Expr::Cast {
                ty: self.ty(ty),
                expr: self.boxed(expr)?,
            },
            Expr::InstanceOf { expr, ty } => Expr::InstanceOf {
                expr: self.boxed(expr)?,
                ty: self.ty(ty),
            },
            Expr::ArrayAccess { array, index } => Expr::ArrayAccess {
                array: self.boxed(array)?,
                index: self.boxed(index)?,
            },
            Expr::ArrayNew {
                element,
                dims,
                init,
            } => Expr::ArrayNew {
                element: self.ty(element),
                dims: self.exprs(dims)?,
                init: init.as_deref().map(|i| self.exprs(i)).transpose()?,
            },
            Expr::ArrayInit { elements } => Expr::ArrayInit {
                elements: self.exprs(elements)?,
            },
            Expr::Lambda { params, body, span } => self.lambda(params, body, *span)?,
            Expr::MethodReference { target, name, span } => Expr::MethodReference {
                target: Box::new(self.receiver(target)?),
                name: name.clone(),
                span: *span,
            },
            Expr::ClassLiteral { ty } => Expr::ClassLiteral { ty: self.ty(ty) },
            Expr::NewUnit {
                path,
                args,
                outer,
                captures,
                anonymous,
                span,
            } => Expr::NewUnit {
                path: path.clone(),
                outer: outer.as_deref().map(|o| self.boxed(o)).transpose()?,
                args: self.exprs(args)?,
                captures: captures
                    .iter()
                    .map(|capture| {
                        Ok(CaptureArg {
                            slot: capture.slot.clone(),
                            value: self.expr(&capture.value)?,
                        })
                    })
                    .collect::<LoweringResult<Vec<_>>>()?,
                anonymous: *anonymous,
                span: *span,
            },
            Expr::Literal { .. }
            | Expr::This { qualifier: None, .. }
            | Expr::Super { .. }
            | Expr::Local { .. }
            | Expr::OuterThis { .. }
            | Expr::CapturedLocal { .. }
            | Expr::TypePath { .. } => expr.clone(),
        })
    }

    /// Qualify a chain of bare names (`a`, `a.b.c`).
    ///
    /// The first segment is tried as a variable, then as a type, then as the
    /// start of a package-qualified type, and last as a member inherited from
    /// an external superclass. Segments after a type that name its member
    /// types extend the type path; the remaining ones are field accesses.
    fn dotted(&mut self, expr: &Expr) -> LoweringResult<Expr> {
        let mut segments: Vec<(&str, Span)> = Vec::new();
        collect_segments(expr, &mut segments);
        let Some(&(first, first_span)) = segments.first() else {
            return Ok(expr.clone());
        };

        let names: Vec<&str> = segments.iter().map(|(name, _)| *name).collect();
        let mut rest = 1;
        let mut receiver = if let Some(binding) =
            self.q.resolver.resolve(self.ctx, &self.scopes, first)
        {
            self.binding_expr(&binding, first_span)
        } else if let Some(target) = self.resolve_type_name(first) {
            self.type_receiver(target, &segments, &mut rest, first, first_span)?
        } else if let Some((target, consumed)) = self.q.lookup.package_prefix(&names) {
            rest = consumed;
            self.type_receiver(target, &segments, &mut rest, first, first_span)?
        } else if let Some(binding) = self.q.resolver.resolve_external_inherited(self.ctx, first) {
            self.binding_expr(&binding, first_span)
        } else {
            return Err(self.unresolved(first, first_span));
        };

        for &(name, span) in &segments[rest..] {
            receiver = Expr::FieldAccess {
                target: Box::new(receiver),
                name: name.to_string(),
                span,
            };
        }
        Ok(receiver)
    }

    /// `TypePath` for a resolved type, extended by following segments that
    /// name member types.
    fn type_receiver(
        &self,
        target: TypeTarget,
        segments: &[(&str, Span)],
        rest: &mut usize,
        first: &str,
        span: Span,
    ) -> LoweringResult<Expr> {
        let mut target = target;
        while let Some(&(name, _)) = segments.get(*rest) {
            match self.q.lookup.nested(&target, name) {
                Some(nested) => {
                    target = nested;
                    *rest += 1;
                }
                None => break,
            }
        }
        let path = target
            .path(self.q.table)
            .ok_or_else(|| self.unresolved(first, span))?;
        Ok(Expr::TypePath { path })
    }

    fn request_hops(&mut self, depth: u32) {
        for unit in self.q.resolver.hop_units(self.ctx.unit, depth) {
            self.requests.push(CaptureRequest {
                unit,
                kind: RequestKind::EnclosingInstance,
            });
        }
    }

    fn outer_this(&mut self, depth: u32) -> Expr {
        self.request_hops(depth);
        Expr::OuterThis {
            hops: self.q.resolver.hops(self.ctx.unit, depth),
        }
    }

    fn binding_expr(&mut self, binding: &Binding, span: Span) -> Expr {
        trace!(name = %binding.name, kind = ?binding.kind, "qualify reference");
        let field_on = |target: Expr| Expr::FieldAccess {
            target: Box::new(target),
            name: binding.emitted.clone(),
            span,
        };
        match &binding.kind {
            BindingKind::Local => Expr::Local {
                name: binding.emitted.clone(),
            },
            BindingKind::InstanceField { .. } => field_on(Expr::this()),
            BindingKind::EnclosingInstanceField { depth, .. } => {
                let outer = self.outer_this(*depth);
                field_on(outer)
            }
            BindingKind::CapturedLocal { depth, unit } => {
                self.request_hops(*depth);
                self.requests.push(CaptureRequest {
                    unit: *unit,
                    kind: RequestKind::Local {
                        emitted: binding.emitted.clone(),
                    },
                });
                Expr::CapturedLocal {
                    name: binding.emitted.clone(),
                    hops: self.q.resolver.hops(self.ctx.unit, *depth),
                    slot: None,
                }
            }
            BindingKind::StaticField { owner } => field_on(Expr::TypePath {
                path: self.q.table.unit(*owner).path.clone(),
            }),
            BindingKind::ImportedSymbol { path } => match path.rsplit_once('.') {
                Some((owner, name)) => Expr::FieldAccess {
                    target: Box::new(Expr::TypePath {
                        path: owner.to_string(),
                    }),
                    name: name.to_string(),
                    span,
                },
                None => Expr::Local { name: path.clone() },
            },
        }
    }

    fn method_receiver(&mut self, name: &str, span: Span) -> LoweringResult<Expr> {
        let target = self
            .q
            .resolver
            .resolve_method(self.ctx, name)
            .or_else(|| self.q.resolver.resolve_external_method(self.ctx, name))
            .ok_or_else(|| self.unresolved(name, span))?;
        trace!(name, ?target, "qualify call");
        Ok(match target {
            MethodTarget::Instance => Expr::this(),
            MethodTarget::EnclosingInstance { depth } => self.outer_this(depth),
            MethodTarget::Static { owner } => Expr::TypePath {
                path: self.q.table.unit(owner).path.clone(),
            },
            MethodTarget::Imported { path } => Expr::TypePath {
                path: path
                    .rsplit_once('.')
                    .map_or(path.as_str(), |(owner, _)| owner)
                    .to_string(),
            },
        })
    }

    fn qualified_this(&mut self, qualifier: &str, span: Span) -> LoweringResult<Expr> {
        let Some(TypeTarget::Unit(target)) = self.resolve_type_name(qualifier) else {
            return Err(self.unresolved(qualifier, span));
        };
        match self.q.resolver.instance_depth(self.ctx, target) {
            Some(0) => Ok(Expr::this().at(span)),
            Some(depth) => Ok(self.outer_this(depth)),
            None => Err(LoweringError::NoEnclosingInstance {
                unit: self.unit_path().to_string(),
                target: self.q.table.unit(target).path.clone(),
                span,
            }),
        }
    }

    fn new_expr(
        &mut self,
        ty: &TypeRef,
        args: &[Expr],
        outer: Option<&Expr>,
        anonymous: bool,
        span: Span,
    ) -> LoweringResult<Expr> {
        if anonymous {
            return self.new_anonymous(args, outer, span);
        }

        let ty = self.ty(ty);
        let target = match &ty {
            TypeRef::Named { name, .. } => self.resolve_type_name(name).and_then(|t| t.unit()),
            _ => None,
        };
        let Some(target) = target else {
            // Types outside the compilation unit keep a plain `new`.
            let outer = outer.map(|o| self.boxed(o)).transpose()?;
            return Ok(Expr::New {
                ty,
                args: self.exprs(args)?,
                outer,
                body: None,
                span,
            });
        };

        let unit = self.q.table.unit(target);
        let path = unit.path.clone();
        let outer = match (outer, unit.has_enclosing_instance, unit.enclosing) {
            (Some(explicit), _, _) => {
                let explicit = self.receiver(explicit)?;
                if unit.has_enclosing_instance {
                    self.creation_sites.push(CreationSite {
                        creator: self.ctx.unit,
                        target,
                        implicit_outer_depth: None,
                    });
                }
                Some(Box::new(explicit))
            }
            (None, true, Some(enclosing)) => {
                let depth = self
                    .q
                    .resolver
                    .instance_depth(self.ctx, enclosing)
                    .ok_or_else(|| LoweringError::NoEnclosingInstance {
                        unit: self.unit_path().to_string(),
                        target: self.q.table.unit(enclosing).path.clone(),
                        span,
                    })?;
                self.creation_sites.push(CreationSite {
                    creator: self.ctx.unit,
                    target,
                    implicit_outer_depth: Some(depth),
                });
                // Hops are only requested once the flattener knows the
                // target keeps its enclosing instance.
                Some(Box::new(if depth == 0 {
                    Expr::this()
                } else {
                    Expr::OuterThis {
                        hops: self.q.resolver.hops(self.ctx.unit, depth),
                    }
                }))
            }
            (None, _, _) => None,
        };

        Ok(Expr::NewUnit {
            path,
            args: self.exprs(args)?,
            outer,
            captures: Vec::new(),
            anonymous: false,
            span,
        })
    }

    fn new_anonymous(
        &mut self,
        args: &[Expr],
        outer: Option<&Expr>,
        span: Span,
    ) -> LoweringResult<Expr> {
        let ordinal = self.ordinal;
        self.ordinal += 1;
        let target = self.ctx.member.and_then(|member| {
            self.q
                .table
                .anonymous_unit(AnonymousSite { member, ordinal })
        });
        let Some(target) = target else {
            return Err(LoweringError::Unsupported {
                unit: self.unit_path().to_string(),
                reason: "anonymous class outside of a member".to_string(),
                span,
            });
        };

        // An explicit outer instance belongs to the base class, which the
        // anonymous unit does not model; evaluate it for its side effects.
        let explicit_outer = outer.map(|o| self.receiver(o)).transpose()?;
        let outer = if self.q.table.unit(target).has_enclosing_instance {
            self.creation_sites.push(CreationSite {
                creator: self.ctx.unit,
                target,
                implicit_outer_depth: Some(0),
            });
            Some(Box::new(Expr::this()))
        } else {
            None
        };
        let mut args = self.exprs(args)?;
        if let Some(explicit) = explicit_outer.filter(|e| !e.is_pure_receiver()) {
            args.insert(0, explicit);
        }

        Ok(Expr::NewUnit {
            path: self.q.table.unit(target).path.clone(),
            args,
            outer,
            captures: Vec::new(),
            anonymous: true,
            span,
        })
    }

    /// Parameters open a new scope inside the current one; `this` and the
    /// enclosing locals stay those of the surrounding body.
    fn lambda(
        &mut self,
        params: &[LambdaParam],
        body: &LambdaBody,
        span: Span,
    ) -> LoweringResult<Expr> {
        self.scopes.enter(ScopeKind::Member);
        let params: Vec<LambdaParam> = params
            .iter()
            .map(|param| {
                let ty = param.ty.as_ref().map(|ty| self.ty(ty));
                let declared = ty.clone().unwrap_or_else(|| param.declared_type());
                LambdaParam {
                    name: self.declare(&param.name, declared),
                    ty,
                }
            })
            .collect();
        let body = match body {
            LambdaBody::Expr(expr) => self.boxed(expr).map(LambdaBody::Expr),
            LambdaBody::Block(block) => self.block(block).map(LambdaBody::Block),
        };
        self.scopes.exit();
        Ok(Expr::Lambda {
            params,
            body: body?,
            span,
        })
    }

    /// Receiver expression: bare-name chains may denote types.
    fn receiver(&mut self, expr: &Expr) -> LoweringResult<Expr> {
        if expr.dotted_name().is_some() {
            self.dotted(expr)
        } else {
            self.expr(expr)
        }
    }
}

/// `ty` with `resolved` filled in on every named type `lookup` can resolve
/// from `context`. Existing resolutions are kept.
pub fn resolve_type_ref(
    lookup: &TypeLookup<'_>,
    table: &SymbolTable,
    context: Option<TypeUnitId>,
    type_params: &[String],
    ty: &TypeRef,
) -> TypeRef {
    match ty {
        TypeRef::Named {
            name,
            args,
            resolved,
        } => TypeRef::Named {
            name: name.clone(),
            args: args
                .iter()
                .map(|arg| resolve_type_ref(lookup, table, context, type_params, arg))
                .collect(),
            resolved: resolved.clone().or_else(|| {
                lookup
                    .resolve(context, type_params, name)
                    .and_then(|target| target.path(table))
            }),
        },
        TypeRef::Array { element } => {
            TypeRef::array(resolve_type_ref(lookup, table, context, type_params, element))
        }
        TypeRef::Void | TypeRef::Primitive { .. } => ty.clone(),
    }
}

/// Names and spans of a bare-name chain, leftmost first.
fn collect_segments<'e>(expr: &'e Expr, out: &mut Vec<(&'e str, Span)>) {
    match expr {
        Expr::Name { name, span } => out.push((name, *span)),
        Expr::FieldAccess { target, name, span } => {
            collect_segments(target, out);
            out.push((name, *span));
        }
        _ => {}
    }
}
