//! Symbol table construction.
//!
//! One walk over the compilation unit registers every named type, nested
//! type and member. Anonymous class bodies are discovered while member bodies
//! are walked; each becomes an `Anonymous` unit nested in the unit that owns
//! the creating member, keyed by its `AnonymousSite`. A second pass resolves
//! declared supertypes to table ids.

use crate::scope::LocalBinding;
use crate::symbols::{
    AnonymousOrigin, AnonymousSite, CONSTRUCTOR_NAME, INSTANCE_INITIALIZER_NAME, Member,
    MemberId, MemberKind, MemberSource, STATIC_INITIALIZER_NAME, SymbolTable, TypeUnit,
    TypeUnitId, UnitKind,
};
use crate::type_lookup::{TypeLookup, TypeTarget};
use jts_ast::visit::{Visitor, walk_block, walk_expr};
use jts_ast::{
    Block, CompilationUnit, DeclKind, Expr, MemberDecl, Modifiers, Param, Stmt, TypeDecl, TypeRef,
    Visibility,
};
use jts_common::limits::MAX_ENCLOSING_DEPTH;
use jts_common::{LoweringError, LoweringOptions, LoweringResult, Span};
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

pub struct SymbolTableBuilder<'a> {
    options: &'a LoweringOptions,
    table: SymbolTable,
    /// Next anonymous class number per enclosing unit.
    anonymous_counters: FxHashMap<TypeUnitId, u32>,
}

impl<'a> SymbolTableBuilder<'a> {
    pub fn new(options: &'a LoweringOptions) -> Self {
        Self {
            options,
            table: SymbolTable::default(),
            anonymous_counters: FxHashMap::default(),
        }
    }

    /// Register every type unit and member of `unit`.
    #[tracing::instrument(level = "debug", skip_all, fields(file = %unit.file_name))]
    pub fn build(mut self, unit: &CompilationUnit) -> LoweringResult<SymbolTable> {
        self.table.file_name = unit.file_name.clone();
        self.table.package = unit.package.clone().filter(|p| !p.is_empty());
        self.table.imports = unit.imports.clone();

        for decl in &unit.types {
            let id = self.register_type(decl, None, 0)?;
            self.table.roots.push(id);
        }
        self.resolve_supertypes();

        debug!(
            units = self.table.units.len(),
            members = self.table.members.len(),
            anonymous = self.table.anonymous_sites.len(),
            "symbol table built"
        );
        Ok(self.table)
    }

    fn child_path(&self, enclosing: Option<TypeUnitId>, name: &str) -> String {
        match (enclosing, &self.table.package) {
            (Some(enclosing), _) => format!("{}.{name}", self.table.unit(enclosing).path),
            (None, Some(package)) => format!("{package}.{name}"),
            (None, None) => name.to_string(),
        }
    }

    fn insert_unit(&mut self, unit: TypeUnit) -> LoweringResult<TypeUnitId> {
        if let Some(previous) = self.table.lookup(&unit.path) {
            return Err(LoweringError::DuplicateType {
                path: unit.path,
                span: unit.span,
                previous: self.table.unit(previous).span,
            });
        }
        let id = unit.id;
        trace!(path = %unit.path, kind = ?unit.kind, "register unit");
        self.table.by_path.insert(unit.path.clone(), id);
        if let Some(enclosing) = unit.enclosing {
            self.table.units[enclosing.index()].nested.push(id);
        }
        self.table.units.push(unit);
        Ok(id)
    }

    fn register_type(
        &mut self,
        decl: &TypeDecl,
        enclosing: Option<TypeUnitId>,
        depth: u32,
    ) -> LoweringResult<TypeUnitId> {
        let path = self.child_path(enclosing, &decl.name);
        if depth > MAX_ENCLOSING_DEPTH {
            return Err(LoweringError::Unsupported {
                unit: path,
                reason: "type nesting is too deep".to_string(),
                span: decl.span,
            });
        }

        let in_interface = enclosing.is_some_and(|e| self.table.unit(e).is_interface());
        let kind = match decl.kind {
            DeclKind::Class => UnitKind::Class,
            DeclKind::Interface => UnitKind::Interface,
        };
        let is_static = enclosing.is_none()
            || kind == UnitKind::Interface
            || in_interface
            || decl.modifiers.is_static();

        let id = self.insert_unit(TypeUnit {
            id: TypeUnitId(self.table.units.len() as u32),
            name: decl.name.clone(),
            path,
            kind,
            modifiers: decl.modifiers,
            type_params: decl.type_params.clone(),
            enclosing,
            is_static,
            has_enclosing_instance: !is_static,
            extends: decl.extends.clone(),
            implements: decl.implements.clone(),
            supertypes: Vec::new(),
            external_superclass: None,
            members: Vec::new(),
            nested: Vec::new(),
            anonymous: None,
            span: decl.span,
        })?;

        self.register_members(id, &decl.members, depth)?;
        Ok(id)
    }

    fn register_members(
        &mut self,
        owner: TypeUnitId,
        members: &[MemberDecl],
        depth: u32,
    ) -> LoweringResult<()> {
        for (index, decl) in members.iter().enumerate() {
            match decl {
                MemberDecl::Type(nested) => {
                    self.register_type(nested, Some(owner), depth + 1)?;
                }
                _ => {
                    if let Some(member) = self.register_member(owner, decl, index as u32) {
                        self.scan_anonymous(member, depth)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn register_member(
        &mut self,
        owner: TypeUnitId,
        decl: &MemberDecl,
        index: u32,
    ) -> Option<MemberId> {
        let in_interface = self.table.unit(owner).is_interface();
        let (name, kind, modifiers, source, span) = match decl {
            MemberDecl::Field(field) => (
                field.name.clone(),
                MemberKind::Field,
                field.modifiers,
                MemberSource::Field(field.clone()),
                field.span,
            ),
            MemberDecl::Method(method) => (
                method.name.clone(),
                MemberKind::Method,
                method.modifiers,
                MemberSource::Method(method.clone()),
                method.span,
            ),
            MemberDecl::Constructor(ctor) => (
                CONSTRUCTOR_NAME.to_string(),
                MemberKind::Constructor,
                ctor.modifiers,
                MemberSource::Constructor(ctor.clone()),
                ctor.span,
            ),
            MemberDecl::Initializer(init) => {
                let (name, modifiers) = if init.is_static {
                    (STATIC_INITIALIZER_NAME, Modifiers::STATIC)
                } else {
                    (INSTANCE_INITIALIZER_NAME, Modifiers::empty())
                };
                (
                    name.to_string(),
                    MemberKind::Initializer,
                    modifiers,
                    MemberSource::Initializer(init.clone()),
                    init.span,
                )
            }
            MemberDecl::Type(_) => return None,
        };

        // Interface fields are constants; interface members are public.
        let is_static = modifiers.is_static() || (in_interface && kind == MemberKind::Field);
        let visibility = if in_interface {
            Visibility::Public
        } else {
            modifiers.visibility()
        };

        let id = MemberId(self.table.members.len() as u32);
        self.table.members.push(Member {
            id,
            owner,
            name,
            kind,
            is_static,
            visibility,
            index,
            source,
            span,
        });
        self.table.units[owner.index()].members.push(id);
        Some(id)
    }

    /// Register the anonymous classes created inside `member`'s initializer or body.
    fn scan_anonymous(&mut self, member: MemberId, depth: u32) -> LoweringResult<()> {
        let source = self.table.member(member).source.clone();
        let mut scanner = AnonymousScanner {
            builder: self,
            member,
            depth,
            ordinal: 0,
            scopes: vec![Vec::new()],
            error: None,
        };
        match &source {
            MemberSource::Field(field) => {
                if let Some(init) = &field.init {
                    scanner.visit_expr(init);
                }
            }
            MemberSource::Method(method) => {
                scanner.declare_params(&method.params);
                if let Some(body) = &method.body {
                    scanner.visit_block(body);
                }
            }
            MemberSource::Constructor(ctor) => {
                scanner.declare_params(&ctor.params);
                scanner.visit_block(&ctor.body);
            }
            MemberSource::Initializer(init) => scanner.visit_block(&init.body),
        }
        scanner.error.map_or(Ok(()), Err)
    }

    fn register_anonymous(
        &mut self,
        site: AnonymousSite,
        base: &TypeRef,
        body: &[MemberDecl],
        creation_locals: Vec<LocalBinding>,
        span: Span,
        depth: u32,
    ) -> LoweringResult<TypeUnitId> {
        let creator = self.table.member(site.member);
        let owner = creator.owner;
        let in_static_context = creator.is_static;

        let counter = self.anonymous_counters.entry(owner).or_insert(0);
        *counter += 1;
        let name = format!("${counter}");
        let path = self.child_path(Some(owner), &name);
        if depth > MAX_ENCLOSING_DEPTH {
            return Err(LoweringError::Unsupported {
                unit: path,
                reason: "type nesting is too deep".to_string(),
                span,
            });
        }

        let id = self.insert_unit(TypeUnit {
            id: TypeUnitId(self.table.units.len() as u32),
            name,
            path,
            kind: UnitKind::Anonymous,
            modifiers: Modifiers::empty(),
            type_params: Vec::new(),
            enclosing: Some(owner),
            is_static: in_static_context,
            has_enclosing_instance: !in_static_context,
            extends: None,
            implements: Vec::new(),
            supertypes: Vec::new(),
            external_superclass: None,
            members: Vec::new(),
            nested: Vec::new(),
            anonymous: Some(AnonymousOrigin {
                site,
                base: base.clone(),
                base_is_interface: false,
                creation_locals,
            }),
            span,
        })?;
        self.table.anonymous_sites.insert(site, id);

        self.register_members(id, body, depth + 1)?;
        Ok(id)
    }

    /// Resolve `extends`/`implements` (and anonymous base types) to table
    /// units where possible.
    fn resolve_supertypes(&mut self) {
        let lookup = TypeLookup::new(&self.table, self.options);
        let mut resolved = Vec::with_capacity(self.table.units.len());

        for unit in &self.table.units {
            // Supertype names are resolved in the scope enclosing the declaration.
            let context = unit.enclosing;
            let resolve = |ty: &TypeRef| match ty {
                TypeRef::Named { name, .. } => lookup.resolve(context, &[], name),
                _ => None,
            };

            let mut supertypes = Vec::new();
            let mut external_superclass = None;
            let mut base_is_interface = false;

            if let Some(origin) = &unit.anonymous {
                match resolve(&origin.base) {
                    Some(TypeTarget::Unit(base)) => {
                        base_is_interface = self.table.unit(base).is_interface();
                        supertypes.push(base);
                    }
                    Some(TypeTarget::External(path)) => {
                        if self.options.is_external_interface(&path) {
                            base_is_interface = true;
                        } else {
                            external_superclass = Some(path);
                        }
                    }
                    Some(TypeTarget::TypeParam) | None => {}
                }
            }

            if let Some(extends) = &unit.extends {
                match resolve(extends) {
                    Some(TypeTarget::Unit(base)) => supertypes.push(base),
                    Some(TypeTarget::External(path)) => external_superclass = Some(path),
                    Some(TypeTarget::TypeParam) | None => {}
                }
            }
            for interface in &unit.implements {
                if let Some(TypeTarget::Unit(base)) = resolve(interface) {
                    supertypes.push(base);
                }
            }

            resolved.push((supertypes, external_superclass, base_is_interface));
        }

        for (unit, (supertypes, external_superclass, base_is_interface)) in
            self.table.units.iter_mut().zip(resolved)
        {
            unit.supertypes = supertypes;
            unit.external_superclass = external_superclass;
            if let Some(origin) = &mut unit.anonymous {
                origin.base_is_interface = base_is_interface;
            }
        }
    }
}

/// Walks one member's initializer or body, tracking locals in scope, and
/// registers each anonymous class it meets in pre-order.
struct AnonymousScanner<'b, 'a> {
    builder: &'b mut SymbolTableBuilder<'a>,
    member: MemberId,
    depth: u32,
    ordinal: u32,
    scopes: Vec<Vec<LocalBinding>>,
    error: Option<LoweringError>,
}

impl AnonymousScanner<'_, '_> {
    fn declare(&mut self, name: &str, ty: &TypeRef) {
        let binding = LocalBinding {
            name: name.to_string(),
            emitted: self.builder.options.escape_identifier(name).into_owned(),
            ty: ty.clone(),
        };
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(binding);
        }
    }

    fn declare_params(&mut self, params: &[Param]) {
        for param in params {
            let ty = if param.varargs {
                TypeRef::array(param.ty.clone())
            } else {
                param.ty.clone()
            };
            self.declare(&param.name, &ty);
        }
    }

    fn scoped(&mut self, f: impl FnOnce(&mut Self)) {
        self.scopes.push(Vec::new());
        f(self);
        self.scopes.pop();
    }
}

impl Visitor for AnonymousScanner<'_, '_> {
    fn visit_block(&mut self, block: &Block) {
        self.scoped(|this| walk_block(this, block));
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::LocalVar { name, ty, init, .. } => {
                if let Some(init) = init {
                    self.visit_expr(init);
                }
                self.declare(name, ty);
            }
            Stmt::For {
                init,
                cond,
                update,
                body,
            } => self.scoped(|this| {
                for stmt in init {
                    this.visit_stmt(stmt);
                }
                if let Some(cond) = cond {
                    this.visit_expr(cond);
                }
                for expr in update {
                    this.visit_expr(expr);
                }
                this.visit_stmt(body);
            }),
            Stmt::ForEach {
                name,
                ty,
                iterable,
                body,
            } => {
                self.visit_expr(iterable);
                self.scoped(|this| {
                    this.declare(name, ty);
                    this.visit_stmt(body);
                });
            }
            Stmt::Try {
                body,
                catches,
                finally,
            } => {
                self.visit_block(body);
                for clause in catches {
                    self.scoped(|this| {
                        if let Some(ty) = clause.types.first() {
                            this.declare(&clause.name, ty);
                        }
                        this.visit_block(&clause.body);
                    });
                }
                if let Some(finally) = finally {
                    self.visit_block(finally);
                }
            }
            Stmt::Switch {
                selector, cases, ..
            } => {
                self.visit_expr(selector);
                self.scoped(|this| {
                    for case in cases {
                        if let Some(label) = &case.label {
                            this.visit_expr(label);
                        }
                        for stmt in &case.body {
                            this.visit_stmt(stmt);
                        }
                    }
                });
            }
            _ => jts_ast::visit::walk_stmt(self, stmt),
        }
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if self.error.is_some() {
            return;
        }
        if let Expr::New {
            ty,
            body: Some(body),
            span,
            ..
        } = expr
        {
            let site = AnonymousSite {
                member: self.member,
                ordinal: self.ordinal,
            };
            self.ordinal += 1;
            let locals = self.scopes.iter().flatten().cloned().collect();
            if let Err(err) =
                self.builder
                    .register_anonymous(site, ty, body, locals, *span, self.depth + 1)
            {
                self.error = Some(err);
                return;
            }
        }
        if let Expr::Lambda { params, .. } = expr {
            self.scoped(|this| {
                for param in params {
                    this.declare(&param.name, &param.declared_type());
                }
                walk_expr(this, expr);
            });
            return;
        }
        walk_expr(self, expr);
    }
}
