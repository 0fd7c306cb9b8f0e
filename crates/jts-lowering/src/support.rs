//! Warnings for source constructs with no target equivalent.
//!
//! `throws` clauses, modifiers such as `transient` or `volatile`, asterisk
//! imports and `synchronized` blocks are dropped or simplified by lowering.
//! Each one produces a warning; with `ignoreUnsupported` off the first one
//! fails the run instead.

use jts_ast::visit::{Visitor, walk_expr, walk_stmt};
use jts_ast::{CompilationUnit, Expr, MemberDecl, Modifiers, Stmt, TypeDecl, TypeRef};
use jts_common::diagnostics::{diagnostic_codes, message_for};
use jts_common::{Diagnostic, LoweringError, LoweringOptions, LoweringResult, Span};
use tracing::warn;

struct Finding {
    unit: String,
    code: u32,
    message: String,
    span: Span,
}

#[derive(Default)]
struct SupportChecker {
    findings: Vec<Finding>,
    /// Path of the unit being walked.
    unit: String,
}

impl SupportChecker {
    fn report(&mut self, code: u32, args: &[&str], span: Span) {
        self.findings.push(Finding {
            unit: self.unit.clone(),
            code,
            message: message_for(code, args),
            span,
        });
    }

    /// `name` is `None` for the unit's own modifiers.
    fn check_modifiers(&mut self, name: Option<&str>, modifiers: Modifiers, span: Span) {
        let unsupported = modifiers.unsupported_names();
        if !unsupported.is_empty() {
            let label = match name {
                Some(name) => format!("{}.{name}", self.unit),
                None => self.unit.clone(),
            };
            self.report(
                diagnostic_codes::MODIFIER_IGNORED,
                &[&label, &unsupported.join(", ")],
                span,
            );
        }
    }

    fn check_throws(&mut self, name: &str, throws: &[TypeRef], span: Span) {
        if !throws.is_empty() {
            let label = format!("{}.{name}", self.unit);
            self.report(diagnostic_codes::THROWS_CLAUSE_IGNORED, &[&label], span);
        }
    }

    fn check_type(&mut self, decl: &TypeDecl, path: String) {
        let saved = std::mem::replace(&mut self.unit, path);
        self.check_modifiers(None, decl.modifiers, decl.span);
        self.check_members(&decl.members);
        self.unit = saved;
    }

    fn check_members(&mut self, members: &[MemberDecl]) {
        for member in members {
            match member {
                MemberDecl::Field(field) => {
                    self.check_modifiers(Some(&field.name), field.modifiers, field.span);
                    if let Some(init) = &field.init {
                        self.visit_expr(init);
                    }
                }
                MemberDecl::Method(method) => {
                    self.check_modifiers(Some(&method.name), method.modifiers, method.span);
                    self.check_throws(&method.name, &method.throws, method.span);
                    if let Some(body) = &method.body {
                        self.visit_block(body);
                    }
                }
                MemberDecl::Constructor(ctor) => {
                    self.check_modifiers(Some("<init>"), ctor.modifiers, ctor.span);
                    self.check_throws("<init>", &ctor.throws, ctor.span);
                    self.visit_block(&ctor.body);
                }
                MemberDecl::Initializer(init) => self.visit_block(&init.body),
                MemberDecl::Type(nested) => {
                    let path = format!("{}.{}", self.unit, nested.name);
                    self.check_type(nested, path);
                }
            }
        }
    }
}

impl Visitor for SupportChecker {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if let Stmt::Synchronized { span, .. } = stmt {
            let unit = self.unit.clone();
            self.report(diagnostic_codes::SYNCHRONIZED_BLOCK, &[&unit], *span);
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
        if let Expr::New {
            body: Some(body), ..
        } = expr
        {
            let saved = self.unit.clone();
            self.unit = format!("{saved}.<anonymous>");
            self.check_members(body);
            self.unit = saved;
        }
    }
}

/// Collect unsupported-construct warnings for `unit`, in source order.
///
/// Fails on the first finding when `ignoreUnsupported` is off.
#[tracing::instrument(level = "debug", skip_all, fields(file = %unit.file_name))]
pub fn check_unsupported(
    unit: &CompilationUnit,
    options: &LoweringOptions,
) -> LoweringResult<Vec<Diagnostic>> {
    let mut checker = SupportChecker::default();
    let package = unit.package.as_deref().unwrap_or_default();

    for import in unit.imports.iter().filter(|import| import.is_asterisk) {
        checker.unit = package.to_string();
        checker.report(
            diagnostic_codes::ASTERISK_IMPORT,
            &[&import.path],
            import.span,
        );
    }
    for decl in &unit.types {
        let path = if package.is_empty() {
            decl.name.clone()
        } else {
            format!("{package}.{}", decl.name)
        };
        checker.check_type(decl, path);
    }

    let mut diagnostics = Vec::with_capacity(checker.findings.len());
    for finding in checker.findings {
        if !options.ignore_unsupported {
            return Err(LoweringError::Unsupported {
                unit: finding.unit,
                reason: finding.message,
                span: finding.span,
            });
        }
        warn!(code = finding.code, unit = %finding.unit, "{}", finding.message);
        diagnostics.push(Diagnostic::warning(
            unit.file_name.clone(),
            finding.span.start,
            finding.span.len(),
            finding.message,
            finding.code,
        ));
    }
    Ok(diagnostics)
}
