use super::support::check_unsupported;
use crate::test_support::*;
use jts_ast::*;
use jts_common::diagnostics::{DiagnosticCategory, diagnostic_codes};
use jts_common::{LoweringError, LoweringOptions, Span};

/// Unit exercising every unsupported construct once.
///
/// ```java
/// package test;
/// import java.util.*;
/// class T {
///     transient int cache;
///     void read() throws IOException { }
///     void run() { synchronized (this) { } }
/// }
/// ```
fn unsupported() -> CompilationUnit {
    let mut read = method("read", vec![]).at(Span::new(60, 90));
    read.throws.push(TypeRef::named("IOException"));
    let mut import = Import::asterisk("java.util");
    import.span = Span::new(14, 33);
    CompilationUnit::new("T.java", Some("test"))
        .with_import(import)
        .with_type(
            TypeDecl::class("T")
                .with_member(
                    FieldDecl::new("cache", TypeRef::int()).with_modifiers(Modifiers::TRANSIENT),
                )
                .with_member(read)
                .with_member(method(
                    "run",
                    vec![Stmt::Synchronized {
                        lock: Expr::this(),
                        body: Block::default(),
                        span: Span::new(110, 130),
                    }],
                )),
        )
}

#[test]
fn test_each_construct_yields_one_warning_in_source_order() {
    let diagnostics = check_unsupported(&unsupported(), &LoweringOptions::default()).unwrap();

    let codes: Vec<u32> = diagnostics.iter().map(|d| d.code).collect();
    assert_eq!(
        codes,
        vec![
            diagnostic_codes::ASTERISK_IMPORT,
            diagnostic_codes::MODIFIER_IGNORED,
            diagnostic_codes::THROWS_CLAUSE_IGNORED,
            diagnostic_codes::SYNCHRONIZED_BLOCK,
        ]
    );
    assert!(
        diagnostics
            .iter()
            .all(|d| d.category == DiagnosticCategory::Warning && d.file == "T.java")
    );
    let messages: Vec<&str> = diagnostics.iter().map(|d| d.message_text.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "Asterisk import 'java.util.*' is not supported.",
            "Modifiers not supported on 'test.T.cache': transient.",
            "Thrown exceptions of 'test.T.read' are not supported and will be dropped.",
            "'synchronized' block in 'test.T' is emitted as a plain block.",
        ]
    );
    assert_eq!((diagnostics[0].start, diagnostics[0].length), (14, 19));
    assert_eq!((diagnostics[2].start, diagnostics[2].length), (60, 30));
}

#[test]
fn test_unsupported_construct_fails_when_not_ignored() {
    let options = LoweringOptions {
        ignore_unsupported: false,
        ..LoweringOptions::default()
    };
    let err = check_unsupported(&unsupported(), &options).unwrap_err();

    assert_eq!(
        err,
        LoweringError::Unsupported {
            unit: "test".to_string(),
            reason: "Asterisk import 'java.util.*' is not supported.".to_string(),
            span: Span::new(14, 33),
        },
        "the first finding aborts"
    );
    assert_eq!(err.code(), diagnostic_codes::UNSUPPORTED_CONSTRUCT);
}

#[test]
fn test_type_and_method_modifiers_are_labeled_by_owner() {
    let source = CompilationUnit::new("M.java", Some("test")).with_type(
        TypeDecl::class("M")
            .with_modifiers(Modifiers::STRICTFP)
            .with_member(method("run", vec![]).with_modifiers(Modifiers::SYNCHRONIZED))
            .with_member(
                TypeDecl::class("N").with_member(
                    FieldDecl::new("flag", TypeRef::primitive(PrimitiveKind::Boolean))
                        .with_modifiers(Modifiers::VOLATILE | Modifiers::TRANSIENT),
                ),
            ),
    );
    let diagnostics = check_unsupported(&source, &LoweringOptions::default()).unwrap();
    let messages: Vec<&str> = diagnostics.iter().map(|d| d.message_text.as_str()).collect();

    assert_eq!(
        messages,
        vec![
            "Modifiers not supported on 'test.M': strictfp.",
            "Modifiers not supported on 'test.M.run': synchronized.",
            "Modifiers not supported on 'test.M.N.flag': transient, volatile.",
        ]
    );
}

#[test]
fn test_anonymous_class_members_are_checked() {
    let mut body = method("run", vec![]);
    body.throws.push(TypeRef::named("Exception"));
    let source = CompilationUnit::new("A.java", Some("test")).with_type(
        TypeDecl::class("A").with_member(
            FieldDecl::new("task", TypeRef::named("Runnable")).with_init(Expr::new_anonymous(
                TypeRef::named("Runnable"),
                vec![],
                vec![body.into()],
            )),
        ),
    );
    let diagnostics = check_unsupported(&source, &LoweringOptions::default()).unwrap();

    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].message_text,
        "Thrown exceptions of 'test.A.<anonymous>.run' are not supported and will be dropped."
    );
}

#[test]
fn test_clean_unit_has_no_warnings() {
    let diagnostics = check_unsupported(&test6(), &LoweringOptions::default()).unwrap();
    assert!(diagnostics.is_empty());
}

#[test]
fn test_pipeline_carries_warnings_into_program() {
    let program = crate::lower(&unsupported(), &LoweringOptions::default()).unwrap();

    assert_eq!(program.diagnostics.len(), 4);
    let run = program
        .unit("test.T")
        .and_then(|unit| unit.member("run"))
        .and_then(|run| run.body.as_ref())
        .unwrap();
    assert_eq!(
        run.stmts,
        vec![Stmt::Block(Block::default())],
        "the synchronized block lowers to a plain block"
    );
}

#[test]
fn test_synchronized_inside_switch_and_lambda_is_reported() {
    // switch (n) { case 1: Runnable r = () -> { synchronized (this) { } }; }
    let lambda = Expr::lambda(
        &[],
        LambdaBody::Block(Block::new(vec![Stmt::Synchronized {
            lock: Expr::this(),
            body: Block::default(),
            span: Span::new(40, 55),
        }])),
    );
    let source = CompilationUnit::new("S.java", Some("test")).with_type(
        TypeDecl::class("S").with_member(
            method(
                "run",
                vec![Stmt::Switch {
                    selector: Expr::name("n"),
                    cases: vec![SwitchCase {
                        label: Some(Expr::number("1")),
                        body: vec![Stmt::local("r", TypeRef::named("Runnable"), Some(lambda))],
                    }],
                    span: Span::DUMMY,
                }],
            )
            .with_param(Param::new("n", TypeRef::int())),
        ),
    );

    let diagnostics = check_unsupported(&source, &LoweringOptions::default()).unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, diagnostic_codes::SYNCHRONIZED_BLOCK);
    assert_eq!((diagnostics[0].start, diagnostics[0].length), (40, 15));
}
