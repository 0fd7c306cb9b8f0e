use super::*;
use crate::test_support::*;
use jts_ast::*;
use jts_common::{LoweringError, LoweringOptions, Span};

fn order_of(program: &LoweredProgram) -> Vec<String> {
    program
        .static_init_order
        .iter()
        .map(|r| format!("{}.{}", r.unit, r.member))
        .collect()
}

fn static_field(name: &str, init: Expr) -> FieldDecl {
    FieldDecl::new(name, TypeRef::int())
        .with_modifiers(Modifiers::STATIC)
        .with_init(init)
}

fn plus_one(name: &str) -> Expr {
    Expr::binary("+", Expr::name(name), Expr::number("1"))
}

#[test]
fn test_dependencies_initialize_first() {
    let program = lower(&statics(), &LoweringOptions::default()).unwrap();

    assert_eq!(
        order_of(&program),
        vec!["test.Statics.b", "test.Statics.b1", "test.Statics.c"]
    );
    let unit = program.unit("test.Statics").unwrap();
    let position = |name: &str| unit.member(name).and_then(|m| m.init_order);
    assert_eq!(position("b"), Some(0));
    assert_eq!(position("b1"), Some(1));
    assert_eq!(position("c"), Some(2));
    assert!(
        program
            .unit("test.Statics.Holder")
            .and_then(|holder| holder.member("value"))
            .is_some_and(|value| value.init_order.is_none()),
        "instance fields take no part in static ordering"
    );
}

#[test]
fn test_source_order_is_kept_without_forward_reads() {
    let source = CompilationUnit::new("Plain.java", Some("test")).with_type(
        TypeDecl::class("Plain")
            .with_member(static_field("x", Expr::number("1")))
            .with_member(static_field("y", plus_one("x")))
            .with_member(static_field("z", Expr::number("2"))),
    );
    let program = lower(&source, &LoweringOptions::default()).unwrap();

    assert_eq!(
        order_of(&program),
        vec!["test.Plain.x", "test.Plain.y", "test.Plain.z"]
    );
}

#[test]
fn test_statics_of_nested_units_share_one_order() {
    let source = CompilationUnit::new("P.java", Some("test")).with_type(
        TypeDecl::class("P")
            .with_member(static_field("base", Expr::number("1")))
            .with_member(static_field(
                "late",
                Expr::field(Expr::name("Q"), "twice"),
            ))
            .with_member(
                TypeDecl::class("Q").with_modifiers(Modifiers::STATIC).with_member(static_field(
                    "twice",
                    Expr::binary("*", Expr::field(Expr::name("P"), "base"), Expr::number("2")),
                )),
            ),
    );
    let program = lower(&source, &LoweringOptions::default()).unwrap();

    assert_eq!(
        order_of(&program),
        vec!["test.P.base", "test.P.Q.twice", "test.P.late"]
    );
}

#[test]
fn test_static_initializer_block_follows_fields_it_reads() {
    let print = Expr::call_on(
        Expr::field(Expr::name("System"), "out"),
        "println",
        vec![Expr::name("count")],
    );
    let source = CompilationUnit::new("Boot.java", Some("test")).with_type(
        TypeDecl::class("Boot")
            .with_member(InitializerDecl {
                is_static: true,
                body: Block::new(vec![Stmt::expr(print)]),
                span: Span::DUMMY,
            })
            .with_member(static_field("count", Expr::number("3"))),
    );
    let program = lower(&source, &LoweringOptions::default()).unwrap();

    assert_eq!(
        order_of(&program),
        vec!["test.Boot.count", "test.Boot.<clinit>"]
    );
}

#[test]
fn test_mutual_reads_are_a_cycle() {
    let mut x = static_field("x", plus_one("y"));
    x.span = Span::new(20, 38);
    let source = CompilationUnit::new("S.java", Some("test")).with_type(
        TypeDecl::class("S")
            .with_member(static_field("ok", Expr::number("0")))
            .with_member(x)
            .with_member(static_field("y", plus_one("x"))),
    );
    let err = lower(&source, &LoweringOptions::default()).unwrap_err();

    assert_eq!(
        err,
        LoweringError::StaticInitCycle {
            unit: "test.S".to_string(),
            cycle: vec!["test.S.x".to_string(), "test.S.y".to_string()],
            span: Span::new(20, 38),
        }
    );
    assert_eq!(err.span(), Span::new(20, 38), "diagnostics point at the first member");
}

#[test]
fn test_self_read_is_a_cycle() {
    let source = CompilationUnit::new("S.java", Some("test")).with_type(
        TypeDecl::class("S").with_member(static_field("z", plus_one("z"))),
    );
    let err = lower(&source, &LoweringOptions::default()).unwrap_err();

    assert!(
        matches!(err, LoweringError::StaticInitCycle { ref cycle, .. } if cycle == &["test.S.z"]),
        "got {err:?}"
    );
}

#[test]
fn test_downstream_of_cycle_is_not_reported() {
    let source = CompilationUnit::new("S.java", Some("test")).with_type(
        TypeDecl::class("S")
            .with_member(static_field("after", plus_one("b")))
            .with_member(static_field("a", plus_one("b")))
            .with_member(static_field("b", plus_one("a"))),
    );
    let err = lower(&source, &LoweringOptions::default()).unwrap_err();

    let LoweringError::StaticInitCycle { cycle, .. } = &err else {
        panic!("expected a cycle, got {err:?}");
    };
    assert_eq!(*cycle, ["test.S.a", "test.S.b"]);
}
