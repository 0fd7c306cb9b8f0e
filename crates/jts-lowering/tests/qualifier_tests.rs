use super::*;
use crate::test_support::*;
use jts_ast::*;
use jts_binder::{ExecContext, MemberKind};
use jts_common::{LoweringError, LoweringOptions, Span};

fn outer_this(hops: Vec<CaptureHop>) -> Expr {
    Expr::OuterThis { hops }
}

#[test]
fn test_static_reference_uses_owner_path() {
    let unit = qualify(&test6(), "test.Test6");
    let static_b = Expr::field(type_path("test.Test6"), "b");
    let static_b1 = Expr::field(type_path("test.Test6"), "b1");

    assert_eq!(
        member(&unit, "c").init,
        Some(Expr::binary(
            "+",
            Expr::field(static_b, "b"),
            Expr::field(static_b1, "b1"),
        )),
        "statics are read through the owning unit's full path"
    );
}

#[test]
fn test_local_shadows_field_of_same_name() {
    let unit = qualify(&test6(), "test.Test6");
    let stmts = body_stmts(member(&unit, "<init>"));

    assert_eq!(
        stmts[0],
        Stmt::LocalVar {
            name: "a".to_string(),
            ty: TypeRef::Named {
                name: "A".to_string(),
                args: vec![],
                resolved: Some("test.Test6.A".to_string()),
            },
            init: Some(this_field("a")),
            span: Span::DUMMY,
        }
    );
    let Stmt::LocalVar { init: Some(d), .. } = &stmts[1] else {
        panic!("expected local d, got {:?}", stmts[1]);
    };
    assert_eq!(
        *d,
        Expr::binary(
            "+",
            Expr::binary(
                "+",
                Expr::field(local("a"), "a"),
                Expr::field(this_field("a1"), "a1"),
            ),
            Expr::field(type_path("test.Test6"), "c"),
        ),
        "`a` is the local, `a1` the instance field, `c` the static"
    );
}

#[test]
fn test_sibling_inner_classes_reach_each_other_through_enclosing_instance() {
    let a = qualify(&test6(), "test.Test6.A");
    assert_eq!(
        body_stmts(member(&a, "<init>")),
        &[assign_stmt(
            this_field("a"),
            Expr::field(
                Expr::field(outer_this(vec![hop("test.Test6.A", "test.Test6")]), "a1"),
                "a1",
            ),
        )]
    );
    assert!(
        a.requests.contains(&CaptureRequest {
            unit: a.unit,
            kind: RequestKind::EnclosingInstance,
        }),
        "reading Test6.a1 needs A's enclosing instance"
    );

    let a1 = qualify(&test6(), "test.Test6.A1");
    assert_eq!(
        body_stmts(member(&a1, "<init>")),
        &[assign_stmt(
            this_field("a1"),
            Expr::field(
                Expr::field(outer_this(vec![hop("test.Test6.A1", "test.Test6")]), "a"),
                "a",
            ),
        )],
        "`Test6.this.a.a` reads the sibling's field, not A1's own"
    );
}

#[test]
fn test_inner_instantiation_records_implicit_outer() {
    let unit = qualify(&test6(), "test.Test6");
    assert_eq!(
        member(&unit, "a").init,
        Some(Expr::NewUnit {
            path: "test.Test6.A".to_string(),
            args: vec![],
            outer: Some(Box::new(Expr::this())),
            captures: vec![],
            anonymous: false,
            span: Span::DUMMY,
        })
    );
    assert_eq!(
        member(&unit, "b").init,
        Some(Expr::NewUnit {
            path: "test.Test6.B".to_string(),
            args: vec![],
            outer: None,
            captures: vec![],
            anonymous: false,
            span: Span::DUMMY,
        }),
        "static nested classes take no outer instance"
    );
    let targets: Vec<Option<u32>> = unit
        .creation_sites
        .iter()
        .map(|site| site.implicit_outer_depth)
        .collect();
    assert_eq!(targets, vec![Some(0), Some(0)]);
}

#[test]
fn test_qualification_is_idempotent() {
    let options = LoweringOptions::default();
    let source = test6();
    let table = build_table(&source, &options);
    let qualifier = Qualifier::new(&table, &options);
    let id = table.lookup("test.Test6").unwrap();
    let ctor = table
        .members_of(id)
        .find(|m| m.kind == MemberKind::Constructor)
        .unwrap();
    let ctx = ExecContext {
        unit: id,
        is_static: false,
        member: Some(ctor.id),
    };

    let unit = qualifier.qualify_unit(id).unwrap();
    let once = member(&unit, "<init>").body.clone().unwrap();
    let twice = qualifier.qualify_block(ctx, &[], &once).unwrap();
    assert_eq!(once, twice);

    let c = member(&unit, "c").init.clone().unwrap();
    let static_ctx = ExecContext {
        unit: id,
        is_static: true,
        member: None,
    };
    assert_eq!(qualifier.qualify_expr(static_ctx, &[], &c).unwrap(), c);

    let inner = table.lookup("test.Test6.A1").unwrap();
    let a1 = qualifier.qualify_unit(inner).unwrap();
    let body = member(&a1, "<init>").body.clone().unwrap();
    let inner_ctx = ExecContext {
        unit: inner,
        is_static: false,
        member: None,
    };
    assert_eq!(qualifier.qualify_block(inner_ctx, &[], &body).unwrap(), body);
}

#[test]
fn test_reserved_parameter_names_are_escaped() {
    let source = CompilationUnit::new("Counter.java", Some("test")).with_type(
        TypeDecl::class("Counter")
            .with_member(FieldDecl::new("total", TypeRef::int()))
            .with_member(
                method(
                    "add",
                    vec![assign_stmt(
                        Expr::name("total"),
                        Expr::binary("+", Expr::name("total"), Expr::name("in")),
                    )],
                )
                .with_param(Param::new("in", TypeRef::int())),
            ),
    );
    let unit = qualify(&source, "test.Counter");
    let add = member(&unit, "add");

    assert_eq!(
        add.params,
        vec![LoweredParam {
            name: "_in".to_string(),
            ty: TypeRef::int(),
            varargs: false,
        }]
    );
    assert_eq!(
        body_stmts(add),
        &[assign_stmt(
            this_field("total"),
            Expr::binary("+", this_field("total"), local("_in")),
        )]
    );
}

#[test]
fn test_unqualified_calls_get_receivers() {
    let source = CompilationUnit::new("Calls.java", Some("test")).with_type(
        TypeDecl::class("Calls")
            .with_member(method("h", vec![]))
            .with_member(
                MethodDecl::new("s", TypeRef::int())
                    .with_modifiers(Modifiers::STATIC)
                    .with_body(Block::new(vec![Stmt::ret(Some(Expr::number("0")))])),
            )
            .with_member(method(
                "g",
                vec![
                    Stmt::expr(Expr::call("h", vec![])),
                    Stmt::expr(Expr::call("s", vec![])),
                    Stmt::expr(Expr::call_on(
                        Expr::name("Math"),
                        "max",
                        vec![Expr::number("1"), Expr::number("2")],
                    )),
                ],
            )),
    );
    let unit = qualify(&source, "test.Calls");

    assert_eq!(
        body_stmts(member(&unit, "g")),
        &[
            Stmt::expr(Expr::call_on(Expr::this(), "h", vec![])),
            Stmt::expr(Expr::call_on(type_path("test.Calls"), "s", vec![])),
            Stmt::expr(Expr::call_on(
                type_path("java.lang.Math"),
                "max",
                vec![Expr::number("1"), Expr::number("2")],
            )),
        ]
    );
}

#[test]
fn test_qualified_this_of_own_unit_is_this() {
    let source = CompilationUnit::new("Me.java", Some("test")).with_type(
        TypeDecl::class("Me").with_member(
            MethodDecl::new("me", TypeRef::named("Me"))
                .with_body(Block::new(vec![Stmt::ret(Some(Expr::outer_this("Me")))])),
        ),
    );
    let unit = qualify(&source, "test.Me");
    let me = member(&unit, "me");

    assert_eq!(body_stmts(me), &[Stmt::ret(Some(Expr::this()))]);
    assert_eq!(
        me.return_type.as_ref().and_then(TypeRef::resolved_path),
        Some("test.Me")
    );
}

#[test]
fn test_unresolved_identifier_names_member_and_span() {
    let source = CompilationUnit::new("Broken.java", Some("test")).with_type(
        TypeDecl::class("Broken").with_member(method(
            "f",
            vec![Stmt::local(
                "x",
                TypeRef::int(),
                Some(Expr::name("missing").at(Span::new(40, 47))),
            )],
        )),
    );
    let options = LoweringOptions::default();
    let table = build_table(&source, &options);
    let err = Qualifier::new(&table, &options).qualify_all().unwrap_err();

    assert_eq!(
        err,
        LoweringError::UnresolvedIdentifier {
            unit: "test.Broken".to_string(),
            member: Some("f".to_string()),
            name: "missing".to_string(),
            span: Span::new(40, 47),
        }
    );
}

#[test]
fn test_inner_creation_from_static_context_fails() {
    let source = CompilationUnit::new("Host.java", Some("test")).with_type(
        TypeDecl::class("Host")
            .with_member(TypeDecl::class("Inner"))
            .with_member(
                MethodDecl::new("make", TypeRef::named("Inner"))
                    .with_modifiers(Modifiers::STATIC)
                    .with_body(Block::new(vec![Stmt::ret(Some(
                        Expr::new_object(TypeRef::named("Inner"), vec![]).at(Span::new(3, 14)),
                    ))])),
            ),
    );
    let options = LoweringOptions::default();
    let table = build_table(&source, &options);
    let err = Qualifier::new(&table, &options).qualify_all().unwrap_err();

    assert_eq!(
        err,
        LoweringError::NoEnclosingInstance {
            unit: "test.Host".to_string(),
            target: "test.Host".to_string(),
            span: Span::new(3, 14),
        }
    );
}

#[test]
fn test_synchronized_block_keeps_lock_side_effects() {
    let sync = |lock: Expr| Stmt::Synchronized {
        lock,
        body: Block::new(vec![assign_stmt(Expr::name("x"), Expr::number("1"))]),
        span: Span::DUMMY,
    };
    let source = CompilationUnit::new("Sync.java", Some("test")).with_type(
        TypeDecl::class("Sync")
            .with_member(FieldDecl::new("x", TypeRef::int()))
            .with_member(MethodDecl::new("lock", TypeRef::named("Object")).with_body(
                Block::new(vec![Stmt::ret(Some(Expr::this()))]),
            ))
            .with_member(method(
                "run",
                vec![sync(Expr::this()), sync(Expr::call("lock", vec![]))],
            )),
    );
    let unit = qualify(&source, "test.Sync");
    let assign_x = assign_stmt(this_field("x"), Expr::number("1"));

    assert_eq!(
        body_stmts(member(&unit, "run")),
        &[
            Stmt::Block(Block::new(vec![assign_x.clone()])),
            Stmt::Block(Block::new(vec![
                Stmt::expr(Expr::call_on(Expr::this(), "lock", vec![])),
                assign_x,
            ])),
        ]
    );
}

#[test]
fn test_parallel_qualification_matches_sequential() {
    let source = test6();
    let sequential = LoweringOptions::default();
    let parallel = LoweringOptions {
        parallel: true,
        ..LoweringOptions::default()
    };
    let table = build_table(&source, &sequential);

    let a = Qualifier::new(&table, &sequential).qualify_all().unwrap();
    let b = Qualifier::new(&table, &parallel).qualify_all().unwrap();
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(&b) {
        assert_eq!(x.unit, y.unit, "units stay in table order");
        assert_eq!(x.members, y.members);
        assert_eq!(x.requests, y.requests);
        assert_eq!(x.creation_sites, y.creation_sites);
    }
}

/// ```java
/// package test;
/// class Sw {
///     int mode;
///     boolean flag;
///     static final int FAST = 1;
///     void run(int in) {
///         switch (mode) {
///             case FAST: int x = in; break;
///             default: x = mode;
///         }
///         outer: while (flag) { break outer; }
///         assert flag : mode;
///     }
/// }
/// ```
fn switches() -> CompilationUnit {
    CompilationUnit::new("Sw.java", Some("test")).with_type(
        TypeDecl::class("Sw")
            .with_member(FieldDecl::new("mode", TypeRef::int()))
            .with_member(FieldDecl::new("flag", TypeRef::primitive(PrimitiveKind::Boolean)))
            .with_member(
                FieldDecl::new("FAST", TypeRef::int())
                    .with_modifiers(Modifiers::STATIC | Modifiers::FINAL)
                    .with_init(Expr::number("1")),
            )
            .with_member(
                method(
                    "run",
                    vec![
                        Stmt::Switch {
                            selector: Expr::name("mode"),
                            cases: vec![
                                SwitchCase {
                                    label: Some(Expr::name("FAST")),
                                    body: vec![
                                        Stmt::local("x", TypeRef::int(), Some(Expr::name("in"))),
                                        Stmt::Break { label: None },
                                    ],
                                },
                                SwitchCase {
                                    label: None,
                                    body: vec![assign_stmt(Expr::name("x"), Expr::name("mode"))],
                                },
                            ],
                            span: Span::DUMMY,
                        },
                        Stmt::labeled(
                            "outer",
                            Stmt::While {
                                cond: Expr::name("flag"),
                                body: Box::new(Stmt::Block(Block::new(vec![Stmt::Break {
                                    label: Some("outer".to_string()),
                                }]))),
                            },
                        ),
                        Stmt::Assert {
                            check: Expr::name("flag"),
                            message: Some(Expr::name("mode")),
                            span: Span::DUMMY,
                        },
                    ],
                )
                .with_param(Param::new("in", TypeRef::int())),
            ),
    )
}

#[test]
fn test_switch_labels_and_case_bodies_are_qualified() {
    let unit = qualify(&switches(), "test.Sw");
    let stmts = body_stmts(member(&unit, "run"));

    assert_eq!(
        stmts[0],
        Stmt::Switch {
            selector: this_field("mode"),
            cases: vec![
                SwitchCase {
                    label: Some(Expr::field(type_path("test.Sw"), "FAST")),
                    body: vec![
                        Stmt::local("x", TypeRef::int(), Some(local("_in"))),
                        Stmt::Break { label: None },
                    ],
                },
                SwitchCase {
                    label: None,
                    body: vec![assign_stmt(local("x"), this_field("mode"))],
                },
            ],
            span: Span::DUMMY,
        },
        "a local declared in one case is visible in the following ones"
    );
}

#[test]
fn test_labeled_statement_and_assert_are_qualified() {
    let unit = qualify(&switches(), "test.Sw");
    let stmts = body_stmts(member(&unit, "run"));

    assert_eq!(
        stmts[1],
        Stmt::labeled(
            "outer",
            Stmt::While {
                cond: this_field("flag"),
                body: Box::new(Stmt::Block(Block::new(vec![Stmt::Break {
                    label: Some("outer".to_string()),
                }]))),
            },
        )
    );
    assert_eq!(
        stmts[2],
        Stmt::Assert {
            check: this_field("flag"),
            message: Some(this_field("mode")),
            span: Span::DUMMY,
        }
    );
}

/// ```java
/// package test;
/// class L {
///     int base;
///     void run(int k) {
///         Function f = v -> v + k + base;
///         Function g = base -> base;
///         int after = base;
///         Supplier s = Helper::make;
///         Class<?> c = Helper.class;
///     }
///     static class Helper { static Helper make() { return null; } }
///     class Inner { Supplier make() { return () -> base; } }
/// }
/// ```
fn lambdas() -> CompilationUnit {
    let expr_body = |expr: Expr| LambdaBody::Expr(Box::new(expr));
    CompilationUnit::new("L.java", Some("test")).with_type(
        TypeDecl::class("L")
            .with_member(FieldDecl::new("base", TypeRef::int()))
            .with_member(
                method(
                    "run",
                    vec![
                        Stmt::local(
                            "f",
                            TypeRef::named("Function"),
                            Some(Expr::lambda(
                                &["v"],
                                expr_body(Expr::binary(
                                    "+",
                                    Expr::binary("+", Expr::name("v"), Expr::name("k")),
                                    Expr::name("base"),
                                )),
                            )),
                        ),
                        Stmt::local(
                            "g",
                            TypeRef::named("Function"),
                            Some(Expr::lambda(&["base"], expr_body(Expr::name("base")))),
                        ),
                        Stmt::local("after", TypeRef::int(), Some(Expr::name("base"))),
                        Stmt::local(
                            "s",
                            TypeRef::named("Supplier"),
                            Some(Expr::MethodReference {
                                target: Box::new(Expr::name("Helper")),
                                name: "make".to_string(),
                                span: Span::DUMMY,
                            }),
                        ),
                        Stmt::local(
                            "c",
                            TypeRef::named("Class"),
                            Some(Expr::ClassLiteral {
                                ty: TypeRef::named("Helper"),
                            }),
                        ),
                    ],
                )
                .with_param(Param::new("k", TypeRef::int())),
            )
            .with_member(
                TypeDecl::class("Helper")
                    .with_modifiers(Modifiers::STATIC)
                    .with_member(
                        MethodDecl::new("make", TypeRef::named("Helper"))
                            .with_modifiers(Modifiers::STATIC)
                            .with_body(Block::new(vec![Stmt::ret(Some(Expr::null()))])),
                    ),
            )
            .with_member(TypeDecl::class("Inner").with_member(
                MethodDecl::new("make", TypeRef::named("Supplier")).with_body(Block::new(vec![
                    Stmt::ret(Some(Expr::lambda(&[], expr_body(Expr::name("base"))))),
                ])),
            )),
    )
}

fn local_init(stmt: &Stmt) -> &Expr {
    let Stmt::LocalVar { init: Some(init), .. } = stmt else {
        panic!("expected an initialized local, got {stmt:?}");
    };
    init
}

fn lambda_body(expr: &Expr) -> (&[LambdaParam], &Expr) {
    let Expr::Lambda {
        params,
        body: LambdaBody::Expr(body),
        ..
    } = expr
    else {
        panic!("expected an expression lambda, got {expr:?}");
    };
    (params, body)
}

#[test]
fn test_lambda_parameters_scope_over_body_only() {
    let unit = qualify(&lambdas(), "test.L");
    let stmts = body_stmts(member(&unit, "run"));

    let (params, body) = lambda_body(local_init(&stmts[0]));
    assert_eq!(params[0].name, "v");
    assert_eq!(
        *body,
        Expr::binary(
            "+",
            Expr::binary("+", local("v"), local("k")),
            this_field("base"),
        ),
        "enclosing locals and `this` keep their meaning inside the lambda"
    );

    let (_, shadowed) = lambda_body(local_init(&stmts[1]));
    assert_eq!(*shadowed, local("base"), "the parameter shadows the field");
    assert_eq!(
        *local_init(&stmts[2]),
        this_field("base"),
        "the parameter is gone after the lambda"
    );
}

#[test]
fn test_lambda_in_inner_class_reads_enclosing_instance() {
    let inner = qualify(&lambdas(), "test.L.Inner");
    let stmts = body_stmts(member(&inner, "make"));
    let Stmt::Return { value: Some(lambda) } = &stmts[0] else {
        panic!("expected a return, got {:?}", stmts[0]);
    };

    let (_, body) = lambda_body(lambda);
    assert_eq!(
        *body,
        Expr::field(outer_this(vec![hop("test.L.Inner", "test.L")]), "base")
    );
    assert!(inner.requests.contains(&CaptureRequest {
        unit: inner.unit,
        kind: RequestKind::EnclosingInstance,
    }));
}

#[test]
fn test_method_reference_and_class_literal_resolve_types() {
    let unit = qualify(&lambdas(), "test.L");
    let stmts = body_stmts(member(&unit, "run"));

    assert_eq!(
        *local_init(&stmts[3]),
        Expr::MethodReference {
            target: Box::new(type_path("test.L.Helper")),
            name: "make".to_string(),
            span: Span::DUMMY,
        }
    );
    assert_eq!(
        *local_init(&stmts[4]),
        Expr::ClassLiteral {
            ty: TypeRef::Named {
                name: "Helper".to_string(),
                args: vec![],
                resolved: Some("test.L.Helper".to_string()),
            },
        }
    );
}

#[test]
fn test_anonymous_class_in_lambda_captures_lambda_parameter() {
    // Consumer c = msg -> new Runnable() { public void run() { System.out.println(msg); } };
    let print = Expr::call_on(
        Expr::field(Expr::name("System"), "out"),
        "println",
        vec![Expr::name("msg")],
    );
    let run = method("run", vec![Stmt::expr(print)]).with_modifiers(Modifiers::PUBLIC);
    let source = CompilationUnit::new("Cap.java", Some("test")).with_type(
        TypeDecl::class("Cap").with_member(method(
            "start",
            vec![Stmt::local(
                "c",
                TypeRef::named("Consumer"),
                Some(Expr::lambda(
                    &["msg"],
                    LambdaBody::Expr(Box::new(Expr::new_anonymous(
                        TypeRef::named("Runnable"),
                        vec![],
                        vec![run.into()],
                    ))),
                )),
            )],
        )),
    );

    let anonymous = qualify(&source, "test.Cap.$1");
    let Stmt::Expr {
        expr: Expr::MethodCall { args, .. },
    } = &body_stmts(member(&anonymous, "run"))[0]
    else {
        panic!("expected the println call");
    };
    assert_eq!(
        args[0],
        Expr::CapturedLocal {
            name: "msg".to_string(),
            hops: vec![],
            slot: None,
        }
    );
}
