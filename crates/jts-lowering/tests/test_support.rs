//! Shared compilation-unit fixtures for the lowering tests.

use crate::program::LoweredMember;
use crate::qualifier::{QualifiedUnit, Qualifier};
use jts_ast::*;
use jts_binder::{SymbolTable, SymbolTableBuilder};
use jts_common::LoweringOptions;

pub(crate) fn build_table(unit: &CompilationUnit, options: &LoweringOptions) -> SymbolTable {
    SymbolTableBuilder::new(options)
        .build(unit)
        .expect("symbol table should build")
}

/// Qualify the unit at `path` with default options.
pub(crate) fn qualify(unit: &CompilationUnit, path: &str) -> QualifiedUnit {
    let options = LoweringOptions::default();
    let table = build_table(unit, &options);
    let id = table.lookup(path).expect("unit should exist");
    Qualifier::new(&table, &options)
        .qualify_unit(id)
        .expect("unit should qualify")
}

pub(crate) fn member<'q>(unit: &'q QualifiedUnit, name: &str) -> &'q LoweredMember {
    unit.members
        .iter()
        .find(|m| m.name == name)
        .unwrap_or_else(|| panic!("member {name} should exist"))
}

pub(crate) fn body_stmts(member: &LoweredMember) -> &[Stmt] {
    &member.body.as_ref().expect("member should have a body").stmts
}

pub(crate) fn method(name: &str, body: Vec<Stmt>) -> MethodDecl {
    MethodDecl::new(name, TypeRef::Void).with_body(Block::new(body))
}

pub(crate) fn ctor(body: Vec<Stmt>) -> ConstructorDecl {
    ConstructorDecl::new(Block::new(body))
}

pub(crate) fn this_field(name: &str) -> Expr {
    Expr::field(Expr::this(), name)
}

pub(crate) fn type_path(path: &str) -> Expr {
    Expr::TypePath {
        path: path.to_string(),
    }
}

pub(crate) fn local(name: &str) -> Expr {
    Expr::Local {
        name: name.to_string(),
    }
}

pub(crate) fn hop(from: &str, to: &str) -> CaptureHop {
    CaptureHop {
        from: from.to_string(),
        to: to.to_string(),
        slot: None,
    }
}

pub(crate) fn hop_via(from: &str, to: &str, slot: &str) -> CaptureHop {
    CaptureHop {
        slot: Some(slot.to_string()),
        ..hop(from, to)
    }
}

pub(crate) fn assign_stmt(target: Expr, value: Expr) -> Stmt {
    Stmt::expr(Expr::assign(target, value))
}

/// Inner classes referencing each other's fields through the enclosing
/// instance, plus static nested classes feeding a dependent static.
///
/// ```java
/// package test;
/// public class Test6 {
///     A a = new A();
///     A1 a1 = new A1();
///     static B b = new B();
///     static B1 b1 = new B1();
///     static int c = b.b + b1.b1;
///     public Test6() { A a = this.a; int d = a.a + a1.a1 + c; }
///     class A { int a = 1; A() { a = a1.a1; } }
///     private class A1 { int a1 = 1; A1() { a1 = Test6.this.a.a; } }
///     static class B { int b = 1; }
///     private static class B1 { int b1 = 1; }
/// }
/// ```
pub(crate) fn test6() -> CompilationUnit {
    let dotted = |a: &str, b: &str| Expr::field(Expr::name(a), b);
    CompilationUnit::new("Test6.java", Some("test")).with_type(
        TypeDecl::class("Test6")
            .with_modifiers(Modifiers::PUBLIC)
            .with_member(
                FieldDecl::new("a", TypeRef::named("A"))
                    .with_init(Expr::new_object(TypeRef::named("A"), vec![])),
            )
            .with_member(
                FieldDecl::new("a1", TypeRef::named("A1"))
                    .with_init(Expr::new_object(TypeRef::named("A1"), vec![])),
            )
            .with_member(
                FieldDecl::new("b", TypeRef::named("B"))
                    .with_modifiers(Modifiers::STATIC)
                    .with_init(Expr::new_object(TypeRef::named("B"), vec![])),
            )
            .with_member(
                FieldDecl::new("b1", TypeRef::named("B1"))
                    .with_modifiers(Modifiers::STATIC)
                    .with_init(Expr::new_object(TypeRef::named("B1"), vec![])),
            )
            .with_member(
                FieldDecl::new("c", TypeRef::int())
                    .with_modifiers(Modifiers::STATIC)
                    .with_init(Expr::binary("+", dotted("b", "b"), dotted("b1", "b1"))),
            )
            .with_member(ctor(vec![
                Stmt::local("a", TypeRef::named("A"), Some(this_field("a"))),
                Stmt::local(
                    "d",
                    TypeRef::int(),
                    Some(Expr::binary(
                        "+",
                        Expr::binary("+", dotted("a", "a"), dotted("a1", "a1")),
                        Expr::name("c"),
                    )),
                ),
            ]))
            .with_member(
                TypeDecl::class("A")
                    .with_member(FieldDecl::new("a", TypeRef::int()).with_init(Expr::number("1")))
                    .with_member(ctor(vec![assign_stmt(
                        Expr::name("a"),
                        dotted("a1", "a1"),
                    )])),
            )
            .with_member(
                TypeDecl::class("A1")
                    .with_modifiers(Modifiers::PRIVATE)
                    .with_member(FieldDecl::new("a1", TypeRef::int()).with_init(Expr::number("1")))
                    .with_member(ctor(vec![assign_stmt(
                        Expr::name("a1"),
                        Expr::field(Expr::field(Expr::outer_this("Test6"), "a"), "a"),
                    )])),
            )
            .with_member(
                TypeDecl::class("B")
                    .with_modifiers(Modifiers::STATIC)
                    .with_member(FieldDecl::new("b", TypeRef::int()).with_init(Expr::number("1"))),
            )
            .with_member(
                TypeDecl::class("B1")
                    .with_modifiers(Modifiers::PRIVATE | Modifiers::STATIC)
                    .with_member(FieldDecl::new("b1", TypeRef::int()).with_init(Expr::number("1"))),
            ),
    )
}

/// Overloaded constructors and methods.
///
/// ```java
/// package test;
/// public class Test9 {
///     public Test9() { boolean b = true; }
///     public Test9(boolean b) { boolean b2 = b; }
///     public void aaa() { int a = 1; }
///     public void aaa(String s) { String a = s; }
///     public void bbb() { int b = 1; }
///     public int bbb(int s) { return s; }
///     public String bbb(String s) { return s; }
/// }
/// ```
pub(crate) fn test9() -> CompilationUnit {
    let boolean = || TypeRef::primitive(PrimitiveKind::Boolean);
    let truth = Expr::Literal {
        value: Literal::Boolean { value: true },
    };
    let returning = |name: &str, ty: TypeRef| {
        MethodDecl::new(name, ty.clone())
            .with_modifiers(Modifiers::PUBLIC)
            .with_param(Param::new("s", ty))
            .with_body(Block::new(vec![Stmt::ret(Some(Expr::name("s")))]))
    };
    CompilationUnit::new("Test9.java", Some("test")).with_type(
        TypeDecl::class("Test9")
            .with_modifiers(Modifiers::PUBLIC)
            .with_member(ctor(vec![Stmt::local("b", boolean(), Some(truth))]))
            .with_member(ctor(vec![Stmt::local("b2", boolean(), Some(Expr::name("b")))]).with_param(
                Param::new("b", boolean()),
            ))
            .with_member(method("aaa", vec![Stmt::local("a", TypeRef::int(), Some(Expr::number("1")))]))
            .with_member(
                method("aaa", vec![Stmt::local("a", TypeRef::string(), Some(Expr::name("s")))])
                    .with_param(Param::new("s", TypeRef::string())),
            )
            .with_member(method("bbb", vec![Stmt::local("b", TypeRef::int(), Some(Expr::number("1")))]))
            .with_member(returning("bbb", TypeRef::int()))
            .with_member(returning("bbb", TypeRef::string())),
    )
}

/// Anonymous class in a static field of a class nested in an interface.
///
/// ```java
/// package test;
/// public interface Test8 {
///     int b();
///     static class AAA { int a; }
///     class BBB {
///         int b;
///         BBB bbb = new BBB();
///         static Test8 test8 = new Test8() {
///             public int b() { new Test8.AAA(); return 0; }
///         };
///     }
/// }
/// ```
pub(crate) fn test8() -> CompilationUnit {
    let anonymous_b = MethodDecl::new("b", TypeRef::int())
        .with_modifiers(Modifiers::PUBLIC)
        .with_body(Block::new(vec![
            Stmt::expr(Expr::new_object(TypeRef::named("Test8.AAA"), vec![])),
            Stmt::ret(Some(Expr::number("0"))),
        ]));
    CompilationUnit::new("Test8.java", Some("test")).with_type(
        TypeDecl::interface("Test8")
            .with_modifiers(Modifiers::PUBLIC)
            .with_member(MethodDecl::new("b", TypeRef::int()))
            .with_member(
                TypeDecl::class("AAA")
                    .with_modifiers(Modifiers::STATIC)
                    .with_member(FieldDecl::new("a", TypeRef::int())),
            )
            .with_member(
                TypeDecl::class("BBB")
                    .with_member(FieldDecl::new("b", TypeRef::int()))
                    .with_member(
                        FieldDecl::new("bbb", TypeRef::named("BBB"))
                            .with_init(Expr::new_object(TypeRef::named("BBB"), vec![])),
                    )
                    .with_member(
                        FieldDecl::new("test8", TypeRef::named("Test8"))
                            .with_modifiers(Modifiers::STATIC)
                            .with_init(Expr::new_anonymous(
                                TypeRef::named("Test8"),
                                vec![],
                                vec![anonymous_b.into()],
                            )),
                    ),
            ),
    )
}

/// Anonymous class reading creating-scope locals and an outer field.
///
/// ```java
/// package test;
/// class Capture {
///     int count;
///     void run(final int in) {
///         final String label = "x";
///         Runnable r = new Runnable() {
///             public void run() { System.out.println(label + in + count); }
///         };
///     }
/// }
/// ```
pub(crate) fn capture() -> CompilationUnit {
    let print = Expr::call_on(
        Expr::field(Expr::name("System"), "out"),
        "println",
        vec![Expr::binary(
            "+",
            Expr::binary("+", Expr::name("label"), Expr::name("in")),
            Expr::name("count"),
        )],
    );
    let anonymous_run = method("run", vec![Stmt::expr(print)]).with_modifiers(Modifiers::PUBLIC);
    CompilationUnit::new("Capture.java", Some("test")).with_type(
        TypeDecl::class("Capture")
            .with_member(FieldDecl::new("count", TypeRef::int()))
            .with_member(
                method(
                    "run",
                    vec![
                        Stmt::local("label", TypeRef::string(), Some(Expr::string("x"))),
                        Stmt::local(
                            "r",
                            TypeRef::named("Runnable"),
                            Some(Expr::new_anonymous(
                                TypeRef::named("Runnable"),
                                vec![],
                                vec![anonymous_run.into()],
                            )),
                        ),
                    ],
                )
                .with_param(Param::new("in", TypeRef::int())),
            ),
    )
}

/// Inner classes whose enclosing-instance slots are only needed through
/// creation sites.
///
/// ```java
/// package test;
/// class Outer {
///     int x;
///     class Inner { class Deep { int y = x; } }
///     class Plain { }
///     class Sibling { Inner make() { return new Inner(); } }
///     class Sibling2 { Plain make() { return new Plain(); } }
/// }
/// ```
pub(crate) fn outer_chain() -> CompilationUnit {
    let maker = |ty: &str| {
        MethodDecl::new("make", TypeRef::named(ty)).with_body(Block::new(vec![Stmt::ret(Some(
            Expr::new_object(TypeRef::named(ty), vec![]),
        ))]))
    };
    CompilationUnit::new("Outer.java", Some("test")).with_type(
        TypeDecl::class("Outer")
            .with_member(FieldDecl::new("x", TypeRef::int()))
            .with_member(TypeDecl::class("Inner").with_member(
                TypeDecl::class("Deep").with_member(
                    FieldDecl::new("y", TypeRef::int()).with_init(Expr::name("x")),
                ),
            ))
            .with_member(TypeDecl::class("Plain"))
            .with_member(TypeDecl::class("Sibling").with_member(maker("Inner")))
            .with_member(TypeDecl::class("Sibling2").with_member(maker("Plain"))),
    )
}

/// Statics declared before the statics they read.
///
/// ```java
/// package test;
/// class Statics {
///     static int c = b.value + b1.value;
///     static Holder b = new Holder();
///     static Holder b1 = new Holder();
///     static class Holder { int value = 1; }
/// }
/// ```
pub(crate) fn statics() -> CompilationUnit {
    let holder = || TypeRef::named("Holder");
    CompilationUnit::new("Statics.java", Some("test")).with_type(
        TypeDecl::class("Statics")
            .with_member(
                FieldDecl::new("c", TypeRef::int())
                    .with_modifiers(Modifiers::STATIC)
                    .with_init(Expr::binary(
                        "+",
                        Expr::field(Expr::name("b"), "value"),
                        Expr::field(Expr::name("b1"), "value"),
                    )),
            )
            .with_member(
                FieldDecl::new("b", holder())
                    .with_modifiers(Modifiers::STATIC)
                    .with_init(Expr::new_object(holder(), vec![])),
            )
            .with_member(
                FieldDecl::new("b1", holder())
                    .with_modifiers(Modifiers::STATIC)
                    .with_init(Expr::new_object(holder(), vec![])),
            )
            .with_member(
                TypeDecl::class("Holder")
                    .with_modifiers(Modifiers::STATIC)
                    .with_member(
                        FieldDecl::new("value", TypeRef::int()).with_init(Expr::number("1")),
                    ),
            ),
    )
}
