use super::*;
use jts_common::Span;

#[test]
fn test_decode_compilation_unit_from_json() {
    let json = r#"{
        "fileName": "Test6.java",
        "package": "test",
        "imports": [{ "path": "java.util", "isAsterisk": true }],
        "types": [{
            "name": "Test6",
            "kind": "class",
            "modifiers": "PUBLIC",
            "members": [
                { "member": "field", "name": "a1", "type": { "type": "named", "name": "A1" } },
                { "member": "field", "name": "b", "type": { "type": "primitive", "primitive": "int" },
                  "modifiers": "PRIVATE | STATIC",
                  "init": { "node": "literal", "value": { "kind": "number", "text": "1" } } },
                { "member": "type", "name": "A1", "kind": "class", "members": [] }
            ],
            "span": { "start": 0, "end": 120 }
        }]
    }"#;

    let unit: CompilationUnit = serde_json::from_str(json).unwrap();
    assert_eq!(unit.package.as_deref(), Some("test"));
    assert!(unit.imports[0].is_asterisk);

    let decl = &unit.types[0];
    assert_eq!(decl.kind, DeclKind::Class);
    assert_eq!(decl.modifiers, Modifiers::PUBLIC);
    assert_eq!(decl.span, Span::new(0, 120));
    assert_eq!(decl.members.len(), 3);

    match &decl.members[1] {
        MemberDecl::Field(field) => {
            assert!(field.modifiers.is_static());
            assert_eq!(field.modifiers.visibility(), Visibility::Private);
            assert_eq!(field.init, Some(Expr::number("1")));
        }
        other => panic!("expected field, got {other:?}"),
    }
    assert!(matches!(&decl.members[2], MemberDecl::Type(nested) if nested.name == "A1"));
}

#[test]
fn test_decode_statements_and_anonymous_class() {
    let json = r#"{
        "stmt": "localVar",
        "name": "r",
        "type": { "type": "named", "name": "Runnable" },
        "init": {
            "node": "new",
            "type": { "type": "named", "name": "Runnable" },
            "body": [{
                "member": "method",
                "name": "run",
                "returnType": { "type": "void" },
                "body": { "stmts": [{ "stmt": "return" }] }
            }]
        }
    }"#;
    let stmt: Stmt = serde_json::from_str(json).unwrap();
    let Stmt::LocalVar {
        init: Some(Expr::New { body: Some(body), .. }),
        ..
    } = stmt
    else {
        panic!("expected a local with an anonymous class initializer");
    };
    assert_eq!(body.len(), 1);
}

#[test]
fn test_unsupported_modifier_names() {
    let modifiers = Modifiers::PUBLIC | Modifiers::TRANSIENT | Modifiers::VOLATILE;
    assert_eq!(modifiers.unsupported_names(), vec!["transient", "volatile"]);
    assert!(Modifiers::FINAL.unsupported_names().is_empty());
}

#[test]
fn test_type_ref_display() {
    let list = TypeRef::Named {
        name: "List".to_string(),
        args: vec![TypeRef::string()],
        resolved: Some("java.util.List".to_string()),
    };
    assert_eq!(list.to_string(), "java.util.List<String>");
    assert_eq!(TypeRef::array(TypeRef::int()).to_string(), "int[]");
    assert_eq!(TypeRef::Void.to_string(), "void");
}

#[test]
fn test_dotted_name() {
    let expr = Expr::field(Expr::field(Expr::name("test"), "Test5"), "C");
    assert_eq!(expr.dotted_name().as_deref(), Some("test.Test5.C"));
    assert_eq!(Expr::field(Expr::this(), "a").dotted_name(), None);
}

#[test]
fn test_import_parts() {
    let import = Import::static_member("java.lang.Math.PI");
    assert_eq!(import.simple_name(), "PI");
    assert_eq!(import.qualifier(), "java.lang.Math");
    assert_eq!(Import::single("Widget").qualifier(), "");
}

#[test]
fn test_qualified_forms_serialize_compactly() {
    let expr = Expr::OuterThis {
        hops: vec![CaptureHop {
            from: "test.Test6.A".to_string(),
            to: "test.Test6".to_string(),
            slot: None,
        }],
    };
    let value = serde_json::to_value(&expr).unwrap();
    assert_eq!(value["node"], "outerThis");
    assert!(value["hops"][0].get("slot").is_none());
}
