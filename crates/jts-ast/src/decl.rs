//! Declarations: compilation units, types and members.

use crate::expr::Expr;
use crate::modifiers::Modifiers;
use crate::stmt::Block;
use crate::types::TypeRef;
use jts_common::Span;
use serde::{Deserialize, Serialize};

/// One parsed source file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompilationUnit {
    pub file_name: String,
    #[serde(default)]
    pub package: Option<String>,
    #[serde(default)]
    pub imports: Vec<Import>,
    pub types: Vec<TypeDecl>,
}

impl CompilationUnit {
    pub fn new(file_name: impl Into<String>, package: Option<&str>) -> Self {
        Self {
            file_name: file_name.into(),
            package: package.map(str::to_string),
            imports: Vec::new(),
            types: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_import(mut self, import: Import) -> Self {
        self.imports.push(import);
        self
    }

    #[must_use]
    pub fn with_type(mut self, decl: TypeDecl) -> Self {
        self.types.push(decl);
        self
    }
}

/// `import a.b.C;`, `import a.b.*;`, `import static a.b.C.x;`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Import {
    /// Dotted path without the trailing `.*`.
    pub path: String,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_asterisk: bool,
    #[serde(default)]
    pub span: Span,
}

impl Import {
    pub fn single(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_static: false,
            is_asterisk: false,
            span: Span::DUMMY,
        }
    }

    pub fn asterisk(path: impl Into<String>) -> Self {
        Self {
            is_asterisk: true,
            ..Self::single(path)
        }
    }

    pub fn static_member(path: impl Into<String>) -> Self {
        Self {
            is_static: true,
            ..Self::single(path)
        }
    }

    /// Last path segment (`C` for `a.b.C`).
    pub fn simple_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    /// Everything before the last segment (`a.b` for `a.b.C`).
    pub fn qualifier(&self) -> &str {
        self.path
            .rsplit_once('.')
            .map_or("", |(qualifier, _)| qualifier)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclKind {
    Class,
    Interface,
}

/// A class or interface declaration.
///
/// For interfaces, extended interfaces are listed in `implements`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeDecl {
    pub name: String,
    pub kind: DeclKind,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub extends: Option<TypeRef>,
    #[serde(default)]
    pub implements: Vec<TypeRef>,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
    #[serde(default)]
    pub span: Span,
}

impl TypeDecl {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: DeclKind::Class,
            modifiers: Modifiers::empty(),
            type_params: Vec::new(),
            extends: None,
            implements: Vec::new(),
            members: Vec::new(),
            span: Span::DUMMY,
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            kind: DeclKind::Interface,
            ..Self::class(name)
        }
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub fn extending(mut self, base: TypeRef) -> Self {
        self.extends = Some(base);
        self
    }

    #[must_use]
    pub fn implementing(mut self, interface: TypeRef) -> Self {
        self.implements.push(interface);
        self
    }

    #[must_use]
    pub fn with_member(mut self, member: impl Into<MemberDecl>) -> Self {
        self.members.push(member.into());
        self
    }

    #[must_use]
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "member", rename_all = "camelCase")]
pub enum MemberDecl {
    Field(FieldDecl),
    Method(MethodDecl),
    Constructor(ConstructorDecl),
    Initializer(InitializerDecl),
    Type(TypeDecl),
}

impl From<FieldDecl> for MemberDecl {
    fn from(decl: FieldDecl) -> Self {
        Self::Field(decl)
    }
}

impl From<MethodDecl> for MemberDecl {
    fn from(decl: MethodDecl) -> Self {
        Self::Method(decl)
    }
}

impl From<ConstructorDecl> for MemberDecl {
    fn from(decl: ConstructorDecl) -> Self {
        Self::Constructor(decl)
    }
}

impl From<InitializerDecl> for MemberDecl {
    fn from(decl: InitializerDecl) -> Self {
        Self::Initializer(decl)
    }
}

impl From<TypeDecl> for MemberDecl {
    fn from(decl: TypeDecl) -> Self {
        Self::Type(decl)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub init: Option<Expr>,
    #[serde(default)]
    pub span: Span,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            modifiers: Modifiers::empty(),
            init: None,
            span: Span::DUMMY,
        }
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub fn with_init(mut self, init: Expr) -> Self {
        self.init = Some(init);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Param {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    #[serde(default)]
    pub varargs: bool,
    #[serde(default)]
    pub is_final: bool,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            varargs: false,
            is_final: false,
        }
    }

    /// A trailing `T... name` parameter; `ty` is the element type.
    pub fn varargs(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            varargs: true,
            ..Self::new(name, ty)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDecl {
    pub name: String,
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub type_params: Vec<String>,
    #[serde(default)]
    pub params: Vec<Param>,
    pub return_type: TypeRef,
    #[serde(default)]
    pub throws: Vec<TypeRef>,
    /// `None` for abstract and interface methods.
    #[serde(default)]
    pub body: Option<Block>,
    #[serde(default)]
    pub span: Span,
}

impl MethodDecl {
    pub fn new(name: impl Into<String>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            modifiers: Modifiers::empty(),
            type_params: Vec::new(),
            params: Vec::new(),
            return_type,
            throws: Vec::new(),
            body: None,
            span: Span::DUMMY,
        }
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: Block) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn at(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorDecl {
    #[serde(default)]
    pub modifiers: Modifiers,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub throws: Vec<TypeRef>,
    pub body: Block,
    #[serde(default)]
    pub span: Span,
}

impl ConstructorDecl {
    pub fn new(body: Block) -> Self {
        Self {
            modifiers: Modifiers::empty(),
            params: Vec::new(),
            throws: Vec::new(),
            body,
            span: Span::DUMMY,
        }
    }

    #[must_use]
    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializerDecl {
    #[serde(default)]
    pub is_static: bool,
    pub body: Block,
    #[serde(default)]
    pub span: Span,
}
