//! Source type references.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Primitive source types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    Boolean,
}

impl PrimitiveKind {
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::Char | Self::Boolean)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Char => "char",
            Self::Boolean => "boolean",
        }
    }
}

/// A type as written in the source.
///
/// `Named` carries the name exactly as written (`D`, `C.D`, `java.util.List`)
/// and, once qualified, the fully qualified path of the type it denotes in
/// `resolved`. Type parameters and types the engine cannot see stay
/// unresolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TypeRef {
    Void,
    Primitive {
        primitive: PrimitiveKind,
    },
    Named {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<TypeRef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resolved: Option<String>,
    },
    Array {
        element: Box<TypeRef>,
    },
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            args: Vec::new(),
            resolved: None,
        }
    }

    pub const fn primitive(primitive: PrimitiveKind) -> Self {
        Self::Primitive { primitive }
    }

    pub const fn int() -> Self {
        Self::primitive(PrimitiveKind::Int)
    }

    pub fn string() -> Self {
        Self::named("String")
    }

    pub fn array(element: TypeRef) -> Self {
        Self::Array {
            element: Box::new(element),
        }
    }

    pub const fn is_void(&self) -> bool {
        matches!(self, Self::Void)
    }

    /// Resolved path of a named type, if qualification found one.
    pub fn resolved_path(&self) -> Option<&str> {
        match self {
            Self::Named { resolved, .. } => resolved.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Primitive { primitive } => f.write_str(primitive.as_str()),
            Self::Named {
                name,
                args,
                resolved,
            } => {
                f.write_str(resolved.as_deref().unwrap_or(name))?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            Self::Array { element } => write!(f, "{element}[]"),
        }
    }
}
