//! Terminal errors of a lowering run.
//!
//! Every variant is unrecoverable for the current compilation unit: the engine
//! never emits a partially qualified AST. Each error carries the path of the
//! offending type unit and, where it applies, the member/name and span.

use crate::diagnostics::{Diagnostic, diagnostic_codes, message_for};
use crate::span::Span;
use std::fmt;

pub type LoweringResult<T> = Result<T, LoweringError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoweringError {
    /// Two type units registered the same path.
    DuplicateType {
        path: String,
        span: Span,
        previous: Span,
    },
    /// A name matched no binding in its scope chain and no imported symbol.
    UnresolvedIdentifier {
        unit: String,
        member: Option<String>,
        name: String,
        span: Span,
    },
    /// Two overloads of one group have the same runtime-erased parameters.
    AmbiguousOverload {
        unit: String,
        name: String,
        signature: String,
        first: Span,
        second: Span,
    },
    /// Static initializers depend on each other; `span` is the first
    /// member of `cycle`.
    StaticInitCycle {
        unit: String,
        cycle: Vec<String>,
        span: Span,
    },
    /// An inner class (or `Outer.this`) needs an enclosing instance that the
    /// current context does not have.
    NoEnclosingInstance {
        unit: String,
        target: String,
        span: Span,
    },
    /// A construct with no target equivalent, with `ignoreUnsupported` off.
    Unsupported {
        unit: String,
        reason: String,
        span: Span,
    },
}

impl LoweringError {
    /// Diagnostic code for this error.
    pub const fn code(&self) -> u32 {
        match self {
            Self::DuplicateType { .. } => diagnostic_codes::DUPLICATE_TYPE,
            Self::UnresolvedIdentifier { .. } => diagnostic_codes::UNRESOLVED_IDENTIFIER,
            Self::AmbiguousOverload { .. } => diagnostic_codes::AMBIGUOUS_OVERLOAD,
            Self::StaticInitCycle { .. } => diagnostic_codes::STATIC_INIT_CYCLE,
            Self::NoEnclosingInstance { .. } => diagnostic_codes::NO_ENCLOSING_INSTANCE,
            Self::Unsupported { .. } => diagnostic_codes::UNSUPPORTED_CONSTRUCT,
        }
    }

    /// Path of the type unit the error was raised in.
    pub fn unit_path(&self) -> &str {
        match self {
            Self::DuplicateType { path, .. } => path,
            Self::UnresolvedIdentifier { unit, .. }
            | Self::AmbiguousOverload { unit, .. }
            | Self::StaticInitCycle { unit, .. }
            | Self::NoEnclosingInstance { unit, .. }
            | Self::Unsupported { unit, .. } => unit,
        }
    }

    /// Primary source span, `Span::DUMMY` when the error has no single location.
    pub const fn span(&self) -> Span {
        match self {
            Self::DuplicateType { span, .. }
            | Self::UnresolvedIdentifier { span, .. }
            | Self::StaticInitCycle { span, .. }
            | Self::NoEnclosingInstance { span, .. }
            | Self::Unsupported { span, .. } => *span,
            Self::AmbiguousOverload { second, .. } => *second,
        }
    }

    fn message(&self) -> String {
        let code = self.code();
        match self {
            Self::DuplicateType { path, .. } => message_for(code, &[path]),
            Self::UnresolvedIdentifier {
                unit, member, name, ..
            } => {
                let location = match member {
                    Some(member) => format!("{unit}.{member}"),
                    None => unit.clone(),
                };
                message_for(code, &[name, &location])
            }
            Self::AmbiguousOverload {
                unit,
                name,
                signature,
                ..
            } => message_for(code, &[name, unit, signature]),
            Self::StaticInitCycle { cycle, .. } => {
                let mut members = cycle.join(" -> ");
                if let Some(first) = cycle.first() {
                    members.push_str(" -> ");
                    members.push_str(first);
                }
                message_for(code, &[&members])
            }
            Self::NoEnclosingInstance { unit, target, .. } => message_for(code, &[target, unit]),
            Self::Unsupported { unit, reason, .. } => message_for(code, &[unit, reason]),
        }
    }

    /// Convert into a `Diagnostic` for `file`.
    pub fn to_diagnostic(&self, file: &str) -> Diagnostic {
        let span = self.span();
        let diagnostic = Diagnostic::error(
            file.to_string(),
            span.start,
            span.len(),
            self.message(),
            self.code(),
        );
        match self {
            Self::DuplicateType { previous, .. } => diagnostic.with_related(
                file.to_string(),
                previous.start,
                previous.len(),
                "Previously declared here.".to_string(),
            ),
            Self::AmbiguousOverload { first, .. } => diagnostic.with_related(
                file.to_string(),
                first.start,
                first.len(),
                "Conflicting overload declared here.".to_string(),
            ),
            _ => diagnostic,
        }
    }
}

impl fmt::Display for LoweringError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JTS{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for LoweringError {}
