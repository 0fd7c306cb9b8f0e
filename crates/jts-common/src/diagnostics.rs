//! Diagnostic types and message lookup for the lowering engine.
//!
//! Every `LoweringError` maps to exactly one error code here, and every
//! unsupported-construct warning maps to a warning code. Message templates use
//! `{0}`, `{1}`, ... placeholders filled in by `format_message`.

use serde::Serialize;

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Suggestion = 2,
    Message = 3,
}

/// Related information for a diagnostic (e.g., "previously declared here").
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticRelatedInformation {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
}

/// A lowering diagnostic with optional related information.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
    /// Related information spans (e.g., the other member of an ambiguous pair)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub const fn error(file: String, start: u32, length: u32, message: String, code: u32) -> Self {
        Self {
            file,
            start,
            length,
            message_text: message,
            category: DiagnosticCategory::Error,
            code,
            related_information: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    #[must_use]
    pub const fn warning(
        file: String,
        start: u32,
        length: u32,
        message: String,
        code: u32,
    ) -> Self {
        Self {
            file,
            start,
            length,
            message_text: message,
            category: DiagnosticCategory::Warning,
            code,
            related_information: Vec::new(),
        }
    }

    /// Add related information to this diagnostic.
    #[must_use]
    pub fn with_related(mut self, file: String, start: u32, length: u32, message: String) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            file,
            start,
            length,
            message_text: message,
            category: DiagnosticCategory::Message,
            code: 0,
        });
        self
    }

    pub fn is_error(&self) -> bool {
        self.category == DiagnosticCategory::Error
    }
}

/// Diagnostic codes.
pub mod diagnostic_codes {
    pub const DUPLICATE_TYPE: u32 = 1001;
    pub const UNRESOLVED_IDENTIFIER: u32 = 1002;
    pub const AMBIGUOUS_OVERLOAD: u32 = 1003;
    pub const STATIC_INIT_CYCLE: u32 = 1004;
    pub const NO_ENCLOSING_INSTANCE: u32 = 1005;
    pub const UNSUPPORTED_CONSTRUCT: u32 = 1006;

    pub const THROWS_CLAUSE_IGNORED: u32 = 2001;
    pub const MODIFIER_IGNORED: u32 = 2002;
    pub const ASTERISK_IMPORT: u32 = 2003;
    pub const SYNCHRONIZED_BLOCK: u32 = 2004;
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: diagnostic_codes::DUPLICATE_TYPE,
        category: DiagnosticCategory::Error,
        message: "Duplicate type '{0}'.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNRESOLVED_IDENTIFIER,
        category: DiagnosticCategory::Error,
        message: "Cannot resolve identifier '{0}' in '{1}'.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::AMBIGUOUS_OVERLOAD,
        category: DiagnosticCategory::Error,
        message: "Overloads of '{0}' in '{1}' cannot be told apart at runtime: {2}.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::STATIC_INIT_CYCLE,
        category: DiagnosticCategory::Error,
        message: "Static initializers form a cycle: {0}.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::NO_ENCLOSING_INSTANCE,
        category: DiagnosticCategory::Error,
        message: "No enclosing instance of '{0}' is available in '{1}'.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::UNSUPPORTED_CONSTRUCT,
        category: DiagnosticCategory::Error,
        message: "Unsupported construct in '{0}': {1}.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::THROWS_CLAUSE_IGNORED,
        category: DiagnosticCategory::Warning,
        message: "Thrown exceptions of '{0}' are not supported and will be dropped.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::MODIFIER_IGNORED,
        category: DiagnosticCategory::Warning,
        message: "Modifiers not supported on '{0}': {1}.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::ASTERISK_IMPORT,
        category: DiagnosticCategory::Warning,
        message: "Asterisk import '{0}.*' is not supported.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::SYNCHRONIZED_BLOCK,
        category: DiagnosticCategory::Warning,
        message: "'synchronized' block in '{0}' is emitted as a plain block.",
    },
];

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

/// Get the message template for a diagnostic code.
#[must_use]
pub fn get_message_template(code: u32) -> Option<&'static str> {
    get_diagnostic_message(code).map(|m| m.message)
}

/// Format the message for `code`, or an empty string for unknown codes.
#[must_use]
pub fn message_for(code: u32, args: &[&str]) -> String {
    get_message_template(code)
        .map(|template| format_message(template, args))
        .unwrap_or_default()
}
