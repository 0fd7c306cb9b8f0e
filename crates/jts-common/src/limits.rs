//! Centralized limits for the lowering engine.
//!
//! The engine recurses over expression and statement trees, and walks
//! enclosing-unit chains. These limits turn pathological inputs into a typed
//! `LoweringError::Unsupported` instead of a stack overflow.

/// Maximum nesting depth of expressions and statements inside one member body.
///
/// ```java
/// int x = ((((((((((((((((1 + 2) + 3) /* ... 500 levels ... */))))))))))))));
/// ```
pub const MAX_BODY_DEPTH: u32 = 500;

/// Maximum depth of the enclosing-unit chain (nested and anonymous classes).
pub const MAX_ENCLOSING_DEPTH: u32 = 64;

/// Maximum depth of supertype chains walked during inherited member lookup.
pub const MAX_SUPERTYPE_DEPTH: u32 = 64;
