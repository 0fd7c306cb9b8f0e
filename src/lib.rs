//! Reference qualification and structural lowering for Java-to-TypeScript
//! translation.
//!
//! The engine takes one parsed Java compilation unit and produces a program
//! in which every reference is explicit and every nested type is standalone:
//!
//! - [`binder`]: symbol table, scope chains and name resolution
//! - [`lowering`]: qualification, overload dispatch, flattening and static
//!   initialization order
//! - [`driver`]: JSON and file entry points
//!
//! ```ignore
//! let program = jts::lower(&unit, &jts::LoweringOptions::default())?;
//! ```

pub use jts_ast as ast;
pub use jts_binder as binder;
pub use jts_common as common;
pub use jts_lowering as lowering;

pub use jts_common::{Diagnostic, DiagnosticCategory, LoweringError, LoweringOptions, Span};
pub use jts_lowering::{LoweredProgram, LoweredUnit, lower};

pub mod driver;
pub use driver::{LoweringReport, lower_file, lower_json};

// Opt-in tracing output (JTS_LOG / JTS_LOG_FORMAT)
pub mod tracing_config;
