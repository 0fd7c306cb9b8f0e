//! Reference qualification and structural lowering.
//!
//! Stages, in pipeline order (see [`pipeline::lower`]):
//!
//! - [`support`]: warnings for constructs with no target equivalent
//! - [`qualifier`]: explicit receivers for every reference
//! - [`overloads`]: one dispatch entry per overload group
//! - [`flatten`]: nested units lifted with capture slots
//! - [`static_init`]: dependency order of static initializers

pub mod flatten;
pub mod overloads;
pub mod pipeline;
pub mod program;
pub mod qualifier;
pub mod static_init;
pub mod support;

pub use flatten::Flattener;
pub use overloads::{
    ArityTest, DispatchCase, DispatchEntry, DispatchParam, OverloadConsolidator, RuntimeType,
    TypeGuard,
};
pub use pipeline::lower;
pub use program::{
    CaptureKind, CaptureSlot, CaptureSlotId, LoweredMember, LoweredParam, LoweredProgram,
    LoweredUnit, StaticInitRef,
};
pub use qualifier::{CaptureRequest, CreationSite, QualifiedUnit, Qualifier, RequestKind};
pub use static_init::StaticInitOrderer;

#[cfg(test)]
#[path = "../tests/test_support.rs"]
mod test_support;

#[cfg(test)]
#[path = "../tests/qualifier_tests.rs"]
mod qualifier_tests;

#[cfg(test)]
#[path = "../tests/overloads_tests.rs"]
mod overloads_tests;

#[cfg(test)]
#[path = "../tests/flatten_tests.rs"]
mod flatten_tests;

#[cfg(test)]
#[path = "../tests/static_init_tests.rs"]
mod static_init_tests;

#[cfg(test)]
#[path = "../tests/support_tests.rs"]
mod support_tests;
