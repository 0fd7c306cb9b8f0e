//! End-to-end lowering of one compilation unit.

use crate::flatten::Flattener;
use crate::overloads::OverloadConsolidator;
use crate::program::LoweredProgram;
use crate::qualifier::Qualifier;
use crate::static_init::StaticInitOrderer;
use crate::support::check_unsupported;
use jts_ast::CompilationUnit;
use jts_binder::SymbolTableBuilder;
use jts_common::{LoweringOptions, LoweringResult};
use tracing::{debug, info};

/// Run every stage on `unit`: unsupported-construct checks, symbol table,
/// qualification, overload consolidation, flattening and static ordering.
///
/// Any error aborts the whole unit; no partial program is returned.
#[tracing::instrument(level = "info", skip_all, fields(file = %unit.file_name))]
pub fn lower(unit: &CompilationUnit, options: &LoweringOptions) -> LoweringResult<LoweredProgram> {
    let diagnostics = check_unsupported(unit, options)?;

    let table = SymbolTableBuilder::new(options).build(unit)?;
    debug!(
        units = table.units.len(),
        members = table.members.len(),
        "symbol table built"
    );

    let mut qualified = Qualifier::new(&table, options).qualify_all()?;

    let consolidator = OverloadConsolidator::new(&table, options);
    for q in &mut qualified {
        q.dispatch = consolidator.consolidate(&table.unit(q.unit).path, &mut q.members)?;
    }

    let (mut units, capture_slots) = Flattener::new(&table, options).flatten(qualified)?;
    let static_init_order = StaticInitOrderer::new().order(&mut units)?;

    info!(
        units = units.len(),
        capture_slots = capture_slots.len(),
        warnings = diagnostics.len(),
        "lowered compilation unit"
    );
    Ok(LoweredProgram {
        file_name: unit.file_name.clone(),
        package: unit.package.clone(),
        units,
        capture_slots,
        static_init_order,
        diagnostics,
    })
}
