//! File and JSON entry points around [`jts_lowering::lower`].
//!
//! Input is a `CompilationUnit` serialized as JSON, output a `LoweredProgram`.
//! Errors carry `anyhow` context naming the file or stage that failed; the
//! underlying `LoweringError` stays reachable through `downcast_ref`.

use anyhow::{Context, Result};
use jts_ast::CompilationUnit;
use jts_common::{Diagnostic, LoweringOptions};
use jts_lowering::LoweredProgram;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

/// Outcome of lowering one compilation unit, in the shape written to disk.
///
/// A failed run has no program and a single error diagnostic.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoweringReport {
    pub file_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<LoweredProgram>,
    pub diagnostics: Vec<Diagnostic>,
}

impl LoweringReport {
    pub fn succeeded(&self) -> bool {
        self.program.is_some()
    }
}

/// Read `LoweringOptions` from a JSON file; missing fields take their defaults.
pub fn load_options(path: &Path) -> Result<LoweringOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read options {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("invalid lowering options in {}", path.display()))
}

pub fn parse_unit(json: &str) -> Result<CompilationUnit> {
    serde_json::from_str(json).context("invalid compilation unit JSON")
}

/// Lower a compilation unit given as JSON.
pub fn lower_json(json: &str, options: &LoweringOptions) -> Result<LoweredProgram> {
    let unit = parse_unit(json)?;
    jts_lowering::lower(&unit, options)
        .with_context(|| format!("failed to lower {}", unit.file_name))
}

/// Lower the JSON compilation unit stored at `path`.
pub fn lower_file(path: &Path, options: &LoweringOptions) -> Result<LoweredProgram> {
    debug!(path = %path.display(), "reading compilation unit");
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    lower_json(&json, options).with_context(|| format!("while processing {}", path.display()))
}

/// Lower `unit`, turning a terminal error into an error diagnostic.
pub fn report(unit: &CompilationUnit, options: &LoweringOptions) -> LoweringReport {
    match jts_lowering::lower(unit, options) {
        Ok(program) => LoweringReport {
            file_name: unit.file_name.clone(),
            diagnostics: program.diagnostics.clone(),
            program: Some(program),
        },
        Err(err) => {
            info!(file = %unit.file_name, error = %err, "lowering failed");
            LoweringReport {
                file_name: unit.file_name.clone(),
                program: None,
                diagnostics: vec![err.to_diagnostic(&unit.file_name)],
            }
        }
    }
}

/// Write `report` as pretty-printed JSON, creating parent directories.
pub fn write_report(report: &LoweringReport, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(report)
        .with_context(|| format!("failed to serialize report for {}", report.file_name))?;
    std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
