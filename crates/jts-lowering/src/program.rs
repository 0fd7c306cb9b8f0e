//! Output model of a lowering run.
//!
//! Everything an emitter needs is decided here: qualified bodies, the flat
//! list of units with their capture slots, one dispatch entry per overload
//! group and an initialization index for every static member.

use crate::overloads::DispatchEntry;
use jts_ast::{Block, Expr, TypeRef, Visibility};
use jts_binder::{MemberId, MemberKind, UnitKind};
use jts_common::{Diagnostic, Span};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoweredProgram {
    pub file_name: String,
    pub package: Option<String>,
    /// Every unit, nested and anonymous ones included, in declaration pre-order.
    pub units: Vec<LoweredUnit>,
    /// Capture slots of all units, indexed by `CaptureSlotId`.
    pub capture_slots: Vec<CaptureSlot>,
    /// Static members in initialization order.
    pub static_init_order: Vec<StaticInitRef>,
    /// Warnings for constructs that were dropped or simplified.
    pub diagnostics: Vec<Diagnostic>,
}

impl LoweredProgram {
    pub fn unit(&self, path: &str) -> Option<&LoweredUnit> {
        self.units.iter().find(|unit| unit.path == path)
    }

    pub fn slot(&self, id: CaptureSlotId) -> Option<&CaptureSlot> {
        self.capture_slots.get(id.0 as usize)
    }

    /// Capture slots of the unit at `path`, in slot order.
    pub fn slots_of(&self, path: &str) -> Vec<&CaptureSlot> {
        self.unit(path)
            .map(|unit| {
                unit.capture_slots
                    .iter()
                    .filter_map(|&id| self.slot(id))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoweredUnit {
    pub path: String,
    pub name: String,
    /// Path of the enclosing unit the unit is declared under, empty for
    /// top-level units in the default package.
    pub namespace: String,
    pub kind: UnitKind,
    pub is_static: bool,
    pub enclosing: Option<String>,
    pub extends: Option<TypeRef>,
    pub implements: Vec<TypeRef>,
    pub capture_slots: Vec<CaptureSlotId>,
    pub members: Vec<LoweredMember>,
    pub dispatch: Vec<DispatchEntry>,
    pub span: Span,
}

impl LoweredUnit {
    /// First member whose emitted name is `name`.
    pub fn member(&self, name: &str) -> Option<&LoweredMember> {
        self.members.iter().find(|member| member.name == name)
    }

    pub fn dispatch_for(&self, name: &str) -> Option<&DispatchEntry> {
        self.dispatch.iter().find(|entry| entry.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoweredParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeRef,
    pub varargs: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoweredMember {
    #[serde(skip)]
    pub id: MemberId,
    /// Emitted name; overload implementations are renamed (`bbb$1`).
    pub name: String,
    pub source_name: String,
    pub kind: MemberKind,
    pub is_static: bool,
    pub is_abstract: bool,
    pub visibility: Visibility,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeRef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<LoweredParam>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<TypeRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init: Option<Expr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Block>,
    /// Position in `LoweredProgram::static_init_order`, static members only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_order: Option<u32>,
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CaptureSlotId(pub u32);

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CaptureKind {
    /// Instance of the enclosing unit at `target`.
    EnclosingInstance { target: String },
    /// Value of a local of the creating scope; `local` is its source name.
    Local {
        local: String,
        emitted: String,
        #[serde(rename = "type")]
        ty: TypeRef,
    },
}

/// Synthesized field of a nested or anonymous unit, set at construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSlot {
    pub id: CaptureSlotId,
    /// Path of the unit the slot is declared on.
    pub owner: String,
    pub name: String,
    #[serde(flatten)]
    pub kind: CaptureKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticInitRef {
    pub unit: String,
    pub member: String,
}
