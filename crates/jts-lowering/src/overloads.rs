//! Overload consolidation.
//!
//! The target language has one slot per member name, so every group of
//! overloads (same owner, name and static-ness; constructors form their own
//! group) becomes a single dispatch entry plus renamed implementations:
//!
//! ```text
//! bbb()        -> bbb$0
//! bbb(int)     -> bbb$1      bbb(...args) selects by arity, then by
//! bbb(String)  -> bbb$2      runtime type where arities tie
//! ```
//!
//! Two overloads must differ in parameter count or in the runtime-erased type
//! of some parameter; otherwise the group is rejected.

use crate::program::LoweredMember;
use indexmap::IndexMap;
use jts_ast::{PrimitiveKind, TypeRef};
use jts_binder::{MemberKind, SymbolTable};
use jts_common::{LoweringError, LoweringOptions, LoweringResult};
use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Type of a value as it can be tested at runtime.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RuntimeType {
    Number,
    String,
    Boolean,
    Array,
    /// Class instance; `supertypes` lets `instanceof` accept subclasses.
    Instance {
        path: String,
        #[serde(skip)]
        supertypes: Vec<String>,
    },
    /// Interfaces, type parameters and `Object`: not testable.
    Object,
    Null,
}

impl RuntimeType {
    /// Instance of a class with no known supertypes.
    pub fn instance(path: impl Into<String>) -> Self {
        Self::Instance {
            path: path.into(),
            supertypes: Vec::new(),
        }
    }

    /// True when an argument of runtime type `actual` may be passed for a
    /// parameter erased to `self`.
    pub fn accepts(&self, actual: &RuntimeType) -> bool {
        match (self, actual) {
            (Self::Object, _) => true,
            (Self::Number | Self::Boolean, Self::Null) => false,
            (_, Self::Null) => true,
            (
                Self::Instance { path, .. },
                Self::Instance {
                    path: actual,
                    supertypes,
                },
            ) => path == actual || supertypes.contains(path),
            (expected, actual) => expected == actual,
        }
    }
}

impl fmt::Display for RuntimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => f.write_str("number"),
            Self::String => f.write_str("string"),
            Self::Boolean => f.write_str("boolean"),
            Self::Array => f.write_str("array"),
            Self::Instance { path, .. } => f.write_str(path),
            Self::Object => f.write_str("object"),
            Self::Null => f.write_str("null"),
        }
    }
}

/// `java.lang` types with a primitive runtime representation.
static BOXED_TYPES: Lazy<FxHashMap<&'static str, RuntimeType>> = Lazy::new(|| {
    let mut map = FxHashMap::default();
    for number in [
        "java.lang.Byte",
        "java.lang.Short",
        "java.lang.Integer",
        "java.lang.Long",
        "java.lang.Float",
        "java.lang.Double",
        "java.lang.Number",
    ] {
        map.insert(number, RuntimeType::Number);
    }
    map.insert("java.lang.String", RuntimeType::String);
    map.insert("java.lang.Character", RuntimeType::String);
    map.insert("java.lang.CharSequence", RuntimeType::String);
    map.insert("java.lang.Boolean", RuntimeType::Boolean);
    map.insert("java.lang.Object", RuntimeType::Object);
    map
});

/// Runtime erasure of a (qualified) parameter type.
pub fn erase(ty: &TypeRef, table: &SymbolTable, options: &LoweringOptions) -> RuntimeType {
    match ty {
        TypeRef::Primitive { primitive } => match primitive {
            PrimitiveKind::Char => RuntimeType::String,
            PrimitiveKind::Boolean => RuntimeType::Boolean,
            _ => RuntimeType::Number,
        },
        TypeRef::Array { .. } => RuntimeType::Array,
        TypeRef::Named {
            resolved: Some(path),
            ..
        } => {
            if let Some(boxed) = BOXED_TYPES.get(path.as_str()) {
                return boxed.clone();
            }
            match table.lookup(path) {
                Some(id) if table.unit(id).is_interface() => RuntimeType::Object,
                Some(id) => RuntimeType::Instance {
                    path: path.clone(),
                    supertypes: table.supertype_paths(id),
                },
                None if options.is_external_interface(path) => RuntimeType::Object,
                None => RuntimeType::instance(path.clone()),
            }
        }
        TypeRef::Named { resolved: None, .. } | TypeRef::Void => RuntimeType::Object,
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "count", rename_all = "camelCase")]
pub enum ArityTest {
    Exact(usize),
    AtLeast(usize),
}

impl ArityTest {
    pub fn matches(self, count: usize) -> bool {
        match self {
            Self::Exact(n) => count == n,
            Self::AtLeast(n) => count >= n,
        }
    }

    /// True when some argument count satisfies both tests.
    pub fn overlaps(self, other: ArityTest) -> bool {
        match (self, other) {
            (Self::Exact(n), Self::Exact(m)) => n == m,
            (Self::Exact(n), Self::AtLeast(m)) | (Self::AtLeast(m), Self::Exact(n)) => m <= n,
            (Self::AtLeast(_), Self::AtLeast(_)) => true,
        }
    }
}

/// Runtime check of argument `index`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeGuard {
    pub index: usize,
    pub expected: RuntimeType,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchCase {
    pub arity: ArityTest,
    pub guards: Vec<TypeGuard>,
    /// Emitted name of the implementation to call.
    pub target: String,
}

impl DispatchCase {
    pub fn matches(&self, args: &[RuntimeType]) -> bool {
        self.arity.matches(args.len())
            && self.guards.iter().all(|guard| {
                args.get(guard.index)
                    .is_some_and(|actual| guard.expected.accepts(actual))
            })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchParam {
    pub name: String,
    pub optional: bool,
}

/// Synthesized entry point of one overload group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchEntry {
    pub name: String,
    pub is_constructor: bool,
    pub is_static: bool,
    pub is_abstract: bool,
    pub params: Vec<DispatchParam>,
    /// Rest parameter, present when some overload is variadic.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rest: Option<String>,
    /// Cases in selection order.
    pub cases: Vec<DispatchCase>,
}

impl DispatchEntry {
    /// Case a call with arguments of the given runtime types dispatches to.
    pub fn select(&self, args: &[RuntimeType]) -> Option<&DispatchCase> {
        self.cases.iter().find(|case| case.matches(args))
    }
}

/// One overload: declaration position and runtime-erased parameters.
struct Signature {
    index: usize,
    erased: Vec<RuntimeType>,
    varargs: bool,
    /// Erased element type of the variadic parameter.
    rest: Option<RuntimeType>,
}

impl Signature {
    fn arity(&self) -> ArityTest {
        if self.varargs {
            ArityTest::AtLeast(self.erased.len() - 1)
        } else {
            ArityTest::Exact(self.erased.len())
        }
    }

    /// Positions tested at runtime: fixed parameters only.
    fn fixed(&self) -> usize {
        if self.varargs {
            self.erased.len() - 1
        } else {
            self.erased.len()
        }
    }

    /// Type accepted for argument `pos`, `None` past the last parameter.
    fn type_at(&self, pos: usize) -> Option<&RuntimeType> {
        if pos < self.fixed() {
            self.erased.get(pos)
        } else {
            self.rest.as_ref()
        }
    }

    /// Every call this overload accepts is also accepted by `other`, and the
    /// two differ: Java picks `self` when both apply.
    fn is_narrower_than(&self, other: &Signature) -> bool {
        self.arity() == other.arity()
            && (self.erased != other.erased || self.rest != other.rest)
            && (0..self.fixed()).all(|pos| other.erased[pos].accepts(&self.erased[pos]))
            && match (&self.rest, &other.rest) {
                (Some(mine), Some(theirs)) => theirs.accepts(mine),
                _ => true,
            }
    }
}

fn format_signature(erased: &[RuntimeType], varargs: bool) -> String {
    let mut out = String::from("(");
    for (i, ty) in erased.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        if varargs && i + 1 == erased.len() {
            out.push_str("...");
        }
        out.push_str(&ty.to_string());
    }
    out.push(')');
    out
}

pub struct OverloadConsolidator<'a> {
    table: &'a SymbolTable,
    options: &'a LoweringOptions,
}

impl<'a> OverloadConsolidator<'a> {
    pub fn new(table: &'a SymbolTable, options: &'a LoweringOptions) -> Self {
        Self { table, options }
    }

    /// Consolidate the overload groups among `members` of the unit at
    /// `unit_path`, renaming implementations in place.
    pub fn consolidate(
        &self,
        unit_path: &str,
        members: &mut [LoweredMember],
    ) -> LoweringResult<Vec<DispatchEntry>> {
        let mut groups: IndexMap<(bool, String, bool), Vec<usize>> = IndexMap::new();
        for (i, member) in members.iter().enumerate() {
            let is_ctor = match member.kind {
                MemberKind::Constructor => true,
                MemberKind::Method => false,
                MemberKind::Field | MemberKind::Initializer => continue,
            };
            groups
                .entry((is_ctor, member.source_name.clone(), member.is_static))
                .or_default()
                .push(i);
        }

        let mut entries = Vec::new();
        for ((is_ctor, name, is_static), indices) in groups {
            if indices.len() < 2 {
                continue;
            }
            let signatures: Vec<Signature> = indices
                .iter()
                .map(|&i| {
                    let params = &members[i].params;
                    let rest = params
                        .last()
                        .filter(|p| p.varargs)
                        .map(|p| erase(&p.ty, self.table, self.options));
                    Signature {
                        index: i,
                        erased: params
                            .iter()
                            .map(|p| {
                                if p.varargs {
                                    RuntimeType::Array
                                } else {
                                    erase(&p.ty, self.table, self.options)
                                }
                            })
                            .collect(),
                        varargs: rest.is_some(),
                        rest,
                    }
                })
                .collect();
            let display_name = if is_ctor {
                self.options.constructor_impl_name.clone()
            } else {
                name
            };
            self.check_distinguishable(unit_path, &display_name, members, &signatures)?;

            let entry = self.dispatch_entry(&display_name, is_ctor, is_static, members, &signatures);
            for (ordinal, signature) in signatures.iter().enumerate() {
                members[signature.index].name =
                    self.options.overload_impl_name(&display_name, ordinal);
            }
            debug!(
                unit = unit_path,
                name = %entry.name,
                overloads = signatures.len(),
                "consolidated overload group"
            );
            entries.push(entry);
        }
        Ok(entries)
    }

    fn check_distinguishable(
        &self,
        unit_path: &str,
        name: &str,
        members: &[LoweredMember],
        signatures: &[Signature],
    ) -> LoweringResult<()> {
        for (i, first) in signatures.iter().enumerate() {
            for second in &signatures[i + 1..] {
                if first.varargs == second.varargs && first.erased == second.erased {
                    return Err(LoweringError::AmbiguousOverload {
                        unit: unit_path.to_string(),
                        name: name.to_string(),
                        signature: format_signature(&first.erased, first.varargs),
                        first: members[first.index].span,
                        second: members[second.index].span,
                    });
                }
            }
        }
        Ok(())
    }

    fn dispatch_entry(
        &self,
        name: &str,
        is_ctor: bool,
        is_static: bool,
        members: &[LoweredMember],
        signatures: &[Signature],
    ) -> DispatchEntry {
        let variadic = signatures.iter().any(|s| s.varargs);
        let (params, rest) = if variadic {
            (Vec::new(), Some("args".to_string()))
        } else {
            (Self::dispatch_params(members, signatures), None)
        };

        // A case needs guards against every overload that accepts some of
        // the same argument counts, variadic ones included.
        let mut cases: Vec<(usize, DispatchCase)> = signatures
            .iter()
            .enumerate()
            .map(|(ordinal, signature)| {
                let arity = signature.arity();
                let peers: Vec<&Signature> = signatures
                    .iter()
                    .filter(|other| {
                        other.index != signature.index && other.arity().overlaps(arity)
                    })
                    .collect();
                let guards = (0..signature.fixed())
                    .filter(|&pos| {
                        let expected = &signature.erased[pos];
                        *expected != RuntimeType::Object
                            && peers.iter().any(|peer| peer.type_at(pos) != Some(expected))
                    })
                    .map(|pos| TypeGuard {
                        index: pos,
                        expected: signature.erased[pos].clone(),
                    })
                    .collect();
                let case = DispatchCase {
                    arity,
                    guards,
                    target: self.options.overload_impl_name(name, ordinal),
                };
                (ordinal, case)
            })
            .collect();

        // Exact arities before rest-absorbing ones, guarded before unguarded;
        // the sort is stable so ties keep declaration order.
        cases.sort_by_key(|(_, case)| match case.arity {
            ArityTest::Exact(n) => (0, n, case.guards.is_empty()),
            ArityTest::AtLeast(n) => (1, usize::MAX - n, case.guards.is_empty()),
        });
        let cases = Self::most_specific_first(cases, signatures);

        DispatchEntry {
            name: name.to_string(),
            is_constructor: is_ctor,
            is_static,
            is_abstract: signatures.iter().all(|s| members[s.index].is_abstract),
            params,
            rest,
            cases,
        }
    }

    /// Reorder so no case follows a narrower case of the same arity; an
    /// `instanceof` chain then reaches `f(Derived)` before `f(Base)`.
    fn most_specific_first(
        mut remaining: Vec<(usize, DispatchCase)>,
        signatures: &[Signature],
    ) -> Vec<DispatchCase> {
        let mut ordered = Vec::with_capacity(remaining.len());
        while !remaining.is_empty() {
            let next = (0..remaining.len())
                .find(|&i| {
                    let candidate = &signatures[remaining[i].0];
                    !remaining
                        .iter()
                        .any(|(other, _)| signatures[*other].is_narrower_than(candidate))
                })
                .unwrap_or(0);
            ordered.push(remaining.remove(next).1);
        }
        ordered
    }

    /// Parameters wide enough for every overload; positions some overloads
    /// lack are optional. Names come from the first overload declaring each
    /// position.
    fn dispatch_params(members: &[LoweredMember], signatures: &[Signature]) -> Vec<DispatchParam> {
        let min = signatures.iter().map(|s| s.erased.len()).min().unwrap_or(0);
        let max = signatures.iter().map(|s| s.erased.len()).max().unwrap_or(0);
        let mut used = FxHashSet::default();
        (0..max)
            .map(|pos| {
                let declared = signatures
                    .iter()
                    .find_map(|s| members[s.index].params.get(pos))
                    .map(|p| p.name.clone())
                    .filter(|name| !used.contains(name))
                    .unwrap_or_else(|| format!("arg{pos}"));
                used.insert(declared.clone());
                DispatchParam {
                    name: declared,
                    optional: pos >= min,
                }
            })
            .collect()
    }
}
