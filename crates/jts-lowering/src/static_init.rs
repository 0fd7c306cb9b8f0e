//! Static initialization order.
//!
//! Static fields and static initializer blocks of all units form one graph;
//! `a -> b` when the initializer of `a` reads static field `b`. Members are
//! initialized dependency first, ties broken by declaration order, so a
//! program whose initializers only read earlier fields keeps its source
//! order.

use crate::program::{LoweredUnit, StaticInitRef};
use fixedbitset::FixedBitSet;
use jts_ast::visit::{Visitor, walk_expr};
use jts_ast::Expr;
use jts_binder::MemberKind;
use jts_common::{LoweringError, LoweringResult};
use rustc_hash::{FxHashMap, FxHashSet};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::debug;

/// Static member taking part in initialization.
struct Node {
    unit: usize,
    member: usize,
    path: String,
}

/// Collects `TypePath(path).name` reads.
#[derive(Default)]
struct StaticReads {
    reads: Vec<(String, String)>,
}

impl Visitor for StaticReads {
    fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::FieldAccess { target, name, .. } = expr {
            if let Expr::TypePath { path } = target.as_ref() {
                self.reads.push((path.clone(), name.clone()));
            }
        }
        walk_expr(self, expr);
    }
}

#[derive(Default)]
pub struct StaticInitOrderer;

impl StaticInitOrderer {
    pub fn new() -> Self {
        Self
    }

    /// Order the static members of `units` and record each member's position
    /// in `init_order`.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn order(&self, units: &mut [LoweredUnit]) -> LoweringResult<Vec<StaticInitRef>> {
        let mut nodes = Vec::new();
        let mut fields: FxHashMap<(&str, &str), usize> = FxHashMap::default();
        for (u, unit) in units.iter().enumerate() {
            for (m, member) in unit.members.iter().enumerate() {
                if !member.is_static
                    || !matches!(member.kind, MemberKind::Field | MemberKind::Initializer)
                {
                    continue;
                }
                if member.kind == MemberKind::Field {
                    fields.insert((unit.path.as_str(), member.name.as_str()), nodes.len());
                }
                nodes.push(Node {
                    unit: u,
                    member: m,
                    path: format!("{}.{}", unit.path, member.name),
                });
            }
        }

        // successors[b] holds every a whose initializer reads b.
        let mut successors: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        let mut in_degree = vec![0usize; nodes.len()];
        for (a, node) in nodes.iter().enumerate() {
            let member = &units[node.unit].members[node.member];
            let mut reads = StaticReads::default();
            if let Some(init) = &member.init {
                reads.visit_expr(init);
            }
            if let Some(body) = &member.body {
                reads.visit_block(body);
            }
            let mut seen = FxHashSet::default();
            for (path, name) in &reads.reads {
                let Some(&b) = fields.get(&(path.as_str(), name.as_str())) else {
                    continue;
                };
                if seen.insert(b) {
                    successors[b].push(a);
                    in_degree[a] += 1;
                }
            }
        }

        let order = match kahn(&successors, &mut in_degree) {
            Ok(order) => order,
            Err(remaining) => {
                let cycle = first_cycle(&successors, &remaining);
                let (unit, span) = cycle
                    .first()
                    .map(|&n| {
                        let unit = &units[nodes[n].unit];
                        (unit.path.clone(), unit.members[nodes[n].member].span)
                    })
                    .unwrap_or_default();
                return Err(LoweringError::StaticInitCycle {
                    unit,
                    cycle: cycle.into_iter().map(|n| nodes[n].path.clone()).collect(),
                    span,
                });
            }
        };

        let mut refs = Vec::with_capacity(order.len());
        for (position, &n) in order.iter().enumerate() {
            let node = &nodes[n];
            let unit = &mut units[node.unit];
            let member = &mut unit.members[node.member];
            member.init_order = Some(position as u32);
            refs.push(StaticInitRef {
                unit: unit.path.clone(),
                member: member.name.clone(),
            });
        }
        debug!(members = refs.len(), "static initialization order");
        Ok(refs)
    }
}

/// Kahn's algorithm, always taking the ready node declared first. On a cycle,
/// returns the nodes that never became ready.
fn kahn(successors: &[Vec<usize>], in_degree: &mut [usize]) -> Result<Vec<usize>, FixedBitSet> {
    let mut ready: BinaryHeap<Reverse<usize>> = in_degree
        .iter()
        .enumerate()
        .filter(|&(_, &d)| d == 0)
        .map(|(n, _)| Reverse(n))
        .collect();
    let mut order = Vec::with_capacity(successors.len());
    let mut done = FixedBitSet::with_capacity(successors.len());
    while let Some(Reverse(n)) = ready.pop() {
        order.push(n);
        done.insert(n);
        for &next in &successors[n] {
            in_degree[next] -= 1;
            if in_degree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }
    if order.len() == successors.len() {
        Ok(order)
    } else {
        let mut remaining = FixedBitSet::with_capacity(successors.len());
        remaining.extend((0..successors.len()).filter(|&n| !done.contains(n)));
        Err(remaining)
    }
}

/// First cyclic strongly connected component among `remaining`, members in
/// declaration order.
fn first_cycle(successors: &[Vec<usize>], remaining: &FixedBitSet) -> Vec<usize> {
    let mut tarjan = Tarjan {
        successors,
        remaining,
        index: vec![None; successors.len()],
        lowlink: vec![0; successors.len()],
        on_stack: FixedBitSet::with_capacity(successors.len()),
        stack: Vec::new(),
        next_index: 0,
        components: Vec::new(),
    };
    for n in remaining.ones() {
        if tarjan.index[n].is_none() {
            tarjan.strongconnect(n);
        }
    }
    let mut cycles: Vec<Vec<usize>> = tarjan
        .components
        .into_iter()
        .filter(|scc| scc.len() > 1 || successors[scc[0]].contains(&scc[0]))
        .map(|mut scc| {
            scc.sort_unstable();
            scc
        })
        .collect();
    cycles.sort_by_key(|scc| scc[0]);
    cycles.into_iter().next().unwrap_or_default()
}

struct Tarjan<'g> {
    successors: &'g [Vec<usize>],
    remaining: &'g FixedBitSet,
    index: Vec<Option<usize>>,
    lowlink: Vec<usize>,
    on_stack: FixedBitSet,
    stack: Vec<usize>,
    next_index: usize,
    components: Vec<Vec<usize>>,
}

impl Tarjan<'_> {
    fn strongconnect(&mut self, v: usize) {
        self.index[v] = Some(self.next_index);
        self.lowlink[v] = self.next_index;
        self.next_index += 1;
        self.stack.push(v);
        self.on_stack.insert(v);

        let (successors, remaining) = (self.successors, self.remaining);
        for &w in successors[v].iter().filter(|&&w| remaining.contains(w)) {
            match self.index[w] {
                None => {
                    self.strongconnect(w);
                    self.lowlink[v] = self.lowlink[v].min(self.lowlink[w]);
                }
                Some(index) if self.on_stack.contains(w) => {
                    self.lowlink[v] = self.lowlink[v].min(index);
                }
                Some(_) => {}
            }
        }

        if Some(self.lowlink[v]) == self.index[v] {
            let mut component = Vec::new();
            while let Some(w) = self.stack.pop() {
                self.on_stack.set(w, false);
                component.push(w);
                if w == v {
                    break;
                }
            }
            self.components.push(component);
        }
    }
}
