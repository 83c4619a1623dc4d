//! Dependency analysis for composition rules
//!
//! Rules read other attributes, so targets have to be evaluated
//! dependency-first. The analyzer builds a directed graph with an edge
//! `dependency -> target` for every plain reference between two rule
//! targets, reports every cycle it finds, and produces an evaluation order
//! in which cycle members are detached from their dependencies.
//!
//! Wildcard references (`trait.*`) never create edges: a wildcard reads
//! whatever values have been published at the time the rule runs.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap, HashSet};

use persona_expr::{Expression, Namespace};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::target::Target;

/// The references one target's rules make
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub target: Target,
    /// Canonical `namespace.name` and `namespace.*` strings
    pub dependencies: BTreeSet<String>,
}

impl Dependency {
    pub fn new(target: Target, expression: &Expression) -> Self {
        Self {
            target,
            dependencies: extract_references(expression),
        }
    }
}

/// Evaluation order and cycle report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyAnalysis {
    /// Every target, dependencies before dependents
    pub order: Vec<Target>,
    /// Each cycle starts and ends on the same target
    pub cycles: Vec<Vec<Target>>,
}

impl DependencyAnalysis {
    pub fn has_cycles(&self) -> bool {
        !self.cycles.is_empty()
    }

    /// Whether a target is a member of any reported cycle
    pub fn in_cycle(&self, target: &Target) -> bool {
        self.cycles.iter().any(|cycle| cycle.contains(target))
    }
}

/// Collect the unique references an expression makes
///
/// Known namespaces are written in canonical form, so `exp.years` and
/// `experience.years` are the same dependency.
pub fn extract_references(expression: &Expression) -> BTreeSet<String> {
    let mut references = BTreeSet::new();
    expression.walk(&mut |node| match node {
        Expression::Reference { namespace, name } => {
            references.insert(format!("{}.{}", canonical_namespace(namespace), name));
        }
        Expression::Wildcard { namespace } => {
            references.insert(format!("{}.*", canonical_namespace(namespace)));
        }
        _ => {}
    });
    references
}

fn canonical_namespace(prefix: &str) -> &str {
    Namespace::from_prefix(prefix).map_or(prefix, |ns| ns.as_str())
}

fn is_wildcard(reference: &str) -> bool {
    reference.ends_with(".*")
}

/// Order targets dependency-first and report cycles
///
/// Several entries may name the same target (one per rule); their
/// references are merged. References to attributes that are not rule
/// targets (anchors, quirks) impose no ordering. Targets without an
/// ordering constraint between them come out in [`Target`] order.
pub fn analyze_dependencies(dependencies: &[Dependency]) -> DependencyAnalysis {
    let mut merged: BTreeMap<&Target, BTreeSet<Target>> = BTreeMap::new();
    for dependency in dependencies {
        let entry = merged.entry(&dependency.target).or_default();
        entry.extend(
            dependency
                .dependencies
                .iter()
                .filter(|reference| !is_wildcard(reference))
                .filter_map(|reference| reference.parse::<Target>().ok()),
        );
    }

    // Nodes are added in target order, so index order is target order
    let mut graph: DiGraph<Target, ()> = DiGraph::new();
    let mut nodes: BTreeMap<&Target, NodeIndex> = BTreeMap::new();
    for target in merged.keys() {
        nodes.insert(*target, graph.add_node((*target).clone()));
    }

    for (target, references) in &merged {
        let to = nodes[target];
        for reference in references {
            if let Some(&from) = nodes.get(reference) {
                graph.update_edge(from, to, ());
            }
        }
    }

    let cycles = find_cycles(&graph);
    for cycle in &cycles {
        let path: Vec<String> = cycle.iter().map(|&n| graph[n].to_string()).collect();
        tracing::info!("Dependency cycle detected: {}", path.join(" -> "));
    }

    let cyclic: HashSet<NodeIndex> = cycles.iter().flatten().copied().collect();
    let order = topological_order(&graph, &cyclic);
    tracing::debug!(
        "Evaluation order: {}",
        order
            .iter()
            .map(|&n| graph[n].to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    DependencyAnalysis {
        order: order.into_iter().map(|n| graph[n].clone()).collect(),
        cycles: cycles
            .into_iter()
            .map(|cycle| cycle.into_iter().map(|n| graph[n].clone()).collect())
            .collect(),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Depth-first search reporting one cycle per back edge
fn find_cycles(graph: &DiGraph<Target, ()>) -> Vec<Vec<NodeIndex>> {
    let mut marks = vec![Mark::Unvisited; graph.node_count()];
    let mut stack = Vec::new();
    let mut cycles = Vec::new();

    for start in graph.node_indices() {
        if marks[start.index()] == Mark::Unvisited {
            visit(graph, start, &mut marks, &mut stack, &mut cycles);
        }
    }

    cycles
}

fn visit(
    graph: &DiGraph<Target, ()>,
    node: NodeIndex,
    marks: &mut [Mark],
    stack: &mut Vec<NodeIndex>,
    cycles: &mut Vec<Vec<NodeIndex>>,
) {
    marks[node.index()] = Mark::OnStack;
    stack.push(node);

    let mut successors: Vec<NodeIndex> = graph.neighbors(node).collect();
    successors.sort();

    for next in successors {
        match marks[next.index()] {
            Mark::Unvisited => visit(graph, next, marks, stack, cycles),
            Mark::OnStack => {
                if let Some(pos) = stack.iter().position(|&n| n == next) {
                    let mut cycle = stack[pos..].to_vec();
                    cycle.push(next);
                    cycles.push(cycle);
                }
            }
            Mark::Done => {}
        }
    }

    stack.pop();
    marks[node.index()] = Mark::Done;
}

/// Kahn's algorithm with edges into cycle members removed
fn topological_order(graph: &DiGraph<Target, ()>, cyclic: &HashSet<NodeIndex>) -> Vec<NodeIndex> {
    let mut in_degree = vec![0usize; graph.node_count()];
    for edge in graph.edge_references() {
        if !cyclic.contains(&edge.target()) {
            in_degree[edge.target().index()] += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<NodeIndex>> = graph
        .node_indices()
        .filter(|n| in_degree[n.index()] == 0)
        .map(Reverse)
        .collect();

    let mut order = Vec::with_capacity(graph.node_count());
    while let Some(Reverse(node)) = ready.pop() {
        order.push(node);
        for edge in graph.edges(node) {
            let next = edge.target();
            if cyclic.contains(&next) {
                continue;
            }
            in_degree[next.index()] -= 1;
            if in_degree[next.index()] == 0 {
                ready.push(Reverse(next));
            }
        }
    }

    if order.len() < graph.node_count() {
        let placed: HashSet<NodeIndex> = order.iter().copied().collect();
        for node in graph.node_indices().filter(|n| !placed.contains(n)) {
            tracing::warn!("Unordered target {} appended to evaluation order", graph[node]);
            order.push(node);
        }
    }

    order
}
