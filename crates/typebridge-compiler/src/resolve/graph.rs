//! Reference graph between declarations.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};

use crate::ir::TypeDecl;

/// Directed graph with an edge `A -> B` whenever `A` references `B`.
/// Nodes are declaration indices; unknown names contribute no edges.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    names: Vec<String>,
    deps: Vec<Vec<usize>>,
}

impl DependencyGraph {
    pub fn from_decls(decls: &[TypeDecl]) -> Self {
        let index: HashMap<&str, usize> = decls
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.as_str(), i))
            .collect();

        let deps = decls
            .iter()
            .map(|decl| {
                let mut out: Vec<usize> = Vec::new();
                for type_ref in decl.type_refs() {
                    type_ref.visit_named(&mut |name| {
                        if let Some(&i) = index.get(name) {
                            if !out.contains(&i) {
                                out.push(i);
                            }
                        }
                    });
                }
                out
            })
            .collect();

        Self {
            names: decls.iter().map(|d| d.name.clone()).collect(),
            deps,
        }
    }

    pub fn name(&self, node: usize) -> &str {
        &self.names[node]
    }

    /// Direct dependencies of `node`, in first-reference order.
    pub fn dependencies(&self, node: usize) -> &[usize] {
        &self.deps[node]
    }

    /// Kahn's algorithm; among ready nodes the lowest declaration index goes
    /// first. On failure returns every cycle among the unordered nodes.
    pub fn topological_order(&self) -> Result<Vec<usize>, Vec<Vec<usize>>> {
        let n = self.names.len();
        let mut pending: Vec<usize> = self.deps.iter().map(Vec::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (node, deps) in self.deps.iter().enumerate() {
            for &dep in deps {
                dependents[dep].push(node);
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = (0..n).filter(|&i| pending[i] == 0).map(Reverse).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(Reverse(node)) = ready.pop() {
            order.push(node);
            for &dependent in &dependents[node] {
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        if order.len() == n {
            Ok(order)
        } else {
            let remaining: HashSet<usize> = (0..n).filter(|&i| pending[i] > 0).collect();
            Err(self.find_cycles(&remaining))
        }
    }

    /// Cycles among `nodes`, each rotated to start at its lowest index and
    /// reported once, ordered by that index.
    fn find_cycles(&self, nodes: &HashSet<usize>) -> Vec<Vec<usize>> {
        let mut visited: HashSet<usize> = HashSet::new();
        let mut on_stack: HashSet<usize> = HashSet::new();
        let mut path: Vec<usize> = Vec::new();
        let mut cycles: Vec<Vec<usize>> = Vec::new();

        let mut starts: Vec<usize> = nodes.iter().copied().collect();
        starts.sort_unstable();
        for start in starts {
            if !visited.contains(&start) {
                self.find_cycles_dfs(start, nodes, &mut visited, &mut on_stack, &mut path, &mut cycles);
            }
        }

        let mut seen: HashSet<Vec<usize>> = HashSet::new();
        let mut unique: Vec<Vec<usize>> = Vec::new();
        for cycle in cycles {
            let mut members = cycle.clone();
            members.sort_unstable();
            if seen.insert(members) {
                unique.push(rotate_to_lowest(cycle));
            }
        }
        unique.sort();
        unique
    }

    fn find_cycles_dfs(
        &self,
        node: usize,
        nodes: &HashSet<usize>,
        visited: &mut HashSet<usize>,
        on_stack: &mut HashSet<usize>,
        path: &mut Vec<usize>,
        cycles: &mut Vec<Vec<usize>>,
    ) {
        visited.insert(node);
        on_stack.insert(node);
        path.push(node);

        for &dep in &self.deps[node] {
            if !nodes.contains(&dep) {
                continue;
            }
            if !visited.contains(&dep) {
                self.find_cycles_dfs(dep, nodes, visited, on_stack, path, cycles);
            } else if on_stack.contains(&dep) {
                if let Some(pos) = path.iter().position(|&x| x == dep) {
                    cycles.push(path[pos..].to_vec());
                }
            }
        }

        path.pop();
        on_stack.remove(&node);
    }
}

fn rotate_to_lowest(mut cycle: Vec<usize>) -> Vec<usize> {
    let lowest = cycle.iter().copied().min();
    if let Some(pos) = cycle.iter().position(|&n| Some(n) == lowest) {
        cycle.rotate_left(pos);
    }
    cycle
}
