//! Dependency resolution: emission order and cycle detection.
//!
//! Referenced types precede the types that reference them. Among the types
//! whose references are all emitted, the earliest declared goes next, so
//! output is stable across runs. Cycles, including a
//! type referencing itself, are rejected with the full cycle path.

mod graph;

pub use graph::DependencyGraph;

use tracing::debug;

use crate::diagnostic::GeneratorError;
use crate::ir::TypeDecl;
use crate::validate::check_references;

/// Emission order as indices into `decls`, plus the graph it came from.
pub fn emission_order(decls: &[TypeDecl]) -> Result<(DependencyGraph, Vec<usize>), Vec<GeneratorError>> {
    let graph = DependencyGraph::from_decls(decls);
    match graph.topological_order() {
        Ok(order) => {
            debug!(types = order.len(), "resolved emission order");
            Ok((graph, order))
        }
        Err(cycles) => Err(cycles
            .into_iter()
            .map(|cycle| {
                let mut path: Vec<String> = cycle.iter().map(|&i| graph.name(i).to_string()).collect();
                path.push(graph.name(cycle[0]).to_string());
                GeneratorError::CyclicDependency { cycle: path }
            })
            .collect()),
    }
}

/// Orders declarations so every referenced type comes first.
///
/// Unknown references are reported before ordering is attempted.
pub fn resolve(decls: Vec<TypeDecl>) -> Result<Vec<TypeDecl>, GeneratorError> {
    GeneratorError::collect(check_references(&decls))?;
    let (_, order) = emission_order(&decls).map_err(GeneratorError::batch)?;

    let mut slots: Vec<Option<TypeDecl>> = decls.into_iter().map(Some).collect();
    Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FieldDecl, Primitive, TypeRef};

    #[test]
    fn test_resolve_orders_dependencies_first() {
        let decls = vec![
            TypeDecl::structure("User", vec![FieldDecl::new("id", TypeRef::named("UserId"))]),
            TypeDecl::newtype("UserId", Primitive::U32, true),
        ];
        let names: Vec<String> = resolve(decls).unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["UserId", "User"]);
    }

    #[test]
    fn test_cycle_names_both() {
        let decls = vec![
            TypeDecl::structure("A", vec![FieldDecl::new("b", TypeRef::named("B"))]),
            TypeDecl::structure("B", vec![FieldDecl::new("a", TypeRef::named("A"))]),
        ];
        match resolve(decls).unwrap_err() {
            GeneratorError::CyclicDependency { cycle } => assert_eq!(cycle, vec!["A", "B", "A"]),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_unresolved_before_ordering() {
        let decls = vec![TypeDecl::structure("A", vec![FieldDecl::new("b", TypeRef::named("Missing"))])];
        assert!(matches!(resolve(decls), Err(GeneratorError::UnresolvedReference { .. })));
    }
}
