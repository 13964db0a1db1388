//! Duplicate declarations.
//!
//! A name declared twice with the same shape is merged silently. Different
//! shapes are a conflict, resolved according to [`ConflictPolicy`].

use std::collections::HashMap;

use tracing::warn;

use crate::config::ConflictPolicy;
use crate::diagnostic::GeneratorError;
use crate::ir::{TypeDecl, TypeKind, TypeRef, VariantPayload};

/// Deduplicates declarations by name, keeping first-declaration order.
pub fn merge_declarations(decls: Vec<TypeDecl>, policy: ConflictPolicy) -> (Vec<TypeDecl>, Vec<GeneratorError>) {
    let mut merged: Vec<TypeDecl> = Vec::with_capacity(decls.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut errors = Vec::new();

    for decl in decls {
        let Some(&slot) = index.get(&decl.name) else {
            index.insert(decl.name.clone(), merged.len());
            merged.push(decl);
            continue;
        };

        let kept = &mut merged[slot];
        if kept.same_shape(&decl) {
            if kept.doc.is_none() {
                kept.doc = decl.doc;
            }
            continue;
        }

        match policy {
            ConflictPolicy::Reject => errors.push(conflict(kept, &decl)),
            ConflictPolicy::PreferMostSpecified => {
                let (old, new) = (specificity(kept), specificity(&decl));
                if new > old {
                    warn!(name = %decl.name, ?old, ?new, "replacing less specified declaration");
                    *kept = decl;
                } else if new < old {
                    warn!(name = %decl.name, ?old, ?new, "ignoring less specified declaration");
                } else {
                    errors.push(conflict(kept, &decl));
                }
            }
        }
    }

    (merged, errors)
}

/// How completely a declaration is specified: members whose types are fully
/// resolved (no opaque placeholder anywhere), then total members.
pub fn specificity(decl: &TypeDecl) -> (usize, usize) {
    let refs: Vec<&TypeRef> = match &decl.kind {
        TypeKind::Struct { fields } => fields.iter().map(|f| &f.type_ref).collect(),
        TypeKind::Enum { variants, .. } => variants
            .iter()
            .flat_map(|v| match &v.payload {
                VariantPayload::Unit => Vec::new(),
                VariantPayload::Tuple(types) => types.iter().collect(),
                VariantPayload::Struct(fields) => fields.iter().map(|f| &f.type_ref).collect(),
            })
            .collect(),
        TypeKind::Newtype { underlying, .. } => vec![underlying],
    };

    let members = match &decl.kind {
        TypeKind::Enum { variants, .. } => variants.len().max(refs.len()),
        _ => refs.len(),
    };
    let resolved = refs.iter().filter(|r| !r.contains_opaque()).count();
    (resolved, members)
}

fn conflict(first: &TypeDecl, second: &TypeDecl) -> GeneratorError {
    GeneratorError::ShapeConflict {
        name: first.name.clone(),
        first: describe(first),
        second: describe(second),
    }
}

fn describe(decl: &TypeDecl) -> String {
    let (resolved, members) = specificity(decl);
    let origin = decl
        .source
        .as_ref()
        .map(|s| format!(" at {}", s))
        .unwrap_or_default();
    format!("{} with {} members ({} resolved){}", decl.kind_name(), members, resolved, origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FieldDecl, Primitive};

    fn opaque_user() -> TypeDecl {
        TypeDecl::structure(
            "User",
            vec![
                FieldDecl::new("id", TypeRef::Opaque),
                FieldDecl::new("name", Primitive::String),
            ],
        )
    }

    fn typed_user() -> TypeDecl {
        TypeDecl::structure(
            "User",
            vec![
                FieldDecl::new("id", TypeRef::named("UserId")),
                FieldDecl::new("name", Primitive::String),
            ],
        )
    }

    #[test]
    fn test_identical_redeclaration_merges() {
        let (merged, errors) = merge_declarations(
            vec![typed_user(), typed_user().with_doc("A user")],
            ConflictPolicy::Reject,
        );
        assert!(errors.is_empty());
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].doc.as_deref(), Some("A user"));
    }

    #[test]
    fn test_reject_policy() {
        let (merged, errors) = merge_declarations(vec![opaque_user(), typed_user()], ConflictPolicy::Reject);
        assert_eq!(merged.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(matches!(&errors[0], GeneratorError::ShapeConflict { name, .. } if name == "User"));
    }

    #[test]
    fn test_prefer_most_specified_is_order_independent() {
        for decls in [vec![opaque_user(), typed_user()], vec![typed_user(), opaque_user()]] {
            let (merged, errors) = merge_declarations(decls, ConflictPolicy::PreferMostSpecified);
            assert!(errors.is_empty());
            assert_eq!(merged, vec![typed_user()]);
        }
    }

    #[test]
    fn test_prefer_most_specified_rejects_ties() {
        let other = TypeDecl::structure(
            "User",
            vec![
                FieldDecl::new("id", Primitive::U32),
                FieldDecl::new("name", Primitive::String),
            ],
        );
        let (_, errors) = merge_declarations(vec![typed_user(), other], ConflictPolicy::PreferMostSpecified);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_specificity() {
        assert_eq!(specificity(&opaque_user()), (1, 2));
        assert_eq!(specificity(&typed_user()), (2, 2));
    }
}
