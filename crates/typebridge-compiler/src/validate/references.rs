//! Reference resolution.

use std::collections::HashMap;

use crate::diagnostic::GeneratorError;
use crate::ir::{TypeDecl, TypeRef};

/// Reports every named reference that does not resolve to a declaration of
/// the same run, every generic applied to the wrong number of arguments and
/// every parameter the referrer does not declare. Each (referrer, missing)
/// pair is reported once.
pub fn check_references(decls: &[TypeDecl]) -> Vec<GeneratorError> {
    let arity: HashMap<&str, usize> = decls.iter().map(|d| (d.name.as_str(), d.generics.len())).collect();
    let mut errors = Vec::new();

    for decl in decls {
        let mut missing: Vec<&str> = Vec::new();
        for type_ref in decl.type_refs() {
            type_ref.visit_named(&mut |name| {
                if !arity.contains_key(name) && !missing.contains(&name) {
                    missing.push(name);
                }
            });
        }
        errors.extend(missing.into_iter().map(|name| GeneratorError::UnresolvedReference {
            referrer: decl.name.clone(),
            missing: name.to_string(),
        }));

        for type_ref in decl.type_refs() {
            check_application(type_ref, decl, &arity, &mut errors);
        }
    }

    errors
}

fn check_application(
    type_ref: &TypeRef,
    decl: &TypeDecl,
    arity: &HashMap<&str, usize>,
    errors: &mut Vec<GeneratorError>,
) {
    let expected = |name: &str, found: usize| -> Option<String> {
        match arity.get(name) {
            Some(&n) if n != found => Some(format!(
                "'{}' takes {} type argument{}, found {}",
                name,
                n,
                if n == 1 { "" } else { "s" },
                found
            )),
            _ => None,
        }
    };

    match type_ref {
        TypeRef::Named(name) => {
            errors.extend(expected(name.as_str(), 0).map(|m| GeneratorError::invalid(&decl.name, m)))
        }
        TypeRef::Generic { name, args } => {
            errors.extend(expected(name.as_str(), args.len()).map(|m| GeneratorError::invalid(&decl.name, m)));
            args.iter().for_each(|arg| check_application(arg, decl, arity, errors));
        }
        TypeRef::Param(name) if !decl.generics.contains(name) => errors.push(GeneratorError::invalid(
            &decl.name,
            format!("type parameter '{}' is not declared", name),
        )),
        TypeRef::Sequence(inner) | TypeRef::Optional(inner) | TypeRef::Map(inner) => {
            check_application(inner, decl, arity, errors)
        }
        TypeRef::Tuple(items) => items.iter().for_each(|item| check_application(item, decl, arity, errors)),
        TypeRef::Primitive(_) | TypeRef::Param(_) | TypeRef::Opaque => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{FieldDecl, TypeRef};

    #[test]
    fn test_unresolved_reported_once() {
        let decls = vec![TypeDecl::structure(
            "Order",
            vec![
                FieldDecl::new("buyer", TypeRef::named("Customer")),
                FieldDecl::new("seller", TypeRef::optional(TypeRef::named("Customer"))),
            ],
        )];
        let errors = check_references(&decls);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "'Order' references unknown type 'Customer'");
    }

    #[test]
    fn test_generic_arity() {
        let decls = vec![
            TypeDecl::structure("Page", vec![FieldDecl::new("items", TypeRef::sequence(TypeRef::named("T")))])
                .with_generics(["T"]),
            TypeDecl::structure(
                "Feed",
                vec![
                    FieldDecl::new("ok", TypeRef::generic("Page", vec![TypeRef::named("Feed")])),
                    FieldDecl::new("bare", TypeRef::named("Page")),
                    FieldDecl::new("extra", TypeRef::generic("Page", vec![TypeRef::Opaque, TypeRef::Opaque])),
                    FieldDecl::new("stray", TypeRef::param("U")),
                ],
            ),
        ];
        let messages: Vec<String> = check_references(&decls).iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec![
                "Invalid declaration 'Feed': 'Page' takes 1 type argument, found 0",
                "Invalid declaration 'Feed': 'Page' takes 1 type argument, found 2",
                "Invalid declaration 'Feed': type parameter 'U' is not declared",
            ]
        );
    }

    #[test]
    fn test_resolved() {
        let decls = vec![
            TypeDecl::structure("Customer", vec![]),
            TypeDecl::structure("Order", vec![FieldDecl::new("buyer", TypeRef::named("Customer"))]),
        ];
        assert!(check_references(&decls).is_empty());
    }
}
