//! Structure validation for declared types.
//!
//! Validates that names can be emitted, that members are unique, and that
//! enum tagging and brands are used on shapes that support them.

use std::collections::HashMap;

use crate::config::ValidatorDialect;
use crate::diagnostic::GeneratorError;
use crate::emit::dialect;
use crate::ir::{Primitive, Tagging, TypeDecl, TypeKind, TypeRef, VariantPayload};
use crate::mapper::is_identifier;

/// Names a declaration may not take: TypeScript keywords and builtin types,
/// plus the identifiers the emitted modules import.
pub const RESERVED_NAMES: &[&str] = &[
    // Runtime imports
    "Brand", "Validator", "ValidationResult", "ValidationIssue", "v", "z",
    // Builtin types
    "any", "bigint", "boolean", "never", "null", "number", "object", "string", "symbol",
    "undefined", "unknown", "void", "Array", "Date", "Map", "Object", "Promise", "Record",
    "Set", "String", "Number", "Boolean", "Uint8Array", "BigInt",
    // Keywords
    "break", "case", "catch", "class", "const", "continue", "debugger", "default", "delete",
    "do", "else", "enum", "export", "extends", "false", "finally", "for", "function", "if",
    "import", "in", "instanceof", "new", "return", "super", "switch", "this", "throw", "true",
    "try", "type", "typeof", "var", "while", "with",
];

/// Validates every declaration; returns all problems found.
pub fn check_structure(decls: &[TypeDecl], dialect: ValidatorDialect) -> Vec<GeneratorError> {
    let mut errors = Vec::new();
    for decl in decls {
        check_decl(decl, &mut errors);
    }
    check_value_names(decls, dialect, &mut errors);
    errors
}

fn check_decl(decl: &TypeDecl, errors: &mut Vec<GeneratorError>) {
    let name = decl.name.as_str();

    if !is_identifier(name) {
        errors.push(GeneratorError::invalid(name, "type name is not a valid TypeScript identifier"));
    } else if RESERVED_NAMES.contains(&name) {
        errors.push(GeneratorError::invalid(name, "type name is reserved in the generated modules"));
    }

    for param in &decl.generics {
        if !is_identifier(param) || RESERVED_NAMES.contains(&param.as_str()) {
            errors.push(GeneratorError::invalid(
                name,
                format!("type parameter '{}' is not a usable TypeScript identifier", param),
            ));
        }
    }
    check_unique(decl.generics.iter().map(String::as_str), name, "type parameter", errors);

    match &decl.kind {
        TypeKind::Struct { fields } => {
            check_unique(fields.iter().map(|f| f.name.as_str()), name, "field", errors);
        }
        TypeKind::Enum { variants, tagging } => {
            if variants.is_empty() {
                errors.push(GeneratorError::invalid(name, "enum has no variants"));
            }
            check_unique(variants.iter().map(|v| v.name.as_str()), name, "variant", errors);

            for variant in variants {
                let location = format!("{}::{}", name, variant.name);
                if let VariantPayload::Struct(fields) = &variant.payload {
                    check_unique(fields.iter().map(|f| f.name.as_str()), &location, "field", errors);
                }

                match tagging {
                    Tagging::External => {}
                    Tagging::Internal { tag } => match &variant.payload {
                        VariantPayload::Unit => {}
                        VariantPayload::Struct(fields) => {
                            if fields.iter().any(|f| &f.name == tag) {
                                errors.push(GeneratorError::invalid(
                                    location,
                                    format!("field '{}' collides with the enum tag", tag),
                                ));
                            }
                        }
                        VariantPayload::Tuple(_) => errors.push(GeneratorError::invalid(
                            location,
                            "internally tagged enums support only unit and struct variants",
                        )),
                    },
                    Tagging::Adjacent { tag, content } => {
                        if tag == content {
                            errors.push(GeneratorError::invalid(
                                name,
                                format!("tag and content keys are both '{}'", tag),
                            ));
                            break;
                        }
                    }
                }
            }
        }
        TypeKind::Newtype {
            underlying, branded, ..
        } => {
            let scalar = matches!(
                underlying,
                TypeRef::Primitive(Primitive::Int { .. } | Primitive::String | Primitive::Char)
            );
            if *branded && !scalar {
                errors.push(GeneratorError::invalid(
                    name,
                    format!("branded types must wrap an integer or string, found {}", underlying),
                ));
            }
            if *branded && !decl.generics.is_empty() {
                errors.push(GeneratorError::invalid(name, "branded types cannot be generic"));
            }
        }
    }
}

fn check_unique<'a>(
    names: impl Iterator<Item = &'a str>,
    location: &str,
    what: &str,
    errors: &mut Vec<GeneratorError>,
) {
    let mut seen: Vec<&str> = Vec::new();
    for name in names {
        if seen.contains(&name) {
            errors.push(GeneratorError::invalid(location, format!("duplicate {} '{}'", what, name)));
        } else {
            seen.push(name);
        }
    }
}

/// Validators and brand constructors share the value namespace; two
/// declarations must not claim the same identifier.
fn check_value_names(decls: &[TypeDecl], dialect: ValidatorDialect, errors: &mut Vec<GeneratorError>) {
    let mut claimed: HashMap<String, &str> = HashMap::new();

    for decl in decls {
        let mut names = vec![dialect::validator_name(dialect, &decl.name)];
        if matches!(decl.kind, TypeKind::Newtype { branded: true, .. }) {
            names.push(decl.name.clone());
        }

        for value_name in names {
            match claimed.get(&value_name) {
                Some(owner) if *owner != decl.name => errors.push(GeneratorError::invalid(
                    decl.name.as_str(),
                    format!("generated identifier '{}' is already used by '{}'", value_name, owner),
                )),
                _ => {
                    claimed.insert(value_name, &decl.name);
                }
            }
        }
    }
}
