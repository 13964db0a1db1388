//! Generator error types.
#![allow(unused_assignments)]

use std::path::PathBuf;
use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while generating bindings.
#[allow(unused_assignments)]
#[derive(Error, Diagnostic, Debug)]
pub enum GeneratorError {
    // =========================================================================
    // IO / Configuration Errors
    // =========================================================================
    #[error("Failed to access '{}': {message}", path.display())]
    #[diagnostic(code(typebridge::io::access_failed))]
    IoError {
        path: PathBuf,
        message: String,
    },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(
        code(typebridge::config::invalid),
        help("Run `typebridge init` to write a commented default typebridge.toml")
    )]
    InvalidConfig {
        message: String,
    },

    // =========================================================================
    // Extraction Errors
    // =========================================================================
    #[error("Failed to parse '{}': {message}", path.display())]
    #[diagnostic(code(typebridge::extract::parse_failed))]
    ParseFailed {
        path: PathBuf,
        message: String,
    },

    #[error("Cannot bridge '{item}' ({location}): {reason}")]
    #[diagnostic(
        code(typebridge::extract::unsupported_source),
        help("Only structs, enums and newtypes with serde-compatible attributes and type parameters can be bridged")
    )]
    UnsupportedSource {
        item: String,
        reason: String,
        location: String,
    },

    #[error("Unsupported source: {source_kind}")]
    #[diagnostic(
        code(typebridge::extract::unsupported_language),
        help("Supported sources are 'rust' and 'json'")
    )]
    UnsupportedLanguage {
        source_kind: String,
    },

    // =========================================================================
    // Resolution Errors
    // =========================================================================
    #[error("'{referrer}' references unknown type '{missing}'")]
    #[diagnostic(
        code(typebridge::resolve::unresolved_reference),
        help("Declare '{missing}' in the same run or annotate it so it is extracted")
    )]
    UnresolvedReference {
        referrer: String,
        missing: String,
    },

    #[error("Cyclic type dependency: {}", cycle.join(" -> "))]
    #[diagnostic(
        code(typebridge::resolve::cycle),
        help("Recursive types cannot be emitted; break the cycle with an intermediate representation")
    )]
    CyclicDependency {
        cycle: Vec<String>,
    },

    #[error("Type '{name}' is declared twice with different shapes")]
    #[diagnostic(
        code(typebridge::resolve::shape_conflict),
        help("Rename one declaration, or set conflict_policy = \"prefer-most-specified\"")
    )]
    ShapeConflict {
        name: String,
        first: String,
        second: String,
    },

    // =========================================================================
    // Mapping Errors
    // =========================================================================
    #[error("Constraint {constraint} on '{location}' cannot be represented by {target}")]
    #[diagnostic(
        code(typebridge::map::unrepresentable_constraint),
        help("Bounds must lie within the range of the declared type")
    )]
    UnrepresentableConstraint {
        location: String,
        constraint: String,
        target: String,
    },

    #[error("Unsupported primitive '{primitive}' at '{location}'")]
    #[diagnostic(
        code(typebridge::map::unsupported_primitive),
        help("Integers must be 8, 16, 32 or 64 bits wide and floats 32 or 64 bits")
    )]
    UnsupportedPrimitive {
        location: String,
        primitive: String,
    },

    #[error("Invalid declaration '{location}': {reason}")]
    #[diagnostic(code(typebridge::structure::invalid_declaration))]
    InvalidDeclaration {
        location: String,
        reason: String,
    },

    // =========================================================================
    // Batches
    // =========================================================================
    #[error("{} errors found", errors.len())]
    #[diagnostic(code(typebridge::diagnostics))]
    Diagnostics {
        #[related]
        errors: Vec<GeneratorError>,
    },
}

impl GeneratorError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::IoError {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn invalid(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDeclaration {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Folds a batch of errors into a single result.
    ///
    /// No errors is `Ok`, a single error is returned as is, several are
    /// wrapped in [`GeneratorError::Diagnostics`]. Nested batches are flattened.
    pub fn collect(errors: Vec<GeneratorError>) -> Result<(), GeneratorError> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self::batch(errors))
        }
    }

    /// Wraps errors in a single value, unwrapping a batch of one.
    pub fn batch(errors: Vec<GeneratorError>) -> GeneratorError {
        let mut flat: Vec<GeneratorError> = errors.into_iter().flat_map(|e| e.flatten()).collect();
        if flat.len() == 1 {
            flat.remove(0)
        } else {
            GeneratorError::Diagnostics { errors: flat }
        }
    }

    /// Unpacks a batch into its individual errors.
    pub fn flatten(self) -> Vec<GeneratorError> {
        match self {
            GeneratorError::Diagnostics { errors } => {
                errors.into_iter().flat_map(|e| e.flatten()).collect()
            }
            other => vec![other],
        }
    }

    /// Borrowing counterpart of [`GeneratorError::flatten`].
    pub fn iter(&self) -> Vec<&GeneratorError> {
        match self {
            GeneratorError::Diagnostics { errors } => errors.iter().flat_map(|e| e.iter()).collect(),
            other => vec![other],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect() {
        assert!(GeneratorError::collect(Vec::new()).is_ok());

        let single = GeneratorError::collect(vec![GeneratorError::invalid("A", "x")]);
        assert!(matches!(single, Err(GeneratorError::InvalidDeclaration { .. })));

        let nested = GeneratorError::Diagnostics {
            errors: vec![GeneratorError::invalid("A", "x"), GeneratorError::invalid("B", "y")],
        };
        let batch = GeneratorError::collect(vec![nested, GeneratorError::invalid("C", "z")]).unwrap_err();
        assert_eq!(batch.iter().len(), 3);
        assert_eq!(batch.to_string(), "3 errors found");
    }

    #[test]
    fn test_cycle_message() {
        let err = GeneratorError::CyclicDependency {
            cycle: vec!["A".into(), "B".into(), "A".into()],
        };
        assert_eq!(err.to_string(), "Cyclic type dependency: A -> B -> A");
    }
}
