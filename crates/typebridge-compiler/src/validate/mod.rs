//! Consistency checks over a whole run of declarations.

mod conflict;
mod references;
mod structure;

pub use conflict::{merge_declarations, specificity};
pub use references::check_references;
pub use structure::{check_structure, RESERVED_NAMES};

use crate::config::{ConflictPolicy, ValidatorDialect};
use crate::diagnostic::GeneratorError;
use crate::ir::TypeDecl;

/// Merges duplicates and validates every declaration.
///
/// Returns the deduplicated declarations in first-declaration order together
/// with every problem found; callers decide whether to continue.
pub fn validate_types(
    decls: Vec<TypeDecl>,
    policy: ConflictPolicy,
    dialect: ValidatorDialect,
) -> (Vec<TypeDecl>, Vec<GeneratorError>) {
    let (decls, mut errors) = merge_declarations(decls, policy);
    errors.extend(check_structure(&decls, dialect));
    errors.extend(check_references(&decls));
    (decls, errors)
}
