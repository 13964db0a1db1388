//! IR documents.
//!
//! A document is either an array of declarations or an object with a
//! `types` array, in the serde form of [`TypeDecl`]:
//!
//! ```json
//! { "types": [
//!     { "name": "UserId", "kind": "newtype", "underlying": { "primitive": { "int": { "signed": false, "bits": 32 } } }, "branded": true }
//! ] }
//! ```
//!
//! A declaration with `generics` may refer to its parameters by name.

use std::path::Path;

use serde::Deserialize;

use super::Extractor;
use crate::diagnostic::GeneratorError;
use crate::ir::TypeDecl;

/// Reads declarations produced by another tool.
pub struct JsonExtractor;

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    List(Vec<TypeDecl>),
    Wrapped { types: Vec<TypeDecl> },
}

impl Extractor for JsonExtractor {
    fn language(&self) -> &str {
        "json"
    }

    fn extensions(&self) -> &[&str] {
        &["json"]
    }

    fn extract_source(&self, source: &str, path: &Path) -> Result<Vec<TypeDecl>, Vec<GeneratorError>> {
        let document: Document = serde_json::from_str(source).map_err(|e| {
            vec![GeneratorError::ParseFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }]
        })?;

        let mut types = match document {
            Document::List(types) | Document::Wrapped { types } => types,
        };
        types.iter_mut().for_each(TypeDecl::bind_params);
        Ok(types)
    }
}
