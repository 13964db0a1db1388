//! Source extractors for turning declarations into IR.
//!
//! Each extractor is responsible for:
//! 1. Reading source files of its kind
//! 2. Converting the declarations it finds into [`TypeDecl`]s
//!
//! Files are visited in path order, so declaration order (and therefore
//! emission order among independent types) is stable across runs.

pub mod json;
pub mod rust;

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::diagnostic::GeneratorError;
use crate::ir::TypeDecl;

/// Trait for source extractors.
pub trait Extractor {
    /// Returns the source kind name (e.g., "rust", "json").
    fn language(&self) -> &str;

    /// Returns file extensions this extractor handles (e.g., ["rs"]).
    fn extensions(&self) -> &[&str];

    /// Extracts the declarations of one file. Every problem in the file is
    /// reported, not only the first.
    fn extract_source(&self, source: &str, path: &Path) -> Result<Vec<TypeDecl>, Vec<GeneratorError>>;

    /// Extracts from a single file or from every matching file under a
    /// directory.
    fn extract_path(&self, root: &Path) -> Result<Vec<TypeDecl>, GeneratorError> {
        let mut decls = Vec::new();
        let mut errors = Vec::new();

        for path in source_files(root, self.extensions())? {
            let source = std::fs::read_to_string(&path).map_err(|e| GeneratorError::io(&path, e.to_string()))?;
            match self.extract_source(&source, &path) {
                Ok(found) => {
                    debug!(path = %path.display(), types = found.len(), "extracted declarations");
                    decls.extend(found);
                }
                Err(mut file_errors) => errors.append(&mut file_errors),
            }
        }

        GeneratorError::collect(errors)?;
        Ok(decls)
    }
}

/// Creates an extractor for the given source kind.
pub fn create_extractor(language: &str) -> Result<Box<dyn Extractor>, GeneratorError> {
    match language {
        "rust" | "rs" => Ok(Box::new(rust::RustExtractor)),
        "json" => Ok(Box::new(json::JsonExtractor)),
        _ => Err(GeneratorError::UnsupportedLanguage {
            source_kind: language.to_string(),
        }),
    }
}

/// Files under `root` with one of `extensions`, sorted by path. Hidden
/// entries, `target/` and `node_modules/` are skipped.
pub fn source_files(root: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, GeneratorError> {
    if !root.exists() {
        return Err(GeneratorError::io(root, "input path does not exist"));
    }
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_skipped(e));

    for entry in walker {
        let entry = entry.map_err(|e| GeneratorError::io(root, e.to_string()))?;
        let path = entry.path();
        let matches = path
            .extension()
            .is_some_and(|ext| extensions.contains(&ext.to_string_lossy().as_ref()));
        if path.is_file() && matches {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}

fn is_skipped(entry: &walkdir::DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && (name == "target" || name == "node_modules"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_extractor() {
        assert_eq!(create_extractor("rust").unwrap().language(), "rust");
        assert_eq!(create_extractor("json").unwrap().language(), "json");
        assert!(matches!(
            create_extractor("python"),
            Err(GeneratorError::UnsupportedLanguage { .. })
        ));
    }

    #[test]
    fn test_source_files_sorted_and_filtered() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("b")).unwrap();
        std::fs::create_dir_all(root.join("target")).unwrap();
        std::fs::write(root.join("z.rs"), "").unwrap();
        std::fs::write(root.join("a.rs"), "").unwrap();
        std::fs::write(root.join("notes.md"), "").unwrap();
        std::fs::write(root.join(".hidden.rs"), "").unwrap();
        std::fs::write(root.join("b").join("m.rs"), "").unwrap();
        std::fs::write(root.join("target").join("gen.rs"), "").unwrap();

        let files: Vec<PathBuf> = source_files(root, &["rs"])
            .unwrap()
            .into_iter()
            .map(|p| p.strip_prefix(root).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            files,
            vec![PathBuf::from("a.rs"), PathBuf::from("b/m.rs"), PathBuf::from("z.rs")]
        );
    }

    #[test]
    fn test_missing_input() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            source_files(&temp.path().join("nope"), &["rs"]),
            Err(GeneratorError::IoError { .. })
        ));
    }
}
