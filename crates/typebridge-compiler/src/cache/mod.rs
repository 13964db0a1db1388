//! Emission cache.
//!
//! The cache file (`.typebridge-cache.json` by default) stores the emitted
//! text of every declaration from the previous run, keyed by a fingerprint of
//! everything that shapes that text. A declaration whose fingerprint is
//! unchanged is not re-rendered. A fingerprint folds in the fingerprints of
//! referenced declarations, so a change invalidates the changed type and
//! every type that depends on it.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use xxhash_rust::xxh3::xxh3_64;

use crate::diagnostic::GeneratorError;
use crate::emit::{EmitOptions, EmittedType};
use crate::ir::TypeDecl;

/// The cache file format version.
pub const CACHE_VERSION: u32 = 2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeCache {
    /// Cache file format version.
    pub version: u32,

    /// Generator version that wrote this file; entries from other versions
    /// are discarded.
    #[serde(rename = "generatorVersion")]
    pub generator_version: String,

    /// Entries keyed by declaration name.
    pub entries: BTreeMap<String, CacheEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub emitted: EmittedType,
}

impl Default for ShapeCache {
    fn default() -> Self {
        Self {
            version: CACHE_VERSION,
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            entries: BTreeMap::new(),
        }
    }
}

impl ShapeCache {
    /// Loads the cache, or an empty one if the file is missing, unreadable as
    /// a cache, or written by another generator version.
    pub fn load(path: &Path) -> Result<Self, GeneratorError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| GeneratorError::io(path, e.to_string()))?;

        match serde_json::from_str::<Self>(&content) {
            Ok(cache) if cache.version == CACHE_VERSION && cache.generator_version == env!("CARGO_PKG_VERSION") => {
                debug!(entries = cache.entries.len(), path = %path.display(), "loaded emission cache");
                Ok(cache)
            }
            Ok(_) => {
                debug!(path = %path.display(), "discarding cache from another version");
                Ok(Self::default())
            }
            Err(e) => {
                debug!(path = %path.display(), error = %e, "discarding unreadable cache");
                Ok(Self::default())
            }
        }
    }

    /// Saves the cache to disk.
    pub fn save(&self, path: &Path) -> Result<(), GeneratorError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| GeneratorError::io(parent, e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| GeneratorError::io(path, format!("Failed to serialize cache: {}", e)))?;

        std::fs::write(path, content).map_err(|e| GeneratorError::io(path, e.to_string()))
    }

    /// Emitted text for `name`, if it was produced from the same fingerprint.
    pub fn lookup(&self, name: &str, fingerprint: &str) -> Option<&EmittedType> {
        self.entries
            .get(name)
            .filter(|entry| entry.fingerprint == fingerprint)
            .map(|entry| &entry.emitted)
    }

    /// Replaces all entries with the results of the current run.
    pub fn replace(&mut self, entries: impl IntoIterator<Item = (String, EmittedType)>) {
        self.entries = entries
            .into_iter()
            .map(|(fingerprint, emitted)| (emitted.name.clone(), CacheEntry { fingerprint, emitted }))
            .collect();
    }
}

/// Fingerprint of `decl` under `options`, combined with the fingerprints of
/// the declarations it references (in first-use order). Source locations
/// are ignored, so moving a declaration does not invalidate it.
pub fn fingerprint(decl: &TypeDecl, options: &EmitOptions, deps: &[&str]) -> String {
    let mut stripped = decl.clone();
    stripped.source = None;

    let mut input = serde_json::to_vec(&stripped).unwrap_or_default();
    input.extend_from_slice(format!("|{}|{}", options.dialect, options.jsdoc).as_bytes());
    for dep in deps {
        input.push(b'|');
        input.extend_from_slice(dep.as_bytes());
    }
    format!("xxh3:{:016x}", xxh3_64(&input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorDialect;
    use crate::diagnostic::Span;
    use crate::emit::emit;
    use crate::ir::{FieldDecl, Primitive};
    use tempfile::TempDir;

    fn decl() -> TypeDecl {
        TypeDecl::structure("Point", vec![FieldDecl::new("x", Primitive::I32)])
    }

    #[test]
    fn test_fingerprint_ignores_source() {
        let options = EmitOptions::default();
        let mut moved = decl();
        moved.source = Some(Span::new("src/geo.rs".into(), 10, 1, 12, 2));
        assert_eq!(fingerprint(&decl(), &options, &[]), fingerprint(&moved, &options, &[]));
    }

    #[test]
    fn test_fingerprint_covers_options_and_shape() {
        let builtin = EmitOptions::default();
        let zod = EmitOptions {
            dialect: ValidatorDialect::Zod,
            jsdoc: true,
        };
        assert_ne!(fingerprint(&decl(), &builtin, &[]), fingerprint(&decl(), &zod, &[]));

        let changed = TypeDecl::structure("Point", vec![FieldDecl::new("x", Primitive::I64)]);
        assert_ne!(fingerprint(&decl(), &builtin, &[]), fingerprint(&changed, &builtin, &[]));
    }

    #[test]
    fn test_fingerprint_covers_dependencies() {
        let options = EmitOptions::default();
        assert_ne!(
            fingerprint(&decl(), &options, &["xxh3:0000000000000001"]),
            fingerprint(&decl(), &options, &["xxh3:0000000000000002"])
        );
    }

    #[test]
    fn test_cache_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out").join(".typebridge-cache.json");
        let options = EmitOptions::default();
        let print = fingerprint(&decl(), &options, &[]);

        let mut cache = ShapeCache::default();
        cache.replace(vec![(print.clone(), emit(&decl(), &options).unwrap())]);
        cache.save(&path).unwrap();

        let loaded = ShapeCache::load(&path).unwrap();
        assert!(loaded.lookup("Point", &print).is_some());
        assert!(loaded.lookup("Point", "xxh3:0").is_none());
    }

    #[test]
    fn test_corrupt_cache_is_discarded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cache.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(ShapeCache::load(&path).unwrap().entries.is_empty());
    }
}
