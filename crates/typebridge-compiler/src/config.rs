//! Generator configuration.
//!
//! Loaded from `typebridge.toml`; every key is optional and falls back to
//! [`GeneratorConfig::default`].

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::diagnostic::GeneratorError;

/// Name of the configuration file looked up by the CLI.
pub const CONFIG_FILE: &str = "typebridge.toml";

/// Configuration for the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// File or directory holding the source declarations.
    pub input: PathBuf,

    /// Directory the bundle is written to.
    pub output: PathBuf,

    /// Which extractor reads `input`.
    pub source: SourceKind,

    /// Validator dialect.
    pub validators: ValidatorDialect,

    /// One module per type, or everything in `output_file`.
    pub layout: Layout,

    /// File name used by the single-file layout.
    pub output_file: String,

    /// What to do when a name is declared twice with different shapes.
    pub conflict_policy: ConflictPolicy,

    /// Emit doc comments and constraint annotations as JSDoc.
    pub generate_jsdoc: bool,

    /// Reuse emitted text for unchanged types across runs.
    pub cache: bool,

    /// Cache location, relative to `output` unless absolute.
    pub cache_file: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("src"),
            output: PathBuf::from("bindings"),
            source: SourceKind::Rust,
            validators: ValidatorDialect::Builtin,
            layout: Layout::PerType,
            output_file: "types.ts".to_string(),
            conflict_policy: ConflictPolicy::Reject,
            generate_jsdoc: true,
            cache: false,
            cache_file: PathBuf::from(".typebridge-cache.json"),
        }
    }
}

/// Source extractor selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    #[default]
    Rust,
    Json,
}

/// Validator rendering dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidatorDialect {
    /// Dependency-free validators backed by the emitted `runtime.ts`.
    #[default]
    Builtin,
    /// Zod schemas.
    Zod,
}

/// Output file layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Layout {
    #[default]
    PerType,
    SingleFile,
}

/// Handling of a name declared twice with different shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    #[default]
    Reject,
    /// Keep the most specified declaration; ties are still rejected.
    PreferMostSpecified,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SourceKind::Rust => "rust",
            SourceKind::Json => "json",
        })
    }
}

impl fmt::Display for ValidatorDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ValidatorDialect::Builtin => "builtin",
            ValidatorDialect::Zod => "zod",
        })
    }
}

impl GeneratorConfig {
    /// Reads a configuration file. Relative paths inside it are resolved
    /// against the file's directory.
    pub fn load(path: &Path) -> Result<Self, GeneratorError> {
        let text = std::fs::read_to_string(path).map_err(|e| GeneratorError::io(path, e.to_string()))?;
        let config = Self::from_toml_str(&text)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.rebase(base))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, GeneratorError> {
        toml::from_str(text).map_err(|e| GeneratorError::InvalidConfig {
            message: e.message().to_string(),
        })
    }

    /// Makes relative `input`/`output` paths relative to `base`.
    pub fn rebase(mut self, base: &Path) -> Self {
        if base.as_os_str().is_empty() {
            return self;
        }
        if self.input.is_relative() {
            self.input = base.join(&self.input);
        }
        if self.output.is_relative() {
            self.output = base.join(&self.output);
        }
        self
    }

    /// Absolute or output-relative location of the shape cache.
    pub fn cache_path(&self) -> PathBuf {
        if self.cache_file.is_absolute() {
            self.cache_file.clone()
        } else {
            self.output.join(&self.cache_file)
        }
    }

    /// The commented file written by `typebridge init`.
    pub fn template() -> &'static str {
        TEMPLATE
    }
}

const TEMPLATE: &str = r#"# typebridge configuration

# File or directory containing the source declarations
input = "src"

# Output directory for the generated TypeScript modules
output = "bindings"

# Source extractor: "rust" (annotated .rs files) or "json" (IR documents)
source = "rust"

# Validator dialect: "builtin" (emits runtime.ts) or "zod"
validators = "builtin"

# "per-type" writes one module per type, "single-file" writes output_file
layout = "per-type"
output_file = "types.ts"

# On duplicate declarations with different shapes: "reject" or "prefer-most-specified"
conflict_policy = "reject"

# Emit doc comments and constraint annotations as JSDoc
generate_jsdoc = true

# Reuse emitted text for types whose shape did not change
cache = false
cache_file = ".typebridge-cache.json"
"#;
