//! # typebridge compiler
//!
//! Generates TypeScript type declarations and matching runtime validators
//! from Rust type declarations. The emitted type and its validator are
//! rendered from one plan, so they never disagree about which fields exist
//! or which of them may be absent.
//!
//! ## Sources
//!
//! - Rust (default): `#[bridge]` items in `.rs` files
//! - JSON: IR documents produced by another tool
//!
//! ## Architecture
//!
//! ```text
//! Source (.rs / .json)
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Extract    │  Source-specific parsing
//! │  (src → IR)  │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Validate   │  Conflicts, references, structure
//! │     (IR)     │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │   Resolve    │  Emission order, cycle report
//! │     (IR)     │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │ Map + Emit   │  TypeScript types + validators
//! │  (IR → TS)   │
//! └──────┬───────┘
//!        │
//!        ▼
//! ┌──────────────┐
//! │    Bundle    │  Modules, runtime, index
//! └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use typebridge_compiler::{Generator, GeneratorConfig};
//!
//! let config = GeneratorConfig {
//!     input: "src/model".into(),
//!     output: "web/src/bindings".into(),
//!     ..Default::default()
//! };
//!
//! let result = Generator::new(config).generate()?;
//! println!("{} types", result.types);
//! ```

pub mod bundle;
pub mod cache;
pub mod config;
pub mod diagnostic;
pub mod emit;
pub mod extract;
pub mod ir;
pub mod mapper;
pub mod resolve;
pub mod validate;

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::{debug, info};

pub use bundle::Bundle;
pub use cache::ShapeCache;
pub use config::GeneratorConfig;
pub use diagnostic::GeneratorError;
pub use emit::{EmitOptions, EmittedType, TypePlan};
pub use mapper::{ShapeTable, ValidationIssue};

use ir::TypeDecl;

/// The main generator struct that orchestrates the pipeline.
pub struct Generator {
    config: GeneratorConfig,
}

/// Summary of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateResult {
    /// Declarations emitted.
    pub types: usize,
    /// Files in the bundle, including the runtime and index modules.
    pub files: usize,
    /// Declarations whose text came from the shape cache.
    pub cached: usize,
}

/// Validated, ordered and planned declarations.
#[derive(Debug, Clone)]
pub struct Prepared {
    /// Declarations in emission order.
    pub decls: Vec<TypeDecl>,
    /// One plan per declaration, same order.
    pub plans: Vec<TypePlan>,
}

/// Everything one run produces, before anything is written.
#[derive(Debug, Clone)]
pub struct Generation {
    pub emitted: Vec<EmittedType>,
    pub bundle: Bundle,
    /// Fingerprint of each emitted declaration, same order.
    pub fingerprints: Vec<String>,
    pub cached: usize,
}

impl Prepared {
    /// Declaration names in emission order.
    pub fn order(&self) -> Vec<String> {
        self.decls.iter().map(|d| d.name.clone()).collect()
    }

    pub fn shape_table(&self) -> ShapeTable {
        emit::shape_table(&self.plans)
    }
}

impl Generation {
    pub fn summary(&self) -> GenerateResult {
        GenerateResult {
            types: self.emitted.len(),
            files: self.bundle.files.len(),
            cached: self.cached,
        }
    }
}

impl Generator {
    /// Creates a new generator with the given configuration.
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Extracts, generates and writes the bundle.
    ///
    /// This runs the full pipeline:
    /// 1. Extract declarations from the configured input
    /// 2. Merge duplicates and check every declaration
    /// 3. Resolve the emission order
    /// 4. Emit each type (reusing cached text when enabled)
    /// 5. Write the bundle and the cache
    ///
    /// Nothing is written when any step reports an error.
    pub fn generate(&self) -> Result<GenerateResult, GeneratorError> {
        let decls = self.extract()?;

        let cache_path = self.config.cache_path();
        let mut cache = if self.config.cache {
            Some(ShapeCache::load(&cache_path)?)
        } else {
            None
        };

        let generation = self.build(decls, cache.as_ref())?;
        generation.bundle.write(&self.config.output)?;

        if let Some(cache) = cache.as_mut() {
            cache.replace(generation.fingerprints.iter().cloned().zip(generation.emitted.iter().cloned()));
            cache.save(&cache_path)?;
        }

        let result = generation.summary();
        info!(
            types = result.types,
            files = result.files,
            cached = result.cached,
            output = %self.config.output.display(),
            "generated bindings"
        );
        Ok(result)
    }

    /// Runs every step except writing.
    pub fn check(&self) -> Result<GenerateResult, GeneratorError> {
        let generation = self.build(self.extract()?, None)?;
        let result = generation.summary();
        info!(types = result.types, "check passed");
        Ok(result)
    }

    /// Declaration names in emission order.
    pub fn order(&self) -> Result<Vec<String>, GeneratorError> {
        Ok(self.prepare(self.extract()?)?.order())
    }

    /// Types and validators of the configured input, for checking JSON
    /// payloads.
    pub fn shape_table(&self) -> Result<ShapeTable, GeneratorError> {
        Ok(self.prepare(self.extract()?)?.shape_table())
    }

    /// Reads the configured input with the configured extractor.
    pub fn extract(&self) -> Result<Vec<TypeDecl>, GeneratorError> {
        let extractor = extract::create_extractor(&self.config.source.to_string())?;
        let decls = extractor.extract_path(&self.config.input)?;
        debug!(types = decls.len(), source = extractor.language(), "extraction complete");
        Ok(decls)
    }

    /// Checks, orders and plans declarations. Every problem found is
    /// reported together.
    pub fn prepare(&self, decls: Vec<TypeDecl>) -> Result<Prepared, GeneratorError> {
        let (decls, mut errors) =
            validate::validate_types(decls, self.config.conflict_policy, self.config.validators);

        let planned: Vec<Result<TypePlan, Vec<GeneratorError>>> = decls.par_iter().map(emit::plan).collect();
        let mut plans = Vec::with_capacity(planned.len());
        for result in planned {
            match result {
                Ok(plan) => plans.push(Some(plan)),
                Err(mut plan_errors) => {
                    errors.append(&mut plan_errors);
                    plans.push(None);
                }
            }
        }

        let order = match resolve::emission_order(&decls) {
            Ok((_, order)) => order,
            Err(mut cycle_errors) => {
                errors.append(&mut cycle_errors);
                Vec::new()
            }
        };

        GeneratorError::collect(errors)?;

        let mut decl_slots: Vec<Option<TypeDecl>> = decls.into_iter().map(Some).collect();
        let mut prepared = Prepared {
            decls: Vec::with_capacity(order.len()),
            plans: Vec::with_capacity(order.len()),
        };
        for i in order {
            if let (Some(decl), Some(plan)) = (decl_slots[i].take(), plans[i].take()) {
                prepared.decls.push(decl);
                prepared.plans.push(plan);
            }
        }

        debug!(types = prepared.decls.len(), "prepared declarations");
        Ok(prepared)
    }

    /// Produces the bundle for `decls` without touching the file system.
    /// Entries of `cache` with a matching fingerprint are reused verbatim.
    pub fn build(&self, decls: Vec<TypeDecl>, cache: Option<&ShapeCache>) -> Result<Generation, GeneratorError> {
        let prepared = self.prepare(decls)?;
        let options = EmitOptions::from(&self.config);

        // Dependencies precede dependents, so their fingerprints are known.
        let mut by_name: HashMap<&str, String> = HashMap::new();
        let mut fingerprints = Vec::with_capacity(prepared.decls.len());
        for (decl, plan) in prepared.decls.iter().zip(&prepared.plans) {
            let deps = plan.deps();
            let dep_prints: Vec<&str> = deps
                .iter()
                .filter_map(|dep| by_name.get(dep.as_str()).map(String::as_str))
                .collect();
            let print = cache::fingerprint(decl, &options, &dep_prints);
            by_name.insert(decl.name.as_str(), print.clone());
            fingerprints.push(print);
        }

        let results: Vec<(EmittedType, bool)> = prepared
            .plans
            .par_iter()
            .zip(fingerprints.par_iter())
            .map(|(plan, print)| match cache.and_then(|c| c.lookup(&plan.name, print)) {
                Some(hit) => (hit.clone(), true),
                None => (emit::emit_plan(plan, &options), false),
            })
            .collect();

        let cached = results.iter().filter(|(_, hit)| *hit).count();
        let emitted: Vec<EmittedType> = results.into_iter().map(|(ty, _)| ty).collect();
        debug!(types = emitted.len(), cached, "emitted declarations");

        let bundle = bundle::Bundle::assemble(&emitted, self.config.layout, &self.config.output_file, &options)?;

        Ok(Generation {
            emitted,
            bundle,
            fingerprints,
            cached,
        })
    }
}
