//! Runtime TypeScript modules embedded at compile time.
//!
//! These modules are written in TypeScript in the `runtime/` directory
//! and embedded into the generator binary using `include_str!`.

/// Validator combinators for the builtin dialect, plus the `Brand` helper.
pub const VALIDATORS: &str = include_str!("../../runtime/validators.ts");
/// Only the `Brand` helper; zod brings its own validators.
pub const BRAND: &str = include_str!("../../runtime/brand.ts");
