//! Language-neutral intermediate representation.
//!
//! This IR is produced by source extractors and consumed by the resolver,
//! the type mapper and the emitter. It describes type *shape* and value
//! domains only, never behavior. Everything here is plain data that is built
//! once per run and never mutated afterwards.
//!
//! The IR is (de)serializable so an upstream producer can hand a whole run
//! over as JSON (see [`crate::extract::json::JsonExtractor`]).

mod constraint;
mod decl;
mod naming;

pub use constraint::{Bound, ValueConstraint};
pub use decl::{
    EnumVariant, FieldDecl, Primitive, Tagging, TypeDecl, TypeKind, TypeRef, VariantPayload,
};
pub use naming::RenameRule;
