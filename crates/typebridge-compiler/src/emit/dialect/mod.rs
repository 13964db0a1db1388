//! Validator dialects.
//!
//! A dialect renders dialect-neutral [`ValidatorExpr`]s into the syntax of one
//! validation library. Both dialects check the same things; only the emitted
//! text and the runtime they import differ.

mod builtin;
mod zod;

pub use builtin::{BuiltinDialect, BUILTIN};
pub use zod::{ZodDialect, ZOD};

use crate::config::ValidatorDialect;
use crate::mapper::{property_key, ValidatorExpr};

/// Module specifier of the runtime, relative to every emitted module.
pub const RUNTIME_MODULE: &str = "./runtime";

/// A validator code generation backend.
pub trait Dialect: Send + Sync {
    /// Identifier as written in configuration (e.g. "builtin", "zod").
    fn name(&self) -> &'static str;

    /// Identifier of the validator emitted for `type_name`.
    fn validator_name(&self, type_name: &str) -> String;

    /// Import lines a module with validators needs. `brand` adds the
    /// `Brand` helper type.
    fn imports(&self, brand: bool) -> Vec<String>;

    /// Renders an expression that starts on a line indented by `indent`
    /// levels.
    fn expr(&self, expr: &ValidatorExpr, indent: usize) -> String;

    /// Exported constant holding the validator of `type_name`. A generic
    /// declaration exports a factory taking one validator per parameter.
    fn declaration(&self, type_name: &str, params: &[String], expr: &ValidatorExpr) -> String;

    /// Source of the `runtime.ts` module emitted alongside the bindings.
    fn runtime(&self) -> &'static str;
}

/// The dialect selected by configuration.
pub fn dialect_for(kind: ValidatorDialect) -> &'static dyn Dialect {
    match kind {
        ValidatorDialect::Builtin => &BUILTIN,
        ValidatorDialect::Zod => &ZOD,
    }
}

/// Identifier of the validator emitted for `type_name` in `kind`.
pub fn validator_name(kind: ValidatorDialect, type_name: &str) -> String {
    dialect_for(kind).validator_name(type_name)
}

fn pad(indent: usize) -> String {
    "  ".repeat(indent)
}

/// `{ key: value, ... }` spread over lines, or `{}` when empty.
fn block(entries: Vec<(String, String)>, indent: usize) -> String {
    if entries.is_empty() {
        return "{}".to_string();
    }
    let mut out = String::from("{\n");
    for (key, value) in entries {
        out.push_str(&format!("{}{}: {},\n", pad(indent + 1), property_key(&key), value));
    }
    out.push_str(&pad(indent));
    out.push('}');
    out
}

/// `Page<T, E>`, or just the name without parameters.
fn signature(type_name: &str, params: &[String]) -> String {
    if params.is_empty() {
        type_name.to_string()
    } else {
        format!("{}<{}>", type_name, params.join(", "))
    }
}

/// `<T, E>(validateT: Validator<T>, validateE: Validator<E>)`, typing each
/// parameter validator with `validator_type`.
fn factory_params(dialect: &dyn Dialect, params: &[String], validator_type: impl Fn(&str) -> String) -> String {
    let args: Vec<String> = params
        .iter()
        .map(|p| format!("{}: {}", dialect.validator_name(p), validator_type(p)))
        .collect();
    format!("<{}>({})", params.join(", "), args.join(", "))
}

/// `{ a, b }` on one line, or nothing when empty.
fn options(opts: &[String]) -> Option<String> {
    (!opts.is_empty()).then(|| format!("{{ {} }}", opts.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validator_names() {
        assert_eq!(validator_name(ValidatorDialect::Builtin, "User"), "validateUser");
        assert_eq!(validator_name(ValidatorDialect::Zod, "User"), "UserSchema");
    }

    #[test]
    fn test_factory_params() {
        assert_eq!(signature("Page", &[]), "Page");
        assert_eq!(signature("Outcome", &["T".into(), "E".into()]), "Outcome<T, E>");
        assert_eq!(
            factory_params(&BUILTIN, &["T".into(), "E".into()], |p| format!("Validator<{}>", p)),
            "<T, E>(validateT: Validator<T>, validateE: Validator<E>)"
        );
    }

    #[test]
    fn test_block() {
        assert_eq!(block(Vec::new(), 0), "{}");
        assert_eq!(
            block(vec![("id".into(), "x".into()), ("created-at".into(), "y".into())], 1),
            "{\n    id: x,\n    \"created-at\": y,\n  }"
        );
    }
}
