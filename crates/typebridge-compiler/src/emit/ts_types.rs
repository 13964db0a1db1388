//! TypeScript type declarations.

use super::dialect::Dialect;
use super::plan::{MappedField, PlanBody, TypePlan};
use crate::mapper::{property_key, TsType};

/// Attached to every member carrying a 64-bit integer, regardless of the
/// JSDoc setting, since the wire form differs from the declared type.
pub const BIGINT_WIRE_NOTE: &str =
    "Wire format: 64-bit integers travel as decimal strings (e.g. \"18446744073709551615\") and decode to bigint.";

/// Renders the type declaration of `plan`, plus the brand constructor for
/// nominal newtypes.
pub fn render_types(plan: &TypePlan, dialect: &dyn Dialect, jsdoc: bool) -> String {
    let mut out = String::new();
    let doc = if jsdoc { plan.doc.as_deref() } else { None };
    let signature = plan.signature();

    match &plan.body {
        PlanBody::Struct(fields) if fields.is_empty() => {
            out.push_str(&comment(doc, &[], ""));
            out.push_str(&format!("export type {} = Record<string, never>;\n", signature));
        }
        PlanBody::Struct(fields) => {
            out.push_str(&comment(doc, &[], ""));
            out.push_str(&format!("export interface {} {{\n", signature));
            for field in fields {
                out.push_str(&render_field(field, jsdoc));
            }
            out.push_str("}\n");
        }
        PlanBody::Enum { tagging, variants } => {
            out.push_str(&comment(doc, &[], ""));
            out.push_str(&format!("export type {} =\n", signature));
            for (i, variant) in variants.iter().enumerate() {
                let ty = variant.ts_type(tagging);
                let mut tags = Vec::new();
                if ty.contains_bigint() {
                    tags.push(BIGINT_WIRE_NOTE.to_string());
                }
                let variant_doc = if jsdoc { variant.doc.as_deref() } else { None };
                out.push_str(&comment(variant_doc, &tags, "  "));
                let end = if i + 1 == variants.len() { ";" } else { "" };
                out.push_str(&format!("  | {}{}\n", ty, end));
            }
        }
        PlanBody::Alias { mapped, annotations } => {
            let tags = type_tags(&mapped.target, annotations, jsdoc);
            out.push_str(&comment(doc, &tags, ""));
            out.push_str(&format!("export type {} = {};\n", signature, mapped.target));
        }
        PlanBody::Brand { mapped, annotations } => {
            let tags = type_tags(&mapped.target, annotations, jsdoc);
            out.push_str(&comment(doc, &tags, ""));
            out.push_str(&format!("export type {} = {};\n\n", plan.name, plan.ts_type()));
            out.push_str(&format!(
                "/** Wraps a value as `{0}` without checking it. Use `{1}` for untrusted input. */\n",
                plan.name,
                dialect.validator_name(&plan.name)
            ));
            out.push_str(&format!(
                "export const {0} = (value: {1}): {0} => value as {0};\n",
                plan.name, mapped.target
            ));
        }
    }

    out
}

fn render_field(field: &MappedField, jsdoc: bool) -> String {
    let tags = type_tags(&field.mapped.target, &field.annotations, jsdoc);
    let doc = if jsdoc { field.doc.as_deref() } else { None };
    let marker = if field.optional { "?" } else { "" };
    format!(
        "{}  {}{}: {};\n",
        comment(doc, &tags, "  "),
        property_key(&field.name),
        marker,
        field.mapped.target
    )
}

fn type_tags(target: &TsType, annotations: &[String], jsdoc: bool) -> Vec<String> {
    let mut tags = Vec::new();
    if target.contains_bigint() {
        tags.push(BIGINT_WIRE_NOTE.to_string());
    }
    if jsdoc {
        tags.extend(annotations.iter().cloned());
    }
    tags
}

/// A JSDoc block, or nothing when there is nothing to say.
pub(crate) fn comment(doc: Option<&str>, tags: &[String], indent: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    if let Some(doc) = doc {
        lines.extend(doc.trim().lines().map(|l| escape(l.trim_end())));
    }
    lines.extend(tags.iter().map(|t| escape(t)));

    match lines.as_slice() {
        [] => String::new(),
        [line] => format!("{}/** {} */\n", indent, line),
        _ => {
            let mut out = format!("{}/**\n", indent);
            for line in &lines {
                if line.is_empty() {
                    out.push_str(&format!("{} *\n", indent));
                } else {
                    out.push_str(&format!("{} * {}\n", indent, line));
                }
            }
            out.push_str(&format!("{} */\n", indent));
            out
        }
    }
}

/// Keeps doc text from closing the comment early.
fn escape(line: &str) -> String {
    line.replace("*/", "*\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::dialect::BUILTIN;
    use crate::emit::plan::plan;
    use crate::ir::{Bound, FieldDecl, Primitive, TypeDecl, TypeRef, ValueConstraint};

    #[test]
    fn test_interface_with_jsdoc() {
        let decl = TypeDecl::structure(
            "User",
            vec![
                FieldDecl::new("id", TypeRef::named("UserId")).with_doc("Primary key"),
                FieldDecl::new("age", TypeRef::optional(Primitive::U8.into()))
                    .with_constraint(ValueConstraint::range(Some(Bound::Int(1)), Some(Bound::Int(100)))),
            ],
        )
        .with_doc("A registered user");
        let out = render_types(&plan(&decl).unwrap(), &BUILTIN, true);
        assert_eq!(
            out,
            "/** A registered user */\nexport interface User {\n  /** Primary key */\n  id: UserId;\n  /**\n   * @minimum 1\n   * @maximum 100\n   */\n  age?: number | null;\n}\n"
        );
    }

    #[test]
    fn test_jsdoc_disabled_keeps_bigint_note() {
        let decl = TypeDecl::structure("Log", vec![FieldDecl::new("seq", Primitive::U64).with_doc("Sequence")]);
        let out = render_types(&plan(&decl).unwrap(), &BUILTIN, false);
        assert!(!out.contains("Sequence"));
        assert!(out.contains(BIGINT_WIRE_NOTE));
        assert!(out.contains("  seq: bigint;"));
    }

    #[test]
    fn test_generic_enum_and_alias() {
        use crate::ir::{EnumVariant, Tagging, VariantPayload};

        let outcome = TypeDecl::enumeration(
            "Outcome",
            vec![
                EnumVariant {
                    name: "Ok".into(),
                    payload: VariantPayload::Tuple(vec![TypeRef::named("T")]),
                    doc: None,
                },
                EnumVariant {
                    name: "Err".into(),
                    payload: VariantPayload::Tuple(vec![TypeRef::named("E")]),
                    doc: None,
                },
            ],
            Tagging::External,
        )
        .with_generics(["T", "E"]);
        let out = render_types(&plan(&outcome).unwrap(), &BUILTIN, false);
        assert_eq!(out, "export type Outcome<T, E> =\n  | { Ok: T }\n  | { Err: E };\n");

        let pair = TypeRef::tuple(vec![TypeRef::named("K"), Primitive::Char.into()]);
        let pairs = TypeDecl::newtype("Pairs", TypeRef::sequence(pair), false).with_generics(["K"]);
        let out = render_types(&plan(&pairs).unwrap(), &BUILTIN, false);
        assert_eq!(out, "export type Pairs<K> = [K, string][];\n");
    }

    #[test]
    fn test_brand_constructor() {
        let decl = TypeDecl::newtype("UserId", Primitive::U32, true);
        let out = render_types(&plan(&decl).unwrap(), &BUILTIN, true);
        assert!(out.contains("export type UserId = Brand<number, \"UserId\">;"));
        assert!(out.contains("export const UserId = (value: number): UserId => value as UserId;"));
        assert!(out.contains("`validateUserId`"));
    }

    #[test]
    fn test_comment_escapes_terminator() {
        assert_eq!(comment(Some("a */ b"), &[], ""), "/** a *\\/ b */\n");
        assert_eq!(comment(None, &[], "  "), "");
    }
}
