//! Attribute parsing: `#[bridge]`, `#[serde]`, `#[validate]` and docs.

use std::str::FromStr;

use syn::meta::ParseNestedMeta;
use syn::punctuated::Punctuated;
use syn::{Attribute, Expr, ExprLit, ExprUnary, Lit, LitInt, LitStr, Meta, Path, Token, UnOp};

use crate::ir::{Bound, RenameRule, ValueConstraint};

/// What `#[bridge]` / `#[derive(Bridge)]` say about an item.
#[derive(Debug, Default, Clone, Copy)]
pub struct BridgeAttrs {
    pub bridged: bool,
    pub branded: bool,
}

pub fn bridge_attrs(attrs: &[Attribute]) -> syn::Result<BridgeAttrs> {
    let mut result = BridgeAttrs::default();

    for attr in attrs {
        if attr.path().is_ident("bridge") {
            result.bridged = true;
            if let Meta::List(_) = attr.meta {
                attr.parse_nested_meta(|meta| {
                    if meta.path.is_ident("branded") {
                        result.branded = true;
                        Ok(())
                    } else {
                        Err(meta.error("unknown bridge option"))
                    }
                })?;
            }
        } else if attr.path().is_ident("derive") {
            let derives = attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated)?;
            if derives
                .iter()
                .any(|path| path.segments.last().is_some_and(|seg| seg.ident == "Bridge"))
            {
                result.bridged = true;
            }
        }
    }

    Ok(result)
}

/// Container-level serde settings.
#[derive(Debug, Default)]
pub struct SerdeContainer {
    pub rename_all: Option<RenameRule>,
    pub rename_all_fields: Option<RenameRule>,
    pub tag: Option<String>,
    pub content: Option<String>,
    pub transparent: bool,
    pub default: bool,
}

pub fn serde_container(attrs: &[Attribute]) -> syn::Result<SerdeContainer> {
    let mut result = SerdeContainer::default();

    for attr in serde_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename_all") {
                result.rename_all = Some(rename_rule(&meta)?);
            } else if meta.path.is_ident("rename_all_fields") {
                result.rename_all_fields = Some(rename_rule(&meta)?);
            } else if meta.path.is_ident("tag") {
                result.tag = Some(string_value(&meta)?);
            } else if meta.path.is_ident("content") {
                result.content = Some(string_value(&meta)?);
            } else if meta.path.is_ident("transparent") {
                result.transparent = true;
            } else if meta.path.is_ident("default") {
                if meta.input.peek(Token![=]) {
                    meta.value()?.parse::<LitStr>()?;
                }
                result.default = true;
            } else if meta.path.is_ident("untagged") {
                return Err(meta.error("untagged enums have no discriminant and cannot be validated reliably"));
            } else if meta.path.is_ident("from") || meta.path.is_ident("into") || meta.path.is_ident("try_from") {
                return Err(meta.error("conversions through another type are not supported; bridge that type instead"));
            } else {
                ignore(&meta)?;
            }
            Ok(())
        })?;
    }

    Ok(result)
}

/// Field-level serde settings.
#[derive(Debug, Default)]
pub struct SerdeField {
    pub rename: Option<String>,
    pub skip: bool,
    pub optional: bool,
}

pub fn serde_field(attrs: &[Attribute]) -> syn::Result<SerdeField> {
    let mut result = SerdeField::default();

    for attr in serde_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                result.rename = Some(rename_value(&meta)?);
            } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                result.skip = true;
            } else if meta.path.is_ident("default") {
                if meta.input.peek(Token![=]) {
                    meta.value()?.parse::<LitStr>()?;
                }
                result.optional = true;
            } else if meta.path.is_ident("skip_serializing_if") {
                meta.value()?.parse::<LitStr>()?;
                result.optional = true;
            } else if meta.path.is_ident("flatten") {
                return Err(meta.error("flattened fields are not supported"));
            } else if meta.path.is_ident("with")
                || meta.path.is_ident("serialize_with")
                || meta.path.is_ident("deserialize_with")
            {
                return Err(meta.error("custom (de)serializers hide the wire shape"));
            } else {
                ignore(&meta)?;
            }
            Ok(())
        })?;
    }

    Ok(result)
}

/// Variant-level serde settings.
#[derive(Debug, Default)]
pub struct SerdeVariant {
    pub rename: Option<String>,
    pub rename_all: Option<RenameRule>,
    pub skip: bool,
}

pub fn serde_variant(attrs: &[Attribute]) -> syn::Result<SerdeVariant> {
    let mut result = SerdeVariant::default();

    for attr in serde_attrs(attrs) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                result.rename = Some(rename_value(&meta)?);
            } else if meta.path.is_ident("rename_all") {
                result.rename_all = Some(rename_rule(&meta)?);
            } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                result.skip = true;
            } else if meta.path.is_ident("with")
                || meta.path.is_ident("serialize_with")
                || meta.path.is_ident("deserialize_with")
                || meta.path.is_ident("untagged")
            {
                return Err(meta.error("variant-level custom representations are not supported"));
            } else {
                ignore(&meta)?;
            }
            Ok(())
        })?;
    }

    Ok(result)
}

/// Parses every `#[validate(...)]` attribute.
pub fn validate_attrs(attrs: &[Attribute]) -> syn::Result<Vec<ValueConstraint>> {
    let mut rules = Vec::new();

    for attr in attrs.iter().filter(|a| a.path().is_ident("validate")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("range") {
                let (mut min, mut max) = (None, None);
                meta.parse_nested_meta(|inner| {
                    let value = bound(&inner.value()?.parse::<Expr>()?)?;
                    if inner.path.is_ident("min") {
                        min = Some(value);
                    } else if inner.path.is_ident("max") {
                        max = Some(value);
                    } else {
                        return Err(inner.error("expected `min` or `max`"));
                    }
                    Ok(())
                })?;
                rules.push(ValueConstraint::range(min, max));
            } else if meta.path.is_ident("length") {
                let (mut min, mut max) = (None, None);
                meta.parse_nested_meta(|inner| {
                    let value = inner.value()?.parse::<LitInt>()?.base10_parse::<u64>()?;
                    if inner.path.is_ident("min") {
                        min = Some(value);
                    } else if inner.path.is_ident("max") {
                        max = Some(value);
                    } else if inner.path.is_ident("equal") {
                        min = Some(value);
                        max = Some(value);
                    } else {
                        return Err(inner.error("expected `min`, `max` or `equal`"));
                    }
                    Ok(())
                })?;
                rules.push(ValueConstraint::length(min, max));
            } else if meta.path.is_ident("pattern") {
                rules.push(ValueConstraint::pattern(string_value(&meta)?));
            } else if meta.path.is_ident("email") {
                rules.push(ValueConstraint::Email);
            } else if meta.path.is_ident("url") {
                rules.push(ValueConstraint::Url);
            } else {
                return Err(meta.error("unsupported validation; expected range, length, pattern, email or url"));
            }
            Ok(())
        })?;
    }

    Ok(rules)
}

/// Doc comment text, one line per `///` line with the leading space removed.
pub fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(nv) => match &nv.value {
                Expr::Lit(ExprLit { lit: Lit::Str(s), .. }) => Some(s.value()),
                _ => None,
            },
            _ => None,
        })
        .map(|line| line.strip_prefix(' ').unwrap_or(&line).trim_end().to_string())
        .collect();

    let doc = lines.join("\n");
    let doc = doc.trim();
    (!doc.is_empty()).then(|| doc.to_string())
}

fn serde_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|a| a.path().is_ident("serde"))
}

fn string_value(meta: &ParseNestedMeta) -> syn::Result<String> {
    Ok(meta.value()?.parse::<LitStr>()?.value())
}

/// `rename = "x"`; the `rename(serialize = .., deserialize = ..)` form would
/// give the two directions different shapes.
fn rename_value(meta: &ParseNestedMeta) -> syn::Result<String> {
    if meta.input.peek(Token![=]) {
        string_value(meta)
    } else {
        Err(meta.error("direction-specific renames are not supported"))
    }
}

fn rename_rule(meta: &ParseNestedMeta) -> syn::Result<RenameRule> {
    if !meta.input.peek(Token![=]) {
        return Err(meta.error("direction-specific rename rules are not supported"));
    }
    let lit = meta.value()?.parse::<LitStr>()?;
    RenameRule::from_str(&lit.value()).map_err(|e| syn::Error::new(lit.span(), e))
}

/// Consumes a serde option that does not affect the wire shape.
fn ignore(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| ignore(&inner))?;
    }
    Ok(())
}

/// A numeric literal, optionally negated.
fn bound(expr: &Expr) -> syn::Result<Bound> {
    match expr {
        Expr::Lit(ExprLit { lit: Lit::Int(lit), .. }) => Ok(Bound::Int(lit.base10_parse::<i128>()?)),
        Expr::Lit(ExprLit { lit: Lit::Float(lit), .. }) => Ok(Bound::Float(lit.base10_parse::<f64>()?)),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr: inner,
            ..
        }) => Ok(match bound(inner)? {
            Bound::Int(v) => Bound::Int(-v),
            Bound::Float(v) => Bound::Float(-v),
        }),
        Expr::Paren(paren) => bound(&paren.expr),
        Expr::Group(group) => bound(&group.expr),
        other => Err(syn::Error::new_spanned(other, "range bounds must be numeric literals")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn attrs(item: syn::DeriveInput) -> Vec<Attribute> {
        item.attrs
    }

    #[test]
    fn test_bridge_attrs() {
        let plain = bridge_attrs(&attrs(parse_quote! { #[bridge] struct A; })).unwrap();
        assert!(plain.bridged && !plain.branded);

        let branded = bridge_attrs(&attrs(parse_quote! { #[bridge(branded)] struct A(u32); })).unwrap();
        assert!(branded.bridged && branded.branded);

        let derived = bridge_attrs(&attrs(parse_quote! {
            #[derive(Debug, typebridge::Bridge)]
            struct A;
        }))
        .unwrap();
        assert!(derived.bridged);

        let other = bridge_attrs(&attrs(parse_quote! { #[derive(Debug)] struct A; })).unwrap();
        assert!(!other.bridged);

        assert!(bridge_attrs(&attrs(parse_quote! { #[bridge(nominal)] struct A; })).is_err());
    }

    #[test]
    fn test_validate_attrs() {
        let rules = validate_attrs(&attrs(parse_quote! {
            #[validate(range(min = -5, max = 18446744073709551615), length(max = 20))]
            #[validate(email, pattern = "^[a-z]+$")]
            struct A;
        }))
        .unwrap();

        assert_eq!(
            rules,
            vec![
                ValueConstraint::range(Some(Bound::Int(-5)), Some(Bound::Int(u64::MAX as i128))),
                ValueConstraint::length(None, Some(20)),
                ValueConstraint::Email,
                ValueConstraint::pattern("^[a-z]+$"),
            ]
        );

        let floats = validate_attrs(&attrs(parse_quote! {
            #[validate(range(min = -0.5, max = 1.5))]
            struct A;
        }))
        .unwrap();
        assert_eq!(floats, vec![ValueConstraint::range(Some(Bound::Float(-0.5)), Some(Bound::Float(1.5)))]);
    }

    #[test]
    fn test_validate_rejects_unknown_and_non_literal() {
        assert!(validate_attrs(&attrs(parse_quote! { #[validate(phone)] struct A; })).is_err());
        assert!(validate_attrs(&attrs(parse_quote! { #[validate(range(min = LIMIT))] struct A; })).is_err());
    }

    #[test]
    fn test_serde_container() {
        let serde = serde_container(&attrs(parse_quote! {
            #[serde(rename_all = "camelCase", tag = "type", content = "data", deny_unknown_fields)]
            enum A {}
        }))
        .unwrap();
        assert_eq!(serde.rename_all, Some(RenameRule::CamelCase));
        assert_eq!(serde.tag.as_deref(), Some("type"));
        assert_eq!(serde.content.as_deref(), Some("data"));

        assert!(serde_container(&attrs(parse_quote! { #[serde(untagged)] enum A {} })).is_err());
        assert!(serde_container(&attrs(parse_quote! { #[serde(rename_all = "Title Case")] enum A {} })).is_err());
    }

    #[test]
    fn test_serde_field() {
        let field: syn::Field = parse_quote! {
            #[serde(rename = "userName", default, alias = "name", skip_serializing_if = "Option::is_none")]
            name: String
        };
        let serde = serde_field(&field.attrs).unwrap();
        assert_eq!(serde.rename.as_deref(), Some("userName"));
        assert!(serde.optional);
        assert!(!serde.skip);

        let flattened: syn::Field = parse_quote! { #[serde(flatten)] extra: Extra };
        assert!(serde_field(&flattened.attrs).is_err());

        let directional: syn::Field = parse_quote! { #[serde(rename(serialize = "a"))] x: u8 };
        assert!(serde_field(&directional.attrs).is_err());
    }

    #[test]
    fn test_doc_comment() {
        let docs = doc_comment(&attrs(parse_quote! {
            /// A registered user.
            ///
            /// Created on sign-up.
            struct A;
        }));
        assert_eq!(docs.as_deref(), Some("A registered user.\n\nCreated on sign-up."));

        assert_eq!(doc_comment(&attrs(parse_quote! { struct A; })), None);
    }
}
