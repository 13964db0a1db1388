//! Rust source extractor.
//!
//! Parses `.rs` files with `syn` and converts every bridged item into a
//! [`TypeDecl`]. An item is bridged when it carries `#[bridge]` (optionally
//! `#[bridge(branded)]`) or derives `Bridge`. Serde attributes decide wire
//! names, optionality and enum tagging; `#[validate(...)]` attributes become
//! value constraints. Type parameters carry over; lifetimes are dropped.

mod attributes;
mod types;

use std::path::Path;

use syn::ext::IdentExt;
use syn::{Attribute, Fields, GenericParam, Generics, Ident, Item, ItemEnum, ItemStruct, ItemType};

use super::Extractor;
use crate::diagnostic::{GeneratorError, Span};
use crate::ir::{EnumVariant, FieldDecl, RenameRule, Tagging, TypeDecl, TypeKind, VariantPayload};
use attributes::{BridgeAttrs, SerdeContainer};

/// Extracts bridged declarations from Rust source.
pub struct RustExtractor;

impl Extractor for RustExtractor {
    fn language(&self) -> &str {
        "rust"
    }

    fn extensions(&self) -> &[&str] {
        &["rs"]
    }

    fn extract_source(&self, source: &str, path: &Path) -> Result<Vec<TypeDecl>, Vec<GeneratorError>> {
        let file = syn::parse_file(source).map_err(|e| {
            let start = e.span().start();
            vec![GeneratorError::ParseFailed {
                path: path.to_path_buf(),
                message: format!("{} (line {}, column {})", e, start.line, start.column + 1),
            }]
        })?;

        let mut walker = ItemWalker {
            path,
            decls: Vec::new(),
            errors: Vec::new(),
        };
        walker.items(&file.items);

        if walker.errors.is_empty() {
            Ok(walker.decls)
        } else {
            Err(walker.errors)
        }
    }
}

struct ItemWalker<'a> {
    path: &'a Path,
    decls: Vec<TypeDecl>,
    errors: Vec<GeneratorError>,
}

impl ItemWalker<'_> {
    fn items(&mut self, items: &[Item]) {
        for item in items {
            match item {
                Item::Struct(item) => {
                    self.item(&item.ident, &item.attrs, &item.generics, |bridge| structure(item, bridge))
                }
                Item::Enum(item) => {
                    self.item(&item.ident, &item.attrs, &item.generics, |bridge| enumeration(item, bridge))
                }
                Item::Type(item) => self.item(&item.ident, &item.attrs, &item.generics, |bridge| alias(item, bridge)),
                Item::Union(item) => self.item(&item.ident, &item.attrs, &item.generics, |_| {
                    Err(syn::Error::new_spanned(&item.union_token, "unions have no serde representation"))
                }),
                Item::Mod(module) => {
                    if let Some((_, content)) = &module.content {
                        self.items(content);
                    }
                }
                _ => {}
            }
        }
    }

    fn item(
        &mut self,
        ident: &Ident,
        attrs: &[Attribute],
        generics: &Generics,
        convert: impl FnOnce(BridgeAttrs) -> syn::Result<TypeKind>,
    ) {
        let result = attributes::bridge_attrs(attrs).and_then(|bridge| {
            if !bridge.bridged {
                return Ok(None);
            }
            let params = type_params(generics)?;
            let kind = convert(bridge)?;
            let mut decl = TypeDecl {
                name: ident.unraw().to_string(),
                generics: params,
                doc: attributes::doc_comment(attrs),
                kind,
                source: Some(self.span(ident)),
            };
            decl.bind_params();
            Ok(Some(decl))
        });

        match result {
            Ok(Some(decl)) => self.decls.push(decl),
            Ok(None) => {}
            Err(err) => {
                for e in err {
                    let start = e.span().start();
                    self.errors.push(GeneratorError::UnsupportedSource {
                        item: ident.unraw().to_string(),
                        reason: e.to_string(),
                        location: format!("{}:{}:{}", self.path.display(), start.line, start.column + 1),
                    });
                }
            }
        }
    }

    fn span(&self, ident: &Ident) -> Span {
        let (start, end) = (ident.span().start(), ident.span().end());
        Span::new(
            self.path.to_path_buf(),
            start.line,
            start.column + 1,
            end.line,
            end.column + 1,
        )
    }
}

/// Collects several errors into one, keeping each message.
#[derive(Default)]
struct Errors(Option<syn::Error>);

impl Errors {
    fn push(&mut self, err: syn::Error) {
        match &mut self.0 {
            Some(existing) => existing.combine(err),
            None => self.0 = Some(err),
        }
    }

    fn check<T>(&mut self, result: syn::Result<T>) -> Option<T> {
        result.map_err(|e| self.push(e)).ok()
    }

    fn finish<T>(self, value: T) -> syn::Result<T> {
        match self.0 {
            Some(err) => Err(err),
            None => Ok(value),
        }
    }
}

fn type_params(generics: &Generics) -> syn::Result<Vec<String>> {
    let mut errors = Errors::default();
    let mut params = Vec::new();
    for param in &generics.params {
        match param {
            GenericParam::Type(param) => params.push(param.ident.unraw().to_string()),
            GenericParam::Const(param) => errors.push(syn::Error::new_spanned(
                param,
                "const generic parameters are not supported",
            )),
            GenericParam::Lifetime(_) => {}
        }
    }
    errors.finish(params)
}

fn structure(item: &ItemStruct, bridge: BridgeAttrs) -> syn::Result<TypeKind> {
    let serde = attributes::serde_container(&item.attrs)?;

    match &item.fields {
        Fields::Named(named) if serde.transparent && named.named.len() == 1 => {
            newtype(&item.attrs, &named.named[0], bridge)
        }
        Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => newtype(&item.attrs, &unnamed.unnamed[0], bridge),
        _ if bridge.branded => Err(syn::Error::new_spanned(
            &item.ident,
            "#[bridge(branded)] applies only to single-field tuple structs",
        )),
        Fields::Named(named) => {
            let fields = fields(named.named.iter(), serde.rename_all, serde.default)?;
            Ok(TypeKind::Struct { fields })
        }
        Fields::Unnamed(_) => Err(syn::Error::new_spanned(
            &item.fields,
            "tuple structs with more than one field are not supported",
        )),
        Fields::Unit => Err(syn::Error::new_spanned(&item.ident, "unit structs have no wire shape")),
    }
}

fn newtype(attrs: &[Attribute], field: &syn::Field, bridge: BridgeAttrs) -> syn::Result<TypeKind> {
    let mut errors = Errors::default();
    let underlying = errors.check(types::type_ref(&field.ty));
    let mut constraints = errors.check(attributes::validate_attrs(attrs)).unwrap_or_default();
    constraints.extend(errors.check(attributes::validate_attrs(&field.attrs)).unwrap_or_default());

    match underlying {
        Some(underlying) => errors.finish(TypeKind::Newtype {
            underlying,
            constraints,
            branded: bridge.branded,
        }),
        None => Err(errors.0.unwrap_or_else(|| syn::Error::new_spanned(&field.ty, "unsupported type"))),
    }
}

fn alias(item: &ItemType, bridge: BridgeAttrs) -> syn::Result<TypeKind> {
    Ok(TypeKind::Newtype {
        underlying: types::type_ref(&item.ty)?,
        constraints: attributes::validate_attrs(&item.attrs)?,
        branded: bridge.branded,
    })
}

fn enumeration(item: &ItemEnum, bridge: BridgeAttrs) -> syn::Result<TypeKind> {
    if bridge.branded {
        return Err(syn::Error::new_spanned(
            &item.ident,
            "#[bridge(branded)] applies only to single-field tuple structs",
        ));
    }

    let serde = attributes::serde_container(&item.attrs)?;
    let tagging = tagging(&serde, &item.ident)?;

    let mut errors = Errors::default();
    let mut variants = Vec::new();
    for variant in &item.variants {
        let Some(attrs) = errors.check(attributes::serde_variant(&variant.attrs)) else {
            continue;
        };
        if attrs.skip {
            continue;
        }

        let ident = variant.ident.unraw().to_string();
        let name = match (&attrs.rename, serde.rename_all) {
            (Some(rename), _) => rename.clone(),
            (None, Some(rule)) => rule.apply_to_variant(&ident),
            (None, None) => ident,
        };

        let payload = match &variant.fields {
            Fields::Unit => Some(VariantPayload::Unit),
            Fields::Unnamed(unnamed) => errors
                .check(unnamed.unnamed.iter().map(|f| types::type_ref(&f.ty)).collect())
                .map(VariantPayload::Tuple),
            Fields::Named(named) => {
                let rule = attrs.rename_all.or(serde.rename_all_fields);
                errors
                    .check(fields(named.named.iter(), rule, false))
                    .map(VariantPayload::Struct)
            }
        };

        if let Some(payload) = payload {
            variants.push(EnumVariant {
                name,
                payload,
                doc: attributes::doc_comment(&variant.attrs),
            });
        }
    }

    errors.finish(TypeKind::Enum { variants, tagging })
}

fn tagging(serde: &SerdeContainer, ident: &Ident) -> syn::Result<Tagging> {
    match (&serde.tag, &serde.content) {
        (None, None) => Ok(Tagging::External),
        (Some(tag), None) => Ok(Tagging::Internal { tag: tag.clone() }),
        (Some(tag), Some(content)) => Ok(Tagging::Adjacent {
            tag: tag.clone(),
            content: content.clone(),
        }),
        (None, Some(_)) => Err(syn::Error::new_spanned(ident, "`content` requires `tag`")),
    }
}

fn fields<'a>(
    fields: impl Iterator<Item = &'a syn::Field>,
    rename_all: Option<RenameRule>,
    all_default: bool,
) -> syn::Result<Vec<FieldDecl>> {
    let mut errors = Errors::default();
    let mut out = Vec::new();

    for field in fields {
        if let Some(decl) = errors.check(named_field(field, rename_all, all_default)).flatten() {
            out.push(decl);
        }
    }

    errors.finish(out)
}

fn named_field(field: &syn::Field, rename_all: Option<RenameRule>, all_default: bool) -> syn::Result<Option<FieldDecl>> {
    let serde = attributes::serde_field(&field.attrs)?;
    if serde.skip {
        return Ok(None);
    }

    let Some(ident) = &field.ident else {
        return Err(syn::Error::new_spanned(field, "expected a named field"));
    };
    let ident = ident.unraw().to_string();
    let name = match (serde.rename, rename_all) {
        (Some(rename), _) => rename,
        (None, Some(rule)) => rule.apply_to_field(&ident),
        (None, None) => ident,
    };

    Ok(Some(FieldDecl {
        name,
        type_ref: types::type_ref(&field.ty)?,
        optional: serde.optional || all_default,
        constraints: attributes::validate_attrs(&field.attrs)?,
        doc: attributes::doc_comment(&field.attrs),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Bound, Primitive, TypeRef, ValueConstraint};

    fn extract(source: &str) -> Result<Vec<TypeDecl>, Vec<GeneratorError>> {
        RustExtractor.extract_source(source, Path::new("src/model.rs"))
    }

    #[test]
    fn test_user_scenario() {
        let decls = extract(
            r#"
            use serde::{Deserialize, Serialize};

            /// Primary key of a user.
            #[bridge(branded)]
            pub struct UserId(u32);

            #[derive(Serialize, Deserialize, Bridge)]
            pub struct User {
                pub id: UserId,
                #[validate(length(min = 1, max = 20))]
                pub name: String,
                #[validate(email)]
                pub email: String,
                #[validate(range(min = 1, max = 100))]
                pub age: Option<u32>,
            }

            pub struct NotBridged {
                pub secret: String,
            }
            "#,
        )
        .unwrap();

        assert_eq!(decls.len(), 2);
        let user_id = &decls[0];
        assert_eq!(user_id.name, "UserId");
        assert_eq!(user_id.doc.as_deref(), Some("Primary key of a user."));
        assert_eq!(
            user_id.kind,
            TypeKind::Newtype {
                underlying: Primitive::U32.into(),
                constraints: vec![],
                branded: true,
            }
        );
        let span = user_id.source.as_ref().unwrap();
        assert_eq!((span.start_line, span.start_col), (6, 24));

        let user = &decls[1];
        let fields = user.fields();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0].type_ref, TypeRef::named("UserId"));
        assert_eq!(fields[1].constraints, vec![ValueConstraint::length(Some(1), Some(20))]);
        assert_eq!(fields[2].constraints, vec![ValueConstraint::Email]);
        assert!(fields[3].is_optional());
        assert_eq!(
            fields[3].constraints,
            vec![ValueConstraint::range(Some(Bound::Int(1)), Some(Bound::Int(100)))]
        );
    }

    #[test]
    fn test_serde_renames_and_optionality() {
        let decls = extract(
            r#"
            #[bridge]
            #[serde(rename_all = "camelCase")]
            struct Profile {
                display_name: String,
                #[serde(rename = "e-mail")]
                email: String,
                #[serde(default)]
                tags: Vec<String>,
                #[serde(skip)]
                cache: Cache,
            }
            "#,
        )
        .unwrap();

        let fields = decls[0].fields();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["displayName", "e-mail", "tags"]);
        assert!(fields[2].optional);
        assert!(!fields[0].optional);
    }

    #[test]
    fn test_enum_tagging() {
        let decls = extract(
            r#"
            #[bridge]
            #[serde(tag = "type", rename_all = "snake_case")]
            enum Event {
                /// Signed in.
                SignedIn { user_id: u64 },
                SignedOut,
                #[serde(skip)]
                Internal,
            }

            #[bridge]
            #[serde(tag = "t", content = "c")]
            enum Message {
                Text(String),
                Pair(u8, u8),
            }
            "#,
        )
        .unwrap();

        let TypeKind::Enum { variants, tagging } = &decls[0].kind else {
            panic!("expected enum");
        };
        assert_eq!(tagging, &Tagging::Internal { tag: "type".into() });
        assert_eq!(variants.len(), 2);
        assert_eq!(variants[0].name, "signed_in");
        assert_eq!(variants[0].doc.as_deref(), Some("Signed in."));
        assert_eq!(
            variants[0].payload,
            VariantPayload::Struct(vec![FieldDecl::new("user_id", Primitive::U64)])
        );

        let TypeKind::Enum { variants, tagging } = &decls[1].kind else {
            panic!("expected enum");
        };
        assert_eq!(
            tagging,
            &Tagging::Adjacent {
                tag: "t".into(),
                content: "c".into()
            }
        );
        assert_eq!(
            variants[1].payload,
            VariantPayload::Tuple(vec![Primitive::U8.into(), Primitive::U8.into()])
        );
    }

    #[test]
    fn test_nested_modules_and_aliases() {
        let decls = extract(
            r#"
            mod api {
                #[bridge]
                #[validate(pattern = "^[A-Z]{3}$")]
                pub type Currency = String;

                #[bridge]
                #[serde(transparent)]
                pub struct Cents { value: i64 }
            }
            "#,
        )
        .unwrap();

        assert_eq!(decls.len(), 2);
        assert_eq!(
            decls[0].kind,
            TypeKind::Newtype {
                underlying: Primitive::String.into(),
                constraints: vec![ValueConstraint::pattern("^[A-Z]{3}$")],
                branded: false,
            }
        );
        assert_eq!(decls[1].underlying(), Some(&TypeRef::Primitive(Primitive::I64)));
    }

    #[test]
    fn test_rejections_are_collected() {
        let errors = extract(
            r#"
            #[bridge]
            struct Grid<const N: usize> { cells: [u8; N] }

            #[bridge]
            #[serde(untagged)]
            enum Either { A(u8), B(String) }

            #[bridge]
            struct Wide {
                #[serde(flatten)]
                extra: Extra,
                callback: fn(u8) -> u8,
            }

            #[bridge]
            union Bits { a: u32, b: f32 }

            #[bridge(branded)]
            struct Point { x: i32 }
            "#,
        )
        .unwrap_err();

        let items: Vec<String> = errors
            .iter()
            .map(|e| match e {
                GeneratorError::UnsupportedSource { item, .. } => item.clone(),
                other => panic!("unexpected error {other}"),
            })
            .collect();
        assert_eq!(items, vec!["Grid", "Either", "Wide", "Wide", "Bits", "Point"]);
    }

    #[test]
    fn test_generic_items() {
        let decls = extract(
            r#"
            #[bridge]
            struct Page<'a, T> {
                items: Vec<T>,
                cursor: Option<&'a str>,
            }

            #[bridge]
            enum Outcome<T, E> { Ok(T), Err(E) }

            #[bridge]
            type Pairs<K> = Vec<(K, char)>;

            #[bridge]
            struct Feed { posts: Page<'static, Post>, latest: (u64, bool) }
            "#,
        )
        .unwrap();

        assert_eq!(decls[0].generics, vec!["T"]);
        assert_eq!(decls[0].fields()[0].type_ref, TypeRef::sequence(TypeRef::param("T")));
        assert_eq!(decls[1].generics, vec!["T", "E"]);
        assert_eq!(
            decls[2].underlying(),
            Some(&TypeRef::sequence(TypeRef::tuple(vec![
                TypeRef::param("K"),
                Primitive::Char.into()
            ])))
        );

        let feed = decls[3].fields();
        assert!(decls[3].generics.is_empty());
        assert_eq!(feed[0].type_ref, TypeRef::generic("Page", vec![TypeRef::named("Post")]));
        assert_eq!(
            feed[1].type_ref,
            TypeRef::tuple(vec![Primitive::U64.into(), Primitive::Bool.into()])
        );
    }

    #[test]
    fn test_parse_failure() {
        let errors = extract("struct {").unwrap_err();
        assert!(matches!(errors[0], GeneratorError::ParseFailed { .. }));
    }
}
