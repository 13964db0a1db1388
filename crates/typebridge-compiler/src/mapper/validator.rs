//! Dialect-neutral validator expressions.
//!
//! A [`ValidatorExpr`] describes what a runtime validator checks. Dialects in
//! [`crate::emit::dialect`] render it to TypeScript; [`super::check`] evaluates
//! it directly against JSON values.

use crate::ir::{Bound, Tagging};

#[derive(Debug, Clone, PartialEq)]
pub enum ValidatorExpr {
    Boolean,
    /// Finite number, optionally integral and bounded.
    Number(NumberCheck),
    /// 64-bit integer in its wire form, bounded by the declared width.
    BigInt(BigIntCheck),
    String(StringCheck),
    Bytes(LengthCheck),
    Unknown,
    /// Exactly this string.
    Literal(String),
    Array {
        items: Box<ValidatorExpr>,
        length: LengthCheck,
    },
    Tuple(Vec<ValidatorExpr>),
    /// `null` or the inner validator.
    Nullable(Box<ValidatorExpr>),
    /// String-keyed map.
    Record(Box<ValidatorExpr>),
    /// Delegates to the validator of a named declaration.
    Ref(String),
    /// The validator passed for a type parameter of the enclosing declaration.
    Param(String),
    /// Instantiates the validator factory of a generic declaration.
    Apply {
        name: String,
        args: Vec<ValidatorExpr>,
    },
    Object(Vec<ObjectField>),
    /// Applies the nominal wrap after the inner validator succeeds.
    Brand {
        inner: Box<ValidatorExpr>,
        name: String,
    },
    Union(UnionExpr),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumberCheck {
    pub integer: bool,
    pub min: Option<Bound>,
    pub max: Option<Bound>,
}

/// Inclusive bounds; always present since every width has limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BigIntCheck {
    pub min: i128,
    pub max: i128,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LengthCheck {
    pub min: Option<u64>,
    pub max: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StringCheck {
    pub length: LengthCheck,
    pub patterns: Vec<String>,
    pub formats: Vec<StringFormat>,
    /// Exactly one code point, as a Rust `char` requires.
    pub single_char: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    Email,
    Url,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectField {
    pub name: String,
    /// May be absent. Optional fields carry a nullable validator, so an
    /// explicit `null` is accepted too.
    pub optional: bool,
    pub validator: ValidatorExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionExpr {
    pub tagging: Tagging,
    pub variants: Vec<VariantExpr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantExpr {
    pub name: String,
    pub payload: PayloadExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PayloadExpr {
    Unit,
    /// Single-element tuple variant; the value travels unwrapped.
    Newtype(Box<ValidatorExpr>),
    Tuple(Vec<ValidatorExpr>),
    Struct(Vec<ObjectField>),
}

impl LengthCheck {
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, len: u64) -> bool {
        self.min.map_or(true, |min| len >= min) && self.max.map_or(true, |max| len <= max)
    }
}

impl StringFormat {
    pub fn name(&self) -> &'static str {
        match self {
            StringFormat::Email => "email",
            StringFormat::Url => "url",
        }
    }
}

impl ValidatorExpr {
    pub fn nullable(inner: ValidatorExpr) -> Self {
        ValidatorExpr::Nullable(Box::new(inner))
    }

    /// Names of declarations this expression delegates to, in first-use order.
    pub fn refs(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_refs(&mut out);
        out
    }

    fn collect_refs<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ValidatorExpr::Ref(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            ValidatorExpr::Apply { name, args } => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
                args.iter().for_each(|a| a.collect_refs(out));
            }
            ValidatorExpr::Array { items: inner, .. }
            | ValidatorExpr::Nullable(inner)
            | ValidatorExpr::Record(inner)
            | ValidatorExpr::Brand { inner, .. } => inner.collect_refs(out),
            ValidatorExpr::Tuple(items) => items.iter().for_each(|i| i.collect_refs(out)),
            ValidatorExpr::Object(fields) => fields.iter().for_each(|f| f.validator.collect_refs(out)),
            ValidatorExpr::Union(union) => {
                for variant in &union.variants {
                    match &variant.payload {
                        PayloadExpr::Unit => {}
                        PayloadExpr::Newtype(inner) => inner.collect_refs(out),
                        PayloadExpr::Tuple(items) => items.iter().for_each(|i| i.collect_refs(out)),
                        PayloadExpr::Struct(fields) => {
                            fields.iter().for_each(|f| f.validator.collect_refs(out))
                        }
                    }
                }
            }
            ValidatorExpr::Boolean
            | ValidatorExpr::Number(_)
            | ValidatorExpr::BigInt(_)
            | ValidatorExpr::String(_)
            | ValidatorExpr::Bytes(_)
            | ValidatorExpr::Unknown
            | ValidatorExpr::Param(_)
            | ValidatorExpr::Literal(_) => {}
        }
    }

    /// Replaces each of `params` with the validator at the same position.
    pub fn bind(&self, params: &[String], args: &[ValidatorExpr]) -> ValidatorExpr {
        let bind_all = |items: &[ValidatorExpr]| -> Vec<ValidatorExpr> {
            items.iter().map(|e| e.bind(params, args)).collect()
        };
        let bind_fields = |fields: &[ObjectField]| -> Vec<ObjectField> {
            fields
                .iter()
                .map(|f| ObjectField {
                    name: f.name.clone(),
                    optional: f.optional,
                    validator: f.validator.bind(params, args),
                })
                .collect()
        };

        match self {
            ValidatorExpr::Param(name) => match params.iter().position(|p| p == name) {
                Some(i) => args.get(i).cloned().unwrap_or(ValidatorExpr::Unknown),
                None => self.clone(),
            },
            ValidatorExpr::Array { items, length } => ValidatorExpr::Array {
                items: Box::new(items.bind(params, args)),
                length: *length,
            },
            ValidatorExpr::Tuple(items) => ValidatorExpr::Tuple(bind_all(items)),
            ValidatorExpr::Nullable(inner) => ValidatorExpr::nullable(inner.bind(params, args)),
            ValidatorExpr::Record(inner) => ValidatorExpr::Record(Box::new(inner.bind(params, args))),
            ValidatorExpr::Apply { name, args: inner } => ValidatorExpr::Apply {
                name: name.clone(),
                args: bind_all(inner),
            },
            ValidatorExpr::Object(fields) => ValidatorExpr::Object(bind_fields(fields)),
            ValidatorExpr::Brand { inner, name } => ValidatorExpr::Brand {
                inner: Box::new(inner.bind(params, args)),
                name: name.clone(),
            },
            ValidatorExpr::Union(union) => ValidatorExpr::Union(UnionExpr {
                tagging: union.tagging.clone(),
                variants: union
                    .variants
                    .iter()
                    .map(|v| VariantExpr {
                        name: v.name.clone(),
                        payload: match &v.payload {
                            PayloadExpr::Unit => PayloadExpr::Unit,
                            PayloadExpr::Newtype(inner) => PayloadExpr::Newtype(Box::new(inner.bind(params, args))),
                            PayloadExpr::Tuple(items) => PayloadExpr::Tuple(bind_all(items)),
                            PayloadExpr::Struct(fields) => PayloadExpr::Struct(bind_fields(fields)),
                        },
                    })
                    .collect(),
            }),
            _ => self.clone(),
        }
    }
}
