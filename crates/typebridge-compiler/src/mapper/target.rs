//! TypeScript type expressions.

use std::fmt;

use serde_json::Value;

use super::check::{is_bigint_wire, ShapeTable};

/// A TypeScript type expression.
#[derive(Debug, Clone, PartialEq)]
pub enum TsType {
    Boolean,
    Number,
    BigInt,
    String,
    Uint8Array,
    Unknown,
    Null,
    /// Reference to another emitted declaration.
    Named(String),
    /// Type parameter of the enclosing declaration.
    Param(String),
    /// Generic declaration applied to arguments: `Page<User>`.
    Generic { name: String, args: Vec<TsType> },
    Array(Box<TsType>),
    /// `T | null`.
    Nullable(Box<TsType>),
    /// `Record<string, T>`.
    Record(Box<TsType>),
    StringLiteral(String),
    Tuple(Vec<TsType>),
    /// Inline object type.
    Object(Vec<TsProperty>),
    Union(Vec<TsType>),
    /// `Brand<T, "Name">`.
    Brand { inner: Box<TsType>, name: String },
}

/// A property of an object type.
#[derive(Debug, Clone, PartialEq)]
pub struct TsProperty {
    pub name: String,
    pub optional: bool,
    pub ty: TsType,
}

impl TsType {
    pub fn nullable(inner: TsType) -> Self {
        TsType::Nullable(Box::new(inner))
    }

    pub fn array(inner: TsType) -> Self {
        TsType::Array(Box::new(inner))
    }

    /// Whether a 64-bit integer appears anywhere in this type, not looking
    /// through named references.
    pub fn contains_bigint(&self) -> bool {
        match self {
            TsType::BigInt => true,
            TsType::Array(inner) | TsType::Nullable(inner) | TsType::Record(inner) => inner.contains_bigint(),
            TsType::Brand { inner, .. } => inner.contains_bigint(),
            TsType::Tuple(items) | TsType::Union(items) | TsType::Generic { args: items, .. } => {
                items.iter().any(TsType::contains_bigint)
            }
            TsType::Object(props) => props.iter().any(|p| p.ty.contains_bigint()),
            _ => false,
        }
    }

    fn needs_parens_in_array(&self) -> bool {
        matches!(self, TsType::Nullable(_) | TsType::Union(_))
    }

    /// Replaces each of `params` with the argument at the same position.
    pub fn bind(&self, params: &[String], args: &[TsType]) -> TsType {
        let bind_all = |items: &[TsType]| -> Vec<TsType> {
            items.iter().map(|t| t.bind(params, args)).collect()
        };
        match self {
            TsType::Param(name) => match params.iter().position(|p| p == name) {
                Some(i) => args.get(i).cloned().unwrap_or(TsType::Unknown),
                None => self.clone(),
            },
            TsType::Array(inner) => TsType::array(inner.bind(params, args)),
            TsType::Nullable(inner) => TsType::nullable(inner.bind(params, args)),
            TsType::Record(inner) => TsType::Record(Box::new(inner.bind(params, args))),
            TsType::Tuple(items) => TsType::Tuple(bind_all(items)),
            TsType::Union(items) => TsType::Union(bind_all(items)),
            TsType::Generic { name, args: inner } => TsType::Generic {
                name: name.clone(),
                args: bind_all(inner),
            },
            TsType::Object(props) => TsType::Object(
                props
                    .iter()
                    .map(|p| TsProperty {
                        name: p.name.clone(),
                        optional: p.optional,
                        ty: p.ty.bind(params, args),
                    })
                    .collect(),
            ),
            TsType::Brand { inner, name } => TsType::Brand {
                inner: Box::new(inner.bind(params, args)),
                name: name.clone(),
            },
            _ => self.clone(),
        }
    }

    /// Structural check of a JSON value against this type, as TypeScript's
    /// assignability would judge the decoded value. Bigints are represented
    /// by decimal strings or integer numbers, byte arrays by arrays of
    /// octets. Brands are not checked and extra object keys are allowed.
    /// Unbound type parameters admit anything.
    pub fn admits(&self, value: &Value, table: &ShapeTable) -> bool {
        match self {
            TsType::Boolean => value.is_boolean(),
            TsType::Number => value.is_number(),
            TsType::BigInt => is_bigint_wire(value),
            TsType::String => value.is_string(),
            TsType::Uint8Array => value
                .as_array()
                .is_some_and(|items| items.iter().all(|b| b.as_u64().is_some_and(|b| b <= 255))),
            TsType::Unknown => true,
            TsType::Null => value.is_null(),
            TsType::Named(name) => table
                .types
                .get(name)
                .is_some_and(|ty| ty.admits(value, table)),
            TsType::Param(_) => true,
            TsType::Generic { name, args } => table.types.get(name).is_some_and(|ty| {
                let params = table.params.get(name).map(Vec::as_slice).unwrap_or_default();
                ty.bind(params, args).admits(value, table)
            }),
            TsType::Array(inner) => value
                .as_array()
                .is_some_and(|items| items.iter().all(|v| inner.admits(v, table))),
            TsType::Nullable(inner) => value.is_null() || inner.admits(value, table),
            TsType::Record(inner) => value
                .as_object()
                .is_some_and(|map| map.values().all(|v| inner.admits(v, table))),
            TsType::StringLiteral(lit) => value.as_str() == Some(lit.as_str()),
            TsType::Tuple(items) => value.as_array().is_some_and(|values| {
                values.len() == items.len()
                    && items.iter().zip(values).all(|(ty, v)| ty.admits(v, table))
            }),
            TsType::Object(props) => value.as_object().is_some_and(|map| {
                props.iter().all(|prop| match map.get(&prop.name) {
                    Some(v) => prop.ty.admits(v, table),
                    None => prop.optional,
                })
            }),
            TsType::Union(members) => members.iter().any(|m| m.admits(value, table)),
            TsType::Brand { inner, .. } => inner.admits(value, table),
        }
    }
}

impl fmt::Display for TsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TsType::Boolean => f.write_str("boolean"),
            TsType::Number => f.write_str("number"),
            TsType::BigInt => f.write_str("bigint"),
            TsType::String => f.write_str("string"),
            TsType::Uint8Array => f.write_str("Uint8Array"),
            TsType::Unknown => f.write_str("unknown"),
            TsType::Null => f.write_str("null"),
            TsType::Named(name) | TsType::Param(name) => f.write_str(name),
            TsType::Generic { name, args } => {
                let args: Vec<String> = args.iter().map(|t| t.to_string()).collect();
                write!(f, "{}<{}>", name, args.join(", "))
            }
            TsType::Array(inner) if inner.needs_parens_in_array() => write!(f, "({})[]", inner),
            TsType::Array(inner) => write!(f, "{}[]", inner),
            TsType::Nullable(inner) => write!(f, "{} | null", inner),
            TsType::Record(inner) => write!(f, "Record<string, {}>", inner),
            TsType::StringLiteral(lit) => write!(f, "{}", string_literal(lit)),
            TsType::Tuple(items) => {
                let items: Vec<String> = items.iter().map(|t| t.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
            TsType::Object(props) => {
                if props.is_empty() {
                    return f.write_str("Record<string, never>");
                }
                let props: Vec<String> = props.iter().map(|p| p.to_string()).collect();
                write!(f, "{{ {} }}", props.join("; "))
            }
            TsType::Union(members) => {
                let members: Vec<String> = members.iter().map(|t| t.to_string()).collect();
                f.write_str(&members.join(" | "))
            }
            TsType::Brand { inner, name } => write!(f, "Brand<{}, {}>", inner, string_literal(name)),
        }
    }
}

impl fmt::Display for TsProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.optional { "?" } else { "" };
        write!(f, "{}{}: {}", property_key(&self.name), marker, self.ty)
    }
}

/// A double-quoted, escaped TypeScript string literal.
pub fn string_literal(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

/// A property key, quoted when it is not a plain identifier.
pub fn property_key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        string_literal(name)
    }
}

/// Whether `name` is a valid ECMAScript identifier (ASCII subset).
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}
